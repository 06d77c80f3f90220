//! Audit domain types shared by the contract handles and the UI

mod types;

pub use types::{
    format_timestamp, AuditConstructorArgs, AuditDetails, AuditQuery, AuditReport, AuditSeed,
    AuditSummary, AuditUri, Declaration, ProofKind, ProofRef, UploadRequest, UrisToAudit,
    AUDIT_MANAGER_NAME,
};
