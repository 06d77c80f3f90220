//! Rust-side views of audit contract data

use std::fmt;

use alloy_primitives::{Address, U256};
use anyhow::{bail, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Name under which the registry publishes the audit manager address
pub const AUDIT_MANAGER_NAME: &str = "RESERVED_SANTA_ELENA_AUDIT_MANAGER";

/// `ISEAuditContract.AUDIT_DECLARATION`, carried as its on-chain discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Declaration(pub u8);

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "declaration #{}", self.0)
    }
}

/// `ISEAuditContract.PROOF`, carried as its on-chain discriminant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProofKind(pub u8);

impl fmt::Display for ProofKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "proof #{}", self.0)
    }
}

/// Seed data an audit contract is constructed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditSeed {
    pub owner_name: String,
    pub owner: Address,
    pub title: String,
    pub upload_date: U256,
    pub max_audit_window: U256,
    pub audit_start: U256,
    pub audit_date: U256,
    pub publish_date: U256,
    pub expires: U256,
    pub auditor: Address,
    pub auditor_name: String,
    pub carbon_offset: U256,
}

impl AuditSeed {
    /// Whether an auditor has booked this audit
    pub fn is_booked(&self) -> bool {
        self.auditor != Address::ZERO
    }
}

/// A URI submitted for audit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditUri {
    pub uri: String,
    pub label: String,
    pub is_private: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub uri: String,
    pub declaration: Declaration,
}

/// ERC1155 token proving an upload or audit happened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProofRef {
    pub erc1155: Address,
    pub nft_id: U256,
}

impl ProofRef {
    /// A zero token contract means no proof was minted
    pub fn is_present(&self) -> bool {
        self.erc1155 != Address::ZERO
    }
}

impl ProofKind {
    /// Proof kinds the detail panel asks for
    pub const KNOWN: [ProofKind; 2] = [ProofKind(0), ProofKind(1)];
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrisToAudit {
    pub uris: Vec<AuditUri>,
    pub notes_uri: String,
}

/// Arguments of `ISEAuditManager.uploadFiles`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    pub owner_name: String,
    pub title: String,
    pub max_audit_window: U256,
    pub carbon_offset: U256,
    pub uris: Vec<AuditUri>,
    pub notes_uri: String,
    pub manifest_uri: String,
}

impl UploadRequest {
    /// Reject requests the manager would revert on
    pub fn validate(&self) -> Result<()> {
        if self.owner_name.trim().is_empty() {
            bail!("owner name is empty");
        }
        if self.title.trim().is_empty() {
            bail!("audit title is empty");
        }
        if self.uris.is_empty() {
            bail!("at least one URI is required");
        }
        if let Some(uri) = self.uris.iter().find(|uri| uri.uri.trim().is_empty()) {
            bail!("URI labelled '{}' is empty", uri.label);
        }
        Ok(())
    }

    /// Split URIs into the parallel arrays the contract takes
    pub fn columns(&self) -> (Vec<String>, Vec<String>, Vec<bool>) {
        let mut uris = Vec::with_capacity(self.uris.len());
        let mut labels = Vec::with_capacity(self.uris.len());
        let mut privacy = Vec::with_capacity(self.uris.len());
        for entry in &self.uris {
            uris.push(entry.uri.clone());
            labels.push(entry.label.clone());
            privacy.push(entry.is_private);
        }
        (uris, labels, privacy)
    }
}

/// Constructor arguments of an audit contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditConstructorArgs {
    pub seed: AuditSeed,
    pub uris: Vec<AuditUri>,
    pub notes_uri: String,
    pub registry: Address,
    /// Optional upload proof; `None` encodes as a zero address and id
    pub upload_proof: Option<ProofRef>,
}

/// What the audit list shows per contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditSummary {
    pub address: Address,
    pub name: String,
    pub status: String,
    pub title: String,
    pub owner_name: String,
    pub version: U256,
}

/// Everything the detail panel shows for one audit contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDetails {
    pub address: Address,
    pub name: String,
    pub status: String,
    pub version: U256,
    pub seed: AuditSeed,
    pub estimated_end: U256,
    pub uris: UrisToAudit,
    pub public_data: Vec<AuditUri>,
    /// `None` until a report has been submitted
    pub report: Option<AuditReport>,
    /// Minted proofs, by proof kind
    pub proofs: Vec<(ProofKind, ProofRef)>,
}

/// Which manager index to list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuditQuery {
    /// Audits created by the connected account
    Mine,
    /// All public audits
    Public,
    /// Public audits owned by a user
    PublicForUser(Address),
    /// Audits currently in a given status
    WithStatus(String),
    /// Audits booked by an auditor
    UnderAuditor(Address),
}

impl fmt::Display for AuditQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditQuery::Mine => f.write_str("my audits"),
            AuditQuery::Public => f.write_str("public audits"),
            AuditQuery::PublicForUser(user) => write!(f, "public audits of {user}"),
            AuditQuery::WithStatus(status) => write!(f, "audits with status '{status}'"),
            AuditQuery::UnderAuditor(auditor) => write!(f, "audits under {auditor}"),
        }
    }
}

/// Render an on-chain unix timestamp
pub fn format_timestamp(value: U256) -> String {
    if value.is_zero() {
        return "--".to_string();
    }
    let Some(secs) = u64::try_from(value).ok().and_then(|v| i64::try_from(v).ok()) else {
        return value.to_string();
    };
    DateTime::<Utc>::from_timestamp(secs, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| value.to_string())
}
