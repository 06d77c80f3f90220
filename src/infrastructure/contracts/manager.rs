//! Audit manager handle - lists and creates audit contracts

use alloy::primitives::Address;
use anyhow::Result;
use tracing::info;

use super::bindings::ISEAuditManager;
use super::{ContractCaller, Submitted};
use crate::domain::audit::{AuditQuery, UploadRequest};

#[derive(Debug, Clone)]
pub struct AuditManager {
    caller: ContractCaller,
    address: Address,
}

impl AuditManager {
    pub fn new(caller: ContractCaller, address: Address) -> Self {
        Self { caller, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn get_audit_contracts_with_status(&self, status: &str) -> Result<Vec<Address>> {
        self.caller
            .read(
                self.address,
                &ISEAuditManager::getAuditContractsWithStatusCall {
                    _status: status.to_string(),
                },
            )
            .await
    }

    pub async fn get_contracts_under_auditor(&self, auditor: Address) -> Result<Vec<Address>> {
        self.caller
            .read(
                self.address,
                &ISEAuditManager::getContractsUnderAuditorCall { _auditor: auditor },
            )
            .await
    }

    pub async fn get_public_audit_contracts(&self) -> Result<Vec<Address>> {
        self.caller
            .read(
                self.address,
                &ISEAuditManager::getPublicAuditContractsCall {},
            )
            .await
    }

    pub async fn get_public_audit_contracts_for_user(&self, user: Address) -> Result<Vec<Address>> {
        self.caller
            .read(
                self.address,
                &ISEAuditManager::getPublicAuditContractsForUserCall { _user: user },
            )
            .await
    }

    /// Audits created by the connected account (the manager keys on `from`)
    pub async fn get_user_audit_contracts(&self) -> Result<Vec<Address>> {
        self.caller
            .read(self.address, &ISEAuditManager::getUserAuditContractsCall {})
            .await
    }

    /// Run one of the manager's index queries
    pub async fn query(&self, query: &AuditQuery) -> Result<Vec<Address>> {
        match query {
            AuditQuery::Mine => self.get_user_audit_contracts().await,
            AuditQuery::Public => self.get_public_audit_contracts().await,
            AuditQuery::PublicForUser(user) => {
                self.get_public_audit_contracts_for_user(*user).await
            }
            AuditQuery::WithStatus(status) => self.get_audit_contracts_with_status(status).await,
            AuditQuery::UnderAuditor(auditor) => self.get_contracts_under_auditor(*auditor).await,
        }
    }

    /// Deploy a new audit contract for the given files
    ///
    /// `simulated` holds the address the manager will deploy to.
    pub async fn upload_files(&self, request: &UploadRequest) -> Result<Submitted<Address>> {
        request.validate()?;
        let (uris, labels, privacy) = request.columns();
        let call = ISEAuditManager::uploadFilesCall {
            _ownerName: request.owner_name.clone(),
            _auditTitle: request.title.clone(),
            _maxAuditWindow: request.max_audit_window,
            _carbonOffset: request.carbon_offset,
            _urisToAudit: uris,
            _uriLabels: labels,
            _private: privacy,
            _notesUri: request.notes_uri.clone(),
            _uploadManifestUri: request.manifest_uri.clone(),
        };
        let submitted = self.caller.send(self.address, &call).await?;
        info!(audit = %submitted.simulated, title = %request.title, "upload submitted");
        Ok(submitted)
    }
}
