//! Per-audit contract handle

use alloy::primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use anyhow::Result;
use tracing::{debug, info};

use super::bindings::ISEAuditContract;
use super::{ContractCaller, Submitted};
use crate::domain::audit::{
    AuditConstructorArgs, AuditDetails, AuditReport, AuditSeed, AuditSummary, AuditUri,
    Declaration, ProofKind, ProofRef, UrisToAudit,
};

impl From<ISEAuditContract::AuditSeed> for AuditSeed {
    fn from(seed: ISEAuditContract::AuditSeed) -> Self {
        Self {
            owner_name: seed.ownerName,
            owner: seed.owner,
            title: seed.auditTitle,
            upload_date: seed.uploadDate,
            max_audit_window: seed.maxAuditWindow,
            audit_start: seed.auditStart,
            audit_date: seed.auditDate,
            publish_date: seed.publishDate,
            expires: seed.expires,
            auditor: seed.auditor,
            auditor_name: seed.auditorName,
            carbon_offset: seed.carbonOffSet,
        }
    }
}

impl From<&AuditSeed> for ISEAuditContract::AuditSeed {
    fn from(seed: &AuditSeed) -> Self {
        Self {
            ownerName: seed.owner_name.clone(),
            owner: seed.owner,
            auditTitle: seed.title.clone(),
            uploadDate: seed.upload_date,
            maxAuditWindow: seed.max_audit_window,
            auditStart: seed.audit_start,
            auditDate: seed.audit_date,
            publishDate: seed.publish_date,
            expires: seed.expires,
            auditor: seed.auditor,
            auditorName: seed.auditor_name.clone(),
            carbonOffSet: seed.carbon_offset,
        }
    }
}

impl From<ISEAuditContract::AuditUri> for AuditUri {
    fn from(uri: ISEAuditContract::AuditUri) -> Self {
        Self {
            uri: uri.uri,
            label: uri.label,
            is_private: uri.isPrivate,
        }
    }
}

impl AuditConstructorArgs {
    /// ABI-encoded constructor arguments, as appended to the creation code
    pub fn abi_encode(&self) -> Vec<u8> {
        let seed: ISEAuditContract::AuditSeed = (&self.seed).into();
        let uris: Vec<String> = self.uris.iter().map(|u| u.uri.clone()).collect();
        let labels: Vec<String> = self.uris.iter().map(|u| u.label.clone()).collect();
        let privacy: Vec<bool> = self.uris.iter().map(|u| u.is_private).collect();
        let proof = self.upload_proof.unwrap_or(ProofRef {
            erc1155: Address::ZERO,
            nft_id: U256::ZERO,
        });
        (
            seed,
            uris,
            labels,
            privacy,
            self.notes_uri.clone(),
            self.registry,
            proof.erc1155,
            proof.nft_id,
        )
            .abi_encode_params()
    }
}

#[derive(Debug, Clone)]
pub struct AuditContract {
    caller: ContractCaller,
    address: Address,
}

impl AuditContract {
    pub fn new(caller: ContractCaller, address: Address) -> Self {
        Self { caller, address }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub async fn book_for_audit(&self, auditor_name: &str) -> Result<Submitted<bool>> {
        let call = ISEAuditContract::bookForAuditCall {
            _auditorName: auditor_name.to_string(),
        };
        self.caller.send(self.address, &call).await
    }

    pub async fn get_audit_report(&self) -> Result<AuditReport> {
        let report = self
            .caller
            .read(self.address, &ISEAuditContract::getAuditReportCall {})
            .await?;
        Ok(AuditReport {
            uri: report._auditReportUri,
            declaration: Declaration(report._declaration),
        })
    }

    pub async fn get_audit_seed(&self) -> Result<AuditSeed> {
        let seed = self
            .caller
            .read(self.address, &ISEAuditContract::getAuditSeedCall {})
            .await?;
        Ok(seed.into())
    }

    pub async fn get_estimated_audit_end_time(&self) -> Result<U256> {
        self.caller
            .read(
                self.address,
                &ISEAuditContract::getEstimatedAuditEndTimeCall {},
            )
            .await
    }

    pub async fn get_name(&self) -> Result<String> {
        self.caller
            .read(self.address, &ISEAuditContract::getNameCall {})
            .await
    }

    pub async fn get_proofs(&self, kind: ProofKind) -> Result<ProofRef> {
        let proof = self
            .caller
            .read(
                self.address,
                &ISEAuditContract::getProofsCall { _proof: kind.0 },
            )
            .await?;
        Ok(ProofRef {
            erc1155: proof._erc1155,
            nft_id: proof._nftId,
        })
    }

    pub async fn get_public_data(&self) -> Result<Vec<AuditUri>> {
        let uris = self
            .caller
            .read(self.address, &ISEAuditContract::getPublicDataCall {})
            .await?;
        Ok(uris.into_iter().map(Into::into).collect())
    }

    pub async fn get_status(&self) -> Result<String> {
        self.caller
            .read(self.address, &ISEAuditContract::getStatusCall {})
            .await
    }

    pub async fn get_uris_to_audit(&self) -> Result<UrisToAudit> {
        let uris = self
            .caller
            .read(self.address, &ISEAuditContract::getUrisToAuditCall {})
            .await?;
        Ok(UrisToAudit {
            uris: uris._auditUris.into_iter().map(Into::into).collect(),
            notes_uri: uris._notesUri,
        })
    }

    pub async fn get_version(&self) -> Result<U256> {
        self.caller
            .read(self.address, &ISEAuditContract::getVersionCall {})
            .await
    }

    pub async fn make_public(&self) -> Result<Submitted<bool>> {
        self.caller
            .send(self.address, &ISEAuditContract::makePublicCall {})
            .await
    }

    /// ERC1155 receiver hook; the contract answers with its fixed acceptance selector
    pub async fn on_erc1155_received(
        &self,
        operator: Address,
        from: Address,
        id: U256,
        value: U256,
        data: Bytes,
    ) -> Result<FixedBytes<4>> {
        self.caller
            .read(
                self.address,
                &ISEAuditContract::onERC1155ReceivedCall {
                    operator,
                    from,
                    id,
                    value,
                    data,
                },
            )
            .await
    }

    /// ERC1155 batch receiver hook
    pub async fn on_erc1155_batch_received(
        &self,
        operator: Address,
        from: Address,
        ids: Vec<U256>,
        values: Vec<U256>,
        data: Bytes,
    ) -> Result<FixedBytes<4>> {
        self.caller
            .read(
                self.address,
                &ISEAuditContract::onERC1155BatchReceivedCall {
                    operator,
                    from,
                    ids,
                    values,
                    data,
                },
            )
            .await
    }

    pub async fn submit_audit_report(
        &self,
        report_uri: &str,
        declaration: Declaration,
        seal_uri: &str,
        manifest_uri: &str,
    ) -> Result<Submitted<bool>> {
        let call = ISEAuditContract::submitAuditReportCall {
            _auditReportUri: report_uri.to_string(),
            _declaration: declaration.0,
            _auditorSealUri: seal_uri.to_string(),
            _auditSubmissionManifestUri: manifest_uri.to_string(),
        };
        let submitted = self.caller.send(self.address, &call).await?;
        info!(audit = %self.address, %declaration, "audit report submitted");
        Ok(submitted)
    }

    pub async fn supports_interface(&self, interface_id: FixedBytes<4>) -> Result<bool> {
        self.caller
            .read(
                self.address,
                &ISEAuditContract::supportsInterfaceCall {
                    interfaceId: interface_id,
                },
            )
            .await
    }

    pub async fn withdraw(&self) -> Result<Submitted<bool>> {
        self.caller
            .send(self.address, &ISEAuditContract::withdrawCall {})
            .await
    }

    /// The handful of reads the audit list needs
    pub async fn load_summary(&self) -> Result<AuditSummary> {
        let name = self.get_name().await?;
        let status = self.get_status().await?;
        let version = self.get_version().await?;
        let seed = self.get_audit_seed().await?;
        Ok(AuditSummary {
            address: self.address,
            name,
            status,
            title: seed.title,
            owner_name: seed.owner_name,
            version,
        })
    }

    /// Everything the detail panel shows
    ///
    /// Report and proof reads revert until those exist, so their failures
    /// only leave the fields empty.
    pub async fn load_details(&self) -> Result<AuditDetails> {
        let name = self.get_name().await?;
        let status = self.get_status().await?;
        let version = self.get_version().await?;
        let seed = self.get_audit_seed().await?;
        let estimated_end = self.get_estimated_audit_end_time().await?;
        let uris = self.get_uris_to_audit().await?;
        let public_data = self.get_public_data().await?;

        let report = match self.get_audit_report().await {
            Ok(report) if !report.uri.is_empty() => Some(report),
            Ok(_) => None,
            Err(err) => {
                debug!(audit = %self.address, "no audit report: {err:#}");
                None
            }
        };

        let mut proofs = Vec::new();
        for kind in ProofKind::KNOWN {
            match self.get_proofs(kind).await {
                Ok(proof) if proof.is_present() => proofs.push((kind, proof)),
                Ok(_) => {}
                Err(err) => debug!(audit = %self.address, %kind, "no proof: {err:#}"),
            }
        }

        Ok(AuditDetails {
            address: self.address,
            name,
            status,
            version,
            seed,
            estimated_end,
            uris,
            public_data,
            report,
            proofs,
        })
    }
}
