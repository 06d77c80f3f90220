//! Compiled-in ABI tables for the deployed audit contracts

use alloy_json_abi::JsonAbi;
use anyhow::{Context, Result};

const AUDIT_CONTRACT_ABI: &str = include_str!("../../../abi/ISEAuditContract.json");
const AUDIT_MANAGER_ABI: &str = include_str!("../../../abi/ISEAuditManager.json");
const REGISTRY_ABI: &str = include_str!("../../../abi/ISERegistry.json");

/// One of the contract interfaces this front-end talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbiTable {
    /// Per-audit contract instance
    AuditContract,
    /// Directory contract that creates and indexes audit contracts
    AuditManager,
    /// Name -> address lookup
    Registry,
}

impl AbiTable {
    pub const ALL: [AbiTable; 3] = [
        AbiTable::AuditContract,
        AbiTable::AuditManager,
        AbiTable::Registry,
    ];

    pub fn contract_name(self) -> &'static str {
        match self {
            AbiTable::AuditContract => "ISEAuditContract",
            AbiTable::AuditManager => "ISEAuditManager",
            AbiTable::Registry => "ISERegistry",
        }
    }

    /// Raw JSON text of the table
    pub fn json(self) -> &'static str {
        match self {
            AbiTable::AuditContract => AUDIT_CONTRACT_ABI,
            AbiTable::AuditManager => AUDIT_MANAGER_ABI,
            AbiTable::Registry => REGISTRY_ABI,
        }
    }

    pub fn parse(self) -> Result<JsonAbi> {
        serde_json::from_str(self.json())
            .with_context(|| format!("Invalid ABI table {}", self.contract_name()))
    }
}
