//! Recording mock wallet shared by the integration tests
#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use alloy::primitives::{address, Address, Bytes, B256, U256};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy_sol_types::{SolCall, SolValue};
use anyhow::{anyhow, Result};

use auditdesk::domain::abi::AbiRegistry;
use auditdesk::infrastructure::contracts::bindings::ISEAuditContract;
use auditdesk::infrastructure::ethereum::{EthereumProvider, ProviderConfig, RpcFailure};
use auditdesk::infrastructure::wallet::ProviderFactory;

pub const ACCOUNT: Address = address!("00000000000000000000000000000000000000aa");
pub const MANAGER: Address = address!("00000000000000000000000000000000000000bb");
pub const AUDIT: Address = address!("00000000000000000000000000000000000000a1");
pub const NEW_AUDIT: Address = address!("00000000000000000000000000000000000000a2");
pub const TX_HASH: B256 = B256::repeat_byte(0x11);
pub const PROOF_TOKEN: Address = address!("00000000000000000000000000000000000000dd");

/// How the registry answers `getAddress`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryAnswer {
    Manager,
    Zero,
    Revert,
}

/// One request the wallet saw
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub from: Option<Address>,
    pub to: Option<Address>,
    pub selector: [u8; 4],
    pub data: Bytes,
}

pub struct MockWallet {
    pub client_version: String,
    pub accounts: Vec<Address>,
    /// Error code returned by `eth_requestAccounts`, if any
    pub request_error: Option<i64>,
    pub registry: RegistryAnswer,
    /// Refuse `eth_requestAccounts` from now on
    pub reject: AtomicBool,
    /// A report has been submitted and proof #0 minted
    pub reported: bool,
    /// Every state-changing method reverts in simulation
    pub revert_writes: bool,
    pub calls: Mutex<Vec<Recorded>>,
    pub sent: Mutex<Vec<Recorded>>,
    pub abi: AbiRegistry,
}

impl MockWallet {
    pub fn with_report() -> Self {
        Self {
            reported: true,
            ..Self::metamask()
        }
    }

    pub fn metamask() -> Self {
        Self {
            client_version: "MetaMask/v11.16.0".to_string(),
            accounts: vec![ACCOUNT, address!("00000000000000000000000000000000000000cc")],
            request_error: None,
            registry: RegistryAnswer::Manager,
            reject: AtomicBool::new(false),
            reported: false,
            revert_writes: false,
            calls: Mutex::new(Vec::new()),
            sent: Mutex::new(Vec::new()),
            abi: AbiRegistry::builtin(),
        }
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<Recorded> {
        self.sent.lock().unwrap().clone()
    }

    /// Sent transactions whose selector belongs to `C`
    pub fn sent_calls<C: SolCall>(&self) -> Vec<C> {
        self.sent()
            .iter()
            .filter(|recorded| recorded.selector == C::SELECTOR)
            .filter_map(|recorded| C::abi_decode(&recorded.data).ok())
            .collect()
    }

    fn record(request: &TransactionRequest) -> Recorded {
        let data = request.input.input().cloned().unwrap_or_default();
        let mut selector = [0u8; 4];
        if data.len() >= 4 {
            selector.copy_from_slice(&data[..4]);
        }
        Recorded {
            from: request.from,
            to: request.to.as_ref().and_then(|kind| kind.to().copied()),
            selector,
            data,
        }
    }

    fn revert(message: &str) -> anyhow::Error {
        anyhow::Error::new(RpcFailure {
            code: 3,
            message: format!("execution reverted: {message}"),
        })
    }

    fn answer(&self, recorded: &Recorded) -> Result<Bytes> {
        let selector = recorded.selector;
        let name = self
            .abi
            .lookup(selector)
            .map(|function| function.name.clone())
            .unwrap_or_default();
        let is_write = matches!(
            name.as_str(),
            "bookForAudit" | "makePublic" | "withdraw" | "submitAuditReport" | "uploadFiles"
        );
        if self.revert_writes && is_write {
            return Err(Self::revert("not allowed in this state"));
        }

        let encoded = match name.as_str() {
            "getAddress" => match self.registry {
                RegistryAnswer::Manager => (MANAGER,).abi_encode_params(),
                RegistryAnswer::Zero => (Address::ZERO,).abi_encode_params(),
                RegistryAnswer::Revert => return Err(Self::revert("unknown name")),
            },

            "getUserAuditContracts"
            | "getPublicAuditContracts"
            | "getPublicAuditContractsForUser"
            | "getAuditContractsWithStatus"
            | "getContractsUnderAuditor" => {
                (vec![AUDIT],).abi_encode_params()
            }
            "uploadFiles" => (NEW_AUDIT,).abi_encode_params(),

            "getName" => {
                ("SE Audit Contract".to_string(),).abi_encode_params()
            }
            "getStatus" => ("UPLOADED".to_string(),).abi_encode_params(),
            "getVersion" => (U256::from(7u64),).abi_encode_params(),
            "getAuditSeed" => (seed(),).abi_encode_params(),
            "getEstimatedAuditEndTime" => {
                (U256::from(1_700_604_800u64),).abi_encode_params()
            }
            "getUrisToAudit" => (
                vec![ISEAuditContract::AuditUri {
                    uri: "ipfs://ledger".to_string(),
                    label: "ledger".to_string(),
                    isPrivate: true,
                }],
                "ipfs://notes".to_string(),
            )
                .abi_encode_params(),
            "getPublicData" => {
                (Vec::<ISEAuditContract::AuditUri>::new(),).abi_encode_params()
            }
            "getAuditReport" if self.reported => {
                <(alloy_sol_types::sol_data::String, alloy_sol_types::sol_data::Uint<8>) as alloy_sol_types::SolType>::abi_encode_params(&("ipfs://report".to_string(), 2u8))
            }
            // No report yet: the contract reverts
            "getAuditReport" => return Err(Self::revert("no report")),
            "getProofs" => {
                let kind = ISEAuditContract::getProofsCall::abi_decode(&recorded.data)?._proof;
                if self.reported && kind == 0 {
                    (PROOF_TOKEN, U256::from(42u64)).abi_encode_params()
                } else {
                    (Address::ZERO, U256::ZERO).abi_encode_params()
                }
            }
            "bookForAudit" | "makePublic" | "withdraw" | "submitAuditReport" => (true,).abi_encode_params(),

            _ => return Err(anyhow!("unexpected selector 0x{}", hex::encode(selector))),
        };
        Ok(encoded.into())
    }
}

pub fn seed() -> ISEAuditContract::AuditSeed {
    ISEAuditContract::AuditSeed {
        ownerName: "Acme".to_string(),
        owner: ACCOUNT,
        auditTitle: "Q3 emissions".to_string(),
        uploadDate: U256::from(1_700_000_000u64),
        maxAuditWindow: U256::from(604_800u64),
        auditStart: U256::ZERO,
        auditDate: U256::ZERO,
        publishDate: U256::ZERO,
        expires: U256::ZERO,
        auditor: Address::ZERO,
        auditorName: String::new(),
        carbonOffSet: U256::from(12u64),
    }
}

#[async_trait::async_trait]
impl EthereumProvider for MockWallet {
    async fn client_version(&self) -> Result<String> {
        Ok(self.client_version.clone())
    }

    async fn chain_id(&self) -> Result<u64> {
        Ok(31415)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        Ok(self.accounts.clone())
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(anyhow::Error::new(RpcFailure {
                code: RpcFailure::USER_REJECTED,
                message: "wallet said no".to_string(),
            }));
        }
        match self.request_error {
            Some(code) => Err(anyhow::Error::new(RpcFailure {
                code,
                message: "wallet said no".to_string(),
            })),
            None => Ok(self.accounts.clone()),
        }
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        let recorded = Self::record(&request);
        self.calls.lock().unwrap().push(recorded.clone());
        self.answer(&recorded)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        self.sent.lock().unwrap().push(Self::record(&request));
        Ok(TX_HASH)
    }

    async fn get_receipt(&self, _hash: B256) -> Result<Option<TransactionReceipt>> {
        // Nothing is ever mined
        Ok(None)
    }

    fn endpoint_name(&self) -> String {
        "mock".to_string()
    }
}

/// Hands out the same mock wallet, or fails like an absent endpoint
pub struct MockFactory {
    pub wallet: Option<Arc<MockWallet>>,
}

#[async_trait::async_trait]
impl ProviderFactory for MockFactory {
    async fn connect(&self, config: &ProviderConfig) -> Result<Arc<dyn EthereumProvider>> {
        match &self.wallet {
            Some(wallet) => Ok(wallet.clone() as Arc<dyn EthereumProvider>),
            None => Err(anyhow!("{}: connection refused", config.display())),
        }
    }
}
