//! Connection context - the account and contract handles of one connect

use std::sync::Arc;

use alloy::primitives::Address;
use chrono::{DateTime, Local};
use tracing::{info, warn};

use crate::domain::audit::AUDIT_MANAGER_NAME;
use crate::infrastructure::contracts::{
    AuditContract, AuditManager, ContractCaller, RegistryLookup,
};
use crate::infrastructure::ethereum::EthereumProvider;
use crate::infrastructure::wallet::{request_account, WalletDetection, WalletError, WalletInfo};

/// Registry address of the public testnet deployment
pub const DEFAULT_REGISTRY_ADDRESS: Address =
    alloy::primitives::address!("1d012AE2340C058D1473ACC911c0B3144B7F5EF2");

/// Where to find the audit manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectSettings {
    pub registry_address: Address,
    /// Registry name the audit manager is published under
    pub manager_name: String,
    /// Refuse wallets that do not identify as MetaMask
    pub require_metamask: bool,
}

impl Default for ConnectSettings {
    fn default() -> Self {
        Self {
            registry_address: DEFAULT_REGISTRY_ADDRESS,
            manager_name: AUDIT_MANAGER_NAME.to_string(),
            require_metamask: false,
        }
    }
}

/// Everything a successful connect produced
///
/// Created by exactly one `connect` and replaced wholesale by the next.
#[derive(Debug, Clone)]
pub struct ConnectionContext {
    pub account: Address,
    pub wallet: WalletInfo,
    pub chain_id: Option<u64>,
    pub registry: RegistryLookup,
    /// `None` when the registry could not resolve the manager
    pub manager: Option<AuditManager>,
    pub manager_error: Option<String>,
    pub connected_at: DateTime<Local>,
    caller: ContractCaller,
}

impl ConnectionContext {
    /// Handle for one audit contract, calling from the connected account
    pub fn audit(&self, address: Address) -> AuditContract {
        AuditContract::new(self.caller.clone(), address)
    }

    pub fn manager(&self) -> anyhow::Result<&AuditManager> {
        self.manager.as_ref().ok_or_else(|| {
            anyhow::anyhow!(
                "audit manager unavailable: {}",
                self.manager_error.as_deref().unwrap_or("not resolved")
            )
        })
    }

    pub fn manager_address(&self) -> Option<Address> {
        self.manager.as_ref().map(AuditManager::address)
    }

    pub fn caller(&self) -> &ContractCaller {
        &self.caller
    }
}

/// Result of one connect attempt
#[derive(Debug, Clone)]
pub enum ConnectOutcome {
    /// No wallet; prompt the user to install one
    InstallPrompt { reason: String },
    /// Wallet present but account access failed
    Failed(WalletError),
    Connected(Box<ConnectionContext>),
}

/// Request account access, then resolve and bind the audit manager
///
/// Never returns an error: every failure is logged and folded into the
/// outcome. A registry failure still yields a context, without a manager.
pub async fn connect(detection: WalletDetection, settings: &ConnectSettings) -> ConnectOutcome {
    let (provider, wallet) = match detection {
        WalletDetection::Missing { reason } => {
            info!(%reason, "wallet not installed, prompting for install");
            return ConnectOutcome::InstallPrompt { reason };
        }
        WalletDetection::Installed { provider, info } => (provider, info),
    };

    if settings.require_metamask && !wallet.is_metamask {
        warn!(client = %wallet.client_version, "wallet is not MetaMask");
        return ConnectOutcome::Failed(WalletError::NotMetaMask(wallet.client_version));
    }

    let account = match request_account(provider.as_ref()).await {
        Ok(account) => account,
        Err(err) => {
            warn!("wallet connection failed: {err}");
            return ConnectOutcome::Failed(err);
        }
    };
    info!(%account, endpoint = %wallet.endpoint, "wallet connected");

    ConnectOutcome::Connected(Box::new(bind_contracts(provider, wallet, account, settings).await))
}

async fn bind_contracts(
    provider: Arc<dyn EthereumProvider>,
    wallet: WalletInfo,
    account: Address,
    settings: &ConnectSettings,
) -> ConnectionContext {
    let chain_id = match provider.chain_id().await {
        Ok(chain_id) => Some(chain_id),
        Err(err) => {
            warn!("could not read chain id: {err:#}");
            None
        }
    };

    let caller = ContractCaller::new(provider, account);
    let registry = RegistryLookup::new(caller.clone(), settings.registry_address);

    let (manager, manager_error) = match registry.resolve(&settings.manager_name).await {
        Ok(address) => {
            info!(manager = %address, "loading audit manager");
            (Some(AuditManager::new(caller.clone(), address)), None)
        }
        Err(err) => {
            warn!(
                registry = %settings.registry_address,
                name = %settings.manager_name,
                "audit manager lookup failed: {err:#}"
            );
            (None, Some(format!("{err:#}")))
        }
    };

    ConnectionContext {
        account,
        wallet,
        chain_id,
        registry,
        manager,
        manager_error,
        connected_at: Local::now(),
        caller,
    }
}
