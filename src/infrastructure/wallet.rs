//! Wallet boundary - detection and account access
//!
//! The wallet's callback/exception style is flattened into plain values:
//! detection yields a `WalletDetection`, account access a
//! `Result<Address, WalletError>`.

use std::sync::Arc;

use alloy::primitives::Address;
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::infrastructure::ethereum::{create_provider, EthereumProvider, ProviderConfig, RpcFailure};

/// A configured wallet endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletEndpoint {
    pub config: ProviderConfig,
    pub name: Option<String>,
    /// Endpoint is a MetaMask bridge even if its client version says otherwise
    pub metamask: bool,
}

impl WalletEndpoint {
    pub fn display(&self) -> String {
        match &self.name {
            Some(name) => format!("{} ({})", name, self.config.display()),
            None => self.config.display(),
        }
    }
}

/// What detection learned about the wallet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub endpoint: String,
    pub client_version: String,
    pub is_metamask: bool,
}

/// Outcome of probing for a wallet
#[derive(Clone)]
pub enum WalletDetection {
    /// No usable wallet; the UI should offer installation
    Missing { reason: String },
    Installed {
        provider: Arc<dyn EthereumProvider>,
        info: WalletInfo,
    },
}

impl std::fmt::Debug for WalletDetection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WalletDetection::Missing { reason } => {
                f.debug_struct("Missing").field("reason", reason).finish()
            }
            WalletDetection::Installed { info, .. } => {
                f.debug_struct("Installed").field("info", info).finish()
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WalletError {
    #[error("wallet '{0}' is not MetaMask")]
    NotMetaMask(String),
    #[error("account access rejected: {0}")]
    Rejected(String),
    #[error("wallet exposed no accounts")]
    NoAccounts,
    #[error("wallet request failed: {0}")]
    Transport(String),
}

/// Builds providers for wallet endpoints
#[async_trait::async_trait]
pub trait ProviderFactory: Send + Sync {
    async fn connect(&self, config: &ProviderConfig) -> Result<Arc<dyn EthereumProvider>>;
}

/// Factory backed by real alloy transports
#[derive(Debug, Clone, Copy, Default)]
pub struct AlloyProviderFactory;

#[async_trait::async_trait]
impl ProviderFactory for AlloyProviderFactory {
    async fn connect(&self, config: &ProviderConfig) -> Result<Arc<dyn EthereumProvider>> {
        Ok(Arc::from(create_provider(config.clone()).await?))
    }
}

fn is_metamask_version(client_version: &str) -> bool {
    client_version.to_lowercase().contains("metamask")
}

/// Probe the endpoint for a wallet
///
/// Never fails: anything that prevents talking to the wallet is reported as
/// `Missing` so the caller can fall back to the install prompt.
pub async fn detect_wallet(
    factory: &dyn ProviderFactory,
    endpoint: Option<&WalletEndpoint>,
) -> WalletDetection {
    let Some(endpoint) = endpoint else {
        info!("no wallet endpoint configured");
        return WalletDetection::Missing {
            reason: "no wallet endpoint configured".to_string(),
        };
    };

    let provider = match factory.connect(&endpoint.config).await {
        Ok(provider) => provider,
        Err(err) => {
            warn!(endpoint = %endpoint.display(), "wallet unreachable: {err:#}");
            return WalletDetection::Missing {
                reason: format!("{}: {err:#}", endpoint.display()),
            };
        }
    };

    match provider.client_version().await {
        Ok(client_version) => {
            let is_metamask = endpoint.metamask || is_metamask_version(&client_version);
            info!(endpoint = %endpoint.display(), %client_version, is_metamask, "wallet installed");
            WalletDetection::Installed {
                info: WalletInfo {
                    endpoint: provider.endpoint_name(),
                    client_version,
                    is_metamask,
                },
                provider,
            }
        }
        Err(err) => {
            warn!(endpoint = %endpoint.display(), "wallet did not answer: {err:#}");
            WalletDetection::Missing {
                reason: format!("{}: {err:#}", endpoint.display()),
            }
        }
    }
}

/// Ask the wallet for access and return the first account
///
/// Wallets that predate `eth_requestAccounts` (plain dev nodes) are asked via
/// `eth_accounts` instead.
pub async fn request_account(provider: &dyn EthereumProvider) -> Result<Address, WalletError> {
    let accounts = match provider.request_accounts().await {
        Ok(accounts) => accounts,
        Err(err) => match RpcFailure::from_error(&err) {
            Some(failure) if failure.code == RpcFailure::USER_REJECTED => {
                return Err(WalletError::Rejected(failure.message.clone()));
            }
            Some(failure) if failure.code == RpcFailure::METHOD_NOT_FOUND => {
                debug!("eth_requestAccounts unsupported, falling back to eth_accounts");
                provider
                    .accounts()
                    .await
                    .map_err(|err| WalletError::Transport(format!("{err:#}")))?
            }
            _ => return Err(WalletError::Transport(format!("{err:#}"))),
        },
    };

    accounts.first().copied().ok_or(WalletError::NoAccounts)
}
