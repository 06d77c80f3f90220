//! Ethereum provider abstraction and Alloy implementations
//!
//! The wallet is reached through its JSON-RPC endpoint. Account access goes
//! through `eth_requestAccounts` and writes through `eth_sendTransaction`, so
//! signing always stays inside the wallet.

use std::path::PathBuf;

use alloy::network::Ethereum;
use alloy::primitives::{Address, Bytes, B256};
use alloy::providers::{
    fillers::{BlobGasFiller, ChainIdFiller, FillProvider, GasFiller, JoinFill, NonceFiller},
    Identity, Provider, ProviderBuilder, RootProvider,
};
use alloy::rpc::types::{TransactionReceipt, TransactionRequest};
use alloy::transports::{RpcError, TransportErrorKind};
use anyhow::{Context, Result};

/// Provider configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderConfig {
    /// HTTP JSON-RPC endpoint
    Http(String),
    /// WebSocket endpoint
    WebSocket(String),
    /// IPC socket path (Unix only)
    #[cfg(unix)]
    Ipc(PathBuf),
}

impl ProviderConfig {
    /// Get display name for this endpoint
    pub fn display(&self) -> String {
        match self {
            ProviderConfig::Http(url) => url.clone(),
            ProviderConfig::WebSocket(url) => url.clone(),
            #[cfg(unix)]
            ProviderConfig::Ipc(path) => path.display().to_string(),
        }
    }

    /// Pick the transport from the URL scheme
    pub fn from_url(url: &str) -> Self {
        let trimmed = url.trim();
        if trimmed.starts_with("ws://") || trimmed.starts_with("wss://") {
            ProviderConfig::WebSocket(trimmed.to_string())
        } else if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
            ProviderConfig::Http(trimmed.to_string())
        } else {
            ProviderConfig::Http(format!("http://{}", trimmed))
        }
    }
}

/// JSON-RPC error response returned by the wallet or node
///
/// Carried inside `anyhow::Error` so callers can classify failures by code
/// (e.g. 4001 for a rejected permission request).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcFailure {
    pub code: i64,
    pub message: String,
}

impl RpcFailure {
    /// EIP-1193 "user rejected the request"
    pub const USER_REJECTED: i64 = 4001;
    /// JSON-RPC "method not found"
    pub const METHOD_NOT_FOUND: i64 = -32601;

    /// Extract the RPC failure carried by an error, if any
    pub fn from_error(err: &anyhow::Error) -> Option<&RpcFailure> {
        err.chain().find_map(|cause| cause.downcast_ref::<RpcFailure>())
    }
}

/// Abstract Ethereum provider trait
///
/// All operations the wallet connection and contract handles need,
/// abstracting over the specific Alloy transport.
#[async_trait::async_trait]
pub trait EthereumProvider: Send + Sync + 'static {
    /// Get client version (used for wallet detection)
    async fn client_version(&self) -> Result<String>;

    /// Get the chain id the wallet is connected to
    async fn chain_id(&self) -> Result<u64>;

    /// Accounts already exposed to us (`eth_accounts`)
    async fn accounts(&self) -> Result<Vec<Address>>;

    /// Ask the wallet for account access (`eth_requestAccounts`)
    async fn request_accounts(&self) -> Result<Vec<Address>>;

    /// Execute a read-only call (`eth_call`)
    async fn call(&self, request: TransactionRequest) -> Result<Bytes>;

    /// Hand a transaction to the wallet for signing (`eth_sendTransaction`)
    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256>;

    /// Receipt of a submitted transaction, `None` while pending
    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>>;

    /// Get endpoint display name
    fn endpoint_name(&self) -> String;
}

// All transports share the recommended filler stack
type FilledProvider = FillProvider<
    JoinFill<
        Identity,
        JoinFill<GasFiller, JoinFill<BlobGasFiller, JoinFill<NonceFiller, ChainIdFiller>>>,
    >,
    RootProvider,
    Ethereum,
>;

/// Enum-based provider that remembers which transport it was built on
pub enum AlloyProvider {
    Http {
        provider: FilledProvider,
        endpoint: String,
    },
    WebSocket {
        provider: FilledProvider,
        endpoint: String,
    },
    #[cfg(unix)]
    Ipc {
        provider: FilledProvider,
        endpoint: String,
    },
}

/// Create a provider from configuration
pub async fn create_provider(config: ProviderConfig) -> Result<Box<dyn EthereumProvider>> {
    match config {
        ProviderConfig::Http(url) => {
            let rpc_url = url.parse().context("Invalid HTTP URL")?;
            let provider = ProviderBuilder::new().connect_http(rpc_url);
            Ok(Box::new(AlloyProvider::Http {
                provider,
                endpoint: url,
            }))
        }
        ProviderConfig::WebSocket(url) => {
            let provider = ProviderBuilder::new()
                .connect(&url)
                .await
                .context("Failed to create WebSocket provider")?;
            Ok(Box::new(AlloyProvider::WebSocket {
                provider,
                endpoint: url,
            }))
        }
        #[cfg(unix)]
        ProviderConfig::Ipc(path) => {
            use alloy::providers::IpcConnect;
            let ipc = IpcConnect::new(path.to_string_lossy().to_string());
            let provider = ProviderBuilder::new()
                .connect_ipc(ipc)
                .await
                .context("Failed to create IPC provider")?;
            Ok(Box::new(AlloyProvider::Ipc {
                provider,
                endpoint: path.display().to_string(),
            }))
        }
    }
}

impl AlloyProvider {
    fn inner(&self) -> &FilledProvider {
        match self {
            AlloyProvider::Http { provider, .. } => provider,
            AlloyProvider::WebSocket { provider, .. } => provider,
            #[cfg(unix)]
            AlloyProvider::Ipc { provider, .. } => provider,
        }
    }
}

/// Keep the JSON-RPC error code when converting transport errors
fn rpc_error(err: RpcError<TransportErrorKind>) -> anyhow::Error {
    match err.as_error_resp() {
        Some(payload) => RpcFailure {
            code: payload.code,
            message: payload.message.to_string(),
        }
        .into(),
        None => err.into(),
    }
}

#[async_trait::async_trait]
impl EthereumProvider for AlloyProvider {
    async fn client_version(&self) -> Result<String> {
        self.inner().get_client_version().await.map_err(rpc_error)
    }

    async fn chain_id(&self) -> Result<u64> {
        self.inner().get_chain_id().await.map_err(rpc_error)
    }

    async fn accounts(&self) -> Result<Vec<Address>> {
        self.inner().get_accounts().await.map_err(rpc_error)
    }

    async fn request_accounts(&self) -> Result<Vec<Address>> {
        let accounts: Vec<Address> = self
            .inner()
            .raw_request("eth_requestAccounts".into(), ())
            .await
            .map_err(rpc_error)?;
        Ok(accounts)
    }

    async fn call(&self, request: TransactionRequest) -> Result<Bytes> {
        self.inner().call(request).await.map_err(rpc_error)
    }

    async fn send_transaction(&self, request: TransactionRequest) -> Result<B256> {
        let pending = self
            .inner()
            .send_transaction(request)
            .await
            .map_err(rpc_error)?;
        Ok(*pending.tx_hash())
    }

    async fn get_receipt(&self, hash: B256) -> Result<Option<TransactionReceipt>> {
        self.inner()
            .get_transaction_receipt(hash)
            .await
            .map_err(rpc_error)
    }

    fn endpoint_name(&self) -> String {
        match self {
            AlloyProvider::Http { endpoint, .. } => endpoint.clone(),
            AlloyProvider::WebSocket { endpoint, .. } => endpoint.clone(),
            #[cfg(unix)]
            AlloyProvider::Ipc { endpoint, .. } => endpoint.clone(),
        }
    }
}
