//! Shared call plumbing for the contract handles

use std::sync::Arc;

use alloy::primitives::{Address, Bytes, TxKind, B256};
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy_sol_types::SolCall;
use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::infrastructure::ethereum::EthereumProvider;

/// A write accepted by the wallet, with the return value seen in simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submitted<T> {
    pub tx_hash: B256,
    pub simulated: T,
    /// Calldata handed to the wallet
    pub calldata: Bytes,
}

/// Issues calls on behalf of the connected account
///
/// Every request carries `from = account`, reads and writes alike.
#[derive(Clone)]
pub struct ContractCaller {
    provider: Arc<dyn EthereumProvider>,
    from: Address,
}

impl ContractCaller {
    pub fn new(provider: Arc<dyn EthereumProvider>, from: Address) -> Self {
        Self { provider, from }
    }

    /// The account every call is sent from
    pub fn account(&self) -> Address {
        self.from
    }

    pub fn provider(&self) -> &Arc<dyn EthereumProvider> {
        &self.provider
    }

    fn request<C: SolCall>(&self, to: Address, call: &C) -> TransactionRequest {
        TransactionRequest {
            from: Some(self.from),
            to: Some(TxKind::Call(to)),
            input: TransactionInput::new(call.abi_encode().into()),
            ..Default::default()
        }
    }

    /// Run a view/pure method via `eth_call` and decode its return value
    pub async fn read<C: SolCall>(&self, to: Address, call: &C) -> Result<C::Return> {
        debug!(method = C::SIGNATURE, %to, from = %self.from, "eth_call");
        let output = self
            .provider
            .call(self.request(to, call))
            .await
            .with_context(|| format!("{} on {to} failed", C::SIGNATURE))?;
        C::abi_decode_returns(&output)
            .with_context(|| format!("Failed to decode {} return data", C::SIGNATURE))
    }

    /// Simulate a state-changing method, then hand it to the wallet to sign
    ///
    /// A revert during simulation aborts before the wallet is prompted.
    pub async fn send<C: SolCall>(&self, to: Address, call: &C) -> Result<Submitted<C::Return>> {
        let simulated = self.read(to, call).await?;
        let request = self.request(to, call);
        let calldata = request.input.input().cloned().unwrap_or_default();
        let tx_hash = self
            .provider
            .send_transaction(request)
            .await
            .with_context(|| format!("Wallet did not submit {}", C::SIGNATURE))?;
        info!(method = C::SIGNATURE, %to, %tx_hash, "transaction submitted");
        Ok(Submitted {
            tx_hash,
            simulated,
            calldata,
        })
    }
}

impl std::fmt::Debug for ContractCaller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContractCaller")
            .field("endpoint", &self.provider.endpoint_name())
            .field("from", &self.from)
            .finish()
    }
}
