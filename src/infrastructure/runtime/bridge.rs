//! Runtime bridge - connects sync TUI thread with async Tokio runtime
//!
//! The TUI (ratatui) thread never awaits; it queues `RuntimeCommand`s and
//! drains `RuntimeEvent`s each frame while the worker talks to the wallet.

use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use alloy::primitives::{Address, B256};
use anyhow::Context;
use tokio::runtime::Runtime;
use tracing::error;

use crate::core::ConnectSettings;
use crate::domain::audit::{AuditDetails, AuditQuery, AuditSummary, Declaration, UploadRequest};
use crate::infrastructure::runtime::worker::run_async_worker;
use crate::infrastructure::wallet::{
    AlloyProviderFactory, ProviderFactory, WalletEndpoint, WalletInfo,
};

/// Commands sent from the TUI to the async worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCommand {
    /// Probe for a wallet (decides the connect button's label)
    Detect,
    /// Request account access and bind the contracts
    Connect,
    /// List audit contracts from the manager
    LoadAudits { query: AuditQuery },
    /// Read everything about one audit contract
    LoadAuditDetails { audit: Address },
    BookForAudit {
        audit: Address,
        auditor_name: String,
    },
    SubmitReport {
        audit: Address,
        report_uri: String,
        declaration: Declaration,
        seal_uri: String,
        manifest_uri: String,
    },
    MakePublic { audit: Address },
    Withdraw { audit: Address },
    UploadFiles { request: UploadRequest },
    /// Look up the receipt of a submitted transaction once
    CheckReceipt { tx_hash: B256 },
    /// Shutdown the worker
    Shutdown,
}

/// Events sent from the async worker to the TUI
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    /// A wallet answered on the configured endpoint
    WalletDetected { info: WalletInfo },
    /// No wallet; show the install prompt
    InstallPrompt { reason: String },
    /// Account access granted
    Connected {
        account: Address,
        endpoint: String,
        chain_id: Option<u64>,
        registry: Address,
        manager: Option<Address>,
    },
    /// Account access failed
    ConnectFailed { message: String },
    /// Connected, but the registry did not resolve the audit manager
    ManagerUnavailable { message: String },
    /// Manager index query answered
    AuditsLoaded {
        query: AuditQuery,
        audits: Vec<Address>,
    },
    /// List row data for one audit
    AuditSummaryReady { summary: AuditSummary },
    /// Detail panel data for one audit
    AuditDetailsReady { details: Box<AuditDetails> },
    /// The wallet accepted a transaction
    TransactionSubmitted {
        tx_hash: B256,
        /// Decoded call, e.g. `bookForAudit(_auditorName="...")`
        call: String,
        /// Audit contract the transaction touched or created
        audit: Option<Address>,
    },
    /// Receipt lookup answered
    ReceiptReady {
        tx_hash: B256,
        /// `None` while the transaction is pending
        block_number: Option<u64>,
        success: Option<bool>,
    },
    /// Error occurred
    Error { message: String },
}

/// What the worker needs to know to connect
#[derive(Debug, Clone, Default)]
pub struct WorkerOptions {
    pub endpoint: Option<WalletEndpoint>,
    pub settings: ConnectSettings,
    /// Extra ABI directories for decoding the activity log
    pub abi_roots: Vec<PathBuf>,
}

/// Bridge between sync TUI thread and async Tokio runtime
pub struct RuntimeBridge {
    cmd_tx: Sender<RuntimeCommand>,
    evt_rx: Receiver<RuntimeEvent>,
}

impl RuntimeBridge {
    /// Create a bridge talking to real wallet endpoints
    pub fn new(options: WorkerOptions) -> anyhow::Result<Self> {
        Self::with_factory(options, Arc::new(AlloyProviderFactory))
    }

    /// Create a bridge with a custom provider factory
    pub fn with_factory(
        options: WorkerOptions,
        factory: Arc<dyn ProviderFactory>,
    ) -> anyhow::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<RuntimeCommand>();
        let (evt_tx, evt_rx) = mpsc::channel::<RuntimeEvent>();

        let rt = Runtime::new().context("Failed to create Tokio runtime")?;

        // The worker owns its runtime on a dedicated thread
        thread::Builder::new()
            .name("auditdesk-worker".to_string())
            .spawn(move || {
                rt.block_on(async {
                    if let Err(err) = run_async_worker(factory, options, cmd_rx, evt_tx.clone()).await
                    {
                        error!("worker exited: {err:#}");
                        let _ = evt_tx.send(RuntimeEvent::Error {
                            message: format!("Worker exited: {:#}", err),
                        });
                    }
                });
            })
            .context("Failed to spawn worker thread")?;

        Ok(Self { cmd_tx, evt_rx })
    }

    /// Send a command to the async worker
    pub fn send(&self, cmd: RuntimeCommand) -> anyhow::Result<()> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow::anyhow!("Worker channel closed"))
    }

    /// Poll for events (non-blocking)
    pub fn poll_events(&self) -> Vec<RuntimeEvent> {
        let mut events = Vec::new();
        while let Ok(evt) = self.evt_rx.try_recv() {
            events.push(evt);
        }
        events
    }

    /// Wait for the next event (headless mode)
    pub fn recv(&self) -> Option<RuntimeEvent> {
        self.evt_rx.recv().ok()
    }
}

impl Drop for RuntimeBridge {
    fn drop(&mut self) {
        let _ = self.cmd_tx.send(RuntimeCommand::Shutdown);
    }
}
