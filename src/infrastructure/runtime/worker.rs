//! Async worker - runs in Tokio runtime and handles wallet and contract calls

use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::time::Duration;

use alloy::primitives::{Address, Bytes};
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::core::{connect, ConnectOutcome, ConnectionContext};
use crate::domain::abi::AbiDecoder;
use crate::domain::audit::AuditQuery;
use crate::infrastructure::abi::{AbiScanner, AlloyAbiDecoder};
use crate::infrastructure::contracts::Submitted;
use crate::infrastructure::runtime::bridge::{RuntimeCommand, RuntimeEvent, WorkerOptions};
use crate::infrastructure::wallet::{detect_wallet, ProviderFactory, WalletDetection};

const IDLE_SLEEP: Duration = Duration::from_millis(25);

/// Run the async worker loop
///
/// Commands are handled one at a time in arrival order, so a write never
/// races the detail reload that follows it.
pub async fn run_async_worker(
    factory: Arc<dyn ProviderFactory>,
    options: WorkerOptions,
    cmd_rx: Receiver<RuntimeCommand>,
    evt_tx: Sender<RuntimeEvent>,
) -> Result<()> {
    let registry = AbiScanner::scan_roots(&options.abi_roots);
    info!(
        functions = registry.loaded_functions,
        files = registry.scanned_files,
        scan_ms = registry.scan_ms as u64,
        "ABI tables loaded"
    );

    let mut worker = Worker {
        factory,
        options,
        evt_tx,
        decoder: AlloyAbiDecoder::new(registry),
        context: None,
    };

    loop {
        match cmd_rx.try_recv() {
            Ok(RuntimeCommand::Shutdown) => {
                debug!("worker shutting down");
                return Ok(());
            }
            Ok(cmd) => worker.handle(cmd).await,
            Err(TryRecvError::Empty) => tokio::time::sleep(IDLE_SLEEP).await,
            // UI side dropped the bridge
            Err(TryRecvError::Disconnected) => return Ok(()),
        }
    }
}

struct Worker {
    factory: Arc<dyn ProviderFactory>,
    options: WorkerOptions,
    evt_tx: Sender<RuntimeEvent>,
    decoder: AlloyAbiDecoder,
    context: Option<ConnectionContext>,
}

impl Worker {
    fn emit(&self, event: RuntimeEvent) {
        let _ = self.evt_tx.send(event);
    }

    fn error(&self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.emit(RuntimeEvent::Error { message });
    }

    async fn handle(&mut self, cmd: RuntimeCommand) {
        match cmd {
            RuntimeCommand::Detect => {
                if matches!(self.detect().await, WalletDetection::Missing { .. }) {
                    self.drop_context();
                }
            }
            RuntimeCommand::Connect => self.connect().await,
            RuntimeCommand::LoadAudits { query } => self.load_audits(query).await,
            RuntimeCommand::LoadAuditDetails { audit } => self.load_details(audit).await,

            RuntimeCommand::BookForAudit {
                audit,
                auditor_name,
            } => {
                let Some(ctx) = self.connected() else { return };
                let result = ctx.audit(audit).book_for_audit(&auditor_name).await;
                self.after_write("Booking", Some(audit), result).await;
            }

            RuntimeCommand::SubmitReport {
                audit,
                report_uri,
                declaration,
                seal_uri,
                manifest_uri,
            } => {
                let Some(ctx) = self.connected() else { return };
                let result = ctx
                    .audit(audit)
                    .submit_audit_report(&report_uri, declaration, &seal_uri, &manifest_uri)
                    .await;
                self.after_write("Report submission", Some(audit), result)
                    .await;
            }

            RuntimeCommand::MakePublic { audit } => {
                let Some(ctx) = self.connected() else { return };
                let result = ctx.audit(audit).make_public().await;
                self.after_write("Publishing", Some(audit), result).await;
            }

            RuntimeCommand::Withdraw { audit } => {
                let Some(ctx) = self.connected() else { return };
                let result = ctx.audit(audit).withdraw().await;
                self.after_write("Withdrawal", Some(audit), result).await;
            }

            RuntimeCommand::UploadFiles { request } => {
                let Some(ctx) = self.connected() else { return };
                let manager = match ctx.manager() {
                    Ok(manager) => manager,
                    Err(err) => return self.error(format!("Upload failed: {err:#}")),
                };
                match manager.upload_files(&request).await {
                    Ok(submitted) => {
                        let audit = submitted.simulated;
                        // The new contract exists only once the transaction is mined
                        self.report_submitted(&submitted, Some(audit));
                    }
                    Err(err) => self.error(format!("Upload failed: {err:#}")),
                }
            }

            RuntimeCommand::CheckReceipt { tx_hash } => {
                let Some(ctx) = self.connected() else { return };
                match ctx.caller().provider().get_receipt(tx_hash).await {
                    Ok(Some(receipt)) => self.emit(RuntimeEvent::ReceiptReady {
                        tx_hash,
                        block_number: receipt.block_number,
                        success: Some(receipt.status()),
                    }),
                    Ok(None) => self.emit(RuntimeEvent::ReceiptReady {
                        tx_hash,
                        block_number: None,
                        success: None,
                    }),
                    Err(err) => self.error(format!("Receipt lookup failed: {err:#}")),
                }
            }

            // Handled by the loop
            RuntimeCommand::Shutdown => {}
        }
    }

    fn connected(&self) -> Option<ConnectionContext> {
        match &self.context {
            Some(ctx) => Some(ctx.clone()),
            None => {
                self.error("Not connected: run :connect first");
                None
            }
        }
    }

    async fn detect(&self) -> WalletDetection {
        let detection = detect_wallet(self.factory.as_ref(), self.options.endpoint.as_ref()).await;
        match &detection {
            WalletDetection::Missing { reason } => self.emit(RuntimeEvent::InstallPrompt {
                reason: reason.clone(),
            }),
            WalletDetection::Installed { info, .. } => {
                self.emit(RuntimeEvent::WalletDetected { info: info.clone() })
            }
        }
        detection
    }

    /// Forget the previous connection; only a successful connect installs one
    fn drop_context(&mut self) {
        if let Some(ctx) = self.context.take() {
            info!(account = %ctx.account, "dropping previous connection");
        }
    }

    async fn connect(&mut self) {
        self.drop_context();

        // Detect again: the wallet may have appeared since startup
        let detection = self.detect().await;
        if matches!(detection, WalletDetection::Missing { .. }) {
            return;
        }

        match connect(detection, &self.options.settings).await {
            ConnectOutcome::InstallPrompt { reason } => {
                self.emit(RuntimeEvent::InstallPrompt { reason })
            }
            ConnectOutcome::Failed(err) => self.emit(RuntimeEvent::ConnectFailed {
                message: err.to_string(),
            }),
            ConnectOutcome::Connected(ctx) => {
                self.emit(RuntimeEvent::Connected {
                    account: ctx.account,
                    endpoint: ctx.wallet.endpoint.clone(),
                    chain_id: ctx.chain_id,
                    registry: ctx.registry.address(),
                    manager: ctx.manager_address(),
                });
                if let Some(message) = &ctx.manager_error {
                    self.emit(RuntimeEvent::ManagerUnavailable {
                        message: message.clone(),
                    });
                }
                self.context = Some(*ctx);
            }
        }
    }

    async fn load_audits(&self, query: AuditQuery) {
        let Some(ctx) = self.connected() else { return };
        let manager = match ctx.manager() {
            Ok(manager) => manager,
            Err(err) => return self.error(format!("Cannot list audits: {err:#}")),
        };

        let audits = match manager.query(&query).await {
            Ok(audits) => audits,
            Err(err) => return self.error(format!("Loading {query} failed: {err:#}")),
        };
        info!(%query, count = audits.len(), "audits loaded");
        self.emit(RuntimeEvent::AuditsLoaded {
            query,
            audits: audits.clone(),
        });

        for address in audits {
            match ctx.audit(address).load_summary().await {
                Ok(summary) => self.emit(RuntimeEvent::AuditSummaryReady { summary }),
                Err(err) => self.error(format!("Audit {address}: {err:#}")),
            }
        }
    }

    async fn load_details(&self, audit: Address) {
        let Some(ctx) = self.connected() else { return };
        match ctx.audit(audit).load_details().await {
            Ok(details) => self.emit(RuntimeEvent::AuditDetailsReady {
                details: Box::new(details),
            }),
            Err(err) => self.error(format!("Audit {audit}: {err:#}")),
        }
    }

    async fn after_write<T>(&self, action: &str, audit: Option<Address>, result: Result<Submitted<T>>) {
        match result {
            Ok(submitted) => {
                self.report_submitted(&submitted, audit);
                if let Some(audit) = audit {
                    self.load_details(audit).await;
                }
            }
            Err(err) => self.error(format!("{action} failed: {err:#}")),
        }
    }

    fn report_submitted<T>(&self, submitted: &Submitted<T>, audit: Option<Address>) {
        self.emit(RuntimeEvent::TransactionSubmitted {
            tx_hash: submitted.tx_hash,
            call: self.describe_call(&submitted.calldata),
            audit,
        });
    }

    fn describe_call(&self, calldata: &Bytes) -> String {
        match self.decoder.decode_by_selector(calldata) {
            Ok(Some(call)) => call.summary(),
            Ok(None) => format!("0x{}", hex::encode(calldata.get(..4).unwrap_or_default())),
            Err(err) => {
                debug!("could not decode submitted calldata: {err:#}");
                format!("0x{}", hex::encode(calldata.get(..4).unwrap_or_default()))
            }
        }
    }
}
