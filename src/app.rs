use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};

use alloy::primitives::{Address, B256};
use chrono::{DateTime, Local};

use crate::core::{
    parse_address, parse_command, parse_upload_fields, Action, Command, NotifyLevel,
};
use crate::domain::audit::{AuditDetails, AuditQuery, AuditSummary, Declaration};
use crate::infrastructure::contracts::{check_tables, ConformanceReport};
use crate::infrastructure::runtime::{RuntimeCommand, RuntimeEvent};
use crate::infrastructure::wallet::WalletInfo;

const MAX_ACTIVITY: usize = 200;
const STATUS_TTL: Duration = Duration::from_secs(4);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Details,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusLevel {
    Info,
    Warn,
    Error,
}

impl From<NotifyLevel> for StatusLevel {
    fn from(level: NotifyLevel) -> Self {
        match level {
            NotifyLevel::Info => StatusLevel::Info,
            NotifyLevel::Warn => StatusLevel::Warn,
            NotifyLevel::Error => StatusLevel::Error,
        }
    }
}

/// The wallet button in the header
///
/// `Install` → `Onboarding` when no wallet is found; `Connect` →
/// `Connecting` → `Connected` when one is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectButton {
    /// Wallet not checked yet
    Detecting,
    Install,
    Onboarding,
    Connect,
    Connecting,
    Connected,
}

impl ConnectButton {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectButton::Detecting => "Looking for a wallet…",
            ConnectButton::Install => "Click here to install a wallet",
            ConnectButton::Onboarding => "Onboarding in progress",
            ConnectButton::Connect => "Click to connect wallet",
            ConnectButton::Connecting => "Waiting for wallet…",
            ConnectButton::Connected => "Web3 connected",
        }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(
            self,
            ConnectButton::Install | ConnectButton::Connect | ConnectButton::Connected
        )
    }
}

#[derive(Debug, Default, Clone)]
pub struct CommandBar {
    pub input: String,
    pub last: Option<String>,
}

#[derive(Debug, Clone)]
pub struct StatusMessage {
    pub text: String,
    pub level: StatusLevel,
    pub since: Instant,
}

/// One line of the activity log
#[derive(Debug, Clone)]
pub struct ActivityEntry {
    pub at: DateTime<Local>,
    pub level: StatusLevel,
    pub text: String,
}

#[derive(Debug, Clone, Default)]
pub struct Connection {
    pub account: Address,
    pub endpoint: String,
    pub chain_id: Option<u64>,
    pub registry: Address,
    pub manager: Option<Address>,
}

#[derive(Debug)]
pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub focus: Focus,
    pub command: CommandBar,
    pub button: ConnectButton,
    pub wallet: Option<WalletInfo>,
    pub connection: Option<Connection>,
    pub query: Option<AuditQuery>,
    pub audits: Vec<Address>,
    pub summaries: HashMap<Address, AuditSummary>,
    pub selected: usize,
    pub details: Option<AuditDetails>,
    pub activity: VecDeque<ActivityEntry>,
    pub conformance: Option<ConformanceReport>,
    /// Most recent transaction handed to the wallet
    pub last_tx: Option<B256>,
    status: Option<StatusMessage>,
    pending: Vec<RuntimeCommand>,
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

impl App {
    pub fn new() -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Normal,
            focus: Focus::List,
            command: CommandBar::default(),
            button: ConnectButton::Detecting,
            wallet: None,
            connection: None,
            query: None,
            audits: Vec::new(),
            summaries: HashMap::new(),
            selected: 0,
            details: None,
            activity: VecDeque::new(),
            conformance: None,
            last_tx: None,
            status: None,
            pending: Vec::new(),
        }
    }

    pub fn set_status(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.status = Some(StatusMessage {
            text: text.into(),
            level,
            since: Instant::now(),
        });
    }

    pub fn status_text(&self) -> Option<(&str, StatusLevel)> {
        self.status
            .as_ref()
            .map(|status| (status.text.as_str(), status.level))
    }

    pub fn on_tick(&mut self) {
        if let Some(status) = self.status.as_ref() {
            if status.since.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
    }

    /// Status bar message that is also kept in the activity log
    pub fn notify(&mut self, text: impl Into<String>, level: StatusLevel) {
        let text = text.into();
        self.log_activity(text.clone(), level);
        self.set_status(text, level);
    }

    pub fn log_activity(&mut self, text: impl Into<String>, level: StatusLevel) {
        self.activity.push_front(ActivityEntry {
            at: Local::now(),
            level,
            text: text.into(),
        });
        self.activity.truncate(MAX_ACTIVITY);
    }

    /// "Wallet :: <account>" once connected
    pub fn wallet_line(&self) -> String {
        match &self.connection {
            Some(connection) => format!("Wallet :: {}", connection.account),
            None => "Wallet :: --".to_string(),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.connection.as_ref().map(|c| c.account)
    }

    /// Commands queued for the worker since the last call
    pub fn take_runtime_commands(&mut self) -> Vec<RuntimeCommand> {
        std::mem::take(&mut self.pending)
    }

    fn dispatch(&mut self, cmd: RuntimeCommand) {
        self.pending.push(cmd);
    }

    // Wallet button

    pub fn press_connect(&mut self) {
        match self.button {
            ConnectButton::Install => {
                self.button = ConnectButton::Onboarding;
                self.notify(
                    "Onboarding in progress: install a wallet, then run :connect",
                    StatusLevel::Info,
                );
            }
            ConnectButton::Connect | ConnectButton::Connected => self.start_connect(),
            ConnectButton::Detecting | ConnectButton::Onboarding | ConnectButton::Connecting => {
                let label = self.button.label();
                self.set_status(label, StatusLevel::Warn);
            }
        }
    }

    fn start_connect(&mut self) {
        if self.button == ConnectButton::Connecting {
            self.set_status("Already waiting for the wallet", StatusLevel::Warn);
            return;
        }
        if self.button != ConnectButton::Onboarding {
            self.button = ConnectButton::Connecting;
        }
        self.set_status("Requesting account access…", StatusLevel::Info);
        self.dispatch(RuntimeCommand::Connect);
    }

    // Audit list

    pub fn selected_audit(&self) -> Option<Address> {
        self.audits.get(self.selected).copied()
    }

    /// The audit actions apply to: the open one, else the highlighted row
    pub fn target_audit(&self) -> Option<Address> {
        self.details
            .as_ref()
            .map(|details| details.address)
            .or_else(|| self.selected_audit())
    }

    pub fn select_next(&mut self) {
        if !self.audits.is_empty() {
            self.selected = (self.selected + 1).min(self.audits.len() - 1);
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn open_selected(&mut self) {
        match self.selected_audit() {
            Some(audit) => {
                self.focus = Focus::Details;
                self.dispatch(RuntimeCommand::LoadAuditDetails { audit });
            }
            None => self.set_status("No audit selected", StatusLevel::Warn),
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Details,
            Focus::Details => Focus::List,
        };
    }

    // Command bar

    pub fn enter_command(&mut self) {
        self.input_mode = InputMode::Command;
        self.command.input.clear();
    }

    pub fn exit_command(&mut self) {
        self.input_mode = InputMode::Normal;
        self.command.input.clear();
    }

    pub fn apply_command(&mut self) {
        let input = self.command.input.trim().to_string();
        if input.is_empty() {
            self.exit_command();
            return;
        }

        let cmd = parse_command(&input);
        let action = self.execute_command(&cmd);
        self.apply_action(action);
        self.command.last = Some(input);
        self.exit_command();
    }

    /// Execute a parsed command
    pub fn execute_command(&mut self, cmd: &Command) -> Action {
        match cmd {
            Command::Connect => {
                self.start_connect();
                Action::None
            }

            Command::Mine => self.list(AuditQuery::Mine),
            Command::Public(None) => self.list(AuditQuery::Public),
            Command::Public(Some(user)) => match parse_address(user) {
                Ok(user) => self.list(AuditQuery::PublicForUser(user)),
                Err(err) => Action::Notify(format!("{err:#}"), NotifyLevel::Error),
            },
            Command::Status(status) => self.list(AuditQuery::WithStatus(status.clone())),
            Command::Auditor(auditor) => {
                let auditor = match auditor {
                    Some(value) => parse_address(value),
                    None => self
                        .account()
                        .ok_or_else(|| anyhow::anyhow!("Not connected: give an auditor address")),
                };
                match auditor {
                    Ok(auditor) => self.list(AuditQuery::UnderAuditor(auditor)),
                    Err(err) => Action::Notify(format!("{err:#}"), NotifyLevel::Error),
                }
            }
            Command::Open(value) => match parse_address(value) {
                Ok(audit) => {
                    if let Some(idx) = self.audits.iter().position(|a| *a == audit) {
                        self.selected = idx;
                    }
                    self.focus = Focus::Details;
                    Action::Dispatch(RuntimeCommand::LoadAuditDetails { audit })
                }
                Err(err) => Action::Notify(format!("{err:#}"), NotifyLevel::Error),
            },
            Command::Refresh => {
                if let Some(details) = &self.details {
                    let audit = details.address;
                    self.dispatch(RuntimeCommand::LoadAuditDetails { audit });
                }
                match self.query.clone() {
                    Some(query) => Action::Dispatch(RuntimeCommand::LoadAudits { query }),
                    None => Action::Notify("Nothing to refresh".to_string(), NotifyLevel::Warn),
                }
            }

            Command::Book(auditor_name) => self.audit_action(|audit| RuntimeCommand::BookForAudit {
                audit,
                auditor_name: auditor_name.clone(),
            }),
            Command::Submit {
                report_uri,
                declaration,
                seal_uri,
                manifest_uri,
            } => match declaration.parse::<u8>() {
                Ok(declaration) => self.audit_action(|audit| RuntimeCommand::SubmitReport {
                    audit,
                    report_uri: report_uri.clone(),
                    declaration: Declaration(declaration),
                    seal_uri: seal_uri.clone(),
                    manifest_uri: manifest_uri.clone(),
                }),
                Err(_) => Action::Notify(
                    format!("Declaration must be a number 0-255, got '{declaration}'"),
                    NotifyLevel::Error,
                ),
            },
            Command::Publish => self.audit_action(|audit| RuntimeCommand::MakePublic { audit }),
            Command::Withdraw => self.audit_action(|audit| RuntimeCommand::Withdraw { audit }),
            Command::Upload(fields) => match parse_upload_fields(fields) {
                Ok(request) => Action::Dispatch(RuntimeCommand::UploadFiles { request }),
                Err(err) => Action::Notify(format!("Upload: {err:#}"), NotifyLevel::Error),
            },
            Command::Receipt(value) => {
                let tx_hash = match value {
                    Some(value) => value
                        .trim()
                        .parse::<B256>()
                        .map_err(|_| format!("'{}' is not a transaction hash", value.trim())),
                    None => self
                        .last_tx
                        .ok_or_else(|| "No transaction submitted yet".to_string()),
                };
                match tx_hash {
                    Ok(tx_hash) => Action::Dispatch(RuntimeCommand::CheckReceipt { tx_hash }),
                    Err(message) => Action::Notify(message, NotifyLevel::Warn),
                }
            }

            Command::Abi => {
                let report = check_tables();
                let action = if report.is_ok() {
                    Action::Notify(
                        format!(
                            "ABI tables match bindings ({} methods)",
                            report.checked_methods
                        ),
                        NotifyLevel::Info,
                    )
                } else {
                    for mismatch in &report.mismatches {
                        self.log_activity(mismatch.to_string(), StatusLevel::Error);
                    }
                    Action::Notify(
                        format!("{} ABI mismatches", report.mismatches.len()),
                        NotifyLevel::Error,
                    )
                };
                self.conformance = Some(report);
                action
            }
            Command::Quit => Action::Quit,

            Command::Unknown(s) => {
                Action::Notify(format!("Unknown command: {}", s), NotifyLevel::Warn)
            }
        }
    }

    fn list(&mut self, query: AuditQuery) -> Action {
        if self.connection.is_none() {
            return Action::Notify(
                "Not connected: run :connect first".to_string(),
                NotifyLevel::Warn,
            );
        }
        Action::Dispatch(RuntimeCommand::LoadAudits { query })
    }

    fn audit_action(&mut self, build: impl FnOnce(Address) -> RuntimeCommand) -> Action {
        match self.target_audit() {
            Some(audit) => Action::Dispatch(build(audit)),
            None => Action::Notify(
                "Select or :open an audit first".to_string(),
                NotifyLevel::Warn,
            ),
        }
    }

    /// Apply an action returned by a command
    pub fn apply_action(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Dispatch(cmd) => self.dispatch(cmd),
            Action::Notify(msg, level) => self.notify(msg, level.into()),
            Action::Quit => self.should_quit = true,
        }
    }

    // Runtime events

    pub fn apply_event(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::WalletDetected { info } => self.apply_wallet_detected(info),
            RuntimeEvent::InstallPrompt { reason } => self.apply_install_prompt(reason),
            RuntimeEvent::Connected {
                account,
                endpoint,
                chain_id,
                registry,
                manager,
            } => self.apply_connected(Connection {
                account,
                endpoint,
                chain_id,
                registry,
                manager,
            }),
            RuntimeEvent::ConnectFailed { message } => {
                self.button = ConnectButton::Connect;
                self.drop_connection();
                self.notify(format!("Wallet connection failed: {message}"), StatusLevel::Error);
            }
            RuntimeEvent::ManagerUnavailable { message } => {
                self.notify(format!("Audit manager unavailable: {message}"), StatusLevel::Warn);
            }
            RuntimeEvent::AuditsLoaded { query, audits } => self.apply_audits(query, audits),
            RuntimeEvent::AuditSummaryReady { summary } => {
                self.summaries.insert(summary.address, summary);
            }
            RuntimeEvent::AuditDetailsReady { details } => {
                let details = *details;
                self.summaries.insert(
                    details.address,
                    AuditSummary {
                        address: details.address,
                        name: details.name.clone(),
                        status: details.status.clone(),
                        title: details.seed.title.clone(),
                        owner_name: details.seed.owner_name.clone(),
                        version: details.version,
                    },
                );
                self.details = Some(details);
            }
            RuntimeEvent::TransactionSubmitted {
                tx_hash,
                call,
                audit,
            } => {
                let mut text = format!("Submitted {call} tx {tx_hash}");
                if let Some(audit) = audit {
                    text.push_str(&format!(" ({audit})"));
                }
                self.last_tx = Some(tx_hash);
                self.notify(text, StatusLevel::Info);
            }
            RuntimeEvent::ReceiptReady {
                tx_hash,
                block_number,
                success,
            } => match success {
                None => self.notify(format!("tx {tx_hash} pending"), StatusLevel::Info),
                Some(true) => self.notify(
                    format!(
                        "tx {tx_hash} mined in block {}",
                        block_number.map(|n| n.to_string()).unwrap_or_else(|| "?".into())
                    ),
                    StatusLevel::Info,
                ),
                Some(false) => self.notify(format!("tx {tx_hash} reverted"), StatusLevel::Error),
            },
            RuntimeEvent::Error { message } => self.notify(message, StatusLevel::Error),
        }
    }

    fn apply_wallet_detected(&mut self, info: WalletInfo) {
        if matches!(
            self.button,
            ConnectButton::Detecting | ConnectButton::Install | ConnectButton::Onboarding
        ) {
            self.button = ConnectButton::Connect;
        }
        self.log_activity(
            format!("Wallet found: {} at {}", info.client_version, info.endpoint),
            StatusLevel::Info,
        );
        self.wallet = Some(info);
    }

    fn apply_install_prompt(&mut self, reason: String) {
        // Onboarding stays until a wallet shows up
        if self.button != ConnectButton::Onboarding {
            self.button = ConnectButton::Install;
        }
        self.wallet = None;
        self.drop_connection();
        self.notify(format!("No wallet: {reason}"), StatusLevel::Warn);
    }

    /// The worker forgets its context on a failed connect; mirror that here
    fn drop_connection(&mut self) {
        self.connection = None;
        self.clear_audits();
    }

    fn clear_audits(&mut self) {
        self.audits.clear();
        self.summaries.clear();
        self.details = None;
        self.selected = 0;
        self.query = None;
        self.focus = Focus::List;
    }

    fn apply_connected(&mut self, connection: Connection) {
        self.button = ConnectButton::Connected;
        let has_manager = connection.manager.is_some();
        self.notify(
            format!("Web3 connected as {}", connection.account),
            StatusLevel::Info,
        );

        // A new connection invalidates everything read under the old one
        self.connection = Some(connection);
        self.clear_audits();

        if has_manager {
            self.dispatch(RuntimeCommand::LoadAudits {
                query: AuditQuery::Mine,
            });
        }
    }

    fn apply_audits(&mut self, query: AuditQuery, audits: Vec<Address>) {
        self.set_status(format!("{} {}", audits.len(), query), StatusLevel::Info);
        self.summaries.retain(|address, _| audits.contains(address));
        self.audits = audits;
        self.query = Some(query);
        if self.selected >= self.audits.len() {
            self.selected = self.audits.len().saturating_sub(1);
        }
        self.focus = Focus::List;
    }
}
