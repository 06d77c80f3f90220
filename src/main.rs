use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use alloy::primitives::Address;
use anyhow::{bail, Result};
use clap::Parser;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing::level_filters::LevelFilter;
use tracing::{info, warn};

use auditdesk::app::{App, ConnectButton, Focus, InputMode, StatusLevel};
use auditdesk::config;
use auditdesk::core::Command;
use auditdesk::domain::audit::AuditQuery;
use auditdesk::infrastructure::ethereum::ProviderConfig;
use auditdesk::infrastructure::runtime::{
    RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerOptions,
};
use auditdesk::infrastructure::wallet::WalletEndpoint;
use auditdesk::logging::{setup_logger, LogTarget};
use auditdesk::ui;

#[derive(Debug, Parser)]
#[command(
    name = "auditdesk",
    version,
    about = "Auditdesk: terminal client for on-chain audit contracts"
)]
struct Args {
    /// HTTP JSON-RPC wallet endpoint (e.g. http://localhost:8545)
    #[arg(long)]
    rpc: Option<String>,

    /// WebSocket wallet endpoint (e.g. ws://localhost:8546)
    #[arg(long)]
    ws: Option<String>,

    /// IPC path (e.g. ~/.ethereum/geth.ipc). Unix only.
    #[arg(long)]
    ipc: Option<PathBuf>,

    /// Registry contract that publishes the audit manager
    #[arg(long)]
    registry: Option<Address>,

    /// Treat the endpoint given on the command line as MetaMask
    #[arg(long)]
    metamask: bool,

    /// Connect, print my audits and exit
    #[arg(long)]
    headless: bool,

    /// With --headless, print one JSON object per audit on stdout
    #[arg(long, requires = "headless")]
    json: bool,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level: LevelFilter = args
        .log_level
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid log level '{}'", args.log_level))?;

    if args.headless {
        setup_logger(level, LogTarget::Stderr)?;
    } else if let Some(path) = config::log_path() {
        setup_logger(level, LogTarget::File(path))?;
    }

    let config = config::load();
    let options = worker_options(&args, &config)?;
    info!(
        endpoint = %options.endpoint.as_ref().map(|e| e.display()).unwrap_or_default(),
        registry = %options.settings.registry_address,
        "starting"
    );

    let runtime = RuntimeBridge::new(options)?;

    if args.headless {
        return run_headless(&runtime, args.json);
    }

    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new();
    app.set_status("Looking for a wallet…", StatusLevel::Info);
    runtime.send(RuntimeCommand::Detect)?;

    let res = run_app(&mut terminal, app, runtime);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("{err:?}");
    }

    Ok(())
}

/// CLI endpoint first, then the config file, then a local node
fn worker_options(args: &Args, config: &config::Config) -> Result<WorkerOptions> {
    let cli_endpoint = if let Some(ipc) = args.ipc.clone() {
        #[cfg(unix)]
        {
            Some(ProviderConfig::Ipc(ipc))
        }
        #[cfg(not(unix))]
        {
            let _ = ipc;
            bail!("IPC is not supported on this platform");
        }
    } else if let Some(ws) = args.ws.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(ProviderConfig::WebSocket(ws.to_string()))
    } else {
        args.rpc
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ProviderConfig::from_url)
    };

    let endpoint = match cli_endpoint {
        Some(config) => WalletEndpoint {
            config,
            name: Some("cli".to_string()),
            metamask: args.metamask,
        },
        None => config.wallet_endpoint().unwrap_or_else(|| WalletEndpoint {
            config: ProviderConfig::from_url("localhost:8545"),
            name: Some("local".to_string()),
            metamask: args.metamask,
        }),
    };

    let mut settings = config.connect_settings();
    if let Some(registry) = args.registry {
        settings.registry_address = registry;
    }

    Ok(WorkerOptions {
        endpoint: Some(endpoint),
        settings,
        abi_roots: config.abi_roots(),
    })
}

/// Connect, list the connected account's audits with summaries, exit
///
/// With `json`, summaries go to stdout as JSON lines and everything else to
/// stderr, so the output can be piped.
fn run_headless(runtime: &RuntimeBridge, json: bool) -> Result<()> {
    let say = |line: String| {
        if json {
            eprintln!("{line}");
        } else {
            println!("{line}");
        }
    };

    runtime.send(RuntimeCommand::Connect)?;
    let mut remaining = None::<usize>;

    while let Some(event) = runtime.recv() {
        match event {
            RuntimeEvent::WalletDetected { info } => {
                say(format!("wallet    {} ({})", info.endpoint, info.client_version));
            }
            RuntimeEvent::InstallPrompt { reason } => {
                say(format!("no wallet: {reason}"));
                say("install a wallet and point --rpc/--ws/--ipc at it".to_string());
                return Ok(());
            }
            RuntimeEvent::ConnectFailed { message } => bail!("wallet connection failed: {message}"),
            RuntimeEvent::Connected {
                account,
                chain_id,
                registry,
                manager,
                ..
            } => {
                say(format!("Wallet :: {account}"));
                if let Some(chain_id) = chain_id {
                    say(format!("chain     {chain_id}"));
                }
                say(format!("registry  {registry}"));
                if let Some(manager) = manager {
                    say(format!("manager   {manager}"));
                    runtime.send(RuntimeCommand::LoadAudits {
                        query: AuditQuery::Mine,
                    })?;
                }
            }
            RuntimeEvent::ManagerUnavailable { message } => {
                say(format!("audit manager unavailable: {message}"));
                return Ok(());
            }
            RuntimeEvent::AuditsLoaded { query, audits } => {
                say(format!("{} {}", audits.len(), query));
                if audits.is_empty() {
                    return Ok(());
                }
                remaining = Some(audits.len());
            }
            RuntimeEvent::AuditSummaryReady { summary } => {
                if json {
                    println!("{}", serde_json::to_string(&summary)?);
                } else {
                    println!(
                        "{}  {:<16} {} / {} (v{})",
                        summary.address, summary.status, summary.owner_name, summary.title, summary.version
                    );
                }
                if finish_one(&mut remaining) {
                    return Ok(());
                }
            }
            RuntimeEvent::Error { message } => {
                eprintln!("error: {message}");
                match remaining {
                    // A single audit failing to load does not abort the listing
                    Some(_) => {
                        if finish_one(&mut remaining) {
                            return Ok(());
                        }
                    }
                    None => bail!(message),
                }
            }
            RuntimeEvent::AuditDetailsReady { .. }
            | RuntimeEvent::TransactionSubmitted { .. }
            | RuntimeEvent::ReceiptReady { .. } => {}
        }
    }

    bail!("worker stopped unexpectedly")
}

fn finish_one(remaining: &mut Option<usize>) -> bool {
    match remaining {
        Some(count) => {
            *count = count.saturating_sub(1);
            *count == 0
        }
        None => false,
    }
}

fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    runtime: RuntimeBridge,
) -> Result<()> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    loop {
        pump_background(&mut app, &runtime);
        terminal.draw(|f| ui::draw(f, &app))?;
        if app.should_quit {
            let _ = runtime.send(RuntimeCommand::Shutdown);
            return Ok(());
        }

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                handle_key(&mut app, key);
            }
        }

        if last_tick.elapsed() >= tick_rate {
            app.on_tick();
            last_tick = Instant::now();
        }
    }
}

fn pump_background(app: &mut App, runtime: &RuntimeBridge) {
    for event in runtime.poll_events() {
        app.apply_event(event);
    }

    for cmd in app.take_runtime_commands() {
        if let Err(err) = runtime.send(cmd) {
            warn!("dropping command: {err:#}");
            app.set_status(format!("{err:#}"), StatusLevel::Error);
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    if key.kind != KeyEventKind::Press {
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Command => handle_command_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,
        KeyCode::Char(':') | KeyCode::Char('/') => app.enter_command(),
        KeyCode::Char('c') => app.press_connect(),
        KeyCode::Enter => {
            // The button takes Enter until the wallet is connected
            if app.button == ConnectButton::Connected {
                app.open_selected();
            } else {
                app.press_connect();
            }
        }
        KeyCode::Char('j') | KeyCode::Down => app.select_next(),
        KeyCode::Char('k') | KeyCode::Up => app.select_prev(),
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Esc => {
            app.details = None;
            app.focus = Focus::List;
        }
        KeyCode::Char('r') => {
            let action = app.execute_command(&Command::Refresh);
            app.apply_action(action);
        }
        KeyCode::Char('y') => handle_copy_to_clipboard(app),
        _ => {}
    }
}

fn handle_command_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.exit_command(),
        KeyCode::Enter => app.apply_command(),
        KeyCode::Backspace => {
            app.command.input.pop();
        }
        KeyCode::Char(ch) => {
            if key.modifiers.contains(KeyModifiers::CONTROL) {
                return;
            }
            app.command.input.push(ch);
        }
        _ => {}
    }
}

fn handle_copy_to_clipboard(app: &mut App) {
    use arboard::Clipboard;

    let text_to_copy = app
        .target_audit()
        .or_else(|| app.account())
        .map(|address| address.to_string());

    let Some(text) = text_to_copy else {
        app.set_status("Nothing to copy", StatusLevel::Warn);
        return;
    };

    match Clipboard::new() {
        Ok(mut clipboard) => {
            if clipboard.set_text(&text).is_ok() {
                app.set_status(format!("Copied: {text}"), StatusLevel::Info);
            } else {
                app.set_status("Failed to copy to clipboard", StatusLevel::Error);
            }
        }
        Err(_) => {
            app.set_status("Clipboard not available", StatusLevel::Error);
        }
    }
}
