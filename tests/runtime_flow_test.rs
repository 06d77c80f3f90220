//! Runtime bridge driving the worker against the mock wallet

mod common;

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::{Duration, Instant};

use alloy::primitives::U256;

use auditdesk::app::{App, ConnectButton};
use auditdesk::core::ConnectSettings;
use auditdesk::domain::audit::{AuditQuery, AuditUri, UploadRequest};
use auditdesk::infrastructure::ethereum::ProviderConfig;
use auditdesk::infrastructure::runtime::{
    RuntimeBridge, RuntimeCommand, RuntimeEvent, WorkerOptions,
};
use auditdesk::infrastructure::wallet::WalletEndpoint;

use common::{MockFactory, MockWallet, ACCOUNT, AUDIT, MANAGER, NEW_AUDIT, TX_HASH};

fn bridge(wallet: Option<Arc<MockWallet>>) -> RuntimeBridge {
    let options = WorkerOptions {
        endpoint: Some(WalletEndpoint {
            config: ProviderConfig::Http("http://127.0.0.1:8545".to_string()),
            name: Some("mock".to_string()),
            metamask: false,
        }),
        settings: ConnectSettings::default(),
        abi_roots: Vec::new(),
    };
    RuntimeBridge::with_factory(options, Arc::new(MockFactory { wallet })).unwrap()
}

/// Collect events until one matches, failing after a few seconds
fn wait_for(
    runtime: &RuntimeBridge,
    mut matches: impl FnMut(&RuntimeEvent) -> bool,
) -> (RuntimeEvent, Vec<RuntimeEvent>) {
    let deadline = Instant::now() + Duration::from_secs(5);
    let mut seen = Vec::new();
    while Instant::now() < deadline {
        for event in runtime.poll_events() {
            if matches(&event) {
                return (event, seen);
            }
            seen.push(event);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("timed out; saw {seen:?}");
}

#[test]
fn test_detect_without_wallet() {
    let runtime = bridge(None);
    runtime.send(RuntimeCommand::Detect).unwrap();
    let (event, _) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::InstallPrompt { .. }));

    let mut app = App::new();
    app.apply_event(event);
    assert_eq!(app.button, ConnectButton::Install);
}

#[test]
fn test_commands_before_connect_report_errors() {
    let runtime = bridge(Some(Arc::new(MockWallet::metamask())));
    runtime
        .send(RuntimeCommand::LoadAudits {
            query: AuditQuery::Mine,
        })
        .unwrap();
    let (event, _) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::Error { .. }));
    match event {
        RuntimeEvent::Error { message } => assert!(message.contains("Not connected")),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_connect_list_and_book() {
    let wallet = Arc::new(MockWallet::metamask());
    let runtime = bridge(Some(wallet.clone()));
    let mut app = App::new();

    runtime.send(RuntimeCommand::Connect).unwrap();
    let (connected, earlier) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::Connected { .. }));
    assert!(earlier
        .iter()
        .any(|e| matches!(e, RuntimeEvent::WalletDetected { .. })));
    match &connected {
        RuntimeEvent::Connected {
            account, manager, ..
        } => {
            assert_eq!(*account, ACCOUNT);
            assert_eq!(*manager, Some(MANAGER));
        }
        other => panic!("unexpected {other:?}"),
    }
    for event in earlier {
        app.apply_event(event);
    }
    app.apply_event(connected);
    assert_eq!(app.button, ConnectButton::Connected);

    // The app asks for "my audits" as soon as the manager is known
    for cmd in app.take_runtime_commands() {
        runtime.send(cmd).unwrap();
    }
    let (summary, earlier) = wait_for(&runtime, |e| {
        matches!(e, RuntimeEvent::AuditSummaryReady { .. })
    });
    for event in earlier {
        app.apply_event(event);
    }
    app.apply_event(summary);
    assert_eq!(app.audits, vec![AUDIT]);
    assert_eq!(app.query, Some(AuditQuery::Mine));
    assert_eq!(app.summaries[&AUDIT].owner_name, "Acme");

    runtime
        .send(RuntimeCommand::BookForAudit {
            audit: AUDIT,
            auditor_name: "Verra".to_string(),
        })
        .unwrap();
    let (submitted, _) = wait_for(&runtime, |e| {
        matches!(e, RuntimeEvent::TransactionSubmitted { .. })
    });
    match submitted {
        RuntimeEvent::TransactionSubmitted {
            tx_hash,
            call,
            audit,
        } => {
            assert_eq!(tx_hash, TX_HASH);
            assert_eq!(call, "bookForAudit(_auditorName=\"Verra\")");
            assert_eq!(audit, Some(AUDIT));
        }
        other => panic!("unexpected {other:?}"),
    }

    // Details are reloaded after the write
    let (details, _) = wait_for(&runtime, |e| {
        matches!(e, RuntimeEvent::AuditDetailsReady { .. })
    });
    app.apply_event(details);
    assert_eq!(app.details.as_ref().map(|d| d.address), Some(AUDIT));

    assert!(wallet.calls().iter().all(|call| call.from == Some(ACCOUNT)));
    assert_eq!(wallet.sent().len(), 1);

    // The mock never mines, so the receipt is still pending
    runtime
        .send(RuntimeCommand::CheckReceipt { tx_hash: TX_HASH })
        .unwrap();
    let (receipt, _) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::ReceiptReady { .. }));
    match receipt {
        RuntimeEvent::ReceiptReady {
            tx_hash,
            block_number,
            success,
        } => {
            assert_eq!(tx_hash, TX_HASH);
            assert_eq!(block_number, None);
            assert_eq!(success, None);
        }
        other => panic!("unexpected {other:?}"),
    }
}

fn connect(runtime: &RuntimeBridge, app: &mut App) {
    runtime.send(RuntimeCommand::Connect).unwrap();
    let (connected, earlier) = wait_for(runtime, |e| matches!(e, RuntimeEvent::Connected { .. }));
    for event in earlier {
        app.apply_event(event);
    }
    app.apply_event(connected);
    app.take_runtime_commands();
}

#[test]
fn test_upload_reports_new_audit() {
    let wallet = Arc::new(MockWallet::metamask());
    let runtime = bridge(Some(wallet.clone()));
    let mut app = App::new();
    connect(&runtime, &mut app);

    let request = UploadRequest {
        owner_name: "Acme".to_string(),
        title: "Q4".to_string(),
        max_audit_window: U256::from(60u64),
        carbon_offset: U256::from(1u64),
        uris: vec![AuditUri {
            uri: "ipfs://a".to_string(),
            label: "ledger".to_string(),
            is_private: false,
        }],
        notes_uri: "ipfs://n".to_string(),
        manifest_uri: "ipfs://m".to_string(),
    };
    runtime.send(RuntimeCommand::UploadFiles { request }).unwrap();

    let (submitted, _) = wait_for(&runtime, |e| {
        matches!(e, RuntimeEvent::TransactionSubmitted { .. })
    });
    match submitted {
        RuntimeEvent::TransactionSubmitted { call, audit, .. } => {
            assert!(call.starts_with("uploadFiles(_ownerName=\"Acme\""), "{call}");
            assert_eq!(audit, Some(NEW_AUDIT));
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(wallet.sent().len(), 1);
    assert_eq!(wallet.sent()[0].to, Some(MANAGER));
}

#[test]
fn test_refused_reconnect_forgets_previous_account() {
    let wallet = Arc::new(MockWallet::metamask());
    let runtime = bridge(Some(wallet.clone()));
    let mut app = App::new();
    connect(&runtime, &mut app);
    assert_eq!(app.account(), Some(ACCOUNT));

    wallet.reject.store(true, Ordering::SeqCst);
    app.press_connect();
    for cmd in app.take_runtime_commands() {
        runtime.send(cmd).unwrap();
    }
    let (failed, earlier) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::ConnectFailed { .. }));
    for event in earlier {
        app.apply_event(event);
    }
    app.apply_event(failed);
    assert_eq!(app.button, ConnectButton::Connect);
    assert!(app.account().is_none());

    // The worker no longer acts for the old account either
    let sent_before = wallet.sent().len();
    runtime
        .send(RuntimeCommand::BookForAudit {
            audit: AUDIT,
            auditor_name: "Verra".to_string(),
        })
        .unwrap();
    let (event, _) = wait_for(&runtime, |e| matches!(e, RuntimeEvent::Error { .. }));
    match event {
        RuntimeEvent::Error { message } => assert!(message.contains("Not connected"), "{message}"),
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(wallet.sent().len(), sent_before);
}
