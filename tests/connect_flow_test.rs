//! Connect flow against a recording mock wallet
//!
//! Covers the wallet boundary end to end:
//! 1. No wallet: connect yields the install prompt and never errors
//! 2. Granted access: the first account is `from` on every later call
//! 3. Registry failure: no audit manager, but still connected

mod common;

use std::sync::Arc;

use alloy::primitives::Address;

use auditdesk::core::{
    connect, ConnectOutcome, ConnectSettings, ConnectionContext, DEFAULT_REGISTRY_ADDRESS,
};
use auditdesk::domain::audit::{AuditQuery, AUDIT_MANAGER_NAME};
use auditdesk::infrastructure::ethereum::{ProviderConfig, RpcFailure};
use auditdesk::infrastructure::wallet::{detect_wallet, WalletDetection, WalletEndpoint, WalletError};

use common::{MockFactory, MockWallet, RegistryAnswer, ACCOUNT, AUDIT, MANAGER};

fn endpoint(metamask: bool) -> WalletEndpoint {
    WalletEndpoint {
        config: ProviderConfig::Http("http://127.0.0.1:8545".to_string()),
        name: Some("test".to_string()),
        metamask,
    }
}

async fn connect_with(wallet: MockWallet, settings: &ConnectSettings) -> (ConnectOutcome, Arc<MockWallet>) {
    let wallet = Arc::new(wallet);
    let factory = MockFactory {
        wallet: Some(wallet.clone()),
    };
    let detection = detect_wallet(&factory, Some(&endpoint(false))).await;
    (connect(detection, settings).await, wallet)
}

fn expect_connected(outcome: ConnectOutcome) -> Box<ConnectionContext> {
    match outcome {
        ConnectOutcome::Connected(ctx) => ctx,
        other => panic!("expected connection, got {other:?}"),
    }
}

#[tokio::test]
async fn test_no_endpoint_prompts_install() {
    let factory = MockFactory { wallet: None };
    let detection = detect_wallet(&factory, None).await;
    assert!(matches!(detection, WalletDetection::Missing { .. }));

    let outcome = connect(detection, &ConnectSettings::default()).await;
    match outcome {
        ConnectOutcome::InstallPrompt { reason } => assert!(reason.contains("no wallet")),
        other => panic!("expected install prompt, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_wallet_prompts_install() {
    let factory = MockFactory { wallet: None };
    let detection = detect_wallet(&factory, Some(&endpoint(false))).await;
    match &detection {
        WalletDetection::Missing { reason } => assert!(reason.contains("connection refused")),
        other => panic!("expected missing wallet, got {other:?}"),
    }
    assert!(matches!(
        connect(detection, &ConnectSettings::default()).await,
        ConnectOutcome::InstallPrompt { .. }
    ));
}

#[tokio::test]
async fn test_account_is_from_on_every_call() {
    let (outcome, wallet) = connect_with(MockWallet::metamask(), &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);

    // First account wins
    assert_eq!(ctx.account, ACCOUNT);
    assert!(ctx.wallet.is_metamask);
    assert_eq!(ctx.chain_id, Some(31415));
    assert_eq!(ctx.registry.address(), DEFAULT_REGISTRY_ADDRESS);

    let manager = ctx.manager().unwrap();
    assert_eq!(manager.address(), MANAGER);

    let audits = manager.query(&AuditQuery::Mine).await.unwrap();
    assert_eq!(audits, vec![AUDIT]);
    let summary = ctx.audit(AUDIT).load_summary().await.unwrap();
    assert_eq!(summary.title, "Q3 emissions");
    assert_eq!(summary.status, "UPLOADED");

    let calls = wallet.calls();
    assert!(calls.len() >= 6, "{calls:?}");
    assert!(calls.iter().all(|call| call.from == Some(ACCOUNT)), "{calls:?}");

    // Registry first, then the manager, then the audit contract
    assert_eq!(calls[0].to, Some(DEFAULT_REGISTRY_ADDRESS));
    assert_eq!(calls[1].to, Some(MANAGER));
    assert!(calls[2..].iter().all(|call| call.to == Some(AUDIT)));
}

#[tokio::test]
async fn test_details_tolerate_missing_report() {
    let (outcome, _) = connect_with(MockWallet::metamask(), &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);

    let details = ctx.audit(AUDIT).load_details().await.unwrap();
    assert!(details.report.is_none());
    assert!(details.proofs.is_empty());
    assert_eq!(details.uris.uris.len(), 1);
    assert!(details.uris.uris[0].is_private);
    assert_eq!(details.uris.notes_uri, "ipfs://notes");
    assert!(!details.seed.is_booked());
}

#[tokio::test]
async fn test_writes_are_sent_from_account() {
    let (outcome, wallet) = connect_with(MockWallet::metamask(), &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);

    let submitted = ctx.audit(AUDIT).book_for_audit("Verra").await.unwrap();
    assert!(submitted.simulated);
    assert_eq!(submitted.tx_hash, common::TX_HASH);

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, Some(ACCOUNT));
    assert_eq!(sent[0].to, Some(AUDIT));
}

#[tokio::test]
async fn test_zero_registry_entry_leaves_manager_unset() {
    let wallet = MockWallet {
        registry: RegistryAnswer::Zero,
        ..MockWallet::metamask()
    };
    let (outcome, _) = connect_with(wallet, &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);

    assert!(ctx.manager.is_none());
    let message = ctx.manager_error.clone().unwrap();
    assert!(message.contains(AUDIT_MANAGER_NAME), "{message}");
    assert!(ctx.manager().is_err());
}

#[tokio::test]
async fn test_registry_revert_leaves_manager_unset() {
    let wallet = MockWallet {
        registry: RegistryAnswer::Revert,
        ..MockWallet::metamask()
    };
    let (outcome, _) = connect_with(wallet, &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);

    assert!(ctx.manager.is_none());
    assert!(ctx.manager_error.is_some());
    // The account is still usable for direct audit reads
    assert_eq!(ctx.audit(AUDIT).get_status().await.unwrap(), "UPLOADED");
}

#[tokio::test]
async fn test_rejected_permission() {
    let wallet = MockWallet {
        request_error: Some(RpcFailure::USER_REJECTED),
        ..MockWallet::metamask()
    };
    let (outcome, wallet) = connect_with(wallet, &ConnectSettings::default()).await;
    match outcome {
        ConnectOutcome::Failed(WalletError::Rejected(message)) => {
            assert_eq!(message, "wallet said no")
        }
        other => panic!("expected rejection, got {other:?}"),
    }
    assert!(wallet.calls().is_empty());
}

#[tokio::test]
async fn test_request_accounts_unsupported_falls_back() {
    let wallet = MockWallet {
        client_version: "anvil/v0.2.0".to_string(),
        request_error: Some(RpcFailure::METHOD_NOT_FOUND),
        ..MockWallet::metamask()
    };
    let (outcome, _) = connect_with(wallet, &ConnectSettings::default()).await;
    let ctx = expect_connected(outcome);
    assert_eq!(ctx.account, ACCOUNT);
    assert!(!ctx.wallet.is_metamask);
}

#[tokio::test]
async fn test_no_accounts() {
    let wallet = MockWallet {
        accounts: Vec::new(),
        ..MockWallet::metamask()
    };
    let (outcome, _) = connect_with(wallet, &ConnectSettings::default()).await;
    assert!(matches!(outcome, ConnectOutcome::Failed(WalletError::NoAccounts)));
}

#[tokio::test]
async fn test_require_metamask() {
    let settings = ConnectSettings {
        require_metamask: true,
        ..ConnectSettings::default()
    };
    let wallet = MockWallet {
        client_version: "Geth/v1.13.0".to_string(),
        ..MockWallet::metamask()
    };
    let (outcome, wallet) = connect_with(wallet, &settings).await;
    assert!(matches!(outcome, ConnectOutcome::Failed(WalletError::NotMetaMask(_))));
    assert!(wallet.calls().is_empty());

    // The endpoint flag vouches for a bridge with a generic client version
    let wallet = Arc::new(MockWallet {
        client_version: "Geth/v1.13.0".to_string(),
        ..MockWallet::metamask()
    });
    let factory = MockFactory {
        wallet: Some(wallet),
    };
    let detection = detect_wallet(&factory, Some(&endpoint(true))).await;
    assert!(matches!(
        connect(detection, &settings).await,
        ConnectOutcome::Connected(_)
    ));
}

#[tokio::test]
async fn test_custom_registry_settings() {
    let registry: Address = "0x0000000000000000000000000000000000000abc".parse().unwrap();
    let settings = ConnectSettings {
        registry_address: registry,
        manager_name: "OTHER_MANAGER".to_string(),
        require_metamask: false,
    };
    let (outcome, wallet) = connect_with(MockWallet::metamask(), &settings).await;
    assert!(matches!(outcome, ConnectOutcome::Connected(_)));
    assert_eq!(wallet.calls()[0].to, Some(registry));
}
