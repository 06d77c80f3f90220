//! Writes through the contract handles against the recording mock wallet
//!
//! Every write is simulated first; only calls that simulate cleanly reach
//! `eth_sendTransaction`.

mod common;

use std::sync::Arc;

use alloy::primitives::U256;

use auditdesk::core::{connect, ConnectOutcome, ConnectSettings, ConnectionContext};
use auditdesk::domain::audit::{AuditUri, Declaration, ProofKind, UploadRequest};
use auditdesk::infrastructure::contracts::bindings::{ISEAuditContract, ISEAuditManager};
use auditdesk::infrastructure::ethereum::ProviderConfig;
use auditdesk::infrastructure::wallet::{detect_wallet, WalletEndpoint};

use common::{MockFactory, MockWallet, ACCOUNT, AUDIT, MANAGER, NEW_AUDIT, PROOF_TOKEN, TX_HASH};

async fn connected(wallet: MockWallet) -> (Box<ConnectionContext>, Arc<MockWallet>) {
    let wallet = Arc::new(wallet);
    let factory = MockFactory {
        wallet: Some(wallet.clone()),
    };
    let endpoint = WalletEndpoint {
        config: ProviderConfig::Http("http://127.0.0.1:8545".to_string()),
        name: Some("test".to_string()),
        metamask: false,
    };
    let detection = detect_wallet(&factory, Some(&endpoint)).await;
    match connect(detection, &ConnectSettings::default()).await {
        ConnectOutcome::Connected(ctx) => (ctx, wallet),
        other => panic!("expected connection, got {other:?}"),
    }
}

fn upload_request() -> UploadRequest {
    UploadRequest {
        owner_name: "Acme".to_string(),
        title: "Q3 emissions".to_string(),
        max_audit_window: U256::from(604_800u64),
        carbon_offset: U256::from(12u64),
        uris: vec![
            AuditUri {
                uri: "ipfs://ledger".to_string(),
                label: "ledger".to_string(),
                is_private: true,
            },
            AuditUri {
                uri: "https://h/x?a=1,2".to_string(),
                label: "payroll".to_string(),
                is_private: false,
            },
        ],
        notes_uri: "ipfs://notes".to_string(),
        manifest_uri: "ipfs://manifest".to_string(),
    }
}

#[tokio::test]
async fn test_upload_files_returns_new_audit() {
    let (ctx, wallet) = connected(MockWallet::metamask()).await;

    let submitted = ctx.manager().unwrap().upload_files(&upload_request()).await.unwrap();
    assert_eq!(submitted.simulated, NEW_AUDIT);
    assert_eq!(submitted.tx_hash, TX_HASH);

    let sent = wallet.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].from, Some(ACCOUNT));
    assert_eq!(sent[0].to, Some(MANAGER));

    // The URI columns go out as parallel arrays
    let calls = wallet.sent_calls::<ISEAuditManager::uploadFilesCall>();
    assert_eq!(calls.len(), 1);
    let call = &calls[0];
    assert_eq!(call._ownerName, "Acme");
    assert_eq!(call._maxAuditWindow, U256::from(604_800u64));
    assert_eq!(call._urisToAudit, vec!["ipfs://ledger", "https://h/x?a=1,2"]);
    assert_eq!(call._uriLabels, vec!["ledger", "payroll"]);
    assert_eq!(call._private, vec![true, false]);
    assert_eq!(call._uploadManifestUri, "ipfs://manifest");
}

#[tokio::test]
async fn test_invalid_upload_never_reaches_wallet() {
    let (ctx, wallet) = connected(MockWallet::metamask()).await;
    let request = UploadRequest {
        uris: Vec::new(),
        ..upload_request()
    };

    let before = wallet.calls().len();
    assert!(ctx.manager().unwrap().upload_files(&request).await.is_err());
    assert_eq!(wallet.calls().len(), before);
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_submit_audit_report_arguments() {
    let (ctx, wallet) = connected(MockWallet::metamask()).await;

    let submitted = ctx
        .audit(AUDIT)
        .submit_audit_report("ipfs://report", Declaration(2), "ipfs://seal", "ipfs://manifest")
        .await
        .unwrap();
    assert!(submitted.simulated);

    let calls = wallet.sent_calls::<ISEAuditContract::submitAuditReportCall>();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]._auditReportUri, "ipfs://report");
    assert_eq!(calls[0]._declaration, 2);
    assert_eq!(calls[0]._auditorSealUri, "ipfs://seal");
    assert_eq!(calls[0]._auditSubmissionManifestUri, "ipfs://manifest");
    assert_eq!(wallet.sent()[0].to, Some(AUDIT));
}

#[tokio::test]
async fn test_make_public_and_withdraw() {
    let (ctx, wallet) = connected(MockWallet::metamask()).await;
    let audit = ctx.audit(AUDIT);

    assert!(audit.make_public().await.unwrap().simulated);
    assert!(audit.withdraw().await.unwrap().simulated);

    assert_eq!(wallet.sent_calls::<ISEAuditContract::makePublicCall>().len(), 1);
    assert_eq!(wallet.sent_calls::<ISEAuditContract::withdrawCall>().len(), 1);
    assert!(wallet
        .sent()
        .iter()
        .all(|sent| sent.from == Some(ACCOUNT) && sent.to == Some(AUDIT)));
}

#[tokio::test]
async fn test_revert_in_simulation_is_not_sent() {
    let wallet = MockWallet {
        revert_writes: true,
        ..MockWallet::metamask()
    };
    let (ctx, wallet) = connected(wallet).await;
    let audit = ctx.audit(AUDIT);

    let err = audit.book_for_audit("Verra").await.unwrap_err();
    assert!(format!("{err:#}").contains("execution reverted"), "{err:#}");
    assert!(audit.withdraw().await.is_err());
    assert!(ctx
        .manager()
        .unwrap()
        .upload_files(&upload_request())
        .await
        .is_err());

    // Simulated, never handed to the wallet
    assert!(!wallet.calls().is_empty());
    assert!(wallet.sent().is_empty());
}

#[tokio::test]
async fn test_details_with_report_and_proof() {
    let (ctx, _) = connected(MockWallet::with_report()).await;
    let audit = ctx.audit(AUDIT);

    let report = audit.get_audit_report().await.unwrap();
    assert_eq!(report.uri, "ipfs://report");
    assert_eq!(report.declaration, Declaration(2));

    let proof = audit.get_proofs(ProofKind(0)).await.unwrap();
    assert_eq!(proof.erc1155, PROOF_TOKEN);
    assert_eq!(proof.nft_id, U256::from(42u64));
    assert!(!audit.get_proofs(ProofKind(1)).await.unwrap().is_present());

    let details = audit.load_details().await.unwrap();
    assert_eq!(details.report.map(|r| r.uri), Some("ipfs://report".to_string()));
    assert_eq!(details.proofs.len(), 1);
    assert_eq!(details.proofs[0].0, ProofKind(0));
    assert_eq!(details.proofs[0].1.erc1155, PROOF_TOKEN);
}
