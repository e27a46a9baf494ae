mod common;

use common::Fixture;
use futures::StreamExt;
use lockbox_crypto::{EncryptionProvider, EncryptionTag, ShareKey, ShareKeyring};
use lockbox_items::{EngineConfig, ItemError, ItemField, PlanLimits, PlanType};
use lockbox_storage::ItemQuery;
use lockbox_sync::{
    DownloadedItems, ItemSyncStatus, ItemSyncStatusPayload, SyncMode, SyncState,
};
use lockbox_types::{EncryptedBlob, HiddenState, ItemState, ShareSelection};
use pretty_assertions::assert_eq;
use std::sync::Arc;

// ── Config ───────────────────────────────────────────────────────

#[test]
fn default_config() {
    let config = EngineConfig::default();
    assert!(config.block_writes_while_syncing);
    assert_eq!(config.default_plan.plan, PlanType::Free);
}

#[test]
fn config_from_partial_json() {
    let config = EngineConfig::from_json(r#"{ "block_writes_while_syncing": false }"#).unwrap();
    assert!(!config.block_writes_while_syncing);
    assert_eq!(config.default_plan, PlanLimits::default());
}

#[test]
fn config_with_plan() {
    let json = r#"{
        "default_plan": {
            "plan": "Business",
            "vault_limit": "Unlimited",
            "alias_limit": "Unlimited",
            "totp_limit": "Unlimited",
            "member_limit": { "Limited": 50 }
        }
    }"#;
    let config = EngineConfig::from_json(json).unwrap();
    assert_eq!(config.default_plan.plan, PlanType::Business);
    assert_eq!(
        config.default_plan.member_limit,
        lockbox_items::Limit::Limited(50)
    );
}

// ── Sync observation ─────────────────────────────────────────────

#[tokio::test]
async fn engine_exposes_sync_streams() {
    let fx = Fixture::new();
    let tracker = fx.engine.tracker();
    let vault = fx.add_vault().await;

    tracker.emit(ItemSyncStatus::Syncing(SyncMode::Foreground));
    let mut aggregate = DownloadedItems::new();
    ItemSyncStatusPayload::new(1, 4).merge_into(vault, &mut aggregate);
    tracker.accumulator().emit_accumulated(aggregate.clone());
    tracker
        .accumulator()
        .emit_inserted(ItemSyncStatusPayload::new(1, 4));

    let state = fx.engine.observe_sync_state().next().await.unwrap();
    assert_eq!(
        state,
        SyncState {
            status: ItemSyncStatus::Syncing(SyncMode::Foreground),
            mode: SyncMode::Foreground,
        }
    );
    let downloaded = fx
        .engine
        .observe_downloaded_items_status()
        .next()
        .await
        .unwrap();
    assert_eq!(downloaded, aggregate);
    let inserted = fx
        .engine
        .observe_inserted_items_status()
        .next()
        .await
        .unwrap();
    assert_eq!(inserted, Some(ItemSyncStatusPayload::new(1, 4)));

    fx.engine.clear();
    assert_eq!(fx.engine.tracker().state(), SyncState::default());
    assert!(fx.engine.tracker().accumulator().downloaded().is_empty());
}

// ── Item observation ─────────────────────────────────────────────

#[tokio::test]
async fn observe_items_delivers_concealed_items() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let mut item = common::make_item(vault);
    item.note = EncryptedBlob::empty();
    let item = fx.add_stored(item).await;

    let mut stream = fx
        .engine
        .observe_items(ItemQuery::new().in_shares(ShareSelection::Share(vault)));
    let items = stream.next().await.unwrap().unwrap();

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, item.id);
    assert!(matches!(items[0].title, HiddenState::Concealed(_)));
    assert!(items[0].note.is_empty());
    assert!(!items[0].is_revealed());
}

#[tokio::test]
async fn observe_items_follows_lifecycle_changes() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;

    let mut active = fx
        .engine
        .observe_items(ItemQuery::new().in_state(ItemState::Active));
    assert_eq!(active.next().await.unwrap().unwrap().len(), 1);

    fx.engine.trash_items(&[item.key()]).await.unwrap();
    assert!(active.next().await.unwrap().unwrap().is_empty());
}

// ── Reveal ───────────────────────────────────────────────────────

#[tokio::test]
async fn reveal_and_conceal_fields() {
    let keyring = Arc::new(ShareKeyring::new());
    let fx = Fixture::with_encryption(Arc::clone(&keyring) as Arc<dyn EncryptionProvider>);
    let vault = fx.add_vault().await;
    keyring.insert_key(vault, ShareKey::generate()).unwrap();

    let mut stored = common::make_item(vault);
    stored.title = keyring
        .encrypt(&vault, EncryptionTag::ItemTitle, b"Mail")
        .unwrap();
    stored.note = EncryptedBlob::empty();
    stored.content = keyring
        .encrypt(&vault, EncryptionTag::ItemContent, b"correct horse")
        .unwrap();
    fx.add_stored(stored).await;

    let mut item = fx
        .engine
        .observe_items(ItemQuery::new())
        .next()
        .await
        .unwrap()
        .unwrap()
        .remove(0);

    item.reveal(ItemField::Content, fx.engine.encryption().as_ref())
        .unwrap();
    item.reveal(ItemField::Note, fx.engine.encryption().as_ref())
        .unwrap();
    assert_eq!(item.content.clear_text(), Some("correct horse"));
    assert!(item.note.is_empty());
    assert!(!item.title.is_revealed());

    item.conceal();
    assert!(!item.is_revealed());
    assert!(matches!(item.content, HiddenState::Concealed(_)));
}

#[tokio::test]
async fn reveal_without_key_is_upstream_error() {
    let keyring = Arc::new(ShareKeyring::new());
    let fx = Fixture::with_encryption(Arc::clone(&keyring) as Arc<dyn EncryptionProvider>);
    let vault = fx.add_vault().await;
    fx.add_item(vault).await;

    let mut item = fx
        .engine
        .observe_items(ItemQuery::new())
        .next()
        .await
        .unwrap()
        .unwrap()
        .remove(0);
    let err = item
        .reveal(ItemField::Title, fx.engine.encryption().as_ref())
        .unwrap_err();
    assert!(matches!(err, ItemError::Upstream { operation: "decrypt", .. }));
    assert!(!item.title.is_revealed());
}
