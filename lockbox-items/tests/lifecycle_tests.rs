mod common;

use common::{vault_with_role, Fixture};
use lockbox_items::{DisabledReason, EngineConfig, ItemError};
use lockbox_sync::{DownloadedItems, ItemSyncStatus, ItemSyncStatusPayload, SyncMode};
use lockbox_types::{ItemState, ShareRole};
use pretty_assertions::assert_eq;

// ── Trash / restore ──────────────────────────────────────────────

#[tokio::test]
async fn trash_then_restore_bumps_revision_each_time() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;

    let trashed = fx.engine.trash_items(&[item.key()]).await.unwrap();
    assert_eq!(trashed[0].state, ItemState::Trashed);
    assert_eq!(trashed[0].revision, item.revision + 1);

    let restored = fx.engine.restore_items(&[item.key()]).await.unwrap();
    assert_eq!(restored[0].state, ItemState::Active);
    assert_eq!(restored[0].revision, item.revision + 2);

    let stored = fx.store.get_item(&item.key()).await.unwrap().unwrap();
    assert_eq!(stored, restored[0]);
}

#[tokio::test]
async fn trashing_twice_is_denied() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;
    fx.engine.trash_items(&[item.key()]).await.unwrap();

    let err = fx.engine.trash_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(
        err,
        ItemError::PermissionDenied(DisabledReason::ItemTrashed)
    ));
}

#[tokio::test]
async fn restoring_active_item_is_denied() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;

    let err = fx.engine.restore_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(
        err,
        ItemError::PermissionDenied(DisabledReason::NotTrashed)
    ));
}

#[tokio::test]
async fn viewer_cannot_trash() {
    let fx = Fixture::new();
    let vault = fx.add_share(vault_with_role(ShareRole::Viewer)).await;
    let item = fx.add_item(vault).await;

    let err = fx.engine.trash_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(
        err,
        ItemError::PermissionDenied(DisabledReason::InsufficientRole)
    ));
    assert_eq!(fx.store.get_item(&item.key()).await.unwrap().unwrap(), item);
}

#[tokio::test]
async fn batch_stops_at_first_failure() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let first = fx.add_item(vault).await;
    let second = fx.add_item(vault).await;
    fx.engine.trash_items(&[second.key()]).await.unwrap();

    let err = fx
        .engine
        .trash_items(&[first.key(), second.key()])
        .await
        .unwrap_err();
    assert!(matches!(err, ItemError::PermissionDenied(_)));
    let first_now = fx.store.get_item(&first.key()).await.unwrap().unwrap();
    assert!(first_now.is_trashed());
}

// ── Delete ───────────────────────────────────────────────────────

#[tokio::test]
async fn delete_requires_trash() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;

    let err = fx.engine.delete_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(
        err,
        ItemError::PermissionDenied(DisabledReason::NotTrashed)
    ));

    fx.engine.trash_items(&[item.key()]).await.unwrap();
    fx.engine.delete_items(&[item.key()]).await.unwrap();
    assert!(fx.store.get_item(&item.key()).await.unwrap().is_none());
}

#[tokio::test]
async fn deleted_item_is_not_found() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;
    fx.engine.trash_items(&[item.key()]).await.unwrap();
    fx.engine.delete_items(&[item.key()]).await.unwrap();

    let err = fx.engine.delete_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(err, ItemError::NotFound(key) if key == item.key()));
}

// ── Pin ──────────────────────────────────────────────────────────

#[tokio::test]
async fn pin_and_unpin() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;

    let pinned = fx.engine.pin_item(&item.key()).await.unwrap();
    assert!(pinned.is_pinned);
    assert!(pinned.pin_time.is_some());
    assert_eq!(pinned.revision, item.revision + 1);

    let again = fx.engine.pin_item(&item.key()).await.unwrap();
    assert_eq!(again.revision, pinned.revision);

    let unpinned = fx.engine.unpin_item(&item.key()).await.unwrap();
    assert!(!unpinned.is_pinned);
    assert_eq!(unpinned.pin_time, None);
}

#[tokio::test]
async fn viewer_may_pin() {
    let fx = Fixture::new();
    let vault = fx.add_share(vault_with_role(ShareRole::Viewer)).await;
    let item = fx.add_item(vault).await;
    assert!(fx.engine.pin_item(&item.key()).await.unwrap().is_pinned);
}

#[tokio::test]
async fn trashed_item_cannot_be_pinned() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;
    fx.engine.trash_items(&[item.key()]).await.unwrap();

    let err = fx.engine.pin_item(&item.key()).await.unwrap_err();
    assert!(matches!(
        err,
        ItemError::PermissionDenied(DisabledReason::ItemTrashed)
    ));
}

// ── Sync gate ────────────────────────────────────────────────────

#[tokio::test]
async fn writes_refused_while_share_is_syncing() {
    let fx = Fixture::new();
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;
    fx.engine
        .tracker()
        .emit(ItemSyncStatus::Syncing(SyncMode::Foreground));

    let err = fx.engine.trash_items(&[item.key()]).await.unwrap_err();
    assert!(matches!(err, ItemError::SyncInProgress));
    let err = fx.engine.pin_item(&item.key()).await.unwrap_err();
    assert!(matches!(err, ItemError::SyncInProgress));
    assert_eq!(fx.store.get_item(&item.key()).await.unwrap().unwrap(), item);

    fx.engine.tracker().emit(ItemSyncStatus::Synced);
    let trashed = fx.engine.trash_items(&[item.key()]).await.unwrap();
    assert_eq!(trashed[0].state, ItemState::Trashed);
}

#[tokio::test]
async fn downloaded_share_accepts_writes_during_sync() {
    let fx = Fixture::new();
    let done = fx.add_vault().await;
    let pending = fx.add_vault().await;
    let ready = fx.add_item(done).await;
    let waiting = fx.add_item(pending).await;

    let tracker = fx.engine.tracker();
    tracker.emit(ItemSyncStatus::Syncing(SyncMode::Background));
    let mut aggregate = DownloadedItems::new();
    ItemSyncStatusPayload::new(3, 3).merge_into(done, &mut aggregate);
    ItemSyncStatusPayload::new(1, 3).merge_into(pending, &mut aggregate);
    tracker.accumulator().emit_accumulated(aggregate);

    assert!(fx.engine.pin_item(&ready.key()).await.unwrap().is_pinned);
    let err = fx.engine.pin_item(&waiting.key()).await.unwrap_err();
    assert!(matches!(err, ItemError::SyncInProgress));
}

#[tokio::test]
async fn gate_can_be_disabled() {
    let fx = Fixture::with_config(EngineConfig {
        block_writes_while_syncing: false,
        ..EngineConfig::default()
    });
    let vault = fx.add_vault().await;
    let item = fx.add_item(vault).await;
    fx.engine
        .tracker()
        .emit(ItemSyncStatus::Syncing(SyncMode::Foreground));

    let trashed = fx.engine.trash_items(&[item.key()]).await.unwrap();
    assert_eq!(trashed[0].state, ItemState::Trashed);
}
