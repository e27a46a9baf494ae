#![allow(dead_code)]

use lockbox_crypto::{EncryptionProvider, PassthroughEncryptor};
use lockbox_items::{EngineConfig, ItemEngine};
use lockbox_storage::{ItemStore, MemoryItemStore};
use lockbox_types::{
    EncryptedBlob, ItemEncrypted, ItemType, ShareId, ShareRecord, ShareRole, ShareType, UserId,
};
use std::sync::Arc;

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn make_item(share_id: ShareId) -> ItemEncrypted {
    ItemEncrypted::new(
        share_id,
        UserId::new(),
        ItemType::Login,
        EncryptedBlob::new(b"title".to_vec()),
        EncryptedBlob::new(b"note".to_vec()),
        EncryptedBlob::new(b"content".to_vec()),
    )
}

pub fn vault_with_role(role: ShareRole) -> ShareRecord {
    let share = ShareRecord::owned_vault(ShareId::new());
    if role == ShareRole::Admin {
        share
    } else {
        share.with_role(role)
    }
}

pub fn item_share(role: ShareRole) -> ShareRecord {
    let mut share = ShareRecord::owned_vault(ShareId::new()).with_role(role);
    share.share_type = ShareType::Item;
    share
}

pub struct Fixture {
    pub store: Arc<dyn ItemStore>,
    pub engine: ItemEngine,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_encryption(Arc::new(PassthroughEncryptor))
    }

    pub fn with_encryption(encryption: Arc<dyn EncryptionProvider>) -> Self {
        Self::with_store(Arc::new(MemoryItemStore::new()), encryption)
    }

    pub fn with_store(store: Arc<dyn ItemStore>, encryption: Arc<dyn EncryptionProvider>) -> Self {
        Self::build(store, encryption, EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        Self::build(
            Arc::new(MemoryItemStore::new()),
            Arc::new(PassthroughEncryptor),
            config,
        )
    }

    fn build(
        store: Arc<dyn ItemStore>,
        encryption: Arc<dyn EncryptionProvider>,
        config: EngineConfig,
    ) -> Self {
        init_tracing();
        let engine = ItemEngine::with_store(Arc::clone(&store), encryption, config);
        Self { store, engine }
    }

    /// Registers a share and returns its id.
    pub async fn add_share(&self, share: ShareRecord) -> ShareId {
        let share_id = share.share_id;
        self.store.upsert_share(share).await.unwrap();
        share_id
    }

    pub async fn add_vault(&self) -> ShareId {
        self.add_share(ShareRecord::owned_vault(ShareId::new())).await
    }

    pub async fn add_item(&self, share_id: ShareId) -> ItemEncrypted {
        let item = make_item(share_id);
        self.store.upsert_items(vec![item.clone()]).await.unwrap();
        item
    }

    pub async fn add_stored(&self, item: ItemEncrypted) -> ItemEncrypted {
        self.store.upsert_items(vec![item.clone()]).await.unwrap();
        item
    }
}
