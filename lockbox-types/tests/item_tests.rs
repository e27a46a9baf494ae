use lockbox_types::{
    EncryptedBlob, HiddenState, ItemEncrypted, ItemFlag, ItemFlags, ItemId, ItemState, ItemType,
    ItemTypeFilter, ShareId, ShareSelection, UserId,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use std::str::FromStr;

fn make_item(share_id: ShareId) -> ItemEncrypted {
    ItemEncrypted::new(
        share_id,
        UserId::new(),
        ItemType::Login,
        EncryptedBlob::new(b"title".to_vec()),
        EncryptedBlob::empty(),
        EncryptedBlob::new(b"content".to_vec()),
    )
}

// ── Identifiers ──────────────────────────────────────────────────

#[test]
fn share_id_new_is_unique() {
    assert_ne!(ShareId::new(), ShareId::new());
}

#[test]
fn item_id_display_and_parse() {
    let id = ItemId::new();
    let parsed = ItemId::from_str(&id.to_string()).unwrap();
    assert_eq!(id, parsed);
}

#[test]
fn share_id_parse_invalid() {
    assert!(ShareId::parse("not-a-uuid").is_err());
}

// ── ItemState ────────────────────────────────────────────────────

#[test]
fn item_state_integer_codes() {
    assert_eq!(ItemState::Active.code(), 1);
    assert_eq!(ItemState::Trashed.code(), 2);
    assert_eq!(ItemState::try_from(2).unwrap(), ItemState::Trashed);
    assert!(ItemState::try_from(7).is_err());
}

#[test]
fn item_state_serializes_as_integer() {
    let json = serde_json::to_string(&ItemState::Trashed).unwrap();
    assert_eq!(json, "2");
    let back: ItemState = serde_json::from_str("1").unwrap();
    assert_eq!(back, ItemState::Active);
    assert!(serde_json::from_str::<ItemState>("0").is_err());
}

// ── ItemFlags ────────────────────────────────────────────────────

#[test]
fn flags_insert_and_remove() {
    let mut flags = ItemFlags::default();
    assert!(!flags.contains(ItemFlag::HasAttachments));

    flags.insert(ItemFlag::HasAttachments);
    flags.insert(ItemFlag::AliasDisabled);
    assert!(flags.contains(ItemFlag::HasAttachments));
    assert!(flags.contains(ItemFlag::AliasDisabled));
    assert!(!flags.contains(ItemFlag::EmailBreached));

    flags.remove(ItemFlag::HasAttachments);
    assert!(!flags.contains(ItemFlag::HasAttachments));
    assert!(flags.contains(ItemFlag::AliasDisabled));
}

#[test]
fn flags_preserve_unknown_bits() {
    let flags = ItemFlags::from_bits(1 << 20).with(ItemFlag::SkipHealthCheck);
    assert_eq!(flags.bits(), (1 << 20) | 1);
}

#[test]
fn flag_bits_are_distinct() {
    let combined: ItemFlags = ItemFlag::ALL.into_iter().collect();
    assert_eq!(combined.bits().count_ones() as usize, ItemFlag::ALL.len());
}

// ── ItemEncrypted ────────────────────────────────────────────────

#[test]
fn new_item_is_active_at_revision_one() {
    let item = make_item(ShareId::new());
    assert_eq!(item.revision, 1);
    assert!(item.is_active());
    assert!(!item.is_trashed());
}

#[test]
fn next_revision_bumps_by_one() {
    let item = make_item(ShareId::new());
    let next = item.next_revision();
    assert_eq!(next.revision, 2);
    assert_eq!(next.id, item.id);
    assert_eq!(next.content, item.content);
    assert!(next.modification_time >= item.modification_time);
}

#[test]
fn moved_to_changes_share_and_revision_together() {
    let source = ShareId::new();
    let destination = ShareId::new();
    let item = make_item(source);

    let moved = item.moved_to(destination);
    assert_eq!(moved.share_id, destination);
    assert_eq!(moved.revision, item.revision + 1);
    assert_eq!(moved.title, item.title);
    assert_eq!(moved.content, item.content);
    assert_eq!(moved.key().share_id, destination);
}

#[test]
fn item_json_roundtrip_keeps_blobs() {
    let item = make_item(ShareId::new());
    let json = serde_json::to_string(&item).unwrap();
    assert!(json.contains(&EncryptedBlob::new(b"content".to_vec()).to_base64()));
    let back: ItemEncrypted = serde_json::from_str(&json).unwrap();
    assert_eq!(back, item);
}

#[test]
fn blob_rejects_bad_base64() {
    assert!(EncryptedBlob::from_base64("***").is_err());
}

#[test]
fn blob_debug_hides_bytes() {
    let blob = EncryptedBlob::new(vec![1, 2, 3]);
    assert_eq!(format!("{blob:?}"), "EncryptedBlob(3 bytes)");
}

// ── HiddenState ──────────────────────────────────────────────────

#[test]
fn hidden_state_from_empty_blob_is_empty() {
    let state = HiddenState::from_encrypted(EncryptedBlob::empty());
    assert!(state.is_empty());
    assert_eq!(state.clear_text(), None);
}

#[test]
fn hidden_state_from_blob_is_concealed() {
    let state = HiddenState::from_encrypted(EncryptedBlob::new(vec![9; 4]));
    assert!(matches!(state, HiddenState::Concealed(_)));
    assert_eq!(state.clear_text(), None);
}

#[test]
fn hidden_state_conceal_drops_plaintext() {
    let blob = EncryptedBlob::new(vec![9; 4]);
    let revealed = HiddenState::revealed(blob.clone(), "hunter2".into());
    assert_eq!(revealed.clear_text(), Some("hunter2"));

    let concealed = revealed.conceal();
    assert!(!concealed.is_revealed());
    assert_eq!(concealed.encrypted(), &blob);
}

#[test]
fn hidden_state_debug_redacts_plaintext() {
    let revealed = HiddenState::revealed(EncryptedBlob::new(vec![1]), "hunter2".into());
    let dbg = format!("{revealed:?}");
    assert!(dbg.contains("REDACTED"));
    assert!(!dbg.contains("hunter2"));
}

// ── Selections ───────────────────────────────────────────────────

#[test]
fn selection_contains() {
    let a = ShareId::new();
    let b = ShareId::new();
    let c = ShareId::new();

    assert!(ShareSelection::AllShares.contains(&a));
    assert!(ShareSelection::Share(a).contains(&a));
    assert!(!ShareSelection::Share(a).contains(&b));

    let some: ShareSelection = [a, b].into_iter().collect();
    assert!(some.contains(&b));
    assert!(!some.contains(&c));
    assert_eq!(some.share_ids().unwrap().len(), 2);
    assert!(ShareSelection::AllShares.share_ids().is_none());
}

#[test]
fn type_filter_matches() {
    assert!(ItemTypeFilter::All.matches(ItemType::Alias));
    assert!(ItemTypeFilter::Logins.matches(ItemType::Login));
    assert!(!ItemTypeFilter::Logins.matches(ItemType::Note));
    assert!(ItemTypeFilter::CreditCards.matches(ItemType::CreditCard));
}

proptest! {
    #[test]
    fn revision_strictly_increases(bumps in 1usize..20) {
        let mut item = make_item(ShareId::new());
        for _ in 0..bumps {
            let next = item.next_revision();
            prop_assert!(next.revision > item.revision);
            item = next;
        }
        prop_assert_eq!(item.revision, 1 + bumps as u64);
    }

    #[test]
    fn state_code_roundtrip(code in -5i32..10) {
        match ItemState::try_from(code) {
            Ok(state) => prop_assert_eq!(state.code(), code),
            Err(_) => prop_assert!(code != 1 && code != 2),
        }
    }
}
