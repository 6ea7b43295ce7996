//! # Store
//!
//! In-memory records for the desk. Everything is lost on restart.
//!
//! ## Layout
//!
//! - Listed items by id, each with the reporter's password kept aside
//! - Claimed items by id, moved out of the listing when a claim lands
//! - Photos by key, item photos as `item-{id}` and claim photos as `claim-{claim id}`
//!
//! ## Ids
//!
//! - Items count up from 1
//! - Claims are `C-100`, `C-101`, ...
use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use registry::{
    ClaimReceipt, ClaimedItem, EditCredentials, EditError, FoundItemForm, Item, ItemEdit,
    ItemFilter,
};
use thiserror::Error;
use tracing::info;

const FIRST_CLAIM: u64 = 100;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum StoreError {
    #[error("Item {0} not found")]
    NotFound(u64),

    #[error("Item {0} has already been claimed")]
    AlreadyClaimed(u64),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Photo {
    pub content_type: String,
    pub data: Bytes,
}

struct Listed {
    item: Item,
    password: String,
}

pub struct Claimant {
    pub student_number: String,
    pub name: String,
}

#[derive(Default)]
pub struct Store {
    next_item_id: u64,
    claims_issued: u64,
    items: BTreeMap<u64, Listed>,
    claimed: BTreeMap<u64, ClaimedItem>,
    photos: HashMap<String, Photo>,
}

impl Store {
    pub fn insert_item(
        &mut self,
        form: FoundItemForm,
        photo: Option<Photo>,
        now: DateTime<Utc>,
    ) -> Item {
        self.next_item_id += 1;
        let id = self.next_item_id;

        let photo_url = photo.map(|photo| {
            let key = format!("item-{id}");
            self.photos.insert(key.clone(), photo);
            format!("/api/photos/{key}")
        });

        let password = form.password.clone();
        let item = form.into_item(id, now, photo_url);
        info!(id, name = %item.name, "Found item reported");

        self.items.insert(
            id,
            Listed {
                item: item.clone(),
                password,
            },
        );

        item
    }

    pub fn items(&self, filter: &ItemFilter) -> Vec<Item> {
        filter.apply(self.items.values().map(|listed| &listed.item))
    }

    pub fn claimed(&self) -> Vec<ClaimedItem> {
        self.claimed.values().cloned().collect()
    }

    pub fn claimed_item(&self, id: u64) -> Result<&ClaimedItem, StoreError> {
        self.claimed.get(&id).ok_or(StoreError::NotFound(id))
    }

    pub fn photo(&self, key: &str) -> Option<&Photo> {
        self.photos.get(key)
    }

    pub fn verify(&self, id: u64, credentials: &EditCredentials) -> Result<Item, EditOrStore> {
        let listed = self.listed(id)?;
        credentials.verify(&listed.item, &listed.password)?;

        Ok(listed.item.clone())
    }

    pub fn update(&mut self, id: u64, edit: &ItemEdit) -> Result<Item, EditOrStore> {
        if !self.items.contains_key(&id) {
            return Err(self.missing(id).into());
        }

        let listed = self.items.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        edit.apply(&mut listed.item, &listed.password)?;
        info!(id, name = %listed.item.name, "Item updated");

        Ok(listed.item.clone())
    }

    pub fn claim(
        &mut self,
        id: u64,
        claimant: Claimant,
        photo: Photo,
        now: DateTime<Utc>,
    ) -> Result<ClaimReceipt, StoreError> {
        let Some(listed) = self.items.remove(&id) else {
            return Err(self.missing(id));
        };

        let claim_id = format!("C-{}", FIRST_CLAIM + self.claims_issued);
        self.claims_issued += 1;
        self.photos.insert(format!("claim-{claim_id}"), photo);

        info!(id, %claim_id, claimer = %claimant.student_number, "Item claimed");

        self.claimed.insert(
            id,
            ClaimedItem {
                item: listed.item,
                claim_id: claim_id.clone(),
                claimer_student: claimant.student_number,
                claimer_name: claimant.name,
                claim_date: now,
            },
        );

        Ok(ClaimReceipt {
            claim_id,
            timestamp: now,
        })
    }

    fn listed(&self, id: u64) -> Result<&Listed, StoreError> {
        self.items.get(&id).ok_or_else(|| self.missing(id))
    }

    fn missing(&self, id: u64) -> StoreError {
        match self.claimed.contains_key(&id) {
            true => StoreError::AlreadyClaimed(id),
            false => StoreError::NotFound(id),
        }
    }
}

/// Edit paths fail either on the lookup or on the credentials.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum EditOrStore {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use registry::{EditCredentials, EditError, FoundItemForm, ItemEdit, ItemFilter};

    use super::*;

    fn form(name: &str) -> FoundItemForm {
        FoundItemForm {
            student_number: "2021001".to_string(),
            password: "secret".to_string(),
            item_name: name.to_string(),
            category: "Accessories".to_string(),
            location: "Library".to_string(),
        }
    }

    fn photo() -> Photo {
        Photo {
            content_type: "image/jpeg".to_string(),
            data: Bytes::from_static(b"jpeg"),
        }
    }

    fn claimant() -> Claimant {
        Claimant {
            student_number: "2021002".to_string(),
            name: "Ben Cruz".to_string(),
        }
    }

    fn credentials(password: &str) -> EditCredentials {
        EditCredentials {
            student_number: "2021001".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn test_ids_count_up() {
        let mut store = Store::default();
        let first = store.insert_item(form("Umbrella"), None, Utc::now());
        let second = store.insert_item(form("Wallet"), Some(photo()), Utc::now());

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.photo, None);
        assert_eq!(second.photo.as_deref(), Some("/api/photos/item-2"));
        assert_eq!(store.photo("item-2"), Some(&photo()));
    }

    #[test]
    fn test_claim_moves_item() {
        let mut store = Store::default();
        let item = store.insert_item(form("Umbrella"), None, Utc::now());

        let receipt = store.claim(item.id, claimant(), photo(), Utc::now()).unwrap();
        assert_eq!(receipt.claim_id, "C-100");
        assert!(store.items(&ItemFilter::default()).is_empty());

        let claimed = store.claimed();
        assert_eq!(claimed.len(), 1);
        assert_eq!(claimed[0].claimer_name, "Ben Cruz");
        assert!(store.photo("claim-C-100").is_some());
    }

    #[test]
    fn test_claim_ids_sequence() {
        let mut store = Store::default();
        let a = store.insert_item(form("Umbrella"), None, Utc::now());
        let b = store.insert_item(form("Wallet"), None, Utc::now());

        store.claim(a.id, claimant(), photo(), Utc::now()).unwrap();
        let receipt = store.claim(b.id, claimant(), photo(), Utc::now()).unwrap();
        assert_eq!(receipt.claim_id, "C-101");
    }

    #[test]
    fn test_double_claim_conflicts() {
        let mut store = Store::default();
        let item = store.insert_item(form("Umbrella"), None, Utc::now());
        store.claim(item.id, claimant(), photo(), Utc::now()).unwrap();

        assert_eq!(
            store.claim(item.id, claimant(), photo(), Utc::now()),
            Err(StoreError::AlreadyClaimed(item.id))
        );
        assert_eq!(
            store.claim(99, claimant(), photo(), Utc::now()),
            Err(StoreError::NotFound(99))
        );
    }

    #[test]
    fn test_verify_and_update() {
        let mut store = Store::default();
        let item = store.insert_item(form("Umbrella"), None, Utc::now());

        assert_eq!(
            store.verify(item.id, &credentials("wrong")),
            Err(EditOrStore::Edit(EditError::InvalidCredentials))
        );
        assert!(store.verify(item.id, &credentials("secret")).is_ok());

        let edit = ItemEdit {
            name: "Black umbrella".to_string(),
            category: "Accessories".to_string(),
            location: "Gym".to_string(),
            credentials: credentials("secret"),
        };
        let updated = store.update(item.id, &edit).unwrap();
        assert_eq!(updated.name, "Black umbrella");
        assert_eq!(store.items(&ItemFilter::default())[0].location, "Gym");
    }

    #[test]
    fn test_update_missing_item() {
        let mut store = Store::default();
        let edit = ItemEdit {
            credentials: credentials("secret"),
            ..Default::default()
        };

        assert_eq!(
            store.update(5, &edit),
            Err(EditOrStore::Store(StoreError::NotFound(5)))
        );
    }
}
