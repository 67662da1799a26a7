//! # Shopping List Service
//!
//! User-facing list operations composed from [`CartStore`] primitives.

use crate::error::{ShopError, ShopResult};
use crate::item::{parse_items, CartView};
use crate::store::{CartRow, CartStore};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Outcome of removing one item from every list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoveItemOutcome {
    /// Lists that still have items after the removal
    pub updated: u64,
    /// Lists deleted because they became empty
    pub deleted: u64,
}

/// Operations on one user's shopping lists
pub struct ShoppingLists<'a> {
    store: &'a dyn CartStore,
    user_id: &'a str,
}

impl<'a> ShoppingLists<'a> {
    pub fn new(store: &'a dyn CartStore, user_id: &'a str) -> Self {
        Self { store, user_id }
    }

    /// Validate and persist a new list.
    pub async fn save(&self, labels: Vec<String>) -> ShopResult<CartRow> {
        let items: Vec<String> = parse_items(labels)?
            .into_iter()
            .map(|item| item.into_inner())
            .collect();
        let row = self.store.insert(self.user_id, &items).await?;
        info!(user_id = %self.user_id, list_id = %row.id, items = items.len(), "Saved shopping list");
        Ok(row)
    }

    /// All lists, newest first
    pub async fn all(&self) -> ShopResult<Vec<CartRow>> {
        self.store.list_for_user(self.user_id).await
    }

    /// Unique items across all lists, priced
    pub async fn cart(&self) -> ShopResult<CartView> {
        let rows = self.all().await?;
        Ok(CartView::from_labels(
            rows.iter().flat_map(|row| row.items.iter().map(String::as_str)),
        ))
    }

    /// Remove `label` from every list holding it; lists left empty are deleted.
    pub async fn remove_item(&self, label: &str) -> ShopResult<RemoveItemOutcome> {
        let mut outcome = RemoveItemOutcome::default();
        for row in self.all().await? {
            if !row.items.iter().any(|i| i == label) {
                continue;
            }
            let remaining: Vec<String> =
                row.items.into_iter().filter(|i| i != label).collect();
            if remaining.is_empty() {
                if self.store.delete(self.user_id, &row.id).await? {
                    outcome.deleted += 1;
                }
            } else if self.store.update_items(self.user_id, &row.id, &remaining).await? {
                outcome.updated += 1;
            }
        }
        debug!(
            user_id = %self.user_id,
            updated = outcome.updated,
            deleted = outcome.deleted,
            "Removed item from shopping lists"
        );
        Ok(outcome)
    }

    /// Delete one list; `NotFound` if it does not exist or is not owned.
    pub async fn delete(&self, list_id: &str) -> ShopResult<()> {
        if self.store.delete(self.user_id, list_id).await? {
            Ok(())
        } else {
            Err(ShopError::NotFound(format!("Shopping list {}", list_id)))
        }
    }

    /// Delete every list. Idempotent.
    pub async fn clear(&self) -> ShopResult<u64> {
        let deleted = self.store.delete_for_user(self.user_id).await?;
        info!(user_id = %self.user_id, deleted, "Cleared shopping cart");
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryCartStore;

    fn labels(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_save_validates_items() {
        let store = MemoryCartStore::new();
        let lists = ShoppingLists::new(&store, "u1");

        assert!(lists.save(vec![]).await.is_err());
        assert!(lists.save(labels(&["", "Milk"])).await.is_err());
        assert!(lists.save(labels(&["a very long item label indeed"])).await.is_err());
        assert!(store.is_empty());

        let row = lists.save(labels(&["Milk", "Bread"])).await.unwrap();
        assert_eq!(row.user_id, "u1");
    }

    #[tokio::test]
    async fn test_cart_view_merges_lists() {
        let store = MemoryCartStore::new();
        let lists = ShoppingLists::new(&store, "u1");
        lists.save(labels(&["Milk", "Bread"])).await.unwrap();
        lists.save(labels(&["Milk", "Eggs"])).await.unwrap();

        let cart = lists.cart().await.unwrap();
        assert_eq!(cart.items.len(), 3);
        assert_eq!(cart.total, 4 + 5 + 4);
    }

    #[tokio::test]
    async fn test_remove_item_deletes_emptied_lists() {
        let store = MemoryCartStore::new();
        let lists = ShoppingLists::new(&store, "u1");
        lists.save(labels(&["Milk"])).await.unwrap();
        lists.save(labels(&["Milk", "Bread"])).await.unwrap();
        lists.save(labels(&["Eggs"])).await.unwrap();

        let outcome = lists.remove_item("Milk").await.unwrap();
        assert_eq!(outcome, RemoveItemOutcome { updated: 1, deleted: 1 });

        let cart = lists.cart().await.unwrap();
        let mut names = cart.labels();
        names.sort();
        assert_eq!(names, labels(&["Bread", "Eggs"]));
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_foreign_list_is_not_found() {
        let store = MemoryCartStore::new();
        let row = ShoppingLists::new(&store, "u1")
            .save(labels(&["Milk"]))
            .await
            .unwrap();

        let err = ShoppingLists::new(&store, "u2").delete(&row.id).await.unwrap_err();
        assert_eq!(err.status_code(), 404);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_clear_twice() {
        let store = MemoryCartStore::new();
        let lists = ShoppingLists::new(&store, "u1");
        lists.save(labels(&["Milk"])).await.unwrap();

        assert_eq!(lists.clear().await.unwrap(), 1);
        assert_eq!(lists.clear().await.unwrap(), 0);
    }
}
