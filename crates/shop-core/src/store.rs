//! # Shopping List Store
//!
//! The persistence contract for `shopping_lists` rows. Every operation is
//! scoped by the owning user's id, so a caller can only ever see or mutate
//! its own rows.

use crate::error::{ShopError, ShopResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

/// One persisted shopping list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartRow {
    pub id: String,
    pub user_id: String,
    pub items: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Row-level operations on the `shopping_lists` collection.
#[async_trait]
pub trait CartStore: Send + Sync {
    /// Insert a new list owned by `user_id` and return the stored row.
    async fn insert(&self, user_id: &str, items: &[String]) -> ShopResult<CartRow>;

    /// All rows owned by `user_id`, newest first.
    async fn list_for_user(&self, user_id: &str) -> ShopResult<Vec<CartRow>>;

    /// Replace the items of an owned row. Returns `false` if no such row.
    async fn update_items(&self, user_id: &str, id: &str, items: &[String]) -> ShopResult<bool>;

    /// Delete an owned row. Returns `false` if no such row.
    async fn delete(&self, user_id: &str, id: &str) -> ShopResult<bool>;

    /// Delete every row owned by `user_id` and return how many went away.
    /// Deleting from an empty cart succeeds with `0`.
    async fn delete_for_user(&self, user_id: &str) -> ShopResult<u64>;

    /// Cheap reachability check for health reporting.
    async fn ping(&self) -> ShopResult<()> {
        Ok(())
    }

    /// Backend name (for logging)
    fn backend_name(&self) -> &'static str;
}

/// Type alias for a shared store (dynamic dispatch)
pub type SharedCartStore = Arc<dyn CartStore>;

/// Process-local store, for development and tests.
#[derive(Debug, Default)]
pub struct MemoryCartStore {
    rows: RwLock<HashMap<String, CartRow>>,
}

impl MemoryCartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total rows across all users
    pub fn len(&self) -> usize {
        self.rows.read().map(|rows| rows.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn poisoned<T>(_: T) -> ShopError {
        ShopError::Store("in-memory store lock poisoned".to_string())
    }
}

#[async_trait]
impl CartStore for MemoryCartStore {
    async fn insert(&self, user_id: &str, items: &[String]) -> ShopResult<CartRow> {
        let row = CartRow {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            items: items.to_vec(),
            created_at: Utc::now(),
            updated_at: None,
        };
        self.rows
            .write()
            .map_err(Self::poisoned)?
            .insert(row.id.clone(), row.clone());
        Ok(row)
    }

    async fn list_for_user(&self, user_id: &str) -> ShopResult<Vec<CartRow>> {
        let mut rows: Vec<CartRow> = self
            .rows
            .read()
            .map_err(Self::poisoned)?
            .values()
            .filter(|row| row.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn update_items(&self, user_id: &str, id: &str, items: &[String]) -> ShopResult<bool> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        match rows.get_mut(id) {
            Some(row) if row.user_id == user_id => {
                row.items = items.to_vec();
                row.updated_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete(&self, user_id: &str, id: &str) -> ShopResult<bool> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        let owned = rows.get(id).is_some_and(|row| row.user_id == user_id);
        if owned {
            rows.remove(id);
        }
        Ok(owned)
    }

    async fn delete_for_user(&self, user_id: &str) -> ShopResult<u64> {
        let mut rows = self.rows.write().map_err(Self::poisoned)?;
        let before = rows.len();
        rows.retain(|_, row| row.user_id != user_id);
        Ok((before - rows.len()) as u64)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
