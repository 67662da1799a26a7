//! # PostgREST Shopping List Store
//!
//! [`CartStore`] over Supabase's REST interface. Every request carries an
//! explicit `user_id=eq.<id>` filter; mutations ask for
//! `Prefer: return=representation` so the affected rows come back and can be
//! counted.

use crate::config::{SupabaseConfig, SHOPPING_LISTS_TABLE};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shop_core::{CartRow, CartStore, ShopError, ShopResult};
use tracing::{debug, error, instrument};

/// Supabase-backed shopping list store
pub struct PostgrestCartStore {
    config: SupabaseConfig,
    client: Client,
    table_url: String,
    bearer: String,
}

#[derive(Serialize)]
struct NewRow<'a> {
    user_id: &'a str,
    items: &'a [String],
}

#[derive(Serialize)]
struct ItemsPatch<'a> {
    items: &'a [String],
}

impl PostgrestCartStore {
    /// Build the store. Fails without a service-role key.
    pub fn new(config: SupabaseConfig) -> ShopResult<Self> {
        let bearer = format!("Bearer {}", config.table_key()?);
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShopError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        let table_url = config.rest_url(SHOPPING_LISTS_TABLE);

        Ok(Self {
            config,
            client,
            table_url,
            bearer,
        })
    }

    /// Create from environment variables
    pub fn from_env() -> ShopResult<Self> {
        Self::new(SupabaseConfig::from_env()?)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.config.anon_key)
            .header("Authorization", &self.bearer)
    }

    fn returning(request: RequestBuilder) -> RequestBuilder {
        request.header("Prefer", "return=representation")
    }

    fn owner_filter(user_id: &str) -> (&'static str, String) {
        ("user_id", format!("eq.{}", user_id))
    }

    fn id_filter(id: &str) -> (&'static str, String) {
        ("id", format!("eq.{}", id))
    }

    async fn send(request: RequestBuilder, operation: &str) -> ShopResult<Response> {
        let response = request.send().await.map_err(|e| {
            error!("PostgREST {} failed: {}", operation, e);
            ShopError::Store(format!("{}: {}", operation, e))
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        error!("PostgREST {} error: status={}, body={}", operation, status, body);
        Err(ShopError::Store(format!(
            "{}: HTTP {} {}",
            operation,
            status.as_u16(),
            body
        )))
    }

    async fn rows<T: DeserializeOwned>(response: Response, operation: &str) -> ShopResult<Vec<T>> {
        response
            .json()
            .await
            .map_err(|e| ShopError::Store(format!("{}: unreadable response: {}", operation, e)))
    }
}

#[async_trait]
impl CartStore for PostgrestCartStore {
    #[instrument(skip(self, items), fields(items = items.len()))]
    async fn insert(&self, user_id: &str, items: &[String]) -> ShopResult<CartRow> {
        let request = self
            .authorized(self.client.post(&self.table_url))
            .json(&NewRow { user_id, items });
        let response = Self::send(Self::returning(request), "insert").await?;

        Self::rows::<CartRow>(response, "insert")
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ShopError::Store("insert: no row returned".to_string()))
    }

    #[instrument(skip(self))]
    async fn list_for_user(&self, user_id: &str) -> ShopResult<Vec<CartRow>> {
        let request = self.authorized(self.client.get(&self.table_url)).query(&[
            ("select", "*".to_string()),
            Self::owner_filter(user_id),
            ("order", "created_at.desc".to_string()),
        ]);
        let response = Self::send(request, "select").await?;
        let rows: Vec<CartRow> = Self::rows(response, "select").await?;
        debug!(user_id, rows = rows.len(), "Loaded shopping lists");
        Ok(rows)
    }

    #[instrument(skip(self, items))]
    async fn update_items(&self, user_id: &str, id: &str, items: &[String]) -> ShopResult<bool> {
        let request = self
            .authorized(self.client.patch(&self.table_url))
            .query(&[Self::id_filter(id), Self::owner_filter(user_id)])
            .json(&ItemsPatch { items });
        let response = Self::send(Self::returning(request), "update").await?;
        let rows: Vec<serde_json::Value> = Self::rows(response, "update").await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self))]
    async fn delete(&self, user_id: &str, id: &str) -> ShopResult<bool> {
        let request = self
            .authorized(self.client.delete(&self.table_url))
            .query(&[Self::id_filter(id), Self::owner_filter(user_id)]);
        let response = Self::send(Self::returning(request), "delete").await?;
        let rows: Vec<serde_json::Value> = Self::rows(response, "delete").await?;
        Ok(!rows.is_empty())
    }

    #[instrument(skip(self))]
    async fn delete_for_user(&self, user_id: &str) -> ShopResult<u64> {
        let request = self
            .authorized(self.client.delete(&self.table_url))
            .query(&[Self::owner_filter(user_id)]);
        let response = Self::send(Self::returning(request), "delete").await?;
        let rows: Vec<serde_json::Value> = Self::rows(response, "delete").await?;
        Ok(rows.len() as u64)
    }

    async fn ping(&self) -> ShopResult<()> {
        let request = self
            .authorized(self.client.get(&self.table_url))
            .query(&[("select", "id"), ("limit", "1")]);
        Self::send(request, "ping").await.map(|_| ())
    }

    fn backend_name(&self) -> &'static str {
        "supabase"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const TABLE: &str = "/rest/v1/shopping_lists";

    fn store_for(server: &MockServer) -> PostgrestCartStore {
        let config = SupabaseConfig::new(server.uri(), "anon-key")
            .unwrap()
            .with_service_role_key("service-key");
        PostgrestCartStore::new(config).unwrap()
    }

    fn row(id: &str, user_id: &str, items: &[&str]) -> serde_json::Value {
        json!({
            "id": id,
            "user_id": user_id,
            "items": items,
            "created_at": "2026-10-01T12:00:00+00:00"
        })
    }

    #[tokio::test]
    async fn test_insert_request_shape() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(TABLE))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer service-key"))
            .and(header("prefer", "return=representation"))
            .and(body_json(json!({ "user_id": "u1", "items": ["Milk", "Bread"] })))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(json!([row("l1", "u1", &["Milk", "Bread"])])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let row = store_for(&server)
            .insert("u1", &["Milk".to_string(), "Bread".to_string()])
            .await
            .unwrap();
        assert_eq!(row.id, "l1");
        assert_eq!(row.items, vec!["Milk", "Bread"]);
    }

    #[tokio::test]
    async fn test_list_filters_and_orders() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TABLE))
            .and(query_param("user_id", "eq.u1"))
            .and(query_param("order", "created_at.desc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                row("l2", "u1", &["Eggs"]),
                row("l1", "u1", &["Milk"])
            ])))
            .mount(&server)
            .await;

        let rows = store_for(&server).list_for_user("u1").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id, "l2");
    }

    #[test]
    fn test_anon_only_config_rejected() {
        let config = SupabaseConfig::new("https://x.supabase.co", "anon-key").unwrap();
        assert!(matches!(
            PostgrestCartStore::new(config),
            Err(ShopError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_user_scoped_requests_use_service_role() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(TABLE))
            .and(header("apikey", "anon-key"))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(TABLE))
            .and(header("authorization", "Bearer service-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(1)
            .mount(&server)
            .await;

        let store = store_for(&server);
        assert!(store.list_for_user("u1").await.unwrap().is_empty());
        assert_eq!(store.delete_for_user("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_counts_returned_rows() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(TABLE))
            .and(query_param("user_id", "eq.u1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                row("l1", "u1", &["Milk"]),
                row("l2", "u1", &["Eggs"])
            ])))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path(TABLE))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let store = store_for(&server);
        assert_eq!(store.delete_for_user("u1").await.unwrap(), 2);
        assert_eq!(store.delete_for_user("u1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_delete_one_scoped_by_owner() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path(TABLE))
            .and(query_param("id", "eq.l1"))
            .and(query_param("user_id", "eq.u2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        assert!(!store_for(&server).delete("u2", "l1").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_items() {
        let server = MockServer::start().await;
        Mock::given(method("PATCH"))
            .and(path(TABLE))
            .and(query_param("id", "eq.l1"))
            .and(query_param("user_id", "eq.u1"))
            .and(body_json(json!({ "items": ["Bread"] })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([row("l1", "u1", &["Bread"])])),
            )
            .mount(&server)
            .await;

        assert!(store_for(&server)
            .update_items("u1", "l1", &["Bread".to_string()])
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_server_error_is_store_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = store_for(&server).list_for_user("u1").await.unwrap_err();
        assert!(matches!(err, ShopError::Store(_)));
        assert_eq!(err.public_message(), "Failed to access shopping lists");
        assert!(store_for(&server).ping().await.is_err());
    }
}
