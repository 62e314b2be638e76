//! # Hosted Table Client
//!
//! CRUD against a PostgREST-style service at `{base}/rest/v1/{table}`.
//!
//! ```text
//! ┌──────────────────┬────────┬────────────────────────────────────────────┐
//! │ operation        │ method │ request                                    │
//! ├──────────────────┼────────┼────────────────────────────────────────────┤
//! │ select_all       │ GET    │ ?select=*                                  │
//! │ select_by_email  │ GET    │ ?email=eq.<email>&select=*                 │
//! │ upsert           │ POST   │ Prefer: resolution=merge-duplicates        │
//! │ patch            │ PATCH  │ ?id=eq.<id>                                │
//! │ delete           │ DELETE │ ?id=eq.<id>                                │
//! └──────────────────┴────────┴────────────────────────────────────────────┘
//!   every request: apikey: <key>, Authorization: Bearer <key>
//! ```
//!
//! Bodies and rows go through [`crate::fields`] so the app never sees
//! snake_case keys.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, RequestBuilder, Response};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use crate::config::TableSettings;
use crate::error::{SyncError, SyncResult};
use crate::fields;

/// Longest error body kept in a `Rejected` error.
const MAX_ERROR_BODY: usize = 512;

/// The tables Hopline mirrors to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Users,
    Products,
    Orders,
    CounterSales,
}

impl Table {
    pub fn name(&self) -> &'static str {
        match self {
            Table::Users => "users",
            Table::Products => "products",
            Table::Orders => "orders",
            Table::CounterSales => "counter_sales",
        }
    }
}

impl std::fmt::Display for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `{base}/rest/v1/{table}`.
pub fn table_url(base: &Url, table: Table) -> SyncResult<Url> {
    Ok(base.join(&format!("rest/v1/{}", table.name()))?)
}

/// Builds the `apikey` and `Authorization` headers sent on every request.
fn auth_headers(key: &str) -> SyncResult<HeaderMap> {
    let invalid = |e: reqwest::header::InvalidHeaderValue| {
        SyncError::InvalidConfig(format!("table key is not a valid header value: {e}"))
    };

    let mut apikey = HeaderValue::from_str(key).map_err(invalid)?;
    apikey.set_sensitive(true);
    let mut bearer = HeaderValue::from_str(&format!("Bearer {key}")).map_err(invalid)?;
    bearer.set_sensitive(true);

    let mut headers = HeaderMap::new();
    headers.insert("apikey", apikey);
    headers.insert(AUTHORIZATION, bearer);
    Ok(headers)
}

/// Client for the hosted table service.
#[derive(Debug, Clone)]
pub struct HostedTableClient {
    http: Client,
    base_url: Url,
}

impl HostedTableClient {
    /// Builds the client. No request is made.
    pub fn new(settings: &TableSettings, timeout: Duration) -> SyncResult<Self> {
        let http = Client::builder()
            .default_headers(auth_headers(settings.api_key.expose_secret())?)
            .timeout(timeout)
            .build()?;

        Ok(HostedTableClient {
            http,
            base_url: settings.base_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    async fn send(&self, table: Table, op: &'static str, request: RequestBuilder) -> SyncResult<Response> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            debug!(table = %table, op, status = status.as_u16(), "Hosted table request ok");
            return Ok(response);
        }

        let mut body = response.text().await.unwrap_or_default();
        if body.len() > MAX_ERROR_BODY {
            let cut = (0..=MAX_ERROR_BODY)
                .rev()
                .find(|i| body.is_char_boundary(*i))
                .unwrap_or(0);
            body.truncate(cut);
        }
        warn!(table = %table, op, status = status.as_u16(), "Hosted table rejected request");
        Err(SyncError::Rejected {
            status: status.as_u16(),
            body,
        })
    }

    async fn rows<T: DeserializeOwned>(response: Response) -> SyncResult<Vec<T>> {
        let raw: Value = response.json().await?;
        let rows = match fields::from_remote(raw) {
            Value::Array(rows) => rows,
            other => vec![other],
        };
        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(SyncError::from))
            .collect()
    }

    /// Every row of `table`.
    pub async fn select_all<T: DeserializeOwned>(&self, table: Table) -> SyncResult<Vec<T>> {
        let request = self
            .http
            .get(table_url(&self.base_url, table)?)
            .query(&[("select", "*")]);
        let response = self.send(table, "select_all", request).await?;
        Self::rows(response).await
    }

    /// Rows whose `email` column equals `email`.
    pub async fn select_by_email<T: DeserializeOwned>(
        &self,
        table: Table,
        email: &str,
    ) -> SyncResult<Vec<T>> {
        let filter = format!("eq.{email}");
        let request = self
            .http
            .get(table_url(&self.base_url, table)?)
            .query(&[("email", filter.as_str()), ("select", "*")]);
        let response = self.send(table, "select_by_email", request).await?;
        Self::rows(response).await
    }

    /// Inserts `row`, or merges it into the existing row with the same id.
    pub async fn upsert<T: Serialize + ?Sized>(&self, table: Table, row: &T) -> SyncResult<()> {
        let body = fields::to_remote(serde_json::to_value(row)?);
        let request = self
            .http
            .post(table_url(&self.base_url, table)?)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&body);
        self.send(table, "upsert", request).await.map(|_| ())
    }

    /// Updates the given columns of the row with `id`.
    pub async fn patch(&self, table: Table, id: &str, changes: Value) -> SyncResult<()> {
        let filter = format!("eq.{id}");
        let request = self
            .http
            .patch(table_url(&self.base_url, table)?)
            .query(&[("id", filter.as_str())])
            .json(&fields::to_remote(changes));
        self.send(table, "patch", request).await.map(|_| ())
    }

    /// Deletes the row with `id`.
    pub async fn delete(&self, table: Table, id: &str) -> SyncResult<()> {
        let filter = format!("eq.{id}");
        let request = self
            .http
            .delete(table_url(&self.base_url, table)?)
            .query(&[("id", filter.as_str())]);
        self.send(table, "delete", request).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::SecretString;

    fn settings(url: &str) -> TableSettings {
        TableSettings {
            base_url: Url::parse(url).unwrap(),
            api_key: SecretString::from("anon-key".to_string()),
        }
    }

    #[test]
    fn test_table_url() {
        let base = Url::parse("https://project.example.co/").unwrap();
        assert_eq!(
            table_url(&base, Table::CounterSales).unwrap().as_str(),
            "https://project.example.co/rest/v1/counter_sales"
        );

        let nested = Url::parse("https://gateway.example.co/tenant/").unwrap();
        assert_eq!(
            table_url(&nested, Table::Users).unwrap().as_str(),
            "https://gateway.example.co/tenant/rest/v1/users"
        );
    }

    #[test]
    fn test_auth_headers_are_sensitive() {
        let headers = auth_headers("anon-key").unwrap();
        assert_eq!(headers["apikey"], "anon-key");
        assert_eq!(headers[AUTHORIZATION], "Bearer anon-key");
        assert!(headers[AUTHORIZATION].is_sensitive());

        assert!(matches!(
            auth_headers("bad\nkey"),
            Err(SyncError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_client_builds_without_network() {
        let client =
            HostedTableClient::new(&settings("https://project.example.co/"), Duration::from_secs(1))
                .unwrap();
        assert_eq!(client.base_url().host_str(), Some("project.example.co"));
    }
}
