//! Health, theme preference and the read-only settings the browser needs.

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use hopline_core::invoice::IssuerProfile;
use hopline_core::store::Slice;
use hopline_core::types::{Category, Theme};
use hopline_core::{CONFIRMATION_WINDOW_SECS, RESEND_COOLDOWN_SECS};
use hopline_db::migrations::migration_status;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub database: bool,
    pub migrations_embedded: usize,
    pub migrations_applied: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeBody {
    pub theme: Theme,
}

/// Settings the pages read once on load.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
    pub issuer: IssuerProfile,
    pub categories: Vec<&'static str>,
    pub resend_cooldown_secs: i64,
    pub confirmation_secs: i64,
    pub hosted_tables: bool,
}

/// Liveness plus a `SELECT 1` against the local database.
pub async fn health(State(app): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    let db = app.db.inner();
    let database = db.health_check().await;
    let (migrations_embedded, migrations_applied) = migration_status(db.pool()).await?;
    Ok(Json(HealthResponse {
        status: "ok",
        database,
        migrations_embedded,
        migrations_applied,
    }))
}

pub async fn get_theme(State(app): State<AppState>) -> Json<ThemeBody> {
    Json(ThemeBody {
        theme: app.store.with_store(|s| s.theme),
    })
}

/// Stores the light/dark preference.
pub async fn put_theme(
    State(app): State<AppState>,
    Json(body): Json<ThemeBody>,
) -> ApiResult<Json<ThemeBody>> {
    let theme = app
        .mutate(&[Slice::Theme], move |s| Ok(s.set_theme(body.theme)))
        .await?;
    Ok(Json(ThemeBody { theme }))
}

pub async fn get_config(State(app): State<AppState>) -> Json<ClientConfig> {
    Json(ClientConfig {
        issuer: app.config.issuer.clone(),
        categories: Category::ALL.iter().map(Category::label).collect(),
        resend_cooldown_secs: RESEND_COOLDOWN_SECS,
        confirmation_secs: CONFIRMATION_WINDOW_SECS,
        hosted_tables: app.remote.mirror.is_enabled(),
    })
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::test_app;

    #[tokio::test]
    async fn test_health() {
        let app = test_app(true).await;
        let (status, body) = app.json(Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["database"], true);
        assert_eq!(body["migrationsApplied"], body["migrationsEmbedded"]);
    }

    #[tokio::test]
    async fn test_theme_is_persisted() {
        let app = test_app(true).await;
        let (_, body) = app.json(Method::GET, "/api/theme", None).await;
        assert_eq!(body["theme"], "light");

        let (status, body) = app
            .json(Method::PUT, "/api/theme", Some(json!({ "theme": "dark" })))
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["theme"], "dark");

        let stored = app.state.db.inner().state().load_store().await.unwrap();
        assert_eq!(stored.theme, hopline_core::types::Theme::Dark);
    }

    #[tokio::test]
    async fn test_config_lists_categories() {
        let app = test_app(true).await;
        let (_, body) = app.json(Method::GET, "/api/config", None).await;
        assert_eq!(body["issuer"]["name"], "Hopline Distributors");
        assert_eq!(body["categories"][5], "Soft Drinks");
        assert_eq!(body["resendCooldownSecs"], 30);
        assert_eq!(body["hostedTables"], false);
    }
}
