//! # HTTP Commands
//!
//! Every route handler, grouped by who calls it.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs         ◄─── You are here (exports)
//! ├── auth.rs        ◄─── Login codes, signup, session, logout
//! ├── storefront.rs  ◄─── Catalog, cart, checkout, own orders
//! ├── admin.rs       ◄─── Analytics, merchants, vault, POS
//! ├── config.rs      ◄─── Health, theme, client settings
//! └── pages.rs       ◄─── Server-rendered HTML shells
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  fetch('/api/cart/items', { method: 'POST', body: { productId } })      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  async fn add_item(                                                     │
//! │      _customer: RequireCustomer,   ◄── guard, 401 / 403 on failure      │
//! │      State(app): State<AppState>,  ◄── injected by the Router           │
//! │      Json(body): Json<AddItemBody>,                                     │
//! │  ) -> ApiResult<Json<CartUpdate>>                                       │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  AppStore command under the store mutex ──► persist touched slices      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  JSON reply, or { code, message } with the matching status              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod admin;
pub mod auth;
pub mod config;
pub mod pages;
pub mod storefront;
