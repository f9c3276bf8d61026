//! # motors_api
//!
//! HTTP application library for CSE Motors: routes, middleware and the
//! account, inventory and favorites flows.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod services;
pub mod views;

use std::sync::Arc;

use axum::Router;
use axum::middleware::{from_fn, from_fn_with_state};
use axum::routing::{get, post};
use motors_core::auth::TokenCodec;
use motors_core::store::{CredentialStore, FavoriteStore, InventoryStore};
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::ApiConfig;
use crate::handlers::{account, favorites, home, inventory};
use crate::middleware::identity::resolve_identity;
use crate::middleware::negotiate::negotiate;
use crate::middleware::role_gate::{self, RoleGate};
use crate::middleware::security::{enforce_https, hsts_layer, security_header_layers};
use crate::middleware::session::load_session;
use crate::services::session::SessionStore;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn CredentialStore>,
    pub inventory: Arc<dyn InventoryStore>,
    pub favorites: Arc<dyn FavoriteStore>,
    /// Identity token codec built from `config.auth`.
    pub codec: TokenCodec,
    /// Flash notices and post-login return paths.
    pub sessions: Arc<SessionStore>,
    pub config: ApiConfig,
}

impl AppState {
    /// State backed by a single store implementing every storage seam.
    pub fn new<S>(store: Arc<S>, config: ApiConfig) -> Self
    where
        S: CredentialStore + InventoryStore + FavoriteStore + 'static,
    {
        Self {
            accounts: store.clone(),
            inventory: store.clone(),
            favorites: store,
            codec: TokenCodec::new(config.auth.jwt_secret.as_deref(), config.auth.leeway_secs),
            sessions: Arc::new(SessionStore::new()),
            config,
        }
    }
}

/// Run embedded database migrations.
///
/// Delegates to `motors_core::migrate::migrate()` which owns the migration files.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    motors_core::migrate::migrate(pool).await
}

/// Builds the Axum router with all routes, middleware and shared state.
pub fn router(state: AppState) -> Router {
    // Public routes (no gate)
    let public = Router::new()
        .route("/", get(home::home))
        .route("/account/login", get(account::login_page).post(account::login))
        .route(
            "/account/register",
            get(account::register_page).post(account::register),
        )
        .route("/account/logout", get(account::logout).post(account::logout))
        .route(
            "/inv/type/{classification_id}",
            get(inventory::by_classification),
        )
        .route("/inv/detail/{inv_id}", get(inventory::detail))
        .route(
            "/inv/getInventory/{classification_id}",
            get(inventory::inventory_json),
        );

    // Any logged-in account
    let members = Router::new()
        .route("/account", get(account::management))
        .route("/account/", get(account::management))
        .route("/account/update/{account_id}", get(account::update_page))
        .route("/account/update", post(account::update_account))
        .route("/account/password", post(account::change_password))
        .route("/account/favorites", get(favorites::list))
        .route("/account/favorites/add", post(favorites::add))
        .route("/account/favorites/remove", post(favorites::remove))
        .route("/account/favorites/toggle", post(favorites::toggle))
        .route_layer(from_fn_with_state(
            RoleGate::authenticated(),
            role_gate::enforce,
        ));

    // Inventory staff
    let staff = Router::new()
        .route("/inv", get(inventory::management))
        .route("/inv/", get(inventory::management))
        .route(
            "/inv/add-classification",
            get(inventory::add_classification_page).post(inventory::add_classification),
        )
        .route(
            "/inv/add-inventory",
            get(inventory::add_inventory_page).post(inventory::add_inventory),
        )
        .route("/inv/edit/{inv_id}", get(inventory::edit_page))
        .route("/inv/update", post(inventory::update_inventory))
        .route("/inv/delete/{inv_id}", get(inventory::delete_page))
        .route("/inv/delete", post(inventory::delete_inventory))
        .route_layer(from_fn_with_state(RoleGate::staff(), role_gate::enforce));

    let mut app = Router::new()
        .merge(public)
        .merge(members)
        .merge(staff)
        .fallback(home::not_found)
        .layer(from_fn_with_state(state.clone(), resolve_identity))
        .layer(from_fn(negotiate))
        .layer(from_fn_with_state(state.clone(), load_session))
        .layer(TraceLayer::new_for_http());

    for layer in security_header_layers() {
        app = app.layer(layer);
    }
    if state.config.production {
        app = app.layer(hsts_layer());
    }

    app.layer(from_fn_with_state(state.clone(), enforce_https))
        .with_state(state)
}
