//! Inventoria API Library
//!
//! Multi-tenant inventory tracking service: authenticated users register
//! items with a stock balance, a minimum-stock threshold, and per-month
//! trend counts, then query and adjust them through a REST surface.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use sea_orm::DatabaseConnection;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub auth: Arc<auth::AuthService>,
    pub users: services::users::UserService,
    pub inventory: services::inventory::InventoryService,
}

impl AppState {
    /// Wire up services against a connected database.
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        auth: Arc<auth::AuthService>,
    ) -> Self {
        Self {
            users: services::users::UserService::new(db.clone()),
            inventory: services::inventory::InventoryService::new(db.clone()),
            db,
            config,
            auth,
        }
    }
}

/// Build the full application router. Inventory routes sit behind the bearer
/// token middleware; auth and health routes are open.
pub fn api_routes(state: AppState) -> Router {
    let inventory_routes = handlers::inventory::router().layer(middleware::from_fn_with_state(
        state.auth.clone(),
        auth::require_auth,
    ));

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .nest("/api/auth", handlers::auth::router())
        .nest("/api/inventory", inventory_routes)
        .with_state(state)
}
