//! Supplyline API Library
//!
//! Procurement & dispatch lifecycle engine: franchise supply requests move
//! through vendor quotation, approval, fulfillment, dispatch and receipt
//! reconciliation, with every mutation expressed as an atomic
//! compare-and-swap against the ledger.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod auth;
pub mod commands;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde_json::{json, Value};
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}

/// All procurement routes, nested per actor surface.
pub fn procurement_routes() -> Router<AppState> {
    Router::new()
        .nest("/franchise", handlers::franchise::franchise_routes())
        .nest("/vendor", handlers::vendor::vendor_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .nest("/requests", handlers::requests::request_routes())
}

/// Builds the complete application router for the given state.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(|| async { "supplyline-api up" }))
        .route("/health", get(health))
        .nest("/procurement", procurement_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
}
