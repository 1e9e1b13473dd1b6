//! Procurement API Library
//!
//! Purchase orders with transactional line item reconciliation, an item
//! catalog, AI-assisted document conversion and a warehouse (WMS) hand-off.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod commands;
pub mod config;
pub mod db;
pub mod dto;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod tracing;

use axum::Router;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub services: handlers::AppServices,
}

/// Routes mounted under `/api`.
pub fn api_routes(max_upload_size: usize) -> Router<AppState> {
    Router::new()
        .merge(handlers::purchase_orders::purchase_order_routes(max_upload_size))
        .merge(handlers::catalog::catalog_routes())
}

/// Health, `/api` and Swagger UI on one router, without the HTTP middleware stack.
pub fn app_router(state: AppState) -> Router {
    let max_upload_size = state.config.max_upload_size;
    Router::new()
        .merge(handlers::health::health_routes())
        .nest("/api", api_routes(max_upload_size))
        .merge(openapi::swagger_ui())
        .with_state(state)
}
