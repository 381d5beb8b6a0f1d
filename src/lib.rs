//! Motor del ciclo de vida de préstamos de vehículos de cortesía
//!
//! API REST para talleres y concesionarios: registro de la flota de
//! cortesía, workflow de apertura de préstamos con informes de estado,
//! firmas y generación del contrato en HTML.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod storage;
pub mod utils;

use axum::{middleware::from_fn_with_state, routing::get, Json, Router};
use serde_json::json;

use middleware::auth::auth_middleware;
use middleware::cors::{cors_middleware, cors_middleware_with_origins};
use state::AppState;

/// Ensamblar la aplicación completa sobre un estado ya construido.
///
/// Todas las rutas de negocio quedan detrás del middleware de
/// autenticación; solo `/test` es público.
pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .nest("/api/vehicle", routes::vehicle_routes::create_vehicle_router())
        .nest("/api/loan", routes::loan_routes::create_loan_router())
        .layer(from_fn_with_state(state.clone(), auth_middleware));

    let cors = if state.config.is_production() {
        cors_middleware_with_origins(state.config.cors_origins.clone())
    } else {
        cors_middleware()
    };

    Router::new()
        .route("/test", get(test_endpoint))
        .merge(protected)
        .layer(cors)
        .with_state(state)
}

/// Endpoint de prueba simple
async fn test_endpoint() -> Json<serde_json::Value> {
    Json(json!({
        "message": "¡Motor de préstamos de cortesía funcionando correctamente!",
        "status": "ok",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
