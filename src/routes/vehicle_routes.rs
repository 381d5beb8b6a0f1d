use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleResponse,
};
use crate::dto::condition_dto::DamageInput;
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthSession;
use crate::models::loan_vehicle::VehicleFilters;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_vehicle_router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_vehicle))
        .route("/", get(list_vehicles))
        .route("/available", get(list_available_vehicles))
        .route("/:id", get(get_vehicle))
        .route("/:id", put(update_vehicle))
        .route("/:id", delete(delete_vehicle))
        .route("/:id/status", put(update_vehicle_status))
        .route("/:id/damages", post(record_vehicle_damage))
}

async fn create_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(request): Json<CreateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller.create(session.company_id, request).await?;
    Ok(Json(response))
}

async fn get_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<VehicleResponse>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller.get_by_id(id, session.company_id).await?;
    Ok(Json(response))
}

async fn list_vehicles(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Query(filters): Query<VehicleFilters>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller
        .list_by_company(session.company_id, filters)
        .await?;
    Ok(Json(response))
}

async fn list_available_vehicles(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller.list_available(session.company_id).await?;
    Ok(Json(response))
}

async fn update_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller
        .update_details(id, session.company_id, request)
        .await?;
    Ok(Json(response))
}

async fn update_vehicle_status(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateVehicleStatusRequest>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller
        .set_status(id, session.company_id, request)
        .await?;
    Ok(Json(response))
}

async fn record_vehicle_damage(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<DamageInput>,
) -> Result<Json<ApiResponse<VehicleResponse>>, AppError> {
    let controller = state.vehicle_controller();
    let response = controller
        .record_damage(id, session.company_id, request)
        .await?;
    Ok(Json(response))
}

async fn delete_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = state.vehicle_controller();
    controller.delete(id, session.company_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Vehículo eliminado exitosamente"
    })))
}
