use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Extension, Json, Router,
};
use uuid::Uuid;

use crate::dto::loan_dto::{
    AttachSignaturesRequest, CloseLoanRequest, DraftDocumentUploadRequest, LoanResponse,
    UploadedDocumentResponse,
};
use crate::dto::ApiResponse;
use crate::middleware::auth::AuthSession;
use crate::services::loan_workflow::{DraftValidationReport, LoanDraft};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_loan_router() -> Router<AppState> {
    Router::new()
        .route("/", post(open_loan))
        .route("/", get(list_loans))
        .route("/draft/validate", post(validate_draft))
        .route("/draft/document", post(upload_draft_document))
        .route("/vehicle/:vehicle_id", get(list_loans_by_vehicle))
        .route("/:id", get(get_loan))
        .route("/:id", delete(delete_loan))
        .route("/:id/close", post(close_loan))
        .route("/:id/signatures", post(attach_signatures))
        .route("/:id/regenerate-contract", post(regenerate_contract))
}

/// Confirma el borrador completo del workflow y abre el préstamo
async fn open_loan(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Json(draft): Json<LoanDraft>,
) -> Result<Json<ApiResponse<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller.open_loan(session.company_id, draft).await?;
    Ok(Json(response))
}

async fn get_loan(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<LoanResponse>, AppError> {
    let controller = state.loan_controller();
    let response = controller.get_by_id(id, session.company_id).await?;
    Ok(Json(response))
}

async fn list_loans(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
) -> Result<Json<Vec<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller.list_by_company(session.company_id).await?;
    Ok(Json(response))
}

async fn list_loans_by_vehicle(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(vehicle_id): Path<Uuid>,
) -> Result<Json<Vec<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller
        .list_by_vehicle(vehicle_id, session.company_id)
        .await?;
    Ok(Json(response))
}

async fn close_loan(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<CloseLoanRequest>,
) -> Result<Json<ApiResponse<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller
        .close_loan(id, session.company_id, request)
        .await?;
    Ok(Json(response))
}

async fn attach_signatures(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
    Json(request): Json<AttachSignaturesRequest>,
) -> Result<Json<ApiResponse<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller
        .attach_signatures(id, session.company_id, request)
        .await?;
    Ok(Json(response))
}

async fn regenerate_contract(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<LoanResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller
        .regenerate_contract(id, session.company_id)
        .await?;
    Ok(Json(response))
}

/// Informe etapa por etapa del borrador, sin efectos secundarios
async fn validate_draft(
    State(state): State<AppState>,
    Json(draft): Json<LoanDraft>,
) -> Result<Json<ApiResponse<DraftValidationReport>>, AppError> {
    let controller = state.loan_controller();
    let report = controller.validate_draft(&draft);
    Ok(Json(ApiResponse::success(report)))
}

async fn upload_draft_document(
    State(state): State<AppState>,
    Json(request): Json<DraftDocumentUploadRequest>,
) -> Result<Json<ApiResponse<UploadedDocumentResponse>>, AppError> {
    let controller = state.loan_controller();
    let response = controller.upload_draft_document(request).await?;
    Ok(Json(response))
}

async fn delete_loan(
    State(state): State<AppState>,
    Extension(session): Extension<AuthSession>,
    Path(id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, AppError> {
    let controller = state.loan_controller();
    controller.delete(id, session.company_id).await?;
    Ok(Json(serde_json::json!({
        "success": true,
        "message": "Préstamo eliminado exitosamente"
    })))
}
