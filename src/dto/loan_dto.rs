use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::condition_dto::{ConditionReportResponse, DamageInput, ReportPhotoInput};
use crate::models::vehicle_loan::{DriverIdentity, VehicleLoan};

// Request de cierre de préstamo: lecturas finales + observaciones del cierre
#[derive(Debug, Deserialize, Validate)]
pub struct CloseLoanRequest {
    #[validate(range(min = 0, message = "El kilometraje final no puede ser negativo"))]
    pub end_mileage: i32,
    #[validate(range(min = 0, max = 100, message = "El nivel de combustible debe estar entre 0 y 100"))]
    pub end_fuel_level: i32,
    pub exterior_state: crate::models::condition_report::CleanlinessLevel,
    pub interior_state: crate::models::condition_report::CleanlinessLevel,
    pub tires: crate::models::condition_report::TireCondition,
    pub lights: crate::models::condition_report::LightsCondition,
    #[serde(default)]
    pub damages: Vec<DamageInput>,
    #[serde(default)]
    #[validate]
    pub photos: Vec<ReportPhotoInput>,
    pub notes: Option<String>,
}

// Request para adjuntar las dos firmas a un préstamo pendiente de firma
#[derive(Debug, Deserialize, Validate)]
pub struct AttachSignaturesRequest {
    #[validate(length(min = 1, message = "La firma del cliente es obligatoria"))]
    pub client_signature_url: String,
    #[validate(length(min = 1, message = "La firma del taller es obligatoria"))]
    pub dealer_signature_url: String,
}

// Tipo de documento subido mientras se completa un borrador
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DraftDocumentKind {
    LicenseFront,
    LicenseBack,
    ClientSignature,
    DealerSignature,
    ConditionPhoto,
    VehiclePhoto,
}

// Request de subida de documento en base64
#[derive(Debug, Deserialize, Validate)]
pub struct DraftDocumentUploadRequest {
    pub kind: DraftDocumentKind,
    #[validate(length(min = 1, message = "El contenido del documento no puede estar vacío"))]
    pub data: String,
}

// Response con la URL pública del documento subido
#[derive(Debug, Serialize)]
pub struct UploadedDocumentResponse {
    pub kind: DraftDocumentKind,
    pub url: String,
    pub content_type: String,
}

// Response de préstamo
#[derive(Debug, Serialize)]
pub struct LoanResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub vehicle_id: Uuid,
    pub client_id: Uuid,
    pub start_date: NaiveDate,
    pub expected_end_date: NaiveDate,
    pub actual_end_date: Option<DateTime<Utc>>,
    pub start_mileage: i32,
    pub end_mileage: Option<i32>,
    pub start_fuel_level: i32,
    pub end_fuel_level: Option<i32>,
    pub distance_driven: Option<i32>,
    pub driver: DriverIdentity,
    pub insurer_name: String,
    pub policy_number: String,
    pub client_signature_url: Option<String>,
    pub dealer_signature_url: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub contract_signed: bool,
    pub contract_url: Option<String>,
    pub opening_report: ConditionReportResponse,
    pub closing_report: Option<ConditionReportResponse>,
    pub is_open: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<VehicleLoan> for LoanResponse {
    fn from(loan: VehicleLoan) -> Self {
        let distance_driven = loan.distance_driven();
        let is_open = loan.is_open();
        LoanResponse {
            id: loan.id,
            company_id: loan.company_id,
            vehicle_id: loan.vehicle_id,
            client_id: loan.client_id,
            start_date: loan.start_date,
            expected_end_date: loan.expected_end_date,
            actual_end_date: loan.actual_end_date,
            start_mileage: loan.start_mileage,
            end_mileage: loan.end_mileage,
            start_fuel_level: loan.start_fuel_level,
            end_fuel_level: loan.end_fuel_level,
            distance_driven,
            driver: loan.driver,
            insurer_name: loan.insurer_name,
            policy_number: loan.policy_number,
            client_signature_url: loan.client_signature_url,
            dealer_signature_url: loan.dealer_signature_url,
            signed_at: loan.signed_at,
            contract_signed: loan.contract_signed,
            contract_url: loan.contract_url,
            opening_report: loan.opening_report.into(),
            closing_report: loan.closing_report.map(ConditionReportResponse::from),
            is_open,
            notes: loan.notes,
            created_at: loan.created_at,
        }
    }
}
