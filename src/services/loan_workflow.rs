//! Workflow de creación de préstamos
//!
//! Proceso secuencial de siete etapas sobre un borrador que mantiene el
//! caller: selección → términos → informe de estado → conductor → seguro →
//! firmas → confirmación. Cada etapa tiene un predicado puro sobre el
//! borrador acumulado; el workflow no avanza más allá de una etapa incompleta
//! y los fallos nombran el campo que falta, no un "inválido" genérico.
//!
//! El borrador no persiste nada en el servidor: se revalida completo en la
//! confirmación antes de llamar al motor. Cometer sin firmas está permitido
//! (préstamo pendiente de firma) y se comunica como aviso, no como error.

use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::condition_dto::ConditionReportInput;
use crate::dto::loan_dto::{
    DraftDocumentKind, DraftDocumentUploadRequest, UploadedDocumentResponse,
};
use crate::models::condition_report::ConditionReport;
use crate::models::vehicle_loan::{DriverIdentity, InsuranceInfo, LoanTerms};
use crate::services::condition_service;
use crate::storage::{object_path, ObjectStorage};
use crate::utils::deadline::{with_deadline, DEFAULT_UPLOAD_DEADLINE};
use crate::utils::errors::{validation_error, AppError, AppResult};
use crate::utils::images::{check_signature_image, normalize_photo, IngestLimits};
use crate::utils::validation::{validate_adult_driver, validate_license_number};

/// Borrador de préstamo acumulado por el caller etapa a etapa.
///
/// Todos los campos son opcionales: la completitud se evalúa por etapa con
/// los predicados de este módulo. El mismo borrador sirve como payload de la
/// confirmación final.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoanDraft {
    pub vehicle_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub start_date: Option<NaiveDate>,
    pub expected_end_date: Option<NaiveDate>,
    pub start_mileage: Option<i32>,
    pub start_fuel_level: Option<i32>,
    pub opening_report: Option<ConditionReportInput>,
    pub driver_name: Option<String>,
    pub license_number: Option<String>,
    pub license_issue_date: Option<NaiveDate>,
    pub birth_date: Option<NaiveDate>,
    pub birth_place: Option<String>,
    pub license_front_url: Option<String>,
    pub license_back_url: Option<String>,
    pub insurer_name: Option<String>,
    pub policy_number: Option<String>,
    pub client_signature_url: Option<String>,
    pub dealer_signature_url: Option<String>,
    pub notes: Option<String>,
}

/// Etapas ordenadas del workflow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    Selection,
    Terms,
    Condition,
    Driver,
    Insurance,
    Signatures,
    Commit,
}

impl WorkflowStage {
    pub const ORDERED: [WorkflowStage; 7] = [
        WorkflowStage::Selection,
        WorkflowStage::Terms,
        WorkflowStage::Condition,
        WorkflowStage::Driver,
        WorkflowStage::Insurance,
        WorkflowStage::Signatures,
        WorkflowStage::Commit,
    ];

    /// Etapas con requisitos propios (todas menos la confirmación)
    pub const PREREQUISITES: [WorkflowStage; 6] = [
        WorkflowStage::Selection,
        WorkflowStage::Terms,
        WorkflowStage::Condition,
        WorkflowStage::Driver,
        WorkflowStage::Insurance,
        WorkflowStage::Signatures,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowStage::Selection => "selection",
            WorkflowStage::Terms => "terms",
            WorkflowStage::Condition => "condition",
            WorkflowStage::Driver => "driver",
            WorkflowStage::Insurance => "insurance",
            WorkflowStage::Signatures => "signatures",
            WorkflowStage::Commit => "commit",
        }
    }
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn require<T>(field: &'static str, value: &Option<T>, missing: &mut Vec<&'static str>) {
    if value.is_none() {
        missing.push(field);
    }
}

fn require_text(field: &'static str, value: &Option<String>, missing: &mut Vec<&'static str>) {
    if value.as_deref().map_or(true, |v| v.trim().is_empty()) {
        missing.push(field);
    }
}

/// Campos que faltan para completar una etapa. Vacío = etapa completa.
pub fn missing_fields(draft: &LoanDraft, stage: WorkflowStage) -> Vec<&'static str> {
    let mut missing = Vec::new();

    match stage {
        WorkflowStage::Selection => {
            require("vehicle_id", &draft.vehicle_id, &mut missing);
            require("client_id", &draft.client_id, &mut missing);
        }
        WorkflowStage::Terms => {
            require("start_date", &draft.start_date, &mut missing);
            require("expected_end_date", &draft.expected_end_date, &mut missing);
            require("start_mileage", &draft.start_mileage, &mut missing);
        }
        WorkflowStage::Condition => {
            require("opening_report", &draft.opening_report, &mut missing);
        }
        WorkflowStage::Driver => {
            require_text("driver_name", &draft.driver_name, &mut missing);
            require_text("license_number", &draft.license_number, &mut missing);
            require("license_issue_date", &draft.license_issue_date, &mut missing);
            require("birth_date", &draft.birth_date, &mut missing);
            require_text("birth_place", &draft.birth_place, &mut missing);
            // La cara frontal del permiso es obligatoria, la trasera no
            require_text("license_front_url", &draft.license_front_url, &mut missing);
        }
        WorkflowStage::Insurance => {
            require_text("insurer_name", &draft.insurer_name, &mut missing);
            require_text("policy_number", &draft.policy_number, &mut missing);
        }
        WorkflowStage::Signatures => {
            require_text("client_signature_url", &draft.client_signature_url, &mut missing);
            require_text("dealer_signature_url", &draft.dealer_signature_url, &mut missing);
        }
        WorkflowStage::Commit => {
            // La confirmación exige las etapas 1-5; las firmas pueden faltar
            // (préstamo pendiente de firma)
            for stage in [
                WorkflowStage::Selection,
                WorkflowStage::Terms,
                WorkflowStage::Condition,
                WorkflowStage::Driver,
                WorkflowStage::Insurance,
            ] {
                missing.extend(missing_fields(draft, stage));
            }
        }
    }

    missing
}

pub fn stage_complete(draft: &LoanDraft, stage: WorkflowStage) -> bool {
    missing_fields(draft, stage).is_empty()
}

/// ¿Puede el caller avanzar hasta `target`? Solo si todas las etapas
/// anteriores están completas. Retroceder a una etapa ya visitada siempre
/// está permitido, eso no pasa por aquí.
pub fn can_advance(draft: &LoanDraft, target: WorkflowStage) -> bool {
    WorkflowStage::ORDERED
        .iter()
        .take_while(|stage| **stage != target)
        .all(|stage| stage_complete(draft, *stage))
}

/// Primera etapa prerequisito incompleta, si la hay.
pub fn first_incomplete(draft: &LoanDraft) -> Option<WorkflowStage> {
    WorkflowStage::PREREQUISITES
        .into_iter()
        .find(|stage| !stage_complete(draft, *stage))
}

/// Estado de una etapa para el informe de validación
#[derive(Debug, Serialize)]
pub struct StageStatus {
    pub stage: WorkflowStage,
    pub complete: bool,
    pub missing_fields: Vec<&'static str>,
}

/// Informe de validación del borrador completo
#[derive(Debug, Serialize)]
pub struct DraftValidationReport {
    pub stages: Vec<StageStatus>,
    pub first_incomplete: Option<WorkflowStage>,
    pub ready_to_commit: bool,
    pub signature_pending: bool,
}

/// Evalúa todas las etapas del borrador de una pasada.
pub fn validate_draft(draft: &LoanDraft) -> DraftValidationReport {
    let stages = WorkflowStage::PREREQUISITES
        .into_iter()
        .map(|stage| {
            let missing = missing_fields(draft, stage);
            StageStatus {
                stage,
                complete: missing.is_empty(),
                missing_fields: missing,
            }
        })
        .collect();

    DraftValidationReport {
        stages,
        first_incomplete: first_incomplete(draft),
        ready_to_commit: stage_complete(draft, WorkflowStage::Commit),
        signature_pending: !stage_complete(draft, WorkflowStage::Signatures),
    }
}

/// Entrada tipada que produce la confirmación: todo lo opcional del borrador
/// resuelto a valores concretos, listo para el motor.
#[derive(Debug, Clone)]
pub struct ValidatedLoanInput {
    pub vehicle_id: Uuid,
    pub client_id: Uuid,
    pub terms: LoanTerms,
    pub driver: DriverIdentity,
    pub insurance: InsuranceInfo,
    pub opening_report: ConditionReport,
    pub client_signature_url: Option<String>,
    pub dealer_signature_url: Option<String>,
    pub notes: Option<String>,
}

impl ValidatedLoanInput {
    pub fn is_fully_signed(&self) -> bool {
        self.client_signature_url.is_some() && self.dealer_signature_url.is_some()
    }
}

/// Revalida el borrador completo como precondición atómica de la etapa 7.
///
/// Devuelve `MissingField` nombrando los campos ausentes, o `Validation` con
/// el campo concreto cuando un valor presente es incoherente (fechas
/// invertidas, conductor menor de edad, permiso con formato inválido).
pub fn validate_for_commit(draft: &LoanDraft) -> AppResult<ValidatedLoanInput> {
    let missing = missing_fields(draft, WorkflowStage::Commit);
    if !missing.is_empty() {
        return Err(AppError::MissingField(missing.join(", ")));
    }

    let opening_input = draft.opening_report.as_ref().unwrap();
    validator::Validate::validate(opening_input)?;

    let start_date = draft.start_date.unwrap();
    let expected_end_date = draft.expected_end_date.unwrap();
    if expected_end_date < start_date {
        return Err(validation_error(
            "expected_end_date",
            "La fecha de devolución prevista no puede ser anterior al inicio",
        ));
    }

    let start_mileage = draft.start_mileage.unwrap();
    if start_mileage < 0 {
        return Err(validation_error(
            "start_mileage",
            "El kilometraje inicial no puede ser negativo",
        ));
    }

    let start_fuel_level = draft
        .start_fuel_level
        .unwrap_or(opening_input.fuel_level);
    if !(0..=100).contains(&start_fuel_level) {
        return Err(validation_error(
            "start_fuel_level",
            "El nivel de combustible debe estar entre 0 y 100",
        ));
    }

    let birth_date = draft.birth_date.unwrap();
    validate_adult_driver(birth_date, start_date).map_err(|_| {
        validation_error(
            "birth_date",
            "El conductor debe tener al menos 18 años en la fecha de inicio",
        )
    })?;

    let license_number = draft.license_number.clone().unwrap();
    validate_license_number(&license_number).map_err(|_| {
        validation_error("license_number", "El número de permiso no tiene un formato válido")
    })?;

    let opening_report = condition_service::capture_opening(opening_input);

    Ok(ValidatedLoanInput {
        vehicle_id: draft.vehicle_id.unwrap(),
        client_id: draft.client_id.unwrap(),
        terms: LoanTerms {
            start_date,
            expected_end_date,
            start_mileage,
            start_fuel_level,
        },
        driver: DriverIdentity {
            name: draft.driver_name.clone().unwrap(),
            license_number,
            license_issue_date: draft.license_issue_date.unwrap(),
            birth_date,
            birth_place: draft.birth_place.clone().unwrap(),
            license_front_url: draft.license_front_url.clone().unwrap(),
            license_back_url: draft.license_back_url.clone(),
        },
        insurance: InsuranceInfo {
            insurer_name: draft.insurer_name.clone().unwrap(),
            policy_number: draft.policy_number.clone().unwrap(),
        },
        opening_report,
        client_signature_url: draft.client_signature_url.clone(),
        dealer_signature_url: draft.dealer_signature_url.clone(),
        notes: draft.notes.clone(),
    })
}

/// Subidas de documentos del borrador: permisos, firmas y fotos.
///
/// Cada subida pasa por la ingesta de imágenes y corre bajo el deadline
/// acotado; las subidas independientes van en paralelo y el fallo de una no
/// cancela las demás.
pub struct DocumentUploader {
    storage: Arc<dyn ObjectStorage>,
    limits: IngestLimits,
    deadline: Duration,
}

impl DocumentUploader {
    pub fn new(storage: Arc<dyn ObjectStorage>) -> Self {
        Self::with_deadline(storage, DEFAULT_UPLOAD_DEADLINE)
    }

    pub fn with_deadline(storage: Arc<dyn ObjectStorage>, deadline: Duration) -> Self {
        Self {
            storage,
            limits: IngestLimits::default(),
            deadline,
        }
    }

    fn destination(kind: DraftDocumentKind) -> (&'static str, &'static str) {
        match kind {
            DraftDocumentKind::LicenseFront => ("licenses", "front"),
            DraftDocumentKind::LicenseBack => ("licenses", "back"),
            DraftDocumentKind::ClientSignature => ("signatures", "client"),
            DraftDocumentKind::DealerSignature => ("signatures", "dealer"),
            DraftDocumentKind::ConditionPhoto => ("conditions", "photos"),
            DraftDocumentKind::VehiclePhoto => ("vehicles", "photos"),
        }
    }

    pub async fn upload_document(
        &self,
        request: &DraftDocumentUploadRequest,
    ) -> AppResult<UploadedDocumentResponse> {
        let bytes = base64::Engine::decode(
            &base64::engine::general_purpose::STANDARD,
            request.data.as_bytes(),
        )
        .map_err(|_| validation_error("data", "El contenido no es base64 válido"))?;

        // Las firmas conservan su formato original (llevan transparencia);
        // el resto de fotos pasa por la normalización completa
        let normalized = match request.kind {
            DraftDocumentKind::ClientSignature | DraftDocumentKind::DealerSignature => {
                check_signature_image(&bytes, &self.limits)?
            }
            _ => normalize_photo(&bytes, &self.limits)?,
        };

        let (domain, subdomain) = Self::destination(request.kind);
        let path = object_path(domain, subdomain, normalized.extension);

        log::info!(
            "📤 Subiendo documento {:?} a {} ({} bytes)",
            request.kind,
            path,
            normalized.bytes.len()
        );

        let content_type = normalized.content_type;
        let url = with_deadline(
            "subida de documento",
            self.deadline,
            self.storage.upload(&path, normalized.bytes, content_type),
        )
        .await?;

        log::info!("✅ Documento {:?} disponible en {}", request.kind, url);

        Ok(UploadedDocumentResponse {
            kind: request.kind,
            url,
            content_type: content_type.to_string(),
        })
    }

    /// Sube varios documentos en paralelo; devuelve un resultado por entrada
    /// en el mismo orden.
    pub async fn upload_documents(
        &self,
        requests: &[DraftDocumentUploadRequest],
    ) -> Vec<AppResult<UploadedDocumentResponse>> {
        let mut futures = Vec::new();
        for request in requests {
            futures.push(self.upload_document(request));
        }
        futures::future::join_all(futures).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::condition_report::{CleanlinessLevel, LightsCondition, TireCondition};
    use crate::storage::memory_storage::MemoryObjectStorage;

    fn opening_input() -> ConditionReportInput {
        ConditionReportInput {
            mileage: 10000,
            fuel_level: 50,
            exterior_state: CleanlinessLevel::Clean,
            interior_state: CleanlinessLevel::Normal,
            tires: TireCondition::Good,
            lights: LightsCondition::Working,
            damages: vec![],
            photos: vec![],
        }
    }

    fn complete_draft() -> LoanDraft {
        LoanDraft {
            vehicle_id: Some(Uuid::new_v4()),
            client_id: Some(Uuid::new_v4()),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
            expected_end_date: NaiveDate::from_ymd_opt(2024, 3, 15),
            start_mileage: Some(10000),
            start_fuel_level: Some(50),
            opening_report: Some(opening_input()),
            driver_name: Some("Marie Lefort".to_string()),
            license_number: Some("13AA00002".to_string()),
            license_issue_date: NaiveDate::from_ymd_opt(2015, 5, 20),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 15),
            birth_place: Some("Lyon".to_string()),
            license_front_url: Some("memory://licenses/front/1.jpg".to_string()),
            license_back_url: None,
            insurer_name: Some("AXA".to_string()),
            policy_number: Some("POL-2024-001".to_string()),
            client_signature_url: Some("memory://signatures/client/1.png".to_string()),
            dealer_signature_url: Some("memory://signatures/dealer/1.png".to_string()),
            notes: None,
        }
    }

    #[test]
    fn test_empty_draft_reports_missing_fields_by_name() {
        let draft = LoanDraft::default();

        let missing = missing_fields(&draft, WorkflowStage::Selection);
        assert_eq!(missing, vec!["vehicle_id", "client_id"]);

        let missing = missing_fields(&draft, WorkflowStage::Driver);
        assert!(missing.contains(&"driver_name"));
        assert!(missing.contains(&"license_front_url"));
    }

    #[test]
    fn test_blank_text_counts_as_missing() {
        let mut draft = complete_draft();
        draft.insurer_name = Some("   ".to_string());
        let missing = missing_fields(&draft, WorkflowStage::Insurance);
        assert_eq!(missing, vec!["insurer_name"]);
    }

    #[test]
    fn test_cannot_advance_past_incomplete_stage() {
        let mut draft = complete_draft();
        draft.opening_report = None;

        assert!(can_advance(&draft, WorkflowStage::Condition));
        assert!(!can_advance(&draft, WorkflowStage::Driver));
        assert_eq!(first_incomplete(&draft), Some(WorkflowStage::Condition));
    }

    #[test]
    fn test_license_back_is_optional() {
        let mut draft = complete_draft();
        draft.license_back_url = None;
        assert!(stage_complete(&draft, WorkflowStage::Driver));
    }

    #[test]
    fn test_commit_allowed_without_signatures() {
        let mut draft = complete_draft();
        draft.client_signature_url = None;
        draft.dealer_signature_url = None;

        let report = validate_draft(&draft);
        assert!(report.ready_to_commit);
        assert!(report.signature_pending);

        let validated = validate_for_commit(&draft).unwrap();
        assert!(!validated.is_fully_signed());
    }

    #[test]
    fn test_commit_names_every_missing_field() {
        let mut draft = complete_draft();
        draft.client_id = None;
        draft.policy_number = None;

        let err = validate_for_commit(&draft).unwrap_err();
        match err {
            AppError::MissingField(fields) => {
                assert!(fields.contains("client_id"));
                assert!(fields.contains("policy_number"));
            }
            other => panic!("se esperaba MissingField, fue {:?}", other),
        }
    }

    #[test]
    fn test_commit_rejects_underage_driver() {
        let mut draft = complete_draft();
        draft.birth_date = NaiveDate::from_ymd_opt(2010, 1, 1);

        let err = validate_for_commit(&draft).unwrap_err();
        match err {
            AppError::Validation(message) => assert!(message.contains("birth_date")),
            other => panic!("se esperaba Validation, fue {:?}", other),
        }
    }

    #[test]
    fn test_commit_rejects_inverted_dates() {
        let mut draft = complete_draft();
        draft.expected_end_date = NaiveDate::from_ymd_opt(2024, 2, 1);

        let err = validate_for_commit(&draft).unwrap_err();
        match err {
            AppError::Validation(message) => assert!(message.contains("expected_end_date")),
            other => panic!("se esperaba Validation, fue {:?}", other),
        }
    }

    #[test]
    fn test_commit_falls_back_to_report_fuel_level() {
        let mut draft = complete_draft();
        draft.start_fuel_level = None;

        let validated = validate_for_commit(&draft).unwrap();
        assert_eq!(validated.terms.start_fuel_level, 50);
    }

    fn png_base64() -> String {
        use image::{ImageBuffer, Rgba};
        let buffer = ImageBuffer::from_pixel(4, 4, Rgba([10u8, 20, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        image::DynamicImage::ImageRgba8(buffer)
            .write_to(&mut bytes, image::ImageFormat::Png)
            .unwrap();
        base64::Engine::encode(&base64::engine::general_purpose::STANDARD, bytes.into_inner())
    }

    #[tokio::test]
    async fn test_upload_document_stores_under_kind_prefix() {
        let storage = Arc::new(MemoryObjectStorage::new());
        let uploader = DocumentUploader::new(storage.clone());

        let request = DraftDocumentUploadRequest {
            kind: DraftDocumentKind::LicenseFront,
            data: png_base64(),
        };
        let uploaded = uploader.upload_document(&request).await.unwrap();

        assert!(uploaded.url.contains("licenses/front/"));
        assert_eq!(storage.len().await, 1);
    }

    #[tokio::test]
    async fn test_signature_upload_keeps_png() {
        let storage = Arc::new(MemoryObjectStorage::new());
        let uploader = DocumentUploader::new(storage);

        let request = DraftDocumentUploadRequest {
            kind: DraftDocumentKind::ClientSignature,
            data: png_base64(),
        };
        let uploaded = uploader.upload_document(&request).await.unwrap();

        assert_eq!(uploaded.content_type, "image/png");
        assert!(uploaded.url.contains("signatures/client/"));
    }

    #[tokio::test]
    async fn test_upload_rejects_invalid_base64() {
        let storage = Arc::new(MemoryObjectStorage::new());
        let uploader = DocumentUploader::new(storage);

        let request = DraftDocumentUploadRequest {
            kind: DraftDocumentKind::ConditionPhoto,
            data: "esto no es base64 !!!".to_string(),
        };
        let err = uploader.upload_document(&request).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_concurrent_uploads_preserve_order_and_independence() {
        let storage = Arc::new(MemoryObjectStorage::new());
        let uploader = DocumentUploader::new(storage.clone());

        let requests = vec![
            DraftDocumentUploadRequest {
                kind: DraftDocumentKind::LicenseFront,
                data: png_base64(),
            },
            DraftDocumentUploadRequest {
                kind: DraftDocumentKind::ConditionPhoto,
                data: "no-base64".to_string(),
            },
            DraftDocumentUploadRequest {
                kind: DraftDocumentKind::LicenseBack,
                data: png_base64(),
            },
        ];

        let results = uploader.upload_documents(&requests).await;

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_err());
        assert!(results[2].is_ok());
        assert_eq!(storage.len().await, 2);
    }
}
