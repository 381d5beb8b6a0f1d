use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::dto::loan_dto::{
    AttachSignaturesRequest, CloseLoanRequest, DraftDocumentUploadRequest, LoanResponse,
    UploadedDocumentResponse,
};
use crate::dto::ApiResponse;
use crate::models::loan_vehicle::VehicleStatus;
use crate::models::vehicle_loan::{LoanClosure, SignaturePair, VehicleLoan};
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::loan_repository::LoanRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::services::condition_service;
use crate::services::contract_service::ContractAssembler;
use crate::services::loan_workflow::{
    self, DocumentUploader, DraftValidationReport, LoanDraft,
};
use crate::storage::{object_path, ObjectStorage};
use crate::utils::deadline::with_deadline;
use crate::utils::errors::{validation_error, AppError};

/// Motor de préstamos: el agregado raíz del ciclo de vida.
///
/// Abre y cierra préstamos manteniendo las invariantes cruzadas con el
/// vehículo (un préstamo abierto como máximo, `loaned` si y solo si existe
/// ese préstamo) y dispara el ensamblado del contrato cuando ambas firmas
/// están presentes. Un fallo del contrato nunca deshace el préstamo.
pub struct LoanController {
    loans: Arc<dyn LoanRepository>,
    vehicles: Arc<dyn VehicleRepository>,
    clients: Arc<dyn ClientRepository>,
    companies: Arc<dyn CompanyRepository>,
    storage: Arc<dyn ObjectStorage>,
    assembler: ContractAssembler,
    uploader: DocumentUploader,
    upload_deadline: Duration,
}

impl LoanController {
    pub fn new(
        loans: Arc<dyn LoanRepository>,
        vehicles: Arc<dyn VehicleRepository>,
        clients: Arc<dyn ClientRepository>,
        companies: Arc<dyn CompanyRepository>,
        storage: Arc<dyn ObjectStorage>,
        upload_deadline: Duration,
    ) -> Self {
        Self {
            loans,
            vehicles,
            clients,
            companies,
            assembler: ContractAssembler::new(storage.clone()),
            uploader: DocumentUploader::with_deadline(storage.clone(), upload_deadline),
            storage,
            upload_deadline,
        }
    }

    async fn owned_loan(&self, loan_id: Uuid, company_id: Uuid) -> Result<VehicleLoan, AppError> {
        let loan = self
            .loans
            .find_by_id(loan_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Préstamo no encontrado".to_string()))?;

        if loan.company_id != company_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para acceder a este préstamo".to_string(),
            ));
        }

        Ok(loan)
    }

    /// Confirmación del workflow (etapa 7): valida el borrador completo y
    /// abre el préstamo.
    ///
    /// La disponibilidad del vehículo se toma con un compare-and-swap: dos
    /// aperturas concurrentes sobre el mismo vehículo no pueden ganar las
    /// dos. Si el alta del préstamo falla después de tomar el vehículo, el
    /// vehículo vuelve a `available`.
    pub async fn open_loan(
        &self,
        company_id: Uuid,
        draft: LoanDraft,
    ) -> Result<ApiResponse<LoanResponse>, AppError> {
        let input = loan_workflow::validate_for_commit(&draft)?;

        let vehicle = self
            .vehicles
            .find_by_id(input.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;
        if vehicle.company_id != company_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para acceder a este vehículo".to_string(),
            ));
        }

        let client = self
            .clients
            .find_by_id(input.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente no encontrado".to_string()))?;
        if client.company_id != company_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para acceder a este cliente".to_string(),
            ));
        }

        let seized = self
            .vehicles
            .transition_status(input.vehicle_id, VehicleStatus::Available, VehicleStatus::Loaned)
            .await?;
        if !seized {
            return Err(AppError::Conflict(format!(
                "El vehículo no está disponible para préstamo (estado actual: {})",
                vehicle.status
            )));
        }

        let now = Utc::now();
        let fully_signed = input.is_fully_signed();
        let loan = VehicleLoan {
            id: Uuid::new_v4(),
            company_id,
            vehicle_id: input.vehicle_id,
            client_id: input.client_id,
            start_date: input.terms.start_date,
            expected_end_date: input.terms.expected_end_date,
            actual_end_date: None,
            start_mileage: input.terms.start_mileage,
            end_mileage: None,
            start_fuel_level: input.terms.start_fuel_level,
            end_fuel_level: None,
            driver: input.driver,
            insurer_name: input.insurance.insurer_name,
            policy_number: input.insurance.policy_number,
            client_signature_url: input.client_signature_url,
            dealer_signature_url: input.dealer_signature_url,
            signed_at: fully_signed.then_some(now),
            contract_signed: fully_signed,
            contract_url: None,
            opening_report: input.opening_report,
            closing_report: None,
            notes: input.notes,
            created_at: now,
        };

        let created = match self.loans.create(loan).await {
            Ok(created) => created,
            Err(e) => {
                // Devolver el vehículo a disponible si el alta falla
                if let Err(rollback) = self
                    .vehicles
                    .transition_status(input.vehicle_id, VehicleStatus::Loaned, VehicleStatus::Available)
                    .await
                {
                    log::error!(
                        "❌ No se pudo liberar el vehículo {} tras un alta fallida: {}",
                        input.vehicle_id,
                        rollback
                    );
                }
                return Err(e);
            }
        };

        log::info!(
            "🔑 Préstamo {} abierto sobre el vehículo {} para el cliente {}",
            created.id,
            created.vehicle_id,
            created.client_id
        );

        if fully_signed {
            // Un fallo del ensamblador no deshace el préstamo: queda sin
            // contrato y se comunica para reintentar
            match self.generate_and_store_contract(&created).await {
                Ok(with_contract) => Ok(ApiResponse::success_with_message(
                    with_contract.into(),
                    "Préstamo creado y contrato generado exitosamente".to_string(),
                )),
                Err(e) => {
                    log::warn!(
                        "⚠️ El contrato del préstamo {} no se pudo generar: {}",
                        created.id,
                        e
                    );
                    Ok(ApiResponse::success_with_message(
                        created.into(),
                        format!(
                            "Préstamo creado, pero la generación del contrato falló ({}). Puede reintentarse regenerando el contrato",
                            e
                        ),
                    ))
                }
            }
        } else {
            Ok(ApiResponse::success_with_message(
                created.into(),
                "Préstamo creado pendiente de firma; el contrato se generará al adjuntar ambas firmas"
                    .to_string(),
            ))
        }
    }

    /// Cierre del préstamo: informe de cierre, lecturas finales y vuelta del
    /// vehículo a `available`.
    pub async fn close_loan(
        &self,
        loan_id: Uuid,
        company_id: Uuid,
        request: CloseLoanRequest,
    ) -> Result<ApiResponse<LoanResponse>, AppError> {
        request.validate()?;

        let loan = self.owned_loan(loan_id, company_id).await?;
        if !loan.is_open() {
            return Err(AppError::Conflict("El préstamo ya está cerrado".to_string()));
        }

        if request.end_mileage < loan.start_mileage {
            return Err(validation_error(
                "end_mileage",
                &format!(
                    "El kilometraje final ({}) no puede ser menor que el inicial ({})",
                    request.end_mileage, loan.start_mileage
                ),
            ));
        }

        let closing_report = condition_service::capture_closing(&loan.opening_report, &request);
        let closure = LoanClosure {
            actual_end_date: Utc::now(),
            end_mileage: request.end_mileage,
            end_fuel_level: request.end_fuel_level,
            closing_report,
            notes: request.notes.clone(),
        };

        let closed = self.loans.close(loan_id, closure).await?;

        // El vehículo hereda las lecturas finales y vuelve a la flota
        self.vehicles
            .set_reading(loan.vehicle_id, request.end_mileage, request.end_fuel_level)
            .await?;
        let restored = self
            .vehicles
            .transition_status(loan.vehicle_id, VehicleStatus::Loaned, VehicleStatus::Available)
            .await?;
        if !restored {
            log::warn!(
                "⚠️ El vehículo {} no estaba en 'loaned' al cerrar el préstamo {}",
                loan.vehicle_id,
                loan_id
            );
        }

        let distance = closed.distance_driven().unwrap_or(0);
        log::info!(
            "🏁 Préstamo {} cerrado; distancia recorrida {} km",
            loan_id,
            distance
        );

        Ok(ApiResponse::success_with_message(
            closed.into(),
            format!("Préstamo cerrado; distancia recorrida: {} km", distance),
        ))
    }

    /// Completar un préstamo pendiente de firma. Vuelve a disparar el
    /// ensamblador y sobreescribe la URL de contrato anterior si la había.
    pub async fn attach_signatures(
        &self,
        loan_id: Uuid,
        company_id: Uuid,
        request: AttachSignaturesRequest,
    ) -> Result<ApiResponse<LoanResponse>, AppError> {
        request.validate()?;

        self.owned_loan(loan_id, company_id).await?;

        let signatures = SignaturePair {
            client_signature_url: request.client_signature_url,
            dealer_signature_url: request.dealer_signature_url,
        };
        let updated = self
            .loans
            .attach_signatures(loan_id, signatures, Utc::now())
            .await?;

        log::info!("✍️ Firmas adjuntadas al préstamo {}", loan_id);

        match self.generate_and_store_contract(&updated).await {
            Ok(with_contract) => Ok(ApiResponse::success_with_message(
                with_contract.into(),
                "Firmas adjuntadas y contrato generado exitosamente".to_string(),
            )),
            Err(e) => {
                log::warn!(
                    "⚠️ El contrato del préstamo {} no se pudo generar tras adjuntar firmas: {}",
                    loan_id,
                    e
                );
                Ok(ApiResponse::success_with_message(
                    updated.into(),
                    format!(
                        "Firmas adjuntadas, pero la generación del contrato falló ({}). Puede reintentarse regenerando el contrato",
                        e
                    ),
                ))
            }
        }
    }

    /// Reintento explícito de la generación del contrato. A diferencia del
    /// disparo automático, aquí el error sí se propaga al caller.
    pub async fn regenerate_contract(
        &self,
        loan_id: Uuid,
        company_id: Uuid,
    ) -> Result<ApiResponse<LoanResponse>, AppError> {
        let loan = self.owned_loan(loan_id, company_id).await?;

        if !loan.is_fully_signed() {
            return Err(AppError::Precondition(
                "No se puede generar el contrato: faltan firmas".to_string(),
            ));
        }

        let updated = self.generate_and_store_contract(&loan).await?;
        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Contrato regenerado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        loan_id: Uuid,
        company_id: Uuid,
    ) -> Result<LoanResponse, AppError> {
        let loan = self.owned_loan(loan_id, company_id).await?;
        Ok(loan.into())
    }

    pub async fn list_by_company(&self, company_id: Uuid) -> Result<Vec<LoanResponse>, AppError> {
        let loans = self.loans.list_by_company(company_id).await?;
        Ok(loans.into_iter().map(LoanResponse::from).collect())
    }

    /// Historial de préstamos de un vehículo concreto.
    pub async fn list_by_vehicle(
        &self,
        vehicle_id: Uuid,
        company_id: Uuid,
    ) -> Result<Vec<LoanResponse>, AppError> {
        let vehicle = self
            .vehicles
            .find_by_id(vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;
        if vehicle.company_id != company_id {
            return Err(AppError::Forbidden(
                "No tienes permiso para acceder a este vehículo".to_string(),
            ));
        }

        let loans = self.loans.list_by_vehicle(vehicle_id).await?;
        Ok(loans.into_iter().map(LoanResponse::from).collect())
    }

    pub async fn delete(&self, loan_id: Uuid, company_id: Uuid) -> Result<(), AppError> {
        let loan = self.owned_loan(loan_id, company_id).await?;

        if loan.is_open() {
            return Err(AppError::Conflict(
                "No se puede eliminar un préstamo abierto; ciérralo primero".to_string(),
            ));
        }

        self.loans.delete(loan_id).await?;
        log::info!("🗑️ Préstamo {} eliminado", loan_id);
        Ok(())
    }

    /// Validación headless del borrador del workflow, etapa por etapa.
    pub fn validate_draft(&self, draft: &LoanDraft) -> DraftValidationReport {
        loan_workflow::validate_draft(draft)
    }

    /// Subida de un documento del borrador (permiso, firma o foto).
    pub async fn upload_draft_document(
        &self,
        request: DraftDocumentUploadRequest,
    ) -> Result<ApiResponse<UploadedDocumentResponse>, AppError> {
        request.validate()?;
        let uploaded = self.uploader.upload_document(&request).await?;
        Ok(ApiResponse::success(uploaded))
    }

    /// Renderiza, sube y adjunta el contrato de un préstamo firmado.
    async fn generate_and_store_contract(
        &self,
        loan: &VehicleLoan,
    ) -> Result<VehicleLoan, AppError> {
        let vehicle = self
            .vehicles
            .find_by_id(loan.vehicle_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Vehículo no encontrado".to_string()))?;
        let client = self
            .clients
            .find_by_id(loan.client_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente no encontrado".to_string()))?;
        let company = self
            .companies
            .find_by_id(loan.company_id)
            .await?
            .ok_or_else(|| {
                AppError::Internal("Perfil de empresa no disponible para el contrato".to_string())
            })?;

        let artifact = self
            .assembler
            .assemble(loan, &vehicle, &client, &company)
            .await?;

        let path = object_path("contracts", "loan", "html");
        let url = with_deadline(
            "subida del contrato",
            self.upload_deadline,
            self.storage
                .upload(&path, artifact.bytes, artifact.content_type),
        )
        .await?;

        let updated = self.loans.set_contract_url(loan.id, &url).await?;
        log::info!("📄 Contrato del préstamo {} disponible en {}", loan.id, url);
        Ok(updated)
    }
}
