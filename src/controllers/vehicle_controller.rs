use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::dto::condition_dto::DamageInput;
use crate::dto::vehicle_dto::{
    CreateVehicleRequest, UpdateVehicleRequest, UpdateVehicleStatusRequest, VehicleResponse,
};
use crate::dto::ApiResponse;
use crate::models::condition_report::Damage;
use crate::models::loan_vehicle::{LoanVehicle, VehicleFilters, VehicleStatus};
use crate::repositories::loan_repository::LoanRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::AppError;

/// Registro de la flota de cortesía.
///
/// El estado `loaned` lo pone y lo quita el motor de préstamos; por aquí solo
/// pasan los cambios administrativos (mantenimiento, retirada) y el CRUD de
/// detalles. Todas las operaciones están acotadas a la empresa propietaria.
pub struct VehicleController {
    vehicles: Arc<dyn VehicleRepository>,
    loans: Arc<dyn LoanRepository>,
}

impl VehicleController {
    pub fn new(vehicles: Arc<dyn VehicleRepository>, loans: Arc<dyn LoanRepository>) -> Self {
        Self { vehicles, loans }
    }

    /// Cargar un vehículo comprobando que pertenece a la empresa del caller.
    async fn owned_vehicle(&self, vehicle_id: Uuid, company_id: Uuid) -> Result<LoanVehicle, AppError> {
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

        Ok(vehicle)
    }

    pub async fn create(
        &self,
        company_id: Uuid,
        request: CreateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;

        // Verificar que la matrícula no exista para esta empresa
        if self
            .vehicles
            .registration_exists(company_id, &request.registration_number)
            .await?
        {
            return Err(AppError::Conflict(
                "La matrícula ya está registrada para esta empresa".to_string(),
            ));
        }

        let vehicle = self.vehicles.create(company_id, request.into()).await?;
        log::info!(
            "🚗 Vehículo de cortesía {} dado de alta ({})",
            vehicle.id,
            vehicle.registration_number
        );

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo de cortesía creado exitosamente".to_string(),
        ))
    }

    pub async fn get_by_id(
        &self,
        vehicle_id: Uuid,
        company_id: Uuid,
    ) -> Result<VehicleResponse, AppError> {
        let vehicle = self.owned_vehicle(vehicle_id, company_id).await?;
        Ok(vehicle.into())
    }

    pub async fn list_by_company(
        &self,
        company_id: Uuid,
        filters: VehicleFilters,
    ) -> Result<Vec<VehicleResponse>, AppError> {
        let vehicles = self.vehicles.list_by_company(company_id, &filters).await?;
        Ok(vehicles.into_iter().map(VehicleResponse::from).collect())
    }

    /// Vehículos listos para prestar.
    pub async fn list_available(&self, company_id: Uuid) -> Result<Vec<VehicleResponse>, AppError> {
        let filters = VehicleFilters {
            status: Some(VehicleStatus::Available.as_str().to_string()),
        };
        self.list_by_company(company_id, filters).await
    }

    pub async fn update_details(
        &self,
        vehicle_id: Uuid,
        company_id: Uuid,
        request: UpdateVehicleRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        request.validate()?;
        let current = self.owned_vehicle(vehicle_id, company_id).await?;

        if let Some(registration) = request.registration_number.as_deref() {
            // Cambiar la matrícula exige que la nueva no choque con otro vehículo
            if !current.registration_number.eq_ignore_ascii_case(registration)
                && self.vehicles.registration_exists(company_id, registration).await?
            {
                return Err(AppError::Conflict(
                    "La matrícula ya está registrada para esta empresa".to_string(),
                ));
            }
        }

        let vehicle = self.vehicles.update_details(vehicle_id, request.into()).await?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Vehículo actualizado exitosamente".to_string(),
        ))
    }

    /// Cambio administrativo de estado: `available`, `maintenance` o
    /// `retired`. El estado `loaned` queda reservado al motor de préstamos.
    pub async fn set_status(
        &self,
        vehicle_id: Uuid,
        company_id: Uuid,
        request: UpdateVehicleStatusRequest,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        let target = VehicleStatus::parse(&request.status).ok_or_else(|| {
            AppError::Validation(format!("status: estado desconocido '{}'", request.status))
        })?;

        if target == VehicleStatus::Loaned {
            return Err(AppError::Validation(
                "status: el estado 'loaned' lo gestiona el motor de préstamos".to_string(),
            ));
        }

        let vehicle = self.owned_vehicle(vehicle_id, company_id).await?;

        // Idempotente: fijar el estado actual no hace nada
        if vehicle.status == target {
            return Ok(ApiResponse::success(vehicle.into()));
        }

        if vehicle.status == VehicleStatus::Retired {
            return Err(AppError::Conflict(
                "Un vehículo retirado no puede volver a la flota".to_string(),
            ));
        }

        if vehicle.status == VehicleStatus::Loaned {
            return Err(AppError::Conflict(
                "El vehículo tiene un préstamo abierto; ciérralo antes de cambiar su estado"
                    .to_string(),
            ));
        }

        if target == VehicleStatus::Retired
            && self.loans.find_open_by_vehicle(vehicle_id).await?.is_some()
        {
            return Err(AppError::Conflict(
                "No se puede retirar un vehículo con un préstamo abierto".to_string(),
            ));
        }

        let updated = self.vehicles.set_status(vehicle_id, target).await?;
        log::info!(
            "🔧 Vehículo {} pasa de {} a {}",
            vehicle_id,
            vehicle.status,
            target
        );

        Ok(ApiResponse::success_with_message(
            updated.into(),
            "Estado del vehículo actualizado".to_string(),
        ))
    }

    /// Registrar un daño encontrado fuera de un préstamo (mantenimiento).
    pub async fn record_damage(
        &self,
        vehicle_id: Uuid,
        company_id: Uuid,
        request: DamageInput,
    ) -> Result<ApiResponse<VehicleResponse>, AppError> {
        self.owned_vehicle(vehicle_id, company_id).await?;

        let vehicle = self
            .vehicles
            .append_damage(vehicle_id, Damage::from(request))
            .await?;

        Ok(ApiResponse::success_with_message(
            vehicle.into(),
            "Daño registrado en el historial del vehículo".to_string(),
        ))
    }

    pub async fn delete(&self, vehicle_id: Uuid, company_id: Uuid) -> Result<(), AppError> {
        self.owned_vehicle(vehicle_id, company_id).await?;

        // Nunca se borra un vehículo con un préstamo abierto
        if self.loans.find_open_by_vehicle(vehicle_id).await?.is_some() {
            return Err(AppError::Conflict(
                "El vehículo tiene un préstamo abierto y no puede eliminarse".to_string(),
            ));
        }

        self.vehicles.delete(vehicle_id).await?;
        log::info!("🗑️ Vehículo {} eliminado de la flota", vehicle_id);
        Ok(())
    }
}
