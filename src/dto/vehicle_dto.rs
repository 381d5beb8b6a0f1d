use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::dto::condition_dto::DamageInput;
use crate::models::condition_report::Damage;
use crate::models::loan_vehicle::{LoanVehicle, LoanVehicleChanges, NewLoanVehicle};

// Request para dar de alta un vehículo de cortesía
#[derive(Debug, Deserialize, Validate)]
pub struct CreateVehicleRequest {
    #[validate(length(min = 1, max = 80, message = "La marca es obligatoria"))]
    pub make: String,
    #[validate(length(min = 1, max = 80, message = "El modelo es obligatorio"))]
    pub model: String,
    #[validate(custom = "crate::utils::validation::validate_registration_number")]
    pub registration_number: String,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    #[validate(range(min = 0, message = "El kilometraje no puede ser negativo"))]
    pub mileage: i32,
    #[validate(range(min = 0, max = 100, message = "El nivel de combustible debe estar entre 0 y 100"))]
    pub fuel_level: i32,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub damages: Vec<DamageInput>,
    pub notes: Option<String>,
}

impl From<CreateVehicleRequest> for NewLoanVehicle {
    fn from(request: CreateVehicleRequest) -> Self {
        NewLoanVehicle {
            make: request.make,
            model: request.model,
            registration_number: request.registration_number,
            chassis_number: request.chassis_number,
            engine_number: request.engine_number,
            color: request.color,
            mileage: request.mileage,
            fuel_level: request.fuel_level,
            photos: request.photos,
            damages: request.damages.into_iter().map(Damage::from).collect(),
            notes: request.notes,
        }
    }
}

// Request para actualizar los detalles de un vehículo
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateVehicleRequest {
    #[validate(length(min = 1, max = 80))]
    pub make: Option<String>,
    #[validate(length(min = 1, max = 80))]
    pub model: Option<String>,
    #[validate(custom = "crate::utils::validation::validate_registration_number")]
    pub registration_number: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub photos: Option<Vec<String>>,
    pub notes: Option<String>,
}

impl From<UpdateVehicleRequest> for LoanVehicleChanges {
    fn from(request: UpdateVehicleRequest) -> Self {
        LoanVehicleChanges {
            make: request.make,
            model: request.model,
            registration_number: request.registration_number,
            chassis_number: request.chassis_number,
            engine_number: request.engine_number,
            color: request.color,
            photos: request.photos,
            notes: request.notes,
        }
    }
}

// Request para cambiar el estado de disponibilidad
#[derive(Debug, Deserialize)]
pub struct UpdateVehicleStatusRequest {
    pub status: String,
}

// Response de vehículo
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    pub id: Uuid,
    pub company_id: Uuid,
    pub make: String,
    pub model: String,
    pub registration_number: String,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub mileage: i32,
    pub fuel_level: i32,
    pub status: String,
    pub photos: Vec<String>,
    pub damages: Vec<Damage>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LoanVehicle> for VehicleResponse {
    fn from(vehicle: LoanVehicle) -> Self {
        VehicleResponse {
            id: vehicle.id,
            company_id: vehicle.company_id,
            make: vehicle.make,
            model: vehicle.model,
            registration_number: vehicle.registration_number,
            chassis_number: vehicle.chassis_number,
            engine_number: vehicle.engine_number,
            color: vehicle.color,
            mileage: vehicle.mileage,
            fuel_level: vehicle.fuel_level,
            status: vehicle.status.as_str().to_string(),
            photos: vehicle.photos,
            damages: vehicle.damages,
            notes: vehicle.notes,
            created_at: vehicle.created_at,
        }
    }
}
