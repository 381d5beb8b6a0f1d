//! Modelo de LoanVehicle
//!
//! Este módulo contiene el vehículo de cortesía de la flota y su máquina de
//! estados de disponibilidad. El estado lo muta el motor de préstamos (al
//! abrir/cerrar) o el toggle explícito de mantenimiento, nunca ambos a la vez.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::Type;
use uuid::Uuid;

use super::condition_report::Damage;
use crate::utils::errors::{validation_error, AppResult};

/// Estado del vehículo de cortesía - mapea al ENUM loan_vehicle_status
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Type, PartialEq, Eq)]
#[sqlx(type_name = "loan_vehicle_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VehicleStatus {
    Available,
    Loaned,
    Maintenance,
    Retired,
}

impl VehicleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VehicleStatus::Available => "available",
            VehicleStatus::Loaned => "loaned",
            VehicleStatus::Maintenance => "maintenance",
            VehicleStatus::Retired => "retired",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "available" => Some(VehicleStatus::Available),
            "loaned" => Some(VehicleStatus::Loaned),
            "maintenance" => Some(VehicleStatus::Maintenance),
            "retired" => Some(VehicleStatus::Retired),
            _ => None,
        }
    }
}

impl std::fmt::Display for VehicleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Vehículo de cortesía de la flota
///
/// Propiedad exclusiva de la cuenta de empresa que lo dio de alta. Las fotos
/// y los daños sueltos (hallazgos de mantenimiento fuera de préstamo) viven
/// como columnas JSONB; el mapeo de fila está en el repositorio.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanVehicle {
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
    pub status: VehicleStatus,
    pub photos: Vec<String>,
    pub damages: Vec<Damage>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl LoanVehicle {
    pub fn is_available(&self) -> bool {
        self.status == VehicleStatus::Available
    }
}

/// Datos de alta de un vehículo de cortesía
#[derive(Debug, Clone)]
pub struct NewLoanVehicle {
    pub make: String,
    pub model: String,
    pub registration_number: String,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub mileage: i32,
    pub fuel_level: i32,
    pub photos: Vec<String>,
    pub damages: Vec<Damage>,
    pub notes: Option<String>,
}

/// Cambios parciales sobre los detalles de un vehículo
///
/// El estado no se toca por aquí: pasa por `set_status` o por el motor.
#[derive(Debug, Clone, Default)]
pub struct LoanVehicleChanges {
    pub make: Option<String>,
    pub model: Option<String>,
    pub registration_number: Option<String>,
    pub chassis_number: Option<String>,
    pub engine_number: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub photos: Option<Vec<String>>,
}

/// Filtros para búsqueda de vehículos
#[derive(Debug, Deserialize, Default)]
pub struct VehicleFilters {
    pub status: Option<String>,
}

impl VehicleFilters {
    /// Traduce el filtro textual a un estado tipado. Un valor desconocido
    /// es un error de la petición, no un filtro vacío.
    pub fn parsed_status(&self) -> AppResult<Option<VehicleStatus>> {
        match self.status.as_deref() {
            None => Ok(None),
            Some(raw) => VehicleStatus::parse(raw).map(Some).ok_or_else(|| {
                validation_error(
                    "status",
                    &format!("Estado de vehículo desconocido: {}", raw),
                )
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in [
            VehicleStatus::Available,
            VehicleStatus::Loaned,
            VehicleStatus::Maintenance,
            VehicleStatus::Retired,
        ] {
            assert_eq!(VehicleStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_rejects_unknown() {
        assert_eq!(VehicleStatus::parse("scrapped"), None);
        assert_eq!(VehicleStatus::parse(""), None);
    }

    #[test]
    fn test_status_serde_uses_lowercase() {
        let json = serde_json::to_string(&VehicleStatus::Maintenance).unwrap();
        assert_eq!(json, "\"maintenance\"");
    }
}
