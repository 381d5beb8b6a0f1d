//! Modelo de VehicleLoan
//!
//! Este módulo contiene el agregado de préstamo: referencia un vehículo y un
//! cliente, acumula fechas, identidad del conductor, seguro, firmas y los dos
//! informes de estado que enmarcan el préstamo. Un préstamo cerrado es
//! inmutable salvo por el artefacto de contrato que puede adjuntarse después.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::condition_report::ConditionReport;

/// Identidad del conductor y referencias a su permiso
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverIdentity {
    pub name: String,
    pub license_number: String,
    pub license_issue_date: NaiveDate,
    pub birth_date: NaiveDate,
    pub birth_place: String,
    pub license_front_url: String,
    pub license_back_url: Option<String>,
}

/// Términos del préstamo fijados en la etapa 2 del workflow
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoanTerms {
    pub start_date: NaiveDate,
    pub expected_end_date: NaiveDate,
    pub start_mileage: i32,
    pub start_fuel_level: i32,
}

/// Datos del seguro del préstamo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InsuranceInfo {
    pub insurer_name: String,
    pub policy_number: String,
}

/// Par de firmas (cliente y taller) como referencias a artefactos
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignaturePair {
    pub client_signature_url: String,
    pub dealer_signature_url: String,
}

/// Agregado de préstamo de vehículo de cortesía
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VehicleLoan {
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
    pub driver: DriverIdentity,
    pub insurer_name: String,
    pub policy_number: String,
    pub client_signature_url: Option<String>,
    pub dealer_signature_url: Option<String>,
    pub signed_at: Option<DateTime<Utc>>,
    pub contract_signed: bool,
    pub contract_url: Option<String>,
    pub opening_report: ConditionReport,
    pub closing_report: Option<ConditionReport>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Datos de cierre que el motor escribe de una sola vez sobre el préstamo
#[derive(Debug, Clone)]
pub struct LoanClosure {
    pub actual_end_date: DateTime<Utc>,
    pub end_mileage: i32,
    pub end_fuel_level: i32,
    pub closing_report: ConditionReport,
    pub notes: Option<String>,
}

impl VehicleLoan {
    /// Un préstamo está abierto mientras no tenga fecha de fin efectiva
    pub fn is_open(&self) -> bool {
        self.actual_end_date.is_none()
    }

    /// Ambas firmas presentes
    pub fn is_fully_signed(&self) -> bool {
        self.client_signature_url.is_some() && self.dealer_signature_url.is_some()
    }

    /// Distancia recorrida, disponible solo tras el cierre
    pub fn distance_driven(&self) -> Option<i32> {
        self.end_mileage.map(|end| end - self.start_mileage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::condition_report::{
        CleanlinessLevel, ConditionReport, LightsCondition, TireCondition,
    };

    fn report(mileage: i32, fuel: i32) -> ConditionReport {
        ConditionReport {
            mileage,
            fuel_level: fuel,
            exterior_state: CleanlinessLevel::Clean,
            interior_state: CleanlinessLevel::Clean,
            tires: TireCondition::Good,
            lights: LightsCondition::Working,
            damages: vec![],
            photos: vec![],
            captured_at: Utc::now(),
        }
    }

    fn sample_loan() -> VehicleLoan {
        VehicleLoan {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            vehicle_id: Uuid::new_v4(),
            client_id: Uuid::new_v4(),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
            expected_end_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            actual_end_date: None,
            start_mileage: 10000,
            end_mileage: None,
            start_fuel_level: 50,
            end_fuel_level: None,
            driver: DriverIdentity {
                name: "Marie Lefort".to_string(),
                license_number: "13AA00002".to_string(),
                license_issue_date: NaiveDate::from_ymd_opt(2015, 5, 20).unwrap(),
                birth_date: NaiveDate::from_ymd_opt(1990, 6, 15).unwrap(),
                birth_place: "Lyon".to_string(),
                license_front_url: "memory://licenses/front.jpg".to_string(),
                license_back_url: None,
            },
            insurer_name: "AXA".to_string(),
            policy_number: "POL-123".to_string(),
            client_signature_url: None,
            dealer_signature_url: None,
            signed_at: None,
            contract_signed: false,
            contract_url: None,
            opening_report: report(10000, 50),
            closing_report: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_loan_open_until_actual_end_set() {
        let mut loan = sample_loan();
        assert!(loan.is_open());
        loan.actual_end_date = Some(Utc::now());
        assert!(!loan.is_open());
    }

    #[test]
    fn test_fully_signed_requires_both() {
        let mut loan = sample_loan();
        assert!(!loan.is_fully_signed());
        loan.client_signature_url = Some("memory://signatures/c.png".to_string());
        assert!(!loan.is_fully_signed());
        loan.dealer_signature_url = Some("memory://signatures/d.png".to_string());
        assert!(loan.is_fully_signed());
    }

    #[test]
    fn test_distance_driven_only_after_close() {
        let mut loan = sample_loan();
        assert_eq!(loan.distance_driven(), None);
        loan.end_mileage = Some(10350);
        assert_eq!(loan.distance_driven(), Some(350));
    }
}
