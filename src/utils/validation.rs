//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! y conversión de tipos.

use chrono::{DateTime, NaiveDate, Utc};
use regex::Regex;
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationError;

/// Validar y convertir string a UUID
pub fn validate_uuid(value: &str) -> Result<Uuid, ValidationError> {
    Uuid::parse_str(value).map_err(|_| {
        let mut error = ValidationError::new("uuid");
        error.add_param("value".into(), &value.to_string());
        error
    })
}

/// Validar y convertir string a fecha
pub fn validate_date(value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| {
        let mut error = ValidationError::new("date");
        error.add_param("value".into(), &value.to_string());
        error.add_param("format".into(), &"YYYY-MM-DD".to_string());
        error
    })
}

/// Validar y convertir string a datetime
pub fn validate_datetime(value: &str) -> Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| {
            let mut error = ValidationError::new("datetime");
            error.add_param("value".into(), &value.to_string());
            error.add_param("format".into(), &"RFC3339".to_string());
            error
        })
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar longitud mínima y máxima
pub fn validate_length(value: &str, min: usize, max: usize) -> Result<(), ValidationError> {
    let len = value.chars().count();
    if len < min || len > max {
        let mut error = ValidationError::new("length");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &len);
        return Err(error);
    }
    Ok(())
}

/// Validar que un valor esté en un rango específico
pub fn validate_range<T: PartialOrd + std::fmt::Display + serde::Serialize>(
    value: T,
    min: T,
    max: T,
) -> Result<(), ValidationError> {
    if value < min || value > max {
        let mut error = ValidationError::new("range");
        error.add_param("min".into(), &min);
        error.add_param("max".into(), &max);
        error.add_param("actual".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar nivel de combustible (porcentaje entero 0-100)
pub fn validate_fuel_level(value: i32) -> Result<(), ValidationError> {
    validate_range(value, 0, 100).map_err(|_| {
        let mut error = ValidationError::new("fuel_level");
        error.add_param("value".into(), &value);
        error.add_param("range".into(), &"0 to 100".to_string());
        error
    })
}

/// Validar que un valor sea no negativo
pub fn validate_non_negative<T: PartialOrd + std::fmt::Display + num_traits::Zero + Serialize>(
    value: T,
) -> Result<(), ValidationError> {
    if value < T::zero() {
        let mut error = ValidationError::new("non_negative");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar formato de matrícula de vehículo
///
/// Acepta formatos europeos habituales (AB-123-CD, 1234-ABC, etc.)
pub fn validate_registration_number(value: &str) -> Result<(), ValidationError> {
    let plate_regex = Regex::new(r"(?i)^[A-Z0-9]{1,4}([ -]?[A-Z0-9]{1,4}){0,2}$").unwrap();
    let clean_plate = value.trim();
    if clean_plate.len() < 5 || clean_plate.len() > 12 || !plate_regex.is_match(clean_plate) {
        let mut error = ValidationError::new("registration_number");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

/// Validar formato de número de permiso de conducir
pub fn validate_license_number(value: &str) -> Result<(), ValidationError> {
    let clean = value.chars().filter(|c| c.is_alphanumeric()).count();
    if clean < 5 || clean > 20 {
        let mut error = ValidationError::new("license_number");
        error.add_param("value".into(), &value.to_string());
        error.add_param("length".into(), &"5-20 alphanumeric characters".to_string());
        return Err(error);
    }
    Ok(())
}

/// Calcular edad en años cumplidos a una fecha de referencia
pub fn age_at(birth_date: NaiveDate, reference: NaiveDate) -> i32 {
    let mut age = reference.years_since(birth_date).unwrap_or(0) as i32;
    if birth_date > reference {
        age = -1;
    }
    age
}

/// Validar que el conductor sea mayor de edad en la fecha de inicio
pub fn validate_adult_driver(
    birth_date: NaiveDate,
    start_date: NaiveDate,
) -> Result<(), ValidationError> {
    if age_at(birth_date, start_date) < 18 {
        let mut error = ValidationError::new("driver_birth_date");
        error.add_param("value".into(), &birth_date.to_string());
        error.add_param("reason".into(), &"driver must be at least 18".to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_uuid() {
        let valid_uuid = "550e8400-e29b-41d4-a716-446655440000";
        assert!(validate_uuid(valid_uuid).is_ok());

        let invalid_uuid = "invalid-uuid";
        assert!(validate_uuid(invalid_uuid).is_err());
    }

    #[test]
    fn test_validate_date() {
        let valid_date = "2024-01-15";
        assert!(validate_date(valid_date).is_ok());

        let invalid_date = "2024/01/15";
        assert!(validate_date(invalid_date).is_err());
    }

    #[test]
    fn test_validate_length() {
        let value = "test";
        assert!(validate_length(value, 1, 10).is_ok());
        assert!(validate_length(value, 5, 10).is_err());
        assert!(validate_length(value, 1, 3).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range(5, 1, 10).is_ok());
        assert!(validate_range(0, 1, 10).is_err());
        assert!(validate_range(15, 1, 10).is_err());
    }

    #[test]
    fn test_validate_fuel_level() {
        assert!(validate_fuel_level(0).is_ok());
        assert!(validate_fuel_level(50).is_ok());
        assert!(validate_fuel_level(100).is_ok());
        assert!(validate_fuel_level(-1).is_err());
        assert!(validate_fuel_level(101).is_err());
    }

    #[test]
    fn test_validate_non_negative() {
        assert!(validate_non_negative(0).is_ok());
        assert!(validate_non_negative(350).is_ok());
        assert!(validate_non_negative(-5).is_err());
    }

    #[test]
    fn test_validate_registration_number() {
        assert!(validate_registration_number("AB-123-CD").is_ok());
        assert!(validate_registration_number("1234 ABC").is_ok());
        assert!(validate_registration_number("A").is_err());
        assert!(validate_registration_number("AB_123_CD!!!!!").is_err());
    }

    #[test]
    fn test_validate_license_number() {
        assert!(validate_license_number("13AA00002").is_ok());
        assert!(validate_license_number("123").is_err());
        assert!(validate_license_number(&"A".repeat(25)).is_err());
    }

    #[test]
    fn test_age_at() {
        let birth = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2024, 6, 14).unwrap()), 33);
        assert_eq!(age_at(birth, NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()), 34);
    }

    #[test]
    fn test_validate_adult_driver() {
        let adult = NaiveDate::from_ymd_opt(1990, 6, 15).unwrap();
        let minor = NaiveDate::from_ymd_opt(2010, 6, 15).unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(validate_adult_driver(adult, start).is_ok());
        assert!(validate_adult_driver(minor, start).is_err());
    }
}
