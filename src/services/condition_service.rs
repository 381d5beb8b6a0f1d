//! Servicio de informes de estado
//!
//! Captura los dos snapshots que enmarcan un préstamo. La apertura registra
//! el estado tal como lo ve el agente en la entrega; el cierre se construye
//! sembrando todos los daños de apertura (marcados preexistentes) y anexando
//! las observaciones nuevas. Este servicio no impone la invariante de
//! kilometraje monótono: eso es responsabilidad del motor en la frontera del
//! agregado, aquí no se sabe cuál es "el informe de apertura de este préstamo".

use chrono::Utc;

use crate::dto::condition_dto::ConditionReportInput;
use crate::dto::loan_dto::CloseLoanRequest;
use crate::models::condition_report::{merge_damages, ConditionReport};

/// Construye el informe de apertura a partir de la captura del agente.
pub fn capture_opening(input: &ConditionReportInput) -> ConditionReport {
    ConditionReport {
        mileage: input.mileage,
        fuel_level: input.fuel_level,
        exterior_state: input.exterior_state,
        interior_state: input.interior_state,
        tires: input.tires,
        lights: input.lights,
        damages: input.damages_as_model(),
        photos: input.photos_as_model(),
        captured_at: Utc::now(),
    }
}

/// Construye el informe de cierre fusionando los daños de apertura con las
/// observaciones nuevas. Las lecturas finales vienen del caller tal cual.
pub fn capture_closing(opening: &ConditionReport, request: &CloseLoanRequest) -> ConditionReport {
    let new_observations = request
        .damages
        .iter()
        .cloned()
        .map(crate::models::condition_report::Damage::from)
        .collect();

    ConditionReport {
        mileage: request.end_mileage,
        fuel_level: request.end_fuel_level,
        exterior_state: request.exterior_state,
        interior_state: request.interior_state,
        tires: request.tires,
        lights: request.lights,
        damages: merge_damages(&opening.damages, new_observations),
        photos: request
            .photos
            .iter()
            .cloned()
            .map(crate::models::condition_report::ReportPhoto::from)
            .collect(),
        captured_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::condition_dto::DamageInput;
    use crate::models::condition_report::{
        CleanlinessLevel, DamagePart, DamageSeverity, DamageType, LightsCondition, TireCondition,
    };

    fn opening_input() -> ConditionReportInput {
        ConditionReportInput {
            mileage: 10000,
            fuel_level: 50,
            exterior_state: CleanlinessLevel::Clean,
            interior_state: CleanlinessLevel::Normal,
            tires: TireCondition::Good,
            lights: LightsCondition::Working,
            damages: vec![DamageInput {
                part: DamagePart::Hood,
                kind: DamageType::Dent,
                severity: DamageSeverity::Minor,
                note: None,
                preexisting: false,
            }],
            photos: vec![],
        }
    }

    fn close_request(damages: Vec<DamageInput>) -> CloseLoanRequest {
        CloseLoanRequest {
            end_mileage: 10350,
            end_fuel_level: 40,
            exterior_state: CleanlinessLevel::Dirty,
            interior_state: CleanlinessLevel::Normal,
            tires: TireCondition::Good,
            lights: LightsCondition::Working,
            damages,
            photos: vec![],
            notes: None,
        }
    }

    #[test]
    fn test_capture_opening_records_snapshot_as_given() {
        let report = capture_opening(&opening_input());
        assert_eq!(report.mileage, 10000);
        assert_eq!(report.fuel_level, 50);
        assert_eq!(report.damages.len(), 1);
        assert_eq!(report.damages[0].part, DamagePart::Hood);
    }

    #[test]
    fn test_capture_closing_merges_opening_then_new() {
        let opening = capture_opening(&opening_input());
        let request = close_request(vec![DamageInput {
            part: DamagePart::FrontLeftDoor,
            kind: DamageType::Scratch,
            severity: DamageSeverity::Moderate,
            note: Some("rayón largo".to_string()),
            preexisting: false,
        }]);

        let closing = capture_closing(&opening, &request);

        assert_eq!(closing.mileage, 10350);
        assert_eq!(closing.fuel_level, 40);
        assert_eq!(closing.damages.len(), 2);
        assert_eq!(closing.damages[0].part, DamagePart::Hood);
        assert!(closing.damages[0].preexisting);
        assert_eq!(closing.damages[1].part, DamagePart::FrontLeftDoor);
        assert!(!closing.damages[1].preexisting);
    }

    #[test]
    fn test_capture_closing_keeps_opening_damages_without_new_ones() {
        let opening = capture_opening(&opening_input());
        let closing = capture_closing(&opening, &close_request(vec![]));

        assert_eq!(closing.damages.len(), 1);
        assert!(closing.damages[0].preexisting);
    }
}
