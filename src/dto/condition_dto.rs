use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::condition_report::{
    CleanlinessLevel, ConditionReport, Damage, DamagePart, DamageSeverity, DamageType,
    LightsCondition, ReportPhoto, TireCondition,
};

// Daño observado durante una inspección
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageInput {
    pub part: DamagePart,
    #[serde(rename = "type")]
    pub kind: DamageType,
    pub severity: DamageSeverity,
    pub note: Option<String>,
    #[serde(default)]
    pub preexisting: bool,
}

impl From<DamageInput> for Damage {
    fn from(input: DamageInput) -> Self {
        Damage {
            part: input.part,
            kind: input.kind,
            severity: input.severity,
            note: input.note,
            preexisting: input.preexisting,
        }
    }
}

// Foto ya subida al almacén, referenciada por URL
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReportPhotoInput {
    #[validate(length(min = 1, message = "La URL de la foto no puede estar vacía"))]
    pub url: String,
    #[validate(length(min = 1, message = "La posición de la foto es obligatoria"))]
    pub position: String,
    pub description: Option<String>,
}

impl From<ReportPhotoInput> for ReportPhoto {
    fn from(input: ReportPhotoInput) -> Self {
        ReportPhoto {
            url: input.url,
            position: input.position,
            description: input.description,
        }
    }
}

// Captura de un informe de estado (apertura o cierre)
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConditionReportInput {
    #[validate(range(min = 0, message = "El kilometraje no puede ser negativo"))]
    pub mileage: i32,
    #[validate(range(min = 0, max = 100, message = "El nivel de combustible debe estar entre 0 y 100"))]
    pub fuel_level: i32,
    pub exterior_state: CleanlinessLevel,
    pub interior_state: CleanlinessLevel,
    pub tires: TireCondition,
    pub lights: LightsCondition,
    #[serde(default)]
    pub damages: Vec<DamageInput>,
    #[serde(default)]
    #[validate]
    pub photos: Vec<ReportPhotoInput>,
}

impl ConditionReportInput {
    pub fn damages_as_model(&self) -> Vec<Damage> {
        self.damages.iter().cloned().map(Damage::from).collect()
    }

    pub fn photos_as_model(&self) -> Vec<ReportPhoto> {
        self.photos.iter().cloned().map(ReportPhoto::from).collect()
    }
}

// Response de informe de estado con los daños separados por origen
#[derive(Debug, serde::Serialize)]
pub struct ConditionReportResponse {
    pub mileage: i32,
    pub fuel_level: i32,
    pub exterior_state: CleanlinessLevel,
    pub interior_state: CleanlinessLevel,
    pub tires: TireCondition,
    pub lights: LightsCondition,
    pub damages: Vec<Damage>,
    pub preexisting_count: usize,
    pub new_count: usize,
    pub photos: Vec<ReportPhoto>,
    pub captured_at: chrono::DateTime<chrono::Utc>,
}

impl From<ConditionReport> for ConditionReportResponse {
    fn from(report: ConditionReport) -> Self {
        let preexisting_count = report.preexisting_damages().len();
        let new_count = report.new_damages().len();
        ConditionReportResponse {
            mileage: report.mileage,
            fuel_level: report.fuel_level,
            exterior_state: report.exterior_state,
            interior_state: report.interior_state,
            tires: report.tires,
            lights: report.lights,
            damages: report.damages,
            preexisting_count,
            new_count,
            photos: report.photos,
            captured_at: report.captured_at,
        }
    }
}
