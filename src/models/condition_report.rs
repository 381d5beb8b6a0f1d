//! Modelo de ConditionReport
//!
//! Este módulo contiene el snapshot inmutable del estado físico de un
//! vehículo (kilometraje, combustible, limpieza, daños localizados y fotos)
//! y el merge de daños entre el informe de apertura y el de cierre.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Zona del vehículo donde se localiza un daño
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DamagePart {
    // Carrocería
    Hood,
    Roof,
    Trunk,
    FrontBumper,
    RearBumper,
    FrontLeftWing,
    FrontRightWing,
    RearLeftWing,
    RearRightWing,
    FrontLeftDoor,
    FrontRightDoor,
    RearLeftDoor,
    RearRightDoor,
    Windshield,
    RearWindow,
    LeftMirror,
    RightMirror,
    Wheels,
    // Interior
    Seats,
    Dashboard,
    Carpet,
    Headliner,
    SteeringWheel,
}

/// Tipo de daño observado
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Scratch,
    Dent,
    Broken,
    Stain,
    Missing,
}

/// Severidad del daño
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DamageSeverity {
    Minor,
    Moderate,
    Major,
}

/// Daño localizado en un vehículo
///
/// `preexisting` distingue los daños arrastrados del informe de apertura de
/// los observados durante la inspección actual. La lista es append-only: un
/// daño de apertura nunca se elimina, el "borrado" es un filtro de lectura.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Damage {
    pub part: DamagePart,
    #[serde(rename = "type")]
    pub kind: DamageType,
    pub severity: DamageSeverity,
    pub note: Option<String>,
    #[serde(default)]
    pub preexisting: bool,
}

/// Estado de limpieza exterior/interior
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum CleanlinessLevel {
    Clean,
    Normal,
    Dirty,
}

/// Estado de los neumáticos
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TireCondition {
    New,
    Good,
    Worn,
    Damaged,
}

/// Estado de las luces
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LightsCondition {
    Working,
    Defective,
}

/// Foto asociada a un informe de estado
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReportPhoto {
    pub url: String,
    pub position: String,
    pub description: Option<String>,
}

/// Snapshot inmutable del estado físico de un vehículo
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConditionReport {
    pub mileage: i32,
    pub fuel_level: i32,
    pub exterior_state: CleanlinessLevel,
    pub interior_state: CleanlinessLevel,
    pub tires: TireCondition,
    pub lights: LightsCondition,
    pub damages: Vec<Damage>,
    pub photos: Vec<ReportPhoto>,
    pub captured_at: DateTime<Utc>,
}

impl ConditionReport {
    /// Daños arrastrados del informe de apertura
    pub fn preexisting_damages(&self) -> Vec<&Damage> {
        self.damages.iter().filter(|d| d.preexisting).collect()
    }

    /// Daños observados en la inspección actual
    pub fn new_damages(&self) -> Vec<&Damage> {
        self.damages.iter().filter(|d| !d.preexisting).collect()
    }
}

/// Fusionar los daños de apertura con las observaciones nuevas.
///
/// Todos los daños de apertura se copian primero marcados `preexisting`,
/// después se anexan las observaciones nuevas sin marcar. El orden es
/// apertura-luego-nuevos; los grupos se distinguen por el flag, nunca por
/// posición. Ningún daño de apertura se descarta.
pub fn merge_damages(opening: &[Damage], new_observations: Vec<Damage>) -> Vec<Damage> {
    let mut merged = Vec::with_capacity(opening.len() + new_observations.len());
    for damage in opening {
        let mut carried = damage.clone();
        carried.preexisting = true;
        merged.push(carried);
    }
    for mut observed in new_observations {
        observed.preexisting = false;
        merged.push(observed);
    }
    merged
}
