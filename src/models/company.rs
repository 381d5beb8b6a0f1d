//! Modelo de Company
//!
//! Este módulo contiene el perfil de la empresa (el taller de carrocería):
//! la identidad legal que encabeza el contrato de préstamo. El registro de
//! cuentas y la suscripción viven en el backend externo.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Company principal - mapea exactamente a la tabla companies
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct CompanyProfile {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub siret: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}
