//! Modelos del sistema
//!
//! Este módulo contiene todos los modelos de datos del núcleo de préstamos.
//! Los structs planos mapean directamente al schema PostgreSQL; los agregados
//! con colecciones anidadas se mapean en sus repositorios vía JSONB.

pub mod client;
pub mod company;
pub mod condition_report;
pub mod loan_vehicle;
pub mod vehicle_loan;
