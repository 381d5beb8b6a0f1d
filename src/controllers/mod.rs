//! Controladores del sistema
//!
//! Este módulo contiene la lógica de negocio de cada recurso: el registro
//! de vehículos de cortesía y el motor de préstamos.

pub mod loan_controller;
pub mod vehicle_controller;

pub use loan_controller::LoanController;
pub use vehicle_controller::VehicleController;
