//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación,
//! deadlines de I/O e ingesta de imágenes.

pub mod deadline;
pub mod errors;
pub mod images;
pub mod jwt;
pub mod validation;
