//! Módulo de base de datos
//!
//! Maneja la conexión y el pool de PostgreSQL

pub mod connection;

pub use connection::create_pool;
