//! Shared application state
//!
//! Este módulo define el estado compartido de la aplicación que se pasa
//! a través del router de Axum. Los repositorios y el storage se exponen
//! como trait objects para poder inyectar las implementaciones en memoria
//! en los tests.

use std::sync::Arc;
use std::time::Duration;

use sqlx::PgPool;

use crate::config::environment::EnvironmentConfig;
use crate::controllers::{LoanController, VehicleController};
use crate::repositories::{
    ClientRepository, CompanyRepository, LoanRepository, MemoryStore, PgClientRepository,
    PgCompanyRepository, PgLoanRepository, PgVehicleRepository, VehicleRepository,
};
use crate::storage::{HttpObjectStorage, MemoryObjectStorage, ObjectStorage};
use crate::utils::errors::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub vehicles: Arc<dyn VehicleRepository>,
    pub loans: Arc<dyn LoanRepository>,
    pub clients: Arc<dyn ClientRepository>,
    pub companies: Arc<dyn CompanyRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub config: EnvironmentConfig,
}

impl AppState {
    /// Estado de producción: repositorios sobre PostgreSQL y storage HTTP
    pub fn postgres(pool: PgPool, config: EnvironmentConfig) -> AppResult<Self> {
        let storage = HttpObjectStorage::new(
            config.storage_url.clone(),
            config.storage_public_url.clone(),
            config.storage_token.clone(),
        )?;

        Ok(Self {
            vehicles: Arc::new(PgVehicleRepository::new(pool.clone())),
            loans: Arc::new(PgLoanRepository::new(pool.clone())),
            clients: Arc::new(PgClientRepository::new(pool.clone())),
            companies: Arc::new(PgCompanyRepository::new(pool)),
            storage: Arc::new(storage),
            config,
        })
    }

    /// Estado en memoria para tests y demos, sin PostgreSQL ni red
    pub fn in_memory(config: EnvironmentConfig) -> Self {
        let store = Arc::new(MemoryStore::new());

        Self {
            vehicles: store.clone(),
            loans: store.clone(),
            clients: store.clone(),
            companies: store,
            storage: Arc::new(MemoryObjectStorage::new()),
            config,
        }
    }

    /// Deadline configurado para subidas a storage
    pub fn upload_deadline(&self) -> Duration {
        Duration::from_secs(self.config.upload_timeout_secs)
    }

    /// Construir el controlador del registro de vehículos
    pub fn vehicle_controller(&self) -> VehicleController {
        VehicleController::new(self.vehicles.clone(), self.loans.clone())
    }

    /// Construir el controlador del motor de préstamos
    pub fn loan_controller(&self) -> LoanController {
        LoanController::new(
            self.loans.clone(),
            self.vehicles.clone(),
            self.clients.clone(),
            self.companies.clone(),
            self.storage.clone(),
            self.upload_deadline(),
        )
    }
}
