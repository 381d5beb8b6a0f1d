//! Almacén en memoria para tests y demos
//!
//! Implementa los cuatro repositorios sobre un único RwLock, igual que los
//! cachés en memoria del estado de la aplicación. Tomar el lock de escritura
//! para `transition_status` da el mismo compare-and-swap atómico que el
//! UPDATE condicional de PostgreSQL.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::client::Client;
use crate::models::company::CompanyProfile;
use crate::models::condition_report::Damage;
use crate::models::loan_vehicle::{
    LoanVehicle, LoanVehicleChanges, NewLoanVehicle, VehicleFilters, VehicleStatus,
};
use crate::models::vehicle_loan::{LoanClosure, SignaturePair, VehicleLoan};
use crate::repositories::client_repository::ClientRepository;
use crate::repositories::company_repository::CompanyRepository;
use crate::repositories::loan_repository::LoanRepository;
use crate::repositories::vehicle_repository::VehicleRepository;
use crate::utils::errors::{AppError, AppResult};

#[derive(Default)]
struct Inner {
    vehicles: HashMap<Uuid, LoanVehicle>,
    loans: HashMap<Uuid, VehicleLoan>,
    clients: HashMap<Uuid, Client>,
    companies: HashMap<Uuid, CompanyProfile>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de préstamos almacenados, para aserciones en tests.
    pub async fn loan_count(&self) -> usize {
        self.inner.read().await.loans.len()
    }
}

fn missing_row() -> AppError {
    // Mismo error que produciría fetch_one sobre una fila inexistente
    AppError::Database(sqlx::Error::RowNotFound)
}

#[async_trait]
impl VehicleRepository for MemoryStore {
    async fn create(&self, company_id: Uuid, new_vehicle: NewLoanVehicle) -> AppResult<LoanVehicle> {
        let vehicle = LoanVehicle {
            id: Uuid::new_v4(),
            company_id,
            make: new_vehicle.make,
            model: new_vehicle.model,
            registration_number: new_vehicle.registration_number,
            chassis_number: new_vehicle.chassis_number,
            engine_number: new_vehicle.engine_number,
            color: new_vehicle.color,
            mileage: new_vehicle.mileage,
            fuel_level: new_vehicle.fuel_level,
            status: VehicleStatus::Available,
            photos: new_vehicle.photos,
            damages: new_vehicle.damages,
            notes: new_vehicle.notes,
            created_at: Utc::now(),
        };

        let mut inner = self.inner.write().await;
        inner.vehicles.insert(vehicle.id, vehicle.clone());
        Ok(vehicle)
    }

    async fn find_by_id(&self, vehicle_id: Uuid) -> AppResult<Option<LoanVehicle>> {
        let inner = self.inner.read().await;
        Ok(inner.vehicles.get(&vehicle_id).cloned())
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        filters: &VehicleFilters,
    ) -> AppResult<Vec<LoanVehicle>> {
        let status = filters.parsed_status()?;
        let inner = self.inner.read().await;

        let mut vehicles: Vec<LoanVehicle> = inner
            .vehicles
            .values()
            .filter(|vehicle| vehicle.company_id == company_id)
            .filter(|vehicle| status.map_or(true, |wanted| vehicle.status == wanted))
            .cloned()
            .collect();

        vehicles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(vehicles)
    }

    async fn update_details(
        &self,
        vehicle_id: Uuid,
        changes: LoanVehicleChanges,
    ) -> AppResult<LoanVehicle> {
        let mut inner = self.inner.write().await;
        let vehicle = inner.vehicles.get_mut(&vehicle_id).ok_or_else(missing_row)?;

        if let Some(make) = changes.make {
            vehicle.make = make;
        }
        if let Some(model) = changes.model {
            vehicle.model = model;
        }
        if let Some(registration_number) = changes.registration_number {
            vehicle.registration_number = registration_number;
        }
        if let Some(chassis_number) = changes.chassis_number {
            vehicle.chassis_number = Some(chassis_number);
        }
        if let Some(engine_number) = changes.engine_number {
            vehicle.engine_number = Some(engine_number);
        }
        if let Some(color) = changes.color {
            vehicle.color = Some(color);
        }
        if let Some(photos) = changes.photos {
            vehicle.photos = photos;
        }
        if let Some(notes) = changes.notes {
            vehicle.notes = Some(notes);
        }

        Ok(vehicle.clone())
    }

    async fn set_status(&self, vehicle_id: Uuid, status: VehicleStatus) -> AppResult<LoanVehicle> {
        let mut inner = self.inner.write().await;
        let vehicle = inner.vehicles.get_mut(&vehicle_id).ok_or_else(missing_row)?;
        vehicle.status = status;
        Ok(vehicle.clone())
    }

    async fn transition_status(
        &self,
        vehicle_id: Uuid,
        expected: VehicleStatus,
        next: VehicleStatus,
    ) -> AppResult<bool> {
        // Comprobación y escritura bajo el mismo lock de escritura
        let mut inner = self.inner.write().await;
        let vehicle = inner.vehicles.get_mut(&vehicle_id).ok_or_else(missing_row)?;

        if vehicle.status != expected {
            return Ok(false);
        }

        vehicle.status = next;
        Ok(true)
    }

    async fn set_reading(
        &self,
        vehicle_id: Uuid,
        mileage: i32,
        fuel_level: i32,
    ) -> AppResult<LoanVehicle> {
        let mut inner = self.inner.write().await;
        let vehicle = inner.vehicles.get_mut(&vehicle_id).ok_or_else(missing_row)?;
        vehicle.mileage = mileage;
        vehicle.fuel_level = fuel_level;
        Ok(vehicle.clone())
    }

    async fn append_damage(&self, vehicle_id: Uuid, damage: Damage) -> AppResult<LoanVehicle> {
        let mut inner = self.inner.write().await;
        let vehicle = inner.vehicles.get_mut(&vehicle_id).ok_or_else(missing_row)?;
        vehicle.damages.push(damage);
        Ok(vehicle.clone())
    }

    async fn registration_exists(
        &self,
        company_id: Uuid,
        registration_number: &str,
    ) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner.vehicles.values().any(|vehicle| {
            vehicle.company_id == company_id
                && vehicle
                    .registration_number
                    .eq_ignore_ascii_case(registration_number)
        }))
    }

    async fn delete(&self, vehicle_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.vehicles.remove(&vehicle_id);
        Ok(())
    }
}

#[async_trait]
impl LoanRepository for MemoryStore {
    async fn create(&self, loan: VehicleLoan) -> AppResult<VehicleLoan> {
        let mut inner = self.inner.write().await;
        inner.loans.insert(loan.id, loan.clone());
        Ok(loan)
    }

    async fn find_by_id(&self, loan_id: Uuid) -> AppResult<Option<VehicleLoan>> {
        let inner = self.inner.read().await;
        Ok(inner.loans.get(&loan_id).cloned())
    }

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<VehicleLoan>> {
        let inner = self.inner.read().await;
        let mut loans: Vec<VehicleLoan> = inner
            .loans
            .values()
            .filter(|loan| loan.company_id == company_id)
            .cloned()
            .collect();

        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loans)
    }

    async fn list_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<VehicleLoan>> {
        let inner = self.inner.read().await;
        let mut loans: Vec<VehicleLoan> = inner
            .loans
            .values()
            .filter(|loan| loan.vehicle_id == vehicle_id)
            .cloned()
            .collect();

        loans.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(loans)
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<VehicleLoan>> {
        let inner = self.inner.read().await;
        Ok(inner
            .loans
            .values()
            .filter(|loan| loan.vehicle_id == vehicle_id && loan.is_open())
            .max_by_key(|loan| loan.created_at)
            .cloned())
    }

    async fn close(&self, loan_id: Uuid, closure: LoanClosure) -> AppResult<VehicleLoan> {
        let mut inner = self.inner.write().await;
        let loan = inner.loans.get_mut(&loan_id).ok_or_else(missing_row)?;

        loan.actual_end_date = Some(closure.actual_end_date);
        loan.end_mileage = Some(closure.end_mileage);
        loan.end_fuel_level = Some(closure.end_fuel_level);
        loan.closing_report = Some(closure.closing_report);
        if closure.notes.is_some() {
            loan.notes = closure.notes;
        }

        Ok(loan.clone())
    }

    async fn attach_signatures(
        &self,
        loan_id: Uuid,
        signatures: SignaturePair,
        signed_at: DateTime<Utc>,
    ) -> AppResult<VehicleLoan> {
        let mut inner = self.inner.write().await;
        let loan = inner.loans.get_mut(&loan_id).ok_or_else(missing_row)?;

        loan.client_signature_url = Some(signatures.client_signature_url);
        loan.dealer_signature_url = Some(signatures.dealer_signature_url);
        loan.signed_at = Some(signed_at);
        loan.contract_signed = true;

        Ok(loan.clone())
    }

    async fn set_contract_url(&self, loan_id: Uuid, contract_url: &str) -> AppResult<VehicleLoan> {
        let mut inner = self.inner.write().await;
        let loan = inner.loans.get_mut(&loan_id).ok_or_else(missing_row)?;
        loan.contract_url = Some(contract_url.to_string());
        Ok(loan.clone())
    }

    async fn delete(&self, loan_id: Uuid) -> AppResult<()> {
        let mut inner = self.inner.write().await;
        inner.loans.remove(&loan_id);
        Ok(())
    }
}

#[async_trait]
impl ClientRepository for MemoryStore {
    async fn find_by_id(&self, client_id: Uuid) -> AppResult<Option<Client>> {
        let inner = self.inner.read().await;
        Ok(inner.clients.get(&client_id).cloned())
    }

    async fn create(&self, client: Client) -> AppResult<Client> {
        let mut inner = self.inner.write().await;
        inner.clients.insert(client.id, client.clone());
        Ok(client)
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn find_by_id(&self, company_id: Uuid) -> AppResult<Option<CompanyProfile>> {
        let inner = self.inner.read().await;
        Ok(inner.companies.get(&company_id).cloned())
    }

    async fn create(&self, profile: CompanyProfile) -> AppResult<CompanyProfile> {
        let mut inner = self.inner.write().await;
        inner.companies.insert(profile.id, profile.clone());
        Ok(profile)
    }
}
