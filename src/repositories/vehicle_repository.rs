//! Repositorio de vehículos de cortesía - acceso a datos PostgreSQL

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::condition_report::Damage;
use crate::models::loan_vehicle::{
    LoanVehicle, LoanVehicleChanges, NewLoanVehicle, VehicleFilters, VehicleStatus,
};
use crate::utils::errors::AppResult;

/// Operaciones de persistencia para la flota de préstamo.
///
/// Las implementaciones concretas (PostgreSQL en producción, memoria en
/// tests) deben respetar la misma semántica: `transition_status` es un
/// compare-and-swap atómico y las listas vienen ordenadas por fecha de
/// creación descendente.
#[async_trait]
pub trait VehicleRepository: Send + Sync {
    async fn create(&self, company_id: Uuid, new_vehicle: NewLoanVehicle) -> AppResult<LoanVehicle>;

    async fn find_by_id(&self, vehicle_id: Uuid) -> AppResult<Option<LoanVehicle>>;

    async fn list_by_company(
        &self,
        company_id: Uuid,
        filters: &VehicleFilters,
    ) -> AppResult<Vec<LoanVehicle>>;

    async fn update_details(
        &self,
        vehicle_id: Uuid,
        changes: LoanVehicleChanges,
    ) -> AppResult<LoanVehicle>;

    /// Escritura directa del estado, sin precondición. Reservada a los
    /// flujos administrativos; el motor de préstamos usa `transition_status`.
    async fn set_status(&self, vehicle_id: Uuid, status: VehicleStatus) -> AppResult<LoanVehicle>;

    /// Compare-and-swap: pasa el vehículo de `expected` a `next` en una sola
    /// operación atómica. Devuelve `false` si el estado ya no era `expected`,
    /// en cuyo caso no se escribe nada.
    async fn transition_status(
        &self,
        vehicle_id: Uuid,
        expected: VehicleStatus,
        next: VehicleStatus,
    ) -> AppResult<bool>;

    /// Actualiza kilometraje y nivel de combustible al cierre de un préstamo.
    async fn set_reading(
        &self,
        vehicle_id: Uuid,
        mileage: i32,
        fuel_level: i32,
    ) -> AppResult<LoanVehicle>;

    /// Añade un daño al historial permanente del vehículo.
    async fn append_damage(&self, vehicle_id: Uuid, damage: Damage) -> AppResult<LoanVehicle>;

    async fn registration_exists(
        &self,
        company_id: Uuid,
        registration_number: &str,
    ) -> AppResult<bool>;

    async fn delete(&self, vehicle_id: Uuid) -> AppResult<()>;
}

/// Fila cruda de `loan_vehicles`. Las fotos y los daños viven como JSONB.
#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    company_id: Uuid,
    make: String,
    model: String,
    registration_number: String,
    chassis_number: Option<String>,
    engine_number: Option<String>,
    color: Option<String>,
    mileage: i32,
    fuel_level: i32,
    status: VehicleStatus,
    photos: Json<Vec<String>>,
    damages: Json<Vec<Damage>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<VehicleRow> for LoanVehicle {
    fn from(row: VehicleRow) -> Self {
        LoanVehicle {
            id: row.id,
            company_id: row.company_id,
            make: row.make,
            model: row.model,
            registration_number: row.registration_number,
            chassis_number: row.chassis_number,
            engine_number: row.engine_number,
            color: row.color,
            mileage: row.mileage,
            fuel_level: row.fuel_level,
            status: row.status,
            photos: row.photos.0,
            damages: row.damages.0,
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const VEHICLE_COLUMNS: &str = r#"
    id, company_id, make, model, registration_number, chassis_number,
    engine_number, color, mileage, fuel_level, status, photos, damages,
    notes, created_at
"#;

pub struct PgVehicleRepository {
    pool: PgPool,
}

impl PgVehicleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl VehicleRepository for PgVehicleRepository {
    async fn create(&self, company_id: Uuid, new_vehicle: NewLoanVehicle) -> AppResult<LoanVehicle> {
        let query = format!(
            r#"
            INSERT INTO loan_vehicles (
                id, company_id, make, model, registration_number, chassis_number,
                engine_number, color, mileage, fuel_level, status, photos, damages,
                notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(Uuid::new_v4())
            .bind(company_id)
            .bind(&new_vehicle.make)
            .bind(&new_vehicle.model)
            .bind(&new_vehicle.registration_number)
            .bind(&new_vehicle.chassis_number)
            .bind(&new_vehicle.engine_number)
            .bind(&new_vehicle.color)
            .bind(new_vehicle.mileage)
            .bind(new_vehicle.fuel_level)
            .bind(VehicleStatus::Available)
            .bind(Json(&new_vehicle.photos))
            .bind(Json(&new_vehicle.damages))
            .bind(&new_vehicle.notes)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, vehicle_id: Uuid) -> AppResult<Option<LoanVehicle>> {
        let query = format!("SELECT {VEHICLE_COLUMNS} FROM loan_vehicles WHERE id = $1");

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(LoanVehicle::from))
    }

    async fn list_by_company(
        &self,
        company_id: Uuid,
        filters: &VehicleFilters,
    ) -> AppResult<Vec<LoanVehicle>> {
        let rows = match filters.parsed_status()? {
            Some(status) => {
                let query = format!(
                    r#"
                    SELECT {VEHICLE_COLUMNS} FROM loan_vehicles
                    WHERE company_id = $1 AND status = $2
                    ORDER BY created_at DESC
                    "#
                );
                sqlx::query_as::<_, VehicleRow>(&query)
                    .bind(company_id)
                    .bind(status)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                let query = format!(
                    r#"
                    SELECT {VEHICLE_COLUMNS} FROM loan_vehicles
                    WHERE company_id = $1
                    ORDER BY created_at DESC
                    "#
                );
                sqlx::query_as::<_, VehicleRow>(&query)
                    .bind(company_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows.into_iter().map(LoanVehicle::from).collect())
    }

    async fn update_details(
        &self,
        vehicle_id: Uuid,
        changes: LoanVehicleChanges,
    ) -> AppResult<LoanVehicle> {
        // COALESCE conserva el valor actual cuando el campo no viene en la
        // petición; photos y notes sí admiten reemplazo completo.
        let query = format!(
            r#"
            UPDATE loan_vehicles SET
                make = COALESCE($2, make),
                model = COALESCE($3, model),
                registration_number = COALESCE($4, registration_number),
                chassis_number = COALESCE($5, chassis_number),
                engine_number = COALESCE($6, engine_number),
                color = COALESCE($7, color),
                photos = COALESCE($8, photos),
                notes = COALESCE($9, notes)
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(vehicle_id)
            .bind(&changes.make)
            .bind(&changes.model)
            .bind(&changes.registration_number)
            .bind(&changes.chassis_number)
            .bind(&changes.engine_number)
            .bind(&changes.color)
            .bind(changes.photos.as_ref().map(Json))
            .bind(&changes.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn set_status(&self, vehicle_id: Uuid, status: VehicleStatus) -> AppResult<LoanVehicle> {
        let query = format!(
            "UPDATE loan_vehicles SET status = $2 WHERE id = $1 RETURNING {VEHICLE_COLUMNS}"
        );

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(vehicle_id)
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn transition_status(
        &self,
        vehicle_id: Uuid,
        expected: VehicleStatus,
        next: VehicleStatus,
    ) -> AppResult<bool> {
        // La condición sobre el estado actual hace que dos aperturas
        // concurrentes sobre el mismo vehículo no puedan ganar las dos.
        let result = sqlx::query("UPDATE loan_vehicles SET status = $3 WHERE id = $1 AND status = $2")
            .bind(vehicle_id)
            .bind(expected)
            .bind(next)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn set_reading(
        &self,
        vehicle_id: Uuid,
        mileage: i32,
        fuel_level: i32,
    ) -> AppResult<LoanVehicle> {
        let query = format!(
            r#"
            UPDATE loan_vehicles SET mileage = $2, fuel_level = $3
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(vehicle_id)
            .bind(mileage)
            .bind(fuel_level)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn append_damage(&self, vehicle_id: Uuid, damage: Damage) -> AppResult<LoanVehicle> {
        let query = format!(
            r#"
            UPDATE loan_vehicles SET damages = damages || $2::jsonb
            WHERE id = $1
            RETURNING {VEHICLE_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, VehicleRow>(&query)
            .bind(vehicle_id)
            .bind(Json(vec![damage]))
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn registration_exists(
        &self,
        company_id: Uuid,
        registration_number: &str,
    ) -> AppResult<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM loan_vehicles
            WHERE company_id = $1 AND UPPER(registration_number) = UPPER($2)
            "#,
        )
        .bind(company_id)
        .bind(registration_number)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }

    async fn delete(&self, vehicle_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM loan_vehicles WHERE id = $1")
            .bind(vehicle_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
