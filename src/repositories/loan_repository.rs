//! Repositorio de préstamos de vehículos - acceso a datos PostgreSQL
//!
//! El agregado de préstamo guarda al conductor y los dos informes de estado
//! como columnas JSONB; el resto de campos son columnas planas para poder
//! filtrar por vehículo, cliente y fecha sin deserializar el documento.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::condition_report::ConditionReport;
use crate::models::vehicle_loan::{DriverIdentity, LoanClosure, SignaturePair, VehicleLoan};
use crate::utils::errors::AppResult;

/// Operaciones de persistencia para los préstamos de cortesía.
#[async_trait]
pub trait LoanRepository: Send + Sync {
    /// Inserta el agregado tal cual lo preparó el motor (id incluido).
    async fn create(&self, loan: VehicleLoan) -> AppResult<VehicleLoan>;

    async fn find_by_id(&self, loan_id: Uuid) -> AppResult<Option<VehicleLoan>>;

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<VehicleLoan>>;

    async fn list_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<VehicleLoan>>;

    /// Préstamo abierto (sin fecha de fin efectiva) sobre un vehículo, si existe.
    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<VehicleLoan>>;

    /// Escribe el cierre completo de una sola vez: fecha efectiva, lecturas
    /// finales e informe de cierre.
    async fn close(&self, loan_id: Uuid, closure: LoanClosure) -> AppResult<VehicleLoan>;

    /// Adjunta las dos firmas y marca el contrato como firmado.
    async fn attach_signatures(
        &self,
        loan_id: Uuid,
        signatures: SignaturePair,
        signed_at: DateTime<Utc>,
    ) -> AppResult<VehicleLoan>;

    async fn set_contract_url(&self, loan_id: Uuid, contract_url: &str) -> AppResult<VehicleLoan>;

    async fn delete(&self, loan_id: Uuid) -> AppResult<()>;
}

/// Fila cruda de `vehicle_loans`.
#[derive(sqlx::FromRow)]
struct LoanRow {
    id: Uuid,
    company_id: Uuid,
    vehicle_id: Uuid,
    client_id: Uuid,
    start_date: NaiveDate,
    expected_end_date: NaiveDate,
    actual_end_date: Option<DateTime<Utc>>,
    start_mileage: i32,
    end_mileage: Option<i32>,
    start_fuel_level: i32,
    end_fuel_level: Option<i32>,
    driver: Json<DriverIdentity>,
    insurer_name: String,
    policy_number: String,
    client_signature_url: Option<String>,
    dealer_signature_url: Option<String>,
    signed_at: Option<DateTime<Utc>>,
    contract_signed: bool,
    contract_url: Option<String>,
    opening_report: Json<ConditionReport>,
    closing_report: Option<Json<ConditionReport>>,
    notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<LoanRow> for VehicleLoan {
    fn from(row: LoanRow) -> Self {
        VehicleLoan {
            id: row.id,
            company_id: row.company_id,
            vehicle_id: row.vehicle_id,
            client_id: row.client_id,
            start_date: row.start_date,
            expected_end_date: row.expected_end_date,
            actual_end_date: row.actual_end_date,
            start_mileage: row.start_mileage,
            end_mileage: row.end_mileage,
            start_fuel_level: row.start_fuel_level,
            end_fuel_level: row.end_fuel_level,
            driver: row.driver.0,
            insurer_name: row.insurer_name,
            policy_number: row.policy_number,
            client_signature_url: row.client_signature_url,
            dealer_signature_url: row.dealer_signature_url,
            signed_at: row.signed_at,
            contract_signed: row.contract_signed,
            contract_url: row.contract_url,
            opening_report: row.opening_report.0,
            closing_report: row.closing_report.map(|report| report.0),
            notes: row.notes,
            created_at: row.created_at,
        }
    }
}

const LOAN_COLUMNS: &str = r#"
    id, company_id, vehicle_id, client_id, start_date, expected_end_date,
    actual_end_date, start_mileage, end_mileage, start_fuel_level,
    end_fuel_level, driver, insurer_name, policy_number,
    client_signature_url, dealer_signature_url, signed_at, contract_signed,
    contract_url, opening_report, closing_report, notes, created_at
"#;

pub struct PgLoanRepository {
    pool: PgPool,
}

impl PgLoanRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LoanRepository for PgLoanRepository {
    async fn create(&self, loan: VehicleLoan) -> AppResult<VehicleLoan> {
        let query = format!(
            r#"
            INSERT INTO vehicle_loans (
                id, company_id, vehicle_id, client_id, start_date, expected_end_date,
                actual_end_date, start_mileage, end_mileage, start_fuel_level,
                end_fuel_level, driver, insurer_name, policy_number,
                client_signature_url, dealer_signature_url, signed_at, contract_signed,
                contract_url, opening_report, closing_report, notes, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14,
                    $15, $16, $17, $18, $19, $20, $21, $22, $23)
            RETURNING {LOAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan.id)
            .bind(loan.company_id)
            .bind(loan.vehicle_id)
            .bind(loan.client_id)
            .bind(loan.start_date)
            .bind(loan.expected_end_date)
            .bind(loan.actual_end_date)
            .bind(loan.start_mileage)
            .bind(loan.end_mileage)
            .bind(loan.start_fuel_level)
            .bind(loan.end_fuel_level)
            .bind(Json(&loan.driver))
            .bind(&loan.insurer_name)
            .bind(&loan.policy_number)
            .bind(&loan.client_signature_url)
            .bind(&loan.dealer_signature_url)
            .bind(loan.signed_at)
            .bind(loan.contract_signed)
            .bind(&loan.contract_url)
            .bind(Json(&loan.opening_report))
            .bind(loan.closing_report.as_ref().map(Json))
            .bind(&loan.notes)
            .bind(loan.created_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn find_by_id(&self, loan_id: Uuid) -> AppResult<Option<VehicleLoan>> {
        let query = format!("SELECT {LOAN_COLUMNS} FROM vehicle_loans WHERE id = $1");

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(VehicleLoan::from))
    }

    async fn list_by_company(&self, company_id: Uuid) -> AppResult<Vec<VehicleLoan>> {
        let query = format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM vehicle_loans
            WHERE company_id = $1
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, LoanRow>(&query)
            .bind(company_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(VehicleLoan::from).collect())
    }

    async fn list_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Vec<VehicleLoan>> {
        let query = format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM vehicle_loans
            WHERE vehicle_id = $1
            ORDER BY created_at DESC
            "#
        );

        let rows = sqlx::query_as::<_, LoanRow>(&query)
            .bind(vehicle_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(VehicleLoan::from).collect())
    }

    async fn find_open_by_vehicle(&self, vehicle_id: Uuid) -> AppResult<Option<VehicleLoan>> {
        let query = format!(
            r#"
            SELECT {LOAN_COLUMNS} FROM vehicle_loans
            WHERE vehicle_id = $1 AND actual_end_date IS NULL
            ORDER BY created_at DESC
            LIMIT 1
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(vehicle_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(VehicleLoan::from))
    }

    async fn close(&self, loan_id: Uuid, closure: LoanClosure) -> AppResult<VehicleLoan> {
        let query = format!(
            r#"
            UPDATE vehicle_loans SET
                actual_end_date = $2,
                end_mileage = $3,
                end_fuel_level = $4,
                closing_report = $5,
                notes = COALESCE($6, notes)
            WHERE id = $1
            RETURNING {LOAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan_id)
            .bind(closure.actual_end_date)
            .bind(closure.end_mileage)
            .bind(closure.end_fuel_level)
            .bind(Json(&closure.closing_report))
            .bind(&closure.notes)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn attach_signatures(
        &self,
        loan_id: Uuid,
        signatures: SignaturePair,
        signed_at: DateTime<Utc>,
    ) -> AppResult<VehicleLoan> {
        let query = format!(
            r#"
            UPDATE vehicle_loans SET
                client_signature_url = $2,
                dealer_signature_url = $3,
                signed_at = $4,
                contract_signed = TRUE
            WHERE id = $1
            RETURNING {LOAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan_id)
            .bind(&signatures.client_signature_url)
            .bind(&signatures.dealer_signature_url)
            .bind(signed_at)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn set_contract_url(&self, loan_id: Uuid, contract_url: &str) -> AppResult<VehicleLoan> {
        let query = format!(
            r#"
            UPDATE vehicle_loans SET contract_url = $2
            WHERE id = $1
            RETURNING {LOAN_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, LoanRow>(&query)
            .bind(loan_id)
            .bind(contract_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn delete(&self, loan_id: Uuid) -> AppResult<()> {
        sqlx::query("DELETE FROM vehicle_loans WHERE id = $1")
            .bind(loan_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
