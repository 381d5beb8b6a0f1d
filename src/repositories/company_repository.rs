//! Repositorio de perfiles de empresa - acceso a datos PostgreSQL
//!
//! El perfil alimenta el encabezado del contrato (prestamista). Solo lectura
//! desde el motor; el alta existe para arranque y tests.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::company::CompanyProfile;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn find_by_id(&self, company_id: Uuid) -> AppResult<Option<CompanyProfile>>;

    async fn create(&self, profile: CompanyProfile) -> AppResult<CompanyProfile>;
}

pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn find_by_id(&self, company_id: Uuid) -> AppResult<Option<CompanyProfile>> {
        let profile = sqlx::query_as::<_, CompanyProfile>(
            r#"
            SELECT id, name, address, siret, phone, email, logo_url, created_at
            FROM companies
            WHERE id = $1
            "#,
        )
        .bind(company_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(profile)
    }

    async fn create(&self, profile: CompanyProfile) -> AppResult<CompanyProfile> {
        let created = sqlx::query_as::<_, CompanyProfile>(
            r#"
            INSERT INTO companies (id, name, address, siret, phone, email, logo_url, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, name, address, siret, phone, email, logo_url, created_at
            "#,
        )
        .bind(profile.id)
        .bind(&profile.name)
        .bind(&profile.address)
        .bind(&profile.siret)
        .bind(&profile.phone)
        .bind(&profile.email)
        .bind(&profile.logo_url)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
