//! Repositorio de clientes - acceso a datos PostgreSQL
//!
//! El motor solo necesita resolver la identidad del cliente al abrir un
//! préstamo y sus datos de contacto para el contrato. La gestión completa
//! de clientes vive en otro servicio.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::client::Client;
use crate::utils::errors::AppResult;

#[async_trait]
pub trait ClientRepository: Send + Sync {
    async fn find_by_id(&self, client_id: Uuid) -> AppResult<Option<Client>>;

    /// Alta mínima, usada por las herramientas de arranque y los tests.
    async fn create(&self, client: Client) -> AppResult<Client>;
}

pub struct PgClientRepository {
    pool: PgPool,
}

impl PgClientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientRepository for PgClientRepository {
    async fn find_by_id(&self, client_id: Uuid) -> AppResult<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(
            r#"
            SELECT id, company_id, first_name, last_name, address, phone, email, created_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(client)
    }

    async fn create(&self, client: Client) -> AppResult<Client> {
        let created = sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (id, company_id, first_name, last_name, address, phone, email, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, company_id, first_name, last_name, address, phone, email, created_at
            "#,
        )
        .bind(client.id)
        .bind(client.company_id)
        .bind(&client.first_name)
        .bind(&client.last_name)
        .bind(&client.address)
        .bind(&client.phone)
        .bind(&client.email)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
