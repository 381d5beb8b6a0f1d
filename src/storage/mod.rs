//! Object storage
//!
//! Este módulo define el seam hacia el object storage del Data Store externo:
//! subir bytes bajo una ruta y recuperar artefactos por su URL pública. Los
//! nombres de artefacto siguen la convención
//! `{dominio}/{subdominio}/{timestamp}_{random}.{ext}`.

pub mod http_storage;
pub mod memory_storage;

pub use http_storage::HttpObjectStorage;
pub use memory_storage::MemoryObjectStorage;

use async_trait::async_trait;

use crate::utils::errors::AppResult;

/// Operaciones de object storage del Data Store
#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Subir bytes bajo una ruta; devuelve la URL pública del artefacto
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String>;

    /// Recuperar los bytes de un artefacto por su URL pública
    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>>;
}

/// Generar una ruta de artefacto con timestamp y sufijo aleatorio
pub fn object_path(domain: &str, subdomain: &str, extension: &str) -> String {
    let timestamp = chrono::Utc::now().timestamp_millis();
    let suffix: u32 = rand::random();
    format!("{}/{}/{}_{:08x}.{}", domain, subdomain, timestamp, suffix, extension)
}
