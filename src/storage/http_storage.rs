//! Cliente HTTP del object storage alojado
//!
//! Este módulo implementa `ObjectStorage` contra el storage del Data Store
//! (API estilo bucket: PUT de objeto, GET por URL pública).

use async_trait::async_trait;
use reqwest::Client;

use super::ObjectStorage;
use crate::utils::errors::{AppError, AppResult};

/// Storage de objetos alojado, autenticado por service token
#[derive(Clone)]
pub struct HttpObjectStorage {
    client: Client,
    base_url: String,
    public_base_url: String,
    service_token: String,
}

impl HttpObjectStorage {
    pub fn new(base_url: String, public_base_url: String, service_token: String) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| AppError::Internal(format!("error creando cliente HTTP: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            service_token,
        })
    }

    fn encoded_path(path: &str) -> String {
        path.split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect::<Vec<_>>()
            .join("/")
    }
}

#[async_trait]
impl ObjectStorage for HttpObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let encoded = Self::encoded_path(path);
        let url = format!("{}/{}", self.base_url, encoded);

        log::info!("📤 Subiendo objeto a storage: {} ({} bytes)", path, bytes.len());

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.service_token)
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("error subiendo '{}': {}", path, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "storage respondió {} al subir '{}'",
                response.status(),
                path
            )));
        }

        Ok(format!("{}/{}", self.public_base_url, encoded))
    }

    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("error descargando '{}': {}", url, e)))?;

        if !response.status().is_success() {
            return Err(AppError::Storage(format!(
                "storage respondió {} al descargar '{}'",
                response.status(),
                url
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| AppError::Storage(format!("error leyendo cuerpo de '{}': {}", url, e)))?;

        Ok(bytes.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encoded_path_preserves_slashes() {
        let encoded = HttpObjectStorage::encoded_path("contracts/taller 01/a b.html");
        assert_eq!(encoded, "contracts/taller%2001/a%20b.html");
    }
}
