//! Object storage en memoria
//!
//! Este módulo implementa `ObjectStorage` sobre un HashMap para tests y modo
//! desarrollo. Las URLs públicas usan el esquema `memory://`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ObjectStorage;
use crate::utils::errors::{AppError, AppResult};

#[derive(Clone, Default)]
pub struct MemoryObjectStorage {
    objects: Arc<RwLock<HashMap<String, (Vec<u8>, String)>>>,
}

impl MemoryObjectStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Número de objetos almacenados
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Content-type registrado para una URL, si existe
    pub async fn content_type_of(&self, url: &str) -> Option<String> {
        self.objects.read().await.get(url).map(|(_, ct)| ct.clone())
    }
}

#[async_trait]
impl ObjectStorage for MemoryObjectStorage {
    async fn upload(&self, path: &str, bytes: Vec<u8>, content_type: &str) -> AppResult<String> {
        let url = format!("memory://{}", path);
        let mut objects = self.objects.write().await;
        objects.insert(url.clone(), (bytes, content_type.to_string()));
        Ok(url)
    }

    async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
        let objects = self.objects.read().await;
        objects
            .get(url)
            .map(|(bytes, _)| bytes.clone())
            .ok_or_else(|| AppError::Storage(format!("objeto no encontrado: {}", url)))
    }
}
