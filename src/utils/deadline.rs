//! Decorador de deadline para operaciones asíncronas
//!
//! Este módulo envuelve cualquier operación de I/O con un límite de tiempo
//! explícito: un cuelgue se convierte en `AppError::Timeout` en lugar de
//! dejar al caller bloqueado indefinidamente.

use std::future::Future;
use std::time::Duration;

use crate::utils::errors::{AppError, AppResult};

/// Deadline por defecto para subidas de documentos e imágenes
pub const DEFAULT_UPLOAD_DEADLINE: Duration = Duration::from_secs(15);

/// Ejecutar un future con un deadline acotado.
///
/// Un deadline vencido produce `AppError::Timeout` con la operación nombrada;
/// los errores propios del future se propagan sin tocar, de modo que el
/// caller siempre puede distinguir "tardó demasiado" de "falló".
pub async fn with_deadline<T, F>(label: &str, deadline: Duration, fut: F) -> AppResult<T>
where
    F: Future<Output = AppResult<T>>,
{
    match tokio::time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(AppError::Timeout(format!(
            "{} excedió el límite de {}s",
            label,
            deadline.as_secs()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_deadline_passes_through_success() {
        let result = with_deadline("op", Duration::from_millis(200), async { Ok(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test]
    async fn test_deadline_passes_through_inner_error() {
        let result: AppResult<i32> = with_deadline("op", Duration::from_millis(200), async {
            Err(AppError::Storage("boom".to_string()))
        })
        .await;
        match result {
            Err(AppError::Storage(msg)) => assert_eq!(msg, "boom"),
            other => panic!("se esperaba Storage, fue {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_deadline_converts_hang_into_timeout() {
        let result: AppResult<i32> = with_deadline("subida de firma", Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(1)
        })
        .await;
        match result {
            Err(AppError::Timeout(msg)) => assert!(msg.contains("subida de firma")),
            other => panic!("se esperaba Timeout, fue {:?}", other.err()),
        }
    }
}
