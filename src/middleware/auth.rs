//! Middleware de autenticación JWT
//!
//! Las sesiones las emite el backend de autenticación externo; este
//! middleware verifica el token Bearer y deja la sesión decodificada en las
//! extensions de la request. Toda operación queda así acotada a la empresa
//! del token.

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::state::AppState;
use crate::utils::errors::AppError;
use crate::utils::jwt::{verify_token, JwtConfig};

/// Sesión autenticada que se inyecta en las requests
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user_id: Uuid,
    pub company_id: Uuid,
}

/// Middleware de autenticación JWT
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Extraer token del header Authorization
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_str| auth_str.to_str().ok())
        .and_then(|auth_str| auth_str.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Jwt("Token de autorización requerido".to_string()))?;

    let jwt_config = JwtConfig::from(&state.config);
    let claims = verify_token(auth_header, &jwt_config)?;

    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Jwt("ID de usuario inválido".to_string()))?;
    let company_id = Uuid::parse_str(&claims.company_id)
        .map_err(|_| AppError::Jwt("ID de empresa inválido".to_string()))?;

    // Inyectar la sesión en las extensions
    request
        .extensions_mut()
        .insert(AuthSession { user_id, company_id });

    Ok(next.run(request).await)
}
