use anyhow::Result;
use dotenvy::dotenv;
use std::net::SocketAddr;
use tokio::signal;
use tracing::{error, info};

use courtesy_fleet::config::environment::EnvironmentConfig;
use courtesy_fleet::database::create_pool;
use courtesy_fleet::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    info!("🚗 Courtesy Fleet - Motor de préstamos de vehículos de cortesía");
    info!("================================================");

    let config = EnvironmentConfig::default();

    // Inicializar base de datos
    let pool = match create_pool(None).await {
        Ok(pool) => pool,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    // Crear router de la API
    let app_state = AppState::postgres(pool, config.clone())?;
    let app = courtesy_fleet::create_app(app_state);

    // Puerto del servidor
    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /test - Endpoint de prueba");
    info!("🚗 Endpoints - Vehículos de cortesía:");
    info!("   POST /api/vehicle - Registrar vehículo");
    info!("   GET  /api/vehicle - Listar vehículos (filtro ?status=)");
    info!("   GET  /api/vehicle/available - Vehículos disponibles");
    info!("   GET  /api/vehicle/:id - Obtener vehículo");
    info!("   PUT  /api/vehicle/:id - Actualizar vehículo");
    info!("   PUT  /api/vehicle/:id/status - Cambiar estado");
    info!("   POST /api/vehicle/:id/damages - Registrar daño");
    info!("   DELETE /api/vehicle/:id - Eliminar vehículo");
    info!("🔑 Endpoints - Préstamos:");
    info!("   POST /api/loan - Abrir préstamo (borrador completo)");
    info!("   GET  /api/loan - Listar préstamos");
    info!("   GET  /api/loan/:id - Obtener préstamo");
    info!("   GET  /api/loan/vehicle/:vehicle_id - Historial por vehículo");
    info!("   POST /api/loan/:id/close - Cerrar préstamo");
    info!("   POST /api/loan/:id/signatures - Adjuntar firmas");
    info!("   POST /api/loan/:id/regenerate-contract - Regenerar contrato");
    info!("   DELETE /api/loan/:id - Eliminar préstamo");
    info!("   POST /api/loan/draft/validate - Validar borrador");
    info!("   POST /api/loan/draft/document - Subir documento del borrador");

    // Iniciar servidor en background
    let server_handle = tokio::spawn(async move {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| {
                error!("❌ Error del servidor: {}", e);
                e
            })
    });

    // Esperar a que el servidor termine
    if let Err(e) = server_handle.await? {
        error!("❌ Servidor terminó con error: {}", e);
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("🛑 Señal Ctrl+C recibida, apagando servidor...");
        },
        _ = terminate => {
            info!("🛑 Señal de terminación recibida, apagando servidor...");
        },
    }
}
