use anyhow::Result;
use tokio::signal;
use tracing::{error, info, warn};
use dotenvy::dotenv;

use fleet_backoffice::config::{DatabaseConfig, EnvironmentConfig};
use fleet_backoffice::create_app;
use fleet_backoffice::database::DatabaseConnection;
use fleet_backoffice::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Cargar variables de entorno
    dotenv().ok();
    let config = EnvironmentConfig::from_env();

    // Configurar logging
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .init();

    info!("🚗 Fleet Back Office - API de operaciones de flota");
    info!("=================================================");
    info!("🌍 Entorno: {}", config.environment);
    if config.is_production() && config.cors_origins.is_empty() {
        warn!("⚠️ CORS_ORIGINS vacío en producción: no se aceptarán peticiones cross-origin");
    }

    // Inicializar base de datos
    let database_config = DatabaseConfig::from_env()?;
    let db_connection = match DatabaseConnection::connect(&database_config).await {
        Ok(conn) => conn,
        Err(e) => {
            error!("❌ Error conectando a la base de datos: {}", e);
            return Err(anyhow::anyhow!("Error de base de datos: {}", e));
        }
    };

    if config.run_migrations {
        db_connection.run_migrations().await?;
    }

    let addr = config.server_addr();
    let app_state = AppState::new(db_connection.pool().clone(), config);
    let app = create_app(app_state);

    info!("🌐 Servidor iniciando en http://{}", addr);
    info!("🔍 Endpoints disponibles:");
    info!("   GET  /health");
    info!("🚗 Vehículos:");
    info!("   GET|POST /api/vehicles - Listar / crear");
    info!("   GET  /api/vehicles/:id - Detalle con calendario y alertas");
    info!("   PUT|DELETE /api/vehicles/:id - Actualizar / eliminar");
    info!("📅 Reservas:");
    info!("   GET|POST /api/bookings, GET|DELETE /api/bookings/:id");
    info!("   POST /api/bookings/:id/confirm, POST /api/bookings/:id/complete");
    info!("🔧 Retenciones operativas:");
    info!("   GET|POST /api/operational-holds, GET /api/operational-holds/reasons");
    info!("   GET|PUT|DELETE /api/operational-holds/:id");
    info!("📸 Informes de daños (multipart):");
    info!("   GET|POST /api/damage-reports, GET|PUT|DELETE /api/damage-reports/:id");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    if let Err(e) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!("❌ Error del servidor: {}", e);
        return Err(e.into());
    }

    info!("👋 Servidor terminado");
    Ok(())
}

/// Señal de apagado graceful
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("❌ No se pudo instalar el handler de Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("❌ No se pudo instalar el handler de SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
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
