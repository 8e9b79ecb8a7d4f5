//! HTTP server core implementation

use crate::config::{Config, ServerConfig};
use crate::monitoring::{HealthService, SeaOrmProbe};
use crate::server::routes;
use crate::server::state::AppState;
use crate::utils::error::{HealthError, Result};
use actix_web::{
    dev::Service, middleware::DefaultHeaders, web, App, HttpServer as ActixHttpServer,
};
use sea_orm::{ConnectOptions, Database};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::info;

/// HTTP server
pub struct HttpServer {
    /// Server configuration
    config: ServerConfig,
    /// Application state
    state: AppState,
}

impl HttpServer {
    /// Create a new HTTP server
    ///
    /// The database pool is created lazily: an unreachable database must not
    /// keep the health service from starting, it must show up as a critical
    /// database component instead.
    pub async fn new(config: &Config) -> Result<Self> {
        info!("Creating HTTP server");

        let mut options = ConnectOptions::new(config.database.url.clone());
        options
            .max_connections(config.database.max_connections)
            .connect_timeout(Duration::from_secs(config.database.connect_timeout_secs))
            .connect_lazy(true)
            .sqlx_logging(false);
        let db = Database::connect(options).await?;

        let probe = Arc::new(SeaOrmProbe::new(db, config.database.max_connections));
        let health = Arc::new(HealthService::new(&config.monitoring, probe));
        health.clone().start();

        let state = AppState::new(config.clone(), health);

        Ok(Self {
            config: config.server.clone(),
            state,
        })
    }

    /// Create the Actix-web application
    fn create_app(
        state: web::Data<AppState>,
    ) -> App<
        impl actix_web::dev::ServiceFactory<
            actix_web::dev::ServiceRequest,
            Config = (),
            Response = actix_web::dev::ServiceResponse<impl actix_web::body::MessageBody>,
            Error = actix_web::Error,
            InitError = (),
        >,
    > {
        let health = state.health.clone();

        App::new()
            .app_data(state)
            .wrap(tracing_actix_web::TracingLogger::default())
            .wrap(DefaultHeaders::new().add(("Server", "healthgate")))
            // Record (path, elapsed, success) once per completed request
            .wrap_fn(move |req, srv| {
                let health = health.clone();
                let path = req.path().to_string();
                health.application.request_started(&path);
                let started = Instant::now();
                let fut = srv.call(req);
                async move {
                    let res = fut.await;
                    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
                    let success = res
                        .as_ref()
                        .map(|r| r.status().is_success())
                        .unwrap_or(false);
                    health.record_request(&path, elapsed_ms, success);
                    res
                }
            })
            .configure(routes::health::configure_routes)
    }

    /// Start the HTTP server
    pub async fn start(self) -> Result<()> {
        let bind_addr = self.config.address();
        let workers = self.config.workers;

        info!("Starting HTTP server on {}", bind_addr);

        let state = web::Data::new(self.state);

        let mut server = ActixHttpServer::new(move || Self::create_app(state.clone()));
        if let Some(workers) = workers {
            server = server.workers(workers);
        }

        let server = server
            .bind(&bind_addr)
            .map_err(|e| HealthError::Config(format!("cannot bind {}: {}", bind_addr, e)))?
            .run();

        info!("HTTP server listening on {}", bind_addr);

        server
            .await
            .map_err(|e| HealthError::Internal(format!("server error: {}", e)))?;

        info!("HTTP server stopped");
        Ok(())
    }

    /// Get server configuration
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get application state
    pub fn state(&self) -> &AppState {
        &self.state
    }
}
