//! Health check endpoints
//!
//! Every route under `/health`, from the load-balancer probe path to the
//! comprehensive report and the Prometheus exposition.

use crate::server::routes::{errors, ApiResponse};
use crate::server::state::AppState;
use actix_web::{web, HttpResponse, Result as ActixResult};
use std::borrow::Cow;
use tracing::debug;

/// Configure health check routes
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(basic_health))
            .route("/ping", web::get().to(ping))
            .route("/status", web::get().to(service_status))
            .route("/comprehensive", web::get().to(comprehensive_health))
            .route("/metrics", web::get().to(prometheus_metrics))
            .route("/system", web::get().to(system_health))
            .route("/system/cpu", web::get().to(cpu_health))
            .route("/system/memory", web::get().to(memory_health))
            .route("/system/disk", web::get().to(disk_health))
            .route("/system/network", web::get().to(network_health))
            .route("/database", web::get().to(database_health))
            .route("/database/connection", web::get().to(database_connection))
            .route("/database/performance", web::get().to(database_performance))
            .route("/database/migrations", web::get().to(database_migrations))
            .route("/external", web::get().to(external_health))
            .route("/external/{service}", web::get().to(external_service_health))
            .route("/application", web::get().to(application_health))
            .route("/application/domains", web::get().to(domain_health))
            .route("/application/tasks", web::get().to(task_health))
            .route("/performance", web::get().to(performance_health))
            .route("/performance/response-times", web::get().to(response_times))
            .route("/performance/throughput", web::get().to(throughput))
            .route("/performance/error-rates", web::get().to(error_rates))
            .route("/cache", web::get().to(cache_health))
            .route("/cache/hit-rates", web::get().to(cache_hit_rates))
            .route("/cache/clear", web::post().to(cache_clear))
            .route("/security", web::get().to(security_health))
            .route("/security/auth", web::get().to(security_auth))
            .route("/security/ssl", web::get().to(security_ssl)),
    );
}

/// Liveness probe: system and database status only
///
/// The endpoint load balancers poll; deliberately cheap.
async fn basic_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("basic health check requested");
    let health = state.health.get_basic_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

/// Trivial reachability check, no dependencies consulted
async fn ping() -> HttpResponse {
    HttpResponse::Ok().json(ApiResponse::success(PingResponse {
        status: Cow::Borrowed("ok"),
        timestamp: chrono::Utc::now(),
    }))
}

/// Service identity, build info and configuration summary
async fn service_status(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("service status requested");

    let status = ServiceStatus {
        service_name: Cow::Borrowed("healthgate"),
        version: Cow::Borrowed(env!("CARGO_PKG_VERSION")),
        build_time: Cow::Borrowed(env!("BUILD_TIME")),
        git_hash: Cow::Borrowed(env!("GIT_HASH")),
        rust_version: Cow::Borrowed(env!("RUST_VERSION")),
        uptime_seconds: state.health.uptime_seconds(),
        timestamp: chrono::Utc::now(),
        environment: std::env::var("ENVIRONMENT")
            .map(Cow::Owned)
            .unwrap_or(Cow::Borrowed("development")),
        config: ConfigSummary {
            server_host: state.config.server.host.clone(),
            server_port: state.config.server.port,
            external_services: state.health.external.service_names(),
            probe_cache_ttl_secs: state.config.monitoring.probe_cache_ttl_secs,
            aggregation_deadline_secs: state.config.monitoring.aggregation_deadline_secs,
        },
    };

    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

/// Full report over all seven leaves
///
/// Healthy and degraded reports answer 200 so pollers can still read the
/// body; only a critical overall status maps to 503.
async fn comprehensive_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("comprehensive health check requested");
    let report = state.health.get_comprehensive_health().await;

    let response = if report.status == crate::monitoring::HealthStatus::Critical {
        HttpResponse::ServiceUnavailable().json(ApiResponse::success(report))
    } else {
        HttpResponse::Ok().json(ApiResponse::success(report))
    };
    Ok(response)
}

/// Prometheus exposition of the performance counters
async fn prometheus_metrics(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    debug!("metrics requested");
    let body = state.health.performance.get_prometheus_metrics();
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4; charset=utf-8")
        .body(body))
}

async fn system_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.system.get_detailed_system_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn cpu_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.system.get_cpu_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn memory_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.system.get_memory_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn disk_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.system.get_disk_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn network_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.system.get_network_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn database_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.database.get_detailed_database_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn database_connection(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.database.get_connection_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn database_performance(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let metrics = state.health.database.get_performance_metrics().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

async fn database_migrations(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let status = state.health.database.get_migration_status().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(status)))
}

async fn external_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.external.get_all_services_health().await;
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

/// One configured external probe by name; unknown names answer 404
async fn external_service_health(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ActixResult<HttpResponse> {
    let name = path.into_inner();
    match state.health.external.get_service_health(&name).await {
        Ok(result) => Ok(HttpResponse::Ok().json(ApiResponse::success(result))),
        Err(e) => Ok(errors::health_error_to_response(e)),
    }
}

async fn application_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.application.get_application_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn domain_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.application.get_domain_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn task_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.application.get_task_processing_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn performance_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let metrics = state.health.performance.get_performance_metrics();
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

async fn response_times(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let metrics = state.health.performance.get_response_time_metrics();
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

async fn throughput(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let metrics = state.health.performance.get_throughput_metrics();
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

async fn error_rates(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let metrics = state.health.performance.get_error_rate_metrics();
    Ok(HttpResponse::Ok().json(ApiResponse::success(metrics)))
}

async fn cache_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.cache.get_cache_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn cache_hit_rates(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let stats = state.health.cache.get_cache_stats();
    Ok(HttpResponse::Ok().json(ApiResponse::success(stats)))
}

/// Flush the cache and report what was dropped
async fn cache_clear(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let result = state.health.cache.clear_cache();
    Ok(HttpResponse::Ok().json(ApiResponse::success(result)))
}

async fn security_health(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.security.get_security_status();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn security_auth(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.security.get_authentication_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

async fn security_ssl(state: web::Data<AppState>) -> ActixResult<HttpResponse> {
    let health = state.health.security.get_ssl_health();
    Ok(HttpResponse::Ok().json(ApiResponse::success(health)))
}

/// Trivial reachability payload
#[derive(Debug, Clone, serde::Serialize)]
struct PingResponse {
    status: Cow<'static, str>,
    timestamp: chrono::DateTime<chrono::Utc>,
}

/// Service identity and build information
#[derive(Debug, Clone, serde::Serialize)]
struct ServiceStatus {
    service_name: Cow<'static, str>,
    version: Cow<'static, str>,
    build_time: Cow<'static, str>,
    git_hash: Cow<'static, str>,
    rust_version: Cow<'static, str>,
    uptime_seconds: u64,
    timestamp: chrono::DateTime<chrono::Utc>,
    environment: Cow<'static, str>,
    config: ConfigSummary,
}

/// Configuration summary for operators
#[derive(Debug, Clone, serde::Serialize)]
struct ConfigSummary {
    server_host: String,
    server_port: u16,
    external_services: Vec<String>,
    probe_cache_ttl_secs: u64,
    aggregation_deadline_secs: u64,
}
