//! Route-level tests over the health endpoints: envelope shape, status-code
//! mapping and the Prometheus exposition

use actix_web::{test, web, App};
use async_trait::async_trait;
use healthgate::config::Config;
use healthgate::monitoring::database::{
    DatabaseProbe, MigrationStats, PoolStats, QueryStats, StorageStats,
};
use healthgate::monitoring::HealthService;
use healthgate::server::routes::health::configure_routes;
use healthgate::server::AppState;
use healthgate::utils::error::{HealthError, Result};
use std::sync::Arc;
use std::time::Duration;

struct StubProbe {
    ping_fails: bool,
}

#[async_trait]
impl DatabaseProbe for StubProbe {
    async fn ping(&self) -> Result<Duration> {
        if self.ping_fails {
            Err(HealthError::Probe("connection refused".to_string()))
        } else {
            Ok(Duration::from_millis(1))
        }
    }

    async fn pool_stats(&self) -> Result<PoolStats> {
        Ok(PoolStats {
            size: 4,
            max_size: 20,
            active: 2,
            idle: 2,
            waiting: 0,
        })
    }

    async fn query_stats(&self) -> Result<QueryStats> {
        Ok(QueryStats {
            avg_query_time_ms: 5.0,
            slow_queries: 0,
            cache_hit_rate: 99.0,
        })
    }

    async fn storage_stats(&self) -> Result<StorageStats> {
        Ok(StorageStats {
            database_size_bytes: 0,
            table_count: 0,
            index_count: 0,
        })
    }

    async fn migration_status(&self) -> Result<MigrationStats> {
        Ok(MigrationStats {
            applied: 1,
            pending: 0,
        })
    }
}

fn state(ping_fails: bool) -> AppState {
    let config = Config::default();
    let health = Arc::new(HealthService::new(
        &config.monitoring,
        Arc::new(StubProbe { ping_fails }),
    ));
    AppState::new(config, health)
}

macro_rules! test_app {
    ($state:expr) => {
        test::init_service(
            App::new()
                .app_data(web::Data::new($state))
                .configure(configure_routes),
        )
        .await
    };
}

#[actix_web::test]
async fn ping_answers_ok_in_the_envelope() {
    let app = test_app!(state(false));
    let resp = test::call_service(&app, test::TestRequest::get().uri("/health/ping").to_request())
        .await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "ok");
}

#[actix_web::test]
async fn basic_health_reports_system_and_database() {
    let app = test_app!(state(false));
    let resp =
        test::call_service(&app, test::TestRequest::get().uri("/health").to_request()).await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["database"]["status"], "healthy");
    assert!(body["data"]["system"]["status"].is_string());
}

#[actix_web::test]
async fn comprehensive_maps_critical_to_503() {
    let app = test_app!(state(true));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health/comprehensive")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::SERVICE_UNAVAILABLE);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "critical");
    assert_eq!(body["data"]["services"]["database"]["status"], "critical");
    assert!(!body["data"]["alerts"].as_array().unwrap().is_empty());
}

#[actix_web::test]
async fn comprehensive_status_code_matches_body_status() {
    let app = test_app!(state(false));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health/comprehensive")
            .to_request(),
    )
    .await;
    let code = resp.status();

    let body: serde_json::Value = test::read_body_json(resp).await;
    let status = body["data"]["status"].as_str().unwrap();
    if status == "critical" {
        assert_eq!(code, actix_web::http::StatusCode::SERVICE_UNAVAILABLE);
    } else {
        assert_eq!(code, actix_web::http::StatusCode::OK);
    }
    assert_eq!(body["data"]["summary"]["total"], 7);
}

#[actix_web::test]
async fn metrics_are_prometheus_text() {
    let app = test_app!(state(false));
    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/health/metrics").to_request(),
    )
    .await;
    assert!(resp.status().is_success());

    let content_type = resp
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(content_type.starts_with("text/plain"));

    let body = test::read_body(resp).await;
    let text = std::str::from_utf8(&body).unwrap();
    assert!(text.contains("# HELP http_requests_total"));
    assert!(text.contains("process_uptime_seconds"));
}

#[actix_web::test]
async fn unknown_external_service_is_404() {
    let app = test_app!(state(false));
    let resp = test::call_service(
        &app,
        test::TestRequest::get()
            .uri("/health/external/billing")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], false);
    assert!(body["error"].is_string());
}

#[actix_web::test]
async fn cache_clear_reports_what_was_dropped() {
    let app_state = state(false);
    app_state.health.cache.update_usage(4096, 12);
    let app = test_app!(app_state);

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/health/cache/clear")
            .to_request(),
    )
    .await;
    assert!(resp.status().is_success());

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["cleared_keys"], 12);
    assert_eq!(body["data"]["freed_bytes"], 4096);
}

#[actix_web::test]
async fn leaf_detail_routes_answer_200() {
    let app = test_app!(state(false));
    for uri in [
        "/health/status",
        "/health/database/connection",
        "/health/database/migrations",
        "/health/application/domains",
        "/health/performance/response-times",
        "/health/cache/hit-rates",
        "/health/security/ssl",
        "/health/security/auth",
    ] {
        let resp =
            test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;
        assert!(resp.status().is_success(), "{} failed", uri);
    }
}
