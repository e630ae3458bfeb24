//! Geolocation fallback chain against local stand-in providers

mod common;

use axum::{routing::get, Json, Router};
use serde_json::json;
use std::time::{Duration, Instant};

use common::*;
use early_access_server::{config::GeoConfig, geo::ClientIp, GeoResolver};

fn geo_config() -> GeoConfig {
    test_config().geo
}

fn ip_api_success() -> serde_json::Value {
    json!({
        "status": "success",
        "query": "203.0.113.9",
        "city": "Porto",
        "regionName": "Porto",
        "country": "Portugal",
        "countryCode": "PT",
        "lat": 41.15,
        "lon": -8.61,
        "timezone": "Europe/Lisbon"
    })
}

async fn serve_geojs() -> String {
    let router = Router::new().route(
        "/:file",
        get(|| async {
            Json(json!({
                "ip": "203.0.113.9",
                "city": "Oslo",
                "region": "Oslo County",
                "country": "Norway",
                "country_code": "NO",
                "latitude": "59.9127",
                "longitude": "10.7461",
                "timezone": "Europe/Oslo"
            }))
        }),
    );
    serve(router).await
}

async fn serve_ipapi_co() -> String {
    let router = Router::new().route(
        "/:ip/json/",
        get(|| async {
            Json(json!({
                "ip": "203.0.113.9",
                "city": "Tartu",
                "region": "Tartu",
                "country_name": "Estonia",
                "country_code": "EE",
                "latitude": 58.38,
                "longitude": 26.72,
                "timezone": "Europe/Tallinn"
            }))
        }),
    );
    serve(router).await
}

fn known() -> ClientIp {
    ClientIp::Known("203.0.113.9".to_string())
}

#[tokio::test]
async fn test_first_provider_wins() {
    let mut config = geo_config();
    config.ip_api_url = Some(serve_ip_api(ip_api_success()).await);
    config.geojs_url = Some(serve_geojs().await);
    let resolver = GeoResolver::new(config).unwrap();

    let location = resolver.resolve(&known()).await.unwrap();

    assert_eq!(location.city.as_deref(), Some("Porto"));
    assert_eq!(location.region.as_deref(), Some("Porto"));
    assert_eq!(location.country_code.as_deref(), Some("PT"));
    assert_eq!(location.ip.as_deref(), Some("203.0.113.9"));
}

#[tokio::test]
async fn test_ip_api_failure_status_falls_through() {
    let mut config = geo_config();
    config.ip_api_url = Some(
        serve_ip_api(json!({ "status": "fail", "message": "reserved range" })).await,
    );
    config.geojs_url = Some(serve_geojs().await);
    let resolver = GeoResolver::new(config).unwrap();

    let location = resolver.resolve(&known()).await.unwrap();

    assert_eq!(location.city.as_deref(), Some("Oslo"));
    // String coordinates are parsed
    assert_eq!(location.latitude, Some(59.9127));
    assert_eq!(location.longitude, Some(10.7461));
}

#[tokio::test]
async fn test_silent_provider_times_out_and_falls_back() {
    let mut config = geo_config();
    config.ip_api_url = Some(serve_silent().await);
    config.geojs_url = Some(serve_broken().await);
    config.ipapi_url = Some(serve_ipapi_co().await);
    let resolver = GeoResolver::new(config).unwrap();

    let started = Instant::now();
    let location = resolver.resolve(&known()).await.unwrap();

    assert_eq!(location.city.as_deref(), Some("Tartu"));
    assert_eq!(location.country.as_deref(), Some("Estonia"));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_all_providers_silent_yields_none_within_bound() {
    let silent = serve_silent().await;
    let mut config = geo_config();
    config.ip_api_url = Some(silent.clone());
    config.geojs_url = Some(silent.clone());
    config.ipapi_url = Some(silent);
    let resolver = GeoResolver::new(config).unwrap();

    let started = Instant::now();
    let location = resolver.resolve(&known()).await;

    assert!(location.is_none());
    // Three lookups of 200ms each, with headroom
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_failed_public_ip_detection_skips_lookup() {
    let mut config = geo_config();
    config.ip_detect_url = serve_broken().await;
    config.ip_api_url = Some(serve_ip_api(ip_api_success()).await);
    let resolver = GeoResolver::new(config).unwrap();

    assert!(resolver.resolve(&ClientIp::Detect).await.is_none());
}

#[tokio::test]
async fn test_loopback_client_detects_public_ip() {
    let detect = serve(Router::new().route(
        "/",
        get(|| async { Json(json!({ "ip": "203.0.113.9" })) }),
    ))
    .await;

    let mut config = geo_config();
    config.ip_detect_url = format!("{}/", detect);
    config.ip_api_url = Some(serve_ip_api(ip_api_success()).await);
    let resolver = GeoResolver::new(config).unwrap();

    let client = ClientIp::from_candidate(Some("127.0.0.1"));
    let location = resolver.resolve(&client).await.unwrap();

    assert_eq!(location.city.as_deref(), Some("Porto"));
}

#[tokio::test]
async fn test_no_providers_configured() {
    let resolver = GeoResolver::new(geo_config()).unwrap();
    assert!(resolver.resolve(&known()).await.is_none());
}
