//! Delivery API Server
//!
//! HTTP API for the storefront: shipping rate quotes, checkout validation,
//! store location and per-product delivery settings.

use crate::application::{CheckoutValidation, DeliveryError, LocalDeliveryService};
use crate::domain::entities::{Address, CartLine, ProductDeliverySettings, ShippingRate};
use crate::domain::value_objects::{Coordinate, DeliveryRadius, DistanceResult};
use crate::infrastructure::ShutdownController;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shipping rate request from the cart.
#[derive(Debug, Clone, Deserialize)]
pub struct ShippingRequest {
    pub destination: Address,
    #[serde(default)]
    pub cart: Vec<CartLine>,
}

/// Shipping rate response.
#[derive(Debug, Serialize)]
pub struct ShippingResponse {
    pub rate: Option<ShippingRate>,
    pub distance_miles: Option<f64>,
    pub radius_miles: Option<f64>,
    /// Why the distance is unknown, when it is
    pub unreachable_reason: Option<String>,
}

/// Checkout validation request.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub session_id: String,
    pub destination: Address,
    #[serde(default)]
    pub cart: Vec<CartLine>,
}

/// Checkout validation response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub status: String,
    pub products: Vec<String>,
    pub notice: Option<String>,
    pub newly_added: bool,
}

/// Product settings update; the product id comes from the path.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductSettingsRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub local_delivery_enabled: bool,
    #[serde(default)]
    pub radius: Option<DeliveryRadius>,
}

/// Health response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub store_configured: bool,
    pub radius_policy: String,
}

/// API Server state.
#[derive(Clone)]
pub struct ApiState {
    pub service: Arc<LocalDeliveryService>,
}

impl ApiState {
    pub fn new(service: Arc<LocalDeliveryService>) -> Self {
        Self { service }
    }
}

/// API Server for the delivery service.
pub struct ApiServer {
    listen_addr: String,
    state: ApiState,
}

impl ApiServer {
    pub fn new(listen_addr: String, service: Arc<LocalDeliveryService>) -> Self {
        Self {
            listen_addr,
            state: ApiState::new(service),
        }
    }

    /// Build the router with all routes.
    pub fn router(state: ApiState) -> Router {
        Router::new()
            // Health endpoint
            .route("/health", get(health_handler))
            // Delivery decisions
            .route("/api/v1/shipping/rates", post(shipping_rates_handler))
            .route("/api/v1/checkout/validate", post(validate_checkout_handler))
            // Store location
            .route(
                "/api/v1/store/location",
                get(get_store_location_handler).put(put_store_location_handler),
            )
            .route("/api/v1/store/geocode", post(geocode_store_handler))
            // Product settings
            .route(
                "/api/v1/products/:id/delivery",
                get(get_product_handler).put(put_product_handler),
            )
            // Session notices
            .route(
                "/api/v1/sessions/:id/notices",
                get(list_notices_handler).delete(clear_notices_handler),
            )
            .layer(TraceLayer::new_for_http())
            .with_state(state)
    }

    /// Run the API server until shutdown is signalled.
    pub async fn run(&self, shutdown: ShutdownController) -> anyhow::Result<()> {
        let app = Self::router(self.state.clone());

        let listener = TcpListener::bind(&self.listen_addr).await?;
        tracing::info!("delivery API listening on {}", self.listen_addr);

        let mut shutdown_rx = shutdown.subscribe();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown_rx.recv().await;
            })
            .await?;

        tracing::info!("delivery API stopped");
        Ok(())
    }
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
        .into_response()
}

/// Map application errors to HTTP status codes.
fn delivery_error_response(err: DeliveryError) -> Response {
    let status = match &err {
        DeliveryError::IncompleteStoreAddress | DeliveryError::InvalidCoordinate(_) => {
            StatusCode::BAD_REQUEST
        }
        DeliveryError::StoreGeocodeFailed(_) => StatusCode::BAD_GATEWAY,
        DeliveryError::Storage(e) => {
            tracing::error!("storage error: {:?}", e);
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };
    error_response(status, err.to_string())
}

// Handler functions

async fn health_handler(State(state): State<ApiState>) -> impl IntoResponse {
    let store_configured = matches!(state.service.store_coordinates().await, Ok(Some(_)));
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        store_configured,
        radius_policy: state.service.settings().policy.as_str().to_string(),
    };
    Json(response)
}

async fn shipping_rates_handler(
    State(state): State<ApiState>,
    Json(req): Json<ShippingRequest>,
) -> Response {
    match state
        .service
        .calculate_shipping(&req.destination, &req.cart)
        .await
    {
        Ok(quote) => {
            let unreachable_reason = match &quote.distance {
                Some(DistanceResult::Unreachable(reason)) => Some(reason.to_string()),
                _ => None,
            };
            Json(ShippingResponse {
                rate: quote.rate,
                distance_miles: quote.distance.as_ref().and_then(|d| d.miles()),
                radius_miles: quote.radius.map(|r| r.miles()),
                unreachable_reason,
            })
            .into_response()
        }
        Err(e) => delivery_error_response(e),
    }
}

async fn validate_checkout_handler(
    State(state): State<ApiState>,
    Json(req): Json<CheckoutRequest>,
) -> Response {
    let result = state
        .service
        .validate_checkout(&req.session_id, &req.destination, &req.cart)
        .await;

    match result {
        Ok(CheckoutValidation::Skipped) => Json(CheckoutResponse {
            status: "skipped".to_string(),
            products: Vec::new(),
            notice: None,
            newly_added: false,
        })
        .into_response(),
        Ok(CheckoutValidation::Valid) => Json(CheckoutResponse {
            status: "valid".to_string(),
            products: Vec::new(),
            notice: None,
            newly_added: false,
        })
        .into_response(),
        Ok(CheckoutValidation::Rejected {
            products,
            notice,
            newly_added,
        }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(CheckoutResponse {
                status: "rejected".to_string(),
                products,
                notice: Some(notice.message),
                newly_added,
            }),
        )
            .into_response(),
        Err(e) => delivery_error_response(e),
    }
}

async fn get_store_location_handler(State(state): State<ApiState>) -> Response {
    match state.service.store_coordinates().await {
        Ok(Some(coordinate)) => Json(coordinate).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "store coordinates not set"),
        Err(e) => delivery_error_response(e),
    }
}

async fn put_store_location_handler(
    State(state): State<ApiState>,
    Json(coordinate): Json<Coordinate>,
) -> Response {
    match state.service.set_store_coordinates(coordinate).await {
        Ok(()) => Json(coordinate).into_response(),
        Err(e) => delivery_error_response(e),
    }
}

async fn geocode_store_handler(
    State(state): State<ApiState>,
    Json(address): Json<Address>,
) -> Response {
    match state.service.initialize_store_coordinates(&address).await {
        Ok(coordinate) => Json(coordinate).into_response(),
        Err(e) => delivery_error_response(e),
    }
}

async fn get_product_handler(State(state): State<ApiState>, Path(id): Path<u64>) -> Response {
    match state.service.product_settings(id).await {
        Ok(Some(settings)) => Json(settings).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "product not configured"),
        Err(e) => delivery_error_response(e),
    }
}

async fn put_product_handler(
    State(state): State<ApiState>,
    Path(id): Path<u64>,
    Json(req): Json<ProductSettingsRequest>,
) -> Response {
    let settings = ProductDeliverySettings {
        product_id: id,
        title: req.title,
        local_delivery_enabled: req.local_delivery_enabled,
        radius: req.radius,
    };

    match state.service.save_product_settings(settings.clone()).await {
        Ok(()) => Json(settings).into_response(),
        Err(e) => delivery_error_response(e),
    }
}

async fn list_notices_handler(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let notices = state.service.notices(&session_id);
    Json(serde_json::json!({
        "session_id": session_id,
        "notices": notices,
    }))
}

async fn clear_notices_handler(
    State(state): State<ApiState>,
    Path(session_id): Path<String>,
) -> impl IntoResponse {
    let cleared = state.service.clear_notices(&session_id);
    Json(serde_json::json!({
        "session_id": session_id,
        "cleared": cleared,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::{DashMapNoticeStore, SqliteSettingsRepository};
    use crate::application::ShippingMethodSettings;
    use crate::domain::ports::{GeocodeError, Geocoder, StoreLocationRepository};
    use async_trait::async_trait;
    use axum::{
        body::Body,
        http::{Request, StatusCode as HttpStatusCode},
    };
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    // ===== Mock Implementations =====

    struct FixedGeocoder(Result<Coordinate, GeocodeError>);

    #[async_trait]
    impl Geocoder for FixedGeocoder {
        async fn resolve(&self, _address: &Address) -> Result<Coordinate, GeocodeError> {
            self.0.clone()
        }
    }

    // ===== Test Helpers =====

    async fn create_state(
        geocode: Result<Coordinate, GeocodeError>,
        store: Option<Coordinate>,
    ) -> ApiState {
        let repo = Arc::new(SqliteSettingsRepository::in_memory().unwrap());
        if let Some(store) = store {
            repo.set_store_location(store).await.unwrap();
        }

        let service = LocalDeliveryService::new(
            Arc::new(FixedGeocoder(geocode)),
            repo.clone(),
            repo,
            Arc::new(DashMapNoticeStore::new()),
            ShippingMethodSettings::default(),
        );
        ApiState::new(Arc::new(service))
    }

    async fn create_test_app() -> Router {
        let state =
            create_state(Ok(Coordinate::new(40.0, -75.1)), Some(Coordinate::new(40.0, -75.0))).await;
        ApiServer::router(state)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_string(&body).unwrap()))
            .unwrap()
    }

    fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap()
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn enable_product(app: &Router, id: u64, title: &str, radius: f64) {
        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                &format!("/api/v1/products/{}/delivery", id),
                serde_json::json!({
                    "title": title,
                    "local_delivery_enabled": true,
                    "radius": radius
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
    }

    fn destination() -> serde_json::Value {
        serde_json::json!({
            "line1": "12 Elm St",
            "city": "Springfield",
            "postal_code": "19064"
        })
    }

    // ===== Health =====

    #[tokio::test]
    async fn test_health_handler() {
        let app = create_test_app().await;

        let response = app.oneshot(empty_request("GET", "/health")).await.unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["store_configured"], true);
        assert_eq!(body["radius_policy"], "max_cart_item");
    }

    // ===== Shipping Rates =====

    #[tokio::test]
    async fn test_shipping_rate_offered() {
        let app = create_test_app().await;
        enable_product(&app, 1, "Cake", 10.0).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/shipping/rates",
                serde_json::json!({
                    "destination": destination(),
                    "cart": [{"product_id": 1}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["rate"]["id"], "local_delivery");
        assert_eq!(body["rate"]["cost"], "5.00");
        assert_eq!(body["radius_miles"], 10.0);
        assert!(body["unreachable_reason"].is_null());
    }

    #[tokio::test]
    async fn test_shipping_rate_unreachable_reason() {
        let app = ApiServer::router(
            create_state(Err(GeocodeError::NoResults), Some(Coordinate::new(40.0, -75.0))).await,
        );
        enable_product(&app, 1, "Cake", 10.0).await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/shipping/rates",
                serde_json::json!({
                    "destination": destination(),
                    "cart": [{"product_id": 1}]
                }),
            ))
            .await
            .unwrap();

        let body = body_json(response).await;
        assert!(body["rate"].is_null());
        assert!(body["distance_miles"].is_null());
        assert_eq!(body["unreachable_reason"], "geocoding failed: no results");
    }

    #[tokio::test]
    async fn test_shipping_rates_rejects_bad_body() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/shipping/rates",
                serde_json::json!({"cart": []}),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    // ===== Checkout Validation =====

    #[tokio::test]
    async fn test_checkout_rejected() {
        let app = ApiServer::router(
            create_state(Ok(Coordinate::new(40.0, -76.0)), Some(Coordinate::new(40.0, -75.0))).await,
        );
        enable_product(&app, 1, "Cake", 10.0).await;

        let request = serde_json::json!({
            "session_id": "s1",
            "destination": destination(),
            "cart": [{"product_id": 1}]
        });

        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/checkout/validate", request.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::UNPROCESSABLE_ENTITY);

        let body = body_json(response).await;
        assert_eq!(body["status"], "rejected");
        assert_eq!(body["products"][0], "Cake");
        assert_eq!(body["newly_added"], true);

        // Second validation does not add the notice again
        let response = app
            .clone()
            .oneshot(json_request("POST", "/api/v1/checkout/validate", request))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["newly_added"], false);

        let response = app
            .oneshot(empty_request("GET", "/api/v1/sessions/s1/notices"))
            .await
            .unwrap();
        let body = body_json(response).await;
        assert_eq!(body["notices"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_checkout_valid_and_skipped() {
        let app = create_test_app().await;
        enable_product(&app, 1, "Cake", 10.0).await;

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/checkout/validate",
                serde_json::json!({
                    "session_id": "s1",
                    "destination": destination(),
                    "cart": [{"product_id": 1}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(body_json(response).await["status"], "valid");

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/checkout/validate",
                serde_json::json!({
                    "session_id": "s1",
                    "destination": {"line1": "12 Elm St"},
                    "cart": [{"product_id": 1}]
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(body_json(response).await["status"], "skipped");
    }

    // ===== Store Location =====

    #[tokio::test]
    async fn test_store_location_lifecycle() {
        let app = ApiServer::router(create_state(Ok(Coordinate::new(40.0, -75.0)), None).await);

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/store/location"))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);

        let response = app
            .clone()
            .oneshot(json_request(
                "PUT",
                "/api/v1/store/location",
                serde_json::json!({"latitude": 39.95, "longitude": -75.14}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = app
            .oneshot(empty_request("GET", "/api/v1/store/location"))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["latitude"], 39.95);
        assert_eq!(body["longitude"], -75.14);
    }

    #[tokio::test]
    async fn test_put_invalid_store_location() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/v1/store/location",
                serde_json::json!({"latitude": 91.0, "longitude": 0.0}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_geocode_store() {
        let app = ApiServer::router(create_state(Ok(Coordinate::new(39.95, -75.14)), None).await);

        let response = app
            .clone()
            .oneshot(json_request(
                "POST",
                "/api/v1/store/geocode",
                serde_json::json!({
                    "line1": "1 Market St",
                    "city": "Philadelphia",
                    "postal_code": "19106"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/store/geocode",
                serde_json::json!({"line1": "1 Market St", "city": "Philadelphia"}),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_geocode_store_failure_is_bad_gateway() {
        let app = ApiServer::router(create_state(Err(GeocodeError::Status(500)), None).await);

        let response = app
            .oneshot(json_request(
                "POST",
                "/api/v1/store/geocode",
                serde_json::json!({
                    "line1": "1 Market St",
                    "city": "Philadelphia",
                    "postal_code": "19106"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::BAD_GATEWAY);
    }

    // ===== Products =====

    #[tokio::test]
    async fn test_product_settings_lifecycle() {
        let app = create_test_app().await;

        let response = app
            .clone()
            .oneshot(empty_request("GET", "/api/v1/products/7/delivery"))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::NOT_FOUND);

        enable_product(&app, 7, "Bread", 15.0).await;

        let response = app
            .oneshot(empty_request("GET", "/api/v1/products/7/delivery"))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["product_id"], 7);
        assert_eq!(body["title"], "Bread");
        assert_eq!(body["local_delivery_enabled"], true);
        assert_eq!(body["radius"], 15.0);
    }

    #[tokio::test]
    async fn test_product_negative_radius_rejected() {
        let app = create_test_app().await;

        let response = app
            .oneshot(json_request(
                "PUT",
                "/api/v1/products/7/delivery",
                serde_json::json!({"local_delivery_enabled": true, "radius": -5.0}),
            ))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    // ===== Notices =====

    #[tokio::test]
    async fn test_clear_notices_empty_session() {
        let app = create_test_app().await;

        let response = app
            .oneshot(empty_request("DELETE", "/api/v1/sessions/nobody/notices"))
            .await
            .unwrap();
        assert_eq!(response.status(), HttpStatusCode::OK);
        assert_eq!(body_json(response).await["cleared"], 0);
    }

    // ===== Server =====

    #[tokio::test]
    async fn test_api_server_run_and_shutdown() {
        use std::time::Duration;

        // Find an available port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let state = create_state(Ok(Coordinate::new(40.0, -75.0)), None).await;
        let server = ApiServer::new(addr.to_string(), state.service.clone());
        let shutdown = ShutdownController::new();

        let server_shutdown = shutdown.clone();
        let server_handle = tokio::spawn(async move { server.run(server_shutdown).await });

        // Give server time to start
        tokio::time::sleep(Duration::from_millis(100)).await;

        let response = reqwest::Client::new()
            .get(format!("http://{}/health", addr))
            .timeout(Duration::from_secs(2))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::OK);

        shutdown.shutdown();
        let result = tokio::time::timeout(Duration::from_secs(5), server_handle)
            .await
            .unwrap()
            .unwrap();
        assert!(result.is_ok());
    }
}
