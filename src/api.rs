//! REST API for the carton planning service.
//!
//! Provides HTTP endpoints for the dashboard and exporters.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, warn};
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::export::{ExportTable, SummaryRow, VariantRow};
use crate::model::{PackOutcome, PackingLevel, ValidationError};
use crate::optimizer::{
    EnumerationMode, PackEvent, PackingConfig, PackingError, PackingRequest, plan_packing,
    plan_packing_with_progress,
};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// SRI hashes verified against https://unpkg.com/swagger-ui-dist@5.17.14/ on 2025-10-29.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>carton-planner API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-standalone-preset.js"
            integrity="sha384-2YH8WDRaj7V2OqU/trsmzSagmk/E2SutiCsGkdgoQwC9pNUJV1u/141DHB6jgs8t"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                const ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                    presets: [SwaggerUIBundle.presets.apis, SwaggerUIStandalonePreset],
                    layout: "StandaloneLayout",
                });
                window.ui = ui;
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
///
/// `outer` enables the second packing level; weight and price enable the aggregates.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "item": [130.0, 40.0, 194.0],
        "container": [600.0, 400.0, 300.0],
        "outer": [1200.0, 800.0, 1800.0],
        "item_unit_weight": 120.0,
        "container_unit_price": 250.0,
        "mode": "orientation_search",
        "rotate_container": false,
        "product_name": "Tea box"
    })
)]
pub struct PackRequest {
    #[schema(value_type = [f64; 3], example = json!([130.0, 40.0, 194.0]))]
    pub item: (f64, f64, f64),
    #[schema(value_type = [f64; 3], example = json!([600.0, 400.0, 300.0]))]
    pub container: (f64, f64, f64),
    #[serde(default)]
    #[schema(value_type = Option<Vec<f64>>)]
    pub outer: Option<(f64, f64, f64)>,
    /// Weight of one item in grams.
    #[serde(default)]
    pub item_unit_weight: Option<f64>,
    /// Price of one filled container.
    #[serde(default)]
    pub container_unit_price: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub mode: Option<EnumerationMode>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub rotate_container: Option<bool>,
    /// Only used to name export files.
    #[serde(default)]
    pub product_name: Option<String>,
}

#[derive(Debug)]
struct ValidatedPackRequest {
    request: PackingRequest,
    product_name: String,
}

impl PackRequest {
    /// Validates all numbers and fills unset options from the service configuration.
    fn into_validated(
        self,
        config: &PackingConfig,
    ) -> Result<ValidatedPackRequest, ValidationError> {
        let mut request = PackingRequest::new(self.item, self.container)?
            .with_mode(self.mode.unwrap_or(config.default_mode))
            .with_rotate_container(self.rotate_container.unwrap_or(config.rotate_container));
        if let Some(outer) = self.outer {
            request = request.with_outer(outer)?;
        }
        if let Some(weight) = self.item_unit_weight {
            request = request.with_item_unit_weight(weight)?;
        }
        if let Some(price) = self.container_unit_price {
            request = request.with_container_unit_price(price)?;
        }

        Ok(ValidatedPackRequest {
            request,
            product_name: self.product_name.unwrap_or_default(),
        })
    }
}

/// Layout of the winning variant, for the 3D view.
#[derive(Serialize, ToSchema)]
pub struct BestLayout {
    pub x: u64,
    pub y: u64,
    pub z: u64,
    /// Item dimensions as placed (w, d, h).
    #[schema(value_type = [f64; 3], example = json!([194.0, 130.0, 40.0]))]
    pub orientation: (f64, f64, f64),
    pub rotated: bool,
}

#[derive(Serialize, ToSchema)]
pub struct LeftoverSpace {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Response of a packing calculation.
///
/// When `feasible` is false only `infeasible_level` and `message` are set.
#[derive(Serialize, ToSchema)]
pub struct PackResponse {
    pub feasible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub infeasible_level: Option<PackingLevel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<EnumerationMode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_layout: Option<BestLayout>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub best_variant_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub units_per_container: Option<u64>,
    /// Every variant in generation order (exhaustive mode only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variants: Option<Vec<VariantRow>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub containers_per_outer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub per_layer: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layers: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<f64>>)]
    pub outer_orientation: Option<(f64, f64, f64)>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_units: Option<u64>,
    /// Weight of one filled container in kg.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_weight: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leftover_space: Option<LeftoverSpace>,
    /// Share of the container volume filled by the best variant, in percent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_utilization: Option<f64>,
}

impl PackResponse {
    fn not_feasible(level: Option<PackingLevel>, message: String) -> Self {
        Self {
            feasible: false,
            infeasible_level: level,
            message: Some(message),
            mode: None,
            best_layout: None,
            best_variant_label: None,
            units_per_container: None,
            variants: None,
            containers_per_outer: None,
            per_layer: None,
            layers: None,
            outer_orientation: None,
            total_units: None,
            container_weight: None,
            total_weight: None,
            total_price: None,
            leftover_space: None,
            container_utilization: None,
        }
    }

    /// Creates a PackResponse from a calculation outcome.
    pub fn from_outcome(outcome: &PackOutcome) -> Self {
        let report = match outcome {
            PackOutcome::NotComputed => {
                return Self::not_feasible(None, "No calculation has been run".to_string());
            }
            PackOutcome::Infeasible(level) => {
                return Self::not_feasible(Some(*level), level.to_string());
            }
            PackOutcome::Computed(report) => report,
        };

        let best = report.best_variant();
        let aggregate = report.aggregate.as_ref();
        let outer_best = aggregate.and_then(|agg| agg.outer.best_variant.as_ref());

        Self {
            feasible: true,
            infeasible_level: None,
            message: None,
            mode: Some(if report.exhaustive {
                EnumerationMode::Exhaustive
            } else {
                EnumerationMode::OrientationSearch
            }),
            best_layout: best.map(|v| BestLayout {
                x: v.layout.counts.0,
                y: v.layout.counts.1,
                z: v.layout.counts.2,
                orientation: v.layout.orientation.dims.as_tuple(),
                rotated: v.layout.orientation.is_rotated(),
            }),
            best_variant_label: best.map(|v| v.label.clone()),
            units_per_container: Some(report.units_per_container()),
            variants: report
                .exhaustive
                .then(|| report.listed_variants().iter().map(VariantRow::from).collect()),
            containers_per_outer: aggregate.map(|agg| agg.containers_per_outer),
            per_layer: aggregate.map(|agg| agg.per_layer),
            layers: aggregate.map(|agg| agg.layers),
            outer_orientation: outer_best.map(|v| v.layout.orientation.dims.as_tuple()),
            total_units: Some(report.total_units()),
            container_weight: report.container_weight,
            total_weight: report.total_weight(),
            total_price: report.total_price(),
            leftover_space: report.inner.leftover_space.map(|space| LeftoverSpace {
                x: space.w,
                y: space.d,
                z: space.h,
            }),
            container_utilization: Some(report.inner.utilization_percent()),
        }
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn validation_error(details: impl Into<String>) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid input data",
        details,
    )
}

fn packing_error(err: PackingError) -> Response {
    match err {
        PackingError::Validation(err) => validation_error(err.to_string()),
        PackingError::ArithmeticOverflow { .. } => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Request exceeds computation bounds",
            err.to_string(),
        ),
    }
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
    config: &PackingConfig,
) -> Result<ValidatedPackRequest, Response> {
    let Json(payload) = match payload {
        Ok(payload) => payload,
        Err(err) => return Err(json_deserialize_error(err)),
    };

    payload
        .into_validated(config)
        .map_err(|err| validation_error(err.to_string()))
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream, handle_export),
    components(
        schemas(
            PackRequest,
            PackResponse,
            BestLayout,
            LeftoverSpace,
            VariantRow,
            ExportTable,
            SummaryRow,
            ErrorResponse,
            EnumerationMode,
            PackingLevel
        )
    ),
    tags((name = "packing", description = "Endpoints for carton and pallet packing"))
)]
struct ApiDoc;

/// Builds the application router.
fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/export", post(handle_export))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(
    config: ApiConfig,
    optimizer_config: OptimizerConfig,
) -> std::io::Result<()> {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(
        "Server running on http://{}:{}",
        config.display_host(),
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        info!("Local access: http://localhost:{}", config.port());
    }
    info!("Endpoints: POST /pack, POST /pack_stream, POST /export, GET /docs");

    axum::serve(listener, app).await
}

/// Handler for POST /pack endpoint.
///
/// Computes units per container and, with an outer container, the pallet aggregates.
/// An item that fits nowhere is a regular `feasible: false` response.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Calculation finished (feasible or not)", body = PackResponse),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid dimensions, weight, price or computation bounds exceeded",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let config = state.optimizer_config.packing_config();
    let validated = match parse_pack_request(payload, &config) {
        Ok(request) => request,
        Err(response) => return response,
    };

    info!(
        mode = validated.request.mode.code(),
        two_level = validated.request.outer.is_some(),
        "New pack request"
    );
    let outcome = match plan_packing(&validated.request, &config) {
        Ok(outcome) => outcome,
        Err(err) => {
            warn!("Pack request rejected: {err}");
            return packing_error(err);
        }
    };

    match outcome.report() {
        Some(report) => info!(
            units_per_container = report.units_per_container(),
            total_units = report.total_units(),
            "Pack request finished"
        ),
        None => info!("Pack request finished without a fit"),
    }

    (StatusCode::OK, Json(PackResponse::from_outcome(&outcome))).into_response()
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams every evaluated variant as Server-Sent Events (text/event-stream),
/// followed by the level decisions and a final `Finished` event.
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams calculation events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid dimensions, weight or price",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let config = state.optimizer_config.packing_config();
    let validated = match parse_pack_request(payload, &config) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let send = |evt: &PackEvent| {
            if let Ok(json) = serde_json::to_string(evt) {
                // Receiver has closed the stream; remaining events are discarded.
                let _ = tx.blocking_send(json);
            }
        };
        if let Err(err) = plan_packing_with_progress(&validated.request, &config, &send) {
            debug!("Streamed pack request failed: {err}");
            send(&PackEvent::Failed {
                details: err.to_string(),
            });
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

/// Handler for POST /export endpoint.
///
/// Runs the calculation and returns the flat rows for spreadsheet/document export.
#[utoipa::path(
    post,
    path = "/export",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Export rows", body = ExportTable),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid input or nothing to export",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_export(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let config = state.optimizer_config.packing_config();
    let validated = match parse_pack_request(payload, &config) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let outcome = match plan_packing(&validated.request, &config) {
        Ok(outcome) => outcome,
        Err(err) => return packing_error(err),
    };

    match ExportTable::from_outcome(&outcome, &validated.product_name) {
        Ok(table) => (StatusCode::OK, Json(table)).into_response(),
        Err(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Nothing to export",
            err.to_string(),
        ),
    }
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn state() -> ApiState {
        ApiState {
            optimizer_config: OptimizerConfig::default(),
        }
    }

    fn request(json: &str) -> PackRequest {
        serde_json::from_str(json).expect("Should parse valid JSON")
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body readable");
        serde_json::from_slice(&bytes).expect("body is JSON")
    }

    #[test]
    fn openapi_doc_lists_expected_paths() {
        let doc = openapi_doc();
        let paths = &doc.paths.paths;
        for path in ["/pack", "/pack_stream", "/export"] {
            assert!(
                paths.contains_key(path),
                "OpenAPI documentation is missing the {path} path"
            );
        }
    }

    #[test]
    fn openapi_doc_contains_key_schemas() {
        let doc = openapi_doc();
        let components = doc
            .components
            .as_ref()
            .expect("OpenAPI documentation contains no components");
        for name in ["PackRequest", "PackResponse", "ExportTable", "ErrorResponse"] {
            assert!(
                components.schemas.contains_key(name),
                "Expected schema '{}' is missing from OpenAPI documentation",
                name
            );
        }
    }

    #[test]
    fn request_defaults_come_from_config() {
        let config = PackingConfig::builder()
            .default_mode(EnumerationMode::Exhaustive)
            .rotate_container(true)
            .build();
        let validated = request(r#"{"item": [1, 2, 3], "container": [10, 10, 10]}"#)
            .into_validated(&config)
            .expect("Should validate successfully");
        assert_eq!(validated.request.mode, EnumerationMode::Exhaustive);
        assert!(validated.request.rotate_container);
        assert!(validated.request.outer.is_none());
        assert_eq!(validated.product_name, "");
    }

    #[test]
    fn request_fields_override_config() {
        let config = PackingConfig::default();
        let validated = request(
            r#"{
                "item": [1, 2, 3],
                "container": [10, 10, 10],
                "outer": [100, 100, 100],
                "mode": "orientationSearch",
                "rotate_container": true,
                "product_name": "Mugs"
            }"#,
        )
        .into_validated(&config)
        .expect("Should validate successfully");
        assert_eq!(validated.request.mode, EnumerationMode::OrientationSearch);
        assert!(validated.request.rotate_container);
        assert!(validated.request.outer.is_some());
        assert_eq!(validated.product_name, "Mugs");
    }

    #[test]
    fn invalid_numbers_are_rejected_before_computation() {
        let config = PackingConfig::default();
        let cases = [
            (
                r#"{"item": [0, 2, 3], "container": [10, 10, 10]}"#,
                "Invalid dimension",
            ),
            (
                r#"{"item": [1, 2, 3], "container": [10, -1, 10]}"#,
                "Invalid dimension",
            ),
            (
                r#"{"item": [1, 2, 3], "container": [10, 10, 10], "item_unit_weight": 0}"#,
                "Invalid weight",
            ),
            (
                r#"{"item": [1, 2, 3], "container": [10, 10, 10], "container_unit_price": -4}"#,
                "Invalid price",
            ),
        ];
        for (json, expected) in cases {
            let err = request(json).into_validated(&config).unwrap_err();
            assert!(err.to_string().starts_with(expected), "{json}: {err}");
        }
    }

    #[tokio::test]
    async fn pack_endpoint_reports_two_level_totals() {
        let response = handle_pack(
            State(state()),
            Ok(Json(request(
                r#"{
                    "item": [130, 40, 194],
                    "container": [600, 400, 300],
                    "outer": [1200, 800, 1800],
                    "mode": "exhaustive"
                }"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["feasible"], true);
        assert_eq!(body["units_per_container"], 40);
        assert_eq!(body["containers_per_outer"], 24);
        assert_eq!(body["per_layer"], 4);
        assert_eq!(body["layers"], 6);
        assert_eq!(body["total_units"], 960);
        assert_eq!(body["variants"].as_array().map(Vec::len), Some(40));
        assert_eq!(body["best_layout"]["x"], 4);
        assert_eq!(body["leftover_space"]["z"], 106.0);
        let utilization = body["container_utilization"].as_f64().unwrap();
        assert!((utilization - 56.04).abs() < 0.01, "{utilization}");
        assert!(body.get("total_weight").is_none());
    }

    #[tokio::test]
    async fn pack_endpoint_reports_infeasible_without_numbers() {
        let response = handle_pack(
            State(state()),
            Ok(Json(request(
                r#"{"item": [700, 500, 400], "container": [600, 400, 300]}"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["feasible"], false);
        assert_eq!(body["infeasible_level"], "container");
        assert!(body.get("total_units").is_none());
        assert!(body.get("units_per_container").is_none());
        assert!(body.get("best_layout").is_none());
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_invalid_dimensions() {
        let response = handle_pack(
            State(state()),
            Ok(Json(request(
                r#"{"item": [0, 40, 194], "container": [600, 400, 300]}"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid input data");
    }

    #[tokio::test]
    async fn pack_endpoint_rejects_runaway_enumeration() {
        let state = ApiState {
            optimizer_config: OptimizerConfig::new(
                PackingConfig::builder().max_variants(5).build(),
            ),
        };
        let response = handle_pack(
            State(state),
            Ok(Json(request(
                r#"{"item": [1, 1, 1], "container": [10, 10, 10], "mode": "exhaustive"}"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Request exceeds computation bounds");
    }

    #[tokio::test]
    async fn export_endpoint_returns_rows() {
        let response = handle_export(
            State(state()),
            Ok(Json(request(
                r#"{
                    "item": [130, 40, 194],
                    "container": [600, 400, 300],
                    "product_name": "Tea box"
                }"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["file_prefix"], "packing_Tea_box_V5_units63");
        assert_eq!(body["variant_rows"].as_array().map(Vec::len), Some(1));
    }

    #[tokio::test]
    async fn export_endpoint_refuses_infeasible_outcome() {
        let response = handle_export(
            State(state()),
            Ok(Json(request(
                r#"{"item": [700, 500, 400], "container": [600, 400, 300]}"#,
            ))),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Nothing to export");
    }

    #[test]
    fn not_computed_outcome_is_not_reported_as_zero_units() {
        let response = PackResponse::from_outcome(&PackOutcome::NotComputed);
        assert!(!response.feasible);
        assert!(response.total_units.is_none());
        assert!(response.infeasible_level.is_none());
    }
}
