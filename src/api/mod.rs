use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::ServerConfig;
use crate::core::{
    MonetaryUnit, ValuationError, ValuationInputs, ValuationResult, calculate, normalize_inputs,
};

const DEFAULT_TAX_RATE: f64 = 0.25;
const DEFAULT_GROWTH_PERIOD_YEARS: u32 = 10;
const DEFAULT_TERMINAL_GROWTH_RATE: f64 = 0.05;
const DEFAULT_SALES_TO_CAPITAL_RATIO: f64 = 1.5;
const DEFAULT_RISK_FREE_RATE: f64 = 0.072;
const DEFAULT_BETA: f64 = 1.0;
const DEFAULT_EQUITY_RISK_PREMIUM: f64 = 0.07;
const DEFAULT_COST_OF_DEBT: f64 = 0.09;
const DEFAULT_DEBT_TO_CAPITAL_RATIO: f64 = 0.20;

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum CliMonetaryUnit {
    Crore,
    Absolute,
}

impl From<CliMonetaryUnit> for MonetaryUnit {
    fn from(value: CliMonetaryUnit) -> Self {
        match value {
            CliMonetaryUnit::Crore => MonetaryUnit::Crore,
            CliMonetaryUnit::Absolute => MonetaryUnit::Absolute,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CalculatePayload {
    unit: Option<MonetaryUnit>,
    normalize: Option<bool>,

    current_revenue: Option<f64>,
    current_ebit: Option<f64>,
    tax_rate: Option<f64>,
    cash_and_equivalents: Option<f64>,
    total_debt: Option<f64>,

    growth_period_years: Option<u32>,
    revenue_growth_rate: Option<f64>,
    terminal_growth_rate: Option<f64>,

    target_operating_margin: Option<f64>,
    sales_to_capital_ratio: Option<f64>,

    risk_free_rate: Option<f64>,
    beta: Option<f64>,
    equity_risk_premium: Option<f64>,
    cost_of_debt: Option<f64>,
    debt_to_capital_ratio: Option<f64>,

    shares_outstanding: Option<f64>,
}

/// Flags for a one-off valuation from the command line. Rates are entered
/// in percent, amounts in the selected unit.
#[derive(Args, Debug, Clone)]
pub struct ValueArgs {
    #[arg(long, value_enum, default_value_t = CliMonetaryUnit::Crore)]
    unit: CliMonetaryUnit,
    #[arg(
        long,
        help = "Skip the raw-currency magnitude correction on revenue, EBIT, cash and debt"
    )]
    no_normalize: bool,
    #[arg(long, allow_negative_numbers = true)]
    current_revenue: f64,
    #[arg(long, allow_negative_numbers = true)]
    current_ebit: f64,
    #[arg(long, default_value_t = 25.0, help = "Effective tax rate in percent")]
    tax_rate: f64,
    #[arg(long, default_value_t = 0.0)]
    cash_and_equivalents: f64,
    #[arg(long, default_value_t = 0.0)]
    total_debt: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_GROWTH_PERIOD_YEARS,
        help = "Length of the explicit projection horizon in years"
    )]
    growth_period_years: u32,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "Annual revenue growth during the horizon in percent"
    )]
    revenue_growth_rate: f64,
    #[arg(
        long,
        default_value_t = 5.0,
        allow_negative_numbers = true,
        help = "Perpetual growth after the horizon in percent"
    )]
    terminal_growth_rate: f64,
    #[arg(
        long,
        allow_negative_numbers = true,
        help = "EBIT/revenue reached at the end of the horizon in percent"
    )]
    target_operating_margin: f64,
    #[arg(long, default_value_t = DEFAULT_SALES_TO_CAPITAL_RATIO)]
    sales_to_capital_ratio: f64,
    #[arg(long, default_value_t = 7.2, help = "Risk-free rate in percent")]
    risk_free_rate: f64,
    #[arg(long, default_value_t = DEFAULT_BETA, allow_negative_numbers = true)]
    beta: f64,
    #[arg(long, default_value_t = 7.0, help = "Equity risk premium in percent")]
    equity_risk_premium: f64,
    #[arg(long, default_value_t = 9.0, help = "Pre-tax cost of debt in percent")]
    cost_of_debt: f64,
    #[arg(long, default_value_t = 20.0, help = "Target debt to capital in percent")]
    debt_to_capital_ratio: f64,
    #[arg(long, help = "Absolute number of shares outstanding")]
    shares_outstanding: f64,
}

#[derive(Debug)]
struct ApiRequest {
    inputs: ValuationInputs,
    normalized: bool,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    message: &'static str,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
    kind: &'static str,
}

/// Runs the valuation described by CLI flags.
pub fn value_from_args(args: ValueArgs) -> Result<ValuationResult, ValuationError> {
    let request = prepare_inputs(build_inputs(&args), !args.no_normalize)?;
    calculate(&request.inputs)
}

fn build_inputs(args: &ValueArgs) -> ValuationInputs {
    ValuationInputs {
        unit: args.unit.into(),
        current_revenue: args.current_revenue,
        current_ebit: args.current_ebit,
        tax_rate: args.tax_rate / 100.0,
        cash_and_equivalents: args.cash_and_equivalents,
        total_debt: args.total_debt,
        growth_period_years: args.growth_period_years,
        revenue_growth_rate: args.revenue_growth_rate / 100.0,
        terminal_growth_rate: args.terminal_growth_rate / 100.0,
        target_operating_margin: args.target_operating_margin / 100.0,
        sales_to_capital_ratio: args.sales_to_capital_ratio,
        risk_free_rate: args.risk_free_rate / 100.0,
        beta: args.beta,
        equity_risk_premium: args.equity_risk_premium / 100.0,
        cost_of_debt: args.cost_of_debt / 100.0,
        debt_to_capital_ratio: args.debt_to_capital_ratio / 100.0,
        shares_outstanding: args.shares_outstanding,
    }
}

/// The magnitude correction assumes crores, so it only runs for that unit.
fn prepare_inputs(inputs: ValuationInputs, normalize: bool) -> Result<ApiRequest, ValuationError> {
    let normalized = normalize && inputs.unit == MonetaryUnit::Crore;
    let inputs = if normalized {
        normalize_inputs(&inputs)
    } else {
        inputs
    };
    inputs.validate()?;
    Ok(ApiRequest { inputs, normalized })
}

fn required(value: Option<f64>, field: &'static str) -> Result<f64, ValuationError> {
    value.ok_or_else(|| ValuationError::invalid(field, "is required"))
}

#[cfg(test)]
fn api_request_from_json(json: &str) -> Result<ApiRequest, String> {
    let payload = serde_json::from_str::<CalculatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    api_request_from_payload(payload).map_err(|e| e.to_string())
}

fn api_request_from_payload(payload: CalculatePayload) -> Result<ApiRequest, ValuationError> {
    let inputs = ValuationInputs {
        unit: payload.unit.unwrap_or_default(),
        current_revenue: required(payload.current_revenue, "current_revenue")?,
        current_ebit: required(payload.current_ebit, "current_ebit")?,
        tax_rate: payload.tax_rate.unwrap_or(DEFAULT_TAX_RATE),
        cash_and_equivalents: payload.cash_and_equivalents.unwrap_or(0.0),
        total_debt: payload.total_debt.unwrap_or(0.0),
        growth_period_years: payload
            .growth_period_years
            .unwrap_or(DEFAULT_GROWTH_PERIOD_YEARS),
        revenue_growth_rate: required(payload.revenue_growth_rate, "revenue_growth_rate")?,
        terminal_growth_rate: payload
            .terminal_growth_rate
            .unwrap_or(DEFAULT_TERMINAL_GROWTH_RATE),
        target_operating_margin: required(
            payload.target_operating_margin,
            "target_operating_margin",
        )?,
        sales_to_capital_ratio: payload
            .sales_to_capital_ratio
            .unwrap_or(DEFAULT_SALES_TO_CAPITAL_RATIO),
        risk_free_rate: payload.risk_free_rate.unwrap_or(DEFAULT_RISK_FREE_RATE),
        beta: payload.beta.unwrap_or(DEFAULT_BETA),
        equity_risk_premium: payload
            .equity_risk_premium
            .unwrap_or(DEFAULT_EQUITY_RISK_PREMIUM),
        cost_of_debt: payload.cost_of_debt.unwrap_or(DEFAULT_COST_OF_DEBT),
        debt_to_capital_ratio: payload
            .debt_to_capital_ratio
            .unwrap_or(DEFAULT_DEBT_TO_CAPITAL_RATIO),
        shares_outstanding: required(payload.shares_outstanding, "shares_outstanding")?,
    };

    prepare_inputs(inputs, payload.normalize.unwrap_or(true))
}

pub fn build_router(config: &ServerConfig) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(
            "/calculate",
            get(calculate_get_handler).post(calculate_post_handler),
        )
        .fallback(not_found_handler)
        .layer(cors_layer(&config.allowed_origins))
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    let addr = config
        .socket_addr()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    let app = build_router(&config);

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "DCF valuation API listening");

    axum::serve(listener, app).await
}

async fn root_handler() -> Response {
    json_response(
        StatusCode::OK,
        StatusResponse {
            message: "DCF valuation service is running",
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found", "not_found")
}

async fn calculate_get_handler(
    payload: Result<Query<CalculatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => calculate_handler_impl(payload),
        Err(rejection) => rejected_payload(&rejection.body_text()),
    }
}

async fn calculate_post_handler(payload: Result<Json<CalculatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => calculate_handler_impl(payload),
        Err(rejection) => rejected_payload(&rejection.body_text()),
    }
}

fn calculate_handler_impl(payload: CalculatePayload) -> Response {
    let request = match api_request_from_payload(payload) {
        Ok(request) => request,
        Err(err) => return valuation_error_response(&err),
    };

    if request.normalized {
        tracing::debug!(
            current_revenue = request.inputs.current_revenue,
            current_ebit = request.inputs.current_ebit,
            cash_and_equivalents = request.inputs.cash_and_equivalents,
            total_debt = request.inputs.total_debt,
            "monetary inputs after normalization"
        );
    }

    match calculate(&request.inputs) {
        Ok(result) => {
            tracing::info!(
                wacc = result.wacc,
                enterprise_value = result.enterprise_value,
                share_price = result.share_price,
                years = result.projections.len(),
                "valuation computed"
            );
            json_response(StatusCode::OK, result)
        }
        Err(err) => valuation_error_response(&err),
    }
}

fn rejected_payload(detail: &str) -> Response {
    tracing::warn!(%detail, "malformed valuation request");
    error_response(
        StatusCode::BAD_REQUEST,
        &format!("Invalid request payload: {detail}"),
        "invalid_request",
    )
}

fn valuation_error_response(err: &ValuationError) -> Response {
    let status = if err.is_domain_error() {
        StatusCode::UNPROCESSABLE_ENTITY
    } else {
        StatusCode::BAD_REQUEST
    };
    tracing::warn!(error = %err, kind = err.kind(), "valuation rejected");
    error_response(status, &err.to_string(), err.kind())
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str, kind: &'static str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
            kind,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use clap::Parser;
    use tower::ServiceExt;

    const EPS: f64 = 1e-6;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        value: ValueArgs,
    }

    fn parse_value_args(extra: &[&str]) -> ValueArgs {
        let mut argv = vec![
            "dcf",
            "--current-revenue",
            "100",
            "--current-ebit",
            "100",
            "--revenue-growth-rate",
            "0",
            "--target-operating-margin",
            "100",
            "--shares-outstanding",
            "100000000",
        ];
        argv.extend_from_slice(extra);
        TestCli::try_parse_from(argv).expect("valid flags").value
    }

    const STEADY_STATE_JSON: &str = r#"{
        "current_revenue": 100.0,
        "current_ebit": 100.0,
        "tax_rate": 0.0,
        "growth_period_years": 5,
        "revenue_growth_rate": 0.0,
        "terminal_growth_rate": 0.0,
        "target_operating_margin": 1.0,
        "sales_to_capital_ratio": 1.0,
        "risk_free_rate": 0.10,
        "beta": 0.0,
        "equity_risk_premium": 0.0,
        "cost_of_debt": 0.0,
        "debt_to_capital_ratio": 0.0,
        "shares_outstanding": 100000000
    }"#;

    async fn send(request: Request<Body>) -> (StatusCode, Response) {
        let response = build_router(&ServerConfig::default())
            .oneshot(request)
            .await
            .expect("router is infallible");
        (response.status(), response)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    fn post_calculate(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/calculate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("valid request")
    }

    #[test]
    fn payload_defaults_fill_optional_fields() {
        let request = api_request_from_json(
            r#"{
                "current_revenue": 500.0,
                "current_ebit": 75.0,
                "revenue_growth_rate": 0.1,
                "target_operating_margin": 0.18,
                "shares_outstanding": 20000000
            }"#,
        )
        .expect("valid payload");

        let inputs = &request.inputs;
        assert_eq!(inputs.unit, MonetaryUnit::Crore);
        assert_approx(inputs.tax_rate, 0.25);
        assert_approx(inputs.cash_and_equivalents, 0.0);
        assert_eq!(inputs.growth_period_years, 10);
        assert_approx(inputs.terminal_growth_rate, 0.05);
        assert_approx(inputs.sales_to_capital_ratio, 1.5);
        assert_approx(inputs.risk_free_rate, 0.072);
        assert_approx(inputs.beta, 1.0);
        assert_approx(inputs.equity_risk_premium, 0.07);
        assert_approx(inputs.cost_of_debt, 0.09);
        assert_approx(inputs.debt_to_capital_ratio, 0.20);
        assert!(request.normalized);
    }

    #[test]
    fn payload_missing_required_field_is_rejected() {
        let err = api_request_from_json(r#"{"current_revenue": 1.0, "current_ebit": 1.0}"#)
            .expect_err("must reject missing fields");
        assert!(err.contains("revenue_growth_rate"));
    }

    #[test]
    fn raw_currency_amounts_are_rescaled_to_crores() {
        let request = api_request_from_json(
            r#"{
                "current_revenue": 2400000000000,
                "current_ebit": 600000000000,
                "cash_and_equivalents": 50.0,
                "total_debt": 30000000000,
                "revenue_growth_rate": 0.1,
                "target_operating_margin": 0.25,
                "shares_outstanding": 3650000000
            }"#,
        )
        .expect("valid payload");

        assert_approx(request.inputs.current_revenue, 240_000.0);
        assert_approx(request.inputs.current_ebit, 60_000.0);
        assert_approx(request.inputs.cash_and_equivalents, 50.0);
        assert_approx(request.inputs.total_debt, 3_000.0);
        assert_approx(request.inputs.shares_outstanding, 3_650_000_000.0);
    }

    #[test]
    fn normalization_is_skipped_for_absolute_units_or_on_request() {
        let request = api_request_from_json(
            r#"{
                "unit": "absolute",
                "current_revenue": 2400000000000,
                "current_ebit": 600000000000,
                "revenue_growth_rate": 0.1,
                "target_operating_margin": 0.25,
                "shares_outstanding": 3650000000
            }"#,
        )
        .expect("valid payload");
        assert!(!request.normalized);
        assert_approx(request.inputs.current_revenue, 2_400_000_000_000.0);

        let request = api_request_from_json(
            r#"{
                "normalize": false,
                "current_revenue": 2400000000000,
                "current_ebit": 600000000000,
                "revenue_growth_rate": 0.1,
                "target_operating_margin": 0.25,
                "shares_outstanding": 3650000000
            }"#,
        )
        .expect("valid payload");
        assert!(!request.normalized);
        assert_approx(request.inputs.current_ebit, 600_000_000_000.0);
    }

    #[test]
    fn value_args_convert_percent_flags_to_fractions() {
        let args = parse_value_args(&["--tax-rate", "0", "--terminal-growth-rate", "-1"]);
        let inputs = build_inputs(&args);
        assert_approx(inputs.tax_rate, 0.0);
        assert_approx(inputs.terminal_growth_rate, -0.01);
        assert_approx(inputs.target_operating_margin, 1.0);
        assert_approx(inputs.risk_free_rate, 0.072);
        assert_approx(inputs.debt_to_capital_ratio, 0.20);
        assert_eq!(inputs.unit, MonetaryUnit::Crore);
    }

    #[test]
    fn value_from_args_prices_steady_state_company() {
        let args = parse_value_args(&[
            "--tax-rate",
            "0",
            "--terminal-growth-rate",
            "0",
            "--growth-period-years",
            "5",
            "--risk-free-rate",
            "10",
            "--beta",
            "0",
            "--debt-to-capital-ratio",
            "0",
        ]);
        let result = value_from_args(args).expect("valid valuation");
        assert_approx(result.enterprise_value, 1_000.0);
        assert_approx(result.share_price, 100.0);
    }

    #[test]
    fn value_from_args_rejects_zero_shares() {
        let mut args = parse_value_args(&[]);
        args.shares_outstanding = 0.0;
        let err = value_from_args(args).expect_err("zero shares must fail");
        assert_eq!(err.kind(), "invalid_input");
    }

    #[tokio::test]
    async fn root_reports_service_status() {
        let (status, response) = send(
            Request::builder()
                .uri("/")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["message"], "DCF valuation service is running");
    }

    #[tokio::test]
    async fn post_calculate_returns_full_result() {
        let (status, response) = send(post_calculate(STEADY_STATE_JSON)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let body = body_json(response).await;
        let projections = body["projections"].as_array().expect("projection list");
        assert_eq!(projections.len(), 5);
        assert_eq!(projections[0]["year"], 1);
        assert!(projections[0].get("present_value_fcff").is_some());
        assert_approx(body["terminal_value"].as_f64().expect("number"), 1_000.0);
        assert_approx(body["enterprise_value"].as_f64().expect("number"), 1_000.0);
        assert_approx(body["share_price"].as_f64().expect("number"), 100.0);
        assert_approx(body["wacc"].as_f64().expect("number"), 0.10);
    }

    #[tokio::test]
    async fn get_calculate_accepts_query_string() {
        let uri = "/calculate?current_revenue=100&current_ebit=100&tax_rate=0\
                   &growth_period_years=5&revenue_growth_rate=0&terminal_growth_rate=0\
                   &target_operating_margin=1&risk_free_rate=0.1&beta=0\
                   &debt_to_capital_ratio=0&shares_outstanding=100000000";
        let (status, response) = send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(response).await;
        assert_approx(body["equity_value"].as_f64().expect("number"), 1_000.0);
    }

    #[tokio::test]
    async fn terminal_growth_equal_to_wacc_is_unprocessable() {
        let json = STEADY_STATE_JSON.replace(
            "\"terminal_growth_rate\": 0.0",
            "\"terminal_growth_rate\": 0.10",
        );
        let (status, response) = send(post_calculate(&json)).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "terminal_value_undefined");
    }

    #[tokio::test]
    async fn invalid_share_count_is_bad_request() {
        let json = STEADY_STATE_JSON.replace(
            "\"shares_outstanding\": 100000000",
            "\"shares_outstanding\": 0",
        );
        let (status, response) = send(post_calculate(&json)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_input");
        assert!(
            body["error"]
                .as_str()
                .expect("message")
                .contains("shares_outstanding")
        );
    }

    #[tokio::test]
    async fn oversized_horizon_is_bad_request() {
        let json = STEADY_STATE_JSON.replace(
            "\"growth_period_years\": 5",
            "\"growth_period_years\": 4294967295",
        );
        let (status, response) = send(post_calculate(&json)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_input");
        assert!(
            body["error"]
                .as_str()
                .expect("message")
                .contains("growth_period_years")
        );
    }

    #[tokio::test]
    async fn get_calculate_reads_unit_and_normalize_flags() {
        // 2.4e12 would be rescaled to 240,000 crore if normalization ran.
        let uri = "/calculate?unit=absolute&normalize=false\
                   &current_revenue=2400000000000&current_ebit=2400000000000&tax_rate=0\
                   &growth_period_years=5&revenue_growth_rate=0&terminal_growth_rate=0\
                   &target_operating_margin=1&risk_free_rate=0.1&beta=0\
                   &debt_to_capital_ratio=0&shares_outstanding=100000000";
        let (status, response) = send(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let body = body_json(response).await;
        let projections = body["projections"].as_array().expect("projection list");
        assert_approx(
            projections[0]["revenue"].as_f64().expect("number"),
            2_400_000_000_000.0,
        );
        let equity_value = body["equity_value"].as_f64().expect("number");
        assert!((equity_value - 24_000_000_000_000.0).abs() <= 1e-9 * 24_000_000_000_000.0);
        let share_price = body["share_price"].as_f64().expect("number");
        assert!((share_price - 240_000.0).abs() <= 1e-6);
    }

    #[tokio::test]
    async fn malformed_json_gets_json_error_body() {
        let (status, response) = send(post_calculate("{not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "invalid_request");
    }

    #[tokio::test]
    async fn unknown_route_is_not_found() {
        let (status, response) = send(
            Request::builder()
                .uri("/api/search/TCS")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["kind"], "not_found");
    }

    #[tokio::test]
    async fn cors_allows_any_origin_by_default() {
        let (status, response) = send(
            Request::builder()
                .uri("/")
                .header(header::ORIGIN, "http://localhost:5173")
                .body(Body::empty())
                .expect("valid request"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("*"))
        );
    }

    #[tokio::test]
    async fn cors_echoes_configured_origin_only() {
        let config = ServerConfig {
            allowed_origins: vec!["http://localhost:5173".to_string()],
            ..ServerConfig::default()
        };
        let response = build_router(&config)
            .oneshot(
                Request::builder()
                    .uri("/")
                    .header(header::ORIGIN, "http://localhost:5173")
                    .body(Body::empty())
                    .expect("valid request"),
            )
            .await
            .expect("router is infallible");
        assert_eq!(
            response.headers().get(header::ACCESS_CONTROL_ALLOW_ORIGIN),
            Some(&HeaderValue::from_static("http://localhost:5173"))
        );
    }
}
