mod error;

use axum::{
    Router,
    extract::{
        Json, Query,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tokio::net::TcpListener;

use crate::core::{ProjectionInput, ValidationError, YearRecord, project};

pub use error::{ApiError, ApiResult};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

/// A submitted field. Form posts and query strings deliver text, JSON clients
/// may send real numbers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
enum FieldValue {
    Number(f64),
    Text(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ProjectPayload {
    currency: Option<String>,
    initial_amount: Option<FieldValue>,
    monthly_contribution: Option<FieldValue>,
    interest_rate: Option<FieldValue>,
    inflation_rate: Option<FieldValue>,
    current_age: Option<FieldValue>,
    retirement_age: Option<FieldValue>,
    monthly_withdrawal: Option<FieldValue>,
    percentage_increase_monthly_contribution: Option<FieldValue>,
}

/// Body returned for a successful projection. The three series feed the
/// chart and skip the advisory row.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectResponse {
    pub currency: String,
    pub records: Vec<YearRecord>,
    pub labels: Vec<u32>,
    pub total_savings: Vec<String>,
    pub withdrawals: Vec<String>,
}

impl ProjectResponse {
    pub fn new(currency: String, records: Vec<YearRecord>) -> Self {
        let years = || records.iter().filter(|r| !r.is_advisory());
        let labels = years().filter_map(|r| r.age).collect();
        let total_savings = years().map(|r| r.total_savings.clone()).collect();
        let withdrawals = years().map(|r| r.withdrawal.clone()).collect();
        Self {
            currency,
            labels,
            total_savings,
            withdrawals,
            records,
        }
    }
}

pub async fn run_http_server(addr: SocketAddr) -> std::io::Result<()> {
    let app = router();

    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "savings projection server listening");
    tracing::info!("local access: http://127.0.0.1:{}/", addr.port());

    axum::serve(listener, app).await
}

fn router() -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/project",
            get(project_get_handler).post(project_post_handler),
        )
        .fallback(not_found_handler)
}

async fn index_handler() -> impl IntoResponse {
    with_cache_control(Html(INDEX_HTML))
}

async fn styles_handler() -> impl IntoResponse {
    with_cache_control((
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        STYLES_CSS,
    ))
}

async fn app_js_handler() -> impl IntoResponse {
    with_cache_control((
        [(
            header::CONTENT_TYPE,
            "application/javascript; charset=utf-8",
        )],
        APP_JS,
    ))
}

async fn not_found_handler() -> Response {
    ApiError::NotFound.into_response()
}

async fn project_get_handler(payload: Result<Query<ProjectPayload>, QueryRejection>) -> Response {
    match payload {
        Ok(Query(payload)) => project_handler_impl(payload).await,
        Err(rejection) => reject(ApiError::MalformedRequest(rejection.body_text())),
    }
}

async fn project_post_handler(payload: Result<Json<ProjectPayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => project_handler_impl(payload).await,
        Err(rejection) => reject(ApiError::MalformedRequest(rejection.body_text())),
    }
}

async fn project_handler_impl(payload: ProjectPayload) -> Response {
    match run_projection(payload) {
        Ok(response) => json_response(StatusCode::OK, response),
        Err(err) => reject(err),
    }
}

fn run_projection(payload: ProjectPayload) -> ApiResult<ProjectResponse> {
    let input = input_from_payload(payload)?;
    let records = project(&input)?;
    tracing::debug!(
        current_age = input.current_age,
        retirement_age = input.retirement_age,
        rows = records.len(),
        "projection complete"
    );
    Ok(ProjectResponse::new(input.currency, records))
}

fn reject(err: ApiError) -> Response {
    tracing::warn!(kind = err.kind(), error = %err, "projection request rejected");
    err.into_response()
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn input_from_payload(payload: ProjectPayload) -> Result<ProjectionInput, ValidationError> {
    Ok(ProjectionInput {
        currency: payload
            .currency
            .map(|c| c.trim().to_string())
            .unwrap_or_default(),
        initial_amount: required_amount("initialAmount", payload.initial_amount)?,
        monthly_contribution: required_amount(
            "monthlyContribution",
            payload.monthly_contribution,
        )?,
        interest_rate: required_amount("interestRate", payload.interest_rate)?,
        inflation_rate: required_amount("inflationRate", payload.inflation_rate)?,
        current_age: required_age("currentAge", payload.current_age)?,
        retirement_age: required_age("retirementAge", payload.retirement_age)?,
        monthly_withdrawal: required_amount("monthlyWithdrawal", payload.monthly_withdrawal)?,
        contribution_growth_rate: required_amount(
            "percentageIncreaseMonthlyContribution",
            payload.percentage_increase_monthly_contribution,
        )?,
    })
}

fn required_amount(
    field: &'static str,
    value: Option<FieldValue>,
) -> Result<f64, ValidationError> {
    let number = match value {
        None => return Err(ValidationError::Missing { field }),
        Some(FieldValue::Number(number)) => number,
        Some(FieldValue::Text(text)) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                return Err(ValidationError::Missing { field });
            }
            trimmed
                .parse::<f64>()
                .map_err(|_| ValidationError::NotNumeric {
                    field,
                    value: text.clone(),
                })?
        }
    };

    // "inf" and "NaN" parse as f64 but are not amounts anyone can enter.
    if !number.is_finite() {
        return Err(ValidationError::NotNumeric {
            field,
            value: number.to_string(),
        });
    }
    Ok(number)
}

fn required_age(field: &'static str, value: Option<FieldValue>) -> Result<i64, ValidationError> {
    let years = required_amount(field, value)?;
    if years.fract() != 0.0 {
        return Err(ValidationError::NotWholeYears { field });
    }
    // Saturating cast; anything this large is rejected by the age range check.
    Ok(years as i64)
}

#[cfg(test)]
fn input_from_json(json: &str) -> Result<ProjectionInput, ApiError> {
    let payload = serde_json::from_str::<ProjectPayload>(json)
        .map_err(|e| ApiError::MalformedRequest(format!("Invalid API JSON payload: {e}")))?;
    Ok(input_from_payload(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{MAX_AGE_NOTE, ProjectionError};
    use axum::http::Uri;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_payload() -> ProjectPayload {
        let number = |v: f64| Some(FieldValue::Number(v));
        ProjectPayload {
            currency: Some("USD".to_string()),
            initial_amount: number(1_000.0),
            monthly_contribution: number(0.0),
            interest_rate: number(0.0),
            inflation_rate: number(0.0),
            current_age: number(30.0),
            retirement_age: number(31.0),
            monthly_withdrawal: number(0.0),
            percentage_increase_monthly_contribution: number(0.0),
        }
    }

    fn validation_error(result: Result<ProjectionInput, ValidationError>) -> ValidationError {
        result.expect_err("payload must be rejected")
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");
        serde_json::from_slice(&bytes).expect("json body")
    }

    #[test]
    fn input_from_json_parses_numbers_and_numeric_strings() {
        let json = r#"{
          "currency": " EUR ",
          "initialAmount": "2500.50",
          "monthlyContribution": 300,
          "interestRate": "7",
          "inflationRate": 2.5,
          "currentAge": "35",
          "retirementAge": 67,
          "monthlyWithdrawal": " 1800 ",
          "percentageIncreaseMonthlyContribution": "3"
        }"#;
        let input = input_from_json(json).expect("json should parse");

        assert_eq!(input.currency, "EUR");
        assert_approx(input.initial_amount, 2_500.5);
        assert_approx(input.monthly_contribution, 300.0);
        assert_approx(input.interest_rate, 7.0);
        assert_approx(input.inflation_rate, 2.5);
        assert_eq!(input.current_age, 35);
        assert_eq!(input.retirement_age, 67);
        assert_approx(input.monthly_withdrawal, 1_800.0);
        assert_approx(input.contribution_growth_rate, 3.0);
    }

    #[test]
    fn query_string_fields_are_parsed_as_text() {
        let uri: Uri = "/api/project?currency=GBP&initialAmount=100&monthlyContribution=10\
            &interestRate=5&inflationRate=1&currentAge=40&retirementAge=60\
            &monthlyWithdrawal=250&percentageIncreaseMonthlyContribution=0"
            .parse()
            .expect("valid uri");
        let Query(payload) = Query::<ProjectPayload>::try_from_uri(&uri).expect("query parses");
        assert_eq!(
            payload.initial_amount,
            Some(FieldValue::Text("100".to_string()))
        );

        let input = input_from_payload(payload).expect("valid input");
        assert_eq!(input.currency, "GBP");
        assert_eq!(input.current_age, 40);
        assert_eq!(input.retirement_age, 60);
        assert_approx(input.monthly_withdrawal, 250.0);
    }

    #[test]
    fn missing_and_blank_fields_are_required() {
        let mut payload = sample_payload();
        payload.interest_rate = None;
        assert_eq!(
            validation_error(input_from_payload(payload)),
            ValidationError::Missing {
                field: "interestRate"
            }
        );

        let mut payload = sample_payload();
        payload.monthly_withdrawal = Some(FieldValue::Text("   ".to_string()));
        assert_eq!(
            validation_error(input_from_payload(payload)),
            ValidationError::Missing {
                field: "monthlyWithdrawal"
            }
        );
    }

    #[test]
    fn missing_currency_defaults_to_empty_label() {
        let mut payload = sample_payload();
        payload.currency = None;
        let input = input_from_payload(payload).expect("currency is optional");
        assert_eq!(input.currency, "");
    }

    #[test]
    fn non_numeric_fields_are_rejected() {
        let mut payload = sample_payload();
        payload.initial_amount = Some(FieldValue::Text("lots".to_string()));
        assert_eq!(
            validation_error(input_from_payload(payload)),
            ValidationError::NotNumeric {
                field: "initialAmount",
                value: "lots".to_string(),
            }
        );

        let mut payload = sample_payload();
        payload.interest_rate = Some(FieldValue::Text("inf".to_string()));
        assert!(matches!(
            validation_error(input_from_payload(payload)),
            ValidationError::NotNumeric {
                field: "interestRate",
                ..
            }
        ));
    }

    #[test]
    fn fractional_ages_are_rejected() {
        let mut payload = sample_payload();
        payload.current_age = Some(FieldValue::Text("30.5".to_string()));
        assert_eq!(
            validation_error(input_from_payload(payload)),
            ValidationError::NotWholeYears {
                field: "currentAge"
            }
        );
    }

    #[test]
    fn malformed_json_is_reported() {
        let err = input_from_json("{\"currentAge\": [1]}").expect_err("must reject array");
        assert!(matches!(err, ApiError::MalformedRequest(_)));
    }

    #[test]
    fn project_response_serializes_records_and_chart_series() {
        let input = input_from_payload(sample_payload()).expect("valid input");
        let records = project(&input).expect("valid projection");
        let response = ProjectResponse::new(input.currency, records);

        let json = serde_json::to_value(&response).expect("response should serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "currency": "USD",
                "records": [{
                    "age": 31,
                    "totalInvested": "1000.00",
                    "totalSavings": "1000.00",
                    "withdrawal": "0.00",
                    "currency": "USD"
                }],
                "labels": [31],
                "totalSavings": ["1000.00"],
                "withdrawals": ["0.00"]
            })
        );
    }

    #[test]
    fn chart_series_skip_advisory_row() {
        let mut payload = sample_payload();
        payload.current_age = Some(FieldValue::Number(110.0));
        payload.retirement_age = Some(FieldValue::Number(111.0));
        payload.interest_rate = Some(FieldValue::Number(5.0));
        payload.monthly_withdrawal = Some(FieldValue::Number(1.0));

        let response = run_projection(payload).expect("valid projection");
        assert_eq!(response.records.len(), 14);
        assert_eq!(response.labels.len(), 13);
        assert_eq!(response.labels.last(), Some(&123));
        assert_eq!(response.total_savings.len(), 13);
        assert_eq!(response.withdrawals.len(), 13);
        assert_eq!(
            response.records.last().and_then(|r| r.note.as_deref()),
            Some(MAX_AGE_NOTE)
        );
    }

    #[test]
    fn run_projection_surfaces_engine_errors() {
        let mut payload = sample_payload();
        payload.current_age = Some(FieldValue::Number(70.0));
        payload.retirement_age = Some(FieldValue::Number(65.0));
        let err = run_projection(payload).expect_err("must reject");
        assert!(matches!(
            err,
            ApiError::Projection(ProjectionError::Validation(
                ValidationError::RetirementNotAfterCurrent { .. }
            ))
        ));
    }

    #[tokio::test]
    async fn handler_returns_ok_json_with_no_store() {
        let response = project_handler_impl(sample_payload()).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&header::HeaderValue::from_static("no-store"))
        );

        let json = body_json(response).await;
        assert_eq!(json["records"][0]["age"], 31);
        assert_eq!(json["labels"], serde_json::json!([31]));
    }

    #[tokio::test]
    async fn handler_maps_validation_error_to_bad_request() {
        let mut payload = sample_payload();
        payload.current_age = Some(FieldValue::Number(70.0));
        payload.retirement_age = Some(FieldValue::Number(65.0));

        let response = project_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let json = body_json(response).await;
        assert_eq!(
            json,
            serde_json::json!({
                "error": "Retirement age must be greater than current age",
                "kind": "validation"
            })
        );
    }

    #[tokio::test]
    async fn handler_maps_overflow_to_unprocessable_entity() {
        let mut payload = sample_payload();
        payload.interest_rate = Some(FieldValue::Number(1e308));

        let response = project_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = body_json(response).await;
        assert_eq!(json["kind"], "overflow");
    }

    #[tokio::test]
    async fn unknown_routes_return_json_not_found() {
        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = body_json(response).await;
        assert_eq!(json["error"], "Not found");
    }
}
