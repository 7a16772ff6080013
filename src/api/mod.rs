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
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};

mod error;

pub use error::{CliError, InputError};

use crate::core::{
    CapitalPoint, CostPoint, FinancialProfile, PlanSummary, ScenarioRow, SimulationResult,
    scenario_rows, simulate, summarize,
};

const CURRENT_AGE_RANGE: (u32, u32) = (0, 100);
const DEATH_AGE_RANGE: (u32, u32) = (50, 120);

const DEFAULT_CURRENT_AGE: u32 = 30;
const DEFAULT_STARTING_CAPITAL: f64 = 300_000.0;
const DEFAULT_MONTHLY_CONTRIBUTION: f64 = 5_000.0;
const DEFAULT_ANNUAL_RETURN: f64 = 6.0;
const DEFAULT_INFLATION_RATE: f64 = 3.0;
const DEFAULT_MONTHLY_SPEND: f64 = 12_000.0;
const DEFAULT_DEATH_AGE: u32 = 90;

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct SimulatePayload {
    current_age: Option<u32>,
    starting_capital: Option<f64>,
    monthly_contribution: Option<f64>,
    annual_return: Option<f64>,
    inflation_rate: Option<f64>,
    monthly_spend: Option<f64>,
    death_age: Option<u32>,
}

#[derive(Parser, Debug)]
#[command(
    name = "fire_age",
    about = "Earliest retirement age that keeps capital positive until death"
)]
struct Cli {
    #[arg(long, default_value_t = DEFAULT_CURRENT_AGE, help = "Current age, 0-100")]
    current_age: u32,
    #[arg(long, default_value_t = DEFAULT_STARTING_CAPITAL)]
    starting_capital: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_CONTRIBUTION,
        help = "Monthly investment until retirement, grown with inflation"
    )]
    monthly_contribution: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_ANNUAL_RETURN,
        help = "Expected annual investment return in percent, e.g. 6"
    )]
    annual_return: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_INFLATION_RATE,
        help = "Expected annual inflation in percent"
    )]
    inflation_rate: f64,
    #[arg(
        long,
        default_value_t = DEFAULT_MONTHLY_SPEND,
        help = "Monthly spending in retirement (today's money)"
    )]
    monthly_spend: f64,
    #[arg(long, default_value_t = DEFAULT_DEATH_AGE, help = "Age to fund through, 50-120")]
    death_age: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SimulateResponse {
    feasible: bool,
    retirement_age: Option<u32>,
    capital_at_death: Option<f64>,
    summary: Option<PlanSummary>,
    scenarios: Vec<ScenarioRow>,
    capital_timeline: Vec<CapitalPoint>,
    cost_timeline: Vec<CostPoint>,
    profile: FinancialProfile,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

fn build_profile(cli: Cli) -> Result<FinancialProfile, InputError> {
    check_age("--current-age", cli.current_age, CURRENT_AGE_RANGE)?;
    check_age("--death-age", cli.death_age, DEATH_AGE_RANGE)?;

    check_amount("--starting-capital", cli.starting_capital)?;
    check_amount("--monthly-contribution", cli.monthly_contribution)?;
    check_amount("--annual-return", cli.annual_return)?;
    check_amount("--inflation-rate", cli.inflation_rate)?;
    check_amount("--monthly-spend", cli.monthly_spend)?;

    Ok(FinancialProfile {
        current_age: cli.current_age,
        starting_capital: cli.starting_capital,
        monthly_contribution: cli.monthly_contribution,
        annual_return_rate: cli.annual_return / 100.0,
        annual_inflation_rate: cli.inflation_rate / 100.0,
        monthly_retirement_spend: cli.monthly_spend,
        death_age: cli.death_age,
    })
}

fn check_age(flag: &'static str, value: u32, (min, max): (u32, u32)) -> Result<(), InputError> {
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(InputError::AgeOutOfRange {
            flag,
            min,
            max,
            value,
        })
    }
}

fn check_amount(flag: &'static str, value: f64) -> Result<(), InputError> {
    if !value.is_finite() {
        return Err(InputError::NotFinite { flag });
    }
    if value < 0.0 {
        return Err(InputError::Negative { flag });
    }
    Ok(())
}

/// Parses `simulate` arguments (the first item is treated as the program name),
/// runs the search and returns the pretty-printed JSON response.
pub fn run_cli<I, T>(args: I) -> Result<String, CliError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = Cli::try_parse_from(args)?;
    let profile = build_profile(cli)?;
    let result = simulate(&profile);
    log_outcome(&result);
    let response = build_simulate_response(profile, result);
    Ok(serde_json::to_string_pretty(&response)?)
}

pub fn router() -> Router {
    Router::new()
        .route("/api/health", get(health_handler))
        .route(
            "/api/simulate",
            get(simulate_get_handler).post(simulate_post_handler),
        )
        .fallback(not_found_handler)
}

pub async fn run_http_server(port: u16) -> std::io::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("retirement age API listening on http://{addr}");
    info!("local access: http://127.0.0.1:{port}/api/simulate");
    axum::serve(listener, router()).await
}

async fn health_handler() -> Response {
    json_response(StatusCode::OK, HealthResponse { status: "ok" })
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn simulate_get_handler(
    payload: Result<Query<SimulatePayload>, QueryRejection>,
) -> Response {
    match payload {
        Ok(Query(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected simulate query");
            error_response(StatusCode::BAD_REQUEST, &rejection.body_text())
        }
    }
}

async fn simulate_post_handler(payload: Result<Json<SimulatePayload>, JsonRejection>) -> Response {
    match payload {
        Ok(Json(payload)) => simulate_handler_impl(payload).await,
        Err(rejection) => {
            warn!(error = %rejection.body_text(), "rejected simulate body");
            error_response(StatusCode::BAD_REQUEST, &rejection.body_text())
        }
    }
}

async fn simulate_handler_impl(payload: SimulatePayload) -> Response {
    let profile = match profile_from_payload(payload) {
        Ok(profile) => profile,
        Err(err) => {
            warn!(error = %err, "rejected simulate request");
            return error_response(StatusCode::BAD_REQUEST, &err.to_string());
        }
    };

    let result = simulate(&profile);
    log_outcome(&result);
    json_response(StatusCode::OK, build_simulate_response(profile, result))
}

fn log_outcome(result: &SimulationResult) {
    match result.retirement_age {
        Some(age) => info!(
            retirement_age = age,
            failed_candidates = result.infeasible_scenarios.len(),
            "retirement age found"
        ),
        None => info!("no feasible retirement age"),
    }
}

fn with_cache_control(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)).into_response())
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

#[cfg(test)]
fn profile_from_json(json: &str) -> Result<FinancialProfile, String> {
    let payload = serde_json::from_str::<SimulatePayload>(json)
        .map_err(|e| format!("Invalid API JSON payload: {e}"))?;
    profile_from_payload(payload).map_err(|e| e.to_string())
}

fn profile_from_payload(payload: SimulatePayload) -> Result<FinancialProfile, InputError> {
    let mut cli = default_cli_for_api();

    if let Some(v) = payload.current_age {
        cli.current_age = v;
    }
    if let Some(v) = payload.starting_capital {
        cli.starting_capital = v;
    }
    if let Some(v) = payload.monthly_contribution {
        cli.monthly_contribution = v;
    }
    if let Some(v) = payload.annual_return {
        cli.annual_return = v;
    }
    if let Some(v) = payload.inflation_rate {
        cli.inflation_rate = v;
    }
    if let Some(v) = payload.monthly_spend {
        cli.monthly_spend = v;
    }
    if let Some(v) = payload.death_age {
        cli.death_age = v;
    }

    build_profile(cli)
}

fn default_cli_for_api() -> Cli {
    Cli {
        current_age: DEFAULT_CURRENT_AGE,
        starting_capital: DEFAULT_STARTING_CAPITAL,
        monthly_contribution: DEFAULT_MONTHLY_CONTRIBUTION,
        annual_return: DEFAULT_ANNUAL_RETURN,
        inflation_rate: DEFAULT_INFLATION_RATE,
        monthly_spend: DEFAULT_MONTHLY_SPEND,
        death_age: DEFAULT_DEATH_AGE,
    }
}

fn build_simulate_response(
    profile: FinancialProfile,
    result: SimulationResult,
) -> SimulateResponse {
    let summary = summarize(&profile, &result);
    let scenarios = scenario_rows(&result);
    SimulateResponse {
        feasible: result.is_feasible(),
        retirement_age: result.retirement_age,
        capital_at_death: result.capital_at_death,
        summary,
        scenarios,
        capital_timeline: result.capital_timeline,
        cost_timeline: result.cost_timeline,
        profile,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    const EPS: f64 = 1e-9;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() <= EPS,
            "expected {expected}, got {actual}"
        );
    }

    fn sample_cli() -> Cli {
        default_cli_for_api()
    }

    async fn body_json(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body should be readable");
        serde_json::from_slice(&bytes).expect("body should be JSON")
    }

    #[test]
    fn build_profile_converts_percentages_to_fractions() {
        let mut cli = sample_cli();
        cli.annual_return = 6.5;
        cli.inflation_rate = 2.0;
        let profile = build_profile(cli).expect("valid inputs");
        assert_approx(profile.annual_return_rate, 0.065);
        assert_approx(profile.annual_inflation_rate, 0.02);
        assert_approx(profile.starting_capital, DEFAULT_STARTING_CAPITAL);
    }

    #[test]
    fn build_profile_rejects_current_age_above_range() {
        let mut cli = sample_cli();
        cli.current_age = 101;
        let err = build_profile(cli).expect_err("must reject age > 100");
        assert_eq!(
            err,
            InputError::AgeOutOfRange {
                flag: "--current-age",
                min: 0,
                max: 100,
                value: 101
            }
        );
        assert!(err.to_string().contains("--current-age"));
    }

    #[test]
    fn build_profile_rejects_death_age_outside_range() {
        for death_age in [49, 121] {
            let mut cli = sample_cli();
            cli.death_age = death_age;
            let err = build_profile(cli).expect_err("must reject death age");
            assert!(err.to_string().contains("--death-age"));
        }
    }

    #[test]
    fn build_profile_rejects_negative_and_non_finite_amounts() {
        let mut cli = sample_cli();
        cli.monthly_contribution = -1.0;
        let err = build_profile(cli).expect_err("must reject negative contribution");
        assert_eq!(
            err,
            InputError::Negative {
                flag: "--monthly-contribution"
            }
        );

        let mut cli = sample_cli();
        cli.annual_return = f64::NAN;
        let err = build_profile(cli).expect_err("must reject NaN return");
        assert!(err.to_string().contains("--annual-return"));
    }

    #[test]
    fn build_profile_allows_death_before_current_age() {
        let mut cli = sample_cli();
        cli.current_age = 95;
        cli.death_age = 90;
        let profile = build_profile(cli).expect("range checks pass");
        assert!(!simulate(&profile).is_feasible());
    }

    #[test]
    fn profile_from_json_parses_web_keys() {
        let json = r#"{
          "currentAge": 35,
          "startingCapital": 120000,
          "monthlyContribution": 2500,
          "annualReturn": 7,
          "inflationRate": 2.5,
          "monthlySpend": 8000,
          "deathAge": 95
        }"#;
        let profile = profile_from_json(json).expect("json should parse");
        assert_eq!(profile.current_age, 35);
        assert_approx(profile.starting_capital, 120_000.0);
        assert_approx(profile.monthly_contribution, 2_500.0);
        assert_approx(profile.annual_return_rate, 0.07);
        assert_approx(profile.annual_inflation_rate, 0.025);
        assert_approx(profile.monthly_retirement_spend, 8_000.0);
        assert_eq!(profile.death_age, 95);
    }

    #[test]
    fn profile_from_json_falls_back_to_defaults() {
        let profile = profile_from_json("{}").expect("empty payload uses defaults");
        assert_eq!(profile.current_age, DEFAULT_CURRENT_AGE);
        assert_eq!(profile.death_age, DEFAULT_DEATH_AGE);
        assert_approx(profile.monthly_retirement_spend, DEFAULT_MONTHLY_SPEND);
    }

    #[test]
    fn profile_from_json_reports_bad_types() {
        let err = profile_from_json(r#"{"currentAge": "thirty"}"#).expect_err("bad type");
        assert!(err.contains("Invalid API JSON payload"));
    }

    #[test]
    fn simulate_response_serialization_contains_expected_fields() {
        let profile = build_profile(sample_cli()).expect("valid inputs");
        let result = simulate(&profile);
        let response = build_simulate_response(profile, result);
        let json = serde_json::to_string(&response).expect("response should serialize");

        assert!(json.contains("\"feasible\":true"));
        assert!(json.contains("\"retirementAge\":57"));
        assert!(json.contains("\"capitalAtDeath\""));
        assert!(json.contains("\"yearsToRetirement\":27"));
        assert!(json.contains("\"yearsInRetirement\""));
        assert!(json.contains("\"capitalTimeline\""));
        assert!(json.contains("\"monthlyCost\""));
        assert!(json.contains("\"phase\":\"Accumulation\""));
        assert!(json.contains("\"annualReturnRate\":0.06"));
    }

    #[test]
    fn infeasible_response_has_null_summary_and_empty_series() {
        let mut cli = sample_cli();
        cli.starting_capital = 0.0;
        cli.monthly_contribution = 0.0;
        cli.annual_return = 0.0;
        cli.monthly_spend = 40_000.0;
        let profile = build_profile(cli).expect("valid inputs");
        let response = build_simulate_response(profile.clone(), simulate(&profile));
        let json = serde_json::to_value(&response).expect("response should serialize");

        assert_eq!(json["feasible"], Value::Bool(false));
        assert!(json["retirementAge"].is_null());
        assert!(json["capitalAtDeath"].is_null());
        assert!(json["summary"].is_null());
        assert_eq!(json["scenarios"], Value::Array(Vec::new()));
        assert_eq!(json["capitalTimeline"], Value::Array(Vec::new()));
        assert_eq!(json["costTimeline"], Value::Array(Vec::new()));
    }

    #[test]
    fn run_cli_prints_single_year_result() {
        let output = run_cli([
            "simulate",
            "--current-age",
            "89",
            "--monthly-contribution",
            "0",
        ])
        .expect("cli run should succeed");
        let json: Value = serde_json::from_str(&output).expect("output is JSON");

        assert_eq!(json["retirementAge"], 89);
        assert_eq!(json["capitalTimeline"].as_array().map(Vec::len), Some(1));
        let capital = json["capitalAtDeath"].as_f64().unwrap_or_default();
        assert!((capital - 174_000.0).abs() < 1e-6);
    }

    #[test]
    fn run_cli_surfaces_argument_and_input_errors() {
        let err = run_cli(["simulate", "--current-age", "abc"]).expect_err("bad number");
        assert!(matches!(err, CliError::Args(_)));

        let err = run_cli(["simulate", "--death-age", "130"]).expect_err("out of range");
        assert!(matches!(err, CliError::Input(InputError::AgeOutOfRange { .. })));
    }

    #[tokio::test]
    async fn simulate_handler_returns_result_json() {
        let payload = SimulatePayload {
            current_age: Some(89),
            monthly_contribution: Some(0.0),
            ..SimulatePayload::default()
        };
        let response = simulate_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CACHE_CONTROL),
            Some(&HeaderValue::from_static("no-store"))
        );

        let json = body_json(response).await;
        assert_eq!(json["feasible"], Value::Bool(true));
        assert_eq!(json["summary"]["yearsToRetirement"], 0);
        assert_eq!(json["costTimeline"][0]["phase"], "Retirement");
    }

    #[tokio::test]
    async fn simulate_handler_rejects_invalid_input() {
        let payload = SimulatePayload {
            current_age: Some(150),
            ..SimulatePayload::default()
        };
        let response = simulate_handler_impl(payload).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let json = body_json(response).await;
        let message = json["error"].as_str().unwrap_or_default();
        assert!(message.contains("--current-age"));
    }

    #[tokio::test]
    async fn health_and_fallback_handlers() {
        let response = health_handler().await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["status"], "ok");

        let response = not_found_handler().await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(response).await["error"], "Not found");
    }
}
