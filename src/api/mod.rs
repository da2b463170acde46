mod cli;

pub use cli::{Cli, run};

use axum::{
    Router,
    extract::{Json, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use clap::ValueEnum;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

use crate::core::{
    DelayScenariosInputs, EducationInputs, EmiInputs, EngineConfig, EngineError, EngineResult,
    LumpsumInputs, RetirementInputs, RiskAnswers, SipDelayInputs, SipInputs, StepUp, SwpInputs,
    TravelInputs, VacationInputs, analyze_delay, delay_scenarios, plan_education,
    plan_retirement, plan_travel, plan_vacation, profile_risk, run_emi, run_lumpsum, run_sip,
    simulate_withdrawals,
};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Calculator {
    Sip,
    Lumpsum,
    Emi,
    SipDelay,
    SipDelayScenarios,
    Retirement,
    Swp,
    Education,
    Vacation,
    Travel,
    RiskProfile,
}

impl Calculator {
    pub fn route(self) -> &'static str {
        match self {
            Calculator::Sip => "/api/sip",
            Calculator::Lumpsum => "/api/lumpsum",
            Calculator::Emi => "/api/emi",
            Calculator::SipDelay => "/api/sip-delay",
            Calculator::SipDelayScenarios => "/api/sip-delay/scenarios",
            Calculator::Retirement => "/api/retirement",
            Calculator::Swp => "/api/swp",
            Calculator::Education => "/api/education",
            Calculator::Vacation => "/api/vacation",
            Calculator::Travel => "/api/travel",
            Calculator::RiskProfile => "/api/risk-profile",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error("Invalid JSON payload: {0}")]
    Payload(#[from] serde_json::Error),
}

/// The upstream forms send `stepUpPercent` / `stepUpPerYear` instead of a
/// tagged `stepUp`; they are honoured when no tagged value is present.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct LegacyStepUpPayload {
    step_up_percent: f64,
    step_up_per_year: f64,
}

/// Calculator inputs that carry a contribution step-up.
trait StepUpInputs {
    fn step_up_mut(&mut self) -> &mut StepUp;
}

macro_rules! impl_step_up_inputs {
    ($($ty:ty),* $(,)?) => {
        $(
            impl StepUpInputs for $ty {
                fn step_up_mut(&mut self) -> &mut StepUp {
                    &mut self.step_up
                }
            }
        )*
    };
}

impl_step_up_inputs!(
    SipInputs,
    RetirementInputs,
    EducationInputs,
    VacationInputs,
    TravelInputs,
);

fn resolve_step_up(payload: &Value, step_up: &mut StepUp) -> Result<(), ApiError> {
    if payload.get("stepUp").is_some() {
        return Ok(());
    }
    let legacy = LegacyStepUpPayload::deserialize(payload)?;
    *step_up = StepUp::from_legacy(legacy.step_up_percent, legacy.step_up_per_year)?;
    Ok(())
}

fn run_calculator<I, O>(
    payload: Value,
    calculate: impl FnOnce(&I) -> EngineResult<O>,
) -> Result<Value, ApiError>
where
    I: DeserializeOwned,
    O: Serialize,
{
    let inputs = I::deserialize(&payload)?;
    let output = calculate(&inputs)?;
    Ok(serde_json::to_value(output)?)
}

fn run_stepped_calculator<I, O>(
    payload: Value,
    calculate: impl FnOnce(&I) -> EngineResult<O>,
) -> Result<Value, ApiError>
where
    I: DeserializeOwned + StepUpInputs,
    O: Serialize,
{
    let mut inputs = I::deserialize(&payload)?;
    resolve_step_up(&payload, inputs.step_up_mut())?;
    let output = calculate(&inputs)?;
    Ok(serde_json::to_value(output)?)
}

/// Parses `payload` for `calculator`, runs it and returns the JSON result.
pub fn evaluate(
    calculator: Calculator,
    payload: Value,
    config: &EngineConfig,
) -> Result<Value, ApiError> {
    match calculator {
        Calculator::Sip => run_stepped_calculator::<SipInputs, _>(payload, run_sip),
        Calculator::Lumpsum => run_calculator::<LumpsumInputs, _>(payload, run_lumpsum),
        Calculator::Emi => run_calculator::<EmiInputs, _>(payload, run_emi),
        Calculator::SipDelay => run_calculator::<SipDelayInputs, _>(payload, analyze_delay),
        Calculator::SipDelayScenarios => {
            run_calculator::<DelayScenariosInputs, _>(payload, delay_scenarios)
        }
        Calculator::Retirement => {
            run_stepped_calculator::<RetirementInputs, _>(payload, |inputs| {
                plan_retirement(inputs, config)
            })
        }
        Calculator::Swp => {
            run_calculator::<SwpInputs, _>(payload, |inputs| simulate_withdrawals(inputs, config))
        }
        Calculator::Education => {
            run_stepped_calculator::<EducationInputs, _>(payload, |inputs| {
                plan_education(inputs, config)
            })
        }
        Calculator::Vacation => {
            run_stepped_calculator::<VacationInputs, _>(payload, |inputs| {
                plan_vacation(inputs, config)
            })
        }
        Calculator::Travel => run_stepped_calculator::<TravelInputs, _>(payload, |inputs| {
            plan_travel(inputs, config)
        }),
        Calculator::RiskProfile => run_calculator::<RiskAnswers, _>(payload, profile_risk),
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<EngineConfig>,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

pub fn build_router(config: EngineConfig) -> Router {
    let state = AppState {
        config: Arc::new(config),
    };
    let mut router = Router::new().route("/health", get(health_handler));
    for &calculator in Calculator::value_variants() {
        router = router.route(
            calculator.route(),
            post(
                move |State(state): State<AppState>, Json(payload): Json<Value>| async move {
                    calculate_handler(calculator, &state, payload)
                },
            ),
        );
    }
    router
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn run_http_server(addr: SocketAddr, config: EngineConfig) -> std::io::Result<()> {
    let app = build_router(config);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "calculator HTTP API listening");
    axum::serve(listener, app).await
}

async fn health_handler() -> Response {
    json_response(
        StatusCode::OK,
        HealthResponse {
            status: "ok",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

fn calculate_handler(calculator: Calculator, state: &AppState, payload: Value) -> Response {
    match evaluate(calculator, payload, &state.config) {
        Ok(body) => json_response(StatusCode::OK, body),
        Err(err) => {
            tracing::info!(?calculator, error = %err, "rejected calculator request");
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    let mut response = (status, Json(body)).into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        header::HeaderValue::from_static("no-store"),
    );
    response
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}
