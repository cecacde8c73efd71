use axum::{
    Router,
    extract::{Json, Query, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::get,
};
use chrono::Datelike;
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::core::{
    ExtraPaymentFrequency, FreedomInputs, FreedomResult, MortgageInputs, MortgageResult,
    ProjectionError, project_freedom, project_mortgage,
};

mod ads;

pub use ads::{AdScriptConfig, inject_ad_script};

const INDEX_HTML: &str = include_str!("../../web/index.html");
const STYLES_CSS: &str = include_str!("../../web/styles.css");
const APP_JS: &str = include_str!("../../web/app.js");

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum CliExtraFrequency {
    Monthly,
    OneTime,
}

impl From<CliExtraFrequency> for ExtraPaymentFrequency {
    fn from(value: CliExtraFrequency) -> Self {
        match value {
            CliExtraFrequency::Monthly => ExtraPaymentFrequency::Monthly,
            CliExtraFrequency::OneTime => ExtraPaymentFrequency::OneTime,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "kebab-case")]
enum ApiExtraFrequency {
    Monthly,
    #[serde(alias = "oneTime", alias = "one_time", alias = "onetime")]
    OneTime,
}

impl From<ApiExtraFrequency> for CliExtraFrequency {
    fn from(value: ApiExtraFrequency) -> Self {
        match value {
            ApiExtraFrequency::Monthly => CliExtraFrequency::Monthly,
            ApiExtraFrequency::OneTime => CliExtraFrequency::OneTime,
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "fincalc",
    about = "Mortgage payoff and financial-freedom calculators with a web dashboard"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the dashboard and JSON API
    Serve(ServeArgs),
    /// Compare a mortgage with and without extra payments
    Mortgage(MortgageArgs),
    /// Project the year of financial independence
    Freedom(FreedomArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    bind: IpAddr,
    #[arg(
        long,
        env = "AD_SCRIPT_URL",
        help = "Advertising script injected into the dashboard <head>"
    )]
    ad_script_url: Option<String>,
}

#[derive(Args, Debug, Clone)]
struct MortgageArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Original loan amount")]
    principal: f64,
    #[arg(long, default_value_t = 30)]
    original_term_years: u32,
    #[arg(long, default_value_t = 0)]
    original_term_months: u32,
    #[arg(long, default_value_t = 5.0, help = "Annual interest rate in percent")]
    interest_rate: f64,
    #[arg(long, default_value_t = 30)]
    remaining_years: u32,
    #[arg(long, default_value_t = 0)]
    remaining_months: u32,
    #[arg(long, default_value_t = 200.0)]
    extra_payment: f64,
    #[arg(long, value_enum, default_value_t = CliExtraFrequency::Monthly)]
    extra_frequency: CliExtraFrequency,
}

#[derive(Args, Debug, Clone)]
struct FreedomArgs {
    #[arg(long, default_value_t = 100_000.0, help = "Current invested balance")]
    balance: f64,
    #[arg(
        long,
        default_value_t = 0.08,
        help = "Annual return rate as a fraction, e.g. 0.08"
    )]
    interest_rate: f64,
    #[arg(long, default_value_t = 85_000.0, help = "Annual expenses during retirement")]
    yearly_expenses: f64,
    #[arg(long, default_value_t = 10_000.0, help = "Amount invested each year")]
    yearly_addition: f64,
    #[arg(long, default_value_t = 25.0)]
    current_age: f64,
    #[arg(
        long,
        default_value_t = 0.02,
        help = "Annual depreciation/inflation rate as a fraction"
    )]
    depreciation_rate: f64,
    #[arg(long, help = "Calendar year to start from; defaults to the current year")]
    current_year: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct MortgagePayload {
    principal: Option<f64>,
    original_term_years: Option<u32>,
    original_term_months: Option<u32>,
    annual_rate_percent: Option<f64>,
    remaining_term_years: Option<u32>,
    remaining_term_months: Option<u32>,
    extra_payment: Option<f64>,
    extra_frequency: Option<ApiExtraFrequency>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct FreedomPayload {
    balance: Option<f64>,
    annual_return_rate: Option<f64>,
    yearly_expenses: Option<f64>,
    yearly_addition: Option<f64>,
    current_age: Option<f64>,
    depreciation_rate: Option<f64>,
    current_year: Option<i32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct MortgageResponse {
    #[serde(flatten)]
    result: MortgageResult,
    monthly_payment_display: String,
    interest_saved_display: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FreedomResponse {
    #[serde(flatten)]
    result: FreedomResult,
    final_balance_display: String,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Projection(#[from] ProjectionError),
    #[error("invalid request: {0}")]
    BadRequest(String),
    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Projection(ProjectionError::InvalidInput(_)) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::Projection(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::warn!(%status, error = %self, "request rejected");
        error_response(status, &self.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub ads: AdScriptConfig,
}

impl From<ServeArgs> for ServerConfig {
    fn from(args: ServeArgs) -> Self {
        Self {
            addr: SocketAddr::new(args.bind, args.port),
            ads: AdScriptConfig::new(args.ad_script_url),
        }
    }
}

#[derive(Debug)]
struct AppState {
    index_html: String,
}

impl AppState {
    fn new(ads: &AdScriptConfig) -> Self {
        Self {
            index_html: inject_ad_script(INDEX_HTML, ads),
        }
    }
}

pub async fn run(cli: Cli) -> Result<(), ApiError> {
    match cli.command {
        Command::Serve(args) => run_http_server(args.into()).await?,
        Command::Mortgage(args) => {
            let inputs = build_mortgage_inputs(&args)?;
            let result = project_mortgage(&inputs)?;
            println!("{}", mortgage_summary(&result));
        }
        Command::Freedom(args) => {
            let inputs = build_freedom_inputs(&args, current_calendar_year());
            let result = project_freedom(&inputs)?;
            println!("{}", freedom_summary(&result));
        }
    }
    Ok(())
}

pub async fn run_http_server(config: ServerConfig) -> std::io::Result<()> {
    if let Some(url) = config.ads.script_url() {
        tracing::info!(%url, "injecting ad script into dashboard");
    }
    let state = Arc::new(AppState::new(&config.ads));
    let app = Router::new()
        .route("/", get(index_handler))
        .route("/index.html", get(index_handler))
        .route("/styles.css", get(styles_handler))
        .route("/app.js", get(app_js_handler))
        .route(
            "/api/mortgage",
            get(mortgage_get_handler).post(mortgage_post_handler),
        )
        .route(
            "/api/freedom",
            get(freedom_get_handler).post(freedom_post_handler),
        )
        .fallback(not_found_handler)
        .with_state(state);

    let listener = TcpListener::bind(config.addr).await?;
    tracing::info!(addr = %config.addr, "dashboard listening");
    tracing::info!("Local access: http://127.0.0.1:{}/", config.addr.port());

    axum::serve(listener, app).await
}

async fn index_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    with_cache_control(Html(state.index_html.clone()))
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
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn mortgage_get_handler(Query(payload): Query<MortgagePayload>) -> Response {
    mortgage_handler_impl(payload)
}

async fn mortgage_post_handler(Json(payload): Json<MortgagePayload>) -> Response {
    mortgage_handler_impl(payload)
}

async fn freedom_get_handler(Query(payload): Query<FreedomPayload>) -> Response {
    freedom_handler_impl(payload, current_calendar_year())
}

async fn freedom_post_handler(Json(payload): Json<FreedomPayload>) -> Response {
    freedom_handler_impl(payload, current_calendar_year())
}

fn mortgage_handler_impl(payload: MortgagePayload) -> Response {
    let outcome = mortgage_inputs_from_payload(payload)
        .and_then(|inputs| project_mortgage(&inputs).map_err(ApiError::from));
    match outcome {
        Ok(result) => json_response(StatusCode::OK, build_mortgage_response(result)),
        Err(err) => err.into_response(),
    }
}

fn freedom_handler_impl(payload: FreedomPayload, current_year: i32) -> Response {
    let inputs = freedom_inputs_from_payload(payload, current_year);
    match project_freedom(&inputs) {
        Ok(result) => json_response(StatusCode::OK, build_freedom_response(result)),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn with_cache_control<R: IntoResponse>(response: R) -> Response {
    let mut response = response.into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        "no-store".parse().expect("valid header"),
    );
    response
}

fn json_response<T: Serialize>(status: StatusCode, body: T) -> Response {
    with_cache_control((status, Json(body)))
}

fn error_response(status: StatusCode, msg: &str) -> Response {
    json_response(
        status,
        ErrorResponse {
            error: msg.to_string(),
        },
    )
}

fn current_calendar_year() -> i32 {
    chrono::Local::now().year()
}

fn term_months(years: u32, months: u32, name: &str) -> Result<u32, ApiError> {
    years
        .checked_mul(12)
        .and_then(|m| m.checked_add(months))
        .ok_or_else(|| ApiError::BadRequest(format!("{name} is too long")))
}

fn build_mortgage_inputs(args: &MortgageArgs) -> Result<MortgageInputs, ApiError> {
    Ok(MortgageInputs {
        principal: args.principal,
        original_term_months: term_months(
            args.original_term_years,
            args.original_term_months,
            "original term",
        )?,
        annual_rate_percent: args.interest_rate,
        remaining_term_months: term_months(
            args.remaining_years,
            args.remaining_months,
            "remaining term",
        )?,
        extra_payment: args.extra_payment,
        extra_frequency: args.extra_frequency.into(),
    })
}

fn build_freedom_inputs(args: &FreedomArgs, current_year: i32) -> FreedomInputs {
    FreedomInputs {
        balance: args.balance,
        annual_return_rate: args.interest_rate,
        depreciation_rate: args.depreciation_rate,
        yearly_expenses: args.yearly_expenses,
        yearly_addition: args.yearly_addition,
        current_age: args.current_age,
        current_year: args.current_year.unwrap_or(current_year),
    }
}

#[cfg(test)]
fn mortgage_inputs_from_json(json: &str) -> Result<MortgageInputs, ApiError> {
    let payload = serde_json::from_str::<MortgagePayload>(json)
        .map_err(|e| ApiError::BadRequest(format!("Invalid API JSON payload: {e}")))?;
    mortgage_inputs_from_payload(payload)
}

fn mortgage_inputs_from_payload(payload: MortgagePayload) -> Result<MortgageInputs, ApiError> {
    let mut args = default_mortgage_args();

    if let Some(v) = payload.principal {
        args.principal = v;
    }
    if let Some(v) = payload.original_term_years {
        args.original_term_years = v;
    }
    if let Some(v) = payload.original_term_months {
        args.original_term_months = v;
    }
    if let Some(v) = payload.annual_rate_percent {
        args.interest_rate = v;
    }
    if let Some(v) = payload.remaining_term_years {
        args.remaining_years = v;
    }
    if let Some(v) = payload.remaining_term_months {
        args.remaining_months = v;
    }
    if let Some(v) = payload.extra_payment {
        args.extra_payment = v;
    }
    if let Some(v) = payload.extra_frequency {
        args.extra_frequency = v.into();
    }

    build_mortgage_inputs(&args)
}

fn freedom_inputs_from_payload(payload: FreedomPayload, current_year: i32) -> FreedomInputs {
    let mut args = default_freedom_args();

    if let Some(v) = payload.balance {
        args.balance = v;
    }
    if let Some(v) = payload.annual_return_rate {
        args.interest_rate = v;
    }
    if let Some(v) = payload.yearly_expenses {
        args.yearly_expenses = v;
    }
    if let Some(v) = payload.yearly_addition {
        args.yearly_addition = v;
    }
    if let Some(v) = payload.current_age {
        args.current_age = v;
    }
    if let Some(v) = payload.depreciation_rate {
        args.depreciation_rate = v;
    }
    if let Some(v) = payload.current_year {
        args.current_year = Some(v);
    }

    build_freedom_inputs(&args, current_year)
}

fn default_mortgage_args() -> MortgageArgs {
    MortgageArgs {
        principal: 100_000.0,
        original_term_years: 30,
        original_term_months: 0,
        interest_rate: 5.0,
        remaining_years: 30,
        remaining_months: 0,
        extra_payment: 200.0,
        extra_frequency: CliExtraFrequency::Monthly,
    }
}

fn default_freedom_args() -> FreedomArgs {
    FreedomArgs {
        balance: 100_000.0,
        interest_rate: 0.08,
        yearly_expenses: 85_000.0,
        yearly_addition: 10_000.0,
        current_age: 25.0,
        depreciation_rate: 0.02,
        current_year: None,
    }
}

fn build_mortgage_response(result: MortgageResult) -> MortgageResponse {
    MortgageResponse {
        monthly_payment_display: format_currency(result.monthly_payment),
        interest_saved_display: format_currency(result.total_interest_saved),
        result,
    }
}

fn build_freedom_response(result: FreedomResult) -> FreedomResponse {
    FreedomResponse {
        final_balance_display: format_currency(result.final_balance),
        result,
    }
}

fn mortgage_summary(result: &MortgageResult) -> String {
    format!(
        "Monthly Payment: {}\nInterest Saved: {}\nTime Saved: {} months\nPayoff: month {} (was month {})",
        format_currency(result.monthly_payment),
        format_currency(result.total_interest_saved),
        result.total_months_saved,
        result.accelerated_payoff_month,
        result.baseline_payoff_month,
    )
}

fn freedom_summary(result: &FreedomResult) -> String {
    format!(
        "Year of Financial Freedom: {}\nYears until Financial Freedom: {}\nAge of Financial Freedom: {}\nFinal Balance: {}",
        result.payoff_year,
        result.years,
        result.freedom_age,
        format_currency(result.final_balance),
    )
}

pub fn format_currency(amount: f64) -> String {
    if !amount.is_finite() {
        return amount.to_string();
    }

    let cents = (amount.abs() * 100.0).round() as u64;
    let digits = (cents / 100).to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if amount < 0.0 && cents > 0 { "-" } else { "" };
    format!("{sign}${grouped}.{:02}", cents % 100)
}
