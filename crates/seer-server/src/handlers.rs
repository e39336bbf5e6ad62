//! Request handlers: tool dispatch, account registration, health.
//!
//! Every tool call goes through the access controller before the data
//! provider sees it. Provider records are untrusted string maps and the
//! formatting below tolerates missing fields.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use seer_access::{AccessController, AuthzResult, Caller, QueryShape, RateLimitInfo, Tier};
use seer_traits::{DataProvider, Record, SeerError};

use crate::config::Config;

/// Shared application state.
pub struct AppState {
    /// The access-control checkpoint
    pub access: AccessController,
    /// The financial data collaborator
    pub provider: Arc<dyn DataProvider>,
    /// Startup configuration
    pub config: Config,
}

/// A tool invocation as posted to `/mcp/tools/call`.
#[derive(Debug, Deserialize)]
pub struct ToolCall {
    /// Tool name
    pub name: String,
    /// Tool arguments; conventionally includes an optional `api_key`
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

/// One content block of a tool result.
#[derive(Debug, Serialize)]
pub struct Content {
    /// Content type, always `"text"` here
    #[serde(rename = "type")]
    pub kind: String,
    /// Rendered text
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolResult {
    /// Content blocks
    pub content: Vec<Content>,
    /// Whether this is an error result
    #[serde(rename = "isError", skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                kind: "text".to_string(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![Content {
                kind: "text".to_string(),
                text: text.into(),
            }],
            is_error: true,
        }
    }
}

/// Health check handler.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": state.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// `/mcp/info`: service identity plus the tool catalog.
pub async fn mcp_info(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "name": state.config.service.name,
        "version": env!("CARGO_PKG_VERSION"),
        "description": state.config.service.description,
        "tools": tool_catalog(),
    }))
}

fn tool_catalog() -> Value {
    json!([
        {
            "name": "get_company_info",
            "description": "Get basic information about a company",
            "parameters": {
                "ticker": "string (required) - Company ticker symbol",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "search_companies",
            "description": "Search companies by ticker or name",
            "parameters": {
                "query": "string (required) - Search text",
                "limit": "number (optional) - Maximum number of matches (default: 10)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_company_filings",
            "description": "Get recent SEC filings for a specific company",
            "parameters": {
                "ticker": "string (required) - Company ticker symbol",
                "limit": "number (optional) - Maximum number of filings (default: 10)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_recent_filings",
            "description": "Get recent SEC filings across all companies",
            "parameters": {
                "limit": "number (optional) - Maximum number of filings (default: 20)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_insider_transactions",
            "description": "Get insider trading transactions for a specific company",
            "parameters": {
                "ticker": "string (required) - Company ticker symbol",
                "limit": "number (optional) - Maximum number of transactions (default: 10)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_recent_insider_activity",
            "description": "Get recent insider trading activity across all companies",
            "parameters": {
                "limit": "number (optional) - Maximum number of transactions (default: 15)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_largest_daily_transactions",
            "description": "Get largest daily insider transactions (buyers or sellers)",
            "parameters": {
                "type": "string (required) - Transaction type: 'buyers' or 'sellers'",
                "offset": "number (optional) - Pagination offset (default: 0)",
                "limit": "number (optional) - Maximum number of transactions (default: 10)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
        {
            "name": "get_largest_weekly_transactions",
            "description": "Get largest weekly insider transactions (buyers or sellers)",
            "parameters": {
                "type": "string (required) - Transaction type: 'buyers' or 'sellers'",
                "week_offset": "number (optional) - Week offset: 0=current, 1=last week (default: 0)",
                "offset": "number (optional) - Pagination offset (default: 0)",
                "limit": "number (optional) - Maximum number of transactions (default: 10)",
                "api_key": "string (optional) - Your ShareSeer API key",
            },
        },
    ])
}

fn rate_limit_headers(info: &RateLimitInfo) -> HeaderMap {
    let mut headers = HeaderMap::new();
    let mut put = |name: &'static str, value: i64| {
        if let Ok(v) = HeaderValue::from_str(&value.to_string()) {
            headers.insert(name, v);
        }
    };
    put("x-ratelimit-limit-hourly", info.hourly_limit);
    put("x-ratelimit-remaining-hourly", info.hourly_remaining.max(0));
    put("x-ratelimit-limit-daily", info.daily_limit);
    put("x-ratelimit-remaining-daily", info.daily_remaining.max(0));
    put("x-ratelimit-reset-hour", info.reset_hour);
    put("x-ratelimit-reset-day", info.reset_day);
    headers
}

/// `/mcp/tools/call`: the access checkpoint plus tool dispatch.
pub async fn call_tool(
    State(state): State<Arc<AppState>>,
    Json(call): Json<ToolCall>,
) -> Response {
    let api_key = call
        .arguments
        .get("api_key")
        .and_then(Value::as_str);

    match state.access.authorize(api_key, &call.name).await {
        AuthzResult::Unauthenticated { message } => (
            StatusCode::UNAUTHORIZED,
            Json(json!({
                "error": "authentication_failed",
                "message": format!("{message}. Get a free API key at shareseer.com/mcp"),
            })),
        )
            .into_response(),

        AuthzResult::RateLimited { tier, info } => {
            let headers = info.as_ref().map(rate_limit_headers).unwrap_or_default();
            let mut body = json!({
                "error": "rate_limit_exceeded",
                "message": format!(
                    "You have exceeded your {tier} tier limits. Upgrade to ShareSeer \
                     Premium for higher limits at shareseer.com/upgrade"
                ),
            });
            if let Some(info) = info {
                body["limits"] = json!({ "hourly": info.hourly_limit, "daily": info.daily_limit });
                body["usage"] = json!({ "hourly": info.hourly_used, "daily": info.daily_used });
                body["reset_times"] =
                    json!({ "next_hour": info.reset_hour, "next_day": info.reset_day });
            }
            (StatusCode::TOO_MANY_REQUESTS, headers, Json(body)).into_response()
        }

        AuthzResult::Forbidden { tier, feature } => (
            StatusCode::FORBIDDEN,
            Json(json!({
                "error": "tier_restricted",
                "message": format!(
                    "{feature} is available in ShareSeer Premium. \
                     Upgrade at shareseer.com/upgrade?source=mcp"
                ),
                "feature": feature,
                "tier": tier.to_string(),
            })),
        )
            .into_response(),

        AuthzResult::Authorized { caller, quota } => {
            let result = dispatch(&state, &caller, &call).await;
            let headers = quota.as_ref().map(rate_limit_headers).unwrap_or_default();
            (StatusCode::OK, headers, Json(result)).into_response()
        }
    }
}

async fn dispatch(state: &AppState, caller: &Caller, call: &ToolCall) -> ToolResult {
    let args = &call.arguments;
    match call.name.as_str() {
        "get_company_info" => get_company_info(state, args).await,
        "search_companies" => search_companies(state, caller, args).await,
        "get_company_filings" => get_company_filings(state, args).await,
        "get_recent_filings" => get_recent_filings(state, args).await,
        "get_insider_transactions" => get_insider_transactions(state, args).await,
        "get_recent_insider_activity" => get_recent_insider_activity(state, args).await,
        "get_largest_daily_transactions" => {
            get_largest_daily_transactions(state, caller, args).await
        }
        "get_largest_weekly_transactions" => {
            get_largest_weekly_transactions(state, caller, args).await
        }
        other => ToolResult::error(format!("Unknown tool: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Argument extraction
// ---------------------------------------------------------------------------

fn arg_str<'a>(args: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    args.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn arg_usize(args: &Map<String, Value>, key: &str, default: usize) -> usize {
    match args.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().map(|f| f.max(0.0) as u64))
            .unwrap_or(default as u64) as usize,
        _ => default,
    }
}

// ---------------------------------------------------------------------------
// Record formatting
// ---------------------------------------------------------------------------

fn field<'a>(record: &'a Record, key: &str) -> &'a str {
    record.get(key).map(String::as_str).unwrap_or("")
}

/// Compact dollar rendering: 2500000 -> "$2.5M", 42000 -> "$42K".
fn format_value(raw: &str) -> String {
    match raw.parse::<i64>() {
        Ok(v) if v >= 1_000_000 => format!("${:.1}M", v as f64 / 1_000_000.0),
        Ok(v) if v >= 1_000 => format!("${:.0}K", v as f64 / 1_000.0),
        _ if raw.is_empty() => String::new(),
        _ => format!("${raw}"),
    }
}

fn format_transaction_lines(out: &mut String, transactions: &[Record], kind: &str) {
    use std::fmt::Write;

    let action = if kind == "buyers" { "Purchase" } else { "Sale" };
    for (i, tx) in transactions.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} ({})",
            i + 1,
            field(tx, "name"),
            field(tx, "title"),
            field(tx, "date"),
        );
        let _ = writeln!(out, "   {}", field(tx, "company"));
        let _ = writeln!(
            out,
            "   {}: {} shares of {} at ${} ({})\n",
            action,
            field(tx, "shares"),
            field(tx, "security"),
            field(tx, "price"),
            format_value(field(tx, "value")),
        );
    }
}

fn pagination_note(out: &mut String, offset: usize, returned: usize, limit: usize) {
    use std::fmt::Write;
    if offset > 0 || returned == limit {
        let _ = write!(out, "Showing results {}-{}", offset + 1, offset + returned);
        if returned == limit {
            let _ = write!(out, " (more available)");
        }
        let _ = writeln!(out, "\n");
    }
}

const UPGRADE_HINT: &str =
    "Free tier: limited results, no pagination. Upgrade at shareseer.com/upgrade?source=mcp";

fn free_tier_hint(out: &mut String, caller: &Caller) {
    if caller.tier() == Tier::Free {
        out.push_str(UPGRADE_HINT);
    }
}

fn provider_failure(context: &str, e: SeerError) -> ToolResult {
    match e {
        SeerError::NotFound(what) => ToolResult::text(format!("No {context} found: {what}")),
        other => ToolResult::error(format!("Error retrieving {context}: {other}")),
    }
}

// ---------------------------------------------------------------------------
// Tools
// ---------------------------------------------------------------------------

async fn get_company_info(state: &AppState, args: &Map<String, Value>) -> ToolResult {
    let Some(ticker) = arg_str(args, "ticker") else {
        return ToolResult::error("Error: 'ticker' parameter is required");
    };

    let company = match state.provider.company_by_ticker(ticker).await {
        Ok(company) => company,
        Err(SeerError::NotFound(_)) => {
            return ToolResult::text(format!("Company '{ticker}' not found"));
        }
        Err(e) => return ToolResult::error(format!("Error retrieving company: {e}")),
    };

    let mut out = format!(
        "## {} ({})\n\n",
        field(&company, "name"),
        ticker.to_uppercase()
    );
    if !field(&company, "exchange").is_empty() {
        out.push_str(&format!("Exchange: {}\n", field(&company, "exchange")));
    }
    if !field(&company, "sector").is_empty() {
        out.push_str(&format!("Sector: {}\n", field(&company, "sector")));
    }
    ToolResult::text(out)
}

async fn search_companies(
    state: &AppState,
    caller: &Caller,
    args: &Map<String, Value>,
) -> ToolResult {
    let Some(query) = arg_str(args, "query") else {
        return ToolResult::error("Error: 'query' parameter is required");
    };
    let limit = arg_usize(args, "limit", 10);

    let companies = match state.provider.search_companies(query, limit).await {
        Ok(companies) => companies,
        Err(e) => return provider_failure("companies", e),
    };

    if companies.is_empty() {
        return ToolResult::text(format!("No companies found matching '{query}'"));
    }

    let mut out = format!("Found {} companies matching '{}':\n\n", companies.len(), query);
    for (i, company) in companies.iter().enumerate() {
        out.push_str(&format!(
            "{}. {} ({})\n",
            i + 1,
            field(company, "name"),
            field(company, "ticker"),
        ));
        if !field(company, "cik").is_empty() {
            out.push_str(&format!("   CIK: {}\n", field(company, "cik")));
        }
    }
    free_tier_hint(&mut out, caller);
    ToolResult::text(out)
}

async fn get_company_filings(state: &AppState, args: &Map<String, Value>) -> ToolResult {
    let Some(ticker) = arg_str(args, "ticker") else {
        return ToolResult::error("Error: 'ticker' parameter is required");
    };
    let limit = arg_usize(args, "limit", 10);

    let filings = match state.provider.company_filings(ticker, limit).await {
        Ok(filings) => filings,
        Err(SeerError::NotFound(_)) => {
            return ToolResult::text(format!("Company '{ticker}' not found"));
        }
        Err(e) => return ToolResult::error(format!("Error retrieving filings: {e}")),
    };

    if filings.is_empty() {
        return ToolResult::text("No filings found for this company");
    }

    let mut out = format!("Recent SEC filings for {}:\n\n", ticker.to_uppercase());
    format_filing_lines(&mut out, &filings);
    ToolResult::text(out)
}

async fn get_recent_filings(state: &AppState, args: &Map<String, Value>) -> ToolResult {
    let limit = arg_usize(args, "limit", 20);

    let filings = match state.provider.recent_filings(limit).await {
        Ok(filings) => filings,
        Err(e) => return provider_failure("filings", e),
    };

    if filings.is_empty() {
        return ToolResult::text("No recent filings found");
    }

    let mut out = String::from("Recent SEC filings:\n\n");
    format_filing_lines(&mut out, &filings);
    ToolResult::text(out)
}

fn format_filing_lines(out: &mut String, filings: &[Record]) {
    use std::fmt::Write;
    for (i, filing) in filings.iter().enumerate() {
        let _ = writeln!(
            out,
            "{}. {} - {} ({})",
            i + 1,
            field(filing, "company"),
            field(filing, "form_type"),
            field(filing, "date"),
        );
        if !field(filing, "url").is_empty() {
            let _ = writeln!(out, "   {}", field(filing, "url"));
        }
    }
}

async fn get_insider_transactions(state: &AppState, args: &Map<String, Value>) -> ToolResult {
    let Some(ticker) = arg_str(args, "ticker") else {
        return ToolResult::error("Error: 'ticker' parameter is required");
    };
    let limit = arg_usize(args, "limit", 10);

    let transactions = match state.provider.insider_transactions(ticker, limit).await {
        Ok(transactions) => transactions,
        Err(SeerError::NotFound(_)) => {
            return ToolResult::text(format!("Company '{ticker}' not found"));
        }
        Err(e) => return ToolResult::error(format!("Error retrieving insider transactions: {e}")),
    };

    if transactions.is_empty() {
        return ToolResult::text(format!(
            "No insider transactions found for {}",
            ticker.to_uppercase()
        ));
    }

    let mut out = format!("Insider transactions for {}:\n\n", ticker.to_uppercase());
    format_transaction_lines(&mut out, &transactions, "buyers");
    ToolResult::text(out)
}

async fn get_recent_insider_activity(state: &AppState, args: &Map<String, Value>) -> ToolResult {
    let limit = arg_usize(args, "limit", 15);

    let transactions = match state.provider.recent_insider_activity(limit).await {
        Ok(transactions) => transactions,
        Err(e) => return provider_failure("insider activity", e),
    };

    if transactions.is_empty() {
        return ToolResult::text("No recent insider activity found");
    }

    let mut out = String::from("Recent insider activity:\n\n");
    format_transaction_lines(&mut out, &transactions, "buyers");
    ToolResult::text(out)
}

async fn get_largest_daily_transactions(
    state: &AppState,
    caller: &Caller,
    args: &Map<String, Value>,
) -> ToolResult {
    let kind = match arg_str(args, "type") {
        Some(kind @ ("buyers" | "sellers")) => kind,
        _ => {
            return ToolResult::error(
                "Error: 'type' parameter is required and must be 'buyers' or 'sellers'",
            );
        }
    };

    // Tier shaping happens here, before the provider sees the query.
    let shape = QueryShape::new(
        arg_usize(args, "limit", 10),
        arg_usize(args, "offset", 0),
        0,
    )
    .clamp_for_tier(caller.tier());

    let transactions = match state
        .provider
        .largest_daily_transactions(kind, shape.offset, shape.limit)
        .await
    {
        Ok(transactions) => transactions,
        Err(e) => return provider_failure(&format!("largest daily {kind}"), e),
    };

    if transactions.is_empty() {
        return ToolResult::text(format!("No largest daily {kind} found"));
    }

    let mut out = format!("Largest daily {kind}:\n\n");
    format_transaction_lines(&mut out, &transactions, kind);
    pagination_note(&mut out, shape.offset, transactions.len(), shape.limit);
    free_tier_hint(&mut out, caller);
    ToolResult::text(out)
}

async fn get_largest_weekly_transactions(
    state: &AppState,
    caller: &Caller,
    args: &Map<String, Value>,
) -> ToolResult {
    let kind = match arg_str(args, "type") {
        Some(kind @ ("buyers" | "sellers")) => kind,
        _ => {
            return ToolResult::error(
                "Error: 'type' parameter is required and must be 'buyers' or 'sellers'",
            );
        }
    };

    let shape = QueryShape::new(
        arg_usize(args, "limit", 10),
        arg_usize(args, "offset", 0),
        arg_usize(args, "week_offset", 0),
    )
    .clamp_for_tier(caller.tier());

    let (transactions, window) = match state
        .provider
        .largest_weekly_transactions(kind, shape.week_offset, shape.offset, shape.limit)
        .await
    {
        Ok(result) => result,
        Err(e) => return provider_failure(&format!("largest weekly {kind}"), e),
    };

    if transactions.is_empty() {
        let week_desc = if shape.week_offset > 0 {
            format!("{} week(s) ago", shape.week_offset)
        } else {
            "this week".to_string()
        };
        return ToolResult::text(format!("No largest weekly {kind} found for {week_desc}"));
    }

    let week_desc = if shape.week_offset > 0 {
        format!("Week {} ({})", window.week, window.target_start)
    } else {
        format!("This Week ({})", window.current_start)
    };

    let mut out = format!("Largest weekly {kind} - {week_desc}:\n\n");
    format_transaction_lines(&mut out, &transactions, kind);
    pagination_note(&mut out, shape.offset, transactions.len(), shape.limit);
    free_tier_hint(&mut out, caller);
    ToolResult::text(out)
}

// ---------------------------------------------------------------------------
// Account registration
// ---------------------------------------------------------------------------

/// Request body for `/api/users`.
#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    /// Account email, used verbatim as the account identifier
    pub email: String,
}

/// `/api/users`: register an account and mint an API key.
pub async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateUserRequest>,
) -> Response {
    if req.email.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid_request", "message": "email is required" })),
        )
            .into_response();
    }

    match state.access.credentials().create_account(&req.email).await {
        Ok(identity) => {
            info!(email = %identity.email, "account created");
            (
                StatusCode::CREATED,
                Json(json!({
                    "user": identity,
                    "message": "API key created successfully. Use this key in your MCP tool calls.",
                })),
            )
                .into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": "storage_error", "message": e.to_string() })),
        )
            .into_response(),
    }
}
