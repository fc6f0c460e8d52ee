//! AWS Lambda handler for running forecasts
//!
//! Accepts a forecast request as JSON, either as the raw event or as the
//! `body` string of a Lambda Function URL event, and returns the summary
//! tables or the validation messages.

use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use rosca_forecast::reporting::{summarize_by_duration, summarize_by_slab, DimensionSummary};
use rosca_forecast::{
    CohortRow, ForecastConfig, ForecastEngine, ForecastRequest, MonthlySummary, YearlySummary,
};
use rosca_forecast::lifecycle::{LifecycleRow, ReturnLogRow};
use serde::Serialize;
use serde_json::{json, Value};

/// Successful forecast response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ForecastResponse {
    cohort_count: usize,
    total_revenue: f64,
    total_gross_profit: f64,
    dropped_returns: u64,
    yearly: Vec<YearlySummary>,
    monthly: Vec<MonthlySummary>,
    lifecycle: Vec<LifecycleRow>,
    return_log: Vec<ReturnLogRow>,
    by_duration: Vec<DimensionSummary>,
    by_slab: Vec<DimensionSummary>,
    /// Only when `includeCohorts` is set; the table can be large
    #[serde(skip_serializing_if = "Option::is_none")]
    cohorts: Option<Vec<CohortRow>>,
    execution_time_ms: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    messages: Vec<String>,
}

/// Unwrap a Function URL event to its JSON body; raw events pass through
fn request_payload(event: Value) -> Result<Value, String> {
    match event.get("body") {
        Some(Value::String(body)) if body.trim().is_empty() => Ok(json!({})),
        Some(Value::String(body)) => {
            serde_json::from_str(body).map_err(|e| format!("Invalid JSON body: {}", e))
        }
        Some(Value::Object(_)) => Ok(event["body"].clone()),
        _ => Ok(event),
    }
}

fn http_response<T: Serialize>(status: u16, body: &T) -> Value {
    let body = serde_json::to_string(body)
        .unwrap_or_else(|e| format!("{{\"error\":\"failed to serialize response: {}\"}}", e));
    json!({
        "statusCode": status,
        "headers": {
            "Content-Type": "application/json",
            "Access-Control-Allow-Origin": "*",
        },
        "body": body,
    })
}

fn error_response(status: u16, error: &str, messages: Vec<String>) -> Value {
    http_response(
        status,
        &ErrorResponse {
            error: error.to_string(),
            messages,
        },
    )
}

fn handle(event: Value) -> Value {
    let start = std::time::Instant::now();

    let payload = match request_payload(event) {
        Ok(p) => p,
        Err(e) => return error_response(400, &e, Vec::new()),
    };
    let include_cohorts = payload
        .get("includeCohorts")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    let request: ForecastRequest = match serde_json::from_value(payload) {
        Ok(r) => r,
        Err(e) => return error_response(400, &format!("Invalid request: {}", e), Vec::new()),
    };

    let config = ForecastConfig::from(request);
    let output = match ForecastEngine::new(config).run() {
        Ok(output) => output,
        Err(err) if !err.messages().is_empty() => {
            return error_response(422, "invalid configuration", err.messages().to_vec());
        }
        Err(err) => return error_response(500, &err.to_string(), Vec::new()),
    };

    let response = ForecastResponse {
        cohort_count: output.cohorts.len(),
        total_revenue: output.total_revenue(),
        total_gross_profit: output.total_gross_profit(),
        dropped_returns: output.lifecycle.dropped_returns,
        by_duration: summarize_by_duration(&output.cohorts),
        by_slab: summarize_by_slab(&output.cohorts),
        yearly: output.yearly,
        monthly: output.monthly,
        lifecycle: output.lifecycle.rows,
        return_log: output.lifecycle.return_log,
        cohorts: include_cohorts.then_some(output.cohorts),
        execution_time_ms: start.elapsed().as_millis() as u64,
    };

    http_response(200, &response)
}

/// Lambda handler function
async fn handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    Ok(handle(event.payload))
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    env_logger::init();
    run(service_fn(handler)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(response: &Value) -> Value {
        serde_json::from_str(response["body"].as_str().unwrap()).unwrap()
    }

    #[test]
    fn test_function_url_body_is_unwrapped() {
        let event = json!({ "body": "{\"startingUsers\": 10}" });
        assert_eq!(request_payload(event).unwrap(), json!({ "startingUsers": 10 }));

        let raw = json!({ "startingUsers": 10 });
        assert_eq!(request_payload(raw.clone()).unwrap(), raw);
    }

    #[test]
    fn test_invalid_configuration_returns_messages() {
        let response = handle(json!({ "spread": 250.0, "churnRate": -1.0 }));
        assert_eq!(response["statusCode"], 422);
        let messages = body(&response)["messages"].as_array().unwrap().len();
        assert_eq!(messages, 2);
    }

    #[test]
    fn test_small_forecast_response() {
        let request = json!({
            "durations": [3],
            "slabAmounts": { "3": [1000] },
            "slotFees": { "3": { "1000": { "1": { "feePct": 2.0, "blocked": false } } } },
            "slotDistribution": { "3": { "1000": { "1": 100.0 } } },
            "startingUsers": 100,
            "monthlyGrowthRate": 0.0,
            "includeCohorts": true
        });
        let response = handle(json!({ "body": request.to_string() }));
        assert_eq!(response["statusCode"], 200);

        let body = body(&response);
        assert_eq!(body["yearly"].as_array().unwrap().len(), 5);
        assert_eq!(body["cohorts"][0]["Users"], 100);
        assert_eq!(body["cohorts"][0]["Total Commitment"], 300000.0);
    }
}
