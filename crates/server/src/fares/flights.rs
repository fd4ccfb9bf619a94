//! RapidAPI flight fare search client.
//!
//! ### Upstream
//!
//! - **Endpoint**: `https://{host}/v2/flights`
//! - **Authentication**: `X-RapidAPI-Key` and `X-RapidAPI-Host` headers.
//! - **Rate Limiting**: at most one request per [`MIN_REQUEST_INTERVAL`].
//! - **Normalization**: the flight list may arrive under `results`, `data`,
//!   `flights` or as a bare array, with field names that vary between
//!   records. Each record is mapped onto one stable flat shape.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use reqwest::header;
use serde_json::{Map, Value, json};
use tokio::sync::Mutex;
use tripbuddy_core::AppConfig;

use super::error::FareError;

/// Minimum interval between upstream requests.
const MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Flight fare client configuration.
#[derive(Debug, Clone)]
pub struct FlightFareConfig {
    pub api_key: String,
    pub host: String,
    /// Base URL (default: `https://{host}`).
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl FlightFareConfig {
    /// Build from the application config; fails if no RapidAPI key is set.
    pub fn from_app(config: &AppConfig) -> Result<Self, FareError> {
        let api_key = config.require_rapidapi_key().map_err(|_| FareError::MissingApiKey)?;
        Ok(Self {
            api_key: api_key.to_string(),
            host: config.rapidapi_host.clone(),
            base_url: format!("https://{}", config.rapidapi_host),
            timeout: config.timeout(),
            user_agent: config.user_agent.clone(),
        })
    }
}

/// Rate limiter to enforce request intervals.
#[derive(Debug)]
struct RateLimiter {
    last_request: Mutex<Instant>,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Mutex::new(Instant::now().checked_sub(min_interval).unwrap_or_else(Instant::now)),
            min_interval,
        }
    }

    /// Acquire permission to make a request, waiting if necessary.
    async fn acquire(&self) {
        let mut last = self.last_request.lock().await;
        let elapsed = last.elapsed();
        if elapsed < self.min_interval {
            tokio::time::sleep(self.min_interval - elapsed).await;
        }
        *last = Instant::now();
    }
}

/// Flight fare API client.
#[derive(Debug, Clone)]
pub struct FlightFareClient {
    http: reqwest::Client,
    config: FlightFareConfig,
    rate_limiter: Arc<RateLimiter>,
}

impl FlightFareClient {
    pub fn new(config: FlightFareConfig) -> Result<Self, FareError> {
        if config.api_key.is_empty() {
            return Err(FareError::MissingApiKey);
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| FareError::Network(Arc::new(e)))?;

        Ok(Self { http, config, rate_limiter: Arc::new(RateLimiter::new(MIN_REQUEST_INTERVAL)) })
    }

    /// Search one-way economy fares for one adult, at most `limit` normalized records.
    pub async fn search(
        &self, source: &str, destination: &str, date: Option<&str>, limit: usize,
    ) -> Result<Vec<Value>, FareError> {
        self.rate_limiter.acquire().await;

        let start = Instant::now();
        let url = format!("{}/v2/flights", self.config.base_url.trim_end_matches('/'));

        let mut params = vec![
            ("from", source),
            ("to", destination),
            ("type", "Economy"),
            ("adult", "1"),
            ("child", "0"),
            ("infant", "0"),
            ("currency", "USD"),
        ];
        if let Some(date) = date {
            params.push(("date", date));
        }

        tracing::debug!(source, destination, ?date, "searching flight fare API");

        let response = self
            .http
            .get(&url)
            .header("X-RapidAPI-Key", &self.config.api_key)
            .header("X-RapidAPI-Host", &self.config.host)
            .header(header::ACCEPT, "application/json")
            .query(&params)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!(status = status.as_u16(), "flight fare API response status");

        if status == 401 || status == 403 {
            return Err(FareError::AuthError);
        }
        if status == 429 {
            return Err(FareError::RateLimited);
        }
        if status.is_client_error() || status.is_server_error() {
            return Err(FareError::HttpError { status: status.as_u16() });
        }

        let bytes = response.bytes().await?;
        let payload: Value = serde_json::from_slice(&bytes).map_err(|e| FareError::Parse(e.to_string()))?;

        let flights = extract_flights(&payload)?;
        let stamp = Utc::now().timestamp_millis();
        let normalized: Vec<Value> = flights
            .iter()
            .take(limit)
            .enumerate()
            .map(|(index, flight)| normalize_flight(flight, index, stamp, source, destination, date))
            .collect();

        tracing::info!(
            source,
            destination,
            raw = flights.len(),
            returned = normalized.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "flight search finished"
        );
        Ok(normalized)
    }
}

/// Locate the flight list in an upstream payload.
fn extract_flights(payload: &Value) -> Result<&[Value], FareError> {
    if let Some(list) = payload.as_array() {
        return Ok(list);
    }

    ["results", "data", "flights"]
        .iter()
        .find_map(|field| payload.get(field).and_then(Value::as_array))
        .map(Vec::as_slice)
        .ok_or_else(|| {
            let keys: Vec<&str> = payload
                .as_object()
                .map(|obj| obj.keys().map(String::as_str).collect())
                .unwrap_or_default();
            FareError::UnexpectedShape(format!("top-level keys: {keys:?}"))
        })
}

/// JavaScript-style truthiness: null, false, 0 and "" count as missing.
fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Value at a dotted path such as `departureAirport.city`.
fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |v, key| v.get(key))
}

/// First truthy value among `paths`.
fn pick(flight: &Value, paths: &[&str]) -> Option<Value> {
    paths
        .iter()
        .filter_map(|p| lookup(flight, p))
        .find(|v| truthy(v))
        .cloned()
}

fn pick_or(flight: &Value, paths: &[&str], fallback: Value) -> Value {
    pick(flight, paths).unwrap_or(fallback)
}

/// Full airline name for an IATA carrier code.
pub fn airline_name(code: &str) -> Option<&'static str> {
    let name = match code.to_ascii_uppercase().as_str() {
        "AI" => "Air India",
        "IX" => "Air India Express",
        "6E" => "IndiGo",
        "SG" => "SpiceJet",
        "UK" => "Vistara",
        "G8" => "Go First",
        "9W" => "Jet Airways",
        "I5" => "AirAsia India",
        "AA" => "American Airlines",
        "DL" => "Delta Air Lines",
        "UA" => "United Airlines",
        "BA" => "British Airways",
        "LH" => "Lufthansa",
        "AF" => "Air France",
        "KL" => "KLM",
        "EK" => "Emirates",
        "QR" => "Qatar Airways",
        "SV" => "Saudi Arabian Airlines",
        _ => return None,
    };
    Some(name)
}

fn describe_stops(flight: &Value) -> Value {
    match flight.get("stops").and_then(Value::as_u64) {
        Some(0) => json!("Direct"),
        Some(1) => json!("1 Stop"),
        Some(n) => json!(format!("{n} Stops")),
        None if flight.get("direct").is_some_and(truthy) => json!("Direct"),
        None => json!("N/A"),
    }
}

/// Map one upstream record onto the stable result shape.
pub fn normalize_flight(
    flight: &Value, index: usize, stamp: i64, source: &str, destination: &str, date: Option<&str>,
) -> Value {
    let id = pick(flight, &["id"]).unwrap_or_else(|| json!(format!("flight-{stamp}-{index}")));

    let flight_date = lookup(flight, "departureAirport.time")
        .and_then(Value::as_str)
        .and_then(|t| t.split('T').next())
        .filter(|d| !d.is_empty())
        .map(|d| json!(d))
        .or_else(|| pick(flight, &["departure_date"]))
        .unwrap_or_else(|| date.map_or(Value::Null, |d| json!(d)));

    let airline = ["airline_code", "careerCode"]
        .iter()
        .filter_map(|p| flight.get(p).and_then(Value::as_str))
        .find(|c| !c.is_empty())
        .and_then(airline_name)
        .map(|name| json!(name))
        .unwrap_or_else(|| pick_or(flight, &["airline_name", "airline"], json!("Unknown Airline")));

    let mut out = Map::new();
    out.insert("id".into(), id);
    out.insert("flightDate".into(), flight_date);
    out.insert("flightStatus".into(), pick_or(flight, &["status"], json!("scheduled")));
    out.insert(
        "departureAirport".into(),
        pick_or(flight, &["departureAirport.city", "departureAirport.code", "from"], json!(source)),
    );
    out.insert(
        "departureTime".into(),
        pick_or(flight, &["departureAirport.time", "departure_time", "departureDateTime"], json!("N/A")),
    );
    out.insert(
        "arrivalAirport".into(),
        pick_or(flight, &["arrivalAirport.city", "arrivalAirport.code", "to"], json!(destination)),
    );
    out.insert(
        "arrivalTime".into(),
        pick_or(flight, &["arrivalAirport.time", "arrival_time", "arrivalDateTime"], json!("N/A")),
    );
    out.insert("airlineName".into(), airline);
    out.insert(
        "flightNumber".into(),
        pick_or(flight, &["flight_number", "flight_code", "flightNumber"], json!("N/A")),
    );
    out.insert("price".into(), pick_or(flight, &["price.total", "totals.total", "price", "fare"], Value::Null));
    out.insert(
        "currency".into(),
        pick_or(flight, &["price.currency", "totals.currency", "currency"], json!("USD")),
    );
    out.insert("baseFare".into(), pick_or(flight, &["price.base", "totals.base", "baseFare"], Value::Null));
    out.insert("taxes".into(), pick_or(flight, &["price.tax", "totals.tax", "taxes"], Value::Null));
    out.insert("stops".into(), describe_stops(flight));
    out.insert(
        "duration".into(),
        pick_or(flight, &["duration.text", "duration", "flight_duration"], json!("N/A")),
    );
    out.insert(
        "cabinType".into(),
        pick_or(flight, &["cabin_class", "cabinType", "class"], json!("Economy")),
    );
    out.insert(
        "baggage".into(),
        json!({
            "cabin": pick_or(flight, &["baggage.cabin", "cabin_baggage"], Value::Null),
            "checkIn": pick_or(flight, &["baggage.checkIn", "checked_baggage"], Value::Null),
        }),
    );
    out.insert("path".into(), pick_or(flight, &["path"], json!([])));
    out.insert("departureDelay".into(), pick_or(flight, &["departureDelay"], json!(0)));
    out.insert("arrivalDelay".into(), pick_or(flight, &["arrivalDelay"], json!(0)));

    Value::Object(out)
}
