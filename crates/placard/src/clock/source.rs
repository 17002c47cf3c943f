//! Public time sources.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use reqwest::header::{CACHE_CONTROL, PRAGMA};
use reqwest::Client;
use serde_json::Value;
use tracing::trace;

use crate::config::Config;
use crate::error::{Error, Result};

/// A source of "public" time.
#[async_trait]
pub trait TimeSource: Send + Sync + fmt::Debug {
    /// Where the time comes from, for logging.
    fn endpoint(&self) -> &str;

    /// Ask the source for the current instant.
    ///
    /// # Errors
    ///
    /// Returns an error if the source is unreachable or its answer carries
    /// no usable time.
    async fn fetch(&self) -> Result<DateTime<Utc>>;
}

/// Time source backed by one HTTP GET returning JSON.
#[derive(Debug, Clone)]
pub struct HttpTimeSource {
    client: Client,
    endpoint: String,
}

impl HttpTimeSource {
    /// Create a source for `endpoint`.
    ///
    /// Without `timeout` the client default applies.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = Client::builder().user_agent(concat!("placard/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let endpoint = endpoint.into();
        let client = builder
            .build()
            .map_err(|e| Error::time_source_request(endpoint.clone(), e.to_string()))?;
        Ok(Self { client, endpoint })
    }

    /// Create a source from the `[clock]` configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.clock.endpoint.clone(), config.request_timeout())
    }
}

#[async_trait]
impl TimeSource for HttpTimeSource {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn fetch(&self) -> Result<DateTime<Utc>> {
        let response = self
            .client
            .get(&self.endpoint)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .send()
            .await
            .map_err(|e| Error::time_source_request(&self.endpoint, e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::time_source_request(
                &self.endpoint,
                format!("unexpected status {status}"),
            ));
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| Error::time_source_payload(format!("body is not JSON: {e}")))?;
        trace!("Time source answered {}", body);

        parse_time_payload(&body)
    }
}

/// Read the instant carried by a time source answer.
///
/// A non-empty `datetime` string takes precedence and must be an ISO-8601
/// date or date-time. Without an offset a date-time is local time and a
/// bare date is midnight UTC. Otherwise a numeric `unixtime` in seconds is
/// used.
///
/// ```
/// use placard::clock::parse_time_payload;
///
/// let body = serde_json::json!({ "unixtime": 1_893_456_000 });
/// let at = parse_time_payload(&body).unwrap();
/// assert_eq!(at.to_rfc3339(), "2030-01-01T00:00:00+00:00");
/// ```
///
/// # Errors
///
/// Returns [`Error::TimeSourcePayload`] when neither field yields a valid instant.
pub fn parse_time_payload(body: &Value) -> Result<DateTime<Utc>> {
    let object = body
        .as_object()
        .ok_or_else(|| Error::time_source_payload("answer is not a JSON object"))?;

    if let Some(Value::String(datetime)) = object.get("datetime") {
        if !datetime.is_empty() {
            return parse_datetime(datetime)
                .ok_or_else(|| Error::time_source_payload(format!("invalid datetime {datetime:?}")));
        }
    }

    if let Some(seconds) = object.get("unixtime").and_then(Value::as_f64) {
        return from_unix_seconds(seconds)
            .ok_or_else(|| Error::time_source_payload(format!("unixtime {seconds} out of range")));
    }

    Err(Error::time_source_payload(
        "answer has neither datetime nor unixtime",
    ))
}

/// Date-time layouts without a zone, read as local time.
const LOCAL_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Read an ISO-style `datetime` value.
///
/// RFC 3339 is tried first. A date-time without a zone is local time and a
/// bare date is midnight UTC.
fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(text) {
        return Some(at.with_timezone(&Utc));
    }

    if let Some(naive) = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
    {
        return Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|at| at.with_timezone(&Utc));
    }

    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

#[allow(clippy::cast_possible_truncation)]
fn from_unix_seconds(seconds: f64) -> Option<DateTime<Utc>> {
    let millis = (seconds * 1000.0).round();
    // Also rejects NaN
    if !(-8.64e15..=8.64e15).contains(&millis) {
        return None;
    }
    DateTime::from_timestamp_millis(millis as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned HTTP response on a local port and return its URL.
    async fn serve_once(status_line: &'static str, body: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 2048];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "{status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let _ = socket.write_all(response.as_bytes()).await;
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/api/ip")
    }

    #[test]
    fn test_parse_datetime() {
        let at = parse_time_payload(&json!({ "datetime": "2030-01-01T00:00:00Z" })).unwrap();
        assert_eq!(at.timestamp(), 1_893_456_000);
    }

    #[test]
    fn test_parse_datetime_with_offset_and_fraction() {
        let at = parse_time_payload(&json!({
            "datetime": "2029-12-31T21:00:00.250-03:00",
            "unixtime": 1
        }))
        .unwrap();
        assert_eq!(at.timestamp_millis(), 1_893_456_000_250);
    }

    #[test]
    fn test_parse_datetime_date_only_is_utc_midnight() {
        let at = parse_time_payload(&json!({ "datetime": "2030-01-01", "unixtime": 1 })).unwrap();
        assert_eq!(at.timestamp(), 1_893_456_000);
    }

    #[test]
    fn test_parse_datetime_without_zone_is_local() {
        let naive = NaiveDate::from_ymd_opt(2030, 1, 1)
            .unwrap()
            .and_hms_milli_opt(12, 30, 0, 500)
            .unwrap();
        let expected = Local
            .from_local_datetime(&naive)
            .earliest()
            .unwrap()
            .with_timezone(&Utc);

        let at = parse_time_payload(&json!({ "datetime": "2030-01-01T12:30:00.500" })).unwrap();
        assert_eq!(at, expected);

        let at = parse_time_payload(&json!({ "datetime": "2030-01-01 12:30:00.500" })).unwrap();
        assert_eq!(at, expected);

        let at = parse_time_payload(&json!({ "datetime": "2030-01-01T12:30" })).unwrap();
        assert_eq!(at, expected - chrono::TimeDelta::milliseconds(500));
    }

    #[test]
    fn test_parse_unixtime_fallback() {
        let at = parse_time_payload(&json!({ "unixtime": 1_893_456_000 })).unwrap();
        assert_eq!(at.timestamp(), 1_893_456_000);

        let at = parse_time_payload(&json!({ "datetime": "", "unixtime": 1.5 })).unwrap();
        assert_eq!(at.timestamp_millis(), 1500);
    }

    #[test]
    fn test_parse_invalid_datetime_rejected() {
        let err = parse_time_payload(&json!({ "datetime": "yesterday", "unixtime": 5 })).unwrap_err();
        assert!(err.to_string().contains("invalid datetime"));

        assert!(parse_time_payload(&json!({ "datetime": "2030-13-01" })).is_err());
        assert!(parse_time_payload(&json!({ "datetime": "01/01/2030" })).is_err());
    }

    #[test]
    fn test_parse_missing_fields_rejected() {
        let err = parse_time_payload(&json!({ "timezone": "America/Sao_Paulo" })).unwrap_err();
        assert!(err.to_string().contains("neither datetime nor unixtime"));

        assert!(parse_time_payload(&json!({ "unixtime": "1893456000" })).is_err());
        assert!(parse_time_payload(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_parse_unixtime_out_of_range() {
        assert!(parse_time_payload(&json!({ "unixtime": 1e300 })).is_err());
    }

    #[tokio::test]
    async fn test_http_fetch_success() {
        let url = serve_once(
            "HTTP/1.1 200 OK",
            r#"{"datetime":"2030-01-01T00:00:00+00:00","unixtime":1893456000}"#,
        )
        .await;
        let source = HttpTimeSource::new(url, Some(Duration::from_secs(5))).unwrap();

        let at = source.fetch().await.unwrap();
        assert_eq!(at.timestamp(), 1_893_456_000);
    }

    #[tokio::test]
    async fn test_http_fetch_server_error() {
        let url = serve_once("HTTP/1.1 500 Internal Server Error", "{}").await;
        let source = HttpTimeSource::new(url, Some(Duration::from_secs(5))).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(err.is_time_source_error());
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_http_fetch_without_time_fields() {
        let url = serve_once("HTTP/1.1 200 OK", r#"{"abbreviation":"UTC"}"#).await;
        let source = HttpTimeSource::new(url, Some(Duration::from_secs(5))).unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::TimeSourcePayload { .. }));
    }

    #[tokio::test]
    async fn test_http_fetch_connection_refused() {
        // Bind then drop to get a port nobody listens on
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap()
        };
        let source =
            HttpTimeSource::new(format!("http://{addr}/api/ip"), Some(Duration::from_secs(5)))
                .unwrap();

        let err = source.fetch().await.unwrap_err();
        assert!(matches!(err, Error::TimeSourceRequest { .. }));
    }

    #[test]
    fn test_from_config_uses_endpoint() {
        let config = Config::default();
        let source = HttpTimeSource::from_config(&config).unwrap();
        assert_eq!(source.endpoint(), crate::config::DEFAULT_TIME_ENDPOINT);
    }
}
