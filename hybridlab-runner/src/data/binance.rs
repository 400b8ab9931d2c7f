//! Binance spot market data provider.
//!
//! Fetches klines from the public `/api/v3/klines` endpoint (no API key).
//! Each kline is a 12-element JSON array; prices and volumes arrive as
//! strings. Candles are keyed by their open time.
//!
//! One request returns at most 1000 klines, so larger limits page backwards
//! with `endTime` and the pages are stitched oldest-first.
//!
//! The HTTP client is process-wide: built on first use, reused by every
//! provider instance, never torn down.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::DateTime;
use hybridlab_core::Candle;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;

use super::circuit_breaker::CircuitBreaker;
use super::provider::{DataError, DataProvider, DataSource, FetchResult, Interval};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Maximum klines per request accepted by the exchange.
pub const MAX_KLINES_PER_REQUEST: usize = 1000;

/// Binance error-code for an unknown trading pair.
const INVALID_SYMBOL: i64 = -1121;

static CLIENT: OnceLock<Client> = OnceLock::new();

fn shared_client() -> Result<&'static Client, DataError> {
    if let Some(client) = CLIENT.get() {
        return Ok(client);
    }
    let client = Client::builder()
        .timeout(Duration::from_secs(30))
        .user_agent(concat!("hybridlab/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| DataError::Other(format!("failed to build HTTP client: {e}")))?;
    // A concurrent initializer may have won; either client is fine.
    Ok(CLIENT.get_or_init(|| client))
}

/// Error body returned with 4xx responses.
#[derive(Debug, Deserialize)]
struct ApiError {
    code: i64,
    msg: String,
}

pub struct BinanceProvider {
    base_url: String,
    circuit_breaker: Arc<CircuitBreaker>,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new(circuit_breaker: Arc<CircuitBreaker>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            circuit_breaker,
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }

    /// Point the provider at another host (testnet, mirror, local stub).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn klines_url(&self, symbol: &str, interval: Interval, limit: usize, end_time: Option<i64>) -> String {
        let mut url = format!(
            "{}/api/v3/klines?symbol={symbol}&interval={interval}&limit={limit}",
            self.base_url
        );
        if let Some(end) = end_time {
            url.push_str(&format!("&endTime={end}"));
        }
        url
    }

    /// Fetch one page with retry and circuit breaker logic.
    fn fetch_page(
        &self,
        symbol: &str,
        interval: Interval,
        limit: usize,
        end_time: Option<i64>,
    ) -> Result<Vec<Candle>, DataError> {
        let client = shared_client()?;
        let url = self.klines_url(symbol, interval, limit, end_time);
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                tracing::warn!(symbol, attempt, delay_ms = delay.as_millis() as u64, "retrying klines request");
                std::thread::sleep(delay);
            }

            if !self.circuit_breaker.is_allowed() {
                tracing::warn!(
                    symbol,
                    cooldown_secs = self.circuit_breaker.remaining_cooldown().as_secs(),
                    "circuit breaker open, refusing klines request"
                );
                return Err(DataError::CircuitBreakerTripped);
            }

            let resp = match client.get(&url).send() {
                Ok(resp) => resp,
                Err(e) if e.is_connect() || e.is_timeout() => {
                    last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                    continue;
                }
                Err(e) => return Err(DataError::NetworkUnreachable(e.to_string())),
            };

            let status = resp.status();

            if status == StatusCode::IM_A_TEAPOT || status == StatusCode::FORBIDDEN {
                // IP ban
                self.circuit_breaker.trip();
                return Err(DataError::CircuitBreakerTripped);
            }

            if status == StatusCode::TOO_MANY_REQUESTS {
                self.circuit_breaker.record_failure();
                let retry_after = resp
                    .headers()
                    .get(reqwest::header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(60);
                last_error = Some(DataError::RateLimited {
                    retry_after_secs: retry_after,
                });
                continue;
            }

            if status.is_server_error() {
                self.circuit_breaker.record_failure();
                last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                continue;
            }

            if status.is_client_error() {
                let body = resp.text().unwrap_or_default();
                return Err(api_error(symbol, status, &body));
            }

            let rows: Vec<Vec<Value>> = resp.json().map_err(|e| {
                DataError::ResponseFormatChanged(format!("failed to parse klines for {symbol}: {e}"))
            })?;
            self.circuit_breaker.record_success();
            return parse_klines(&rows);
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl DataProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(&self, symbol: &str, interval: Interval, limit: usize) -> Result<FetchResult, DataError> {
        tracing::info!(symbol, %interval, limit, "fetching klines from binance");

        let mut pages: Vec<Vec<Candle>> = Vec::new();
        let mut remaining = limit;
        let mut end_time = None;

        while remaining > 0 {
            let want = remaining.min(MAX_KLINES_PER_REQUEST);
            let page = self.fetch_page(symbol, interval, want, end_time)?;
            let got = page.len();
            tracing::debug!(symbol, want, got, ?end_time, "klines page");

            let Some(oldest) = page.first() else {
                break;
            };
            end_time = Some(oldest.timestamp.timestamp_millis() - 1);
            remaining -= got.min(remaining);
            pages.push(page);
            if got < want {
                // History exhausted
                break;
            }
        }

        let candles: Vec<Candle> = pages.into_iter().rev().flatten().collect();
        tracing::info!(symbol, candles = candles.len(), "klines fetched");

        Ok(FetchResult {
            symbol: symbol.to_string(),
            interval,
            candles,
            source: DataSource::Binance,
        })
    }

    fn is_available(&self) -> bool {
        self.circuit_breaker.is_allowed()
    }
}

fn api_error(symbol: &str, status: StatusCode, body: &str) -> DataError {
    match serde_json::from_str::<ApiError>(body) {
        Ok(err) if err.code == INVALID_SYMBOL => DataError::SymbolNotFound {
            symbol: symbol.to_string(),
        },
        Ok(err) => DataError::Api {
            code: err.code,
            message: err.msg,
        },
        Err(_) => DataError::Other(format!("HTTP {status} for {symbol}: {body}")),
    }
}

/// Parse kline arrays:
/// `[open_time, open, high, low, close, volume, close_time, quote_volume,
///   trades, taker_base_volume, taker_quote_volume, ignore]`.
pub(crate) fn parse_klines(rows: &[Vec<Value>]) -> Result<Vec<Candle>, DataError> {
    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            if row.len() < 6 {
                return Err(DataError::ResponseFormatChanged(format!(
                    "kline {i} has {} fields, expected 12",
                    row.len()
                )));
            }
            let open_time = row[0].as_i64().ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline {i}: open time is not an integer"))
            })?;
            let timestamp = DateTime::from_timestamp_millis(open_time).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline {i}: invalid open time {open_time}"))
            })?;
            Ok(Candle {
                timestamp,
                open: number(&row[1], i, "open")?,
                high: number(&row[2], i, "high")?,
                low: number(&row[3], i, "low")?,
                close: number(&row[4], i, "close")?,
                volume: number(&row[5], i, "volume")?,
            })
        })
        .collect()
}

fn number(value: &Value, index: usize, field: &str) -> Result<f64, DataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        DataError::ResponseFormatChanged(format!("kline {index}: {field} is not numeric ({value})"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use serde_json::json;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    fn sample_rows() -> Vec<Vec<Value>> {
        serde_json::from_str(
            r#"[
                [1704067200000, "42283.58", "44184.10", "42180.77", "44179.55", "27174.29",
                 1704153599999, "1169995220.53", 1198549, "13693.34", "589754217.43", "0"],
                [1704153600000, "44179.55", "45879.63", "44148.34", "44946.91", "65146.40",
                 1704239999999, "2928474457.63", 2086284, "32873.31", "1477731449.72", "0"]
            ]"#,
        )
        .unwrap()
    }

    #[test]
    fn parses_string_prices_keyed_by_open_time() {
        let candles = parse_klines(&sample_rows()).unwrap();
        assert_eq!(candles.len(), 2);
        assert_eq!(
            candles[0].timestamp,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(candles[0].open, 42283.58);
        assert_eq!(candles[0].close, 44179.55);
        assert_eq!(candles[1].high, 45879.63);
        assert_eq!(candles[1].volume, 65146.40);
    }

    #[test]
    fn short_or_malformed_rows_are_format_errors() {
        let rows: Vec<Vec<Value>> = serde_json::from_str(r#"[[1704067200000, "1.0"]]"#).unwrap();
        assert!(matches!(
            parse_klines(&rows),
            Err(DataError::ResponseFormatChanged(_))
        ));

        let rows: Vec<Vec<Value>> =
            serde_json::from_str(r#"[["soon", "1", "1", "1", "1", "1"]]"#).unwrap();
        assert!(matches!(
            parse_klines(&rows),
            Err(DataError::ResponseFormatChanged(_))
        ));

        let rows: Vec<Vec<Value>> =
            serde_json::from_str(r#"[[1704067200000, "1", "x", "1", "1", "1"]]"#).unwrap();
        let err = parse_klines(&rows).unwrap_err();
        assert!(err.to_string().contains("high"));
    }

    #[test]
    fn klines_url_includes_paging_cursor() {
        let provider = BinanceProvider::new(Arc::new(CircuitBreaker::default()))
            .with_base_url("http://localhost:9000/");
        assert_eq!(
            provider.klines_url("BTCUSDT", Interval::FourHours, 500, None),
            "http://localhost:9000/api/v3/klines?symbol=BTCUSDT&interval=4h&limit=500"
        );
        assert!(provider
            .klines_url("BTCUSDT", Interval::OneDay, 1000, Some(1704067199999))
            .ends_with("&endTime=1704067199999"));
    }

    #[test]
    fn api_errors_are_classified() {
        let err = api_error(
            "NOPE",
            StatusCode::BAD_REQUEST,
            r#"{"code":-1121,"msg":"Invalid symbol."}"#,
        );
        assert!(matches!(err, DataError::SymbolNotFound { symbol } if symbol == "NOPE"));

        let err = api_error(
            "BTCUSDT",
            StatusCode::BAD_REQUEST,
            r#"{"code":-1120,"msg":"Invalid interval."}"#,
        );
        assert!(matches!(err, DataError::Api { code: -1120, .. }));

        let err = api_error("BTCUSDT", StatusCode::NOT_FOUND, "<html>");
        assert!(matches!(err, DataError::Other(_)));
    }

    #[test]
    fn tripped_breaker_blocks_fetch() {
        let cb = Arc::new(CircuitBreaker::new(Duration::from_secs(60)));
        cb.trip();
        let provider = BinanceProvider::new(cb).with_base_url("http://127.0.0.1:9");
        assert!(!provider.is_available());
        assert!(matches!(
            provider.fetch("BTCUSDT", Interval::OneDay, 10),
            Err(DataError::CircuitBreakerTripped)
        ));
    }

    const T0: i64 = 1_700_000_000_000;
    const STEP: i64 = 15 * 60_000;

    /// Answers `responses` requests in order, one connection each, then exits.
    /// Returns the base URL and every request target seen.
    fn serve(
        responses: usize,
        respond: impl Fn(&str) -> String + Send + 'static,
    ) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = Arc::clone(&seen);
        std::thread::spawn(move || {
            for stream in listener.incoming().take(responses) {
                let mut stream = stream.unwrap();
                let mut reader = BufReader::new(stream.try_clone().unwrap());
                let mut request_line = String::new();
                reader.read_line(&mut request_line).unwrap();
                loop {
                    let mut header = String::new();
                    if reader.read_line(&mut header).unwrap() <= 2 {
                        break;
                    }
                }
                let target = request_line.split_whitespace().nth(1).unwrap_or("").to_string();
                let response = respond(&target);
                log.lock().unwrap().push(target);
                stream.write_all(response.as_bytes()).unwrap();
            }
        });
        (base, seen)
    }

    fn http(status: &str, headers: &str, body: &str) -> String {
        format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n{headers}\r\n{body}",
            body.len()
        )
    }

    /// Serve the newest `limit` of `total` klines at or before `endTime`.
    fn klines_body(total: i64, target: &str) -> String {
        let param = |name: &str| {
            target
                .split(['?', '&'])
                .find_map(|kv| kv.strip_prefix(name)?.strip_prefix('='))
                .map(|v| v.parse::<i64>().unwrap())
        };
        let limit = param("limit").unwrap() as usize;
        let end = param("endTime").unwrap_or(i64::MAX);

        let times: Vec<i64> = (0..total).map(|i| T0 + i * STEP).filter(|&t| t <= end).collect();
        let rows: Vec<Value> = times[times.len().saturating_sub(limit)..]
            .iter()
            .map(|&t| {
                let close = format!("{}", 100 + (t - T0) / STEP);
                json!([t, close, close, close, close, "10.0", t + STEP - 1, "0", 1, "0", "0", "0"])
            })
            .collect();
        serde_json::to_string(&rows).unwrap()
    }

    fn provider(base: String, breaker: Arc<CircuitBreaker>) -> BinanceProvider {
        let mut provider = BinanceProvider::new(breaker).with_base_url(base);
        provider.base_delay = Duration::ZERO;
        provider
    }

    #[test]
    fn large_limit_pages_backwards_and_stitches_oldest_first() {
        let (base, seen) = serve(2, |target| http("200 OK", "", &klines_body(1500, target)));
        let provider = provider(base, Arc::new(CircuitBreaker::default()));

        let result = provider.fetch("BTCUSDT", Interval::FifteenMinutes, 1200).unwrap();
        assert_eq!(result.source, DataSource::Binance);
        let candles = result.candles;
        assert_eq!(candles.len(), 1200);
        assert!(candles.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
        assert_eq!(candles[0].timestamp.timestamp_millis(), T0 + 300 * STEP);
        assert_eq!(candles[1199].timestamp.timestamp_millis(), T0 + 1499 * STEP);
        assert_eq!(candles[0].close, 400.0);

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert!(seen[0].ends_with("interval=15m&limit=1000"), "{}", seen[0]);
        assert!(
            seen[1].ends_with(&format!("limit=200&endTime={}", T0 + 500 * STEP - 1)),
            "{}",
            seen[1]
        );
    }

    #[test]
    fn repeated_429_is_rate_limited_then_breaker_opens() {
        let (base, seen) = serve(3, |_| {
            http(
                "429 Too Many Requests",
                "Retry-After: 7\r\n",
                r#"{"code":-1003,"msg":"Too many requests."}"#,
            )
        });
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(60)));
        let mut provider = provider(base, Arc::clone(&breaker));
        provider.max_retries = 2;

        let err = provider.fetch("BTCUSDT", Interval::OneDay, 10).unwrap_err();
        assert!(
            matches!(err, DataError::RateLimited { retry_after_secs: 7 }),
            "{err}"
        );
        assert_eq!(seen.lock().unwrap().len(), 3);

        // Three consecutive failures open the breaker; no further request goes out
        assert!(!provider.is_available());
        assert!(breaker.remaining_cooldown() > Duration::ZERO);
        assert!(matches!(
            provider.fetch("BTCUSDT", Interval::OneDay, 10),
            Err(DataError::CircuitBreakerTripped)
        ));
        assert_eq!(seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn server_error_is_retried() {
        let calls = AtomicUsize::new(0);
        let (base, seen) = serve(2, move |target| {
            if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                http("503 Service Unavailable", "", "")
            } else {
                http("200 OK", "", &klines_body(50, target))
            }
        });
        let breaker = Arc::new(CircuitBreaker::new(Duration::from_secs(60)));
        let provider = provider(base, Arc::clone(&breaker));

        let result = provider.fetch("ETHUSDT", Interval::OneDay, 5).unwrap();
        assert_eq!(result.candles.len(), 5);
        assert_eq!(result.candles[4].timestamp.timestamp_millis(), T0 + 49 * STEP);
        assert_eq!(seen.lock().unwrap().len(), 2);
        assert!(breaker.is_allowed());
    }
}

