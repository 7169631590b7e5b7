use crate::config::ClientConfig;
use crate::error::{ForecastError, TransportError};
use crate::forecast::{Forecast, parse_forecast};
use crate::params::{Language, TimeSpec, Units};

use reqwest::blocking::{Client, ClientBuilder, Response};
use reqwest::header::HeaderMap;
use reqwest::{StatusCode, Url};
use tokio_util::sync::CancellationToken;

use std::fmt;
use std::time::{Duration, Instant};

/// Response header carrying the number of calls made in the current billing period
pub const API_CALLS_HEADER: &str = "X-Forecast-API-Calls";

/// Everything that identifies one forecast request.
#[derive(Clone, PartialEq, Eq)]
pub struct ForecastRequest {
    pub api_key: String,
    /// Decimal degrees, sent exactly as given
    pub latitude: String,
    /// Decimal degrees, sent exactly as given
    pub longitude: String,
    pub time: TimeSpec,
    pub units: Units,
    /// The service default (English) when unset
    pub language: Option<Language>,
}

impl ForecastRequest {
    /// A request for the current forecast at a location in the default units and language
    pub fn new<K, La, Lo>(api_key: K, latitude: La, longitude: Lo) -> ForecastRequest
    where
        K: Into<String>,
        La: Into<String>,
        Lo: Into<String>,
    {
        ForecastRequest {
            api_key: api_key.into(),
            latitude: latitude.into(),
            longitude: longitude.into(),
            time: TimeSpec::Now,
            units: Units::default(),
            language: None,
        }
    }

    pub fn at(mut self, time: TimeSpec) -> ForecastRequest {
        self.time = time;
        self
    }

    pub fn units(mut self, units: Units) -> ForecastRequest {
        self.units = units;
        self
    }

    pub fn language(mut self, language: Language) -> ForecastRequest {
        self.language = Some(language);
        self
    }
}

impl fmt::Debug for ForecastRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ForecastRequest")
            .field("api_key", &"***")
            .field("latitude", &self.latitude)
            .field("longitude", &self.longitude)
            .field("time", &self.time)
            .field("units", &self.units)
            .field("language", &self.language)
            .finish()
    }
}

/// Build the URL for a request:
/// `<base>/<api_key>/<latitude>,<longitude>[,<time>]?units=<units>[&lang=<language>]`
///
/// Fails with [`ForecastError::InvalidBaseUrl`] when `base` cannot carry path segments, as with
/// `mailto:` or `data:` URLs.
pub fn build_request_url(base: &Url, request: &ForecastRequest) -> Result<Url, ForecastError> {
    let mut url = base.clone();

    let location = match request.time.timestamp() {
        Some(ts) => format!("{},{},{}", request.latitude, request.longitude, ts),
        None => format!("{},{}", request.latitude, request.longitude),
    };
    url.path_segments_mut()
        .map_err(|()| cannot_carry_path(base.as_str()))?
        .pop_if_empty()
        .push(&request.api_key)
        .push(&location);

    url.set_query(None);
    {
        let mut query = url.query_pairs_mut();
        query.append_pair("units", request.units.as_str());
        if let Some(language) = request.language {
            query.append_pair("lang", language.as_str());
        }
    }

    Ok(url)
}

/// The request URL with the API key masked, safe to log
pub fn redacted_request_url(base: &Url, request: &ForecastRequest) -> Result<Url, ForecastError> {
    let masked = ForecastRequest {
        api_key: "***".to_string(),
        ..request.clone()
    };
    build_request_url(base, &masked)
}

fn cannot_carry_path(url: &str) -> ForecastError {
    ForecastError::InvalidBaseUrl {
        url: url.to_string(),
        reason: "URL cannot carry path segments".to_string(),
    }
}

/// Blocking client for the forecast API.
///
/// Holds no per-request state; every call performs exactly one GET request and clones share the
/// same connection pool.
#[derive(Debug, Clone)]
pub struct ForecastClient {
    base_url: Url,
    http_client: Client,
    timeout: Option<Duration>,
}

impl ForecastClient {
    /// Construct a client talking to the public endpoint with no timeout
    pub fn new() -> Result<ForecastClient, ForecastError> {
        ForecastClient::with_config(&ClientConfig::default())
    }

    pub fn with_config(config: &ClientConfig) -> Result<ForecastClient, ForecastError> {
        ForecastClient::build(&config.base_url, config.timeout())
    }

    /// Construct a client for `base_url` whose requests give up after `timeout`
    pub fn with_timeout(base_url: &str, timeout: Duration) -> Result<ForecastClient, ForecastError> {
        ForecastClient::build(base_url, Some(timeout))
    }

    fn build(base_url: &str, timeout: Option<Duration>) -> Result<ForecastClient, ForecastError> {
        let base_url = Self::parse_base_url(base_url)?;

        // reqwest's blocking client gives up after 30s unless told otherwise
        let http_client = ClientBuilder::new()
            .gzip(true)
            .timeout(timeout)
            .build()
            .map_err(TransportError::Request)?;

        Ok(ForecastClient {
            base_url,
            http_client,
            timeout,
        })
    }

    fn parse_base_url(base_url: &str) -> Result<Url, ForecastError> {
        let url = Url::parse(base_url).map_err(|err| ForecastError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: err.to_string(),
        })?;
        if url.cannot_be_a_base() {
            return Err(cannot_carry_path(base_url));
        }
        Ok(url)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The limit on a whole request, or `None` when requests may take as long as the server does
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The exact URL [`fetch`](Self::fetch) would request, API key included
    pub fn build_request_url(&self, request: &ForecastRequest) -> Result<String, ForecastError> {
        Ok(build_request_url(&self.base_url, request)?.to_string())
    }

    /// Fetch and decode the forecast for `request`.
    ///
    /// Non-success statuses are not transport failures: the service describes them in a JSON
    /// body, which is decoded like any other response and carries the status in
    /// [`Forecast::code`].
    pub fn fetch(&self, request: &ForecastRequest) -> Result<Forecast, ForecastError> {
        let url = build_request_url(&self.base_url, request)?;
        let redacted = redacted_request_url(&self.base_url, request)?;
        Self::execute(&self.http_client, url, redacted)
    }

    /// Like [`fetch`](Self::fetch), but aborts the request as soon as `cancel` is triggered.
    ///
    /// The request is driven on a single-threaded runtime owned by this call and raced against
    /// the token. Cancelling drops the in-flight request, which closes its connection, and the
    /// call returns [`TransportError::Cancelled`].
    pub fn fetch_with_cancel(
        &self,
        request: &ForecastRequest,
        cancel: &CancellationToken,
    ) -> Result<Forecast, ForecastError> {
        if cancel.is_cancelled() {
            return Err(TransportError::Cancelled.into());
        }

        let url = build_request_url(&self.base_url, request)?;
        let redacted = redacted_request_url(&self.base_url, request)?;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(TransportError::Runtime)?;

        runtime.block_on(async {
            let http_client = self.async_client()?;
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    info!("Forecast request cancelled");
                    Err(ForecastError::from(TransportError::Cancelled))
                }
                result = Self::execute_async(&http_client, url, redacted) => result,
            }
        })
    }

    /// An async client configured like the blocking one, for requests that must be abortable
    fn async_client(&self) -> Result<reqwest::Client, ForecastError> {
        let mut builder = reqwest::Client::builder().gzip(true);
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        Ok(builder.build().map_err(TransportError::Request)?)
    }

    fn execute(http_client: &Client, url: Url, redacted: Url) -> Result<Forecast, ForecastError> {
        info!("Calling forecast API: {redacted}");

        let res = timed!("GET {}", redacted; || http_client.get(url).send())
            .map_err(TransportError::from_send)?;
        Self::read_response(res)
    }

    async fn execute_async(
        http_client: &reqwest::Client,
        url: Url,
        redacted: Url,
    ) -> Result<Forecast, ForecastError> {
        info!("Calling forecast API: {redacted}");

        let start_time = Instant::now();
        debug!("Start: GET {redacted}");
        let res = http_client
            .get(url)
            .send()
            .await
            .map_err(TransportError::from_send)?;
        debug!("End:   GET {redacted}: {:?}", start_time.elapsed());

        let status = res.status();
        let api_calls = api_calls(res.headers());
        let body = res.bytes().await.map_err(TransportError::from_body)?;
        Self::decode_response(status, api_calls, &body)
    }

    fn read_response(res: Response) -> Result<Forecast, ForecastError> {
        let status = res.status();
        let api_calls = api_calls(res.headers());
        let body = res.bytes().map_err(TransportError::from_body)?;
        Self::decode_response(status, api_calls, &body)
    }

    fn decode_response(
        status: StatusCode,
        api_calls: u64,
        body: &[u8],
    ) -> Result<Forecast, ForecastError> {
        let mut forecast = parse_forecast(body)?;
        forecast.api_calls = api_calls;
        if !status.is_success() {
            warn!("Forecast API returned status {status}");
            if forecast.code == 0 {
                forecast.code = status.as_u16();
            }
        }

        Ok(forecast)
    }
}

/// Read the usage counter header, treating a missing or malformed value as zero
fn api_calls(headers: &HeaderMap) -> u64 {
    match headers.get(API_CALLS_HEADER) {
        None => 0,
        Some(value) => value
            .to_str()
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or_else(|| {
                warn!("Ignoring malformed {API_CALLS_HEADER} header: {value:?}");
                0
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderName, HeaderValue};

    const KEY: &str = "0123456789abcdef";

    fn base() -> Url {
        Url::parse("https://api.forecast.io/forecast").unwrap()
    }

    #[test]
    fn url_for_current_forecast() {
        let request = ForecastRequest::new(KEY, "37.8267", "-122.423").units(Units::Ca);
        let url = build_request_url(&base(), &request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.forecast.io/forecast/0123456789abcdef/37.8267,-122.423?units=ca"
        );
    }

    #[test]
    fn url_for_time_machine_request() {
        let request = ForecastRequest::new(KEY, "37.8267", "-122.423")
            .at(TimeSpec::At(1445817600))
            .units(Units::Si)
            .language(Language::ZhTw);
        let url = build_request_url(&base(), &request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.forecast.io/forecast/0123456789abcdef/37.8267,-122.423,1445817600\
             ?units=si&lang=zh-tw"
        );
    }

    #[test]
    fn url_contains_key_once_and_time_only_when_requested() {
        for units in Units::ALL {
            for language in [None, Some(Language::De), Some(Language::ZhTw)] {
                for time in [TimeSpec::Now, TimeSpec::At(1509993360)] {
                    let request = ForecastRequest {
                        api_key: KEY.to_string(),
                        latitude: "42.3601".to_string(),
                        longitude: "-71.0589".to_string(),
                        time,
                        units,
                        language,
                    };
                    let url = build_request_url(&base(), &request).unwrap().to_string();

                    assert_eq!(url.matches(KEY).count(), 1);
                    assert!(url.contains("/42.3601,-71.0589"));
                    assert!(url.contains(&format!("units={}", units.as_str())));
                    assert_eq!(url.contains("1509993360"), time != TimeSpec::Now);
                    assert_eq!(url.contains("lang="), language.is_some());
                }
            }
        }
    }

    #[test]
    fn trailing_slash_on_base_is_tolerated() {
        let base = Url::parse("http://localhost:8080/forecast/").unwrap();
        let request = ForecastRequest::new(KEY, "1.5", "2.5");
        let url = build_request_url(&base, &request).unwrap();
        assert_eq!(
            url.as_str(),
            "http://localhost:8080/forecast/0123456789abcdef/1.5,2.5?units=us"
        );
    }

    #[test]
    fn path_segments_are_escaped() {
        let request = ForecastRequest::new("a/b c", "1", "2");
        let url = build_request_url(&base(), &request).unwrap();
        assert_eq!(
            url.as_str(),
            "https://api.forecast.io/forecast/a%2Fb%20c/1,2?units=us"
        );
    }

    #[test]
    fn client_url_matches_free_function() {
        let client = ForecastClient::new().unwrap();
        let request = ForecastRequest::new(KEY, "37.8", "-122.4");
        assert_eq!(
            client.build_request_url(&request).unwrap(),
            build_request_url(&base(), &request).unwrap().to_string()
        );
    }

    #[test]
    fn invalid_base_url_rejected() {
        for base_url in ["not a url", "mailto:forecast@example.com"] {
            let config = ClientConfig {
                base_url: base_url.to_string(),
                ..Default::default()
            };
            let err = ForecastClient::with_config(&config).unwrap_err();
            assert!(matches!(err, ForecastError::InvalidBaseUrl { .. }));
        }
    }

    #[test]
    fn base_without_path_is_rejected_when_building_url() {
        let base = Url::parse("mailto:forecast@example.com").unwrap();
        let request = ForecastRequest::new(KEY, "37.8267", "-122.423");

        let err = build_request_url(&base, &request).unwrap_err();
        assert!(matches!(err, ForecastError::InvalidBaseUrl { .. }));
        assert!(!err.to_string().contains(KEY));
        assert!(redacted_request_url(&base, &request).is_err());
    }

    #[test]
    fn timeout_is_unlimited_unless_configured() {
        assert_eq!(ForecastClient::new().unwrap().timeout(), None);

        let config = ClientConfig {
            timeout_secs: Some(3),
            ..Default::default()
        };
        let client = ForecastClient::with_config(&config).unwrap();
        assert_eq!(client.timeout(), Some(Duration::from_secs(3)));
    }

    #[test]
    fn redaction_hides_key() {
        let request = ForecastRequest::new(KEY, "1", "2").at(TimeSpec::At(60));
        assert_eq!(
            redacted_request_url(&base(), &request).unwrap().as_str(),
            "https://api.forecast.io/forecast/***/1,2,60?units=us"
        );

        let request = ForecastRequest::new("key with spaces", "1", "2");
        let redacted = redacted_request_url(&base(), &request).unwrap().to_string();
        assert!(!redacted.contains("key"));
    }

    #[test]
    fn request_debug_hides_key() {
        let request = ForecastRequest::new(KEY, "1", "2");
        assert!(!format!("{request:?}").contains(KEY));
    }

    #[test]
    fn api_calls_header_parsing() {
        let mut headers = HeaderMap::new();
        assert_eq!(api_calls(&headers), 0);

        let name = HeaderName::from_static("x-forecast-api-calls");
        headers.insert(name.clone(), HeaderValue::from_static("42"));
        assert_eq!(api_calls(&headers), 42);

        headers.insert(name, HeaderValue::from_static("lots"));
        assert_eq!(api_calls(&headers), 0);
    }

    #[test]
    fn cancelled_token_short_circuits() {
        let client = ForecastClient::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let err = client
            .fetch_with_cancel(&ForecastRequest::new(KEY, "1", "2"), &token)
            .unwrap_err();
        assert!(matches!(
            err,
            ForecastError::Transport(TransportError::Cancelled)
        ));
    }
}
