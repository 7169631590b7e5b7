//! Client for the Forecast (Dark Sky) weather API.
//!
//! A [`ForecastClient`] turns a [`ForecastRequest`] into a single blocking GET request and decodes
//! the JSON answer into a [`Forecast`]. Responses obtained some other way can be decoded with
//! [`parse_forecast`].
//!
//! ```no_run
//! use forecast_client::{ForecastClient, ForecastRequest, Language, Units};
//!
//! let client = ForecastClient::new()?;
//! let request = ForecastRequest::new("my-api-key", "37.8267", "-122.423")
//!     .units(Units::Si)
//!     .language(Language::De);
//! let forecast = client.fetch(&request)?;
//! println!("{} ({} calls today)", forecast.currently.summary, forecast.api_calls);
//! # Ok::<(), forecast_client::ForecastError>(())
//! ```
#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

#[macro_use]
mod timed;

pub mod client;
pub mod config;
pub mod error;
pub mod forecast;
pub mod params;

pub use client::{
    API_CALLS_HEADER, ForecastClient, ForecastRequest, build_request_url, redacted_request_url,
};
pub use config::{ClientConfig, ConfigError};
pub use error::{ForecastError, ParamError, TransportError};
pub use forecast::{Alert, DataBlock, DataPoint, Flags, Forecast, parse_forecast};
pub use params::{Language, TimeSpec, Units};
pub use tokio_util::sync::CancellationToken;
