use crate::error::ForecastError;

use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use time::OffsetDateTime;

/// Decode a forecast from the raw bytes of an API response body.
///
/// Fields missing from the payload are left at their zero value and unknown fields are ignored.
/// Either the whole document decodes or an error is returned.
pub fn parse_forecast(body: &[u8]) -> Result<Forecast, ForecastError> {
    Ok(serde_json::from_slice(body)?)
}

/// API responses consist of a UTF-8-encoded, JSON-formatted object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Forecast {
    /// The requested latitude.
    #[serde(skip_serializing_if = "is_zero")]
    pub latitude: f64,
    /// The requested longitude.
    #[serde(skip_serializing_if = "is_zero")]
    pub longitude: f64,
    /// The IANA timezone name for the requested location. Used for text summaries and for
    /// deciding where hourly and daily blocks begin.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub timezone: String,
    /// The timezone offset in hours. Fractional for zones such as India.
    #[serde(skip_serializing_if = "is_zero")]
    pub offset: f64,
    /// Conditions at the requested time.
    #[serde(skip_serializing_if = "DataPoint::is_empty")]
    pub currently: DataPoint,
    /// Minute-by-minute conditions for the next hour.
    #[serde(skip_serializing_if = "DataBlock::is_empty")]
    pub minutely: DataBlock,
    /// Hour-by-hour conditions for the next two days.
    #[serde(skip_serializing_if = "DataBlock::is_empty")]
    pub hourly: DataBlock,
    /// Day-by-day conditions for the next week.
    #[serde(skip_serializing_if = "DataBlock::is_empty")]
    pub daily: DataBlock,
    /// Severe weather alerts pertinent to the requested location.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<Alert>,
    /// Miscellaneous metadata about the request.
    #[serde(skip_serializing_if = "Flags::is_empty")]
    pub flags: Flags,
    /// Number of API calls made so far in the current billing period, as reported by the
    /// `X-Forecast-API-Calls` response header. Zero when the header was missing.
    #[serde(skip_serializing_if = "is_zero_count")]
    pub api_calls: u64,
    /// Status code of an error response.
    #[serde(skip_serializing_if = "is_zero_code")]
    pub code: u16,
    /// Error message of an error response.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub error: String,
}

impl Forecast {
    /// Whether the service reported an error status instead of forecast data
    pub fn is_error(&self) -> bool {
        self.code >= 400
    }
}

/// A data block describes the weather over a period of time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataBlock {
    /// A human-readable summary of this data block.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    /// A machine-readable summary of this data block, drawn from the same values as
    /// [`DataPoint::icon`].
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// Data points ordered by time.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub data: Vec<DataPoint>,
}

impl DataBlock {
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.icon.is_empty() && self.data.is_empty()
    }
}

/// A data point holds the weather over one period: an instant for `currently`, a minute for
/// `minutely`, an hour for `hourly` and a day for `daily`.
///
/// Which fields are populated depends on the block the point belongs to; minutely points carry no
/// temperature, and the min/max/high/low fields only appear on daily points. Times are UNIX
/// seconds and zero means "not reported". Units depend on the [`Units`](crate::Units) requested.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DataPoint {
    /// The UNIX time at which this data point begins. Aligned to the top of the minute, hour or
    /// day in the local timezone.
    #[serde(
        rename = "time",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub timestamp: i64,
    /// A human-readable summary. Don't match on it; use `icon` instead.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub summary: String,
    /// A machine-readable summary such as `clear-day`, `rain` or `partly-cloudy-night`. More
    /// values may be added over time, so callers need a fallback.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub icon: String,
    /// (only on daily)
    #[serde(
        rename = "sunriseTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub sunrise_timestamp: i64,
    /// (only on daily)
    #[serde(
        rename = "sunsetTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub sunset_timestamp: i64,
    /// Intensity of precipitation in liquid water per hour, assuming any occurs at all.
    #[serde(skip_serializing_if = "is_zero")]
    pub precip_intensity: f64,
    /// Standard deviation of `precip_intensity`, only when the full distribution is known.
    #[serde(skip_serializing_if = "is_zero")]
    pub precip_intensity_error: f64,
    /// (only on daily)
    #[serde(skip_serializing_if = "is_zero")]
    pub precip_intensity_max: f64,
    /// (only on daily)
    #[serde(
        rename = "precipIntensityMaxTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub precip_intensity_max_timestamp: i64,
    /// Between 0 and 1 inclusive.
    #[serde(skip_serializing_if = "is_zero")]
    pub precip_probability: f64,
    /// `rain`, `snow` or `sleet`. Not set when `precip_intensity` is zero.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub precip_type: String,
    /// Expected snowfall accumulation. (only on hourly and daily)
    #[serde(skip_serializing_if = "is_zero")]
    pub precip_accumulation: f64,
    /// Air temperature. (not on minutely)
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature_min: f64,
    #[serde(
        rename = "temperatureMinTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub temperature_min_timestamp: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature_max: f64,
    #[serde(
        rename = "temperatureMaxTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub temperature_max_timestamp: i64,
    /// Daytime high. (only on daily)
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature_high: f64,
    #[serde(
        rename = "temperatureHighTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub temperature_high_timestamp: i64,
    /// Overnight low. (only on daily)
    #[serde(skip_serializing_if = "is_zero")]
    pub temperature_low: f64,
    #[serde(
        rename = "temperatureLowTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub temperature_low_timestamp: i64,
    /// The "feels like" temperature.
    #[serde(skip_serializing_if = "is_zero")]
    pub apparent_temperature: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub apparent_temperature_min: f64,
    #[serde(
        rename = "apparentTemperatureMinTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub apparent_temperature_min_timestamp: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub apparent_temperature_max: f64,
    #[serde(
        rename = "apparentTemperatureMaxTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub apparent_temperature_max_timestamp: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub apparent_temperature_high: f64,
    #[serde(
        rename = "apparentTemperatureHighTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub apparent_temperature_high_timestamp: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub apparent_temperature_low: f64,
    #[serde(
        rename = "apparentTemperatureLowTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub apparent_temperature_low_timestamp: i64,
    #[serde(skip_serializing_if = "is_zero")]
    pub dew_point: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub wind_speed: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub wind_gust: f64,
    #[serde(
        rename = "windGustTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub wind_gust_timestamp: i64,
    /// Direction the wind is coming from in degrees, clockwise from true north. Not set when
    /// `wind_speed` is zero.
    #[serde(skip_serializing_if = "is_zero")]
    pub wind_bearing: f64,
    /// Fraction of sky occluded by clouds, between 0 and 1 inclusive.
    #[serde(skip_serializing_if = "is_zero")]
    pub cloud_cover: f64,
    /// Relative humidity, between 0 and 1 inclusive.
    #[serde(skip_serializing_if = "is_zero")]
    pub humidity: f64,
    /// Sea-level air pressure.
    #[serde(skip_serializing_if = "is_zero")]
    pub pressure: f64,
    /// Average visibility, capped at 10 miles.
    #[serde(skip_serializing_if = "is_zero")]
    pub visibility: f64,
    /// Columnar density of total atmospheric ozone in Dobson units.
    #[serde(skip_serializing_if = "is_zero")]
    pub ozone: f64,
    #[serde(skip_serializing_if = "is_zero")]
    pub uv_index: f64,
    #[serde(
        rename = "uvIndexTime",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub uv_index_timestamp: i64,
    /// Fractional part of the lunation number: 0 is a new moon, 0.25 first quarter, 0.5 full
    /// moon and 0.75 last quarter. (only on daily)
    #[serde(skip_serializing_if = "is_zero")]
    pub moon_phase: f64,
    /// Approximate direction of the nearest storm in degrees. (only on currently)
    #[serde(skip_serializing_if = "is_zero")]
    pub nearest_storm_bearing: f64,
    /// Approximate distance to the nearest storm. (only on currently)
    #[serde(skip_serializing_if = "is_zero")]
    pub nearest_storm_distance: f64,
}

impl DataPoint {
    pub fn is_empty(&self) -> bool {
        *self == DataPoint::default()
    }

    /// The time at which this data point begins.
    pub fn time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.timestamp)
    }

    pub fn sunrise_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.sunrise_timestamp)
    }

    pub fn sunset_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.sunset_timestamp)
    }

    pub fn precip_intensity_max_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.precip_intensity_max_timestamp)
    }

    pub fn temperature_min_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.temperature_min_timestamp)
    }

    pub fn temperature_max_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.temperature_max_timestamp)
    }

    pub fn temperature_high_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.temperature_high_timestamp)
    }

    pub fn temperature_low_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.temperature_low_timestamp)
    }

    pub fn apparent_temperature_min_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.apparent_temperature_min_timestamp)
    }

    pub fn apparent_temperature_max_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.apparent_temperature_max_timestamp)
    }

    pub fn apparent_temperature_high_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.apparent_temperature_high_timestamp)
    }

    pub fn apparent_temperature_low_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.apparent_temperature_low_timestamp)
    }

    pub fn wind_gust_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.wind_gust_timestamp)
    }

    pub fn uv_index_time(&self) -> Option<OffsetDateTime> {
        to_datetime(self.uv_index_timestamp)
    }
}

/// A severe weather warning issued for the requested location by a governmental authority.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Alert {
    /// A brief description of the alert.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub title: String,
    /// A detailed description of the alert.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    /// Names of the regions covered by this alert.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub regions: Vec<String>,
    /// `advisory`, `watch` or `warning`.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub severity: String,
    /// The UNIX time at which the alert was issued.
    #[serde(
        rename = "time",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub timestamp: i64,
    /// The UNIX time at which the alert will expire.
    #[serde(
        rename = "expires",
        deserialize_with = "unix_time",
        skip_serializing_if = "is_zero_time"
    )]
    pub expires_timestamp: i64,
    /// Where to find detailed information about the alert.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub uri: String,
}

impl Alert {
    pub fn issued(&self) -> Option<OffsetDateTime> {
        to_datetime(self.timestamp)
    }

    pub fn expires(&self) -> Option<OffsetDateTime> {
        to_datetime(self.expires_timestamp)
    }
}

/// Metadata about which sources contributed to a response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Flags {
    /// The primary data source covers the location but was temporarily unavailable. The service
    /// signals this by the mere presence of the key.
    #[serde(
        rename = "darksky-unavailable",
        deserialize_with = "key_present",
        skip_serializing_if = "is_false"
    )]
    pub darksky_unavailable: bool,
    #[serde(rename = "darksky-stations", skip_serializing_if = "Vec::is_empty")]
    pub darksky_stations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub datapoint_stations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub isd_stations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub lamp_stations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub madis_stations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub metar_stations: Vec<String>,
    /// License text that applies when the Norwegian Meteorological Institute data was used.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub metno_license: String,
    /// IDs of every data source used for this request.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sources: Vec<String>,
    /// Distance to the nearest contributing station, in miles or kilometers depending on units.
    #[serde(skip_serializing_if = "is_zero")]
    pub nearest_station: f64,
    /// The unit system the data in this response is reported in.
    #[serde(skip_serializing_if = "String::is_empty")]
    pub units: String,
}

impl Flags {
    pub fn is_empty(&self) -> bool {
        *self == Flags::default()
    }
}

fn to_datetime(timestamp: i64) -> Option<OffsetDateTime> {
    if timestamp == 0 {
        None
    } else {
        OffsetDateTime::from_unix_timestamp(timestamp).ok()
    }
}

fn key_present<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    serde::de::IgnoredAny::deserialize(deserializer).map(|_| true)
}

/// Read a UNIX time sent either as an integer or as a floating point number. Fractional seconds
/// are truncated.
fn unix_time<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    struct UnixTime;

    impl Visitor<'_> for UnixTime {
        type Value = i64;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a UNIX timestamp")
        }

        fn visit_i64<E: de::Error>(self, value: i64) -> Result<i64, E> {
            Ok(value)
        }

        fn visit_u64<E: de::Error>(self, value: u64) -> Result<i64, E> {
            i64::try_from(value).map_err(|_| E::invalid_value(Unexpected::Unsigned(value), &self))
        }

        fn visit_f64<E: de::Error>(self, value: f64) -> Result<i64, E> {
            // i64::MAX as f64 rounds up to 2^63
            if value.is_finite() && value >= i64::MIN as f64 && value < i64::MAX as f64 {
                Ok(value.trunc() as i64)
            } else {
                Err(E::invalid_value(Unexpected::Float(value), &self))
            }
        }
    }

    deserializer.deserialize_any(UnixTime)
}

fn is_zero(value: &f64) -> bool {
    *value == 0.0
}

fn is_zero_time(value: &i64) -> bool {
    *value == 0
}

fn is_zero_count(value: &u64) -> bool {
    *value == 0
}

fn is_zero_code(value: &u16) -> bool {
    *value == 0
}

fn is_false(value: &bool) -> bool {
    !*value
}
