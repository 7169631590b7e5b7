use crate::error::ParamError;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use std::fmt;
use std::str::FromStr;

/// The unit system the API should report measurements in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    /// Same as si, except wind speed is in kilometers per hour
    Ca,
    Si,
    /// Imperial units
    #[default]
    Us,
    /// Same as si, except visibility is in miles and wind speed in miles per hour
    Uk,
    /// Successor of uk used by later API revisions
    Uk2,
    /// Pick units based on the requested location
    Auto,
}

impl Units {
    pub const ALL: [Units; 6] = [
        Units::Ca,
        Units::Si,
        Units::Us,
        Units::Uk,
        Units::Uk2,
        Units::Auto,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Units::Ca => "ca",
            Units::Si => "si",
            Units::Us => "us",
            Units::Uk => "uk",
            Units::Uk2 => "uk2",
            Units::Auto => "auto",
        }
    }
}

impl fmt::Display for Units {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Units {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        Units::ALL
            .iter()
            .find(|units| units.as_str() == lower)
            .copied()
            .ok_or_else(|| ParamError::UnknownUnits(s.to_string()))
    }
}

/// The language text summaries are returned in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Language {
    Ar,
    Az,
    Be,
    Bg,
    Bs,
    Ca,
    Cs,
    De,
    El,
    En,
    Es,
    Et,
    Fr,
    Hr,
    Hu,
    Id,
    Is,
    It,
    Kw,
    Nb,
    Nl,
    Pl,
    Pt,
    Ru,
    Sk,
    Sl,
    Sr,
    Sv,
    Tr,
    Uk,
    Zh,
    /// Traditional Chinese
    ZhTw,
}

impl Language {
    pub const ALL: [Language; 32] = [
        Language::Ar,
        Language::Az,
        Language::Be,
        Language::Bg,
        Language::Bs,
        Language::Ca,
        Language::Cs,
        Language::De,
        Language::El,
        Language::En,
        Language::Es,
        Language::Et,
        Language::Fr,
        Language::Hr,
        Language::Hu,
        Language::Id,
        Language::Is,
        Language::It,
        Language::Kw,
        Language::Nb,
        Language::Nl,
        Language::Pl,
        Language::Pt,
        Language::Ru,
        Language::Sk,
        Language::Sl,
        Language::Sr,
        Language::Sv,
        Language::Tr,
        Language::Uk,
        Language::Zh,
        Language::ZhTw,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Language::Ar => "ar",
            Language::Az => "az",
            Language::Be => "be",
            Language::Bg => "bg",
            Language::Bs => "bs",
            Language::Ca => "ca",
            Language::Cs => "cs",
            Language::De => "de",
            Language::El => "el",
            Language::En => "en",
            Language::Es => "es",
            Language::Et => "et",
            Language::Fr => "fr",
            Language::Hr => "hr",
            Language::Hu => "hu",
            Language::Id => "id",
            Language::Is => "is",
            Language::It => "it",
            Language::Kw => "kw",
            Language::Nb => "nb",
            Language::Nl => "nl",
            Language::Pl => "pl",
            Language::Pt => "pt",
            Language::Ru => "ru",
            Language::Sk => "sk",
            Language::Sl => "sl",
            Language::Sr => "sr",
            Language::Sv => "sv",
            Language::Tr => "tr",
            Language::Uk => "uk",
            Language::Zh => "zh",
            Language::ZhTw => "zh-tw",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // accept zh_TW as well as zh-tw
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Language::ALL
            .iter()
            .find(|lang| lang.as_str() == normalized)
            .copied()
            .ok_or_else(|| ParamError::UnknownLanguage(s.to_string()))
    }
}

/// Which instant to request data for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TimeSpec {
    /// Current conditions and the forecast from now on
    #[default]
    Now,
    /// Conditions at the given UNIX time, past (historical) or future
    At(i64),
}

impl TimeSpec {
    /// The timestamp that goes into the URL path, if any
    pub fn timestamp(&self) -> Option<i64> {
        match self {
            TimeSpec::Now => None,
            TimeSpec::At(ts) => Some(*ts),
        }
    }
}

impl fmt::Display for TimeSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeSpec::Now => f.write_str("now"),
            TimeSpec::At(ts) => write!(f, "{ts}"),
        }
    }
}

impl FromStr for TimeSpec {
    type Err = ParamError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("now") {
            return Ok(TimeSpec::Now);
        }
        trimmed
            .parse::<i64>()
            .map(TimeSpec::At)
            .map_err(|_| ParamError::InvalidTime(s.to_string()))
    }
}

impl From<OffsetDateTime> for TimeSpec {
    fn from(dt: OffsetDateTime) -> Self {
        TimeSpec::At(dt.unix_timestamp())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn units_as_str_roundtrip() {
        for units in Units::ALL {
            let parsed: Units = units.as_str().parse().unwrap();
            assert_eq!(units, parsed);
        }
    }

    #[test]
    fn units_parse_is_case_insensitive() {
        assert_eq!("SI".parse::<Units>().unwrap(), Units::Si);
        assert_eq!(" auto ".parse::<Units>().unwrap(), Units::Auto);
    }

    #[test]
    fn unknown_units_rejected() {
        let err = "metric".parse::<Units>().unwrap_err();
        assert_eq!(err, ParamError::UnknownUnits("metric".to_string()));
    }

    #[test]
    fn units_serde_matches_query_value() {
        assert_eq!(serde_json::to_string(&Units::Uk2).unwrap(), "\"uk2\"");
        let units: Units = serde_json::from_str("\"ca\"").unwrap();
        assert_eq!(units, Units::Ca);
    }

    #[test]
    fn language_as_str_roundtrip() {
        for lang in Language::ALL {
            let parsed: Language = lang.as_str().parse().unwrap();
            assert_eq!(lang, parsed);
        }
    }

    #[test]
    fn traditional_chinese_spellings() {
        assert_eq!("zh-tw".parse::<Language>().unwrap(), Language::ZhTw);
        assert_eq!("zh_TW".parse::<Language>().unwrap(), Language::ZhTw);
        assert_eq!(
            serde_json::to_string(&Language::ZhTw).unwrap(),
            "\"zh-tw\""
        );
        let lang: Language = serde_json::from_str("\"zh-tw\"").unwrap();
        assert_eq!(lang, Language::ZhTw);
    }

    #[test]
    fn unknown_language_rejected() {
        assert!(matches!(
            "klingon".parse::<Language>(),
            Err(ParamError::UnknownLanguage(_))
        ));
    }

    #[test]
    fn time_spec_parsing() {
        assert_eq!("now".parse::<TimeSpec>().unwrap(), TimeSpec::Now);
        assert_eq!("NOW".parse::<TimeSpec>().unwrap(), TimeSpec::Now);
        assert_eq!(
            "1445817600".parse::<TimeSpec>().unwrap(),
            TimeSpec::At(1445817600)
        );
        assert_eq!("-86400".parse::<TimeSpec>().unwrap(), TimeSpec::At(-86400));
        assert_eq!(
            "2015-10-26".parse::<TimeSpec>().unwrap_err(),
            ParamError::InvalidTime("2015-10-26".to_string())
        );
    }

    #[test]
    fn time_spec_from_datetime() {
        let spec = TimeSpec::from(datetime!(2015-10-26 00:00 UTC));
        assert_eq!(spec, TimeSpec::At(1445817600));
        assert_eq!(spec.to_string(), "1445817600");
        assert_eq!(TimeSpec::Now.timestamp(), None);
    }
}
