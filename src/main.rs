#![forbid(unsafe_code)]

#[macro_use]
extern crate log;

use forecast_client::{
    ClientConfig, ForecastClient, ForecastRequest, Language, TimeSpec, Units, timed,
};

use clap::{Arg, ArgAction, Command};
use env_logger::Env;
use time::format_description::well_known::Rfc3339;

use std::error::Error;
use std::process::ExitCode;

fn main() -> ExitCode {
    let env = Env::default().filter_or("FORECAST_LOG_LEVEL", "info");
    env_logger::init_from_env(env);

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let matches = Command::new("forecast-client")
        .version("0.1")
        .author("Chris Lieb")
        .about("Fetch a forecast and print it as JSON")
        .arg(Arg::new("latitude").required(true).allow_hyphen_values(true))
        .arg(Arg::new("longitude").required(true).allow_hyphen_values(true))
        .arg(Arg::new("config").short('c').long("config"))
        .arg(
            Arg::new("key")
                .short('k')
                .long("key")
                .env("FORECAST_API_KEY")
                .hide_env_values(true),
        )
        .arg(
            Arg::new("time")
                .short('t')
                .long("time")
                .default_value("now")
                .value_parser(clap::value_parser!(TimeSpec)),
        )
        .arg(
            Arg::new("units")
                .short('u')
                .long("units")
                .value_parser(clap::value_parser!(Units)),
        )
        .arg(
            Arg::new("lang")
                .short('l')
                .long("lang")
                .value_parser(clap::value_parser!(Language)),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            Arg::new("print_url")
                .long("print-url")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => {
            info!("Reading config from {path}");
            ClientConfig::from_file(path)?
        }
        None => ClientConfig::default(),
    };
    if let Some(key) = matches.get_one::<String>("key") {
        config.api_key = Some(key.clone());
    }
    if let Some(units) = matches.get_one::<Units>("units") {
        config.units = *units;
    }
    if let Some(lang) = matches.get_one::<Language>("lang") {
        config.language = Some(*lang);
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.timeout_secs = Some(*timeout);
    }

    let api_key = config
        .api_key
        .clone()
        .ok_or("No API key given. Use --key, FORECAST_API_KEY or api_key in the config file")?;
    let mut request = ForecastRequest::new(
        api_key,
        required(&matches, "latitude")?,
        required(&matches, "longitude")?,
    )
    .units(config.units);
    if let Some(time) = matches.get_one::<TimeSpec>("time") {
        request = request.at(*time);
    }
    if let Some(lang) = config.language {
        request = request.language(lang);
    }

    let client = ForecastClient::with_config(&config)?;
    if matches.get_flag("print_url") {
        println!("{}", client.build_request_url(&request)?);
        return Ok(());
    }

    let forecast = timed!("Fetching forecast for {:?}", request; || client.fetch(&request))?;
    if let Some(time) = forecast.currently.time() {
        info!(
            "Conditions at {}: {} (API calls so far: {})",
            time.format(&Rfc3339)?,
            forecast.currently.summary,
            forecast.api_calls
        );
    }
    println!("{}", serde_json::to_string_pretty(&forecast)?);

    Ok(())
}

fn required(matches: &clap::ArgMatches, name: &str) -> Result<String, String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument {name}"))
}
