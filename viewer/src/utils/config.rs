use std::fs;
use tokio::sync::RwLock;
use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use crate::utils::logging::*;

lazy_static! {
    static ref CONFIG: RwLock<Config> = RwLock::new(Config::new());
}

#[derive(Debug, Deserialize)]
struct ConfigTable {
    #[serde(rename = "Config")]
    config: Config,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Config {
    pub http_server_bind_port: u16, //port
    pub bind_retry_duration: u64, //seconds
    pub request_timeout: u64, //seconds
    pub connect_timeout: u64, //seconds
    pub default_service_address: String, //url
    pub default_threshold: f64, //confidence
    pub storage_path: String, //path, empty keeps addresses in memory
}

impl Config {
    pub fn new() -> Self {
        //Seriously, the program must be terminated.
        match fs::read_to_string("./viewer.toml") {
            Ok(toml_string) => Self::parse(&toml_string).unwrap_or_else(|err| {
                logging_console!(LogEntry::new(LogLevel::Emergency, format!("{}:{}", file!(), line!()), SystemEntry::InvalidConfig, err));
                panic!("Invalid configuration file");
            }),
            Err(err) => {
                logging_console!(LogEntry::new(LogLevel::Emergency, format!("{}:{}", file!(), line!()), SystemEntry::ConfigNotFound, format!("Err: {err}")));
                panic!("Configuration file not found");
            }
        }
    }

    fn parse(toml_string: &str) -> Result<Config, String> {
        let config = toml::from_str::<ConfigTable>(toml_string)
            .map_err(|err| format!("Err: {err}"))?
            .config;
        if Self::validate(&config) {
            Ok(config)
        } else {
            Err("Err: Value out of range".to_string())
        }
    }

    pub async fn now() -> Config {
        CONFIG.read().await.clone()
    }

    pub async fn update(config: Config) {
        *CONFIG.write().await = config
    }

    pub fn validate(config: &Config) -> bool {
        Config::validate_second(config.bind_retry_duration)
            && Config::validate_timeout(config.request_timeout)
            && Config::validate_timeout(config.connect_timeout)
            && Config::validate_address(&config.default_service_address)
            && Config::validate_threshold(config.default_threshold)
    }

    fn validate_second(second: u64) -> bool {
        second <= 3600
    }

    fn validate_timeout(second: u64) -> bool {
        second > 0 && second <= 3600
    }

    fn validate_address(address: &str) -> bool {
        address.starts_with("http://") || address.starts_with("https://")
    }

    fn validate_threshold(threshold: f64) -> bool {
        (0.1..=1.0).contains(&threshold)
    }
}
