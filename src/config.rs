use anyhow::Result;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use tracing::warn;

use crate::processor::trip_segmenter::DEFAULT_TIMEOUT_MINUTES;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    pub trip_timeout_minutes: i64,
    pub persist_telemetry: bool,
    pub socket_buffer: usize,
    pub log_level: String,
}

impl AppConfig {
    pub fn load() -> Result<Self> {
        dotenv().ok();

        let server_host = env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let server_port = env::var("SERVER_PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .unwrap_or(8080);

        let db_host = env::var("DB_HOST").unwrap_or_else(|_| "localhost".to_string());
        let db_port = env::var("DB_PORT").unwrap_or_else(|_| "5432".to_string());
        let db_name = env::var("DB_DATABASE").unwrap_or_else(|_| "cosmicsail".to_string());
        let db_user = env::var("DB_USER").unwrap_or_else(|_| "cosmicsail".to_string());
        let db_pwd = env::var("DB_PWD").unwrap_or_else(|_| "cosmicsail".to_string());

        let database_url = format!(
            "postgres://{}:{}@{}:{}/{}",
            db_user, db_pwd, db_host, db_port, db_name
        );
        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "50".to_string())
            .parse()
            .unwrap_or(50);

        let trip_timeout_minutes =
            parse_timeout_minutes(env::var("TRIP_TIMEOUT_MINUTES").ok().as_deref());
        let persist_telemetry = env::var("PERSIST_TELEMETRY")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);
        let socket_buffer = env::var("SOCKET_BUFFER")
            .unwrap_or_else(|_| "32".to_string())
            .parse()
            .unwrap_or(32);

        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            server_host,
            server_port,
            database_url,
            db_max_connections,
            trip_timeout_minutes,
            persist_telemetry,
            socket_buffer,
            log_level,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

/// Upper bound for the trip timeout: one year.
const MAX_TIMEOUT_MINUTES: i64 = 60 * 24 * 365;

fn parse_timeout_minutes(value: Option<&str>) -> i64 {
    let Some(value) = value else {
        return DEFAULT_TIMEOUT_MINUTES;
    };
    match value.trim().parse::<i64>() {
        Ok(minutes) if (1..=MAX_TIMEOUT_MINUTES).contains(&minutes) => minutes,
        _ => {
            warn!(
                "Ignoring TRIP_TIMEOUT_MINUTES='{}', using {}",
                value, DEFAULT_TIMEOUT_MINUTES
            );
            DEFAULT_TIMEOUT_MINUTES
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
