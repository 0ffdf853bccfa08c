use std::env;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    pub platform_account: String,
    pub fee_basis_points: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        let config = Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            platform_account: env::var("PLATFORM_ACCOUNT")
                .unwrap_or_else(|_| "platform".to_string()),
            fee_basis_points: parse_or_default("FEE_BASIS_POINTS", 250)?,
        };

        if config.fee_basis_points > crate::engine::settlement::MAX_FEE_BASIS_POINTS {
            return Err(AppError::InvalidAmount(format!(
                "FEE_BASIS_POINTS {} exceeds the {} ceiling",
                config.fee_basis_points,
                crate::engine::settlement::MAX_FEE_BASIS_POINTS
            )));
        }

        Ok(config)
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}
