//! # API Configuration
//!
//! Environment-based configuration for the mission API service.

use std::env;
use std::net::SocketAddr;
use std::time::Duration;

/// API server configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address
    pub server_addr: SocketAddr,

    /// Image-analysis collaborator configuration
    pub analysis: AnalysisConfig,

    /// Weather collaborator configuration
    pub weather: WeatherConfig,

    /// Logging level
    pub log_level: String,

    /// CORS allowed origins
    pub cors_origins: Vec<String>,
}

/// Generative image-analysis service configuration
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    /// Sub-deadline for one analysis call; ingestion proceeds without
    /// analysis once it elapses.
    pub timeout: Duration,
}

/// Weather service configuration
#[derive(Debug, Clone)]
pub struct WeatherConfig {
    pub api_key: Option<String>,
    pub endpoint: String,
    pub timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            server_addr: env::var("SERVER_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:5000".to_string())
                .parse()
                .expect("Invalid SERVER_ADDR"),

            analysis: AnalysisConfig {
                api_key: env::var("GEMINI_API_KEY").ok(),
                endpoint: env::var("GEMINI_ENDPOINT").unwrap_or_else(|_| {
                    "https://generativelanguage.googleapis.com/v1beta".to_string()
                }),
                timeout: Duration::from_millis(
                    env::var("ANALYSIS_TIMEOUT_MS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(4000),
                ),
            },

            weather: WeatherConfig {
                api_key: env::var("OPENWEATHER_API_KEY").ok(),
                endpoint: env::var("OPENWEATHER_ENDPOINT")
                    .unwrap_or_else(|_| "https://api.openweathermap.org/data/2.5".to_string()),
                timeout: Duration::from_millis(
                    env::var("WEATHER_TIMEOUT_MS")
                        .ok()
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(5000),
                ),
            },

            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),

            cors_origins: env::var("CORS_ORIGINS")
                .unwrap_or_else(|_| "*".to_string())
                .split(',')
                .map(String::from)
                .collect(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
