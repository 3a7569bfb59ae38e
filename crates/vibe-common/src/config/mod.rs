//! Configuration structs

mod app_config;
mod match_settings;

pub use app_config::{
    AppConfig, AppSettings, BackendConfig, ConfigError, CorsConfig, DatabaseConfig, Environment,
    EventBackend, JwtConfig, RateLimitConfig, RedisConfig, ServerConfig, SnowflakeConfig,
    StorageBackend,
};
pub use match_settings::MatchSettings;
