use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::env;
use config;

#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub web: WebConfig,
    pub posts_per_page: u32,
    pub bcrypt_cost: u32,
    // Populated from the .env file
    pub database_path: String,
    pub static_path: String,
    pub allowed_origins: String,
    pub log_level: String,
    pub session_secret_key: String,
    pub admin_allowed_ips: String,
    pub use_secure_cookies: bool,
}

fn required_var(name: &str) -> Result<String, config::ConfigError> {
    env::var(name).map_err(|_| config::ConfigError::Message(format!(
        "FATAL: Environment variable '{}' is not set in your .env file.", name
    )))
}

impl Config {
    pub fn from_env(env_path: &Path) -> Result<Self, config::ConfigError> {
        dotenvy::from_path(env_path)
            .map_err(|e| config::ConfigError::Message(format!(
                "FATAL: Failed to load .env file from '{}'. Error: {}", env_path.display(), e
            )))?;

        let database_path = required_var("DATABASE_PATH")?;
        let session_secret_key = required_var("SESSION_SECRET_KEY")?;

        // 128 hex characters decode to the 64 bytes the cookie key needs.
        if session_secret_key.len() != 128 || !session_secret_key.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(config::ConfigError::Message(
                "FATAL: 'SESSION_SECRET_KEY' must be 128 hexadecimal characters long (64 bytes). Run 'setup_cli key generate'.".to_string()
            ));
        }

        if Path::new(&database_path).is_relative() {
            return Err(config::ConfigError::Message(format!(
                "FATAL: The 'DATABASE_PATH' in your .env file is a relative path ('{}'). It MUST be an absolute path.",
                database_path
            )));
        }

        let static_path = env::var("STATIC_PATH").unwrap_or_else(|_| "./static".to_string());
        let allowed_origins = env::var("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string());
        let admin_allowed_ips = env::var("ADMIN_ALLOWED_IPS").unwrap_or_else(|_| "*".to_string());
        let use_secure_cookies = env::var("USE_SECURE_COOKIES")
            .unwrap_or_else(|_| "false".to_string())
            .parse::<bool>()
            .unwrap_or(false);

        let builder = config::Config::builder()
            // Host, port, page size and hashing cost live in the TOML file.
            .add_source(config::File::new("config/default.toml", config::FileFormat::Toml))
            .set_override("database_path", database_path)?
            .set_override("static_path", static_path)?
            .set_override("session_secret_key", session_secret_key)?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .set_override("admin_allowed_ips", admin_allowed_ips)?
            .set_override("use_secure_cookies", use_secure_cookies)?
            .build()?;

        builder.try_deserialize()
    }

    /// Returns the full path to the blog database file inside its own folder.
    pub fn blog_db_path(&self) -> PathBuf {
        PathBuf::from(&self.database_path)
            .join("blog")
            .join("blog.db")
    }
}
