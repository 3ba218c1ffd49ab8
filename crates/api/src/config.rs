use kontrol_core::checklist::DEFAULT_MAX_PHOTOS_PER_ITEM;
use kontrol_core::photos::DEFAULT_MAX_PHOTO_BYTES;

use crate::auth::jwt::JwtConfig;

/// Server configuration loaded from environment variables.
///
/// All fields except the JWT secret have defaults suitable for local
/// development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS`.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Upper bound on photos attached to one checklist item.
    pub max_photos_per_item: usize,
    /// Upper bound on a single photo upload, in bytes.
    pub max_photo_bytes: usize,
    /// Directory the local photo storage writes into.
    pub photo_storage_dir: String,
    pub jwt: JwtConfig,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `MAX_PHOTOS_PER_ITEM`  | `6`                        |
    /// | `MAX_PHOTO_BYTES`      | `10485760`                 |
    /// | `PHOTO_STORAGE_DIR`    | `storage/photos`           |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_photos_per_item = positive_limit(
            "MAX_PHOTOS_PER_ITEM",
            &std::env::var("MAX_PHOTOS_PER_ITEM")
                .unwrap_or_else(|_| DEFAULT_MAX_PHOTOS_PER_ITEM.to_string()),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let max_photo_bytes = positive_limit(
            "MAX_PHOTO_BYTES",
            &std::env::var("MAX_PHOTO_BYTES")
                .unwrap_or_else(|_| DEFAULT_MAX_PHOTO_BYTES.to_string()),
        )
        .unwrap_or_else(|e| panic!("{e}"));

        let photo_storage_dir =
            std::env::var("PHOTO_STORAGE_DIR").unwrap_or_else(|_| "storage/photos".into());

        let jwt = JwtConfig::from_env();

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_photos_per_item,
            max_photo_bytes,
            photo_storage_dir,
            jwt,
        }
    }
}

/// Parse an upload limit; zero is refused.
fn positive_limit(name: &str, raw: &str) -> Result<usize, String> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(format!("{name} must be greater than zero")),
        Ok(value) => Ok(value),
        Err(_) => Err(format!("{name} must be a valid usize")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upload_limits_must_be_positive() {
        assert_eq!(positive_limit("MAX_PHOTOS_PER_ITEM", "6"), Ok(6));
        assert_eq!(
            positive_limit("MAX_PHOTOS_PER_ITEM", "0"),
            Err("MAX_PHOTOS_PER_ITEM must be greater than zero".to_string())
        );
        assert_eq!(
            positive_limit("MAX_PHOTO_BYTES", "ten"),
            Err("MAX_PHOTO_BYTES must be a valid usize".to_string())
        );
    }
}
