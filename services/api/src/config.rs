//! Service configuration from environment variables

use std::env;
use std::path::PathBuf;

/// Runtime configuration for the API service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Port to listen on
    pub port: u16,
    /// Path to the flat JSON data file (the guaranteed fallback store)
    pub data_file: PathBuf,
    /// Path to the embedded SQLite mirror; `None` disables the mirror
    pub sqlite_file: Option<PathBuf>,
    /// Directory uploaded media files are written to
    pub uploads_dir: PathBuf,
    /// Directory static assets are served from
    pub public_dir: PathBuf,
    /// Secret used to sign bearer tokens
    pub token_secret: String,
    /// Access token lifetime in seconds
    pub token_ttl_secs: i64,
    /// Shared secret accepted by the admin endpoints as an alternative
    /// to an admin-flagged bearer token
    pub admin_secret: String,
    /// Whether an approved follower of the owner may view a private
    /// memorial
    pub memorial_follower_access: bool,
}

impl AppConfig {
    /// Build a configuration from environment variables, with defaults
    /// suitable for local development.
    ///
    /// # Environment Variables
    /// - `PORT`: listen port (default: 3000)
    /// - `DATA_FILE`: JSON data file path (default: `data.json`)
    /// - `SQLITE_FILE`: SQLite mirror path (default: `data.sqlite`;
    ///   set to the empty string to disable the mirror)
    /// - `UPLOADS_DIR`: upload storage directory (default: `uploads`)
    /// - `PUBLIC_DIR`: static asset root (default: `public`)
    /// - `TOKEN_SECRET`: token signing secret
    /// - `TOKEN_TTL_SECS`: access token lifetime (default: 86400)
    /// - `ADMIN_SECRET`: shared admin secret
    /// - `MEMORIAL_FOLLOWER_ACCESS`: `true`/`false` (default: false)
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3000);

        let data_file = env::var("DATA_FILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data.json"));

        let sqlite_file = match env::var("SQLITE_FILE") {
            Ok(s) if s.is_empty() => None,
            Ok(s) => Some(PathBuf::from(s)),
            Err(_) => Some(PathBuf::from("data.sqlite")),
        };

        let uploads_dir = env::var("UPLOADS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("uploads"));

        let public_dir = env::var("PUBLIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("public"));

        let token_secret =
            env::var("TOKEN_SECRET").unwrap_or_else(|_| "dev-secret-change-me".to_string());

        let token_ttl_secs = env::var("TOKEN_TTL_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400);

        let admin_secret = env::var("ADMIN_SECRET").unwrap_or_else(|_| "admin-secret".to_string());

        let memorial_follower_access = env::var("MEMORIAL_FOLLOWER_ACCESS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(false);

        Self {
            port,
            data_file,
            sqlite_file,
            uploads_dir,
            public_dir,
            token_secret,
            token_ttl_secs,
            admin_secret,
            memorial_follower_access,
        }
    }
}
