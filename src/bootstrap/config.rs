use std::env;
use std::sync::Arc;

use http::HeaderValue;

pub const DEFAULT_ALLOWED_ORIGINS: [&str; 4] = [
    "http://localhost:4200",
    "http://localhost:4201",
    "http://localhost:52023",
    "https://proteinsgrubhub.vercel.app",
];

pub const DEFAULT_DATABASE: &str = "proteingrubhub";

/// Origins permitted to make credentialed cross-origin requests.
///
/// One value is built at startup and shared by the HTTP CORS layer and the
/// delivery socket's upgrade check, so the two can never disagree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AllowedOrigins(Arc<[String]>);

impl AllowedOrigins {
    pub fn new<I, S>(origins: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let list: Vec<String> = origins
            .into_iter()
            .map(Into::into)
            .map(|o| o.trim().trim_end_matches('/').to_string())
            .filter(|o| !o.is_empty())
            .collect();
        Self(list.into())
    }

    pub fn contains(&self, origin: &str) -> bool {
        self.0.iter().any(|o| o == origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Header values for the CORS layer. Entries that are not valid header
    /// values are skipped.
    pub fn header_values(&self) -> Vec<HeaderValue> {
        self.iter()
            .filter_map(|o| match HeaderValue::from_str(o) {
                Ok(v) => Some(v),
                Err(_) => {
                    tracing::warn!(origin = %o, "invalid_cors_origin_skipped");
                    None
                }
            })
            .collect()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::new(DEFAULT_ALLOWED_ORIGINS)
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub serve_frontend: bool,
    pub frontend_dist: String,
    pub mongo_uri: String,
    pub mongo_db: Option<String>,
    pub allowed_origins: AllowedOrigins,
    pub body_limit_bytes: usize,
    pub db_connect_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_vars(|key| env::var(key).ok())
    }

    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);
        // Only the literal "true" turns frontend serving on
        let serve_frontend = var("SERVE_FRONTEND").as_deref() == Some("true");
        let frontend_dist =
            var("FRONTEND_DIST").unwrap_or_else(|| "../frontend/dist/frontend".into());
        let mongo_uri = var("MONGO_URI")
            .or_else(|| var("MONGODB_URI"))
            .unwrap_or_else(|| format!("mongodb://localhost:27017/{DEFAULT_DATABASE}"));
        let mongo_db = var("MONGO_DB").and_then(|v| {
            let trimmed = v.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_string())
            }
        });
        let allowed_origins = match var("CORS_ORIGINS") {
            Some(list) if !list.trim().is_empty() => AllowedOrigins::new(list.split(',')),
            _ => AllowedOrigins::default(),
        };
        let body_limit_bytes = var("BODY_LIMIT_BYTES")
            .and_then(|s| s.parse().ok())
            .unwrap_or(100 * 1024);
        let db_connect_timeout_secs = var("DB_CONNECT_TIMEOUT_SECS")
            .and_then(|s| s.parse().ok())
            .unwrap_or(10);

        if !(mongo_uri.starts_with("mongodb://") || mongo_uri.starts_with("mongodb+srv://")) {
            anyhow::bail!("MONGO_URI must be a mongodb:// or mongodb+srv:// connection string");
        }
        if allowed_origins.is_empty() {
            anyhow::bail!("CORS_ORIGINS must name at least one origin");
        }

        Ok(Self {
            port,
            serve_frontend,
            frontend_dist,
            mongo_uri,
            mongo_db,
            allowed_origins,
            body_limit_bytes,
            db_connect_timeout_secs,
        })
    }
}
