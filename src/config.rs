use std::env;
use std::path::PathBuf;

/// Service configuration, read once at startup from environment variables.
///
/// Defaults match a local docker-compose deployment: redis and qdrant on
/// their standard ports, media and history files under the working directory.
#[derive(Debug, Clone)]
pub struct Settings {
    pub app_host: String,
    pub app_port: u16,

    pub redis_url: Option<String>,
    pub cache_prefix: String,
    pub cache_ttl_seconds: u64,

    pub qdrant_url: String,
    pub qdrant_api_key: Option<String>,

    pub openai_api_key: Option<String>,
    pub embedding_model: String,
    pub chat_model: String,
    pub embedding_dimensions: usize,

    pub media_root: PathBuf,
    pub history_db_path: PathBuf,
    pub log_dir: PathBuf,

    pub default_collection: String,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Settings {
    pub fn from_env() -> Self {
        let redis_url = env::var("REDIS_URL").ok().or_else(|| {
            env::var("REDIS_HOST").ok().map(|host| {
                let port = env_or("REDIS_PORT", 6379u16);
                match env::var("REDIS_PASSWORD") {
                    Ok(pw) if !pw.is_empty() => format!("redis://:{}@{}:{}", pw, host, port),
                    _ => format!("redis://{}:{}", host, port),
                }
            })
        });

        let qdrant_url = env::var("QDRANT_URL").unwrap_or_else(|_| {
            let host = env::var("QDRANT_HOST").unwrap_or_else(|_| "localhost".to_string());
            let port = env_or("QDRANT_PORT", 6333u16);
            format!("http://{}:{}", host, port)
        });

        Settings {
            app_host: env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            app_port: env_or("APP_PORT", 8000),
            redis_url,
            cache_prefix: env::var("CACHE_PREFIX").unwrap_or_else(|_| "ask".to_string()),
            cache_ttl_seconds: env_or("CACHE_TTL_SECONDS", 3600),
            qdrant_url,
            qdrant_api_key: env::var("QDRANT_API_KEY").ok().filter(|v| !v.is_empty()),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|v| !v.is_empty()),
            embedding_model: env::var("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|_| "text-embedding-3-small".to_string()),
            chat_model: env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-3.5-turbo".to_string()),
            embedding_dimensions: env_or("EMBEDDING_DIMENSIONS", 384),
            media_root: PathBuf::from(
                env::var("MEDIA_ROOT").unwrap_or_else(|_| "media".to_string()),
            ),
            history_db_path: PathBuf::from(
                env::var("HISTORY_DB_PATH").unwrap_or_else(|_| "history.db".to_string()),
            ),
            log_dir: PathBuf::from(env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string())),
            default_collection: env::var("DEFAULT_COLLECTION")
                .unwrap_or_else(|_| "default".to_string()),
            chunk_size: env_or("CHUNK_SIZE", 1000),
            chunk_overlap: env_or("CHUNK_OVERLAP", 200),
        }
    }
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|val| val.parse::<T>().ok())
        .unwrap_or(default)
}
