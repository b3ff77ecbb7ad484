use crate::clients::client::Client;
use crate::constants::{
    DEFAULT_AUTO_SLUG_LEN, DEFAULT_MAX_AUTO_SLUG_ATTEMPTS, DEFAULT_MAX_FLOW_DEPTH, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::errors::FormflowError;
use crate::services::{EngineConfig, FormEngine};
use crate::store::ScyllaStore;
use crate::utils::logger::{log_fatal, log_success, log_warning};
use actix_cors::Cors;
use actix_web::{http, web, HttpRequest};
use scylla::client::caching_session::CachingSession;
use serde::Deserialize;
use std::sync::Arc;
use std::{env, fs};

pub type Engine = FormEngine<ScyllaStore>;

#[derive(Deserialize, Clone, Debug)]
pub struct ScyllaConfig {
    pub hosts: Vec<String>,
    pub keyspace: String,

    #[serde(default = "default_cache_size")]
    pub cache_size: usize,
}

fn default_cache_size() -> usize {
    1000
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct SlugConfig {
    pub auto_length: usize,
    pub max_auto_attempts: usize,
}

impl Default for SlugConfig {
    fn default() -> Self {
        Self {
            auto_length: DEFAULT_AUTO_SLUG_LEN,
            max_auto_attempts: DEFAULT_MAX_AUTO_SLUG_ATTEMPTS,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct FlowsConfig {
    pub max_depth: usize,
}

impl Default for FlowsConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_FLOW_DEPTH,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(default)]
pub struct ResponsesConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ResponsesConfig {
    fn default() -> Self {
        Self {
            default_page_size: DEFAULT_PAGE_SIZE,
            max_page_size: MAX_PAGE_SIZE,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub allowed_origin: String,
    pub scylla: ScyllaConfig,

    #[serde(default)]
    pub slugs: SlugConfig,

    #[serde(default)]
    pub flows: FlowsConfig,

    #[serde(default)]
    pub responses: ResponsesConfig,
}

impl Config {
    /// Reads `config.<ENV>.toml` from the working directory.
    pub fn load() -> Self {
        dotenv::dotenv().ok();

        let env = env::var("ENV").unwrap_or_else(|_| {
            log_warning("ENV is not set, falling back to development".to_string());
            "development".to_string()
        });
        let config_file = format!("config.{}.toml", env);

        let contents = fs::read_to_string(&config_file).unwrap_or_else(|e| {
            log_fatal(format!("Unable to read {}", config_file));
            panic!("Unable to read {}: {}", config_file, e)
        });

        Self::parse(&contents).unwrap_or_else(|e| {
            log_fatal(format!("Invalid {}", config_file));
            panic!("Invalid {}: {}", config_file, e)
        })
    }

    pub fn parse(contents: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(contents)
    }
}

impl From<&Config> for EngineConfig {
    fn from(config: &Config) -> Self {
        Self {
            auto_slug_len: config.slugs.auto_length,
            max_auto_slug_attempts: config.slugs.max_auto_attempts,
            default_page_size: config.responses.default_page_size,
            max_page_size: config.responses.max_page_size,
            max_flow_depth: config.flows.max_depth,
        }
    }
}

pub struct App {
    pub config: Config,
    pub engine: Arc<Engine>,
}

impl App {
    pub async fn new() -> Self {
        let config = Config::load();
        let db_session = Arc::new(CachingSession::init_client(&config.scylla).await);
        let engine = FormEngine::new(ScyllaStore::new(db_session), EngineConfig::from(&config));

        Self {
            config,
            engine: Arc::new(engine),
        }
    }

    /// Init processes that need to be run on startup
    pub fn init(&self) {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

        log_success(format!(
            "connected to scylla keyspace '{}' at {:?}",
            self.config.scylla.keyspace, self.config.scylla.hosts
        ));
    }

    pub fn cors(&self) -> Cors {
        Cors::default()
            .allowed_origin(&self.config.allowed_origin)
            .allowed_methods(vec!["GET", "POST", "PUT", "PATCH", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                http::header::ACCEPT,
                http::header::ORIGIN,
                http::header::USER_AGENT,
                http::header::CONTENT_TYPE,
            ])
            .max_age(86400)
    }

    pub fn port(&self) -> u16 {
        self.config.port
    }

    pub fn json_config(&self) -> web::JsonConfig {
        web::JsonConfig::default().error_handler(|err, _req: &HttpRequest| FormflowError::from(err).into())
    }
}
