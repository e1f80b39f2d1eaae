use std::env;
use std::path::PathBuf;
use tracing::warn;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_STORE_PATH: &str = "patients.json";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub patient_store_path: PathBuf,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            server_host: env::var("SERVER_HOST")
                .unwrap_or_else(|_| {
                    warn!("SERVER_HOST not set, using default {}", DEFAULT_HOST);
                    DEFAULT_HOST.to_string()
                }),
            server_port: match env::var("SERVER_PORT") {
                Ok(raw) => raw.parse().unwrap_or_else(|_| {
                    warn!("SERVER_PORT '{}' is not a valid port, using default {}", raw, DEFAULT_PORT);
                    DEFAULT_PORT
                }),
                Err(_) => {
                    warn!("SERVER_PORT not set, using default {}", DEFAULT_PORT);
                    DEFAULT_PORT
                }
            },
            patient_store_path: env::var("PATIENT_STORE_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    warn!("PATIENT_STORE_PATH not set, using default {}", DEFAULT_STORE_PATH);
                    PathBuf::from(DEFAULT_STORE_PATH)
                }),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - patient store path is empty");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.patient_store_path.as_os_str().is_empty()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: DEFAULT_HOST.to_string(),
            server_port: DEFAULT_PORT,
            patient_store_path: PathBuf::from(DEFAULT_STORE_PATH),
        }
    }
}
