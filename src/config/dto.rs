use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub port: u16,
    pub db_path: String,
    pub seed_path: Option<String>,
}
