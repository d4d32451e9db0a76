use std::env;

use crate::config::dto::AppConfig;
use crate::core::error::AppError;

const DEFAULT_PORT: &str = "4100";
const DEFAULT_DB_PATH: &str = "data/governments";

pub fn load_config() -> Result<AppConfig, AppError> {
    dotenvy::dotenv().ok();

    let port = env::var("GOV_SERVER_PORT")
        .or_else(|_| env::var("PORT"))
        .unwrap_or_else(|_| DEFAULT_PORT.to_string())
        .parse::<u16>()
        .map_err(|err| AppError::configuration(format!("invalid port: {err}")))?;

    let db_path = env::var("GOV_DB_PATH")
        .or_else(|_| env::var("DB_PATH"))
        .unwrap_or_else(|_| DEFAULT_DB_PATH.to_string());

    let seed_path = env::var("GOV_SEED_PATH")
        .or_else(|_| env::var("SEED_PATH"))
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty());

    Ok(AppConfig {
        port,
        db_path,
        seed_path,
    })
}
