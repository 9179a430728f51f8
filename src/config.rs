use std::{env, fmt::Display, str::FromStr};

use anyhow::Context;
use tracing::info;

pub struct Config {
    pub database_url: String,
    pub max_connections: u32,
    pub base_url: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .context("DATABASE_URL must be set to a production Postgres instance")?;

        Ok(Self {
            database_url,
            max_connections: try_load("SURVEY_DB_MAX_CONNECTIONS", 5)?,
            base_url: try_load("SURVEY_BASE_URL", "http://localhost:3000".to_string())?,
        })
    }
}

fn try_load<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .with_context(|| format!("invalid {key} value '{value}'")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_variables_fall_back_to_defaults() {
        let value: u32 = try_load("SURVEY_TEST_UNSET_VARIABLE", 7).unwrap();
        assert_eq!(value, 7);
    }
}
