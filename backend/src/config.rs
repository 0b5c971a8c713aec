use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub google_client_id: String,
    pub upload_dir: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 8080)?
            .set_default("google_client_id", "")?
            .set_default("upload_dir", "./uploads")?
            .add_source(config::Environment::default())
            .build()?;

        config.try_deserialize()
    }
}
