use secrecy::Secret;
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub credential_service: CredentialServiceSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
}

#[derive(Deserialize, Clone)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub session_secret: Secret<String>,
}

#[derive(Deserialize, Clone)]
pub struct CredentialServiceSettings {
    /// Base URL of the credential-generation backend
    /// (e.g., http://gateway:8080/function).
    pub url: String,
    /// Request timeout applied to every backend call.
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_timeout_seconds() -> u64 {
    10
}

#[derive(Deserialize, Clone, Default)]
pub struct TelemetrySettings {
    /// OTLP collector endpoint; empty disables span export.
    #[serde(default)]
    pub otlp_endpoint: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");

    // Check if we're already in credential-portal directory or need to navigate to it
    let configuration_directory = if base_path.ends_with("credential-portal") {
        base_path.join("config")
    } else {
        base_path.join("credential-portal").join("config")
    };

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")).required(true))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}
