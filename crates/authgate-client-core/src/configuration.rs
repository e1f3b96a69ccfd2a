use std::path::{Path, PathBuf};

use authgate_shared::const_config::client::{
    CLIENT_DEFAULT_LOGIN_REDIRECT, CLIENT_DEFAULT_SERVER_ADDRESS, CLIENT_STORAGE_FILENAME,
};

#[derive(serde::Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ClientSettings {
    /// Base url of the auth backend, must start with "http"
    #[serde(default = "default_server_address")]
    pub server_address: String,
    /// Folder the session file is kept in on native targets
    #[serde(default = "default_storage_dir")]
    pub storage_dir: PathBuf,
    #[serde(default = "default_login_redirect")]
    pub login_redirect: String,
    #[serde(default = "default_trace_dir")]
    pub trace_dir: PathBuf,
}

fn default_server_address() -> String {
    CLIENT_DEFAULT_SERVER_ADDRESS.to_string()
}

fn default_storage_dir() -> PathBuf {
    PathBuf::from("session")
}

fn default_login_redirect() -> String {
    CLIENT_DEFAULT_LOGIN_REDIRECT.to_string()
}

fn default_trace_dir() -> PathBuf {
    PathBuf::from("traces")
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            server_address: default_server_address(),
            storage_dir: default_storage_dir(),
            login_redirect: default_login_redirect(),
            trace_dir: default_trace_dir(),
        }
    }
}

impl ClientSettings {
    pub fn storage_file(&self) -> PathBuf {
        self.storage_dir.join(CLIENT_STORAGE_FILENAME)
    }
}

/// Loads settings from the "configuration" folder in the current directory
pub fn get_configuration() -> Result<ClientSettings, config::ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| config::ConfigError::Message(format!("no current directory: {e}")))?;
    get_configuration_from(&base_path.join("configuration"))
}

/// Layers, each overriding the previous:
/// - `base.toml`
/// - `{environment}.toml` where the environment comes from `APP_ENVIRONMENT`
///   (defaults to `local`)
/// - environment variables prefixed `APP_` using `__` as the separator. For
///   example `APP_SERVER_ADDRESS=http://host:1234`
///
/// Missing files are skipped so a bare install runs on the defaults.
#[tracing::instrument(ret, err(Debug))]
pub fn get_configuration_from(
    configuration_directory: &Path,
) -> Result<ClientSettings, config::ConfigError> {
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(config::ConfigError::Message)?;
    let environment_filename = format!("{}.toml", environment.as_str());
    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.toml")).required(false))
        .add_source(
            config::File::from(configuration_directory.join(environment_filename))
                .required(false),
        )
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<ClientSettings>()
}

/// The possible runtime environment for our application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
