use crate::error::{BadEnvVarSnafu, ParseBoolEnvVarSnafu, ParseEnvVarSnafu, RollcallResult};
use dotenvy::var;
use secrecy::{ExposeSecret, SecretString};
use snafu::ResultExt;
use std::{env::VarError, sync::Arc};

#[derive(Clone, Debug)]
pub struct RuntimeConfiguration {
    db_config: Arc<DbConfig>,
    server_config: Arc<ServerConfig>,
}

impl RuntimeConfiguration {
    pub fn new() -> RollcallResult<Self> {
        Ok(Self {
            db_config: Arc::new(DbConfig::new()?),
            server_config: Arc::new(ServerConfig::new()?),
        })
    }

    pub fn db_config(&self) -> Arc<DbConfig> {
        self.db_config.clone()
    }

    pub fn server_config(&self) -> Arc<ServerConfig> {
        self.server_config.clone()
    }
}

#[cfg(test)]
impl RuntimeConfiguration {
    pub fn for_tests() -> Self {
        Self {
            db_config: Arc::new(DbConfig {
                user: "rollcall".to_string(),
                password: SecretString::from("rollcall".to_string()),
                path: "localhost".to_string(),
                port: 5432,
                database: "rollcall".to_string(),
                max_connections: 1,
            }),
            server_config: Arc::new(ServerConfig {
                server_ip: ServerConfig::DEFAULT_SERVER_IP.to_string(),
                secure_cookies: false,
            }),
        }
    }
}

fn get_env_var(name: &'static str) -> RollcallResult<String> {
    var(name).context(BadEnvVarSnafu { name })
}

fn get_optional_env_var(name: &'static str) -> RollcallResult<Option<String>> {
    match var(name) {
        Ok(value) => Ok(Some(value)),
        Err(dotenvy::Error::EnvVar(VarError::NotPresent)) => Ok(None),
        Err(source) => Err(source).context(BadEnvVarSnafu { name }),
    }
}

fn parse_bool(name: &'static str, value: String) -> RollcallResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => ParseBoolEnvVarSnafu { name, value }.fail(),
    }
}

#[derive(Debug)]
pub struct DbConfig {
    user: String,
    password: SecretString,
    path: String,
    port: u16,
    database: String,
    max_connections: u32,
}

impl DbConfig {
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 15;

    pub fn new() -> RollcallResult<Self> {
        let max_connections = match get_optional_env_var("DB_MAX_CONNECTIONS")? {
            Some(raw) => raw.parse::<u32>().context(ParseEnvVarSnafu {
                name: "DB_MAX_CONNECTIONS",
            })?,
            None => Self::DEFAULT_MAX_CONNECTIONS,
        };

        Ok(Self {
            user: get_env_var("DB_USER")?,
            password: SecretString::from(get_env_var("DB_PASSWORD")?),
            path: get_env_var("DB_PATH")?,
            port: get_env_var("DB_PORT")?
                .parse()
                .context(ParseEnvVarSnafu { name: "DB_PORT" })?,
            database: get_env_var("DB_NAME")?,
            max_connections,
        })
    }

    pub fn get_db_path(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.user,
            self.password.expose_secret(),
            self.path,
            self.port,
            self.database
        )
    }

    pub const fn max_connections(&self) -> u32 {
        self.max_connections
    }
}

#[derive(Debug)]
pub struct ServerConfig {
    server_ip: String,
    secure_cookies: bool,
}

impl ServerConfig {
    pub const DEFAULT_SERVER_IP: &'static str = "127.0.0.1:8080";

    pub fn new() -> RollcallResult<Self> {
        let secure_cookies = match get_optional_env_var("ROLLCALL_SECURE_COOKIES")? {
            Some(raw) => parse_bool("ROLLCALL_SECURE_COOKIES", raw)?,
            None => false,
        };

        Ok(Self {
            server_ip: get_optional_env_var("ROLLCALL_SERVER_IP")?
                .unwrap_or_else(|| Self::DEFAULT_SERVER_IP.to_string()),
            secure_cookies,
        })
    }

    pub fn server_ip(&self) -> &str {
        &self.server_ip
    }

    pub const fn secure_cookies(&self) -> bool {
        self.secure_cookies
    }
}
