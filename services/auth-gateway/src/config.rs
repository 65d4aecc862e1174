use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

pub const ADDR_ENV: &str = "AUTH_GATEWAY_ADDR";
pub const PORT_ENV: &str = "AUTH_GATEWAY_PORT";
pub const SECRET_ENV: &str = "AUTH_GATEWAY_SECRET";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind_address: String,
    pub port: u16,
    pub secret_path: PathBuf,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: 8080,
            secret_path: PathBuf::from("secret.key"),
        }
    }
}

impl GatewayConfig {
    /// Build the configuration from environment overrides on top of the
    /// defaults. Unparsable overrides are logged and ignored.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(value) = env::var(ADDR_ENV) {
            config.bind_address = value;
        }
        if let Ok(value) = env::var(PORT_ENV) {
            match value.parse::<u16>() {
                Ok(port) => config.port = port,
                Err(error) => {
                    tracing::warn!(%value, %error, "invalid port override, using default");
                }
            }
        }
        if let Ok(value) = env::var(SECRET_ENV) {
            config.secret_path = PathBuf::from(value);
        }

        config
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.bind_address, self.port).parse()
    }
}
