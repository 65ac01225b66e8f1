use crate::adapter::database_config::{parse_var_or, var_or, ConfigError};

/// HTTPサーバーの設定
///
/// - `SERVER_HOST` - バインドするアドレス（デフォルト: `0.0.0.0`）
/// - `SERVER_PORT` - 待ち受けポート（デフォルト: `3000`）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// 環境変数から設定を読み取る
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            host: var_or("SERVER_HOST", "0.0.0.0"),
            port: parse_var_or("SERVER_PORT", 3000u16)?,
        })
    }

    /// `host:port`形式のバインドアドレス
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}
