use thiserror::Error;

/// mkt統一エラー型
#[derive(Debug, Error)]
pub enum MktError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Marketplace API error: {message} (status: {status})")]
    Api { status: u16, message: String },

    #[error("Not authorized to access the marketplace resource")]
    NotAuthorized,

    #[error("Marketplace error: {0}")]
    RemoteError(String),

    #[error("Malformed marketplace response: {0}")]
    MalformedResponse(String),

    #[error("Requested plugin does not exist: {0}")]
    PluginNotFound(String),

    #[error("Plugin has no versions: {0}")]
    NoVersionsAvailable(String),

    #[error("The license key is expired")]
    LicenseExpired,

    #[error("The license key is not valid")]
    LicenseInvalid,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, MktError>;

impl MktError {
    /// 再取得で解決しうるトランスポート障害かどうか
    pub fn is_transport(&self) -> bool {
        match self {
            MktError::Network(_) => true,
            MktError::Api { status, .. } => *status >= 500 && *status < 600,
            _ => false,
        }
    }
}
