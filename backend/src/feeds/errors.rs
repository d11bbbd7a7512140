use thiserror::Error;

#[derive(Error, Debug)]
pub enum FeedError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("{0} contract not configured")]
    NotConfigured(&'static str),

    #[error("invalid response: {0}")]
    InvalidResponse(String),

    #[error("unsupported asset: {0}")]
    UnsupportedAsset(String),
}
