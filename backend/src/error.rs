use thiserror::Error;

/// Errors raised while loading `AppConfig`.
///
/// These are the only errors allowed to stop the process, and only at startup.
/// Once the loop runs, missing settlement configuration is reported per attempt
/// by the dispatcher instead.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?} ({reason})")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{key} must be greater than zero")]
    NotPositive { key: &'static str },

    #[error("AMBER_THRESHOLD ({amber}) must not be below GREEN_ENERGY_THRESHOLD ({green})")]
    ThresholdOrder { green: u64, amber: u64 },
}

/// Startup failures while wiring the service together.
#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("feed setup failed: {0}")]
    Feed(#[from] crate::feeds::FeedError),

    #[error("settlement setup failed: {0}")]
    Settlement(#[from] crate::settlement::SettlementError),
}
