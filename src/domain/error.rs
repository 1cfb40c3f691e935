//! Domain error types.

/// Top-level error type for quantlens.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("insufficient data for {context}: have {have} observations, need {need}")]
    InsufficientData {
        context: String,
        have: usize,
        need: usize,
    },

    #[error("insufficient assets: have {have} aligned assets, need at least 2")]
    InsufficientAssets { have: usize },

    #[error("degenerate input: {reason}")]
    DegenerateInput { reason: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("invalid price series for {symbol}: {reason}")]
    InvalidSeries { symbol: String, reason: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl QuantError {
    pub(crate) fn insufficient(context: &str, have: usize, need: usize) -> Self {
        QuantError::InsufficientData {
            context: context.to_string(),
            have,
            need,
        }
    }

    pub(crate) fn degenerate(reason: impl Into<String>) -> Self {
        QuantError::DegenerateInput {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        QuantError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) => 1,
            QuantError::ConfigParse { .. }
            | QuantError::ConfigMissing { .. }
            | QuantError::ConfigInvalid { .. } => 2,
            QuantError::DataSource { .. } | QuantError::InvalidSeries { .. } => 3,
            QuantError::InsufficientData { .. } | QuantError::InsufficientAssets { .. } => 5,
            QuantError::DegenerateInput { .. } | QuantError::InvalidParameter { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}
