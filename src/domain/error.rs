//! Engine error types.

/// Top-level error type for cbquant.
///
/// Insufficient data and degenerate math are recoverable and normally surface
/// as sentinels (`None`, zeroed statistics); only malformed input and
/// collaborator failures reach callers as errors.
#[derive(Debug, thiserror::Error)]
pub enum QuantError {
    #[error("insufficient data for {context}: have {bars} bars, need {required}")]
    InsufficientData {
        context: String,
        bars: usize,
        required: usize,
    },

    #[error("malformed input at bar {index}: {reason}")]
    MalformedInput { index: usize, reason: String },

    #[error("unknown strategy: {name}")]
    UnknownStrategy { name: String },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

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
    pub fn insufficient(context: impl Into<String>, bars: usize, required: usize) -> Self {
        QuantError::InsufficientData {
            context: context.into(),
            bars,
            required,
        }
    }

    pub fn malformed(index: usize, reason: impl Into<String>) -> Self {
        QuantError::MalformedInput {
            index,
            reason: reason.into(),
        }
    }

    /// True for failures a batch run should log and skip.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            QuantError::InsufficientData { .. } | QuantError::DataSource { .. }
        )
    }
}

impl From<&QuantError> for std::process::ExitCode {
    fn from(err: &QuantError) -> Self {
        let code: u8 = match err {
            QuantError::Io(_) => 1,
            QuantError::ConfigParse { .. } | QuantError::ConfigInvalid { .. } => 2,
            QuantError::DataSource { .. } => 3,
            QuantError::UnknownStrategy { .. } => 4,
            QuantError::InsufficientData { .. } => 5,
            QuantError::MalformedInput { .. } => 6,
        };
        std::process::ExitCode::from(code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insufficient_data_message() {
        let err = QuantError::insufficient("backtest", 12, 21);
        assert_eq!(
            err.to_string(),
            "insufficient data for backtest: have 12 bars, need 21"
        );
        assert!(err.is_recoverable());
    }

    #[test]
    fn malformed_input_is_not_recoverable() {
        let err = QuantError::malformed(3, "close is not finite");
        assert_eq!(err.to_string(), "malformed input at bar 3: close is not finite");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn config_invalid_message() {
        let err = QuantError::ConfigInvalid {
            section: "zigzag".into(),
            key: "deviation".into(),
            reason: "must be between 0 and 1".into(),
        };
        assert_eq!(
            err.to_string(),
            "invalid config value [zigzag] deviation: must be between 0 and 1"
        );
    }
}
