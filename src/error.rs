use crate::IndicatorKind;

/// Errors raised while configuring or computing technicals.
///
/// Insufficient history is never an error: batch series carry `NaN` and
/// streaming states return `None` until they converge.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An enabled-set key that names no known indicator.
    #[error("unknown indicator key `{0}`")]
    UnknownIndicator(String),

    /// A settings record that cannot be computed.
    #[error("invalid {indicator} settings: {reason}")]
    InvalidSettings {
        indicator: IndicatorKind,
        reason: String,
    },

    /// Settings JSON could not be parsed.
    #[error("failed to parse settings: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn invalid(indicator: IndicatorKind, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            indicator,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
