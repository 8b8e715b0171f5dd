use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LotkaError {
    /// The adaptive solver could not advance within its tolerance or step budget.
    #[error("integration failed at t = {t}: {message}")]
    IntegrationFailure { t: f64, message: String },

    /// The coexistence equilibrium divides by this coefficient.
    #[error("parameter `{parameter}` must be non-zero to locate the coexistence equilibrium")]
    DegenerateParameter { parameter: &'static str },

    #[error("parameter `{parameter}` must be finite, got {value}")]
    NonFiniteParameter { parameter: &'static str, value: f64 },

    #[error("invalid settings: {0}")]
    InvalidSettings(String),
}

pub type Result<T> = std::result::Result<T, LotkaError>;
