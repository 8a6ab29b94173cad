#[derive(Debug, thiserror::Error)]
pub enum PricingError {
    #[error("unknown currency: {0}")]
    UnknownCurrency(String),

    #[error("pricing record has no usable price field")]
    MalformedPricing,

    #[error("normalized price {value} is still implausible after scale correction")]
    NormalizationOverflow { value: f64 },

    #[error("invalid exchange rate for {code}: {rate}")]
    InvalidRate { code: String, rate: f64 },

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("bad data file: {0}")]
    Parse(String),

    #[error("IO error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, PricingError>;
