use thiserror::Error;

/// Errors raised while estimating a cohort or loading its configuration.
#[derive(Error, Debug)]
pub enum Error {
    /// Counts or priors that cannot form a Beta posterior
    #[error("invalid cohort '{cohort}': {reason}")]
    InvalidCohort { cohort: String, reason: String },

    /// Too few draws to sample or summarize
    #[error("insufficient samples: {0}")]
    InsufficientSamples(String),

    /// A probability or tuning parameter outside its domain
    #[error("invalid parameter {name} = {value}: {reason}")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("sample length mismatch: treatment has {treatment}, control has {control}")]
    LengthMismatch { treatment: usize, control: usize },

    /// Kernel density over data with no spread
    #[error("cannot estimate density: {0}")]
    DegenerateDensity(String),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Presentation-layer failures. These never touch estimator state.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("malformed plot style: {0}")]
    Style(String),

    #[error("credible interval is inverted: low {low} > high {high}")]
    InvalidInterval { low: f64, high: f64 },

    /// The samples could not be turned into a density curve
    #[error("cannot draw density: {0}")]
    Density(String),

    #[error("drawing backend failed: {0}")]
    Backend(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn invalid_cohort(cohort: &str, reason: impl Into<String>) -> Self {
        Error::InvalidCohort {
            cohort: cohort.to_string(),
            reason: reason.into(),
        }
    }
}
