use self::Error::*;
use std::fmt;

#[derive(Debug)]
pub enum Error {
    /// A dataset or query precondition does not hold. Nothing was fitted or
    /// mutated when this is returned.
    Validation(String),
    /// The external regression capability (or the adapter around it) failed
    /// for one failure type. The remaining per-type loop is aborted.
    Fitting {
        failure_type: u32,
        source: anyhow::Error,
    },
    /// Prediction was requested for a failure-type code that was never
    /// observed during fitting.
    UnknownFailureType(u32),
    /// Prediction was requested before any successful fit.
    NotFitted,
    /// A predicted incidence landed outside [0, 1]. This signals a
    /// numerical or modeling inconsistency and is never clamped away.
    IncidenceOutOfRange { value: f64, time: f64 },
    Anyhow(anyhow::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self {
            Validation(msg) => write!(f, "invalid input: {}", msg),
            Fitting {
                failure_type,
                source,
            } => write!(
                f,
                "fitting failure type {} failed: {}",
                failure_type, source
            ),
            UnknownFailureType(failure_type) => {
                write!(f, "no model was fit for failure type {}", failure_type)
            }
            NotFitted => write!(f, "the model has not been fit yet"),
            IncidenceOutOfRange { value, time } => write!(
                f,
                "cumulative incidence {} at time {} is outside [0, 1]",
                value, time
            ),
            Anyhow(e) => e.fmt(f),
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(e: anyhow::Error) -> Self {
        Anyhow(e)
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Fitting { source, .. } => Some(source.as_ref()),
            Anyhow(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}
