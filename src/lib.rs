#[cfg(doctest)]
use doc_comment::doctest;


pub mod error;
pub mod model;
pub mod regression;
pub mod sample;
mod utils;

pub use error::Error;
pub use model::competing::{CompetingRisksModel, FitOptions};
pub use model::{EventSpecificModel, StepFunction};
pub use regression::{Durations, FittedHazard, HazardRegression, RegressionProblem};
pub use sample::ties::break_ties_by_adding_epsilon;
pub use sample::Dataset;

#[cfg(doctest)]
doctest!("../README.md");
