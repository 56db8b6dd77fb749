use crate::utils::SafeLogExp;
use anyhow::ensure;
use ndarray::prelude::*;
use serde_derive::{Deserialize, Serialize};

pub mod competing;

/// A right-continuous step function with sorted knots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepFunction {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl StepFunction {
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> anyhow::Result<Self> {
        ensure!(
            x.len() == y.len(),
            "knots and values differ in length: {} vs {}",
            x.len(),
            y.len()
        );
        ensure!(
            x.iter().all(|v| v.is_finite()) && y.iter().all(|v| v.is_finite()),
            "knots and values must be finite"
        );
        ensure!(
            x.iter().zip(x.iter().skip(1)).all(|(a, b)| a < b),
            "knots must be strictly increasing"
        );

        Ok(StepFunction { x, y })
    }

    /// The value at `time`: 0 before the first knot, held constant past the
    /// last.
    pub fn value_at(&self, time: f64) -> f64 {
        match self.knots_up_to(time, true) {
            0 => 0.0,
            i => self.y[i - 1],
        }
    }

    /// The left limit, i.e. the value just before `time`.
    pub fn value_before(&self, time: f64) -> f64 {
        match self.knots_up_to(time, false) {
            0 => 0.0,
            i => self.y[i - 1],
        }
    }

    fn knots_up_to(&self, time: f64, inclusive: bool) -> usize {
        let mut low = 0;
        let mut high = self.x.len();
        while low < high {
            let mid = (low + high) / 2;
            let below = if inclusive {
                self.x[mid] <= time
            } else {
                self.x[mid] < time
            };
            if below {
                low = mid + 1;
            } else {
                high = mid;
            }
        }
        low
    }
}

/// The cause-specific hazard model fitted for one failure-type code:
/// regression coefficients, the sorted distinct event times observed for
/// that type, the baseline hazard at each of those times, and the
/// cumulative baseline hazard as a step function of time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSpecificModel {
    pub coefficients: Array1<f64>,
    pub unique_event_times: Array1<f64>,
    pub baseline_hazard: Array1<f64>,
    cumulative_baseline_hazard: StepFunction,
}

impl EventSpecificModel {
    pub fn new(
        coefficients: Array1<f64>,
        unique_event_times: Array1<f64>,
        baseline_hazard: Array1<f64>,
        cumulative_baseline_hazard: Array1<f64>,
    ) -> anyhow::Result<Self> {
        ensure!(
            unique_event_times.len() == baseline_hazard.len(),
            "event times and baseline hazard differ in length: {} vs {}",
            unique_event_times.len(),
            baseline_hazard.len()
        );
        ensure!(
            coefficients.iter().all(|c| c.is_finite()),
            "coefficients must be finite"
        );
        ensure!(
            unique_event_times.iter().all(|t| *t >= 0.0),
            "event times must be non-negative"
        );
        ensure!(
            baseline_hazard.iter().all(|h| h.is_finite() && *h >= 0.0),
            "baseline hazard must be finite and non-negative"
        );
        ensure!(
            cumulative_baseline_hazard
                .iter()
                .zip(cumulative_baseline_hazard.iter().skip(1))
                .all(|(a, b)| a <= b),
            "cumulative baseline hazard must be non-decreasing"
        );

        let cumulative_baseline_hazard =
            StepFunction::new(unique_event_times.clone(), cumulative_baseline_hazard)?;

        Ok(EventSpecificModel {
            coefficients,
            unique_event_times,
            baseline_hazard,
            cumulative_baseline_hazard,
        })
    }

    pub fn cumulative_baseline_hazard(&self) -> &StepFunction {
        &self.cumulative_baseline_hazard
    }

    /// `exp(β · x)`, the sample's multiplicative risk relative to baseline.
    pub fn partial_hazard(&self, sample_covariates: ArrayView1<'_, f64>) -> f64 {
        self.coefficients.dot(&sample_covariates).safe_exp()
    }

    /// `H0(t) · exp(β · x)`, the cause-specific cumulative hazard at `time`.
    pub fn cumulative_hazard(&self, time: f64, sample_covariates: ArrayView1<'_, f64>) -> f64 {
        self.cumulative_baseline_hazard.value_at(time) * self.partial_hazard(sample_covariates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;

    fn step() -> StepFunction {
        StepFunction::new(array![1., 2., 4.], array![0.1, 0.3, 0.6]).unwrap()
    }

    #[test]
    fn value_is_zero_before_the_first_knot() {
        assert_eq!(step().value_at(0.), 0.);
        assert_eq!(step().value_at(0.999), 0.);
    }

    #[test]
    fn value_jumps_at_each_knot_and_holds_past_the_last() {
        let f = step();
        assert_eq!(f.value_at(1.), 0.1);
        assert_eq!(f.value_at(1.5), 0.1);
        assert_eq!(f.value_at(2.), 0.3);
        assert_eq!(f.value_at(4.), 0.6);
        assert_eq!(f.value_at(1e12), 0.6);
    }

    #[test]
    fn left_limit_excludes_the_jump_at_the_query_time() {
        let f = step();
        assert_eq!(f.value_before(1.), 0.);
        assert_eq!(f.value_before(2.), 0.1);
        assert_eq!(f.value_before(2.5), 0.3);
        assert_eq!(f.value_before(1e12), 0.6);
    }

    #[test]
    fn rejects_unsorted_or_misaligned_knots() {
        assert!(StepFunction::new(array![2., 1.], array![0.1, 0.2]).is_err());
        assert!(StepFunction::new(array![1., 1.], array![0.1, 0.2]).is_err());
        assert!(StepFunction::new(array![1., 2.], array![0.1]).is_err());
    }

    #[test]
    fn partial_hazard_is_exp_of_the_linear_predictor() {
        let model = EventSpecificModel::new(
            array![1.0, -0.5],
            array![1.],
            array![0.2],
            array![0.2],
        )
        .unwrap();

        let x = array![2.0, 2.0];
        let expected = (2.0 - 1.0f64).exp();
        assert!((model.partial_hazard(x.view()) - expected).abs() < 1e-12);
    }

    #[test]
    fn cumulative_hazard_scales_the_baseline() {
        let model = EventSpecificModel::new(
            array![0.0],
            array![1., 3.],
            array![0.2, 0.3],
            array![0.2, 0.5],
        )
        .unwrap();

        let x = array![0.0];
        assert_eq!(model.cumulative_hazard(0.5, x.view()), 0.);
        assert_eq!(model.cumulative_hazard(1.0, x.view()), 0.2);
        assert_eq!(model.cumulative_hazard(10.0, x.view()), 0.5);
    }

    #[test]
    fn rejects_decreasing_cumulative_hazard() {
        let result = EventSpecificModel::new(
            array![0.0],
            array![1., 3.],
            array![0.2, 0.3],
            array![0.5, 0.2],
        );
        assert!(result.is_err());
    }
}
