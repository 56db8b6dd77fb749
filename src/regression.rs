use crate::model::EventSpecificModel;
use ndarray::prelude::*;

/// Duration representation handed to the regression capability: plain
/// `(0, t]` durations, or `(entry, exit]` intervals for delayed-entry data.
pub enum Durations<'a> {
    Single(ArrayView1<'a, f64>),
    Interval {
        entry: ArrayView1<'a, f64>,
        exit: ArrayView1<'a, f64>,
    },
}

impl<'a> Durations<'a> {
    pub fn exit(&self) -> ArrayView1<'_, f64> {
        match self {
            Durations::Single(t) => t.view(),
            Durations::Interval { exit, .. } => exit.view(),
        }
    }
}

/// One binary-outcome proportional-hazards problem: the design matrix, the
/// durations, an event indicator, and optional weights and cluster keys.
pub struct RegressionProblem<'a> {
    pub covariates: ArrayView2<'a, f64>,
    pub durations: Durations<'a>,
    pub events: ArrayView1<'a, bool>,
    pub weights: Option<ArrayView1<'a, f64>>,
    pub clusters: Option<&'a [u64]>,
}

/// What a fitted proportional-hazards regression must expose.
///
/// `cumulative_baseline_hazard` is a step function of time: 0 before the
/// first observed event time and held constant past the last.
pub trait FittedHazard {
    fn coefficients(&self) -> ArrayView1<'_, f64>;
    fn unique_event_times(&self) -> ArrayView1<'_, f64>;
    fn baseline_hazard(&self) -> ArrayView1<'_, f64>;
    fn cumulative_baseline_hazard(&self, time: f64) -> f64;
}

/// The external regression capability. The crate never estimates
/// coefficients itself; implementors bring the actual solver.
pub trait HazardRegression {
    type Fitted: FittedHazard;

    fn fit_hazard(&self, problem: &RegressionProblem<'_>) -> anyhow::Result<Self::Fitted>;
}

/// Maps an opaque fitted regression onto the event-specific model fields.
/// This is the only code coupled to the `FittedHazard` surface, so swapping
/// the regression capability means swapping implementors, not callers.
pub fn extract_event_specific_model<M>(fitted: &M) -> anyhow::Result<EventSpecificModel>
where
    M: FittedHazard,
{
    let unique_event_times = fitted.unique_event_times().to_owned();
    let cumulative =
        unique_event_times.mapv(|time| fitted.cumulative_baseline_hazard(time));

    EventSpecificModel::new(
        fitted.coefficients().to_owned(),
        unique_event_times,
        fitted.baseline_hazard().to_owned(),
        cumulative,
    )
}


#[cfg(test)]
mod tests {
    use super::testing::StaticHazard;
    use super::*;
    use ndarray::prelude::*;

    #[test]
    fn adapter_copies_the_four_model_fields() {
        let fitted = StaticHazard {
            coefficients: array![0.5, -1.0],
            unique_event_times: array![1., 3., 4.],
            baseline_hazard: array![0.1, 0.2, 0.3],
            cumulative: array![0.1, 0.3, 0.6],
        };

        let model = extract_event_specific_model(&fitted).unwrap();
        assert_eq!(model.coefficients, array![0.5, -1.0]);
        assert_eq!(model.unique_event_times, array![1., 3., 4.]);
        assert_eq!(model.baseline_hazard, array![0.1, 0.2, 0.3]);

        let cumulative = model.cumulative_baseline_hazard();
        assert_eq!(cumulative.value_at(0.5), 0.);
        assert_eq!(cumulative.value_at(1.), 0.1);
        assert_eq!(cumulative.value_at(3.5), 0.3);
        assert_eq!(cumulative.value_at(100.), 0.6);
    }

    #[test]
    fn adapter_rejects_unsorted_event_times() {
        let fitted = StaticHazard {
            coefficients: array![0.5],
            unique_event_times: array![3., 1., 4.],
            baseline_hazard: array![0.1, 0.2, 0.3],
            cumulative: array![0.1, 0.3, 0.6],
        };

        assert!(extract_event_specific_model(&fitted).is_err());
    }

    #[test]
    fn adapter_rejects_misaligned_baseline_hazard() {
        let fitted = StaticHazard {
            coefficients: array![0.5],
            unique_event_times: array![1., 3., 4.],
            baseline_hazard: array![0.1, 0.2],
            cumulative: array![0.1, 0.3, 0.6],
        };

        assert!(extract_event_specific_model(&fitted).is_err());
    }
}
