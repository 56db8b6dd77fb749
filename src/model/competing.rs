use crate::error::Error;
use crate::model::{EventSpecificModel, StepFunction};
use crate::regression::{
    extract_event_specific_model, Durations, HazardRegression, RegressionProblem,
};
use crate::sample::ties::break_ties_by_adding_epsilon;
use crate::sample::Dataset;
use log::{debug, info};
use ndarray::aview1;
use ndarray::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{BTreeMap, BTreeSet};

/// Knobs for one `fit` run. The seed drives tie-breaking only, so refits on
/// identical data reproduce identical models.
pub struct FitOptions {
    pub break_ties: bool,
    pub epsilon_min: f64,
    pub epsilon_max: f64,
    pub seed: u64,
    pub verbose: u32,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            break_ties: true,
            epsilon_min: 0.0,
            epsilon_max: 0.0001,
            seed: 42,
            verbose: 1,
        }
    }
}

impl FitOptions {
    fn validate(&self) -> Result<(), Error> {
        if !self.epsilon_min.is_finite()
            || !self.epsilon_max.is_finite()
            || self.epsilon_min < 0.0
            || self.epsilon_max < self.epsilon_min
        {
            return Err(Error::Validation(
                "epsilon bounds must satisfy 0 <= epsilon_min <= epsilon_max".into(),
            ));
        }
        Ok(())
    }
}

/// One cause-specific hazard model per observed failure type, plus the
/// cumulative incidence predictions derived from them.
#[derive(Debug, Default)]
pub struct CompetingRisksModel {
    event_specific_models: BTreeMap<u32, EventSpecificModel>,
}

impl CompetingRisksModel {
    pub fn new() -> Self {
        CompetingRisksModel::default()
    }

    pub fn is_fitted(&self) -> bool {
        !self.event_specific_models.is_empty()
    }

    /// The failure-type codes a model was fit for, in ascending order.
    pub fn failure_types(&self) -> Vec<u32> {
        self.event_specific_models.keys().copied().collect()
    }

    pub fn event_specific_model(&self, failure_type: u32) -> Option<&EventSpecificModel> {
        self.event_specific_models.get(&failure_type)
    }

    /// Fits one cause-specific hazard model per distinct positive failure
    /// type in the dataset, treating every other outcome as censoring.
    ///
    /// Duplicated non-zero event times are first made distinct by adding a
    /// small uniform epsilon (see `FitOptions`). On success the previously
    /// fitted models are replaced wholesale; on any failure they are left
    /// untouched and the offending failure type is reported.
    pub fn fit<R>(
        &mut self,
        dataset: &Dataset<'_>,
        regression: &R,
        options: &FitOptions,
    ) -> Result<(), Error>
    where
        R: HazardRegression,
    {
        dataset.validate()?;
        options.validate()?;

        let t = if options.break_ties {
            let mut rng = StdRng::seed_from_u64(options.seed);
            break_ties_by_adding_epsilon(
                &dataset.t,
                options.epsilon_min,
                options.epsilon_max,
                &mut rng,
            )
        } else {
            dataset.t.to_owned()
        };

        // 0 is censoring, never a type of its own.
        let codes: BTreeSet<u32> = dataset
            .failure_types
            .iter()
            .copied()
            .filter(|&code| code > 0)
            .collect();

        let mut event_specific_models = BTreeMap::new();
        for &failure_type in &codes {
            let model = Self::fit_event_specific_model(
                dataset,
                t.view(),
                regression,
                failure_type,
                options.verbose,
            )?;
            event_specific_models.insert(failure_type, model);
        }

        self.event_specific_models = event_specific_models;
        Ok(())
    }

    fn fit_event_specific_model<R>(
        dataset: &Dataset<'_>,
        t: ArrayView1<'_, f64>,
        regression: &R,
        failure_type: u32,
        verbose: u32,
    ) -> Result<EventSpecificModel, Error>
    where
        R: HazardRegression,
    {
        let events = dataset.failure_types.mapv(|code| code == failure_type);

        if verbose >= 1 {
            let n_events = events.iter().filter(|&&event| event).count();
            info!(
                "fitting transition to state {}: {} events",
                failure_type, n_events
            );
        }

        let durations = match &dataset.t_start {
            Some(entry) => Durations::Interval {
                entry: entry.view(),
                exit: t.view(),
            },
            None => Durations::Single(t.view()),
        };
        let problem = RegressionProblem {
            covariates: dataset.covariates.view(),
            durations,
            events: events.view(),
            weights: dataset.sample_weights.as_ref().map(|w| w.view()),
            clusters: dataset.sample_ids,
        };

        let fitted = regression
            .fit_hazard(&problem)
            .map_err(|source| Error::Fitting {
                failure_type,
                source,
            })?;
        let model = extract_event_specific_model(&fitted).map_err(|source| Error::Fitting {
            failure_type,
            source,
        })?;

        if verbose >= 2 {
            debug!(
                "state {} coefficients: {:?}",
                failure_type, model.coefficients
            );
        }

        Ok(model)
    }

    /// The cumulative incidence of `failure_type` for one sample at the
    /// given query times.
    ///
    /// With `time_passed > 0` the probability is conditioned on having
    /// survived everything up to that point:
    /// `(CIF(t) - CIF(time_passed)) / S(time_passed)`, and 0 for
    /// `t <= time_passed`. A result outside [0, 1] is reported as an error
    /// rather than clamped.
    pub fn predict_cif(
        &self,
        predict_at_t: ArrayView1<'_, f64>,
        sample_covariates: ArrayView1<'_, f64>,
        failure_type: u32,
        time_passed: f64,
    ) -> Result<Array1<f64>, Error> {
        if !self.is_fitted() {
            return Err(Error::NotFitted);
        }
        let target = self
            .event_specific_models
            .get(&failure_type)
            .ok_or(Error::UnknownFailureType(failure_type))?;

        if sample_covariates.len() != target.coefficients.len() {
            return Err(Error::Validation(format!(
                "expected {} covariates, got {}",
                target.coefficients.len(),
                sample_covariates.len()
            )));
        }
        if sample_covariates.iter().any(|x| !x.is_finite()) {
            return Err(Error::Validation("sample covariates must be finite".into()));
        }
        if predict_at_t.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::Validation(
                "prediction times must be finite and non-negative".into(),
            ));
        }
        if !time_passed.is_finite() || time_passed < 0.0 {
            return Err(Error::Validation(
                "time_passed must be finite and non-negative".into(),
            ));
        }

        let cif = self.cif_function(sample_covariates, target)?;

        let predictions = if time_passed > 0.0 {
            let survival = self.survival_function(time_passed, sample_covariates);
            let already_accrued = cif.value_at(time_passed);
            predict_at_t.mapv(|tau| {
                if tau <= time_passed {
                    0.0
                } else {
                    (cif.value_at(tau) - already_accrued) / survival
                }
            })
        } else {
            predict_at_t.mapv(|tau| cif.value_at(tau))
        };

        for (&tau, &value) in predict_at_t.iter().zip(predictions.iter()) {
            if !(value >= 0.0 && value <= 1.0) {
                return Err(Error::IncidenceOutOfRange { value, time: tau });
            }
        }

        Ok(predictions)
    }

    /// Scalar convenience over `predict_cif`.
    pub fn predict_cif_at(
        &self,
        predict_at_t: f64,
        sample_covariates: ArrayView1<'_, f64>,
        failure_type: u32,
        time_passed: f64,
    ) -> Result<f64, Error> {
        let times = [predict_at_t];
        let predictions =
            self.predict_cif(aview1(&times), sample_covariates, failure_type, time_passed)?;
        Ok(predictions[0])
    }

    // CIF_k(t|x) = sum over the type's event times t_i <= t of
    // S(t_i-|x) * h0_k(t_i) * exp(b_k . x), with survival aggregated
    // multiplicatively over every fitted cause.
    fn cif_function(
        &self,
        sample_covariates: ArrayView1<'_, f64>,
        target: &EventSpecificModel,
    ) -> Result<StepFunction, Error> {
        let partial_hazards: Vec<(&EventSpecificModel, f64)> = self
            .event_specific_models
            .values()
            .map(|model| (model, model.partial_hazard(sample_covariates)))
            .collect();
        let target_partial_hazard = target.partial_hazard(sample_covariates);

        let mut incidence = Vec::with_capacity(target.unique_event_times.len());
        let mut total = 0.0;
        for (&time, &hazard) in target
            .unique_event_times
            .iter()
            .zip(target.baseline_hazard.iter())
        {
            let mut cumulative = 0.0;
            for &(model, partial_hazard) in &partial_hazards {
                cumulative +=
                    model.cumulative_baseline_hazard().value_before(time) * partial_hazard;
            }
            total += (-cumulative).exp() * hazard * target_partial_hazard;
            incidence.push(total);
        }

        let cif = StepFunction::new(
            target.unique_event_times.clone(),
            Array1::from(incidence),
        )?;
        Ok(cif)
    }

    // S(t|x) = exp(-sum over fitted causes of H0_j(t) * exp(b_j . x)).
    fn survival_function(&self, time: f64, sample_covariates: ArrayView1<'_, f64>) -> f64 {
        let mut cumulative = 0.0;
        for model in self.event_specific_models.values() {
            cumulative += model.cumulative_hazard(time, sample_covariates);
        }
        (-cumulative).exp()
    }
}
