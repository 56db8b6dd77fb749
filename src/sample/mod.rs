use crate::error::Error;
use ndarray::prelude::*;

pub mod ties;

/// One competing-risks observation set, borrowed from the caller.
///
/// `failure_types` holds non-negative integer codes where 0 marks
/// right-censoring and every positive code is one failure cause. The
/// optional arrays refine the observations: `t_start` turns `(0, t]`
/// durations into `(t_start, t]` intervals, `sample_weights` weighs each
/// observation in the regression, and `sample_ids` identifies subjects with
/// repeated entries for clustered variance estimation.
#[derive(Debug, Clone)]
pub struct Dataset<'a> {
    pub t: ArrayView1<'a, f64>,
    pub failure_types: ArrayView1<'a, u32>,
    pub covariates: ArrayView2<'a, f64>,
    pub t_start: Option<ArrayView1<'a, f64>>,
    pub sample_weights: Option<ArrayView1<'a, f64>>,
    pub sample_ids: Option<&'a [u64]>,
}

impl<'a> Dataset<'a> {
    pub fn new(
        t: ArrayView1<'a, f64>,
        failure_types: ArrayView1<'a, u32>,
        covariates: ArrayView2<'a, f64>,
    ) -> Self {
        Dataset {
            t,
            failure_types,
            covariates,
            t_start: None,
            sample_weights: None,
            sample_ids: None,
        }
    }

    /// Checks every precondition the fitting pipeline relies on. Pure: no
    /// state is touched, the first violated precondition is reported.
    pub fn validate(&self) -> Result<(), Error> {
        let n = self.t.len();

        if n == 0 {
            return Err(Error::Validation("t must be non-empty".into()));
        }
        if self.failure_types.len() != n {
            return Err(Error::Validation(format!(
                "t/failure_types length mismatch: {} vs {}",
                n,
                self.failure_types.len()
            )));
        }
        if self.covariates.nrows() != n {
            return Err(Error::Validation(format!(
                "t/covariates length mismatch: {} vs {}",
                n,
                self.covariates.nrows()
            )));
        }
        if self.t.iter().any(|t| !t.is_finite() || *t < 0.0) {
            return Err(Error::Validation(
                "t must be finite and non-negative".into(),
            ));
        }
        if self.covariates.iter().any(|x| !x.is_finite()) {
            return Err(Error::Validation("covariates must be finite".into()));
        }

        if let Some(t_start) = &self.t_start {
            if t_start.len() != n {
                return Err(Error::Validation(format!(
                    "t/t_start length mismatch: {} vs {}",
                    n,
                    t_start.len()
                )));
            }
            if t_start.iter().any(|s| !s.is_finite() || *s < 0.0) {
                return Err(Error::Validation(
                    "t_start must be finite and non-negative".into(),
                ));
            }
            if t_start.iter().zip(self.t.iter()).any(|(s, t)| s > t) {
                return Err(Error::Validation(
                    "t_start must not exceed the corresponding t".into(),
                ));
            }
        }

        if let Some(weights) = &self.sample_weights {
            if weights.len() != n {
                return Err(Error::Validation(format!(
                    "t/sample_weights length mismatch: {} vs {}",
                    n,
                    weights.len()
                )));
            }
            if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
                return Err(Error::Validation(
                    "sample_weights must be finite and non-negative".into(),
                ));
            }
        }

        if let Some(ids) = self.sample_ids {
            if ids.len() != n {
                return Err(Error::Validation(format!(
                    "t/sample_ids length mismatch: {} vs {}",
                    n,
                    ids.len()
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::prelude::*;

    fn zero_covariates(n: usize) -> Array2<f64> {
        Array2::zeros((n, 1))
    }

    #[test]
    fn accepts_well_formed_dataset() {
        let t = array![1., 2., 3.];
        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(3);

        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(dataset.validate().is_ok());
    }

    #[test]
    fn rejects_negative_time() {
        let t = array![-1., 2., 3.];
        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(3);

        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_non_finite_time() {
        let t = array![1., f64::NAN, 3.];
        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(3);

        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_length_mismatches() {
        let t = array![1., 2., 3.];
        let failure_types = array![1u32, 0];
        let covariates = zero_covariates(3);
        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));

        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(2);
        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_empty_dataset() {
        let t: Array1<f64> = array![];
        let failure_types: Array1<u32> = Array1::zeros(0);
        let covariates = zero_covariates(0);

        let dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_entry_time_past_event_time() {
        let t = array![1., 2., 3.];
        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(3);
        let t_start = array![0., 2.5, 1.];

        let mut dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        dataset.t_start = Some(t_start.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }

    #[test]
    fn rejects_negative_weights() {
        let t = array![1., 2., 3.];
        let failure_types = array![1u32, 0, 2];
        let covariates = zero_covariates(3);
        let weights = array![1., -0.5, 1.];

        let mut dataset = Dataset::new(t.view(), failure_types.view(), covariates.view());
        dataset.sample_weights = Some(weights.view());
        assert!(matches!(dataset.validate(), Err(Error::Validation(_))));
    }
}
