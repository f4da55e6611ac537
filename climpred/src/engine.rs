use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::bootstrap;
use crate::comparisons::Comparison;
use crate::config::BootstrapConfig;
use crate::dataset::Dataset;
use crate::errors::Result;
use crate::metrics::Metric;
use crate::prediction;

/// The computations an ensemble delegates to.
///
/// Ensembles only validate and dispatch; everything numerical goes through this trait so it can
/// be swapped out, e.g. for a recording stub in tests.
///
pub trait Engine: Send + Sync {
    fn compute_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset>;

    fn compute_hindcast(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset>;

    fn compute_uninitialized(
        &self,
        uninitialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset>;

    fn compute_persistence(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
    ) -> Result<Dataset>;

    fn bootstrap_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        metric: Metric,
        comparison: Comparison,
        config: &BootstrapConfig,
    ) -> Result<Dataset>;

    fn bootstrap_uninit_pm_ensemble_from_control(
        &self,
        initialized: &Dataset,
        control: &Dataset,
    ) -> Result<Dataset>;
}

/// The engine backed by this crate's `prediction` and `bootstrap` modules.
///
/// Without a seed every call draws fresh entropy; with one, every call that resamples starts from
/// the same seed and is reproducible.
///
#[derive(Clone, Debug, Default)]
pub struct DefaultEngine {
    seed: Option<u64>,
}

impl DefaultEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: u64) -> Self {
        Self { seed: Some(seed) }
    }

    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

impl Engine for DefaultEngine {
    fn compute_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset> {
        prediction::compute_perfect_model(initialized, control, metric, comparison)
    }

    fn compute_hindcast(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset> {
        prediction::compute_hindcast(initialized, reference, metric, comparison)
    }

    fn compute_uninitialized(
        &self,
        uninitialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Dataset> {
        prediction::compute_uninitialized(uninitialized, reference, metric, comparison)
    }

    fn compute_persistence(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        metric: Metric,
    ) -> Result<Dataset> {
        prediction::compute_persistence(initialized, reference, metric)
    }

    fn bootstrap_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        metric: Metric,
        comparison: Comparison,
        config: &BootstrapConfig,
    ) -> Result<Dataset> {
        bootstrap::bootstrap_perfect_model(
            initialized,
            control,
            metric,
            comparison,
            config,
            &mut self.rng(),
        )
    }

    fn bootstrap_uninit_pm_ensemble_from_control(
        &self,
        initialized: &Dataset,
        control: &Dataset,
    ) -> Result<Dataset> {
        bootstrap::bootstrap_uninit_pm_ensemble_from_control(initialized, control, &mut self.rng())
    }
}
