use std::fmt;
use std::sync::Arc;

use crate::comparisons::Comparison;
use crate::config::BootstrapConfig;
use crate::dataset::Dataset;
use crate::engine::Engine;
use crate::ensemble::{section, summarize, Describe, PredictionEnsemble};
use crate::errors::{Error, Result};
use crate::metrics::Metric;
use crate::results::Results;

/// A "perfect model" prediction ensemble: forecasts initialized from a model's own control run,
/// which then serves as the truth they are verified against.
///
#[derive(Debug)]
pub struct PerfectModelEnsemble {
    ensemble: PredictionEnsemble,
    control: Option<Dataset>,
}

impl PerfectModelEnsemble {
    pub fn new(initialized: impl Into<Dataset>) -> Result<Self> {
        Ok(Self {
            ensemble: PredictionEnsemble::new(initialized)?,
            control: None,
        })
    }

    pub fn with_engine(initialized: impl Into<Dataset>, engine: Arc<dyn Engine>) -> Result<Self> {
        Ok(Self {
            ensemble: PredictionEnsemble::with_engine(initialized, engine)?,
            control: None,
        })
    }

    pub fn initialized(&self) -> &Dataset {
        self.ensemble.initialized()
    }

    pub fn uninitialized(&self) -> Option<&Dataset> {
        self.ensemble.uninitialized()
    }

    pub fn has_uninitialized(&self) -> bool {
        self.ensemble.has_uninitialized()
    }

    pub fn control(&self) -> Option<&Dataset> {
        self.control.as_ref()
    }

    pub fn has_control(&self) -> bool {
        self.control.is_some()
    }

    /// Attach the control run the ensemble was initialized from, replacing any previous one.
    pub fn add_control(&mut self, control: impl Into<Dataset>) -> Result<()> {
        let control = control.into();
        self.ensemble.validate_reference(&control)?;
        tracing::info!(variables = ?control.var_names(), "added control");
        self.control = Some(control);

        Ok(())
    }

    /// Build an uninitialized ensemble from random stretches of the control run and keep it.
    ///
    /// With `var`, only that variable is generated.
    ///
    pub fn generate_uninitialized(&mut self, var: Option<&str>) -> Result<()> {
        let control = self.require_control()?;
        let initialized = self.initialized();
        let engine = self.ensemble.engine();
        let uninitialized = match var {
            Some(var) => engine.bootstrap_uninit_pm_ensemble_from_control(
                &initialized.select(var)?,
                &control.select(var)?,
            )?,
            None => engine.bootstrap_uninit_pm_ensemble_from_control(initialized, control)?,
        };
        self.ensemble.set_uninitialized(uninitialized);

        Ok(())
    }

    /// Skill of the initialized ensemble against the control run.
    pub fn compute_metric(&self, metric: Metric, comparison: Comparison) -> Result<Dataset> {
        let control = self.require_control()?;
        self.ensemble
            .engine()
            .compute_perfect_model(self.initialized(), control, metric, comparison)
    }

    /// Skill of the uninitialized ensemble against the control run.
    pub fn compute_uninitialized(&self, metric: Metric, comparison: Comparison) -> Result<Dataset> {
        let uninitialized = self.uninitialized().ok_or_else(|| {
            Error::Dataset(
                "Uninitialized ensemble not generated. Please run `generate_uninitialized` first."
                    .to_string(),
            )
        })?;
        let control = self.require_control()?;
        self.ensemble
            .engine()
            .compute_perfect_model(uninitialized, control, metric, comparison)
    }

    /// Skill of a persistence forecast of the control run.
    ///
    /// Lags are taken from the initialized `lead` coordinate; `nlags` only defaults to the number
    /// of leads and is reported in the logs.
    ///
    pub fn compute_persistence(&self, nlags: Option<usize>, metric: Metric) -> Result<Dataset> {
        let control = self.require_control()?;
        let nlags = self.ensemble.nlags(nlags);
        tracing::debug!(nlags, %metric, "computing persistence of control");
        self.ensemble
            .engine()
            .compute_persistence(self.initialized(), control, metric)
    }

    /// Bootstrap the significance of the ensemble's skill, one run per variable.
    ///
    /// With `var`, only that variable is bootstrapped. Otherwise a single-variable ensemble is
    /// bootstrapped on its variable, and a multi-variable one on every control variable it also
    /// has. Results are keyed by variable name.
    ///
    pub fn bootstrap(
        &self,
        var: Option<&str>,
        metric: Metric,
        comparison: Comparison,
        config: &BootstrapConfig,
    ) -> Result<Results> {
        let control = self.require_control()?;
        let initialized = self.initialized();
        let names = match var {
            Some(var) => vec![var.to_string()],
            None if initialized.len() == 1 => initialized.var_names(),
            None => control
                .var_names()
                .into_iter()
                .filter(|name| {
                    let shared = initialized.contains(name);
                    if !shared {
                        tracing::warn!(variable = %name, "control variable missing from initialized ensemble, skipping");
                    }
                    shared
                })
                .collect(),
        };

        let mut results = Results::new();
        for name in names {
            tracing::debug!(variable = %name, %metric, %comparison, "bootstrapping");
            let skill = self.ensemble.engine().bootstrap_perfect_model(
                &initialized.select(&name)?,
                &control.select(&name)?,
                metric,
                comparison,
                config,
            )?;
            results.insert(name, skill);
        }

        Ok(results)
    }

    fn require_control(&self) -> Result<&Dataset> {
        self.control.as_ref().ok_or_else(|| {
            Error::Dataset(
                "You need to add a control dataset before attempting to compute predictability."
                    .to_string(),
            )
        })
    }
}

impl Describe for PerfectModelEnsemble {
    fn kind(&self) -> &'static str {
        "PerfectModelEnsemble"
    }

    fn ensemble(&self) -> &PredictionEnsemble {
        &self.ensemble
    }

    fn describe(&self) -> Vec<String> {
        let mut lines = vec!["Control:".to_string()];
        lines.extend(section(self.control(), 4));
        lines
    }
}

impl fmt::Display for PerfectModelEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        summarize(self, f)
    }
}
