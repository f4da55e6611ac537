use ndarray::{Array, Array1};
use parking_lot::Mutex;

use crate::comparisons::Comparison;
use crate::config::BootstrapConfig;
use crate::dataset::{DataArray, Dataset, INIT, LEAD, MEMBER, TIME};
use crate::engine::Engine;
use crate::errors::Result;
use crate::metrics::Metric;

/// Smooth, non-constant truth signal. Each variable gets its own phase.
fn truth(t: f64, var: usize) -> f64 {
    (0.37 * t + var as f64).sin() + 0.5 * (0.11 * t).cos()
}

/// Hindcast ensemble with dims (init, lead, member). Inits are 1990..=1999, leads 1..=3, and
/// member `m` is the truth at `init + lead` plus `0.1 * (m + 1)`.
pub(crate) fn hindcast_initialized(vars: &[&str], members: usize) -> Dataset {
    let inits = Array1::from_iter((1990..2000).map(|year| year as f64));
    let leads = Array1::from(vec![1.0, 2.0, 3.0]);
    let mut dataset = Dataset::new();
    for (v, name) in vars.iter().enumerate() {
        let data = Array::from_shape_fn((inits.len(), leads.len(), members), |(i, l, m)| {
            truth(inits[i] + leads[l], v) + 0.1 * (m + 1) as f64
        });
        dataset
            .insert(DataArray::new(*name, [INIT, LEAD, MEMBER], data.into_dyn()).unwrap())
            .unwrap();
    }

    dataset
        .with_coord(INIT, inits)
        .unwrap()
        .with_coord(LEAD, leads)
        .unwrap()
}

/// Observations with dim `time` covering 1980..=2010.
pub(crate) fn reference(vars: &[&str]) -> Dataset {
    let times = Array1::from_iter((1980..=2010).map(|year| year as f64));
    let mut dataset = Dataset::new();
    for (v, name) in vars.iter().enumerate() {
        let data = times.mapv(|t| truth(t, v));
        dataset
            .insert(DataArray::new(*name, [TIME], data.into_dyn()).unwrap())
            .unwrap();
    }

    dataset.with_coord(TIME, times).unwrap()
}

/// Perfect-model ensemble with dims (init, lead, member), initialized from years of `control`.
pub(crate) fn perfect_model_initialized(vars: &[&str], members: usize) -> Dataset {
    let inits = Array1::from_iter((0..8).map(|i| 3010.0 + 10.0 * i as f64));
    let leads = Array1::from(vec![1.0, 2.0, 3.0]);
    let mut dataset = Dataset::new();
    for (v, name) in vars.iter().enumerate() {
        let data = Array::from_shape_fn((inits.len(), leads.len(), members), |(i, l, m)| {
            let spread = 0.3 * (1.3 * (m + 1) as f64 * (i + l + 1) as f64).sin();
            truth(inits[i] + leads[l], v) + spread * leads[l]
        });
        dataset
            .insert(DataArray::new(*name, [INIT, LEAD, MEMBER], data.into_dyn()).unwrap())
            .unwrap();
    }

    dataset
        .with_coord(INIT, inits)
        .unwrap()
        .with_coord(LEAD, leads)
        .unwrap()
}

/// Control run with dim `time` covering 3000..3100.
pub(crate) fn control(vars: &[&str]) -> Dataset {
    let times = Array1::from_iter((3000..3100).map(|year| year as f64));
    let mut dataset = Dataset::new();
    for (v, name) in vars.iter().enumerate() {
        let data = times.mapv(|t| truth(t, v));
        dataset
            .insert(DataArray::new(*name, [TIME], data.into_dyn()).unwrap())
            .unwrap();
    }

    dataset.with_coord(TIME, times).unwrap()
}

/// One call made to a `RecordingEngine`: the method and the variable names of each dataset
/// argument.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Call {
    pub method: &'static str,
    pub args: Vec<Vec<String>>,
}

/// Engine that records what it is asked to do and echoes its first argument back.
#[derive(Default)]
pub(crate) struct RecordingEngine {
    calls: Mutex<Vec<Call>>,
}

impl RecordingEngine {
    pub(crate) fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    fn record(&self, method: &'static str, args: &[&Dataset]) -> Result<Dataset> {
        self.calls.lock().push(Call {
            method,
            args: args.iter().map(|dataset| dataset.var_names()).collect(),
        });

        Ok(args[0].clone())
    }
}

impl Engine for RecordingEngine {
    fn compute_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        _metric: Metric,
        _comparison: Comparison,
    ) -> Result<Dataset> {
        self.record("compute_perfect_model", &[initialized, control])
    }

    fn compute_hindcast(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        _metric: Metric,
        _comparison: Comparison,
    ) -> Result<Dataset> {
        self.record("compute_hindcast", &[initialized, reference])
    }

    fn compute_uninitialized(
        &self,
        uninitialized: &Dataset,
        reference: &Dataset,
        _metric: Metric,
        _comparison: Comparison,
    ) -> Result<Dataset> {
        self.record("compute_uninitialized", &[uninitialized, reference])
    }

    fn compute_persistence(
        &self,
        initialized: &Dataset,
        reference: &Dataset,
        _metric: Metric,
    ) -> Result<Dataset> {
        self.record("compute_persistence", &[initialized, reference])
    }

    fn bootstrap_perfect_model(
        &self,
        initialized: &Dataset,
        control: &Dataset,
        _metric: Metric,
        _comparison: Comparison,
        _config: &BootstrapConfig,
    ) -> Result<Dataset> {
        self.record("bootstrap_perfect_model", &[initialized, control])
    }

    fn bootstrap_uninit_pm_ensemble_from_control(
        &self,
        initialized: &Dataset,
        control: &Dataset,
    ) -> Result<Dataset> {
        self.record("bootstrap_uninit_pm_ensemble_from_control", &[initialized, control])
    }
}
