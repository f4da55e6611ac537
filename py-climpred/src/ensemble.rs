use std::collections::HashMap;
use std::sync::Arc;

use pyo3::prelude::*;

use climpred::{self, BootstrapConfig, DefaultEngine, Side};

use super::dataset::PyDataset;
use super::helpers::{convert_error, parse_comparison, parse_metric, wrap_results};

fn engine(seed: Option<u64>) -> Arc<DefaultEngine> {
    Arc::new(match seed {
        Some(seed) => DefaultEngine::with_seed(seed),
        None => DefaultEngine::new(),
    })
}

#[pyclass(name = "HindcastEnsemble")]
pub struct PyHindcastEnsemble {
    inner: climpred::HindcastEnsemble,
}

#[pymethods]
impl PyHindcastEnsemble {
    #[new]
    #[pyo3(signature = (initialized, seed=None))]
    fn new(initialized: PyDataset, seed: Option<u64>) -> PyResult<Self> {
        let inner =
            climpred::HindcastEnsemble::with_engine(initialized.into_inner(), engine(seed))
                .map_err(convert_error)?;

        Ok(Self { inner })
    }

    #[getter]
    fn initialized(&self) -> PyDataset {
        PyDataset::wrap(self.inner.initialized().clone())
    }

    #[getter]
    fn uninitialized(&self) -> Option<PyDataset> {
        self.inner.uninitialized().cloned().map(PyDataset::wrap)
    }

    #[getter]
    fn reference(&self) -> HashMap<String, PyDataset> {
        self.inner
            .references()
            .iter()
            .map(|(name, dataset)| (name.clone(), PyDataset::wrap(dataset.clone())))
            .collect()
    }

    fn add_reference(&mut self, reference: PyDataset, name: &str) -> PyResult<()> {
        self.inner
            .add_reference(reference.into_inner(), name)
            .map_err(convert_error)
    }

    fn add_uninitialized(&mut self, uninitialized: PyDataset) -> PyResult<()> {
        self.inner
            .add_uninitialized(uninitialized.into_inner())
            .map_err(convert_error)
    }

    #[pyo3(signature = (refname, init=true))]
    fn vars_to_drop(&self, refname: &str, init: bool) -> PyResult<(Vec<String>, Vec<String>)> {
        let side = if init {
            Side::Initialized
        } else {
            Side::Uninitialized
        };

        self.inner.vars_to_drop(refname, side).map_err(convert_error)
    }

    #[pyo3(signature = (refname=None, metric="pearson_r", comparison="e2r"))]
    fn compute_metric(
        &self,
        refname: Option<&str>,
        metric: &str,
        comparison: &str,
    ) -> PyResult<HashMap<String, PyDataset>> {
        let results = self
            .inner
            .compute_metric(refname, parse_metric(metric)?, parse_comparison(comparison)?)
            .map_err(convert_error)?;

        Ok(wrap_results(results))
    }

    #[pyo3(signature = (refname=None, metric="pearson_r", comparison="e2r"))]
    fn compute_uninitialized(
        &self,
        refname: Option<&str>,
        metric: &str,
        comparison: &str,
    ) -> PyResult<HashMap<String, PyDataset>> {
        let results = self
            .inner
            .compute_uninitialized(refname, parse_metric(metric)?, parse_comparison(comparison)?)
            .map_err(convert_error)?;

        Ok(wrap_results(results))
    }

    #[pyo3(signature = (refname=None, nlags=None, metric="pearson_r"))]
    fn compute_persistence(
        &self,
        refname: Option<&str>,
        nlags: Option<usize>,
        metric: &str,
    ) -> PyResult<HashMap<String, PyDataset>> {
        let results = self
            .inner
            .compute_persistence(refname, nlags, parse_metric(metric)?)
            .map_err(convert_error)?;

        Ok(wrap_results(results))
    }

    #[pyo3(signature = (refname=None))]
    fn compute_horizon(&self, refname: Option<&str>) -> PyResult<HashMap<String, PyDataset>> {
        let results = self.inner.compute_horizon(refname).map_err(convert_error)?;

        Ok(wrap_results(results))
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}

#[pyclass(name = "PerfectModelEnsemble")]
pub struct PyPerfectModelEnsemble {
    inner: climpred::PerfectModelEnsemble,
}

#[pymethods]
impl PyPerfectModelEnsemble {
    #[new]
    #[pyo3(signature = (initialized, seed=None))]
    fn new(initialized: PyDataset, seed: Option<u64>) -> PyResult<Self> {
        let inner =
            climpred::PerfectModelEnsemble::with_engine(initialized.into_inner(), engine(seed))
                .map_err(convert_error)?;

        Ok(Self { inner })
    }

    #[getter]
    fn initialized(&self) -> PyDataset {
        PyDataset::wrap(self.inner.initialized().clone())
    }

    #[getter]
    fn uninitialized(&self) -> Option<PyDataset> {
        self.inner.uninitialized().cloned().map(PyDataset::wrap)
    }

    #[getter]
    fn control(&self) -> Option<PyDataset> {
        self.inner.control().cloned().map(PyDataset::wrap)
    }

    fn add_control(&mut self, control: PyDataset) -> PyResult<()> {
        self.inner
            .add_control(control.into_inner())
            .map_err(convert_error)
    }

    #[pyo3(signature = (var=None))]
    fn generate_uninitialized(&mut self, var: Option<&str>) -> PyResult<()> {
        self.inner
            .generate_uninitialized(var)
            .map_err(convert_error)
    }

    #[pyo3(signature = (metric="pearson_r", comparison="m2m"))]
    fn compute_metric(&self, metric: &str, comparison: &str) -> PyResult<PyDataset> {
        let skill = self
            .inner
            .compute_metric(parse_metric(metric)?, parse_comparison(comparison)?)
            .map_err(convert_error)?;

        Ok(PyDataset::wrap(skill))
    }

    #[pyo3(signature = (metric="pearson_r", comparison="m2e"))]
    fn compute_uninitialized(&self, metric: &str, comparison: &str) -> PyResult<PyDataset> {
        let skill = self
            .inner
            .compute_uninitialized(parse_metric(metric)?, parse_comparison(comparison)?)
            .map_err(convert_error)?;

        Ok(PyDataset::wrap(skill))
    }

    #[pyo3(signature = (nlags=None, metric="pearson_r"))]
    fn compute_persistence(&self, nlags: Option<usize>, metric: &str) -> PyResult<PyDataset> {
        let skill = self
            .inner
            .compute_persistence(nlags, parse_metric(metric)?)
            .map_err(convert_error)?;

        Ok(PyDataset::wrap(skill))
    }

    #[pyo3(signature = (
        var=None,
        metric="pearson_r",
        comparison="m2e",
        sig=95.0,
        bootstrap=500,
        pers_sig=None
    ))]
    fn bootstrap(
        &self,
        var: Option<&str>,
        metric: &str,
        comparison: &str,
        sig: f64,
        bootstrap: usize,
        pers_sig: Option<f64>,
    ) -> PyResult<HashMap<String, PyDataset>> {
        let mut config = BootstrapConfig::default()
            .with_sig(sig)
            .with_iterations(bootstrap);
        if let Some(pers_sig) = pers_sig {
            config = config.with_pers_sig(pers_sig);
        }
        let results = self
            .inner
            .bootstrap(
                var,
                parse_metric(metric)?,
                parse_comparison(comparison)?,
                &config,
            )
            .map_err(convert_error)?;

        Ok(wrap_results(results))
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
