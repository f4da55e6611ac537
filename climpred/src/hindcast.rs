use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::comparisons::Comparison;
use crate::dataset::Dataset;
use crate::engine::Engine;
use crate::ensemble::{section, summarize, Describe, PredictionEnsemble};
use crate::errors::{Error, Result};
use crate::metrics::Metric;
use crate::results::Results;

/// Which forecast a reference is compared to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    Initialized,
    Uninitialized,
}

/// A hindcast prediction ensemble: forecasts initialized from observed states and verified
/// against any number of named references (observations, reconstructions, ...).
///
#[derive(Debug)]
pub struct HindcastEnsemble {
    ensemble: PredictionEnsemble,
    references: BTreeMap<String, Dataset>,
}

impl HindcastEnsemble {
    pub fn new(initialized: impl Into<Dataset>) -> Result<Self> {
        Ok(Self {
            ensemble: PredictionEnsemble::new(initialized)?,
            references: BTreeMap::new(),
        })
    }

    pub fn with_engine(initialized: impl Into<Dataset>, engine: Arc<dyn Engine>) -> Result<Self> {
        Ok(Self {
            ensemble: PredictionEnsemble::with_engine(initialized, engine)?,
            references: BTreeMap::new(),
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

    pub fn references(&self) -> &BTreeMap<String, Dataset> {
        &self.references
    }

    pub fn reference(&self, name: &str) -> Option<&Dataset> {
        self.references.get(name)
    }

    pub fn has_references(&self) -> bool {
        !self.references.is_empty()
    }

    /// Variables to drop before comparing one side of the ensemble with reference `refname`.
    ///
    /// Returns the variables only the chosen side has, then the variables only the reference
    /// has, both sorted by name.
    ///
    pub fn vars_to_drop(&self, refname: &str, side: Side) -> Result<(Vec<String>, Vec<String>)> {
        let reference = self.lookup(refname)?;
        let forecast = self.side(side)?;
        let forecast_only = forecast
            .var_names()
            .into_iter()
            .filter(|name| !reference.contains(name))
            .collect();
        let reference_only = reference
            .var_names()
            .into_iter()
            .filter(|name| !forecast.contains(name))
            .collect();

        Ok((forecast_only, reference_only))
    }

    /// Attach a reference under `name`, replacing any reference already using it.
    pub fn add_reference(&mut self, reference: impl Into<Dataset>, name: &str) -> Result<()> {
        let reference = reference.into();
        self.ensemble.validate_reference(&reference)?;
        tracing::info!(reference = %name, variables = ?reference.var_names(), "added reference");
        self.references.insert(name.to_string(), reference);

        Ok(())
    }

    /// Attach a companion uninitialized ensemble, replacing any previous one.
    pub fn add_uninitialized(&mut self, uninitialized: impl Into<Dataset>) -> Result<()> {
        let uninitialized = uninitialized.into();
        self.ensemble.validate_reference(&uninitialized)?;
        tracing::info!(variables = ?uninitialized.var_names(), "added uninitialized ensemble");
        self.ensemble.set_uninitialized(uninitialized);

        Ok(())
    }

    /// Skill of the initialized ensemble against reference `refname`, or against every
    /// reference. Only variables shared with each reference are compared.
    ///
    pub fn compute_metric(
        &self,
        refname: Option<&str>,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Results> {
        if !self.has_references() {
            return Err(Error::Dataset(
                "You need to add a reference dataset before attempting to compute predictability."
                    .to_string(),
            ));
        }

        self.fan_out(refname, |name, reference| {
            let (drop_init, drop_ref) = self.vars_to_drop(name, Side::Initialized)?;
            self.ensemble.engine().compute_hindcast(
                &self.initialized().drop_vars(&drop_init)?,
                &reference.drop_vars(&drop_ref)?,
                metric,
                comparison,
            )
        })
    }

    /// Skill of the uninitialized ensemble against reference `refname`, or against every
    /// reference.
    ///
    /// Fails with a dataset error when no uninitialized ensemble or no reference has been added,
    /// even when `refname` is `None`.
    ///
    pub fn compute_uninitialized(
        &self,
        refname: Option<&str>,
        metric: Metric,
        comparison: Comparison,
    ) -> Result<Results> {
        let uninitialized = self.uninitialized().ok_or_else(|| {
            Error::Dataset(
                "You need to add an uninitialized ensemble before attempting to compute \
                 predictability."
                    .to_string(),
            )
        })?;
        if !self.has_references() {
            return Err(Error::Dataset(
                "You need to add a reference dataset before attempting to compute predictability."
                    .to_string(),
            ));
        }

        self.fan_out(refname, |name, reference| {
            let (drop_uninit, drop_ref) = self.vars_to_drop(name, Side::Uninitialized)?;
            self.ensemble.engine().compute_uninitialized(
                &uninitialized.drop_vars(&drop_uninit)?,
                &reference.drop_vars(&drop_ref)?,
                metric,
                comparison,
            )
        })
    }

    /// Skill of a persistence forecast of reference `refname`, or of every reference.
    ///
    /// Lags are taken from the initialized `lead` coordinate; `nlags` only defaults to the number
    /// of leads and is reported in the logs.
    ///
    pub fn compute_persistence(
        &self,
        refname: Option<&str>,
        nlags: Option<usize>,
        metric: Metric,
    ) -> Result<Results> {
        if !self.has_references() {
            return Err(Error::Dataset(
                "You need to add a reference dataset before attempting to compute persistence \
                 forecasts."
                    .to_string(),
            ));
        }
        let nlags = self.ensemble.nlags(nlags);

        self.fan_out(refname, |name, reference| {
            tracing::debug!(reference = %name, nlags, %metric, "computing persistence");
            self.ensemble
                .engine()
                .compute_persistence(self.initialized(), reference, metric)
        })
    }

    /// Predictability horizons are not implemented.
    pub fn compute_horizon(&self, _refname: Option<&str>) -> Result<Results> {
        Err(Error::NotImplemented("predictability horizons".to_string()))
    }

    /// Run `compute` for reference `refname`, or for every reference, keyed by reference name.
    fn fan_out<F>(&self, refname: Option<&str>, mut compute: F) -> Result<Results>
    where
        F: FnMut(&str, &Dataset) -> Result<Dataset>,
    {
        let mut results = Results::new();
        match refname {
            Some(name) => {
                let reference = self.lookup(name)?;
                results.insert(name, compute(name, reference)?);
            }
            None => {
                for (name, reference) in &self.references {
                    results.insert(name.as_str(), compute(name, reference)?);
                }
            }
        }

        Ok(results)
    }

    fn lookup(&self, refname: &str) -> Result<&Dataset> {
        self.references
            .get(refname)
            .ok_or_else(|| Error::MissingReference(refname.to_string()))
    }

    fn side(&self, side: Side) -> Result<&Dataset> {
        match side {
            Side::Initialized => Ok(self.initialized()),
            Side::Uninitialized => self.uninitialized().ok_or_else(|| {
                Error::Dataset("no uninitialized ensemble has been added".to_string())
            }),
        }
    }
}

impl Describe for HindcastEnsemble {
    fn kind(&self) -> &'static str {
        "HindcastEnsemble"
    }

    fn ensemble(&self) -> &PredictionEnsemble {
        &self.ensemble
    }

    fn describe(&self) -> Vec<String> {
        if self.references.is_empty() {
            let mut lines = vec!["References:".to_string()];
            lines.extend(section(None, 4));
            return lines;
        }

        let mut lines = vec![];
        for (name, reference) in &self.references {
            lines.push(format!("{name}:"));
            lines.extend(section(Some(reference), 4));
        }

        lines
    }
}

impl fmt::Display for HindcastEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        summarize(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DataArray, LEAD, TIME};
    use crate::engine::DefaultEngine;
    use crate::errors::ErrorKind;
    use crate::testing::{self, RecordingEngine};
    use ndarray::Array;

    fn strings(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    fn recording(vars: &[&str]) -> (Arc<RecordingEngine>, HindcastEnsemble) {
        let engine = Arc::new(RecordingEngine::default());
        let ensemble =
            HindcastEnsemble::with_engine(testing::hindcast_initialized(vars, 3), engine.clone())
                .unwrap();
        (engine, ensemble)
    }

    #[test]
    fn test_new_requires_init_and_lead() {
        let err = HindcastEnsemble::new(testing::reference(&["SST"])).unwrap_err();
        match err {
            Error::Dimension { unmatched, .. } => {
                assert_eq!(unmatched.into_iter().collect::<Vec<_>>(), strings(&["init", "lead"]));
            }
            err => panic!("unexpected error: {err}"),
        }
    }

    #[test]
    fn test_add_reference() {
        let (_, mut ensemble) = recording(&["SST"]);
        assert!(!ensemble.has_references());
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        ensemble
            .add_reference(
                DataArray::new("SST", [TIME], Array::zeros(10).into_dyn()).unwrap(),
                "reconstruction",
            )
            .unwrap();
        assert_eq!(
            ensemble.references().keys().cloned().collect::<Vec<_>>(),
            strings(&["obs", "reconstruction"])
        );
    }

    #[test]
    fn test_add_reference_overwrites() {
        let (_, mut ensemble) = recording(&["SST", "SALT"]);
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        ensemble.add_reference(testing::reference(&["SALT"]), "obs").unwrap();
        assert_eq!(ensemble.references().len(), 1);
        assert_eq!(
            ensemble.reference("obs").unwrap().var_names(),
            strings(&["SALT"])
        );
    }

    #[test]
    fn test_add_reference_dimension_mismatch() {
        let (_, mut ensemble) = recording(&["SST"]);
        let reference = DataArray::new("SST", ["year", "lat"], Array::zeros((5, 2)).into_dyn())
            .unwrap();
        match ensemble.add_reference(reference, "obs").unwrap_err() {
            Error::Dimension { unmatched, .. } => {
                assert_eq!(
                    unmatched.into_iter().collect::<Vec<_>>(),
                    strings(&["lat", "time", "year"])
                );
            }
            err => panic!("unexpected error: {err}"),
        }
        assert!(!ensemble.has_references());
    }

    #[test]
    fn test_add_reference_no_shared_variables() {
        let (_, mut ensemble) = recording(&["SST"]);
        let err = ensemble
            .add_reference(testing::reference(&["SALT"]), "obs")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Variable);
        assert!(!ensemble.has_references());
    }

    #[test]
    fn test_add_uninitialized() {
        let (_, mut ensemble) = recording(&["SST"]);
        ensemble.add_uninitialized(testing::reference(&["SST", "SALT"])).unwrap();
        ensemble.add_uninitialized(testing::reference(&["SST"])).unwrap();
        assert_eq!(ensemble.uninitialized().unwrap().var_names(), strings(&["SST"]));

        let err = ensemble
            .add_uninitialized(testing::reference(&["O2"]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Variable);
        assert_eq!(ensemble.uninitialized().unwrap().var_names(), strings(&["SST"]));
    }

    #[test]
    fn test_add_uninitialized_dimension_mismatch() {
        let (_, mut ensemble) = recording(&["SST"]);
        ensemble.add_uninitialized(testing::reference(&["SST"])).unwrap();

        let uninitialized =
            DataArray::new("SST", [TIME, "lon"], Array::zeros((5, 4)).into_dyn()).unwrap();
        match ensemble.add_uninitialized(uninitialized).unwrap_err() {
            Error::Dimension { unmatched, .. } => {
                assert_eq!(unmatched.into_iter().collect::<Vec<_>>(), strings(&["lon"]));
            }
            err => panic!("unexpected error: {err}"),
        }
        assert_eq!(
            ensemble.uninitialized(),
            Some(&testing::reference(&["SST"]))
        );
    }

    #[test]
    fn test_add_uninitialized_data_array() {
        let (_, mut ensemble) = recording(&["SST"]);
        let uninitialized = DataArray::new("SST", [TIME], Array::ones(12).into_dyn()).unwrap();
        ensemble.add_uninitialized(uninitialized).unwrap();
        assert!(ensemble.has_uninitialized());
        assert_eq!(ensemble.uninitialized().unwrap().dim_size(TIME), Some(12));
    }

    #[test]
    fn test_vars_to_drop() {
        let (_, mut ensemble) = recording(&["SST", "SALT"]);
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        assert_eq!(
            ensemble.vars_to_drop("obs", Side::Initialized).unwrap(),
            (strings(&["SALT"]), vec![])
        );

        ensemble
            .add_uninitialized(testing::reference(&["SST", "O2"]))
            .unwrap();
        ensemble
            .add_reference(testing::reference(&["SST", "SALT", "PO4"]), "reconstruction")
            .unwrap();
        assert_eq!(
            ensemble
                .vars_to_drop("reconstruction", Side::Uninitialized)
                .unwrap(),
            (strings(&["O2"]), strings(&["PO4", "SALT"]))
        );
    }

    #[test]
    fn test_vars_to_drop_errors() {
        let (_, mut ensemble) = recording(&["SST"]);
        let err = ensemble.vars_to_drop("obs", Side::Initialized).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Lookup);
        assert!(matches!(err, Error::MissingReference(name) if name == "obs"));

        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        let err = ensemble.vars_to_drop("obs", Side::Uninitialized).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);
    }

    #[test]
    fn test_compute_metric_needs_reference() {
        let (engine, ensemble) = recording(&["SST"]);
        let err = ensemble
            .compute_metric(None, Metric::PearsonR, Comparison::E2R)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);
        let err = ensemble
            .compute_persistence(None, None, Metric::PearsonR)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_compute_metric_single_reference() {
        let (engine, mut ensemble) = recording(&["SST", "SALT"]);
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        let results = ensemble
            .compute_metric(None, Metric::PearsonR, Comparison::E2R)
            .unwrap();
        assert_eq!(results.len(), 1);
        assert!(results.single().is_some());

        let calls = engine.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].method, "compute_hindcast");
        // SALT is only in the initialized ensemble, so it is not compared
        assert_eq!(calls[0].args, vec![strings(&["SST"]), strings(&["SST"])]);
    }

    #[test]
    fn test_compute_metric_all_references() {
        let (engine, mut ensemble) = recording(&["SST", "SALT"]);
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        ensemble
            .add_reference(testing::reference(&["SST", "SALT"]), "reconstruction")
            .unwrap();
        let results = ensemble
            .compute_metric(None, Metric::Rmse, Comparison::M2R)
            .unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["obs", "reconstruction"]);
        assert!(results.single().is_none());
        assert_eq!(engine.calls().len(), 2);
        assert_eq!(
            results.get("reconstruction").unwrap().var_names(),
            strings(&["SALT", "SST"])
        );
    }

    #[test]
    fn test_compute_metric_named_reference() {
        let (engine, mut ensemble) = recording(&["SST"]);
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        ensemble.add_reference(testing::reference(&["SST"]), "reconstruction").unwrap();
        let results = ensemble
            .compute_metric(Some("reconstruction"), Metric::PearsonR, Comparison::E2R)
            .unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["reconstruction"]);
        assert_eq!(engine.calls().len(), 1);

        let err = ensemble
            .compute_metric(Some("missing"), Metric::PearsonR, Comparison::E2R)
            .unwrap_err();
        assert!(matches!(err, Error::MissingReference(_)));
    }

    #[test]
    fn test_compute_uninitialized() {
        let (engine, mut ensemble) = recording(&["SST"]);
        ensemble.add_reference(testing::reference(&["SST", "SALT"]), "obs").unwrap();
        let err = ensemble
            .compute_uninitialized(None, Metric::PearsonR, Comparison::E2R)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);

        ensemble.add_uninitialized(testing::reference(&["SST", "O2"])).unwrap();
        let results = ensemble
            .compute_uninitialized(None, Metric::PearsonR, Comparison::E2R)
            .unwrap();
        assert!(results.get("obs").is_some());

        let calls = engine.calls();
        assert_eq!(calls[0].method, "compute_uninitialized");
        assert_eq!(calls[0].args, vec![strings(&["SST"]), strings(&["SST"])]);
    }

    #[test]
    fn test_compute_uninitialized_without_reference() {
        let (engine, mut ensemble) = recording(&["SST"]);
        ensemble.add_uninitialized(testing::reference(&["SST"])).unwrap();
        let err = ensemble
            .compute_uninitialized(None, Metric::PearsonR, Comparison::E2R)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Dataset);
        assert!(engine.calls().is_empty());
    }

    #[test]
    fn test_compute_persistence_skips_variable_drop() {
        let (engine, mut ensemble) = recording(&["SST"]);
        ensemble
            .add_reference(testing::reference(&["SST", "SALT"]), "obs")
            .unwrap();
        let results = ensemble
            .compute_persistence(None, None, Metric::PearsonR)
            .unwrap();
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["obs"]);

        let calls = engine.calls();
        assert_eq!(calls[0].method, "compute_persistence");
        assert_eq!(calls[0].args, vec![strings(&["SST"]), strings(&["SALT", "SST"])]);
    }

    #[test]
    fn test_compute_horizon() {
        let (_, mut ensemble) = recording(&["SST"]);
        assert_eq!(
            ensemble.compute_horizon(None).unwrap_err().kind(),
            ErrorKind::NotImplemented
        );
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        assert_eq!(
            ensemble.compute_horizon(Some("obs")).unwrap_err().kind(),
            ErrorKind::NotImplemented
        );
    }

    #[test]
    fn test_default_engine_end_to_end() {
        let mut ensemble =
            HindcastEnsemble::with_engine(
                testing::hindcast_initialized(&["SST", "SALT"], 3),
                Arc::new(DefaultEngine::new()),
            )
            .unwrap();
        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();

        let skill = ensemble
            .compute_metric(None, Metric::PearsonR, Comparison::E2R)
            .unwrap()
            .into_single()
            .unwrap();
        let sst = skill.var("SST").unwrap();
        assert_eq!(sst.dims(), &[LEAD]);
        assert!(sst.data().iter().all(|r| (r - 1.0).abs() < 1e-10));
        assert!(!skill.contains("SALT"));

        let persistence = ensemble
            .compute_persistence(Some("obs"), None, Metric::Rmse)
            .unwrap();
        assert_eq!(persistence.single().unwrap().dim_size(LEAD), Some(3));

        ensemble.add_uninitialized(testing::reference(&["SST"])).unwrap();
        let skill = ensemble
            .compute_uninitialized(Some("obs"), Metric::PearsonR, Comparison::E2R)
            .unwrap();
        let sst = skill.single().unwrap().var("SST").unwrap();
        assert!((sst.data()[[]] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn test_display() {
        let (_, mut ensemble) = recording(&["SST"]);
        assert_eq!(
            ensemble.to_string(),
            "<climpred.HindcastEnsemble>\n\
             Initialized Ensemble:\n    \
             SST (init, lead, member) float64\n\
             References:\n    \
             None\n\
             Uninitialized:\n    \
             None"
        );

        ensemble.add_reference(testing::reference(&["SST"]), "obs").unwrap();
        ensemble
            .add_reference(testing::reference(&["SST"]), "reconstruction")
            .unwrap();
        let summary = ensemble.to_string();
        assert!(!summary.contains("References:"));
        assert!(summary.contains(
            "float64\nobs:\n    SST (time) float64\nreconstruction:\n    SST (time) float64\n"
        ));
    }
}
