use std::fmt;
use std::sync::Arc;

use crate::dataset::{Dataset, LEAD};
use crate::engine::{DefaultEngine, Engine};
use crate::errors::Result;
use crate::validate::{
    check_prediction_ensemble_dimensions, check_reference_dimensions,
    check_reference_vars_match_initialized,
};

/// State shared by every kind of prediction ensemble: the initialized forecast, an optional
/// uninitialized baseline, and the engine computations are delegated to.
///
pub struct PredictionEnsemble {
    initialized: Dataset,
    uninitialized: Option<Dataset>,
    engine: Arc<dyn Engine>,
}

impl PredictionEnsemble {
    /// Wrap an initialized forecast, which must have `init` and `lead` dimensions.
    pub fn new(initialized: impl Into<Dataset>) -> Result<Self> {
        Self::with_engine(initialized, Arc::new(DefaultEngine::new()))
    }

    pub fn with_engine(initialized: impl Into<Dataset>, engine: Arc<dyn Engine>) -> Result<Self> {
        let initialized = initialized.into();
        check_prediction_ensemble_dimensions(&initialized)?;

        Ok(Self {
            initialized,
            uninitialized: None,
            engine,
        })
    }

    pub fn initialized(&self) -> &Dataset {
        &self.initialized
    }

    pub fn uninitialized(&self) -> Option<&Dataset> {
        self.uninitialized.as_ref()
    }

    pub fn has_uninitialized(&self) -> bool {
        self.uninitialized.is_some()
    }

    pub(crate) fn set_uninitialized(&mut self, uninitialized: Dataset) {
        self.uninitialized = Some(uninitialized);
    }

    pub(crate) fn engine(&self) -> &dyn Engine {
        self.engine.as_ref()
    }

    /// Check that `candidate` can be compared against the initialized forecast.
    pub(crate) fn validate_reference(&self, candidate: &Dataset) -> Result<()> {
        check_reference_dimensions(&self.initialized, candidate)?;
        check_reference_vars_match_initialized(&self.initialized, candidate)
    }

    /// Number of persistence lags: `nlags` if given, otherwise the size of the lead dimension.
    pub(crate) fn nlags(&self, nlags: Option<usize>) -> usize {
        nlags.unwrap_or_else(|| self.initialized.dim_size(LEAD).unwrap_or(0))
    }
}

impl fmt::Debug for PredictionEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredictionEnsemble")
            .field("initialized", &self.initialized)
            .field("uninitialized", &self.uninitialized)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PredictionEnsemble {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        summarize(self, f)
    }
}

/// Per-variant part of an ensemble's printed summary.
pub trait Describe {
    /// Type name shown in the summary header.
    fn kind(&self) -> &'static str;

    fn ensemble(&self) -> &PredictionEnsemble;

    /// Lines of the variant-specific section, header included. Empty for the bare base.
    fn describe(&self) -> Vec<String>;
}

impl Describe for PredictionEnsemble {
    fn kind(&self) -> &'static str {
        "PredictionEnsemble"
    }

    fn ensemble(&self) -> &PredictionEnsemble {
        self
    }

    fn describe(&self) -> Vec<String> {
        vec![]
    }
}

/// Indented variable lines of `dataset`, or `None`.
pub(crate) fn section(dataset: Option<&Dataset>, indent: usize) -> Vec<String> {
    let pad = " ".repeat(indent);
    match dataset {
        Some(dataset) => dataset
            .summary_lines()
            .into_iter()
            .map(|line| format!("{pad}{line}"))
            .collect(),
        None => vec![format!("{pad}None")],
    }
}

pub(crate) fn summarize<E: Describe + ?Sized>(ensemble: &E, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let base = ensemble.ensemble();
    let mut lines = vec![
        format!("<climpred.{}>", ensemble.kind()),
        "Initialized Ensemble:".to_string(),
    ];
    lines.extend(section(Some(base.initialized()), 4));
    lines.extend(ensemble.describe());
    lines.push("Uninitialized:".to_string());
    lines.extend(section(base.uninitialized(), 4));

    write!(f, "{}", lines.join("\n"))
}
