mod bootstrap;
mod comparisons;
mod config;
mod dataset;
mod engine;
mod ensemble;
mod errors;
mod hindcast;
mod layout;
mod metrics;
mod perfect_model;
mod prediction;
mod results;
mod validate;

#[cfg(test)]
mod testing;

pub use bootstrap::bootstrap_perfect_model;
pub use bootstrap::bootstrap_uninit_pm_ensemble_from_control;
pub use bootstrap::BOUND;

pub use comparisons::Comparison;

pub use config::BootstrapConfig;

pub use dataset::{DataArray, Dataset, INIT, LEAD, MEMBER, TIME};

pub use engine::{DefaultEngine, Engine};

pub use ensemble::{Describe, PredictionEnsemble};

pub use errors::{Error, ErrorKind, Result};

pub use hindcast::{HindcastEnsemble, Side};

pub use metrics::Metric;

pub use perfect_model::PerfectModelEnsemble;

pub use prediction::{
    compute_hindcast, compute_perfect_model, compute_persistence, compute_uninitialized,
};

pub use results::Results;
