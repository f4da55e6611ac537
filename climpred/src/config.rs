//! Bootstrap configuration.

use crate::errors::{Error, Result};

/// Configuration for bootstrapping skill significance.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapConfig {
    sig: f64,
    iterations: usize,
    pers_sig: Option<f64>,
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self {
            sig: 95.0,
            iterations: 500,
            pers_sig: None,
        }
    }
}

impl BootstrapConfig {
    /// Set the significance level (percent) for the initialized and uninitialized comparison.
    pub fn with_sig(mut self, sig: f64) -> Self {
        self.sig = sig;
        self
    }

    /// Set the number of resampling iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set a separate significance level (percent) for persistence.
    pub fn with_pers_sig(mut self, pers_sig: f64) -> Self {
        self.pers_sig = Some(pers_sig);
        self
    }

    /// Returns the significance level.
    pub fn sig(&self) -> f64 {
        self.sig
    }

    /// Returns the number of resampling iterations.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Returns the persistence significance level, if one was set.
    pub fn pers_sig(&self) -> Option<f64> {
        self.pers_sig
    }

    /// Check that significance levels are percentages strictly between 0 and 100 and that at
    /// least one iteration is requested.
    pub fn validate(&self) -> Result<()> {
        check_sig("sig", self.sig)?;
        if let Some(pers_sig) = self.pers_sig {
            check_sig("pers_sig", pers_sig)?;
        }
        if self.iterations == 0 {
            return Err(Error::Config(
                "iterations must be at least 1".to_string(),
            ));
        }

        Ok(())
    }

    /// Lower and upper quantiles (as fractions) of the confidence interval for `sig`.
    pub(crate) fn bounds(sig: f64) -> (f64, f64) {
        let tail = (100.0 - sig) / 2.0 / 100.0;
        (tail, 1.0 - tail)
    }

    /// Confidence interval quantiles for the initialized and uninitialized comparison.
    pub(crate) fn sig_bounds(&self) -> (f64, f64) {
        Self::bounds(self.sig)
    }

    /// Confidence interval quantiles for persistence, falling back on `sig`.
    pub(crate) fn pers_bounds(&self) -> (f64, f64) {
        Self::bounds(self.pers_sig.unwrap_or(self.sig))
    }
}

fn check_sig(name: &str, sig: f64) -> Result<()> {
    if !(sig > 0.0 && sig < 100.0) {
        return Err(Error::Config(format!(
            "{name} must be between 0 and 100, got {sig}"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = BootstrapConfig::default();
        assert_eq!(config.sig(), 95.0);
        assert_eq!(config.iterations(), 500);
        assert_eq!(config.pers_sig(), None);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder_methods() {
        let config = BootstrapConfig::default()
            .with_sig(90.0)
            .with_iterations(50)
            .with_pers_sig(99.0);

        assert_eq!(config.sig(), 90.0);
        assert_eq!(config.iterations(), 50);
        assert_eq!(config.pers_sig(), Some(99.0));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate() {
        assert!(BootstrapConfig::default().with_sig(0.0).validate().is_err());
        assert!(BootstrapConfig::default().with_sig(100.0).validate().is_err());
        assert!(BootstrapConfig::default().with_sig(f64::NAN).validate().is_err());
        assert!(BootstrapConfig::default()
            .with_pers_sig(120.0)
            .validate()
            .is_err());
        assert!(matches!(
            BootstrapConfig::default().with_iterations(0).validate(),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_bounds() {
        let config = BootstrapConfig::default().with_sig(90.0);
        let (low, high) = config.sig_bounds();
        assert!((low - 0.05).abs() < 1e-12);
        assert!((high - 0.95).abs() < 1e-12);

        let (low, _) = config.pers_bounds();
        assert!((low - 0.05).abs() < 1e-12);

        let (low, high) = config.with_pers_sig(50.0).pers_bounds();
        assert!((low - 0.25).abs() < 1e-12);
        assert!((high - 0.75).abs() < 1e-12);
    }
}
