//! Skill metrics scoring a forecast series against a verification series.

use std::fmt;
use std::str::FromStr;

use num_traits::Float;

use crate::errors::{Error, Result};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Metric {
    /// Pearson product-moment correlation
    #[default]
    PearsonR,

    /// Root mean square error
    Rmse,

    /// Mean square error
    Mse,

    /// Mean absolute error
    Mae,

    /// Mean square error normalized by the climatological variance of the verification data
    Nmse,
}

impl Metric {
    pub const ALL: [Metric; 5] = [
        Metric::PearsonR,
        Metric::Rmse,
        Metric::Mse,
        Metric::Mae,
        Metric::Nmse,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Metric::PearsonR => "pearson_r",
            Metric::Rmse => "rmse",
            Metric::Mse => "mse",
            Metric::Mae => "mae",
            Metric::Nmse => "nmse",
        }
    }

    /// Larger scores are better for positively oriented metrics, smaller ones for the rest.
    pub fn is_positive(&self) -> bool {
        matches!(self, Metric::PearsonR)
    }

    /// Score `forecast` against `verification`.
    ///
    /// Only pairs where both values are finite take part. Fewer than two pairs, or a degenerate
    /// input (constant series for `pearson_r`, non-positive `climatology` for `nmse`), scores
    /// NaN. `climatology` is only used by `nmse`.
    ///
    pub fn score<F: Float>(&self, forecast: &[F], verification: &[F], climatology: F) -> F {
        let (forecast, verification) = finite_pairs(forecast, verification);
        if forecast.len() < 2 {
            return F::nan();
        }

        match self {
            Metric::PearsonR => pearson_r(&forecast, &verification).unwrap_or_else(F::nan),
            Metric::Rmse => mse(&forecast, &verification).sqrt(),
            Metric::Mse => mse(&forecast, &verification),
            Metric::Mae => mae(&forecast, &verification),
            Metric::Nmse => {
                if climatology > F::zero() {
                    mse(&forecast, &verification) / climatology
                } else {
                    F::nan()
                }
            }
        }
    }

    /// Whether `baseline` scores at least as well as `forecast`. NaN never does.
    pub fn at_least_as_good<F: Float>(&self, baseline: F, forecast: F) -> bool {
        if self.is_positive() {
            baseline >= forecast
        } else {
            baseline <= forecast
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Metric {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Metric::ALL
            .into_iter()
            .find(|metric| metric.name() == name)
            .ok_or_else(|| Error::UnknownMetric(name.to_string()))
    }
}

fn finite_pairs<F: Float>(x: &[F], y: &[F]) -> (Vec<F>, Vec<F>) {
    x.iter()
        .zip(y)
        .filter(|(xi, yi)| xi.is_finite() && yi.is_finite())
        .map(|(xi, yi)| (*xi, *yi))
        .unzip()
}

fn count<F: Float>(n: usize) -> F {
    F::from(n).unwrap_or_else(F::nan)
}

/// Arithmetic mean. NaN if empty.
pub fn mean<F: Float>(x: &[F]) -> F {
    if x.is_empty() {
        return F::nan();
    }
    x.iter().fold(F::zero(), |sum, &xi| sum + xi) / count(x.len())
}

/// Sample variance with an N - 1 denominator over the finite values of `x`. NaN if fewer than two.
pub fn variance<F: Float>(x: &[F]) -> F {
    let finite: Vec<F> = x.iter().copied().filter(|xi| xi.is_finite()).collect();
    if finite.len() < 2 {
        return F::nan();
    }
    let m = mean(&finite);
    let ss = finite
        .iter()
        .fold(F::zero(), |sum, &xi| sum + (xi - m) * (xi - m));

    ss / count(finite.len() - 1)
}

fn pearson_r<F: Float>(x: &[F], y: &[F]) -> Option<F> {
    let mx = mean(x);
    let my = mean(y);
    let (mut sxy, mut sxx, mut syy) = (F::zero(), F::zero(), F::zero());
    for (&xi, &yi) in x.iter().zip(y) {
        let dx = xi - mx;
        let dy = yi - my;
        sxy = sxy + dx * dy;
        sxx = sxx + dx * dx;
        syy = syy + dy * dy;
    }

    if sxx == F::zero() || syy == F::zero() {
        return None;
    }

    Some(sxy / (sxx.sqrt() * syy.sqrt()))
}

fn mse<F: Float>(x: &[F], y: &[F]) -> F {
    let sum = x
        .iter()
        .zip(y)
        .fold(F::zero(), |sum, (&xi, &yi)| sum + (xi - yi) * (xi - yi));
    sum / count(x.len())
}

fn mae<F: Float>(x: &[F], y: &[F]) -> F {
    let sum = x
        .iter()
        .zip(y)
        .fold(F::zero(), |sum, (&xi, &yi)| sum + (xi - yi).abs());
    sum / count(x.len())
}
