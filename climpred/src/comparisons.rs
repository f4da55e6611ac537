//! How ensemble members are paired up with the data they are verified against.

use std::fmt;
use std::str::FromStr;

use ndarray::{ArrayView1, ArrayView2, Axis};

use crate::errors::{Error, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Comparison {
    /// Ensemble mean to reference (hindcast)
    E2R,

    /// Each member to reference (hindcast)
    M2R,

    /// Each member to each other member (perfect model)
    M2M,

    /// Each member to the mean of the remaining members (perfect model)
    M2E,

    /// Each member to the control member (perfect model)
    M2C,

    /// Ensemble mean to the control member (perfect model)
    E2C,
}

/// Forecast series and the series they are verified against, stacked end to end.
pub(crate) type Pairs = (Vec<f64>, Vec<f64>);

impl Comparison {
    pub const ALL: [Comparison; 6] = [
        Comparison::E2R,
        Comparison::M2R,
        Comparison::M2M,
        Comparison::M2E,
        Comparison::M2C,
        Comparison::E2C,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Comparison::E2R => "e2r",
            Comparison::M2R => "m2r",
            Comparison::M2M => "m2m",
            Comparison::M2E => "m2e",
            Comparison::M2C => "m2c",
            Comparison::E2C => "e2c",
        }
    }

    pub fn is_hindcast(&self) -> bool {
        matches!(self, Comparison::E2R | Comparison::M2R)
    }

    pub fn is_perfect_model(&self) -> bool {
        !self.is_hindcast()
    }

    pub(crate) fn require_hindcast(&self) -> Result<()> {
        if self.is_hindcast() {
            Ok(())
        } else {
            Err(Error::Comparison {
                comparison: self.name().to_string(),
                context: "a hindcast (use e2r or m2r)".to_string(),
            })
        }
    }

    pub(crate) fn require_perfect_model(&self) -> Result<()> {
        if self.is_perfect_model() {
            Ok(())
        } else {
            Err(Error::Comparison {
                comparison: self.name().to_string(),
                context: "a perfect model (use m2m, m2e, m2c or e2c)".to_string(),
            })
        }
    }

    /// Forecast series to verify against a reference, from an ensemble shaped (member, time).
    ///
    /// `e2r` yields the ensemble mean, `m2r` yields every member.
    ///
    pub(crate) fn hindcast_forecasts(&self, ensemble: ArrayView2<f64>) -> Result<Vec<Vec<f64>>> {
        self.require_hindcast()?;
        if ensemble.nrows() == 0 {
            return Err(Error::Computation("ensemble has no members".to_string()));
        }

        Ok(match self {
            Comparison::E2R => vec![ensemble_mean(ensemble, None)],
            _ => ensemble.outer_iter().map(|member| member.to_vec()).collect(),
        })
    }

    /// Forecast/verification pairs within an ensemble shaped (member, init).
    pub(crate) fn perfect_model_pairs(&self, ensemble: ArrayView2<f64>) -> Result<Pairs> {
        self.require_perfect_model()?;
        let members = ensemble.nrows();
        if members < 2 {
            return Err(Error::Computation(format!(
                "comparison '{}' needs at least two members, got {members}",
                self.name()
            )));
        }

        let mut forecast = vec![];
        let mut verification = vec![];
        let mut push = |fc: &[f64], verif: ArrayView1<f64>| {
            forecast.extend_from_slice(fc);
            verification.extend(verif.iter().copied());
        };

        match self {
            Comparison::M2M => {
                for m in 0..members {
                    for n in (0..members).filter(|&n| n != m) {
                        push(&ensemble.row(n).to_vec(), ensemble.row(m));
                    }
                }
            }
            Comparison::M2E => {
                for m in 0..members {
                    push(&ensemble_mean(ensemble, Some(m)), ensemble.row(m));
                }
            }
            Comparison::M2C => {
                for m in 1..members {
                    push(&ensemble.row(m).to_vec(), ensemble.row(0));
                }
            }
            Comparison::E2C => {
                let rest = ensemble.slice(ndarray::s![1.., ..]);
                push(&ensemble_mean(rest, None), ensemble.row(0));
            }
            _ => unreachable!("hindcast comparisons rejected above"),
        }

        Ok((forecast, verification))
    }
}

/// Mean over members (axis 0), optionally leaving one member out.
fn ensemble_mean(ensemble: ArrayView2<f64>, exclude: Option<usize>) -> Vec<f64> {
    let kept: Vec<usize> = (0..ensemble.nrows())
        .filter(|&m| Some(m) != exclude)
        .collect();
    let n = kept.len() as f64;
    ensemble
        .select(Axis(0), &kept)
        .sum_axis(Axis(0))
        .iter()
        .map(|sum| sum / n)
        .collect()
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Comparison {
    type Err = Error;

    fn from_str(name: &str) -> Result<Self> {
        Comparison::ALL
            .into_iter()
            .find(|comparison| comparison.name() == name)
            .ok_or_else(|| Error::UnknownComparison(name.to_string()))
    }
}
