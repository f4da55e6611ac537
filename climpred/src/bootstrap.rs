//! Resampling a perfect-model ensemble to estimate the significance of its skill.
//!
//! See: Goddard, L., et al. "A Verification Framework for Interannual-to-Decadal Predictions
//! Experiments." Climate Dynamics 40, no. 1-2 (2013): 245-72.
//!
use ndarray::{s, Array2, Array3, Array4, ArrayView2, ArrayView3, Axis, Ix2, Ix4};
use rand::Rng;

use crate::comparisons::Comparison;
use crate::config::BootstrapConfig;
use crate::dataset::{Dataset, INIT, LEAD, MEMBER, TIME};
use crate::errors::{Error, Result};
use crate::layout::{coordinate, frame, unflatten, Frame};
use crate::metrics::Metric;
use crate::prediction::{perfect_model_skill, persistence_skill};

/// Lower/upper confidence bound
pub const BOUND: &str = "bound";

/// Build an uninitialized ensemble from contiguous segments of the control run.
///
/// Every variable shared by `initialized` and `control` gets an array with the initialized
/// dimensions, where each (init, member) series is a randomly positioned stretch of the control
/// as long as the lead dimension.
///
pub fn bootstrap_uninit_pm_ensemble_from_control<R: Rng + ?Sized>(
    initialized: &Dataset,
    control: &Dataset,
    rng: &mut R,
) -> Result<Dataset> {
    let mut uninitialized = Dataset::new();
    for var in initialized.data_vars() {
        let series = match control.get(var.name()) {
            Some(series) => series,
            None => continue,
        };
        let Frame { data, rest } = frame(var, &[LEAD, MEMBER, INIT], None)?;
        let (nlead, nmember, ninit, _) = data.into_dimensionality::<Ix4>()?.dim();
        let series = frame(series, &[TIME], Some(&rest))?
            .data
            .into_dimensionality::<Ix2>()?;

        let values = uninit_from_control((nlead, nmember, ninit), series.view(), rng)?;
        uninitialized.insert(unflatten(
            var.name(),
            &[LEAD, MEMBER, INIT],
            values.into_dyn(),
            &rest,
        )?)?;
    }

    for dim in [INIT, LEAD, MEMBER] {
        if uninitialized.has_dim(dim) {
            if let Some(values) = initialized.coord(dim) {
                uninitialized.set_coord(dim, values)?;
            }
        }
    }

    Ok(uninitialized)
}

/// Random control segments shaped (lead, member, init, point) from a control shaped (time, point).
fn uninit_from_control<R: Rng + ?Sized>(
    (nlead, nmember, ninit): (usize, usize, usize),
    control: ArrayView2<f64>,
    rng: &mut R,
) -> Result<Array4<f64>> {
    let (ntime, npoints) = control.dim();
    if ntime < nlead {
        return Err(Error::Computation(format!(
            "control run has {ntime} time steps, need at least {nlead} for the lead dimension"
        )));
    }

    let mut values = Array4::zeros((nlead, nmember, ninit, npoints));
    for i in 0..ninit {
        for m in 0..nmember {
            let start = rng.gen_range(0..=ntime - nlead);
            values
                .slice_mut(s![.., m, i, ..])
                .assign(&control.slice(s![start..start + nlead, ..]));
        }
    }

    Ok(values)
}

/// Bootstrap the skill of a single-variable perfect-model ensemble with replacement.
///
/// Returns a dataset with:
///
/// * `init_skill`, `uninit_skill`, `pers_skill`: skill of the actual data.
/// * `init_ci`, `uninit_ci`, `pers_ci`: confidence interval of each skill over the resamples.
/// * `p_uninit_over_init`: fraction of resamples where the uninitialized ensemble is at least as
///   skillful as the initialized one.
/// * `p_pers_over_init`: the same for persistence.
///
pub fn bootstrap_perfect_model<R: Rng + ?Sized>(
    initialized: &Dataset,
    control: &Dataset,
    metric: Metric,
    comparison: Comparison,
    config: &BootstrapConfig,
    rng: &mut R,
) -> Result<Dataset> {
    config.validate()?;
    comparison.require_perfect_model()?;

    let names = initialized.var_names();
    let name = match names.as_slice() {
        [name] => name,
        _ => {
            return Err(Error::Computation(format!(
                "bootstrapping works on one variable at a time, got {names:?}"
            )));
        }
    };

    let inits = coordinate(initialized, INIT)?;
    let leads = coordinate(initialized, LEAD)?;
    let times = coordinate(control, TIME)?;

    let Frame { data, rest } = frame(initialized.var(name)?, &[LEAD, MEMBER, INIT], None)?;
    let ensemble = data.into_dimensionality::<Ix4>()?;
    let series = frame(control.var(name)?, &[TIME], Some(&rest))?
        .data
        .into_dimensionality::<Ix2>()?;
    let (nlead, nmember, ninit, npoints) = ensemble.dim();
    if ninit == 0 {
        return Err(Error::Computation(
            "cannot resample an ensemble without initializations".to_string(),
        ));
    }

    let init_skill = perfect_model_skill(ensemble.view(), Some(series.view()), metric, comparison)?;
    let uninit = uninit_from_control((nlead, nmember, ninit), series.view(), rng)?;
    let uninit_skill = perfect_model_skill(uninit.view(), Some(series.view()), metric, comparison)?;
    let pers_skill = persistence_skill(series.view(), &inits, &leads, &times, metric);

    let iterations = config.iterations();
    let mut init_samples = Array3::from_elem((iterations, nlead, npoints), f64::NAN);
    let mut uninit_samples = init_samples.clone();
    let mut pers_samples = init_samples.clone();
    for b in 0..iterations {
        let picks: Vec<usize> = (0..ninit).map(|_| rng.gen_range(0..ninit)).collect();
        let resampled = ensemble.select(Axis(2), &picks);
        let resampled_inits = inits.select(Axis(0), &picks);

        init_samples.slice_mut(s![b, .., ..]).assign(&perfect_model_skill(
            resampled.view(),
            Some(series.view()),
            metric,
            comparison,
        )?);

        let uninit = uninit_from_control((nlead, nmember, ninit), series.view(), rng)?;
        uninit_samples.slice_mut(s![b, .., ..]).assign(&perfect_model_skill(
            uninit.view(),
            Some(series.view()),
            metric,
            comparison,
        )?);

        pers_samples.slice_mut(s![b, .., ..]).assign(&persistence_skill(
            series.view(),
            &resampled_inits,
            &leads,
            &times,
            metric,
        ));
    }
    tracing::debug!(variable = %name, iterations, "bootstrapped perfect-model skill");

    let p_uninit = p_value(uninit_samples.view(), init_samples.view(), metric);
    let p_pers = p_value(pers_samples.view(), init_samples.view(), metric);

    let mut result = Dataset::new();
    for (output, values) in [
        ("init_skill", init_skill),
        ("uninit_skill", uninit_skill),
        ("pers_skill", pers_skill),
        ("p_uninit_over_init", p_uninit),
        ("p_pers_over_init", p_pers),
    ] {
        result.insert(unflatten(output, &[LEAD], values.into_dyn(), &rest)?)?;
    }
    for (output, samples, (low, high)) in [
        ("init_ci", &init_samples, config.sig_bounds()),
        ("uninit_ci", &uninit_samples, config.sig_bounds()),
        ("pers_ci", &pers_samples, config.pers_bounds()),
    ] {
        let values = confidence_interval(samples.view(), low, high);
        result.insert(unflatten(output, &[BOUND, LEAD], values.into_dyn(), &rest)?)?;
    }
    result.set_coord(LEAD, leads)?;

    Ok(result)
}

/// Quantiles over the iteration axis of samples shaped (iteration, lead, point). Returns
/// (bound, lead, point).
fn confidence_interval(samples: ArrayView3<f64>, low: f64, high: f64) -> Array3<f64> {
    let (_, nlead, npoints) = samples.dim();
    let mut bounds = Array3::from_elem((2, nlead, npoints), f64::NAN);
    for l in 0..nlead {
        for p in 0..npoints {
            let mut finite: Vec<f64> = samples
                .slice(s![.., l, p])
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            if finite.is_empty() {
                continue;
            }
            finite.sort_by(|a, b| a.total_cmp(b));
            bounds[[0, l, p]] = quantile(&finite, low);
            bounds[[1, l, p]] = quantile(&finite, high);
        }
    }

    bounds
}

/// Fraction of iterations where `baseline` is at least as skillful as `initialized`.
fn p_value(baseline: ArrayView3<f64>, initialized: ArrayView3<f64>, metric: Metric) -> Array2<f64> {
    let (iterations, nlead, npoints) = initialized.dim();
    Array2::from_shape_fn((nlead, npoints), |(l, p)| {
        let count = (0..iterations)
            .filter(|&b| metric.at_least_as_good(baseline[[b, l, p]], initialized[[b, l, p]]))
            .count();
        count as f64 / iterations as f64
    })
}

/// Linear interpolation between order statistics (R's default, type 7). `sorted` must be sorted
/// and non-empty.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    let h = (n - 1) as f64 * q;
    let lo = h.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    sorted[lo] + (h - h.floor()) * (sorted[hi] - sorted[lo])
}
