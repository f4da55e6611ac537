//! Skill of initialized, uninitialized and persistence forecasts.
//!
//! Verification times are found by adding the lead to the initialization time and looking the
//! result up in the `time` coordinate of the reference, so `lead` must be expressed in the same
//! units as `init` and `time`.
//!
use ndarray::{s, Array1, Array2, ArrayView2, ArrayView4, Axis, Ix2, Ix3, Ix4};

use crate::comparisons::Comparison;
use crate::dataset::{DataArray, Dataset, INIT, LEAD, MEMBER, TIME};
use crate::errors::Result;
use crate::layout::{align, coordinate, frame, position, unflatten, Frame};
use crate::metrics::{mean, variance, Metric};

/// Compare a perfect-model ensemble with itself.
///
/// `control` supplies the climatological variance for normalized metrics; variables it lacks get
/// NaN for those. Result variables are shaped (lead, ...).
///
pub fn compute_perfect_model(
    initialized: &Dataset,
    control: &Dataset,
    metric: Metric,
    comparison: Comparison,
) -> Result<Dataset> {
    comparison.require_perfect_model()?;
    let leads = coordinate(initialized, LEAD)?;

    let mut skill = Dataset::new();
    for var in initialized.data_vars() {
        let Frame { data, rest } = frame(var, &[LEAD, MEMBER, INIT], None)?;
        let ensemble = data.into_dimensionality::<Ix4>()?;
        let climatology = match control.get(var.name()) {
            Some(series) => Some(
                frame(series, &[TIME], Some(&rest))?
                    .data
                    .into_dimensionality::<Ix2>()?,
            ),
            None => None,
        };
        let values = perfect_model_skill(
            ensemble.view(),
            climatology.as_ref().map(|c| c.view()),
            metric,
            comparison,
        )?;
        skill.insert(unflatten(var.name(), &[LEAD], values.into_dyn(), &rest)?)?;
    }
    skill.set_coord(LEAD, leads)?;

    Ok(skill)
}

/// Compare an initialized hindcast ensemble with a reference.
///
/// Every variable of `initialized` must also be in `reference`. Result variables are shaped
/// (lead, ...).
///
pub fn compute_hindcast(
    initialized: &Dataset,
    reference: &Dataset,
    metric: Metric,
    comparison: Comparison,
) -> Result<Dataset> {
    comparison.require_hindcast()?;
    let inits = coordinate(initialized, INIT)?;
    let leads = coordinate(initialized, LEAD)?;
    let times = coordinate(reference, TIME)?;

    let mut skill = Dataset::new();
    for var in initialized.data_vars() {
        let Frame { data, rest } = frame(var, &[LEAD, MEMBER, INIT], None)?;
        let ensemble = data.into_dimensionality::<Ix4>()?;
        let observed = frame(reference.var(var.name())?, &[TIME], Some(&rest))?
            .data
            .into_dimensionality::<Ix2>()?;

        let (nlead, _, _, npoints) = ensemble.dim();
        let mut values = Array2::from_elem((nlead, npoints), f64::NAN);
        for (l, &lead) in leads.iter().enumerate() {
            let (init_idx, time_idx) = align(&inits, &times, lead);
            for p in 0..npoints {
                let members = ensemble.slice(s![l, .., .., p]).select(Axis(1), &init_idx);
                let verification: Vec<f64> = time_idx.iter().map(|&t| observed[[t, p]]).collect();
                let climatology = variance(&observed.column(p).to_vec());
                let scores: Vec<f64> = comparison
                    .hindcast_forecasts(members.view())?
                    .iter()
                    .map(|forecast| metric.score(forecast, &verification, climatology))
                    .collect();
                values[[l, p]] = mean(&scores);
            }
        }
        skill.insert(unflatten(var.name(), &[LEAD], values.into_dyn(), &rest)?)?;
    }
    skill.set_coord(LEAD, leads)?;

    Ok(skill)
}

/// Compare an uninitialized ensemble with a reference over their common times.
///
/// `member` is optional on the uninitialized side. Result variables have no lead or time
/// dimension.
///
pub fn compute_uninitialized(
    uninitialized: &Dataset,
    reference: &Dataset,
    metric: Metric,
    comparison: Comparison,
) -> Result<Dataset> {
    comparison.require_hindcast()?;
    let (uninit_idx, time_idx) = align(
        &coordinate(uninitialized, TIME)?,
        &coordinate(reference, TIME)?,
        0.0,
    );

    let mut skill = Dataset::new();
    for var in uninitialized.data_vars() {
        let Frame { data, rest } = frame(var, &[MEMBER, TIME], None)?;
        let ensemble = data.into_dimensionality::<Ix3>()?;
        let observed = frame(reference.var(var.name())?, &[TIME], Some(&rest))?
            .data
            .into_dimensionality::<Ix2>()?;

        let npoints = ensemble.dim().2;
        let mut values = Array1::from_elem(npoints, f64::NAN);
        for p in 0..npoints {
            let members = ensemble.slice(s![.., .., p]).select(Axis(1), &uninit_idx);
            let verification: Vec<f64> = time_idx.iter().map(|&t| observed[[t, p]]).collect();
            let climatology = variance(&observed.column(p).to_vec());
            let scores: Vec<f64> = comparison
                .hindcast_forecasts(members.view())?
                .iter()
                .map(|forecast| metric.score(forecast, &verification, climatology))
                .collect();
            values[p] = mean(&scores);
        }
        skill.insert(unflatten(var.name(), &[], values.into_dyn(), &rest)?)?;
    }

    Ok(skill)
}

/// Skill of persisting the reference value at each initialization time out to every lead.
///
/// Lags are the `lead` coordinate values of `initialized`. Result variables (one per reference
/// variable) are shaped (lead, ...).
///
pub fn compute_persistence(
    initialized: &Dataset,
    reference: &Dataset,
    metric: Metric,
) -> Result<Dataset> {
    let inits = coordinate(initialized, INIT)?;
    let leads = coordinate(initialized, LEAD)?;
    let times = coordinate(reference, TIME)?;

    let mut skill = Dataset::new();
    for var in reference.data_vars() {
        skill.insert(persistence_var(var, &inits, &leads, &times, metric)?)?;
    }
    skill.set_coord(LEAD, leads)?;

    Ok(skill)
}

fn persistence_var(
    var: &DataArray,
    inits: &Array1<f64>,
    leads: &Array1<f64>,
    times: &Array1<f64>,
    metric: Metric,
) -> Result<DataArray> {
    let Frame { data, rest } = frame(var, &[TIME], None)?;
    let observed = data.into_dimensionality::<Ix2>()?;
    let values = persistence_skill(observed.view(), inits, leads, times, metric);

    unflatten(var.name(), &[LEAD], values.into_dyn(), &rest)
}

/// Skill for an ensemble shaped (lead, member, init, point). Returns (lead, point).
pub(crate) fn perfect_model_skill(
    ensemble: ArrayView4<f64>,
    control: Option<ArrayView2<f64>>,
    metric: Metric,
    comparison: Comparison,
) -> Result<Array2<f64>> {
    let (nlead, _, _, npoints) = ensemble.dim();
    let climatology: Vec<f64> = match control {
        Some(control) => (0..npoints)
            .map(|p| variance(&control.column(p).to_vec()))
            .collect(),
        None => vec![f64::NAN; npoints],
    };

    let mut values = Array2::from_elem((nlead, npoints), f64::NAN);
    for l in 0..nlead {
        for p in 0..npoints {
            let members = ensemble.slice(s![l, .., .., p]);
            let (forecast, verification) = comparison.perfect_model_pairs(members)?;
            values[[l, p]] = metric.score(&forecast, &verification, climatology[p]);
        }
    }

    Ok(values)
}

/// Persistence skill for a series shaped (time, point). Returns (lead, point).
///
/// For every init time present in `times`, the value at that time is the forecast and the value
/// `lead` later is the verification.
///
pub(crate) fn persistence_skill(
    observed: ArrayView2<f64>,
    inits: &Array1<f64>,
    leads: &Array1<f64>,
    times: &Array1<f64>,
    metric: Metric,
) -> Array2<f64> {
    let npoints = observed.ncols();
    let anchors: Vec<(usize, f64)> = inits
        .iter()
        .filter_map(|&init| position(times, init).map(|t| (t, init)))
        .collect();

    let mut values = Array2::from_elem((leads.len(), npoints), f64::NAN);
    for (l, &lead) in leads.iter().enumerate() {
        let pairs: Vec<(usize, usize)> = anchors
            .iter()
            .filter_map(|&(start, init)| position(times, init + lead).map(|end| (start, end)))
            .collect();
        for p in 0..npoints {
            let forecast: Vec<f64> = pairs.iter().map(|&(start, _)| observed[[start, p]]).collect();
            let verification: Vec<f64> = pairs.iter().map(|&(_, end)| observed[[end, p]]).collect();
            let climatology = variance(&observed.column(p).to_vec());
            values[[l, p]] = metric.score(&forecast, &verification, climatology);
        }
    }

    values
}
