//! Structural checks run before datasets are attached to an ensemble.

use std::collections::BTreeSet;

use crate::dataset::{Dataset, INIT, LEAD, MEMBER, TIME};
use crate::errors::{Error, Result};

/// At the minimum, a prediction ensemble is a time series with lead times.
pub(crate) fn check_prediction_ensemble_dimensions(dataset: &Dataset) -> Result<()> {
    let missing: Vec<String> = [INIT, LEAD]
        .iter()
        .filter(|dim| !dataset.has_dim(dim))
        .map(|dim| dim.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(Error::dimension(
            "Your prediction object must contain the dimensions `lead` and `init` at the minimum.",
            missing,
        ));
    }

    Ok(())
}

/// The reference must have every initialized dimension except `lead` and `member`, with `init`
/// called `time`, and nothing else.
pub(crate) fn check_reference_dimensions(initialized: &Dataset, reference: &Dataset) -> Result<()> {
    // References have no initialization dimension
    let mut init_dims = initialized.rename_dim(INIT, TIME)?.dim_names();
    init_dims.remove(LEAD);
    init_dims.remove(MEMBER);

    let ref_dims = reference.dim_names();
    if ref_dims != init_dims {
        let unmatched: BTreeSet<String> = ref_dims.symmetric_difference(&init_dims).cloned().collect();
        return Err(Error::dimension(
            format!(
                "Dimensions must match initialized prediction ensemble dimensions; \
                 these dimensions do not match: {unmatched:?}."
            ),
            unmatched,
        ));
    }

    Ok(())
}

/// A new reference (or control) needs at least one variable in common with the initialized
/// ensemble so the two can be compared pairwise.
pub(crate) fn check_reference_vars_match_initialized(
    initialized: &Dataset,
    reference: &Dataset,
) -> Result<()> {
    let init_vars = initialized.var_names();
    let ref_vars = reference.var_names();
    if !init_vars.iter().any(|var| reference.contains(var)) {
        return Err(Error::Variable {
            init_vars,
            ref_vars,
        });
    }

    Ok(())
}
