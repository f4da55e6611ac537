//! Rearranging variables into the fixed axis orders the numerical kernels work on.
//!
//! Kernels only care about a handful of named dimensions (`init`, `lead`, `member`, `time`). All
//! other dimensions (latitude, longitude, depth, ...) are treated point-wise, so they get
//! flattened into a single trailing "points" axis and restored when the result is built.
//!
use std::collections::BTreeSet;

use ndarray::{Array1, ArrayD};

use crate::dataset::{DataArray, Dataset, MEMBER};
use crate::errors::{Error, Result};

/// Tolerance used when matching coordinate values
const TOLERANCE: f64 = 1e-6;

/// A variable with its axes permuted to (leading..., points).
pub(crate) struct Frame {
    pub data: ArrayD<f64>,

    /// The flattened dimensions, in flattening order
    pub rest: Vec<(String, usize)>,
}

/// Permute `var` so that `leading` dimensions come first, followed by one axis holding every other
/// dimension.
///
/// A missing `member` dimension is treated as a single member. Any other missing leading
/// dimension is an error. When `rest` is given, the remaining dimensions must be exactly those,
/// with the same sizes, and are flattened in that order.
///
pub(crate) fn frame(
    var: &DataArray,
    leading: &[&str],
    rest: Option<&[(String, usize)]>,
) -> Result<Frame> {
    let mut order = vec![];
    let mut shape = vec![];
    for dim in leading {
        match var.axis(dim) {
            Some(axis) => {
                order.push(axis);
                shape.push(var.shape()[axis]);
            }
            None if *dim == MEMBER => shape.push(1),
            None => {
                return Err(Error::dimension(
                    format!("variable '{}' lacks dimension '{dim}'", var.name()),
                    [dim.to_string()],
                ));
            }
        }
    }

    let own_rest: Vec<(String, usize)> = var
        .dims()
        .iter()
        .zip(var.shape())
        .filter(|(dim, _)| !leading.contains(&dim.as_str()))
        .map(|(dim, &size)| (dim.clone(), size))
        .collect();

    let rest = match rest {
        None => own_rest,
        Some(expected) => {
            let own: BTreeSet<&str> = own_rest.iter().map(|(dim, _)| dim.as_str()).collect();
            let wanted: BTreeSet<&str> = expected.iter().map(|(dim, _)| dim.as_str()).collect();
            if own != wanted {
                let unmatched = own
                    .symmetric_difference(&wanted)
                    .map(|dim| dim.to_string())
                    .collect::<Vec<_>>();
                return Err(Error::dimension(
                    format!(
                        "variable '{}' does not share dimensions {unmatched:?}",
                        var.name()
                    ),
                    unmatched,
                ));
            }
            for (dim, size) in expected {
                let own_size = var.dim_size(dim);
                if own_size != Some(*size) {
                    return Err(Error::Shape(format!(
                        "variable '{}' has size {own_size:?} along '{dim}', expected {size}",
                        var.name()
                    )));
                }
            }
            expected.to_vec()
        }
    };

    for (dim, _) in &rest {
        let axis = var
            .axis(dim)
            .ok_or_else(|| Error::BadName(format!("{}.{dim}", var.name())))?;
        order.push(axis);
    }
    shape.push(rest.iter().map(|(_, size)| size).product());

    let data = var
        .data()
        .view()
        .permuted_axes(order)
        .as_standard_layout()
        .into_owned()
        .into_shape(shape)?;

    Ok(Frame { data, rest })
}

/// Inverse of `frame`: `data` is shaped (leading..., points), the result is shaped
/// (leading..., rest...).
pub(crate) fn unflatten(
    name: &str,
    leading: &[&str],
    data: ArrayD<f64>,
    rest: &[(String, usize)],
) -> Result<DataArray> {
    let mut dims: Vec<String> = leading.iter().map(|dim| dim.to_string()).collect();
    let mut shape: Vec<usize> = data.shape()[..leading.len()].to_vec();
    for (dim, size) in rest {
        dims.push(dim.clone());
        shape.push(*size);
    }

    let data = data.as_standard_layout().into_owned().into_shape(shape)?;
    DataArray::new(name, dims, data)
}

/// Coordinate values of a dimension the dataset must have.
pub(crate) fn coordinate(dataset: &Dataset, dim: &str) -> Result<Array1<f64>> {
    dataset.coord(dim).ok_or_else(|| {
        Error::dimension(
            format!("dataset lacks dimension '{dim}'"),
            [dim.to_string()],
        )
    })
}

/// Index of `value` in `coord`.
pub(crate) fn position(coord: &Array1<f64>, value: f64) -> Option<usize> {
    coord.iter().position(|&c| (c - value).abs() < TOLERANCE)
}

/// Pairs of indices `(i, j)` where `source[i] + offset == target[j]`.
pub(crate) fn align(
    source: &Array1<f64>,
    target: &Array1<f64>,
    offset: f64,
) -> (Vec<usize>, Vec<usize>) {
    source
        .iter()
        .enumerate()
        .filter_map(|(i, &value)| position(target, value + offset).map(|j| (i, j)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{INIT, LEAD, TIME};
    use ndarray::{array, Array, Ix3};

    fn var() -> DataArray {
        // (init, lat, lead)
        let data = Array::from_shape_fn((2, 3, 4), |(i, j, k)| (i * 100 + j * 10 + k) as f64);
        DataArray::new("SST", [INIT, "lat", LEAD], data.into_dyn()).unwrap()
    }

    #[test]
    fn test_frame_permutes_and_inserts_member() {
        let Frame { data, rest } = frame(&var(), &[LEAD, MEMBER, INIT], None).unwrap();
        assert_eq!(data.shape(), &[4, 1, 2, 3]);
        assert_eq!(rest, vec![("lat".to_string(), 3)]);
        // lead 3, member 0, init 1, lat 2
        assert_eq!(data[[3, 0, 1, 2]], 123.0);
    }

    #[test]
    fn test_frame_missing_dimension() {
        let err = frame(&var(), &[TIME], None).err().unwrap();
        assert!(matches!(err, Error::Dimension { .. }));
    }

    #[test]
    fn test_frame_rest_must_match() {
        let expected = vec![("lon".to_string(), 3)];
        let err = frame(&var(), &[INIT, LEAD], Some(&expected)).err().unwrap();
        assert!(matches!(err, Error::Dimension { .. }));

        let expected = vec![("lat".to_string(), 5)];
        let err = frame(&var(), &[INIT, LEAD], Some(&expected)).err().unwrap();
        assert!(matches!(err, Error::Shape(_)));
    }

    #[test]
    fn test_frame_no_rest_has_one_point() {
        let data = DataArray::new("SST", [TIME], array![1.0, 2.0].into_dyn()).unwrap();
        let Frame { data, rest } = frame(&data, &[TIME], None).unwrap();
        assert_eq!(data.shape(), &[2, 1]);
        assert!(rest.is_empty());
    }

    #[test]
    fn test_unflatten_round_trip() {
        let Frame { data, rest } = frame(&var(), &[LEAD, INIT], None).unwrap();
        let restored = unflatten("SST", &[LEAD, INIT], data, &rest).unwrap();
        assert_eq!(restored.dims(), &[LEAD, INIT, "lat"]);
        let restored = restored.into_data().into_dimensionality::<Ix3>().unwrap();
        assert_eq!(restored[[3, 1, 2]], 123.0);
    }

    #[test]
    fn test_align() {
        let inits = array![1990.0, 1991.0, 1992.0];
        let times = array![1991.0, 1992.0, 1993.0 + 1e-9];
        let (i, j) = align(&inits, &times, 1.0);
        assert_eq!(i, vec![0, 1, 2]);
        assert_eq!(j, vec![0, 1, 2]);

        let (i, j) = align(&inits, &times, 5.0);
        assert!(i.is_empty() && j.is_empty());
    }
}
