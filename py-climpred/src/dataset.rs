use std::collections::HashMap;

use numpy::{IntoPyArray, PyArray1, PyArrayDyn};
use pyo3::prelude::*;

use climpred;

use super::helpers::convert_error;

/// A collection of named float64 arrays sharing labeled dimensions.
///
/// Built from `{name: (dims, array)}` plus optional `{dim: coordinate}`.
///
#[pyclass(name = "Dataset")]
#[derive(Clone)]
pub struct PyDataset {
    inner: climpred::Dataset,
}

impl PyDataset {
    pub(crate) fn wrap(inner: climpred::Dataset) -> Self {
        Self { inner }
    }

    pub(crate) fn into_inner(self) -> climpred::Dataset {
        self.inner
    }
}

#[pymethods]
impl PyDataset {
    #[new]
    #[pyo3(signature = (data_vars, coords=None))]
    fn new(
        data_vars: HashMap<String, (Vec<String>, &PyArrayDyn<f64>)>,
        coords: Option<HashMap<String, &PyArray1<f64>>>,
    ) -> PyResult<Self> {
        let mut inner = climpred::Dataset::new();
        for (name, (dims, data)) in data_vars {
            let var = climpred::DataArray::new(name, dims, data.to_owned_array())
                .map_err(convert_error)?;
            inner.insert(var).map_err(convert_error)?;
        }
        for (dim, values) in coords.unwrap_or_default() {
            inner
                .set_coord(dim, values.to_owned_array())
                .map_err(convert_error)?;
        }

        Ok(Self { inner })
    }

    #[getter]
    fn data_vars(&self) -> Vec<String> {
        self.inner.var_names()
    }

    #[getter]
    fn dims(&self) -> HashMap<String, usize> {
        self.inner
            .dims()
            .map(|(dim, size)| (dim.to_string(), size))
            .collect()
    }

    fn var_dims(&self, name: &str) -> PyResult<Vec<String>> {
        Ok(self.inner.var(name).map_err(convert_error)?.dims().to_vec())
    }

    fn coord<'py>(&self, py: Python<'py>, dim: &str) -> Option<&'py PyArray1<f64>> {
        self.inner.coord(dim).map(|values| values.into_pyarray(py))
    }

    fn __getitem__<'py>(&self, py: Python<'py>, name: &str) -> PyResult<&'py PyArrayDyn<f64>> {
        let var = self.inner.var(name).map_err(convert_error)?;

        Ok(var.data().clone().into_pyarray(py))
    }

    fn __contains__(&self, name: &str) -> bool {
        self.inner.contains(name)
    }

    fn __len__(&self) -> usize {
        self.inner.len()
    }

    fn __repr__(&self) -> String {
        self.inner.to_string()
    }
}
