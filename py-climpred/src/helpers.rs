use std::collections::HashMap;

use pyo3::create_exception;
use pyo3::exceptions::{PyException, PyKeyError, PyNotImplementedError, PyValueError};
use pyo3::prelude::*;

use climpred::{self, Comparison, ErrorKind, Metric};

use super::dataset::PyDataset;

create_exception!(_climpred, DimensionError, PyException);
create_exception!(_climpred, VariableError, PyException);
create_exception!(_climpred, DatasetError, PyException);

pub(crate) fn convert_error(cause: climpred::Error) -> PyErr {
    let message = cause.to_string();
    match cause.kind() {
        ErrorKind::Dimension => DimensionError::new_err(message),
        ErrorKind::Variable => VariableError::new_err(message),
        ErrorKind::Dataset => DatasetError::new_err(message),
        ErrorKind::NotImplemented => PyNotImplementedError::new_err(message),
        ErrorKind::Lookup => PyKeyError::new_err(message),
        ErrorKind::Invalid => PyValueError::new_err(message),
    }
}

pub(crate) fn parse_metric(name: &str) -> PyResult<Metric> {
    name.parse().map_err(convert_error)
}

pub(crate) fn parse_comparison(name: &str) -> PyResult<Comparison> {
    name.parse().map_err(convert_error)
}

pub(crate) fn wrap_results(results: climpred::Results) -> HashMap<String, PyDataset> {
    results
        .into_iter()
        .map(|(name, dataset)| (name, PyDataset::wrap(dataset)))
        .collect()
}
