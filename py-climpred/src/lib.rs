mod dataset;
mod ensemble;
mod helpers;

pub use dataset::PyDataset;
pub use ensemble::{PyHindcastEnsemble, PyPerfectModelEnsemble};
pub use helpers::{DatasetError, DimensionError, VariableError};

use pyo3::prelude::*;

#[pymodule]
fn _climpred(py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyDataset>()?;
    m.add_class::<PyHindcastEnsemble>()?;
    m.add_class::<PyPerfectModelEnsemble>()?;

    m.add("DimensionError", py.get_type::<DimensionError>())?;
    m.add("VariableError", py.get_type::<VariableError>())?;
    m.add("DatasetError", py.get_type::<DatasetError>())?;

    Ok(())
}
