//! Labeled multi-dimensional arrays.
//!
//! A `DataArray` is an `ndarray::ArrayD<f64>` with a name per axis. A `Dataset` is a collection of
//! `DataArray`s that agree on the size of every dimension they share, plus optional 1-D coordinate
//! values for any dimension.
//!
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use ndarray::{Array1, ArrayD};

use crate::errors::{Error, Result};

/// Forecast start time
pub const INIT: &str = "init";

/// Forecast horizon
pub const LEAD: &str = "lead";

/// Ensemble realization
pub const MEMBER: &str = "member";

/// Time axis of references, controls and uninitialized runs
pub const TIME: &str = "time";

#[derive(Clone, Debug, PartialEq)]
pub struct DataArray {
    name: String,
    dims: Vec<String>,
    data: ArrayD<f64>,
}

impl DataArray {
    /// Wrap `data`, naming its axes in order.
    ///
    /// Fails if the number of names doesn't match the rank of `data` or if a name is repeated.
    ///
    pub fn new<S, D>(name: S, dims: D, data: ArrayD<f64>) -> Result<Self>
    where
        S: Into<String>,
        D: IntoIterator,
        D::Item: AsRef<str>,
    {
        let name = name.into();
        let dims: Vec<String> = dims.into_iter().map(|d| d.as_ref().to_string()).collect();
        if dims.len() != data.ndim() {
            return Err(Error::Shape(format!(
                "variable '{name}' has {} dimension names for an array of rank {}",
                dims.len(),
                data.ndim()
            )));
        }

        let unique: BTreeSet<&String> = dims.iter().collect();
        if unique.len() != dims.len() {
            return Err(Error::Shape(format!(
                "variable '{name}' repeats a dimension name: {dims:?}"
            )));
        }

        Ok(Self { name, dims, data })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dims(&self) -> &[String] {
        &self.dims
    }

    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    /// Axis index of the named dimension
    pub fn axis(&self, dim: &str) -> Option<usize> {
        self.dims.iter().position(|d| d == dim)
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.axis(dim).is_some()
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.axis(dim).map(|axis| self.data.shape()[axis])
    }

    /// Promote to a single variable `Dataset`.
    pub fn to_dataset(self) -> Dataset {
        Dataset::from(self)
    }

    fn summary(&self, width: usize) -> String {
        format!(
            "{:width$} ({}) float64",
            self.name,
            self.dims.join(", "),
            width = width
        )
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Dataset {
    dims: Vec<(String, usize)>,
    coords: BTreeMap<String, Array1<f64>>,
    data_vars: BTreeMap<String, DataArray>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a data variable.
    ///
    /// Every dimension of `var` must have the size the other variables and the coordinates give
    /// it. A variable being replaced doesn't count, so it may come back with new sizes.
    ///
    pub fn insert(&mut self, var: DataArray) -> Result<()> {
        for (dim, &size) in var.dims.iter().zip(var.shape()) {
            if let Some(existing) = self.constrained_size(dim, &var.name) {
                if existing != size {
                    return Err(Error::Shape(format!(
                        "variable '{}' has size {size} along '{dim}', dataset has {existing}",
                        var.name
                    )));
                }
            }
        }

        for (dim, &size) in var.dims.iter().zip(var.shape()) {
            match self.dims.iter_mut().find(|(name, _)| name == dim) {
                Some(entry) => entry.1 = size,
                None => self.dims.push((dim.clone(), size)),
            }
        }
        self.data_vars.insert(var.name.clone(), var);

        Ok(())
    }

    /// Size of `dim` as fixed by its coordinate or by any variable other than `skip`.
    fn constrained_size(&self, dim: &str, skip: &str) -> Option<usize> {
        if let Some(values) = self.coords.get(dim) {
            return Some(values.len());
        }

        self.data_vars
            .values()
            .filter(|other| other.name != skip)
            .find_map(|other| other.dim_size(dim))
    }

    pub fn with_var(mut self, var: DataArray) -> Result<Self> {
        self.insert(var)?;
        Ok(self)
    }

    /// Attach coordinate values to a dimension, adding the dimension if it isn't known yet.
    pub fn set_coord<S: Into<String>>(&mut self, dim: S, values: Array1<f64>) -> Result<()> {
        let dim = dim.into();
        match self.dim_size(&dim) {
            Some(size) if size != values.len() => {
                return Err(Error::Shape(format!(
                    "coordinate '{dim}' has {} values, dimension has size {size}",
                    values.len()
                )));
            }
            Some(_) => {}
            None => self.dims.push((dim.clone(), values.len())),
        }
        self.coords.insert(dim, values);

        Ok(())
    }

    pub fn with_coord<S: Into<String>>(mut self, dim: S, values: Array1<f64>) -> Result<Self> {
        self.set_coord(dim, values)?;
        Ok(self)
    }

    /// Dimensions with their sizes, in the order they were first seen.
    pub fn dims(&self) -> impl Iterator<Item = (&str, usize)> {
        self.dims.iter().map(|(name, size)| (name.as_str(), *size))
    }

    pub fn dim_names(&self) -> BTreeSet<String> {
        self.dims.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn has_dim(&self, dim: &str) -> bool {
        self.dim_size(dim).is_some()
    }

    pub fn dim_size(&self, dim: &str) -> Option<usize> {
        self.dims
            .iter()
            .find(|(name, _)| name == dim)
            .map(|(_, size)| *size)
    }

    /// Coordinate values for `dim`.
    ///
    /// Dimensions without explicit coordinates are labeled `0, 1, ..., n - 1`.
    ///
    pub fn coord(&self, dim: &str) -> Option<Array1<f64>> {
        match self.coords.get(dim) {
            Some(values) => Some(values.clone()),
            None => self
                .dim_size(dim)
                .map(|size| Array1::from_iter((0..size).map(|i| i as f64))),
        }
    }

    pub fn var_names(&self) -> Vec<String> {
        self.data_vars.keys().cloned().collect()
    }

    pub fn data_vars(&self) -> impl Iterator<Item = &DataArray> {
        self.data_vars.values()
    }

    pub fn len(&self) -> usize {
        self.data_vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data_vars.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.data_vars.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DataArray> {
        self.data_vars.get(name)
    }

    pub fn var(&self, name: &str) -> Result<&DataArray> {
        self.get(name).ok_or_else(|| Error::BadName(name.to_string()))
    }

    /// One variable as its own dataset, keeping the coordinates of its dimensions.
    pub fn select(&self, name: &str) -> Result<Dataset> {
        let var = self.var(name)?;
        let mut selected = Dataset::from(var.clone());
        for dim in var.dims() {
            if let Some(values) = self.coords.get(dim) {
                selected.coords.insert(dim.clone(), values.clone());
            }
        }

        Ok(selected)
    }

    /// Copy of the dataset with dimension `from` called `to`. Unknown `from` is a no-op.
    pub fn rename_dim(&self, from: &str, to: &str) -> Result<Dataset> {
        if !self.has_dim(from) || from == to {
            return Ok(self.clone());
        }
        if self.has_dim(to) {
            return Err(Error::Shape(format!(
                "cannot rename '{from}' to '{to}': dimension already exists"
            )));
        }

        let rename = |dim: &String| {
            if dim == from {
                to.to_string()
            } else {
                dim.clone()
            }
        };
        let dims = self
            .dims
            .iter()
            .map(|(dim, size)| (rename(dim), *size))
            .collect();
        let coords = self
            .coords
            .iter()
            .map(|(dim, values)| (rename(dim), values.clone()))
            .collect();
        let data_vars = self
            .data_vars
            .iter()
            .map(|(name, var)| {
                let renamed = DataArray {
                    name: var.name.clone(),
                    dims: var.dims.iter().map(rename).collect(),
                    data: var.data.clone(),
                };
                (name.clone(), renamed)
            })
            .collect();

        Ok(Dataset {
            dims,
            coords,
            data_vars,
        })
    }

    /// Copy of the dataset without the named variables. Dimensions and coordinates are kept.
    pub fn drop_vars<S: AsRef<str>>(&self, names: &[S]) -> Result<Dataset> {
        let mut dropped = self.clone();
        for name in names {
            let name = name.as_ref();
            dropped
                .data_vars
                .remove(name)
                .ok_or_else(|| Error::BadName(name.to_string()))?;
        }

        Ok(dropped)
    }

    /// One line per data variable: name, dimensions and dtype.
    pub fn summary_lines(&self) -> Vec<String> {
        let width = self.data_vars.keys().map(|name| name.len()).max().unwrap_or(0);
        self.data_vars
            .values()
            .map(|var| var.summary(width))
            .collect()
    }
}

impl From<DataArray> for Dataset {
    fn from(var: DataArray) -> Self {
        let dims = var
            .dims
            .iter()
            .cloned()
            .zip(var.shape().iter().copied())
            .collect();
        let mut data_vars = BTreeMap::new();
        data_vars.insert(var.name.clone(), var);

        Self {
            dims,
            coords: BTreeMap::new(),
            data_vars,
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims: Vec<String> = self
            .dims()
            .map(|(name, size)| format!("{name}: {size}"))
            .collect();
        writeln!(f, "Dimensions: ({})", dims.join(", "))?;
        write!(f, "Data variables:")?;
        for line in self.summary_lines() {
            write!(f, "\n    {line}")?;
        }

        Ok(())
    }
}
