use std::collections::BTreeSet;
use std::result;

/// The broad family an [`Error`] belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Required dimensions are missing or two datasets disagree on their dimensions.
    Dimension,

    /// Two datasets being associated share no variable names.
    Variable,

    /// An operation was attempted before its prerequisite dataset was attached.
    Dataset,

    /// The requested functionality does not exist yet.
    NotImplemented,

    /// A name (variable or reference) could not be found.
    Lookup,

    /// Anything else: bad arguments, malformed arrays, failed computations.
    Invalid,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{message}")]
    Dimension {
        message: String,
        unmatched: BTreeSet<String>,
    },

    #[error(
        "please provide a Dataset/DataArray with at least one matching variable to the \
         initialized prediction ensemble; got {init_vars:?} for init and {ref_vars:?} for ref"
    )]
    Variable {
        init_vars: Vec<String>,
        ref_vars: Vec<String>,
    },

    #[error("{0}")]
    Dataset(String),

    #[error("{0} not yet implemented")]
    NotImplemented(String),

    #[error("no variable named '{0}'")]
    BadName(String),

    #[error("no reference named '{0}'")]
    MissingReference(String),

    #[error("shape error: {0}")]
    Shape(String),

    #[error("unknown metric '{0}'")]
    UnknownMetric(String),

    #[error("unknown comparison '{0}'")]
    UnknownComparison(String),

    #[error("comparison '{comparison}' cannot be used for {context}")]
    Comparison {
        comparison: String,
        context: String,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("computation failed: {0}")]
    Computation(String),
}

impl Error {
    pub(crate) fn dimension<S: Into<String>>(
        message: S,
        unmatched: impl IntoIterator<Item = String>,
    ) -> Self {
        Self::Dimension {
            message: message.into(),
            unmatched: unmatched.into_iter().collect(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Dimension { .. } => ErrorKind::Dimension,
            Self::Variable { .. } => ErrorKind::Variable,
            Self::Dataset(_) => ErrorKind::Dataset,
            Self::NotImplemented(_) => ErrorKind::NotImplemented,
            Self::BadName(_) | Self::MissingReference(_) => ErrorKind::Lookup,
            Self::Shape(_)
            | Self::UnknownMetric(_)
            | Self::UnknownComparison(_)
            | Self::Comparison { .. }
            | Self::Config(_)
            | Self::Computation(_) => ErrorKind::Invalid,
        }
    }
}

impl From<ndarray::ShapeError> for Error {
    fn from(err: ndarray::ShapeError) -> Self {
        Self::Shape(err.to_string())
    }
}

pub type Result<T> = result::Result<T, Error>;
