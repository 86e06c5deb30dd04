//! Library-wide error type.
use crate::quadrature::QuadratureError;
use std::error::Error as StdError;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Errors raised by grid construction and assembly.
///
/// Precondition failures are always checked and reported through this type. Violations of
/// caller contracts that are too expensive to verify on every call (kernel accessors, lazy
/// element updates, reference element indices) are instead governed by
/// [`ContractChecks`](crate::assembly::ContractChecks).
#[derive(Debug)]
#[non_exhaustive]
pub enum Error {
    /// Input dimensions or equation state do not satisfy the requirements of the operation.
    PreconditionViolated(String),
    /// An argument does not refer to valid data, e.g. a non-boundary node.
    InvalidArgument(String),
    /// Assembly touched a matrix entry that is not part of the sparsity pattern.
    MissingMatrixEntry { row: usize, col: usize },
    /// No quadrature rule of the strength required by the shape function is available.
    Quadrature(QuadratureError),
    /// The external triangulation routine failed.
    Triangulation(Box<dyn StdError + Send + Sync>),
}

impl From<QuadratureError> for Error {
    fn from(err: QuadratureError) -> Self {
        Self::Quadrature(err)
    }
}

impl Error {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::PreconditionViolated(message.into())
    }

    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::PreconditionViolated(msg) => write!(f, "Precondition violated: {}", msg),
            Self::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            Self::MissingMatrixEntry { row, col } => {
                write!(
                    f,
                    "Entry ({}, {}) is not part of the sparsity pattern of the stiffness matrix",
                    row, col
                )
            }
            Self::Quadrature(err) => write!(f, "Quadrature unavailable: {}", err),
            Self::Triangulation(err) => write!(f, "Triangulation failed: {}", err),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Quadrature(err) => Some(err),
            Self::Triangulation(err) => Some(&**err),
            _ => None,
        }
    }
}
