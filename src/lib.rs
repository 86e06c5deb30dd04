//! Finite element assembly on structured and triangulated grids.
//!
//! A [`Grid`](grid::Grid) describes the geometry and topology of a mesh whose elements all share
//! one reference topology (interval, square, triangle, cube or tetrahedron). Combined with a
//! [`ShapeFunction`](element::ShapeFunction) and a user-supplied
//! [`Equation`](assembly::Equation), the [`Assembler`](assembly::Assembler) builds the global
//! stiffness matrix and force vector of the discretized weak form.
use nalgebra::{DimMin, DimName};

pub mod allocators;
pub mod assembly;
pub mod element;
pub mod error;
pub mod grid;
pub mod quadrature;
pub mod transform;

pub use error::Error;
pub use fenris_traits::Real;

pub extern crate nalgebra;
pub extern crate nalgebra_sparse;

/// A small, fixed-size dimension.
///
/// Used as a trait alias for various traits frequently needed by generic `fegrid` routines.
pub trait SmallDim: DimName + DimMin<Self, Output = Self> {}

impl<D> SmallDim for D where D: DimName + DimMin<Self, Output = Self> {}
