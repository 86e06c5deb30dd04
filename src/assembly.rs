//! Assembly of global stiffness matrices and force vectors.
//!
//! The [`Assembler`] loops over the elements and boundary elements of a [`Grid`](crate::grid::Grid),
//! caches geometric quantities for the current element in an [`ElementKernel`] and queries an
//! [`Equation`] for the integrands of the weak form at every quadrature point.
mod coefficients;
mod equation;
mod global;
mod kernel;

pub use coefficients::*;
pub use equation::*;
pub use global::*;
pub use kernel::*;
