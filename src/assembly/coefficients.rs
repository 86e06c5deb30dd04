use nalgebra::{DefaultAllocator, OMatrix};
use numeric_literals::replace_float_literals;
use serde::{Deserialize, Serialize};

use crate::allocators::TopologyAllocator;
use crate::assembly::{BoundaryCondition, ElementKernel, EquationTerms, QuadratureNode, ScalarEquation};
use crate::element::{ShapeDim, ShapeFunction};
use crate::Real;

/// A scalar equation with constant coefficients,
///
/// ```text
/// -div(alpha grad u) + c u = f
/// ```
///
/// together with a constant boundary value for Neumann, Dirichlet or Robin boundary conditions.
/// Zero coefficients are treated as absent terms.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConstantCoefficients<T> {
    pub diffusion: T,
    pub reaction: T,
    pub source: T,
    pub boundary_condition: BoundaryCondition,
    pub boundary_value: T,
    pub robin_coefficient: T,
    pub dirichlet_penalty: T,
}

impl<T: Real> Default for ConstantCoefficients<T> {
    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn default() -> Self {
        Self {
            diffusion: 0.0,
            reaction: 0.0,
            source: 0.0,
            boundary_condition: BoundaryCondition::None,
            boundary_value: 0.0,
            robin_coefficient: 0.0,
            dirichlet_penalty: 1e10,
        }
    }
}

impl<T: Real> ConstantCoefficients<T> {
    pub fn with_diffusion(self, diffusion: T) -> Self {
        Self { diffusion, ..self }
    }

    pub fn with_reaction(self, reaction: T) -> Self {
        Self { reaction, ..self }
    }

    pub fn with_source(self, source: T) -> Self {
        Self { source, ..self }
    }

    pub fn with_boundary_condition(self, boundary_condition: BoundaryCondition, boundary_value: T) -> Self {
        Self {
            boundary_condition,
            boundary_value,
            ..self
        }
    }

    pub fn with_robin_coefficient(self, robin_coefficient: T) -> Self {
        Self {
            robin_coefficient,
            ..self
        }
    }

    pub fn with_dirichlet_penalty(self, dirichlet_penalty: T) -> Self {
        Self {
            dirichlet_penalty,
            ..self
        }
    }
}

impl<T, S> ScalarEquation<T, S> for ConstantCoefficients<T>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    fn terms(&self) -> EquationTerms {
        EquationTerms {
            diffusion: self.diffusion != T::zero(),
            reaction: self.reaction != T::zero(),
            source: self.source != T::zero(),
            ..EquationTerms::default()
        }
    }

    fn boundary_condition(&self) -> BoundaryCondition {
        self.boundary_condition
    }

    fn diffusion_tensor(
        &self,
        _node: QuadratureNode,
        _kernel: &ElementKernel<'_, T, S>,
    ) -> OMatrix<T, ShapeDim<S>, ShapeDim<S>> {
        OMatrix::<T, ShapeDim<S>, ShapeDim<S>>::identity() * self.diffusion
    }

    fn reaction(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> T {
        self.reaction
    }

    fn source(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> T {
        self.source
    }

    fn boundary_value(&self, _q: usize, _kernel: &ElementKernel<'_, T, S>) -> T {
        self.boundary_value
    }

    fn robin_coefficient(&self, _q: usize, _kernel: &ElementKernel<'_, T, S>) -> T {
        self.robin_coefficient
    }

    fn dirichlet_penalty(&self) -> T {
        self.dirichlet_penalty
    }
}
