use nalgebra::{DefaultAllocator, OMatrix, OVector};
use serde::{Deserialize, Serialize};

use crate::allocators::TopologyAllocator;
use crate::assembly::ElementKernel;
use crate::element::{ShapeDim, ShapeFunction};
use crate::Real;

/// The weak form of a (system of) partial differential equation(s).
///
/// For each quadrature point of the current kernel element, an equation supplies the integrand
/// of the bilinear form for every pair of local nodes `(i, j)` and components `(l, m)`, and the
/// integrand of the linear form for every local node `i` and component `l`. The assembler takes
/// care of quadrature weights and transform determinants.
///
/// Component `l` of node `i` maps to the global row `system_size * node + l`.
pub trait Equation<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    /// Number of unknowns per node.
    fn system_size(&self) -> usize;

    fn stiffness_matrix(
        &self,
        l: usize,
        m: usize,
        i: usize,
        j: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T;

    fn force_vector(&self, l: usize, i: usize, q: usize, kernel: &ElementKernel<'_, T, S>) -> T;

    /// Integrand of the boundary contribution to the bilinear form, evaluated at a boundary
    /// quadrature point of the current kernel boundary element.
    fn stiffness_matrix_at_boundary(
        &self,
        _l: usize,
        _m: usize,
        _i: usize,
        _j: usize,
        _q: usize,
        _kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        T::zero()
    }

    fn force_vector_at_boundary(&self, _l: usize, _i: usize, _q: usize, _kernel: &ElementKernel<'_, T, S>) -> T {
        T::zero()
    }

    /// Verifies that the equation is able to produce a stiffness matrix for the kernel's grid.
    fn sanity_check_stiffness_matrix(&self, _kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        Ok(())
    }

    /// Verifies that the equation is able to produce a force vector for the kernel's grid.
    fn sanity_check_force_vector(&self, _kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        Ok(())
    }

    /// Whether the bilinear form has boundary terms. If not, the boundary pass is skipped.
    fn has_stiffness_matrix_at_boundary(&self) -> bool {
        true
    }

    /// Whether the linear form has boundary terms. If not, the boundary pass is skipped.
    fn has_force_vector_at_boundary(&self) -> bool {
        true
    }
}

impl<T, S, E> Equation<T, S> for &E
where
    T: Real,
    S: ShapeFunction,
    E: ?Sized + Equation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    fn system_size(&self) -> usize {
        E::system_size(self)
    }

    fn stiffness_matrix(
        &self,
        l: usize,
        m: usize,
        i: usize,
        j: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        E::stiffness_matrix(self, l, m, i, j, q, kernel)
    }

    fn force_vector(&self, l: usize, i: usize, q: usize, kernel: &ElementKernel<'_, T, S>) -> T {
        E::force_vector(self, l, i, q, kernel)
    }

    fn stiffness_matrix_at_boundary(
        &self,
        l: usize,
        m: usize,
        i: usize,
        j: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        E::stiffness_matrix_at_boundary(self, l, m, i, j, q, kernel)
    }

    fn force_vector_at_boundary(&self, l: usize, i: usize, q: usize, kernel: &ElementKernel<'_, T, S>) -> T {
        E::force_vector_at_boundary(self, l, i, q, kernel)
    }

    fn sanity_check_stiffness_matrix(&self, kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        E::sanity_check_stiffness_matrix(self, kernel)
    }

    fn sanity_check_force_vector(&self, kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        E::sanity_check_force_vector(self, kernel)
    }

    fn has_stiffness_matrix_at_boundary(&self) -> bool {
        E::has_stiffness_matrix_at_boundary(self)
    }

    fn has_force_vector_at_boundary(&self) -> bool {
        E::has_force_vector_at_boundary(self)
    }
}

/// Boundary conditions supported by [`ScalarEquation`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum BoundaryCondition {
    /// No boundary terms, i.e. a homogeneous natural boundary condition.
    #[default]
    None,
    /// Keeps the boundary flux term `-(A grad u . n) v` of the partial integration in the
    /// bilinear form.
    ImplicitNeumann,
    /// Prescribed flux `h`, contributing `h v` to the linear form.
    Neumann,
    /// Prescribed value `h`, enforced with a penalty `p`: `p u v` in the bilinear form and
    /// `p h v` in the linear form.
    ///
    /// The boundary values are only reproduced up to an error of order `flux / p`. With the
    /// default penalty of `1e10` and fluxes of order one, boundary nodes are off by about `1e-10`,
    /// which also perturbs interior nodes.
    Dirichlet,
    /// `alpha u v` in the bilinear form and `h v` in the linear form.
    Robin,
}

/// Flags marking the non-zero terms of a [`ScalarEquation`].
///
/// Terms that are not flagged are never evaluated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EquationTerms {
    /// Diffusion tensor `A`.
    pub diffusion: bool,
    /// Convection vector `a`.
    pub convection: bool,
    /// Transport vector `b`.
    pub transport: bool,
    /// Reaction coefficient `c`.
    pub reaction: bool,
    /// Source `f`.
    pub source: bool,
    /// Source flux `g`.
    pub source_flux: bool,
}

/// Identifies a quadrature point of the current kernel element or boundary element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuadratureNode {
    Interior(usize),
    Boundary(usize),
}

/// A single scalar equation with weak form
///
/// ```text
/// ∫ (A ∇u · ∇v + (a · ∇u) v + u (b · ∇v) + c u v) = ∫ (f v + g · ∇v)
/// ```
///
/// plus boundary terms according to [`BoundaryCondition`]. Coefficients default to zero, so that
/// implementors only need to provide the terms they flag. Use [`ScalarSystem`] to assemble it.
pub trait ScalarEquation<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    fn terms(&self) -> EquationTerms;

    fn boundary_condition(&self) -> BoundaryCondition {
        BoundaryCondition::None
    }

    fn diffusion_tensor(
        &self,
        _node: QuadratureNode,
        _kernel: &ElementKernel<'_, T, S>,
    ) -> OMatrix<T, ShapeDim<S>, ShapeDim<S>> {
        OMatrix::<T, ShapeDim<S>, ShapeDim<S>>::zeros()
    }

    fn convection(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> OVector<T, ShapeDim<S>> {
        OVector::<T, ShapeDim<S>>::zeros()
    }

    fn transport(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> OVector<T, ShapeDim<S>> {
        OVector::<T, ShapeDim<S>>::zeros()
    }

    fn reaction(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> T {
        T::zero()
    }

    fn source(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> T {
        T::zero()
    }

    fn source_flux(&self, _node: QuadratureNode, _kernel: &ElementKernel<'_, T, S>) -> OVector<T, ShapeDim<S>> {
        OVector::<T, ShapeDim<S>>::zeros()
    }

    /// Boundary data `h` at a boundary quadrature point.
    fn boundary_value(&self, _q: usize, _kernel: &ElementKernel<'_, T, S>) -> T {
        T::zero()
    }

    /// Robin coefficient `alpha` at a boundary quadrature point.
    fn robin_coefficient(&self, _q: usize, _kernel: &ElementKernel<'_, T, S>) -> T {
        T::zero()
    }

    /// Penalty used to weakly enforce Dirichlet boundary conditions.
    fn dirichlet_penalty(&self) -> T {
        T::from_f64(1e10).expect("Literal must fit in T")
    }

    /// Verifies that the coefficients are available for the kernel's grid, e.g. that nodal data
    /// has the right length.
    fn sanity_check(&self, _kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        Ok(())
    }
}

/// Adapts a [`ScalarEquation`] to an [`Equation`] with a single unknown per node.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScalarSystem<E>(pub E);

impl<T, S, E> Equation<T, S> for ScalarSystem<E>
where
    T: Real,
    S: ShapeFunction,
    E: ScalarEquation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    fn system_size(&self) -> usize {
        1
    }

    fn stiffness_matrix(
        &self,
        _l: usize,
        _m: usize,
        i: usize,
        j: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        let terms = self.0.terms();
        let node = QuadratureNode::Interior(q);
        let (phi_i, phi_j) = (kernel.shape_value(q, i), kernel.shape_value(q, j));
        let (grad_i, grad_j) = (kernel.shape_gradient(q, i), kernel.shape_gradient(q, j));

        let mut value = T::zero();
        if terms.diffusion {
            value += (self.0.diffusion_tensor(node, kernel) * grad_j).dot(grad_i);
        }
        if terms.convection {
            value += self.0.convection(node, kernel).dot(grad_j) * phi_i;
        }
        if terms.transport {
            value += phi_j * self.0.transport(node, kernel).dot(grad_i);
        }
        if terms.reaction {
            value += self.0.reaction(node, kernel) * phi_j * phi_i;
        }
        value
    }

    fn force_vector(&self, _l: usize, i: usize, q: usize, kernel: &ElementKernel<'_, T, S>) -> T {
        let terms = self.0.terms();
        let node = QuadratureNode::Interior(q);

        let mut value = T::zero();
        if terms.source {
            value += self.0.source(node, kernel) * kernel.shape_value(q, i);
        }
        if terms.source_flux {
            value += self.0.source_flux(node, kernel).dot(kernel.shape_gradient(q, i));
        }
        value
    }

    fn stiffness_matrix_at_boundary(
        &self,
        _l: usize,
        _m: usize,
        i: usize,
        j: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        let (phi_i, phi_j) = (kernel.boundary_shape_value(q, i), kernel.boundary_shape_value(q, j));
        match self.0.boundary_condition() {
            BoundaryCondition::ImplicitNeumann if self.0.terms().diffusion => {
                let a = self.0.diffusion_tensor(QuadratureNode::Boundary(q), kernel);
                let flux = (a * kernel.boundary_shape_gradient(q, j)).dot(kernel.boundary_normal());
                -flux * phi_i
            }
            BoundaryCondition::Dirichlet => self.0.dirichlet_penalty() * phi_j * phi_i,
            BoundaryCondition::Robin => self.0.robin_coefficient(q, kernel) * phi_j * phi_i,
            _ => T::zero(),
        }
    }

    fn force_vector_at_boundary(&self, _l: usize, i: usize, q: usize, kernel: &ElementKernel<'_, T, S>) -> T {
        let phi_i = kernel.boundary_shape_value(q, i);
        match self.0.boundary_condition() {
            BoundaryCondition::Neumann | BoundaryCondition::Robin => self.0.boundary_value(q, kernel) * phi_i,
            BoundaryCondition::Dirichlet => self.0.dirichlet_penalty() * self.0.boundary_value(q, kernel) * phi_i,
            _ => T::zero(),
        }
    }

    fn sanity_check_stiffness_matrix(&self, kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        let terms = self.0.terms();
        eyre::ensure!(
            self.0.boundary_condition() != BoundaryCondition::ImplicitNeumann || terms.diffusion,
            "implicit Neumann boundary conditions require a diffusion term"
        );
        self.0.sanity_check(kernel)
    }

    fn sanity_check_force_vector(&self, kernel: &ElementKernel<'_, T, S>) -> eyre::Result<()> {
        self.0.sanity_check(kernel)
    }

    fn has_stiffness_matrix_at_boundary(&self) -> bool {
        match self.0.boundary_condition() {
            BoundaryCondition::ImplicitNeumann => self.0.terms().diffusion,
            BoundaryCondition::Dirichlet | BoundaryCondition::Robin => true,
            BoundaryCondition::None | BoundaryCondition::Neumann => false,
        }
    }

    fn has_force_vector_at_boundary(&self) -> bool {
        match self.0.boundary_condition() {
            BoundaryCondition::Neumann | BoundaryCondition::Dirichlet | BoundaryCondition::Robin => true,
            BoundaryCondition::None | BoundaryCondition::ImplicitNeumann => false,
        }
    }
}
