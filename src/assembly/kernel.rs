use nalgebra::{DefaultAllocator, OMatrix, OPoint, OVector};
use serde::{Deserialize, Serialize};

use crate::allocators::{DimAllocator, TopologyAllocator};
use crate::element::{ShapeDim, ShapeFaceDim, ShapeFunction, Topology};
use crate::grid::Grid;
use crate::quadrature::{Quadrature, QuadraturePair};
use crate::transform::ElementTransform;
use crate::{Error, Real, SmallDim};

/// Controls verification of caller contracts that are too expensive to check unconditionally.
///
/// This covers kernel accessors called before any element has been set, and lazy element
/// updates on grids whose elements are not translates of each other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractChecks {
    /// Check contracts in debug builds only.
    #[default]
    DebugOnly,
    Always,
    Never,
}

impl ContractChecks {
    pub fn enabled(&self) -> bool {
        match self {
            Self::DebugOnly => cfg!(debug_assertions),
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Cached per-element quantities at the quadrature points of one element and one boundary
/// element of a grid.
///
/// Shape function values and physical gradients, transform determinants, quadrature weights and
/// physical quadrature points are stored in flat buffers indexed by `q * n_nodes + i` for
/// quadrature point `q` and local node `i`. All accessors are plain buffer reads.
///
/// Before the first call to [`set_element`](Self::set_element) or
/// [`set_boundary_element`](Self::set_boundary_element), accessors return meaningless values,
/// typically zeros. With contract checks enabled, they panic instead.
#[derive(Debug)]
pub struct ElementKernel<'a, T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    grid: &'a Grid<T, S>,
    checks: ContractChecks,
    transform: ElementTransform<T, S::Topology>,

    quadrature: QuadraturePair<T, ShapeDim<S>>,
    reference_values: Vec<T>,
    reference_gradients: Vec<OVector<T, ShapeDim<S>>>,
    shape_gradients: Vec<OVector<T, ShapeDim<S>>>,
    transform_determinants: Vec<T>,
    positions: Vec<OPoint<T, ShapeDim<S>>>,
    current_element: Option<usize>,

    face_quadrature: QuadraturePair<T, ShapeFaceDim<S>>,
    boundary_shape_values: Vec<T>,
    boundary_shape_gradients: Vec<OVector<T, ShapeDim<S>>>,
    boundary_transform_determinants: Vec<T>,
    boundary_positions: Vec<OPoint<T, ShapeDim<S>>>,
    boundary_normal: OVector<T, ShapeDim<S>>,
    boundary_parent: usize,
    current_boundary_element: Option<usize>,
}

/// Inverse and absolute determinant of a Jacobian, or `None` if it is singular.
fn invert_jacobian<T, D>(jacobian: OMatrix<T, D, D>) -> Option<(OMatrix<T, D, D>, T)>
where
    T: Real,
    D: SmallDim,
    DefaultAllocator: DimAllocator<T, D>,
{
    let determinant = jacobian.determinant();
    if determinant == T::zero() {
        return None;
    }
    let inverse = jacobian.try_inverse()?;
    Some((inverse, determinant.abs()))
}

impl<'a, T, S> ElementKernel<'a, T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    /// Creates a kernel for the given grid using the quadrature strength of `S`.
    pub fn new(grid: &'a Grid<T, S>) -> Result<Self, Error> {
        let quadrature = S::Topology::quadrature::<T>(S::QUADRATURE_STRENGTH)?;
        let face_quadrature = S::Topology::face_quadrature::<T>(S::QUADRATURE_STRENGTH)?;
        let n = S::NUM_NODES;
        let n_q = quadrature.weights().len();
        let n_bq = face_quadrature.weights().len();

        let mut reference_values = Vec::with_capacity(n_q * n);
        let mut reference_gradients = Vec::with_capacity(n_q * n);
        for xi in quadrature.points() {
            for i in 0..n {
                reference_values.push(S::value(i, xi));
                reference_gradients.push(S::gradient(i, xi));
            }
        }

        Ok(Self {
            grid,
            checks: ContractChecks::default(),
            transform: ElementTransform::new(),
            reference_values,
            shape_gradients: vec![OVector::<T, ShapeDim<S>>::zeros(); n_q * n],
            reference_gradients,
            transform_determinants: vec![T::zero(); n_q],
            positions: vec![OPoint::origin(); n_q],
            quadrature,
            current_element: None,
            boundary_shape_values: vec![T::zero(); n_bq * n],
            boundary_shape_gradients: vec![OVector::<T, ShapeDim<S>>::zeros(); n_bq * n],
            boundary_transform_determinants: vec![T::zero(); n_bq],
            boundary_positions: vec![OPoint::origin(); n_bq],
            boundary_normal: OVector::<T, ShapeDim<S>>::zeros(),
            boundary_parent: 0,
            face_quadrature,
            current_boundary_element: None,
        })
    }

    pub fn with_checks(mut self, checks: ContractChecks) -> Self {
        self.checks = checks;
        self
    }

    pub fn checks(&self) -> ContractChecks {
        self.checks
    }

    pub fn grid(&self) -> &'a Grid<T, S> {
        self.grid
    }

    pub fn current_element(&self) -> Option<usize> {
        self.current_element
    }

    pub fn current_boundary_element(&self) -> Option<usize> {
        self.current_boundary_element
    }

    pub fn n_nodes(&self) -> usize {
        S::NUM_NODES
    }

    pub fn n_quadrature_points(&self) -> usize {
        self.quadrature.weights().len()
    }

    pub fn n_boundary_quadrature_points(&self) -> usize {
        self.face_quadrature.weights().len()
    }

    /// Recomputes all interior quantities for the given element.
    ///
    /// Fails if the element index is out of bounds or the element is degenerate.
    pub fn set_element(&mut self, element: usize) -> Result<(), Error> {
        if element >= self.grid.n_elements() {
            return Err(Error::invalid_argument(format!(
                "element {} out of bounds for grid with {} elements",
                element,
                self.grid.n_elements()
            )));
        }
        // The caches are overwritten in place, so a failure leaves no valid element behind
        self.current_element = None;
        self.grid.element_transform(element, &mut self.transform);

        let n = S::NUM_NODES;
        for (q, xi) in self.quadrature.points().iter().enumerate() {
            let jacobian = self.transform.derivative(xi);
            let (inverse, determinant) = invert_jacobian(jacobian)
                .ok_or_else(|| Error::invalid_argument(format!("element {} is degenerate", element)))?;
            self.transform_determinants[q] = determinant;
            self.positions[q] = self.transform.value(xi);
            for i in 0..n {
                self.shape_gradients[q * n + i] = inverse.tr_mul(&self.reference_gradients[q * n + i]);
            }
        }
        self.current_element = Some(element);
        Ok(())
    }

    /// Moves the element cursor without recomputing cached quantities.
    ///
    /// Only the physical quadrature points are shifted to the new element. The caller
    /// guarantees that the grid is regular, so that the new element is a translate of the
    /// cached one. This is not verified unless contract checks are enabled, and violating it
    /// silently produces wrong values.
    ///
    /// Fails if no element has been set yet.
    pub fn lazy_set_element(&mut self, element: usize) -> Result<(), Error> {
        let previous = self
            .current_element
            .ok_or_else(|| Error::precondition("lazy element update requires a previously set element"))?;
        if self.checks.enabled() {
            assert!(self.grid.is_regular(), "Lazy element update on a grid that is not regular");
            let tolerance = T::default_epsilon().sqrt() * (T::one() + self.element_extent(previous));
            assert!(
                self.grid.is_translate(previous, element, tolerance),
                "Element {} is not a translate of element {}",
                element,
                previous
            );
        }

        let offset = self.grid.vertex(self.grid.global_vertex_index(element, 0))
            - self.grid.vertex(self.grid.global_vertex_index(previous, 0));
        for x in &mut self.positions {
            *x += &offset;
        }
        self.current_element = Some(element);
        Ok(())
    }

    fn element_extent(&self, element: usize) -> T {
        let vertices = self.grid.element_vertices(element);
        let origin = self.grid.vertex(vertices[0]);
        vertices
            .iter()
            .map(|&v| (self.grid.vertex(v) - origin).norm())
            .fold(T::zero(), |a, b| a.max(b))
    }

    /// Recomputes all boundary quantities for the given boundary element.
    ///
    /// Shape functions are evaluated on the parent element at the boundary quadrature points
    /// embedded into the parent reference element.
    pub fn set_boundary_element(&mut self, index: usize) -> Result<(), Error> {
        if index >= self.grid.n_boundary_elements() {
            return Err(Error::invalid_argument(format!(
                "boundary element {} out of bounds for grid with {} boundary elements",
                index,
                self.grid.n_boundary_elements()
            )));
        }
        let grid = self.grid;
        let boundary_element = grid
            .boundary_element(index)
            .ok_or_else(|| Error::invalid_argument(format!("boundary element {} is not assigned", index)))?;
        let (parent, face) = (boundary_element.parent_element(), boundary_element.parent_face());
        self.current_boundary_element = None;
        grid.element_transform(parent, &mut self.transform);

        let n = S::NUM_NODES;
        for (q, s) in self.face_quadrature.points().iter().enumerate() {
            let xi = self.transform.boundary2element(face, s);
            let jacobian = self.transform.derivative(&xi);
            let (inverse, _) = invert_jacobian(jacobian)
                .ok_or_else(|| Error::invalid_argument(format!("element {} is degenerate", parent)))?;
            self.boundary_transform_determinants[q] = self.transform.boundary_determinant(face, s);
            self.boundary_positions[q] = self.transform.value(&xi);
            for i in 0..n {
                self.boundary_shape_values[q * n + i] = S::value(i, &xi);
                self.boundary_shape_gradients[q * n + i] = inverse.tr_mul(&S::gradient(i, &xi));
            }
        }
        self.boundary_normal = boundary_element.normal().clone();
        self.boundary_parent = parent;
        self.current_boundary_element = Some(index);
        Ok(())
    }

    fn check_element(&self) {
        if self.checks.enabled() {
            assert!(self.current_element.is_some(), "No element has been set on the kernel");
        }
    }

    fn check_boundary_element(&self) {
        if self.checks.enabled() {
            assert!(
                self.current_boundary_element.is_some(),
                "No boundary element has been set on the kernel"
            );
        }
    }

    pub fn shape_value(&self, q: usize, i: usize) -> T {
        self.check_element();
        self.reference_values[q * S::NUM_NODES + i]
    }

    /// Gradient of a shape function with respect to physical coordinates.
    pub fn shape_gradient(&self, q: usize, i: usize) -> &OVector<T, ShapeDim<S>> {
        self.check_element();
        &self.shape_gradients[q * S::NUM_NODES + i]
    }

    /// Absolute value of the Jacobian determinant.
    pub fn transform_determinant(&self, q: usize) -> T {
        self.check_element();
        self.transform_determinants[q]
    }

    pub fn weight(&self, q: usize) -> T {
        self.quadrature.weights()[q]
    }

    /// Quadrature point on the reference element.
    pub fn reference_point(&self, q: usize) -> &OPoint<T, ShapeDim<S>> {
        &self.quadrature.points()[q]
    }

    /// Quadrature point in physical coordinates.
    pub fn position(&self, q: usize) -> &OPoint<T, ShapeDim<S>> {
        self.check_element();
        &self.positions[q]
    }

    pub fn boundary_shape_value(&self, q: usize, i: usize) -> T {
        self.check_boundary_element();
        self.boundary_shape_values[q * S::NUM_NODES + i]
    }

    pub fn boundary_shape_gradient(&self, q: usize, i: usize) -> &OVector<T, ShapeDim<S>> {
        self.check_boundary_element();
        &self.boundary_shape_gradients[q * S::NUM_NODES + i]
    }

    /// Surface measure of the face parameterization.
    pub fn boundary_transform_determinant(&self, q: usize) -> T {
        self.check_boundary_element();
        self.boundary_transform_determinants[q]
    }

    pub fn boundary_weight(&self, q: usize) -> T {
        self.face_quadrature.weights()[q]
    }

    pub fn boundary_position(&self, q: usize) -> &OPoint<T, ShapeDim<S>> {
        self.check_boundary_element();
        &self.boundary_positions[q]
    }

    /// Outward unit normal of the current boundary element.
    pub fn boundary_normal(&self) -> &OVector<T, ShapeDim<S>> {
        self.check_boundary_element();
        &self.boundary_normal
    }

    /// Global node index of a local node of the current element.
    pub fn global_node(&self, i: usize) -> usize {
        self.check_element();
        self.grid.global_node_index(self.current_element.unwrap_or(0), i)
    }

    /// Global node index of a local node of the parent of the current boundary element.
    pub fn boundary_global_node(&self, i: usize) -> usize {
        self.check_boundary_element();
        self.grid.global_node_index(self.boundary_parent, i)
    }

    /// Whether a local node of the current element lies on the boundary of the grid.
    pub fn is_boundary_node(&self, i: usize) -> bool {
        self.grid.is_boundary_node(self.global_node(i))
    }

    /// Averaged outward normal at a local node of the current element.
    pub fn boundary_normal_at_node(&self, i: usize) -> Result<OVector<T, ShapeDim<S>>, Error> {
        self.grid.boundary_normal(self.global_node(i))
    }

    /// Whether a local node of the parent element lies on the current boundary face.
    pub fn is_face_node(&self, i: usize) -> bool {
        self.check_boundary_element();
        let face = self
            .current_boundary_element
            .and_then(|b| self.grid.boundary_element(b))
            .map(|b| b.parent_face());
        match face {
            Some(face) => (0..S::NUM_FACE_NODES).any(|k| S::face_node(face, k) == i),
            None => false,
        }
    }
}
