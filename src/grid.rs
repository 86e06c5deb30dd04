//! Grids: vertices, element connectivity and boundary information for one topology.
use itertools::izip;
use log::debug;
use nalgebra::{DVector, DVectorView, DefaultAllocator, OPoint, OVector};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use std::collections::{BTreeMap, BTreeSet};
use std::marker::PhantomData;

use crate::allocators::TopologyAllocator;
use crate::assembly::ElementKernel;
use crate::element::{ShapeDim, ShapeFunction, Topology};
use crate::transform::ElementTransform;
use crate::{Error, Real};

pub mod procedural;
pub mod triangulation;

/// A face of a grid element that lies on the boundary of the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryElement<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    parent_element: usize,
    parent_face: usize,
    normal: OVector<T, ShapeDim<S>>,
}

impl<T, S> BoundaryElement<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    /// Index of the element that owns the face.
    pub fn parent_element(&self) -> usize {
        self.parent_element
    }

    /// Local index of the face within the parent element.
    pub fn parent_face(&self) -> usize {
        self.parent_face
    }

    /// Outward unit normal of the face.
    pub fn normal(&self) -> &OVector<T, ShapeDim<S>> {
        &self.normal
    }
}

/// A grid of elements that all share the reference topology of the shape function `S`.
///
/// Vertices define the geometry of elements, while nodes index degrees of freedom in global
/// vectors and matrices. For linear shape functions the two typically coincide.
///
/// Grids are populated after a call to [`set_dimensions`](Self::set_dimensions) through the
/// various setters. Boundary elements must be assigned after the elements they refer to, since
/// their normals and nodes are derived from the parent element when they are assigned.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    vertices: Vec<OPoint<T, ShapeDim<S>>>,
    // Flat storage with stride NUM_VERTICES
    element_vertices: Vec<usize>,
    // Flat storage with stride NUM_NODES
    element_nodes: Vec<usize>,
    boundary_elements: Vec<Option<BoundaryElement<T, S>>>,
    boundary_node_elements: BTreeMap<usize, Vec<usize>>,
    n_nodes: usize,
    is_regular: bool,
    marker: PhantomData<S>,
}

impl<T, S> Default for Grid<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> Grid<T, S>
where
    T: Real,
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    const VERTEX_STRIDE: usize = S::Topology::NUM_VERTICES;
    const NODE_STRIDE: usize = S::NUM_NODES;

    /// Creates an empty grid.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            element_vertices: Vec::new(),
            element_nodes: Vec::new(),
            boundary_elements: Vec::new(),
            boundary_node_elements: BTreeMap::new(),
            n_nodes: 0,
            is_regular: false,
            marker: PhantomData,
        }
    }

    /// Sizes the grid, discarding all previous content.
    ///
    /// Vertices are placed at the origin, connectivity is zero-filled and boundary elements are
    /// left unassigned. The grid is marked as not regular.
    pub fn set_dimensions(&mut self, n_vertices: usize, n_elements: usize, n_boundary_elements: usize, n_nodes: usize) {
        self.vertices = vec![OPoint::origin(); n_vertices];
        self.element_vertices = vec![0; n_elements * Self::VERTEX_STRIDE];
        self.element_nodes = vec![0; n_elements * Self::NODE_STRIDE];
        self.reset_boundary_elements(n_boundary_elements);
        self.n_nodes = n_nodes;
        self.is_regular = false;
    }

    fn reset_boundary_elements(&mut self, n_boundary_elements: usize) {
        self.boundary_elements = vec![None; n_boundary_elements];
        self.boundary_node_elements.clear();
    }

    pub fn n_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn n_elements(&self) -> usize {
        self.element_vertices.len() / Self::VERTEX_STRIDE
    }

    pub fn n_boundary_elements(&self) -> usize {
        self.boundary_elements.len()
    }

    pub fn n_nodes(&self) -> usize {
        self.n_nodes
    }

    /// Whether all elements are translates of each other.
    pub fn is_regular(&self) -> bool {
        self.is_regular
    }

    pub fn set_regular(&mut self, regular: bool) {
        self.is_regular = regular;
    }

    pub fn vertices(&self) -> &[OPoint<T, ShapeDim<S>>] {
        &self.vertices
    }

    pub fn vertex(&self, i: usize) -> &OPoint<T, ShapeDim<S>> {
        &self.vertices[i]
    }

    pub fn set_vertex(&mut self, i: usize, point: OPoint<T, ShapeDim<S>>) {
        self.vertices[i] = point;
    }

    /// Global vertex indices of the given element.
    pub fn element_vertices(&self, element: usize) -> &[usize] {
        let stride = Self::VERTEX_STRIDE;
        &self.element_vertices[stride * element..stride * (element + 1)]
    }

    /// Global node indices of the given element.
    pub fn element_nodes(&self, element: usize) -> &[usize] {
        let stride = Self::NODE_STRIDE;
        &self.element_nodes[stride * element..stride * (element + 1)]
    }

    pub fn global_vertex_index(&self, element: usize, local_index: usize) -> usize {
        assert!(local_index < Self::VERTEX_STRIDE, "Local vertex index out of bounds");
        self.element_vertices[Self::VERTEX_STRIDE * element + local_index]
    }

    pub fn global_node_index(&self, element: usize, local_index: usize) -> usize {
        assert!(local_index < Self::NODE_STRIDE, "Local node index out of bounds");
        self.element_nodes[Self::NODE_STRIDE * element + local_index]
    }

    pub fn set_element_vertices(&mut self, element: usize, vertices: &[usize]) {
        assert_eq!(vertices.len(), Self::VERTEX_STRIDE, "Number of vertices must match topology");
        let stride = Self::VERTEX_STRIDE;
        self.element_vertices[stride * element..stride * (element + 1)].copy_from_slice(vertices);
    }

    pub fn set_element_vertex(&mut self, element: usize, local_index: usize, vertex: usize) {
        assert!(local_index < Self::VERTEX_STRIDE, "Local vertex index out of bounds");
        self.element_vertices[Self::VERTEX_STRIDE * element + local_index] = vertex;
    }

    pub fn set_element_nodes(&mut self, element: usize, nodes: &[usize]) {
        assert_eq!(nodes.len(), Self::NODE_STRIDE, "Number of nodes must match shape function");
        let stride = Self::NODE_STRIDE;
        self.element_nodes[stride * element..stride * (element + 1)].copy_from_slice(nodes);
    }

    pub fn set_element_node(&mut self, element: usize, local_index: usize, node: usize) {
        assert!(local_index < Self::NODE_STRIDE, "Local node index out of bounds");
        self.element_nodes[Self::NODE_STRIDE * element + local_index] = node;
    }

    /// Populates the transform with the vertex coordinates of the given element.
    pub fn element_transform(&self, element: usize, transform: &mut ElementTransform<T, S::Topology>) {
        for (i, &v) in self.element_vertices(element).iter().enumerate() {
            transform.assign(i, self.vertices[v].clone());
        }
    }

    /// Returns the boundary element with the given index, or `None` if it has not been assigned.
    pub fn boundary_element(&self, index: usize) -> Option<&BoundaryElement<T, S>> {
        self.boundary_elements[index].as_ref()
    }

    /// Declares face `face` of element `parent` to be the boundary element with the given index.
    ///
    /// The outward normal of the face is computed from the current element geometry and every
    /// node on the face is registered as a boundary node. If the index was previously assigned,
    /// the nodes of the previous face are unregistered first.
    ///
    /// # Panics
    ///
    /// Panics if any of the indices are out of bounds.
    ///
    /// # Errors
    ///
    /// Returns an error if the face is degenerate, so that no normal can be computed.
    pub fn set_boundary_element(&mut self, index: usize, parent: usize, face: usize) -> Result<(), Error> {
        assert!(index < self.n_boundary_elements(), "Boundary element index out of bounds");
        assert!(parent < self.n_elements(), "Parent element index out of bounds");
        assert!(face < S::Topology::NUM_FACES, "Face index out of bounds");

        let mut transform = ElementTransform::new();
        self.element_transform(parent, &mut transform);
        let normal = transform.boundary_normal(face)?;

        if let Some(previous) = self.boundary_elements[index].take() {
            for node in self.face_nodes(previous.parent_element, previous.parent_face) {
                if let Some(elements) = self.boundary_node_elements.get_mut(&node) {
                    elements.retain(|&b| b != index);
                    if elements.is_empty() {
                        self.boundary_node_elements.remove(&node);
                    }
                }
            }
        }

        for node in self.face_nodes(parent, face) {
            let elements = self.boundary_node_elements.entry(node).or_default();
            if !elements.contains(&index) {
                elements.push(index);
            }
        }

        self.boundary_elements[index] = Some(BoundaryElement {
            parent_element: parent,
            parent_face: face,
            normal,
        });
        Ok(())
    }

    /// Global node indices of the nodes on the given face of an element.
    pub fn face_nodes(&self, element: usize, face: usize) -> Vec<usize> {
        (0..S::NUM_FACE_NODES)
            .map(|i| self.global_node_index(element, S::face_node(face, i)))
            .collect()
    }

    pub fn is_boundary_node(&self, node: usize) -> bool {
        self.boundary_node_elements.contains_key(&node)
    }

    /// Boundary nodes in increasing order.
    pub fn boundary_nodes(&self) -> impl '_ + Iterator<Item = usize> {
        self.boundary_node_elements.keys().copied()
    }

    /// Indices of the boundary elements that the given node belongs to.
    pub fn boundary_elements_at_node(&self, node: usize) -> &[usize] {
        self.boundary_node_elements
            .get(&node)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The normal at a boundary node.
    ///
    /// For nodes shared by several boundary elements, this is the normalized sum of the face
    /// normals.
    pub fn boundary_normal(&self, node: usize) -> Result<OVector<T, ShapeDim<S>>, Error> {
        let elements = self
            .boundary_node_elements
            .get(&node)
            .ok_or_else(|| Error::invalid_argument(format!("node {} is not a boundary node", node)))?;
        let mut normal = OVector::<T, ShapeDim<S>>::zeros();
        for &b in elements {
            if let Some(boundary_element) = &self.boundary_elements[b] {
                normal += &boundary_element.normal;
            }
        }
        normal
            .try_normalize(T::zero())
            .ok_or_else(|| Error::invalid_argument(format!("face normals at node {} cancel out", node)))
    }

    /// Checks that all connectivity refers to existing vertices and nodes, and that every
    /// boundary element has been assigned.
    pub fn validate(&self) -> Result<(), Error> {
        if let Some(v) = self.element_vertices.iter().find(|&&v| v >= self.n_vertices()) {
            return Err(Error::invalid_argument(format!(
                "vertex index {} exceeds number of vertices {}",
                v,
                self.n_vertices()
            )));
        }
        if let Some(n) = self.element_nodes.iter().find(|&&n| n >= self.n_nodes) {
            return Err(Error::invalid_argument(format!(
                "node index {} exceeds number of nodes {}",
                n, self.n_nodes
            )));
        }
        if let Some(b) = self.boundary_elements.iter().position(Option::is_none) {
            return Err(Error::invalid_argument(format!("boundary element {} is not assigned", b)));
        }
        Ok(())
    }

    /// Finds faces which belong to exactly one element, and assigns them as the boundary
    /// elements of the grid, replacing any previous boundary elements.
    ///
    /// Faces are identified by their vertex indices. Boundary elements are ordered by parent
    /// element and then by local face index. Returns the number of boundary elements.
    pub fn assign_detected_boundary(&mut self) -> Result<usize, Error> {
        let num_faces = S::Topology::NUM_FACES;
        let num_face_vertices = S::Topology::NUM_FACE_VERTICES;

        // BTreeMap keeps the result deterministic
        let mut face_counts = BTreeMap::new();
        for element in 0..self.n_elements() {
            for face in 0..num_faces {
                let mut key: Vec<usize> = (0..num_face_vertices)
                    .map(|i| self.global_vertex_index(element, S::Topology::face_vertex(face, i)))
                    .collect();
                key.sort_unstable();
                face_counts
                    .entry(key)
                    .and_modify(|(_, count)| *count += 1)
                    .or_insert(((element, face), 1));
            }
        }

        let mut boundary_faces: Vec<(usize, usize)> = face_counts
            .into_values()
            .filter(|&(_, count)| count == 1)
            .map(|(face, _)| face)
            .collect();
        boundary_faces.sort_unstable();

        self.reset_boundary_elements(boundary_faces.len());
        for (index, &(element, face)) in boundary_faces.iter().enumerate() {
            self.set_boundary_element(index, element, face)?;
        }
        debug!("Detected {} boundary elements", boundary_faces.len());
        Ok(boundary_faces.len())
    }

    /// Whether element `b` is a translate of element `a`, with vertex positions relative to the
    /// first vertex agreeing up to the given tolerance.
    pub fn is_translate(&self, a: usize, b: usize, tolerance: T) -> bool {
        let vertices_a = self.element_vertices(a);
        let vertices_b = self.element_vertices(b);
        let origin_a = &self.vertices[vertices_a[0]];
        let origin_b = &self.vertices[vertices_b[0]];
        izip!(vertices_a, vertices_b).all(|(&va, &vb)| {
            let offset_a = &self.vertices[va] - origin_a;
            let offset_b = &self.vertices[vb] - origin_b;
            (offset_a - offset_b).norm() <= tolerance
        })
    }

    /// Whether every element is a translate of the first element.
    pub fn check_regularity(&self, tolerance: T) -> bool {
        (1..self.n_elements()).all(|e| self.is_translate(0, e, tolerance))
    }

    fn nodal_value(data: &DVectorView<T>, system_size: usize, component: usize, node: usize) -> T {
        data[system_size * node + component]
    }

    /// Evaluates the finite element function with the given nodal values at an interior
    /// quadrature point of the current kernel element.
    pub fn interpolate_value<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        self.interpolate_component_value(data, 1, 0, q, kernel)
    }

    /// Like [`interpolate_value`](Self::interpolate_value) for one component of vector-valued
    /// data interleaved with the given system size.
    pub fn interpolate_component_value<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        system_size: usize,
        component: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        let data = data.into();
        let mut value = T::zero();
        for i in 0..S::NUM_NODES {
            let u_i = Self::nodal_value(&data, system_size, component, kernel.global_node(i));
            value += u_i * kernel.shape_value(q, i);
        }
        value
    }

    pub fn interpolate_gradient<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> OVector<T, ShapeDim<S>> {
        self.interpolate_component_gradient(data, 1, 0, q, kernel)
    }

    pub fn interpolate_component_gradient<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        system_size: usize,
        component: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> OVector<T, ShapeDim<S>> {
        let data = data.into();
        let mut gradient = OVector::<T, ShapeDim<S>>::zeros();
        for i in 0..S::NUM_NODES {
            let u_i = Self::nodal_value(&data, system_size, component, kernel.global_node(i));
            gradient += kernel.shape_gradient(q, i) * u_i;
        }
        gradient
    }

    /// Evaluates the finite element function at a quadrature point of the current kernel
    /// boundary element.
    pub fn interpolate_boundary_value<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        self.interpolate_boundary_component_value(data, 1, 0, q, kernel)
    }

    pub fn interpolate_boundary_component_value<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        system_size: usize,
        component: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> T {
        let data = data.into();
        let mut value = T::zero();
        for i in 0..S::NUM_NODES {
            let u_i = Self::nodal_value(&data, system_size, component, kernel.boundary_global_node(i));
            value += u_i * kernel.boundary_shape_value(q, i);
        }
        value
    }

    pub fn interpolate_boundary_gradient<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> OVector<T, ShapeDim<S>> {
        self.interpolate_boundary_component_gradient(data, 1, 0, q, kernel)
    }

    pub fn interpolate_boundary_component_gradient<'b>(
        &self,
        data: impl Into<DVectorView<'b, T>>,
        system_size: usize,
        component: usize,
        q: usize,
        kernel: &ElementKernel<'_, T, S>,
    ) -> OVector<T, ShapeDim<S>> {
        let data = data.into();
        let mut gradient = OVector::<T, ShapeDim<S>>::zeros();
        for i in 0..S::NUM_NODES {
            let u_i = Self::nodal_value(&data, system_size, component, kernel.boundary_global_node(i));
            gradient += kernel.boundary_shape_gradient(q, i) * u_i;
        }
        gradient
    }

    /// Sparsity pattern coupling every pair of nodes that share an element, for a system with
    /// the given number of unknowns per node.
    pub fn sparsity_pattern(&self, system_size: usize) -> SparsityPattern {
        let s = system_size;
        // Collecting into a BTreeSet stores each entry once and yields them in row-major order
        let mut matrix_entries = BTreeSet::new();
        for element in 0..self.n_elements() {
            let nodes = self.element_nodes(element);
            for node_i in nodes {
                for node_j in nodes {
                    for l in 0..s {
                        for m in 0..s {
                            matrix_entries.insert((s * node_i + l, s * node_j + m));
                        }
                    }
                }
            }
        }

        let num_rows = s * self.n_nodes;
        let mut offsets = Vec::with_capacity(num_rows + 1);
        let mut column_indices = Vec::with_capacity(matrix_entries.len());
        offsets.push(0);
        for (i, j) in matrix_entries {
            // Loop to correctly handle consecutive empty rows
            while i + 1 > offsets.len() {
                offsets.push(column_indices.len());
            }
            column_indices.push(j);
        }
        while offsets.len() < num_rows + 1 {
            offsets.push(column_indices.len());
        }

        SparsityPattern::try_from_offsets_and_indices(num_rows, num_rows, offsets, column_indices)
            .expect("Pattern data must be valid by definition")
    }

    /// A zero-filled stiffness matrix containing every entry touched by assembly.
    pub fn stiffness_matrix_prototype(&self, system_size: usize) -> CsrMatrix<T> {
        let pattern = self.sparsity_pattern(system_size);
        let nnz = pattern.nnz();
        CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz])
            .expect("CSR data must be valid by definition")
    }

    /// A zero force vector of matching dimension.
    pub fn force_vector_prototype(&self, system_size: usize) -> DVector<T> {
        DVector::zeros(system_size * self.n_nodes)
    }
}
