//! Geometric mappings from reference elements to physical elements.
use nalgebra::{DefaultAllocator, DimName, OMatrix, OPoint, OVector};
use std::marker::PhantomData;

use crate::allocators::TopologyAllocator;
use crate::element::Topology;
use crate::{Error, Real};

/// Maps reference coordinates of a topology `K` to the physical coordinates of one element.
///
/// The mapping is defined by the vertex basis of the topology, i.e. it is affine for simplices
/// and multilinear for tensor elements. Faces are assumed to be flat.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementTransform<T, K>
where
    T: Real,
    K: Topology,
    DefaultAllocator: TopologyAllocator<T, K>,
{
    vertices: Vec<OPoint<T, K::Dim>>,
    marker: PhantomData<K>,
}

impl<T, K> Default for ElementTransform<T, K>
where
    T: Real,
    K: Topology,
    DefaultAllocator: TopologyAllocator<T, K>,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, K> ElementTransform<T, K>
where
    T: Real,
    K: Topology,
    DefaultAllocator: TopologyAllocator<T, K>,
{
    /// Creates a transform for the reference element itself.
    pub fn new() -> Self {
        Self {
            vertices: (0..K::NUM_VERTICES).map(K::reference_vertex).collect(),
            marker: PhantomData,
        }
    }

    pub fn from_vertices(vertices: &[OPoint<T, K::Dim>]) -> Self {
        assert_eq!(vertices.len(), K::NUM_VERTICES, "Number of vertices must match topology");
        Self {
            vertices: vertices.to_vec(),
            marker: PhantomData,
        }
    }

    /// Assigns the physical coordinates of the `i`-th element vertex.
    pub fn assign(&mut self, i: usize, point: OPoint<T, K::Dim>) {
        self.vertices[i] = point;
    }

    pub fn vertex(&self, i: usize) -> &OPoint<T, K::Dim> {
        &self.vertices[i]
    }

    pub fn vertices(&self) -> &[OPoint<T, K::Dim>] {
        &self.vertices
    }

    /// Physical coordinates of the `i`-th vertex of the given face.
    pub fn face_vertex(&self, face: usize, i: usize) -> &OPoint<T, K::Dim> {
        &self.vertices[K::face_vertex(face, i)]
    }

    /// The arithmetic mean of the element vertices.
    pub fn centroid(&self) -> OPoint<T, K::Dim> {
        let mut sum = OVector::<T, K::Dim>::zeros();
        for x in &self.vertices {
            sum += &x.coords;
        }
        OPoint::from(sum / T::from_usize(K::NUM_VERTICES).expect("Vertex count must fit in T"))
    }

    /// Maps reference coordinates to physical coordinates.
    pub fn value(&self, xi: &OPoint<T, K::Dim>) -> OPoint<T, K::Dim> {
        let mut x = OVector::<T, K::Dim>::zeros();
        for (i, x_i) in self.vertices.iter().enumerate() {
            x += &x_i.coords * K::vertex_basis(i, xi);
        }
        OPoint::from(x)
    }

    /// The Jacobian `dx/dxi` of the mapping at the given reference coordinates.
    pub fn derivative(&self, xi: &OPoint<T, K::Dim>) -> OMatrix<T, K::Dim, K::Dim> {
        let d = K::Dim::dim();
        let mut jacobian = OMatrix::<T, K::Dim, K::Dim>::zeros();
        for (i, x_i) in self.vertices.iter().enumerate() {
            let g = K::vertex_basis_gradient(i, xi);
            for r in 0..d {
                for c in 0..d {
                    jacobian[(r, c)] += x_i[r] * g[c];
                }
            }
        }
        jacobian
    }

    /// Columns spanning the given face on the reference element, `r_{k+1} - r_0`.
    fn reference_face_basis(face: usize) -> OMatrix<T, K::Dim, K::FaceDim> {
        let r0 = K::reference_vertex::<T>(K::face_vertex(face, 0));
        let mut basis = OMatrix::<T, K::Dim, K::FaceDim>::zeros();
        for k in 0..K::FaceDim::dim() {
            let r = K::reference_vertex::<T>(K::face_vertex(face, k + 1));
            basis.set_column(k, &(r - &r0));
        }
        basis
    }

    /// Embeds reference coordinates on the given face into the reference element.
    pub fn boundary2element(&self, face: usize, s: &OPoint<T, K::FaceDim>) -> OPoint<T, K::Dim> {
        let r0 = K::reference_vertex::<T>(K::face_vertex(face, 0));
        let mut xi = r0.clone();
        for k in 0..K::FaceDim::dim() {
            let r = K::reference_vertex::<T>(K::face_vertex(face, k + 1));
            xi += (r - &r0) * s[k];
        }
        xi
    }

    /// Jacobian of the face parameterization, a `D x (D - 1)` matrix.
    pub fn boundary_derivative(&self, face: usize, s: &OPoint<T, K::FaceDim>) -> OMatrix<T, K::Dim, K::FaceDim> {
        let xi = self.boundary2element(face, s);
        let jacobian = self.derivative(&xi);
        let basis = Self::reference_face_basis(face);
        let mut result = OMatrix::<T, K::Dim, K::FaceDim>::zeros();
        for r in 0..K::Dim::dim() {
            for c in 0..K::FaceDim::dim() {
                for k in 0..K::Dim::dim() {
                    result[(r, c)] += jacobian[(r, k)] * basis[(k, c)];
                }
            }
        }
        result
    }

    /// Surface measure of the face parameterization, `sqrt(det(Jf^T Jf))`.
    ///
    /// Faces of interval elements are points with unit measure.
    pub fn boundary_determinant(&self, face: usize, s: &OPoint<T, K::FaceDim>) -> T {
        let jf = self.boundary_derivative(face, s);
        match K::FaceDim::dim() {
            0 => T::one(),
            1 => jf.column(0).norm(),
            2 => {
                let (c0, c1) = (jf.column(0), jf.column(1));
                let (g00, g11, g01) = (c0.dot(&c0), c1.dot(&c1), c0.dot(&c1));
                (g00 * g11 - g01 * g01).max(T::zero()).sqrt()
            }
            _ => unreachable!("Faces of reference elements have at most two dimensions"),
        }
    }

    /// Outward unit normal of the given face.
    ///
    /// Computed from vertex differences of the face and oriented away from the element
    /// centroid. Returns an error for degenerate faces.
    pub fn boundary_normal(&self, face: usize) -> Result<OVector<T, K::Dim>, Error> {
        let a = self.face_vertex(face, 0);
        let mut n = OVector::<T, K::Dim>::zeros();
        match K::Dim::dim() {
            1 => n[0] = T::one(),
            2 => {
                let t = self.face_vertex(face, 1) - a;
                n[0] = t[1];
                n[1] = -t[0];
            }
            3 => {
                let u = self.face_vertex(face, 1) - a;
                let v = self.face_vertex(face, 2) - a;
                n[0] = u[1] * v[2] - u[2] * v[1];
                n[1] = u[2] * v[0] - u[0] * v[2];
                n[2] = u[0] * v[1] - u[1] * v[0];
            }
            _ => unreachable!("Reference elements have at most three dimensions"),
        }

        let inward = self.centroid() - a;
        if n.dot(&inward) > T::zero() {
            n = -n;
        }
        n.try_normalize(T::zero()).ok_or_else(|| {
            Error::invalid_argument(format!("face {} of {} element is degenerate", face, K::NAME))
        })
    }
}
