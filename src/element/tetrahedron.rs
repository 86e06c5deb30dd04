use crate::allocators::TopologyAllocator;
use crate::element::{simplex_reference_vertex, simplex_vertex_basis, simplex_vertex_basis_gradient, Topology};
use crate::nalgebra::{DefaultAllocator, OVector, Point3, U2, U3};
use crate::quadrature::{simplex, QuadratureError, QuadraturePair2d, QuadraturePair3d};
use crate::Real;

#[rustfmt::skip]
pub const TETRAHEDRON_FACE_VERTICES: [[usize; 3]; 4] = [
    [0, 1, 3],
    [1, 2, 3],
    [0, 2, 3],
    [0, 1, 2],
];

/// The unit tetrahedron spanned by the origin and the three coordinate unit vectors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tetrahedron;

impl Topology for Tetrahedron {
    type Dim = U3;
    type FaceDim = U2;

    const NUM_VERTICES: usize = 4;
    const NUM_FACES: usize = 4;
    const NUM_FACE_VERTICES: usize = 3;
    const NAME: &'static str = "tetrahedron";

    fn face_vertex(face: usize, i: usize) -> usize {
        debug_assert!(face < Self::NUM_FACES && i < Self::NUM_FACE_VERTICES, "invalid face index");
        TETRAHEDRON_FACE_VERTICES[face][i]
    }

    fn reference_vertex<T: Real>(i: usize) -> Point3<T>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_reference_vertex(i)
    }

    fn vertex_basis<T: Real>(i: usize, xi: &Point3<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_vertex_basis(i, xi)
    }

    fn vertex_basis_gradient<T: Real>(i: usize, _xi: &Point3<T>) -> OVector<T, U3>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_vertex_basis_gradient(i)
    }

    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex::tetrahedron(strength)
    }

    fn face_quadrature<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex::triangle(strength)
    }
}
