use crate::allocators::TopologyAllocator;
use crate::element::{simplex_reference_vertex, simplex_vertex_basis, simplex_vertex_basis_gradient, Topology};
use crate::nalgebra::{DefaultAllocator, OVector, Point2, U1, U2};
use crate::quadrature::{simplex, univariate, QuadratureError, QuadraturePair1d, QuadraturePair2d};
use crate::Real;

pub const TRIANGLE_FACE_VERTICES: [[usize; 2]; 3] = [[0, 1], [1, 2], [0, 2]];

/// The unit triangle with vertices `(0, 0)`, `(1, 0)` and `(0, 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Triangle;

impl Topology for Triangle {
    type Dim = U2;
    type FaceDim = U1;

    const NUM_VERTICES: usize = 3;
    const NUM_FACES: usize = 3;
    const NUM_FACE_VERTICES: usize = 2;
    const NAME: &'static str = "triangle";

    fn face_vertex(face: usize, i: usize) -> usize {
        debug_assert!(face < Self::NUM_FACES && i < Self::NUM_FACE_VERTICES, "invalid face index");
        TRIANGLE_FACE_VERTICES[face][i]
    }

    fn reference_vertex<T: Real>(i: usize) -> Point2<T>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_reference_vertex(i)
    }

    fn vertex_basis<T: Real>(i: usize, xi: &Point2<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_vertex_basis(i, xi)
    }

    fn vertex_basis_gradient<T: Real>(i: usize, _xi: &Point2<T>) -> OVector<T, U2>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex_vertex_basis_gradient(i)
    }

    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        simplex::triangle(strength)
    }

    fn face_quadrature<T: Real>(strength: usize) -> Result<QuadraturePair1d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(univariate::interval(strength))
    }
}
