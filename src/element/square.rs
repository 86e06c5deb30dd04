use crate::allocators::TopologyAllocator;
use crate::element::{tensor_reference_vertex, tensor_vertex_basis, tensor_vertex_basis_gradient, Topology};
use crate::nalgebra::{DefaultAllocator, OVector, Point2, U1, U2};
use crate::quadrature::{tensor, univariate, QuadratureError, QuadraturePair1d, QuadraturePair2d};
use crate::Real;

/// Faces of the unit square, counter-clockwise starting at the bottom edge.
#[rustfmt::skip]
pub const SQUARE_FACE_VERTICES: [[usize; 2]; 4] = [
    [0, 1],
    [1, 3],
    [2, 3],
    [0, 2],
];

/// The unit square `[0, 1]^2` with lexicographically numbered vertices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Square;

impl Topology for Square {
    type Dim = U2;
    type FaceDim = U1;

    const NUM_VERTICES: usize = 4;
    const NUM_FACES: usize = 4;
    const NUM_FACE_VERTICES: usize = 2;
    const NAME: &'static str = "square";

    fn face_vertex(face: usize, i: usize) -> usize {
        debug_assert!(face < Self::NUM_FACES && i < Self::NUM_FACE_VERTICES, "invalid face index");
        SQUARE_FACE_VERTICES[face][i]
    }

    fn reference_vertex<T: Real>(i: usize) -> Point2<T>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_reference_vertex(i)
    }

    fn vertex_basis<T: Real>(i: usize, xi: &Point2<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis(i, xi)
    }

    fn vertex_basis_gradient<T: Real>(i: usize, xi: &Point2<T>) -> OVector<T, U2>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis_gradient(i, xi)
    }

    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(tensor::square(strength))
    }

    fn face_quadrature<T: Real>(strength: usize) -> Result<QuadraturePair1d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(univariate::interval(strength))
    }
}
