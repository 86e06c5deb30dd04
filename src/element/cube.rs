use crate::allocators::TopologyAllocator;
use crate::element::{tensor_reference_vertex, tensor_vertex_basis, tensor_vertex_basis_gradient, Topology};
use crate::nalgebra::{DefaultAllocator, OVector, Point3, U2, U3};
use crate::quadrature::{tensor, QuadratureError, QuadraturePair2d, QuadraturePair3d};
use crate::Real;

/// Faces of the unit cube.
///
/// The first three vertices of each face span it: the vertex differences `v1 - v0` and
/// `v2 - v0` are edges of the face.
#[rustfmt::skip]
pub const CUBE_FACE_VERTICES: [[usize; 4]; 6] = [
    [0, 1, 2, 3],
    [0, 1, 4, 5],
    [1, 3, 5, 7],
    [2, 3, 6, 7],
    [0, 2, 4, 6],
    [4, 5, 6, 7],
];

/// The unit cube `[0, 1]^3` with lexicographically numbered vertices (`v = x + 2y + 4z`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Cube;

impl Topology for Cube {
    type Dim = U3;
    type FaceDim = U2;

    const NUM_VERTICES: usize = 8;
    const NUM_FACES: usize = 6;
    const NUM_FACE_VERTICES: usize = 4;
    const NAME: &'static str = "cube";

    fn face_vertex(face: usize, i: usize) -> usize {
        debug_assert!(face < Self::NUM_FACES && i < Self::NUM_FACE_VERTICES, "invalid face index");
        CUBE_FACE_VERTICES[face][i]
    }

    fn reference_vertex<T: Real>(i: usize) -> Point3<T>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_reference_vertex(i)
    }

    fn vertex_basis<T: Real>(i: usize, xi: &Point3<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis(i, xi)
    }

    fn vertex_basis_gradient<T: Real>(i: usize, xi: &Point3<T>) -> OVector<T, U3>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis_gradient(i, xi)
    }

    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(tensor::cube(strength))
    }

    fn face_quadrature<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(tensor::square(strength))
    }
}
