use numeric_literals::replace_float_literals;

use crate::allocators::TopologyAllocator;
use crate::element::{
    tensor_reference_vertex, tensor_vertex_basis, tensor_vertex_basis_gradient, ShapeFunction, Topology,
};
use crate::nalgebra::{DefaultAllocator, OVector, Point1, U0, U1};
use crate::quadrature::{point, univariate, QuadratureError, QuadraturePair0d, QuadraturePair1d};
use crate::Real;

pub const INTERVAL_FACE_VERTICES: [[usize; 1]; 2] = [[0], [1]];

/// The unit interval `[0, 1]`. Its faces are the two end points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Interval;

impl Topology for Interval {
    type Dim = U1;
    type FaceDim = U0;

    const NUM_VERTICES: usize = 2;
    const NUM_FACES: usize = 2;
    const NUM_FACE_VERTICES: usize = 1;
    const NAME: &'static str = "interval";

    fn face_vertex(face: usize, i: usize) -> usize {
        debug_assert!(face < Self::NUM_FACES && i < Self::NUM_FACE_VERTICES, "invalid face index");
        INTERVAL_FACE_VERTICES[face][i]
    }

    fn reference_vertex<T: Real>(i: usize) -> Point1<T>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_reference_vertex(i)
    }

    fn vertex_basis<T: Real>(i: usize, xi: &Point1<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis(i, xi)
    }

    fn vertex_basis_gradient<T: Real>(i: usize, xi: &Point1<T>) -> OVector<T, U1>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        tensor_vertex_basis_gradient(i, xi)
    }

    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair1d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(univariate::interval(strength))
    }

    fn face_quadrature<T: Real>(_strength: usize) -> Result<QuadraturePair0d<T>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>,
    {
        Ok(point())
    }
}

/// Quadratic Lagrange shape functions on the interval.
///
/// Nodes 0 and 1 sit at the interval end points and node 2 at the midpoint, so that the face
/// nodes coincide with the vertex numbering.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuadraticInterval;

impl ShapeFunction for QuadraticInterval {
    type Topology = Interval;

    const NUM_NODES: usize = 3;
    const NUM_FACE_NODES: usize = 1;
    const QUADRATURE_STRENGTH: usize = 4;

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn value<T: Real>(node: usize, xi: &Point1<T>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Interval>,
    {
        let x = xi[0];
        match node {
            0 => (1.0 - x) * (1.0 - 2.0 * x),
            1 => x * (2.0 * x - 1.0),
            _ => {
                debug_assert_eq!(node, 2, "invalid node index");
                4.0 * x * (1.0 - x)
            }
        }
    }

    #[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
    fn gradient<T: Real>(node: usize, xi: &Point1<T>) -> OVector<T, U1>
    where
        DefaultAllocator: TopologyAllocator<T, Interval>,
    {
        let x = xi[0];
        let dphi = match node {
            0 => 4.0 * x - 3.0,
            1 => 4.0 * x - 1.0,
            _ => {
                debug_assert_eq!(node, 2, "invalid node index");
                4.0 - 8.0 * x
            }
        };
        OVector::<T, U1>::from_element(dphi)
    }

    fn face_node(face: usize, i: usize) -> usize {
        Interval::face_vertex(face, i)
    }
}
