//! Reference topologies and shape functions.
//!
//! A [`Topology`] describes the reference element combinatorics: its vertices, its faces and how
//! faces are numbered, and a multilinear (tensor elements) or affine (simplices) vertex basis
//! that defines the geometric mapping of an element. A [`ShapeFunction`] describes the basis
//! functions used to discretize unknowns on an element of a given topology. Shape function nodes
//! and topology vertices coincide for [`Linear`] shape functions, but not in general.
use nalgebra::allocator::Allocator;
use nalgebra::{DefaultAllocator, DimName, OPoint, OVector};
use numeric_literals::replace_float_literals;
use std::fmt::Debug;
use std::marker::PhantomData;

use crate::allocators::TopologyAllocator;
use crate::quadrature::{QuadratureError, QuadraturePair};
use crate::{Real, SmallDim};

mod cube;
mod interval;
mod square;
mod tetrahedron;
mod triangle;

pub use cube::*;
pub use interval::*;
pub use square::*;
pub use tetrahedron::*;
pub use triangle::*;

/// The combinatorics and geometric basis of a reference element.
pub trait Topology: Copy + Debug + Default + 'static {
    /// Dimension of the reference element.
    type Dim: SmallDim;
    /// Dimension of the faces of the reference element.
    type FaceDim: DimName;

    const NUM_VERTICES: usize;
    const NUM_FACES: usize;
    const NUM_FACE_VERTICES: usize;
    const NAME: &'static str;

    /// Element-local vertex index of the `i`-th vertex of the given face.
    fn face_vertex(face: usize, i: usize) -> usize;

    /// Coordinates of the given vertex on the reference element.
    fn reference_vertex<T: Real>(i: usize) -> OPoint<T, Self::Dim>
    where
        DefaultAllocator: TopologyAllocator<T, Self>;

    /// The geometric basis function associated with the given vertex.
    fn vertex_basis<T: Real>(i: usize, xi: &OPoint<T, Self::Dim>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self>;

    /// Gradient of the geometric basis function with respect to reference coordinates.
    fn vertex_basis_gradient<T: Real>(i: usize, xi: &OPoint<T, Self::Dim>) -> OVector<T, Self::Dim>
    where
        DefaultAllocator: TopologyAllocator<T, Self>;

    /// A quadrature rule on the reference element exact for polynomials of the given degree.
    fn quadrature<T: Real>(strength: usize) -> Result<QuadraturePair<T, Self::Dim>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>;

    /// A quadrature rule on the reference face exact for polynomials of the given degree.
    fn face_quadrature<T: Real>(strength: usize) -> Result<QuadraturePair<T, Self::FaceDim>, QuadratureError>
    where
        DefaultAllocator: TopologyAllocator<T, Self>;
}

/// Basis functions defined on a reference topology.
pub trait ShapeFunction: Copy + Debug + Default + 'static {
    type Topology: Topology;

    const NUM_NODES: usize;
    const NUM_FACE_NODES: usize;
    /// Polynomial degree that the element quadrature must integrate exactly.
    ///
    /// Chosen so that products of two shape functions are integrated exactly on affine
    /// elements.
    const QUADRATURE_STRENGTH: usize;

    fn value<T: Real>(node: usize, xi: &OPoint<T, ShapeDim<Self>>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, Self::Topology>;

    /// Gradient of the given basis function with respect to reference coordinates.
    fn gradient<T: Real>(node: usize, xi: &OPoint<T, ShapeDim<Self>>) -> OVector<T, ShapeDim<Self>>
    where
        DefaultAllocator: TopologyAllocator<T, Self::Topology>;

    /// Element-local node index of the `i`-th node on the given face.
    fn face_node(face: usize, i: usize) -> usize;
}

/// Reference dimension of the topology of a shape function.
pub type ShapeDim<S> = <<S as ShapeFunction>::Topology as Topology>::Dim;

/// Face dimension of the topology of a shape function.
pub type ShapeFaceDim<S> = <<S as ShapeFunction>::Topology as Topology>::FaceDim;

/// Linear (P1) or multilinear (Q1) shape functions with one node per vertex.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Linear<K>(PhantomData<K>);

pub type LinearInterval = Linear<Interval>;
pub type LinearSquare = Linear<Square>;
pub type LinearTriangle = Linear<Triangle>;
pub type LinearCube = Linear<Cube>;
pub type LinearTetrahedron = Linear<Tetrahedron>;

impl<K: Topology> ShapeFunction for Linear<K> {
    type Topology = K;

    const NUM_NODES: usize = K::NUM_VERTICES;
    const NUM_FACE_NODES: usize = K::NUM_FACE_VERTICES;
    const QUADRATURE_STRENGTH: usize = 2;

    fn value<T: Real>(node: usize, xi: &OPoint<T, K::Dim>) -> T
    where
        DefaultAllocator: TopologyAllocator<T, K>,
    {
        K::vertex_basis(node, xi)
    }

    fn gradient<T: Real>(node: usize, xi: &OPoint<T, K::Dim>) -> OVector<T, K::Dim>
    where
        DefaultAllocator: TopologyAllocator<T, K>,
    {
        K::vertex_basis_gradient(node, xi)
    }

    fn face_node(face: usize, i: usize) -> usize {
        K::face_vertex(face, i)
    }
}

fn is_upper(vertex: usize, axis: usize) -> bool {
    (vertex >> axis) & 1 == 1
}

/// Vertex `v` of `[0, 1]^D`, where bit `d` of `v` selects the `d`-th coordinate.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub(crate) fn tensor_reference_vertex<T, D>(v: usize) -> OPoint<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v < 1 << D::dim(), "invalid vertex index");
    OPoint::from(OVector::<T, D>::from_fn(|d, _| if is_upper(v, d) { 1.0 } else { 0.0 }))
}

fn tensor_factor<T: Real>(v: usize, axis: usize, x: T) -> T {
    if is_upper(v, axis) {
        x
    } else {
        T::one() - x
    }
}

pub(crate) fn tensor_vertex_basis<T, D>(v: usize, xi: &OPoint<T, D>) -> T
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v < 1 << D::dim(), "invalid vertex index");
    (0..D::dim()).fold(T::one(), |phi, d| phi * tensor_factor(v, d, xi[d]))
}

pub(crate) fn tensor_vertex_basis_gradient<T, D>(v: usize, xi: &OPoint<T, D>) -> OVector<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v < 1 << D::dim(), "invalid vertex index");
    OVector::from_fn(|c, _| {
        let sign = if is_upper(v, c) { T::one() } else { -T::one() };
        (0..D::dim())
            .filter(|&d| d != c)
            .fold(sign, |dphi, d| dphi * tensor_factor(v, d, xi[d]))
    })
}

/// Vertex `v` of the unit simplex: the origin for `v == 0`, otherwise the unit vector `e_{v-1}`.
pub(crate) fn simplex_reference_vertex<T, D>(v: usize) -> OPoint<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v <= D::dim(), "invalid vertex index");
    let mut vertex = OPoint::origin();
    if v > 0 {
        vertex[v - 1] = T::one();
    }
    vertex
}

pub(crate) fn simplex_vertex_basis<T, D>(v: usize, xi: &OPoint<T, D>) -> T
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v <= D::dim(), "invalid vertex index");
    if v == 0 {
        T::one() - xi.coords.sum()
    } else {
        xi[v - 1]
    }
}

pub(crate) fn simplex_vertex_basis_gradient<T, D>(v: usize) -> OVector<T, D>
where
    T: Real,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    debug_assert!(v <= D::dim(), "invalid vertex index");
    if v == 0 {
        OVector::<T, D>::repeat(-T::one())
    } else {
        let mut gradient = OVector::<T, D>::zeros();
        gradient[v - 1] = T::one();
        gradient
    }
}
