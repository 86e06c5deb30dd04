//! Helper traits for allocator trait bounds.
use crate::element::Topology;
use nalgebra::{DefaultAllocator, Scalar};

pub use fenris_traits::allocators::*;

/// Allocators needed to work with the element and face dimensions of a topology.
pub trait TopologyAllocator<T: Scalar, K: Topology>: BiDimAllocator<T, K::Dim, K::FaceDim> {}

impl<T, K> TopologyAllocator<T, K> for DefaultAllocator
where
    T: Scalar,
    K: Topology,
    DefaultAllocator: BiDimAllocator<T, K::Dim, K::FaceDim>,
{
}
