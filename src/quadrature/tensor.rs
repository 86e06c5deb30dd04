//! Tensor-product Gauss rules for the unit square and the unit cube.
use crate::quadrature::{
    convert_quadrature_rule_from_2d_f64, convert_quadrature_rule_from_3d_f64, gauss_points_for_strength,
    QuadraturePair2d, QuadraturePair3d,
};
use crate::Real;
use fenris_quadrature::tensor;

/// Tensor-product Gauss rule on `[0, 1]^2` with the given number of points per dimension.
pub fn square_gauss<T: Real>(num_points_per_dim: usize) -> QuadraturePair2d<T> {
    let (weights, points) = tensor::quadrilateral_gauss(num_points_per_dim);
    convert_quadrature_rule_from_2d_f64((weights, points))
}

/// Tensor-product Gauss rule on `[0, 1]^3` with the given number of points per dimension.
pub fn cube_gauss<T: Real>(num_points_per_dim: usize) -> QuadraturePair3d<T> {
    let (weights, points) = tensor::hexahedron_gauss(num_points_per_dim);
    convert_quadrature_rule_from_3d_f64((weights, points))
}

/// The cheapest tensor Gauss rule on the unit square exact for polynomials of the given degree.
pub fn square<T: Real>(strength: usize) -> QuadraturePair2d<T> {
    square_gauss(gauss_points_for_strength(strength))
}

/// The cheapest tensor Gauss rule on the unit cube exact for polynomials of the given degree.
pub fn cube<T: Real>(strength: usize) -> QuadraturePair3d<T> {
    cube_gauss(gauss_points_for_strength(strength))
}
