//! Quadrature rules for the reference interval `[0, 1]`.
use crate::quadrature::{convert_quadrature_rule_from_1d_f64, gauss_points_for_strength, QuadraturePair1d};
use crate::Real;
use fenris_quadrature::univariate;

/// Gauss quadrature on the reference interval `[0, 1]`.
///
/// Given `n` points, the rule integrates polynomials of degree up to `2n - 1` exactly.
/// Points are returned in increasing order and the weights sum to one.
///
/// # Panics
///
/// Panics if zero points are requested.
pub fn gauss<T: Real>(num_points: usize) -> QuadraturePair1d<T> {
    let (weights, points) = univariate::gauss(num_points);
    let mut rule: Vec<_> = weights.into_iter().zip(points).collect();
    rule.sort_by(|(_, [a]), (_, [b])| a.total_cmp(b));
    convert_quadrature_rule_from_1d_f64(rule.into_iter().unzip())
}

/// The cheapest Gauss rule on `[0, 1]` that integrates polynomials of the given degree exactly.
pub fn interval<T: Real>(strength: usize) -> QuadraturePair1d<T> {
    gauss(gauss_points_for_strength(strength))
}
