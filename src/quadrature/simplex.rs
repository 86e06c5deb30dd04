//! Quadrature rules for the unit triangle and the unit tetrahedron.
//!
//! The rules are the symmetric polyquad rules shipped with `fenris-quadrature`.
use crate::quadrature::{
    convert_quadrature_rule_from_2d_f64, convert_quadrature_rule_from_3d_f64, QuadratureError, QuadraturePair2d,
    QuadraturePair3d,
};
use crate::Real;
use fenris_quadrature::polyquad;

/// Quadrature rule on the reference triangle `{x, y >= 0, x + y <= 1}` that integrates
/// polynomials of the given total degree exactly.
pub fn triangle<T: Real>(strength: usize) -> Result<QuadraturePair2d<T>, QuadratureError> {
    let (weights, points) = polyquad::triangle(strength.max(1)).map_err(|_| QuadratureError::NoRuleAvailable {
        domain: "triangle",
        strength,
    })?;
    Ok(convert_quadrature_rule_from_2d_f64((weights, points)))
}

/// Quadrature rule on the reference tetrahedron spanned by the origin and the unit vectors that
/// integrates polynomials of the given total degree exactly.
pub fn tetrahedron<T: Real>(strength: usize) -> Result<QuadraturePair3d<T>, QuadratureError> {
    let (weights, points) = polyquad::tetrahedron(strength.max(1)).map_err(|_| QuadratureError::NoRuleAvailable {
        domain: "tetrahedron",
        strength,
    })?;
    Ok(convert_quadrature_rule_from_3d_f64((weights, points)))
}
