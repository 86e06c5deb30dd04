//! Quadrature rules on the reference elements.
//!
//! All rules are defined on the unit reference domains used throughout the crate: the
//! interval `[0, 1]`, the unit square and cube, and the unit triangle and tetrahedron spanned by
//! the origin and the coordinate unit vectors. Weights sum to the measure of the reference
//! domain.
use nalgebra::allocator::Allocator;
use nalgebra::{convert, DefaultAllocator, DimName, OPoint, Point1, Point2, Point3, Scalar, U0, U1, U2, U3};
use num::Zero;
use std::fmt;
use std::fmt::{Display, Formatter};
use std::ops::{Add, AddAssign, Mul};

use crate::Real;

pub mod simplex;
pub mod tensor;
pub mod univariate;

pub type QuadraturePair<T, D> = (Vec<T>, Vec<OPoint<T, D>>);
pub type QuadraturePair0d<T> = QuadraturePair<T, U0>;
pub type QuadraturePair1d<T> = QuadraturePair<T, U1>;
pub type QuadraturePair2d<T> = QuadraturePair<T, U2>;
pub type QuadraturePair3d<T> = QuadraturePair<T, U3>;

/// Errors returned by quadrature methods.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuadratureError {
    /// Indicates that a rule satisfying the given requirements is not available.
    NoRuleAvailable { domain: &'static str, strength: usize },
}

impl Display for QuadratureError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuleAvailable { domain, strength } => {
                write!(
                    f,
                    "There is no quadrature rule of strength {} available for the reference {}",
                    strength, domain
                )
            }
        }
    }
}

impl std::error::Error for QuadratureError {}

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<T, D>
where
    T: Scalar,
    D: DimName,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T];
    fn points(&self) -> &[OPoint<T, D>];

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<U, Function>(&self, f: Function) -> U
    where
        Function: Fn(&OPoint<T, D>) -> U,
        U: Zero + Mul<T, Output = U> + Add<T, Output = U> + AddAssign<U>,
    {
        let mut integral = U::zero();
        for (w, p) in self.weights().iter().zip(self.points()) {
            integral += f(p) * w.clone();
        }
        integral
    }
}

impl<T, D, A, B> Quadrature<T, D> for (A, B)
where
    T: Scalar,
    D: DimName,
    A: AsRef<[T]>,
    B: AsRef<[OPoint<T, D>]>,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T] {
        self.0.as_ref()
    }

    fn points(&self) -> &[OPoint<T, D>] {
        self.1.as_ref()
    }
}

impl<T, D, X> Quadrature<T, D> for &X
where
    T: Scalar,
    D: DimName,
    X: Quadrature<T, D>,
    DefaultAllocator: Allocator<T, D>,
{
    fn weights(&self) -> &[T] {
        X::weights(self)
    }

    fn points(&self) -> &[OPoint<T, D>] {
        X::points(self)
    }
}

/// The trivial rule on the zero-dimensional reference point.
///
/// Used for the faces of interval elements. The single weight is one.
pub fn point<T: Real>() -> QuadraturePair0d<T> {
    (vec![T::one()], vec![OPoint::origin()])
}

/// Maps a rule on a bi-unit reference domain of `fenris-quadrature` to the corresponding unit
/// domain of this crate.
///
/// `[-1, 1]^D` maps to `[0, 1]^D`, and the simplex with vertices `-1` and `-1 + 2 e_i` maps to
/// the unit simplex. Both maps are `x -> (x + 1) / 2`, scaling the volume by `2^-D`.
fn rescale_to_unit_domain<const D: usize>(rule: fenris_quadrature::Rule<D>) -> fenris_quadrature::Rule<D> {
    let (weights, points) = rule;
    let scale = 0.5f64.powi(D as i32);
    let weights = weights.into_iter().map(|w| w * scale).collect();
    let points = points
        .into_iter()
        .map(|p| p.map(|x| 0.5 * (x + 1.0)))
        .collect();
    (weights, points)
}

fn convert_quadrature_rule_from_1d_f64<T>(quadrature: fenris_quadrature::Rule<1>) -> QuadraturePair1d<T>
where
    T: Real,
{
    let (weights, points) = rescale_to_unit_domain(quadrature);
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point1::from).map(convert).collect();
    (weights, points)
}

fn convert_quadrature_rule_from_2d_f64<T>(quadrature: fenris_quadrature::Rule<2>) -> QuadraturePair2d<T>
where
    T: Real,
{
    let (weights, points) = rescale_to_unit_domain(quadrature);
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point2::from).map(convert).collect();
    (weights, points)
}

fn convert_quadrature_rule_from_3d_f64<T>(quadrature: fenris_quadrature::Rule<3>) -> QuadraturePair3d<T>
where
    T: Real,
{
    let (weights, points) = rescale_to_unit_domain(quadrature);
    let weights = weights.into_iter().map(convert).collect();
    let points = points.into_iter().map(Point3::from).map(convert).collect();
    (weights, points)
}

/// Number of Gauss points per dimension needed to integrate polynomials of the given degree.
pub(crate) fn gauss_points_for_strength(strength: usize) -> usize {
    // n points integrate polynomials of degree 2n - 1 exactly
    (strength + 2) / 2
}
