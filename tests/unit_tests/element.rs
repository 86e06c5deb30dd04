use fegrid::element::{
    Cube, Interval, LinearCube, LinearInterval, LinearSquare, LinearTetrahedron, LinearTriangle, QuadraticInterval,
    ShapeFunction, Square, Tetrahedron, Topology, Triangle,
};
use fegrid::nalgebra::allocator::Allocator;
use fegrid::nalgebra::{DefaultAllocator, DimName, OPoint, OVector, Point1, Point2, Point3, U1, U2, U3};
use matrixcompare::assert_scalar_eq;
use paste::paste;
use proptest::prelude::*;
use std::collections::BTreeSet;
use util::assert_approx_matrix_eq;

/// Points in `[0, 1]^D`.
///
/// The vertex bases are polynomials, so partition of unity and the gradient identities hold
/// everywhere and the points need not lie inside simplices.
fn reference_point<D>() -> impl Strategy<Value = OPoint<f64, D>>
where
    D: DimName,
    DefaultAllocator: Allocator<f64, D>,
{
    proptest::collection::vec(0.0..=1.0, D::dim()).prop_map(|coords| OPoint::from(OVector::from_iterator(coords)))
}

macro_rules! shape_function_tests {
    ($name:ident, $shape:ty, $dim:ty) => {
        paste! {
            proptest! {
                #[test]
                fn [<$name _partition_of_unity>](xi in reference_point::<$dim>()) {
                    let n = <$shape as ShapeFunction>::NUM_NODES;
                    let sum: f64 = (0..n).map(|i| <$shape>::value(i, &xi)).sum();
                    let gradient_sum = (0..n)
                        .map(|i| <$shape>::gradient(i, &xi))
                        .fold(OVector::<f64, $dim>::zeros(), |acc, g| acc + g);
                    prop_assert!((sum - 1.0).abs() <= 1e-12);
                    prop_assert!(gradient_sum.norm() <= 1e-12);
                }

                #[test]
                fn [<$name _gradient_matches_finite_differences>](xi in reference_point::<$dim>()) {
                    let h = 1e-6;
                    for i in 0..<$shape as ShapeFunction>::NUM_NODES {
                        let gradient = <$shape>::gradient(i, &xi);
                        for d in 0..<$dim>::dim() {
                            let (mut forward, mut backward) = (xi.clone(), xi.clone());
                            forward[d] += h;
                            backward[d] -= h;
                            let approx = (<$shape>::value(i, &forward) - <$shape>::value(i, &backward)) / (2.0 * h);
                            prop_assert!((gradient[d] - approx).abs() <= 1e-6);
                        }
                    }
                }
            }
        }
    };
}

shape_function_tests!(linear_interval, LinearInterval, U1);
shape_function_tests!(linear_square, LinearSquare, U2);
shape_function_tests!(linear_triangle, LinearTriangle, U2);
shape_function_tests!(linear_cube, LinearCube, U3);
shape_function_tests!(linear_tetrahedron, LinearTetrahedron, U3);
shape_function_tests!(quadratic_interval, QuadraticInterval, U1);

macro_rules! topology_tests {
    ($name:ident, $topology:ty, $volume:expr) => {
        paste! {
            #[test]
            fn [<$name _linear_basis_is_nodal>]() {
                for i in 0..<$topology>::NUM_VERTICES {
                    let vertex = <$topology>::reference_vertex::<f64>(i);
                    for j in 0..<$topology>::NUM_VERTICES {
                        let expected = if i == j { 1.0 } else { 0.0 };
                        assert_scalar_eq!(<$topology>::vertex_basis(j, &vertex), expected, comp = abs, tol = 1e-14);
                    }
                }
            }

            #[test]
            fn [<$name _quadrature_weights_sum_to_reference_volume>]() {
                for strength in 0..=3 {
                    let (weights, points) = <$topology>::quadrature::<f64>(strength).unwrap();
                    assert_eq!(weights.len(), points.len());
                    assert_scalar_eq!(weights.iter().sum::<f64>(), $volume, comp = abs, tol = 1e-14);
                }
            }

            #[test]
            fn [<$name _faces_are_distinct_and_cover_all_vertices>]() {
                let mut faces = BTreeSet::new();
                let mut covered = BTreeSet::new();
                for face in 0..<$topology>::NUM_FACES {
                    let mut vertices: Vec<_> = (0..<$topology>::NUM_FACE_VERTICES)
                        .map(|i| <$topology>::face_vertex(face, i))
                        .collect();
                    assert!(vertices.iter().all(|&v| v < <$topology>::NUM_VERTICES));
                    covered.extend(vertices.iter().copied());
                    vertices.sort_unstable();
                    vertices.dedup();
                    assert_eq!(vertices.len(), <$topology>::NUM_FACE_VERTICES);
                    assert!(faces.insert(vertices));
                }
                assert_eq!(covered.len(), <$topology>::NUM_VERTICES);
            }
        }
    };
}

topology_tests!(interval, Interval, 1.0);
topology_tests!(square, Square, 1.0);
topology_tests!(triangle, Triangle, 0.5);
topology_tests!(cube, Cube, 1.0);
topology_tests!(tetrahedron, Tetrahedron, 1.0 / 6.0);

#[test]
fn tensor_vertices_are_numbered_by_coordinate_bits() {
    assert_eq!(Square::reference_vertex::<f64>(1), Point2::new(1.0, 0.0));
    assert_eq!(Square::reference_vertex::<f64>(2), Point2::new(0.0, 1.0));
    assert_eq!(Cube::reference_vertex::<f64>(5), Point3::new(1.0, 0.0, 1.0));
    assert_eq!(Cube::reference_vertex::<f64>(6), Point3::new(0.0, 1.0, 1.0));
}

#[test]
fn simplex_vertices_are_origin_followed_by_unit_vectors() {
    assert_eq!(Triangle::reference_vertex::<f64>(0), Point2::origin());
    assert_eq!(Triangle::reference_vertex::<f64>(2), Point2::new(0.0, 1.0));
    assert_eq!(Tetrahedron::reference_vertex::<f64>(3), Point3::new(0.0, 0.0, 1.0));
}

#[test]
fn square_basis_is_bilinear() {
    let xi = Point2::new(0.25, 0.5);
    assert_scalar_eq!(Square::vertex_basis(0, &xi), 0.75 * 0.5, comp = abs, tol = 1e-15);
    assert_scalar_eq!(Square::vertex_basis(3, &xi), 0.25 * 0.5, comp = abs, tol = 1e-15);
    let gradient = Square::vertex_basis_gradient(1, &xi);
    assert_approx_matrix_eq!(gradient, fegrid::nalgebra::Vector2::new(0.5, -0.25), abstol = 1e-15);
}

#[test]
fn quadratic_interval_nodes_sit_at_end_points_and_midpoint() {
    let nodes = [Point1::new(0.0), Point1::new(1.0), Point1::new(0.5)];
    for (i, xi) in nodes.iter().enumerate() {
        for j in 0..QuadraticInterval::NUM_NODES {
            let expected = if i == j { 1.0 } else { 0.0 };
            assert_scalar_eq!(QuadraticInterval::value(j, xi), expected, comp = abs, tol = 1e-15);
        }
    }
    assert_eq!(QuadraticInterval::face_node(0, 0), 0);
    assert_eq!(QuadraticInterval::face_node(1, 0), 1);
}

#[test]
fn face_quadrature_matches_face_dimension() {
    let (weights, points) = Interval::face_quadrature::<f64>(3).unwrap();
    assert_eq!((weights, points.len()), (vec![1.0], 1));
    let (weights, _) = Cube::face_quadrature::<f64>(2).unwrap();
    assert_scalar_eq!(weights.iter().sum::<f64>(), 1.0, comp = abs, tol = 1e-14);
    let (weights, _) = Tetrahedron::face_quadrature::<f64>(2).unwrap();
    assert_scalar_eq!(weights.iter().sum::<f64>(), 0.5, comp = abs, tol = 1e-14);
}
