use fegrid::element::{Cube, Interval, Square, Tetrahedron, Topology, Triangle};
use fegrid::nalgebra::{
    DimName, Matrix2, Matrix3, OPoint, OVector, Point1, Point2, Point3, Vector1, Vector2, Vector3, U0, U1, U2, U3,
};
use fegrid::transform::ElementTransform;
use fegrid::Error;
use matrixcompare::assert_scalar_eq;
use paste::paste;
use proptest::prelude::*;
use util::assert_approx_matrix_eq;

macro_rules! jacobian_tests {
    ($name:ident, $topology:ty, $dim:ty, $matrix:expr) => {
        paste! {
            /// Maps reference vertex `r` to `A r + b` plus a vertex-dependent wobble, which makes
            /// multilinear maps non-affine.
            fn [<$name _vertices>]() -> Vec<OPoint<f64, $dim>> {
                let matrix = $matrix;
                (0..<$topology>::NUM_VERTICES)
                    .map(|i| {
                        let r = <$topology>::reference_vertex::<f64>(i);
                        let wobble = 0.05 * (i as f64 + 1.0).sin();
                        OPoint::from(matrix * r.coords.add_scalar(wobble)).map(|x| x + 0.3)
                    })
                    .collect()
            }

            proptest! {
                #[test]
                fn [<$name _jacobian_matches_finite_differences>](
                    coords in proptest::collection::vec(0.0..=1.0f64, <$dim>::dim())
                ) {
                    let xi = OPoint::from(OVector::<f64, $dim>::from_column_slice(&coords));
                    let vertices = [<$name _vertices>]();
                    let transform = ElementTransform::<f64, $topology>::from_vertices(&vertices);
                    let jacobian = transform.derivative(&xi);

                    let h = 1e-6;
                    for c in 0..<$dim>::dim() {
                        let (mut forward, mut backward) = (xi.clone(), xi.clone());
                        forward[c] += h;
                        backward[c] -= h;
                        let column = (transform.value(&forward) - transform.value(&backward)) / (2.0 * h);
                        for r in 0..<$dim>::dim() {
                            prop_assert!((jacobian[(r, c)] - column[r]).abs() <= 1e-6);
                        }
                    }
                }
            }

            #[test]
            fn [<$name _maps_reference_vertices_to_element_vertices>]() {
                let vertices = [<$name _vertices>]();
                let transform = ElementTransform::<f64, $topology>::from_vertices(&vertices);
                for (i, x_i) in vertices.iter().enumerate() {
                    let xi = <$topology>::reference_vertex::<f64>(i);
                    assert_approx_matrix_eq!(transform.value(&xi).coords, x_i.coords, abstol = 1e-14);
                }
            }

            #[test]
            fn [<$name _normals_point_away_from_centroid>]() {
                let vertices = [<$name _vertices>]();
                let transform = ElementTransform::<f64, $topology>::from_vertices(&vertices);
                let centroid = transform.centroid();
                for face in 0..<$topology>::NUM_FACES {
                    let normal = transform.boundary_normal(face).unwrap();
                    assert_scalar_eq!(normal.norm(), 1.0, comp = abs, tol = 1e-14);
                    assert!(normal.dot(&(transform.face_vertex(face, 0) - centroid)) > 0.0);
                }
            }
        }
    };
}

jacobian_tests!(interval, Interval, U1, Vector1::new(2.0));
jacobian_tests!(square, Square, U2, Matrix2::new(2.0, 0.5, -0.3, 1.5));
jacobian_tests!(triangle, Triangle, U2, Matrix2::new(2.0, 0.5, -0.3, 1.5));
jacobian_tests!(
    cube,
    Cube,
    U3,
    Matrix3::new(2.0, 0.5, 0.0, -0.3, 1.5, 0.2, 0.1, 0.0, 1.0)
);
jacobian_tests!(
    tetrahedron,
    Tetrahedron,
    U3,
    Matrix3::new(2.0, 0.5, 0.0, -0.3, 1.5, 0.2, 0.1, 0.0, 1.0)
);

#[test]
fn reference_square_normals_are_axis_aligned() {
    let transform = ElementTransform::<f64, Square>::new();
    let expected = [
        Vector2::new(0.0, -1.0),
        Vector2::new(1.0, 0.0),
        Vector2::new(0.0, 1.0),
        Vector2::new(-1.0, 0.0),
    ];
    for (face, n) in expected.iter().enumerate() {
        assert_approx_matrix_eq!(transform.boundary_normal(face).unwrap(), n, abstol = 1e-15);
    }
}

#[test]
fn interval_normals_point_outwards() {
    let transform = ElementTransform::<f64, Interval>::from_vertices(&[Point1::new(1.0), Point1::new(3.0)]);
    assert_eq!(transform.boundary_normal(0).unwrap(), Vector1::new(-1.0));
    assert_eq!(transform.boundary_normal(1).unwrap(), Vector1::new(1.0));
}

#[test]
fn tetrahedron_slanted_face_normal() {
    let transform = ElementTransform::<f64, Tetrahedron>::new();
    let expected = Vector3::repeat(1.0 / 3.0f64.sqrt());
    assert_approx_matrix_eq!(transform.boundary_normal(1).unwrap(), expected, abstol = 1e-15);
}

#[test]
fn boundary_determinant_measures_scaled_faces() {
    let vertices = [Point2::new(0.0, 0.0), Point2::new(2.0, 0.0), Point2::new(0.0, 2.0)];
    let transform = ElementTransform::<f64, Triangle>::from_vertices(&vertices);
    let s = Point1::new(0.3);
    assert_scalar_eq!(transform.boundary_determinant(0, &s), 2.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(transform.boundary_determinant(1, &s), 2.0 * 2.0f64.sqrt(), comp = abs, tol = 1e-14);

    let vertices = [
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(2.0, 0.0, 0.0),
        Point3::new(0.0, 2.0, 0.0),
        Point3::new(0.0, 0.0, 2.0),
    ];
    let transform = ElementTransform::<f64, Tetrahedron>::from_vertices(&vertices);
    assert_scalar_eq!(
        transform.boundary_determinant(3, &Point2::new(0.2, 0.2)),
        4.0,
        comp = abs,
        tol = 1e-14
    );

    let transform = ElementTransform::<f64, Interval>::new();
    assert_eq!(transform.boundary_determinant(0, &OPoint::<f64, U0>::origin()), 1.0);
}

#[test]
fn boundary_to_element_lands_on_face() {
    let transform = ElementTransform::<f64, Cube>::new();
    let xi = transform.boundary2element(5, &Point2::new(0.25, 0.75));
    assert_approx_matrix_eq!(xi.coords, Vector3::new(0.25, 0.75, 1.0), abstol = 1e-15);

    let transform = ElementTransform::<f64, Triangle>::new();
    let xi = transform.boundary2element(1, &Point1::new(0.25));
    assert_approx_matrix_eq!(xi.coords, Vector2::new(0.75, 0.25), abstol = 1e-15);
}

#[test]
fn degenerate_face_has_no_normal() {
    let vertices = [Point2::new(0.0, 0.0), Point2::new(0.0, 0.0), Point2::new(0.0, 1.0)];
    let transform = ElementTransform::<f64, Triangle>::from_vertices(&vertices);
    assert!(matches!(transform.boundary_normal(0), Err(Error::InvalidArgument(_))));
}
