use fegrid::grid::triangulation::{triangulated_grid, PlanarStraightLineGraph, Triangulation, Triangulator};
use fegrid::nalgebra::Point2;
use fegrid::Error;
use std::error::Error as StdError;

/// Splits a convex polygon into a fan of triangles around its first point.
struct FanTriangulator {
    report_boundary: bool,
}

impl Triangulator<f64> for FanTriangulator {
    fn triangulate(&self, domain: &PlanarStraightLineGraph<f64>, _max_area: f64) -> eyre::Result<Triangulation<f64>> {
        eyre::ensure!(domain.points.len() >= 3, "domain must have at least three points");
        let n = domain.points.len();
        let triangles = (1..n - 1).map(|i| [0, i, i + 1]).collect();
        let boundary_edges = if self.report_boundary {
            domain.segments.clone()
        } else {
            Vec::new()
        };
        Ok(Triangulation {
            points: domain.points.clone(),
            triangles,
            boundary_edges,
        })
    }
}

fn unit_square() -> PlanarStraightLineGraph<f64> {
    PlanarStraightLineGraph::polygon(vec![
        Point2::new(0.0, 0.0),
        Point2::new(1.0, 0.0),
        Point2::new(1.0, 1.0),
        Point2::new(0.0, 1.0),
    ])
}

#[test]
fn polygon_closes_segments() {
    let domain = unit_square();
    assert_eq!(domain.segments, vec![[0, 1], [1, 2], [2, 3], [3, 0]]);
}

#[test]
fn reported_boundary_edges_become_boundary_elements_in_order() {
    let triangulator = FanTriangulator { report_boundary: true };
    let grid = triangulated_grid(&triangulator, &unit_square(), 0.5).unwrap();
    assert_eq!((grid.n_vertices(), grid.n_elements(), grid.n_nodes()), (4, 2, 4));
    assert_eq!(grid.n_boundary_elements(), 4);
    assert!(grid.validate().is_ok());

    // Edge [3, 0] is face 2 of triangle [0, 2, 3]
    let last = grid.boundary_element(3).unwrap();
    assert_eq!((last.parent_element(), last.parent_face()), (1, 2));
    assert_eq!(last.normal(), &fegrid::nalgebra::Vector2::new(-1.0, 0.0));
}

#[test]
fn boundary_is_detected_when_not_reported() {
    let triangulator = FanTriangulator { report_boundary: false };
    let grid = triangulated_grid(&triangulator, &unit_square(), 0.5).unwrap();
    assert_eq!(grid.n_boundary_elements(), 4);
    assert_eq!(grid.boundary_nodes().collect::<Vec<_>>(), vec![0, 1, 2, 3]);
}

#[test]
fn triangulator_failure_is_wrapped() {
    let triangulator = FanTriangulator { report_boundary: true };
    let domain = PlanarStraightLineGraph {
        points: vec![Point2::new(0.0, 0.0), Point2::new(1.0, 0.0)],
        segments: vec![[0, 1]],
    };
    let error = triangulated_grid(&triangulator, &domain, 0.5).unwrap_err();
    assert!(matches!(error, Error::Triangulation(_)));
    assert!(error.source().is_some());
    assert!(error.to_string().contains("at least three points"));
}

#[test]
fn orphan_boundary_edge_is_rejected() {
    let triangulator = FanTriangulator { report_boundary: true };
    let mut domain = unit_square();
    // The diagonal [1, 3] is not an edge of the fan around point 0
    domain.segments.push([1, 3]);
    let result = triangulated_grid(&triangulator, &domain, 0.5);
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}
