//! Construction of triangle grids from external triangulators.
//!
//! Quality triangulation of planar domains is delegated to implementors of [`Triangulator`].
//! This module only converts their output into a [`Grid`] with correctly oriented boundary
//! elements.
use log::{debug, warn};
use nalgebra::Point2;
use std::collections::HashMap;

use crate::element::{LinearTriangle, Topology, Triangle};
use crate::grid::Grid;
use crate::{Error, Real};

/// A planar straight-line graph describing the domain to triangulate.
///
/// Segments are pairs of indices into `points` and must enclose the domain.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanarStraightLineGraph<T: Real> {
    pub points: Vec<Point2<T>>,
    pub segments: Vec<[usize; 2]>,
}

impl<T: Real> PlanarStraightLineGraph<T> {
    /// A closed polygon through the given points, in order.
    pub fn polygon(points: Vec<Point2<T>>) -> Self {
        let n = points.len();
        let segments = (0..n).map(|i| [i, (i + 1) % n]).collect();
        Self { points, segments }
    }
}

/// The output of a [`Triangulator`].
#[derive(Debug, Clone, PartialEq)]
pub struct Triangulation<T: Real> {
    pub points: Vec<Point2<T>>,
    pub triangles: Vec<[usize; 3]>,
    /// Edges of triangles that lie on the boundary of the domain. May be empty if the
    /// triangulator does not report them.
    pub boundary_edges: Vec<[usize; 2]>,
}

/// An external mesh generator for planar domains.
pub trait Triangulator<T: Real> {
    /// Triangulates the domain such that no triangle has an area larger than `max_area`.
    fn triangulate(&self, domain: &PlanarStraightLineGraph<T>, max_area: T) -> eyre::Result<Triangulation<T>>;
}

impl<T: Real, X: ?Sized + Triangulator<T>> Triangulator<T> for &X {
    fn triangulate(&self, domain: &PlanarStraightLineGraph<T>, max_area: T) -> eyre::Result<Triangulation<T>> {
        X::triangulate(self, domain, max_area)
    }
}

fn edge_key(a: usize, b: usize) -> (usize, usize) {
    (a.min(b), a.max(b))
}

/// Triangulates the domain and builds a grid of linear triangles with one node per vertex.
///
/// Boundary edges reported by the triangulator become the boundary elements of the grid, in
/// the order they are reported. If none are reported, the boundary is detected from faces that
/// belong to a single triangle.
///
/// # Errors
///
/// Returns [`Error::Triangulation`] if the triangulator fails, and [`Error::InvalidArgument`] if
/// its output refers to missing points or reports a boundary edge that is not an edge of any
/// triangle.
pub fn triangulated_grid<T, X>(
    triangulator: &X,
    domain: &PlanarStraightLineGraph<T>,
    max_area: T,
) -> Result<Grid<T, LinearTriangle>, Error>
where
    T: Real,
    X: ?Sized + Triangulator<T>,
{
    let triangulation = triangulator
        .triangulate(domain, max_area)
        .map_err(|report| Error::Triangulation(report.into()))?;
    let Triangulation {
        points,
        triangles,
        boundary_edges,
    } = triangulation;

    let n_points = points.len();
    if let Some(triangle) = triangles.iter().find(|t| t.iter().any(|&v| v >= n_points)) {
        return Err(Error::invalid_argument(format!(
            "triangle {:?} refers to missing points (triangulation has {} points)",
            triangle, n_points
        )));
    }

    let mut grid = Grid::new();
    grid.set_dimensions(n_points, triangles.len(), boundary_edges.len(), n_points);
    for (i, point) in points.into_iter().enumerate() {
        grid.set_vertex(i, point);
    }
    for (e, triangle) in triangles.iter().enumerate() {
        grid.set_element_vertices(e, triangle);
        grid.set_element_nodes(e, triangle);
    }

    if boundary_edges.is_empty() {
        warn!("Triangulator reported no boundary edges, detecting boundary from connectivity");
        grid.assign_detected_boundary()?;
    } else {
        let mut edge_owners = HashMap::new();
        for (e, triangle) in triangles.iter().enumerate() {
            for face in 0..Triangle::NUM_FACES {
                let a = triangle[Triangle::face_vertex(face, 0)];
                let b = triangle[Triangle::face_vertex(face, 1)];
                edge_owners.entry(edge_key(a, b)).or_insert((e, face));
            }
        }
        for (index, &[a, b]) in boundary_edges.iter().enumerate() {
            let &(element, face) = edge_owners.get(&edge_key(a, b)).ok_or_else(|| {
                Error::invalid_argument(format!("boundary edge ({}, {}) is not an edge of any triangle", a, b))
            })?;
            grid.set_boundary_element(index, element, face)?;
        }
    }

    debug!(
        "Built grid with {} triangles and {} boundary elements from triangulation",
        grid.n_elements(),
        grid.n_boundary_elements()
    );
    Ok(grid)
}
