use fegrid::allocators::TopologyAllocator;
use fegrid::assembly::ElementKernel;
use fegrid::element::ShapeFunction;
use fegrid::grid::procedural::{
    disk_grid, ellipse_grid, pixel_grid, pixel_stencil_prototype, pixel_triangle_grid, uniform_interval_grid,
    uniform_quadratic_interval_grid, voxel_grid, voxel_stencil_prototype, voxel_tetrahedron_grid,
};
use fegrid::grid::Grid;
use fegrid::nalgebra::{DefaultAllocator, Point2, Vector1, Vector2};
use fegrid::nalgebra_sparse::SparseEntry;
use fegrid::Error;
use matrixcompare::assert_scalar_eq;
use std::f64::consts::PI;

/// Sum of element measures, computed by quadrature.
fn grid_measure<S>(grid: &Grid<f64, S>) -> f64
where
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<f64, S::Topology>,
{
    let mut kernel = ElementKernel::new(grid).unwrap();
    let mut measure = 0.0;
    for e in 0..grid.n_elements() {
        kernel.set_element(e).unwrap();
        for q in 0..kernel.n_quadrature_points() {
            measure += kernel.weight(q) * kernel.transform_determinant(q);
        }
    }
    measure
}

/// Sum of boundary element measures, computed by quadrature.
fn boundary_measure<S>(grid: &Grid<f64, S>) -> f64
where
    S: ShapeFunction,
    DefaultAllocator: TopologyAllocator<f64, S::Topology>,
{
    let mut kernel = ElementKernel::new(grid).unwrap();
    let mut measure = 0.0;
    for b in 0..grid.n_boundary_elements() {
        kernel.set_boundary_element(b).unwrap();
        for q in 0..kernel.n_boundary_quadrature_points() {
            measure += kernel.boundary_weight(q) * kernel.boundary_transform_determinant(q);
        }
    }
    measure
}

#[test]
fn uniform_interval_grid_has_outward_end_points() {
    let grid = uniform_interval_grid(-1.0, 1.0, 4).unwrap();
    assert_eq!((grid.n_vertices(), grid.n_elements(), grid.n_nodes()), (5, 4, 5));
    assert_eq!(grid.vertex(3).x, 0.5);
    assert_eq!(grid.element_nodes(2), &[2, 3]);
    assert!(grid.is_regular());
    assert!(grid.validate().is_ok());

    let left = grid.boundary_element(0).unwrap();
    let right = grid.boundary_element(1).unwrap();
    assert_eq!((left.parent_element(), left.parent_face()), (0, 0));
    assert_eq!((right.parent_element(), right.parent_face()), (3, 1));
    assert_eq!(left.normal(), &Vector1::new(-1.0));
    assert_eq!(right.normal(), &Vector1::new(1.0));
    assert_scalar_eq!(grid_measure(&grid), 2.0, comp = abs, tol = 1e-14);
}

#[test]
fn quadratic_interval_grid_appends_midpoint_nodes() {
    let grid = uniform_quadratic_interval_grid(0.0, 1.0, 3).unwrap();
    assert_eq!((grid.n_vertices(), grid.n_elements(), grid.n_nodes()), (4, 3, 7));
    assert_eq!(grid.element_nodes(1), &[1, 2, 5]);
    assert_eq!(grid.boundary_nodes().collect::<Vec<_>>(), vec![0, 3]);
}

#[test]
fn empty_interval_grid_is_rejected() {
    assert!(matches!(
        uniform_interval_grid(0.0, 1.0, 0),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn pixel_grid_places_one_node_per_pixel() {
    let grid = pixel_grid(4, 3, 0.5).unwrap();
    assert_eq!((grid.n_vertices(), grid.n_elements(), grid.n_nodes()), (12, 6, 12));
    assert_eq!(grid.vertex(4 * 2 + 3), &Point2::new(1.5, 1.0));
    assert_eq!(grid.element_vertices(4), &[5, 6, 9, 10]);
    assert!(grid.is_regular());
    assert!(grid.check_regularity(1e-12));
    assert_eq!(grid.n_boundary_elements(), 10);
    assert_eq!(grid.boundary_nodes().count(), 10);
    assert!(!grid.is_boundary_node(5) && !grid.is_boundary_node(6));
    assert_scalar_eq!(grid_measure(&grid), 1.5, comp = abs, tol = 1e-14);
    assert_scalar_eq!(boundary_measure(&grid), 5.0, comp = abs, tol = 1e-14);
}

#[test]
fn images_need_two_pixels_along_each_axis() {
    assert!(matches!(pixel_grid(1, 3, 1.0), Err(Error::PreconditionViolated(_))));
    assert!(matches!(pixel_triangle_grid(3, 0, 1.0), Err(Error::PreconditionViolated(_))));
    assert!(matches!(voxel_grid(2, 2, 1, 1.0), Err(Error::PreconditionViolated(_))));
    assert!(matches!(
        pixel_stencil_prototype::<f64>(1, 1, 1),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn pixel_triangle_grid_splits_squares_along_diagonal() {
    let grid = pixel_triangle_grid(3, 3, 1.0).unwrap();
    assert_eq!(grid.n_elements(), 8);
    assert_eq!(grid.element_vertices(0), &[0, 1, 4]);
    assert_eq!(grid.element_vertices(1), &[0, 4, 3]);
    assert!(!grid.is_regular());
    assert_eq!(grid.n_boundary_elements(), 8);
    assert_scalar_eq!(grid_measure(&grid), 4.0, comp = abs, tol = 1e-14);
    assert_scalar_eq!(boundary_measure(&grid), 8.0, comp = abs, tol = 1e-14);
}

#[test]
fn voxel_grids_cover_the_volume() {
    let grid = voxel_grid(3, 3, 3, 1.0).unwrap();
    assert_eq!((grid.n_vertices(), grid.n_elements()), (27, 8));
    assert!(grid.is_regular());
    assert_eq!(grid.n_boundary_elements(), 24);
    assert_eq!(grid.boundary_nodes().count(), 26);
    assert_scalar_eq!(grid_measure(&grid), 8.0, comp = abs, tol = 1e-13);
    assert_scalar_eq!(boundary_measure(&grid), 24.0, comp = abs, tol = 1e-13);

    let grid = voxel_tetrahedron_grid(3, 2, 2, 0.5).unwrap();
    assert_eq!(grid.n_elements(), 12);
    assert!(!grid.is_regular());
    // Each of the 10 exterior voxel faces is split into two triangles
    assert_eq!(grid.n_boundary_elements(), 20);
    assert_scalar_eq!(grid_measure(&grid), 0.25, comp = abs, tol = 1e-14);
    assert_scalar_eq!(boundary_measure(&grid), 2.5, comp = abs, tol = 1e-14);
}

#[test]
fn disk_grid_approximates_disk() {
    let (n_rings, n_sectors) = (3, 16);
    let center = Point2::new(1.0, -1.0);
    let grid = disk_grid(center, 2.0, n_rings, n_sectors).unwrap();
    assert_eq!(grid.n_vertices(), 1 + n_rings * n_sectors);
    assert_eq!(grid.n_elements(), n_sectors * (2 * n_rings - 1));
    assert_eq!(grid.n_boundary_elements(), n_sectors);
    assert_eq!(grid.vertex(0), &center);

    // The grid is the inscribed polygon of the disk
    let polygon_area = 0.5 * n_sectors as f64 * 4.0 * (2.0 * PI / n_sectors as f64).sin();
    assert_scalar_eq!(grid_measure(&grid), polygon_area, comp = abs, tol = 1e-12);
    for b in 0..grid.n_boundary_elements() {
        let boundary_element = grid.boundary_element(b).unwrap();
        let face_nodes = grid.face_nodes(boundary_element.parent_element(), boundary_element.parent_face());
        for node in face_nodes {
            let radius = (grid.vertex(node) - center).norm();
            assert_scalar_eq!(radius, 2.0, comp = abs, tol = 1e-12);
            assert!(boundary_element.normal().dot(&(grid.vertex(node) - center)) > 0.0);
        }
    }
}

#[test]
fn ellipse_grid_scales_axes() {
    let grid = ellipse_grid(Point2::origin(), Vector2::new(3.0, 1.0), 2, 4).unwrap();
    assert_eq!(grid.vertex(1 + 4), &Point2::new(3.0, 0.0));
    assert_scalar_eq!(grid.vertex(1 + 4 + 1).x, 0.0, comp = abs, tol = 1e-15);
    assert_scalar_eq!(grid.vertex(1 + 4 + 1).y, 1.0, comp = abs, tol = 1e-15);
    // A rhombus with diagonals 6 and 2
    assert_scalar_eq!(grid_measure(&grid), 6.0, comp = abs, tol = 1e-14);

    assert!(matches!(
        ellipse_grid(Point2::origin(), Vector2::new(3.0, 1.0), 2, 2),
        Err(Error::PreconditionViolated(_))
    ));
    assert!(matches!(
        disk_grid(Point2::origin(), -1.0, 2, 8),
        Err(Error::PreconditionViolated(_))
    ));
}

#[test]
fn pixel_stencil_prototype_has_nine_point_structure() {
    for n in 2..6 {
        let prototype = pixel_stencil_prototype::<f64>(n, n, 1).unwrap();
        assert_eq!(prototype.nrows(), n * n);
        assert_eq!(prototype.nnz(), (3 * n - 2) * (3 * n - 2));
    }

    let prototype = pixel_stencil_prototype::<f64>(4, 3, 2).unwrap();
    assert_eq!(prototype.nrows(), 24);
    assert_eq!(prototype.nnz(), 10 * 7 * 4);
    assert!(prototype.values().iter().all(|&v| v == 0.0));
    // Pixel 0 couples to pixels 0, 1, 4 and 5
    assert_eq!(prototype.row(1).col_indices(), &[0, 1, 2, 3, 8, 9, 10, 11]);
}

#[test]
fn pixel_stencil_prototype_contains_triangle_grid_pattern() {
    let n = 5;
    let grid = pixel_triangle_grid(n, n, 1.0).unwrap();
    let pattern = grid.sparsity_pattern(1);
    assert_eq!(pattern.nnz(), n * n + 2 * (2 * n * (n - 1) + (n - 1) * (n - 1)));

    let prototype = pixel_stencil_prototype::<f64>(n, n, 1).unwrap();
    for (row, lane) in (0..pattern.major_dim()).map(|i| (i, pattern.lane(i))) {
        for &col in lane {
            assert!(matches!(prototype.get_entry(row, col), Some(SparseEntry::NonZero(_))));
        }
    }
}

#[test]
fn voxel_stencil_prototype_has_twenty_seven_point_structure() {
    let prototype = voxel_stencil_prototype::<f64>(3, 4, 2, 1).unwrap();
    assert_eq!(prototype.nrows(), 24);
    assert_eq!(prototype.nnz(), 7 * 10 * 4);

    let grid = voxel_grid(3, 4, 2, 1.0).unwrap();
    assert_eq!(grid.sparsity_pattern(1), *prototype.pattern());
}
