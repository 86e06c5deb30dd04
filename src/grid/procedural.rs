//! Procedural generation of grids and matching matrix prototypes.
use itertools::iproduct;
use log::debug;
use nalgebra::{DefaultAllocator, Point1, Point2, Point3, Vector2, U2, U3};
use nalgebra_sparse::pattern::SparsityPattern;
use nalgebra_sparse::CsrMatrix;
use numeric_literals::replace_float_literals;

use crate::allocators::TopologyAllocator;
use crate::element::{
    Interval, LinearCube, LinearInterval, LinearSquare, LinearTetrahedron, LinearTriangle, QuadraticInterval,
    ShapeFunction, Topology,
};
use crate::grid::Grid;
use crate::{Error, Real};

/// Local cube vertices of the six tetrahedra sharing the diagonal from vertex 0 to vertex 7.
#[rustfmt::skip]
const CUBE_TETRAHEDRA: [[usize; 4]; 6] = [
    [0, 1, 3, 7],
    [0, 1, 5, 7],
    [0, 2, 3, 7],
    [0, 2, 6, 7],
    [0, 4, 5, 7],
    [0, 4, 6, 7],
];

fn usize_to_real<T: Real>(i: usize) -> T {
    T::from_usize(i).expect("Must be able to fit usize in T")
}

fn check_image_dimensions(dims: &[usize]) -> Result<(), Error> {
    if dims.iter().any(|&n| n < 2) {
        Err(Error::precondition(format!(
            "image dimensions {:?} are not supported: at least two pixels are required along every axis",
            dims
        )))
    } else {
        Ok(())
    }
}

/// Assigns the two end points of an interval grid as its boundary elements.
fn assign_interval_boundary<T, S>(grid: &mut Grid<T, S>, n_elements: usize) -> Result<(), Error>
where
    T: Real,
    S: ShapeFunction<Topology = Interval>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    grid.set_boundary_element(0, 0, 0)?;
    grid.set_boundary_element(1, n_elements - 1, 1)
}

/// A uniform grid of `n_elements` linear elements on the interval `[a, b]`.
pub fn uniform_interval_grid<T: Real>(a: T, b: T, n_elements: usize) -> Result<Grid<T, LinearInterval>, Error> {
    if n_elements == 0 {
        return Err(Error::precondition("interval grid requires at least one element"));
    }
    let h = (b - a) / usize_to_real::<T>(n_elements);

    let mut grid = Grid::new();
    grid.set_dimensions(n_elements + 1, n_elements, 2, n_elements + 1);
    for i in 0..=n_elements {
        grid.set_vertex(i, Point1::new(a + h * usize_to_real::<T>(i)));
    }
    for e in 0..n_elements {
        grid.set_element_vertices(e, &[e, e + 1]);
        grid.set_element_nodes(e, &[e, e + 1]);
    }
    assign_interval_boundary(&mut grid, n_elements)?;
    grid.set_regular(true);
    debug!("Generated interval grid with {} elements", n_elements);
    Ok(grid)
}

/// A uniform grid of `n_elements` quadratic elements on the interval `[a, b]`.
///
/// Nodes `0..=n_elements` coincide with the vertices, followed by one node at the midpoint of
/// each element.
pub fn uniform_quadratic_interval_grid<T: Real>(
    a: T,
    b: T,
    n_elements: usize,
) -> Result<Grid<T, QuadraticInterval>, Error> {
    if n_elements == 0 {
        return Err(Error::precondition("interval grid requires at least one element"));
    }
    let h = (b - a) / usize_to_real::<T>(n_elements);
    let n_vertices = n_elements + 1;

    let mut grid = Grid::new();
    grid.set_dimensions(n_vertices, n_elements, 2, n_vertices + n_elements);
    for i in 0..n_vertices {
        grid.set_vertex(i, Point1::new(a + h * usize_to_real::<T>(i)));
    }
    for e in 0..n_elements {
        grid.set_element_vertices(e, &[e, e + 1]);
        grid.set_element_nodes(e, &[e, e + 1, n_vertices + e]);
    }
    assign_interval_boundary(&mut grid, n_elements)?;
    grid.set_regular(true);
    debug!("Generated quadratic interval grid with {} elements", n_elements);
    Ok(grid)
}

/// Places one vertex (and node) at the center of each pixel of a `width x height` image.
fn pixel_vertices<T, S>(grid: &mut Grid<T, S>, width: usize, height: usize, spacing: T)
where
    T: Real,
    S: ShapeFunction,
    S::Topology: Topology<Dim = U2>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    for (y, x) in iproduct!(0..height, 0..width) {
        let position = Point2::new(usize_to_real::<T>(x) * spacing, usize_to_real::<T>(y) * spacing);
        grid.set_vertex(width * y + x, position);
    }
}

/// A grid of unit squares connecting the pixel centers of a `width x height` image.
///
/// Pixel `(x, y)` corresponds to vertex and node `width * y + x`. The grid is regular.
pub fn pixel_grid<T: Real>(width: usize, height: usize, spacing: T) -> Result<Grid<T, LinearSquare>, Error> {
    check_image_dimensions(&[width, height])?;
    let n_pixels = width * height;
    let n_elements = (width - 1) * (height - 1);

    let mut grid = Grid::new();
    grid.set_dimensions(n_pixels, n_elements, 0, n_pixels);
    pixel_vertices(&mut grid, width, height, spacing);
    for (e, (y, x)) in iproduct!(0..height - 1, 0..width - 1).enumerate() {
        let v0 = width * y + x;
        let vertices = [v0, v0 + 1, v0 + width, v0 + width + 1];
        grid.set_element_vertices(e, &vertices);
        grid.set_element_nodes(e, &vertices);
    }
    grid.assign_detected_boundary()?;
    grid.set_regular(true);
    debug!("Generated {}x{} pixel grid", width, height);
    Ok(grid)
}

/// Like [`pixel_grid`], but each square is split into two triangles along the diagonal from its
/// lower left to its upper right corner.
///
/// The two triangles of a square are not translates of each other, so the grid is not
/// regular.
pub fn pixel_triangle_grid<T: Real>(
    width: usize,
    height: usize,
    spacing: T,
) -> Result<Grid<T, LinearTriangle>, Error> {
    check_image_dimensions(&[width, height])?;
    let n_pixels = width * height;
    let n_elements = 2 * (width - 1) * (height - 1);

    let mut grid = Grid::new();
    grid.set_dimensions(n_pixels, n_elements, 0, n_pixels);
    pixel_vertices(&mut grid, width, height, spacing);
    for (square, (y, x)) in iproduct!(0..height - 1, 0..width - 1).enumerate() {
        let v0 = width * y + x;
        let (v1, v2, v3) = (v0 + 1, v0 + width, v0 + width + 1);
        for (k, triangle) in [[v0, v1, v3], [v0, v3, v2]].iter().enumerate() {
            grid.set_element_vertices(2 * square + k, triangle);
            grid.set_element_nodes(2 * square + k, triangle);
        }
    }
    grid.assign_detected_boundary()?;
    debug!("Generated {}x{} pixel triangle grid", width, height);
    Ok(grid)
}

fn voxel_vertices<T, S>(grid: &mut Grid<T, S>, dims: [usize; 3], spacing: T)
where
    T: Real,
    S: ShapeFunction,
    S::Topology: Topology<Dim = U3>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    let [width, height, depth] = dims;
    for (z, y, x) in iproduct!(0..depth, 0..height, 0..width) {
        let position = Point3::new(
            usize_to_real::<T>(x) * spacing,
            usize_to_real::<T>(y) * spacing,
            usize_to_real::<T>(z) * spacing,
        );
        grid.set_vertex(width * (height * z + y) + x, position);
    }
}

/// Global vertices of the voxel cell with lower corner `(x, y, z)`, in cube vertex order.
fn voxel_cell_vertices(dims: [usize; 3], x: usize, y: usize, z: usize) -> [usize; 8] {
    let [width, height, _] = dims;
    let index = |dx: usize, dy: usize, dz: usize| width * (height * (z + dz) + y + dy) + x + dx;
    [
        index(0, 0, 0),
        index(1, 0, 0),
        index(0, 1, 0),
        index(1, 1, 0),
        index(0, 0, 1),
        index(1, 0, 1),
        index(0, 1, 1),
        index(1, 1, 1),
    ]
}

/// A grid of cubes connecting the voxel centers of a `width x height x depth` volume.
///
/// Voxel `(x, y, z)` corresponds to vertex and node `width * (height * z + y) + x`. The grid is
/// regular.
pub fn voxel_grid<T: Real>(
    width: usize,
    height: usize,
    depth: usize,
    spacing: T,
) -> Result<Grid<T, LinearCube>, Error> {
    check_image_dimensions(&[width, height, depth])?;
    let dims = [width, height, depth];
    let n_voxels = width * height * depth;
    let n_elements = (width - 1) * (height - 1) * (depth - 1);

    let mut grid = Grid::new();
    grid.set_dimensions(n_voxels, n_elements, 0, n_voxels);
    voxel_vertices(&mut grid, dims, spacing);
    for (e, (z, y, x)) in iproduct!(0..depth - 1, 0..height - 1, 0..width - 1).enumerate() {
        let vertices = voxel_cell_vertices(dims, x, y, z);
        grid.set_element_vertices(e, &vertices);
        grid.set_element_nodes(e, &vertices);
    }
    grid.assign_detected_boundary()?;
    grid.set_regular(true);
    debug!("Generated {}x{}x{} voxel grid", width, height, depth);
    Ok(grid)
}

/// Like [`voxel_grid`], but each cube is split into six tetrahedra sharing its main diagonal.
pub fn voxel_tetrahedron_grid<T: Real>(
    width: usize,
    height: usize,
    depth: usize,
    spacing: T,
) -> Result<Grid<T, LinearTetrahedron>, Error> {
    check_image_dimensions(&[width, height, depth])?;
    let dims = [width, height, depth];
    let n_voxels = width * height * depth;
    let n_elements = 6 * (width - 1) * (height - 1) * (depth - 1);

    let mut grid = Grid::new();
    grid.set_dimensions(n_voxels, n_elements, 0, n_voxels);
    voxel_vertices(&mut grid, dims, spacing);
    for (cell, (z, y, x)) in iproduct!(0..depth - 1, 0..height - 1, 0..width - 1).enumerate() {
        let cube = voxel_cell_vertices(dims, x, y, z);
        for (k, local) in CUBE_TETRAHEDRA.iter().enumerate() {
            let tetrahedron = local.map(|v| cube[v]);
            grid.set_element_vertices(6 * cell + k, &tetrahedron);
            grid.set_element_nodes(6 * cell + k, &tetrahedron);
        }
    }
    grid.assign_detected_boundary()?;
    debug!("Generated {}x{}x{} voxel tetrahedron grid", width, height, depth);
    Ok(grid)
}

/// A polar triangle grid of the disk with the given center and radius.
///
/// See [`ellipse_grid`].
pub fn disk_grid<T: Real>(
    center: Point2<T>,
    radius: T,
    n_rings: usize,
    n_sectors: usize,
) -> Result<Grid<T, LinearTriangle>, Error> {
    ellipse_grid(center, Vector2::new(radius, radius), n_rings, n_sectors)
}

/// A polar triangle grid of the axis-aligned ellipse with the given center and radii.
///
/// Vertex 0 is the center, followed by `n_sectors` vertices on each of `n_rings` equidistant
/// rings. The innermost ring is connected to the center by a fan of triangles, and each pair of
/// consecutive rings by a band of `2 * n_sectors` triangles.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
pub fn ellipse_grid<T: Real>(
    center: Point2<T>,
    radii: Vector2<T>,
    n_rings: usize,
    n_sectors: usize,
) -> Result<Grid<T, LinearTriangle>, Error> {
    if n_rings == 0 || n_sectors < 3 {
        return Err(Error::precondition(format!(
            "polar grid requires at least one ring and three sectors, got {} rings and {} sectors",
            n_rings, n_sectors
        )));
    }
    if radii.x <= 0.0 || radii.y <= 0.0 {
        return Err(Error::precondition("radii of polar grid must be positive"));
    }

    let n_vertices = 1 + n_rings * n_sectors;
    let n_elements = n_sectors * (2 * n_rings - 1);
    let ring_vertex = |ring: usize, sector: usize| 1 + ring * n_sectors + sector % n_sectors;

    let mut grid = Grid::new();
    grid.set_dimensions(n_vertices, n_elements, 0, n_vertices);
    grid.set_vertex(0, center);
    for (ring, sector) in iproduct!(0..n_rings, 0..n_sectors) {
        let rho: T = usize_to_real::<T>(ring + 1) / usize_to_real::<T>(n_rings);
        let theta: T = 2.0 * T::pi() * usize_to_real::<T>(sector) / usize_to_real::<T>(n_sectors);
        let position = Point2::new(
            center.x + radii.x * rho * theta.cos(),
            center.y + radii.y * rho * theta.sin(),
        );
        grid.set_vertex(ring_vertex(ring, sector), position);
    }

    let mut e = 0;
    for sector in 0..n_sectors {
        let triangle = [0, ring_vertex(0, sector), ring_vertex(0, sector + 1)];
        grid.set_element_vertices(e, &triangle);
        grid.set_element_nodes(e, &triangle);
        e += 1;
    }
    for (ring, sector) in iproduct!(0..n_rings - 1, 0..n_sectors) {
        let (a, b) = (ring_vertex(ring, sector), ring_vertex(ring, sector + 1));
        let (c, d) = (ring_vertex(ring + 1, sector), ring_vertex(ring + 1, sector + 1));
        for triangle in [[a, c, d], [a, d, b]] {
            grid.set_element_vertices(e, &triangle);
            grid.set_element_nodes(e, &triangle);
            e += 1;
        }
    }
    grid.assign_detected_boundary()?;
    debug!("Generated polar grid with {} rings and {} sectors", n_rings, n_sectors);
    Ok(grid)
}

/// Sparsity pattern of the full 3^d-point stencil on a lattice with the given dimensions.
fn stencil_pattern(dims: [usize; 3], system_size: usize) -> SparsityPattern {
    let [width, height, depth] = dims;
    let s = system_size;
    let num_rows = s * width * height * depth;
    let neighbors = |c: usize, n: usize| c.saturating_sub(1)..=usize::min(c + 1, n - 1);

    let mut offsets = Vec::with_capacity(num_rows + 1);
    let mut column_indices = Vec::new();
    offsets.push(0);
    for (z, y, x) in iproduct!(0..depth, 0..height, 0..width) {
        // Lexicographic neighbor order yields sorted column indices
        let stencil: Vec<usize> = iproduct!(neighbors(z, depth), neighbors(y, height), neighbors(x, width))
            .map(|(nz, ny, nx)| width * (height * nz + ny) + nx)
            .collect();
        for _ in 0..s {
            for &node in &stencil {
                column_indices.extend((0..s).map(|m| s * node + m));
            }
            offsets.push(column_indices.len());
        }
    }

    SparsityPattern::try_from_offsets_and_indices(num_rows, num_rows, offsets, column_indices)
        .expect("Pattern data must be valid by definition")
}

fn zero_matrix<T: Real>(pattern: SparsityPattern) -> CsrMatrix<T> {
    let nnz = pattern.nnz();
    CsrMatrix::try_from_pattern_and_values(pattern, vec![T::zero(); nnz]).expect("CSR data must be valid by definition")
}

/// A zero-filled stiffness matrix coupling every pixel to its eight neighbors.
///
/// The prototype has `(3 width - 2) (3 height - 2) system_size^2` entries and covers the
/// sparsity pattern of both [`pixel_grid`] and [`pixel_triangle_grid`].
pub fn pixel_stencil_prototype<T: Real>(
    width: usize,
    height: usize,
    system_size: usize,
) -> Result<CsrMatrix<T>, Error> {
    check_image_dimensions(&[width, height])?;
    Ok(zero_matrix(stencil_pattern([width, height, 1], system_size)))
}

/// A zero-filled stiffness matrix coupling every voxel to its 26 neighbors.
pub fn voxel_stencil_prototype<T: Real>(
    width: usize,
    height: usize,
    depth: usize,
    system_size: usize,
) -> Result<CsrMatrix<T>, Error> {
    check_image_dimensions(&[width, height, depth])?;
    Ok(zero_matrix(stencil_pattern([width, height, depth], system_size)))
}
