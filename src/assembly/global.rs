use log::debug;
use nalgebra::{DVector, DefaultAllocator};
use nalgebra_sparse::{CsrMatrix, SparseEntryMut};
use serde::{Deserialize, Serialize};

use crate::allocators::TopologyAllocator;
use crate::assembly::{ContractChecks, ElementKernel, Equation};
use crate::element::ShapeFunction;
use crate::grid::Grid;
use crate::{Error, Real};

/// Settings controlling the behavior of the [`Assembler`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssemblerSettings {
    /// Reuse the geometric quantities of the first element for all elements of regular grids.
    pub lazy_regular_elements: bool,
    pub contract_checks: ContractChecks,
}

impl Default for AssemblerSettings {
    fn default() -> Self {
        Self {
            lazy_regular_elements: true,
            contract_checks: ContractChecks::default(),
        }
    }
}

/// Assembles global stiffness matrices and force vectors from an [`Equation`].
///
/// Contributions are *added* to the entries of the output matrix and vector, so assembling
/// twice into the same output accumulates. Use
/// [`Grid::stiffness_matrix_prototype`] and [`Grid::force_vector_prototype`] to obtain
/// zero-filled outputs. The matrix must contain every entry that assembly touches.
///
/// Entries are accumulated in a fixed order: for each element in index order, for each pair of
/// local nodes and each pair of components, the quadrature sum is formed first and then added
/// to the global entry. The boundary pass follows the interior pass. Results are therefore
/// reproducible bit for bit.
#[derive(Debug, Clone, Default)]
pub struct Assembler {
    settings: AssemblerSettings,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: AssemblerSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AssemblerSettings {
        &self.settings
    }

    /// Assembles both the stiffness matrix and the force vector in a single pass over the
    /// elements.
    ///
    /// # Errors
    ///
    /// Fails before touching the outputs if their dimensions do not match
    /// `equation.system_size() * grid.n_nodes()`, if the grid is inconsistent or if the sanity
    /// checks of the equation fail. Fails with [`Error::MissingMatrixEntry`] if the matrix lacks
    /// an entry, in which case the outputs may be partially updated.
    pub fn assemble<T, S, E>(
        &self,
        grid: &Grid<T, S>,
        equation: &E,
        stiffness_matrix: &mut CsrMatrix<T>,
        force_vector: &mut DVector<T>,
    ) -> Result<(), Error>
    where
        T: Real,
        S: ShapeFunction,
        E: ?Sized + Equation<T, S>,
        DefaultAllocator: TopologyAllocator<T, S::Topology>,
    {
        self.assemble_impl(grid, equation, Some(stiffness_matrix), Some(force_vector))
    }

    pub fn assemble_stiffness_matrix<T, S, E>(
        &self,
        grid: &Grid<T, S>,
        equation: &E,
        stiffness_matrix: &mut CsrMatrix<T>,
    ) -> Result<(), Error>
    where
        T: Real,
        S: ShapeFunction,
        E: ?Sized + Equation<T, S>,
        DefaultAllocator: TopologyAllocator<T, S::Topology>,
    {
        self.assemble_impl(grid, equation, Some(stiffness_matrix), None)
    }

    pub fn assemble_force_vector<T, S, E>(
        &self,
        grid: &Grid<T, S>,
        equation: &E,
        force_vector: &mut DVector<T>,
    ) -> Result<(), Error>
    where
        T: Real,
        S: ShapeFunction,
        E: ?Sized + Equation<T, S>,
        DefaultAllocator: TopologyAllocator<T, S::Topology>,
    {
        self.assemble_impl(grid, equation, None, Some(force_vector))
    }

    fn assemble_impl<T, S, E>(
        &self,
        grid: &Grid<T, S>,
        equation: &E,
        mut stiffness_matrix: Option<&mut CsrMatrix<T>>,
        mut force_vector: Option<&mut DVector<T>>,
    ) -> Result<(), Error>
    where
        T: Real,
        S: ShapeFunction,
        E: ?Sized + Equation<T, S>,
        DefaultAllocator: TopologyAllocator<T, S::Topology>,
    {
        let system_size = equation.system_size();
        let dim = system_size * grid.n_nodes();
        if let Some(matrix) = &stiffness_matrix {
            if matrix.nrows() != dim || matrix.ncols() != dim {
                return Err(Error::precondition(format!(
                    "stiffness matrix is {}x{}, but system has dimension {}",
                    matrix.nrows(),
                    matrix.ncols(),
                    dim
                )));
            }
        }
        if let Some(vector) = &force_vector {
            if vector.len() != dim {
                return Err(Error::precondition(format!(
                    "force vector has length {}, but system has dimension {}",
                    vector.len(),
                    dim
                )));
            }
        }
        grid.validate()
            .map_err(|err| Error::precondition(format!("inconsistent grid: {}", err)))?;

        let mut kernel = ElementKernel::new(grid)?.with_checks(self.settings.contract_checks);
        if stiffness_matrix.is_some() {
            equation
                .sanity_check_stiffness_matrix(&kernel)
                .map_err(|err| Error::precondition(format!("stiffness matrix sanity check failed: {:#}", err)))?;
        }
        if force_vector.is_some() {
            equation
                .sanity_check_force_vector(&kernel)
                .map_err(|err| Error::precondition(format!("force vector sanity check failed: {:#}", err)))?;
        }

        let lazy = self.settings.lazy_regular_elements && grid.is_regular();
        debug!(
            "Assembling {} elements and {} boundary elements (system size {}, lazy: {})",
            grid.n_elements(),
            grid.n_boundary_elements(),
            system_size,
            lazy
        );

        for element in 0..grid.n_elements() {
            if lazy && element > 0 {
                kernel.lazy_set_element(element)?;
            } else {
                kernel.set_element(element)?;
            }
            if let Some(matrix) = stiffness_matrix.as_deref_mut() {
                add_element_stiffness_matrix(matrix, equation, &kernel, system_size)?;
            }
            if let Some(vector) = force_vector.as_deref_mut() {
                add_element_force_vector(vector, equation, &kernel, system_size);
            }
        }

        let mut boundary_matrix = stiffness_matrix.filter(|_| equation.has_stiffness_matrix_at_boundary());
        let mut boundary_vector = force_vector.filter(|_| equation.has_force_vector_at_boundary());
        if boundary_matrix.is_some() || boundary_vector.is_some() {
            for index in 0..grid.n_boundary_elements() {
                kernel.set_boundary_element(index)?;
                if let Some(matrix) = boundary_matrix.as_deref_mut() {
                    add_boundary_stiffness_matrix(matrix, equation, &kernel, system_size)?;
                }
                if let Some(vector) = boundary_vector.as_deref_mut() {
                    add_boundary_force_vector(vector, equation, &kernel, system_size);
                }
            }
        } else {
            debug!("Equation has no boundary terms, skipping boundary pass");
        }

        debug!("Finished assembly");
        Ok(())
    }
}

fn add_to_entry<T: Real>(matrix: &mut CsrMatrix<T>, row: usize, col: usize, value: T) -> Result<(), Error> {
    match matrix.get_entry_mut(row, col) {
        Some(SparseEntryMut::NonZero(entry)) => {
            *entry += value;
            Ok(())
        }
        _ => Err(Error::MissingMatrixEntry { row, col }),
    }
}

fn add_element_stiffness_matrix<T, S, E>(
    matrix: &mut CsrMatrix<T>,
    equation: &E,
    kernel: &ElementKernel<'_, T, S>,
    system_size: usize,
) -> Result<(), Error>
where
    T: Real,
    S: ShapeFunction,
    E: ?Sized + Equation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    let s = system_size;
    for i in 0..S::NUM_NODES {
        let node_i = kernel.global_node(i);
        for j in 0..S::NUM_NODES {
            let node_j = kernel.global_node(j);
            for l in 0..s {
                for m in 0..s {
                    let mut entry = T::zero();
                    for k in 0..kernel.n_quadrature_points() {
                        let integrand = equation.stiffness_matrix(l, m, i, j, k, kernel);
                        entry += integrand * kernel.transform_determinant(k) * kernel.weight(k);
                    }
                    add_to_entry(matrix, s * node_i + l, s * node_j + m, entry)?;
                }
            }
        }
    }
    Ok(())
}

fn add_element_force_vector<T, S, E>(
    vector: &mut DVector<T>,
    equation: &E,
    kernel: &ElementKernel<'_, T, S>,
    system_size: usize,
) where
    T: Real,
    S: ShapeFunction,
    E: ?Sized + Equation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    let s = system_size;
    for i in 0..S::NUM_NODES {
        let node_i = kernel.global_node(i);
        for l in 0..s {
            let mut entry = T::zero();
            for k in 0..kernel.n_quadrature_points() {
                let integrand = equation.force_vector(l, i, k, kernel);
                entry += integrand * kernel.transform_determinant(k) * kernel.weight(k);
            }
            vector[s * node_i + l] += entry;
        }
    }
}

fn add_boundary_stiffness_matrix<T, S, E>(
    matrix: &mut CsrMatrix<T>,
    equation: &E,
    kernel: &ElementKernel<'_, T, S>,
    system_size: usize,
) -> Result<(), Error>
where
    T: Real,
    S: ShapeFunction,
    E: ?Sized + Equation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    let s = system_size;
    for i in 0..S::NUM_NODES {
        let node_i = kernel.boundary_global_node(i);
        for j in 0..S::NUM_NODES {
            let node_j = kernel.boundary_global_node(j);
            for l in 0..s {
                for m in 0..s {
                    let mut entry = T::zero();
                    for k in 0..kernel.n_boundary_quadrature_points() {
                        let integrand = equation.stiffness_matrix_at_boundary(l, m, i, j, k, kernel);
                        entry += integrand * kernel.boundary_transform_determinant(k) * kernel.boundary_weight(k);
                    }
                    add_to_entry(matrix, s * node_i + l, s * node_j + m, entry)?;
                }
            }
        }
    }
    Ok(())
}

fn add_boundary_force_vector<T, S, E>(
    vector: &mut DVector<T>,
    equation: &E,
    kernel: &ElementKernel<'_, T, S>,
    system_size: usize,
) where
    T: Real,
    S: ShapeFunction,
    E: ?Sized + Equation<T, S>,
    DefaultAllocator: TopologyAllocator<T, S::Topology>,
{
    let s = system_size;
    for i in 0..S::NUM_NODES {
        let node_i = kernel.boundary_global_node(i);
        for l in 0..s {
            let mut entry = T::zero();
            for k in 0..kernel.n_boundary_quadrature_points() {
                let integrand = equation.force_vector_at_boundary(l, i, k, kernel);
                entry += integrand * kernel.boundary_transform_determinant(k) * kernel.boundary_weight(k);
            }
            vector[s * node_i + l] += entry;
        }
    }
}
