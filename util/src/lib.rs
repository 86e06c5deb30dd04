use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CsrMatrix;

/// Poor man's approx assertion for matrices
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let x = $x;
        let y = $y;
        let diff = x.clone_owned() - y.clone_owned();

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", x);
            println!("right: {}", y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// Solves the sparse system `A x = b` with a dense LU factorization.
///
/// Only intended for the small systems that appear in tests.
pub fn solve_dense(matrix: &CsrMatrix<f64>, rhs: &DVector<f64>) -> DVector<f64> {
    DMatrix::from(matrix)
        .lu()
        .solve(rhs)
        .expect("Test system must be non-singular")
}

/// Dense copy of the given CSR matrix, with explicitly stored zeros and missing entries alike.
pub fn to_dense(matrix: &CsrMatrix<f64>) -> DMatrix<f64> {
    DMatrix::from(matrix)
}
