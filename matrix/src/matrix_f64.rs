use crate::Matrix;

use nalgebra::DMatrix;
use std::ops::Mul;

impl Mul<f64> for Matrix<f64> {
    type Output = Matrix<f64>;

    fn mul(self, rhs: f64) -> Matrix<f64> {
        let mut mat = self.clone();

        for v in mat.data.iter_mut() {
            *v *= rhs;
        }

        mat
    }
}

impl Matrix<f64> {
    pub fn identity(n: usize) -> Matrix<f64> {
        let mut mat = Matrix::<f64>::new(n, n);

        for i in 0..n {
            mat[[i, i]] = 1.0;
        }

        mat
    }

    pub fn action(&self, vin: &[f64], vout: &mut [f64]) {
        vout.iter_mut().for_each(|x| *x = 0.0);

        for i in 0..self.ncol {
            for j in 0..self.nrow {
                vout[j] += self[[j, i]] * vin[i];
            }
        }
    }

    pub fn dot(&self, other: &Matrix<f64>) -> Matrix<f64> {
        assert_eq!(self.ncol, other.nrow);

        let mut mat = Matrix::<f64>::new(self.nrow, other.ncol);

        for j in 0..other.ncol {
            for i in 0..self.nrow {
                let mut sum = 0.0;

                for k in 0..self.ncol {
                    sum += self[[i, k]] * other[[k, j]];
                }

                mat[[i, j]] = sum;
            }
        }

        mat
    }

    // Frobenius norm, used as the size measure in lattice-vector reduction.
    pub fn frobenius_norm(&self) -> f64 {
        self.data.iter().map(|x| x * x).sum::<f64>().sqrt()
    }

    pub fn inv(&mut self) {
        assert_eq!(self.nrow, self.ncol, "Matrix::inv requires a square matrix");

        let mat = DMatrix::<f64>::from_column_slice(self.nrow, self.ncol, self.as_slice());

        let inv = mat
            .try_inverse()
            .expect("Matrix::inv requires a non-singular matrix");

        self.data.copy_from_slice(inv.as_slice());
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}
