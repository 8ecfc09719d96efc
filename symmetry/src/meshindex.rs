//! Grid-side symmetry tables: mesh-coordinate matrices and the equivalence
//! classes used for scalar-field symmetrization.

use fftgrid::FFTGrid;
use vector3::Vector3i32;

use crate::{mat_vec_i32, SymMat, SymmetryError};

/// Mesh-coordinate symmetry matrices, Diag(S) * m * Diag(1/S).
///
/// Every entry must be an exact integer for the matrix to act on integer
/// grid coordinates; a fractional remainder means the grid dimensions do not
/// respect the symmetry, which is a hard setup error.
pub fn mesh_matrices(sym: &[SymMat], size: [usize; 3]) -> Result<Vec<SymMat>, SymmetryError> {
    let mut sym_mesh = Vec::with_capacity(sym.len());

    for (isym, m) in sym.iter().enumerate() {
        let mut mm = [[0i32; 3]; 3];

        for i in 0..3 {
            for j in 0..3 {
                let num = size[i] as i32 * m[i][j];

                if num % size[j] as i32 != 0 {
                    return Err(SymmetryError::IncommensurateGrid {
                        isym,
                        matrix: *m,
                        size,
                    });
                }

                mm[i][j] = num / size[j] as i32;
            }
        }

        sym_mesh.push(mm);
    }

    Ok(sym_mesh)
}

/// Partitions all grid points into orbits of the mesh symmetry group.
///
/// The returned table is flat: consecutive runs of length = group order,
/// one run per orbit. A grid point whose stabilizer is nontrivial repeats
/// within its own run (one entry per group element), which keeps the run
/// length uniform and the averaging weights exact.
pub fn build_classes(sym_mesh: &[SymMat], grid: &FFTGrid) -> Vec<usize> {
    let [n1, n2, n3] = grid.get_size();

    let ntot = grid.get_ntot();

    let mut symm_index = Vec::with_capacity(ntot);
    let mut done = vec![false; ntot];

    for i3 in 0..n3 {
        for i2 in 0..n2 {
            for i1 in 0..n1 {
                let r = Vector3i32::new(i1 as i32, i2 as i32, i3 as i32);

                if done[grid.flat_index(r)] {
                    continue;
                }

                for m in sym_mesh.iter() {
                    let idx = grid.flat_index_folded(mat_vec_i32(m, r));

                    symm_index.push(idx);
                    done[idx] = true;
                }
            }
        }
    }

    symm_index
}
