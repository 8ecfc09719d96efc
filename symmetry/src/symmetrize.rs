//! Scalar-field and ionic-force symmetrizers.
//!
//! Both are pure maps over disjoint data (equivalence-class runs, atoms), so
//! they can run serially or across the rayon thread pool. The backend is a
//! runtime strategy selected by configuration; the threaded backend falls
//! back to the serial path for small fields where the fork/join overhead
//! dominates.

use rayon::prelude::*;
use vector3::Vector3f64;

use crate::{mat_tvec, SymMat};

const PARALLEL_MIN_LEN: usize = 8192;

pub trait SymmetrizeBackend: Send + Sync {
    fn get_name(&self) -> &str;
    fn symmetrize_field(&self, symm_index: &[usize], nrot: usize, field: &mut [f64]);
    fn symmetrize_forces(&self, sym: &[SymMat], atom_map: &[Vec<usize>], forces: &mut [Vector3f64]);
}

// Factory for symmetrization backends.
pub fn new_backend(scheme: &str) -> Box<dyn SymmetrizeBackend> {
    match scheme {
        "serial" => Box::new(SerialBackend),
        "threaded" => Box::new(ThreadedBackend),
        other => panic!("unsupported symmetrize backend '{}'", other),
    }
}

pub struct SerialBackend;

pub struct ThreadedBackend;

impl SymmetrizeBackend for SerialBackend {
    fn get_name(&self) -> &str {
        "serial"
    }

    fn symmetrize_field(&self, symm_index: &[usize], nrot: usize, field: &mut [f64]) {
        average_runs(symm_index, nrot, field);
    }

    fn symmetrize_forces(
        &self,
        sym: &[SymMat],
        atom_map: &[Vec<usize>],
        forces: &mut [Vector3f64],
    ) {
        let symmetrized: Vec<Vector3f64> = (0..forces.len())
            .map(|iat| symmetrized_force(sym, atom_map, forces, iat))
            .collect();

        forces.copy_from_slice(&symmetrized);
    }
}

impl SymmetrizeBackend for ThreadedBackend {
    fn get_name(&self) -> &str {
        "threaded"
    }

    fn symmetrize_field(&self, symm_index: &[usize], nrot: usize, field: &mut [f64]) {
        if field.len() < PARALLEL_MIN_LEN || rayon::current_num_threads() <= 1 {
            average_runs(symm_index, nrot, field);
            return;
        }

        // Class means are computed in parallel against a read-only view;
        // the scattered assignment stays serial because runs index the
        // field in arbitrary order.
        let means: Vec<f64> = {
            let snapshot: &[f64] = field;

            symm_index
                .par_chunks(nrot)
                .map(|run| run.iter().map(|&idx| snapshot[idx]).sum::<f64>() / nrot as f64)
                .collect()
        };

        for (run, mean) in symm_index.chunks(nrot).zip(means.iter()) {
            for &idx in run.iter() {
                field[idx] = *mean;
            }
        }
    }

    fn symmetrize_forces(
        &self,
        sym: &[SymMat],
        atom_map: &[Vec<usize>],
        forces: &mut [Vector3f64],
    ) {
        let symmetrized: Vec<Vector3f64> = {
            let snapshot: &[Vector3f64] = forces;

            (0..snapshot.len())
                .into_par_iter()
                .map(|iat| symmetrized_force(sym, atom_map, snapshot, iat))
                .collect()
        };

        forces.copy_from_slice(&symmetrized);
    }
}

fn average_runs(symm_index: &[usize], nrot: usize, field: &mut [f64]) {
    for run in symm_index.chunks(nrot) {
        let mean = run.iter().map(|&idx| field[idx]).sum::<f64>() / nrot as f64;

        for &idx in run.iter() {
            field[idx] = mean;
        }
    }
}

// Force on an atom averaged over the group: the transpose matrix transforms
// the force covector, and the atom map picks the image atom per operation.
fn symmetrized_force(
    sym: &[SymMat],
    atom_map: &[Vec<usize>],
    forces: &[Vector3f64],
    iat: usize,
) -> Vector3f64 {
    let mut acc = Vector3f64::zeros();

    for (isym, m) in sym.iter().enumerate() {
        acc += mat_tvec(m, forces[atom_map[iat][isym]]);
    }

    acc / sym.len() as f64
}
