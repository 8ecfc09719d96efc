//! Point-group discovery from the lattice and the atomic basis.
//!
//! Strategy:
//! 1. Reduce the lattice vectors to a minimal-norm equivalent set through
//!    integer unimodular combinations, tracking the transmission matrix.
//! 2. Enumerate integer matrices with entries in `{-1, 0, 1}` that leave the
//!    reduced metric tensor invariant; symmetry matrices of a reduced lattice
//!    have entries bounded by one, so the enumeration is exhaustive.
//! 3. Keep the matrices under which every atom of every species maps onto a
//!    same-species atom, optionally relative to a symmetry center.

use crystal::Crystal;
use lattice::Lattice;
use log::info;
use matrix::Matrix;
use vector3::*;

use crate::{
    circ_distance_squared, determinant, format_sym_mat, mat_mul, mat_vec, SymMat, SymmetryError,
    IDENTITY,
};

// Lattice basis after norm reduction, with the unimodular transmission
// matrix relating it to the original basis: R' = R * T.
pub struct ReducedLattice {
    pub latt: Matrix<f64>,
    pub transmission: SymMat,
    pub inv_transmission: SymMat,
}

impl ReducedLattice {
    pub fn is_reduced(&self) -> bool {
        self.transmission != IDENTITY
    }
}

/// Linearly combine lattice vectors until the Frobenius norm of the basis
/// matrix stops decreasing. Each accepted move adds up to one copy of each
/// of the other two vectors to the vector being reduced; the norm strictly
/// decreases and is bounded below, so the loop terminates.
pub fn reduce_lattice(latt: &Lattice, tol: f64) -> ReducedLattice {
    let mut r_reduced = latt.as_matrix().clone();
    let mut transmission = IDENTITY;
    let mut inv_transmission = IDENTITY;

    loop {
        let mut changed = false;

        for k1 in 0..3 {
            let k2 = (k1 + 1) % 3;
            let k3 = (k1 + 2) % 3;

            for i in -1..=1i32 {
                for j in -1..=1i32 {
                    let mut d = IDENTITY;
                    let mut d_inv = IDENTITY;

                    d[k2][k1] = i;
                    d[k3][k1] = j;
                    d_inv[k2][k1] = -i;
                    d_inv[k3][k1] = -j;

                    let proposed = apply_unimodular(&r_reduced, &d);

                    if proposed.frobenius_norm() < r_reduced.frobenius_norm() - tol {
                        changed = true;
                        r_reduced = proposed;
                        transmission = mat_mul(&transmission, &d);
                        inv_transmission = mat_mul(&d_inv, &inv_transmission);
                    }
                }
            }
        }

        if !changed {
            break;
        }
    }

    ReducedLattice {
        latt: r_reduced,
        transmission,
        inv_transmission,
    }
}

/// Integer matrices with entries in `{-1, 0, 1}` that leave the metric
/// tensor invariant within tolerance.
pub fn lattice_point_group(metric: &Matrix<f64>, tol: f64) -> Vec<SymMat> {
    let mut out = Vec::new();

    for code in 0..3_usize.pow(9) {
        let mut x = code;
        let mut vals = [0i32; 9];

        for v in vals.iter_mut() {
            *v = (x % 3) as i32 - 1;
            x /= 3;
        }

        let m = [
            [vals[0], vals[1], vals[2]],
            [vals[3], vals[4], vals[5]],
            [vals[6], vals[7], vals[8]],
        ];

        let det = determinant(&m);
        if det != 1 && det != -1 {
            continue;
        }

        if metric_deviation(&m, metric) < tol {
            out.push(m);
        }
    }

    out
}

/// Point group of the bravais lattice, expressed in the original basis.
pub fn lattice_symmetries(latt: &Lattice, tol: f64) -> Vec<SymMat> {
    let reduced = reduce_lattice(latt, tol);

    let metric = Lattice::from_matrix(reduced.latt.clone()).get_metric_tensor();

    let mut sym_lattice = lattice_point_group(&metric, tol);

    // If the basis was reduced, transport each matrix back: m -> T m T^-1.
    if reduced.is_reduced() {
        info!(
            "non-trivial transmission matrix {}",
            format_sym_mat(&reduced.transmission)
        );

        for m in sym_lattice.iter_mut() {
            *m = mat_mul(&mat_mul(&reduced.transmission, m), &reduced.inv_transmission);
        }
    }

    sym_lattice
}

/// Subset of the lattice point group under which every atom of every
/// species maps onto a same-species atom, relative to `offset`.
pub fn basis_reduce(
    sym_lattice: &[SymMat],
    crystal: &Crystal,
    offset: Vector3f64,
    tol: f64,
) -> Vec<SymMat> {
    let mut sym_basis = Vec::new();

    for m in sym_lattice.iter() {
        if basis_is_symmetric(m, crystal, offset, tol) {
            sym_basis.push(*m);
        }
    }

    sym_basis
}

fn basis_is_symmetric(m: &SymMat, crystal: &Crystal, offset: Vector3f64, tol: f64) -> bool {
    for isp in 0..crystal.get_n_unique_species() {
        let positions = crystal.get_atom_positions_of_specie(isp);

        for pos1 in positions.iter() {
            let mapped = offset + mat_vec(m, *pos1 - offset);

            let found = positions
                .iter()
                .any(|pos2| circ_distance_squared(mapped, *pos2) < tol);

            if !found {
                return false;
            }
        }
    }

    true
}

/// Searches candidate symmetry centers (atom positions and pairwise
/// midpoints, pooled across species) for one that admits strictly more
/// basis symmetries than the current count.
pub fn optimal_center(
    sym_lattice: &[SymMat],
    crystal: &Crystal,
    n_current: usize,
    tol: f64,
) -> Option<(Vector3f64, Vec<SymMat>)> {
    let all = crystal.get_atom_positions();

    let mut candidates = Vec::new();

    for n1 in 0..all.len() {
        candidates.push(all[n1]);

        for n2 in 0..n1 {
            candidates.push(0.5 * (all[n1] + all[n2]));
        }
    }

    let mut best: Option<(Vector3f64, Vec<SymMat>)> = None;
    let mut best_len = n_current;

    for center in candidates {
        let sym_temp = basis_reduce(sym_lattice, crystal, center, tol);

        if sym_temp.len() > best_len {
            best_len = sym_temp.len();
            best = Some((center, sym_temp));
        }
    }

    best
}

/// Full automatic discovery: lattice point group, basis reduction, canonical
/// ordering, and (optionally) the symmetry-center search. A better center is
/// reported as a fatal error with the suggested translation; atom positions
/// are never modified here.
pub fn calc_symmetries(
    crystal: &Crystal,
    tol: f64,
    optimize_center: bool,
) -> Result<Vec<SymMat>, SymmetryError> {
    info!("searching for point group symmetries");

    let sym_lattice = lattice_symmetries(crystal.get_latt(), tol);
    info!("{} symmetries of the bravais lattice", sym_lattice.len());

    let mut sym = basis_reduce(&sym_lattice, crystal, Vector3f64::zeros(), tol);
    info!("reduced to {} symmetries with basis", sym.len());

    sort_identity_first(&mut sym);

    if optimize_center {
        if let Some((center, sym_better)) = optimal_center(&sym_lattice, crystal, sym.len(), tol) {
            let positions = crystal
                .get_atom_species()
                .iter()
                .zip(crystal.get_atom_positions().iter())
                .map(|(sp, pos)| (sp.clone(), *pos - center))
                .collect();

            return Err(SymmetryError::BetterCenterFound {
                center,
                n_sym: sym.len(),
                n_sym_better: sym_better.len(),
                positions,
            });
        }
    }

    Ok(sym)
}

/// Automatic discovery without grid/k-mesh validation; used by the k-point
/// provider to fold the mesh before the full driver exists.
pub fn find_space_group(crystal: &Crystal, tol: f64) -> Vec<SymMat> {
    let sym_lattice = lattice_symmetries(crystal.get_latt(), tol);

    let mut sym = basis_reduce(&sym_lattice, crystal, Vector3f64::zeros(), tol);

    sort_identity_first(&mut sym);

    sym
}

// Canonical ordering: downstream consumers assume index 0 is the identity.
pub fn sort_identity_first(sym: &mut [SymMat]) {
    for i in 1..sym.len() {
        if sym[i] == IDENTITY {
            sym.swap(0, i);
            break;
        }
    }
}

// Frobenius norm of g - m^T g m.
fn metric_deviation(m: &SymMat, g: &Matrix<f64>) -> f64 {
    let mut sum = 0.0;

    for i in 0..3 {
        for j in 0..3 {
            let mut transformed = 0.0;

            for a in 0..3 {
                for b in 0..3 {
                    transformed += m[a][i] as f64 * g[[a, b]] * m[b][j] as f64;
                }
            }

            let d = g[[i, j]] - transformed;
            sum += d * d;
        }
    }

    sum.sqrt()
}

fn apply_unimodular(r: &Matrix<f64>, d: &SymMat) -> Matrix<f64> {
    let mut out = Matrix::<f64>::new(3, 3);

    for i in 0..3 {
        for j in 0..3 {
            let mut sum = 0.0;

            for k in 0..3 {
                sum += r[[i, k]] * d[k][j] as f64;
            }

            out[[i, j]] = sum;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SYMM_TOL;

    fn cubic_crystal(positions: Vec<Vector3f64>, species: Vec<&str>) -> Crystal {
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]);
        let n = positions.len();

        Crystal::from_parts(
            latt,
            species.into_iter().map(|s| s.to_string()).collect(),
            positions,
            vec![1.0; n],
        )
    }

    #[test]
    fn cubic_lattice_has_48_point_group_matrices() {
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]);

        let sym = lattice_symmetries(&latt, SYMM_TOL);

        assert_eq!(sym.len(), 48);
        assert!(sym.iter().any(|m| *m == IDENTITY));
    }

    #[test]
    fn tetragonal_lattice_has_16_point_group_matrices() {
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 2.0]);

        let sym = lattice_symmetries(&latt, SYMM_TOL);

        assert_eq!(sym.len(), 16);
    }

    #[test]
    fn reduction_shrinks_skewed_basis() {
        // b = (1, 1, 0) reduces to (0, 1, 0) by subtracting a.
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[1.0, 1.0, 0.0], &[0.0, 0.0, 1.0]);

        let reduced = reduce_lattice(&latt, SYMM_TOL);

        assert!(reduced.is_reduced());
        assert!(
            reduced.latt.frobenius_norm() < latt.as_matrix().frobenius_norm() - SYMM_TOL
        );
        assert_eq!(
            mat_mul(&reduced.transmission, &reduced.inv_transmission),
            IDENTITY
        );
    }

    #[test]
    fn skewed_cubic_recovers_full_point_group_in_original_basis() {
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[1.0, 1.0, 0.0], &[0.0, 0.0, 1.0]);

        let sym = lattice_symmetries(&latt, SYMM_TOL);

        assert_eq!(sym.len(), 48);

        // Transported matrices must preserve the metric of the original basis.
        let metric = latt.get_metric_tensor();
        for m in sym.iter() {
            assert!(metric_deviation(m, &metric) < SYMM_TOL);
        }
    }

    #[test]
    fn basis_reduce_keeps_full_group_for_body_centered_basis() {
        let crystal = cubic_crystal(
            vec![
                Vector3f64::new(0.0, 0.0, 0.0),
                Vector3f64::new(0.5, 0.5, 0.5),
            ],
            vec!["Fe", "Fe"],
        );

        let sym_lattice = lattice_symmetries(crystal.get_latt(), SYMM_TOL);
        let sym = basis_reduce(&sym_lattice, &crystal, Vector3f64::zeros(), SYMM_TOL);

        assert_eq!(sym.len(), 48);
    }

    #[test]
    fn basis_reduce_filters_group_for_off_center_atom() {
        let crystal = cubic_crystal(vec![Vector3f64::new(0.25, 0.0, 0.0)], vec!["H"]);

        let sym_lattice = lattice_symmetries(crystal.get_latt(), SYMM_TOL);
        let sym = basis_reduce(&sym_lattice, &crystal, Vector3f64::zeros(), SYMM_TOL);

        // Only matrices fixing the x axis pointwise survive.
        assert_eq!(sym.len(), 8);
    }

    #[test]
    fn triclinic_basis_keeps_identity_and_inversion_only() {
        let latt = Lattice::new(&[1.0, 0.0, 0.0], &[0.2, 1.1, 0.0], &[0.3, 0.4, 0.9]);
        let crystal = Crystal::from_parts(
            latt,
            vec!["H".to_string()],
            vec![Vector3f64::new(0.0, 0.0, 0.0)],
            vec![1.0],
        );

        let sym = find_space_group(&crystal, SYMM_TOL);

        // A generic lattice retains identity and inversion; the single atom
        // at the origin respects both.
        assert_eq!(sym.len(), 2);
        assert_eq!(sym[0], IDENTITY);
    }

    #[test]
    fn calc_symmetries_reports_better_center() {
        let crystal = cubic_crystal(vec![Vector3f64::new(0.25, 0.0, 0.0)], vec!["H"]);

        let err = calc_symmetries(&crystal, SYMM_TOL, true).unwrap_err();

        match err {
            SymmetryError::BetterCenterFound {
                center,
                n_sym,
                n_sym_better,
                positions,
            } => {
                assert_eq!(center, Vector3f64::new(0.25, 0.0, 0.0));
                assert_eq!(n_sym, 8);
                assert_eq!(n_sym_better, 48);
                assert_eq!(positions.len(), 1);
                assert_eq!(positions[0].1, Vector3f64::new(0.0, 0.0, 0.0));
            }
            other => panic!("expected BetterCenterFound, got {:?}", other),
        }
    }

    #[test]
    fn calc_symmetries_accepts_centered_basis_without_center_search_hit() {
        let crystal = cubic_crystal(vec![Vector3f64::new(0.0, 0.0, 0.0)], vec!["H"]);

        let sym = calc_symmetries(&crystal, SYMM_TOL, true).unwrap();

        assert_eq!(sym.len(), 48);
        assert_eq!(sym[0], IDENTITY);
    }

    #[test]
    fn sort_identity_first_moves_identity_to_front() {
        let c2z = [[-1, 0, 0], [0, -1, 0], [0, 0, 1]];
        let mut sym = vec![c2z, IDENTITY];

        sort_identity_first(&mut sym);

        assert_eq!(sym[0], IDENTITY);
        assert_eq!(sym[1], c2z);
    }
}
