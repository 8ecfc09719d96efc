//! Crystal symmetry engine.
//!
//! The driver discovers (or validates) the set of integer point-group
//! matrices compatible with the lattice and the atomic basis, derives the
//! mesh-coordinate matrices for the real-space FFT grid, maps atoms onto
//! their symmetry images, and partitions the grid into equivalence classes.
//! Everything is computed once at setup and held immutably afterwards; the
//! symmetrizers only read the cached tables.

use crystal::Crystal;
use fftgrid::FFTGrid;
use log::warn;
use pwconsts::*;
use vector3::*;

use std::error::Error;
use std::fmt;

pub mod search;
pub use search::*;

mod meshindex;
pub use meshindex::*;

mod symmetrize;
pub use symmetrize::*;

/// Integer 3x3 symmetry matrix acting on lattice-coordinate column vectors.
pub type SymMat = [[i32; 3]; 3];

pub const IDENTITY: SymMat = [[1, 0, 0], [0, 1, 0], [0, 0, 1]];

/// Default tolerance for matrix and position matching (squared circular
/// distance in fractional coordinates).
pub const SYMM_TOL: f64 = EPS4;

/// Tolerance for k-point identification (squared circular distance) and for
/// k-point weight comparison.
pub const KPT_TOL: f64 = EPS8;

// How the symmetry set is obtained.
pub enum SymmetryMode {
    Automatic,
    Manual(Vec<SymMat>),
    None,
}

pub struct SymmetryOptions {
    pub tolerance: f64,
    pub print_matrices: bool,
    pub optimize_center: bool,
    pub backend: String,
}

impl Default for SymmetryOptions {
    fn default() -> SymmetryOptions {
        SymmetryOptions {
            tolerance: SYMM_TOL,
            print_matrices: false,
            optimize_center: false,
            backend: "threaded".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymmetryError {
    /// FFT grid dimensions do not admit an exact integer action of a
    /// symmetry matrix.
    IncommensurateGrid {
        isym: usize,
        matrix: SymMat,
        size: [usize; 3],
    },
    /// Manual mode selected without supplying any matrix.
    NoManualMatrices,
    /// A manually specified matrix does not map the atomic basis onto itself.
    ManualSymmetryMismatch { isym: usize },
    /// No same-species image found for an atom under an accepted matrix.
    AtomMapMissing {
        specie: String,
        iat: usize,
        isym: usize,
    },
    /// Two atoms related by symmetry carry different move scale factors.
    MoveScaleMismatch {
        specie: String,
        at1: usize,
        at2: usize,
        scale1: f64,
        scale2: f64,
    },
    /// A symmetry center with a larger group was found; the run must be
    /// restarted with translated atom positions.
    BetterCenterFound {
        center: Vector3f64,
        n_sym: usize,
        n_sym_better: usize,
        positions: Vec<(String, Vector3f64)>,
    },
}

impl fmt::Display for SymmetryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SymmetryError::IncommensurateGrid { isym, matrix, size } => write!(
                f,
                "FFT grid {} x {} x {} is not commensurate with symmetry matrix {} {}",
                size[0],
                size[1],
                size[2],
                isym,
                format_sym_mat(matrix)
            ),
            SymmetryError::NoManualMatrices => {
                write!(f, "manual symmetries specified without any symmetry matrix")
            }
            SymmetryError::ManualSymmetryMismatch { isym } => write!(
                f,
                "manually specified symmetry matrix {} does not agree with the atomic positions",
                isym
            ),
            SymmetryError::AtomMapMissing { specie, iat, isym } => write!(
                f,
                "specie {} atom {} has no image under symmetry matrix {}",
                specie, iat, isym
            ),
            SymmetryError::MoveScaleMismatch {
                specie,
                at1,
                at2,
                scale1,
                scale2,
            } => write!(
                f,
                "specie {} atoms {} and {} are related by symmetry but have different move scale factors {} != {}",
                specie, at1, at2, scale1, scale2
            ),
            SymmetryError::BetterCenterFound {
                center,
                n_sym,
                n_sym_better,
                positions,
            } => {
                let t = -*center;
                writeln!(
                    f,
                    "translating all atoms by [ {} {} {} ] (in lattice coordinates) will increase the symmetry count from {} to {}; translated atom positions:",
                    t.x, t.y, t.z, n_sym, n_sym_better
                )?;
                for (sp, pos) in positions.iter() {
                    writeln!(f, "   {:<4} {:16.12} {:16.12} {:16.12}", sp, pos.x, pos.y, pos.z)?;
                }
                write!(
                    f,
                    "use the suggested positions, or disable the symmetry center search"
                )
            }
        }
    }
}

impl Error for SymmetryError {}

// Symmetry driver interface.
//
// The engine is consumed through this trait so callers (k-point folding,
// density and force assembly) never depend on how the matrices were obtained.
pub trait SymmetryDriver {
    fn get_n_sym_ops(&self) -> usize;
    fn get_matrices(&self) -> &[SymMat];
    fn get_mesh_matrices(&self) -> &[SymMat];
    fn get_atom_map(&self) -> &[Vec<usize>];
    fn kpoints_equivalent(&self, k1: Vector3f64, k2: Vector3f64) -> bool;
    fn symmetrize_field(&self, field: &mut [f64]);
    fn symmetrize_forces(&self, forces: &mut [Vector3f64]);
    fn display(&self);
    fn display_brief(&self);
}

pub struct Symmetries {
    sym: Vec<SymMat>,
    sym_mesh: Vec<SymMat>,
    atom_map: Vec<Vec<usize>>,
    symm_index: Vec<usize>,
    grid_size: [usize; 3],
    ntot: usize,
    natoms: usize,
    n_kmesh_sym: usize,
    mode_none: bool,
    print_matrices: bool,
    backend: Box<dyn SymmetrizeBackend>,
}

impl std::fmt::Debug for Symmetries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Symmetries")
            .field("sym", &self.sym)
            .field("sym_mesh", &self.sym_mesh)
            .field("atom_map", &self.atom_map)
            .field("symm_index", &self.symm_index)
            .field("grid_size", &self.grid_size)
            .field("ntot", &self.ntot)
            .field("natoms", &self.natoms)
            .field("n_kmesh_sym", &self.n_kmesh_sym)
            .field("mode_none", &self.mode_none)
            .field("print_matrices", &self.print_matrices)
            .finish_non_exhaustive()
    }
}

impl Symmetries {
    pub fn setup(
        mode: SymmetryMode,
        crystal: &Crystal,
        grid: &FFTGrid,
        kpts: &[(Vector3f64, f64)],
        opts: &SymmetryOptions,
    ) -> Result<Symmetries, SymmetryError> {
        let tol = opts.tolerance;

        let mut mode_none = false;

        let sym = match mode {
            SymmetryMode::Automatic => calc_symmetries(crystal, tol, opts.optimize_center)?,

            SymmetryMode::Manual(matrices) => {
                if matrices.is_empty() {
                    return Err(SymmetryError::NoManualMatrices);
                }

                let mut sym = matrices;
                sort_identity_first(&mut sym);
                check_manual_symmetries(&sym, crystal, tol)?;

                sym
            }

            SymmetryMode::None => {
                mode_none = true;

                vec![IDENTITY]
            }
        };

        // All consistency checks run here, before any expensive part of the
        // calculation has started.
        let sym_mesh = mesh_matrices(&sym, grid.get_size())?;

        let sym_kmesh = check_kmesh(&sym, kpts);
        if sym_kmesh.len() < sym.len() {
            warn!(
                "k-mesh symmetries are a subgroup of size {} (basis symmetry count is {}); \
                 the effectively sampled k-mesh is a superset of the specified one, and the \
                 answers need not match those with symmetries turned off",
                sym_kmesh.len(),
                sym.len()
            );
        }

        let atom_map = init_atom_maps(&sym, crystal, tol)?;

        let symm_index = if sym.len() > 1 {
            build_classes(&sym_mesh, grid)
        } else {
            Vec::new()
        };

        Ok(Symmetries {
            n_kmesh_sym: sym_kmesh.len(),
            sym,
            sym_mesh,
            atom_map,
            symm_index,
            grid_size: grid.get_size(),
            ntot: grid.get_ntot(),
            natoms: crystal.get_n_atoms(),
            mode_none,
            print_matrices: opts.print_matrices,
            backend: new_backend(&opts.backend),
        })
    }

    pub fn get_n_kmesh_sym_ops(&self) -> usize {
        self.n_kmesh_sym
    }

    pub fn get_symm_index(&self) -> &[usize] {
        &self.symm_index
    }

    pub fn get_n_classes(&self) -> usize {
        if self.sym.len() > 1 {
            self.symm_index.len() / self.sym.len()
        } else {
            0
        }
    }
}

impl SymmetryDriver for Symmetries {
    fn get_n_sym_ops(&self) -> usize {
        self.sym.len()
    }

    fn get_matrices(&self) -> &[SymMat] {
        &self.sym
    }

    fn get_mesh_matrices(&self) -> &[SymMat] {
        &self.sym_mesh
    }

    fn get_atom_map(&self) -> &[Vec<usize>] {
        &self.atom_map
    }

    fn kpoints_equivalent(&self, k1: Vector3f64, k2: Vector3f64) -> bool {
        if self.mode_none {
            return false;
        }

        self.sym
            .iter()
            .any(|m| circ_distance_squared(mat_tvec(m, k1), k2) < KPT_TOL)
    }

    fn symmetrize_field(&self, field: &mut [f64]) {
        if self.sym.len() <= 1 {
            return;
        }

        assert_eq!(field.len(), self.ntot);

        self.backend
            .symmetrize_field(&self.symm_index, self.sym.len(), field);
    }

    fn symmetrize_forces(&self, forces: &mut [Vector3f64]) {
        if self.sym.len() <= 1 {
            return;
        }

        assert_eq!(forces.len(), self.natoms);

        self.backend
            .symmetrize_forces(&self.sym, &self.atom_map, forces);
    }

    fn display(&self) {
        println!();
        println!("   {:-^88}", " symmetry ");
        println!();
        println!("   n_sym_ops       : {}", self.sym.len());
        println!("   n_kmesh_sym_ops : {}", self.n_kmesh_sym);
        println!(
            "   fft_grid        : {} x {} x {}",
            self.grid_size[0], self.grid_size[1], self.grid_size[2]
        );
        println!("   n_classes       : {}", self.get_n_classes());
        println!("   backend         : {}", self.backend.get_name());

        if self.print_matrices {
            println!();
            for (isym, m) in self.sym.iter().enumerate() {
                println!(
                    "   symmetry matrix {:3} : {}   mesh : {}",
                    isym,
                    format_sym_mat(m),
                    format_sym_mat(&self.sym_mesh[isym])
                );
            }

            println!();
            println!("   mapping of atoms according to symmetries:");
            for (iat, maps) in self.atom_map.iter().enumerate() {
                println!("   atom {:3} : {:?}", iat, maps);
            }
        }
    }

    fn display_brief(&self) {
        println!();
        println!("   n_sym_ops       : {}", self.sym.len());
        println!("   n_kmesh_sym_ops : {}", self.n_kmesh_sym);
    }
}

// Factory entry point; this is the setup() surface used by drivers.
pub fn new(
    mode: SymmetryMode,
    crystal: &Crystal,
    grid: &FFTGrid,
    kpts: &[(Vector3f64, f64)],
    opts: &SymmetryOptions,
) -> Result<Box<dyn SymmetryDriver>, SymmetryError> {
    let symm = Symmetries::setup(mode, crystal, grid, kpts, opts)?;

    Ok(Box::new(symm))
}

/// Subgroup of matrices under which the sampled k-point set (including
/// weights) maps onto itself.
pub fn check_kmesh(sym: &[SymMat], kpts: &[(Vector3f64, f64)]) -> Vec<SymMat> {
    let mut sym_kmesh = Vec::new();

    for m in sym.iter() {
        let symmetric = kpts.iter().all(|(k1, w1)| {
            kpts.iter().any(|(k2, w2)| {
                circ_distance_squared(mat_tvec(m, *k1), *k2) < KPT_TOL && (w1 - w2).abs() < KPT_TOL
            })
        });

        if symmetric {
            sym_kmesh.push(*m);
        }
    }

    sym_kmesh
}

/// Verifies that manually supplied matrices map the atomic basis onto itself.
pub fn check_manual_symmetries(
    sym: &[SymMat],
    crystal: &Crystal,
    tol: f64,
) -> Result<(), SymmetryError> {
    for (isym, m) in sym.iter().enumerate() {
        for isp in 0..crystal.get_n_unique_species() {
            let positions = crystal.get_atom_positions_of_specie(isp);

            for pos1 in positions.iter() {
                let mapped = mat_vec(m, *pos1);

                let found = positions
                    .iter()
                    .any(|pos2| circ_distance_squared(mapped, *pos2) < tol);

                if !found {
                    return Err(SymmetryError::ManualSymmetryMismatch { isym });
                }
            }
        }
    }

    Ok(())
}

/// For every atom and every matrix, the index of the same-species atom it
/// maps onto. Atoms related by a symmetry must carry equal move scales.
pub fn init_atom_maps(
    sym: &[SymMat],
    crystal: &Crystal,
    tol: f64,
) -> Result<Vec<Vec<usize>>, SymmetryError> {
    let natoms = crystal.get_n_atoms();
    let positions = crystal.get_atom_positions();
    let species = crystal.get_atom_species();
    let move_scales = crystal.get_atom_move_scales();
    let types = crystal.get_atom_types();

    let mut atom_map = vec![vec![0usize; sym.len()]; natoms];

    for iat in 0..natoms {
        for (isym, m) in sym.iter().enumerate() {
            let mapped = mat_vec(m, positions[iat]);

            let mut found = None;

            for jat in 0..natoms {
                if types[jat] != types[iat] {
                    continue;
                }

                if circ_distance_squared(mapped, positions[jat]) < tol {
                    found = Some(jat);
                    break;
                }
            }

            let jat = match found {
                Some(jat) => jat,
                None => {
                    return Err(SymmetryError::AtomMapMissing {
                        specie: species[iat].clone(),
                        iat,
                        isym,
                    })
                }
            };

            if move_scales[iat] != move_scales[jat] {
                return Err(SymmetryError::MoveScaleMismatch {
                    specie: species[iat].clone(),
                    at1: iat,
                    at2: jat,
                    scale1: move_scales[iat],
                    scale2: move_scales[jat],
                });
            }

            atom_map[iat][isym] = jat;
        }
    }

    Ok(atom_map)
}

///////////////////////////////////////////////////
// integer matrix algebra and circular distances

pub fn mat_vec(m: &SymMat, v: Vector3f64) -> Vector3f64 {
    Vector3f64 {
        x: m[0][0] as f64 * v.x + m[0][1] as f64 * v.y + m[0][2] as f64 * v.z,
        y: m[1][0] as f64 * v.x + m[1][1] as f64 * v.y + m[1][2] as f64 * v.z,
        z: m[2][0] as f64 * v.x + m[2][1] as f64 * v.y + m[2][2] as f64 * v.z,
    }
}

// Transpose action; transforms k-vectors and force covectors.
pub fn mat_tvec(m: &SymMat, v: Vector3f64) -> Vector3f64 {
    Vector3f64 {
        x: m[0][0] as f64 * v.x + m[1][0] as f64 * v.y + m[2][0] as f64 * v.z,
        y: m[0][1] as f64 * v.x + m[1][1] as f64 * v.y + m[2][1] as f64 * v.z,
        z: m[0][2] as f64 * v.x + m[1][2] as f64 * v.y + m[2][2] as f64 * v.z,
    }
}

pub fn mat_vec_i32(m: &SymMat, v: Vector3i32) -> Vector3i32 {
    Vector3i32 {
        x: m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
        y: m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
        z: m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
    }
}

pub fn mat_mul(a: &SymMat, b: &SymMat) -> SymMat {
    let mut out = [[0i32; 3]; 3];

    for i in 0..3 {
        for j in 0..3 {
            out[i][j] = a[i][0] * b[0][j] + a[i][1] * b[1][j] + a[i][2] * b[2][j];
        }
    }

    out
}

pub fn determinant(m: &SymMat) -> i32 {
    m[0][0] * (m[1][1] * m[2][2] - m[1][2] * m[2][1])
        - m[0][1] * (m[1][0] * m[2][2] - m[1][2] * m[2][0])
        + m[0][2] * (m[1][0] * m[2][1] - m[1][1] * m[2][0])
}

/// Squared distance between fractional coordinates under the minimum-image
/// convention.
pub fn circ_distance_squared(a: Vector3f64, b: Vector3f64) -> f64 {
    let dx = wrap_centered(a.x - b.x);
    let dy = wrap_centered(a.y - b.y);
    let dz = wrap_centered(a.z - b.z);

    dx * dx + dy * dy + dz * dz
}

// Representative in [-0.5, 0.5) for nearest-image comparisons.
fn wrap_centered(x: f64) -> f64 {
    let mut wrapped = x - x.round();

    if wrapped >= 0.5 {
        wrapped -= 1.0;
    }
    if wrapped < -0.5 {
        wrapped += 1.0;
    }

    wrapped
}

pub fn format_sym_mat(m: &SymMat) -> String {
    format!(
        "[ {:2} {:2} {:2} / {:2} {:2} {:2} / {:2} {:2} {:2} ]",
        m[0][0], m[0][1], m[0][2], m[1][0], m[1][1], m[1][2], m[2][0], m[2][1], m[2][2]
    )
}

#[cfg(test)]
mod tests;
