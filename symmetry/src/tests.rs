use super::*;

use lattice::Lattice;

fn cubic_latt() -> Lattice {
    Lattice::new(&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0])
}

fn cubic_crystal(species: Vec<&str>, positions: Vec<Vector3f64>, move_scales: Vec<f64>) -> Crystal {
    Crystal::from_parts(
        cubic_latt(),
        species.into_iter().map(|s| s.to_string()).collect(),
        positions,
        move_scales,
    )
}

fn gamma_only() -> Vec<(Vector3f64, f64)> {
    vec![(Vector3f64::zeros(), 1.0)]
}

fn serial_opts() -> SymmetryOptions {
    SymmetryOptions {
        backend: "serial".to_string(),
        ..SymmetryOptions::default()
    }
}

fn metric_invariance_deviation(m: &SymMat, latt: &Lattice) -> f64 {
    let g = latt.get_metric_tensor();

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

#[test]
fn cubic_single_atom_full_setup() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    assert_eq!(symm.get_n_sym_ops(), 48);
    assert_eq!(symm.get_matrices()[0], IDENTITY);

    // Round-trip metric invariance for every accepted matrix.
    let latt = cubic_latt();
    for m in symm.get_matrices().iter() {
        assert!(metric_invariance_deviation(m, &latt) < SYMM_TOL);
    }

    // Identity maps the atom to itself; so does every other matrix here.
    for maps in symm.get_atom_map().iter() {
        assert_eq!(maps[0], 0);
    }

    // A gamma-only mesh is invariant under the full group.
    assert_eq!(symm.get_n_kmesh_sym_ops(), 48);

    // 64 grid points grouped into runs of 48.
    assert_eq!(symm.get_symm_index().len() % 48, 0);
    assert_eq!(symm.get_n_classes(), symm.get_symm_index().len() / 48);
}

#[test]
fn symmetrized_field_is_invariant_and_idempotent() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    // A field with no symmetry at all.
    let mut field: Vec<f64> = (0..grid.get_ntot()).map(|i| (i * i % 23) as f64).collect();

    symm.symmetrize_field(&mut field);

    // The result is invariant under every mesh matrix.
    for m in symm.get_mesh_matrices().iter() {
        for i3 in 0..4 {
            for i2 in 0..4 {
                for i1 in 0..4 {
                    let r = Vector3i32::new(i1, i2, i3);
                    let mapped = grid.flat_index_folded(mat_vec_i32(m, r));

                    assert!((field[grid.flat_index(r)] - field[mapped]).abs() < 1.0e-12);
                }
            }
        }
    }

    // Re-symmetrizing is a no-op.
    let before = field.clone();
    symm.symmetrize_field(&mut field);
    assert_eq!(field, before);
}

#[test]
fn full_cubic_group_averages_single_atom_force_to_zero() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    let mut forces = vec![Vector3f64::new(0.1, -0.2, 0.3)];

    symm.symmetrize_forces(&mut forces);

    assert!(forces[0].norm2() < 1.0e-12);
}

#[test]
fn body_centered_basis_keeps_full_group_and_identity_atom_map() {
    let crystal = cubic_crystal(
        vec!["Fe", "Fe"],
        vec![
            Vector3f64::new(0.0, 0.0, 0.0),
            Vector3f64::new(0.5, 0.5, 0.5),
        ],
        vec![1.0, 1.0],
    );
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    assert_eq!(symm.get_n_sym_ops(), 48);

    // Point operations fix both sites of the body-centered basis.
    for (iat, maps) in symm.get_atom_map().iter().enumerate() {
        assert!(maps.iter().all(|&jat| jat == iat));
    }
}

#[test]
fn incommensurate_grid_is_a_setup_error() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 5);

    let err = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap_err();

    match err {
        SymmetryError::IncommensurateGrid { size, .. } => assert_eq!(size, [4, 4, 5]),
        other => panic!("expected IncommensurateGrid, got {:?}", other),
    }

    // The message names the grid so the user can fix the input.
    let msg = format!("{}", err);
    assert!(msg.contains("4 x 4 x 5"));
}

#[test]
fn manual_mode_requires_matrices() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let err = Symmetries::setup(
        SymmetryMode::Manual(Vec::new()),
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap_err();

    assert_eq!(err, SymmetryError::NoManualMatrices);
}

#[test]
fn manual_mode_checks_matrices_against_basis() {
    let c4z = [[0, -1, 0], [1, 0, 0], [0, 0, 1]];

    let crystal = cubic_crystal(vec!["H"], vec![Vector3f64::new(0.25, 0.0, 0.0)], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let err = Symmetries::setup(
        SymmetryMode::Manual(vec![c4z]),
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap_err();

    assert_eq!(err, SymmetryError::ManualSymmetryMismatch { isym: 0 });
}

#[test]
fn manual_mode_sorts_identity_first_and_maps_atom_pair() {
    let inversion = [[-1, 0, 0], [0, -1, 0], [0, 0, -1]];

    let crystal = cubic_crystal(
        vec!["H", "H"],
        vec![
            Vector3f64::new(0.25, 0.25, 0.25),
            Vector3f64::new(0.75, 0.75, 0.75),
        ],
        vec![1.0, 1.0],
    );
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::Manual(vec![inversion, IDENTITY]),
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    assert_eq!(symm.get_n_sym_ops(), 2);
    assert_eq!(symm.get_matrices()[0], IDENTITY);
    assert_eq!(symm.get_matrices()[1], inversion);

    // Inversion exchanges the two atoms.
    assert_eq!(symm.get_atom_map()[0], vec![0, 1]);
    assert_eq!(symm.get_atom_map()[1], vec![1, 0]);

    // k and -k are equivalent under this group.
    assert!(symm.kpoints_equivalent(
        Vector3f64::new(0.1, 0.2, 0.3),
        Vector3f64::new(-0.1, -0.2, -0.3)
    ));
}

#[test]
fn none_mode_is_identity_only_and_never_folds_kpoints() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let symm = Symmetries::setup(
        SymmetryMode::None,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    assert_eq!(symm.get_n_sym_ops(), 1);
    assert_eq!(symm.get_matrices()[0], IDENTITY);

    // Even an identical pair does not count as equivalent with symmetry off.
    let k = Vector3f64::new(0.25, 0.0, 0.0);
    assert!(!symm.kpoints_equivalent(k, k));

    // Symmetrization is a no-op.
    let mut field: Vec<f64> = (0..grid.get_ntot()).map(|i| i as f64).collect();
    let before = field.clone();
    symm.symmetrize_field(&mut field);
    assert_eq!(field, before);
}

#[test]
fn move_scale_mismatch_is_detected() {
    let crystal = cubic_crystal(
        vec!["H", "H"],
        vec![
            Vector3f64::new(0.25, 0.0, 0.0),
            Vector3f64::new(0.75, 0.0, 0.0),
        ],
        vec![1.0, 0.5],
    );
    let grid = FFTGrid::from_size(4, 4, 4);

    let err = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap_err();

    match err {
        SymmetryError::MoveScaleMismatch { scale1, scale2, .. } => {
            assert!(scale1 != scale2);
        }
        other => panic!("expected MoveScaleMismatch, got {:?}", other),
    }
}

#[test]
fn asymmetric_kmesh_yields_subgroup() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    // A single off-center k-point; only matrices whose transpose fixes it
    // survive the k-mesh check.
    let kpts = vec![(Vector3f64::new(0.25, 0.0, 0.0), 1.0)];

    let symm = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &kpts,
        &serial_opts(),
    )
    .unwrap();

    // The run proceeds with the full group; the subgroup size is recorded.
    assert_eq!(symm.get_n_sym_ops(), 48);
    assert_eq!(symm.get_n_kmesh_sym_ops(), 8);
}

#[test]
fn factory_returns_working_driver() {
    let crystal = cubic_crystal(vec!["Cu"], vec![Vector3f64::zeros()], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let symdrv = new(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &serial_opts(),
    )
    .unwrap();

    assert_eq!(symdrv.get_n_sym_ops(), 48);
    assert_eq!(symdrv.get_matrices().len(), symdrv.get_mesh_matrices().len());
}

#[test]
fn better_center_aborts_setup_with_diagnostic() {
    let crystal = cubic_crystal(vec!["H"], vec![Vector3f64::new(0.25, 0.0, 0.0)], vec![1.0]);
    let grid = FFTGrid::from_size(4, 4, 4);

    let opts = SymmetryOptions {
        optimize_center: true,
        backend: "serial".to_string(),
        ..SymmetryOptions::default()
    };

    let err = Symmetries::setup(
        SymmetryMode::Automatic,
        &crystal,
        &grid,
        &gamma_only(),
        &opts,
    )
    .unwrap_err();

    match &err {
        SymmetryError::BetterCenterFound {
            n_sym,
            n_sym_better,
            ..
        } => {
            assert_eq!(*n_sym, 8);
            assert_eq!(*n_sym_better, 48);
        }
        other => panic!("expected BetterCenterFound, got {:?}", other),
    }

    let msg = format!("{}", err);
    assert!(msg.contains("increase the symmetry count from 8 to 48"));
}

#[test]
fn circ_distance_uses_minimum_image() {
    let a = Vector3f64::new(0.95, 0.0, 0.0);
    let b = Vector3f64::new(0.05, 0.0, 0.0);

    assert!(circ_distance_squared(a, b) < 0.011);
    assert!((circ_distance_squared(a, b) - 0.01).abs() < 1.0e-12);
}

#[test]
fn mat_tvec_is_transpose_action() {
    let c4z = [[0, -1, 0], [1, 0, 0], [0, 0, 1]];
    let v = Vector3f64::new(1.0, 2.0, 3.0);

    assert_eq!(mat_vec(&c4z, v), Vector3f64::new(-2.0, 1.0, 3.0));
    assert_eq!(mat_tvec(&c4z, v), Vector3f64::new(2.0, -1.0, 3.0));
}
