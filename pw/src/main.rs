#![allow(warnings)]
use control::Control;
use crystal::Crystal;
use fftgrid::FFTGrid;
use symmetry::{SymMat, SymmetryMode, SymmetryOptions};

use std::fs::File;
use std::io::{BufRead, BufReader};

fn main() {
    env_logger::init();

    let stopwatch_main = std::time::Instant::now();

    // read in control parameters

    let mut control = Control::new();
    control.read_file("in.ctrl");

    control.display();

    // read in crystal

    let mut crystal = Crystal::new();
    crystal.read_file("in.crystal");

    crystal.display();

    // read in kpts

    let kpts = kpts::new(control.get_kpts_scheme(), &crystal, control.get_symmetry());

    kpts.display();

    // FFT Grid

    let fftgrid = FFTGrid::new(crystal.get_latt(), control.get_ecutrho());

    println!();
    println!("FFTGrid : {}", fftgrid);

    // symmetry

    let mode = match control.get_symmetry_scheme() {
        "automatic" => SymmetryMode::Automatic,
        "manual" => SymmetryMode::Manual(read_symmetry_file("in.symmetry")),
        "none" => SymmetryMode::None,
        other => panic!("unsupported symmetry scheme '{}'", other),
    };

    let opts = SymmetryOptions {
        tolerance: control.get_symmetry_tolerance(),
        print_matrices: control.get_symmetry_print_matrices(),
        optimize_center: control.get_symmetry_move_atoms(),
        backend: control.get_symmetry_backend().to_string(),
    };

    let kpairs = kpts::collect_pairs(kpts.as_ref());

    let symdrv = symmetry::new(mode, &crystal, &fftgrid, &kpairs, &opts)
        .unwrap_or_else(|err| panic!("symmetry setup failed: {}", err));

    symdrv.display();

    println!();
    println!(
        "   total time : {:.2} (s)",
        stopwatch_main.elapsed().as_secs_f64()
    );
}

fn read_symmetry_file(inpfile: &str) -> Vec<SymMat> {
    // in.symmetry format: three rows of three integers per matrix, matrices
    // separated by blank lines.
    let file = File::open(inpfile).unwrap();
    let lines = BufReader::new(file).lines();

    let mut matrices = Vec::new();
    let mut rows: Vec<[i32; 3]> = Vec::new();

    for line in lines.map_while(std::io::Result::ok) {
        let s: Vec<&str> = line.split_whitespace().collect();

        if s.is_empty() {
            continue;
        }

        assert_eq!(s.len(), 3, "in.symmetry rows must hold three integers");

        rows.push([
            s[0].parse().unwrap(),
            s[1].parse().unwrap(),
            s[2].parse().unwrap(),
        ]);

        if rows.len() == 3 {
            matrices.push([rows[0], rows[1], rows[2]]);
            rows.clear();
        }
    }

    assert!(
        rows.is_empty(),
        "in.symmetry ended in the middle of a matrix"
    );

    matrices
}
