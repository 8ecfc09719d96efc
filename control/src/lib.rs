use pwconsts::*;

use std::{
    fs::File,
    io::{BufRead, BufReader},
};

#[derive(Debug, Default)]
pub struct Control {
    verbosity: String,

    ecut_wfc: f64,
    ecut_rho: f64,

    kpts_scheme: String,

    symmetry: bool,

    symmetry_scheme: String, // automatic, manual, none
    symmetry_tolerance: f64,
    symmetry_print_matrices: bool,
    symmetry_move_atoms: bool,
    symmetry_backend: String, // serial, threaded
}

impl Control {
    pub fn new() -> Control {
        Control::default()
    }

    pub fn get_verbosity(&self) -> &str {
        &self.verbosity
    }

    pub fn get_ecut(&self) -> f64 {
        self.ecut_wfc
    }

    pub fn get_ecutrho(&self) -> f64 {
        self.ecut_rho
    }

    pub fn get_kpts_scheme(&self) -> &str {
        &self.kpts_scheme
    }

    pub fn get_symmetry(&self) -> bool {
        self.symmetry
    }

    pub fn get_symmetry_scheme(&self) -> &str {
        &self.symmetry_scheme
    }

    pub fn get_symmetry_tolerance(&self) -> f64 {
        self.symmetry_tolerance
    }

    pub fn get_symmetry_print_matrices(&self) -> bool {
        self.symmetry_print_matrices
    }

    pub fn get_symmetry_move_atoms(&self) -> bool {
        self.symmetry_move_atoms
    }

    pub fn get_symmetry_backend(&self) -> &str {
        &self.symmetry_backend
    }

    pub fn read_file(&mut self, inpfile: &str) {
        self.verbosity = "high".to_string();

        self.ecut_wfc = 400.0 * EV_TO_HA; // eV in in.ctrl, need to convert to Ha
        self.ecut_rho = 4.0 * self.ecut_wfc;

        self.kpts_scheme = "kmesh".to_string();

        self.symmetry = true;

        self.symmetry_scheme = "automatic".to_string();
        self.symmetry_tolerance = EPS4;
        self.symmetry_print_matrices = false;
        self.symmetry_move_atoms = false;
        self.symmetry_backend = "threaded".to_string();

        let mut b_ecut_rho_set = false;

        let lines = read_file_data_to_vec(inpfile);

        for line in lines.iter() {
            let s: Vec<&str> = line.split('=').map(|x| x.trim()).collect();

            if s.len() < 2 {
                continue;
            }

            match s[0] {
                "verbosity" => {
                    self.verbosity = s[1].parse().unwrap();
                }

                "ecut" => {
                    self.ecut_wfc = s[1].parse::<f64>().unwrap() * EV_TO_HA;
                }

                "ecut_rho" => {
                    self.ecut_rho = s[1].parse::<f64>().unwrap() * EV_TO_HA;
                    b_ecut_rho_set = true;
                }

                "kpts_scheme" => {
                    self.kpts_scheme = s[1].parse().unwrap();
                }

                "symmetry" => {
                    self.symmetry = s[1].parse().unwrap();
                }

                "symmetry_scheme" => {
                    self.symmetry_scheme = s[1].parse().unwrap();
                }

                "symmetry_tolerance" => {
                    self.symmetry_tolerance = s[1].parse().unwrap();
                }

                "symmetry_print_matrices" => {
                    self.symmetry_print_matrices = s[1].parse().unwrap();
                }

                "symmetry_move_atoms" => {
                    self.symmetry_move_atoms = s[1].parse().unwrap();
                }

                "symmetry_backend" => {
                    self.symmetry_backend = s[1].parse().unwrap();
                }

                other => {
                    panic!("unsupported in.ctrl parameter '{}'", other);
                }
            }
        }

        if !b_ecut_rho_set {
            self.ecut_rho = 4.0 * self.ecut_wfc;
        }
    }

    pub fn display(&self) {
        println!("   {:-^88}", " control parameters ");
        println!();

        println!("   verbosity               : {}", self.verbosity);
        println!("   ecut (Ha)               : {}", self.ecut_wfc);
        println!("   ecut_rho (Ha)           : {}", self.ecut_rho);
        println!("   kpts_scheme             : {}", self.kpts_scheme);
        println!("   symmetry                : {}", self.symmetry);
        println!("   symmetry_scheme         : {}", self.symmetry_scheme);
        println!("   symmetry_tolerance      : {:e}", self.symmetry_tolerance);
        println!("   symmetry_print_matrices : {}", self.symmetry_print_matrices);
        println!("   symmetry_move_atoms     : {}", self.symmetry_move_atoms);
        println!("   symmetry_backend        : {}", self.symmetry_backend);
        println!();
    }
}

fn read_file_data_to_vec(inpfile: &str) -> Vec<String> {
    // Lightweight line reader shared by the input parsers; comment lines
    // start with '#'.
    let file = File::open(inpfile).unwrap();
    let lines = BufReader::new(file).lines();

    lines
        .map_while(std::io::Result::ok)
        .filter(|line| !line.trim_start().starts_with('#'))
        .collect()
}
