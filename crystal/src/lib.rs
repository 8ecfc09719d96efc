use itertools::Itertools;
use lattice::Lattice;
use pwconsts::*;
use vector3::*;

use std::{
    fs::File,
    io::{BufRead, BufReader},
};

// Crystal structure container.
//
// Coordinates:
// - lattice vectors stored in Bohr
// - atomic positions stored in fractional coordinates
// - per-atom move scale factors constrain ionic relaxation; atoms related by
//   a symmetry operation must carry equal move scales
#[derive(Debug, Default, Clone)]
pub struct Crystal {
    scale_a: f64,
    scale_b: f64,
    scale_c: f64,
    latt: Lattice,
    atom_positions: Vec<Vector3f64>,
    atom_species: Vec<String>,
    atom_move_scales: Vec<f64>,
    atom_indices_by_specie: Vec<Vec<usize>>,
}

impl Crystal {
    pub fn new() -> Crystal {
        Crystal::default()
    }

    pub fn from_parts(
        latt: Lattice,
        atom_species: Vec<String>,
        atom_positions: Vec<Vector3f64>,
        atom_move_scales: Vec<f64>,
    ) -> Crystal {
        assert_eq!(atom_species.len(), atom_positions.len());
        assert_eq!(atom_species.len(), atom_move_scales.len());

        let mut crystal = Crystal {
            scale_a: 1.0,
            scale_b: 1.0,
            scale_c: 1.0,
            latt,
            atom_positions,
            atom_species,
            atom_move_scales,
            atom_indices_by_specie: Vec::new(),
        };

        crystal.build_specie_index();

        crystal
    }

    pub fn get_latt(&self) -> &Lattice {
        &self.latt
    }

    pub fn set_lattice_vectors(&mut self, latt: &Lattice) {
        self.latt = latt.clone();
    }

    pub fn get_n_atoms(&self) -> usize {
        self.atom_positions.len()
    }

    pub fn get_atom_positions(&self) -> &[Vector3f64] {
        &self.atom_positions
    }

    pub fn get_atom_species(&self) -> &[String] {
        &self.atom_species
    }

    pub fn get_atom_move_scales(&self) -> &[f64] {
        &self.atom_move_scales
    }

    pub fn get_unique_species(&self) -> Vec<String> {
        // Preserve first-occurrence order while removing duplicates.
        self.atom_species.clone().into_iter().unique().collect()
    }

    pub fn get_n_unique_species(&self) -> usize {
        self.atom_indices_by_specie.len()
    }

    pub fn get_atom_indices_of_specie(&self, isp: usize) -> &[usize] {
        &self.atom_indices_by_specie[isp]
    }

    pub fn get_atom_positions_of_specie(&self, isp: usize) -> Vec<Vector3f64> {
        // Gather atoms by specie index map.
        let atom_indices = self.get_atom_indices_of_specie(isp);

        let mut atom_positions_for_this_specie = vec![Vector3f64::zeros(); atom_indices.len()];

        for (i, idx) in atom_indices.iter().enumerate() {
            atom_positions_for_this_specie[i] = self.atom_positions[*idx];
        }

        atom_positions_for_this_specie
    }

    pub fn get_atom_types(&self) -> Vec<i32> {
        let mut types = vec![0; self.get_n_atoms()];

        for isp in 0..self.atom_indices_by_specie.len() {
            for idx in self.atom_indices_by_specie[isp].iter() {
                types[*idx] = isp as i32 + 1;
            }
        }

        types
    }

    pub fn get_atom_positions_cart(&self) -> Vec<Vector3f64> {
        // Convert all fractional atomic positions to Cartesian coordinates.
        let natoms = self.atom_positions.len();

        let mut atoms_cart = vec![Vector3f64::zeros(); natoms];

        for iat in 0..natoms {
            self.latt.frac_to_cart(
                self.atom_positions[iat].as_slice(),
                atoms_cart[iat].as_mut_slice(),
            );
        }

        atoms_cart
    }

    pub fn read_file(&mut self, inpfile: &str) {
        // Parse in.crystal with format:
        // line 1: scale_a scale_b scale_c
        // line 2-4: lattice vectors (Angstrom)
        // remaining lines: species x y z [move_scale]
        //   x y z are fractional coordinates; move_scale defaults to 1.0
        let file = File::open(inpfile).unwrap();
        let lines = BufReader::new(file).lines();

        self.atom_positions = Vec::new();
        self.atom_species = Vec::new();
        self.atom_move_scales = Vec::new();

        let mut vec_a = [0.0; 3];
        let mut vec_b = [0.0; 3];
        let mut vec_c = [0.0; 3];

        for (i, line) in lines.enumerate() {
            let s: Vec<&str> = line.as_ref().unwrap().split_whitespace().collect();

            match i {
                0 => {
                    // Independent scale factors for three lattice vectors.
                    self.scale_a = s[0].parse().unwrap();
                    self.scale_b = s[1].parse().unwrap();
                    self.scale_c = s[2].parse().unwrap();
                }

                1 => {
                    for iv in 0..3 {
                        vec_a[iv] = s[iv].parse::<f64>().unwrap() * self.scale_a * ANG_TO_BOHR;
                    }
                }

                2 => {
                    for iv in 0..3 {
                        vec_b[iv] = s[iv].parse::<f64>().unwrap() * self.scale_b * ANG_TO_BOHR;
                    }
                }

                3 => {
                    for iv in 0..3 {
                        vec_c[iv] = s[iv].parse::<f64>().unwrap() * self.scale_c * ANG_TO_BOHR;
                    }
                }

                // atoms
                _ => {
                    if s.is_empty() {
                        continue;
                    }

                    let symbol = s[0].to_string();
                    let x: f64 = s[1].parse().unwrap();
                    let y: f64 = s[2].parse().unwrap();
                    let z: f64 = s[3].parse().unwrap();

                    let move_scale: f64 = if s.len() > 4 { s[4].parse().unwrap() } else { 1.0 };

                    // Atomic position remains fractional.
                    self.atom_species.push(symbol);
                    self.atom_positions.push(Vector3f64 { x, y, z });
                    self.atom_move_scales.push(move_scale);
                }
            }

            // Keep lattice object synchronized while parsing.
            self.latt = Lattice::new(&vec_a, &vec_b, &vec_c);
        }

        self.build_specie_index();
    }

    fn build_specie_index(&mut self) {
        // Build specie -> atom-index lookup for fast grouped operations.
        let unique_species: Vec<String> = self.get_unique_species();

        let nsp = unique_species.len();

        self.atom_indices_by_specie = vec![Vec::new(); nsp];

        for (at_index, at_symbol) in self.atom_species.iter().enumerate() {
            for (isp, sp) in unique_species.iter().enumerate() {
                if *sp == *at_symbol {
                    self.atom_indices_by_specie[isp].push(at_index);
                }
            }
        }
    }

    pub fn display(&self) {
        println!("   {:-^88}", " crystal structure ");
        println!();

        println!("   lattice_vectors");
        println!();

        let vec_a = self.latt.get_vector_a();
        println!(
            "   a = {:20.12}  {:20.12}  {:20.12}",
            vec_a.x * BOHR_TO_ANG,
            vec_a.y * BOHR_TO_ANG,
            vec_a.z * BOHR_TO_ANG
        );

        let vec_b = self.latt.get_vector_b();
        println!(
            "   b = {:20.12}  {:20.12}  {:20.12}",
            vec_b.x * BOHR_TO_ANG,
            vec_b.y * BOHR_TO_ANG,
            vec_b.z * BOHR_TO_ANG
        );

        let vec_c = self.latt.get_vector_c();
        println!(
            "   c = {:20.12}  {:20.12}  {:20.12}",
            vec_c.x * BOHR_TO_ANG,
            vec_c.y * BOHR_TO_ANG,
            vec_c.z * BOHR_TO_ANG
        );

        println!();
        println!("   natoms = {}", self.get_n_atoms());
        println!("   atom_positions (fractional), move_scale");
        println!();

        for (i, atom) in self.get_atom_positions().iter().enumerate() {
            println!(
                "   {:<3} {:>4} : {:16.12}  {:16.12}  {:16.12}  {:8.3}",
                i + 1,
                self.atom_species[i],
                atom.x,
                atom.y,
                atom.z,
                self.atom_move_scales[i]
            );
        }

        println!();

        for (isp, sp) in self.get_unique_species().iter().enumerate() {
            println!(
                "   {} : {:?}",
                sp,
                self.get_atom_indices_of_specie(isp)
                    .iter()
                    .map(|x| x + 1)
                    .collect::<Vec<usize>>()
            );
        }
    }
}
