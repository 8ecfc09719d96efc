use crystal::Crystal;
use lattice::Lattice;
use log::info;
use pwconsts::*;
use symmetry::{circ_distance_squared, find_space_group, mat_tvec, KPT_TOL};
use vector3::*;

use std::fs::File;
use std::io::BufRead;
use std::io::BufReader;

use crate::KPTS;

pub struct KptsMesh {
    k_frac: Vec<Vector3f64>,
    k_degeneracy: Vec<usize>,
    k_weight: Vec<f64>,
    k_mesh: [i32; 3],
}

impl KptsMesh {
    pub fn new(crystal: &Crystal, symmetry: bool) -> KptsMesh {
        // Read Monkhorst-Pack mesh + shift from in.kmesh.
        let (k_mesh, is_shift) = read_k_mesh();

        KptsMesh::from_mesh_parameters(crystal, k_mesh, is_shift, symmetry)
    }

    pub fn from_mesh_parameters(
        crystal: &Crystal,
        k_mesh: [i32; 3],
        is_shift: [i32; 3],
        symmetry: bool,
    ) -> KptsMesh {
        assert!(k_mesh[0] > 0 && k_mesh[1] > 0 && k_mesh[2] > 0);

        // Full Monkhorst-Pack list with uniform weights.
        let nk_total = (k_mesh[0] * k_mesh[1] * k_mesh[2]) as usize;

        let mut k_frac = Vec::with_capacity(nk_total);

        for i in 0..k_mesh[0] {
            for j in 0..k_mesh[1] {
                for k in 0..k_mesh[2] {
                    k_frac.push(Vector3f64 {
                        x: (2 * i + is_shift[0]) as f64 / (2 * k_mesh[0]) as f64,
                        y: (2 * j + is_shift[1]) as f64 / (2 * k_mesh[1]) as f64,
                        z: (2 * k + is_shift[2]) as f64 / (2 * k_mesh[2]) as f64,
                    });
                }
            }
        }

        let uniform_weight = 1.0 / nk_total as f64;

        let mut mesh = KptsMesh {
            k_frac,
            k_degeneracy: vec![1; nk_total],
            k_weight: vec![uniform_weight; nk_total],
            k_mesh,
        };

        if symmetry {
            mesh.fold_by_symmetry(crystal);
        }

        mesh
    }

    // Fold symmetry-equivalent k-points onto one representative each,
    // accumulating weights. The representative keeps the full-mesh weight
    // total so the weights still sum to one.
    fn fold_by_symmetry(&mut self, crystal: &Crystal) {
        let sym = find_space_group(crystal, EPS4);

        if sym.len() <= 1 {
            return;
        }

        let mut folded_frac: Vec<Vector3f64> = Vec::new();
        let mut folded_weight: Vec<f64> = Vec::new();
        let mut folded_degeneracy: Vec<usize> = Vec::new();

        for (ik, k) in self.k_frac.iter().enumerate() {
            let representative = folded_frac.iter().position(|rep| {
                sym.iter()
                    .any(|m| circ_distance_squared(mat_tvec(m, *k), *rep) < KPT_TOL)
            });

            match representative {
                Some(irep) => {
                    folded_weight[irep] += self.k_weight[ik];
                    folded_degeneracy[irep] += 1;
                }
                None => {
                    folded_frac.push(*k);
                    folded_weight.push(self.k_weight[ik]);
                    folded_degeneracy.push(1);
                }
            }
        }

        info!(
            "k-mesh folded by symmetry: {} -> {} points",
            self.k_frac.len(),
            folded_frac.len()
        );

        self.k_frac = folded_frac;
        self.k_weight = folded_weight;
        self.k_degeneracy = folded_degeneracy;
    }
}

impl KPTS for KptsMesh {
    fn get_k_mesh(&self) -> [i32; 3] {
        self.k_mesh
    }

    fn get_k_frac(&self, k_index: usize) -> Vector3f64 {
        self.k_frac[k_index]
    }

    fn get_k_weight(&self, k_index: usize) -> f64 {
        self.k_weight[k_index]
    }

    fn get_k_degeneracy(&self, k_index: usize) -> usize {
        self.k_degeneracy[k_index]
    }

    fn get_n_kpts(&self) -> usize {
        self.k_frac.len()
    }

    fn frac_to_cart(&self, k_frac: &Vector3f64, blatt: &Lattice) -> Vector3f64 {
        // k_cart = k1*b1 + k2*b2 + k3*b3
        let a = blatt.get_vector_a();
        let b = blatt.get_vector_b();
        let c = blatt.get_vector_c();

        let mut k_cart = Vector3f64::zeros();

        k_cart.x = k_frac.x * a.x + k_frac.y * b.x + k_frac.z * c.x;
        k_cart.y = k_frac.x * a.y + k_frac.y * b.y + k_frac.z * c.y;
        k_cart.z = k_frac.x * a.z + k_frac.y * b.z + k_frac.z * c.z;

        k_cart
    }

    fn display(&self) {
        println!();
        println!("   {:-^88}", " k-points (fractional) ");
        println!();

        println!("{:12} {:^6} {}", "", "nkpt =", self.get_n_kpts());
        println!();

        println!(
            "{:12} {:^6} {:^16} {:^16} {:^16} {:^16} {:^12}",
            "", "index", "k1", "k2", "k3", "weight", "degeneracy"
        );

        for ik in 0..self.get_n_kpts() {
            let xk_frac = self.get_k_frac(ik);

            println!(
                "{:12} {:^6} {:16.12} {:16.12} {:16.12} {:16.12} {:^12}",
                "",
                ik + 1,
                xk_frac.x,
                xk_frac.y,
                xk_frac.z,
                self.get_k_weight(ik),
                self.get_k_degeneracy(ik)
            );
        }
    }
}

fn read_k_mesh() -> ([i32; 3], [i32; 3]) {
    // in.kmesh format:
    // line 1: nk1 nk2 nk3
    // line 2: shift1 shift2 shift3 (0/1)
    let lines = read_file_data_to_vec("in.kmesh");

    let s: Vec<&str> = lines[0].split_whitespace().collect();
    let nk1 = s[0].parse().unwrap();
    let nk2 = s[1].parse().unwrap();
    let nk3 = s[2].parse().unwrap();

    let s: Vec<&str> = lines[1].split_whitespace().collect();
    let k1_shift = s[0].parse().unwrap();
    let k2_shift = s[1].parse().unwrap();
    let k3_shift = s[2].parse().unwrap();

    ([nk1, nk2, nk3], [k1_shift, k2_shift, k3_shift])
}

fn read_file_data_to_vec(kfile: &str) -> Vec<String> {
    // Lightweight line reader used by k-point input parsers.
    let file = File::open(kfile).unwrap();
    let lines = BufReader::new(file).lines();
    let lines: Vec<String> = lines.map_while(std::io::Result::ok).collect();

    lines
}
