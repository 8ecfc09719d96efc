mod mesh;
use mesh::*;

use crystal::Crystal;
use lattice::Lattice;
use vector3::Vector3f64;

// K-point provider interface.
//
// Implementations expose a unified view of:
// - fractional coordinates
// - integration weights
// - degeneracy bookkeeping (number of full-mesh points folded onto a
//   representative)
// - mesh metadata for kmesh-based workflows
pub trait KPTS {
    fn get_k_frac(&self, k_index: usize) -> Vector3f64;
    fn get_k_degeneracy(&self, k_index: usize) -> usize;
    fn get_k_weight(&self, k_index: usize) -> f64;
    fn get_n_kpts(&self) -> usize;
    fn frac_to_cart(&self, k_frac: &Vector3f64, blatt: &Lattice) -> Vector3f64;
    fn get_k_mesh(&self) -> [i32; 3];
    fn display(&self);
}

// Factory for k-point generation modes.
pub fn new(scheme: &str, crystal: &Crystal, symmetry: bool) -> Box<dyn KPTS> {
    match scheme {
        "kmesh" => Box::new(KptsMesh::new(crystal, symmetry)),
        other => panic!("unsupported k-point scheme '{}'", other),
    }
}

/// Flattens any provider into the (wavevector, weight) pairs consumed by the
/// symmetry engine.
pub fn collect_pairs(kpts: &dyn KPTS) -> Vec<(Vector3f64, f64)> {
    (0..kpts.get_n_kpts())
        .map(|ik| (kpts.get_k_frac(ik), kpts.get_k_weight(ik)))
        .collect()
}
