use std::f64;

// units : length

pub const BOHR_TO_ANG: f64 = 0.529177249;
pub const ANG_TO_BOHR: f64 = 1.0 / BOHR_TO_ANG;

// units : energy

pub const RY_TO_EV: f64 = 13.605698066;
pub const HA_TO_EV: f64 = 2.0 * RY_TO_EV;
pub const EV_TO_HA: f64 = 1.0 / HA_TO_EV;

// units : force

pub const FORCE_HA_TO_EV: f64 = 51.42208619083232;
pub const FORCE_EV_TO_HA: f64 = 1.0 / 51.42208619083232;

// pi

pub const PI: f64 = f64::consts::PI;
pub const TWOPI: f64 = 2.0 * f64::consts::PI;
pub const FOURPI: f64 = 4.0 * f64::consts::PI;

// numerical tolerances

pub const EPS1: f64 = 1E-1;
pub const EPS2: f64 = 1E-2;
pub const EPS3: f64 = 1E-3;
pub const EPS4: f64 = 1E-4;
pub const EPS5: f64 = 1E-5;
pub const EPS6: f64 = 1E-6;
pub const EPS7: f64 = 1E-7;
pub const EPS8: f64 = 1E-8;
pub const EPS9: f64 = 1E-9;
pub const EPS10: f64 = 1E-10;
pub const EPS12: f64 = 1E-12;
pub const EPS14: f64 = 1E-14;
pub const EPS30: f64 = 1E-30;
