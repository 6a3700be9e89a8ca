//! I/O modules for reading and writing orbit files

pub mod orbit;

pub use orbit::{OrbitReader, OrbitWriter};
