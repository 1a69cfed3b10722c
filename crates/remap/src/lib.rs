extern crate nalgebra as na;
extern crate nalgebra_sparse as nas;

pub mod corrector;
pub mod driver;
pub mod error;
pub mod gll;
pub mod kernel;
pub mod map;
pub mod metadata;
pub mod triquad;
