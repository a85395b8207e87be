//! One-off operational corrections, run by hand and never recorded in the change log.

pub mod reassign_lrn;

pub use reassign_lrn::reassign_lrn;
