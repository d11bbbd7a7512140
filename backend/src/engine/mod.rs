//! Pure evaluation core: verification gate and decision engine.
//!
//! Nothing in this module performs I/O; every function is testable with
//! synthetic readings.

pub mod decision;
pub mod types;
pub mod verification;

pub use decision::decide;
pub use types::*;
pub use verification::verify;
