//! Preview resolutions and optimal-size selection.

mod selector;
mod size;

pub use selector::{select_optimal_size, ASPECT_TOLERANCE};
pub use size::Dimension;
