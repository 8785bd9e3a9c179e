//! Generation passes: propagation, connectivity, completion and the
//! generator that drives them.

pub mod batch;
pub mod common;
pub mod completion;
pub mod connectivity;
pub mod generator;
pub mod progress;

pub use batch::generate_levels;
pub use connectivity::ConnectivityGraph;
pub use generator::{CellSnapshot, GenerationProgress, Generator, Update, WaveStatus};
pub use progress::GenerationProgressBar;
