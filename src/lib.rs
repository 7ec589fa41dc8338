// Reusable library API — visible to both CLI and WASM builds
pub mod clue;
pub mod engine;
mod errors;
pub mod grid;
pub mod log;
mod propagate;
pub mod puzzle;
pub mod session;

pub use errors::LayoutError;
pub use grid::Conflict;

// Compile the wasm glue only when targeting wasm32.
#[cfg(target_arch = "wasm32")]
pub mod wasm;
