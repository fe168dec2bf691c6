pub mod catalog;
pub mod errors;
pub mod room;
pub mod scoring;

// Re-export main components
pub use catalog::*;
pub use errors::*;
pub use room::*;
pub use scoring::*;
