pub mod color;
pub mod messages;
pub mod room;

// Re-export all types
pub use color::*;
pub use messages::*;
pub use room::*;
