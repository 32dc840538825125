pub mod assignments;
pub mod registry;
pub mod types;

pub use assignments::VoiceAssignments;
pub use registry::VoiceRegistry;
pub use types::*;
