pub mod directory;
pub mod schedule;
pub mod serve;

// Re-export command functions for convenience
pub use directory::DirectoryKind;
pub use schedule::{extract, lookup, refresh, SubjectArgs};
pub use serve::serve;
