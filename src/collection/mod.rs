pub mod environment;
pub mod loader;
pub mod types;

// Re-export commonly used types
pub use environment::Environment;
pub use loader::{load_file, load_str};
pub use types::{Assertion, Collection, Extraction, Source, Step};
