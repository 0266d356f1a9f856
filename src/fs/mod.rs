//! Filesystem abstraction so manifest and metadata readers can be tested
//! against an in-memory tree.

mod mock;
mod real;
mod r#trait;

pub use mock::MockFileSystem;
pub use r#trait::{DirEntry, FileSystem, FileType};
pub use real::RealFileSystem;
