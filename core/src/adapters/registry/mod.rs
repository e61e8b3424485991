//! Address registry adapters.

mod file;
mod memory;

pub use file::FileRegistry;
pub use memory::MemoryRegistry;
