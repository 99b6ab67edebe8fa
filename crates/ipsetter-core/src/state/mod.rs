// # State Store Implementations
//
// Implementations of the StateStore trait. Both are optional: an engine
// without a store lists the domain on every pass.

pub mod file;
pub mod memory;

pub use file::FileStateStore;
pub use memory::MemoryStateStore;
