// Provider module: price history sources handed to the batch analyzer.

pub mod json_dir;
pub mod memory;
pub mod traits;

pub use json_dir::JsonDirProvider;
pub use memory::MemoryProvider;
pub use traits::SeriesProvider;
