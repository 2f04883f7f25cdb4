#![deny(unused_variables)]
#![deny(dead_code)]
#![deny(unused_imports)]
#![deny(clippy::no_effect_underscore_binding)]
pub mod config;
pub mod heap;
pub mod index;
pub mod store;
pub mod sweep;
pub mod types;
pub mod verify;

pub use config::{ConfigError, ForkMode, ScanConfig};
pub use heap::SumHeap;
pub use index::HeapIndex;
pub use types::ScanError;
