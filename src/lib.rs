pub mod core;

// Re-export commonly used types
pub use crate::core::boltzmann::boltzmann;
pub use crate::core::clock::Clock;
pub use crate::core::config::{DeclarativeConfig, ModelConfig};
pub use crate::core::connection::{Connection, Extractor, PortRef};
pub use crate::core::data::{ColumnValue, Record, TableBinding};
pub use crate::core::error::{CoreError, CoreResult};
pub use crate::core::memory::{Chunk, DeclarativeMemory};
pub use crate::core::model::Model;
pub use crate::core::module::{Module, ModuleBase};
pub use crate::core::port::{Direction, Port, PortSet, PortValue, Slots};
