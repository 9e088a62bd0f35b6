pub mod chunk;
pub mod declarative;

pub use chunk::Chunk;
pub use declarative::DeclarativeMemory;
