/// Error types for core operations
///
/// A retrieval miss is not an error: `DeclarativeMemory::retrieve`
/// reports it as `Ok(None)`. An undefined activation is a domain
/// sentinel (`None` from `Chunk::activation`), not an error either.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Wrong value, wrong port direction, duplicate name or out-of-range parameter
    InvalidArgument(String),
    /// Port lookup by name failed where a port was required
    PortNotFound(String),
    /// Module lookup by name failed
    ModuleNotFound(String),
    /// External column not declared on the table binding
    UnknownColumn(String),
    /// The stabilization loop exceeded its cycle bound
    StabilizationOverrun { cycles: u64 },
}

impl std::fmt::Display for CoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CoreError::InvalidArgument(msg) => write!(f, "Invalid argument: {}", msg),
            CoreError::PortNotFound(msg) => write!(f, "Port not found: {}", msg),
            CoreError::ModuleNotFound(msg) => write!(f, "Module not found: {}", msg),
            CoreError::UnknownColumn(msg) => write!(f, "Unknown column: {}", msg),
            CoreError::StabilizationOverrun { cycles } => {
                write!(
                    f,
                    "Stabilization loop did not settle after {} cycles (connection cycle?)",
                    cycles
                )
            }
        }
    }
}

impl std::error::Error for CoreError {}

/// Convenience alias used throughout the crate
pub type CoreResult<T> = Result<T, CoreError>;
