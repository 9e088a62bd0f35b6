use crate::core::error::{CoreError, CoreResult};
use crate::core::port::{PortValue, Slots};

/// Address of a port: `(module name, port name)`
///
/// Modules own their ports; everything that crosses module boundaries
/// (connections, the model's aggregate registry, external bindings)
/// refers to ports by address instead of holding references into them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PortRef {
    pub module: String,
    pub port: String,
}

impl PortRef {
    pub fn new(module: &str, port: &str) -> Self {
        Self {
            module: module.to_string(),
            port: port.to_string(),
        }
    }
}

impl std::fmt::Display for PortRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.module, self.port)
    }
}

/// Selector applied to a source value before it reaches the destination
#[derive(Debug, Clone)]
pub enum Extractor {
    /// Pull a single slot out of a symbolic mapping
    Slot(String),
    /// Arbitrary transformation of the source value
    Custom(fn(&PortValue) -> PortValue),
}

impl Extractor {
    /// Apply the selector to a source value
    ///
    /// `Slot` yields a one-entry symbolic mapping, or an empty mapping
    /// when the slot is absent; it is an error on numeric values.
    pub fn apply(&self, value: &PortValue) -> CoreResult<PortValue> {
        match self {
            Extractor::Slot(key) => match value {
                PortValue::Symbolic(slots) => {
                    let mut extracted = Slots::new();
                    if let Some(found) = slots.get(key) {
                        extracted.insert(key.clone(), found.clone());
                    }
                    Ok(PortValue::Symbolic(extracted))
                }
                PortValue::Numeric(_) => Err(CoreError::InvalidArgument(format!(
                    "Slot extractor '{}' cannot be applied to a numeric value",
                    key
                ))),
            },
            Extractor::Custom(function) => Ok(function(value)),
        }
    }
}

/// A directed wire from one module's output port to another's input port
///
/// Validated at model-assembly time (source is Out, destination is In,
/// never the same port) and immutable thereafter. The model's
/// stabilization loop moves values across connections whenever the
/// source port is fresh.
#[derive(Debug, Clone)]
pub struct Connection {
    source: PortRef,
    destination: PortRef,
    extract: Option<Extractor>,
}

impl Connection {
    pub(crate) fn new(source: PortRef, destination: PortRef, extract: Option<Extractor>) -> Self {
        Self {
            source,
            destination,
            extract,
        }
    }

    pub fn source(&self) -> &PortRef {
        &self.source
    }

    pub fn destination(&self) -> &PortRef {
        &self.destination
    }

    /// Run the source value through the optional extractor
    pub fn outbound_value(&self, source_value: &PortValue) -> CoreResult<PortValue> {
        match &self.extract {
            Some(extractor) => extractor.apply(source_value),
            None => Ok(source_value.clone()),
        }
    }
}
