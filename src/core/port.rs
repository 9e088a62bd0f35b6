use crate::core::error::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// Slot-name to value mapping carried by symbolic ports and chunks
///
/// A BTreeMap keeps iteration order deterministic, which matters for
/// reproducible simulation runs.
pub type Slots = BTreeMap<String, String>;

/// Direction of a port relative to its owning module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Input port - receives data from other modules or the outside
    In,
    /// Output port - publishes data to other modules or the outside
    Out,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::In => write!(f, "in"),
            Direction::Out => write!(f, "out"),
        }
    }
}

/// Tagged value held by a port
///
/// Symbolic ports carry a slot-value mapping, numeric ports a real
/// scalar. All port operations pattern-match on the variant instead of
/// checking types at runtime.
#[derive(Debug, Clone, PartialEq)]
pub enum PortValue {
    Symbolic(Slots),
    Numeric(f64),
}

impl PortValue {
    /// An empty symbolic mapping; always a fresh container per call
    pub fn empty_symbolic() -> Self {
        PortValue::Symbolic(Slots::new())
    }

    /// Get the symbolic mapping, if this is a symbolic value
    pub fn as_symbolic(&self) -> Option<&Slots> {
        match self {
            PortValue::Symbolic(slots) => Some(slots),
            PortValue::Numeric(_) => None,
        }
    }

    /// Get the scalar, if this is a numeric value
    pub fn as_numeric(&self) -> Option<f64> {
        match self {
            PortValue::Numeric(value) => Some(*value),
            PortValue::Symbolic(_) => None,
        }
    }
}

/// A named, directional, typed value slot owned by one module
///
/// A port is "fresh" from the moment it is written until the owning
/// module consumes it (input ports) or the model propagates it
/// (output ports). Freshness is what drives the stabilization loop.
#[derive(Debug, Clone)]
pub struct Port {
    name: String,
    direction: Direction,
    value: PortValue,
    fresh: bool,
}

impl Port {
    /// Create a symbolic port with an empty mapping
    pub fn symbolic(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            direction,
            value: PortValue::empty_symbolic(),
            fresh: false,
        }
    }

    /// Create a numeric port initialized to zero
    pub fn numeric(name: &str, direction: Direction) -> Self {
        Self {
            name: name.to_string(),
            direction,
            value: PortValue::Numeric(0.0),
            fresh: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn value(&self) -> &PortValue {
        &self.value
    }

    /// Whether the port holds a value written since it was last consumed
    pub fn is_fresh(&self) -> bool {
        self.fresh
    }

    /// Read the value and clear freshness; used by the owning module
    pub fn consume(&mut self) -> PortValue {
        self.fresh = false;
        self.value.clone()
    }

    /// Clear freshness without reading; used after propagation
    pub fn clear_fresh(&mut self) {
        self.fresh = false;
    }

    /// Replace the whole value; the variant must match the port's kind
    pub fn set_value(&mut self, value: PortValue) -> CoreResult<()> {
        match (&self.value, &value) {
            (PortValue::Symbolic(_), PortValue::Symbolic(_)) => {}
            (PortValue::Numeric(_), PortValue::Numeric(number)) => {
                if !number.is_finite() {
                    return Err(CoreError::InvalidArgument(format!(
                        "Numeric port '{}' requires a finite real number, got {}",
                        self.name, number
                    )));
                }
            }
            _ => {
                return Err(CoreError::InvalidArgument(format!(
                    "Value variant does not match the kind of port '{}'",
                    self.name
                )));
            }
        }
        self.value = value;
        self.fresh = true;
        Ok(())
    }

    /// Set a numeric port's scalar; fails on symbolic ports and non-finite values
    pub fn set_numeric(&mut self, value: f64) -> CoreResult<()> {
        self.set_value(PortValue::Numeric(value))
    }

    /// Merge slot-value pairs into a symbolic port's mapping (per-key upsert)
    pub fn modify(&mut self, partial: &Slots) -> CoreResult<()> {
        match &mut self.value {
            PortValue::Symbolic(slots) => {
                for (key, value) in partial {
                    slots.insert(key.clone(), value.clone());
                }
                self.fresh = true;
                Ok(())
            }
            PortValue::Numeric(_) => Err(CoreError::InvalidArgument(format!(
                "Port '{}' is numeric and cannot be modified with a mapping",
                self.name
            ))),
        }
    }
}

/// A module's owned collection of ports
///
/// Enforces direction and name uniqueness within each list and offers
/// lookup by name. Lookups return `Option` rather than failing; absence
/// is a normal condition callers must handle.
#[derive(Debug, Clone, Default)]
pub struct PortSet {
    inputs: Vec<Port>,
    outputs: Vec<Port>,
}

impl PortSet {
    pub fn new() -> Self {
        Self {
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Add an input port; fails on direction mismatch or duplicate name
    pub fn add_input(&mut self, port: Port) -> CoreResult<()> {
        if port.direction() != Direction::In {
            return Err(CoreError::InvalidArgument(format!(
                "Port '{}' has direction '{}' and cannot be added as an input",
                port.name(),
                port.direction()
            )));
        }
        if self.inputs.iter().any(|p| p.name() == port.name()) {
            return Err(CoreError::InvalidArgument(format!(
                "An input port named '{}' already exists",
                port.name()
            )));
        }
        self.inputs.push(port);
        Ok(())
    }

    /// Add an output port; fails on direction mismatch or duplicate name
    pub fn add_output(&mut self, port: Port) -> CoreResult<()> {
        if port.direction() != Direction::Out {
            return Err(CoreError::InvalidArgument(format!(
                "Port '{}' has direction '{}' and cannot be added as an output",
                port.name(),
                port.direction()
            )));
        }
        if self.outputs.iter().any(|p| p.name() == port.name()) {
            return Err(CoreError::InvalidArgument(format!(
                "An output port named '{}' already exists",
                port.name()
            )));
        }
        self.outputs.push(port);
        Ok(())
    }

    pub fn input(&self, name: &str) -> Option<&Port> {
        self.inputs.iter().find(|p| p.name() == name)
    }

    pub fn input_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.inputs.iter_mut().find(|p| p.name() == name)
    }

    pub fn output(&self, name: &str) -> Option<&Port> {
        self.outputs.iter().find(|p| p.name() == name)
    }

    pub fn output_mut(&mut self, name: &str) -> Option<&mut Port> {
        self.outputs.iter_mut().find(|p| p.name() == name)
    }

    pub fn inputs(&self) -> &[Port] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Port] {
        &self.outputs
    }

    /// Whether any input port holds an unconsumed value
    pub fn has_fresh_input(&self) -> bool {
        self.inputs.iter().any(|p| p.is_fresh())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slots(pairs: &[(&str, &str)]) -> Slots {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_add_input_rejects_wrong_direction() {
        let mut ports = PortSet::new();
        let out = Port::symbolic("retrieval", Direction::Out);
        assert!(ports.add_input(out).is_err());
    }

    #[test]
    fn test_add_input_rejects_duplicate_name() {
        let mut ports = PortSet::new();
        ports.add_input(Port::symbolic("cue", Direction::In)).unwrap();
        let dup = Port::symbolic("cue", Direction::In);
        assert!(ports.add_input(dup).is_err());
        // the same name in the other direction list is fine
        ports
            .add_output(Port::symbolic("cue", Direction::Out))
            .unwrap();
    }

    #[test]
    fn test_lookup_returns_none_for_unknown_name() {
        let ports = PortSet::new();
        assert!(ports.input("nope").is_none());
        assert!(ports.output("nope").is_none());
    }

    #[test]
    fn test_numeric_port_rejects_non_finite() {
        let mut port = Port::numeric("rt", Direction::Out);
        assert!(port.set_numeric(f64::NAN).is_err());
        assert!(port.set_numeric(f64::INFINITY).is_err());
        assert!(port.set_numeric(1.25).is_ok());
        assert_eq!(port.value().as_numeric(), Some(1.25));
    }

    #[test]
    fn test_variant_mismatch_is_rejected() {
        let mut port = Port::numeric("rt", Direction::Out);
        assert!(port.set_value(PortValue::empty_symbolic()).is_err());
        let mut port = Port::symbolic("cue", Direction::In);
        assert!(port.set_value(PortValue::Numeric(1.0)).is_err());
    }

    #[test]
    fn test_modify_merges_per_key() {
        let mut port = Port::symbolic("encode", Direction::In);
        port.modify(&slots(&[("name", "fido"), ("type", "dog")])).unwrap();
        port.modify(&slots(&[("type", "puppy")])).unwrap();
        let merged = port.value().as_symbolic().unwrap();
        assert_eq!(merged.get("name").map(String::as_str), Some("fido"));
        assert_eq!(merged.get("type").map(String::as_str), Some("puppy"));
    }

    #[test]
    fn test_freshness_lifecycle() {
        let mut port = Port::symbolic("encode", Direction::In);
        assert!(!port.is_fresh());
        port.modify(&slots(&[("a", "1")])).unwrap();
        assert!(port.is_fresh());
        let value = port.consume();
        assert!(!port.is_fresh());
        assert_eq!(value.as_symbolic().unwrap().len(), 1);
    }
}
