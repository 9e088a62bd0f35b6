use crate::core::clock::Clock;
use crate::core::config::ModelConfig;
use crate::core::connection::{Connection, Extractor, PortRef};
use crate::core::error::{CoreError, CoreResult};
use crate::core::module::Module;
use crate::core::port::{Direction, Port, PortSet, PortValue};
use log::debug;
use std::collections::HashMap;

/// Reserved owner name for the model's own built-in ports
pub const MODEL_PORTS_OWNER: &str = "model";
/// Built-in numeric input harmonizing global time
pub const PORT_TIME: &str = "time";
/// Built-in numeric output collecting the model's reaction time
pub const PORT_RT: &str = "rt";

/// Orchestrates a set of modules around one shared clock
///
/// The model owns the module list (insertion order is execution
/// order), the connection list and an aggregate port registry that
/// maps port names to their owning module. `run` drives modules with
/// fresh inputs, advances the clock and propagates connections until
/// no module has pending work.
pub struct Model {
    clock: Clock,
    ports: PortSet,
    modules: Vec<Box<dyn Module>>,
    connections: Vec<Connection>,
    input_registry: HashMap<String, PortRef>,
    output_registry: HashMap<String, PortRef>,
    max_cycles: u64,
}

impl Model {
    /// Create a model with the default configuration
    pub fn new() -> Self {
        // the default configuration is always valid
        Self::with_config(ModelConfig::default()).expect("default model configuration")
    }

    /// Create a model from an explicit configuration
    pub fn with_config(config: ModelConfig) -> CoreResult<Self> {
        if config.max_cycles == 0 {
            return Err(CoreError::InvalidArgument(
                "Model max_cycles must be at least 1".to_string(),
            ));
        }
        let mut clock = Clock::new();
        clock.set_time_scale(config.time_scale)?;

        let mut ports = PortSet::new();
        ports
            .add_input(Port::numeric(PORT_TIME, Direction::In))
            .expect("built-in time port");
        ports
            .add_output(Port::numeric(PORT_RT, Direction::Out))
            .expect("built-in rt port");

        let mut input_registry = HashMap::new();
        input_registry.insert(
            PORT_TIME.to_string(),
            PortRef::new(MODEL_PORTS_OWNER, PORT_TIME),
        );
        let mut output_registry = HashMap::new();
        output_registry.insert(
            PORT_RT.to_string(),
            PortRef::new(MODEL_PORTS_OWNER, PORT_RT),
        );

        Ok(Self {
            clock,
            ports,
            modules: Vec::new(),
            connections: Vec::new(),
            input_registry,
            output_registry,
            max_cycles: config.max_cycles,
        })
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    /// The model's own built-in ports (`time`, `rt`)
    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut PortSet {
        &mut self.ports
    }

    /// Names of all owned modules in execution order
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|m| m.name()).collect()
    }

    pub fn module(&self, name: &str) -> Option<&dyn Module> {
        self.modules
            .iter()
            .find(|m| m.name() == name)
            .map(|m| m.as_ref())
    }

    pub fn module_mut(&mut self, name: &str) -> Option<&mut (dyn Module + 'static)> {
        self.modules
            .iter_mut()
            .find(|m| m.name() == name)
            .map(|m| m.as_mut())
    }

    /// Take ownership of a module and aggregate its ports
    ///
    /// Fails on a duplicate module name or when a contributed port
    /// would shadow an already-registered `(direction, name)` pair;
    /// nothing is registered in that case.
    pub fn add_module(&mut self, module: Box<dyn Module>) -> CoreResult<()> {
        let name = module.name().to_string();
        if name == MODEL_PORTS_OWNER {
            return Err(CoreError::InvalidArgument(format!(
                "Module name '{}' is reserved for the model's own ports",
                MODEL_PORTS_OWNER
            )));
        }
        if self.modules.iter().any(|m| m.name() == name) {
            return Err(CoreError::InvalidArgument(format!(
                "A module named '{}' is already part of the model",
                name
            )));
        }
        // validate every port name before registering any of them
        for port in module.ports().inputs() {
            if self.input_registry.contains_key(port.name()) {
                return Err(CoreError::InvalidArgument(format!(
                    "Input port '{}' of module '{}' would shadow an already registered port",
                    port.name(),
                    name
                )));
            }
        }
        for port in module.ports().outputs() {
            if self.output_registry.contains_key(port.name()) {
                return Err(CoreError::InvalidArgument(format!(
                    "Output port '{}' of module '{}' would shadow an already registered port",
                    port.name(),
                    name
                )));
            }
        }
        for port in module.ports().inputs() {
            self.input_registry
                .insert(port.name().to_string(), PortRef::new(&name, port.name()));
        }
        for port in module.ports().outputs() {
            self.output_registry
                .insert(port.name().to_string(), PortRef::new(&name, port.name()));
        }
        self.modules.push(module);
        Ok(())
    }

    /// Remove a module and drop its entries from the port registries
    pub fn remove_module(&mut self, name: &str) -> CoreResult<Box<dyn Module>> {
        let index = self
            .modules
            .iter()
            .position(|m| m.name() == name)
            .ok_or_else(|| CoreError::ModuleNotFound(name.to_string()))?;
        self.input_registry.retain(|_, r| r.module != name);
        self.output_registry.retain(|_, r| r.module != name);
        self.connections
            .retain(|c| c.source().module != name && c.destination().module != name);
        Ok(self.modules.remove(index))
    }

    /// Resolve an aggregate input port name to its address
    pub fn find_input(&self, name: &str) -> Option<&PortRef> {
        self.input_registry.get(name)
    }

    /// Resolve an aggregate output port name to its address
    pub fn find_output(&self, name: &str) -> Option<&PortRef> {
        self.output_registry.get(name)
    }

    /// Resolve a port address to an input port
    pub fn input_port(&self, port: &PortRef) -> CoreResult<&Port> {
        self.port_set(&port.module)?
            .input(&port.port)
            .ok_or_else(|| CoreError::PortNotFound(port.to_string()))
    }

    pub fn input_port_mut(&mut self, port: &PortRef) -> CoreResult<&mut Port> {
        let address = port.to_string();
        self.port_set_mut(&port.module)?
            .input_mut(&port.port)
            .ok_or(CoreError::PortNotFound(address))
    }

    /// Resolve a port address to an output port
    pub fn output_port(&self, port: &PortRef) -> CoreResult<&Port> {
        self.port_set(&port.module)?
            .output(&port.port)
            .ok_or_else(|| CoreError::PortNotFound(port.to_string()))
    }

    pub fn output_port_mut(&mut self, port: &PortRef) -> CoreResult<&mut Port> {
        let address = port.to_string();
        self.port_set_mut(&port.module)?
            .output_mut(&port.port)
            .ok_or(CoreError::PortNotFound(address))
    }

    fn port_set(&self, owner: &str) -> CoreResult<&PortSet> {
        if owner == MODEL_PORTS_OWNER {
            return Ok(&self.ports);
        }
        self.module(owner)
            .map(|m| m.ports())
            .ok_or_else(|| CoreError::ModuleNotFound(owner.to_string()))
    }

    fn port_set_mut(&mut self, owner: &str) -> CoreResult<&mut PortSet> {
        if owner == MODEL_PORTS_OWNER {
            return Ok(&mut self.ports);
        }
        self.module_mut(owner)
            .map(|m| m.ports_mut())
            .ok_or_else(|| CoreError::ModuleNotFound(owner.to_string()))
    }

    /// Wire an output port to an input port, with an optional extractor
    ///
    /// Validated at assembly time: the source must resolve to an output
    /// port, the destination to an input port, a connection never
    /// points a port to itself, and the extractor must fit the port
    /// variants (a slot extractor needs symbolic ports on both ends; an
    /// unextracted wire needs matching variants). A custom extractor is
    /// opaque and only checked when values flow.
    pub fn connect(
        &mut self,
        source: PortRef,
        destination: PortRef,
        extract: Option<Extractor>,
    ) -> CoreResult<()> {
        if source == destination {
            return Err(CoreError::InvalidArgument(format!(
                "Connection would point port '{}' to itself",
                source
            )));
        }
        let source_port = self.output_port(&source)?;
        let destination_port = self.input_port(&destination)?;
        match &extract {
            Some(Extractor::Slot(key)) => {
                if !matches!(source_port.value(), PortValue::Symbolic(_)) {
                    return Err(CoreError::InvalidArgument(format!(
                        "Slot extractor '{}' needs a symbolic source, but '{}' is numeric",
                        key, source
                    )));
                }
                if !matches!(destination_port.value(), PortValue::Symbolic(_)) {
                    return Err(CoreError::InvalidArgument(format!(
                        "Slot extractor '{}' yields a symbolic value, but '{}' is numeric",
                        key, destination
                    )));
                }
            }
            Some(Extractor::Custom(_)) => {}
            None => {
                let compatible = matches!(
                    (source_port.value(), destination_port.value()),
                    (PortValue::Symbolic(_), PortValue::Symbolic(_))
                        | (PortValue::Numeric(_), PortValue::Numeric(_))
                );
                if !compatible {
                    return Err(CoreError::InvalidArgument(format!(
                        "Connection '{}' -> '{}' mixes symbolic and numeric ports",
                        source, destination
                    )));
                }
            }
        }
        self.connections
            .push(Connection::new(source, destination, extract));
        Ok(())
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Run the stabilization loop until no module has pending work
    ///
    /// Each cycle runs every module with fresh input (insertion order),
    /// advances the clock by the maximum reported duration and moves
    /// values across all connections whose source port is fresh, which
    /// may mark further modules pending. A configuration whose wiring
    /// never settles is cut off after `max_cycles` and reported as a
    /// `StabilizationOverrun`.
    pub fn run(&mut self) -> CoreResult<()> {
        let mut cycles: u64 = 0;
        loop {
            let pending: Vec<usize> = self
                .modules
                .iter()
                .enumerate()
                .filter(|(_, m)| m.ports().has_fresh_input())
                .map(|(index, _)| index)
                .collect();
            if pending.is_empty() {
                debug!("model stable after {} cycles at t={}", cycles, self.clock.time());
                return Ok(());
            }
            cycles += 1;
            if cycles > self.max_cycles {
                return Err(CoreError::StabilizationOverrun {
                    cycles: self.max_cycles,
                });
            }
            debug!("=== Stabilization cycle {} ({} pending) ===", cycles, pending.len());

            let now = self.clock.time();
            let mut max_duration: f64 = 0.0;
            for index in pending {
                let module = &mut self.modules[index];
                module.sync_time(now)?;
                let duration = module.run()?;
                if !duration.is_finite() || duration < 0.0 {
                    return Err(CoreError::InvalidArgument(format!(
                        "Module '{}' reported an invalid duration {}",
                        module.name(),
                        duration
                    )));
                }
                max_duration = max_duration.max(duration);
            }

            self.clock.advance(max_duration)?;
            let time = self.clock.time();
            if let Some(port) = self.ports.input_mut(PORT_TIME) {
                port.set_numeric(time)?;
            }
            self.propagate()?;
        }
    }

    /// Move values across every connection whose source port is fresh
    ///
    /// Two phases, so a single fresh source can feed several wires
    /// before its freshness is cleared.
    fn propagate(&mut self) -> CoreResult<()> {
        let mut writes = Vec::new();
        let mut consumed = Vec::new();
        for connection in &self.connections {
            let source_port = self.output_port(connection.source())?;
            if !source_port.is_fresh() {
                continue;
            }
            let outbound = connection.outbound_value(source_port.value())?;
            writes.push((connection.destination().clone(), outbound));
            consumed.push(connection.source().clone());
        }
        for source in consumed {
            self.output_port_mut(&source)?.clear_fresh();
        }
        for (destination, value) in writes {
            self.input_port_mut(&destination)?.set_value(value)?;
        }
        Ok(())
    }
}

impl Default for Model {
    fn default() -> Self {
        Self::new()
    }
}
