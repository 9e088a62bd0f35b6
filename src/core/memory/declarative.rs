use crate::core::boltzmann::boltzmann;
use crate::core::clock::Clock;
use crate::core::config::DeclarativeConfig;
use crate::core::error::{CoreError, CoreResult};
use crate::core::memory::chunk::Chunk;
use crate::core::module::{Module, ModuleBase};
use crate::core::port::{Direction, Port, PortSet, PortValue, Slots};
use log::debug;
use rand::distributions::{Distribution, WeightedIndex};
use rand::rngs::StdRng;
use rand::SeedableRng;

pub const PORT_ENCODE: &str = "encode";
pub const PORT_CUE: &str = "cue";
pub const PORT_RETRIEVAL: &str = "retrieval";
pub const PORT_RETRIEVAL_TIME: &str = "retrieval time";
pub const PORT_RETRIEVAL_PROBABILITY: &str = "retrieval probability";

/// The declarative memory engine
///
/// Stores chunks, accumulates reinforcement traces, computes
/// time-decayed activation and answers cue-based retrieval requests by
/// sampling from a Boltzmann distribution over the conflict set.
///
/// Ports: In `encode` and `cue` (symbolic), Out `retrieval` (symbolic),
/// `retrieval time` and `retrieval probability` (numeric).
pub struct DeclarativeMemory {
    base: ModuleBase,
    clock: Clock,
    memories: Vec<Chunk>,
    noise: f64,
    threshold: f64,
    latency_factor: f64,
    decay_rate: f64,
    encode_on_retrieval: bool,
    rng: StdRng,
}

impl DeclarativeMemory {
    /// Create a memory module with default parameters and an entropy seed
    pub fn new(name: &str) -> Self {
        Self::with_rng(name, StdRng::from_entropy())
    }

    /// Create a memory module whose retrieval draws are reproducible
    pub fn with_seed(name: &str, seed: u64) -> Self {
        Self::with_rng(name, StdRng::seed_from_u64(seed))
    }

    fn with_rng(name: &str, rng: StdRng) -> Self {
        let mut base = ModuleBase::new(name);
        {
            let ports = base.ports_mut();
            // a fresh port set cannot collide on these names
            ports
                .add_input(Port::symbolic(PORT_ENCODE, Direction::In))
                .expect("built-in encode port");
            ports
                .add_input(Port::symbolic(PORT_CUE, Direction::In))
                .expect("built-in cue port");
            ports
                .add_output(Port::symbolic(PORT_RETRIEVAL, Direction::Out))
                .expect("built-in retrieval port");
            ports
                .add_output(Port::numeric(PORT_RETRIEVAL_TIME, Direction::Out))
                .expect("built-in retrieval time port");
            ports
                .add_output(Port::numeric(PORT_RETRIEVAL_PROBABILITY, Direction::Out))
                .expect("built-in retrieval probability port");
        }
        Self {
            base,
            clock: Clock::new(),
            memories: Vec::new(),
            noise: 0.2,
            threshold: 0.0,
            latency_factor: 1.0,
            decay_rate: 0.5,
            encode_on_retrieval: true,
            rng,
        }
    }

    /// Apply a configuration snapshot, validating every field
    pub fn apply_config(&mut self, config: &DeclarativeConfig) -> CoreResult<()> {
        // validate everything before mutating anything
        Self::check_positive("noise", config.noise)?;
        Self::check_positive("decay rate", config.decay_rate)?;
        Self::check_non_negative("latency factor", config.latency_factor)?;
        Self::check_finite("threshold", config.threshold)?;
        self.noise = config.noise;
        self.decay_rate = config.decay_rate;
        self.latency_factor = config.latency_factor;
        self.threshold = config.threshold;
        self.encode_on_retrieval = config.encode_on_retrieval;
        Ok(())
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    pub fn memories(&self) -> &[Chunk] {
        &self.memories
    }

    pub fn noise(&self) -> f64 {
        self.noise
    }

    pub fn set_noise(&mut self, noise: f64) -> CoreResult<()> {
        Self::check_positive("noise", noise)?;
        self.noise = noise;
        Ok(())
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn set_threshold(&mut self, threshold: f64) -> CoreResult<()> {
        Self::check_finite("threshold", threshold)?;
        self.threshold = threshold;
        Ok(())
    }

    pub fn latency_factor(&self) -> f64 {
        self.latency_factor
    }

    pub fn set_latency_factor(&mut self, latency_factor: f64) -> CoreResult<()> {
        Self::check_non_negative("latency factor", latency_factor)?;
        self.latency_factor = latency_factor;
        Ok(())
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn set_decay_rate(&mut self, decay_rate: f64) -> CoreResult<()> {
        Self::check_positive("decay rate", decay_rate)?;
        self.decay_rate = decay_rate;
        Ok(())
    }

    pub fn encode_on_retrieval(&self) -> bool {
        self.encode_on_retrieval
    }

    pub fn set_encode_on_retrieval(&mut self, encode_on_retrieval: bool) {
        self.encode_on_retrieval = encode_on_retrieval;
    }

    /// Store a fact or reinforce an existing one
    ///
    /// Matching against existing chunks is exact content equality;
    /// encoding the same mapping twice appends a trace instead of
    /// creating a second chunk.
    pub fn encode(&mut self, contents: Slots) -> CoreResult<()> {
        let now = self.clock.time();
        if let Some(existing) = self
            .memories
            .iter_mut()
            .find(|chunk| *chunk.contents() == contents)
        {
            debug!("reinforcing existing chunk at t={}", now);
            existing.add_trace(now)?;
        } else {
            debug!("encoding new chunk at t={}", now);
            self.memories
                .push(Chunk::new(now, contents, self.decay_rate));
        }
        Ok(())
    }

    /// Weaken a stored fact by removing one of its reinforcement traces
    ///
    /// The chunk is addressed by exact contents. Removing its only
    /// remaining trace is an error; a chunk never loses its whole
    /// history this way.
    pub fn remove_trace(&mut self, contents: &Slots, time: f64) -> CoreResult<()> {
        let chunk = self
            .memories
            .iter_mut()
            .find(|chunk| chunk.contents() == contents)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!(
                    "No stored chunk has contents {:?}",
                    contents
                ))
            })?;
        chunk.remove_trace(time)
    }

    /// Probability of confidently retrieving `chunk` at the current time
    ///
    /// Logistic in `(threshold − A) / noise`; `None` while the chunk's
    /// activation is undefined.
    pub fn retrieval_probability(&self, chunk: &Chunk) -> Option<f64> {
        chunk
            .activation(self.clock.time())
            .map(|a| Self::logistic_probability(a, self.threshold, self.noise))
    }

    /// Simulated latency of retrieving `chunk` at the current time
    ///
    /// `exp(latency_factor · (threshold − A) / noise)`; `None` while the
    /// chunk's activation is undefined.
    pub fn retrieval_time(&self, chunk: &Chunk) -> Option<f64> {
        chunk
            .activation(self.clock.time())
            .map(|a| Self::latency(a, self.threshold, self.latency_factor, self.noise))
    }

    /// Retrieve the chunk best matching `cue`, or report a miss
    ///
    /// The conflict set holds every chunk whose contents are a superset
    /// of the cue and whose activation is defined; one member is drawn
    /// from a Boltzmann distribution over the activations. A miss is a
    /// normal outcome (`Ok(None)`): the retrieval port is cleared and
    /// the deterministic failure latency is published.
    pub fn retrieve(&mut self, cue: &Slots) -> CoreResult<Option<&Chunk>> {
        let now = self.clock.time();
        // chunks with undefined activation are unselectable
        let candidates: Vec<(usize, f64)> = self
            .memories
            .iter()
            .enumerate()
            .filter(|(_, chunk)| chunk.matches(cue))
            .filter_map(|(index, chunk)| chunk.activation(now).map(|a| (index, a)))
            .collect();

        if candidates.is_empty() {
            debug!("retrieval miss for cue {:?} at t={}", cue, now);
            let failure_latency =
                Self::failure_latency(self.threshold, self.latency_factor, self.noise);
            let ports = self.base.ports_mut();
            if let Some(port) = ports.output_mut(PORT_RETRIEVAL) {
                port.set_value(PortValue::empty_symbolic())?;
            }
            if let Some(port) = ports.output_mut(PORT_RETRIEVAL_TIME) {
                port.set_numeric(failure_latency)?;
            }
            // retrieval probability keeps its last value
            return Ok(None);
        }

        let activations: Vec<f64> = candidates.iter().map(|(_, a)| *a).collect();
        let weights = boltzmann(&activations, self.noise)?;
        let distribution = WeightedIndex::new(&weights).map_err(|e| {
            CoreError::InvalidArgument(format!("Degenerate Boltzmann weights: {}", e))
        })?;
        let (index, activation) = candidates[distribution.sample(&mut self.rng)];
        let probability = Self::logistic_probability(activation, self.threshold, self.noise);
        let latency = Self::latency(activation, self.threshold, self.latency_factor, self.noise);
        debug!(
            "retrieved chunk {} of {} (A={:.4}, P={:.4}, RT={:.4})",
            index,
            candidates.len(),
            activation,
            probability,
            latency
        );

        let contents = self.memories[index].contents().clone();
        let ports = self.base.ports_mut();
        if let Some(port) = ports.output_mut(PORT_RETRIEVAL) {
            port.set_value(PortValue::Symbolic(contents))?;
        }
        if let Some(port) = ports.output_mut(PORT_RETRIEVAL_TIME) {
            port.set_numeric(latency)?;
        }
        if let Some(port) = ports.output_mut(PORT_RETRIEVAL_PROBABILITY) {
            port.set_numeric(probability)?;
        }
        if self.encode_on_retrieval {
            self.memories[index].add_trace(now)?;
        }
        Ok(Some(&self.memories[index]))
    }

    /// Forget everything and rewind the module clock to zero
    ///
    /// Used between independent runs so that no traces leak across
    /// trials.
    pub fn reset(&mut self) {
        self.memories.clear();
        self.clock.reset();
    }

    fn logistic_probability(activation: f64, threshold: f64, noise: f64) -> f64 {
        1.0 / (1.0 + ((threshold - activation) / noise).exp())
    }

    fn latency(activation: f64, threshold: f64, latency_factor: f64, noise: f64) -> f64 {
        let latency = (latency_factor * (threshold - activation) / noise).exp();
        // exp can overflow for deeply sub-threshold activations
        if latency.is_finite() {
            latency
        } else {
            f64::MAX
        }
    }

    /// Latency published on a miss: `exp(latency_factor · (−threshold) / noise)`
    fn failure_latency(threshold: f64, latency_factor: f64, noise: f64) -> f64 {
        let latency = (latency_factor * (-threshold) / noise).exp();
        if latency.is_finite() {
            latency
        } else {
            f64::MAX
        }
    }

    fn check_positive(what: &str, value: f64) -> CoreResult<()> {
        if !value.is_finite() || value <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Memory {} must be a finite positive number, got {}",
                what, value
            )));
        }
        Ok(())
    }

    fn check_non_negative(what: &str, value: f64) -> CoreResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Memory {} must be a finite non-negative number, got {}",
                what, value
            )));
        }
        Ok(())
    }

    fn check_finite(what: &str, value: f64) -> CoreResult<()> {
        if !value.is_finite() {
            return Err(CoreError::InvalidArgument(format!(
                "Memory {} must be a finite number, got {}",
                what, value
            )));
        }
        Ok(())
    }
}

impl Module for DeclarativeMemory {
    fn name(&self) -> &str {
        self.base.name()
    }

    fn ports(&self) -> &PortSet {
        self.base.ports()
    }

    fn ports_mut(&mut self) -> &mut PortSet {
        self.base.ports_mut()
    }

    fn sync_time(&mut self, time: f64) -> CoreResult<()> {
        self.clock.set_time(time)
    }

    fn run(&mut self) -> CoreResult<f64> {
        let encode_request = self
            .base
            .ports_mut()
            .input_mut(PORT_ENCODE)
            .filter(|port| port.is_fresh())
            .map(|port| port.consume());
        if let Some(PortValue::Symbolic(contents)) = encode_request {
            self.encode(contents)?;
        }

        let cue_request = self
            .base
            .ports_mut()
            .input_mut(PORT_CUE)
            .filter(|port| port.is_fresh())
            .map(|port| port.consume());
        if let Some(PortValue::Symbolic(cue)) = cue_request {
            self.retrieve(&cue)?;
        }

        Ok(self.base.duration())
    }
}
