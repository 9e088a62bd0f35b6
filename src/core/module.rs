use crate::core::error::{CoreError, CoreResult};
use crate::core::port::PortSet;

/// Behavior contract for a unit owned by a model
///
/// A module combines a port set with a `run` step. The model invokes
/// `run` whenever the module has fresh input; `run` consumes those
/// inputs, performs module-specific computation, writes output ports
/// and reports the non-negative duration it consumed.
pub trait Module {
    /// Module name, unique within its model
    fn name(&self) -> &str;

    fn ports(&self) -> &PortSet;

    fn ports_mut(&mut self) -> &mut PortSet;

    /// Align the module's internal clock with the model clock
    fn sync_time(&mut self, _time: f64) -> CoreResult<()> {
        Ok(())
    }

    /// Consume fresh inputs and return the simulated duration spent
    fn run(&mut self) -> CoreResult<f64>;
}

/// Common state embedded by concrete modules (composition, not inheritance)
///
/// Carries the name, the owned port set and the stochastic-duration
/// attributes. `duration_probability` and `probability` are accepted
/// and stored but not yet consumed by any engine; stochastic retrieval
/// latency is a future extension.
#[derive(Debug, Clone)]
pub struct ModuleBase {
    name: String,
    ports: PortSet,
    duration: f64,
    duration_probability: f64,
    probability: f64,
}

impl ModuleBase {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ports: PortSet::new(),
            duration: 0.0,
            duration_probability: 0.0,
            probability: 0.0,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn ports(&self) -> &PortSet {
        &self.ports
    }

    pub fn ports_mut(&mut self) -> &mut PortSet {
        &mut self.ports
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn set_duration(&mut self, duration: f64) -> CoreResult<()> {
        Self::check_non_negative("duration", duration)?;
        self.duration = duration;
        Ok(())
    }

    pub fn duration_probability(&self) -> f64 {
        self.duration_probability
    }

    pub fn set_duration_probability(&mut self, value: f64) -> CoreResult<()> {
        Self::check_non_negative("duration probability", value)?;
        self.duration_probability = value;
        Ok(())
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }

    pub fn set_probability(&mut self, value: f64) -> CoreResult<()> {
        Self::check_non_negative("probability", value)?;
        self.probability = value;
        Ok(())
    }

    fn check_non_negative(what: &str, value: f64) -> CoreResult<()> {
        if !value.is_finite() || value < 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Module {} must be a finite non-negative number, got {}",
                what, value
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_starts_with_empty_ports() {
        let base = ModuleBase::new("memory");
        assert_eq!(base.name(), "memory");
        assert!(base.ports().inputs().is_empty());
        assert!(base.ports().outputs().is_empty());
        assert_eq!(base.duration(), 0.0);
    }

    #[test]
    fn test_simulation_attributes_reject_negative() {
        let mut base = ModuleBase::new("memory");
        assert!(base.set_duration(-0.1).is_err());
        assert!(base.set_duration_probability(f64::NAN).is_err());
        assert!(base.set_probability(-1.0).is_err());
        base.set_duration(0.05).unwrap();
        assert_eq!(base.duration(), 0.05);
    }
}
