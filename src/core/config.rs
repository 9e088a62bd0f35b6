use serde::{Deserialize, Serialize};

/// Configuration for the declarative memory engine
///
/// Validated when applied to a `DeclarativeMemory` (noise and decay
/// rate must be positive, the latency factor non-negative).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeclarativeConfig {
    /// Exponent governing how fast a trace's contribution fades with age
    pub decay_rate: f64,
    /// Softmax/logistic temperature; higher means more random retrieval
    pub noise: f64,
    /// Activation level required for confident retrieval
    pub threshold: f64,
    /// Scales how strongly sub-threshold activation inflates retrieval time
    pub latency_factor: f64,
    /// Whether a successful retrieval also reinforces the retrieved chunk
    pub encode_on_retrieval: bool,
}

impl DeclarativeConfig {
    pub fn new() -> Self {
        Self {
            decay_rate: 0.5,
            noise: 0.2,
            threshold: 0.0,
            latency_factor: 1.0,
            encode_on_retrieval: true,
        }
    }

    pub fn with_decay_rate(mut self, decay_rate: f64) -> Self {
        self.decay_rate = decay_rate;
        self
    }

    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise;
        self
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_latency_factor(mut self, latency_factor: f64) -> Self {
        self.latency_factor = latency_factor;
        self
    }

    pub fn with_encode_on_retrieval(mut self, encode_on_retrieval: bool) -> Self {
        self.encode_on_retrieval = encode_on_retrieval;
        self
    }
}

impl Default for DeclarativeConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for model orchestration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Upper bound on stabilization cycles before the run is aborted
    pub max_cycles: u64,
    /// Tick-to-seconds multiplier installed on the model clock
    pub time_scale: f64,
}

impl ModelConfig {
    pub fn new() -> Self {
        Self {
            max_cycles: 1000,
            time_scale: 1.0,
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: u64) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_time_scale(mut self, time_scale: f64) -> Self {
        self.time_scale = time_scale;
        self
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_declarative_config() {
        let config = DeclarativeConfig::default();
        assert_eq!(config.decay_rate, 0.5);
        assert_eq!(config.noise, 0.2);
        assert_eq!(config.threshold, 0.0);
        assert_eq!(config.latency_factor, 1.0);
        assert!(config.encode_on_retrieval);
    }

    #[test]
    fn test_config_builder() {
        let config = DeclarativeConfig::new()
            .with_noise(0.4)
            .with_threshold(-1.0)
            .with_encode_on_retrieval(false);
        assert_eq!(config.noise, 0.4);
        assert_eq!(config.threshold, -1.0);
        assert!(!config.encode_on_retrieval);
    }

    #[test]
    fn test_default_model_config() {
        let config = ModelConfig::default().with_max_cycles(10);
        assert_eq!(config.max_cycles, 10);
        assert_eq!(config.time_scale, 1.0);
    }
}
