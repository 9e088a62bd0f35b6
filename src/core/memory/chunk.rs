use crate::core::error::{CoreError, CoreResult};
use crate::core::port::Slots;

/// One memorized item: a content mapping plus its reinforcement history
///
/// A chunk's identity is its contents; two chunks are the same memory
/// iff their contents compare equal. The trace list is never empty and
/// never decreases.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    contents: Slots,
    traces: Vec<f64>,
    decay_rate: f64,
}

impl Chunk {
    /// Create a chunk with a single trace at its creation time
    pub fn new(creation_time: f64, contents: Slots, decay_rate: f64) -> Self {
        Self {
            contents,
            traces: vec![creation_time],
            decay_rate,
        }
    }

    pub fn contents(&self) -> &Slots {
        &self.contents
    }

    pub fn traces(&self) -> &[f64] {
        &self.traces
    }

    pub fn decay_rate(&self) -> f64 {
        self.decay_rate
    }

    pub fn set_decay_rate(&mut self, decay_rate: f64) -> CoreResult<()> {
        if !decay_rate.is_finite() || decay_rate <= 0.0 {
            return Err(CoreError::InvalidArgument(format!(
                "Chunk decay rate must be a finite positive number, got {}",
                decay_rate
            )));
        }
        self.decay_rate = decay_rate;
        Ok(())
    }

    /// Record a reinforcement at `time`; the trace list stays monotone
    pub fn add_trace(&mut self, time: f64) -> CoreResult<()> {
        if !time.is_finite() {
            return Err(CoreError::InvalidArgument(format!(
                "Trace time must be a finite number, got {}",
                time
            )));
        }
        if let Some(last) = self.traces.last() {
            if time < *last {
                return Err(CoreError::InvalidArgument(format!(
                    "Trace time {} precedes the latest trace {}",
                    time, last
                )));
            }
        }
        self.traces.push(time);
        Ok(())
    }

    /// Remove one reinforcement; the trace list must stay non-empty
    pub fn remove_trace(&mut self, time: f64) -> CoreResult<()> {
        let position = self
            .traces
            .iter()
            .position(|t| *t == time)
            .ok_or_else(|| {
                CoreError::InvalidArgument(format!("No trace at time {} to remove", time))
            })?;
        if self.traces.len() == 1 {
            return Err(CoreError::InvalidArgument(
                "Removing the last trace would leave the chunk without history".to_string(),
            ));
        }
        self.traces.remove(position);
        Ok(())
    }

    /// Base-level-learning activation at `time`
    ///
    /// `ln(Σ (time − t_i)^(−decay_rate))` over traces strictly before
    /// `time`. Returns `None` when no trace precedes `time` (a chunk
    /// created at exactly `time` has no defined activation yet).
    pub fn activation(&self, time: f64) -> Option<f64> {
        let odds: f64 = self
            .traces
            .iter()
            .filter(|t| **t < time)
            .map(|t| (time - t).powf(-self.decay_rate))
            .sum();
        if odds > 0.0 {
            Some(odds.ln())
        } else {
            None
        }
    }

    /// Whether this chunk's contents are a superset of the cue
    pub fn matches(&self, cue: &Slots) -> bool {
        cue.iter()
            .all(|(key, value)| self.contents.get(key) == Some(value))
    }
}
