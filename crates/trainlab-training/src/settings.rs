use crate::error::{TrainingError, TrainingResult};
use std::time::Duration;

/// Cadence of a simulated run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulationSettings {
    /// Wall time between two ticks.
    pub tick_interval: Duration,
    /// Pause between reaching 100% and finalizing the model.
    pub grace_period: Duration,
    /// Points kept per display history.
    pub history_len: usize,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(500),
            grace_period: Duration::from_millis(1000),
            history_len: 20,
        }
    }
}

impl SimulationSettings {
    pub fn validate(&self) -> TrainingResult<()> {
        if self.tick_interval.is_zero() {
            return Err(TrainingError::InvalidSettings("tick_interval must be > 0".to_string()));
        }
        if self.history_len == 0 {
            return Err(TrainingError::InvalidSettings("history_len must be >= 1".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let settings = SimulationSettings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.history_len, 20);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let settings =
            SimulationSettings { tick_interval: Duration::ZERO, ..SimulationSettings::default() };
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_history() {
        let settings = SimulationSettings { history_len: 0, ..SimulationSettings::default() };
        assert!(settings.validate().is_err());
    }
}
