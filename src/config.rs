use std::time::Duration;

/// How a `Machine` runs its program. The architecture itself (memory size,
/// stack depth, where programs start) isn't configurable.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MachineConfig {
    /// stop after this many steps; `None` runs until cancelled or crashed
    pub max_steps: Option<u64>,
    /// sleep this long after each step; `None` runs flat out
    pub step_interval: Option<Duration>,
}

impl MachineConfig {
    pub fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }

    /// pace the machine at roughly `hz` instructions per second
    pub fn with_clock_hz(mut self, hz: u32) -> Self {
        self.step_interval = match hz {
            0 => None,
            hz => Some(Duration::from_nanos(1_000_000_000 / hz as u64)),
        };
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded_and_unpaced() {
        let c = MachineConfig::default();
        assert_eq!(c.max_steps, None);
        assert_eq!(c.step_interval, None);
    }

    #[test]
    fn test_clock_hz() {
        let c = MachineConfig::default().with_clock_hz(500);
        assert_eq!(c.step_interval, Some(Duration::from_millis(2)));
        let c = c.with_clock_hz(0);
        assert_eq!(c.step_interval, None);
    }

    #[test]
    fn test_max_steps() {
        assert_eq!(MachineConfig::default().with_max_steps(18_000).max_steps, Some(18_000));
    }
}
