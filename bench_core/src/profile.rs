//! Distance-triggered power schedules for ride simulation.

use crate::error::BuildError;

/// Switch to `power_index` once `trigger_m` into the current cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProfileStep {
    pub trigger_m: f64,
    pub power_index: usize,
}

impl ProfileStep {
    pub const fn new(trigger_m: f64, power_index: usize) -> Self {
        Self {
            trigger_m,
            power_index,
        }
    }
}

/// Only constructible through `new` or the built-ins, so `steps` is never
/// empty and the cyclic lookups below always have a divisor.
#[derive(Debug, Clone, PartialEq)]
pub struct PowerProfile {
    name: String,
    steps: Vec<ProfileStep>,
    cycle_meters: f64,
    cycles: u32,
}

impl PowerProfile {
    pub fn new(
        name: impl Into<String>,
        steps: Vec<ProfileStep>,
        cycle_meters: f64,
        cycles: u32,
    ) -> Result<Self, BuildError> {
        let Some(first) = steps.first() else {
            return Err(BuildError::InvalidConfig("profile has no steps"));
        };
        if first.trigger_m != 0.0 {
            return Err(BuildError::InvalidConfig(
                "profile must start with a step at 0 m",
            ));
        }
        if steps.windows(2).any(|w| w[1].trigger_m <= w[0].trigger_m) {
            return Err(BuildError::InvalidConfig(
                "profile step triggers must be strictly increasing",
            ));
        }
        if !(cycle_meters.is_finite() && cycle_meters > 0.0) {
            return Err(BuildError::InvalidConfig("profile cycle length must be > 0"));
        }
        if steps.iter().any(|s| s.trigger_m >= cycle_meters) {
            return Err(BuildError::InvalidConfig(
                "profile step triggers must fall inside one cycle",
            ));
        }
        if cycles == 0 {
            return Err(BuildError::InvalidConfig("profile cycles must be >= 1"));
        }
        Ok(Self {
            name: name.into(),
            steps,
            cycle_meters,
            cycles,
        })
    }

    /// The sprint pattern used for pack endurance runs.
    pub fn sprint() -> Self {
        Self {
            name: "sprint".into(),
            steps: vec![
                ProfileStep::new(0.0, 3),
                ProfileStep::new(10.0, 1),
                ProfileStep::new(15.0, 6),
                ProfileStep::new(18.0, 1),
                ProfileStep::new(25.0, 6),
                ProfileStep::new(28.0, 1),
                ProfileStep::new(30.0, 2),
            ],
            cycle_meters: 40.0,
            cycles: 5,
        }
    }

    pub fn steady() -> Self {
        Self {
            name: "steady".into(),
            steps: vec![ProfileStep::new(0.0, 2)],
            cycle_meters: 20.0,
            cycles: 3,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[ProfileStep] {
        &self.steps
    }

    pub fn cycle_meters(&self) -> f64 {
        self.cycle_meters
    }

    pub fn cycles(&self) -> u32 {
        self.cycles
    }

    pub fn total_meters(&self) -> f64 {
        self.cycle_meters * f64::from(self.cycles)
    }

    /// Step active at a running status index (which counts across cycles).
    pub fn step_at(&self, status_index: usize) -> ProfileStep {
        self.steps[status_index % self.steps.len()]
    }

    /// 1-based cycle number for a running status index.
    pub fn cycle_at(&self, status_index: usize) -> usize {
        status_index / self.steps.len() + 1
    }

    /// Absolute distance at which the step after `status_index` begins.
    pub fn next_trigger_m(&self, status_index: usize) -> f64 {
        let n = self.steps.len();
        let next = status_index + 1;
        self.steps[next % n].trigger_m + self.cycle_meters * (next / n) as f64
    }

    pub fn power_indices(&self) -> Vec<usize> {
        self.steps.iter().map(|s| s.power_index).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sprint_totals_two_hundred_meters() {
        let p = PowerProfile::sprint();
        assert_eq!(p.total_meters(), 200.0);
        assert_eq!(p.cycle_at(6), 1);
        assert_eq!(p.cycle_at(7), 2);
        // step 6 (30 m) is followed by cycle 2's first step at 40 m
        assert_eq!(p.next_trigger_m(6), 40.0);
        assert_eq!(p.next_trigger_m(7), 50.0);
    }

    #[test]
    fn rejects_out_of_order_steps() {
        let err = PowerProfile::new(
            "bad",
            vec![ProfileStep::new(0.0, 1), ProfileStep::new(0.0, 2)],
            10.0,
            1,
        )
        .expect_err("duplicate trigger");
        assert!(err.to_string().contains("strictly increasing"));
    }

    #[test]
    fn rejects_empty_steps() {
        let err = PowerProfile::new("empty", Vec::new(), 10.0, 1).expect_err("no steps");
        assert_eq!(err, BuildError::InvalidConfig("profile has no steps"));
    }
}
