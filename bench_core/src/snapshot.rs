/// One closed measurement window in physical units.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Measurement {
    pub rpm: i32,
    pub volts: f32,
    pub amps: f32,
}

impl Measurement {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Current as shown on screen; offset noise below zero reads as 0.
    #[inline]
    pub fn display_amps(&self) -> f32 {
        self.amps.max(0.0)
    }

    pub fn watts(&self) -> f32 {
        self.volts * self.amps
    }
}

/// Ride-simulation totals for one run. Never decreases until `reset`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunAccumulator {
    pub distance_m: f64,
    pub energy_wh: f64,
    pub elapsed_s: f64,
}

impl RunAccumulator {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Charge drawn in mAh assuming a fixed pack voltage.
    pub fn charge_mah(&self, pack_volts: f32) -> f64 {
        if pack_volts > 0.0 {
            self.energy_wh / f64::from(pack_volts) * 1000.0
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_current_is_hidden_only_on_display() {
        let m = Measurement {
            rpm: 0,
            volts: 3.0,
            amps: -0.4,
        };
        assert_eq!(m.display_amps(), 0.0);
        assert!(m.watts() < 0.0);
    }

    #[test]
    fn charge_at_nominal_pack() {
        let acc = RunAccumulator {
            energy_wh: 2.4,
            ..RunAccumulator::default()
        };
        assert!((acc.charge_mah(2.4) - 1000.0).abs() < 1e-9);
        assert_eq!(acc.charge_mah(0.0), 0.0);
    }
}
