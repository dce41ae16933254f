//! Discrete power levels for the motor driver output.

use crate::error::BuildError;

pub const MAX_POWER: i32 = 255;

const DEFAULT_LEVELS: [i32; 7] = [30, 95, 100, 105, 110, 120, 250];

/// Fixed table of drive levels addressed by index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PowerMap {
    levels: Vec<i32>,
}

impl Default for PowerMap {
    fn default() -> Self {
        Self {
            levels: DEFAULT_LEVELS.to_vec(),
        }
    }
}

impl PowerMap {
    pub fn new(levels: Vec<i32>) -> Result<Self, BuildError> {
        if levels.is_empty() {
            return Err(BuildError::EmptyPowerMap);
        }
        Ok(Self { levels })
    }

    /// Output duty for a table index, clamped to `0..=255`. Indices past the
    /// end of the table drive 0.
    pub fn power_level_for(&self, index: usize) -> u8 {
        self.levels
            .get(index)
            .map(|&v| u8::try_from(v.clamp(0, MAX_POWER)).unwrap_or(u8::MAX))
            .unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Reject any index list entry that would fall outside the table.
    pub fn check_indices(&self, table: &'static str, indices: &[usize]) -> Result<(), BuildError> {
        match indices.iter().find(|&&i| i >= self.levels.len()) {
            Some(&index) => Err(BuildError::IndexOutOfRange { table, index }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_into_byte_range() {
        let map = PowerMap::new(vec![-20, 128, 400]).expect("non-empty");
        assert_eq!(map.power_level_for(0), 0);
        assert_eq!(map.power_level_for(1), 128);
        assert_eq!(map.power_level_for(2), 255);
    }

    #[test]
    fn out_of_table_index_is_off() {
        let map = PowerMap::default();
        assert_eq!(map.power_level_for(7), 0);
    }

    #[test]
    fn empty_map_is_rejected() {
        assert_eq!(PowerMap::new(Vec::new()), Err(BuildError::EmptyPowerMap));
    }
}
