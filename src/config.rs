//! Simulation parameters, threaded explicitly into everything that needs them.
//!
//! All knobs live in one place so a run is fully described by one [`Config`]
//! value. Validation happens once, before the habitat is built; after that
//! every component may trust the numbers.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: f64 },

    #[error("{name} range is empty or inverted: {low}..{high}")]
    EmptyRange {
        name: &'static str,
        low: f64,
        high: f64,
    },

    #[error("{name} must lie within {low}..{high}, got {value}")]
    OutOfRange {
        name: &'static str,
        low: f64,
        high: f64,
        value: f64,
    },
}

/// Everything a single simulation run is parameterized by.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Habitat half-width: positions live in `[-window_size, window_size]`
    /// on both axes.
    pub window_size: f64,
    /// Maximum number of ticks before the run finishes.
    pub tick_budget: u64,
    /// Update rate of the event loop. A scheduling nicety, not part of the
    /// simulation semantics.
    pub ticks_per_second: u64,
    /// Global scaling applied to every per-tick displacement.
    pub speed_factor: f64,
    /// Global scaling of the age-dependent energy curves.
    pub energy_factor: f64,
    /// Emit a tracing event for every kill, starvation and birth.
    pub event_log: bool,
    /// Start a fresh run when the current one finishes.
    pub loop_simulation: bool,
    /// Per-tick probability that a fresh plant sprouts somewhere.
    pub plant_regrowth: f64,

    pub seed_herbivores: usize,
    pub seed_omnivores: usize,
    pub seed_carnivores: usize,
    pub seed_plants: usize,

    /// Seeded organisms get a size drawn uniformly from this range.
    pub size_range: (f64, f64),
    /// Seeded organisms get a speed drawn uniformly from this range.
    pub speed_range: (f64, f64),
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window_size: 100.,
            tick_budget: 200,
            ticks_per_second: 2,
            speed_factor: 1.,
            // tuned so a mid-sized consumer outlives roughly the tick budget
            energy_factor: 5e-5,
            event_log: false,
            loop_simulation: false,
            plant_regrowth: 0.7,
            seed_herbivores: 5,
            seed_omnivores: 7,
            seed_carnivores: 5,
            seed_plants: 15,
            size_range: (1., 7.),
            speed_range: (5., 10.),
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        fn positive(name: &'static str, value: f64) -> Result<(), ConfigError> {
            if value > 0. {
                Ok(())
            } else {
                Err(ConfigError::NonPositive { name, value })
            }
        }
        fn range(name: &'static str, (low, high): (f64, f64)) -> Result<(), ConfigError> {
            if low > 0. && low < high {
                Ok(())
            } else {
                Err(ConfigError::EmptyRange { name, low, high })
            }
        }
        positive("window_size", self.window_size)?;
        positive("tick_budget", self.tick_budget as f64)?;
        positive("ticks_per_second", self.ticks_per_second as f64)?;
        positive("speed_factor", self.speed_factor)?;
        if self.energy_factor < 0. {
            return Err(ConfigError::NonPositive {
                name: "energy_factor",
                value: self.energy_factor,
            });
        }
        range("size_range", self.size_range)?;
        range("speed_range", self.speed_range)?;
        if !(0.0..=1.0).contains(&self.plant_regrowth) {
            return Err(ConfigError::OutOfRange {
                name: "plant_regrowth",
                low: 0.,
                high: 1.,
                value: self.plant_regrowth,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert_eq!(Config::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_nonpositive_window() {
        let cfg = Config {
            window_size: 0.,
            ..Config::default()
        };
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::NonPositive {
                name: "window_size",
                value: 0.,
            })
        );
    }

    #[test]
    fn rejects_inverted_spawn_range() {
        let cfg = Config {
            speed_range: (10., 5.),
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyRange {
                name: "speed_range",
                ..
            })
        ));
    }

    #[test]
    fn rejects_regrowth_above_one() {
        let cfg = Config {
            plant_regrowth: 1.5,
            ..Config::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::OutOfRange {
                name: "plant_regrowth",
                ..
            })
        ));
    }
}
