//! Per-tick population statistics.
//!
//! Once per tick the population hands a snapshot of every living organism's
//! speed and size to a [`StatsSink`]. The CSV sink is the file counterpart
//! of the old live scatter plot: one aggregated line per tick, cheap to
//! re-plot offline.

use crate::organism::Kind;

/// One living organism, reduced to what the plots care about.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sample {
    pub kind: Kind,
    pub speed: f64,
    pub size: f64,
}

pub trait StatsSink {
    fn observe(&mut self, tick: u64, samples: &[Sample]);
}

/// Sink that swallows everything, for tests and headless stepping.
#[allow(dead_code)]
pub struct NullStats;

impl StatsSink for NullStats {
    fn observe(&mut self, _tick: u64, _samples: &[Sample]) {}
}

pub struct CsvStats {
    file: std::fs::File,
}

impl CsvStats {
    pub fn create(path: &str) -> std::io::Result<Self> {
        use std::io::Write;
        let mut file = std::fs::File::create(path)?;
        file.write_all(
            b"tick, total, plants, herbivores, omnivores, carnivores, avg_speed, avg_size\n",
        )?;
        Ok(Self { file })
    }
}

impl StatsSink for CsvStats {
    fn observe(&mut self, tick: u64, samples: &[Sample]) {
        let mut counts = [0usize; 4];
        let mut speed_sum = 0.;
        let mut size_sum = 0.;
        for s in samples {
            let slot = match s.kind {
                Kind::Plant => 0,
                Kind::Herbivore => 1,
                Kind::Omnivore => 2,
                Kind::Carnivore => 3,
            };
            counts[slot] += 1;
            speed_sum += s.speed;
            size_sum += s.size;
        }
        let n = samples.len().max(1) as f64;
        let line = format!(
            "{}, {}, {}, {}, {}, {}, {}, {}\n",
            tick,
            samples.len(),
            counts[0],
            counts[1],
            counts[2],
            counts[3],
            speed_sum / n,
            size_sum / n,
        );
        std::io::Write::write_all(&mut self.file, line.as_bytes()).unwrap();
    }
}
