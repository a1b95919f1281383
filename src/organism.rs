//! A single organism and its per-tick behavioral rules.
//!
//! Organisms come in four kinds. Three of them (herbivore, omnivore,
//! carnivore) hunt whatever their prey set allows and burn energy doing so;
//! plants sit still and photosynthesize. What an organism may eat, how it
//! moves and how its energy develops with age is all decided here. Who
//! actually eats whom on a given tick is resolved by the population in the
//! app module, since that needs the whole herd.

use crate::config::ConfigError;
use rand::Rng;

/// Handle the population hands out at spawn time, never reused within a run.
/// The render sink addresses draw/undraw calls by it.
pub type OrganismId = u64;

/// Energy every organism starts its life with.
pub const INITIAL_ENERGY: f64 = 25.;
/// Reaching this much energy triggers reproduction.
pub const REPRODUCTION_THRESHOLD: f64 = 30.;
/// Energy deducted from the parent on reproduction.
pub const REPRODUCTION_COST: f64 = 25.;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Kind {
    Plant,
    Herbivore,
    Omnivore,
    Carnivore,
}

impl Kind {
    /// The kinds this kind may consume. Same-kind entries additionally
    /// require a strict size advantage, see [`Organism::is_prey_of`].
    pub fn prey(self) -> &'static [Kind] {
        match self {
            Kind::Plant => &[],
            Kind::Herbivore => &[Kind::Plant],
            Kind::Carnivore => &[Kind::Herbivore, Kind::Omnivore, Kind::Carnivore],
            Kind::Omnivore => &[
                Kind::Plant,
                Kind::Herbivore,
                Kind::Omnivore,
                Kind::Carnivore,
            ],
        }
    }

    pub fn is_plant(self) -> bool {
        self == Kind::Plant
    }
}

/// The heritable part of an organism: combat strength / radius and top
/// speed. Fixed at creation, inherited unchanged (mutation would hook in
/// here, none is active).
#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Traits {
    size: f64,
    speed: f64,
}

impl Traits {
    pub fn new(size: f64, speed: f64) -> Result<Self, ConfigError> {
        if size <= 0. {
            return Err(ConfigError::NonPositive {
                name: "size",
                value: size,
            });
        }
        if speed <= 0. {
            return Err(ConfigError::NonPositive {
                name: "speed",
                value: speed,
            });
        }
        Ok(Self { size, speed })
    }

    pub fn size(self) -> f64 {
        self.size
    }

    pub fn speed(self) -> f64 {
        self.speed
    }
}

#[derive(Clone, Copy, PartialEq, Debug)]
pub struct Organism {
    pub id: OrganismId,
    pub pos: [f64; 2],
    pub energy: f64,
    /// Ticks survived so far.
    pub age: u64,
    kind: Kind,
    traits: Traits,
}

impl Organism {
    pub fn new(id: OrganismId, kind: Kind, pos: [f64; 2], traits: Traits) -> Self {
        Self {
            id,
            pos,
            energy: INITIAL_ENERGY,
            age: 0,
            kind,
            traits,
        }
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn traits(&self) -> Traits {
        self.traits
    }

    pub fn size(&self) -> f64 {
        self.traits.size
    }

    pub fn speed(&self) -> f64 {
        self.traits.speed
    }

    /// Whether `other` may consume `self`.
    ///
    /// True iff `self`s kind appears in `other`s prey set, with the extra
    /// twist that same-kind predation needs a strict size advantage.
    /// Cross-kind predation has no size requirement at all, a small
    /// herbivore is fair game for the largest plant-eater and vice versa.
    pub fn is_prey_of(&self, other: &Organism) -> bool {
        if !other.kind.prey().contains(&self.kind) {
            return false;
        }
        if self.kind == other.kind {
            self.size() < other.size()
        } else {
            true
        }
    }

    /// Manhattan distance. Deliberately cheap, targeting does not need
    /// euclidean precision.
    pub fn distance_to(&self, other: &Organism) -> f64 {
        (other.pos[0] - self.pos[0]).abs() + (other.pos[1] - self.pos[1]).abs()
    }

    /// Clamped pursuit: on each axis move by at most the (scaled) top speed,
    /// but never past the target.
    pub fn move_toward(&mut self, target: [f64; 2], speed_factor: f64) {
        let max_step = self.speed() * speed_factor;
        for axis in 0..2 {
            let delta = target[axis] - self.pos[axis];
            self.pos[axis] += delta.signum() * delta.abs().min(max_step);
        }
    }

    /// Undirected wander, each axis drawn independently.
    pub fn move_random<R: Rng>(&mut self, mut rng: R, speed_factor: f64) {
        let speed = self.speed();
        self.pos[0] += rng.random_range(-speed..speed) * speed_factor;
        self.pos[1] += rng.random_range(-speed..speed) * speed_factor;
    }

    /// Keep the organism's circular extent inside the habitat square.
    ///
    /// Edges are checked in a fixed order (right, left, top, bottom) and
    /// only the first violated one is snapped, so a corner overshoot gets
    /// its x corrected this tick and its y the next. Deliberate policy, not
    /// a simultaneous two-axis clamp.
    pub fn stay_in_bounds(&mut self, window_size: f64) {
        let r = self.size();
        if self.pos[0] + r >= window_size {
            self.pos[0] = window_size - r;
        } else if self.pos[0] - r <= -window_size {
            self.pos[0] = -window_size + r;
        } else if self.pos[1] + r >= window_size {
            self.pos[1] = window_size - r;
        } else if self.pos[1] - r <= -window_size {
            self.pos[1] = -window_size + r;
        }
    }

    /// Box overlap test: does either center fall into the other's
    /// `pos ± size` square? The second box is only consulted when the first
    /// fails on the x axis, matching the collision semantics the rest of the
    /// rules are balanced against.
    pub fn collides_with(&self, other: &Organism) -> bool {
        let r = self.size();
        let or = other.size();
        if (self.pos[0] - r) <= other.pos[0] && other.pos[0] <= (self.pos[0] + r) {
            (self.pos[1] - r) <= other.pos[1] && other.pos[1] <= (self.pos[1] + r)
        } else if (other.pos[0] - or) <= self.pos[0] && self.pos[0] <= (other.pos[0] + or) {
            (other.pos[1] - or) <= self.pos[1] && self.pos[1] <= (other.pos[1] + or)
        } else {
            false
        }
    }

    /// Age-dependent quadratic efficiency curve shared by all energy rules.
    fn efficiency(&self, factor: f64, offset_x: f64, offset_y: f64) -> f64 {
        let age = self.age as f64;
        (age - offset_x).powi(2) * factor + offset_y
    }

    /// Kind-specific energy rule.
    ///
    /// Consumers pay metabolic upkeep scaling with `size³ · speed²`, cheapest
    /// at age 10 and growing quadratically away from it. Plants gather
    /// energy scaling with `size²` on a curve that never drops below
    /// `100 · energy_factor`.
    pub fn update_energy(&mut self, energy_factor: f64) {
        match self.kind {
            Kind::Plant => {
                self.energy +=
                    self.efficiency(energy_factor, 10., 100. * energy_factor) * self.size().powi(2);
            }
            _ => {
                self.energy -= self.efficiency(energy_factor / 20., 10., 0.)
                    * self.size().powi(3)
                    * self.speed().powi(2);
            }
        }
    }
}
