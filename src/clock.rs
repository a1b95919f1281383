//! Tick clock and stopping rule.
//!
//! The clock never steps the population itself, it only decides whether
//! another tick may happen. Plants do not count towards the "still alive"
//! threshold: a habitat with one hungry herbivore and a thousand plants is a
//! finished run, the outcome is decided.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ClockState {
    NotStarted,
    Running,
    Finished,
}

#[derive(Clone, Debug)]
pub struct Clock {
    state: ClockState,
    tick: u64,
    budget: u64,
}

impl Clock {
    pub fn new(budget: u64) -> Self {
        Self {
            state: ClockState::NotStarted,
            tick: 0,
            budget,
        }
    }

    pub fn state(&self) -> ClockState {
        self.state
    }

    /// Ticks completed so far.
    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn budget(&self) -> u64 {
        self.budget
    }

    pub fn is_running(&self) -> bool {
        self.state == ClockState::Running
    }

    /// Begin the run. A population that is already collapsed finishes
    /// immediately without a single tick.
    pub fn start(&mut self, living_consumers: usize) {
        self.state = if living_consumers <= 1 {
            ClockState::Finished
        } else {
            ClockState::Running
        };
    }

    /// Record a completed tick and re-evaluate the stopping rule.
    pub fn tick_done(&mut self, living_consumers: usize) -> ClockState {
        debug_assert_eq!(self.state, ClockState::Running);
        self.tick += 1;
        if self.tick >= self.budget || living_consumers <= 1 {
            self.state = ClockState::Finished;
        }
        self.state
    }
}
