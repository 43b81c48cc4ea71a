//! Branch decisions for the simulation ticker.
//!
//! The ticker never touches a random number generator directly. It asks a
//! `Decider` which branch to take, so tests can force a branch and demo runs
//! can be replayed from a seed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crewflow_protocol::{COMPLETE_PROBABILITY, INTERVENTION_PROBABILITY, OUTPUT_PROBABILITY};

/// Source of the simulation's branch choices.
pub trait Decider: Send + Sync {
    /// Should the active task complete this tick?
    fn complete_active(&mut self) -> bool;
    /// Should the active task record an output this tick?
    fn emit_output(&mut self) -> bool;
    /// Should the supervisor intervene this tick?
    fn intervene(&mut self) -> bool;
    /// Pick an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Per-tick branch probabilities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickOdds {
    pub complete: f64,
    pub output: f64,
    pub intervention: f64,
}

impl Default for TickOdds {
    fn default() -> Self {
        Self {
            complete: COMPLETE_PROBABILITY,
            output: OUTPUT_PROBABILITY,
            intervention: INTERVENTION_PROBABILITY,
        }
    }
}

impl TickOdds {
    fn clamped(self) -> Self {
        Self {
            complete: self.complete.clamp(0.0, 1.0),
            output: self.output.clamp(0.0, 1.0),
            intervention: self.intervention.clamp(0.0, 1.0),
        }
    }
}

/// Probabilistic decider backed by a seedable `StdRng`.
pub struct RandomDecider {
    rng: StdRng,
    odds: TickOdds,
}

impl RandomDecider {
    /// Seeded when `seed` is set, from entropy otherwise.
    pub fn new(odds: TickOdds, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            odds: odds.clamped(),
        }
    }
}

impl Decider for RandomDecider {
    fn complete_active(&mut self) -> bool {
        self.rng.gen_bool(self.odds.complete)
    }

    fn emit_output(&mut self) -> bool {
        self.rng.gen_bool(self.odds.output)
    }

    fn intervene(&mut self) -> bool {
        self.rng.gen_bool(self.odds.intervention)
    }

    fn pick(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len.max(1))
    }
}

/// Decider with fixed answers. Picks cycle through `0..len`.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecider {
    pub complete: bool,
    pub output: bool,
    pub intervene: bool,
    cursor: usize,
}

impl ScriptedDecider {
    pub fn new(complete: bool, output: bool, intervene: bool) -> Self {
        Self {
            complete,
            output,
            intervene,
            cursor: 0,
        }
    }

    /// Always takes the "complete current task" branch.
    pub fn always_complete() -> Self {
        Self::new(true, false, false)
    }

    /// Never changes anything.
    pub fn idle() -> Self {
        Self::new(false, false, false)
    }
}

impl Decider for ScriptedDecider {
    fn complete_active(&mut self) -> bool {
        self.complete
    }

    fn emit_output(&mut self) -> bool {
        self.output
    }

    fn intervene(&mut self) -> bool {
        self.intervene
    }

    fn pick(&mut self, len: usize) -> usize {
        let i = self.cursor % len.max(1);
        self.cursor += 1;
        i
    }
}
