use crate::games::types::Pocket;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// Source of spin outcomes
pub trait Wheel: Send + Sync {
    /// Draw one pocket. Never fails.
    fn spin(&self) -> Pocket;
}

/// Uniform 38-pocket wheel driven by a `StdRng`
pub struct RngWheel {
    rng: Mutex<StdRng>,
}

impl RngWheel {
    /// Wheel seeded from operating system entropy
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }

    /// Reproducible wheel for simulations and replays
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Build from an optional configured seed
    pub fn from_seed(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::new(),
        }
    }
}

impl Default for RngWheel {
    fn default() -> Self {
        Self::new()
    }
}

impl Wheel for RngWheel {
    fn spin(&self) -> Pocket {
        // A poisoned lock still holds a usable generator
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        let index = rng.gen_range(0..Pocket::COUNT);
        Pocket::from_index(index).unwrap_or(Pocket::DoubleZero)
    }
}

/// Wheel that always lands on the same pocket
#[derive(Debug, Clone, Copy)]
pub struct FixedWheel(pub Pocket);

impl Wheel for FixedWheel {
    fn spin(&self) -> Pocket {
        self.0
    }
}

/// Wheel that replays a fixed sequence of pockets, wrapping around
#[derive(Debug)]
pub struct SequenceWheel {
    pockets: Vec<Pocket>,
    next: AtomicUsize,
}

impl SequenceWheel {
    /// Panics on an empty sequence
    pub fn new(pockets: Vec<Pocket>) -> Self {
        assert!(!pockets.is_empty(), "SequenceWheel needs at least one pocket");
        Self {
            pockets,
            next: AtomicUsize::new(0),
        }
    }
}

impl Wheel for SequenceWheel {
    fn spin(&self) -> Pocket {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.pockets[i % self.pockets.len()]
    }
}
