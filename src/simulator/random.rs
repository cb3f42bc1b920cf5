use std::sync::Mutex;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub(crate) trait RandomGenerator: std::fmt::Debug + Send + Sync {
    /// Returns `true` with probability `chance`.
    fn gen_bool(&self, chance: f64) -> bool;

    /// Returns a number in `[start, end)`.
    fn gen_in_range(&self, start: u64, end: u64) -> u64;
}

#[derive(Debug)]
pub(crate) struct ChaCha8RandomGenerator {
    rng: Mutex<ChaCha8Rng>,
}

impl ChaCha8RandomGenerator {
    pub(crate) fn new() -> Self {
        Self::from_seed(rand::thread_rng().gen())
    }

    pub(crate) fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(ChaCha8Rng::seed_from_u64(seed)),
        }
    }
}

impl RandomGenerator for ChaCha8RandomGenerator {
    fn gen_bool(&self, chance: f64) -> bool {
        let mut rng = self.rng.lock().unwrap();
        rng.gen_bool(chance)
    }

    fn gen_in_range(&self, start: u64, end: u64) -> u64 {
        let mut rng = self.rng.lock().unwrap();
        rng.gen_range(start..end)
    }
}

/// Fisher-Yates shuffle driven by `random`.
pub(crate) fn shuffle<T>(random: &dyn RandomGenerator, items: &mut [T]) {
    for i in (1..items.len()).rev() {
        let j = random.gen_in_range(0, i as u64 + 1) as usize;
        items.swap(i, j);
    }
}
