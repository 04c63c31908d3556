use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;

/// Which reactions of an item get sent for tone scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SamplingPolicy {
    /// The first `size` reactions.
    Prefix { size: usize },
    /// `size` reactions chosen by a PRNG seeded with `seed`. The same seed
    /// and reaction count always pick the same indices.
    Seeded { size: usize, seed: u64 },
}

impl Default for SamplingPolicy {
    fn default() -> Self {
        SamplingPolicy::Prefix { size: 5 }
    }
}

impl SamplingPolicy {
    pub fn size(&self) -> usize {
        match *self {
            SamplingPolicy::Prefix { size } | SamplingPolicy::Seeded { size, .. } => size,
        }
    }

    /// Indices into a reaction list of length `len`, ascending.
    pub fn select(&self, len: usize) -> Vec<usize> {
        let size = self.size().min(len);
        match *self {
            SamplingPolicy::Prefix { .. } => (0..size).collect(),
            SamplingPolicy::Seeded { seed, .. } => {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut picked = index::sample(&mut rng, len, size).into_vec();
                picked.sort_unstable();
                picked
            }
        }
    }
}
