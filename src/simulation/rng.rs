use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Independent random streams drawn from within a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stream {
    Weather,
    Governance,
    Animals,
    Events,
    Spawn,
    Notables,
}

impl Stream {
    fn offset(self) -> u64 {
        match self {
            Stream::Weather => 0,
            Stream::Governance => 1,
            Stream::Animals => 2,
            Stream::Events => 3,
            Stream::Spawn => 4,
            Stream::Notables => 5,
        }
    }
}

/// Deterministic seed for one stream of one tick of one island.
pub fn stream_seed(island_seed: u64, tick: u64, stream: Stream) -> u64 {
    island_seed
        .wrapping_mul(6364136223846793005)
        .wrapping_add(tick)
        .wrapping_mul(1442695040888963407)
        .wrapping_add(stream.offset())
}

pub fn stream_rng(island_seed: u64, tick: u64, stream: Stream) -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(stream_seed(island_seed, tick, stream))
}
