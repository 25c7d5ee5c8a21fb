use arg_core::derive_substream_seed;

/// Seed for an independent chain run from `master_seed`.
pub fn chain_seed(master_seed: u64, chain: usize) -> u64 {
    derive_substream_seed(master_seed, chain as u64)
}

/// Seed for the RNG driving one proposal of a chain.
pub fn move_seed(master_seed: u64, chain: usize, iteration: u64) -> u64 {
    derive_substream_seed(chain_seed(master_seed, chain), iteration)
}
