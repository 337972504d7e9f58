//! Deterministic names for accumulation buffers.
//!
//! The host routes matrices by name, so every allocation gets a fresh
//! identifier derived from the owning engine's seed and its allocation count.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_SEED: AtomicU32 = AtomicU32::new(1);

/// Hand out a distinct seed per engine instance.
pub fn next_seed() -> u32 {
    NEXT_SEED.fetch_add(1, Ordering::Relaxed)
}

/// Extremely small non-cryptographic hash (FNV-1a) used for buffer names.
#[derive(Copy, Clone, Debug)]
pub struct SimpleHash(u32);

impl SimpleHash {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ (*b as u32)).wrapping_mul(16_777_619);
        }
    }

    /// Finalise the hash and return a 32-bit value.
    pub fn finish32(&self) -> u32 {
        self.0
    }
}

impl Default for SimpleHash {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque identifier of one accumulation buffer allocation.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct BufferHandle {
    seed: u32,
    generation: u32,
}

impl BufferHandle {
    pub fn new(seed: u32, generation: u32) -> Self {
        Self { seed, generation }
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Host-style matrix name: `u` followed by nine hex digits.
    pub fn name(&self) -> String {
        let mut hasher = SimpleHash::new();
        hasher.update(&self.seed.to_le_bytes());
        hasher.update(&self.generation.to_le_bytes());
        // low nibble of the generation keeps names distinct when hashes collide
        format!("u{:08x}{:x}", hasher.finish32(), self.generation & 0xf)
    }
}

impl fmt::Display for BufferHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}
