//! Seeded pseudo-random stream derived from a string.
//!
//! Two fixed algorithms, chosen so other implementations can reproduce a
//! board from the same seed bit for bit:
//!
//! 1. `xmur3`: hashes the seed's UTF-16 code units into a 32-bit state, then
//!    yields a stream of mixed 32-bit values.
//! 2. `xoshiro128**`: a 128-bit xorshift generator whose four state words are
//!    the first four `xmur3` outputs.
//!
//! The shuffle is Fisher-Yates from the last index down, drawing each swap
//! index as `(next_u32 * (i + 1)) >> 32`.

/// String hash with a stream of finalized outputs.
#[derive(Debug, Clone)]
pub struct Xmur3 {
    h: u32,
}

impl Xmur3 {
    pub fn new(input: &str) -> Self {
        let units: Vec<u16> = input.encode_utf16().collect();
        let mut h = 1_779_033_703u32 ^ units.len() as u32;
        for unit in units {
            h = (h ^ unit as u32).wrapping_mul(3_432_918_353);
            h = h.rotate_left(13);
        }
        Self { h }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut h = self.h;
        h = (h ^ (h >> 16)).wrapping_mul(2_246_822_507);
        h = (h ^ (h >> 13)).wrapping_mul(3_266_489_909);
        h ^= h >> 16;
        self.h = h;
        h
    }
}

/// `xoshiro128**` generator.
#[derive(Debug, Clone)]
pub struct SeededRng {
    s: [u32; 4],
}

impl SeededRng {
    pub fn from_seed(seed: &str) -> Self {
        let mut hash = Xmur3::new(seed);
        let mut s = [hash.next_u32(), hash.next_u32(), hash.next_u32(), hash.next_u32()];
        // An all-zero state would only ever yield zeros.
        if s == [0; 4] {
            s[0] = 1;
        }
        Self { s }
    }

    pub fn next_u32(&mut self) -> u32 {
        let [a, b, c, d] = &mut self.s;
        let result = b.wrapping_mul(5).rotate_left(7).wrapping_mul(9);
        let t = *b << 9;
        *c ^= *a;
        *d ^= *b;
        *b ^= *c;
        *a ^= *d;
        *c ^= t;
        *d = d.rotate_left(11);
        result
    }

    /// Integer in `[0, bound)`; `bound` must be non-zero.
    pub fn below(&mut self, bound: u32) -> u32 {
        ((self.next_u32() as u64 * bound as u64) >> 32) as u32
    }

    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.below(i as u32 + 1) as usize;
            items.swap(i, j);
        }
    }
}

/// A fresh seed for a viewer who arrived without one, rendered in decimal.
pub fn fresh_seed() -> String {
    Xmur3::new(&uuid::Uuid::new_v4().to_string()).next_u32().to_string()
}
