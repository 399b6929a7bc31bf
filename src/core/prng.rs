// Minimal PRNG (no external crates).
//
// This is NOT cryptographically secure.
// It is used only for weight/activation randomization and for the fixed-seed
// update sweep, where bit-for-bit reproducibility across runs is a contract.

#[derive(Debug, Clone)]
pub struct Prng {
    state: u64,
}

impl Prng {
    pub fn new(seed: u64) -> Self {
        // Avoid a zero state.
        let seed = if seed == 0 { 0x9E3779B97F4A7C15 } else { seed };
        Self { state: seed }
    }

    pub(crate) fn from_state(state: u64) -> Self {
        // Avoid a zero state.
        let state = if state == 0 {
            0x9E3779B97F4A7C15
        } else {
            state
        };
        Self { state }
    }

    pub(crate) fn state(&self) -> u64 {
        self.state
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        // Marsaglia / Vigna family. Simple, fast, decent for simulation noise.
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    /// Uniform in [0, 1) with full f64 mantissa resolution.
    #[inline]
    pub fn next_f64_01(&mut self) -> f64 {
        // Top 53 bits.
        let x = self.next_u64() >> 11;
        (x as f64) / ((1u64 << 53) as f64)
    }

    #[inline]
    pub fn gen_range_f64(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64_01()
    }

    /// Uniform index in [0, n), computed as `floor(u * n)`.
    ///
    /// The floor form is load-bearing: the update sweep specifies its draws
    /// this way, so the exact sequence of indices is part of the contract.
    #[inline]
    pub fn gen_index(&mut self, n: usize) -> usize {
        debug_assert!(n > 0);
        let i = (self.next_f64_01() * n as f64) as usize;
        // next_f64_01 is strictly below 1.0, but guard against rounding.
        i.min(n - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Prng::new(4_123_123);
        let mut b = Prng::new(4_123_123);
        for _ in 0..64 {
            assert_eq!(a.next_f64_01().to_bits(), b.next_f64_01().to_bits());
        }
    }

    #[test]
    fn zero_seed_is_remapped() {
        let mut z = Prng::new(0);
        // Must not get stuck at zero.
        let first = z.next_f64_01();
        let second = z.next_f64_01();
        assert_ne!(first.to_bits(), second.to_bits());
    }

    #[test]
    fn index_draws_stay_in_range() {
        let mut rng = Prng::new(7);
        for _ in 0..1000 {
            let i = rng.gen_index(5);
            assert!(i < 5);
        }
    }

    #[test]
    fn range_draws_respect_limits() {
        let mut rng = Prng::new(99);
        for _ in 0..1000 {
            let v = rng.gen_range_f64(-1.0, 1.0);
            assert!((-1.0..1.0).contains(&v));
        }
    }
}
