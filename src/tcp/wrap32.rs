use std::fmt;
use std::ops::Add;

/// A 32-bit sequence number that wraps around modulo 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrap32 {
    value: u32,
}

impl Wrap32 {
    const WRAP_SIZE: u64 = 1 << 32;
    const HALF_WRAP: u64 = 1 << 31;

    pub fn new(value: u32) -> Self {
        Wrap32 { value }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    /// Wrap an absolute `n` given an initial sequence number `isn`.
    pub fn wrap(n: u64, isn: Wrap32) -> Self {
        Wrap32::new((n.wrapping_add(isn.value as u64)) as u32)
    }

    /// Unwrap `self` to the absolute sequence number closest to `checkpoint`,
    /// given the initial sequence number `isn`.
    pub fn unwrap(&self, isn: Wrap32, checkpoint: u64) -> u64 {
        // Relative offset of `self` from `isn`, in [0, 2^32).
        let relative = self.value.wrapping_sub(isn.value) as u64;

        // Number of extra wraps needed to land closest to `checkpoint`.
        let k = (checkpoint + Self::HALF_WRAP).saturating_sub(relative) >> 32;

        relative + k * Self::WRAP_SIZE
    }
}

impl Add for Wrap32 {
    type Output = Wrap32;

    fn add(self, other: Wrap32) -> Wrap32 {
        Wrap32::new(self.value.wrapping_add(other.value))
    }
}

impl fmt::Display for Wrap32 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::distributions::Distribution;
    use rand::distributions::Uniform;
    use rand::Rng;
    use rayon::prelude::*;

    #[test]
    fn test_wrap_zero_offset() {
        let seq_no = 3 * (1u64 << 32);
        let isn = Wrap32::new(0);
        assert_eq!(Wrap32::wrap(seq_no, isn), Wrap32::new(0));
    }

    #[test]
    fn test_wrap_positive_offset() {
        let seq_no = 3 * (1u64 << 32) + 17;
        let isn = Wrap32::new(15);
        assert_eq!(Wrap32::wrap(seq_no, isn), Wrap32::new(32));
    }

    #[test]
    fn test_unwrap_first_sequence_after_isn_zero() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), 0);
        assert_eq!(unwrapped, 1u64);
    }

    #[test]
    fn test_unwrap_first_sequence_after_first_wraparound() {
        let unwrapped = Wrap32::new(1).unwrap(Wrap32::new(0), u32::MAX as u64);
        assert_eq!(unwrapped, (1u64 << 32) + 1);
    }

    #[test]
    fn test_unwrap_with_nonzero_isn() {
        let unwrapped = Wrap32::new(u32::MAX).unwrap(Wrap32::new(10), 3 * (1u64 << 32));
        assert_eq!(unwrapped, 3 * (1u64 << 32) - 11);
    }

    #[test]
    fn test_unwrap_value_equals_isn_returns_zero() {
        let unwrapped = Wrap32::new(16).unwrap(Wrap32::new(16), 0);
        assert_eq!(unwrapped, 0u64);
    }

    #[test]
    fn test_add_overflow() {
        let x = Wrap32::new(u32::MAX);
        let y = Wrap32::new(1);
        assert_eq!(x + y, Wrap32::new(0));
    }

    #[test]
    fn test_roundtrip() {
        fn check_roundtrip(isn: Wrap32, value: u64, checkpoint: u64) {
            assert_eq!(Wrap32::wrap(value, isn).unwrap(isn, checkpoint), value);
        }

        let n_reps = 200_000;
        let dist31minus1 = Uniform::from(0u32..=(1u32 << 31) - 1);
        let dist32 = Uniform::from(0u32..=u32::MAX);
        let big_offset: u64 = (1u64 << 31) - 1;
        let dist63 = Uniform::from(big_offset..=(1u64 << 63));

        (0..n_reps).into_par_iter().for_each(|_| {
            let mut rng = rand::thread_rng();
            let isn = Wrap32::new(dist32.sample(&mut rng));
            let val = dist63.sample(&mut rng);
            let offset = dist31minus1.sample(&mut rng) as u64;

            check_roundtrip(isn, val, val);
            check_roundtrip(isn, val + 1, val);
            check_roundtrip(isn, val - 1, val);
            check_roundtrip(isn, val + offset, val);
            check_roundtrip(isn, val - offset, val);
            check_roundtrip(isn, val + big_offset, val);
            check_roundtrip(isn, val - big_offset, val);
        });
    }

    #[test]
    fn test_unwrap_seq_wraparound() {
        // ISN near the top of the 32-bit space; a 6-byte payload at absolute
        // index 0 must unwrap to something close to the checkpoint, not wrap
        // around to a huge value.
        let isn = Wrap32::new((u32::MAX - 2) as u32);
        let seqno = Wrap32::wrap(0, isn);
        let checkpoint = 0u64;
        assert_eq!(seqno.unwrap(isn, checkpoint), 0);
    }

    #[test]
    fn test_equality_random() {
        let n_reps = 8192;
        let mut rng = rand::thread_rng();
        for _ in 0..n_reps {
            let n: u32 = rng.gen();
            let diff: u8 = rng.gen();
            let m: u32 = n.wrapping_add(diff as u32);
            assert_eq!(Wrap32::new(n) == Wrap32::new(m), n == m);
        }
    }
}
