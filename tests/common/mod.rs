//! Test-only deterministic channel/loss simulator. Never used outside
//! `tests/` — the core crate has no notion of loss or jitter.

#![allow(dead_code)]

/// Deterministic xorshift32 PRNG, portable and reproducible across runs.
pub struct XorShift32 {
    state: u32,
}

impl XorShift32 {
    pub fn new(seed: u32) -> Self {
        Self {
            state: if seed != 0 { seed } else { 0xA3C5_9AC3 },
        }
    }

    pub fn next_u32(&mut self) -> u32 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)`, using the top 24 bits for 1/2^24 resolution.
    pub fn next_unit(&mut self) -> f64 {
        (self.next_u32() >> 8) as f64 * (1.0 / 16_777_216.0)
    }
}

/// Drops with fixed probability `p_loss` each trial.
pub struct BernoulliLoss {
    pub p_loss: f64,
}

impl BernoulliLoss {
    pub fn drop(&self, rng: &mut XorShift32) -> bool {
        let p = self.p_loss.clamp(0.0, 1.0);
        if p <= 0.0 {
            return false;
        }
        if p >= 1.0 {
            return true;
        }
        rng.next_unit() < p
    }
}

/// Two-state Markov (Good/Bad) bursty loss model with a per-bad-state drop
/// probability, for modeling correlated loss rather than i.i.d. loss.
pub struct GilbertElliottLoss {
    pub p_g_to_b: f64,
    pub p_b_to_g: f64,
    pub p_loss_bad: f64,
    bad: bool,
}

impl GilbertElliottLoss {
    pub fn new(p_g_to_b: f64, p_b_to_g: f64, p_loss_bad: f64) -> Self {
        Self {
            p_g_to_b,
            p_b_to_g,
            p_loss_bad,
            bad: false,
        }
    }

    pub fn drop(&mut self, rng: &mut XorShift32) -> bool {
        let pg = self.p_g_to_b.clamp(0.0, 1.0);
        let pb = self.p_b_to_g.clamp(0.0, 1.0);
        let pl = self.p_loss_bad.clamp(0.0, 1.0);

        let u = rng.next_unit();
        if !self.bad {
            if u < pg {
                self.bad = true;
            }
        } else if u < pb {
            self.bad = false;
        }

        if !self.bad {
            return false;
        }
        if pl <= 0.0 {
            return false;
        }
        if pl >= 1.0 {
            return true;
        }
        rng.next_unit() < pl
    }
}

/// Uniform jitter in `[0, j_ms]` milliseconds.
pub fn jitter_uniform_ms(rng: &mut XorShift32, j_ms: u32) -> u32 {
    if j_ms == 0 {
        return 0;
    }
    rng.next_u32() % (j_ms + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn xorshift32_is_deterministic_for_a_seed() {
        let mut a = XorShift32::new(42);
        let mut b = XorShift32::new(42);
        for _ in 0..10 {
            assert_eq!(a.next_u32(), b.next_u32());
        }
    }

    #[test]
    fn bernoulli_edges_are_exact() {
        let mut rng = XorShift32::new(1);
        let always = BernoulliLoss { p_loss: 1.0 };
        let never = BernoulliLoss { p_loss: 0.0 };
        for _ in 0..100 {
            assert!(always.drop(&mut rng));
            assert!(!never.drop(&mut rng));
        }
    }

    #[test]
    fn jitter_stays_within_bound() {
        let mut rng = XorShift32::new(7);
        for _ in 0..1000 {
            assert!(jitter_uniform_ms(&mut rng, 25) <= 25);
        }
        assert_eq!(jitter_uniform_ms(&mut rng, 0), 0);
    }
}
