use rand::{rngs::StdRng, Rng};

/// Source of pseudo-random numbers used to initialise weights.
pub trait RandomSource {
    /// Next value drawn from `[0, 1)`.
    fn next_unit(&mut self) -> f64;

    /// Next value drawn from `[-1, 1)`.
    fn next_uniform(&mut self) -> f64 {
        2.0 * self.next_unit() - 1.0
    }
}

impl RandomSource for StdRng {
    fn next_unit(&mut self) -> f64 {
        self.gen::<f64>()
    }
}

const MODULUS: u128 = (1 << 107) - 1;
const MULTIPLIER: u128 = (1 << 61) - 1;
const INCREMENT: u128 = 15_485_863;
const WARM_UP: usize = 20;

/// Linear congruential generator over the Mersenne prime `2^107 - 1`.
///
/// Each draw keeps only the digits after the third decimal place of
/// `state / 2^107`, which spreads consecutive states over `[0, 1)`.
#[derive(Debug, Clone)]
pub struct MersenneLcg {
    state: u128,
}

impl MersenneLcg {
    pub fn new(seed: u128) -> Self {
        let mut rng = Self {
            state: seed % MODULUS,
        };
        for _ in 0..WARM_UP {
            rng.step();
        }
        rng
    }

    fn step(&mut self) {
        self.state = (mul_mod(self.state, MULTIPLIER) + INCREMENT) % MODULUS;
    }
}

impl RandomSource for MersenneLcg {
    fn next_unit(&mut self) -> f64 {
        self.step();
        let candidate = self.state as f64 / (MODULUS + 1) as f64;
        let scaled = 1000.0 * candidate;
        scaled - scaled.trunc()
    }
}

// `a * b mod MODULUS` by shift-and-add; operands stay below 2^108.
fn mul_mod(mut a: u128, mut b: u128) -> u128 {
    let mut result = 0;
    a %= MODULUS;
    while b > 0 {
        if b & 1 == 1 {
            result = (result + a) % MODULUS;
        }
        a = (a << 1) % MODULUS;
        b >>= 1;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use rand::SeedableRng;

    #[test]
    fn mul_mod_matches_small_products() {
        assert_eq!(mul_mod(7, 6), 42);
        assert_eq!(mul_mod(MODULUS - 1, 2), MODULUS - 2);
        assert_eq!(mul_mod(MODULUS + 3, 5), 15);
    }

    #[test]
    fn lcg_values_in_unit_interval() {
        let mut rng = MersenneLcg::new(73);
        for _ in 0..1000 {
            let v = rng.next_unit();
            assert!((0.0..1.0).contains(&v));
            let u = rng.next_uniform();
            assert!((-1.0..1.0).contains(&u));
        }
    }

    #[test]
    fn lcg_known_stream() {
        let mut rng = MersenneLcg::new(73);
        let expected = [
            0.18545165413945597,
            0.9605742413776284,
            0.7734227726269864,
            0.5895417429167082,
            0.5651272503552036,
        ];
        for want in expected {
            assert_relative_eq!(rng.next_unit(), want, epsilon = 1e-12);
        }
    }

    #[test]
    fn lcg_is_deterministic() {
        let mut a = MersenneLcg::new(2022);
        let mut b = MersenneLcg::new(2022);
        let xs = (0..16).map(|_| a.next_unit()).collect::<Vec<_>>();
        let ys = (0..16).map(|_| b.next_unit()).collect::<Vec<_>>();
        assert_eq!(xs, ys);

        let mut c = MersenneLcg::new(2023);
        let zs = (0..16).map(|_| c.next_unit()).collect::<Vec<_>>();
        assert_ne!(xs, zs);
    }

    #[test]
    fn std_rng_as_source() {
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..100 {
            assert!((-1.0..1.0).contains(&rng.next_uniform()));
        }
    }
}
