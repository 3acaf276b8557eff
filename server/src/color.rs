//! Bubble color selection and guest name synthesis
//!
//! All randomness in the engine flows through `&mut impl Rng` so callers
//! (and tests) decide the random source. The server uses a seedable
//! `StdRng` owned by the game state; tests seed it for determinism.

use rand::Rng;
use shared::{COLOR_COUNT, GUEST_TAG_RANGE, RARE_COLOR};

/// Fraction of draws above which the rare color is returned.
const RARE_THRESHOLD: f64 = 0.90;

/// Picks a color for one bubble slot.
///
/// Roughly 10% of draws produce the rare color 6; the remaining 90% are
/// split evenly across the six selectable colors 0..=5 (~15% each).
pub fn choose_color<R: Rng>(rng: &mut R) -> u8 {
    let r: f64 = rng.gen();

    if r > RARE_THRESHOLD {
        RARE_COLOR
    } else {
        rng.gen_range(0..COLOR_COUNT)
    }
}

/// Synthesizes a display name for a player that joined without one.
pub fn guest_username<R: Rng>(rng: &mut R) -> String {
    format!("Guest_{}", rng.gen_range(0..GUEST_TAG_RANGE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_choose_color_range() {
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..1000 {
            let color = choose_color(&mut rng);
            assert!(color <= RARE_COLOR);
        }
    }

    /// Empirical distribution over a large sample: ~10% rare, ~15% for
    /// each selectable color.
    #[test]
    fn test_choose_color_distribution() {
        let mut rng = StdRng::seed_from_u64(42);
        let draws = 200_000;
        let mut counts = [0u32; 7];

        for _ in 0..draws {
            counts[choose_color(&mut rng) as usize] += 1;
        }

        let rare_fraction = counts[RARE_COLOR as usize] as f64 / draws as f64;
        assert!(
            (rare_fraction - 0.10).abs() < 0.01,
            "rare fraction {} out of tolerance",
            rare_fraction
        );

        for color in 0..COLOR_COUNT {
            let fraction = counts[color as usize] as f64 / draws as f64;
            assert!(
                (fraction - 0.15).abs() < 0.01,
                "color {} fraction {} out of tolerance",
                color,
                fraction
            );
        }
    }

    #[test]
    fn test_choose_color_deterministic_with_seed() {
        let mut rng_a = StdRng::seed_from_u64(7);
        let mut rng_b = StdRng::seed_from_u64(7);

        let sequence_a: Vec<u8> = (0..64).map(|_| choose_color(&mut rng_a)).collect();
        let sequence_b: Vec<u8> = (0..64).map(|_| choose_color(&mut rng_b)).collect();

        assert_eq!(sequence_a, sequence_b);
    }

    #[test]
    fn test_guest_username_pattern() {
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..100 {
            let name = guest_username(&mut rng);
            let tag = name
                .strip_prefix("Guest_")
                .expect("guest name missing prefix");
            let value: u32 = tag.parse().expect("guest tag not an integer");
            assert!(value < GUEST_TAG_RANGE);
        }
    }
}
