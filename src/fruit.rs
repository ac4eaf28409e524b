//! # Fruit Generator
//!
//! Places new fruit on a fixed period. The number of placements per tick is
//! geometric: every attempt is preceded by a Bernoulli draw with
//! probability `FRUIT_SPAWN_PROBABILITY`, so most ticks place nothing,
//! some place one, and rarely more. `FRUIT_MAX_ATTEMPTS` bounds the loop.
//!
//! Each attempt draws a fresh candidate cell and drops it if a snake segment
//! is on it. Fruit may still end up under the snake later; only the head
//! entering a fruit cell counts as eating it.

use rand::Rng;

use crate::config::{FRUIT_MAX_ATTEMPTS, FRUIT_SPAWN_PROBABILITY, GRID_SIZE};
use crate::grid::Position;
use crate::state::GameState;

/// Periodic fruit placer owning its PRNG.
pub struct FruitGenerator<R> {
    rng: R,
}

impl<R: Rng> FruitGenerator<R> {
    pub fn new(rng: R) -> Self {
        Self { rng }
    }

    /// A uniformly random cell.
    pub fn random_cell(&mut self) -> Position {
        Position::new(
            self.rng.gen_range(0..GRID_SIZE),
            self.rng.gen_range(0..GRID_SIZE),
        )
    }

    /// One fruit tick. Returns how many fruit were placed.
    pub fn generate_fruit_tick(&mut self, state: &GameState) -> u8 {
        let mut placed = 0;

        for _ in 0..FRUIT_MAX_ATTEMPTS {
            if !state.is_running() || !self.rng.gen_bool(FRUIT_SPAWN_PROBABILITY) {
                break;
            }

            let candidate = self.random_cell();
            if state.snake().contains(candidate) {
                continue;
            }

            if let Err(e) = state.fruit().push(candidate) {
                debug!("fruit tick stopped: {}", e);
                break;
            }
            placed += 1;
            trace!("fruit placed at {}", candidate);
        }

        placed
    }
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MAX_LEN;
    use rand::rngs::SmallRng;
    use rand::{RngCore, SeedableRng};

    /// Yields all-zero words: every Bernoulli draw succeeds and every
    /// candidate is (0, 0).
    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dest: &mut [u8]) {
            dest.fill(0);
        }

        fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
            dest.fill(0);
            Ok(())
        }
    }

    fn running_state() -> GameState {
        let state = GameState::new();
        state.reset();
        state
    }

    #[test]
    fn test_attempts_are_bounded() {
        let state = running_state();
        let mut gen = FruitGenerator::new(ZeroRng);

        assert_eq!(gen.generate_fruit_tick(&state), FRUIT_MAX_ATTEMPTS);
        assert_eq!(state.fruit().len(), FRUIT_MAX_ATTEMPTS as usize);
        assert!(state.fruit().to_vec().iter().all(|&p| p == Position::new(0, 0)));
    }

    #[test]
    fn test_occupied_cell_is_rejected() {
        let state = running_state();
        state.snake().place(&[Position::new(1, 0), Position::new(0, 0)]);
        let mut gen = FruitGenerator::new(ZeroRng);

        assert_eq!(gen.generate_fruit_tick(&state), 0);
        assert!(state.fruit().is_empty());
    }

    #[test]
    fn test_paused_game_spawns_nothing() {
        let state = running_state();
        state.set_running(false);
        let mut gen = FruitGenerator::new(ZeroRng);

        assert_eq!(gen.generate_fruit_tick(&state), 0);
        assert!(state.fruit().is_empty());
    }

    #[test]
    fn test_full_set_is_never_exceeded() {
        let state = running_state();
        let mut gen = FruitGenerator::new(ZeroRng);
        for _ in 0..MAX_LEN {
            gen.generate_fruit_tick(&state);
        }
        assert!(state.fruit().is_full());
        assert_eq!(gen.generate_fruit_tick(&state), 0);
        assert_eq!(state.fruit().len(), MAX_LEN);
    }

    #[test]
    fn test_seeded_rate_and_placement() {
        let state = running_state();
        let mut gen = FruitGenerator::new(SmallRng::seed_from_u64(7));

        let ticks = 2000;
        let mut total = 0u32;
        for _ in 0..ticks {
            let before = state.fruit().len();
            let placed = gen.generate_fruit_tick(&state);
            total += placed as u32;
            for pos in state.fruit().to_vec().iter().skip(before) {
                assert!(!state.snake().contains(*pos));
                assert!(pos.x < GRID_SIZE && pos.y < GRID_SIZE);
            }
            state.fruit().clear();
        }
        // Expected ≈ p / (1 - p) ≈ 0.11 per tick; allow a wide band
        assert!(total > 100 && total < 450, "placed {} over {} ticks", total, ticks);
    }
}
