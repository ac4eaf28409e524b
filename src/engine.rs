//! # Movement/Collision Engine
//!
//! Advances the snake one cell per movement tick. The engine is the only
//! writer of the snake body, the score and the `lose` flag.
//!
//! ## Step
//!
//! 1. Shift every segment one slot toward the tail. The old tail lands in
//!    the spare slot, ready to become a real segment if the snake grows.
//! 2. Step the head in the current direction, wrapping at the edges.
//! 3. Head on a body segment → lose, defeat jingle, no fruit check.
//! 4. Otherwise eat the first fruit (storage order) on the head's cell:
//!    score +1, length +1 (capped at `MAX_LEN`), beep.

use crate::audio::{AudioQueue, BuzzerEvent};
use crate::state::GameState;

/// What one call to [`advance_one_step`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum StepOutcome {
    /// Paused or already lost; nothing moved.
    Idle,
    Moved,
    /// A fruit was eaten. `grew` is false when the snake was already at
    /// maximum length.
    Ate { grew: bool },
    /// The head ran into the body; the game is lost.
    Collided,
}

/// Runs one movement tick against `state`, posting sound effects to `audio`.
pub fn advance_one_step(state: &GameState, audio: &AudioQueue) -> StepOutcome {
    if !state.is_running() || state.has_lost() {
        return StepOutcome::Idle;
    }

    let snake = state.snake();
    let head = snake.head().step(state.direction());
    snake.shift_toward_tail();
    snake.set(0, head);

    if snake.body_contains(head) {
        state.set_lost();
        for event in BuzzerEvent::DEFEAT {
            // Dropped tones are acceptable
            let _ = audio.post(event);
        }
        info!("collision at {}, final score {}", head, state.score());
        return StepOutcome::Collided;
    }

    if state.fruit().take(head).is_none() {
        return StepOutcome::Moved;
    }

    let score = state.add_point();
    let grew = match snake.grow() {
        Ok(()) => true,
        Err(e) => {
            warn!("growth refused: {}", e);
            false
        }
    };
    let _ = audio.post(BuzzerEvent::EAT);
    debug!("fruit eaten at {}, score {}", head, score);

    StepOutcome::Ate { grew }
}

/// One iteration of the movement task: honour a pending reset request,
/// then advance.
pub fn snake_tick(state: &GameState, audio: &AudioQueue) -> StepOutcome {
    if state.take_reset_request() {
        state.reset();
    }
    advance_one_step(state, audio)
}

// ---------------------------------------------------------------------------
// Unit tests (host-only)
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GRID_SIZE, MAX_LEN};
    use crate::grid::{Direction, Position};
    use std::vec::Vec;

    const LAST: u8 = GRID_SIZE - 1;

    fn fresh() -> (GameState, AudioQueue) {
        let state = GameState::new();
        state.reset();
        (state, AudioQueue::new())
    }

    fn drain(audio: &AudioQueue) -> Vec<BuzzerEvent> {
        core::iter::from_fn(|| audio.try_receive()).collect()
    }

    #[test]
    fn test_moves_one_cell_and_keeps_length() {
        let (state, audio) = fresh();
        let c = GRID_SIZE / 2;

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Moved);
        assert_eq!(state.snake().len(), 4);
        assert_eq!(state.snake().head(), Position::new(c + 1, c));
        // Body follows: old head is now segment 1, old tail is gone
        assert_eq!(state.snake().get(1), Position::new(c, c));
        assert!(!state.snake().contains(Position::new(c - 3, c)));
        assert!(audio.is_empty());
    }

    #[test]
    fn test_every_direction_wraps() {
        let cases = [
            (Position::new(3, 0), Direction::Up, Position::new(3, LAST)),
            (Position::new(3, LAST), Direction::Down, Position::new(3, 0)),
            (Position::new(0, 3), Direction::Left, Position::new(LAST, 3)),
            (Position::new(LAST, 3), Direction::Right, Position::new(0, 3)),
        ];
        for (start, dir, expected) in cases {
            let (state, audio) = fresh();
            // Body trails behind the head, away from the direction of travel
            let back = dir.opposite();
            let b1 = start.step(back);
            let b2 = b1.step(back);
            state.snake().place(&[start, b1, b2]);
            state.set_direction(dir);

            assert_eq!(advance_one_step(&state, &audio), StepOutcome::Moved);
            assert_eq!(state.snake().head(), expected, "{:?}", dir);
        }
    }

    #[test]
    fn test_paused_or_lost_is_idle() {
        let (state, audio) = fresh();
        let before = state.snake().to_vec();

        state.set_running(false);
        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Idle);
        assert_eq!(state.snake().to_vec(), before);

        state.set_running(true);
        state.set_lost();
        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Idle);
        assert_eq!(state.snake().to_vec(), before);
    }

    #[test]
    fn test_self_collision_sets_lose_and_skips_fruit() {
        let (state, audio) = fresh();
        // A hook shape: head at (5,5) heading down into (5,6), which is body.
        //   (5,5)@ (6,5)o
        //   (5,6)o (6,6)o
        state.snake().place(&[
            Position::new(5, 5),
            Position::new(6, 5),
            Position::new(6, 6),
            Position::new(5, 6),
            Position::new(4, 6),
        ]);
        state.set_direction(Direction::Down);
        // A fruit on the collision cell must survive
        state.fruit().push(Position::new(5, 6)).unwrap();

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Collided);
        assert!(state.has_lost());
        assert_eq!(state.score(), 0);
        assert_eq!(state.snake().len(), 5);
        assert_eq!(state.fruit().len(), 1);
        assert_eq!(drain(&audio), BuzzerEvent::DEFEAT);

        // Terminal until reset
        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Idle);
    }

    #[test]
    fn test_moving_into_vacated_tail_is_safe() {
        let (state, audio) = fresh();
        // Square loop of four: the head moves into the cell the tail leaves.
        state.snake().place(&[
            Position::new(5, 5),
            Position::new(5, 6),
            Position::new(6, 6),
            Position::new(6, 5),
        ]);
        state.set_direction(Direction::Right);

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Moved);
        assert!(!state.has_lost());
    }

    #[test]
    fn test_eating_grows_scores_and_compacts() {
        let (state, audio) = fresh();
        let c = GRID_SIZE / 2;
        let target = Position::new(c + 1, c);
        state.fruit().push(Position::new(0, 0)).unwrap();
        state.fruit().push(target).unwrap();
        state.fruit().push(Position::new(1, 1)).unwrap();

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Ate { grew: true });
        assert_eq!(state.snake().len(), 5);
        assert_eq!(state.score(), 1);
        assert_eq!(state.snake().head(), target);
        // The old tail stayed: it became the new last segment
        assert_eq!(state.snake().get(4), Position::new(c - 3, c));
        assert_eq!(
            state.fruit().to_vec().as_slice(),
            &[Position::new(0, 0), Position::new(1, 1)]
        );
        assert_eq!(drain(&audio), [BuzzerEvent::EAT]);
    }

    #[test]
    fn test_one_fruit_per_tick_when_stacked() {
        let (state, audio) = fresh();
        let c = GRID_SIZE / 2;
        let target = Position::new(c + 1, c);
        state.fruit().push(target).unwrap();
        state.fruit().push(target).unwrap();

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Ate { grew: true });
        assert_eq!(state.score(), 1);
        assert_eq!(state.fruit().to_vec().as_slice(), &[target]);
    }

    #[test]
    fn test_growth_capped_at_max_len() {
        let (state, audio) = fresh();
        // Fill rows 0..4 as a straight-ish full-length body with the head at
        // (15,3) heading down into row 4.
        let mut body = Vec::new();
        for y in (0..4u8).rev() {
            for x in (0..GRID_SIZE).rev() {
                body.push(Position::new(x, y));
            }
        }
        assert_eq!(body.len(), MAX_LEN);
        state.snake().place(&body);
        state.set_direction(Direction::Down);
        let next = Position::new(LAST, 4);
        state.fruit().push(next).unwrap();

        assert_eq!(advance_one_step(&state, &audio), StepOutcome::Ate { grew: false });
        assert_eq!(state.snake().len(), MAX_LEN);
        assert_eq!(state.score(), 1);
        assert!(state.fruit().is_empty());
    }

    #[test]
    fn test_snake_tick_honours_reset() {
        let (state, audio) = fresh();
        state.set_lost();
        state.add_point();
        state.request_reset();

        assert_eq!(snake_tick(&state, &audio), StepOutcome::Moved);
        assert!(!state.has_lost());
        assert_eq!(state.score(), 0);
        assert!(!state.needs_reset());
    }
}
