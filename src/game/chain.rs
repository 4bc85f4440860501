//! Player chaining for drawing hand-offs
//!
//! A chain plan is a list of round mappings where
//! `mappings[round][thread] = player_index`.
//!
//! Each round rotates the previous mapping left. The first `players` rounds
//! rotate by one, which walks every thread through distinct players. After
//! that the rotation is random in `1..players`, except the one value that
//! would undo the previous rotation and hand a thread straight back.

use rand::Rng;

use crate::config::MIN_PLAYERS;
use crate::error::{DrawphoneError, Result};

/// Player index occupying each thread in one round
pub type RoundMapping = Vec<usize>;

/// Build a chain plan with the thread-local rng
pub fn build(rounds: usize, players: usize) -> Result<Vec<RoundMapping>> {
    build_with_rng(rounds, players, &mut rand::thread_rng())
}

/// Build a chain plan drawing rotations from `rng`
pub fn build_with_rng<R: Rng + ?Sized>(
    rounds: usize,
    players: usize,
    rng: &mut R,
) -> Result<Vec<RoundMapping>> {
    if rounds == 0 {
        return Err(DrawphoneError::NoRounds);
    }
    if players < MIN_PLAYERS {
        return Err(DrawphoneError::TooFewPlayers {
            players,
            min: MIN_PLAYERS,
        });
    }

    let mut mappings: Vec<RoundMapping> = Vec::with_capacity(rounds);
    mappings.push((0..players).collect());

    let mut previous_rotation = 0;
    for round in 1..rounds {
        let rotation = if round <= players {
            1
        } else {
            random_rotation(players, previous_rotation, rng)
        };
        previous_rotation = rotation;

        let mut mapping = mappings[round - 1].clone();
        mapping.rotate_left(rotation);
        mappings.push(mapping);
    }

    Ok(mappings)
}

/// Uniform pick from `1..players` skipping `players - previous`
fn random_rotation<R: Rng + ?Sized>(players: usize, previous: usize, rng: &mut R) -> usize {
    let disallowed = players - previous;
    let rotation = rng.gen_range(1..players - 1);
    if rotation >= disallowed {
        rotation + 1
    } else {
        rotation
    }
}

/// Render a plan as aligned rows, one per round
pub fn format_mappings(mappings: &[RoundMapping]) -> String {
    mappings
        .iter()
        .map(|round| {
            round
                .iter()
                .map(|player| format!("{:>2}", player))
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect::<Vec<_>>()
        .join("\n")
}
