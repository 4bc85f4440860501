//! Phase state machine for one play-through of a room
//!
//! Mutators never touch the network. Each returns an [`Outcome`] telling the
//! caller whether a snapshot should be broadcast and whether a drawing-phase
//! deadline has to be scheduled.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::Utc;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::chain;
use super::drawing::Drawing;
use super::prompts::{PromptLanguage, Prompter};
use crate::config::{GameConfig, MIN_PLAYERS};
use crate::protocol::GameDto;
use crate::room::PlayerId;

/// Process-unique game ids, used to recognise stale deadlines
static GAME_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    /// Waiting to start
    Lobby,
    /// Players pick the prompt for their first drawing
    SelectingInitialPrompts,
    /// Players draw their prompt, ends by timer
    Drawing,
    /// Players guess what the drawing is
    Guessing,
    /// Game over, all threads are shown
    Finale,
}

/// Token for a scheduled end of a drawing phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawingDeadline {
    pub game_id: u64,
    pub round: usize,
    pub after: Duration,
}

/// What a mutation asks of its caller
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Outcome {
    /// State visible to clients changed; broadcast a snapshot
    pub changed: bool,
    /// A drawing phase began; schedule its forced end
    pub deadline: Option<DrawingDeadline>,
}

impl Outcome {
    pub fn unchanged() -> Self {
        Self::default()
    }

    pub fn changed() -> Self {
        Self {
            changed: true,
            deadline: None,
        }
    }

    fn drawing_started(deadline: DrawingDeadline) -> Self {
        Self {
            changed: true,
            deadline: Some(deadline),
        }
    }
}

#[derive(Debug)]
pub struct Game {
    id: u64,
    phase: GamePhase,
    /// Unix milliseconds of the last phase change
    state_changed_at: Option<i64>,
    current_round: Option<usize>,
    total_rounds: usize,
    drawing_time_seconds: u32,
    initial_prompts_per_player: usize,
    prompt_language: PromptLanguage,
    initial_prompts: BTreeMap<PlayerId, Vec<String>>,
    /// `rounds[round][thread_index]`
    rounds: Vec<Vec<Drawing>>,
    /// drawing id -> (round, thread_index)
    locations: HashMap<String, (usize, usize)>,
}

impl Game {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            id: GAME_ID_COUNTER.fetch_add(1, Ordering::SeqCst),
            phase: GamePhase::Lobby,
            state_changed_at: None,
            current_round: None,
            total_rounds: config.total_rounds,
            drawing_time_seconds: config.drawing_time_seconds,
            initial_prompts_per_player: config.initial_prompts_per_player,
            prompt_language: config.prompt_language,
            initial_prompts: BTreeMap::new(),
            rounds: Vec::new(),
            locations: HashMap::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn current_round(&self) -> Option<usize> {
        self.current_round
    }

    pub fn total_rounds(&self) -> usize {
        self.total_rounds
    }

    pub fn drawing_time_seconds(&self) -> u32 {
        self.drawing_time_seconds
    }

    pub fn prompt_language(&self) -> PromptLanguage {
        self.prompt_language
    }

    pub fn state_changed_at(&self) -> Option<i64> {
        self.state_changed_at
    }

    /// All drawings, indexed `[round][thread_index]`
    pub fn rounds(&self) -> &[Vec<Drawing>] {
        &self.rounds
    }

    /// Number of hand-off threads, frozen at start
    pub fn thread_count(&self) -> usize {
        self.rounds.first().map_or(0, Vec::len)
    }

    pub fn initial_prompts_for(&self, player_id: &str) -> Option<&[String]> {
        self.initial_prompts.get(player_id).map(Vec::as_slice)
    }

    pub fn drawing(&self, drawing_id: &str) -> Option<&Drawing> {
        let (round, thread) = *self.locations.get(drawing_id)?;
        self.rounds.get(round)?.get(thread)
    }

    /// Stored image for a drawing, if any
    pub fn drawing_image(&self, drawing_id: &str) -> Option<&str> {
        self.drawing(drawing_id).and_then(Drawing::image)
    }

    fn set_phase(&mut self, phase: GamePhase) {
        self.phase = phase;
        self.state_changed_at = Some(Utc::now().timestamp_millis());
    }

    /// Deal prompts, build the chain plan and enter prompt selection
    pub fn start(&mut self, players: &[PlayerId]) -> Outcome {
        self.start_with_rng(players, &mut rand::thread_rng())
    }

    pub fn start_with_rng<R: Rng + ?Sized>(&mut self, players: &[PlayerId], rng: &mut R) -> Outcome {
        if self.phase != GamePhase::Lobby || players.len() < MIN_PLAYERS {
            return Outcome::unchanged();
        }

        // Two virtual rounds per real round: even ones draw, odd ones guess
        let mappings = match chain::build_with_rng(self.total_rounds * 2, players.len(), rng) {
            Ok(mappings) => mappings,
            Err(e) => {
                warn!("Cannot start game {}: {}", self.id, e);
                return Outcome::unchanged();
            }
        };
        debug!("Chain plan for game {}:\n{}", self.id, chain::format_mappings(&mappings));

        let mut prompter = Prompter::new(self.prompt_language);
        for player in players {
            let prompts = prompter.take(self.initial_prompts_per_player, rng);
            self.initial_prompts.insert(player.clone(), prompts);
        }

        for round in 0..self.total_rounds {
            let drawers = &mappings[round * 2];
            let guessers = &mappings[round * 2 + 1];

            let drawings: Vec<Drawing> = (0..players.len())
                .map(|thread| {
                    Drawing::new(
                        thread,
                        players[drawers[thread]].clone(),
                        players[guessers[thread]].clone(),
                    )
                })
                .collect();

            for drawing in &drawings {
                self.locations
                    .insert(drawing.id.clone(), (round, drawing.thread_index));
            }
            self.rounds.push(drawings);
        }

        self.set_phase(GamePhase::SelectingInitialPrompts);
        Outcome::changed()
    }

    fn start_drawing(&mut self) -> Outcome {
        let round = self.current_round.map_or(0, |r| r + 1);
        self.current_round = Some(round);
        self.set_phase(GamePhase::Drawing);

        Outcome::drawing_started(DrawingDeadline {
            game_id: self.id,
            round,
            after: Duration::from_secs(u64::from(self.drawing_time_seconds)),
        })
    }

    /// A player picked the prompt for their first drawing
    pub fn select_initial_prompt(&mut self, player_id: &str, prompt: &str) -> Outcome {
        if self.phase != GamePhase::SelectingInitialPrompts {
            return Outcome::unchanged();
        }

        let Some(first_round) = self.rounds.first_mut() else {
            return Outcome::unchanged();
        };
        let Some(drawing) = first_round.iter_mut().find(|d| d.drawer_id == player_id) else {
            return Outcome::unchanged();
        };
        if !drawing.set_prompt(prompt) {
            return Outcome::unchanged();
        }

        if first_round.iter().all(Drawing::has_prompt) {
            return self.start_drawing();
        }
        Outcome::changed()
    }

    /// A player guessed the drawing they were handed this round
    pub fn guess(&mut self, player_id: &str, guess: &str) -> Outcome {
        if self.phase != GamePhase::Guessing {
            return Outcome::unchanged();
        }
        let Some(round) = self.current_round else {
            return Outcome::unchanged();
        };

        let Some(drawing) = self
            .rounds
            .get_mut(round)
            .and_then(|drawings| drawings.iter_mut().find(|d| d.guesser_id == player_id))
        else {
            return Outcome::unchanged();
        };
        if !drawing.set_guess(guess) {
            return Outcome::unchanged();
        }
        let thread = drawing.thread_index;

        // Hand the guess forward as the next drawer's prompt
        if let Some(next) = self
            .rounds
            .get_mut(round + 1)
            .and_then(|drawings| drawings.get_mut(thread))
        {
            next.set_prompt(guess);
        }

        let all_guessed = self.rounds[round].iter().all(Drawing::has_guess);
        if !all_guessed {
            return Outcome::changed();
        }

        if round + 1 >= self.total_rounds {
            self.set_phase(GamePhase::Finale);
            Outcome::changed()
        } else {
            self.start_drawing()
        }
    }

    /// Store an image for a drawing owned by `player_id`
    ///
    /// Not phase-gated so late uploads still land. Returns whether it was stored.
    pub fn submit_drawing(&mut self, player_id: &str, drawing_id: &str, image: String) -> bool {
        let Some(&(round, thread)) = self.locations.get(drawing_id) else {
            return false;
        };
        match self.rounds.get_mut(round).and_then(|r| r.get_mut(thread)) {
            Some(drawing) if drawing.drawer_id == player_id => {
                drawing.set_image(image);
                true
            }
            _ => false,
        }
    }

    /// Force the end of a drawing phase
    ///
    /// Ignored unless the deadline belongs to this game and the game is still
    /// drawing the same round.
    pub fn expire_drawing(&mut self, deadline: &DrawingDeadline) -> Outcome {
        if deadline.game_id != self.id
            || self.phase != GamePhase::Drawing
            || self.current_round != Some(deadline.round)
        {
            return Outcome::unchanged();
        }
        self.set_phase(GamePhase::Guessing);
        Outcome::changed()
    }

    /// Change the drawing phase length; applies from the next drawing phase
    pub fn set_drawing_time(&mut self, seconds: u32) -> Outcome {
        if !GameConfig::accepts_drawing_time(seconds) || seconds == self.drawing_time_seconds {
            return Outcome::unchanged();
        }
        self.drawing_time_seconds = seconds;
        Outcome::changed()
    }

    /// Change the prompt language; only before the prompts are dealt
    pub fn set_prompt_language(&mut self, language: PromptLanguage) -> Outcome {
        if self.phase != GamePhase::Lobby || language == self.prompt_language {
            return Outcome::unchanged();
        }
        self.prompt_language = language;
        Outcome::changed()
    }

    pub fn to_dto(&self) -> GameDto {
        GameDto {
            drawing_time_seconds: self.drawing_time_seconds,
            total_rounds: self.total_rounds,
            current_round: self.current_round.map_or(-1, |r| r as i64),
            state: self.phase,
            state_changed_at: self.state_changed_at,
            drawings: self
                .rounds
                .iter()
                .map(|round| round.iter().map(Drawing::to_dto).collect())
                .collect(),
            initial_prompts: self.initial_prompts.clone(),
            initial_prompts_per_player: self.initial_prompts_per_player,
            prompt_language: self.prompt_language,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players(n: usize) -> Vec<PlayerId> {
        (0..n).map(|i| format!("p{}", i)).collect()
    }

    fn started(n: usize) -> Game {
        let mut game = Game::new(&GameConfig::default());
        assert!(game.start(&players(n)).changed);
        game
    }

    fn select_all_prompts(game: &mut Game) -> Outcome {
        let drawers: Vec<PlayerId> = game.rounds()[0].iter().map(|d| d.drawer_id.clone()).collect();
        let mut last = Outcome::unchanged();
        for (i, drawer) in drawers.iter().enumerate() {
            last = game.select_initial_prompt(drawer, &format!("prompt {}", i));
        }
        last
    }

    fn guess_all(game: &mut Game) -> Outcome {
        let round = game.current_round().unwrap();
        let guessers: Vec<PlayerId> = game.rounds()[round]
            .iter()
            .map(|d| d.guesser_id.clone())
            .collect();
        let mut last = Outcome::unchanged();
        for (i, guesser) in guessers.iter().enumerate() {
            last = game.guess(guesser, &format!("guess {} {}", round, i));
        }
        last
    }

    fn expire(game: &mut Game, outcome: Outcome) {
        let deadline = outcome.deadline.expect("drawing phase should schedule a deadline");
        assert!(game.expire_drawing(&deadline).changed);
    }

    #[test]
    fn test_new_game_is_in_lobby() {
        let game = Game::new(&GameConfig::default());
        assert_eq!(game.phase(), GamePhase::Lobby);
        assert_eq!(game.current_round(), None);
        assert!(game.rounds().is_empty());
        assert!(game.state_changed_at().is_none());
        assert_eq!(game.to_dto().current_round, -1);
    }

    #[test]
    fn test_start_builds_drawing_matrix() {
        let game = started(4);
        assert_eq!(game.phase(), GamePhase::SelectingInitialPrompts);
        assert!(game.state_changed_at().is_some());
        assert_eq!(game.rounds().len(), 3);
        assert_eq!(game.rounds().iter().map(Vec::len).sum::<usize>(), 12);
        assert_eq!(game.thread_count(), 4);

        for round in game.rounds() {
            for (thread, drawing) in round.iter().enumerate() {
                assert_eq!(drawing.thread_index, thread);
                assert_ne!(drawing.drawer_id, drawing.guesser_id);
            }
        }

        let (first, second) = (&game.rounds()[0], &game.rounds()[1]);
        for thread in 0..4 {
            let occupants = [
                &first[thread].drawer_id,
                &first[thread].guesser_id,
                &second[thread].drawer_id,
                &second[thread].guesser_id,
            ];
            for a in 0..occupants.len() {
                for b in a + 1..occupants.len() {
                    assert_ne!(occupants[a], occupants[b], "thread {}", thread);
                }
            }
        }
    }

    #[test]
    fn test_every_player_draws_and_guesses_once_per_round() {
        let game = started(5);
        for round in game.rounds() {
            let mut drawers: Vec<&str> = round.iter().map(|d| d.drawer_id.as_str()).collect();
            let mut guessers: Vec<&str> = round.iter().map(|d| d.guesser_id.as_str()).collect();
            drawers.sort_unstable();
            guessers.sort_unstable();
            assert_eq!(drawers, vec!["p0", "p1", "p2", "p3", "p4"]);
            assert_eq!(guessers, drawers);
        }
    }

    #[test]
    fn test_start_deals_initial_prompts() {
        let game = started(4);
        for player in players(4) {
            let prompts = game.initial_prompts_for(&player).unwrap();
            assert_eq!(prompts.len(), 3);
        }
        let all: std::collections::HashSet<&String> = players(4)
            .iter()
            .flat_map(|p| game.initial_prompts_for(p).unwrap())
            .collect();
        assert_eq!(all.len(), 12);
    }

    #[test]
    fn test_start_requires_lobby_and_enough_players() {
        let mut game = Game::new(&GameConfig::default());
        assert!(!game.start(&players(2)).changed);
        assert_eq!(game.phase(), GamePhase::Lobby);

        assert!(game.start(&players(4)).changed);
        assert!(!game.start(&players(4)).changed);
        assert_eq!(game.rounds().len(), 3);
    }

    #[test]
    fn test_selecting_all_prompts_starts_drawing() {
        let mut game = started(4);
        let outcome = select_all_prompts(&mut game);

        assert_eq!(game.phase(), GamePhase::Drawing);
        assert_eq!(game.current_round(), Some(0));
        let deadline = outcome.deadline.unwrap();
        assert_eq!(deadline.round, 0);
        assert_eq!(deadline.game_id, game.id());
        assert_eq!(deadline.after, Duration::from_secs(60));
    }

    #[test]
    fn test_partial_prompt_selection_stays_in_selection() {
        let mut game = started(4);
        let drawer = game.rounds()[0][0].drawer_id.clone();
        let outcome = game.select_initial_prompt(&drawer, "kissa");

        assert!(outcome.changed);
        assert!(outcome.deadline.is_none());
        assert_eq!(game.phase(), GamePhase::SelectingInitialPrompts);
        assert_eq!(game.rounds()[0][0].prompt(), "kissa");

        assert!(!game.select_initial_prompt(&drawer, "koira").changed);
        assert!(!game.select_initial_prompt("stranger", "koira").changed);
    }

    #[test]
    fn test_prompt_selection_ignored_outside_phase() {
        let mut game = Game::new(&GameConfig::default());
        assert!(!game.select_initial_prompt("p0", "kissa").changed);
    }

    #[test]
    fn test_deadline_moves_drawing_to_guessing() {
        let mut game = started(4);
        let outcome = select_all_prompts(&mut game);
        expire(&mut game, outcome);
        assert_eq!(game.phase(), GamePhase::Guessing);
        assert_eq!(game.current_round(), Some(0));
    }

    #[test]
    fn test_stale_deadline_is_ignored() {
        let mut game = started(4);
        let deadline = select_all_prompts(&mut game).deadline.unwrap();

        let mut other = started(4);
        let _ = select_all_prompts(&mut other);
        assert!(!other.expire_drawing(&deadline).changed);
        assert_eq!(other.phase(), GamePhase::Drawing);

        assert!(game.expire_drawing(&deadline).changed);
        assert!(!game.expire_drawing(&deadline).changed);
    }

    #[test]
    fn test_guess_hands_off_to_next_round() {
        let mut game = started(4);
        let outcome = select_all_prompts(&mut game);
        expire(&mut game, outcome);

        let guesser = game.rounds()[0][1].guesser_id.clone();
        let outcome = game.guess(&guesser, "a cat");
        assert!(outcome.changed);
        assert_eq!(game.phase(), GamePhase::Guessing);
        assert_eq!(game.rounds()[0][1].guess(), Some("a cat"));
        assert_eq!(game.rounds()[1][1].prompt(), "a cat");
    }

    #[test]
    fn test_all_guesses_start_next_drawing_round() {
        let mut game = started(4);
        let outcome = select_all_prompts(&mut game);
        expire(&mut game, outcome);

        let outcome = guess_all(&mut game);
        assert_eq!(game.phase(), GamePhase::Drawing);
        assert_eq!(game.current_round(), Some(1));
        assert_eq!(outcome.deadline.unwrap().round, 1);
        assert!(game.rounds()[1].iter().all(Drawing::has_prompt));
    }

    #[test]
    fn test_last_round_ends_in_finale() {
        let mut game = started(4);
        let mut outcome = select_all_prompts(&mut game);
        for _ in 0..game.total_rounds() {
            expire(&mut game, outcome);
            outcome = guess_all(&mut game);
        }
        assert_eq!(game.phase(), GamePhase::Finale);
        assert_eq!(game.current_round(), Some(2));
        assert!(outcome.changed);
        assert!(outcome.deadline.is_none());
    }

    #[test]
    fn test_guess_from_non_guesser_is_noop() {
        let mut game = started(4);
        let outcome = select_all_prompts(&mut game);
        expire(&mut game, outcome);

        let before = game.to_dto();
        assert!(!game.guess("stranger", "anything").changed);
        let after = game.to_dto();
        assert_eq!(
            serde_json::to_value(&before).unwrap(),
            serde_json::to_value(&after).unwrap()
        );
    }

    #[test]
    fn test_guess_outside_guessing_is_noop() {
        let mut game = started(4);
        let _ = select_all_prompts(&mut game);
        let guesser = game.rounds()[0][0].guesser_id.clone();
        assert!(!game.guess(&guesser, "too early").changed);
        assert!(game.rounds()[0][0].guess().is_none());
    }

    #[test]
    fn test_submit_drawing_requires_owner() {
        let mut game = started(4);
        let drawing = &game.rounds()[2][3];
        let (id, drawer, guesser) = (
            drawing.id.clone(),
            drawing.drawer_id.clone(),
            drawing.guesser_id.clone(),
        );

        assert!(!game.submit_drawing(&guesser, &id, "img".into()));
        assert!(game.drawing_image(&id).is_none());

        assert!(game.submit_drawing(&drawer, &id, "img".into()));
        assert!(game.submit_drawing(&drawer, &id, "img2".into()));
        assert_eq!(game.drawing_image(&id), Some("img2"));
        assert!(!game.submit_drawing(&drawer, "unknown", "img".into()));
    }

    #[test]
    fn test_settings() {
        let mut game = Game::new(&GameConfig::default());
        assert!(game.set_drawing_time(90).changed);
        assert_eq!(game.drawing_time_seconds(), 90);
        assert!(!game.set_drawing_time(90).changed);
        assert!(!game.set_drawing_time(0).changed);

        assert!(game.set_prompt_language(PromptLanguage::En).changed);
        let _ = game.start(&players(3));
        assert!(!game.set_prompt_language(PromptLanguage::Fi).changed);
        assert_eq!(game.prompt_language(), PromptLanguage::En);
    }

    #[test]
    fn test_dto_shape() {
        let game = started(3);
        let json = serde_json::to_value(game.to_dto()).unwrap();
        assert_eq!(json["state"], "selecting-initial-prompts");
        assert_eq!(json["currentRound"], -1);
        assert_eq!(json["totalRounds"], 3);
        assert_eq!(json["promptLanguage"], "fi");
        assert_eq!(json["drawings"].as_array().unwrap().len(), 3);
        assert_eq!(json["drawings"][0][0]["threadIndex"], 0);
        assert_eq!(json["initialPrompts"]["p0"].as_array().unwrap().len(), 3);
    }
}
