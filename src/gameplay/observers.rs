//! Observers for tournaments
//!
//! Observers collect data while games are played without coupling the game
//! loop to any output format.

use indicatif::{ProgressBar, ProgressStyle};

use crate::{
    Error, Result,
    game::{GameOutcome, Player},
    ports::Observer,
};

/// Which registered player won, if anyone
fn first_player_result(outcome: GameOutcome, first_player_white: bool) -> Option<bool> {
    let first_side = if first_player_white {
        Player::White
    } else {
        Player::Black
    };
    match outcome {
        GameOutcome::Win(side) => Some(side == first_side),
        GameOutcome::Draw => None,
    }
}

/// Progress bar observer - shows tournament progress
pub struct ProgressObserver {
    progress_bar: Option<ProgressBar>,
    first_wins: usize,
    second_wins: usize,
    draws: usize,
}

impl ProgressObserver {
    pub fn new() -> Self {
        Self {
            progress_bar: None,
            first_wins: 0,
            second_wins: 0,
            draws: 0,
        }
    }

    fn message(&self) -> String {
        format!("{} / {} / {}", self.first_wins, self.second_wins, self.draws)
    }
}

impl Default for ProgressObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl Observer for ProgressObserver {
    fn on_tournament_start(&mut self, total_games: usize) -> Result<()> {
        let pb = ProgressBar::new(total_games as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} games (1st/2nd/draw: {msg})")
                .map_err(|e| Error::ProgressBarTemplate {
                    message: e.to_string(),
                })?
                .progress_chars("=>-"),
        );
        self.progress_bar = Some(pb);
        Ok(())
    }

    fn on_game_end(
        &mut self,
        game_num: usize,
        outcome: GameOutcome,
        first_player_white: bool,
    ) -> Result<()> {
        match first_player_result(outcome, first_player_white) {
            Some(true) => self.first_wins += 1,
            Some(false) => self.second_wins += 1,
            None => self.draws += 1,
        }

        if let Some(pb) = &self.progress_bar {
            pb.set_position(game_num as u64 + 1);
            pb.set_message(self.message());
        }
        Ok(())
    }

    fn on_tournament_end(&mut self) -> Result<()> {
        if let Some(pb) = &self.progress_bar {
            pb.finish_with_message(self.message());
        }
        Ok(())
    }
}
