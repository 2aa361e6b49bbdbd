//! Observer port - hooks into a running series of games

use crate::{Result, game::GameOutcome};

/// Observer of games played by [`crate::gameplay::Tournament`].
///
/// Methods are called in this order:
/// 1. `on_tournament_start(total_games)`
/// 2. for each game: `on_game_start`, then `on_game_end`
/// 3. `on_tournament_end()`
///
/// Outcomes are absolute (White/Black); `first_player_white` tells which
/// registered player held White in that game.
pub trait Observer: Send {
    fn on_tournament_start(&mut self, _total_games: usize) -> Result<()> {
        Ok(())
    }

    fn on_game_start(&mut self, _game_num: usize) -> Result<()> {
        Ok(())
    }

    fn on_game_end(
        &mut self,
        _game_num: usize,
        _outcome: GameOutcome,
        _first_player_white: bool,
    ) -> Result<()> {
        Ok(())
    }

    fn on_tournament_end(&mut self) -> Result<()> {
        Ok(())
    }
}
