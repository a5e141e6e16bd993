use std::collections::VecDeque;
use std::io::Write;

use tale_core::TaleError;

use crate::interpreter::ScenarioInterpreter;
use crate::state::GameState;

/// The interpreter-side capability set of a session: produce narration,
/// validate and apply a play, report game over. `ScenarioInterpreter`
/// is the scenario-driven implementation.
pub trait Prompter {
    fn narrate(&self, state: &mut GameState) -> Result<String, TaleError>;
    fn try_apply(&self, candidate: &str, state: &mut GameState) -> Result<bool, TaleError>;
    fn is_over(&self, state: &GameState) -> bool;
}

impl Prompter for ScenarioInterpreter {
    fn narrate(&self, state: &mut GameState) -> Result<String, TaleError> {
        ScenarioInterpreter::narrate(self, state)
    }

    fn try_apply(&self, candidate: &str, state: &mut GameState) -> Result<bool, TaleError> {
        ScenarioInterpreter::try_apply(self, candidate, state)
    }

    fn is_over(&self, state: &GameState) -> bool {
        ScenarioInterpreter::is_over(self, state)
    }
}

/// Produces the next candidate play. Synchronous and opaque to the
/// interpreter; a human at a terminal, a scripted queue, anything.
pub trait PlayerSource {
    fn next_action(&mut self, prompt: &str) -> Result<String, TaleError>;
}

/// Replays a fixed sequence of plays. Used by tests and useful for
/// scripted walkthroughs.
pub struct ScriptedPlayer {
    queue: VecDeque<String>,
}

impl ScriptedPlayer {
    pub fn new(plays: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            queue: plays.into_iter().map(Into::into).collect(),
        }
    }
}

impl PlayerSource for ScriptedPlayer {
    fn next_action(&mut self, _prompt: &str) -> Result<String, TaleError> {
        self.queue.pop_front().ok_or_else(|| {
            TaleError::new(
                "SESSION_PLAYER_EXHAUSTED",
                "Scripted player ran out of plays before the game ended.",
            )
        })
    }
}

/// Drives a full session: narrate, print, stop on game over, otherwise
/// re-solicit plays until one is accepted, then narrate again. The
/// rejection notice goes to `out`; narration is never repeated for a
/// rejected play.
pub fn run_session(
    prompter: &dyn Prompter,
    player: &mut dyn PlayerSource,
    state: &mut GameState,
    out: &mut dyn Write,
) -> Result<(), TaleError> {
    loop {
        let prompt = prompter.narrate(state)?;
        writeln!(out, "{}", prompt).map_err(map_session_io)?;

        if prompter.is_over(state) {
            return Ok(());
        }

        let mut play = player.next_action(&prompt)?;
        while !prompter.try_apply(&play, state)? {
            writeln!(out, "Nothing happens. Try something else.").map_err(map_session_io)?;
            play = player.next_action(&prompt)?;
        }
    }
}

fn map_session_io(error: std::io::Error) -> TaleError {
    TaleError::new("SESSION_IO", format!("Session output failed: {}", error))
}
