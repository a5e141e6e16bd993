use std::fs;
use std::io::{BufRead, Write};
use std::path::Path;

use serde::Serialize;
use tale_core::{ScenarioModel, TaleError, TaleValue};
use tale_parser::parse_scenario;
use tale_runtime::{run_session, PlayerSource, ScenarioInterpreter};

/// Reads and parses a scenario file into a ready interpreter.
pub fn load_interpreter(path: &Path) -> Result<ScenarioInterpreter, TaleError> {
    let source = fs::read_to_string(path).map_err(|error| {
        TaleError::new(
            "CLI_SCENARIO_READ",
            format!("Cannot read scenario {}: {}", path.display(), error),
        )
    })?;
    Ok(ScenarioInterpreter::new(parse_scenario(&source)?))
}

/// Player source backed by a line reader; prompts with `> ` before
/// each read, like a classic console adventure.
pub struct LinePlayer<R: BufRead, W: Write> {
    reader: R,
    prompt_writer: W,
}

impl<R: BufRead, W: Write> LinePlayer<R, W> {
    pub fn new(reader: R, prompt_writer: W) -> Self {
        Self {
            reader,
            prompt_writer,
        }
    }
}

impl<R: BufRead, W: Write> PlayerSource for LinePlayer<R, W> {
    fn next_action(&mut self, _prompt: &str) -> Result<String, TaleError> {
        write!(self.prompt_writer, "> ").map_err(map_cli_io)?;
        self.prompt_writer.flush().map_err(map_cli_io)?;

        let mut line = String::new();
        let read = self.reader.read_line(&mut line).map_err(map_cli_io)?;
        if read == 0 {
            return Err(TaleError::new(
                "SESSION_INPUT_CLOSED",
                "Player input closed before the game ended.",
            ));
        }
        Ok(line.trim_end_matches(&['\r', '\n'][..]).to_string())
    }
}

/// Runs one interactive session over the given reader/writer pair.
/// The binary passes stdin/stdout; tests inject buffers.
pub fn play_with_io(
    interpreter: &ScenarioInterpreter,
    reader: impl BufRead,
    prompt_writer: impl Write,
    out: &mut dyn Write,
) -> Result<(), TaleError> {
    let mut player = LinePlayer::new(reader, prompt_writer);
    let mut state = interpreter.start_state();
    run_session(interpreter, &mut player, &mut state, out)
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioSummary {
    pub start_room: String,
    pub vars: Vec<VarSummary>,
    pub rooms: Vec<RoomSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VarSummary {
    pub name: String,
    pub initial: TaleValue,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: String,
    pub narration_entries: usize,
    pub action_entries: usize,
}

/// `check` output: the model reduced to what a scenario author wants
/// to eyeball after a successful load.
pub fn summarize(model: &ScenarioModel) -> ScenarioSummary {
    ScenarioSummary {
        start_room: model.start_room.clone(),
        vars: model
            .vars
            .iter()
            .map(|binding| VarSummary {
                name: binding.name.clone(),
                initial: binding.value.clone(),
            })
            .collect(),
        rooms: model
            .rooms
            .iter()
            .map(|room| RoomSummary {
                id: room.id.clone(),
                narration_entries: room.narration.len(),
                action_entries: room.actions.len(),
            })
            .collect(),
    }
}

fn map_cli_io(error: std::io::Error) -> TaleError {
    TaleError::new("CLI_IO", format!("Console io failed: {}", error))
}
