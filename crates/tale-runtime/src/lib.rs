pub mod flag;
pub mod interpreter;
pub mod session;
pub mod state;

pub use flag::eval_flag;
pub use interpreter::ScenarioInterpreter;
pub use session::{run_session, PlayerSource, Prompter, ScriptedPlayer};
pub use state::{GameState, TranscriptEntry};
