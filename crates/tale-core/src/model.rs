use serde::{Deserialize, Serialize};

use crate::value::TaleValue;

/// Reserved variable seeded into every session; narration entries with
/// `gameover="1"` set it and `is_over` reads it.
pub const GAME_OVER_VAR: &str = "game_over";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// A variable assignment attached to a narration or action entry,
/// applied when that entry is selected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetVar {
    pub name: String,
    pub value: TaleValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarBinding {
    pub name: String,
    pub value: TaleValue,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationEntry {
    pub text: String,
    pub flag: Option<String>,
    pub set: Option<SetVar>,
    pub ends_game: bool,
    pub location: SourceSpan,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionEntry {
    pub trigger: String,
    pub flag: Option<String>,
    pub to: Option<String>,
    pub set: Option<SetVar>,
    pub location: SourceSpan,
}

/// A room with its narration and action entries in declaration order.
/// Order is selection order: the first matching entry wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub narration: Vec<NarrationEntry>,
    pub actions: Vec<ActionEntry>,
    pub location: SourceSpan,
}

/// The immutable scenario definition. Built once by the loader, shared
/// read-only by any number of sessions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioModel {
    pub vars: Vec<VarBinding>,
    pub rooms: Vec<Room>,
    pub start_room: String,
}

impl ScenarioModel {
    pub fn room(&self, id: &str) -> Option<&Room> {
        self.rooms.iter().find(|room| room.id == id)
    }
}
