use std::collections::BTreeMap;

use tale_core::{ScenarioModel, TaleValue, GAME_OVER_VAR};

/// One line of session history: what the interpreter narrated and
/// which plays were accepted, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEntry {
    Narration(String),
    Action(String),
}

/// Mutable per-session state: the variable store plus the current room
/// pointer. Owned by one session; never shared. The scenario model it
/// was seeded from stays immutable and reusable.
#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    vars: BTreeMap<String, TaleValue>,
    room_id: String,
    transcript: Vec<TranscriptEntry>,
}

impl GameState {
    /// Seeds a fresh session: one entry per declared variable, the
    /// reserved `game_over` boolean, and the scenario's start room.
    pub fn for_scenario(model: &ScenarioModel) -> Self {
        let mut vars = BTreeMap::new();
        for binding in &model.vars {
            vars.insert(binding.name.clone(), binding.value.clone());
        }
        vars.insert(GAME_OVER_VAR.to_string(), TaleValue::Bool(false));

        Self {
            vars,
            room_id: model.start_room.clone(),
            transcript: Vec::new(),
        }
    }

    pub fn var(&self, name: &str) -> Option<&TaleValue> {
        self.vars.get(name)
    }

    pub fn vars(&self) -> &BTreeMap<String, TaleValue> {
        &self.vars
    }

    pub fn set_var(&mut self, name: &str, value: TaleValue) {
        self.vars.insert(name.to_string(), value);
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn set_room(&mut self, id: &str) {
        self.room_id = id.to_string();
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn record_narration(&mut self, text: &str) {
        self.transcript.push(TranscriptEntry::Narration(text.to_string()));
    }

    pub fn record_action(&mut self, play: &str) {
        self.transcript.push(TranscriptEntry::Action(play.to_string()));
    }
}
