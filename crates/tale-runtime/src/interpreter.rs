use tale_core::{Room, ScenarioModel, TaleError, TaleValue, GAME_OVER_VAR};

use crate::flag::eval_flag;
use crate::state::GameState;

/// Drives one scenario: selects narration, validates and applies plays,
/// reports game over. Holds the immutable model; all mutation goes
/// through the `GameState` passed into each call.
///
/// Guard policy: a narration or action entry whose guard fails to
/// evaluate (undeclared variable, non-boolean, syntax error) is
/// skipped and scanning continues, the same as a guard that is false.
/// Evaluation errors never escape `narrate` or `try_apply`.
#[derive(Debug)]
pub struct ScenarioInterpreter {
    model: ScenarioModel,
}

impl ScenarioInterpreter {
    pub fn new(model: ScenarioModel) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &ScenarioModel {
        &self.model
    }

    /// Fresh session state seeded from the model.
    pub fn start_state(&self) -> GameState {
        GameState::for_scenario(&self.model)
    }

    /// Selects the active narration for the current room, applies its
    /// side effects once, and returns its text. When every guarded
    /// entry is false (or non-evaluable), falls back to the room's
    /// first entry without applying that entry's side effects.
    pub fn narrate(&self, state: &mut GameState) -> Result<String, TaleError> {
        let room = self.current_room(state)?;

        let Some(first) = room.narration.first() else {
            return Err(TaleError::with_span(
                "ROOM_NARRATION_EMPTY",
                format!("Room \"{}\" has no narration entries.", room.id),
                room.location.clone(),
            ));
        };

        for entry in &room.narration {
            let active = match &entry.flag {
                None => true,
                Some(flag) => eval_flag(flag, state.vars()).unwrap_or(false),
            };
            if !active {
                continue;
            }

            if let Some(set) = &entry.set {
                state.set_var(&set.name, set.value.clone());
            }
            if entry.ends_game {
                state.set_var(GAME_OVER_VAR, TaleValue::Bool(true));
            }
            state.record_narration(&entry.text);
            return Ok(entry.text.clone());
        }

        state.record_narration(&first.text);
        Ok(first.text.clone())
    }

    /// Applies the first action entry whose trigger text equals the
    /// candidate and whose guard passes. Returns false, with state
    /// untouched, when nothing matches.
    pub fn try_apply(&self, candidate: &str, state: &mut GameState) -> Result<bool, TaleError> {
        let room = self.current_room(state)?;

        for entry in &room.actions {
            if entry.trigger != candidate {
                continue;
            }
            if let Some(flag) = &entry.flag {
                if !eval_flag(flag, state.vars()).unwrap_or(false) {
                    continue;
                }
            }

            if let Some(set) = &entry.set {
                state.set_var(&set.name, set.value.clone());
            }
            if let Some(to) = &entry.to {
                state.set_room(to);
            }
            state.record_action(candidate);
            return Ok(true);
        }

        Ok(false)
    }

    /// Pure read of the reserved `game_over` variable.
    pub fn is_over(&self, state: &GameState) -> bool {
        state
            .var(GAME_OVER_VAR)
            .and_then(TaleValue::as_bool)
            .unwrap_or(false)
    }

    /// Unknown current room is an interpreter bug: load-time validation
    /// guarantees every transition target exists.
    fn current_room(&self, state: &GameState) -> Result<&Room, TaleError> {
        self.model.room(state.room_id()).ok_or_else(|| {
            TaleError::new(
                "ROOM_UNRESOLVED",
                format!("Current room \"{}\" is not in the scenario.", state.room_id()),
            )
        })
    }
}
