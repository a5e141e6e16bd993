use std::collections::BTreeSet;

use roxmltree::{Document, Node};
use tale_core::{
    parse_literal, ActionEntry, NarrationEntry, Room, ScenarioModel, SetVar, SourceLocation,
    SourceSpan, TaleError, VarBinding, GAME_OVER_VAR,
};

/// Parses a scenario document into the immutable model, enforcing the
/// load-time invariants: unique room ids, resolvable destinations, at
/// least one narration entry per room, parsable literals.
pub fn parse_scenario(source: &str) -> Result<ScenarioModel, TaleError> {
    let document = Document::parse(source)
        .map_err(|error| TaleError::new("SCENARIO_PARSE_ERROR", error.to_string()))?;

    let Some(root) = document.root().children().find(|node| node.is_element()) else {
        return Err(TaleError::new(
            "SCENARIO_PARSE_ERROR",
            "Scenario document must contain a root element.",
        ));
    };
    if root.tag_name().name() != "scenario" {
        return Err(TaleError::with_span(
            "SCENARIO_ROOT_INVALID",
            format!(
                "Expected <scenario> root element, found <{}>.",
                root.tag_name().name()
            ),
            node_span(&document, root),
        ));
    }

    let mut vars = Vec::new();
    let mut rooms: Vec<Room> = Vec::new();

    for child in root.children().filter(|node| node.is_element()) {
        match child.tag_name().name() {
            "var" => vars.push(parse_var(&document, child)?),
            "room" => {
                let room = parse_room(&document, child)?;
                if rooms.iter().any(|existing| existing.id == room.id) {
                    return Err(TaleError::with_span(
                        "ROOM_ID_DUPLICATE",
                        format!("Room id \"{}\" is declared more than once.", room.id),
                        room.location,
                    ));
                }
                rooms.push(room);
            }
            other => {
                return Err(TaleError::with_span(
                    "SCENARIO_ELEMENT_UNKNOWN",
                    format!("Unexpected <{}> element in scenario.", other),
                    node_span(&document, child),
                ));
            }
        }
    }

    let Some(first_room) = rooms.first() else {
        return Err(TaleError::new(
            "SCENARIO_ROOMS_EMPTY",
            "Scenario declares no rooms.",
        ));
    };

    let start_room = match root.attribute("start") {
        Some(id) => id.to_string(),
        None => first_room.id.clone(),
    };
    if !rooms.iter().any(|room| room.id == start_room) {
        return Err(TaleError::new(
            "START_ROOM_UNRESOLVED",
            format!("Start room \"{}\" is not declared.", start_room),
        ));
    }

    let room_ids: BTreeSet<&str> = rooms.iter().map(|room| room.id.as_str()).collect();
    for room in &rooms {
        for action in &room.actions {
            if let Some(to) = &action.to {
                if !room_ids.contains(to.as_str()) {
                    return Err(TaleError::with_span(
                        "PLAY_DEST_UNRESOLVED",
                        format!(
                            "Play \"{}\" in room \"{}\" targets unknown room \"{}\".",
                            action.trigger, room.id, to
                        ),
                        action.location.clone(),
                    ));
                }
            }
        }
    }

    Ok(ScenarioModel {
        vars,
        rooms,
        start_room,
    })
}

fn parse_var(document: &Document<'_>, node: Node<'_, '_>) -> Result<VarBinding, TaleError> {
    let span = node_span(document, node);
    let Some(name) = node.attribute("name") else {
        return Err(TaleError::with_span(
            "VAR_NAME_MISSING",
            "<var> element is missing its name attribute.",
            span,
        ));
    };
    if name == GAME_OVER_VAR {
        return Err(TaleError::with_span(
            "VAR_RESERVED",
            format!("Variable \"{}\" is reserved and seeded automatically.", name),
            span,
        ));
    }

    let raw = element_text(node);
    let value = parse_literal(&raw)
        .map_err(|error| TaleError::with_span(error.code, error.message, span.clone()))?;

    Ok(VarBinding {
        name: name.to_string(),
        value,
        location: span,
    })
}

fn parse_room(document: &Document<'_>, node: Node<'_, '_>) -> Result<Room, TaleError> {
    let span = node_span(document, node);
    let Some(id) = node.attribute("id") else {
        return Err(TaleError::with_span(
            "ROOM_ID_MISSING",
            "<room> element is missing its id attribute.",
            span,
        ));
    };

    let mut narration = Vec::new();
    let mut actions = Vec::new();

    for child in node.children().filter(|child| child.is_element()) {
        match child.tag_name().name() {
            "prompt" => narration.push(parse_prompt(document, child, id)?),
            "play" => actions.push(parse_play(document, child, id)?),
            other => {
                return Err(TaleError::with_span(
                    "ROOM_ELEMENT_UNKNOWN",
                    format!("Unexpected <{}> element in room \"{}\".", other, id),
                    node_span(document, child),
                ));
            }
        }
    }

    if narration.is_empty() {
        return Err(TaleError::with_span(
            "ROOM_NARRATION_EMPTY",
            format!("Room \"{}\" declares no <prompt> entries.", id),
            span,
        ));
    }

    Ok(Room {
        id: id.to_string(),
        narration,
        actions,
        location: span,
    })
}

fn parse_prompt(
    document: &Document<'_>,
    node: Node<'_, '_>,
    room_id: &str,
) -> Result<NarrationEntry, TaleError> {
    let span = node_span(document, node);
    let text = element_text(node);
    if text.is_empty() {
        return Err(TaleError::with_span(
            "PROMPT_TEXT_EMPTY",
            format!("A <prompt> in room \"{}\" has no text.", room_id),
            span,
        ));
    }

    Ok(NarrationEntry {
        text,
        flag: node.attribute("flag").map(str::to_string),
        set: parse_set_var(document, node, room_id)?,
        ends_game: node.attribute("gameover") == Some("1"),
        location: span,
    })
}

fn parse_play(
    document: &Document<'_>,
    node: Node<'_, '_>,
    room_id: &str,
) -> Result<ActionEntry, TaleError> {
    let span = node_span(document, node);
    let trigger = element_text(node);
    if trigger.is_empty() {
        return Err(TaleError::with_span(
            "PLAY_TRIGGER_EMPTY",
            format!("A <play> in room \"{}\" has no trigger text.", room_id),
            span,
        ));
    }

    Ok(ActionEntry {
        trigger,
        flag: node.attribute("flag").map(str::to_string),
        to: node.attribute("to").map(str::to_string),
        set: parse_set_var(document, node, room_id)?,
        location: span,
    })
}

/// `var` and `val` attributes travel as a pair; the value side is a
/// typed literal, same syntax as `<var>` initializers.
fn parse_set_var(
    document: &Document<'_>,
    node: Node<'_, '_>,
    room_id: &str,
) -> Result<Option<SetVar>, TaleError> {
    let span = node_span(document, node);
    match (node.attribute("var"), node.attribute("val")) {
        (None, None) => Ok(None),
        (Some(name), Some(raw)) => {
            let value = parse_literal(raw)
                .map_err(|error| TaleError::with_span(error.code, error.message, span))?;
            Ok(Some(SetVar {
                name: name.to_string(),
                value,
            }))
        }
        _ => Err(TaleError::with_span(
            "SET_VAR_INCOMPLETE",
            format!(
                "An entry in room \"{}\" declares var/val attributes without its pair.",
                room_id
            ),
            span,
        )),
    }
}

fn element_text(node: Node<'_, '_>) -> String {
    let mut out = String::new();
    for child in node.children() {
        if child.is_text() {
            out.push_str(child.text().unwrap_or_default());
        }
    }
    out.trim().to_string()
}

fn node_span(document: &Document<'_>, node: Node<'_, '_>) -> SourceSpan {
    let range = node.range();
    let start = document.text_pos_at(range.start);
    let end = document.text_pos_at(range.end);
    SourceSpan {
        start: SourceLocation {
            line: start.row as usize,
            column: start.col as usize,
        },
        end: SourceLocation {
            line: end.row as usize,
            column: end.col as usize,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tale_core::TaleValue;

    const QUESADILLA: &str = r#"
<scenario>
  <var name="got_quesadilla">false</var>
  <var name="hunger">3</var>
  <var name="order">'nothing yet'</var>
  <room id="cantina">
    <prompt flag="$got_quesadilla">You already have your quesadilla.</prompt>
    <prompt>The cantina is warm and loud.</prompt>
    <play var="got_quesadilla" val="true">order quesadilla</play>
    <play to="street" flag="$got_quesadilla">leave</play>
  </room>
  <room id="street">
    <prompt gameover="1">You step into the night, dinner in hand.</prompt>
  </room>
</scenario>
"#;

    #[test]
    fn parses_vars_rooms_and_entries_in_order() {
        let model = parse_scenario(QUESADILLA).expect("scenario should parse");

        assert_eq!(model.start_room, "cantina");
        assert_eq!(model.vars.len(), 3);
        assert_eq!(model.vars[0].name, "got_quesadilla");
        assert_eq!(model.vars[0].value, TaleValue::Bool(false));
        assert_eq!(model.vars[1].value, TaleValue::Number(3.0));
        assert_eq!(
            model.vars[2].value,
            TaleValue::String("nothing yet".to_string())
        );

        let cantina = model.room("cantina").expect("cantina should exist");
        assert_eq!(cantina.narration.len(), 2);
        assert_eq!(
            cantina.narration[0].flag.as_deref(),
            Some("$got_quesadilla")
        );
        assert_eq!(cantina.narration[1].flag, None);
        assert_eq!(cantina.actions.len(), 2);
        assert_eq!(cantina.actions[0].trigger, "order quesadilla");
        assert_eq!(
            cantina.actions[0].set,
            Some(SetVar {
                name: "got_quesadilla".to_string(),
                value: TaleValue::Bool(true),
            })
        );
        assert_eq!(cantina.actions[1].to.as_deref(), Some("street"));

        let street = model.room("street").expect("street should exist");
        assert!(street.narration[0].ends_game);
    }

    #[test]
    fn explicit_start_attribute_wins() {
        let model = parse_scenario(
            r#"
<scenario start="b">
  <room id="a"><prompt>A.</prompt></room>
  <room id="b"><prompt>B.</prompt></room>
</scenario>
"#,
        )
        .expect("scenario should parse");
        assert_eq!(model.start_room, "b");
    }

    #[test]
    fn start_defaults_to_first_declared_room() {
        let model = parse_scenario(
            r#"
<scenario>
  <room id="first"><prompt>Here.</prompt></room>
  <room id="second"><prompt>There.</prompt></room>
</scenario>
"#,
        )
        .expect("scenario should parse");
        assert_eq!(model.start_room, "first");
    }

    #[test]
    fn rejects_unknown_start_room() {
        let error = parse_scenario(
            r#"<scenario start="void"><room id="a"><prompt>A.</prompt></room></scenario>"#,
        )
        .expect_err("unknown start should fail");
        assert_eq!(error.code, "START_ROOM_UNRESOLVED");
    }

    #[test]
    fn rejects_unresolved_play_destination() {
        let error = parse_scenario(
            r#"
<scenario>
  <room id="a">
    <prompt>A.</prompt>
    <play to="nowhere">walk</play>
  </room>
</scenario>
"#,
        )
        .expect_err("bad destination should fail");
        assert_eq!(error.code, "PLAY_DEST_UNRESOLVED");
        assert!(error.message.contains("nowhere"));
        assert!(error.span.is_some());
    }

    #[test]
    fn rejects_room_without_narration() {
        let error = parse_scenario(
            r#"<scenario><room id="a"><play>wave</play></room></scenario>"#,
        )
        .expect_err("narration-less room should fail");
        assert_eq!(error.code, "ROOM_NARRATION_EMPTY");
    }

    #[test]
    fn rejects_duplicate_room_ids() {
        let error = parse_scenario(
            r#"
<scenario>
  <room id="a"><prompt>One.</prompt></room>
  <room id="a"><prompt>Two.</prompt></room>
</scenario>
"#,
        )
        .expect_err("duplicate id should fail");
        assert_eq!(error.code, "ROOM_ID_DUPLICATE");
    }

    #[test]
    fn rejects_unparsable_literal() {
        let error = parse_scenario(
            r#"
<scenario>
  <var name="x">maybe</var>
  <room id="a"><prompt>A.</prompt></room>
</scenario>
"#,
        )
        .expect_err("bad literal should fail");
        assert_eq!(error.code, "LITERAL_INVALID");
        assert!(error.span.is_some());
    }

    #[test]
    fn rejects_reserved_game_over_declaration() {
        let error = parse_scenario(
            r#"
<scenario>
  <var name="game_over">true</var>
  <room id="a"><prompt>A.</prompt></room>
</scenario>
"#,
        )
        .expect_err("reserved var should fail");
        assert_eq!(error.code, "VAR_RESERVED");
    }

    #[test]
    fn rejects_var_without_val_pair() {
        let error = parse_scenario(
            r#"
<scenario>
  <room id="a">
    <prompt var="x">A.</prompt>
  </room>
</scenario>
"#,
        )
        .expect_err("half a set pair should fail");
        assert_eq!(error.code, "SET_VAR_INCOMPLETE");
    }

    #[test]
    fn rejects_empty_scenario() {
        let error = parse_scenario(r#"<scenario></scenario>"#)
            .expect_err("room-less scenario should fail");
        assert_eq!(error.code, "SCENARIO_ROOMS_EMPTY");
    }

    #[test]
    fn rejects_invalid_xml() {
        let error = parse_scenario("<scenario>").expect_err("invalid xml should fail");
        assert_eq!(error.code, "SCENARIO_PARSE_ERROR");
    }
}
