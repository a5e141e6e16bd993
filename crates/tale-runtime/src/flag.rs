use std::collections::BTreeMap;

use tale_core::{TaleError, TaleValue};

/// Evaluates a guard expression against the variable store.
///
/// Grammar, loosest binding first:
///
/// ```text
/// or_expr  := and_expr ( "or" and_expr )*
/// and_expr := not_expr ( "and" not_expr )*
/// not_expr := "not" not_expr | primary
/// primary  := "$" name | "true" | "false" | "(" or_expr ")"
/// ```
///
/// Pure function of (expression, store snapshot). Both operands of
/// `and`/`or` are evaluated, so an unresolved variable reference is
/// reported wherever it appears.
pub fn eval_flag(expr: &str, vars: &BTreeMap<String, TaleValue>) -> Result<bool, TaleError> {
    let tokens = tokenize(expr);
    if tokens.is_empty() {
        return Err(TaleError::new(
            "FLAG_EMPTY",
            "Guard expression is empty.",
        ));
    }

    let mut parser = FlagParser {
        tokens,
        position: 0,
        vars,
    };
    let value = parser.or_expr()?;
    if parser.position != parser.tokens.len() {
        return Err(TaleError::new(
            "FLAG_SYNTAX",
            format!(
                "Unexpected token \"{}\" after end of expression.",
                parser.tokens[parser.position]
            ),
        ));
    }
    Ok(value)
}

fn tokenize(expr: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    for ch in expr.chars() {
        match ch {
            '(' | ')' => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
                tokens.push(ch.to_string());
            }
            _ if ch.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

struct FlagParser<'a> {
    tokens: Vec<String>,
    position: usize,
    vars: &'a BTreeMap<String, TaleValue>,
}

impl FlagParser<'_> {
    fn peek(&self) -> Option<&str> {
        self.tokens.get(self.position).map(String::as_str)
    }

    fn bump(&mut self) {
        self.position += 1;
    }

    fn next_token(&mut self) -> Option<String> {
        let token = self.tokens.get(self.position).cloned();
        if token.is_some() {
            self.position += 1;
        }
        token
    }

    fn or_expr(&mut self) -> Result<bool, TaleError> {
        let mut value = self.and_expr()?;
        while self.peek() == Some("or") {
            self.bump();
            let rhs = self.and_expr()?;
            value = value || rhs;
        }
        Ok(value)
    }

    fn and_expr(&mut self) -> Result<bool, TaleError> {
        let mut value = self.not_expr()?;
        while self.peek() == Some("and") {
            self.bump();
            let rhs = self.not_expr()?;
            value = value && rhs;
        }
        Ok(value)
    }

    fn not_expr(&mut self) -> Result<bool, TaleError> {
        if self.peek() == Some("not") {
            self.bump();
            return Ok(!self.not_expr()?);
        }
        self.primary()
    }

    fn primary(&mut self) -> Result<bool, TaleError> {
        let Some(token) = self.next_token() else {
            return Err(TaleError::new(
                "FLAG_SYNTAX",
                "Guard expression ends where a value was expected.",
            ));
        };

        match token.as_str() {
            "true" => Ok(true),
            "false" => Ok(false),
            "(" => {
                let value = self.or_expr()?;
                if self.next_token().as_deref() != Some(")") {
                    return Err(TaleError::new(
                        "FLAG_SYNTAX",
                        "Missing closing parenthesis in guard expression.",
                    ));
                }
                Ok(value)
            }
            _ if token.starts_with('$') => {
                let name = token[1..].to_string();
                self.resolve(&name)
            }
            other => Err(TaleError::new(
                "FLAG_SYNTAX",
                format!("Unexpected token \"{}\" in guard expression.", other),
            )),
        }
    }

    fn resolve(&self, name: &str) -> Result<bool, TaleError> {
        let Some(value) = self.vars.get(name) else {
            return Err(TaleError::new(
                "FLAG_VAR_UNRESOLVED",
                format!("Guard references undeclared variable \"{}\".", name),
            ));
        };
        value.as_bool().ok_or_else(|| {
            TaleError::new(
                "FLAG_TYPE_MISMATCH",
                format!(
                    "Guard variable \"{}\" is a {}, expected boolean.",
                    name,
                    value.type_name()
                ),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, TaleValue)]) -> BTreeMap<String, TaleValue> {
        entries
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn resolves_single_variable() {
        let store = vars(&[("door_open", TaleValue::Bool(true))]);
        assert!(eval_flag("$door_open", &store).expect("eval"));
        assert!(!eval_flag("not $door_open", &store).expect("eval"));
    }

    #[test]
    fn not_binds_tighter_than_and_which_binds_tighter_than_or() {
        let store = vars(&[
            ("a", TaleValue::Bool(false)),
            ("b", TaleValue::Bool(false)),
            ("c", TaleValue::Bool(true)),
        ]);
        // (not a) and b, then or c
        assert!(eval_flag("not $a and $b or $c", &store).expect("eval"));
        assert!(!eval_flag("not $a and $b", &store).expect("eval"));
        assert!(eval_flag("not ($a and $b)", &store).expect("eval"));
    }

    #[test]
    fn parenthesized_groups_override_precedence() {
        let store = vars(&[
            ("a", TaleValue::Bool(true)),
            ("b", TaleValue::Bool(false)),
            ("c", TaleValue::Bool(false)),
        ]);
        assert!(!eval_flag("$a and ($b or $c)", &store).expect("eval"));
        assert!(eval_flag("($a and $b) or not $c", &store).expect("eval"));
    }

    #[test]
    fn double_negation_cancels() {
        let store = vars(&[("a", TaleValue::Bool(true))]);
        assert!(eval_flag("not not $a", &store).expect("eval"));
    }

    #[test]
    fn boolean_literals_are_values() {
        let store = BTreeMap::new();
        assert!(eval_flag("true", &store).expect("eval"));
        assert!(!eval_flag("false and true", &store).expect("eval"));
    }

    #[test]
    fn undeclared_variable_is_an_error() {
        let store = BTreeMap::new();
        let error = eval_flag("$ghost", &store).expect_err("undeclared should fail");
        assert_eq!(error.code, "FLAG_VAR_UNRESOLVED");
    }

    #[test]
    fn non_boolean_variable_is_an_error() {
        let store = vars(&[("count", TaleValue::Number(2.0))]);
        let error = eval_flag("$count", &store).expect_err("number should fail");
        assert_eq!(error.code, "FLAG_TYPE_MISMATCH");
    }

    #[test]
    fn unresolved_variable_fails_even_after_true_or() {
        let store = vars(&[("a", TaleValue::Bool(true))]);
        let error = eval_flag("$a or $ghost", &store).expect_err("rhs should still resolve");
        assert_eq!(error.code, "FLAG_VAR_UNRESOLVED");
    }

    #[test]
    fn empty_expression_is_an_error() {
        let store = BTreeMap::new();
        let error = eval_flag("   ", &store).expect_err("empty should fail");
        assert_eq!(error.code, "FLAG_EMPTY");
    }

    #[test]
    fn syntax_errors_are_reported() {
        let store = vars(&[("a", TaleValue::Bool(true))]);
        assert_eq!(
            eval_flag("$a and", &store).expect_err("dangling and").code,
            "FLAG_SYNTAX"
        );
        assert_eq!(
            eval_flag("$a $a", &store).expect_err("trailing token").code,
            "FLAG_SYNTAX"
        );
        assert_eq!(
            eval_flag("($a", &store).expect_err("open paren").code,
            "FLAG_SYNTAX"
        );
        assert_eq!(
            eval_flag("and $a", &store).expect_err("leading and").code,
            "FLAG_SYNTAX"
        );
    }

    #[test]
    fn parens_need_no_surrounding_whitespace() {
        let store = vars(&[("a", TaleValue::Bool(true))]);
        assert!(eval_flag("($a)and not($a and not $a)", &store).expect("eval"));
    }
}
