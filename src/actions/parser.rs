//! Deterministic parser from free-text action lines to typed actions
//!
//! Input is whatever the LLM or the fallback tree produced: one logical
//! action per non-empty line, case-insensitive verb token. Parsing is total;
//! a line that does not match drops out with a warning instead of failing
//! the caller.

use tracing::warn;

use crate::actions::model::{Action, Direction};
use crate::core::types::EntityId;

/// Parse free text into executable actions for `actor`.
///
/// The first non-empty line is the primary action. When it is a `LOG`, one
/// additional line is parsed and returned after it; further lines are
/// ignored. Output length is always 0, 1, or 2.
pub fn parse(actor: EntityId, text: &str) -> Vec<Action> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    let Some(first) = lines.next() else {
        return Vec::new();
    };

    let mut actions = Vec::new();
    match parse_line(actor, first) {
        Some(action @ Action::Log { .. }) => {
            actions.push(action);
            if let Some(second) = lines.next() {
                if let Some(follow_up) = parse_line(actor, second) {
                    actions.push(follow_up);
                }
            }
        }
        Some(action) => actions.push(action),
        None => {}
    }
    actions
}

/// Parse a single trimmed, non-empty line
fn parse_line(actor: EntityId, line: &str) -> Option<Action> {
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let parsed = match verb.to_ascii_uppercase().as_str() {
        "MOVE" => Direction::from_token(rest).map(|dir| {
            let (dx, dy) = dir.delta();
            Action::Move { dx, dy }
        }),
        "ATTACK" => parse_entity_arg(rest).map(|target| Action::Attack { target }),
        "PICKUP" => parse_entity_arg(rest).map(|item| Action::Pickup { item }),
        "LOG" => Some(Action::Log {
            message: rest.to_string(),
        }),
        "IDLE" if rest.is_empty() => Some(Action::Idle),
        "GENERATE_ABILITY" if !rest.is_empty() => Some(Action::GenerateAbility {
            // Description passes through verbatim; the ability pipeline
            // interprets it, not us.
            description: rest.to_string(),
        }),
        "USE_ABILITY" => parse_use_ability(rest),
        _ => None,
    };

    if parsed.is_none() {
        warn!(actor = %actor, line, "dropping unparseable action line");
    }
    parsed
}

/// `<name>` or `<name> <target:int>`; anything else fails the segment
fn parse_use_ability(rest: &str) -> Option<Action> {
    let mut tokens = rest.split_whitespace();
    let name = tokens.next()?.to_string();
    let target = match tokens.next() {
        Some(token) => Some(EntityId(token.parse().ok()?)),
        None => None,
    };
    if tokens.next().is_some() {
        return None;
    }
    Some(Action::UseAbility { name, target })
}

fn parse_entity_arg(rest: &str) -> Option<EntityId> {
    let mut tokens = rest.split_whitespace();
    let id = tokens.next()?.parse().ok()?;
    if tokens.next().is_some() {
        return None;
    }
    Some(EntityId(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ACTOR: EntityId = EntityId(1);

    #[test]
    fn test_move_directions() {
        assert_eq!(parse(ACTOR, "MOVE N"), vec![Action::Move { dx: 0, dy: -1 }]);
        assert_eq!(parse(ACTOR, "MOVE S"), vec![Action::Move { dx: 0, dy: 1 }]);
        assert_eq!(parse(ACTOR, "MOVE E"), vec![Action::Move { dx: 1, dy: 0 }]);
        assert_eq!(parse(ACTOR, "MOVE W"), vec![Action::Move { dx: -1, dy: 0 }]);
    }

    #[test]
    fn test_move_invalid_direction_dropped() {
        assert!(parse(ACTOR, "MOVE UP").is_empty());
        assert!(parse(ACTOR, "MOVE").is_empty());
    }

    #[test]
    fn test_verb_case_insensitive() {
        assert_eq!(parse(ACTOR, "move e"), vec![Action::Move { dx: 1, dy: 0 }]);
        assert_eq!(parse(ACTOR, "Idle"), vec![Action::Idle]);
    }

    #[test]
    fn test_attack_and_pickup_require_integer() {
        assert_eq!(
            parse(ACTOR, "ATTACK 7"),
            vec![Action::Attack {
                target: EntityId(7)
            }]
        );
        assert_eq!(
            parse(ACTOR, "PICKUP 12"),
            vec![Action::Pickup {
                item: EntityId(12)
            }]
        );
        assert!(parse(ACTOR, "ATTACK the goblin").is_empty());
        assert!(parse(ACTOR, "PICKUP").is_empty());
    }

    #[test]
    fn test_idle_with_trailing_text_unmatched() {
        assert_eq!(parse(ACTOR, "IDLE"), vec![Action::Idle]);
        assert!(parse(ACTOR, "IDLE for a while").is_empty());
    }

    #[test]
    fn test_generate_ability_verbatim() {
        assert_eq!(
            parse(ACTOR, "GENERATE_ABILITY tunnel through stone walls"),
            vec![Action::GenerateAbility {
                description: "tunnel through stone walls".into()
            }]
        );
        assert!(parse(ACTOR, "GENERATE_ABILITY").is_empty());
    }

    #[test]
    fn test_use_ability_optional_target() {
        assert_eq!(
            parse(ACTOR, "USE_ABILITY dig"),
            vec![Action::UseAbility {
                name: "dig".into(),
                target: None
            }]
        );
        assert_eq!(
            parse(ACTOR, "USE_ABILITY zap 4"),
            vec![Action::UseAbility {
                name: "zap".into(),
                target: Some(EntityId(4))
            }]
        );
        // Non-integer second token fails the whole segment.
        assert!(parse(ACTOR, "USE_ABILITY zap goblin").is_empty());
    }

    #[test]
    fn test_log_allows_one_follow_up_line() {
        let actions = parse(ACTOR, "LOG heading north\nMOVE N\nMOVE S");
        assert_eq!(
            actions,
            vec![
                Action::Log {
                    message: "heading north".into()
                },
                Action::Move { dx: 0, dy: -1 },
            ]
        );
    }

    #[test]
    fn test_non_log_first_line_ignores_rest() {
        assert_eq!(parse(ACTOR, "MOVE N\nMOVE S"), vec![Action::Move { dx: 0, dy: -1 }]);
    }

    #[test]
    fn test_log_with_bad_second_line() {
        let actions = parse(ACTOR, "LOG stuck\ngibberish here");
        assert_eq!(
            actions,
            vec![Action::Log {
                message: "stuck".into()
            }]
        );
    }

    #[test]
    fn test_empty_and_whitespace_input() {
        assert!(parse(ACTOR, "").is_empty());
        assert!(parse(ACTOR, "\n  \n\t").is_empty());
    }

    proptest! {
        /// Parsing is total: any input terminates with 0-2 actions.
        #[test]
        fn parse_never_panics(text in ".*") {
            let actions = parse(ACTOR, &text);
            prop_assert!(actions.len() <= 2);
        }

        #[test]
        fn parse_multiline_never_panics(lines in proptest::collection::vec(".*", 0..6)) {
            let text = lines.join("\n");
            let actions = parse(ACTOR, &text);
            prop_assert!(actions.len() <= 2);
        }
    }
}
