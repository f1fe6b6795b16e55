//! Plan step records and the structured plan-text parser
//!
//! The planner's LLM response is one step per line. Recognized verbs get a
//! `step_type` and typed parameters; everything else becomes a generic step
//! whose resolution is deferred to the reasoning loop.

use ahash::AHashMap;

use crate::core::types::{EntityId, GridPos};

/// A typed parameter value on a plan step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i64),
    Coords(i32, i32),
    Text(String),
}

impl ParamValue {
    pub fn as_coords(&self) -> Option<GridPos> {
        match self {
            ParamValue::Coords(x, y) => Some(GridPos::new(*x, *y)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// One element of an agent's plan
#[derive(Debug, Clone)]
pub struct ActionStep {
    /// Verb token, uppercased
    pub action: String,
    pub target: Option<EntityId>,
    pub parameters: AHashMap<String, ParamValue>,
    /// Structured type for recognized verbs ("move_to",
    /// "deal_with_obstacle", "generate_ability"); None for generic steps
    pub step_type: Option<String>,
    /// Incremented by the reasoning loop when the step's action fails to
    /// achieve its effect
    pub retries: u32,
}

impl ActionStep {
    pub fn generic(verb: &str, rest: &str) -> Self {
        let mut parameters = AHashMap::new();
        if !rest.is_empty() {
            parameters.insert("raw".to_string(), ParamValue::Text(rest.to_string()));
        }
        Self {
            action: verb.to_ascii_uppercase(),
            target: None,
            parameters,
            step_type: None,
            retries: 0,
        }
    }

    fn structured(verb: &str, step_type: &str) -> Self {
        Self {
            action: verb.to_ascii_uppercase(),
            target: None,
            parameters: AHashMap::new(),
            step_type: Some(step_type.to_string()),
            retries: 0,
        }
    }

    pub fn coords(&self) -> Option<GridPos> {
        self.parameters.get("coords").and_then(ParamValue::as_coords)
    }

    pub fn description(&self) -> Option<&str> {
        self.parameters
            .get("description")
            .and_then(ParamValue::as_text)
    }

    /// The raw remainder text for a generic step
    pub fn raw(&self) -> Option<&str> {
        self.parameters.get("raw").and_then(ParamValue::as_text)
    }
}

/// Parse plan text into step records. Total: unrecognizable structure
/// degrades to generic steps rather than failing.
pub fn parse_plan(text: &str) -> Vec<ActionStep> {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(parse_step_line)
        .collect()
}

fn parse_step_line(line: &str) -> ActionStep {
    // Some models prefix each step with a literal "ACTION " token.
    let line = line.strip_prefix("ACTION ").unwrap_or(line).trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    match verb.to_ascii_uppercase().as_str() {
        "DEAL_WITH_OBSTACLE" => match parse_coords(rest) {
            Some((x, y)) => {
                let mut step = ActionStep::structured(verb, "deal_with_obstacle");
                step.parameters
                    .insert("coords".into(), ParamValue::Coords(x, y));
                step
            }
            None => ActionStep::generic(verb, rest),
        },
        "MOVE_TO" => match parse_coords(rest) {
            Some((x, y)) => {
                let mut step = ActionStep::structured(verb, "move_to");
                step.parameters
                    .insert("coords".into(), ParamValue::Coords(x, y));
                step
            }
            None => ActionStep::generic(verb, rest),
        },
        "GENERATE_ABILITY" if !rest.is_empty() => {
            let mut step = ActionStep::structured(verb, "generate_ability");
            step.parameters
                .insert("description".into(), ParamValue::Text(unquote(rest)));
            step
        }
        _ => ActionStep::generic(verb, rest),
    }
}

/// `"x,y"`, with optional spaces and optional surrounding parentheses
fn parse_coords(rest: &str) -> Option<(i32, i32)> {
    let trimmed = rest
        .trim()
        .trim_start_matches('(')
        .trim_end_matches(')');
    let (x, y) = trimmed.split_once(',')?;
    Some((x.trim().parse().ok()?, y.trim().parse().ok()?))
}

fn unquote(text: &str) -> String {
    let trimmed = text.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}
