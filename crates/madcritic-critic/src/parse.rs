//! Tolerant recovery of the critic's JSON output.
//!
//! The ladder, tried in order until one rung yields valid JSON:
//! 1. the contents of a fenced ```` ```json ```` block
//! 2. the text from the first `{` to the last `}`
//! 3. the text from the first `[` to the last `]`
//!
//! Each candidate is parsed as-is and then once more after
//! [`sanitize_json`] strips `//` comments and trailing commas. When every
//! rung fails the caller receives [`Critique::fallback`].

use serde_json::Value;
use tracing::debug;

use crate::critique::{Critique, ParseStatus, PartialCritique};

/// Locate the first-to-last brace-delimited block in `text`.
pub fn extract_json_block(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn bracket_block(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```json")?;
    let body_start = open + "```json".len();
    let body_len = text[body_start..].find("```")?;
    extract_json_block(&text[body_start..body_start + body_len])
}

/// Remove `//` line comments and trailing commas outside of string literals.
pub fn sanitize_json(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            i += 1;
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            '/' if chars.get(i + 1) == Some(&'/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            ',' => {
                let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
                if !matches!(next, Some('}') | Some(']')) {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
        i += 1;
    }

    out
}

fn parse_candidate(candidate: &str) -> Option<Value> {
    serde_json::from_str(candidate)
        .or_else(|_| serde_json::from_str(&sanitize_json(candidate)))
        .ok()
}

/// Walk the recovery ladder and return the first block that parses.
pub fn recover_json(text: &str) -> Option<Value> {
    let rungs = [fenced_block(text), extract_json_block(text), bracket_block(text)];
    for (rung, candidate) in rungs.iter().enumerate() {
        if let Some(candidate) = candidate {
            if let Some(value) = parse_candidate(candidate) {
                debug!(rung, "Recovered critic JSON");
                return Some(value);
            }
        }
    }
    debug!(output_len = text.len(), "No parseable JSON in critic output");
    None
}

fn critique_from_value(value: Value) -> Critique {
    match value {
        Value::Object(map) => PartialCritique::from_map(&map).into_critique(),
        _ => Critique::fallback(),
    }
}

/// Parse a single-solution critic response. Never fails.
pub fn parse_local(text: &str) -> Critique {
    recover_json(text)
        .map(critique_from_value)
        .unwrap_or_else(Critique::fallback)
}

/// Parse a joint critic response covering `agent_count` agents.
///
/// Accepts `{"agents": [...]}` or a bare array. Entries carry their agent
/// index in `id`; entries without one take their array position. Unknown or
/// out-of-range ids are ignored and agents with no entry get the fallback.
pub fn parse_global(text: &str, agent_count: usize) -> Vec<Critique> {
    let mut critiques = vec![Critique::fallback(); agent_count];

    let entries = match recover_json(text) {
        Some(Value::Object(mut map)) => match map.remove("agents") {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        },
        Some(Value::Array(items)) => items,
        _ => Vec::new(),
    };

    for (position, entry) in entries.into_iter().enumerate() {
        let id = match entry.get("id") {
            Some(raw) => match agent_id(raw) {
                Some(id) => id,
                None => continue,
            },
            None => position,
        };
        if id >= agent_count {
            debug!(id, agent_count, "Ignoring critic entry for unknown agent");
            continue;
        }
        // First entry for an agent wins
        if critiques[id].parse_status == ParseStatus::Fallback {
            critiques[id] = critique_from_value(entry);
        }
    }

    critiques
}

fn agent_id(raw: &Value) -> Option<usize> {
    match raw {
        Value::Number(n) => n.as_u64().map(|n| n as usize),
        Value::String(s) => s
            .trim()
            .trim_start_matches(|c: char| !c.is_ascii_digit())
            .parse()
            .ok(),
        _ => None,
    }
}
