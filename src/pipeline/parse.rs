//! Tolerant coercion of a model reply into the review schema.
//!
//! Models are asked for a JSON object but routinely wrap it in markdown
//! fences, prepend chatter, capitalise keys, or return a bare checklist
//! array. This stage maps all of those onto [`ParsedReply`]; anything it
//! cannot map is a [`ReplyParseError`], which the caller turns into the
//! degraded review.

use crate::error::ReplyParseError;
use crate::output::{ReviewItem, ReviewStatus};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

/// The review fields recovered from a reply, before scoring.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedReply {
    pub checklist: Vec<ReviewItem>,
    pub suggestions: Vec<String>,
    pub rewritten_content: Option<String>,
}

const CHECKLIST_KEYS: &[&str] = &["checklist", "items", "review", "results"];
const SUGGESTION_KEYS: &[&str] = &["suggestions", "recommendations"];
const REWRITE_KEYS: &[&str] = &["rewritten_content", "rewrittencontent", "rewritten"];

const SECTION_KEYS: &[&str] = &["section", "area", "category"];
const ITEM_KEYS: &[&str] = &["item", "checklist item", "checklist_item", "criterion", "name"];
const STATUS_KEYS: &[&str] = &["status", "result", "verdict"];
const COMMENT_KEYS: &[&str] = &["comment", "comments", "explanation", "reason", "notes"];

/// Parse a raw model reply.
pub fn parse_reply(raw: &str) -> Result<ParsedReply, ReplyParseError> {
    let body = strip_fences(raw);
    let value = parse_json_value(&body)?;

    match value {
        Value::Object(map) => from_object(&map),
        Value::Array(entries) => Ok(ParsedReply {
            checklist: checklist_from_array(&entries),
            ..Default::default()
        }),
        other => Err(ReplyParseError::UnexpectedShape(format!(
            "expected an object, got {}",
            kind_of(&other)
        ))),
    }
}

// ── Locating the JSON ────────────────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^```[A-Za-z]*[ \t]*\n(.*?)\n?```\s*$").expect("static regex")
});

fn strip_fences(input: &str) -> String {
    let trimmed = input.trim();
    match RE_OUTER_FENCES.captures(trimmed) {
        Some(caps) => caps[1].trim().to_string(),
        None => trimmed.to_string(),
    }
}

/// Whole body first, then the first embedded object or checklist array.
///
/// Each `{` or `[` is tried in order and exactly one value is decoded from
/// it, so trailing prose (even prose containing braces) is ignored.
fn parse_json_value(body: &str) -> Result<Value, ReplyParseError> {
    if let Ok(value) = serde_json::from_str::<Value>(body) {
        return Ok(value);
    }

    let mut first_error = None;
    for (start, _) in body.match_indices(['{', '[']) {
        let mut values = serde_json::Deserializer::from_str(&body[start..]).into_iter::<Value>();
        match values.next() {
            Some(Ok(value)) if is_review_shaped(&value) => {
                debug!("Reply is not bare JSON; decoded embedded value at byte {}", start);
                return Ok(value);
            }
            Some(Err(e)) if first_error.is_none() => first_error = Some(e),
            _ => {}
        }
    }
    match first_error {
        Some(e) => Err(ReplyParseError::InvalidJson(e)),
        None => Err(ReplyParseError::NoJsonObject),
    }
}

/// An object, or an array holding at least one object.
fn is_review_shaped(value: &Value) -> bool {
    match value {
        Value::Object(_) => true,
        Value::Array(entries) => entries.iter().any(Value::is_object),
        _ => false,
    }
}

// ── Mapping onto the schema ──────────────────────────────────────────────

fn from_object(map: &Map<String, Value>) -> Result<ParsedReply, ReplyParseError> {
    let checklist = match lookup(map, CHECKLIST_KEYS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => checklist_from_array(entries),
        Some(other) => {
            return Err(ReplyParseError::UnexpectedShape(format!(
                "checklist is {}, expected an array",
                kind_of(other)
            )))
        }
    };

    let suggestions = match lookup(map, SUGGESTION_KEYS) {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(entries)) => entries
            .iter()
            .map(value_text)
            .filter(|s| !s.trim().is_empty())
            .collect(),
        Some(single) => vec![value_text(single)],
    };

    let rewritten_content = match lookup(map, REWRITE_KEYS) {
        None | Some(Value::Null) => None,
        Some(v) => Some(value_text(v)),
    };

    Ok(ParsedReply {
        checklist,
        suggestions,
        rewritten_content,
    })
}

fn checklist_from_array(entries: &[Value]) -> Vec<ReviewItem> {
    entries
        .iter()
        .filter_map(|entry| match entry {
            Value::Object(fields) => Some(review_item(fields)),
            other => {
                debug!("Skipping non-object checklist entry ({})", kind_of(other));
                None
            }
        })
        .collect()
}

fn review_item(fields: &Map<String, Value>) -> ReviewItem {
    let text = |keys: &[&str]| lookup(fields, keys).map(value_text).unwrap_or_default();
    ReviewItem {
        section: text(SECTION_KEYS),
        item: text(ITEM_KEYS),
        status: ReviewStatus::classify(&text(STATUS_KEYS)),
        comment: text(COMMENT_KEYS),
    }
}

/// Case-insensitive key lookup; the first alias present wins.
fn lookup<'a>(map: &'a Map<String, Value>, aliases: &[&str]) -> Option<&'a Value> {
    aliases.iter().find_map(|alias| {
        map.get(*alias).or_else(|| {
            map.iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(alias))
                .map(|(_, v)| v)
        })
    })
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
