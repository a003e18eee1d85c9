//! Normalization of loosely structured model output into stage records.
//!
//! Language models do not always honour the requested shape. These functions
//! accept the variants seen in practice, fill documented defaults for missing
//! fields and fail only when nothing usable remains.

use anyhow::{bail, Result};
use reelforge_workflow::{
    CameraInstruction, ScriptSection, StoryboardShot, TimelineCue, TimelineEntry, TimelineLayer,
};
use serde_json::{Map, Value};
use std::time::Duration;

const DEFAULT_SHOT_ID: &str = "shot";
const DEFAULT_SHOT_SECONDS: f64 = 30.0;

/// Text of a chat message `content`, which is either a plain string or a list
/// of typed parts such as `{"type": "text", "text": "..."}`.
pub fn message_text(content: &Value) -> Option<String> {
    let text = match content {
        Value::String(text) => text.clone(),
        Value::Array(parts) => parts
            .iter()
            .filter_map(|part| match part {
                Value::String(text) => Some(text.as_str()),
                Value::Object(obj) => obj.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(""),
        _ => return None,
    };
    (!text.trim().is_empty()).then_some(text)
}

/// Script sections from a chat completion payload.
///
/// Accepted shapes: `sections` as a list, as a map of sections, or as a JSON
/// string; the same nested under `script`; plain text (split on blank lines);
/// or a lone `script.summary`.
pub fn script_sections(payload: &Value) -> Result<Vec<ScriptSection>> {
    let nested = payload.get("script");
    let candidate = payload
        .get("sections")
        .filter(|v| !is_empty(v))
        .or_else(|| nested.and_then(|s| s.get("sections")))
        .or_else(|| nested.filter(|s| s.is_string()));

    let mut sections = match candidate {
        Some(value) => sections_from(value),
        None => Vec::new(),
    };

    if sections.is_empty() {
        if let Some(summary) = nested
            .and_then(|s| s.get("summary"))
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
        {
            sections.push(ScriptSection {
                section: "summary".to_string(),
                timeframe: String::new(),
                summary: summary.trim().to_string(),
                citations: Vec::new(),
            });
        }
    }

    if sections.is_empty() {
        bail!("Script generation returned no sections");
    }
    Ok(sections)
}

fn sections_from(value: &Value) -> Vec<ScriptSection> {
    match value {
        Value::Array(items) => items.iter().filter_map(section_from).collect(),
        Value::Object(map) => map.values().filter_map(section_from).collect(),
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(parsed @ (Value::Array(_) | Value::Object(_))) => sections_from(&parsed),
            _ => sections_from_text(text),
        },
        _ => Vec::new(),
    }
}

fn section_from(item: &Value) -> Option<ScriptSection> {
    let obj = item.as_object()?;
    let citations = match obj.get("citations") {
        Some(Value::String(citation)) => vec![citation.clone()],
        Some(Value::Array(list)) => list.iter().map(scalar_string).collect(),
        _ => Vec::new(),
    };
    Some(ScriptSection {
        section: text_field(obj, "section", "section"),
        timeframe: text_field(obj, "timeframe", ""),
        summary: text_field(obj, "summary", ""),
        citations,
    })
}

fn sections_from_text(text: &str) -> Vec<ScriptSection> {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .enumerate()
        .map(|(index, paragraph)| ScriptSection {
            section: format!("section_{}", index + 1),
            timeframe: String::new(),
            summary: paragraph.to_string(),
            citations: Vec::new(),
        })
        .collect()
}

/// Storyboard shots from the `shots` list.
pub fn storyboard(payload: &Value) -> Result<Vec<StoryboardShot>> {
    let shots: Vec<StoryboardShot> = objects(payload, "shots")
        .map(|item| StoryboardShot {
            shot_id: text_field(item, "shot_id", DEFAULT_SHOT_ID),
            start: seconds_field(item, "start_seconds", 0.0),
            duration: seconds_field(item, "duration_seconds", DEFAULT_SHOT_SECONDS),
            scene: text_field(item, "scene", ""),
            mood: text_field(item, "mood", "neutral"),
            subtitle: text_field(item, "subtitle", ""),
        })
        .collect();
    if shots.is_empty() {
        bail!("Storyboard generation returned no shots");
    }
    Ok(shots)
}

/// Camera instructions from the `plan` list.
pub fn camera_plan(payload: &Value) -> Result<Vec<CameraInstruction>> {
    let plan: Vec<CameraInstruction> = objects(payload, "plan")
        .map(|item| CameraInstruction {
            shot_id: text_field(item, "shot_id", DEFAULT_SHOT_ID),
            motion_type: text_field(item, "motion_type", "static"),
            params: map_field(item, "params"),
            transition: item
                .get("transition")
                .filter(|v| !v.is_null())
                .map(scalar_string),
        })
        .collect();
    if plan.is_empty() {
        bail!("Camera plan generation returned no instructions");
    }
    Ok(plan)
}

/// Timeline entries from the `entries` list.
pub fn timeline(payload: &Value) -> Result<Vec<TimelineEntry>> {
    let entries: Vec<TimelineEntry> = objects(payload, "entries")
        .map(|item| TimelineEntry {
            shot_id: text_field(item, "shot_id", DEFAULT_SHOT_ID),
            layers: objects_in(item, "layers")
                .map(|layer| TimelineLayer {
                    kind: text_field(layer, "type", "visual"),
                    reference: text_field(layer, "reference", ""),
                    start: seconds_field(layer, "start_seconds", 0.0),
                    duration: seconds_field(layer, "duration_seconds", 0.0),
                    metadata: map_field(layer, "metadata"),
                })
                .collect(),
            audio_cues: objects_in(item, "audio_cues")
                .map(|cue| TimelineCue {
                    cue_type: text_field(cue, "cue_type", "narration"),
                    reference: text_field(cue, "reference", ""),
                    start: seconds_field(cue, "start_seconds", 0.0),
                    duration: seconds_field(cue, "duration_seconds", 0.0),
                })
                .collect(),
        })
        .collect();
    if entries.is_empty() {
        bail!("Timeline generation returned no entries");
    }
    Ok(entries)
}

fn objects<'a>(payload: &'a Value, key: &str) -> impl Iterator<Item = &'a Map<String, Value>> {
    payload
        .get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn objects_in<'a>(
    obj: &'a Map<String, Value>,
    key: &str,
) -> impl Iterator<Item = &'a Map<String, Value>> {
    obj.get(key)
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn is_empty(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        _ => false,
    }
}

fn scalar_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn text_field(obj: &Map<String, Value>, key: &str, default: &str) -> String {
    match obj.get(key) {
        None | Some(Value::Null) => default.to_string(),
        Some(value) => scalar_string(value),
    }
}

fn map_field(obj: &Map<String, Value>, key: &str) -> Map<String, Value> {
    obj.get(key)
        .and_then(Value::as_object)
        .cloned()
        .unwrap_or_default()
}

/// A seconds value given as a number or numeric string. Missing, negative or
/// unparsable values fall back to `default`.
fn seconds_field(obj: &Map<String, Value>, key: &str, default: f64) -> Duration {
    let secs = match obj.get(key) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    };
    secs.and_then(|s| Duration::try_from_secs_f64(s).ok())
        .unwrap_or_else(|| Duration::from_secs_f64(default))
}
