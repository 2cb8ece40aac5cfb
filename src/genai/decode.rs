//! Two-stage decode for loosely structured JSON returned by the generator.
//!
//! Stage 1 is a strict `serde_json` parse of the fence-stripped text.
//! Stage 2 (repair) only runs when stage 1 fails: it cuts the outermost
//! bracket pair out of the surrounding prose and parses that span.
//! Nothing here touches the network, so every case is unit-testable.

use once_cell::sync::OnceCell;
use regex::Regex;
use serde_json::{Map, Value};

pub type JsonObject = Map<String, Value>;

/// Remove markdown code-fence markers (```json / ```) and trim.
pub fn strip_code_fences(raw: &str) -> String {
    static RE_FENCE: OnceCell<Regex> = OnceCell::new();
    let re = RE_FENCE.get_or_init(|| Regex::new(r"(?i)```(?:json)?").unwrap());
    re.replace_all(raw, "").trim().to_string()
}

/// Span from the first `[` to the last `]`, inclusive.
pub fn extract_array_literal(text: &str) -> Option<&str> {
    outermost(text, '[', ']')
}

/// Span from the first `{` to the last `}`, inclusive.
pub fn extract_object_literal(text: &str) -> Option<&str> {
    outermost(text, '{', '}')
}

fn outermost(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    (end > start).then(|| &text[start..=end])
}

/// Decode text that should hold a JSON array (or an object wrapping one).
/// Returns whatever value parsed; shape checks happen in [`object_items`].
pub fn decode_array(raw: &str) -> Option<Value> {
    let cleaned = strip_code_fences(raw);
    if let Ok(v) = serde_json::from_str::<Value>(&cleaned) {
        return Some(v);
    }
    tracing::debug!(target: "genai", len = cleaned.len(), "strict parse failed, trying array repair");
    let span = extract_array_literal(&cleaned)?;
    serde_json::from_str::<Value>(span).ok()
}

/// Decode text that should hold a single JSON object.
pub fn decode_object(raw: &str) -> Option<JsonObject> {
    let cleaned = strip_code_fences(raw);
    if let Ok(Value::Object(m)) = serde_json::from_str::<Value>(&cleaned) {
        return Some(m);
    }
    tracing::debug!(target: "genai", len = cleaned.len(), "strict parse failed, trying object repair");
    let span = extract_object_literal(&cleaned)?;
    match serde_json::from_str::<Value>(span) {
        Ok(Value::Object(m)) => Some(m),
        _ => None,
    }
}

/// Shape check for item lists.
///
/// * array → its object elements paired with their position in the array
///   (other elements are skipped but still occupy a position)
/// * object with exactly one array-valued property → that array, same rule
/// * anything else → `None`
pub fn object_items(value: Value) -> Option<Vec<(usize, JsonObject)>> {
    match value {
        Value::Array(items) => Some(
            items
                .into_iter()
                .enumerate()
                .filter_map(|(i, v)| match v {
                    Value::Object(m) => Some((i, m)),
                    _ => None,
                })
                .collect(),
        ),
        Value::Object(map) => {
            let mut arrays = map.into_iter().filter(|(_, v)| v.is_array());
            match (arrays.next(), arrays.next()) {
                (Some((_, inner)), None) => object_items(inner),
                _ => None,
            }
        }
        _ => None,
    }
}

/// Non-empty trimmed string field.
pub fn text_field(obj: &JsonObject, key: &str) -> Option<String> {
    obj.get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// String list field; a bare string counts as a one-element list.
/// Empty and non-string entries are dropped.
pub fn text_list(obj: &JsonObject, key: &str) -> Vec<String> {
    match obj.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// Integer field; accepts floats (rounded) and numeric strings.
pub fn int_field(obj: &JsonObject, key: &str) -> Option<i64> {
    match obj.get(key)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

/// Nested object field.
pub fn object_field<'a>(obj: &'a JsonObject, key: &str) -> Option<&'a JsonObject> {
    obj.get(key).and_then(Value::as_object)
}
