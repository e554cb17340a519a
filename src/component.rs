//! Component conversion: the JSON property bag stored in definitions becomes
//! a bracketed SNBT component string, the same shape the `/give` command
//! accepts (`[custom_name={text:"x"},max_stack_size=1]`).

use serde_json::{Map, Value};

/// Convert a component bag to a bracketed SNBT component string.
///
/// Top-level string values use single quotes; strings nested inside maps and
/// lists use double quotes. A handful of component names get dedicated
/// treatment:
///
/// - `custom_name` / `item_name`: object values become SNBT maps.
/// - `lore`: a list of lines, where each line may be a text-component map, a
///   plain string, or an array of parts for multi-colored lines.
/// - `unbreakable`: always emitted as the empty map.
/// - `_raw_snbt`: the value is taken verbatim as the entire component string,
///   bracketed if the caller left the brackets off.
pub fn components_to_snbt(components: &Map<String, Value>) -> String {
    if components.is_empty() {
        return String::new();
    }

    if let Some(raw) = components.get("_raw_snbt").and_then(Value::as_str) {
        let raw = raw.trim();
        if raw.starts_with('[') {
            return raw.to_string();
        }
        return format!("[{}]", raw);
    }

    let mut out = String::from("[");
    for (i, (key, value)) in components.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push('=');
        match value {
            Value::String(s) => {
                out.push('\'');
                out.push_str(&escape(s));
                out.push('\'');
            }
            Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
            Value::Number(n) => out.push_str(&n.to_string()),
            Value::Object(obj) => {
                if key == "unbreakable" {
                    out.push_str("{}");
                } else {
                    out.push_str(&object_to_snbt(obj));
                }
            }
            Value::Array(arr) => {
                if key == "lore" {
                    out.push_str(&lore_to_snbt(arr));
                } else {
                    out.push_str(&array_to_snbt(arr));
                }
            }
            Value::Null => out.push_str("{}"),
        }
    }
    out.push(']');
    out
}

fn lore_to_snbt(lines: &[Value]) -> String {
    let mut out = String::from("[");
    for (i, line) in lines.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        match line {
            // Multi-colored line: an array of parts rendered as one line.
            Value::Array(parts) => {
                out.push('[');
                for (j, part) in parts.iter().enumerate() {
                    if j > 0 {
                        out.push(',');
                    }
                    match part {
                        Value::Object(obj) => out.push_str(&object_to_snbt(obj)),
                        Value::String(s) => {
                            out.push_str("{text:\"");
                            out.push_str(&escape(s));
                            out.push_str("\"}");
                        }
                        _ => {}
                    }
                }
                out.push(']');
            }
            Value::Object(obj) => out.push_str(&object_to_snbt(obj)),
            Value::String(s) => {
                out.push_str("'\"");
                out.push_str(&escape(s));
                out.push_str("\"'");
            }
            _ => {}
        }
    }
    out.push(']');
    out
}

fn object_to_snbt(obj: &Map<String, Value>) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in obj.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(key);
        out.push(':');
        out.push_str(&nested_value_to_snbt(value));
    }
    out.push('}');
    out
}

fn array_to_snbt(arr: &[Value]) -> String {
    let mut out = String::from("[");
    for (i, value) in arr.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&nested_value_to_snbt(value));
    }
    out.push(']');
    out
}

fn nested_value_to_snbt(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", escape(s)),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Object(obj) => object_to_snbt(obj),
        Value::Array(arr) => array_to_snbt(arr),
        Value::Null => "{}".to_string(),
    }
}

fn escape(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('"', "\\\"")
}

/// Seam for parsing a bracketed component string back into name/value pairs.
///
/// The host engine owns the real component grammar; this crate only needs to
/// split the string into top-level entries so stacks can carry them, so the
/// default implementation is a small bracket-aware splitter rather than a
/// full SNBT parser.
pub trait ComponentParser {
    fn parse(&self, raw: &str) -> Result<Vec<(String, String)>, String>;
}

/// Default parser: strips the outer brackets and splits on top-level commas,
/// respecting nesting depth and quoted regions.
#[derive(Debug, Default, Clone, Copy)]
pub struct BracketParser;

impl ComponentParser for BracketParser {
    fn parse(&self, raw: &str) -> Result<Vec<(String, String)>, String> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        let inner = raw
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| format!("component string missing brackets: {}", raw))?;

        let mut pairs = Vec::new();
        for entry in split_top_level(inner)? {
            let entry = entry.trim();
            if entry.is_empty() {
                continue;
            }
            let (name, value) = entry
                .split_once('=')
                .ok_or_else(|| format!("component entry missing '=': {}", entry))?;
            pairs.push((name.trim().to_string(), value.trim().to_string()));
        }
        Ok(pairs)
    }
}

fn split_top_level(s: &str) -> Result<Vec<&str>, String> {
    let mut parts = Vec::new();
    let mut depth = 0u32;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    let mut start = 0;

    for (i, c) in s.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match (quote, c) {
            (Some(_), '\\') => escaped = true,
            (Some(q), _) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '\'') | (None, '"') => quote = Some(c),
            (None, '[') | (None, '{') => depth += 1,
            (None, ']') | (None, '}') => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| format!("unbalanced brackets in: {}", s))?;
            }
            (None, ',') if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    if depth != 0 || quote.is_some() {
        return Err(format!("unterminated component string: {}", s));
    }
    parts.push(&s[start..]);
    Ok(parts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn bag(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_primitives_and_quoting() {
        let snbt = components_to_snbt(&bag(json!({
            "rarity": "epic",
            "max_stack_size": 1,
            "enchantment_glint_override": true
        })));
        assert_eq!(
            snbt,
            "[rarity='epic',max_stack_size=1,enchantment_glint_override=true]"
        );
    }

    #[test]
    fn test_custom_name_becomes_snbt_map() {
        let snbt = components_to_snbt(&bag(json!({
            "custom_name": {"text": "Ruby Sword", "color": "red"}
        })));
        assert_eq!(snbt, "[custom_name={text:\"Ruby Sword\",color:\"red\"}]");
    }

    #[test]
    fn test_unbreakable_is_empty_map() {
        let snbt = components_to_snbt(&bag(json!({"unbreakable": {"anything": 1}})));
        assert_eq!(snbt, "[unbreakable={}]");
    }

    #[test]
    fn test_lore_plain_string_line() {
        let snbt = components_to_snbt(&bag(json!({"lore": ["a plain line"]})));
        assert_eq!(snbt, "[lore=['\"a plain line\"']]");
    }

    #[test]
    fn test_lore_multi_colored_line() {
        let snbt = components_to_snbt(&bag(json!({
            "lore": [[{"text": "Hot", "color": "red"}, "and cold"]]
        })));
        assert_eq!(
            snbt,
            "[lore=[[{text:\"Hot\",color:\"red\"},{text:\"and cold\"}]]]"
        );
    }

    #[test]
    fn test_raw_snbt_passthrough() {
        let snbt = components_to_snbt(&bag(json!({"_raw_snbt": "custom_name='x'"})));
        assert_eq!(snbt, "[custom_name='x']");
        let snbt = components_to_snbt(&bag(json!({"_raw_snbt": "[damage=3]"})));
        assert_eq!(snbt, "[damage=3]");
    }

    #[test]
    fn test_escaping() {
        let snbt = components_to_snbt(&bag(json!({"note": "it's \"quoted\""})));
        assert_eq!(snbt, "[note='it\\'s \\\"quoted\\\"']");
    }

    #[test]
    fn test_bracket_parser_splits_top_level_only() {
        let pairs = BracketParser
            .parse("[custom_name={text:\"a,b\",color:\"red\"},max_stack_size=1,lore=[\"x\",\"y\"]]")
            .unwrap();
        assert_eq!(
            pairs,
            vec![
                (
                    "custom_name".to_string(),
                    "{text:\"a,b\",color:\"red\"}".to_string()
                ),
                ("max_stack_size".to_string(), "1".to_string()),
                ("lore".to_string(), "[\"x\",\"y\"]".to_string()),
            ]
        );
    }

    #[test]
    fn test_bracket_parser_rejects_unbalanced() {
        assert!(BracketParser.parse("[a={]").is_err());
        assert!(BracketParser.parse("no_brackets=1").is_err());
    }

    #[test]
    fn test_roundtrip_through_parser() {
        let snbt = components_to_snbt(&bag(json!({
            "custom_name": {"text": "Gold"},
            "rarity": "rare"
        })));
        let pairs = BracketParser.parse(&snbt).unwrap();
        assert_eq!(pairs[0].0, "custom_name");
        assert_eq!(pairs[1], ("rarity".to_string(), "'rare'".to_string()));
    }
}
