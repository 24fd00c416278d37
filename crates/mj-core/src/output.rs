use std::sync::OnceLock;

use regex::{Captures, Regex};

use crate::error::{MathJaxError, MathJaxResult};

fn mjx_error_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r#"data-mjx-error="([^"]*)""#).expect("mjx error regex"))
}

fn merror_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"(?s)<merror[^>]*>(.*?)</merror>").expect("merror regex"))
}

fn tag_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| Regex::new(r"<[^>]*>").expect("tag regex"))
}

fn entity_regex() -> &'static Regex {
    static REGEX: OnceLock<Regex> = OnceLock::new();
    REGEX.get_or_init(|| {
        Regex::new(r"&(?:(amp|lt|gt|quot|apos)|#([0-9]+)|#[xX]([0-9a-fA-F]+));")
            .expect("entity regex")
    })
}

/// Decodes the character references the library writes into attribute values.
fn unescape_attribute(value: &str) -> String {
    entity_regex()
        .replace_all(value, |captures: &Captures| {
            let decoded = match (captures.get(1), captures.get(2), captures.get(3)) {
                (Some(name), _, _) => match name.as_str() {
                    "amp" => Some('&'),
                    "lt" => Some('<'),
                    "gt" => Some('>'),
                    "quot" => Some('"'),
                    _ => Some('\''),
                },
                (_, Some(decimal), _) => decimal.as_str().parse().ok().and_then(char::from_u32),
                (_, _, Some(hex)) => u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32),
                _ => None,
            };
            decoded.map_or_else(|| captures[0].to_string(), String::from)
        })
        .into_owned()
}

fn reported_error(raw: &str) -> Option<MathJaxError> {
    let captures = mjx_error_regex().captures(raw)?;
    Some(MathJaxError::ConversionFailed(unescape_attribute(&captures[1])))
}

fn invalid(expected: &str, raw: &str) -> MathJaxError {
    let preview = raw.chars().take(40).collect::<String>();
    MathJaxError::ConversionInvalidFormat(format!("expected {}, got \"{}\"", expected, preview))
}

/// CommonHTML output: a `<mjx-container>` element.
pub fn parse_chtml(raw: &str) -> MathJaxResult<String> {
    if let Some(error) = reported_error(raw) {
        return Err(error);
    }
    let trimmed = raw.trim();
    if !trimmed.starts_with("<mjx-container") {
        return Err(invalid("<mjx-container> element", trimmed));
    }
    Ok(trimmed.to_string())
}

/// SVG output, either bare or wrapped in its `<mjx-container>`.
pub fn parse_svg(raw: &str) -> MathJaxResult<String> {
    if let Some(error) = reported_error(raw) {
        return Err(error);
    }
    let trimmed = raw.trim();
    let wrapped = trimmed.starts_with("<mjx-container") || trimmed.starts_with("<svg");
    if !wrapped || !trimmed.contains("<svg") {
        return Err(invalid("<svg> element", trimmed));
    }
    Ok(trimmed.to_string())
}

pub fn parse_mathml(raw: &str) -> MathJaxResult<String> {
    if let Some(error) = reported_error(raw) {
        return Err(error);
    }
    let trimmed = raw.trim();
    if !trimmed.starts_with("<math") {
        return Err(invalid("<math> element", trimmed));
    }
    if let Some(captures) = merror_regex().captures(trimmed) {
        let text = tag_regex().replace_all(&captures[1], "");
        return Err(MathJaxError::ConversionFailed(text.trim().to_string()));
    }
    Ok(trimmed.to_string())
}

pub fn passthrough(raw: &str) -> MathJaxResult<String> {
    Ok(raw.to_string())
}
