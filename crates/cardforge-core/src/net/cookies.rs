//! Cookie-string parsing for importer authentication.
//!
//! Users paste cookies in whatever shape their browser tooling exports:
//! a raw `Cookie:` header, a Netscape `cookies.txt`, or a JSON array
//! (EditThisCookie style). All three normalize to an ordered name → value
//! map.

use indexmap::IndexMap;

/// Parse cookies from any supported format.
///
/// Format detection: JSON when the input starts with `[`, Netscape when it
/// contains tabs or starts with `#`, header-string otherwise. Unparseable
/// input yields an empty map rather than an error - a bad cookie paste
/// surfaces later as a 401, which is a clearer signal to the user.
pub fn parse_cookies(input: &str) -> IndexMap<String, String> {
    let input = input.trim();
    if input.is_empty() {
        return IndexMap::new();
    }

    if input.starts_with('[') {
        return parse_json(input);
    }
    if input.contains('\t') || input.starts_with('#') {
        return parse_netscape(input);
    }
    parse_header(input)
}

fn parse_json(input: &str) -> IndexMap<String, String> {
    let Ok(entries) = serde_json::from_str::<Vec<serde_json::Value>>(input) else {
        return IndexMap::new();
    };

    let mut cookies = IndexMap::new();
    for entry in entries {
        let Some(obj) = entry.as_object() else {
            continue;
        };
        let name = obj.get("name").and_then(|v| v.as_str()).unwrap_or("");
        let value = obj.get("value").and_then(|v| v.as_str()).unwrap_or("");
        if !name.is_empty() {
            cookies.insert(name.to_string(), value.to_string());
        }
    }
    cookies
}

fn parse_netscape(input: &str) -> IndexMap<String, String> {
    let mut cookies = IndexMap::new();
    for line in input.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        // domain flag path secure expiration name value
        let parts: Vec<&str> = line.split('\t').collect();
        if parts.len() >= 7 {
            cookies.insert(parts[5].to_string(), parts[6].to_string());
        }
    }
    cookies
}

fn parse_header(input: &str) -> IndexMap<String, String> {
    let input = input
        .strip_prefix("Cookie:")
        .or_else(|| input.strip_prefix("cookie:"))
        .unwrap_or(input)
        .trim();

    let mut cookies = IndexMap::new();
    for pair in input.split(';') {
        let pair = pair.trim();
        // split on the first '=' only; values may contain '='
        if let Some((name, value)) = pair.split_once('=') {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), value.trim().to_string());
            }
        }
    }
    cookies
}

/// Render a cookie map back into `Cookie:` header value form.
pub fn cookie_header(cookies: &IndexMap<String, String>) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}
