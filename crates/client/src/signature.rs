//! Structural de-duplication key for in-flight requests.
//!
//! Params and body are rendered as canonical JSON (object keys sorted at
//! every depth), so payloads that differ only in key insertion order map to
//! the same signature.

use serde_json::Value;

use crate::transport::Method;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestSignature {
    method: Method,
    url: String,
    params: String,
    body: String,
}

impl RequestSignature {
    pub fn new(method: Method, url: &str, params: Option<&Value>, body: Option<&Value>) -> Self {
        Self {
            method,
            url: normalize_url(url),
            params: params.map(canonical_json).unwrap_or_default(),
            body: body.map(canonical_json).unwrap_or_default(),
        }
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl core::fmt::Display for RequestSignature {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} {}", self.method, self.url)
    }
}

/// Trailing slashes are insignificant; the root path is kept as `/`.
fn normalize_url(url: &str) -> String {
    let trimmed = url.trim();
    let without = trimmed.trim_end_matches('/');
    if without.is_empty() && trimmed.starts_with('/') {
        "/".to_string()
    } else {
        without.to_string()
    }
}

pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key.as_str()], out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Flatten a params object into query pairs. Strings are used verbatim,
/// nulls are skipped, everything else is rendered as JSON.
pub fn query_pairs(params: Option<&Value>) -> Vec<(String, String)> {
    let Some(Value::Object(map)) = params else {
        return Vec::new();
    };
    let mut pairs: Vec<(String, String)> = map
        .iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| {
            let rendered = match v {
                Value::String(s) => s.clone(),
                other => canonical_json(other),
            };
            (k.clone(), rendered)
        })
        .collect();
    pairs.sort();
    pairs
}
