//! Response header helpers.
//!
//! `HeaderMap` already gives case-insensitive lookup and multi-value storage;
//! these helpers add the list semantics of RFC 9110 §5.3, where repeated
//! field lines are equivalent to one comma-separated line.

use http::header::{HeaderMap, HeaderName, HeaderValue};

/// All values of `name` joined with `", "`, or `None` if the header is absent.
///
/// Values that are not valid UTF-8 are skipped.
pub fn joined_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<&str> = headers
        .get_all(name)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .collect();

    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Append `entry` to the list-valued header `name`.
///
/// Existing values (possibly spread over several field lines) are folded into
/// a single line with `entry` appended last. Returns `false` and leaves the
/// map untouched if the result would not be a valid header value.
pub fn append_list_value(headers: &mut HeaderMap, name: HeaderName, entry: &str) -> bool {
    let mut combined: Vec<u8> = Vec::new();
    for value in headers.get_all(&name).iter() {
        let bytes = value.as_bytes();
        if bytes.is_empty() {
            continue;
        }
        if !combined.is_empty() {
            combined.extend_from_slice(b", ");
        }
        combined.extend_from_slice(bytes);
    }
    if !combined.is_empty() {
        combined.extend_from_slice(b", ");
    }
    combined.extend_from_slice(entry.as_bytes());

    match HeaderValue::from_bytes(&combined) {
        Ok(value) => {
            headers.insert(name, value);
            true
        }
        Err(_) => false,
    }
}

/// Insert `value` only if `name` is not already present.
///
/// Returns `true` if the value was inserted.
pub fn insert_if_absent(headers: &mut HeaderMap, name: HeaderName, value: HeaderValue) -> bool {
    if headers.contains_key(&name) {
        return false;
    }
    headers.insert(name, value);
    true
}
