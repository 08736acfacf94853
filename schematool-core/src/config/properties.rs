//! Java-properties text format.
//!
//! Parses the `key=value` format read by `java.util.Properties.load`:
//! comment lines, `=`/`:`/whitespace separators, backslash line
//! continuations and escape sequences including `\uXXXX`.

use std::collections::BTreeMap;

/// Parses properties text into a flat key/value map.
///
/// Later duplicates override earlier ones. Malformed `\u` escapes are kept
/// literally rather than rejected; an unpaired surrogate becomes U+FFFD.
///
/// # Example
/// ```rust
/// use schematool_core::config::properties::parse_properties;
///
/// let props = parse_properties("# comment\npackage.name = com.example.model\n");
/// assert_eq!(props["package.name"], "com.example.model");
/// ```
pub fn parse_properties(input: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();

    for line in logical_lines(input) {
        let (key, value) = split_key_value(&line);
        entries.insert(unescape(key), unescape(value));
    }

    entries
}

/// Decodes raw file bytes the way the format expects.
///
/// UTF-8 is tried first; anything else is read as ISO-8859-1, which maps
/// every byte to the code point of the same value.
pub fn decode_properties(bytes: &[u8]) -> String {
    match std::str::from_utf8(bytes) {
        Ok(text) => text.to_string(),
        Err(_) => bytes.iter().map(|&b| char::from(b)).collect(),
    }
}

/// Joins continued natural lines and drops comments and blank lines.
fn logical_lines(input: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current: Option<String> = None;

    for raw in natural_lines(input) {
        let trimmed = raw.trim_start_matches([' ', '\t', '\u{c}']);

        let line = match current.take() {
            // Leading whitespace of a continuation line is not part of the value
            Some(mut pending) => {
                pending.push_str(trimmed);
                pending
            }
            None => {
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                trimmed.to_string()
            }
        };

        if ends_with_continuation(&line) {
            let mut pending = line;
            pending.pop();
            current = Some(pending);
        } else {
            lines.push(line);
        }
    }

    // A continuation on the last line simply ends the value
    if let Some(pending) = current
        && !pending.is_empty()
    {
        lines.push(pending);
    }

    lines
}

/// Lines ended by `\n`, `\r\n` or a lone `\r`.
fn natural_lines(input: &str) -> impl Iterator<Item = &str> {
    let mut rest = input;
    std::iter::from_fn(move || {
        if rest.is_empty() {
            return None;
        }
        let Some(end) = rest.find(['\n', '\r']) else {
            return Some(std::mem::take(&mut rest));
        };
        let (line, tail) = rest.split_at(end);
        rest = tail
            .strip_prefix("\r\n")
            .or_else(|| tail.strip_prefix(['\n', '\r']))
            .unwrap_or(tail);
        Some(line)
    })
}

/// An odd number of trailing backslashes escapes the line terminator.
fn ends_with_continuation(line: &str) -> bool {
    let trailing = line.chars().rev().take_while(|&c| c == '\\').count();
    trailing % 2 == 1
}

/// Splits a logical line at the first unescaped separator.
fn split_key_value(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();

    for (index, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' | ' ' | '\t' | '\u{c}' => {
                key_end = index;
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let mut rest = line[key_end..].trim_start_matches([' ', '\t', '\u{c}']);
    if let Some(stripped) = rest.strip_prefix(['=', ':']) {
        rest = stripped.trim_start_matches([' ', '\t', '\u{c}']);
    }

    (key, rest)
}

/// Resolves backslash escapes.
fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => match read_code_unit(&mut chars) {
                Some(unit) => {
                    let mut units = vec![unit];
                    // a high surrogate pairs with an immediately following \uXXXX low half
                    if (0xD800..0xDC00).contains(&unit) {
                        let mut lookahead = chars.clone();
                        if lookahead.next() == Some('\\')
                            && lookahead.next() == Some('u')
                            && let Some(low) = read_code_unit(&mut lookahead)
                            && (0xDC00..0xE000).contains(&low)
                        {
                            units.push(low);
                            chars = lookahead;
                        }
                    }
                    out.extend(
                        char::decode_utf16(units)
                            .map(|decoded| decoded.unwrap_or(char::REPLACEMENT_CHARACTER)),
                    );
                }
                None => out.push('u'),
            },
            Some(other) => out.push(other),
            None => {}
        }
    }

    out
}

/// Reads the four hex digits of a `\u` escape, consuming them on success.
fn read_code_unit(chars: &mut std::str::Chars<'_>) -> Option<u16> {
    let hex = chars.as_str().get(..4)?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let unit = u16::from_str_radix(hex, 16).ok()?;
    chars.by_ref().take(4).for_each(drop);
    Some(unit)
}
