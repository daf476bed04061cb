//! Quoted string literal encoder shared by every renderer.
//!
//! Output is a JSON string literal. Graphic characters pass through, `"`
//! and `\` are backslash-escaped, `\b \f \n \r \t` use their short forms,
//! every other byte below 0x20 plus U+2028/U+2029 become `\u00XX`/`\u202X`,
//! and each byte of an invalid UTF-8 sequence becomes `\ufffd`.

const HEX: &[u8; 16] = b"0123456789abcdef";

/// Appends `src` to `out` as a double-quoted literal.
pub fn write_quoted(out: &mut Vec<u8>, src: &[u8]) {
    out.push(b'"');
    write_escaped(out, src);
    out.push(b'"');
}

/// Appends the escaped body of `src` to `out`, without surrounding quotes.
pub fn write_escaped(out: &mut Vec<u8>, src: &[u8]) {
    for chunk in src.utf8_chunks() {
        escape_str(out, chunk.valid());
        for _ in chunk.invalid() {
            out.extend_from_slice(b"\\ufffd");
        }
    }
}

/// Returns `src` as a quoted literal.
///
/// ```rust
/// use strata_log::escape::quote;
///
/// assert_eq!(quote("say \"hi\"\n"), r#""say \"hi\"\n""#);
/// ```
#[must_use]
pub fn quote(src: &str) -> String {
    let mut out = Vec::with_capacity(src.len() + 2);
    write_quoted(&mut out, src.as_bytes());
    // Escaping only ever emits ASCII or copies whole valid UTF-8 runs.
    String::from_utf8(out).unwrap_or_default()
}

fn escape_str(out: &mut Vec<u8>, s: &str) {
    let bytes = s.as_bytes();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        if b < 0x80 {
            let short: &[u8] = match b {
                b'"' => b"\\\"",
                b'\\' => b"\\\\",
                0x08 => b"\\b",
                0x0c => b"\\f",
                b'\n' => b"\\n",
                b'\r' => b"\\r",
                b'\t' => b"\\t",
                0x00..=0x1f => b"",
                _ => {
                    i += 1;
                    continue;
                }
            };

            out.extend_from_slice(&bytes[start..i]);
            if short.is_empty() {
                out.extend_from_slice(b"\\u00");
                out.push(HEX[usize::from(b >> 4)]);
                out.push(HEX[usize::from(b & 0xf)]);
            } else {
                out.extend_from_slice(short);
            }
            i += 1;
            start = i;
            continue;
        }

        // U+2028 LINE SEPARATOR and U+2029 PARAGRAPH SEPARATOR are E2 80 A8/A9.
        if b == 0xe2
            && i + 2 < bytes.len()
            && bytes[i + 1] == 0x80
            && (bytes[i + 2] == 0xa8 || bytes[i + 2] == 0xa9)
        {
            out.extend_from_slice(&bytes[start..i]);
            out.extend_from_slice(b"\\u202");
            out.push(HEX[usize::from(bytes[i + 2] & 0xf)]);
            i += 3;
            start = i;
            continue;
        }

        i += 1;
    }

    out.extend_from_slice(&bytes[start..]);
}
