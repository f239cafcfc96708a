//! Percent-encoding of uri components.
//!
//! Components are encoded with the character class allowed for them by RFC 3986. Any `%XX`
//! escape that is already valid is copied through untouched, so encoding an already encoded
//! component never double-encodes it.
//!
//! See <https://tools.ietf.org/html/rfc3986#section-2>

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_encode, utf8_percent_encode};

/// unreserved = ALPHA / DIGIT / "-" / "." / "_" / "~"
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// unreserved + sub-delims = "!" / "$" / "&" / "'" / "(" / ")" / "*" / "+" / "," / ";" / "="
const USER: &AsciiSet = &UNRESERVED
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

const PASSWORD: &AsciiSet = &USER.remove(b':');

const PATH: &AsciiSet = &USER.remove(b':').remove(b'@').remove(b'/');

const QUERY: &AsciiSet = &PATH.remove(b'?');

/// The component a string is encoded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Component {
    User,
    Password,
    Path,
    Query,
    Fragment,
}

impl Component {
    fn escape_set(self) -> &'static AsciiSet {
        match self {
            Component::User => USER,
            Component::Password => PASSWORD,
            Component::Path => PATH,
            Component::Query | Component::Fragment => QUERY,
        }
    }
}

#[inline]
pub(crate) fn is_escape(bytes: &[u8], at: usize) -> bool {
    bytes.get(at) == Some(&b'%')
        && bytes.get(at + 1).is_some_and(u8::is_ascii_hexdigit)
        && bytes.get(at + 2).is_some_and(u8::is_ascii_hexdigit)
}

/// Encodes every character of `input` that is not allowed in `component`, keeping valid
/// `%XX` escapes as they are. A `%` that does not start an escape becomes `%25`.
pub(crate) fn encode(input: &str, component: Component) -> String {
    let set = component.escape_set();
    let bytes = input.as_bytes();
    let mut encoded = String::with_capacity(input.len());

    let mut start = 0;
    let mut i = 0;
    while i < bytes.len() {
        if is_escape(bytes, i) {
            encoded.extend(utf8_percent_encode(&input[start..i], set));
            encoded.push_str(&input[i..i + 3]);
            i += 3;
            start = i;
        } else {
            i += 1;
        }
    }
    encoded.extend(utf8_percent_encode(&input[start..], set));
    encoded
}

/// Decodes the `%XX` escapes of `input` that [`encode`] restores for `component`.
///
/// Escapes of unreserved characters, of non-ASCII bytes and of characters the component
/// does not allow are decoded. Escapes of delimiters the component allows, and of `%`
/// itself, are kept, since decoding them would change the meaning of the component.
/// If the decoded bytes are not valid UTF-8 the input is returned unchanged.
pub(crate) fn decode(input: &str, component: Component) -> String {
    let set = component.escape_set();
    let bytes = input.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());

    let mut i = 0;
    while i < bytes.len() {
        match escaped_byte(bytes, i) {
            Some(byte) if decodes_to(byte, set) => {
                decoded.push(byte);
                i += 3;
            }
            _ => {
                decoded.push(bytes[i]);
                i += 1;
            }
        }
    }

    String::from_utf8(decoded).unwrap_or_else(|_| input.to_owned())
}

fn escaped_byte(bytes: &[u8], at: usize) -> Option<u8> {
    if !is_escape(bytes, at) {
        return None;
    }
    let hex = std::str::from_utf8(&bytes[at + 1..at + 3]).ok()?;
    u8::from_str_radix(hex, 16).ok()
}

fn decodes_to(byte: u8, set: &'static AsciiSet) -> bool {
    if !byte.is_ascii() || byte.is_ascii_alphanumeric() || matches!(byte, b'-' | b'.' | b'_' | b'~') {
        return true;
    }
    byte != b'%' && percent_encode(&[byte], set).next().is_some_and(|chunk| chunk.starts_with('%'))
}

/// Normalizes a component supplied by the caller into its stored form.
pub(crate) fn normalize(input: &str, component: Component) -> String {
    decode(&encode(input, component), component)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_keeps_allowed_characters() {
        assert_eq!(encode("/a/b:c@d!$&'()*+,;=-._~", Component::Path), "/a/b:c@d!$&'()*+,;=-._~");
    }

    #[test]
    fn path_escapes_others() {
        assert_eq!(encode("/foo bar/ä?#", Component::Path), "/foo%20bar/%C3%A4%3F%23");
    }

    #[test]
    fn query_allows_question_mark() {
        assert_eq!(encode("a=1&b=?x y", Component::Query), "a=1&b=?x%20y");
        assert_eq!(encode("sec#2", Component::Fragment), "sec%232");
    }

    #[test]
    fn never_double_encodes() {
        assert_eq!(encode("/a%3Ab", Component::Path), "/a%3Ab");
        assert_eq!(encode("%2F%zz%", Component::Path), "%2F%25zz%25");
        assert_eq!(encode(&encode("a b%20c", Component::Query), Component::Query), "a%20b%20c");
    }

    #[test]
    fn userinfo_classes() {
        assert_eq!(encode("us:er@x", Component::User), "us%3Aer%40x");
        assert_eq!(encode("pa:ss@x", Component::Password), "pa:ss%40x");
    }

    #[test]
    fn decode_components() {
        assert_eq!(decode("a%20b%41%7E", Component::Path), "a bA~");
        assert_eq!(decode("a+b", Component::Query), "a+b");
        // invalid utf-8 keeps the escaped form
        assert_eq!(decode("%FF%FE", Component::Path), "%FF%FE");
        assert_eq!(normalize("/foo bar/%41", Component::Path), "/foo bar/A");
    }

    #[test]
    fn allowed_delimiters_stay_escaped() {
        assert_eq!(decode("/a%2Fb%3A", Component::Path), "/a%2Fb%3A");
        assert_eq!(decode("q=a%26b%3Dc%2B", Component::Query), "q=a%26b%3Dc%2B");
        assert_eq!(decode("/100%2541", Component::Path), "/100%2541");
        // not allowed in a path, so encode restores the escape
        assert_eq!(decode("/a%3Fb%23", Component::Path), "/a?b#");
        assert_eq!(decode("x%3Fy", Component::Query), "x%3Fy");
        assert_eq!(decode("%C3%A4", Component::Fragment), "ä");
    }
}
