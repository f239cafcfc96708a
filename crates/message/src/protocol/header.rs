//! Case-insensitive header storage that remembers how each name was spelled.
//!
//! Headers are keyed by [`http::HeaderName`], which validates the name as an RFC 7230 token
//! and normalizes it to lowercase. Each entry also keeps the name exactly as it was last
//! set, so enumeration gives back `Content-Type` rather than `content-type`.
//!
//! The table lives behind a [`triomphe::Arc`]. Cloning [`Headers`] shares it, and a
//! mutation copies it only when it is actually shared.

use std::fmt;

use http::{HeaderName, HeaderValue};
use indexmap::IndexMap;
use triomphe::Arc;

use crate::error::MessageError;

/// One or more values of a single header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderValues {
    Single(String),
    Multiple(Vec<String>),
}

impl HeaderValues {
    pub fn as_slice(&self) -> &[String] {
        match self {
            HeaderValues::Single(value) => std::slice::from_ref(value),
            HeaderValues::Multiple(values) => values,
        }
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn is_empty(&self) -> bool {
        self.as_slice().is_empty()
    }

    fn push(&mut self, value: String) {
        match self {
            HeaderValues::Single(first) => {
                let first = std::mem::take(first);
                *self = HeaderValues::Multiple(vec![first, value]);
            }
            HeaderValues::Multiple(values) => values.push(value),
        }
    }

    fn into_vec(self) -> Vec<String> {
        match self {
            HeaderValues::Single(value) => vec![value],
            HeaderValues::Multiple(values) => values,
        }
    }

    fn from_vec(mut values: Vec<String>) -> Self {
        if values.len() == 1 {
            HeaderValues::Single(values.remove(0))
        } else {
            HeaderValues::Multiple(values)
        }
    }
}

impl From<&str> for HeaderValues {
    fn from(value: &str) -> Self {
        HeaderValues::Single(value.to_owned())
    }
}

impl From<String> for HeaderValues {
    fn from(value: String) -> Self {
        HeaderValues::Single(value)
    }
}

impl From<Vec<String>> for HeaderValues {
    fn from(values: Vec<String>) -> Self {
        HeaderValues::Multiple(values)
    }
}

impl From<Vec<&str>> for HeaderValues {
    fn from(values: Vec<&str>) -> Self {
        HeaderValues::Multiple(values.into_iter().map(str::to_owned).collect())
    }
}

impl From<&[&str]> for HeaderValues {
    fn from(values: &[&str]) -> Self {
        HeaderValues::Multiple(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for HeaderValues {
    fn from(values: [&str; N]) -> Self {
        HeaderValues::Multiple(values.iter().map(|v| (*v).to_owned()).collect())
    }
}

/// How header values are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum HeaderValueCase {
    /// Values are kept exactly as supplied.
    #[default]
    Preserve,
    /// Values are lowercased before they are stored and compared case-insensitively.
    Lowercase,
}

impl HeaderValueCase {
    fn apply(self, value: &str) -> String {
        match self {
            HeaderValueCase::Preserve => value.to_owned(),
            HeaderValueCase::Lowercase => value.to_ascii_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HeaderEntry {
    /// the name as it was most recently set
    name: String,
    values: HeaderValues,
}

/// An ordered, case-insensitive header map.
///
/// Every lookup goes through the lowercase form of the name while
/// [`iter`](Headers::iter) yields names in their original spelling. All mutators take
/// `&self` and return a new map.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Headers {
    entries: Arc<IndexMap<HeaderName, HeaderEntry>>,
    value_case: HeaderValueCase,
}

impl Headers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a header map from `(name, values)` pairs. Repeated names are appended.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for invalid header names or values.
    pub fn from_pairs<I, N, V>(pairs: I) -> Result<Self, MessageError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: Into<HeaderValues>,
    {
        let mut headers = Self::new();
        for (name, values) in pairs {
            headers.append(name.as_ref(), values.into())?;
        }
        Ok(headers)
    }

    pub fn value_case(&self) -> HeaderValueCase {
        self.value_case
    }

    /// Returns a map that stores new values with the given policy. Values already stored
    /// are left as they are.
    pub fn with_value_case(&self, value_case: HeaderValueCase) -> Self {
        Self { entries: Arc::clone(&self.entries), value_case }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns true if a header with this name exists, compared case-insensitively.
    pub fn contains(&self, name: &str) -> bool {
        lookup_key(name).is_some_and(|key| self.entries.contains_key(&key))
    }

    /// Returns the values of the header, or an empty slice if it is absent.
    pub fn get(&self, name: &str) -> &[String] {
        lookup_key(name).and_then(|key| self.entries.get(&key)).map_or(&[], |entry| entry.values.as_slice())
    }

    /// Returns all values of the header joined by `", "`, or an empty string if it is absent.
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    /// Iterates over `(name, values)` in insertion order, names in their original spelling.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries.values().map(|entry| (entry.name.as_str(), entry.values.as_slice()))
    }

    /// Iterates over the header names in their original spelling.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|entry| entry.name.as_str())
    }

    /// Returns a map where `name` holds exactly `values`.
    ///
    /// Nothing changes when the header already holds these values under the same spelling.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for an invalid name, an invalid value or an
    /// empty list of values.
    pub fn with_header<V: Into<HeaderValues>>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        let key = header_key(name)?;
        let values = self.validate_values(values.into())?;

        if let Some(entry) = self.entries.get(&key) {
            if entry.name == name && entry.values == values {
                return Ok(self.clone());
            }
        }

        let mut headers = self.clone();
        Arc::make_mut(&mut headers.entries).insert(key, HeaderEntry { name: name.to_owned(), values });
        Ok(headers)
    }

    /// Returns a map where `values` are appended to the existing values of `name`.
    ///
    /// Adding the value a header already holds as its only value changes nothing but the
    /// spelling of the name.
    ///
    /// # Errors
    ///
    /// Returns [`MessageError::InvalidArgument`] for an invalid name, an invalid value or an
    /// empty list of values.
    pub fn with_added_header<V: Into<HeaderValues>>(&self, name: &str, values: V) -> Result<Self, MessageError> {
        let mut headers = self.clone();
        headers.append(name, values.into())?;
        Ok(headers)
    }

    /// Returns a map without the header `name`.
    pub fn without_header(&self, name: &str) -> Self {
        let Some(key) = lookup_key(name).filter(|key| self.entries.contains_key(key)) else {
            return self.clone();
        };

        let mut headers = self.clone();
        Arc::make_mut(&mut headers.entries).shift_remove(&key);
        headers
    }

    fn append(&mut self, name: &str, values: HeaderValues) -> Result<(), MessageError> {
        let key = header_key(name)?;
        let values = self.validate_values(values)?;

        let existing = self.entries.get(&key).map(|entry| {
            let sole_equal = entry.values.len() == 1 && entry.values.as_slice() == values.as_slice();
            (entry.name == name, sole_equal)
        });

        match existing {
            Some((true, true)) => {}
            Some((false, true)) => {
                if let Some(entry) = Arc::make_mut(&mut self.entries).get_mut(&key) {
                    entry.name = name.to_owned();
                }
            }
            Some((_, false)) => {
                if let Some(entry) = Arc::make_mut(&mut self.entries).get_mut(&key) {
                    entry.name = name.to_owned();
                    for value in values.into_vec() {
                        entry.values.push(value);
                    }
                }
            }
            None => {
                Arc::make_mut(&mut self.entries).insert(key, HeaderEntry { name: name.to_owned(), values });
            }
        }
        Ok(())
    }

    fn validate_values(&self, values: HeaderValues) -> Result<HeaderValues, MessageError> {
        let values = values.into_vec();
        if values.is_empty() {
            return Err(MessageError::invalid_argument("header values must not be empty"));
        }

        values
            .iter()
            .map(|value| {
                let trimmed = value.trim_matches([' ', '\t']);
                HeaderValue::from_str(trimmed)
                    .map(|_| self.value_case.apply(trimmed))
                    .map_err(|e| MessageError::invalid_argument(format!("invalid header value {value:?}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(HeaderValues::from_vec)
    }
}

fn header_key(name: &str) -> Result<HeaderName, MessageError> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| MessageError::invalid_argument(format!("invalid header name {name:?}: {e}")))
}

/// Lookups never fail: a name that is not a valid token can not be stored either.
fn lookup_key(name: &str) -> Option<HeaderName> {
    HeaderName::from_bytes(name.as_bytes()).ok()
}

impl<N, V> TryFrom<Vec<(N, V)>> for Headers
where
    N: AsRef<str>,
    V: Into<HeaderValues>,
{
    type Error = MessageError;

    fn try_from(pairs: Vec<(N, V)>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a Headers {
    type Item = (&'a str, &'a [String]);
    type IntoIter = Box<dyn Iterator<Item = (&'a str, &'a [String])> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_lookup_keeps_spelling() {
        let headers = Headers::new().with_header("Content-Type", "application/json").unwrap();
        assert!(headers.contains("content-type"));
        assert!(headers.contains("CONTENT-TYPE"));
        assert_eq!(headers.get("content-TYPE"), ["application/json"]);
        assert_eq!(headers.names().collect::<Vec<_>>(), ["Content-Type"]);
    }

    #[test]
    fn with_header_is_idempotent() {
        let once = Headers::new().with_header("X-Token", "abc").unwrap();
        let twice = once.with_header("X-Token", "abc").unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn with_header_replaces_and_recases() {
        let headers = Headers::new()
            .with_header("x-request-id", "1")
            .unwrap()
            .with_header("X-Request-Id", ["2", "3"])
            .unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-request-id"), ["2", "3"]);
        assert_eq!(headers.names().collect::<Vec<_>>(), ["X-Request-Id"]);
    }

    #[test]
    fn value_case_policies() {
        let preserved = Headers::new().with_header("Accept", "Text/HTML").unwrap();
        assert_eq!(preserved.line("accept"), "Text/HTML");
        assert_ne!(preserved.with_header("Accept", "text/html").unwrap(), preserved);

        let lowered =
            Headers::new().with_value_case(HeaderValueCase::Lowercase).with_header("Accept", "Text/HTML").unwrap();
        assert_eq!(lowered.line("accept"), "text/html");
        assert_eq!(lowered.with_header("Accept", "TEXT/html").unwrap(), lowered);
    }

    #[test]
    fn added_header_promotes_to_list() {
        let headers = Headers::new()
            .with_header("Accept", "text/html")
            .unwrap()
            .with_added_header("accept", "application/json")
            .unwrap();
        assert_eq!(headers.get("Accept"), ["text/html", "application/json"]);
        assert_eq!(headers.line("ACCEPT"), "text/html, application/json");
        assert_eq!(headers.names().collect::<Vec<_>>(), ["accept"]);

        let headers = headers.with_added_header("Accept", vec!["a/b", "c/d"]).unwrap();
        assert_eq!(headers.get("accept").len(), 4);
    }

    #[test]
    fn added_header_with_sole_equal_value_is_noop() {
        let headers = Headers::new().with_header("Vary", "Origin").unwrap();
        assert_eq!(headers.with_added_header("Vary", "Origin").unwrap(), headers);
        assert_eq!(headers.with_added_header("vary", "Origin").unwrap().get("Vary"), ["Origin"]);
    }

    #[test]
    fn added_list_equal_to_stored_list_appends() {
        let headers = Headers::new().with_header("Accept", vec!["a", "b"]).unwrap();
        let added = headers.with_added_header("Accept", vec!["a", "b"]).unwrap();
        assert_eq!(added.get("Accept"), ["a", "b", "a", "b"]);
        assert_eq!(headers.get("Accept"), ["a", "b"]);

        let headers = Headers::new().with_header("Vary", "Origin").unwrap();
        let added = headers.with_added_header("Vary", vec!["Origin", "Origin"]).unwrap();
        assert_eq!(added.get("Vary"), ["Origin", "Origin", "Origin"]);
    }

    #[test]
    fn added_header_creates_missing() {
        let headers = Headers::new().with_added_header("Set-Cookie", "a=1").unwrap();
        assert_eq!(headers.get("set-cookie"), ["a=1"]);
    }

    #[test]
    fn without_header() {
        let headers = Headers::new().with_header("A", "1").unwrap().with_header("B", "2").unwrap();
        let removed = headers.without_header("a");
        assert!(!removed.contains("A"));
        assert_eq!(removed.names().collect::<Vec<_>>(), ["B"]);
        assert_eq!(removed.without_header("missing"), removed);
        assert_eq!(headers.len(), 2);
    }

    #[test]
    fn absent_header() {
        let headers = Headers::new();
        assert!(headers.get("Host").is_empty());
        assert_eq!(headers.line("Host"), "");
        assert!(!headers.contains("bad name"));
    }

    #[test]
    fn invalid_input() {
        let headers = Headers::new();
        assert!(matches!(headers.with_header("bad name", "x"), Err(MessageError::InvalidArgument { .. })));
        assert!(matches!(headers.with_header("X-Bad", "a\r\nb"), Err(MessageError::InvalidArgument { .. })));
        assert!(matches!(
            headers.with_header("X-Empty", Vec::<String>::new()),
            Err(MessageError::InvalidArgument { .. })
        ));
        assert!(matches!(headers.with_header("", "x"), Err(MessageError::InvalidArgument { .. })));
    }

    #[test]
    fn values_are_trimmed() {
        let headers = Headers::new().with_header("X-Pad", "  padded\t").unwrap();
        assert_eq!(headers.get("x-pad"), ["padded"]);
    }

    #[test]
    fn from_pairs_keeps_order_and_appends() {
        let headers =
            Headers::from_pairs([("Host", "example.com"), ("Accept", "*/*"), ("accept", "text/plain")]).unwrap();
        let collected: Vec<_> = headers.iter().map(|(name, values)| (name, values.to_vec())).collect();
        assert_eq!(
            collected,
            [("Host", vec!["example.com".to_owned()]), ("accept", vec!["*/*".to_owned(), "text/plain".to_owned()])]
        );
    }

    #[test]
    fn try_from_pairs() {
        let headers = Headers::try_from(vec![("Accept", "text/html"), ("X-Trace", "1")]).unwrap();
        assert_eq!(headers.names().collect::<Vec<_>>(), ["Accept", "X-Trace"]);
        assert!(Headers::try_from(vec![("Bad Name", "x")]).is_err());
    }

    #[test]
    fn clones_share_until_written() {
        let headers = Headers::new().with_header("A", "1").unwrap();
        let same = headers.clone();
        assert!(Arc::ptr_eq(&headers.entries, &same.entries));

        let changed = same.with_header("B", "2").unwrap();
        assert!(!Arc::ptr_eq(&headers.entries, &changed.entries));
        assert_eq!(headers.len(), 1);
    }
}
