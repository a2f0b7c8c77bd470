//! Header storage: caller casing for enumeration, case-insensitive lookup.

use std::collections::HashMap;

/// Ordered header collection.
///
/// Every entry keeps the name exactly as the caller wrote it, so
/// [`iter`](Headers::iter) echoes that casing back. Lookups go through a
/// lowercase index and ignore case
/// (per [RFC 7230](https://tools.ietf.org/html/rfc7230#section-3.2)).
///
/// # Examples
/// ```
/// use maker_message::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("Content-Type", "text/html");
/// headers.set("X-Tags", ["a", "b"]);
///
/// assert_eq!(headers.get("content-type"), ["text/html"]);
/// assert_eq!(headers.line("x-tags"), "a, b");
/// assert_eq!(headers.iter().next().unwrap().0, "Content-Type");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Headers {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl Headers {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Values for `name`, or an empty slice when it is absent.
    #[inline]
    pub fn get(&self, name: &str) -> &[String] {
        self.position(name)
            .map(|index| self.entries[index].1.as_slice())
            .unwrap_or(&[])
    }

    /// Values for `name` joined with `", "`.
    #[inline]
    pub fn line(&self, name: &str) -> String {
        self.get(name).join(", ")
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Replaces every case-insensitive match of `name` with a single entry
    /// stored under the given casing.
    pub fn set<V: HeaderValues>(&mut self, name: &str, values: V) {
        self.remove(name);
        self.index.insert(name.to_ascii_lowercase(), self.entries.len());
        self.entries.push((name.to_owned(), values.into_values()));
    }

    /// Appends to an existing entry matching `name`.
    ///
    /// Returns `false`, leaving the collection untouched, when nothing matches.
    pub fn append<V: HeaderValues>(&mut self, name: &str, values: V) -> bool {
        match self.position(name) {
            Some(index) => {
                self.entries[index].1.extend(values.into_values());
                true
            }
            None => false,
        }
    }

    /// Removes the entry matching `name`, returning its values.
    pub fn remove(&mut self, name: &str) -> Option<Vec<String>> {
        let index = self.index.remove(&name.to_ascii_lowercase())?;
        let (_, values) = self.entries.remove(index);

        for position in self.index.values_mut() {
            if *position > index {
                *position -= 1;
            }
        }

        Some(values)
    }

    /// Iterates over `(name, values)` in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    fn position(&self, name: &str) -> Option<usize> {
        // Skip the allocation when the caller already uses lowercase
        match name.bytes().any(|b| b.is_ascii_uppercase()) {
            true => self.index.get(&name.to_ascii_lowercase()).copied(),
            false => self.index.get(name).copied(),
        }
    }
}

impl<N: AsRef<str>, V: HeaderValues> FromIterator<(N, V)> for Headers {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        let mut headers = Headers::new();
        for (name, values) in iter {
            headers.set(name.as_ref(), values);
        }
        headers
    }
}

/// Anything that can become the value list of a header.
///
/// # Examples
/// ```
/// use maker_message::Headers;
///
/// let mut headers = Headers::new();
/// headers.set("x-one", "text");                  // &str
/// headers.set("x-two", 128);                     // integer
/// headers.set("x-three", vec!["a", "b"]);        // Vec<&str>
/// headers.set("x-four", ["gzip".to_string()]);   // [String; N]
///
/// assert_eq!(headers.get("x-two"), ["128"]);
/// ```
pub trait HeaderValues {
    fn into_values(self) -> Vec<String>;
}

macro_rules! impl_header_values {
    (single => $($t:ty),*) => {
        $(impl HeaderValues for $t {
            #[inline] fn into_values(self) -> Vec<String> { vec![self.to_string()] }
        })*
    };
    (many => $($t:ty),*) => {
        $(impl<T: ToString> HeaderValues for $t {
            #[inline] fn into_values(self) -> Vec<String> {
                self.into_iter().map(|v| v.to_string()).collect()
            }
        })*
    };
}

impl_header_values! {
    single => &str, String, &String, bool, char,
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize
}
impl_header_values! { many => Vec<T> }

impl<T: ToString, const N: usize> HeaderValues for [T; N] {
    #[inline]
    fn into_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}

impl<T: ToString> HeaderValues for &[T] {
    #[inline]
    fn into_values(self) -> Vec<String> {
        self.iter().map(ToString::to_string).collect()
    }
}
