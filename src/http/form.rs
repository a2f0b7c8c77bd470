//! Form-array collections shared by multipart decoding, query parsing and
//! query building.
//!
//! Form fields follow the bracket convention used by browsers and most web
//! stacks:
//!
//! | Field name  | Meaning                                   |
//! |-------------|-------------------------------------------|
//! | `title`     | scalar; a later field with the same name overwrites it |
//! | `tags[]`    | append to the `tags` array                |
//! | `tags[main]`| insert under the key `main` of `tags`     |

use crate::query::QueryCollector;
use serde_json::{Map, Value};
use tracing::warn;
use url::form_urlencoded;

/// Ordered, keyed collection with form-array semantics.
///
/// Appending assigns the next integer key (one past the largest integer key
/// seen so far), inserting under an existing key replaces the value but keeps
/// its position. Once `usize::MAX` has been used as a key, appends are refused.
///
/// # Examples
/// ```
/// use maker_message::form::FormArray;
///
/// let mut array = FormArray::new();
/// array.push("a");
/// array.insert("main", "b");
/// array.push("c");
///
/// let keys: Vec<&str> = array.keys().collect();
/// assert_eq!(keys, ["0", "main", "1"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FormArray<T> {
    entries: Vec<(String, T)>,
    // `None` once no integer key is left
    next_index: Option<usize>,
}

impl<T> Default for FormArray<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_index: Some(0),
        }
    }
}

impl<T> FormArray<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value under the next free integer key.
    ///
    /// Returns `false`, dropping the value, when the next key would overflow.
    pub fn push(&mut self, value: T) -> bool {
        let Some(index) = self.next_index else {
            return false;
        };

        self.next_index = index.checked_add(1);
        self.entries.push((index.to_string(), value));
        true
    }

    /// Inserts a value under `key`, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: T) -> Option<T> {
        let key = key.into();
        match self.position(&key) {
            Some(index) => Some(std::mem::replace(&mut self.entries[index].1, value)),
            None => {
                self.track_index(&key);
                self.entries.push((key, value));
                None
            }
        }
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<&T> {
        self.position(key).map(|index| &self.entries[index].1)
    }

    #[inline]
    pub fn get_mut(&mut self, key: &str) -> Option<&mut T> {
        self.position(key).map(|index| &mut self.entries[index].1)
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn values(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|(_, value)| value)
    }

    /// Whether the keys are exactly `0, 1, 2, …` in order.
    pub fn is_list(&self) -> bool {
        self.entries
            .iter()
            .enumerate()
            .all(|(index, (key, _))| integer_key(key) == Some(index))
    }

    #[inline]
    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }

    #[inline]
    fn track_index(&mut self, key: &str) {
        if let Some(index) = integer_key(key) {
            self.next_index = self
                .next_index
                .zip(index.checked_add(1))
                .map(|(next, after)| next.max(after));
        }
    }

    // Finds `key` or appends a slot for it created by `make`.
    fn slot(&mut self, key: &str, make: impl FnOnce() -> T) -> usize {
        match self.position(key) {
            Some(index) => index,
            None => {
                self.track_index(key);
                self.entries.push((key.to_owned(), make()));
                self.entries.len() - 1
            }
        }
    }
}

impl<T> FromIterator<(String, T)> for FormArray<T> {
    fn from_iter<I: IntoIterator<Item = (String, T)>>(iter: I) -> Self {
        let mut array = FormArray::new();
        for (key, value) in iter {
            array.insert(key, value);
        }
        array
    }
}

impl<T> IntoIterator for FormArray<T> {
    type Item = (String, T);
    type IntoIter = std::vec::IntoIter<(String, T)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// Canonical non-negative integers only: "7" is an index, "07" is a name.
#[inline]
fn integer_key(key: &str) -> Option<usize> {
    match key.as_bytes() {
        [] => None,
        [b'0', _, ..] => None,
        bytes if bytes.iter().all(u8::is_ascii_digit) => key.parse().ok(),
        _ => None,
    }
}

/// A top-level form value: either a scalar or a bracketed array.
#[derive(Debug, Clone, PartialEq)]
pub enum FormEntry<T> {
    Value(T),
    Array(FormArray<T>),
}

impl<T> FormEntry<T> {
    #[inline]
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Array(_) => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&FormArray<T>> {
        match self {
            Self::Value(_) => None,
            Self::Array(array) => Some(array),
        }
    }

    #[inline]
    fn count(&self) -> usize {
        match self {
            Self::Value(_) => 1,
            Self::Array(array) => array.len(),
        }
    }
}

/// Decoded form fields keyed by base name.
pub type Params = FormArray<FormEntry<String>>;

// FIELD NAME

/// How a field name addresses its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FieldName<'a> {
    Scalar(&'a str),
    Array { base: &'a str, key: Option<&'a str> },
}

impl<'a> FieldName<'a> {
    /// Splits a trailing `[...]` off a field name.
    ///
    /// The last opening bracket wins, so `a[b][c]` has base `a[b]` and key `c`.
    pub(crate) fn parse(name: &'a str) -> Self {
        if let Some(inner) = name.strip_suffix(']') {
            if let Some(open) = inner.rfind('[') {
                let key = &inner[open + 1..];

                return FieldName::Array {
                    base: &inner[..open],
                    key: (!key.is_empty()).then_some(key),
                };
            }
        }

        FieldName::Scalar(name)
    }
}

impl<T> FormArray<FormEntry<T>> {
    /// Stores `value` following the bracket convention of `name`.
    ///
    /// A scalar name replaces whatever was there; an array name turns a
    /// previous scalar under the same base into an array.
    ///
    /// # Examples
    /// ```
    /// use maker_message::form::Params;
    ///
    /// let mut params = Params::new();
    /// params.insert_field("tags[]", "a".to_string());
    /// params.insert_field("tags[]", "b".to_string());
    /// params.insert_field("title", "Hello".to_string());
    ///
    /// let tags = params.get("tags").and_then(|t| t.as_array()).unwrap();
    /// assert_eq!(tags.values().collect::<Vec<_>>(), ["a", "b"]);
    /// ```
    pub fn insert_field(&mut self, name: &str, value: T) {
        match FieldName::parse(name) {
            FieldName::Scalar(base) => {
                self.insert(base, FormEntry::Value(value));
            }
            FieldName::Array { base, key } => {
                let index = self.slot(base, || FormEntry::Array(FormArray::new()));
                let entry = &mut self.entries[index].1;

                if !matches!(entry, FormEntry::Array(_)) {
                    *entry = FormEntry::Array(FormArray::new());
                }
                if let FormEntry::Array(array) = entry {
                    match key {
                        Some(key) => {
                            array.insert(key, value);
                        }
                        None => {
                            if !array.push(value) {
                                warn!(field = base, "Next array index is taken, value dropped");
                            }
                        }
                    }
                }
            }
        }
    }

    /// Number of leaf values across all entries.
    pub fn field_count(&self) -> usize {
        self.values().map(FormEntry::count).sum()
    }
}

impl QueryCollector for Params {
    #[inline]
    fn add_param(&mut self, key: String, value: String) {
        self.insert_field(&key, value);
    }

    #[inline]
    fn length(&self) -> usize {
        self.field_count()
    }

    #[inline]
    fn with_capacity(_: usize) -> Self {
        Params::new()
    }
}

// JSON

impl Params {
    /// Converts the fields into a JSON object.
    ///
    /// Arrays whose keys are `0..n` become JSON arrays, every other array
    /// becomes an object.
    pub fn to_json(&self) -> Map<String, Value> {
        self.iter()
            .map(|(name, entry)| {
                let value = match entry {
                    FormEntry::Value(value) => Value::String(value.clone()),
                    FormEntry::Array(array) => array_to_json(array),
                };
                (name.to_owned(), value)
            })
            .collect()
    }
}

fn array_to_json(array: &FormArray<String>) -> Value {
    if array.is_list() {
        Value::Array(array.values().cloned().map(Value::String).collect())
    } else {
        Value::Object(
            array
                .iter()
                .map(|(key, value)| (key.to_owned(), Value::String(value.clone())))
                .collect(),
        )
    }
}

/// Serializes a JSON mapping into a URL query string.
///
/// Nested arrays and objects use the bracket convention (`a[b]=c`), booleans
/// become `1`/`0`, `null` values are skipped.
///
/// # Examples
/// ```
/// use maker_message::form::encode_query;
/// use serde_json::json;
///
/// let params = json!({"q": "rust lang", "page": 2, "tags": ["a", "b"]});
/// assert_eq!(
///     encode_query(params.as_object().unwrap()),
///     "q=rust+lang&page=2&tags%5B0%5D=a&tags%5B1%5D=b"
/// );
/// ```
pub fn encode_query(params: &Map<String, Value>) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        append_value(&mut serializer, key, value);
    }
    serializer.finish()
}

fn append_value(serializer: &mut form_urlencoded::Serializer<'_, String>, key: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::Bool(flag) => {
            serializer.append_pair(key, if *flag { "1" } else { "0" });
        }
        Value::Number(number) => {
            serializer.append_pair(key, &number.to_string());
        }
        Value::String(text) => {
            serializer.append_pair(key, text);
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                append_value(serializer, &format!("{key}[{index}]"), item);
            }
        }
        Value::Object(map) => {
            for (name, item) in map {
                append_value(serializer, &format!("{key}[{name}]"), item);
            }
        }
    }
}
