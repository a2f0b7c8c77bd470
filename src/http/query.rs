//! URL query string parser with flexible collection support.

use memchr::memchr;
use std::collections::HashMap;
use url::form_urlencoded;

/// URL query string parser.
///
/// Splits a query string on `&`, decodes every `key=value` pair the way
/// `application/x-www-form-urlencoded` requires (`+` is a space, `%XX` is a
/// byte) and hands the pairs to a [QueryCollector].
///
/// Empty segments (`a=1&&b=2`) are skipped, a segment without `=` is a key
/// with an empty value.
///
/// # Examples
/// ```rust
/// use maker_message::query::Query;
/// use std::collections::HashMap;
///
/// // Parse into Vec (preserves order)
/// let params: Vec<(String, String)> = Query::parse("name=john&age=25&city", 10).unwrap();
/// assert_eq!(params.len(), 3);
/// assert_eq!(params[2], ("city".to_string(), String::new()));
///
/// // Parse into HashMap (deduplicates)
/// let params: HashMap<String, String> = Query::parse("key=1&key=2", 10).unwrap();
/// assert_eq!(params["key"], "2");
///
/// // Handle limits
/// let result = Query::parse::<Vec<(String, String)>>("a=1&b=2", 1);
/// assert!(result.is_err());
/// ```
pub struct Query;

impl Query {
    /// Parses a URL query string into a new collection.
    ///
    /// # Arguments
    /// - `query`: the raw query string
    ///   (handles optional leading `?` automatically, so `?a=1` and `a=1` are equivalent)
    /// - `limit`: maximum number of parameters to parse
    #[inline]
    pub fn parse<C: QueryCollector>(query: &str, limit: usize) -> Result<C, Error> {
        let mut result = C::with_capacity(limit.min(64));
        Self::parse_into(&mut result, query, limit)?;
        Ok(result)
    }

    /// Parses a URL query string into an existing collection.
    ///
    /// Parameters are appended; the limit applies to the collection's
    /// total [length](QueryCollector::length).
    ///
    /// # Examples
    /// ```
    /// use maker_message::query::Query;
    ///
    /// let mut collector: Vec<(String, String)> = Vec::new();
    ///
    /// Query::parse_into(&mut collector, "a=1&b=2", 10).unwrap();
    /// Query::parse_into(&mut collector, "email=user%40example.com", 10).unwrap();
    /// assert_eq!(collector.len(), 3);
    /// assert_eq!(collector[2].1, "user@example.com");
    /// ```
    pub fn parse_into<C: QueryCollector>(
        result: &mut C,
        query: &str,
        limit: usize,
    ) -> Result<(), Error> {
        let query = query.as_bytes();
        let data = match query.first().ok_or(Error::Empty)? {
            b'?' => &query[1..],
            _ => query,
        };

        let mut start = 0;
        while start < data.len() {
            let end = memchr(b'&', &data[start..])
                .map(|pos| start + pos)
                .unwrap_or(data.len());

            // `form_urlencoded` yields nothing for an empty segment
            if let Some((key, value)) = form_urlencoded::parse(&data[start..end]).next() {
                if result.length() >= limit {
                    return Err(Error::OverLimit(limit));
                }
                result.add_param(key.into_owned(), value.into_owned());
            }

            start = end + 1;
        }

        Ok(())
    }
}

/// A trait for types that can collect parsed query parameters.
///
/// # Examples
/// ```rust
/// use maker_message::query::QueryCollector;
///
/// struct Keys(Vec<String>);
///
/// impl QueryCollector for Keys {
///     fn add_param(&mut self, key: String, _value: String) {
///         self.0.push(key);
///     }
///
///     fn length(&self) -> usize {
///         self.0.len()
///     }
///
///     fn with_capacity(capacity: usize) -> Self {
///         Keys(Vec::with_capacity(capacity))
///     }
/// }
/// ```
pub trait QueryCollector
where
    Self: Sized,
{
    /// Adds a decoded parameter to the collection.
    fn add_param(&mut self, key: String, value: String);

    /// Returns the current number of parameters in the collection.
    // For `length` instead of `len`, thanks to `clippy` for the tip
    // about adding the `is_empty` method, although it's not needed here
    fn length(&self) -> usize;

    /// Creates a new collection with the specified capacity.
    fn with_capacity(capacity: usize) -> Self;
}

// Implementation for Vec - preserves parameter order
impl QueryCollector for Vec<(String, String)> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.push((key, value));
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        Vec::with_capacity(capacity)
    }
}

// Implementation for HashMap - deduplicates parameters (last wins)
impl QueryCollector for HashMap<String, String> {
    #[inline(always)]
    fn add_param(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    #[inline(always)]
    fn length(&self) -> usize {
        self.len()
    }

    #[inline(always)]
    fn with_capacity(capacity: usize) -> Self {
        HashMap::with_capacity(capacity)
    }
}

/// Error types that can occur during query parsing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The number of parameters exceeded the specified limit.
    #[error("Query parameter limit exceeded: limit={0}")]
    OverLimit(usize),

    /// The query string is empty.
    #[error("Query string is empty or contains no parameters")]
    Empty,
}
