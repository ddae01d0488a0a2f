//! Ordered query-string mapping.
//!
//! Keys keep their first-seen order. A key that occurs once is a scalar; a key that repeats is an
//! ordered sequence of its values.

use std::slice;
use url::Url;
use url::form_urlencoded;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    Single(String),
    Multi(Vec<String>),
}

impl QueryValue {
    /// The scalar value, or the first value of a sequence.
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        self.as_slice().first().map(String::as_str)
    }

    #[must_use]
    pub fn as_slice(&self) -> &[String] {
        match self {
            QueryValue::Single(v) => slice::from_ref(v),
            QueryValue::Multi(vs) => vs,
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(first) => {
                let first = std::mem::take(first);
                *self = QueryValue::Multi(vec![first, value]);
            }
            QueryValue::Multi(vs) => vs.push(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    entries: Vec<(String, QueryValue)>,
}

impl QueryParams {
    /// Parse an `application/x-www-form-urlencoded` query string (without the leading `?`).
    #[must_use]
    pub fn parse(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            params.append(key.into_owned(), value.into_owned());
        }
        params
    }

    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        url.query().map(Self::parse).unwrap_or_default()
    }

    fn append(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key, QueryValue::Single(value))),
        }
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Replace the value of `key` in place, or append it when absent.
    pub fn set(&mut self, key: &str, value: impl Into<QueryValue>) {
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key.to_string(), value)),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Encode back into a query string. Sequences expand into repeated keys.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let mut ser = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &self.entries {
            for v in value.as_slice() {
                ser.append_pair(key, v);
            }
        }
        ser.finish()
    }

    /// Replace the query of `url` with this mapping.
    pub fn apply_to(&self, url: &mut Url) {
        if self.is_empty() {
            url.set_query(None);
        } else {
            url.set_query(Some(&self.to_query_string()));
        }
    }
}
