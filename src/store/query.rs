use std::{cmp::Ordering, fmt, vec};

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Ascending,
    Descending,
}

impl Direction {
    pub fn toggled(self) -> Self {
        match self {
            Direction::Ascending => Direction::Descending,
            Direction::Descending => Direction::Ascending,
        }
    }

    pub(crate) fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Direction::Ascending => ordering,
            Direction::Descending => ordering.reverse(),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Ascending => write!(f, "asc"),
            Direction::Descending => write!(f, "desc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortOrder {
    pub property: String,
    pub direction: Direction,
}

impl SortOrder {
    pub fn asc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Ascending,
        }
    }

    pub fn desc(property: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            direction: Direction::Descending,
        }
    }
}

/// Case-insensitive substring match over one field, or over every scalar
/// field when no field is named.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    pub field: Option<String>,
    pub text: String,
}

impl Filter {
    pub fn any(text: impl Into<String>) -> Self {
        Self {
            field: None,
            text: text.into(),
        }
    }

    pub fn on(field: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            text: text.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    pub fn matches(&self, row: &Value) -> bool {
        if self.is_empty() {
            return true;
        }
        let needle = self.text.trim().to_lowercase();
        match &self.field {
            Some(field) => row
                .get(field)
                .is_some_and(|value| scalar_contains(value, &needle)),
            None => row
                .as_object()
                .is_some_and(|map| map.values().any(|value| scalar_contains(value, &needle))),
        }
    }
}

fn scalar_contains(value: &Value, needle: &str) -> bool {
    match value {
        Value::String(text) => text.to_lowercase().contains(needle),
        Value::Number(num) => num.to_string().contains(needle),
        _ => false,
    }
}

/// Page index, page size, sort keys and filter for one page request.
/// Nothing is retained between requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: Vec<SortOrder>,
    pub filter: Filter,
}

impl PageRequest {
    pub fn new(page: usize, size: usize) -> Self {
        Self {
            page,
            size,
            sort: Vec::new(),
            filter: Filter::default(),
        }
    }

    pub fn with_sort(mut self, sort: Vec<SortOrder>) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.size)
    }
}

/// The rows of a single page. Consumed once; request the page again to
/// re-read it.
#[derive(Debug)]
pub struct PageStream<E> {
    page: usize,
    rows: vec::IntoIter<E>,
}

impl<E> PageStream<E> {
    pub fn new(page: usize, rows: Vec<E>) -> Self {
        Self {
            page,
            rows: rows.into_iter(),
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

impl<E> Iterator for PageStream<E> {
    type Item = E;

    fn next(&mut self) -> Option<E> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl<E> ExactSizeIterator for PageStream<E> {}

/// Nulls first, then booleans, numbers and strings compared within their type.
pub(crate) fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.to_lowercase().cmp(&y.to_lowercase()),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn filter_on_field_is_case_insensitive() {
        let row = json!({"firstName": "Ada", "lastName": "Lovelace", "important": true});
        assert!(Filter::on("lastName", "LOVE").matches(&row));
        assert!(!Filter::on("firstName", "love").matches(&row));
        assert!(Filter::any("love").matches(&row));
        assert!(Filter::any("  ").matches(&row));
        assert!(!Filter::any("true").matches(&row));
    }

    #[test]
    fn nulls_sort_before_values() {
        assert_eq!(compare_values(&Value::Null, &json!("a")), Ordering::Less);
        assert_eq!(compare_values(&json!(false), &json!(true)), Ordering::Less);
        assert_eq!(compare_values(&json!("b"), &json!("A")), Ordering::Greater);
        assert_eq!(
            Direction::Descending.apply(compare_values(&json!(1), &json!(2))),
            Ordering::Greater
        );
    }

    #[test]
    fn page_stream_is_exact_sized() {
        let mut stream = PageStream::new(2, vec![1, 2, 3]);
        assert_eq!(stream.page(), 2);
        assert_eq!(stream.len(), 3);
        stream.next();
        assert_eq!(stream.len(), 2);
        assert_eq!(PageRequest::new(2, 25).offset(), 50);
    }
}
