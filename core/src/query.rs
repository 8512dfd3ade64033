//! Query-string options for list endpoints.
//!
//! Each options type lists its own parameters through `QueryOptions`; unset
//! fields produce no pair. `set_query_params` merges those pairs into a
//! path's existing query string.

use std::collections::BTreeMap;

use url::form_urlencoded;

pub trait QueryOptions {
    /// Parameters in declaration order. Unset fields are omitted.
    fn query_pairs(&self) -> Vec<(&'static str, String)>;
}

/// Merges `options` into the query of `path`.
///
/// `None` leaves the path untouched. Otherwise every key produced by the
/// options replaces all existing values of that key. The result is
/// form-encoded with keys sorted.
pub fn set_query_params<O>(path: &str, options: Option<&O>) -> String
where
    O: QueryOptions + ?Sized,
{
    let Some(options) = options else {
        return path.to_string();
    };

    let (base, existing) = path.split_once('?').unwrap_or((path, ""));

    let mut values: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in form_urlencoded::parse(existing.as_bytes()) {
        values.entry(key.into_owned()).or_default().push(value.into_owned());
    }

    let mut overrides: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for (key, value) in options.query_pairs() {
        overrides.entry(key.to_string()).or_default().push(value);
    }
    values.extend(overrides);

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, list) in &values {
        for value in list {
            serializer.append_pair(key, value);
        }
    }
    let query = serializer.finish();

    if query.is_empty() {
        base.to_string()
    } else {
        format!("{base}?{query}")
    }
}
