//! Mapping between an addressable parameter bag and [`FilterTuple`].
//!
//! The bag is the canonical form: a key that is absent means "default".
//! Every mutation returns a new bag and leaves its input untouched.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{FilterTuple, ALL};

pub const KEY_YEAR: &str = "year";
pub const KEY_STATE: &str = "state";
pub const KEY_DISTRICT: &str = "district";
pub const KEY_TYPE: &str = "type";
pub const KEY_CATEGORY: &str = "category";
pub const KEY_MANAGEMENT: &str = "management";
pub const KEY_SEARCH: &str = "q";
pub const KEY_PAGE: &str = "page";

/// Keys understood by [`read_filters`]
pub const KNOWN_KEYS: [&str; 8] = [
    KEY_YEAR,
    KEY_STATE,
    KEY_DISTRICT,
    KEY_TYPE,
    KEY_CATEGORY,
    KEY_MANAGEMENT,
    KEY_SEARCH,
    KEY_PAGE,
];

/// Order-insensitive key to string mapping, e.g. a URL query
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterParams(BTreeMap<String, String>);

impl FilterParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string; a leading `?` is accepted
    pub fn parse(query: &str) -> Self {
        let query = query.trim().trim_start_matches('?');
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    /// Render as a URL query string without the leading `?`
    pub fn to_query_string(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(self.0.iter())
            .finish()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.0.remove(key);
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FilterParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        FilterParams(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl fmt::Display for FilterParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "?{}", self.to_query_string())
    }
}

/// Derive the filter tuple from a bag. Unknown keys are ignored and bad
/// values fall back to their defaults.
pub fn read_filters(source: &FilterParams) -> FilterTuple {
    let text = |key: &str| {
        source
            .get(key)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };
    let location = |key: &str| text(key).filter(|v| v != ALL);
    let category = |key: &str| text(key).unwrap_or_else(|| ALL.to_string());

    FilterTuple {
        year: location(KEY_YEAR),
        state: location(KEY_STATE),
        district: location(KEY_DISTRICT),
        school_type: category(KEY_TYPE),
        category: category(KEY_CATEGORY),
        management: category(KEY_MANAGEMENT),
        search: text(KEY_SEARCH).unwrap_or_default(),
        page: source.get(KEY_PAGE).map(parse_page).unwrap_or(1),
    }
}

/// Canonical bag for a tuple: defaults are left out
pub fn write_filters(filters: &FilterTuple) -> FilterParams {
    let mut params = FilterParams::new();

    for (key, value) in [
        (KEY_YEAR, filters.year.as_deref()),
        (KEY_STATE, filters.state.as_deref()),
        (KEY_DISTRICT, filters.district.as_deref()),
        (KEY_TYPE, Some(filters.school_type.as_str())),
        (KEY_CATEGORY, Some(filters.category.as_str())),
        (KEY_MANAGEMENT, Some(filters.management.as_str())),
    ] {
        if let Some(value) = value.filter(|v| is_set(v)) {
            params.insert(key, value);
        }
    }

    // A search for the literal word "all" is still a search
    if !filters.search.is_empty() {
        params.insert(KEY_SEARCH, &filters.search);
    }

    if filters.page > 1 {
        params.insert(KEY_PAGE, &filters.page.to_string());
    }

    params
}

/// Set or unset one filter, cascading resets to dependent keys.
///
/// An empty value or `"all"` removes the key. Changing `year` drops
/// `state` and `district`, changing `state` drops `district`, and the
/// page always goes back to `1`.
pub fn set_filter(source: &FilterParams, key: &str, value: &str) -> FilterParams {
    let mut params = source.clone();

    if is_set(value) {
        params.insert(key, value);
    } else {
        params.remove(key);
    }

    match key {
        KEY_YEAR => {
            params.remove(KEY_STATE);
            params.remove(KEY_DISTRICT);
        }
        KEY_STATE => params.remove(KEY_DISTRICT),
        _ => {}
    }

    if key != KEY_PAGE {
        params.insert(KEY_PAGE, "1");
    }

    params
}

/// Set only the page, no cascading resets
pub fn set_page(source: &FilterParams, page: u32) -> FilterParams {
    let mut params = source.clone();
    params.insert(KEY_PAGE, &page.max(1).to_string());
    params
}

/// Keep `year` and `state` and drop everything else, page included
pub fn clear_filters(source: &FilterParams) -> FilterParams {
    [KEY_YEAR, KEY_STATE]
        .into_iter()
        .filter_map(|key| source.get(key).map(|value| (key, value)))
        .collect()
}

fn is_set(value: &str) -> bool {
    !value.is_empty() && value != ALL
}

fn parse_page(raw: &str) -> u32 {
    match raw.trim().parse::<i64>() {
        Ok(page) if page >= 1 => u32::try_from(page).unwrap_or(1),
        _ => 1,
    }
}
