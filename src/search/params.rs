//! Search predicates and the per-request search descriptor

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Backend column a predicate applies to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum SearchKey {
    Price,
    BodyType,
    TransportName,
    TransportModel,
    TransmissionType,
    Mileage,
    YearOfManufacture,
    Power,
    FuelType,
    SellerType,
}

impl SearchKey {
    /// Column name used in `where` clauses
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Price => "price",
            Self::BodyType => "bodyType",
            Self::TransportName => "transportName",
            Self::TransportModel => "transportModel",
            Self::TransmissionType => "transmissionType",
            Self::Mileage => "mileage",
            Self::YearOfManufacture => "yearOfManufacture",
            Self::Power => "power",
            Self::FuelType => "fuelType",
            Self::SellerType => "sellerType",
        }
    }

    /// Keys that accept a min/max pair
    pub fn is_range(&self) -> bool {
        matches!(
            self,
            Self::Price | Self::Mileage | Self::YearOfManufacture | Self::Power
        )
    }
}

impl fmt::Display for SearchKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Comparison applied to a column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", tag = "op", content = "value")]
pub enum SearchValue {
    EqualToString(String),
    EqualToInt(i64),
    GreaterOrEqualTo(i64),
    LessOrEqualTo(i64),
}

/// Which side of a range a predicate represents
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    #[default]
    Exact,
    Min,
    Max,
}

/// A single filter predicate
///
/// Equality and hashing only consider `key` and `value`; `value_type` is a tag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchParam {
    key: SearchKey,
    value: SearchValue,
    #[serde(default)]
    value_type: ValueType,
}

impl SearchParam {
    /// Tags are taken as given; outside the crate use `min`, `max` or `equal_to_*`
    pub(crate) fn new(key: SearchKey, value: SearchValue, value_type: ValueType) -> Self {
        Self {
            key,
            value,
            value_type,
        }
    }

    /// `key = 'value'`
    pub fn equal_to_string(key: SearchKey, value: impl Into<String>) -> Self {
        Self::new(key, SearchValue::EqualToString(value.into()), ValueType::Exact)
    }

    /// `key = value`
    pub fn equal_to_int(key: SearchKey, value: i64) -> Self {
        Self::new(key, SearchValue::EqualToInt(value), ValueType::Exact)
    }

    /// Lower bound of a range, `key >= value`
    pub fn min(key: SearchKey, value: i64) -> Self {
        Self::new(key, SearchValue::GreaterOrEqualTo(value), ValueType::Min)
    }

    /// Upper bound of a range, `key <= value`
    pub fn max(key: SearchKey, value: i64) -> Self {
        Self::new(key, SearchValue::LessOrEqualTo(value), ValueType::Max)
    }

    pub fn key(&self) -> SearchKey {
        self.key
    }

    pub fn value(&self) -> &SearchValue {
        &self.value
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Whether this is one edge of a range on a range-capable key
    fn is_range_edge(&self) -> bool {
        self.key.is_range() && self.value_type != ValueType::Exact
    }
}

impl PartialEq for SearchParam {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }
}

impl Eq for SearchParam {}

impl Hash for SearchParam {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
        self.value.hash(state);
    }
}

/// Search request descriptor: paging plus the conjoined predicates
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SearchParams {
    pub page_size: u32,
    pub offset: u32,
    params: Vec<SearchParam>,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            page_size: crate::DEFAULT_PAGE_SIZE,
            offset: 0,
            params: Vec::new(),
        }
    }
}

impl SearchParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a list of predicates, applying the insert rules to each
    pub fn from_params(params: impl IntoIterator<Item = SearchParam>) -> Self {
        let mut search = Self::new();
        for param in params {
            search.insert(param);
        }
        search
    }

    /// Set page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Set offset
    pub fn with_offset(mut self, offset: u32) -> Self {
        self.offset = offset;
        self
    }

    /// Add a predicate.
    ///
    /// A range edge replaces the existing edge of the same key and side in
    /// place, and a predicate equal to one already present is ignored. Returns
    /// `false` when nothing changed.
    pub fn insert(&mut self, param: SearchParam) -> bool {
        if param.is_range_edge() {
            if let Some(existing) = self
                .params
                .iter_mut()
                .find(|p| p.key == param.key && p.value_type == param.value_type)
            {
                if *existing == param {
                    return false;
                }
                *existing = param;
                return true;
            }
        }

        if self.params.contains(&param) {
            return false;
        }

        self.params.push(param);
        true
    }

    /// Drop every predicate on `key`
    pub fn remove_key(&mut self, key: SearchKey) {
        self.params.retain(|p| p.key != key);
    }

    /// Predicates in insertion order
    pub fn params(&self) -> &[SearchParam] {
        &self.params
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_equality_ignores_value_type() {
        let a = SearchParam::new(SearchKey::Price, SearchValue::GreaterOrEqualTo(10), ValueType::Min);
        let b = SearchParam::new(SearchKey::Price, SearchValue::GreaterOrEqualTo(10), ValueType::Exact);
        assert_eq!(a, b);

        let set: HashSet<_> = [a, b].into_iter().collect();
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_constructors_tag_their_side() {
        assert_eq!(SearchParam::min(SearchKey::Power, 100).value_type(), ValueType::Min);
        assert_eq!(SearchParam::max(SearchKey::Power, 300).value_type(), ValueType::Max);
        assert_eq!(
            SearchParam::equal_to_int(SearchKey::Power, 190).value_type(),
            ValueType::Exact
        );

        let mut params = SearchParams::new();
        params.insert(SearchParam::min(SearchKey::Power, 100));
        params.insert(SearchParam::max(SearchKey::Power, 300));
        params.insert(SearchParam::max(SearchKey::Power, 250));
        assert_eq!(
            params.params(),
            &[
                SearchParam::min(SearchKey::Power, 100),
                SearchParam::max(SearchKey::Power, 250),
            ]
        );
    }

    #[test]
    fn test_defaults() {
        let params = SearchParams::default();
        assert_eq!(params.page_size, 3);
        assert_eq!(params.offset, 0);
        assert!(params.is_empty());
    }

    #[test]
    fn test_range_edge_replaced_in_place() {
        let mut params = SearchParams::new();
        params.insert(SearchParam::min(SearchKey::Price, 1_000));
        params.insert(SearchParam::equal_to_string(SearchKey::TransportName, "BMW"));
        assert!(params.insert(SearchParam::min(SearchKey::Price, 2_000)));

        assert_eq!(params.len(), 2);
        assert_eq!(params.params()[0], SearchParam::min(SearchKey::Price, 2_000));
    }

    #[test]
    fn test_min_and_max_coexist() {
        let params = SearchParams::from_params([
            SearchParam::min(SearchKey::Mileage, 10_000),
            SearchParam::max(SearchKey::Mileage, 50_000),
        ]);
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_duplicate_ignored() {
        let mut params = SearchParams::new();
        assert!(params.insert(SearchParam::equal_to_string(SearchKey::BodyType, "Sedan")));
        assert!(!params.insert(SearchParam::equal_to_string(SearchKey::BodyType, "Sedan")));
        assert!(params.insert(SearchParam::equal_to_string(SearchKey::BodyType, "Wagon")));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_remove_key() {
        let mut params = SearchParams::from_params([
            SearchParam::min(SearchKey::Power, 100),
            SearchParam::max(SearchKey::Power, 300),
            SearchParam::equal_to_string(SearchKey::FuelType, "Diesel"),
        ]);
        params.remove_key(SearchKey::Power);
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_page_size_floor() {
        let params = SearchParams::new().with_page_size(0).with_offset(6);
        assert_eq!(params.page_size, 1);
        assert_eq!(params.offset, 6);
    }
}
