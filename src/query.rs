//! Search query parameters.
//!
//! A [`QuerySpec`] is an immutable description of everything the daemon needs
//! besides the query text and index list: pagination, match/rank/sort modes,
//! filters, grouping, geo anchor, weights, overrides and the select list.
//!
//! Specs are assembled with [`QuerySpecBuilder`], which validates every
//! parameter in [`QuerySpecBuilder::build`] so that invalid input is rejected
//! before any connection is made.
//!
//! # Example
//! ```rust
//! use sphx::{Filter, MatchMode, QuerySpec, SortMode};
//!
//! let spec = QuerySpec::builder()
//!     .limits(0, 20, 1000, 0)
//!     .match_mode(MatchMode::Extended2)
//!     .sort(SortMode::AttrDesc, "created_at")
//!     .filter(Filter::values("group_id", vec![1, 2]))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(spec.limit, 20);
//! ```
use std::collections::{BTreeMap, HashMap};

use crate::{ClientError, error::ensure};

/// How query words are matched against documents.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchMode {
    #[default]
    All,
    Any,
    Phrase,
    Boolean,
    Extended,
    Fullscan,
    Extended2,
}

impl From<MatchMode> for u32 {
    fn from(value: MatchMode) -> Self {
        match value {
            MatchMode::All => 0,
            MatchMode::Any => 1,
            MatchMode::Phrase => 2,
            MatchMode::Boolean => 3,
            MatchMode::Extended => 4,
            MatchMode::Fullscan => 5,
            MatchMode::Extended2 => 6,
        }
    }
}

/// Server side relevance ranker; only honoured in extended2 mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RankingMode {
    #[default]
    ProximityBm25,
    Bm25,
    None,
    WordCount,
    Proximity,
    MatchAny,
    FieldMask,
}

impl From<RankingMode> for u32 {
    fn from(value: RankingMode) -> Self {
        match value {
            RankingMode::ProximityBm25 => 0,
            RankingMode::Bm25 => 1,
            RankingMode::None => 2,
            RankingMode::WordCount => 3,
            RankingMode::Proximity => 4,
            RankingMode::MatchAny => 5,
            RankingMode::FieldMask => 6,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortMode {
    #[default]
    Relevance,
    AttrDesc,
    AttrAsc,
    TimeSegments,
    Extended,
    Expr,
}

impl From<SortMode> for u32 {
    fn from(value: SortMode) -> Self {
        match value {
            SortMode::Relevance => 0,
            SortMode::AttrDesc => 1,
            SortMode::AttrAsc => 2,
            SortMode::TimeSegments => 3,
            SortMode::Extended => 4,
            SortMode::Expr => 5,
        }
    }
}

/// Function applied to the group-by attribute to derive the group key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum GroupFunc {
    #[default]
    Day,
    Week,
    Month,
    Year,
    Attr,
    AttrPair,
}

impl From<GroupFunc> for u32 {
    fn from(value: GroupFunc) -> Self {
        match value {
            GroupFunc::Day => 0,
            GroupFunc::Week => 1,
            GroupFunc::Month => 2,
            GroupFunc::Year => 3,
            GroupFunc::Attr => 4,
            GroupFunc::AttrPair => 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterKind {
    /// Match when the attribute equals one of the values.
    Values(Vec<i64>),
    /// Inclusive integer range.
    Range { min: i64, max: i64 },
    /// Inclusive float range.
    FloatRange { min: f32, max: f32 },
}

impl FilterKind {
    pub(crate) fn tag(&self) -> u32 {
        match self {
            FilterKind::Values(_) => 0,
            FilterKind::Range { .. } => 1,
            FilterKind::FloatRange { .. } => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub attribute: String,
    pub kind: FilterKind,
    pub exclude: bool,
}

impl Filter {
    pub fn values(attribute: impl Into<String>, values: Vec<i64>) -> Self {
        Self {
            attribute: attribute.into(),
            kind: FilterKind::Values(values),
            exclude: false,
        }
    }

    pub fn range(attribute: impl Into<String>, min: i64, max: i64) -> Self {
        Self {
            attribute: attribute.into(),
            kind: FilterKind::Range { min, max },
            exclude: false,
        }
    }

    pub fn float_range(attribute: impl Into<String>, min: f32, max: f32) -> Self {
        Self {
            attribute: attribute.into(),
            kind: FilterKind::FloatRange { min, max },
            exclude: false,
        }
    }

    /// Inverts the filter: matching documents are dropped instead of kept.
    pub fn exclude(mut self) -> Self {
        self.exclude = true;
        self
    }

    fn validate(&self) -> Result<(), ClientError> {
        ensure(
            !self.attribute.is_empty(),
            "attribute name must not be null or empty",
        )?;
        match &self.kind {
            FilterKind::Values(values) => {
                ensure(!values.is_empty(), "values array must not be null or empty")
            }
            FilterKind::Range { min, max } => {
                ensure(min <= max, "min must be less or equal to max")
            }
            FilterKind::FloatRange { min, max } => {
                ensure(min <= max, "min must be less or equal to max")
            }
        }
    }
}

/// Point that `@geodist` is measured from, in radians.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoAnchor {
    pub latitude_attr: String,
    pub longitude_attr: String,
    pub latitude: f32,
    pub longitude: f32,
}

/// Replacement attribute values, keyed by document id.
#[derive(Debug, Clone, PartialEq)]
pub enum OverrideValues {
    Integer(BTreeMap<u64, u32>),
    Timestamp(BTreeMap<u64, u32>),
    Bool(BTreeMap<u64, bool>),
    Float(BTreeMap<u64, f32>),
    BigInt(BTreeMap<u64, i64>),
}

impl OverrideValues {
    /// Attribute type code the daemon checks the override against.
    pub fn type_code(&self) -> u32 {
        match self {
            OverrideValues::Integer(_) => 1,
            OverrideValues::Timestamp(_) => 2,
            OverrideValues::Bool(_) => 4,
            OverrideValues::Float(_) => 5,
            OverrideValues::BigInt(_) => 6,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            OverrideValues::Integer(v) | OverrideValues::Timestamp(v) => v.len(),
            OverrideValues::Bool(v) => v.len(),
            OverrideValues::Float(v) => v.len(),
            OverrideValues::BigInt(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Query-time substitution of an attribute's value for specific documents.
#[derive(Debug, Clone, PartialEq)]
pub struct Override {
    pub attribute: String,
    pub values: OverrideValues,
}

/// Immutable set of search parameters for one query.
#[derive(Debug, Clone, PartialEq)]
pub struct QuerySpec {
    pub offset: u32,
    pub limit: u32,
    pub max_matches: u32,
    pub cutoff: u32,
    pub match_mode: MatchMode,
    pub ranking_mode: RankingMode,
    pub sort_mode: SortMode,
    pub sort_by: String,
    /// Deprecated positional field weights.
    pub weights: Vec<u32>,
    pub min_id: u32,
    pub max_id: u32,
    pub filters: Vec<Filter>,
    pub group_by: String,
    pub group_func: GroupFunc,
    pub group_sort: String,
    pub group_distinct: String,
    pub retry_count: u32,
    pub retry_delay: u32,
    pub geo_anchor: Option<GeoAnchor>,
    pub index_weights: BTreeMap<String, u32>,
    /// Per-index search time limit in milliseconds, 0 for none.
    pub max_query_time: u32,
    pub field_weights: BTreeMap<String, u32>,
    pub overrides: Vec<Override>,
    pub select: String,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 20,
            max_matches: 1000,
            cutoff: 0,
            match_mode: MatchMode::All,
            ranking_mode: RankingMode::ProximityBm25,
            sort_mode: SortMode::Relevance,
            sort_by: String::new(),
            weights: Vec::new(),
            min_id: 0,
            max_id: u32::MAX,
            filters: Vec::new(),
            group_by: String::new(),
            group_func: GroupFunc::Day,
            group_sort: "@group desc".to_string(),
            group_distinct: String::new(),
            retry_count: 0,
            retry_delay: 0,
            geo_anchor: None,
            index_weights: BTreeMap::new(),
            max_query_time: 0,
            field_weights: BTreeMap::new(),
            overrides: Vec::new(),
            select: "*".to_string(),
        }
    }
}

impl QuerySpec {
    pub fn builder() -> QuerySpecBuilder {
        QuerySpecBuilder::default()
    }

    /// Returns a builder seeded with this spec, for deriving variants.
    pub fn to_builder(&self) -> QuerySpecBuilder {
        QuerySpecBuilder { spec: self.clone() }
    }

    fn validate(&self) -> Result<(), ClientError> {
        ensure(self.limit > 0, "limit must be positive")?;
        ensure(self.max_matches > 0, "max must be positive")?;
        ensure(
            self.sort_mode == SortMode::Relevance || !self.sort_by.is_empty(),
            "sortby string must not be empty in selected mode",
        )?;
        ensure(
            self.weights.iter().all(|w| *w > 0),
            "all weights must be greater than 0",
        )?;
        ensure(
            self.min_id <= self.max_id,
            "min must be less or equal to max",
        )?;
        for filter in &self.filters {
            filter.validate()?;
        }
        if let Some(anchor) = &self.geo_anchor {
            ensure(
                !anchor.latitude_attr.is_empty(),
                "latitudeAttr string must not be null or empty",
            )?;
            ensure(
                !anchor.longitude_attr.is_empty(),
                "longitudeAttr string must not be null or empty",
            )?;
        }
        for item in &self.overrides {
            ensure(!item.attribute.is_empty(), "attrName must not be empty")?;
            ensure(!item.values.is_empty(), "values must be not empty")?;
        }
        ensure(!self.select.is_empty(), "select must be not empty")
    }
}

/// Assembles a [`QuerySpec`]; every setter overwrites the previous value
/// except [`filter`](Self::filter), which appends.
#[derive(Debug, Clone, Default)]
pub struct QuerySpecBuilder {
    spec: QuerySpec,
}

impl QuerySpecBuilder {
    /// Offset and limit returned to the client, server-side match cap and cutoff.
    pub fn limits(mut self, offset: u32, limit: u32, max_matches: u32, cutoff: u32) -> Self {
        self.spec.offset = offset;
        self.spec.limit = limit;
        self.spec.max_matches = max_matches;
        self.spec.cutoff = cutoff;
        self
    }

    pub fn max_query_time(mut self, millis: u32) -> Self {
        self.spec.max_query_time = millis;
        self
    }

    pub fn match_mode(mut self, mode: MatchMode) -> Self {
        self.spec.match_mode = mode;
        self
    }

    pub fn ranking_mode(mut self, ranker: RankingMode) -> Self {
        self.spec.ranking_mode = ranker;
        self
    }

    pub fn sort(mut self, mode: SortMode, sort_by: impl Into<String>) -> Self {
        self.spec.sort_mode = mode;
        self.spec.sort_by = sort_by.into();
        self
    }

    pub fn weights(mut self, weights: Vec<u32>) -> Self {
        self.spec.weights = weights;
        self
    }

    pub fn field_weights(mut self, weights: HashMap<String, u32>) -> Self {
        self.spec.field_weights = weights.into_iter().collect();
        self
    }

    pub fn field_weight(mut self, field: impl Into<String>, weight: u32) -> Self {
        self.spec.field_weights.insert(field.into(), weight);
        self
    }

    pub fn index_weight(mut self, index: impl Into<String>, weight: u32) -> Self {
        self.spec.index_weights.insert(index.into(), weight);
        self
    }

    pub fn id_range(mut self, min: u32, max: u32) -> Self {
        self.spec.min_id = min;
        self.spec.max_id = max;
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.spec.filters.push(filter);
        self
    }

    pub fn geo_anchor(
        mut self,
        latitude_attr: impl Into<String>,
        longitude_attr: impl Into<String>,
        latitude: f32,
        longitude: f32,
    ) -> Self {
        self.spec.geo_anchor = Some(GeoAnchor {
            latitude_attr: latitude_attr.into(),
            longitude_attr: longitude_attr.into(),
            latitude,
            longitude,
        });
        self
    }

    pub fn group_by(mut self, attribute: impl Into<String>, func: GroupFunc) -> Self {
        self.spec.group_by = attribute.into();
        self.spec.group_func = func;
        self
    }

    pub fn group_sort(mut self, sort: impl Into<String>) -> Self {
        self.spec.group_sort = sort.into();
        self
    }

    pub fn group_distinct(mut self, attribute: impl Into<String>) -> Self {
        self.spec.group_distinct = attribute.into();
        self
    }

    /// Distributed retry count and delay, forwarded to the daemon as-is.
    pub fn retries(mut self, count: u32, delay: u32) -> Self {
        self.spec.retry_count = count;
        self.spec.retry_delay = delay;
        self
    }

    /// Sets the override for an attribute, replacing an earlier one in place.
    pub fn override_values(mut self, attribute: impl Into<String>, values: OverrideValues) -> Self {
        let attribute = attribute.into();
        match self
            .spec
            .overrides
            .iter_mut()
            .find(|o| o.attribute == attribute)
        {
            Some(existing) => existing.values = values,
            None => self.spec.overrides.push(Override { attribute, values }),
        }
        self
    }

    pub fn select(mut self, select: impl Into<String>) -> Self {
        self.spec.select = select.into();
        self
    }

    pub fn build(self) -> Result<QuerySpec, ClientError> {
        self.spec.validate()?;
        Ok(self.spec)
    }
}
