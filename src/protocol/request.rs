//! Request payload encoders.
use crate::{
    AttributeUpdate, ClientError, ExcerptOptions, QuerySpec,
    query::{FilterKind, OverrideValues},
    update::UpdateValues,
};

use super::PacketWriter;

/// Serializes a single search query.
pub fn encode_query(spec: &QuerySpec, query: &str, index: &str, comment: &str) -> Vec<u8> {
    let mut out = PacketWriter::new();

    out.put_u32(spec.offset);
    out.put_u32(spec.limit);
    out.put_u32(spec.match_mode.into());
    out.put_u32(spec.ranking_mode.into());
    out.put_u32(spec.sort_mode.into());
    out.put_str(&spec.sort_by);
    out.put_str(query);

    out.put_u32(spec.weights.len() as u32);
    for weight in &spec.weights {
        out.put_u32(*weight);
    }

    out.put_str(index);
    // 32-bit id range marker
    out.put_u32(0);
    out.put_u32(spec.min_id);
    out.put_u32(spec.max_id);

    out.put_u32(spec.filters.len() as u32);
    for filter in &spec.filters {
        out.put_str(&filter.attribute);
        out.put_u32(filter.kind.tag());
        match &filter.kind {
            FilterKind::Values(values) => {
                out.put_u32(values.len() as u32);
                for value in values {
                    out.put_i64(*value);
                }
            }
            FilterKind::Range { min, max } => {
                out.put_i64(*min);
                out.put_i64(*max);
            }
            FilterKind::FloatRange { min, max } => {
                out.put_f32(*min);
                out.put_f32(*max);
            }
        }
        out.put_bool(filter.exclude);
    }

    out.put_u32(spec.group_func.into());
    out.put_str(&spec.group_by);
    out.put_u32(spec.max_matches);
    out.put_str(&spec.group_sort);
    out.put_u32(spec.cutoff);
    out.put_u32(spec.retry_count);
    out.put_u32(spec.retry_delay);
    out.put_str(&spec.group_distinct);

    match &spec.geo_anchor {
        Some(anchor) => {
            out.put_u32(1);
            out.put_str(&anchor.latitude_attr);
            out.put_str(&anchor.longitude_attr);
            out.put_f32(anchor.latitude);
            out.put_f32(anchor.longitude);
        }
        None => out.put_u32(0),
    }

    out.put_u32(spec.index_weights.len() as u32);
    for (name, weight) in &spec.index_weights {
        out.put_str(name);
        out.put_u32(*weight);
    }

    out.put_u32(spec.max_query_time);

    out.put_u32(spec.field_weights.len() as u32);
    for (name, weight) in &spec.field_weights {
        out.put_str(name);
        out.put_u32(*weight);
    }

    out.put_str(comment);

    out.put_u32(spec.overrides.len() as u32);
    for item in &spec.overrides {
        out.put_str(&item.attribute);
        out.put_u32(item.values.type_code());
        out.put_u32(item.values.len() as u32);
        match &item.values {
            OverrideValues::Integer(values) | OverrideValues::Timestamp(values) => {
                for (id, value) in values {
                    out.put_u64(*id);
                    out.put_u32(*value);
                }
            }
            OverrideValues::Bool(values) => {
                for (id, value) in values {
                    out.put_u64(*id);
                    out.put_bool(*value);
                }
            }
            OverrideValues::Float(values) => {
                for (id, value) in values {
                    out.put_u64(*id);
                    out.put_f32(*value);
                }
            }
            OverrideValues::BigInt(values) => {
                for (id, value) in values {
                    out.put_u64(*id);
                    out.put_i64(*value);
                }
            }
        }
    }

    out.put_str(&spec.select);
    out.into_inner()
}

/// Encoded queries waiting to be sent as one multi-query request.
#[derive(Debug, Default, Clone)]
pub struct Batch {
    queries: Vec<Vec<u8>>,
}

impl Batch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an encoded query and returns its position in the batch.
    pub fn push(&mut self, query: Vec<u8>) -> usize {
        self.queries.push(query);
        self.queries.len() - 1
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }

    /// Count prefix followed by every queued query, in the order added.
    pub fn encode(&self) -> Result<Vec<u8>, ClientError> {
        if self.queries.is_empty() {
            return Err(ClientError::validation(
                "no queries defined, issue add_query() first",
            ));
        }

        let mut out = PacketWriter::new();
        out.put_u32(self.queries.len() as u32);
        for query in &self.queries {
            out.put_raw(query);
        }
        Ok(out.into_inner())
    }
}

pub fn encode_excerpts(
    docs: &[String],
    index: &str,
    words: &str,
    opts: &ExcerptOptions,
) -> Vec<u8> {
    let mut out = PacketWriter::new();

    // mode
    out.put_u32(0);
    out.put_u32(opts.flags());
    out.put_str(index);
    out.put_str(words);

    out.put_str(&opts.before_match);
    out.put_str(&opts.after_match);
    out.put_str(&opts.chunk_separator);
    out.put_u32(opts.limit);
    out.put_u32(opts.around);

    out.put_u32(docs.len() as u32);
    for doc in docs {
        out.put_str(doc);
    }
    out.into_inner()
}

pub fn encode_update(update: &AttributeUpdate) -> Vec<u8> {
    let mut out = PacketWriter::new();

    out.put_str(&update.index);
    out.put_u32(update.attrs.len() as u32);
    for attr in &update.attrs {
        out.put_str(attr);
        out.put_bool(update.multi);
    }

    out.put_u32(update.entries.len() as u32);
    for entry in &update.entries {
        out.put_u64(entry.doc_id);
        match &entry.values {
            UpdateValues::Scalar(values) => {
                for value in values {
                    out.put_i32(*value as i32);
                }
            }
            UpdateValues::Multi(arrays) => {
                for values in arrays {
                    out.put_u32(values.len() as u32);
                    for value in values {
                        out.put_u32(*value);
                    }
                }
            }
        }
    }
    out.into_inner()
}

pub fn encode_keywords(query: &str, index: &str, hits: bool) -> Vec<u8> {
    let mut out = PacketWriter::new();
    out.put_str(query);
    out.put_str(index);
    out.put_bool(hits);
    out.into_inner()
}
