//! Decoded replies.
use std::fmt;

use crate::protocol::{ATTR_MULTI, Status};

/// Base type of an attribute as reported in a result schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrKind {
    Integer,
    Timestamp,
    Ordinal,
    Bool,
    Float,
    BigInt,
    /// A code this client does not know; values read as plain dwords.
    Other(u32),
}

impl From<u32> for AttrKind {
    fn from(value: u32) -> Self {
        match value {
            1 => AttrKind::Integer,
            2 => AttrKind::Timestamp,
            3 => AttrKind::Ordinal,
            4 => AttrKind::Bool,
            5 => AttrKind::Float,
            6 => AttrKind::BigInt,
            code => AttrKind::Other(code),
        }
    }
}

impl From<AttrKind> for u32 {
    fn from(value: AttrKind) -> Self {
        match value {
            AttrKind::Integer => 1,
            AttrKind::Timestamp => 2,
            AttrKind::Ordinal => 3,
            AttrKind::Bool => 4,
            AttrKind::Float => 5,
            AttrKind::BigInt => 6,
            AttrKind::Other(code) => code,
        }
    }
}

/// Attribute type, decoded once per schema entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrType {
    Scalar(AttrKind),
    /// Array of dwords (MVA).
    Multi(AttrKind),
}

impl From<u32> for AttrType {
    fn from(value: u32) -> Self {
        let kind = AttrKind::from(value & !ATTR_MULTI);
        if value & ATTR_MULTI != 0 {
            AttrType::Multi(kind)
        } else {
            AttrType::Scalar(kind)
        }
    }
}

impl From<AttrType> for u32 {
    fn from(value: AttrType) -> Self {
        match value {
            AttrType::Scalar(kind) => kind.into(),
            AttrType::Multi(kind) => u32::from(kind) | ATTR_MULTI,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub ty: AttrType,
}

/// One attribute value of a match, typed per the schema.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    Uint(u32),
    BigInt(i64),
    Float(f32),
    Multi(Vec<u32>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Uint(v) => write!(f, "{v}"),
            AttrValue::BigInt(v) => write!(f, "{v}"),
            AttrValue::Float(v) => write!(f, "{v}"),
            AttrValue::Multi(values) => {
                let values = values.iter().map(u32::to_string).collect::<Vec<_>>();
                write!(f, "({})", values.join(","))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub doc_id: u64,
    pub weight: i32,
    /// Values in schema order.
    pub values: Vec<AttrValue>,
}

/// Per-keyword statistics for a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordInfo {
    pub word: String,
    pub docs: u32,
    pub hits: u32,
}

/// Result of one query in a batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub status: Status,
    pub warning: Option<String>,
    pub error: Option<String>,
    pub fields: Vec<String>,
    pub attrs: Vec<Attribute>,
    pub matches: Vec<Match>,
    pub total: u32,
    pub total_found: u32,
    /// Search time in seconds.
    pub time: f32,
    pub words: Vec<WordInfo>,
}

impl ResultSet {
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    pub fn attr_names(&self) -> Vec<&str> {
        self.attrs.iter().map(|a| a.name.as_str()).collect()
    }

    /// Looks up a match's attribute value by schema name.
    pub fn value<'a>(&self, m: &'a Match, name: &str) -> Option<&'a AttrValue> {
        let idx = self.attrs.iter().position(|a| a.name == name)?;
        m.values.get(idx)
    }
}

impl fmt::Display for ResultSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(error) = &self.error {
            return write!(f, "error: {error}");
        }
        if let Some(warning) = &self.warning {
            writeln!(f, "warning: {warning}")?;
        }
        writeln!(
            f,
            "{} of {} matches in {:.3} sec",
            self.total, self.total_found, self.time
        )?;
        for m in &self.matches {
            write!(f, "id={} weight={}", m.doc_id, m.weight)?;
            for (attr, value) in self.attrs.iter().zip(&m.values) {
                write!(f, " {}={value}", attr.name)?;
            }
            writeln!(f)?;
        }
        for w in &self.words {
            writeln!(f, "'{}' found {} times in {} documents", w.word, w.hits, w.docs)?;
        }
        Ok(())
    }
}

/// One keyword reported by a keyword extraction request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Keyword {
    pub tokenized: String,
    pub normalized: String,
    /// Present only when hit statistics were requested.
    pub docs: Option<u32>,
    pub hits: Option<u32>,
}
