pub mod cli;
pub mod client;
pub mod command;
pub mod error;
pub mod excerpt;
pub mod protocol;
pub mod query;
pub mod result;
pub mod update;

pub use cli::prompt;
pub use client::Client;
pub use command::{Command, CommandError};
pub use error::ClientError;
pub use excerpt::ExcerptOptions;
pub use query::{
    Filter, FilterKind, GeoAnchor, GroupFunc, MatchMode, Override, OverrideValues, QuerySpec,
    QuerySpecBuilder, RankingMode, SortMode,
};
pub use result::{AttrKind, AttrType, AttrValue, Attribute, Keyword, Match, ResultSet, WordInfo};
pub use update::{AttributeUpdate, UpdateEntry, UpdateValues};
