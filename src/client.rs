//! High-level searchd client.
//!
//! [`Client`] owns the daemon address, the connection timeout and the batch
//! of queries waiting to be sent. Each public call opens exactly one
//! connection, performs one request/response exchange and closes it again.
//!
//! A client is not meant to be shared between threads while a batch is being
//! assembled; use one client per logical session.
//!
//! # Example
//! ```no_run
//! use sphx::{Client, QuerySpec};
//!
//! let mut client = Client::new("localhost", 3312).unwrap();
//! let spec = QuerySpec::builder().limits(0, 20, 1000, 0).build().unwrap();
//!
//! client.add_query(&spec, "wifi", "test1", "").unwrap();
//! client.add_query(&spec, "gsm", "test1", "").unwrap();
//!
//! for result in client.run_queries().unwrap() {
//!     println!("{result}");
//! }
//! ```
use std::time::Duration;

use log::{debug, info};

use crate::{
    AttributeUpdate, ClientError, ExcerptOptions, Keyword, QuerySpec, ResultSet,
    error::ensure,
    protocol::{
        CommandKind, DEFAULT_TIMEOUT, Reply, execute,
        request::{self, Batch},
        response,
    },
};

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 3312;

#[derive(Debug, Clone)]
pub struct Client {
    host: String,
    port: u16,
    timeout: Duration,
    batch: Batch,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            batch: Batch::new(),
        }
    }
}

impl Client {
    pub fn new(host: impl Into<String>, port: u32) -> Result<Self, ClientError> {
        let mut client = Self::default();
        client.set_server(host, port)?;
        Ok(client)
    }

    /// Points the client at another daemon. The port is checked against
    /// 1..=65535 before anything is changed.
    pub fn set_server(&mut self, host: impl Into<String>, port: u32) -> Result<(), ClientError> {
        let host = host.into();
        ensure(!host.is_empty(), "host name must not be empty")?;
        ensure(
            (1..=65535).contains(&port),
            "port must be in 1..65535 range",
        )?;

        self.host = host;
        self.port = port as u16;
        Ok(())
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Number of queries waiting for [`run_queries`](Self::run_queries).
    pub fn pending(&self) -> usize {
        self.batch.len()
    }

    fn execute(&self, kind: CommandKind, payload: &[u8]) -> Result<Reply, ClientError> {
        execute(&self.host, self.port, self.timeout, kind, payload)
    }

    /// Queues a query and returns its position in the next batch.
    pub fn add_query(
        &mut self,
        spec: &QuerySpec,
        query: &str,
        index: &str,
        comment: &str,
    ) -> Result<usize, ClientError> {
        let encoded = request::encode_query(spec, query, index, comment);
        let position = self.batch.push(encoded);
        debug!("queued query #{position} against '{index}'");
        Ok(position)
    }

    /// Sends every queued query in one request and returns their results in
    /// the order they were added.
    ///
    /// Queued queries are dropped as soon as the request is built, whether
    /// or not the call succeeds, so a batch runs only once.
    pub fn run_queries(&mut self) -> Result<Vec<ResultSet>, ClientError> {
        let payload = self.batch.encode()?;
        let count = self.batch.len();
        self.batch.clear();

        let reply = self.execute(CommandKind::Search, &payload)?;

        let mut results = response::decode_search(&reply.payload, count)?;
        if let Some(warning) = reply.warning {
            for result in results.iter_mut().filter(|r| r.warning.is_none()) {
                result.warning = Some(warning.clone());
            }
        }
        info!("ran {count} queries against {}:{}", self.host, self.port);
        Ok(results)
    }

    /// Runs a single query. Fails if other queries are already queued.
    pub fn query(
        &mut self,
        spec: &QuerySpec,
        query: &str,
        index: &str,
    ) -> Result<ResultSet, ClientError> {
        ensure(
            self.batch.is_empty(),
            "add_query() and query() can not be combined; use run_queries() instead",
        )?;

        self.add_query(spec, query, index, "")?;
        self.run_queries()?
            .into_iter()
            .next()
            .ok_or(ClientError::IncompleteReply)
    }

    /// Generates one snippet per document, highlighting `words`.
    pub fn build_excerpts(
        &self,
        docs: &[String],
        index: &str,
        words: &str,
        opts: &ExcerptOptions,
    ) -> Result<Vec<String>, ClientError> {
        ensure(!docs.is_empty(), "build_excerpts: have no documents to process")?;
        ensure(
            !index.is_empty(),
            "build_excerpts: have no index to process documents",
        )?;
        ensure(!words.is_empty(), "build_excerpts: have no words to highlight")?;

        let payload = request::encode_excerpts(docs, index, words, opts);
        let reply = self.execute(CommandKind::Excerpt, &payload)?;
        response::decode_excerpts(&reply.payload, docs.len())
    }

    /// Applies attribute updates and returns how many documents were changed.
    pub fn update_attributes(&self, update: &AttributeUpdate) -> Result<u32, ClientError> {
        update.validate()?;

        let payload = request::encode_update(update);
        let reply = self.execute(CommandKind::Update, &payload)?;
        response::decode_update(&reply.payload)
    }

    /// Splits a query into keywords, optionally with per-keyword statistics.
    pub fn build_keywords(
        &self,
        query: &str,
        index: &str,
        hits: bool,
    ) -> Result<Vec<Keyword>, ClientError> {
        let payload = request::encode_keywords(query, index, hits);
        let reply = self.execute(CommandKind::Keywords, &payload)?;
        response::decode_keywords(&reply.payload, hits)
    }
}
