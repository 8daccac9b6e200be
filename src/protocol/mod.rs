//! searchd wire protocol.
//!
//! This module defines how the client talks to a searchd daemon: the
//! version handshake, request/response framing, and the payload codecs
//! for every supported command.
//!
//! # Overview
//!
//! Every public client call is one round trip over a fresh TCP connection:
//!
//! 1. The daemon sends its 4-byte protocol version, the client answers with
//!    its own major version.
//! 2. The client sends a request frame: command id, command version,
//!    payload length, payload.
//! 3. The daemon answers with a response frame: status, version, payload
//!    length, payload.
//!
//! # Binary Format
//!
//! - All integers are big-endian.
//! - Strings are a 4-byte length followed by that many UTF-8 bytes; a zero
//!   length stands for both the empty and the absent string.
//! - "dwords" are 4-byte integers the daemon means as unsigned.
//!
//! # Key Components
//!
//! - [`ProtocolTransport`]: handshake and framing over any `Read + Write` stream.
//! - [`request`]: query encoder, batch builder and auxiliary request encoders.
//! - [`response`]: search result and auxiliary reply decoders.
mod transport;
mod wire;

pub mod request;
pub mod response;

pub use transport::{DEFAULT_TIMEOUT, ProtocolTransport, Reply, execute};
pub use wire::{PacketReader, PacketWriter};

/// Major protocol version the client announces during the handshake.
pub const VER_MAJOR_PROTO: u32 = 0x1;

/// Marks a multi-valued attribute in a schema type code.
pub const ATTR_MULTI: u32 = 0x4000_0000;

/// Commands understood by searchd, each with its own payload version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    Search,
    Excerpt,
    Update,
    Keywords,
}

impl CommandKind {
    pub fn id(self) -> u16 {
        match self {
            CommandKind::Search => 0,
            CommandKind::Excerpt => 1,
            CommandKind::Update => 2,
            CommandKind::Keywords => 3,
        }
    }

    pub fn version(self) -> u16 {
        match self {
            CommandKind::Search => 0x116,
            CommandKind::Excerpt => 0x100,
            CommandKind::Update => 0x102,
            CommandKind::Keywords => 0x100,
        }
    }
}

/// Reply status, used both for whole frames and for each batched query.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Status {
    #[default]
    Ok,
    Error,
    Retry,
    Warning,
    Unknown(u32),
}

impl From<u32> for Status {
    fn from(value: u32) -> Self {
        match value {
            0 => Status::Ok,
            1 => Status::Error,
            2 => Status::Retry,
            3 => Status::Warning,
            code => Status::Unknown(code),
        }
    }
}

impl From<Status> for u32 {
    fn from(value: Status) -> Self {
        match value {
            Status::Ok => 0,
            Status::Error => 1,
            Status::Retry => 2,
            Status::Warning => 3,
            Status::Unknown(code) => code,
        }
    }
}
