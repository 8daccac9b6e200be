use std::io::{self, Cursor};

use byteorder::{BigEndian, ByteOrder, ReadBytesExt};

use crate::ClientError;

/// Growable big-endian payload buffer.
#[derive(Debug, Default, Clone)]
pub struct PacketWriter {
    buf: Vec<u8>,
}

impl PacketWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_u32(&mut self, value: u32) {
        let mut b = [0; 4];
        BigEndian::write_u32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_i32(&mut self, value: i32) {
        let mut b = [0; 4];
        BigEndian::write_i32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_u64(&mut self, value: u64) {
        let mut b = [0; 8];
        BigEndian::write_u64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_i64(&mut self, value: i64) {
        let mut b = [0; 8];
        BigEndian::write_i64(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_f32(&mut self, value: f32) {
        let mut b = [0; 4];
        BigEndian::write_f32(&mut b, value);
        self.buf.extend_from_slice(&b);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.put_u32(u32::from(value));
    }

    /// Writes a length-prefixed UTF-8 string; the empty string is a bare zero length.
    pub fn put_str(&mut self, value: &str) {
        self.put_u32(value.len() as u32);
        self.buf.extend_from_slice(value.as_bytes());
    }

    /// Appends already-encoded bytes verbatim.
    pub fn put_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_inner(self) -> Vec<u8> {
        self.buf
    }
}

/// Big-endian reader over a reply payload.
///
/// Every read past the end of the payload fails with
/// [`ClientError::IncompleteReply`].
#[derive(Debug)]
pub struct PacketReader<'a> {
    cursor: Cursor<&'a [u8]>,
}

fn incomplete(_: io::Error) -> ClientError {
    ClientError::IncompleteReply
}

impl<'a> PacketReader<'a> {
    pub fn new(payload: &'a [u8]) -> Self {
        Self {
            cursor: Cursor::new(payload),
        }
    }

    pub fn read_u32(&mut self) -> Result<u32, ClientError> {
        self.cursor.read_u32::<BigEndian>().map_err(incomplete)
    }

    pub fn read_i32(&mut self) -> Result<i32, ClientError> {
        self.cursor.read_i32::<BigEndian>().map_err(incomplete)
    }

    /// Reads a 4-byte integer the daemon sends through a signed slot but
    /// means as unsigned.
    pub fn read_dword(&mut self) -> Result<u32, ClientError> {
        self.read_u32()
    }

    pub fn read_i64(&mut self) -> Result<i64, ClientError> {
        self.cursor.read_i64::<BigEndian>().map_err(incomplete)
    }

    pub fn read_f32(&mut self) -> Result<f32, ClientError> {
        self.cursor.read_f32::<BigEndian>().map_err(incomplete)
    }

    pub fn read_str(&mut self) -> Result<String, ClientError> {
        let len = self.read_u32()? as usize;
        let start = self.cursor.position() as usize;
        let end = start.checked_add(len).ok_or(ClientError::IncompleteReply)?;
        let payload: &'a [u8] = *self.cursor.get_ref();
        let bytes = payload
            .get(start..end)
            .ok_or(ClientError::IncompleteReply)?;
        self.cursor.set_position(end as u64);

        String::from_utf8(bytes.to_vec())
            .map_err(|e| ClientError::protocol(format!("invalid utf-8 in reply string: {e}")))
    }

    /// Bytes left unread.
    pub fn remaining(&self) -> usize {
        self.cursor
            .get_ref()
            .len()
            .saturating_sub(self.cursor.position() as usize)
    }
}
