use std::{
    io::{self, ErrorKind, Read, Write},
    net::{TcpStream, ToSocketAddrs},
    time::Duration,
};

use bincode::{
    Decode, Encode,
    config::{BigEndian, Configuration, Fixint},
    decode_from_std_read, encode_into_std_write,
    error::{DecodeError, EncodeError},
};
use log::{debug, trace, warn};

use crate::ClientError;

use super::{CommandKind, PacketReader, Status, VER_MAJOR_PROTO};

/// Connect, read and write timeout applied to every connection.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(30_000);

#[derive(Debug, Encode, Decode, PartialEq, Eq)]
struct RequestHeader {
    command: u16,
    version: u16,
    length: u32,
}

#[derive(Debug, Encode, Decode, PartialEq, Eq)]
struct ResponseHeader {
    status: u16,
    version: u16,
    length: u32,
}

/// A successfully framed response.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: Status,
    pub version: u16,
    /// Payload with any frame-level warning already stripped.
    pub payload: Vec<u8>,
    pub warning: Option<String>,
}

/// Handshake and framing over a bidirectional stream.
pub struct ProtocolTransport<T: Read + Write> {
    stream: T,
    peer: String,
    config: Configuration<BigEndian, Fixint>,
}

impl<T: Read + Write> ProtocolTransport<T> {
    pub fn new(stream: T, peer: impl Into<String>) -> Self {
        let config = bincode::config::standard()
            .with_big_endian()
            .with_fixed_int_encoding();
        Self {
            stream,
            peer: peer.into(),
            config,
        }
    }

    /// Reads the daemon's protocol version and answers with ours.
    pub fn handshake(&mut self) -> Result<i32, ClientError> {
        let version: i32 =
            decode_from_std_read(&mut self.stream, self.config).map_err(|e| self.decode_error(e))?;
        if version < 1 {
            return Err(ClientError::protocol(format!(
                "expected searchd protocol version 1+, got version {version}"
            )));
        }
        debug!("searchd at {} speaks protocol version {version}", self.peer);

        encode_into_std_write(VER_MAJOR_PROTO, &mut self.stream, self.config)
            .map_err(|e| self.encode_error(e))?;
        Ok(version)
    }

    pub fn write_request(&mut self, kind: CommandKind, payload: &[u8]) -> Result<(), ClientError> {
        let header = RequestHeader {
            command: kind.id(),
            version: kind.version(),
            length: payload.len() as u32,
        };
        trace!("sending {kind:?} request: {header:?}");

        encode_into_std_write(header, &mut self.stream, self.config)
            .map_err(|e| self.encode_error(e))?;
        self.stream
            .write_all(payload)
            .and_then(|_| self.stream.flush())
            .map_err(|e| self.io_error(e))
    }

    pub fn read_reply(&mut self) -> Result<Reply, ClientError> {
        let header: ResponseHeader =
            decode_from_std_read(&mut self.stream, self.config).map_err(|e| self.decode_error(e))?;
        trace!("received response: {header:?}");

        if header.length == 0 {
            return Err(ClientError::protocol(format!(
                "invalid response packet size (len={})",
                header.length
            )));
        }

        let failed = |reason: String| {
            ClientError::protocol(format!(
                "failed to read searchd response (status={}, ver={}, len={}): {reason}",
                header.status, header.version, header.length
            ))
        };

        // Grows with the bytes actually received, not with the advertised length.
        let mut payload = Vec::new();
        let read = (&mut self.stream)
            .take(u64::from(header.length))
            .read_to_end(&mut payload)
            .map_err(|e| failed(e.to_string()))?;
        if read != header.length as usize {
            return Err(failed(format!("got {read} bytes")));
        }

        let status = Status::from(u32::from(header.status));
        let mut warning = None;
        match status {
            Status::Ok => {}
            Status::Warning => {
                let message = strip_warning(&mut payload)?;
                warn!("searchd warning: {message}");
                warning = Some(message);
            }
            Status::Error => return Err(ClientError::Server(error_text(&payload))),
            Status::Retry => return Err(ClientError::Retry(error_text(&payload))),
            Status::Unknown(code) => {
                return Err(ClientError::protocol(format!(
                    "searchd returned unknown status, code={code}"
                )));
            }
        }

        Ok(Reply {
            status,
            version: header.version,
            payload,
            warning,
        })
    }

    /// One full exchange: handshake, request frame, response frame.
    pub fn round_trip(&mut self, kind: CommandKind, payload: &[u8]) -> Result<Reply, ClientError> {
        self.handshake()?;
        self.write_request(kind, payload)?;
        self.read_reply()
    }

    fn io_error(&self, e: io::Error) -> ClientError {
        if e.kind() == ErrorKind::UnexpectedEof {
            ClientError::protocol("received zero-sized searchd response (searchd crashed?)")
        } else {
            ClientError::Network {
                addr: self.peer.clone(),
                source: e,
            }
        }
    }

    fn decode_error(&self, e: DecodeError) -> ClientError {
        match e {
            DecodeError::Io { inner, .. } => self.io_error(inner),
            DecodeError::UnexpectedEnd { .. } => self.io_error(ErrorKind::UnexpectedEof.into()),
            other => ClientError::protocol(format!("failed to decode frame: {other}")),
        }
    }

    fn encode_error(&self, e: EncodeError) -> ClientError {
        match e {
            EncodeError::Io { inner, .. } => self.io_error(inner),
            other => ClientError::protocol(format!("failed to encode frame: {other}")),
        }
    }
}

/// Removes the leading warning message from a WARNING payload, leaving the
/// real payload in place.
fn strip_warning(payload: &mut Vec<u8>) -> Result<String, ClientError> {
    let len = PacketReader::new(payload)
        .read_u32()
        .map_err(|_| ClientError::protocol("warning reply is missing its message length"))?
        as usize;

    let end = 4usize
        .checked_add(len)
        .filter(|end| *end <= payload.len())
        .ok_or_else(|| {
            ClientError::protocol(format!(
                "warning length {len} exceeds reply size {}",
                payload.len()
            ))
        })?;

    let message = String::from_utf8_lossy(&payload[4..end]).into_owned();
    payload.drain(..end);
    Ok(message)
}

fn error_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload.get(4..).unwrap_or_default()).into_owned()
}

fn connect(host: &str, port: u16, timeout: Duration) -> io::Result<TcpStream> {
    let mut last = None;

    for addr in (host, port).to_socket_addrs()? {
        match TcpStream::connect_timeout(&addr, timeout) {
            Ok(stream) => {
                stream.set_read_timeout(Some(timeout))?;
                stream.set_write_timeout(Some(timeout))?;
                stream.set_nodelay(true)?;
                return Ok(stream);
            }
            Err(e) => last = Some(e),
        }
    }

    Err(last.unwrap_or_else(|| {
        io::Error::new(ErrorKind::NotFound, format!("could not resolve {host}"))
    }))
}

/// Opens a connection, performs one exchange and closes it again.
///
/// The stream is owned by this call, so it is released on every exit path.
pub fn execute(
    host: &str,
    port: u16,
    timeout: Duration,
    kind: CommandKind,
    payload: &[u8],
) -> Result<Reply, ClientError> {
    let peer = format!("{host}:{port}");
    let stream = connect(host, port, timeout).map_err(|source| ClientError::Network {
        addr: peer.clone(),
        source,
    })?;
    debug!("connected to {peer}");

    ProtocolTransport::new(stream, peer).round_trip(kind, payload)
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    struct Duplex {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Duplex {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }
    }

    impl Read for Duplex {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Duplex {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn response(status: u16, payload: &[u8]) -> Vec<u8> {
        let mut bytes = vec![0, 0, 0, 1];
        bytes.extend_from_slice(&status.to_be_bytes());
        bytes.extend_from_slice(&[0, 1]);
        bytes.extend_from_slice(&(payload.len() as u32).to_be_bytes());
        bytes.extend_from_slice(payload);
        bytes
    }

    fn exchange(input: Vec<u8>) -> Result<Reply, ClientError> {
        let mut transport = ProtocolTransport::new(Duplex::new(input), "localhost:3312");
        transport.round_trip(CommandKind::Update, &[0, 2, 3, 4, 5, 3, 2, 3, 4, 4, 3, 3])
    }

    #[test]
    fn round_trip_frames() {
        let input = vec![0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 3, 2, 5, 12];
        let mut transport = ProtocolTransport::new(Duplex::new(input), "localhost:3312");

        let reply = transport
            .round_trip(CommandKind::Update, &[0, 2, 3, 4, 5, 3, 2, 3, 4, 4, 3, 3])
            .unwrap();
        assert_eq!(reply.status, Status::Ok);
        assert_eq!(reply.version, 1);
        assert_eq!(reply.payload, vec![2, 5, 12]);
        assert_eq!(reply.warning, None);

        let expected = vec![
            0, 0, 0, 1, 0, 2, 1, 2, 0, 0, 0, 12, 0, 2, 3, 4, 5, 3, 2, 3, 4, 4, 3, 3,
        ];
        assert_eq!(transport.stream.output, expected);
    }

    #[test]
    #[should_panic(expected = "expected searchd protocol version 1+, got version 0")]
    fn handshake_rejects_version_zero() {
        let mut transport = ProtocolTransport::new(Duplex::new(vec![0, 0, 0, 0]), "localhost:3312");
        transport.handshake().unwrap();
    }

    #[test]
    fn handshake_rejects_negative_version() {
        let mut transport =
            ProtocolTransport::new(Duplex::new(vec![0xff, 0xff, 0xff, 0xff]), "localhost:3312");
        assert!(matches!(transport.handshake(), Err(ClientError::Protocol(_))));
        assert!(transport.stream.output.is_empty());
    }

    #[test]
    fn handshake_accepts_newer_versions() {
        let mut transport = ProtocolTransport::new(Duplex::new(vec![0, 0, 0, 7]), "localhost:3312");
        assert_eq!(transport.handshake().unwrap(), 7);
        assert_eq!(transport.stream.output, vec![0, 0, 0, 1]);
    }

    #[test]
    fn warning_is_stripped() {
        let payload = [0, 0, 0, 4, b'o', b'o', b'p', b's', 9, 8, 7];
        let reply = exchange(response(3, &payload)).unwrap();

        assert_eq!(reply.status, Status::Warning);
        assert_eq!(reply.warning.as_deref(), Some("oops"));
        assert_eq!(reply.payload, vec![9, 8, 7]);
    }

    #[test]
    fn oversized_warning_is_protocol_error() {
        let payload = [0, 0, 0, 40, b'o', b'o'];
        let err = exchange(response(3, &payload)).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn error_status_is_server_error() {
        let payload = [0, 0, 0, 5, b'b', b'r', b'o', b'k', b'e'];
        let err = exchange(response(1, &payload)).unwrap_err();
        assert_eq!(err.to_string(), "searchd error: broke");
    }

    #[test]
    fn retry_status_is_not_retried() {
        let payload = [0, 0, 0, 4, b'b', b'u', b's', b'y'];
        let err = exchange(response(2, &payload)).unwrap_err();
        assert!(matches!(err, ClientError::Retry(ref m) if m == "busy"));
    }

    #[test]
    #[should_panic(expected = "unknown status, code=7")]
    fn unknown_status_is_protocol_error() {
        exchange(response(7, &[1])).unwrap();
    }

    #[test]
    fn short_payload_is_protocol_error() {
        let mut input = response(0, &[1, 2, 3, 4]);
        input.truncate(input.len() - 2);
        let err = exchange(input).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn oversized_length_reads_what_arrives() {
        let mut input = vec![0, 0, 0, 1, 0, 0, 0, 1];
        input.extend_from_slice(&u32::MAX.to_be_bytes());
        input.extend_from_slice(&[1, 2, 3]);

        let err = exchange(input).unwrap_err();
        assert_eq!(
            err.to_string(),
            "protocol error: failed to read searchd response (status=0, ver=1, len=4294967295): got 3 bytes"
        );
    }

    #[test]
    #[should_panic(expected = "invalid response packet size (len=0)")]
    fn empty_payload_is_rejected() {
        exchange(response(0, &[])).unwrap();
    }

    #[test]
    fn missing_greeting_is_protocol_error() {
        let err = exchange(vec![]).unwrap_err();
        assert!(matches!(err, ClientError::Protocol(_)));
    }

    #[test]
    fn refused_connection_is_network_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = execute(
            "127.0.0.1",
            port,
            Duration::from_millis(500),
            CommandKind::Search,
            &[],
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::Network { .. }));
        assert!(
            err.to_string()
                .starts_with(&format!("connection to 127.0.0.1:{port} failed"))
        );
    }
}
