//! End-to-end tests against a scripted in-process daemon.
use std::{
    io::{Read, Write},
    net::TcpListener,
    sync::mpsc,
    thread,
    time::Duration,
};

use sphx::{
    AttrValue, AttributeUpdate, Client, ClientError, ExcerptOptions, QuerySpec,
    protocol::{PacketReader, PacketWriter, Status},
};

/// What the fake daemon saw for one connection.
#[derive(Debug)]
struct Seen {
    client_version: u32,
    command: u16,
    version: u16,
    payload: Vec<u8>,
    closed: bool,
}

/// Serves one connection per scripted `(status, payload)` reply.
fn daemon(replies: Vec<(u16, Vec<u8>)>) -> (Client, mpsc::Receiver<Seen>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for (status, payload) in replies {
            let (mut stream, _) = listener.accept().unwrap();
            stream
                .set_read_timeout(Some(Duration::from_secs(5)))
                .unwrap();

            stream.write_all(&1u32.to_be_bytes()).unwrap();
            let mut hello = [0; 4];
            stream.read_exact(&mut hello).unwrap();

            let mut header = [0; 8];
            stream.read_exact(&mut header).unwrap();
            let len = u32::from_be_bytes([header[4], header[5], header[6], header[7]]);
            let mut request = vec![0; len as usize];
            stream.read_exact(&mut request).unwrap();

            stream.write_all(&status.to_be_bytes()).unwrap();
            stream.write_all(&1u16.to_be_bytes()).unwrap();
            stream
                .write_all(&(payload.len() as u32).to_be_bytes())
                .unwrap();
            stream.write_all(&payload).unwrap();

            let mut rest = [0; 1];
            let closed = matches!(stream.read(&mut rest), Ok(0));

            tx.send(Seen {
                client_version: u32::from_be_bytes(hello),
                command: u16::from_be_bytes([header[0], header[1]]),
                version: u16::from_be_bytes([header[2], header[3]]),
                payload: request,
                closed,
            })
            .unwrap();
        }
    });

    let client = Client::new("127.0.0.1", u32::from(port))
        .unwrap()
        .with_timeout(Duration::from_secs(5));
    (client, rx)
}

fn wifi_result(out: &mut PacketWriter) {
    out.put_u32(0);
    out.put_u32(2);
    out.put_str("name");
    out.put_str("description");
    out.put_u32(2);
    out.put_str("created_at");
    out.put_u32(2);
    out.put_str("group_id");
    out.put_u32(1);

    out.put_u32(3);
    out.put_u32(0);
    for (id, weight, created, group) in [
        (2, 2, 1175662155, 2),
        (3, 2, 1175662247, 1),
        (1, 1, 1175662090, 1),
    ] {
        out.put_u32(id);
        out.put_u32(weight);
        out.put_u32(created);
        out.put_u32(group);
    }

    out.put_u32(3);
    out.put_u32(3);
    out.put_u32(1);
    out.put_u32(1);
    out.put_str("wifi");
    out.put_u32(3);
    out.put_u32(6);
}

fn nothing_found(out: &mut PacketWriter, word: &str) {
    for _ in 0..8 {
        out.put_u32(0);
    }
    out.put_u32(1);
    out.put_str(word);
    out.put_u32(0);
    out.put_u32(0);
}

fn wifi_payload() -> Vec<u8> {
    let mut out = PacketWriter::new();
    wifi_result(&mut out);
    out.into_inner()
}

#[test]
fn wifi_query() {
    let (mut client, seen) = daemon(vec![(0, wifi_payload())]);
    let spec = QuerySpec::builder().limits(0, 20, 1000, 0).build().unwrap();

    let result = client.query(&spec, "wifi", "test1").unwrap();

    assert_eq!(result.status, Status::Ok);
    assert_eq!(result.total_found, 3);
    assert_eq!(result.total, 3);
    assert_eq!(result.time, 0.001);
    assert_eq!(result.attr_names(), vec!["created_at", "group_id"]);
    assert_eq!(result.words[0].word, "wifi");
    assert_eq!(result.words[0].hits, 6);
    assert_eq!(result.words[0].docs, 3);

    let ids = result.matches.iter().map(|m| m.doc_id).collect::<Vec<_>>();
    assert_eq!(ids, vec![2, 3, 1]);
    assert_eq!(
        result.value(&result.matches[0], "group_id"),
        Some(&AttrValue::Uint(2))
    );

    let seen = seen.recv().unwrap();
    assert_eq!(seen.client_version, 1);
    assert_eq!(seen.command, 0);
    assert_eq!(seen.version, 0x116);
    assert!(seen.closed);

    let mut r = PacketReader::new(&seen.payload);
    assert_eq!(r.read_u32().unwrap(), 1);
    assert_eq!(r.read_u32().unwrap(), 0);
    assert_eq!(r.read_u32().unwrap(), 20);
}

#[test]
fn batch_results_follow_add_order() {
    let mut out = PacketWriter::new();
    nothing_found(&mut out, "thisstringyouwillneverfound");
    wifi_result(&mut out);
    let (mut client, seen) = daemon(vec![(0, out.into_inner())]);
    let spec = QuerySpec::default();

    assert_eq!(
        client
            .add_query(&spec, "thisstringyouwillneverfound", "test1", "")
            .unwrap(),
        0
    );
    assert_eq!(client.add_query(&spec, "wifi", "test1", "").unwrap(), 1);

    let results = client.run_queries().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].total_found, 0);
    assert_eq!(results[0].words[0].word, "thisstringyouwillneverfound");
    assert_eq!(results[1].total_found, 3);
    assert_eq!(results[1].words[0].word, "wifi");
    assert_eq!(client.pending(), 0);

    let seen = seen.recv().unwrap();
    let mut r = PacketReader::new(&seen.payload);
    assert_eq!(r.read_u32().unwrap(), 2);
}

#[test]
fn failed_query_in_batch() {
    let mut out = PacketWriter::new();
    wifi_result(&mut out);
    out.put_u32(1);
    out.put_str("index test1: attribute override: attribute 'group_id' type mismatch");
    let (mut client, _seen) = daemon(vec![(0, out.into_inner())]);
    let spec = QuerySpec::default();

    client.add_query(&spec, "wifi", "test1", "").unwrap();
    client.add_query(&spec, "wifi", "test1", "").unwrap();

    let results = client.run_queries().unwrap();
    assert_eq!(results[0].total_found, 3);
    assert!(!results[0].is_error());
    assert_eq!(results[1].status, Status::Error);
    assert!(results[1].is_error());
}

#[test]
fn frame_warning_reaches_results() {
    let body = wifi_payload();
    let mut out = PacketWriter::new();
    out.put_str("slow query");
    out.put_raw(&body);
    let (mut client, _seen) = daemon(vec![(3, out.into_inner())]);

    let result = client.query(&QuerySpec::default(), "wifi", "test1").unwrap();
    assert_eq!(result.warning.as_deref(), Some("slow query"));
    assert_eq!(result.total_found, 3);
}

#[test]
fn server_error_closes_connection() {
    let mut out = PacketWriter::new();
    out.put_str("index test1: attribute '' not found");
    let (client, seen) = daemon(vec![(1, out.into_inner())]);

    let update = AttributeUpdate::scalar("test1", vec!["".into()]).entry(2, vec![1]);
    let err = client.update_attributes(&update).unwrap_err();
    assert_eq!(
        err.to_string(),
        "searchd error: index test1: attribute '' not found"
    );
    assert!(seen.recv().unwrap().closed);
}

#[test]
fn retry_is_reported() {
    let mut out = PacketWriter::new();
    out.put_str("try again");
    let (mut client, seen) = daemon(vec![(2, out.into_inner())]);

    let err = client
        .query(&QuerySpec::default(), "wifi", "test1")
        .unwrap_err();
    assert!(matches!(err, ClientError::Retry(ref m) if m == "try again"));
    assert!(seen.recv().unwrap().closed);
}

#[test]
fn query_after_retry() {
    let mut out = PacketWriter::new();
    out.put_str("busy");
    let (mut client, _seen) = daemon(vec![(2, out.into_inner()), (0, wifi_payload())]);
    let spec = QuerySpec::default();

    let err = client.query(&spec, "wifi", "test1").unwrap_err();
    assert!(matches!(err, ClientError::Retry(ref m) if m == "busy"));
    assert_eq!(client.pending(), 0);

    let result = client.query(&spec, "wifi", "test1").unwrap();
    assert_eq!(result.total_found, 3);
}

#[test]
fn excerpts() {
    let mut out = PacketWriter::new();
    out.put_str("what <b>the</b> world");
    out.put_str("London is <b>the</b> capital of Great Britain");
    let (client, seen) = daemon(vec![(0, out.into_inner())]);

    let docs = vec![
        "what the world".to_string(),
        "London is the capital of Great Britain".to_string(),
    ];
    let excerpts = client
        .build_excerpts(&docs, "test1", "the", &ExcerptOptions::default())
        .unwrap();
    assert_eq!(
        excerpts,
        vec![
            "what <b>the</b> world",
            "London is <b>the</b> capital of Great Britain"
        ]
    );

    let seen = seen.recv().unwrap();
    assert_eq!(seen.command, 1);
    assert_eq!(seen.version, 0x100);
}

#[test]
fn attribute_update() {
    let (client, seen) = daemon(vec![(0, vec![0, 0, 0, 1]), (0, vec![0, 0, 0, 1])]);

    let update = AttributeUpdate::scalar("test1", vec!["group_id".into()]).entry(2, vec![1]);
    assert_eq!(client.update_attributes(&update).unwrap(), 1);

    let update =
        AttributeUpdate::multi("test1", vec!["tags".into()]).multi_entry(2, vec![vec![11, 21]]);
    assert_eq!(client.update_attributes(&update).unwrap(), 1);

    let first = seen.recv().unwrap();
    assert_eq!(first.command, 2);
    assert_eq!(first.version, 0x102);
    let second = seen.recv().unwrap();
    assert!(second.payload.len() > first.payload.len());
}

#[test]
fn keywords() {
    let mut out = PacketWriter::new();
    out.put_u32(1);
    out.put_str("wifi");
    out.put_str("wifi");
    out.put_u32(3);
    out.put_u32(6);
    let (client, seen) = daemon(vec![(0, out.into_inner())]);

    let keywords = client.build_keywords("wifi*", "test1", true).unwrap();
    assert_eq!(keywords[0].tokenized, "wifi");
    assert_eq!(keywords[0].normalized, "wifi");
    assert_eq!(keywords[0].docs, Some(3));
    assert_eq!(keywords[0].hits, Some(6));

    assert_eq!(seen.recv().unwrap().command, 3);
}

#[test]
fn truncated_reply() {
    let mut body = wifi_payload();
    body.truncate(body.len() - 6);
    let (mut client, _seen) = daemon(vec![(0, body)]);

    let err = client
        .query(&QuerySpec::default(), "wifi", "test1")
        .unwrap_err();
    assert!(matches!(err, ClientError::IncompleteReply));
}
