// CLASSIFICATION: COMMUNITY
// Filename: sockopt_ctl.rs v0.1
// Date Modified: 2026-10-19
// Author: Lukas Bower

mod common;

use std::os::unix::net::UnixStream;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use common::{init_logger, Store};
use tracer_ctrl::ctrl::msg::{RequestHeader, REPLY_HEADER_LEN};
use tracer_ctrl::ctrl::{
    errcode, readn, sendn, CtrlClient, CtrlError, CtrlResult, Dispatcher, Reply, SockoptEntry,
    SockoptRegistry, SockoptType, SOCKOPT_VERSION,
};

struct Fixture {
    registry: Arc<SockoptRegistry>,
    a: Arc<Store>,
    b: Arc<Store>,
    a_handle: tracer_ctrl::ctrl::SockoptHandle,
}

fn fixture() -> Fixture {
    init_logger();
    let registry = Arc::new(SockoptRegistry::new());
    let a = Arc::new(Store::new("A"));
    let b = Arc::new(Store::new("B"));
    let a_handle = registry
        .register(SockoptEntry::new(a.clone()).with_get(100, 199).with_set(100, 149))
        .unwrap();
    registry
        .register(SockoptEntry::new(b.clone()).with_get(200, 299).with_set(200, 249))
        .unwrap();
    Fixture {
        registry,
        a,
        b,
        a_handle,
    }
}

fn serve(registry: &Arc<SockoptRegistry>, max_payload: usize) -> (UnixStream, JoinHandle<CtrlResult<usize>>) {
    let (client, mut server) = UnixStream::pair().unwrap();
    let dispatcher = Dispatcher::new(Arc::clone(registry)).with_max_payload(max_payload);
    let worker = thread::spawn(move || dispatcher.sockopt_ctl(&mut server));
    (client, worker)
}

#[test]
fn requests_route_to_owning_entry_only() {
    let fx = fixture();
    let (stream, worker) = serve(&fx.registry, 1024);
    let mut client = CtrlClient::new(stream);

    client.get(150, &[]).unwrap();
    assert_eq!((fx.a.gets(), fx.b.gets()), (1, 0));

    client.set(240, b"x").unwrap();
    assert_eq!((fx.a.sets(), fx.b.sets()), (0, 1));

    // Set ranges are inclusive; 250 is past B's set range.
    let reply = client.request(SockoptType::Set, 250, b"x").unwrap();
    assert_eq!(reply.errcode(), errcode::UNKNOWN_OPERATION);
    assert_eq!(fx.b.sets(), 1);

    client.get(299, &[]).unwrap();
    assert_eq!((fx.a.gets(), fx.b.gets()), (1, 1));

    drop(client);
    assert_eq!(worker.join().unwrap().unwrap(), 4);
}

#[test]
fn unknown_id_yields_error_and_empty_payload() {
    let fx = fixture();
    let (stream, worker) = serve(&fx.registry, 1024);
    let mut client = CtrlClient::new(stream);

    for (kind, id) in [
        (SockoptType::Get, 300),
        (SockoptType::Get, 99),
        (SockoptType::Set, 150),
        (SockoptType::Set, 299),
    ] {
        let reply = client.request(kind, id, b"ignored").unwrap();
        assert_eq!(reply.errcode(), errcode::UNKNOWN_OPERATION);
        assert_eq!(reply.header.len, 0);
        assert!(reply.payload.is_empty());
        assert!(reply.errstr().contains(&id.to_string()));
    }

    // Connection survives protocol errors.
    client.set(100, b"still here").unwrap();
    assert_eq!(client.get(100, &[]).unwrap(), b"still here");
    drop(client);
    assert_eq!(worker.join().unwrap().unwrap(), 6);
    assert_eq!(fx.a.gets() + fx.b.gets(), 1);
}

#[test]
fn set_then_get_returns_stored_value() {
    let fx = fixture();
    let (stream, _worker) = serve(&fx.registry, 1024);
    let mut client = CtrlClient::new(stream);

    let value = 0xdead_beef_u32.to_ne_bytes();
    client.set(120, &value).unwrap();
    assert_eq!(client.get(180, &[]).unwrap(), value);

    match client.set(120, &[]) {
        Err(CtrlError::Remote { code, message }) => {
            assert_eq!(code, errcode::INVALID_ARGUMENT);
            assert_eq!(message, "empty value");
        }
        other => panic!("expected remote error, got {other:?}"),
    }
    // Failed set leaves the value alone.
    assert_eq!(client.get(101, &[]).unwrap(), value);
}

#[test]
fn version_mismatch_with_huge_len_is_answered_and_closed() {
    let fx = fixture();
    let (mut stream, worker) = serve(&fx.registry, 1024);

    let mut header = RequestHeader::new(SockoptType::Get, 150, usize::MAX);
    header.version = SOCKOPT_VERSION + 0x100;
    sendn(&mut stream, &header.encode()).unwrap();

    let reply = Reply::read_from(&mut stream, 0).unwrap();
    assert_eq!(reply.errcode(), errcode::VERSION_MISMATCH);
    assert_eq!(reply.header.id, 150);
    assert!(reply.payload.is_empty());

    // Server hangs up instead of trusting the length.
    let mut rest = [0u8; 1];
    assert_eq!(readn(&mut stream, &mut rest).unwrap(), 0);
    assert_eq!(worker.join().unwrap().unwrap(), 1);
    assert_eq!(fx.a.gets(), 0);
}

#[test]
fn client_with_other_version_gets_error() {
    let fx = fixture();
    let (stream, _worker) = serve(&fx.registry, 1024);
    let mut client = CtrlClient::new(stream).with_version(0x0000_0900);
    match client.get(150, &[]) {
        Err(CtrlError::Remote { code, .. }) => assert_eq!(code, errcode::VERSION_MISMATCH),
        other => panic!("expected version mismatch, got {other:?}"),
    }
}

#[test]
fn oversized_payload_is_rejected_without_dropping_connection() {
    let fx = fixture();
    let (stream, _worker) = serve(&fx.registry, 16);
    let mut client = CtrlClient::new(stream);

    let reply = client.request(SockoptType::Set, 100, &[1u8; 64]).unwrap();
    assert_eq!(reply.errcode(), errcode::PAYLOAD_TOO_LARGE);
    assert_eq!(fx.a.sets(), 0);

    client.set(100, &[2u8; 16]).unwrap();
    assert_eq!(client.get(100, &[]).unwrap(), vec![2u8; 16]);
}

#[test]
fn huge_length_without_payload_still_gets_reply() {
    let fx = fixture();
    let (mut stream, worker) = serve(&fx.registry, 1024);
    stream
        .set_read_timeout(Some(std::time::Duration::from_secs(5)))
        .unwrap();

    let header = RequestHeader::new(SockoptType::Get, 150, usize::MAX / 2);
    sendn(&mut stream, &header.encode()).unwrap();

    let reply = Reply::read_from(&mut stream, 0).unwrap();
    assert_eq!(reply.errcode(), errcode::PAYLOAD_TOO_LARGE);
    assert_eq!(reply.header.id, 150);
    let mut rest = [0u8; 1];
    assert_eq!(readn(&mut stream, &mut rest).unwrap(), 0);
    assert_eq!(worker.join().unwrap().unwrap(), 1);
    assert_eq!(fx.a.gets(), 0);
}

#[test]
fn unregistered_entry_becomes_unknown() {
    let fx = fixture();
    let (stream, _worker) = serve(&fx.registry, 1024);
    let mut client = CtrlClient::new(stream);

    client.get(150, &[]).unwrap();
    assert!(fx.registry.unregister(fx.a_handle).unwrap());
    let reply = client.request(SockoptType::Get, 150, &[]).unwrap();
    assert_eq!(reply.errcode(), errcode::UNKNOWN_OPERATION);
    assert_eq!(fx.a.gets(), 1);
}

#[test]
fn peer_closing_mid_header_ends_loop_with_error() {
    let fx = fixture();
    let (mut stream, worker) = serve(&fx.registry, 1024);
    let header = RequestHeader::new(SockoptType::Get, 150, 0).encode();
    sendn(&mut stream, &header[..5]).unwrap();
    drop(stream);
    assert!(matches!(
        worker.join().unwrap(),
        Err(CtrlError::Truncated { read: 5, .. })
    ));
}

#[test]
fn reply_header_is_fixed_size_on_the_wire() {
    let fx = fixture();
    let (mut stream, _worker) = serve(&fx.registry, 1024);
    let header = RequestHeader::new(SockoptType::Get, 300, 0);
    sendn(&mut stream, &header.encode()).unwrap();
    let mut raw = [0u8; REPLY_HEADER_LEN];
    assert_eq!(readn(&mut stream, &mut raw).unwrap(), REPLY_HEADER_LEN);
    let decoded = tracer_ctrl::ctrl::ReplyHeader::decode(&raw);
    assert_eq!(decoded.version, SOCKOPT_VERSION);
    assert_eq!(decoded.len, 0);
    assert_ne!(decoded.errcode, 0);
}
