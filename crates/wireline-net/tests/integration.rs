//! Loopback integration tests for the connection engine and acceptor.
//!
//! Every test runs a real server on an ephemeral port and talks to it over
//! 127.0.0.1. Accepted connections are handed from the listener-thread
//! callback to the test thread through a crossbeam channel.

use std::{thread, time::Duration};

use crossbeam_channel::{bounded, Receiver};
use wireline_codec::WireBuffer;
use wireline_core::error::ErrorKind;
use wireline_net::{create_client, create_server, AddressFamily, Connection, Server};

const LOCALHOST: &str = "127.0.0.1";
const ACCEPT_DEADLINE: Duration = Duration::from_secs(5);
const GENEROUS: Duration = Duration::from_secs(10);

/// Starts a server whose callback forwards each accepted connection.
fn accepting_server() -> (Server, Receiver<Connection>) {
    let (handover, accepted) = bounded(8);
    let server = create_server(AddressFamily::Ipv4, 0, move |connection| {
        let _ = handover.send(connection);
    })
    .unwrap();
    (server, accepted)
}

fn connected_pair() -> (Server, Connection, Connection) {
    let (server, accepted) = accepting_server();
    let client = create_client(AddressFamily::Ipv4, LOCALHOST, server.local_address().port).unwrap();
    let peer = accepted.recv_timeout(ACCEPT_DEADLINE).unwrap();
    (server, client, peer)
}

fn iota(count: usize) -> Vec<u8> {
    (0..count).map(|i| i as u8).collect()
}

#[test]
fn single_byte_round_trip() {
    let (_server, client, peer) = connected_pair();

    let num_bytes_sent = client.send_values(b'A').unwrap().get().unwrap();
    assert_eq!(num_bytes_sent, 1);

    let bytes = peer.receive_with_timeout(1, GENEROUS).unwrap().get().unwrap();
    let mut buffer = WireBuffer::from(bytes);
    assert_eq!(buffer.extract::<u8>().unwrap(), b'A');
}

#[test]
fn exact_integer_round_trip() {
    let (_server, client, peer) = connected_pair();

    let num_bytes_sent = client.send_values(42i32).unwrap().get().unwrap();
    assert_eq!(num_bytes_sent, 4);

    let bytes = peer.receive_exact_with_timeout(4, GENEROUS).unwrap().get().unwrap();
    let mut buffer = WireBuffer::from(bytes);
    assert_eq!(buffer.extract::<i32>().unwrap(), 42);
}

#[test]
fn chunked_megabyte_reassembles_in_order() {
    const SIZE: usize = 1024 * 1024;
    const NUM_CHUNKS: usize = 16;
    const CHUNK_SIZE: usize = SIZE / NUM_CHUNKS;

    let (_server, client, peer) = connected_pair();
    let data = iota(SIZE);

    let receiver = thread::spawn(move || {
        peer.receive_exact_with_timeout(SIZE, GENEROUS).unwrap().get().unwrap()
    });

    for chunk in data.chunks(CHUNK_SIZE) {
        let num_bytes_sent = client.send(chunk).unwrap().get().unwrap();
        assert_eq!(num_bytes_sent, CHUNK_SIZE);
    }

    assert_eq!(receiver.join().unwrap(), data);
}

#[test]
fn exact_receive_times_out_on_an_idle_connection() {
    let (_server, client, _peer) = connected_pair();

    let result = client.receive_exact_with_timeout(1, Duration::from_millis(100)).unwrap().get();
    assert!(matches!(result, Err(ErrorKind::TimedOut)));

    // The deadline is not fatal: the connection is still usable.
    assert!(client.is_connected());
}

#[test]
fn up_to_receive_resolves_empty_on_timeout() {
    let (_server, client, _peer) = connected_pair();

    let bytes = client.receive_with_timeout(1, Duration::from_millis(100)).unwrap().get().unwrap();
    assert!(bytes.is_empty());
    assert!(client.is_connected());
}

#[test]
fn typed_receive_decodes_a_mixed_tuple() {
    type Mixed = (i32, i64, u8, bool, i16, u64);
    let values: Mixed = (124_234, 97_234, b'a', true, 13, 1_356_469_817);

    let (_server, client, peer) = connected_pair();
    peer.send_values(values).unwrap().get().unwrap();

    let received = client.receive_values_with_timeout::<Mixed>(GENEROUS).unwrap().get().unwrap();
    assert_eq!(received, values);
}

#[test]
fn sequential_sends_arrive_in_order() {
    let (_server, client, peer) = connected_pair();

    for _ in 0..5 {
        let num_bytes_sent = client.send_values(b'B').unwrap().get().unwrap();
        assert_eq!(num_bytes_sent, 1);
    }

    for _ in 0..5 {
        let bytes = peer.receive_with_timeout(1, GENEROUS).unwrap().get().unwrap();
        assert_eq!(bytes, vec![b'B']);
    }
}

#[test]
fn close_resolves_every_pending_future() {
    let (_server, client, _peer) = connected_pair();

    let pending_exact = client.receive_exact_with_timeout(1, GENEROUS).unwrap();
    let pending_up_to = client.receive_with_timeout(1, GENEROUS).unwrap();

    client.close();
    assert!(!client.is_connected());

    // The drained exact receive fails, the up-to receive resolves empty.
    assert!(matches!(pending_exact.get(), Err(ErrorKind::ReadFailed(_))));
    assert_eq!(pending_up_to.get().unwrap(), Vec::<u8>::new());

    // Submissions after the close resolve immediately with their sentinels.
    assert_eq!(client.send("ignored").unwrap().get().unwrap(), 0);
    assert_eq!(client.receive(8).unwrap().get().unwrap(), Vec::<u8>::new());
    assert!(matches!(client.receive_exact(8).unwrap().get(), Err(ErrorKind::ReadFailed(_))));
}

#[test]
fn peer_close_ends_exact_receives_with_read_failed() {
    let (_server, client, peer) = connected_pair();

    let pending = client.receive_exact_with_timeout(4, GENEROUS).unwrap();
    drop(peer);

    assert!(matches!(pending.get(), Err(ErrorKind::ReadFailed(_))));
}

#[test]
fn peer_close_hands_up_to_receives_their_partial_data() {
    let (_server, client, peer) = connected_pair();

    peer.send(vec![1u8, 2, 3]).unwrap().get().unwrap();
    let bytes = client.receive_with_timeout(8, GENEROUS).unwrap().get().unwrap();
    assert_eq!(bytes, vec![1, 2, 3]);

    drop(peer);
    // Once the peer is gone an up-to receive resolves with whatever arrived,
    // here nothing, and never errors.
    let bytes = client.receive_with_timeout(8, GENEROUS).unwrap().get().unwrap();
    assert!(bytes.is_empty());
}

#[test]
fn empty_and_zero_requests_are_rejected() {
    let (_server, client, _peer) = connected_pair();

    assert!(matches!(client.send(Vec::<u8>::new()), Err(ErrorKind::SendFailed(_))));
    assert!(matches!(client.receive(0), Err(ErrorKind::ReadFailed(_))));
    assert!(matches!(client.receive_exact(0), Err(ErrorKind::ReadFailed(_))));
}

#[test]
fn ephemeral_port_is_revealed() {
    let (server, _accepted) = accepting_server();
    assert_ne!(server.local_address().port, 0);
}

#[test]
fn client_sees_the_server_port() {
    let (server, accepted) = accepting_server();
    let port = server.local_address().port;

    let client = create_client(AddressFamily::Ipv4, LOCALHOST, port).unwrap();
    assert_eq!(client.remote_address().port, port);
    assert_ne!(client.local_address().port, 0);

    let peer = accepted.recv_timeout(ACCEPT_DEADLINE).unwrap();
    assert_eq!(peer.local_address().port, port);
}

#[test]
fn unspecified_family_cannot_listen() {
    let result = create_server(AddressFamily::Unspecified, 0, |_connection| {});
    assert!(matches!(result, Err(ErrorKind::ResolveFailed(_))));
}

#[test]
fn stopped_server_accepts_no_new_peers() {
    let (server, accepted) = accepting_server();
    let port = server.local_address().port;

    server.stop();
    drop(server);

    // The listener socket is gone; connects are refused or the accepted
    // stream is never handed over.
    if create_client(AddressFamily::Ipv4, LOCALHOST, port).is_ok() {
        assert!(accepted.recv_timeout(Duration::from_millis(300)).is_err());
    }
}

#[test]
fn string_payloads_are_sent_verbatim() {
    let (_server, client, peer) = connected_pair();

    let num_bytes_sent = client.send("hello wire").unwrap().get().unwrap();
    assert_eq!(num_bytes_sent, 10);

    let bytes = peer.receive_exact_with_timeout(10, GENEROUS).unwrap().get().unwrap();
    assert_eq!(bytes, b"hello wire");
}
