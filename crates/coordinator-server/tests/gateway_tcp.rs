//! End-to-end gateway tests over real TCP sockets: the auth
//! handshake, presence events, and a join + move round trip, all
//! speaking the newline-delimited JSON protocol.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::{sleep, timeout};

use coordinator_core::UserId;
use coordinator_protocol::{
    decode_server_line, encode_client_event, ClientEvent, Mark, PresenceState, WireEvent,
};
use coordinator_server::auth::StaticTokenVerifier;
use coordinator_server::config::Config;
use coordinator_server::server;
use coordinator_server::store::{MatchStore, MemoryStore};

const ALICE: UserId = UserId(1);
const BOB: UserId = UserId(2);

fn test_config() -> Config {
    Config {
        bind_addr: "127.0.0.1".to_string(),
        port: 0,
        max_clients: 16,
        store_timeout: Duration::from_secs(1),
        auth_timeout: Duration::from_secs(2),
        auth_tokens: String::new(),
        seed_match: None,
    }
}

/// Bind port 0, seed one match, run the server in the background.
/// Returns the address to dial and the seeded match id.
async fn spawn_server_with(config: Config) -> (SocketAddr, u64) {
    let store = Arc::new(MemoryStore::new());
    let record = store.create_match(ALICE, BOB).await.unwrap();

    let mut verifier = StaticTokenVerifier::new();
    verifier.insert("alice-token", ALICE);
    verifier.insert("bob-token", BOB);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let _ = server::run_with_listener(
            listener,
            config,
            store as Arc<dyn MatchStore>,
            Arc::new(verifier),
        )
        .await;
    });

    (addr, record.id.0)
}

async fn spawn_server() -> (SocketAddr, u64) {
    spawn_server_with(test_config()).await
}

struct TestClient {
    lines: Lines<BufReader<OwnedReadHalf>>,
    write: OwnedWriteHalf,
}

impl TestClient {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        TestClient {
            lines: BufReader::new(read).lines(),
            write,
        }
    }

    async fn send(&mut self, event: &ClientEvent) {
        let line = format!("{}\n", encode_client_event(event).unwrap());
        self.write.write_all(line.as_bytes()).await.unwrap();
    }

    /// Next event, or `None` once the server closed the connection.
    async fn recv(&mut self) -> Option<WireEvent> {
        let line = timeout(Duration::from_secs(2), self.lines.next_line())
            .await
            .expect("timed out waiting for an event")
            .expect("socket error")?;
        Some(decode_server_line(&line).expect("undecodable server event"))
    }

    /// Next non-presence event; `userStatus` broadcasts from other
    /// connections interleave arbitrarily with room traffic.
    async fn recv_non_presence(&mut self) -> Option<WireEvent> {
        loop {
            match self.recv().await {
                Some(WireEvent::UserStatus { .. }) => continue,
                other => return other,
            }
        }
    }

    /// Authenticate and swallow the handshake events.
    async fn login(addr: SocketAddr, token: &str) -> Self {
        let mut client = TestClient::connect(addr).await;
        client
            .send(&ClientEvent::Auth {
                token: token.to_string(),
            })
            .await;
        assert!(matches!(
            client.recv().await,
            Some(WireEvent::Authenticated { .. })
        ));
        assert!(matches!(
            client.recv().await,
            Some(WireEvent::OnlineUsers { .. })
        ));
        client
    }
}

#[tokio::test]
async fn bad_token_is_refused_and_the_connection_closes() {
    let (addr, _match_id) = spawn_server().await;

    let mut client = TestClient::connect(addr).await;
    client
        .send(&ClientEvent::Auth {
            token: "wrong".to_string(),
        })
        .await;

    assert!(matches!(
        client.recv().await,
        Some(WireEvent::AuthFailed { .. })
    ));
    assert_eq!(client.recv().await, None);
}

#[tokio::test]
async fn first_event_must_be_the_auth_handshake() {
    let (addr, match_id) = spawn_server().await;

    let mut client = TestClient::connect(addr).await;
    client.send(&ClientEvent::Join { match_id }).await;

    assert!(matches!(
        client.recv().await,
        Some(WireEvent::AuthFailed { .. })
    ));
}

#[tokio::test]
async fn connection_cap_counts_sessions_still_in_the_handshake() {
    let mut config = test_config();
    config.max_clients = 1;
    let (addr, _match_id) = spawn_server_with(config).await;

    // The first connection never authenticates but already occupies
    // the only slot. Give the accept loop a beat to register it.
    let _first = TestClient::connect(addr).await;
    sleep(Duration::from_millis(200)).await;

    let mut second = TestClient::connect(addr).await;
    assert_eq!(second.recv().await, None);
}

#[tokio::test]
async fn presence_is_broadcast_and_queryable() {
    let (addr, _match_id) = spawn_server().await;

    let mut alice = TestClient::connect(addr).await;
    alice
        .send(&ClientEvent::Auth {
            token: "alice-token".to_string(),
        })
        .await;
    assert_eq!(
        alice.recv().await,
        Some(WireEvent::Authenticated { user_id: ALICE.0 })
    );
    assert_eq!(
        alice.recv().await,
        Some(WireEvent::OnlineUsers {
            ids: vec![ALICE.0]
        })
    );

    // Bob comes online: Alice hears about it, Bob's snapshot has both.
    let _bob = TestClient::login(addr, "bob-token").await;
    assert_eq!(
        alice.recv().await,
        Some(WireEvent::UserStatus {
            user_id: BOB.0,
            state: PresenceState::Online
        })
    );

    alice.send(&ClientEvent::RequestOnlineUsers).await;
    assert_eq!(
        alice.recv().await,
        Some(WireEvent::OnlineUsers {
            ids: vec![ALICE.0, BOB.0]
        })
    );

    // Bob drops: Alice sees the offline transition.
    drop(_bob);
    assert_eq!(
        alice.recv().await,
        Some(WireEvent::UserStatus {
            user_id: BOB.0,
            state: PresenceState::Offline
        })
    );
}

#[tokio::test]
async fn join_and_move_round_trip_over_the_wire() {
    let (addr, match_id) = spawn_server().await;

    let mut alice = TestClient::login(addr, "alice-token").await;
    let mut bob = TestClient::login(addr, "bob-token").await;

    alice.send(&ClientEvent::Join { match_id }).await;
    match alice.recv_non_presence().await {
        Some(WireEvent::RoomState { board, turn, .. }) => {
            assert!(board.iter().all(|c| c.is_none()));
            assert_eq!(turn, Mark::X);
        }
        other => panic!("expected roomState, got {other:?}"),
    }
    assert_eq!(
        alice.recv_non_presence().await,
        Some(WireEvent::PeerCount {
            match_id,
            count: 1
        })
    );

    bob.send(&ClientEvent::Join { match_id }).await;
    assert!(matches!(
        bob.recv_non_presence().await,
        Some(WireEvent::RoomState { .. })
    ));
    assert_eq!(
        bob.recv_non_presence().await,
        Some(WireEvent::PeerCount {
            match_id,
            count: 2
        })
    );

    alice
        .send(&ClientEvent::Move {
            match_id,
            position: 4,
        })
        .await;

    // Both room members see the authoritative delta.
    for client in [&mut alice, &mut bob] {
        loop {
            match client.recv().await.expect("connection stayed open") {
                WireEvent::RoomState { board, turn, .. } => {
                    assert_eq!(board[4], Some(Mark::X));
                    assert_eq!(turn, Mark::O);
                    break;
                }
                WireEvent::PeerCount { .. } | WireEvent::UserStatus { .. } => continue,
                other => panic!("unexpected event {other:?}"),
            }
        }
    }

    // Moving into an unjoined match is rejected without room traffic.
    bob.send(&ClientEvent::Move {
        match_id: 777,
        position: 0,
    })
    .await;
    loop {
        match bob.recv().await.expect("connection stayed open") {
            WireEvent::MoveRejected { match_id: 777, .. } => break,
            WireEvent::PeerCount { .. } | WireEvent::UserStatus { .. } => continue,
            other => panic!("unexpected event {other:?}"),
        }
    }
}
