//! Targeted wire-format fixtures: exact JSON for each event shape the
//! gateway speaks, plus malformed-input handling.

use coordinator_protocol::{
    decode_client_line, decode_server_line, encode_server_event, ClientEvent, Mark, PresenceState,
    RejectReason, WireEvent,
};

#[test]
fn decodes_auth_handshake() {
    let ev = decode_client_line(r#"{"type":"auth","token":"alice-token"}"#).unwrap();
    assert_eq!(
        ev,
        ClientEvent::Auth {
            token: "alice-token".to_string()
        }
    );
}

#[test]
fn decodes_join_and_move() {
    let ev = decode_client_line(r#"{"type":"join","matchId":3}"#).unwrap();
    assert_eq!(ev, ClientEvent::Join { match_id: 3 });

    let ev = decode_client_line(r#"{"type":"move","matchId":3,"position":4}"#).unwrap();
    assert_eq!(
        ev,
        ClientEvent::Move {
            match_id: 3,
            position: 4
        }
    );
}

#[test]
fn decodes_presence_query() {
    let ev = decode_client_line(r#"{"type":"requestOnlineUsers"}"#).unwrap();
    assert_eq!(ev, ClientEvent::RequestOnlineUsers);
}

#[test]
fn tolerates_surrounding_whitespace() {
    let ev = decode_client_line("  {\"type\":\"join\",\"matchId\":9}\r").unwrap();
    assert_eq!(ev, ClientEvent::Join { match_id: 9 });
}

#[test]
fn rejects_unknown_event_type() {
    assert!(decode_client_line(r#"{"type":"teleport","matchId":1}"#).is_err());
}

#[test]
fn rejects_non_json_line() {
    assert!(decode_client_line("N, 1, IBM, 10, 100, B, 1").is_err());
}

#[test]
fn rejects_missing_fields() {
    assert!(decode_client_line(r#"{"type":"move","matchId":3}"#).is_err());
}

#[test]
fn encodes_room_state_with_nulls_for_empty_cells() {
    let mut board = [None; 9];
    board[4] = Some(Mark::X);
    board[0] = Some(Mark::O);

    let line = encode_server_event(&WireEvent::RoomState {
        match_id: 3,
        board,
        turn: Mark::O,
    })
    .unwrap();

    assert_eq!(
        line,
        r#"{"type":"roomState","matchId":3,"board":["O",null,null,null,"X",null,null,null,null],"turn":"O"}"#
    );
}

#[test]
fn encodes_game_over_with_null_winner_for_tie() {
    let line = encode_server_event(&WireEvent::GameOver {
        match_id: 3,
        winner: None,
        board: [None; 9],
    })
    .unwrap();
    assert!(line.contains(r#""winner":null"#));

    let line = encode_server_event(&WireEvent::GameOver {
        match_id: 3,
        winner: Some(Mark::X),
        board: [None; 9],
    })
    .unwrap();
    assert!(line.contains(r#""winner":"X""#));
}

#[test]
fn reject_reasons_use_snake_case_codes() {
    let line = encode_server_event(&WireEvent::MoveRejected {
        match_id: 3,
        reason: RejectReason::NotYourTurn,
    })
    .unwrap();
    assert_eq!(
        line,
        r#"{"type":"moveRejected","matchId":3,"reason":"not_your_turn"}"#
    );

    let line = encode_server_event(&WireEvent::JoinRejected {
        match_id: 8,
        reason: RejectReason::NotFound,
    })
    .unwrap();
    assert!(line.contains(r#""reason":"not_found""#));
}

#[test]
fn presence_events_round_trip_through_a_client() {
    // A client decodes what the server encodes.
    let line = encode_server_event(&WireEvent::UserStatus {
        user_id: 2,
        state: PresenceState::Online,
    })
    .unwrap();
    assert_eq!(
        line,
        r#"{"type":"userStatus","userId":2,"state":"online"}"#
    );

    let back = decode_server_line(&line).unwrap();
    assert_eq!(
        back,
        WireEvent::UserStatus {
            user_id: 2,
            state: PresenceState::Online
        }
    );
}
