//! Interactive line client for the coordinator.
//!
//! Type commands on stdin; server events are printed as they arrive.
//!
//! ```text
//! auth alice-token
//! join 1
//! move 1 4
//! who
//! ```
//!
//! Run a server first, e.g.:
//! `COORD_AUTH_TOKENS=alice-token=1,bob-token=2 COORD_SEED_MATCH=1,2 cargo run -p coordinator-server`

use std::env;
use std::error::Error;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use coordinator_protocol::{decode_server_line, encode_client_event, ClientEvent};

fn parse_command(line: &str) -> Option<ClientEvent> {
    let mut parts = line.split_whitespace();
    match parts.next()? {
        "auth" => Some(ClientEvent::Auth {
            token: parts.next()?.to_string(),
        }),
        "join" => Some(ClientEvent::Join {
            match_id: parts.next()?.parse().ok()?,
        }),
        "move" => Some(ClientEvent::Move {
            match_id: parts.next()?.parse().ok()?,
            position: parts.next()?.parse().ok()?,
        }),
        "who" => Some(ClientEvent::RequestOnlineUsers),
        _ => None,
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Where to connect: env override or default.
    let addr = env::var("COORD_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:9090".to_string());

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    println!("Connected. Commands: auth <token> | join <matchId> | move <matchId> <pos> | who");

    let (read_half, mut write_half) = stream.into_split();

    // Print every server event as it arrives.
    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            match decode_server_line(&line) {
                Ok(event) => println!("<< {:?}", event),
                Err(e) => println!("<< undecodable: {e}"),
            }
        }
        println!("Server closed the connection.");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            break;
        }

        let Some(event) = parse_command(trimmed) else {
            eprintln!("Could not parse command.");
            continue;
        };

        let framed = format!("{}\n", encode_client_event(&event)?);
        write_half.write_all(framed.as_bytes()).await?;
    }

    Ok(())
}
