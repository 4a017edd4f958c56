//! Time client: connects to the time server and prints whatever arrives.
//!
//! Run:
//! - cargo run -p wireline --example time_client
//! - cargo run -p wireline --example time_client -- 127.0.0.1 7777

use std::{env, time::Duration};

use wireline::{create_client, AddressFamily};

fn parse_target() -> (String, u16) {
    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port = args.next().and_then(|s| s.parse().ok()).unwrap_or(12345);
    (host, port)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (host, port) = parse_target();
    let connection = create_client(AddressFamily::Unspecified, &host, port)?;
    println!("connected: {} -> {}", connection.local_address(), connection.remote_address());

    loop {
        let bytes = connection.receive_with_timeout(512, Duration::from_secs(3))?.get()?;
        if bytes.is_empty() {
            // Timeout or peer close; either way the show is over.
            break;
        }
        print!("{}", String::from_utf8_lossy(&bytes));
    }

    println!("connection closed");
    Ok(())
}
