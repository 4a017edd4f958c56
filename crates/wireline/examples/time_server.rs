//! Time server: pushes a few timestamped lines to every client.
//!
//! Run:
//! - cargo run -p wireline --example time_server
//! - cargo run -p wireline --example time_server -- 7777

use std::{
    env, thread,
    time::{Duration, SystemTime, UNIX_EPOCH},
};

use wireline::{create_server, AddressFamily};

fn parse_port() -> Option<u16> {
    let mut args = env::args().skip(1);
    args.next().and_then(|s| s.parse().ok())
}

fn current_time_line() -> String {
    let since_epoch = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO);
    format!("unix time is {}.{:03}\n", since_epoch.as_secs(), since_epoch.subsec_millis())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    const REPETITIONS: usize = 5;

    let port = parse_port().unwrap_or(12345);
    let server = create_server(AddressFamily::Ipv4, port, |connection| {
        println!("[connect] {}", connection.remote_address());

        // The callback runs on the listener thread; hand the connection to a
        // worker so further accepts are not stalled.
        thread::spawn(move || {
            for i in 0..REPETITIONS {
                let line = current_time_line();
                println!("  sending \"{}\" ({}/{})", line.trim_end(), i + 1, REPETITIONS);
                if connection.send(line).and_then(|sent| sent.get()).is_err() {
                    println!("  client went away");
                    return;
                }
                if i < REPETITIONS - 1 {
                    thread::sleep(Duration::from_secs(1));
                }
            }
            let _ = connection.send("farewell, little client\n").map(|sent| sent.get());
            println!("[done] {}", connection.remote_address());
        });
    })?;

    println!("listening on {}...", server.local_address());

    loop {
        thread::park();
    }
}
