//! Standalone mock of the datasets and tokens APIs.
//!
//! Point a client at it with `MAPBOX_ORIGIN=http://127.0.0.1:<port>`. Any
//! token whose payload decodes to `{"u": "<owner>"}` is accepted.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::TcpListener;

const DEFAULT_PORT: u16 = 3000;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let port = std::env::var("PORT")
        .ok()
        .and_then(|port| port.parse().ok())
        .unwrap_or(DEFAULT_PORT);
    let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
    let addr = listener.local_addr()?;
    println!("mock datasets API listening on http://{addr}");
    println!("export MAPBOX_ORIGIN=http://{addr}");
    mock_server::run(listener).await
}
