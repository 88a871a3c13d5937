// tests/integration_test.rs

//! Integration tests: each stands a real `TcpListener` up on an ephemeral
//! port and drives it with a raw `tokio::net::TcpStream`, exercising the
//! wire protocol end to end rather than calling handlers directly.

mod integration {
    pub mod command_test;
    pub mod persistence_test;
    pub mod replication_test;
    pub mod test_helpers;
}
