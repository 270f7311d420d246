//! Test fixtures.

mod server;

pub use server::ServerFixture;
