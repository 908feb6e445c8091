// Kickoff - match lifecycle and availability server core
//
// Amateur football teams publish open fixtures, other teams request them,
// and players confirm whether they can play.
//
// Activities live per-domain in domains/*/activities/.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
