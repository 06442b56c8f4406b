//! Testing utilities
//!
//! - [`MockEngine`] records engine calls and returns scripted results
//! - [`Counterpart`] plays the client library over in-process channels
//! - [`loopback`] wires both to a serving [`Bridge`](crate::Bridge)

mod counterpart;
mod mock_engine;

pub use counterpart::{loopback, Counterpart, DEFAULT_RECV_TIMEOUT};
pub use mock_engine::{Capability, EngineCall, MockEngine, MockEngineBuilder, MockWorker};
