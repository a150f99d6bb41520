//! Request handlers for RPC operations.

mod rpc;

pub use rpc::*;
