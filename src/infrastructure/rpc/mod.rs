//! Stdio JSON-RPC tool server exposing the landscape catalog.

mod server;
mod types;

pub use server::ToolServer;
pub use types::{RpcError, RpcRequest, RpcResponse};
