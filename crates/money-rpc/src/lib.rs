//! Inbound RPC surface (spec §6): the business-verb jsonrpsee trait plus
//! its server implementation. The webhook HTTP surface is wired directly
//! in `money-node` instead of here — it needs the raw request body for
//! signature verification ahead of any JSON parsing, which doesn't fit a
//! jsonrpsee method (see DESIGN.md's money-rpc entry).

pub mod api;
pub mod server;
pub mod types;

pub use api::MoneyApiServer;
pub use server::{RpcServer, RpcServerState, SweeperHealth};
