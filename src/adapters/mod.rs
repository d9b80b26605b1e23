//! Adapters - concrete implementations behind the ports.

pub mod audit;
pub mod broker;
pub mod http;
pub mod websocket;
