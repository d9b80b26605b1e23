//! HTTP adapter - ingress dispatch for duplex upgrades and one-shot
//! submissions.

mod ingress;

pub use ingress::{gateway_router, GatewayState};
