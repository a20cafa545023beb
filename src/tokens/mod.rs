//! Approval token gateway.
//!
//! Tokens let an approver decide a request from an email link without an
//! interactive session. A redemption claims the token, runs the transition
//! and then either consumes the token (success) or releases it (failure), so
//! double submissions are refused and failed attempts can be retried.

mod crypto;
mod gateway;

pub use crypto::{MIN_ENTROPY_BYTES, generate_token, hash_token};
pub use gateway::TokenGateway;
