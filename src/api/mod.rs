//! HTTP API module for the Leave Engine.
//!
//! This module exposes the request lifecycle, balances and approval links
//! as REST endpoints. The acting employee is taken from the `x-actor-id`
//! header.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{ACTOR_HEADER, DecisionRequest};
pub use response::{ApiError, ApiErrorResponse, BalanceResponse};
pub use state::AppState;
