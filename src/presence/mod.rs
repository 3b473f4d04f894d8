// Public API - what other modules can use
pub use handlers::{health, rpc};
pub use membership::MembershipController;
pub use middleware::caller_identity;
pub use query::PresenceQueryService;
pub use service::PresenceService;
pub use types::{PayloadError, PresenceRequest, RpcId, RpcReply};

// Internal modules
mod handlers;
mod membership;
pub mod middleware;
pub mod models;
mod query;
mod service;
pub mod types;
