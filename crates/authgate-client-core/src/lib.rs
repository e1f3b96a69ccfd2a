//! Client side authentication session: holds the tokens, profile,
//! permissions and roles of the current user, caches them in client storage
//! and answers access questions for the rest of the application.
//!
//! NB: [`Client`] assumes that the async runtime has already been started
//! before any of its functions are called

#![warn(unused_crate_dependencies)]


mod client;
pub mod configuration;
mod context;
pub mod guard;
mod manager;
pub mod session;
pub mod storage;

pub use client::{Client, UiCallBack, DUMMY_ARGUMENT};
pub use configuration::{get_configuration, ClientSettings};
pub use context::{
    try_use_session, use_session, DynSessionManager, NoSessionProviderError, SessionHandle,
    SessionProvider,
};
pub use guard::{MatchMode, PermissionGate, RouteDecision, RouteGuard};
pub use manager::SessionManager;
pub use session::{Session, SessionStatus};
