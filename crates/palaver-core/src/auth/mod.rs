//! Identity session management.
//!
//! `provider` defines the identity-provider port; `session` owns the live
//! session value and drives sign-in/sign-out.

pub mod provider;
pub mod session;

pub use provider::IdentityProvider;
pub use session::SessionManager;
