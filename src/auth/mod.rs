//! Authentication types: session records and HMAC primitives.
//!
//! # Session Types
//!
//! The platform issues two kinds of sessions:
//!
//! - **Offline sessions**: app-level tokens that don't expire, one per
//!   store. Used for background sync and webhook-driven work.
//! - **Online sessions**: user-specific tokens that expire.
//!
//! The OAuth protocol itself (authorization redirect, token exchange) is an
//! external collaborator; this crate only models the session records it
//! produces and the signature primitives webhook verification needs.

pub mod hmac;
pub mod session;

pub use session::Session;
