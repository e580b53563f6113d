//! Credential translation.
//!
//! - `Credential`: a username/password pair compared byte-for-byte
//! - `basic::validate` / `basic::build`: HTTP Basic header check and construction
//! - `CredentialTranslator`: the per-role inbound check plus the outbound
//!   `Authorization` rewrite, with the outbound header computed once at startup

pub mod basic;
pub mod translator;

pub use basic::{build, validate, Credential};
pub use translator::CredentialTranslator;
