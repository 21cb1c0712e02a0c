//! Common types used across the gateway modules.
//!
//! ## Domain Types
//!
//! - [`Application`] - A configured credential tenant
//! - [`AuthMethod`] - Authentication method selected by an application
//! - [`Principal`] - Identity resolved for an allowed request
//! - [`CredentialEnvelope`] - Decoded username/secret pair

pub mod application;
pub mod principal;

pub use application::{ApiKeyMode, Application, ApplicationDraft, AuthMethod};
pub use principal::{CredentialEnvelope, Principal};
