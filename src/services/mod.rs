//! Core services: the credential store, per-request storage clients, and the
//! listing and download operations built on top of them.

pub mod client_factory;
pub mod credential_store;
pub mod lister;
pub mod streamer;
