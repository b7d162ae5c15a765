//! Shopfront storefront client library.
//!
//! Cart and wishlist stores kept in sync with the Shopfront backend, the
//! session they authenticate with, and the storage they persist to.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod notify;
pub mod session;
pub mod state;
pub mod storage;
pub mod store;
pub mod sync;
