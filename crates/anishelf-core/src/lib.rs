//! Core types and trait definitions for the anishelf catalog.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! The thread builder and the related-anime planner are pure functions over
//! already-loaded data; storage backends implement [`store::CatalogStore`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod anime;
pub mod comment;
pub mod error;
pub mod friend;
pub mod media;
pub mod notification;
pub mod related;
pub mod store;
pub mod thread;
pub mod user;
pub mod watchlist;

pub use error::{Error, Result};
