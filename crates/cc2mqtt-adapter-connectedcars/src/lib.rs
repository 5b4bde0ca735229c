//! # Connected Cars Adapter
//!
//! Snapshot fetcher for the Connected Cars GraphQL API.
//!
//! ## Requests
//!
//! Every request is a `POST` of `{"query": ...}` to the GraphQL endpoint with
//! - `Authorization: Bearer <token>`
//! - `x-organization-namespace: <namespace>` (e.g. `semler:minskoda`)
//!
//! Obtaining the token is out of scope; the caller supplies one.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod client;
pub mod query;

pub use client::{ClientError, ConnectedCarsClient, ConnectedCarsConfig};
pub use query::{parse_response, FULL_QUERY};
