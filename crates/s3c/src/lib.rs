//! S3 Client Adapter
//!
//! `s3c` is an async client for the Amazon S3 REST API, including
//! S3-compatible self-hosted services. It converts high-level operations
//! into signed HTTP requests, and converts HTTP responses back into typed
//! results or errors, handling both path-style and virtual-host-style
//! addressing.
//!
//! # Features
//!
//! - **AWS Signature Version 4**: header signing, query pre-signing, and
//!   POST policy signing
//! - **Streaming uploads**: transparent single-PUT vs multipart selection,
//!   with resume support for interrupted multipart uploads
//! - **Lazy listings**: buckets, objects, and incomplete multipart uploads
//!   are enumerated through paginating streams
//! - **Pluggable transport**: any HTTP client behind the
//!   [`Transport`](transport::Transport) trait; [reqwest](https://docs.rs/reqwest)
//!   by default
//!
//! # Getting Started
//!
//! ```rust,no_run
//! use s3c::Client;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = Client::new("https://s3.amazonaws.com", "ACCESS", "SECRET")?;
//!     for bucket in client.list_buckets().await? {
//!         println!("{} created {}", bucket.name, bucket.creation_date.to_iso8601());
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! - [`client`]: the [`Client`] type and all S3 operations
//! - [`credentials`]: access/secret key pair handling
//! - [`endpoint`]: endpoint parsing and addressing style
//! - [`post_policy`]: browser POST upload policies
//! - [`stream`]: byte stream utilities
//! - [`transport`]: the HTTP transport seam
//! - [`types`]: caller-visible records
//! - [`validation`]: argument validation

#[macro_use]
mod error;

mod header;
mod list;
mod multipart;
mod region;
mod request;
mod sig_v4;
mod utils;
mod xml;

pub mod client;
pub mod credentials;
pub mod endpoint;
pub mod post_policy;
pub mod stream;
pub mod transport;
pub mod types;
pub mod validation;

pub use self::client::Client;
pub use self::credentials::{Credentials, SecretKey};
pub use self::error::{Error, S3Result, ServerError, StdError};
pub use self::list::{ListIncompleteUploads, ListObjects};
pub use self::post_policy::{PostForm, PostPolicy, PostPolicyCondition};
pub use self::types::*;
