//! webfinger - WebFinger (RFC 7033) client library
//!
//! Resolves an account identifier or URI to its JSON Resource Descriptor.
//! Identifiers are normalized into a [`Resource`], queried at the host's
//! `/.well-known/webfinger` endpoint and decoded into a [`Jrd`].
//!
//! # Example
//!
//! ```no_run
//! use webfinger::{Client, Resource};
//!
//! # async fn example() -> Result<(), webfinger::Error> {
//! let resource = Resource::parse("bob@example.com")?;
//! assert_eq!(resource.webfinger_host(), "example.com");
//!
//! let jrd = Client::new().lookup_resource(&resource, &[]).await?;
//! for link in &jrd.links {
//!     println!("{}: {:?}", link.rel, link.href);
//! }
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod jrd;
pub mod resource;
pub mod transport;

// Re-export primary types at crate root for convenience
pub use client::{Client, lookup};
pub use error::Error;
pub use jrd::{Jrd, Link, Properties};
pub use resource::Resource;
pub use transport::{HttpResponse, ReqwestTransport, Transport};

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
