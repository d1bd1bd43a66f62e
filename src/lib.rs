//! An asynchronous LDAP client built on Tokio.
//!
//! The entry point is [`LdapClient`], obtained through its builder:
//!
//! ```rust,no_run
//! use ldap_client::LdapClient;
//!
//! # async fn demo() -> Result<(), ldap_client::Error> {
//! let mut client = LdapClient::builder("ldap.example.com").connect().await?;
//! client.simple_bind("cn=admin,dc=example,dc=com", "secret").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Search results are lazy [`futures::Stream`]s: [`search`](LdapClient::search)
//! yields entries one by one, and [`search_paged`](LdapClient::search_paged)
//! yields whole pages driven by the simple paged results control.
//!
//! Transport security is configured with [`TlsOptions`]; either the
//! `tls-native-tls` (default) or the `tls-rustls` cargo feature selects the
//! TLS backend. Protocol types from [`rasn_ldap`] are re-exported so that
//! request scopes, result codes and raw protocol structures can be named
//! without an explicit dependency.

pub use bytes;
pub use rasn_ldap;

pub use client::*;
pub use error::{Error, OperationError};
pub use model::*;
pub use options::*;
pub use request::*;
pub use search::{Pages, SearchEntries};
pub use util::{dn_escape, ldap_escape};

pub(crate) mod codec;
pub(crate) mod conn;
pub(crate) mod filter;

pub mod channel;
pub mod client;
pub mod controls;
pub mod error;
pub mod model;
pub mod options;
pub mod request;
pub mod util;

#[cfg(test)]
pub(crate) mod testutil;

mod add;
mod bind;
mod delete;
mod extended;
mod modify;
mod oid;
mod search;
mod unbind;
