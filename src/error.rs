//! Error types.

use rasn::error::{DecodeError, EncodeError};
use rasn_ldap::{BindResponse, LdapMessage, LdapResult, ResultCode};
use tokio::sync::mpsc::error::SendError;

use crate::channel::ChannelError;

/// Failure outcome of an LDAP operation, as reported by the server.
#[derive(Debug)]
pub struct OperationError {
    /// Result code
    pub result_code: ResultCode,
    /// Matched DN
    pub matched_dn: String,
    /// Diagnostic message
    pub diagnostic_message: String,
}

impl From<LdapResult> for OperationError {
    fn from(r: LdapResult) -> Self {
        OperationError {
            result_code: r.result_code,
            matched_dn: r.matched_dn.0,
            diagnostic_message: r.diagnostic_message.0,
        }
    }
}

impl From<BindResponse> for OperationError {
    fn from(r: BindResponse) -> Self {
        OperationError {
            result_code: r.result_code,
            matched_dn: r.matched_dn.0,
            diagnostic_message: r.diagnostic_message.0,
        }
    }
}

/// Errors returned by the client.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("BER decoding error: {0}")]
    AsnDecode(#[from] DecodeError),

    #[error("BER encoding error: {0}")]
    AsnEncode(#[from] EncodeError),

    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("channel send failed")]
    ChannelSend,

    #[error("LDAP operation failed: {0:?}")]
    OperationFailed(OperationError),

    #[error("invalid filter: {0}")]
    InvalidFilter(String),

    #[error("invalid LDAP URL: {0}")]
    InvalidUrl(String),

    #[error("invalid response")]
    InvalidResponse,

    #[error("connection closed")]
    ConnectionClosed,

    #[error("GSSAPI error: {0}")]
    GssApiError(String),

    #[error("no SASL credentials in response")]
    NoSaslCredentials,
}

impl From<SendError<LdapMessage>> for Error {
    fn from(_: SendError<LdapMessage>) -> Self {
        Error::ChannelSend
    }
}
