//! Client handle and builder.

use std::{
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
    time::Duration,
};

use rasn_ldap::{LdapResult, ResultCode};
use url::Url;

use crate::{channel::DEFAULT_CONNECT_TIMEOUT, conn::LdapConnection, error::Error, options::TlsOptions};

/// Result type of client operations.
pub type Result<T> = std::result::Result<T, Error>;

pub(crate) fn check_result(result: LdapResult) -> Result<()> {
    if result.result_code == ResultCode::Success
        || result.result_code == ResultCode::SaslBindInProgress
    {
        Ok(())
    } else {
        Err(Error::OperationFailed(result.into()))
    }
}

/// Configures and connects an [`LdapClient`].
pub struct LdapClientBuilder {
    address: String,
    port: u16,
    tls_options: TlsOptions,
    connect_timeout: Duration,
}

impl LdapClientBuilder {
    /// Set the port number. The default is 389.
    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set TLS options. The default is a plain connection.
    pub fn tls_options(mut self, options: TlsOptions) -> Self {
        self.tls_options = options;
        self
    }

    /// Set the TCP connect timeout. The default is 10 seconds.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect to the server and return the client.
    pub async fn connect(self) -> Result<LdapClient> {
        LdapClient::connect(self.address, self.port, self.tls_options, self.connect_timeout).await
    }
}

/// Asynchronous LDAP client.
///
/// Cloning the client is cheap; all clones share the underlying connection.
#[derive(Clone)]
pub struct LdapClient {
    pub(crate) connection: LdapConnection,
    id_counter: Arc<AtomicU32>,
}

impl LdapClient {
    /// Create a client builder for the given server host name or address.
    pub fn builder<A: AsRef<str>>(address: A) -> LdapClientBuilder {
        LdapClientBuilder {
            address: address.as_ref().to_owned(),
            port: 389,
            tls_options: TlsOptions::plain(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Create a client builder from an `ldap://` or `ldaps://` URL.
    ///
    /// The scheme picks the default port (389 or 636) and, for `ldaps`,
    /// TLS transport. An explicit port in the URL takes precedence.
    pub fn from_url<U: AsRef<str>>(url: U) -> Result<LdapClientBuilder> {
        let url = Url::parse(url.as_ref()).map_err(|e| Error::InvalidUrl(e.to_string()))?;

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl("missing host".to_owned()))?;

        let builder = match url.scheme() {
            "ldap" => Self::builder(host).port(url.port().unwrap_or(389)),
            #[cfg(tls)]
            "ldaps" => Self::builder(host)
                .port(url.port().unwrap_or(636))
                .tls_options(TlsOptions::tls()),
            other => {
                return Err(Error::InvalidUrl(format!("unsupported scheme: {other}")));
            }
        };
        Ok(builder)
    }

    pub(crate) async fn connect<A>(
        address: A,
        port: u16,
        tls_options: TlsOptions,
        connect_timeout: Duration,
    ) -> Result<Self>
    where
        A: AsRef<str>,
    {
        let connection =
            LdapConnection::connect(address, port, tls_options, connect_timeout).await?;
        Ok(Self {
            connection,
            // message id 1 is reserved for the STARTTLS exchange
            id_counter: Arc::new(AtomicU32::new(2)),
        })
    }

    pub(crate) fn new_id(&self) -> u32 {
        self.id_counter.fetch_add(1, Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_scheme_selects_port() {
        let builder = LdapClient::from_url("ldap://ldap.example.com").unwrap();
        assert_eq!(builder.port, 389);

        let builder = LdapClient::from_url("ldap://ldap.example.com:10389").unwrap();
        assert_eq!(builder.port, 10389);

        #[cfg(tls)]
        {
            let builder = LdapClient::from_url("ldaps://ldap.example.com").unwrap();
            assert_eq!(builder.port, 636);
        }
    }

    #[test]
    fn url_rejects_unknown_scheme() {
        assert!(LdapClient::from_url("http://example.com").is_err());
        assert!(LdapClient::from_url("not a url").is_err());
    }
}
