//! Connection security options.

#[cfg(feature = "tls-native-tls")]
pub use native_tls::{Certificate, Identity};

#[cfg(feature = "tls-rustls")]
pub use rustls_pki_types::{CertificateDer, PrivateKeyDer};

#[cfg(feature = "tls-rustls")]
type Certificate = CertificateDer<'static>;

#[cfg(feature = "tls-rustls")]
type PrivateKey = PrivateKeyDer<'static>;

#[cfg(feature = "tls-rustls")]
pub(crate) struct Identity {
    pub(crate) private_key: PrivateKey,
    pub(crate) certificates: Vec<Certificate>,
}

#[derive(Clone, PartialEq)]
pub(crate) enum TlsKind {
    Plain,
    #[cfg(tls)]
    Tls,
    #[cfg(tls)]
    StartTls,
}

/// Transport security settings for a connection.
///
/// The default is a plain connection. With one of the TLS backend features
/// enabled, [`tls`](TlsOptions::tls) selects TLS from the first byte and
/// [`start_tls`](TlsOptions::start_tls) upgrades a plain connection via the
/// StartTLS extended operation.
pub struct TlsOptions {
    pub(crate) kind: TlsKind,
    #[cfg(tls)]
    pub(crate) ca_certs: Vec<Certificate>,
    #[cfg(feature = "tls-native-tls")]
    pub(crate) verify_hostname: bool,
    #[cfg(tls)]
    pub(crate) verify_certs: bool,
    #[cfg(tls)]
    pub(crate) identity: Option<Identity>,
    #[cfg(tls)]
    pub(crate) domain_name: Option<String>,
}

impl Default for TlsOptions {
    fn default() -> Self {
        Self::plain()
    }
}

impl TlsOptions {
    fn new(kind: TlsKind) -> Self {
        Self {
            kind,
            #[cfg(tls)]
            ca_certs: Vec::new(),
            #[cfg(feature = "tls-native-tls")]
            verify_hostname: true,
            #[cfg(tls)]
            verify_certs: true,
            #[cfg(tls)]
            identity: None,
            #[cfg(tls)]
            domain_name: None,
        }
    }

    /// Use a plain connection without transport security.
    pub fn plain() -> Self {
        Self::new(TlsKind::Plain)
    }

    #[cfg(tls)]
    /// Connect over TLS.
    pub fn tls() -> Self {
        Self::new(TlsKind::Tls)
    }

    #[cfg(tls)]
    /// Connect over a plain socket, then upgrade with StartTLS.
    pub fn start_tls() -> Self {
        Self::new(TlsKind::StartTls)
    }

    #[cfg(tls)]
    /// Add a CA root certificate trusted during the TLS handshake.
    pub fn ca_cert(mut self, cert: Certificate) -> Self {
        self.ca_certs.push(cert);
        self
    }

    #[cfg(feature = "tls-native-tls")]
    /// Set the client identity for mutual TLS authentication.
    pub fn identity(mut self, identity: Identity) -> Self {
        self.identity = Some(identity);
        self
    }

    #[cfg(feature = "tls-rustls")]
    /// Set the client identity for mutual TLS authentication.
    pub fn identity(mut self, private_key: PrivateKey, certificates: Vec<Certificate>) -> Self {
        self.identity = Some(Identity {
            private_key,
            certificates,
        });
        self
    }

    #[cfg(tls)]
    /// Override the domain name used for SNI and certificate matching.
    /// The default is the host name the connection was made to.
    pub fn domain_name<S: AsRef<str>>(mut self, domain_name: S) -> Self {
        self.domain_name = Some(domain_name.as_ref().to_owned());
        self
    }

    #[cfg(feature = "tls-native-tls")]
    /// Enable or disable host name validation of the server certificate.
    /// Enabled by default. Only consulted when certificate verification
    /// itself is enabled.
    pub fn verify_hostname(mut self, flag: bool) -> Self {
        self.verify_hostname = flag;
        self
    }

    #[cfg(tls)]
    /// Enable or disable server certificate validation. Enabled by default.
    pub fn verify_certs(mut self, flag: bool) -> Self {
        self.verify_certs = flag;
        self
    }
}
