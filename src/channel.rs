//! Low-level LDAP channel: TCP/TLS transport and message framing.

use std::{io, time::Duration};

use futures::{SinkExt, StreamExt};
use log::{debug, warn};
use rasn_ldap::LdapMessage;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
    sync::mpsc,
};
use tokio_util::codec::Framed;

use crate::{
    codec::LdapCodec,
    options::{TlsKind, TlsOptions},
};

const CHANNEL_SIZE: usize = 1024;

/// Default TCP connect timeout.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

pub type LdapMessageSender = mpsc::Sender<LdapMessage>;
pub type LdapMessageReceiver = mpsc::Receiver<LdapMessage>;

#[cfg(tls)]
trait TlsStream: AsyncRead + AsyncWrite + Unpin + Send {}

#[cfg(feature = "tls-native-tls")]
impl<T: AsyncRead + AsyncWrite + Unpin + Send> TlsStream for tokio_native_tls::TlsStream<T> {}

#[cfg(feature = "tls-rustls")]
impl<T: AsyncRead + AsyncWrite + Unpin + Send> TlsStream for tokio_rustls::client::TlsStream<T> {}

/// Transport-level errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    ConnectTimeout(#[from] tokio::time::error::Elapsed),

    #[error("STARTTLS negotiation failed")]
    StartTlsFailed,

    #[cfg(feature = "tls-native-tls")]
    #[error(transparent)]
    NativeTls(#[from] native_tls::Error),

    #[cfg(feature = "tls-rustls")]
    #[error(transparent)]
    Rustls(#[from] rustls::Error),

    #[cfg(feature = "tls-rustls")]
    #[error(transparent)]
    DnsName(#[from] rustls_pki_types::InvalidDnsNameError),
}

pub type ChannelResult<T> = Result<T, ChannelError>;

/// Splits a connected stream into framed sender/receiver endpoints and
/// drives the wire in a background task. The task ends when the socket is
/// closed, a codec error occurs, or both endpoints are dropped.
fn spawn_pump<S>(stream: S) -> (LdapMessageSender, LdapMessageReceiver)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let framed = Framed::new(stream, LdapCodec);

    let (tx_in, rx_in) = mpsc::channel(CHANNEL_SIZE);
    let (tx_out, mut rx_out) = mpsc::channel::<LdapMessage>(CHANNEL_SIZE);

    tokio::spawn(async move {
        let (mut sink, mut wire) = framed.split();
        loop {
            tokio::select! {
                outbound = rx_out.recv() => match outbound {
                    Some(msg) => {
                        if let Err(e) = sink.send(msg).await {
                            warn!("send to wire failed: {e}");
                            break;
                        }
                    }
                    // all senders gone, no more requests can arrive
                    None => break,
                },
                inbound = wire.next() => match inbound {
                    Some(Ok(msg)) => {
                        if tx_in.send(msg).await.is_err() {
                            break;
                        }
                    }
                    Some(Err(e)) => {
                        warn!("receive from wire failed: {e}");
                        break;
                    }
                    None => break,
                },
            }
        }
        debug!("message pump terminated");
    });

    (tx_out, rx_in)
}

/// LDAP TCP channel connector.
pub struct LdapChannel {
    address: String,
    port: u16,
    connect_timeout: Duration,
}

impl LdapChannel {
    /// Create a client-side channel for the given server address and port.
    pub fn for_client<S>(address: S, port: u16) -> Self
    where
        S: AsRef<str>,
    {
        LdapChannel {
            address: address.as_ref().to_owned(),
            port,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Override the TCP connect timeout.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Connect to the server, performing the configured TLS handshake.
    /// Returns the message sender/receiver endpoint pair.
    pub async fn connect(
        self,
        tls_options: TlsOptions,
    ) -> ChannelResult<(LdapMessageSender, LdapMessageReceiver)> {
        let address = tokio::net::lookup_host((self.address.as_str(), self.port))
            .await?
            .next()
            .ok_or_else(|| {
                io::Error::new(io::ErrorKind::NotFound, "address resolution returned no entries")
            })?;

        let stream =
            tokio::time::timeout(self.connect_timeout, TcpStream::connect(&address)).await??;

        debug!("connection established to {address}");

        let channel = match tls_options.kind {
            TlsKind::Plain => spawn_pump(stream),
            #[cfg(tls)]
            TlsKind::Tls => spawn_pump(self.tls_connect(tls_options, stream).await?),
            #[cfg(tls)]
            TlsKind::StartTls => spawn_pump(self.starttls_connect(tls_options, stream).await?),
        };
        Ok(channel)
    }

    #[cfg(tls)]
    async fn tls_connect<S>(
        &self,
        tls_options: TlsOptions,
        stream: S,
    ) -> ChannelResult<Box<dyn TlsStream>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        #[cfg(feature = "tls-native-tls")]
        return Ok(Box::new(
            self.tls_connect_native_tls(tls_options, stream).await?,
        ));
        #[cfg(feature = "tls-rustls")]
        return Ok(Box::new(self.tls_connect_rustls(tls_options, stream).await?));
    }

    #[cfg(tls)]
    async fn starttls_connect<S>(
        &self,
        tls_options: TlsOptions,
        mut stream: S,
    ) -> ChannelResult<Box<dyn TlsStream>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        use rasn_ldap::{ExtendedRequest, ProtocolOp, ResultCode};

        const STARTTLS_TIMEOUT: Duration = Duration::from_secs(30);

        debug!("beginning STARTTLS negotiation");
        let mut framed = Framed::new(&mut stream, LdapCodec);
        let req = ExtendedRequest {
            request_name: crate::oid::STARTTLS_OID.into(),
            request_value: None,
        };
        framed
            .send(LdapMessage::new(1, ProtocolOp::ExtendedReq(req)))
            .await
            .map_err(|_| ChannelError::StartTlsFailed)?;
        match tokio::time::timeout(STARTTLS_TIMEOUT, framed.next()).await {
            Ok(Some(Ok(item))) => match item.protocol_op {
                ProtocolOp::ExtendedResp(resp)
                    if resp.result_code == ResultCode::Success && item.message_id == 1 =>
                {
                    debug!("STARTTLS accepted, switching protocols");
                    drop(framed);
                    return self.tls_connect(tls_options, stream).await;
                }
                _ => warn!("server refused STARTTLS"),
            },
            Ok(_) => warn!("unexpected response during STARTTLS negotiation"),
            Err(_) => warn!("timeout waiting for the STARTTLS reply"),
        }
        Err(ChannelError::StartTlsFailed)
    }

    #[cfg(feature = "tls-native-tls")]
    async fn tls_connect_native_tls<S>(
        &self,
        tls_options: TlsOptions,
        stream: S,
    ) -> ChannelResult<tokio_native_tls::TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let domain = tls_options
            .domain_name
            .as_deref()
            .unwrap_or(&self.address)
            .to_owned();

        let mut builder = native_tls::TlsConnector::builder();
        for cert in tls_options.ca_certs {
            builder.add_root_certificate(cert);
        }
        if let Some(identity) = tls_options.identity {
            builder.identity(identity);
        }
        if !tls_options.verify_certs {
            builder.danger_accept_invalid_certs(true);
        }
        if !tls_options.verify_hostname {
            builder.danger_accept_invalid_hostnames(true);
        }

        debug!("performing TLS handshake using native-tls, SNI: {domain}");

        let connector = tokio_native_tls::TlsConnector::from(builder.build()?);
        let stream = connector
            .connect(&domain, stream)
            .await
            .map_err(ChannelError::NativeTls)?;

        debug!("TLS handshake succeeded");

        Ok(stream)
    }

    #[cfg(feature = "tls-rustls")]
    async fn tls_connect_rustls<S>(
        &self,
        tls_options: TlsOptions,
        stream: S,
    ) -> ChannelResult<tokio_rustls::client::TlsStream<S>>
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        use std::sync::Arc;

        use rustls::{ClientConfig, RootCertStore};
        use rustls_pki_types::ServerName;

        let domain = ServerName::try_from(
            tls_options
                .domain_name
                .as_deref()
                .unwrap_or(&self.address)
                .to_owned(),
        )?;

        let builder = if tls_options.verify_certs {
            let mut roots = RootCertStore::empty();
            let native = rustls_native_certs::load_native_certs();
            for err in &native.errors {
                warn!("native certificate store: {err}");
            }
            roots.add_parsable_certificates(native.certs);
            for cert in tls_options.ca_certs {
                roots.add(cert)?;
            }
            ClientConfig::builder().with_root_certificates(roots)
        } else {
            ClientConfig::builder()
                .dangerous()
                .with_custom_certificate_verifier(Arc::new(danger::NoCertVerification))
        };

        let config = match tls_options.identity {
            Some(identity) => {
                builder.with_client_auth_cert(identity.certificates, identity.private_key)?
            }
            None => builder.with_no_client_auth(),
        };

        debug!("performing TLS handshake using rustls, SNI: {domain:?}");

        let connector = tokio_rustls::TlsConnector::from(Arc::new(config));
        let stream = connector.connect(domain, stream).await?;

        debug!("TLS handshake succeeded");

        Ok(stream)
    }
}

#[cfg(feature = "tls-rustls")]
mod danger {
    use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
    use rustls::crypto::CryptoProvider;
    use rustls::{DigitallySignedStruct, SignatureScheme};
    use rustls_pki_types::{CertificateDer, ServerName, UnixTime};

    #[derive(Debug)]
    pub(super) struct NoCertVerification;

    impl ServerCertVerifier for NoCertVerification {
        fn verify_server_cert(
            &self,
            _end_entity: &CertificateDer<'_>,
            _intermediates: &[CertificateDer<'_>],
            _server_name: &ServerName<'_>,
            _ocsp_response: &[u8],
            _now: UnixTime,
        ) -> Result<ServerCertVerified, rustls::Error> {
            Ok(ServerCertVerified::assertion())
        }

        fn verify_tls12_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn verify_tls13_signature(
            &self,
            _message: &[u8],
            _cert: &CertificateDer<'_>,
            _dss: &DigitallySignedStruct,
        ) -> Result<HandshakeSignatureValid, rustls::Error> {
            Ok(HandshakeSignatureValid::assertion())
        }

        fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
            CryptoProvider::get_default()
                .map(|p| p.signature_verification_algorithms.supported_schemes())
                .unwrap_or_default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use rasn_ldap::{ProtocolOp, UnbindRequest};
    use tokio::net::TcpListener;

    use super::*;

    fn new_msg(id: u32) -> LdapMessage {
        LdapMessage::new(id, ProtocolOp::UnbindRequest(UnbindRequest))
    }

    // echoes back the first `num_msgs` received messages, then hangs up
    async fn start_echo_server(num_msgs: usize) -> SocketAddr {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = tcp.local_addr().unwrap();

        tokio::spawn(async move {
            if let Ok((stream, _)) = tcp.accept().await {
                let framed = Framed::new(stream, LdapCodec);
                let (mut sink, mut wire) = framed.split();
                for _ in 0..num_msgs {
                    match wire.next().await {
                        Some(Ok(msg)) => sink.send(msg).await.unwrap(),
                        _ => break,
                    }
                }
            }
        });

        address
    }

    #[tokio::test]
    async fn echo_roundtrip() {
        let address = start_echo_server(2).await;

        let (sender, mut receiver) = LdapChannel::for_client("127.0.0.1", address.port())
            .connect(TlsOptions::default())
            .await
            .unwrap();

        sender.send(new_msg(1)).await.unwrap();
        sender.send(new_msg(2)).await.unwrap();

        let mut seen = 0;
        while let Some(msg) = receiver.recv().await {
            seen += 1;
            assert_eq!(msg, new_msg(seen));
        }
        assert_eq!(seen, 2);
    }

    #[tokio::test]
    async fn connect_refused() {
        let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = tcp.local_addr().unwrap().port();
        drop(tcp);

        let res = LdapChannel::for_client("127.0.0.1", port)
            .connect(TlsOptions::default())
            .await;
        assert!(res.is_err());
    }
}
