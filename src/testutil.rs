//! Loopback LDAP server scaffolding for tests.

use futures::{SinkExt, StreamExt};
use rasn_ldap::{BindResponse, LdapMessage, LdapResult, ProtocolOp, ResultCode};
use tokio::net::TcpListener;
use tokio_util::codec::Framed;

use crate::codec::LdapCodec;

/// Operation outcome with empty matched DN and diagnostic message.
pub(crate) fn result(code: ResultCode) -> LdapResult {
    LdapResult::new(code, "".into(), "".into())
}

/// Accept one connection and answer each request with the messages produced
/// by `handler`. Bind requests are granted automatically; an unbind request
/// ends the session. Returns the port the server listens on.
pub(crate) async fn spawn_server<F>(mut handler: F) -> u16
where
    F: FnMut(LdapMessage) -> Vec<LdapMessage> + Send + 'static,
{
    let tcp = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = tcp.local_addr().unwrap().port();

    tokio::spawn(async move {
        let (stream, _) = tcp.accept().await.unwrap();
        let mut framed = Framed::new(stream, LdapCodec);
        while let Some(Ok(msg)) = framed.next().await {
            match msg.protocol_op {
                ProtocolOp::UnbindRequest(_) => break,
                ProtocolOp::BindRequest(_) => {
                    let resp =
                        BindResponse::new(ResultCode::Success, "".into(), "".into(), None, None);
                    framed
                        .send(LdapMessage::new(
                            msg.message_id,
                            ProtocolOp::BindResponse(resp),
                        ))
                        .await
                        .unwrap();
                }
                _ => {
                    for resp in handler(msg) {
                        framed.send(resp).await.unwrap();
                    }
                }
            }
        }
    });

    port
}

/// Connect to a loopback server and perform a simple bind.
pub(crate) async fn bound_client(port: u16) -> crate::LdapClient {
    let mut client = crate::LdapClient::builder("127.0.0.1")
        .port(port)
        .connect()
        .await
        .unwrap();
    client
        .simple_bind("cn=admin,dc=example,dc=com", "secret")
        .await
        .unwrap();
    client
}
