use std::{
    collections::HashMap,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
    time::Duration,
};

use futures::Stream;
use log::debug;
use parking_lot::RwLock;
use rasn_ldap::{LdapMessage, ProtocolOp};
use tokio::sync::mpsc;

use crate::{
    channel::{LdapChannel, LdapMessageReceiver, LdapMessageSender},
    error::Error,
    oid,
    options::TlsOptions,
};

const CHANNEL_SIZE: usize = 1024;

type RequestMap = Arc<RwLock<HashMap<u32, LdapMessageSender>>>;

/// A shared handle to one LDAP connection. Responses are routed back to the
/// operation that sent the request, keyed by message id.
#[derive(Clone)]
pub(crate) struct LdapConnection {
    requests: RequestMap,
    channel_sender: LdapMessageSender,
}

impl LdapConnection {
    pub(crate) async fn connect<A>(
        address: A,
        port: u16,
        tls_options: TlsOptions,
        connect_timeout: Duration,
    ) -> Result<Self, Error>
    where
        A: AsRef<str>,
    {
        let (channel_sender, channel_receiver) = LdapChannel::for_client(address, port)
            .connect_timeout(connect_timeout)
            .connect(tls_options)
            .await?;

        let connection = Self {
            requests: RequestMap::default(),
            channel_sender,
        };
        connection.spawn_dispatcher(channel_receiver);

        Ok(connection)
    }

    fn spawn_dispatcher(&self, mut receiver: LdapMessageReceiver) {
        let requests = self.requests.clone();

        tokio::spawn(async move {
            while let Some(msg) = receiver.recv().await {
                match msg.protocol_op {
                    // Unsolicited notice of disconnection: the server is about
                    // to drop the connection.
                    ProtocolOp::ExtendedResp(ref resp)
                        if resp.response_name.as_deref()
                            == Some(oid::NOTICE_OF_DISCONNECTION_OID) =>
                    {
                        debug!("notice of disconnection received, exiting");
                        break;
                    }
                    _ => {
                        let sender = requests.read().get(&msg.message_id).cloned();
                        if let Some(sender) = sender {
                            let _ = sender.send(msg).await;
                        } else {
                            debug!("dropping response to unknown message id {}", msg.message_id);
                        }
                    }
                }
            }
            debug!("connection dispatcher terminated");
            requests.write().clear();
        });
    }

    /// Send a request and open a response stream for its message id.
    pub(crate) async fn send_recv_stream(&mut self, msg: LdapMessage) -> Result<MessageStream, Error> {
        let id = msg.message_id;

        let (tx, rx) = mpsc::channel(CHANNEL_SIZE);
        self.requests.write().insert(id, tx);

        if let Err(e) = self.channel_sender.send(msg).await {
            self.requests.write().remove(&id);
            return Err(e.into());
        }

        Ok(MessageStream {
            id,
            requests: self.requests.clone(),
            receiver: rx,
        })
    }

    /// Send a request for which no response is expected.
    pub(crate) async fn send(&mut self, msg: LdapMessage) -> Result<(), Error> {
        Ok(self.channel_sender.send(msg).await?)
    }

    /// Send a request and wait for its single response message.
    pub(crate) async fn send_recv(&mut self, msg: LdapMessage) -> Result<LdapMessage, Error> {
        self.send_recv_stream(msg)
            .await?
            .next_message()
            .await
            .ok_or(Error::ConnectionClosed)
    }
}

/// All response messages belonging to one in-flight operation.
pub(crate) struct MessageStream {
    id: u32,
    requests: RequestMap,
    receiver: LdapMessageReceiver,
}

impl MessageStream {
    async fn next_message(&mut self) -> Option<LdapMessage> {
        self.receiver.recv().await
    }
}

impl Stream for MessageStream {
    type Item = LdapMessage;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.receiver.poll_recv(cx)
    }
}

impl Drop for MessageStream {
    fn drop(&mut self) {
        self.requests.write().remove(&self.id);
    }
}
