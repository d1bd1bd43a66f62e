//! Unbind operation.

use rasn_ldap::{LdapMessage, ProtocolOp, UnbindRequest};

use crate::client::{LdapClient, Result};

impl LdapClient {
    /// Send an unbind request. The server terminates the connection; no
    /// response is expected.
    pub async fn unbind(&mut self) -> Result<()> {
        let id = self.new_id();
        let msg = LdapMessage::new(id, ProtocolOp::UnbindRequest(UnbindRequest));
        self.connection.send(msg).await
    }
}

#[cfg(test)]
mod tests {
    use crate::testutil::{bound_client, spawn_server};

    #[tokio::test]
    async fn unbind_sends_without_awaiting_a_response() {
        let port = spawn_server(|_| Vec::new()).await;

        let mut client = bound_client(port).await;
        client.unbind().await.unwrap();
    }
}
