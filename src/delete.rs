//! Delete operation.

use rasn_ldap::{DelRequest, LdapMessage, ProtocolOp};

use crate::client::{check_result, LdapClient, Result};
use crate::error::Error;

impl LdapClient {
    /// Delete the entry with the given DN.
    pub async fn delete<S: AsRef<str>>(&mut self, dn: S) -> Result<()> {
        let id = self.new_id();

        let msg = LdapMessage::new(
            id,
            ProtocolOp::DelRequest(DelRequest(dn.as_ref().into())),
        );
        let resp = self.connection.send_recv(msg).await?;

        match resp.protocol_op {
            ProtocolOp::DelResponse(resp) => check_result(resp.0),
            _ => Err(Error::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use rasn_ldap::{DelResponse, ResultCode};

    use super::*;
    use crate::testutil::{bound_client, result, spawn_server};

    #[tokio::test]
    async fn delete_success() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::DelResponse(DelResponse(result(ResultCode::Success))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        client.delete("cn=old,dc=example,dc=com").await.unwrap();
    }

    #[tokio::test]
    async fn delete_failure_surfaces_result_code() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::DelResponse(DelResponse(result(ResultCode::NoSuchObject))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        match client.delete("cn=missing,dc=example,dc=com").await {
            Err(Error::OperationFailed(e)) => {
                assert_eq!(e.result_code, ResultCode::NoSuchObject)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
