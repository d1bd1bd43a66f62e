//! Modify operation.

use rasn_ldap::{LdapMessage, ProtocolOp};

use crate::client::{check_result, LdapClient, Result};
use crate::error::Error;
use crate::request::ModifyRequest;

impl LdapClient {
    /// Apply the changes of a [`ModifyRequest`] to its target entry.
    pub async fn modify(&mut self, request: ModifyRequest) -> Result<()> {
        let id = self.new_id();

        let msg = LdapMessage::new(id, ProtocolOp::ModifyRequest(request.into()));
        let resp = self.connection.send_recv(msg).await?;

        match resp.protocol_op {
            ProtocolOp::ModifyResponse(resp) => check_result(resp.0),
            _ => Err(Error::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use rasn_ldap::{LdapMessage, ModifyResponse, ProtocolOp, ResultCode};

    use super::*;
    use crate::model::Attribute;
    use crate::testutil::{bound_client, result, spawn_server};

    fn mobile_request() -> ModifyRequest {
        ModifyRequest::builder("cn=user,dc=example,dc=com")
            .replace(Attribute::new("mobile", ["123456"]))
            .build()
    }

    #[tokio::test]
    async fn modify_success() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::ModifyResponse(ModifyResponse(result(ResultCode::Success))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        client.modify(mobile_request()).await.unwrap();
    }

    #[tokio::test]
    async fn modify_failure_surfaces_result_code() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::ModifyResponse(ModifyResponse(result(
                    ResultCode::UnwillingToPerform,
                ))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        match client.modify(mobile_request()).await {
            Err(Error::OperationFailed(e)) => {
                assert_eq!(e.result_code, ResultCode::UnwillingToPerform)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
