//! Add operation.

use rasn_ldap::{AddRequest, LdapMessage, ProtocolOp};

use crate::client::{check_result, LdapClient, Result};
use crate::error::Error;
use crate::model::Attribute;

impl LdapClient {
    /// Add a new entry with the given DN and attributes.
    pub async fn add<S, I>(&mut self, dn: S, attributes: I) -> Result<()>
    where
        S: AsRef<str>,
        I: IntoIterator<Item = Attribute>,
    {
        let id = self.new_id();

        let msg = LdapMessage::new(
            id,
            ProtocolOp::AddRequest(AddRequest {
                entry: dn.as_ref().into(),
                attributes: attributes.into_iter().map(Into::into).collect(),
            }),
        );
        let resp = self.connection.send_recv(msg).await?;

        match resp.protocol_op {
            ProtocolOp::AddResponse(resp) => check_result(resp.0),
            _ => Err(Error::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use rasn_ldap::{AddResponse, ResultCode};

    use super::*;
    use crate::testutil::{bound_client, result, spawn_server};

    #[tokio::test]
    async fn add_success() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::AddResponse(AddResponse(result(ResultCode::Success))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        client
            .add(
                "cn=new,dc=example,dc=com",
                vec![
                    Attribute::new("objectClass", ["person"]),
                    Attribute::new("cn", ["new"]),
                ],
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn add_failure_surfaces_result_code() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::AddResponse(AddResponse(result(ResultCode::EntryAlreadyExists))),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        match client
            .add("cn=new,dc=example,dc=com", vec![Attribute::new("cn", ["new"])])
            .await
        {
            Err(Error::OperationFailed(e)) => {
                assert_eq!(e.result_code, ResultCode::EntryAlreadyExists)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
