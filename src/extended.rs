//! Extended operations.

use rasn_ldap::{ExtendedRequest, LdapMessage, LdapResult, ProtocolOp};

use crate::client::{check_result, LdapClient, Result};
use crate::error::Error;
use crate::oid;

impl LdapClient {
    /// Send a "Who am I?" extended request (RFC 4532) and return the
    /// authorization identity, if the server supplied one.
    pub async fn whoami(&mut self) -> Result<Option<String>> {
        let id = self.new_id();

        let msg = LdapMessage::new(
            id,
            ProtocolOp::ExtendedReq(ExtendedRequest {
                request_name: oid::WHOAMI_OID.into(),
                request_value: None,
            }),
        );

        let resp = self.connection.send_recv(msg).await?;

        match resp.protocol_op {
            ProtocolOp::ExtendedResp(resp) => {
                check_result(LdapResult::new(
                    resp.result_code,
                    resp.matched_dn,
                    resp.diagnostic_message,
                ))?;
                Ok(resp
                    .response_value
                    .map(|v| String::from_utf8_lossy(&v).into_owned()))
            }
            _ => Err(Error::InvalidResponse),
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rasn_ldap::{ExtendedResponse, ResultCode};

    use super::*;
    use crate::testutil::{bound_client, spawn_server};

    fn extended_resp(result_code: ResultCode, response_value: Option<Bytes>) -> ExtendedResponse {
        ExtendedResponse {
            result_code,
            matched_dn: "".into(),
            diagnostic_message: "".into(),
            referral: None,
            response_name: None,
            response_value,
        }
    }

    #[tokio::test]
    async fn whoami_returns_authorization_identity() {
        let port = spawn_server(|msg| {
            assert!(matches!(
                msg.protocol_op,
                ProtocolOp::ExtendedReq(ref req) if req.request_name == oid::WHOAMI_OID
            ));
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::ExtendedResp(extended_resp(
                    ResultCode::Success,
                    Some(Bytes::from_static(b"dn:cn=admin,dc=example,dc=com")),
                )),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        let identity = client.whoami().await.unwrap();
        assert_eq!(identity.as_deref(), Some("dn:cn=admin,dc=example,dc=com"));
    }

    #[tokio::test]
    async fn whoami_failure_surfaces_result_code() {
        let port = spawn_server(|msg| {
            vec![LdapMessage::new(
                msg.message_id,
                ProtocolOp::ExtendedResp(extended_resp(ResultCode::InsufficientAccessRights, None)),
            )]
        })
        .await;

        let mut client = bound_client(port).await;
        match client.whoami().await {
            Err(Error::OperationFailed(e)) => {
                assert_eq!(e.result_code, ResultCode::InsufficientAccessRights)
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
