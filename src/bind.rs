//! Bind operations.

use rasn_ldap::{
    AuthenticationChoice, BindRequest, BindResponse, LdapMessage, LdapResult, ProtocolOp,
    SaslCredentials,
};

use crate::client::{check_result, LdapClient, Result};
use crate::error::Error;

impl LdapClient {
    async fn do_bind(&mut self, req: BindRequest) -> Result<BindResponse> {
        let id = self.new_id();
        let msg = LdapMessage::new(id, ProtocolOp::BindRequest(req));

        let item = self.connection.send_recv(msg).await?;

        match item.protocol_op {
            ProtocolOp::BindResponse(resp) => {
                let result = resp.clone();
                check_result(LdapResult::new(
                    resp.result_code,
                    resp.matched_dn,
                    resp.diagnostic_message,
                ))?;
                Ok(result)
            }
            _ => Err(Error::InvalidResponse),
        }
    }

    fn new_sasl_bind_req(&self, mech: &str, creds: Option<&[u8]>) -> BindRequest {
        let auth_choice = AuthenticationChoice::Sasl(SaslCredentials::new(
            mech.into(),
            creds.map(|c| c.to_vec().into()),
        ));
        BindRequest::new(3, "".into(), auth_choice)
    }

    /// Authenticate with a DN and password (simple bind).
    pub async fn simple_bind<U, P>(&mut self, username: U, password: P) -> Result<()>
    where
        U: AsRef<str>,
        P: AsRef<str>,
    {
        let auth_choice = AuthenticationChoice::Simple(password.as_ref().to_owned().into());
        let req = BindRequest::new(3, username.as_ref().into(), auth_choice);
        self.do_bind(req).await?;
        Ok(())
    }

    /// Authenticate with the SASL EXTERNAL mechanism, typically backed by a
    /// client TLS certificate.
    pub async fn sasl_external_bind(&mut self) -> Result<()> {
        let req = self.new_sasl_bind_req("EXTERNAL", None);
        self.do_bind(req).await?;
        Ok(())
    }

    #[cfg(feature = "kerberos")]
    /// Authenticate with the SASL GSSAPI mechanism (Kerberos).
    ///
    /// SASL integrity/privacy layers are not negotiated; use TLS when the
    /// connection needs confidentiality.
    pub async fn sasl_gssapi_bind<S: AsRef<str>>(&mut self, realm: S) -> Result<()> {
        use cross_krb5::{ClientCtx, InitiateFlags, K5Ctx, Step};

        let spn = format!("ldap/{}", realm.as_ref());

        let (client_ctx, token) = ClientCtx::new(InitiateFlags::empty(), None, &spn, None)
            .map_err(|e| Error::GssApiError(e.to_string()))?;

        let req = self.new_sasl_bind_req("GSSAPI", Some(token.as_ref()));
        let response = self.do_bind(req).await?;

        let token = response
            .server_sasl_creds
            .ok_or(Error::NoSaslCredentials)?;

        let step = client_ctx
            .step(&token)
            .map_err(|e| Error::GssApiError(e.to_string()))?;

        let mut client_ctx = match step {
            Step::Finished((ctx, None)) => ctx,
            _ => {
                return Err(Error::GssApiError(
                    "GSSAPI exchange not finished or returned an extra token".to_owned(),
                ))
            }
        };

        let req = self.new_sasl_bind_req("GSSAPI", None);
        let response = self.do_bind(req).await?;

        if response.server_sasl_creds.is_none() {
            return Err(Error::NoSaslCredentials);
        }

        // request no security layer (GSSAUTH_P_NONE) with the maximum
        // message size the server may use
        let needed_layer = 1u32;
        let recv_max_size = (0x9FFFB8u32 | needed_layer << 24).to_be_bytes();
        let size_msg = client_ctx
            .wrap(true, &recv_max_size)
            .map_err(|e| Error::GssApiError(e.to_string()))?;

        let req = self.new_sasl_bind_req("GSSAPI", Some(size_msg.as_ref()));
        self.do_bind(req).await?;

        Ok(())
    }
}
