use ldap_client::{Attribute, LdapClient, ModifyRequest};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut client = LdapClient::builder("ldap.example.com").connect().await?;
    client.simple_bind("cn=admin,dc=example,dc=com", "password").await?;

    let attr = Attribute::new("mobile", ["123456"]);
    let request = ModifyRequest::builder("cn=user,ou=people,dc=example,dc=com")
        .replace(attr)
        .build();

    client.modify(request).await?;
    client.unbind().await?;

    Ok(())
}
