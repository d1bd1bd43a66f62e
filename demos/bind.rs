use ldap_client::LdapClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut client = LdapClient::builder("ldap.forumsys.com").connect().await?;
    client
        .simple_bind("cn=read-only-admin,dc=example,dc=com", "password")
        .await?;
    println!("bound as {:?}", client.whoami().await?);

    client.unbind().await?;

    Ok(())
}
