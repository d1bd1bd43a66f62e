use futures::{StreamExt, TryStreamExt};
use ldap_client::{
    LdapClient, SearchRequest, SearchRequestDerefAliases, SearchRequestScope, TlsOptions,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut client = LdapClient::builder("ldap.example.com")
        .port(636)
        .tls_options(TlsOptions::tls())
        .connect()
        .await?;
    client.simple_bind("admin@example.com", "password").await?;

    let request = SearchRequest::builder()
        .base_dn("dc=example,dc=com")
        .scope(SearchRequestScope::WholeSubtree)
        .deref_aliases(SearchRequestDerefAliases::NeverDerefAliases)
        .filter("(&(objectClass=person)(cn=a*))")
        .build()?;

    let mut pages = client.search_paged(request, 100);
    while let Some(page) = pages.next().await {
        let entries = page?.try_collect::<Vec<_>>().await?;
        println!("page of {} entries: {entries:#?}", entries.len());
    }

    Ok(())
}
