use crate::{
    api,
    cli::{actions::Action, globals::GlobalArgs},
};
use anyhow::Result;
use secrecy::SecretString;

/// Handle the server action
pub async fn handle(action: Action) -> Result<()> {
    match action {
        Action::Server {
            port,
            store_url,
            store_anon_key,
            store_service_key,
            site_url,
        } => {
            let mut globals = GlobalArgs::new(store_url);
            globals.set_anon_key(store_anon_key);

            if let Some(key) = store_service_key {
                globals.set_service_key(SecretString::from(key));
            }

            let auth_config = api::handlers::auth::AuthConfig::new(site_url);

            api::new(port, &globals, auth_config).await?;
        }
    }

    Ok(())
}
