use crate::cli::actions::Action;
use anyhow::Result;

pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    Ok(Action::Server {
        port: matches.get_one::<u16>("port").copied().unwrap_or(8080),
        store_url: matches
            .get_one("store-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --store-url"))?,
        store_anon_key: matches
            .get_one("store-anon-key")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --store-anon-key"))?,
        store_service_key: matches
            .get_one("store-service-key")
            .map(|s: &String| s.to_string()),
        site_url: matches
            .get_one("site-url")
            .map(|s: &String| s.to_string())
            .ok_or_else(|| anyhow::anyhow!("missing required argument: --site-url"))?,
    })
}
