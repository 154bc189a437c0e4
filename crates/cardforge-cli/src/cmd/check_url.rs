use anyhow::Result;

use cardforge_core::Settings;
use cardforge_core::security::EgressPolicy;

pub async fn check_url(settings: &Settings, url: &str, allow_localhost: bool) -> Result<()> {
    let policy = EgressPolicy::new(
        settings.proxy_url_allowlist.clone(),
        allow_localhost || settings.proxy_allow_localhost,
    );

    match policy.validate(url).await {
        Ok(()) => {
            println!("allowed: {url}");
            Ok(())
        }
        Err(err) => {
            println!("blocked: {err}");
            std::process::exit(1);
        }
    }
}
