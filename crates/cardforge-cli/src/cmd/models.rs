use anyhow::Result;

use cardforge_core::Settings;
use cardforge_core::net::AiClient;

pub async fn models(settings: &Settings, base_url: &str, api_key: &str) -> Result<()> {
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(settings.http_timeout_secs))
        .build()?;
    let client = AiClient::new(http, base_url, api_key, settings.egress_policy());

    let response = client.list_models().await?;
    for model in &response.data {
        match &model.owned_by {
            Some(owner) => println!("{}  ({owner})", model.id),
            None => println!("{}", model.id),
        }
    }
    println!("{} models", response.data.len());

    Ok(())
}
