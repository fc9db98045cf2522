use anyhow::Result;
use ens_discovery::{ClientConfig, RegistryClient, ServiceListFilters};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let name = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "weather-api.eth".to_string());

    let config = ClientConfig::from_env();
    println!("Registry: {}", config.api_base_url);
    let client = RegistryClient::new(config)?;

    let resolution = client.resolve_ens_name(&name).await?;
    let service = &resolution.service;
    println!("{} ({})", resolution.ens_name, resolution.ens_node);
    println!("  endpoint:       {}", service.endpoint);
    println!("  payment scheme: {}", service.payment_scheme);
    println!("  network:        {}", service.network);
    println!("  capabilities:   {}", service.capabilities.join(", "));

    let siblings = client
        .list_services(
            &ServiceListFilters::new()
                .network(service.network.clone())
                .active(true),
        )
        .await?;
    println!(
        "{} active services on {} ({} listed)",
        siblings.total,
        service.network,
        siblings.items.len()
    );

    Ok(())
}
