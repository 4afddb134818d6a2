use colored::Colorize;
use dropflow_cloud::{CloudClient, ConnectivityProbe};
use dropflow_config::Config;

/// Print the resolved configuration, then verify the key file and API access.
pub async fn handle(config: &Config) -> anyhow::Result<()> {
    println!("{}", "Configuration".bold());
    for line in config.to_string().lines() {
        println!("  {}", line);
    }
    println!();

    let mut problems = 0;

    let key = &config.remote.private_key_path;
    match std::fs::File::open(key) {
        Ok(_) => println!("{} ssh key readable", "✓".green()),
        Err(e) => {
            problems += 1;
            println!("{} ssh key {}: {}", "✗".red(), key.display(), e);
        }
    }

    let client = super::cloud_client(config)?;
    if client.probe().await {
        println!("{} {} reachable", "✓".green(), config.probe_url);
    } else {
        problems += 1;
        println!("{} {} unreachable", "✗".red(), config.probe_url);
    }

    match client.list_instances_by_tag(config.cloud.lookup_tag()).await {
        Ok(instances) => println!(
            "{} API token accepted ({} instance{} tagged '{}')",
            "✓".green(),
            instances.len(),
            if instances.len() == 1 { "" } else { "s" },
            config.cloud.lookup_tag()
        ),
        Err(e) => {
            problems += 1;
            println!("{} API: {}", "✗".red(), e);
        }
    }

    if problems > 0 {
        anyhow::bail!("{} check{} failed", problems, if problems == 1 { "" } else { "s" });
    }
    println!();
    println!("{}", "✓ Ready".green().bold());
    Ok(())
}
