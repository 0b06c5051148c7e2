use homeboard_protocol::Domain;
use tracing::info;

use super::helpers::{format_interval, load_config_with_warning};
use crate::color;

pub(crate) fn handle_domains_command() -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning();
    info!(event = "cli.domains_started");

    println!(
        "{}",
        color::title(&format!(
            "{:<14} {:<7} {:>6}  {}",
            "DOMAIN", "CHURN", "EVERY", "ENDPOINT"
        ))
    );
    for domain in Domain::ALL {
        println!(
            "{:<14} {:<7} {:>6}  {}",
            domain.slug(),
            domain.churn().to_string(),
            format_interval(config.poll.interval_for(domain)),
            color::muted(domain.endpoint()),
        );
    }
    println!(
        "\n{}",
        color::muted(&format!(
            "Server: {}  Push: {}",
            config.server.base_url(),
            config
                .server
                .push_url()
                .unwrap_or_else(|_| "(invalid)".to_string()),
        ))
    );
    Ok(())
}
