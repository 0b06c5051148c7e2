use clap::ArgMatches;
use homeboard_core::{LocalStateStore, known_widgets};
use tracing::{error, info};

use super::helpers::load_config_with_warning;
use crate::color;

pub(crate) fn handle_widgets_command(
    matches: &ArgMatches,
) -> Result<(), Box<dyn std::error::Error>> {
    let config = load_config_with_warning();
    let store = LocalStateStore::from_config(&config.ui);

    match matches.subcommand() {
        Some(("list", _)) => list(&store),
        Some(("toggle", sub)) => {
            let id = sub
                .get_one::<String>("id")
                .ok_or("Widget id is required")?;
            toggle(&store, id)
        }
        _ => Err("Unknown widgets command".into()),
    }
}

fn list(store: &LocalStateStore) -> Result<(), Box<dyn std::error::Error>> {
    let map = store.effective();
    for id in known_widgets() {
        let collapsed = map.get(id).copied().unwrap_or(true);
        let state = if collapsed {
            color::muted("collapsed")
        } else {
            color::online("expanded")
        };
        let pinned = if id == store.always_visible() {
            color::muted(" (always visible)")
        } else {
            String::new()
        };
        println!("{id:<14} {state}{pinned}");
    }
    Ok(())
}

fn toggle(store: &LocalStateStore, id: &str) -> Result<(), Box<dyn std::error::Error>> {
    if !known_widgets().any(|w| w == id) {
        eprintln!("{}", color::error(&format!("Unknown widget '{id}'")));
        eprintln!("{}", color::hint("Run 'homeboard widgets list' to see widget ids."));
        error!(event = "cli.widgets.toggle_unknown", widget = id);
        return Err(format!("unknown widget '{id}'").into());
    }

    let collapsed = store.toggle(id).map_err(|e| {
        eprintln!("{}", color::error(&format!("Could not save widget state: {e}")));
        error!(
            event = "cli.widgets.toggle_failed",
            widget = id,
            error = %e,
            error_code = e.error_code(),
        );
        e
    })?;
    info!(event = "cli.widgets.toggled", widget = id, collapsed);

    if id == store.always_visible() {
        println!(
            "{id}: {}",
            color::muted("always visible, stays expanded at startup")
        );
    } else if collapsed {
        println!("{id}: {}", color::muted("collapsed"));
    } else {
        println!("{id}: {}", color::online("expanded"));
    }
    Ok(())
}
