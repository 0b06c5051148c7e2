use std::sync::Arc;
use std::time::Duration;

use clap::ArgMatches;
use homeboard_core::{
    ActionOutcome, BoardEvent, CollapseMap, Dashboard, HomeboardConfig, SystemStatus, Timer,
    WidgetView, known_widgets,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::helpers::load_config_with_warning;
use super::intents::{HELP, Intent, parse_intent};
use crate::color;

/// A `--timer MIN[:LABEL]` argument, kept as typed text so the timer
/// subsystem applies its own validation.
#[derive(Debug, PartialEq, Eq)]
struct TimerSpec {
    minutes: String,
    label: String,
}

impl TimerSpec {
    fn parse(arg: &str) -> Self {
        match arg.split_once(':') {
            Some((minutes, label)) => Self {
                minutes: minutes.to_string(),
                label: label.to_string(),
            },
            None => Self {
                minutes: arg.to_string(),
                label: String::new(),
            },
        }
    }
}

pub(crate) fn handle_watch_command(matches: &ArgMatches) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config_with_warning();
    if let Some(server) = matches.get_one::<String>("server") {
        config.server.base_url = Some(server.clone());
        if let Err(e) = config.validate() {
            eprintln!("{}", color::error(&format!("Invalid --server: {e}")));
            error!(event = "cli.watch.invalid_server", error = %e);
            return Err(e.into());
        }
    }

    let timers: Vec<TimerSpec> = matches
        .get_many::<String>("timer")
        .map(|args| args.map(|a| TimerSpec::parse(a)).collect())
        .unwrap_or_default();

    info!(
        event = "cli.watch_started",
        server = config.server.base_url(),
        timers = timers.len(),
    );

    let runtime = tokio::runtime::Runtime::new()?;
    let result = runtime.block_on(run_watch(config, timers));
    // A pending stdin read would otherwise hold shutdown until the next line.
    runtime.shutdown_timeout(Duration::from_millis(200));
    result
}

async fn run_watch(
    config: HomeboardConfig,
    timers: Vec<TimerSpec>,
) -> Result<(), Box<dyn std::error::Error>> {
    let alarm = Arc::new(|timer: &Timer| {
        println!("\x07{}", color::badge(&format!("Timer done: {}", timer.label)));
    });
    let dashboard = Dashboard::from_config(&config, alarm).map_err(|e| {
        eprintln!("{}", color::error(&format!("Could not start dashboard: {e}")));
        error!(event = "cli.watch.start_failed", error = %e, error_code = e.error_code());
        e
    })?;
    let dashboard = Arc::new(dashboard);

    let mut events = dashboard.board().subscribe();
    let mut collapse = dashboard.start()?;
    println!(
        "{} {}",
        color::title("homeboard"),
        color::muted(&format!(
            "watching {}, type 'help' for commands",
            config.server.base_url()
        ))
    );

    for spec in &timers {
        start_timer(&dashboard, &config, &spec.minutes, &spec.label);
    }

    let shutdown = CancellationToken::new();
    tokio::spawn(wait_for_shutdown_signal(shutdown.clone()));

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let mut input_open = true;

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            line = input.next_line(), if input_open => match line {
                Ok(Some(line)) => {
                    if handle_line(&dashboard, &config, &mut collapse, &line) == Flow::Quit {
                        break;
                    }
                }
                // Detached stdin: keep watching without commands.
                Ok(None) => input_open = false,
                Err(e) => {
                    warn!(event = "cli.watch.input_failed", error = %e);
                    input_open = false;
                }
            },
            event = events.recv() => match event {
                Ok(BoardEvent::WidgetChanged(view)) => {
                    let collapsed = collapse.get(&view.widget).copied().unwrap_or(true);
                    for line in widget_lines(&view, collapsed) {
                        println!("{line}");
                    }
                }
                Ok(BoardEvent::StatusChanged(status)) => println!("{}", status_line(status)),
                Err(RecvError::Lagged(skipped)) => {
                    warn!(event = "cli.watch.events_lagged", skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    dashboard.shutdown();
    info!(event = "cli.watch_completed");
    println!("{}", color::muted("Stopped."));
    Ok(())
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

fn handle_line(
    dashboard: &Arc<Dashboard>,
    config: &HomeboardConfig,
    collapse: &mut CollapseMap,
    line: &str,
) -> Flow {
    let intent = match parse_intent(line) {
        Ok(Some(intent)) => intent,
        Ok(None) => return Flow::Continue,
        Err(message) => {
            eprintln!("{}", color::warning(&message));
            return Flow::Continue;
        }
    };
    debug!(event = "cli.watch.intent", intent = ?intent);

    match intent {
        Intent::Act(action) => {
            let dashboard = dashboard.clone();
            tokio::spawn(async move {
                let name = action.name();
                match dashboard.actions().perform(action).await {
                    ActionOutcome::Sent => println!("{}", color::muted(&format!("{name}: sent"))),
                    ActionOutcome::Failed => {
                        eprintln!("{}", color::warning(&format!("{name}: server did not accept it")))
                    }
                    ActionOutcome::Rejected => {}
                }
            });
        }
        Intent::StartTimer { minutes, label } => start_timer(dashboard, config, &minutes, &label),
        Intent::Dismiss(id) => {
            if !dashboard.timers().dismiss(id) {
                eprintln!("{}", color::warning(&format!("No timer with id {id}")));
            }
        }
        Intent::Refresh(domain) => {
            let dashboard = dashboard.clone();
            tokio::spawn(async move {
                if let Err(e) = dashboard.scheduler().refresh_now(domain).await {
                    eprintln!("{}", color::error(&format!("Refresh failed: {e}")));
                }
            });
        }
        Intent::Toggle(widget) => toggle_widget(dashboard, collapse, &widget),
        Intent::Help => println!("{}", color::muted(HELP)),
        Intent::Quit => return Flow::Quit,
    }
    Flow::Continue
}

fn start_timer(dashboard: &Dashboard, config: &HomeboardConfig, minutes: &str, label: &str) {
    match dashboard.timers().start_timer_from_input(minutes, label) {
        Some(id) => println!("{}", color::muted(&format!("Timer {id} started"))),
        None => eprintln!(
            "{}",
            color::warning(&format!(
                "Ignoring timer '{minutes}': minutes must be a whole number from 1 to {}",
                config.timers.max_minutes()
            ))
        ),
    }
}

fn toggle_widget(dashboard: &Dashboard, collapse: &mut CollapseMap, widget: &str) {
    if !known_widgets().any(|w| w == widget) {
        eprintln!("{}", color::warning(&format!("Unknown widget '{widget}'")));
        return;
    }
    let store = dashboard.state_store();
    match store.toggle(widget) {
        Ok(collapsed) => {
            let collapsed = collapsed && widget != store.always_visible();
            collapse.insert(widget.to_string(), collapsed);
            if let Some(view) = dashboard.board().view(widget) {
                for line in widget_lines(&view, collapsed) {
                    println!("{line}");
                }
            }
        }
        Err(e) => {
            eprintln!("{}", color::error(&format!("Could not save widget state: {e}")));
            error!(
                event = "cli.watch.toggle_failed",
                widget,
                error = %e,
                error_code = e.error_code(),
            );
        }
    }
}

fn status_line(status: SystemStatus) -> String {
    match status {
        SystemStatus::Online => color::online(&format!("● {status}")),
        SystemStatus::Reconnecting => color::offline(&format!("○ {status}")),
    }
}

/// Header plus body for an expanded widget; header only when collapsed.
fn widget_lines(view: &WidgetView, collapsed: bool) -> Vec<String> {
    let mut header = format!("[{}] {}", view.widget, color::title(&view.title));
    if let Some(badge) = &view.badge {
        header.push_str(&format!("  {}", color::badge(&format!("({badge})"))));
    }
    if collapsed {
        header.push_str(&format!("  {}", color::muted("(collapsed)")));
        return vec![header];
    }

    let mut lines = Vec::with_capacity(view.lines.len() + 1);
    lines.push(header);
    lines.extend(view.lines.iter().map(|l| format!("    {l}")));
    lines
}

/// Cancel `token` on SIGINT, or SIGTERM where available.
async fn wait_for_shutdown_signal(token: CancellationToken) {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!(event = "cli.watch.signal_received", signal = "SIGINT"),
                    _ = sigterm.recv() => info!(event = "cli.watch.signal_received", signal = "SIGTERM"),
                }
            }
            Err(e) => {
                warn!(event = "cli.watch.sigterm_unavailable", error = %e);
                ctrl_c.await.ok();
                info!(event = "cli.watch.signal_received", signal = "SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!(event = "cli.watch.signal_received", signal = "SIGINT");
    }

    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;
    use homeboard_protocol::Domain;

    #[test]
    fn test_timer_spec_with_label() {
        assert_eq!(
            TimerSpec::parse("10:pasta water"),
            TimerSpec {
                minutes: "10".to_string(),
                label: "pasta water".to_string()
            }
        );
    }

    #[test]
    fn test_timer_spec_without_label() {
        let spec = TimerSpec::parse("3");
        assert_eq!(spec.minutes, "3");
        assert_eq!(spec.label, "");
    }

    #[test]
    fn test_expanded_widget_prints_body() {
        let view = WidgetView::new(Domain::Lights, vec!["Office: 1/2 on".to_string()])
            .with_badge("1 lit");
        let lines = widget_lines(&view, false);
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains("[lights]"));
        assert!(lines[0].contains("(1 lit)"));
        assert_eq!(lines[1], "    Office: 1/2 on");
    }

    #[test]
    fn test_collapsed_widget_prints_header_only() {
        let view = WidgetView::new(Domain::News, vec!["a".to_string(), "b".to_string()]);
        let lines = widget_lines(&view, true);
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("(collapsed)"));
    }

    fn offline_dashboard(dir: &tempfile::TempDir) -> (Arc<Dashboard>, HomeboardConfig) {
        let mut config = HomeboardConfig::default();
        config.ui.state_file = Some(dir.path().join("ui_state.json"));
        let dashboard = Dashboard::from_config(&config, Arc::new(|_: &Timer| {})).unwrap();
        (Arc::new(dashboard), config)
    }

    #[tokio::test]
    async fn test_typed_timer_can_be_dismissed() {
        let dir = tempfile::TempDir::new().unwrap();
        let (dashboard, config) = offline_dashboard(&dir);
        let mut collapse = CollapseMap::new();

        let flow = handle_line(&dashboard, &config, &mut collapse, "timer 5 tea");
        assert_eq!(flow, Flow::Continue);
        let timers = dashboard.timers().timers();
        assert_eq!(timers.len(), 1);
        assert_eq!(timers[0].label, "tea");

        let line = format!("dismiss {}", timers[0].id);
        handle_line(&dashboard, &config, &mut collapse, &line);
        assert!(dashboard.timers().timers().is_empty());

        dashboard.shutdown();
    }

    #[tokio::test]
    async fn test_typed_toggle_persists_and_updates_display_state() {
        let dir = tempfile::TempDir::new().unwrap();
        let (dashboard, config) = offline_dashboard(&dir);
        let mut collapse = dashboard.state_store().effective();
        assert_eq!(collapse.get("weather"), Some(&true));

        handle_line(&dashboard, &config, &mut collapse, "toggle weather");
        assert_eq!(collapse.get("weather"), Some(&false));
        assert_eq!(
            dashboard.state_store().effective().get("weather"),
            Some(&false)
        );

        handle_line(&dashboard, &config, &mut collapse, "toggle cameras");
        assert_eq!(collapse.get("cameras"), Some(&false));
    }

    #[tokio::test]
    async fn test_bad_and_quit_lines() {
        let dir = tempfile::TempDir::new().unwrap();
        let (dashboard, config) = offline_dashboard(&dir);
        let mut collapse = CollapseMap::new();

        assert_eq!(
            handle_line(&dashboard, &config, &mut collapse, "reboot now"),
            Flow::Continue
        );
        assert_eq!(
            handle_line(&dashboard, &config, &mut collapse, "toggle garage"),
            Flow::Continue
        );
        assert!(collapse.is_empty());
        assert_eq!(handle_line(&dashboard, &config, &mut collapse, "quit"), Flow::Quit);
    }

    #[test]
    fn test_status_line_text() {
        assert!(status_line(SystemStatus::Online).contains("ONLINE"));
        assert!(status_line(SystemStatus::Reconnecting).contains("RECONNECTING"));
    }
}
