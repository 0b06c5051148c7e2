mod global;
mod watch;
mod widgets;


use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(watch::watch_command())
        .subcommand(widgets::widgets_command())
        .subcommand(widgets::domains_command())
}
