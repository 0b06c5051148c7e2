use clap::{Arg, ArgAction, Command};

pub fn watch_command() -> Command {
    Command::new("watch")
        .about("Run the live dashboard until interrupted")
        .arg(
            Arg::new("server")
                .long("server")
                .short('s')
                .value_name("URL")
                .help("Dashboard server base URL (overrides [server] base_url)"),
        )
        .arg(
            Arg::new("timer")
                .long("timer")
                .short('t')
                .value_name("MIN[:LABEL]")
                .help("Start a countdown timer; repeatable")
                .action(ArgAction::Append),
        )
}
