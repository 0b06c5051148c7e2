use clap::{Arg, Command};

pub fn widgets_command() -> Command {
    Command::new("widgets")
        .about("Show or change which widgets start collapsed")
        .subcommand_required(true)
        .subcommand(Command::new("list").about("List widgets and their collapse state"))
        .subcommand(
            Command::new("toggle")
                .about("Collapse or expand one widget")
                .arg(
                    Arg::new("id")
                        .help("Widget id (a domain slug or 'timers')")
                        .required(true)
                        .index(1),
                ),
        )
}

pub fn domains_command() -> Command {
    Command::new("domains").about("Show every data domain with its endpoint and poll cadence")
}
