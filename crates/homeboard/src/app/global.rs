use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("homeboard")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Live home dashboard in the terminal")
        .long_about("homeboard keeps every widget of a home-automation dashboard current from the server's push channel and a per-domain poll schedule, and prints widget changes as they happen.")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
}
