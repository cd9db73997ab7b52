use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};
use lazy_static::lazy_static;

/// Set at build time by the release pipeline
const GIT_COMMIT: Option<&str> = option_env!("GIT_COMMIT");
const GIT_BRANCH: Option<&str> = option_env!("GIT_BRANCH");

lazy_static! {
    pub(crate) static ref LONG_VERSION: String = format!(
        "{}\n\nGit commit: {}\nGit branch: {}\nOS/Arch: {}/{}",
        crate_version!(),
        git_commit(),
        git_branch(),
        std::env::consts::OS,
        std::env::consts::ARCH,
    );
}

pub(crate) fn git_commit() -> &'static str {
    GIT_COMMIT.unwrap_or("unknown")
}

pub(crate) fn git_branch() -> &'static str {
    GIT_BRANCH.unwrap_or("unknown")
}

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("HOST_ALIAS_WEBHOOK_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("HOST_ALIAS_WEBHOOK_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("HOST_ALIAS_WEBHOOK_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("9001")
            .env("HOST_ALIAS_WEBHOOK_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("HOST_ALIAS_WEBHOOK_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("HOST_ALIAS_WEBHOOK_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .long_version(LONG_VERSION.as_str())
        .args(args)
}
