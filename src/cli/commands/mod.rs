use clap::{
    builder::{
        styling::{AnsiColor, Effects, Styles},
        ValueParser,
    },
    Arg, ColorChoice, Command,
};

pub fn validator_log_level() -> ValueParser {
    ValueParser::from(move |level: &str| -> std::result::Result<u8, String> {
        if let Ok(parsed) = level.parse::<u8>() {
            // Successfully parsed as a number
            if parsed <= 5 {
                return Ok(parsed);
            }
        }

        match level.to_lowercase().as_str() {
            "error" => Ok(0),
            "warn" => Ok(1),
            "info" => Ok(2),
            "debug" => Ok(3),
            "trace" => Ok(4),
            _ => Err("invalid log level".to_string()),
        }
    })
}

pub fn new() -> Command {
    let styles = Styles::styled()
        .header(AnsiColor::Yellow.on_default() | Effects::BOLD)
        .usage(AnsiColor::Green.on_default() | Effects::BOLD)
        .literal(AnsiColor::Blue.on_default() | Effects::BOLD)
        .placeholder(AnsiColor::Green.on_default());

    Command::new("hubgate")
        .about("Session-gated SSO gateway")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("HUBGATE_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("store-url")
                .long("store-url")
                .help("Session store base URL, example: https://auth.hub.tld")
                .env("HUBGATE_STORE_URL")
                .required(true),
        )
        .arg(
            Arg::new("store-anon-key")
                .long("store-anon-key")
                .help("Public API key presented to the session store")
                .env("HUBGATE_STORE_ANON_KEY")
                .required(true),
        )
        .arg(
            Arg::new("store-service-key")
                .long("store-service-key")
                .help("Privileged service key for admin-only operations")
                .env("HUBGATE_STORE_SERVICE_KEY"),
        )
        .arg(
            Arg::new("site-url")
                .long("site-url")
                .help("Public site origin, used for CORS and secure cookies")
                .env("HUBGATE_SITE_URL")
                .required(true),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("HUBGATE_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}
