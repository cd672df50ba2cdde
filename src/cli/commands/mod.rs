use crate::atingi::guard::DEFAULT_SKIP_PATTERN;
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

    Command::new("atingi")
        .about("Goal tracking and check-ins")
        .version(env!("CARGO_PKG_VERSION"))
        .color(ColorChoice::Auto)
        .styles(styles)
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .help("Port to listen on")
                .default_value("8080")
                .env("ATINGI_PORT")
                .value_parser(clap::value_parser!(u16)),
        )
        .arg(
            Arg::new("suggest-url")
                .short('s')
                .long("suggest-url")
                .help("Suggestion service base URL, example: http://suggest.internal:9100")
                .env("ATINGI_SUGGEST_URL")
                .required(true),
        )
        .arg(
            Arg::new("token-url")
                .short('t')
                .long("token-url")
                .help("Session token verification service base URL")
                .env("ATINGI_TOKEN_URL")
                .required(true),
        )
        .arg(
            Arg::new("frontend-url")
                .long("frontend-url")
                .help("Frontend origin allowed by CORS")
                .default_value("http://localhost:3000")
                .env("ATINGI_FRONTEND_URL"),
        )
        .arg(
            Arg::new("guard-skip")
                .long("guard-skip")
                .help("Regex of paths exempt from the authentication guard")
                .default_value(DEFAULT_SKIP_PATTERN)
                .env("ATINGI_GUARD_SKIP"),
        )
        .arg(
            Arg::new("verbosity")
                .short('v')
                .long("verbose")
                .help("Verbosity level: ERROR, WARN, INFO, DEBUG, TRACE (default: ERROR)")
                .env("ATINGI_LOG_LEVEL")
                .global(true)
                .action(clap::ArgAction::Count)
                .value_parser(validator_log_level()),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new() {
        let command = new();

        assert_eq!(command.get_name(), "atingi");
        assert_eq!(
            command.get_about().unwrap().to_string(),
            "Goal tracking and check-ins"
        );
        assert_eq!(
            command.get_version().unwrap().to_string(),
            env!("CARGO_PKG_VERSION")
        );
    }

    #[test]
    fn test_check_port_and_urls() {
        let command = new();
        let matches = command.get_matches_from(vec![
            "atingi",
            "--port",
            "8080",
            "--suggest-url",
            "http://suggest.internal:9100",
            "--token-url",
            "http://auth.internal:9200",
        ]);

        assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(8080));
        assert_eq!(
            matches
                .get_one::<String>("suggest-url")
                .map(|s| s.to_string()),
            Some("http://suggest.internal:9100".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("token-url")
                .map(|s| s.to_string()),
            Some("http://auth.internal:9200".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("frontend-url")
                .map(|s| s.to_string()),
            Some("http://localhost:3000".to_string())
        );
        assert_eq!(
            matches
                .get_one::<String>("guard-skip")
                .map(|s| s.to_string()),
            Some(DEFAULT_SKIP_PATTERN.to_string())
        );
    }

    #[test]
    fn test_check_env() {
        temp_env::with_vars(
            [
                ("ATINGI_SUGGEST_URL", Some("http://suggest.internal:9100")),
                ("ATINGI_TOKEN_URL", Some("http://auth.internal:9200")),
                ("ATINGI_FRONTEND_URL", Some("https://app.atingi.dev")),
                ("ATINGI_PORT", Some("443")),
                ("ATINGI_LOG_LEVEL", Some("info")),
            ],
            || {
                let command = new();
                let matches = command.get_matches_from(vec!["atingi"]);
                assert_eq!(matches.get_one::<u16>("port").map(|s| *s), Some(443));
                assert_eq!(
                    matches
                        .get_one::<String>("suggest-url")
                        .map(|s| s.to_string()),
                    Some("http://suggest.internal:9100".to_string())
                );
                assert_eq!(
                    matches
                        .get_one::<String>("frontend-url")
                        .map(|s| s.to_string()),
                    Some("https://app.atingi.dev".to_string())
                );
                assert_eq!(matches.get_one::<u8>("verbosity").map(|s| *s), Some(2));
            },
        );
    }

    #[test]
    fn test_check_log_level_env() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, &level) in levels.iter().enumerate() {
            temp_env::with_vars(
                [
                    ("ATINGI_LOG_LEVEL", Some(level)),
                    ("ATINGI_SUGGEST_URL", Some("http://suggest.internal:9100")),
                    ("ATINGI_TOKEN_URL", Some("http://auth.internal:9200")),
                ],
                || {
                    let command = new();
                    let matches = command.get_matches_from(vec!["atingi"]);
                    assert_eq!(
                        matches.get_one::<u8>("verbosity").map(|s| *s),
                        Some(index as u8)
                    );
                },
            );
        }
    }

    #[test]
    fn test_check_log_level_verbosity() {
        // loop cover all possible value_parse
        let levels = vec!["error", "warn", "info", "debug", "trace"];
        for (index, _) in levels.iter().enumerate() {
            temp_env::with_vars([("ATINGI_LOG_LEVEL", None::<String>)], || {
                let mut args = vec![
                    "atingi".to_string(),
                    "--suggest-url".to_string(),
                    "http://suggest.internal:9100".to_string(),
                    "--token-url".to_string(),
                    "http://auth.internal:9200".to_string(),
                ];

                // Add the appropriate number of "-v" flags based on the index
                if index > 0 {
                    let v = format!("-{}", "v".repeat(index));
                    args.push(v);
                }

                let command = new();

                let matches = command.get_matches_from(args);

                assert_eq!(
                    matches.get_one::<u8>("verbosity").map(|s| *s),
                    Some(index as u8)
                );
            });
        }
    }
}
