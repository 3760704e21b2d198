//! Parsing Options.
//! `pn [--config FILE] [--format json|ron] <command> <net> ...`; extra flags
//! may come from `PN_FLAGS`.

use clap::{Arg, ArgMatches, Command};
use std::error::Error;
use std::path::PathBuf;

use crate::net::Format;

pub type OptionsError = Box<dyn Error + Send + Sync>;

#[derive(Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Action {
    /// Write the single-colour unfolding of a net.
    Unfold { net: PathBuf, output: Option<PathBuf> },
    /// List the transitions enabled under the initial marking.
    Enabled { net: PathBuf },
    /// Fire one transition from the initial marking and print the new state.
    Fire { net: PathBuf, transition: String },
    /// Evaluate an expression against the initial marking.
    Eval { net: PathBuf, expr: String },
    /// Actual rate of a transition under the initial marking.
    Rate { net: PathBuf, transition: String },
}

fn net_arg() -> Arg {
    Arg::new("net")
        .value_name("NET")
        .help("Net document, RON if the extension is .ron and JSON otherwise")
        .required(true)
}

fn make_options_parser() -> clap::Command {
    let parser = Command::new("pn")
        .no_binary_name(true)
        .version("v0.1.0")
        .about("Petri net execution engine")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Engine configuration")
                .default_value("pn.toml")
                .global(true),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .help("Output encoding, overrides the configuration")
                .value_parser(["json", "ron"])
                .global(true),
        )
        .subcommand(
            Command::new("unfold")
                .about("Unfold a coloured net into a single-colour net")
                .arg(net_arg())
                .arg(
                    Arg::new("output")
                        .short('o')
                        .long("output")
                        .value_name("FILE")
                        .help("Where to write the unfolded net, stdout if absent"),
                ),
        )
        .subcommand(
            Command::new("enabled")
                .about("List enabled transitions")
                .arg(net_arg()),
        )
        .subcommand(
            Command::new("fire")
                .about("Fire a transition once")
                .arg(net_arg())
                .arg(Arg::new("transition").required(true)),
        )
        .subcommand(
            Command::new("eval")
                .about("Evaluate a functional expression")
                .arg(net_arg())
                .arg(Arg::new("expr").required(true)),
        )
        .subcommand(
            Command::new("rate")
                .about("Evaluate the actual rate of a transition")
                .arg(net_arg())
                .arg(Arg::new("transition").required(true)),
        );
    parser
}

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    pub action: Action,
    pub config: PathBuf,
    pub format: Option<Format>,
}

impl Options {
    pub fn parse_from_str(s: &str) -> Result<Self, OptionsError> {
        let flags = shellwords::split(s)?;
        Self::parse_from_args(&flags)
    }

    pub fn parse_from_args(flags: &[String]) -> Result<Self, OptionsError> {
        let app = make_options_parser();
        let matches = app.try_get_matches_from(flags.iter())?;

        let config = PathBuf::from(required(&matches, "config")?);
        let format = match matches.get_one::<String>("format") {
            Some(format) => Some(format.parse::<Format>()?),
            None => None,
        };

        let action = match matches.subcommand() {
            Some(("unfold", sub)) => Action::Unfold {
                net: PathBuf::from(required(sub, "net")?),
                output: sub.get_one::<String>("output").map(PathBuf::from),
            },
            Some(("enabled", sub)) => Action::Enabled {
                net: PathBuf::from(required(sub, "net")?),
            },
            Some(("fire", sub)) => Action::Fire {
                net: PathBuf::from(required(sub, "net")?),
                transition: required(sub, "transition")?,
            },
            Some(("eval", sub)) => Action::Eval {
                net: PathBuf::from(required(sub, "net")?),
                expr: required(sub, "expr")?,
            },
            Some(("rate", sub)) => Action::Rate {
                net: PathBuf::from(required(sub, "net")?),
                transition: required(sub, "transition")?,
            },
            _ => return Err("UnsupportedCommand")?,
        };

        Ok(Options {
            action,
            config,
            format,
        })
    }
}

fn required(matches: &ArgMatches, id: &str) -> Result<String, OptionsError> {
    matches
        .get_one::<String>(id)
        .cloned()
        .ok_or_else(|| format!("missing argument {id}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_from_str_unfold() {
        let options = Options::parse_from_str("--format ron unfold net.json -o out.ron").unwrap();
        assert_eq!(options.format, Some(Format::Ron));
        assert_eq!(options.config, PathBuf::from("pn.toml"));
        assert_eq!(
            options.action,
            Action::Unfold {
                net: PathBuf::from("net.json"),
                output: Some(PathBuf::from("out.ron")),
            }
        );
    }

    #[test]
    fn test_parse_from_str_quoted_expression() {
        let options = Options::parse_from_str("eval net.json '#(P0) * 2' -c my.toml").unwrap();
        assert_eq!(options.config, PathBuf::from("my.toml"));
        assert_eq!(
            options.action,
            Action::Eval {
                net: PathBuf::from("net.json"),
                expr: "#(P0) * 2".to_owned(),
            }
        );
    }

    #[test]
    fn test_parse_from_str_err() {
        assert!(Options::parse_from_str("--format xml enabled net.json").is_err());
        assert!(Options::parse_from_str("fire net.json").is_err());
        assert!(Options::parse_from_str("eval net.json '#(P0").is_err());
        assert!(Options::parse_from_str("").is_err());
    }

    #[test]
    fn test_parse_from_args() {
        let options = Options::parse_from_args(&[
            "fire".to_owned(),
            "net.ron".to_owned(),
            "T0".to_owned(),
        ])
        .unwrap();
        assert_eq!(
            options.action,
            Action::Fire {
                net: PathBuf::from("net.ron"),
                transition: "T0".to_owned(),
            }
        );
        assert_eq!(options.format, None);
    }
}
