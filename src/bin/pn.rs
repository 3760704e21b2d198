use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use itertools::Itertools;
use log::debug;

use petri_engine::config::EngineConfig;
use petri_engine::expr::evaluate;
use petri_engine::net::io::{encode_net, read_net};
use petri_engine::net::{Format, PetriNet};
use petri_engine::options::{Action, Options};

fn main() -> Result<()> {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let mut flags = shellwords::split(&std::env::var("PN_FLAGS").unwrap_or_default())
        .context("PN_FLAGS has mismatched quotes")?;
    let args = std::env::args_os()
        .skip(1)
        .enumerate()
        .map(|(i, arg)| {
            arg.into_string()
                .map_err(|arg| anyhow!("Argument {} is not valid Unicode: {:?}", i + 1, arg))
        })
        .collect::<Result<Vec<_>>>()?;
    flags.extend(args);

    let options = Options::parse_from_args(&flags).map_err(|err| anyhow!("{err}"))?;
    debug!("PN options: {:?}", options);

    let config = EngineConfig::load_from_file(&options.config)?;
    let format = options.format.unwrap_or(config.format);

    match options.action {
        Action::Unfold { net, output } => {
            let unfolded = load(&net)?.unfold()?;
            match output {
                Some(path) => {
                    let format = Format::from_path(&path);
                    fs::write(&path, encode_net(&unfolded, format)?)
                        .with_context(|| format!("Failed to write {:?}", path))?;
                }
                None => println!("{}", encode_net(&unfolded, format)?),
            }
        }
        Action::Enabled { net } => {
            let net = load(&net)?;
            let enabled = net.enabled_transitions(&net.initial_state())?;
            println!("{}", enabled.iter().join("\n"));
        }
        Action::Fire { net, transition } => {
            let net = load(&net)?;
            let next = net.fire_transition(&net.initial_state(), &transition)?;
            println!("{}", format.encode(&next)?);
        }
        Action::Eval { net, expr } => {
            let net = load(&net)?;
            let result = evaluate(&expr, &net, &net.initial_state());
            match result.into_result() {
                Ok(value) => println!("{value}"),
                Err(errors) => {
                    return Err(anyhow!(
                        "cannot evaluate {:?}: {}",
                        expr,
                        errors.iter().join(", ")
                    ));
                }
            }
        }
        Action::Rate { net, transition } => {
            let net = load(&net)?;
            println!("{}", net.actual_rate(&transition, &net.initial_state())?);
        }
        _ => return Err(anyhow!("unsupported command")),
    }
    Ok(())
}

fn load(path: &Path) -> Result<PetriNet> {
    let net = read_net(path).with_context(|| format!("Failed to load net: {:?}", path))?;
    debug!(
        "loaded {:?}: {} places, {} transitions",
        path,
        net.places_len(),
        net.transitions_len()
    );
    Ok(net)
}
