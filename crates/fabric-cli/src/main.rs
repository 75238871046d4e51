use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

mod commands;

fn cli() -> Command {
    Command::new("fabric")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Deploy Fabric local driver")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("archive-dir")
                .long("archive-dir")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Root of the per-account archive directories"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Output as JSON"),
        )
        .subcommand(
            Command::new("deploy")
                .about("Upload an archive in chunks and deploy it")
                .arg(Arg::new("account").long("account").required(true).help("Tenant account"))
                .arg(
                    Arg::new("archive")
                        .long("archive")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Application descriptor to upload (.json, .yaml)"),
                )
                .arg(Arg::new("owner").long("owner").help("Requested owner principal"))
                .arg(
                    Arg::new("token")
                        .long("token")
                        .default_value("local")
                        .help("Owner token naming the requesting principal"),
                ),
        )
        .subcommand(
            Command::new("status")
                .about("Show the live or persisted deployment status of an account")
                .arg(Arg::new("account").long("account").required(true).help("Tenant account"))
                .arg(
                    Arg::new("token")
                        .long("token")
                        .default_value("local"),
                ),
        )
        .subcommand(
            Command::new("verify")
                .about("Run only the verification pipeline over a descriptor")
                .arg(
                    Arg::new("spec")
                        .long("spec")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Application descriptor (.json, .yaml)"),
                )
                .arg(
                    Arg::new("namespace")
                        .long("namespace")
                        .default_value("default")
                        .help("Namespace to verify into"),
                )
                .arg(Arg::new("owner").long("owner").help("Requested owner principal")),
        )
}

async fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let config = commands::load_config(
        matches.get_one::<PathBuf>("config"),
        matches.get_one::<PathBuf>("archive-dir"),
    )?;
    let json = matches.get_flag("json");

    match matches.subcommand() {
        Some(("deploy", sub)) => {
            let request = commands::DeployRequest {
                account: required(sub, "account")?,
                archive: sub
                    .get_one::<PathBuf>("archive")
                    .cloned()
                    .ok_or_else(|| anyhow::anyhow!("--archive is required"))?,
                owner: sub.get_one::<String>("owner").cloned(),
                token: required(sub, "token")?,
            };
            let outcome = commands::deploy(config, request).await?;
            commands::print_outcome(&outcome, json)?;
            if outcome.status.status != fabric_core::DeployStatus::Deployed {
                anyhow::bail!("deployment did not complete: {}", outcome.status.message);
            }
        }
        Some(("status", sub)) => {
            let status = commands::status(config, &required(sub, "account")?, &required(sub, "token")?).await?;
            commands::print_status(&status, json)?;
        }
        Some(("verify", sub)) => {
            let spec = sub
                .get_one::<PathBuf>("spec")
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("--spec is required"))?;
            let verified = commands::verify(
                &spec,
                &required(sub, "namespace")?,
                sub.get_one::<String>("owner").cloned(),
            )
            .await?;
            commands::print_verified(&verified, json)?;
        }
        _ => anyhow::bail!("unknown command"),
    }
    Ok(())
}

fn required(matches: &ArgMatches, name: &str) -> anyhow::Result<String> {
    matches
        .get_one::<String>(name)
        .cloned()
        .ok_or_else(|| anyhow::anyhow!("--{name} is required"))
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let matches = cli().get_matches();
    match run(&matches).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        cli().debug_assert();
    }

    #[test]
    fn global_flags_reach_subcommands() {
        let matches = cli()
            .try_get_matches_from(["fabric", "status", "--account", "acme", "--archive-dir", "/srv/archive", "--json"])
            .unwrap();
        assert_eq!(
            matches.get_one::<PathBuf>("archive-dir"),
            Some(&PathBuf::from("/srv/archive"))
        );
        assert!(matches.get_flag("json"));
        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "status");
        assert_eq!(sub.get_one::<String>("account").map(String::as_str), Some("acme"));
    }

    #[test]
    fn deploy_requires_an_archive() {
        assert!(cli().try_get_matches_from(["fabric", "deploy", "--account", "acme"]).is_err());
    }
}
