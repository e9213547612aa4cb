//! Regula CLI
//!
//! Resolves permissions against a configured policy.

use anyhow::{Context as _, bail};
use clap::{Parser, Subcommand};
use regula::{
    AppConfig, Context, Registry, Resolution, demo,
    config::{LogFormat, LoggingConfig, load_config},
};
use tracing::{debug, error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Regula - hierarchical, context-aware permissions
#[derive(Parser, Debug)]
#[command(name = "regula")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, env = "REGULA_CONFIG")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(long, env = "REGULA_LOG_LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a permission for a user
    Check {
        /// User name
        #[arg(short, long)]
        user: String,

        /// Permission id (e.g. essentials.fly)
        permission: String,

        /// Context entry as key=value (repeatable)
        #[arg(short = 'x', long = "context", value_parser = parse_context_pair)]
        context: Vec<(String, String)>,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Resolve a permission for a group
    Group {
        /// Group name
        #[arg(short, long)]
        name: String,

        /// Permission id (e.g. essentials.fly)
        permission: String,

        /// Context entry as key=value (repeatable)
        #[arg(short = 'x', long = "context", value_parser = parse_context_pair)]
        context: Vec<(String, String)>,

        /// Print the resolution as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run the built-in game server scenario
    Demo,
}

fn parse_context_pair(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected key=value, got '{}'", s)),
    }
}

fn init_logging(config: &LoggingConfig, level_override: Option<&str>) {
    let level = level_override.unwrap_or(config.level.as_str());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let registry = tracing_subscriber::registry().with(filter);
    match config.format {
        LogFormat::Pretty => registry
            .with(fmt::layer().with_writer(std::io::stderr))
            .init(),
        LogFormat::Json => registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init(),
    }
}

fn build_registry(config: &AppConfig) -> anyhow::Result<Registry> {
    Registry::from_policy(&config.policy, config.resolver.options())
        .inspect_err(|e| error!(error = %e, "Failed to build registry from policy"))
        .context("invalid policy")
}

fn describe(registry: &Registry, resolution: &Resolution) -> String {
    let verdict = if resolution.is_granted() {
        "granted"
    } else {
        "not granted"
    };
    match resolution.source.and_then(|s| registry.subject_name(s)) {
        Some(name) => format!("{} ({}, from '{}')", resolution.state, verdict, name),
        None => format!("{} ({})", resolution.state, verdict),
    }
}

fn print_resolution(
    registry: &Registry,
    subject: &str,
    permission: &str,
    context: &Context,
    resolution: &Resolution,
    json: bool,
) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(resolution)?);
    } else {
        println!(
            "{} {} {}: {}",
            subject,
            permission,
            context,
            describe(registry, resolution)
        );
    }
    Ok(())
}

fn run_demo() -> anyhow::Result<()> {
    let mut registry = Registry::new();
    let scenario = demo::build(&mut registry)?;
    debug!(groups = registry.group_count(), "Built demo scenario");

    println!("\nPermissions for Alex:");
    for (permission, context) in demo::checks() {
        let resolution = registry.explain_user(scenario.alex, permission, &context);
        let state = resolution.state;
        let source = resolution
            .source
            .and_then(|s| registry.subject_name(s))
            .unwrap_or("-");
        println!(
            "  {:<25} | Context: {:<17} | Granted: {:<5} (Set:{} Value:{}) | Source: {}",
            permission,
            context.to_string(),
            state.is_granted(),
            state.set,
            state.value,
            source
        );
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(args.config.as_deref())?;
    init_logging(&config.logging, args.log_level.as_deref());

    info!(version = env!("CARGO_PKG_VERSION"), "Starting regula");

    match args.command {
        Command::Check {
            user,
            permission,
            context,
            json,
        } => {
            let registry = build_registry(&config)?;
            let Some(id) = registry.find_user(&user) else {
                bail!("unknown user '{}'", user);
            };
            let context: Context = context.into_iter().collect();
            let resolution = registry.explain_user(id, &permission, &context);
            print_resolution(&registry, &user, &permission, &context, &resolution, json)?;
        }
        Command::Group {
            name,
            permission,
            context,
            json,
        } => {
            let registry = build_registry(&config)?;
            let Some(id) = registry.find_group(&name) else {
                bail!("unknown group '{}'", name);
            };
            let context: Context = context.into_iter().collect();
            let resolution = registry.explain_group(id, &permission, &context);
            print_resolution(&registry, &name, &permission, &context, &resolution, json)?;
        }
        Command::Demo => run_demo()?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_context_pair() {
        assert_eq!(
            parse_context_pair("world=nether"),
            Ok(("world".to_string(), "nether".to_string()))
        );
        assert_eq!(
            parse_context_pair("note=a=b"),
            Ok(("note".to_string(), "a=b".to_string()))
        );
        assert!(parse_context_pair("world").is_err());
        assert!(parse_context_pair("=nether").is_err());
    }

    #[test]
    fn test_args_parse_check() {
        let args = Args::try_parse_from([
            "regula",
            "check",
            "--user",
            "Alex",
            "essentials.fly",
            "-x",
            "world=nether",
        ])
        .unwrap();
        match args.command {
            Command::Check {
                user,
                permission,
                context,
                json,
            } => {
                assert_eq!(user, "Alex");
                assert_eq!(permission, "essentials.fly");
                assert_eq!(context, vec![("world".to_string(), "nether".to_string())]);
                assert!(!json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
