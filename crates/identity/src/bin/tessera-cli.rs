//! Tessera CLI Tool
//!
//! Command-line interface for issuing and redeeming enveloped identity
//! tokens against a service configuration, independently of any server.
//!
//! Configuration comes from `--config <file>` (TOML) or, when absent, from
//! `TESSERA_*` environment variables. The caller secret comes from `--secret`
//! or the `TESSERA_CALLER_SECRET` environment variable.

use anyhow::{anyhow, bail, Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use std::process;
use tessera_core::{logging, ServiceConfig};
use tessera_identity::{ExtensionMap, ExtensionValue, TokenAuthority, TokenService};

const CALLER_SECRET_ENV: &str = "TESSERA_CALLER_SECRET";

/// JSON output for issue command
#[derive(Debug, Serialize)]
struct IssueOutput {
    token: String,
    subject: String,
    expires_in_secs: u64,
}

/// JSON output for redeem command
#[derive(Debug, Serialize)]
struct RedeemOutput {
    valid: bool,
    subject: Option<String>,
    display_name: Option<String>,
    expires_at: Option<i64>,
    extensions: Option<ExtensionMap>,
    error: Option<&'static str>,
}

#[derive(Debug, Default)]
struct CommonArgs {
    config: Option<PathBuf>,
    secret: Option<String>,
    json: bool,
}

fn load_service(config: Option<PathBuf>) -> Result<TokenService> {
    let config = match config {
        Some(path) => ServiceConfig::from_file(&path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => ServiceConfig::from_env().context("Failed to read TESSERA_* environment")?,
    };
    Ok(TokenService::new(config)?)
}

fn caller_secret(explicit: Option<String>) -> Result<String> {
    explicit
        .or_else(|| std::env::var(CALLER_SECRET_ENV).ok())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow!("Missing --secret argument (or {CALLER_SECRET_ENV})"))
}

/// Parse `key=value`, inferring bool, integer and float values.
fn parse_extension(raw: &str) -> Result<(String, ExtensionValue)> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("Extension '{raw}' is not of the form key=value"))?;

    if key.is_empty() {
        bail!("Extension '{raw}' has an empty key");
    }

    let value = if let Ok(b) = value.parse::<bool>() {
        ExtensionValue::Bool(b)
    } else if let Ok(i) = value.parse::<i64>() {
        ExtensionValue::Integer(i)
    } else if let Some(f) = value.parse::<f64>().ok().filter(|f| f.is_finite()) {
        ExtensionValue::Float(f)
    } else {
        ExtensionValue::String(value.to_string())
    };

    Ok((key.to_string(), value))
}

fn cmd_issue(
    authority: &dyn TokenAuthority,
    expires_in_secs: u64,
    secret: &str,
    subject: &str,
    display_name: &str,
    extensions: Option<ExtensionMap>,
    json: bool,
) -> Result<()> {
    let token = authority.issue_token(secret, subject, display_name, extensions)?;

    if json {
        let output = IssueOutput {
            token,
            subject: subject.to_string(),
            expires_in_secs,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", token);
    }

    Ok(())
}

fn cmd_redeem(authority: &dyn TokenAuthority, token: &str, secret: &str, json: bool) -> Result<()> {
    match authority.redeem_claims(token, secret) {
        Ok(claims) => {
            if json {
                let output = RedeemOutput {
                    valid: true,
                    subject: Some(claims.subject().to_string()),
                    display_name: Some(claims.display_name().to_string()),
                    expires_at: Some(claims.expires_at()),
                    extensions: claims.extensions().cloned(),
                    error: None,
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("Subject: {}", claims.subject());
                println!("Display name: {}", claims.display_name());
                println!("Expires at: {}", claims.expires_at());
            }
            Ok(())
        }
        Err(err) => {
            if json {
                let output = RedeemOutput {
                    valid: false,
                    subject: None,
                    display_name: None,
                    expires_at: None,
                    extensions: None,
                    error: Some(err.kind()),
                };
                println!("{}", serde_json::to_string_pretty(&output)?);
            }
            Err(err.into())
        }
    }
}

/// Take the value following a flag.
fn flag_value(args: &[String], i: &mut usize, flag: &str) -> Result<String> {
    *i += 1;
    args.get(*i)
        .cloned()
        .ok_or_else(|| anyhow!("Missing value for {flag}"))
}

/// Consume flags shared by every command. Returns false for unknown flags.
fn parse_common(args: &[String], i: &mut usize, common: &mut CommonArgs) -> Result<bool> {
    match args[*i].as_str() {
        "--config" | "-c" => common.config = Some(PathBuf::from(flag_value(args, i, "--config")?)),
        "--secret" | "-s" => common.secret = Some(flag_value(args, i, "--secret")?),
        "--json" => common.json = true,
        _ => return Ok(false),
    }
    Ok(true)
}

fn run_issue(args: &[String]) -> Result<()> {
    let mut common = CommonArgs::default();
    let mut subject = None;
    let mut display_name = None;
    let mut extensions = ExtensionMap::new();

    let mut i = 0;
    while i < args.len() {
        if !parse_common(args, &mut i, &mut common)? {
            match args[i].as_str() {
                "--subject" | "-u" => subject = Some(flag_value(args, &mut i, "--subject")?),
                "--name" | "-n" => display_name = Some(flag_value(args, &mut i, "--name")?),
                "--ext" | "-e" => {
                    let (key, value) = parse_extension(&flag_value(args, &mut i, "--ext")?)?;
                    extensions.insert(key, value);
                }
                other => bail!("Unknown argument: {other}"),
            }
        }
        i += 1;
    }

    let subject = subject.ok_or_else(|| anyhow!("Missing --subject argument"))?;
    let display_name = display_name.unwrap_or_default();
    let secret = caller_secret(common.secret)?;
    let service = load_service(common.config)?;
    let extensions = (!extensions.is_empty()).then_some(extensions);

    cmd_issue(
        &service,
        service.timeout().as_secs(),
        &secret,
        &subject,
        &display_name,
        extensions,
        common.json,
    )
}

fn run_redeem(args: &[String]) -> Result<()> {
    let mut common = CommonArgs::default();
    let mut token = None;

    let mut i = 0;
    while i < args.len() {
        if !parse_common(args, &mut i, &mut common)? {
            match args[i].as_str() {
                "--token" | "-t" => token = Some(flag_value(args, &mut i, "--token")?),
                other => bail!("Unknown argument: {other}"),
            }
        }
        i += 1;
    }

    let token = token.ok_or_else(|| anyhow!("Missing --token argument"))?;
    let secret = caller_secret(common.secret)?;
    let service = load_service(common.config)?;

    cmd_redeem(&service, &token, &secret, common.json)
}

fn print_usage() {
    println!("Tessera CLI - Issue and redeem enveloped identity tokens");
    println!();
    println!("USAGE:");
    println!("    tessera-cli issue --subject <id> [--name <display>] [--ext key=value]... [options]");
    println!("    tessera-cli redeem --token <envelope> [options]");
    println!();
    println!("OPTIONS:");
    println!("    --config <file>    TOML service configuration (default: TESSERA_* env vars)");
    println!("    --secret <secret>  Caller signing secret (default: {CALLER_SECRET_ENV})");
    println!("    --json             Emit JSON output");
    println!();
    println!("EXAMPLES:");
    println!("    tessera-cli issue --subject u1 --name Alice --secret s3cr3t --ext tenant=acme");
    println!("    tessera-cli redeem --token <envelope> --secret s3cr3t --json");
}

fn main() {
    logging::init_cli();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else {
        print_usage();
        process::exit(1);
    };

    let result = match command.as_str() {
        "issue" => run_issue(&args[2..]),
        "redeem" => run_redeem(&args[2..]),
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            print_usage();
            Err(anyhow!("Unknown command: {other}"))
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}
