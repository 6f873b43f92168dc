//! `tcr`: replay operation logs, sign onboarding bundles, generate keys.

use anyhow::{anyhow, Context};
use clap::Parser;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::sync::Arc;

use tcr_cli::{replay, write_summary, CliConfig, LogEntry, Operation, OutputFormat};
use tcr_crypto::{derive_address, generate_keypair, identity_of, keypair_from_seed};
use tcr_registry::{CurationEngine, EngineSnapshot, OnboardingBundle, OnboardingTerms, Registry};
use tcr_types::{KeyPair, SystemClock, Timestamp};
use tcr_utils::{init_logging, LogFormat};

#[derive(Parser)]
#[command(name = "tcr", about = "Token-curated registry engine")]
struct Cli {
    /// Path to a TOML configuration file. Flags and env vars override it.
    #[arg(long, env = "TCR_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "TCR_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "TCR_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Apply a newline-delimited JSON operation log and print the receipts.
    Replay {
        /// Operation log, one JSON object per line.
        log: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Human)]
        output: OutputFormat,

        /// Start from a bincode snapshot instead of a fresh registry.
        #[arg(long)]
        from_snapshot: Option<PathBuf>,

        /// Write a bincode snapshot of the final state here.
        #[arg(long)]
        snapshot_out: Option<PathBuf>,
    },

    /// Sign an onboarding bundle and print it as an `onboard` log entry.
    OnboardingBundle {
        /// Seed of the throwaway key that created the identity (hex).
        #[arg(long, value_parser = parse_seed)]
        controller_seed: [u8; 32],

        /// Seed of the permanent owner key (hex).
        #[arg(long, value_parser = parse_seed)]
        owner_seed: [u8; 32],

        #[arg(long)]
        attribute_key: String,

        /// Attribute value (hex).
        #[arg(long, default_value = "")]
        attribute_value: String,

        #[arg(long, default_value_t = 365 * 24 * 3600)]
        validity_secs: u64,

        /// Directory nonce of the identity at submission.
        #[arg(long, default_value_t = 0)]
        identity_nonce: u64,

        /// Token permit nonce of the owner at submission.
        #[arg(long, default_value_t = 0)]
        permit_nonce: u64,

        /// Latest permit submission time in seconds; 0 never expires.
        #[arg(long, default_value_t = 0)]
        permit_expiry: u64,

        /// Timestamp of the printed log entry.
        #[arg(long, default_value_t = 0)]
        at: u64,
    },

    /// Generate a key, or derive one from a seed, and print its address.
    Keygen {
        #[arg(long, value_parser = parse_seed)]
        seed: Option<[u8; 32]>,
    },
}

fn parse_seed(s: &str) -> Result<[u8; 32], String> {
    <[u8; 32] as hex::FromHex>::from_hex(s).map_err(|e| format!("expected 64 hex characters: {e}"))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CliConfig::from_toml_file(path).with_context(|| format!("loading {}", path.display()))?,
        None => CliConfig::default(),
    };
    let log_level = cli.log_level.clone().unwrap_or_else(|| config.log_level.clone());
    let log_format = cli.log_format.unwrap_or(config.log_format);
    init_logging(log_format, &log_level).map_err(|e| anyhow!("logging init failed: {e}"))?;

    match cli.command {
        Command::Replay {
            log,
            output,
            from_snapshot,
            snapshot_out,
        } => {
            let registry = match from_snapshot {
                Some(path) => {
                    let bytes = std::fs::read(&path).with_context(|| format!("reading {}", path.display()))?;
                    let engine = CurationEngine::restore(EngineSnapshot::from_bytes(&bytes)?);
                    tracing::info!(snapshot = %path.display(), members = engine.member_count(), "restored snapshot");
                    Registry::new(engine, Arc::new(SystemClock))
                }
                None => config.build_registry(Arc::new(SystemClock))?,
            };

            let input = BufReader::new(File::open(&log).with_context(|| format!("opening {}", log.display()))?);
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            let stats = replay(&registry, input, &mut out, output)?;
            if output == OutputFormat::Human {
                write_summary(&mut out, &stats, registry.sequence())?;
            }
            tracing::info!(
                applied = stats.total_applied(),
                rejected = stats.total_rejected(),
                "replay finished"
            );

            if let Some(path) = snapshot_out {
                std::fs::write(&path, registry.snapshot().to_bytes()?)
                    .with_context(|| format!("writing {}", path.display()))?;
                tracing::info!(snapshot = %path.display(), "snapshot written");
            }
        }

        Command::OnboardingBundle {
            controller_seed,
            owner_seed,
            attribute_key,
            attribute_value,
            validity_secs,
            identity_nonce,
            permit_nonce,
            permit_expiry,
            at,
        } => {
            let attribute_value = hex::decode(&attribute_value).context("attribute value must be hex")?;
            let controller = keypair_from_seed(&controller_seed);
            let owner = keypair_from_seed(&owner_seed);
            let terms = OnboardingTerms {
                identity: identity_of(&controller),
                attribute_key,
                attribute_value,
                attribute_validity_secs: validity_secs,
                identity_nonce,
                permit_nonce,
                permit_expiry: Timestamp::new(permit_expiry),
            };
            let bundle = OnboardingBundle::sign(
                &terms,
                &controller,
                &owner,
                &config.engine_address(),
                &tcr_crypto::domain_separator(&config.directory_label),
                &tcr_crypto::domain_separator(&config.token_label),
            );
            let entry = LogEntry {
                at: Timestamp::new(at),
                op: Operation::Onboard { bundle },
            };
            println!("{}", serde_json::to_string(&entry)?);
        }

        Command::Keygen { seed } => {
            let (keypair, printed_seed): (KeyPair, Option<String>) = match seed {
                Some(seed) => (keypair_from_seed(&seed), None),
                None => {
                    let keypair = generate_keypair();
                    let seed = hex::encode(keypair.private.0);
                    (keypair, Some(seed))
                }
            };
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            if let Some(seed) = printed_seed {
                writeln!(out, "seed:       {seed}")?;
            }
            writeln!(out, "public key: {}", hex::encode(keypair.public.0))?;
            writeln!(out, "address:    {}", derive_address(&keypair.public))?;
            writeln!(out, "identity:   {}", identity_of(&keypair))?;
        }
    }

    Ok(())
}
