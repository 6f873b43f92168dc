//! Tool configuration with TOML file support.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

use tcr_crypto::{derive_address, keypair_from_seed};
use tcr_identity::IdentityDirectory;
use tcr_registry::{CurationEngine, EngineParts, Registry};
use tcr_token::TokenLedger;
use tcr_types::{Address, Clock, RegistryConfig, TokenAmount};
use tcr_utils::{format_duration, LogFormat};

use crate::CliError;

/// Tokens credited to an address before the first logged operation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub address: Address,
    pub amount: TokenAmount,
}

/// Configuration for one registry instance driven by the tool.
///
/// Loaded from a TOML file via [`CliConfig::from_toml_file`]; every field
/// has a default, so an empty file describes a working development registry.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CliConfig {
    /// Seed of the administrator key.
    #[serde(default = "default_admin_seed", with = "hex::serde")]
    pub admin_seed: [u8; 32],

    /// Seed of the key the engine acts as (store owner, permit spender).
    #[serde(default = "default_engine_seed", with = "hex::serde")]
    pub engine_seed: [u8; 32],

    /// Seed of the stake vault's token account.
    #[serde(default = "default_vault_seed", with = "hex::serde")]
    pub vault_seed: [u8; 32],

    /// Label the identity directory's signed requests are bound to.
    #[serde(default = "default_directory_label")]
    pub directory_label: String,

    /// Label the payment token's permits are bound to.
    #[serde(default = "default_token_label")]
    pub token_label: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,

    /// Registry parameters at deployment.
    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub genesis: Vec<Allocation>,
}

fn default_admin_seed() -> [u8; 32] {
    [0xAD; 32]
}

fn default_engine_seed() -> [u8; 32] {
    [0xE0; 32]
}

fn default_vault_seed() -> [u8; 32] {
    [0xE1; 32]
}

fn default_directory_label() -> String {
    "tcr-directory".to_string()
}

fn default_token_label() -> String {
    "tcr-token".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl CliConfig {
    /// Load configuration from a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, CliError> {
        let content = std::fs::read_to_string(path).map_err(|e| CliError::Config(e.to_string()))?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(s: &str) -> Result<Self, CliError> {
        toml::from_str(s).map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn to_toml_string(&self) -> Result<String, CliError> {
        toml::to_string_pretty(self).map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn admin_address(&self) -> Address {
        derive_address(&keypair_from_seed(&self.admin_seed).public)
    }

    pub fn engine_address(&self) -> Address {
        derive_address(&keypair_from_seed(&self.engine_seed).public)
    }

    pub fn vault_address(&self) -> Address {
        derive_address(&keypair_from_seed(&self.vault_seed).public)
    }

    /// A fresh engine with the genesis allocations minted.
    pub fn build_engine(&self) -> Result<CurationEngine, CliError> {
        let mut ledger = TokenLedger::new(&self.token_label);
        for allocation in &self.genesis {
            ledger.mint(&allocation.address, allocation.amount)?;
        }
        let engine = self.engine_address();
        let parts = EngineParts::fresh(
            IdentityDirectory::new(&self.directory_label),
            ledger,
            &engine,
            self.vault_address(),
        );
        let engine = CurationEngine::new(engine, self.admin_address(), self.registry.clone(), parts)?;
        tracing::info!(
            engine = %engine.address(),
            admin = %engine.admin(),
            allocations = self.genesis.len(),
            voting_period = %format_duration(self.registry.voting_period_secs),
            "registry initialised"
        );
        Ok(engine)
    }

    pub fn build_registry(&self, clock: Arc<dyn Clock>) -> Result<Registry, CliError> {
        Ok(Registry::new(self.build_engine()?, clock))
    }
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            admin_seed: default_admin_seed(),
            engine_seed: default_engine_seed(),
            vault_seed: default_vault_seed(),
            directory_label: default_directory_label(),
            token_label: default_token_label(),
            log_level: default_log_level(),
            log_format: LogFormat::default(),
            registry: RegistryConfig::default(),
            genesis: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_round_trips_through_toml() {
        let mut config = CliConfig::default();
        config.genesis.push(Allocation {
            address: config.admin_address(),
            amount: TokenAmount::from_tokens(50),
        });
        let toml_str = config.to_toml_string().unwrap();
        let parsed = CliConfig::from_toml_str(&toml_str).expect("should parse");
        assert_eq!(parsed.engine_seed, config.engine_seed);
        assert_eq!(parsed.registry, config.registry);
        assert_eq!(parsed.genesis, config.genesis);
    }

    #[test]
    fn minimal_toml_uses_defaults() {
        let config = CliConfig::from_toml_str("").expect("empty toml should use defaults");
        assert_eq!(config.directory_label, "tcr-directory");
        assert_eq!(config.log_level, "info");
        assert_eq!(config.log_format, LogFormat::Human);
        assert_eq!(config.registry, RegistryConfig::default());
        assert!(config.genesis.is_empty());
    }

    #[test]
    fn partial_toml_overrides() {
        let toml = r#"
            log_format = "json"
            token_label = "staging-token"

            [registry]
            voting_period_secs = 600
            application_fee = "2.5"
        "#;
        let config = CliConfig::from_toml_str(toml).expect("should parse");
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.token_label, "staging-token");
        assert_eq!(config.registry.voting_period_secs, 600);
        assert_eq!(config.registry.application_fee, "2.5".parse::<TokenAmount>().unwrap());
        assert_eq!(config.registry.challenge_deposit, TokenAmount::from_tokens(10));
    }

    #[test]
    fn missing_file_returns_config_error() {
        let result = CliConfig::from_toml_file("/nonexistent/tcr.toml");
        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    fn genesis_is_minted_from_file() {
        let holder = derive_address(&keypair_from_seed(&[9; 32]).public);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[genesis]]\naddress = \"{holder}\"\namount = \"100.0\"").unwrap();

        let config = CliConfig::from_toml_file(file.path()).unwrap();
        let engine = config.build_engine().unwrap();
        assert_eq!(engine.ledger().balance_of(&holder), TokenAmount::from_tokens(100));
        assert_eq!(engine.admin(), &config.admin_address());
        assert_eq!(engine.vault_address(), &config.vault_address());
    }
}
