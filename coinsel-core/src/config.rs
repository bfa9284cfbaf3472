//! Configuration management for the selection engine.
//!
//! Chain-specific constants (transaction size profile, dust policy,
//! eligibility rules) are stored in TOML. Every section is optional and falls
//! back to the legacy Bitcoin defaults.
//!
//! ```toml
//! [chain]
//! name = "bitcoin-cash"
//! dust_limit = 546
//!
//! [size]
//! per_input = 148
//!
//! [dust]
//! policy = "fixed"
//! threshold = 546
//!
//! [eligibility]
//! min_confirmations = 1
//! exclude_replayable = true
//! ```

use anyhow::{anyhow, Result};
use bitcoin::Amount;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fs;
use std::path::Path;

use crate::logging::{self, LogLevel};
use crate::size::{ScriptType, SizeProfile};
use crate::utxo_selection::dust::{DustPolicy, EligibilityRules, ReplayPolicy};

/// Main configuration structure for a coin selector
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SelectorConfig {
    #[serde(default)]
    pub chain: ChainConfig,

    #[serde(default)]
    pub size: SizeOverrides,

    #[serde(default)]
    pub dust: DustPolicy,

    #[serde(default)]
    pub eligibility: EligibilityConfig,
}

/// Supported chains and their default size profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ChainName {
    /// Bitcoin with legacy P2PKH outputs
    #[default]
    Bitcoin,
    /// Bitcoin with native SegWit P2WPKH outputs
    BitcoinSegwit,
    /// Bitcoin Cash (legacy outputs only)
    BitcoinCash,
}

impl ChainName {
    pub fn size_profile(self) -> SizeProfile {
        match self {
            ChainName::Bitcoin | ChainName::BitcoinCash => SizeProfile::LEGACY,
            ChainName::BitcoinSegwit => SizeProfile::SEGWIT_V0,
        }
    }

    /// Relay dust limit of this chain's default output type
    pub fn dust_limit(self) -> u64 {
        match self {
            ChainName::Bitcoin | ChainName::BitcoinCash => ScriptType::P2PKH.dust_limit(),
            ChainName::BitcoinSegwit => ScriptType::P2WPKH.dust_limit(),
        }
    }
}

/// Chain selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ChainConfig {
    #[serde(default)]
    pub name: ChainName,

    /// Smallest change output relay nodes accept, overriding the chain preset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dust_limit: Option<u64>,
}

/// Explicit size constants overriding the chain preset
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SizeOverrides {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_overhead: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_input: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_output: Option<u64>,
}

/// Candidate filter settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct EligibilityConfig {
    /// Minimum confirmations for outputs that are not force-included
    #[serde(default)]
    pub min_confirmations: u32,

    /// Only spend replayable outputs when force-included
    #[serde(default)]
    pub exclude_replayable: bool,
}

impl SelectorConfig {
    /// Parse configuration from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| anyhow!("Failed to parse config: {}", e))
    }

    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path.display(), e))?;

        let config = Self::parse(&content)?;
        config.validate()?;

        if logging::enabled(LogLevel::Info) {
            logging::log_config(
                LogLevel::Info,
                "config_loaded",
                Some(json!({
                    "path": path.display().to_string(),
                    "chain": format!("{:?}", config.chain.name),
                })),
            );
        }

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)
            .map_err(|e| anyhow!("Failed to serialize config: {}", e))?;

        fs::write(path, content)
            .map_err(|e| anyhow!("Failed to write config file {}: {}", path.display(), e))?;

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        let profile = self.size_profile();

        if profile.per_input == 0 {
            return Err(anyhow!("Invalid input size: must be greater than 0"));
        }

        if profile.per_output == 0 {
            return Err(anyhow!("Invalid output size: must be greater than 0"));
        }

        Ok(())
    }

    /// Size profile after applying overrides to the chain preset
    pub fn size_profile(&self) -> SizeProfile {
        let preset = self.chain.name.size_profile();

        SizeProfile {
            base_overhead: self.size.base_overhead.unwrap_or(preset.base_overhead),
            per_input: self.size.per_input.unwrap_or(preset.per_input),
            per_output: self.size.per_output.unwrap_or(preset.per_output),
        }
    }

    /// Relay dust limit for change outputs priced with the profile default
    pub fn dust_limit(&self) -> Amount {
        Amount::from_sat(
            self.chain
                .dust_limit
                .unwrap_or_else(|| self.chain.name.dust_limit()),
        )
    }

    pub fn eligibility_rules(&self) -> EligibilityRules {
        EligibilityRules {
            min_confirmations: self.eligibility.min_confirmations,
            replay_policy: if self.eligibility.exclude_replayable {
                ReplayPolicy::ExcludeReplayable
            } else {
                ReplayPolicy::Allow
            },
        }
    }
}

/// Ensure a configuration file exists at the specified path
/// If it doesn't exist, create it with default values
pub fn ensure_config_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        // Create parent directories if they don't exist
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)
                    .map_err(|e| anyhow!("Failed to create config directory: {}", e))?;
            }
        }

        SelectorConfig::default().save(path)?;
    }

    Ok(())
}
