//! Ambient configuration: process settings sourced from the environment
//! (RPC endpoint, chain id, key vault location, proxy), and the file-based
//! config layer that crosses the CLI boundary — `LadderConfig`, persisted
//! `OpenPosition` lists, and a chain-registry TOML overlay merged on top of
//! the built-in table (spec.md §6 "open for extension by configuration").

use crate::chain_registry::{builtin_chains, ChainEntry};
use crate::types::{LadderConfig, OpenPosition};
use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;

/// Process-wide runtime settings, loaded once at binary startup from the
/// environment (with `.env` support via `dotenv`, matching the teacher's
/// own `load_config` convention).
#[derive(Debug, Clone)]
pub struct ProcessConfig {
    pub rpc_url: String,
    pub chain_id: u64,
    /// Path to the encrypted key-vault ciphertext file (spec.md §4.J wire
    /// format). The password itself is never read from this config — it
    /// comes from `vault_password_env` at unlock time so it never touches
    /// a config file or process argument.
    pub key_vault_path: String,
    pub vault_password_env: String,
    /// Optional SOCKS5/HTTP(S) proxy for the JSON-RPC transport.
    pub proxy_url: Option<String>,
    pub receipt_timeout_secs: u64,
    /// Overlay file merged on top of the built-in chain registry.
    pub chain_registry_overlay: Option<String>,
}

impl ProcessConfig {
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();
        Ok(Self {
            rpc_url: std::env::var("RPC_URL").context("RPC_URL not set")?,
            chain_id: std::env::var("CHAIN_ID")
                .context("CHAIN_ID not set")?
                .parse()
                .context("CHAIN_ID must be a u64")?,
            key_vault_path: std::env::var("KEY_VAULT_PATH").unwrap_or_else(|_| "vault.key".to_string()),
            vault_password_env: std::env::var("VAULT_PASSWORD_ENV").unwrap_or_else(|_| "VAULT_PASSWORD".to_string()),
            proxy_url: std::env::var("RPC_PROXY_URL").ok(),
            receipt_timeout_secs: std::env::var("RECEIPT_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(120),
            chain_registry_overlay: std::env::var("CHAIN_REGISTRY_OVERLAY").ok(),
        })
    }

    /// Reads the vault's unlock password out of the environment variable
    /// named by `vault_password_env`, never out of a file or argv.
    pub fn vault_password(&self) -> Result<String> {
        std::env::var(&self.vault_password_env)
            .with_context(|| format!("{} not set", self.vault_password_env))
    }
}

/// Loads a `LadderConfig` from a TOML file at the CLI boundary (spec.md §6
/// external-interfaces table — the field set there maps directly onto
/// `LadderConfig`'s `serde` derive).
pub fn load_ladder_config(path: &Path) -> Result<LadderConfig> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading ladder config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing ladder config {}", path.display()))
}

/// Persists a `LadderConfig` back to TOML — used by `ladder-daemon` to
/// rewrite a config after an interactive edit, and by tests to build
/// fixtures on disk.
pub fn save_ladder_config(path: &Path, config: &LadderConfig) -> Result<()> {
    let raw = toml::to_string_pretty(config).context("serializing ladder config")?;
    std::fs::write(path, raw).with_context(|| format!("writing ladder config {}", path.display()))
}

/// Loads the opaque `OpenPosition` list the core emitted after a prior
/// `create_ladder` call (spec.md §6 persistence boundary: the core treats
/// the serialization format as an external collaborator's concern — this
/// JSON encoding is the CLI's own choice, not a requirement the core
/// imposes on every caller).
pub fn load_positions(path: &Path) -> Result<Vec<OpenPosition>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading positions file {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing positions file {}", path.display()))
}

pub fn save_positions(path: &Path, positions: &[OpenPosition]) -> Result<()> {
    let raw = serde_json::to_string_pretty(positions).context("serializing positions")?;
    std::fs::write(path, raw).with_context(|| format!("writing positions file {}", path.display()))
}

/// Merges a TOML chain-registry overlay on top of the built-in table. An
/// overlay entry for a chain id already in the built-in table replaces it
/// wholesale (no field-by-field merge) — a chain either trusts the
/// built-in addresses or fully owns its own entry, never a patchwork of
/// both.
pub fn load_chain_registry(overlay_path: Option<&Path>) -> Result<HashMap<u64, ChainEntry>> {
    let mut chains = builtin_chains();
    if let Some(path) = overlay_path {
        if path.exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("reading chain registry overlay {}", path.display()))?;
            let overlay: HashMap<u64, ChainEntry> = toml::from_str(&raw)
                .with_context(|| format!("parsing chain registry overlay {}", path.display()))?;
            for (chain_id, entry) in overlay {
                chains.insert(chain_id, entry);
            }
        }
    }
    Ok(chains)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DistributionType, ProtocolVariant, StableSide};
    use alloy::primitives::address;

    fn sample_config() -> LadderConfig {
        LadderConfig {
            token0_address: address!("0000000000000000000000000000000000000001"),
            token1_address: address!("0000000000000000000000000000000000000002"),
            token0_decimals: Some(18),
            token1_decimals: Some(6),
            current_price: 600.0,
            lower_price: None,
            percent_from: Some(-5.0),
            percent_to: Some(-40.0),
            total_usd: 1000.0,
            n_positions: 7,
            fee_tier: 2500,
            tick_spacing_override: None,
            distribution_type: DistributionType::Linear,
            slippage_percent: 1.0,
            hooks: None,
            protocol_variant: ProtocolVariant::V3Uniswap,
            allow_custom_fee: false,
            stable_token: StableSide::Token1,
            auto_create_pool: false,
        }
    }

    #[test]
    fn ladder_config_round_trips_through_toml() {
        let dir = tempdir();
        let path = dir.join("ladder.toml");
        save_ladder_config(&path, &sample_config()).unwrap();
        let loaded = load_ladder_config(&path).unwrap();
        assert_eq!(loaded.total_usd, 1000.0);
        assert_eq!(loaded.n_positions, 7);
        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn positions_file_defaults_to_empty_when_missing() {
        let dir = tempdir();
        let path = dir.join("does-not-exist.json");
        let positions = load_positions(&path).unwrap();
        assert!(positions.is_empty());
    }

    #[test]
    fn chain_registry_overlay_replaces_builtin_entry() {
        let builtin = builtin_chains();
        assert!(builtin.contains_key(&8453));
        // With no overlay path, we just get the builtin table back.
        let chains = load_chain_registry(None).unwrap();
        assert_eq!(chains.len(), builtin.len());
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("ladder-engine-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }
}
