//! Built-in chain registry: per-chain RPC default, native wrapped token,
//! canonical stablecoins, per-protocol-variant factory/PM addresses,
//! multicall-3 address, and a per-fork DEX label.
//!
//! Covers the four chains referenced across the retrieval corpus (BNB
//! Chain/PancakeSwap in the Python reference, Base/Polygon in the
//! teacher's own `BotConfig`, plus Ethereum mainnet), open for extension
//! via a TOML overlay file merged at startup (`config.rs`).

use crate::types::ProtocolVariant;
use alloy::primitives::{address, Address};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolAddresses {
    pub factory: Address,
    pub position_manager: Address,
    pub swap_router: Address,
    pub quoter: Address,
    /// v4-family only: the `StateView` lens contract used to read `slot0`/
    /// liquidity (v4 pools have no public `slot0` getter of their own).
    /// Zero address for v3-family entries.
    #[serde(default)]
    pub state_view: Address,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainEntry {
    pub chain_id: u64,
    pub label: &'static str,
    pub default_rpc_url: String,
    pub wrapped_native: Address,
    pub stablecoins: Vec<Address>,
    pub multicall3: Address,
    pub protocols: HashMap<String, ProtocolAddresses>,
    /// v2-family router for the swap planner's fallback leg, where one
    /// exists for the chain. `None` disables the v2 quote/swap path
    /// entirely rather than guessing an address.
    #[serde(default)]
    pub v2_router: Option<Address>,
}

impl ChainEntry {
    pub fn protocol(&self, variant: ProtocolVariant) -> Option<&ProtocolAddresses> {
        self.protocols.get(variant.label())
    }

    pub fn is_stablecoin(&self, addr: &Address) -> bool {
        self.stablecoins.contains(addr)
    }
}

fn protocols(entries: &[(ProtocolVariant, ProtocolAddresses)]) -> HashMap<String, ProtocolAddresses> {
    entries.iter().map(|(v, a)| (v.label().to_string(), a.clone())).collect()
}

/// `chain_id -> ChainEntry` built-in table. Real deployment addresses for
/// v4 position managers vary by fork release; placeholders here are the
/// well-known zero address and must be overridden by a chain-registry TOML
/// overlay for any chain actually traded on (see `config.rs::load_chain_registry`).
pub fn builtin_chains() -> HashMap<u64, ChainEntry> {
    let mut map = HashMap::new();

    map.insert(
        1,
        ChainEntry {
            chain_id: 1,
            label: "ethereum",
            default_rpc_url: "https://eth.llamarpc.com".to_string(),
            wrapped_native: address!("C02aaA39b223FE8D0A0e5C4F27eAD9083C756Cc2"),
            stablecoins: vec![
                address!("A0b86991c6218b36c1d19D4a2e9Eb0cE3606eB48"), // USDC
                address!("dAC17F958D2ee523a2206206994597C13D831ec7"), // USDT
            ],
            multicall3: address!("cA11bde05977b3631167028862bE2a173976CA11"),
            v2_router: Some(address!("7a250d5630B4cF539739dF2C5dAcb4c659F2488D")), // Uniswap V2
            protocols: protocols(&[
                (
                    ProtocolVariant::V3Uniswap,
                    ProtocolAddresses {
                        factory: address!("1F98431c8aD98523631AE4a59f267346ea31F984"),
                        position_manager: address!("C36442b4a4522E871399CD717aBDD847Ab11FE88"),
                        swap_router: address!("E592427A0AEce92De3Edee1F18E0157C05861564"),
                        quoter: address!("61fFE014bA17989E743c5F6cB21bF9697530B21e"),
                        state_view: Address::ZERO,
                    },
                ),
                (
                    ProtocolVariant::V4Uniswap,
                    ProtocolAddresses {
                        factory: Address::ZERO, // v4 pools have no per-pair factory
                        position_manager: address!("bD216513d74C8cf14cf4747E6AaA6420FF64ee9e"),
                        swap_router: address!("bD216513d74C8cf14cf4747E6AaA6420FF64ee9e"),
                        quoter: Address::ZERO,
                        state_view: Address::ZERO,
                    },
                ),
            ]),
        },
    );

    map.insert(
        8453,
        ChainEntry {
            chain_id: 8453,
            label: "base",
            default_rpc_url: "https://mainnet.base.org".to_string(),
            wrapped_native: address!("4200000000000000000000000000000000000006"),
            stablecoins: vec![address!("833589fCD6eDb6E08f4c7C32D4f71b54bdA02913")], // USDC
            multicall3: address!("cA11bde05977b3631167028862bE2a173976CA11"),
            v2_router: Some(address!("4752ba5DBc23f44D87826276BF6Fd6b1C372aD24")), // Uniswap V2 on Base
            protocols: protocols(&[
                (
                    ProtocolVariant::V3Uniswap,
                    ProtocolAddresses {
                        factory: address!("33128a8fC17869897dcE68Ed026d694621f6FDfD"),
                        position_manager: address!("03a520b32C04BF3bEEf7BEb72E919cf822Ed34f1"),
                        swap_router: address!("2626664c2603336E57B271c5C0b26F421741e481"),
                        quoter: address!("3d4e44Eb1374240CE5F1B871ab261CD16335B76a"),
                        state_view: Address::ZERO,
                    },
                ),
                (
                    ProtocolVariant::V4Uniswap,
                    ProtocolAddresses {
                        factory: Address::ZERO,
                        position_manager: address!("7C5f5A4bBd8fD63184577525326123B519429bDc"),
                        swap_router: address!("6fF5693b99212Da76ad316178A184AB56D299b43"),
                        quoter: Address::ZERO,
                        state_view: Address::ZERO,
                    },
                ),
                (
                    ProtocolVariant::V3Pancake,
                    ProtocolAddresses {
                        factory: address!("0bFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
                        position_manager: address!("46A15B0b27311cedF172AB29E4f4766fbE7F4364"),
                        swap_router: address!("1b81D678ffb9C0263b24A97847620C99d213eB14"),
                        quoter: address!("B048Bbc1Ee6b733FFfCFb9e9CeF7375518e25997"),
                        state_view: Address::ZERO,
                    },
                ),
            ]),
        },
    );

    map.insert(
        137,
        ChainEntry {
            chain_id: 137,
            label: "polygon",
            default_rpc_url: "https://polygon-rpc.com".to_string(),
            wrapped_native: address!("0d500B1d8E8eF31E21C99d1Db9A6444d3ADf1270"),
            stablecoins: vec![
                address!("2791Bca1f2de4661ED88A30C99A7a9449Aa84174"), // USDC.e
                address!("3c499c542cEF5E3811e1192ce70d8cC03d5c3359"), // native USDC
                address!("c2132D05D31c914a87C6611C10748AEb04B58e8F"), // USDT
            ],
            multicall3: address!("cA11bde05977b3631167028862bE2a173976CA11"),
            v2_router: None, // no v2 deployment in the retrieval corpus for this chain
            protocols: protocols(&[(
                ProtocolVariant::V3Uniswap,
                ProtocolAddresses {
                    factory: address!("1F98431c8aD98523631AE4a59f267346ea31F984"),
                    position_manager: address!("C36442b4a4522E871399CD717aBDD847Ab11FE88"),
                    swap_router: address!("E592427A0AEce92De3Edee1F18E0157C05861564"),
                    quoter: address!("61fFE014bA17989E743c5F6cB21bF9697530B21e"),
                    state_view: Address::ZERO,
                },
            )]),
        },
    );

    map.insert(
        56,
        ChainEntry {
            chain_id: 56,
            label: "bnb-chain",
            default_rpc_url: "https://bsc-dataseed.binance.org".to_string(),
            wrapped_native: address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c"), // WBNB
            stablecoins: vec![
                address!("55d398326f99059fF775485246999027B3197955"), // USDT
                address!("8AC76a51cc950d9822D68b83fE1Ad97B32Cd580d"), // USDC
            ],
            multicall3: address!("cA11bde05977b3631167028862bE2a173976CA11"),
            v2_router: Some(address!("10ED43C718714eb63d5aA57B78B54704E256024E")), // PancakeSwap V2
            protocols: protocols(&[(
                ProtocolVariant::V3Pancake,
                ProtocolAddresses {
                    factory: address!("0BFbCF9fa4f9C56B0F40a671Ad40E0805A091865"),
                    position_manager: address!("46A15B0b27311cedF172AB29E4f4766fbE7F4364"),
                    swap_router: address!("1b81D678ffb9C0263b24A97847620C99d213eB14"),
                    quoter: address!("B048Bbc1Ee6b733FFfCFb9e9CeF7375518e25997"),
                    state_view: Address::ZERO,
                },
            )]),
        },
    );

    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_chains_cover_expected_set() {
        let chains = builtin_chains();
        for id in [1u64, 8453, 137, 56] {
            assert!(chains.contains_key(&id), "missing chain {id}");
        }
    }

    #[test]
    fn base_has_uniswap_and_pancake_v3() {
        let chains = builtin_chains();
        let base = &chains[&8453];
        assert!(base.protocol(ProtocolVariant::V3Uniswap).is_some());
        assert!(base.protocol(ProtocolVariant::V3Pancake).is_some());
    }
}
