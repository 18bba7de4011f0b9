//! One-shot CLI front-end: `create`, `close`, `swap`, `list` subcommands
//! over a `LadderConfig` file (spec.md §6 external interfaces).
//!
//! Exit codes: `0` success, `2` invalid input, `3` insufficient balance,
//! `4` pool missing, `5` simulation failed, `6` on-chain revert, `7` timeout.

use alloy::providers::Provider;
use clap::{Parser, Subcommand};
use ladder_engine::config::{load_ladder_config, load_positions, save_positions, ProcessConfig};
use ladder_engine::error::{BalanceError, CoreError, ExecutionError, PoolError};
use ladder_engine::executor::{BatchExecutor, NonceManager};
use ladder_engine::rpc::connect_provider;
use ladder_engine::vault::{EncryptedKeyVault, Signer};
use ladder_engine::{chain_registry, swap, LadderOrchestrator};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "ladder-cli", about = "Concentrated-liquidity ladder position manager")]
struct Cli {
    /// Path to the ladder config TOML.
    #[arg(long, default_value = "ladder.toml")]
    config: PathBuf,

    /// Path to the persisted open-positions JSON.
    #[arg(long, default_value = "positions.json")]
    positions: PathBuf,

    /// Path to the encrypted key vault ciphertext.
    #[arg(long)]
    key_vault: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new ladder of positions from the config file.
    Create,
    /// Close every tracked position for the configured pool.
    Close,
    /// Sell a leftover token balance into the stable side.
    Swap {
        token: String,
        #[arg(long, default_value_t = 1.0)]
        slippage_percent: f64,
    },
    /// Print the tracked open positions.
    List,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let code = run().await;
    std::process::exit(code);
}

async fn run() -> i32 {
    let cli = Cli::parse();

    let process_config = match ProcessConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "process config");
            return 2;
        }
    };

    let ladder_config = match load_ladder_config(&cli.config) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "loading ladder config");
            return 2;
        }
    };

    let chains = match ladder_engine::config::load_chain_registry(
        process_config.chain_registry_overlay.as_ref().map(PathBuf::from).as_deref(),
    ) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "loading chain registry");
            return 2;
        }
    };
    let chain = match chains.get(&process_config.chain_id) {
        Some(c) => c.clone(),
        None => {
            tracing::error!(chain_id = process_config.chain_id, "unknown chain id");
            return 2;
        }
    };

    let key_vault_path = cli.key_vault.unwrap_or_else(|| PathBuf::from(&process_config.key_vault_path));
    let ciphertext = match std::fs::read_to_string(&key_vault_path) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, path = %key_vault_path.display(), "reading key vault");
            return 2;
        }
    };
    let password = match process_config.vault_password() {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "reading vault password");
            return 2;
        }
    };
    let vault = match EncryptedKeyVault::unlock(ciphertext.trim(), &password) {
        Ok(v) => v,
        Err(e) => {
            tracing::error!(error = %e, "unlocking key vault");
            return 2;
        }
    };
    let eoa = vault.address();
    let signer: Arc<dyn Signer> = Arc::new(vault);

    let provider = match connect_provider(
        &process_config.rpc_url,
        process_config.proxy_url.as_deref(),
        std::time::Duration::from_secs(process_config.receipt_timeout_secs),
    ) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "connecting RPC provider");
            return 2;
        }
    };

    let nonce_manager = NonceManager::new();
    if let Ok(pending) = provider.get_transaction_count(eoa).pending().await {
        nonce_manager.sync_from_chain(eoa, pending);
    }
    let executor = BatchExecutor::new(provider.clone(), nonce_manager, signer, process_config.chain_id)
        .with_receipt_timeout(std::time::Duration::from_secs(process_config.receipt_timeout_secs));

    match cli.command {
        Command::Create => {
            let orchestrator = LadderOrchestrator::new(provider, executor, chain);
            match orchestrator.create_ladder(eoa, &ladder_config).await {
                Ok(created) => {
                    let mut positions = load_positions(&cli.positions).unwrap_or_default();
                    positions.extend(created.positions);
                    if let Err(e) = save_positions(&cli.positions, &positions) {
                        tracing::error!(error = %e, "saving positions");
                    }
                    println!("ladder created, tx {}", created.tx_hash);
                    0
                }
                Err(e) => exit_code_for(&e),
            }
        }
        Command::Close => {
            let positions = match load_positions(&cli.positions) {
                Ok(p) => p,
                Err(e) => {
                    tracing::error!(error = %e, "loading positions");
                    return 2;
                }
            };
            if positions.is_empty() {
                println!("no tracked positions to close");
                return 0;
            }
            let protocol = match chain.protocol(ladder_config.protocol_variant) {
                Some(p) => p.clone(),
                None => return 4,
            };
            let orchestrator = LadderOrchestrator::new(provider, executor, chain);
            let result = if ladder_config.protocol_variant.is_v4() {
                let entries: Vec<_> = positions
                    .iter()
                    .filter_map(|p| {
                        let liquidity: alloy::primitives::U256 = p.liquidity.parse().ok()?;
                        Some((alloy::primitives::U256::ZERO, liquidity, p.pool_key))
                    })
                    .collect();
                orchestrator.close_all_v4_in_one_tx(eoa, protocol.position_manager, &entries).await
            } else {
                let entries: Vec<_> = positions
                    .iter()
                    .filter_map(|p| Some((alloy::primitives::U256::from(p.token_id?), p.liquidity.parse().ok()?)))
                    .collect();
                orchestrator.close_positions_v3(eoa, protocol.position_manager, &entries).await
            };
            match result {
                Ok(closed) => {
                    if let Err(e) = save_positions(&cli.positions, &[]) {
                        tracing::error!(error = %e, "clearing positions");
                    }
                    println!("closed {} position(s), tx {}", closed.closed_token_ids.len(), closed.tx_hash);
                    0
                }
                Err(e) => exit_code_for(&e),
            }
        }
        Command::Swap { token, slippage_percent } => {
            let token_address: alloy::primitives::Address = match token.parse() {
                Ok(a) => a,
                Err(_) => {
                    tracing::error!(token = %token, "invalid token address");
                    return 2;
                }
            };
            let stable_token = if ladder_config.stable_token == ladder_engine::StableSide::Token1 {
                ladder_config.token1_address
            } else {
                ladder_config.token0_address
            };
            let balance_call = ladder_engine::pool::contracts::IERC20Ext::balanceOfCall { account: eoa };
            let balance_tx = alloy::rpc::types::TransactionRequest::default()
                .to(token_address)
                .input(alloy::sol_types::SolCall::abi_encode(&balance_call).into());
            let wei_amount = match provider.call(balance_tx).await {
                Ok(raw) => {
                    alloy::sol_types::SolCall::abi_decode_returns(&ladder_engine::pool::contracts::IERC20Ext::balanceOfCall { account: eoa }, &raw)
                        .map(|r| r._0)
                        .unwrap_or(alloy::primitives::U256::ZERO)
                }
                Err(_) => alloy::primitives::U256::ZERO,
            };
            if wei_amount.is_zero() {
                tracing::error!(token = %token, "zero balance to swap");
                return 2;
            }
            let planner = swap::SwapPlanner::new(provider, executor, chain);
            let input = swap::SwapInput { token_address, wei_amount, decimals: 18, symbol: token.clone() };
            let plan_result = planner
                .plan_sell(eoa, &input, stable_token, ladder_config.protocol_variant, 5.0, slippage_percent, swap::Venue::Auto)
                .await;
            match plan_result {
                Ok(plan) => match planner.execute_swap(eoa, &input, stable_token, &plan).await {
                    Ok(outcome) => {
                        println!("swapped {} -> {} (tx {})", token, outcome.amount_out_actual, outcome.tx_hash);
                        0
                    }
                    Err(e) => exit_code_for(&e),
                },
                Err(e) => exit_code_for(&e),
            }
        }
        Command::List => {
            match load_positions(&cli.positions) {
                Ok(positions) => {
                    if positions.is_empty() {
                        println!("no tracked positions");
                    }
                    for p in &positions {
                        println!(
                            "token_id={:?} ticks=[{},{}] liquidity={} pool={}/{}",
                            p.token_id, p.tick_lower, p.tick_upper, p.liquidity, p.pool_key.currency0, p.pool_key.currency1
                        );
                    }
                    0
                }
                Err(e) => {
                    tracing::error!(error = %e, "loading positions");
                    2
                }
            }
        }
    }
}

fn exit_code_for(err: &CoreError) -> i32 {
    match err {
        CoreError::Input(_) | CoreError::Math(_) => 2,
        CoreError::Balance(BalanceError::InsufficientBalance { .. }) => 3,
        CoreError::Balance(BalanceError::ApproveFailed(_)) => 6,
        CoreError::Pool(PoolError::PoolNotDeployed) | CoreError::Pool(PoolError::PoolNotInitialized(_)) => 4,
        CoreError::Pool(_) => 2,
        CoreError::Execution(ExecutionError::SimulationReverted(_)) => 5,
        CoreError::Execution(ExecutionError::TransactionReverted { .. }) => 6,
        CoreError::Execution(ExecutionError::Timeout { .. }) => 7,
        CoreError::Execution(ExecutionError::Rpc(_)) => 6,
        CoreError::Crypto(_) => 2,
    }
}
