//! Long-running companion process: watches a directory of ladder configs,
//! re-plans each on a fixed interval, and logs drift against the live pool
//! state. Never submits a transaction itself — every mutating action stays
//! behind the `ladder-cli` boundary (spec.md §6: the daemon is an advisory
//! surface, not an execution path).

use clap::Parser;
use futures::stream::StreamExt;
use ladder_engine::config::{load_ladder_config, ProcessConfig};
use ladder_engine::planner::distribution::{calculate_bid_ask_from_percent, plan_one_sided};
use ladder_engine::planner::orientation::{resolve_orientation, Role};
use ladder_engine::pool::discovery::PoolReader;
use ladder_engine::rpc::connect_provider;
use ladder_engine::types::{PoolKey, StableSide};
use signal_hook::consts::signal::SIGHUP;
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "ladder-daemon", about = "Watches ladder config files and reports drift, never executes")]
struct Cli {
    /// Directory containing one or more `*.toml` ladder configs.
    #[arg(long, default_value = "configs")]
    config_dir: PathBuf,

    /// Seconds between re-plan passes.
    #[arg(long, default_value_t = 60)]
    interval_secs: u64,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .init();

    let cli = Cli::parse();

    let process_config = match ProcessConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "process config");
            std::process::exit(2);
        }
    };

    let provider = match connect_provider(
        &process_config.rpc_url,
        process_config.proxy_url.as_deref(),
        std::time::Duration::from_secs(process_config.receipt_timeout_secs),
    ) {
        Ok(p) => p,
        Err(e) => {
            tracing::error!(error = %e, "connecting RPC provider");
            std::process::exit(2);
        }
    };
    let pool_reader = PoolReader::new(provider);

    let mut signals = match Signals::new([SIGHUP]) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!(error = %e, "registering SIGHUP handler");
            std::process::exit(2);
        }
    };
    let signals_handle = signals.handle();

    let mut interval = tokio::time::interval(Duration::from_secs(cli.interval_secs));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                watch_pass(&cli.config_dir, &pool_reader).await;
            }
            sig = signals.next() => {
                if sig.is_some() {
                    tracing::info!("SIGHUP received, forcing an immediate re-plan pass");
                    watch_pass(&cli.config_dir, &pool_reader).await;
                } else {
                    signals_handle.close();
                    break;
                }
            }
        }
    }
}

async fn watch_pass<P: alloy::providers::Provider + Clone>(config_dir: &std::path::Path, pool_reader: &PoolReader<P>) {
    let entries = match std::fs::read_dir(config_dir) {
        Ok(e) => e,
        Err(e) => {
            tracing::warn!(error = %e, dir = %config_dir.display(), "reading config directory");
            return;
        }
    };

    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("toml") {
            continue;
        }
        let config = match load_ladder_config(&path) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "skipping unreadable config");
                continue;
            }
        };

        let token0_decimals = match config.token0_decimals {
            Some(d) => d,
            None => match pool_reader.read_token_info(config.token0_address).await {
                Ok(info) => info.decimals,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "decimals unavailable");
                    continue;
                }
            },
        };
        let token1_decimals = match config.token1_decimals {
            Some(d) => d,
            None => match pool_reader.read_token_info(config.token1_address).await {
                Ok(info) => info.decimals,
                Err(e) => {
                    tracing::warn!(error = %e, path = %path.display(), "decimals unavailable");
                    continue;
                }
            },
        };
        let role = if matches!(config.stable_token, StableSide::Token0) { Role::Stable } else { Role::Volatile };
        let orientation = match resolve_orientation(config.token0_address, token0_decimals, config.token1_address, token1_decimals, role) {
            Ok(o) => o,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "orientation resolution failed");
                continue;
            }
        };

        let stable_is_token1 = matches!(config.stable_token, StableSide::Token1);
        let plan = match (config.percent_from, config.percent_to) {
            (Some(from), Some(to)) => calculate_bid_ask_from_percent(
                config.current_price,
                from,
                to,
                config.total_usd,
                config.n_positions,
                config.fee_tier,
                config.distribution_type,
                stable_is_token1,
                orientation.invert_price,
                config.tick_spacing_override,
                orientation.decimal_offset,
                config.allow_custom_fee,
            ),
            _ => match config.lower_price {
                Some(limit) => plan_one_sided(
                    config.current_price,
                    limit,
                    config.total_usd,
                    config.n_positions,
                    config.fee_tier,
                    config.distribution_type,
                    stable_is_token1,
                    orientation.invert_price,
                    config.tick_spacing_override,
                    orientation.decimal_offset,
                    config.allow_custom_fee,
                ),
                None => {
                    tracing::warn!(path = %path.display(), "config has neither lower_price nor percent_from/to");
                    continue;
                }
            },
        };

        let plan = match plan {
            Ok(p) => p,
            Err(e) => {
                tracing::warn!(error = %e, path = %path.display(), "planning failed");
                continue;
            }
        };

        let hooks = config.hooks.unwrap_or(alloy::primitives::Address::ZERO);
        let pool_key = PoolKey::new(config.token0_address, config.token1_address, config.fee_tier, plan.tick_spacing, hooks);
        let summary = plan.summarize();

        if config.protocol_variant.is_v4() {
            let pool_id = PoolReader::<P>::find_pool_v4(&pool_key);
            tracing::info!(path = %path.display(), %pool_id, ?summary, "planned ladder (v4, advisory only)");
        } else {
            tracing::info!(path = %path.display(), ?summary, "planned ladder (v3, advisory only)");
        }
    }
}
