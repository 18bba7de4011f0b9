//! Contract ABI bindings for the pool-variants this engine talks to.
//!
//! Extends the root `contracts.rs` sol! blocks (ERC-20, v2 router, v3
//! factory/pool/quoter/router) with the v4 surfaces: `PoolManager`,
//! `PositionManager` (the periphery router that exposes `modifyLiquidities`),
//! `StateView` (the lens contract v4 forks use instead of a public `slot0`),
//! `IMulticall3`'s `aggregate3` (generalized from
//! `arbitrage/multicall_quoter.rs`'s single-purpose amountOut aggregator),
//! and the v2/v3 swap-router surfaces the swap planner drives.

use alloy::sol;

sol! {
    #[sol(rpc)]
    interface INonfungiblePositionManager {
        struct MintParams {
            address token0;
            address token1;
            uint24 fee;
            int24 tickLower;
            int24 tickUpper;
            uint256 amount0Desired;
            uint256 amount1Desired;
            uint256 amount0Min;
            uint256 amount1Min;
            address recipient;
            uint256 deadline;
        }

        function mint(MintParams calldata params) external payable returns (uint256 tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);

        struct DecreaseLiquidityParams {
            uint256 tokenId;
            uint128 liquidity;
            uint256 amount0Min;
            uint256 amount1Min;
            uint256 deadline;
        }

        function decreaseLiquidity(DecreaseLiquidityParams calldata params) external payable returns (uint256 amount0, uint256 amount1);

        struct CollectParams {
            uint256 tokenId;
            address recipient;
            uint128 amount0Max;
            uint128 amount1Max;
        }

        function collect(CollectParams calldata params) external payable returns (uint256 amount0, uint256 amount1);

        function burn(uint256 tokenId) external payable;
        function positions(uint256 tokenId) external view returns (
            uint96 nonce, address operator, address token0, address token1, uint24 fee,
            int24 tickLower, int24 tickUpper, uint128 liquidity,
            uint256 feeGrowthInside0LastX128, uint256 feeGrowthInside1LastX128,
            uint128 tokensOwed0, uint128 tokensOwed1
        );
        function multicall(bytes[] calldata data) external payable returns (bytes[] memory results);

        event IncreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        event DecreaseLiquidity(uint256 indexed tokenId, uint128 liquidity, uint256 amount0, uint256 amount1);
        event Collect(uint256 indexed tokenId, address recipient, uint256 amount0, uint256 amount1);
        event Transfer(address indexed from, address indexed to, uint256 indexed tokenId);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3FactoryExt {
        function getPool(address tokenA, address tokenB, uint24 fee) external view returns (address pool);
        function createPool(address tokenA, address tokenB, uint24 fee) external returns (address pool);
        function feeAmountTickSpacing(uint24 fee) external view returns (int24);
        event PoolCreated(address indexed token0, address indexed token1, uint24 indexed fee, int24 tickSpacing, address pool);
    }
}

sol! {
    #[sol(rpc)]
    interface IUniswapV3PoolExt {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint8 feeProtocol, bool unlocked);
        function liquidity() external view returns (uint128);
        function token0() external view returns (address);
        function token1() external view returns (address);
        function fee() external view returns (uint24);
        function tickSpacing() external view returns (int24);
        function initialize(uint160 sqrtPriceX96) external;
    }
}

/// Some v3 forks (observed on BSC PancakeSwap deployments) return 8 fields
/// with `feeProtocol` widened to `uint32`. See `Slot0Layout` in
/// `pool::discovery` for the tagged-union decode this ABI mismatch requires.
sol! {
    #[sol(rpc)]
    interface IUniswapV3PoolFeeProtocol32 {
        function slot0() external view returns (uint160 sqrtPriceX96, int24 tick, uint16 observationIndex, uint16 observationCardinality, uint16 observationCardinalityNext, uint32 feeProtocol, bool unlocked);
    }
}

// ── v4 ────────────────────────────────────────────────────────────────

sol! {
    #[sol(rpc)]
    interface IPoolManager {
        struct PoolKey {
            address currency0;
            address currency1;
            uint24 fee;
            int24 tickSpacing;
            address hooks;
        }

        function initialize(PoolKey calldata key, uint160 sqrtPriceX96) external returns (int24 tick);
        event Initialize(bytes32 indexed id, address indexed currency0, address indexed currency1, uint24 fee, int24 tickSpacing, address hooks, uint160 sqrtPriceX96, int24 tick);
        event ModifyLiquidity(bytes32 indexed id, address indexed sender, int24 tickLower, int24 tickUpper, int256 liquidityDelta, bytes32 salt);
    }
}

/// The periphery router (e.g. Uniswap's `PositionManager.sol` /
/// PancakeSwap's `CLPositionManager.sol`) that exposes the single
/// `modifyLiquidities` entry point the action encoder targets.
sol! {
    #[sol(rpc)]
    interface IV4PositionManager {
        function modifyLiquidities(bytes calldata unlockData, uint256 deadline) external payable;
        function nextTokenId() external view returns (uint256);
    }
}

/// Read-only lens most v4 forks deploy alongside `PoolManager` to expose
/// `slot0`-equivalent state without needing `extsload` decoding by callers.
sol! {
    #[sol(rpc)]
    interface IStateView {
        function getSlot0(bytes32 poolId) external view returns (uint160 sqrtPriceX96, int24 tick, uint24 protocolFee, uint24 lpFee);
        function getLiquidity(bytes32 poolId) external view returns (uint128 liquidity);
    }
}

sol! {
    #[sol(rpc)]
    interface IMulticall3 {
        struct Call3 {
            address target;
            bool allowFailure;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function aggregate3(Call3[] calldata calls) external payable returns (Result[] memory returnData);
    }
}

// ── Swap planner surfaces ────────────────────────────────────────────

/// v2-family router, extended over the root `contracts.rs`
/// `IUniswapV2Router02` with the fee-on-transfer-tolerant swap entry point
/// (`ROUTER_ABI` in `original_source/src/dex_swap.py`).
sol! {
    #[sol(rpc)]
    interface IUniswapV2RouterExt {
        function getAmountsOut(uint256 amountIn, address[] calldata path) external view returns (uint256[] memory amounts);
        function swapExactTokensForTokensSupportingFeeOnTransferTokens(uint256 amountIn, uint256 amountOutMin, address[] calldata path, address to, uint256 deadline) external;
    }
}

/// SwapRouter02-style v3 router: unlike the root `contracts.rs` `ISwapRouter`
/// (which carries `deadline` inside `ExactInputSingleParams`), this variant
/// drops it from the params struct in favor of the router's own
/// `multicall(deadline, bytes[])` wrapper — matching `ROUTER_V3_ABI` in
/// `original_source/src/dex_swap.py` and the deployed SwapRouter02 ABI.
sol! {
    #[sol(rpc)]
    interface ISwapRouterV3Ext {
        struct ExactInputSingleParams {
            address tokenIn;
            address tokenOut;
            uint24 fee;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
            uint160 sqrtPriceLimitX96;
        }

        function exactInputSingle(ExactInputSingleParams calldata params) external payable returns (uint256 amountOut);

        struct ExactInputParams {
            bytes path;
            address recipient;
            uint256 amountIn;
            uint256 amountOutMinimum;
        }

        function exactInput(ExactInputParams calldata params) external payable returns (uint256 amountOut);

        function multicall(uint256 deadline, bytes[] calldata data) external payable returns (bytes[] memory results);
    }
}

sol! {
    #[sol(rpc)]
    interface IERC20Ext {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
        function balanceOf(address account) external view returns (uint256);
        function decimals() external view returns (uint8);
        function symbol() external view returns (string memory);
        function name() external view returns (string memory);
        function totalSupply() external view returns (uint256);
        event Transfer(address indexed from, address indexed to, uint256 value);
    }
}
