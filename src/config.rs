use alloy::{
    primitives::{
        address,
        utils::{parse_ether, parse_units},
        Address, U256,
    },
    signers::local::PrivateKeySigner,
};
use std::{env, path::PathBuf, str::FromStr};
use url::Url;

use crate::error::{Result, SniperError};

pub const PANCAKE_FACTORY_ADDRESS: Address = address!("cA143Ce32Fe78f1f7019d7d551a6402fC5350c73");
pub const PANCAKE_ROUTER_ADDRESS: Address = address!("10ED43C718714eb63d5aA57B78B54704E256024E");
pub const WBNB_ADDRESS: Address = address!("bb4CdB9CBd36B01bD1cBaEBF2De08d9173bc095c");

const DEFAULT_SLIPPAGE_PERCENTAGE: &str = "10";
const DEFAULT_PRIORITY_FEE_GWEI: &str = "1";
const DEFAULT_MAX_GAS_PRICE_GWEI: &str = "10";
const DEFAULT_DEADLINE_SECS: u64 = 300;
pub const DEFAULT_LOG_FILE: &str = "bot-logs.txt";

/// Run configuration. Built once at startup, then only borrowed.
#[derive(Clone)]
pub struct Config {
    pub factory_address: Address,
    pub router_address: Address,
    pub wbnb_address: Address,
    pub token_address: Address,
    pub signer: PrivateKeySigner,
    pub amount_in_wei: U256,
    pub slippage_bps: u32,
    pub gas_limit: Option<u64>,
    pub priority_fee_wei: u128,
    pub max_gas_price_wei: u128,
    pub deadline_secs: u64,
    pub rpc_url: Url,
    pub wss_url: Url,
    pub log_file: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from an arbitrary variable source. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| SniperError::Config(format!("Missing {} in environment", key)))
        };

        let private_key = required("PRIVATE_KEY")?;
        let signer = PrivateKeySigner::from_str(private_key.trim())
            .map_err(|e| SniperError::Config(format!("Invalid PRIVATE_KEY: {}", e)))?;

        let rpc_url = parse_url("BSC_RPC_URL", &required("BSC_RPC_URL")?)?;
        let wss_url = parse_url("BSC_WSS_URL", &required("BSC_WSS_URL")?)?;
        let token_address = parse_address("TOKEN_CONTRACT_ADDRESS", &required("TOKEN_CONTRACT_ADDRESS")?)?;

        let amount_str = required("AMOUNT_BNB_TO_SPEND")?;
        let amount_in_wei = parse_ether(amount_str.trim()).map_err(|e| {
            SniperError::Config(format!("Invalid AMOUNT_BNB_TO_SPEND='{}': {}", amount_str, e))
        })?;
        if amount_in_wei.is_zero() {
            return Err(SniperError::Config("AMOUNT_BNB_TO_SPEND must be greater than zero".into()));
        }

        let slippage_bps = parse_slippage_bps(
            &get("SLIPPAGE_PERCENTAGE").unwrap_or_else(|| DEFAULT_SLIPPAGE_PERCENTAGE.to_string()),
        )?;

        let gas_limit = get("GAS_LIMIT")
            .map(|v| {
                v.trim()
                    .parse::<u64>()
                    .map_err(|e| SniperError::Config(format!("Invalid GAS_LIMIT='{}': {}", v, e)))
            })
            .transpose()?;

        let priority_fee_wei = parse_gwei(
            "PRIORITY_FEE_GWEI",
            &get("PRIORITY_FEE_GWEI").unwrap_or_else(|| DEFAULT_PRIORITY_FEE_GWEI.to_string()),
        )?;
        let max_gas_price_wei = parse_gwei(
            "MAX_GAS_PRICE_GWEI",
            &get("MAX_GAS_PRICE_GWEI").unwrap_or_else(|| DEFAULT_MAX_GAS_PRICE_GWEI.to_string()),
        )?;

        let deadline_secs = match get("DEADLINE_SECS") {
            Some(v) => v
                .trim()
                .parse::<u64>()
                .map_err(|e| SniperError::Config(format!("Invalid DEADLINE_SECS='{}': {}", v, e)))?,
            None => DEFAULT_DEADLINE_SECS,
        };

        let factory_address = match get("PANCAKE_FACTORY_ADDRESS") {
            Some(v) => parse_address("PANCAKE_FACTORY_ADDRESS", &v)?,
            None => PANCAKE_FACTORY_ADDRESS,
        };
        let router_address = match get("PANCAKE_ROUTER_ADDRESS") {
            Some(v) => parse_address("PANCAKE_ROUTER_ADDRESS", &v)?,
            None => PANCAKE_ROUTER_ADDRESS,
        };
        let wbnb_address = match get("WBNB_ADDRESS") {
            Some(v) => parse_address("WBNB_ADDRESS", &v)?,
            None => WBNB_ADDRESS,
        };

        let log_file = PathBuf::from(
            get("LOG_FILE")
                .map(|v| v.trim().to_string())
                .unwrap_or_else(|| DEFAULT_LOG_FILE.to_string()),
        );

        Ok(Self {
            factory_address,
            router_address,
            wbnb_address,
            token_address,
            signer,
            amount_in_wei,
            slippage_bps,
            gas_limit,
            priority_fee_wei,
            max_gas_price_wei,
            deadline_secs,
            rpc_url,
            wss_url,
            log_file,
        })
    }

    pub fn wallet_address(&self) -> Address {
        self.signer.address()
    }
}

fn parse_address(key: &str, value: &str) -> Result<Address> {
    Address::from_str(value.trim())
        .map_err(|e| SniperError::Config(format!("Invalid {}='{}': {}", key, value, e)))
}

fn parse_url(key: &str, value: &str) -> Result<Url> {
    Url::parse(value.trim()).map_err(|e| SniperError::Config(format!("Invalid {}: {}", key, e)))
}

fn parse_gwei(key: &str, value: &str) -> Result<u128> {
    let wei: U256 = parse_units(value.trim(), "gwei")
        .map_err(|e| SniperError::Config(format!("Invalid {}='{}': {}", key, value, e)))?
        .into();
    u128::try_from(wei).map_err(|_| SniperError::Config(format!("{} is out of range", key)))
}

/// "2.5" (percent) -> 250 basis points. Accepts 0..=100.
pub fn parse_slippage_bps(value: &str) -> Result<u32> {
    let pct: f64 = value
        .trim()
        .trim_end_matches('%')
        .parse()
        .map_err(|_| SniperError::Config(format!("Invalid SLIPPAGE_PERCENTAGE='{}'", value)))?;

    if !pct.is_finite() || !(0.0..=100.0).contains(&pct) {
        return Err(SniperError::Config(format!(
            "SLIPPAGE_PERCENTAGE must be between 0 and 100, got {}",
            value
        )));
    }

    Ok((pct * 100.0).round() as u32)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashMap;

    const KEY: &str = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d";
    const TOKEN: &str = "0x1111111111111111111111111111111111111111";

    fn base_vars() -> HashMap<&'static str, String> {
        HashMap::from([
            ("PRIVATE_KEY", KEY.to_string()),
            ("BSC_RPC_URL", "https://bsc-dataseed.binance.org".to_string()),
            ("BSC_WSS_URL", "wss://bsc-ws-node.nariox.org:443".to_string()),
            ("TOKEN_CONTRACT_ADDRESS", TOKEN.to_string()),
            ("AMOUNT_BNB_TO_SPEND", "0.05".to_string()),
        ])
    }

    /// Config with a fixed key, token `0x1111..` and every optional value at its default.
    pub(crate) fn sample_config() -> Config {
        load(&base_vars()).unwrap()
    }

    fn load(vars: &HashMap<&'static str, String>) -> Result<Config> {
        Config::from_lookup(|k| vars.get(k).cloned())
    }

    #[test]
    fn test_defaults_applied() {
        let config = load(&base_vars()).unwrap();
        assert_eq!(config.factory_address, PANCAKE_FACTORY_ADDRESS);
        assert_eq!(config.router_address, PANCAKE_ROUTER_ADDRESS);
        assert_eq!(config.wbnb_address, WBNB_ADDRESS);
        assert_eq!(config.amount_in_wei, U256::from(50_000_000_000_000_000u128));
        assert_eq!(config.slippage_bps, 1000);
        assert_eq!(config.priority_fee_wei, 1_000_000_000);
        assert_eq!(config.max_gas_price_wei, 10_000_000_000);
        assert_eq!(config.deadline_secs, 300);
        assert_eq!(config.gas_limit, None);
        assert_eq!(config.log_file, PathBuf::from("bot-logs.txt"));
        assert_eq!(config.token_address, Address::from_str(TOKEN).unwrap());
    }

    #[test]
    fn test_overrides() {
        let mut vars = base_vars();
        vars.insert("GAS_LIMIT", "350000".to_string());
        vars.insert("PRIORITY_FEE_GWEI", "2.5".to_string());
        vars.insert("MAX_GAS_PRICE_GWEI", "7".to_string());
        vars.insert("SLIPPAGE_PERCENTAGE", "0.5".to_string());
        vars.insert("DEADLINE_SECS", "60".to_string());
        vars.insert("LOG_FILE", " logs/sniper.log ".to_string());
        let config = load(&vars).unwrap();
        assert_eq!(config.log_file, PathBuf::from("logs/sniper.log"));
        assert_eq!(config.gas_limit, Some(350_000));
        assert_eq!(config.priority_fee_wei, 2_500_000_000);
        assert_eq!(config.max_gas_price_wei, 7_000_000_000);
        assert_eq!(config.slippage_bps, 50);
        assert_eq!(config.deadline_secs, 60);
    }

    #[test]
    fn test_missing_required_is_config_error() {
        let mut vars = base_vars();
        vars.remove("TOKEN_CONTRACT_ADDRESS");
        match load(&vars) {
            Err(SniperError::Config(msg)) => assert!(msg.contains("TOKEN_CONTRACT_ADDRESS")),
            other => panic!("expected config error, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_empty_value_counts_as_missing() {
        let mut vars = base_vars();
        vars.insert("PRIVATE_KEY", "  ".to_string());
        assert!(matches!(load(&vars), Err(SniperError::Config(_))));
    }

    #[test]
    fn test_invalid_amount_rejected() {
        let mut vars = base_vars();
        vars.insert("AMOUNT_BNB_TO_SPEND", "abc".to_string());
        assert!(matches!(load(&vars), Err(SniperError::Config(_))));

        vars.insert("AMOUNT_BNB_TO_SPEND", "0".to_string());
        assert!(matches!(load(&vars), Err(SniperError::Config(_))));
    }

    #[test]
    fn test_slippage_bounds() {
        assert_eq!(parse_slippage_bps("0").unwrap(), 0);
        assert_eq!(parse_slippage_bps("12%").unwrap(), 1200);
        assert_eq!(parse_slippage_bps("100").unwrap(), 10_000);
        assert!(parse_slippage_bps("100.5").is_err());
        assert!(parse_slippage_bps("-1").is_err());
        assert!(parse_slippage_bps("NaN").is_err());
    }
}
