//! Shared test helpers for relay integration tests

#![allow(dead_code)]

use ethereum_types::{Address, U256};
use oft_relay::config::{parse_field_address, Config};

/// Built-in configuration with a validated shape.
pub fn local_config() -> Config {
    let config = Config::default();
    config.validate().unwrap();
    config
}

pub fn address(value: &str) -> Address {
    parse_field_address("test", value).unwrap()
}

/// `n` whole tokens in 18 local decimals.
pub fn units(n: u64) -> U256 {
    U256::from(n) * U256::exp10(18)
}

/// Template shipped next to the service.
pub const TEMPLATE: &str = include_str!("../config/oft-relay.template.toml");
