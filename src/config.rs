use std::env;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use tracing::{info, warn};

use crate::optimizer::{EnumerationMode, PackingConfig};

/// Complete application configuration, loaded from environment variables or default values.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub optimizer: OptimizerConfig,
}

impl AppConfig {
    /// Creates a configuration from the currently available environment variables.
    pub fn from_env() -> Self {
        Self {
            api: ApiConfig::from_env(),
            optimizer: OptimizerConfig::from_env(),
        }
    }
}

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    bind_ip: IpAddr,
    display_host: String,
    port: u16,
}

impl ApiConfig {
    const DEFAULT_HOST: &'static str = "0.0.0.0";
    const DEFAULT_PORT: u16 = 8080;

    fn from_env() -> Self {
        let host_value = env_string("CARTON_PLANNER_API_HOST")
            .unwrap_or_else(|| Self::DEFAULT_HOST.to_string());
        let (bind_ip, display_host) = match host_value.parse::<IpAddr>() {
            Ok(ip) => (ip, host_value),
            Err(err) => {
                warn!(
                    "Could not parse CARTON_PLANNER_API_HOST ('{}'): {}. Using {}.",
                    host_value,
                    err,
                    Self::DEFAULT_HOST
                );
                (
                    IpAddr::V4(Ipv4Addr::UNSPECIFIED),
                    Self::DEFAULT_HOST.to_string(),
                )
            }
        };

        let port = match env_string("CARTON_PLANNER_API_PORT") {
            Some(raw) => parse_port(&raw).unwrap_or(Self::DEFAULT_PORT),
            None => Self::DEFAULT_PORT,
        };

        Self {
            bind_ip,
            display_host,
            port,
        }
    }

    /// Socket address to bind the server to.
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    /// Visible hostname for logging and hints.
    pub fn display_host(&self) -> &str {
        &self.display_host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Indicates whether binding to all interfaces.
    pub fn binds_to_all_interfaces(&self) -> bool {
        match self.bind_ip {
            IpAddr::V4(addr) => addr == Ipv4Addr::UNSPECIFIED,
            IpAddr::V6(addr) => addr == Ipv6Addr::UNSPECIFIED,
        }
    }

    /// Checks whether the hostname matches the default value.
    pub fn uses_default_host(&self) -> bool {
        self.display_host == Self::DEFAULT_HOST
    }
}

/// Configuration for the packing engine.
#[derive(Clone, Debug)]
pub struct OptimizerConfig {
    packing: PackingConfig,
}

impl OptimizerConfig {
    const DEFAULT_MODE_VAR: &'static str = "CARTON_PLANNER_DEFAULT_MODE";
    const MAX_VARIANTS_VAR: &'static str = "CARTON_PLANNER_MAX_VARIANTS";
    const MAX_AXIS_COUNT_VAR: &'static str = "CARTON_PLANNER_MAX_AXIS_COUNT";
    const FIT_EPSILON_VAR: &'static str = "CARTON_PLANNER_FIT_EPSILON";
    const WEIGHT_DIVISOR_VAR: &'static str = "CARTON_PLANNER_WEIGHT_DIVISOR";
    const ROTATE_CONTAINER_VAR: &'static str = "CARTON_PLANNER_ROTATE_CONTAINER";

    fn from_env() -> Self {
        let default_mode = env_string(Self::DEFAULT_MODE_VAR)
            .and_then(|raw| parse_mode(&raw, Self::DEFAULT_MODE_VAR))
            .unwrap_or(PackingConfig::DEFAULT_MODE);

        let max_variants = load_u64_with_warning(
            Self::MAX_VARIANTS_VAR,
            PackingConfig::DEFAULT_MAX_VARIANTS,
            "Raised variant limit may make exhaustive requests slow",
        );

        let max_axis_count = load_u64_with_warning(
            Self::MAX_AXIS_COUNT_VAR,
            PackingConfig::DEFAULT_MAX_AXIS_COUNT,
            "Adjusted per-axis limit changes which requests are rejected as overflow",
        );

        let fit_epsilon = load_f64_with_warning(
            Self::FIT_EPSILON_VAR,
            PackingConfig::DEFAULT_FIT_EPSILON,
            // Anything near 1 would round partial units up into whole ones.
            |value| value > 0.0 && value < 1e-3,
            "must be between 0 and 0.001",
            "Adjusted fit tolerance may count borderline units differently",
        );

        let weight_divisor = load_f64_with_warning(
            Self::WEIGHT_DIVISOR_VAR,
            PackingConfig::DEFAULT_WEIGHT_DIVISOR,
            |value| value > 0.0 && value.is_finite(),
            "must be greater than 0",
            "Adjusted weight divisor changes the reported weight unit",
        );

        let rotate_container = env_string(Self::ROTATE_CONTAINER_VAR)
            .and_then(|raw| parse_bool(&raw, Self::ROTATE_CONTAINER_VAR))
            .unwrap_or(PackingConfig::DEFAULT_ROTATE_CONTAINER);

        let packing = PackingConfig::builder()
            .default_mode(default_mode)
            .max_variants(max_variants)
            .max_axis_count(max_axis_count)
            .fit_epsilon(fit_epsilon)
            .weight_divisor(weight_divisor)
            .rotate_container(rotate_container)
            .build();

        Self { packing }
    }

    /// Wraps an explicit packing configuration.
    pub fn new(packing: PackingConfig) -> Self {
        Self { packing }
    }

    /// Returns the configured PackingConfig.
    pub fn packing_config(&self) -> PackingConfig {
        self.packing
    }
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self::new(PackingConfig::default())
    }
}

fn env_string(name: &str) -> Option<String> {
    match env::var(name) {
        Ok(value) => {
            let trimmed = value.trim();
            if trimmed.is_empty() {
                None
            } else {
                Some(trimmed.to_owned())
            }
        }
        Err(env::VarError::NotPresent) => None,
        Err(err) => {
            warn!("Access to {} failed: {}. Using default value.", name, err);
            None
        }
    }
}

fn parse_port(raw: &str) -> Option<u16> {
    match raw.parse::<u16>() {
        Ok(0) => {
            warn!("CARTON_PLANNER_API_PORT must not be 0. Using default port.");
            None
        }
        Ok(value) => Some(value),
        Err(err) => {
            warn!(
                "Could not parse CARTON_PLANNER_API_PORT ('{}'): {}. Using default port.",
                raw, err
            );
            None
        }
    }
}

fn parse_bool(raw: &str, var_name: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        other => {
            warn!(
                "Could not interpret {} ('{}') as boolean value. Using default value.",
                var_name, other
            );
            None
        }
    }
}

fn parse_mode(raw: &str, var_name: &str) -> Option<EnumerationMode> {
    match raw.parse::<EnumerationMode>() {
        Ok(mode) => Some(mode),
        Err(err) => {
            warn!("{} is invalid: {}. Using default value.", var_name, err);
            None
        }
    }
}

fn load_u64_with_warning(var_name: &str, default: u64, warning: &str) -> u64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<u64>() {
            Ok(0) => {
                warn!(
                    "{} must be at least 1, got '{}'. Using {}.",
                    var_name, raw, default
                );
                default
            }
            Ok(value) => {
                if value != default {
                    info!("{} ({} = {}).", warning, var_name, value);
                }
                value
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as integer: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}

fn load_f64_with_warning(
    var_name: &str,
    default: f64,
    validator: impl Fn(f64) -> bool,
    invalid_hint: &str,
    warning: &str,
) -> f64 {
    match env_string(var_name) {
        Some(raw) => match raw.parse::<f64>() {
            Ok(value) => {
                if !validator(value) {
                    warn!(
                        "{} contains invalid value '{}': {}. Using {}.",
                        var_name, raw, invalid_hint, default
                    );
                    default
                } else {
                    let tolerance = (default.abs().max(1.0)) * 1e-9;
                    if (value - default).abs() > tolerance {
                        info!("{} ({} = {}).", warning, var_name, value);
                    }
                    value
                }
            }
            Err(err) => {
                warn!(
                    "Could not parse {} ('{}') as number: {}. Using {}.",
                    var_name, raw, err, default
                );
                default
            }
        },
        None => default,
    }
}
