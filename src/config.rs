use crate::application::processor::ProcessorConfig;
use crate::infrastructure::http_callback::{HttpCallbackNotifier, RetryPolicy};
use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// Service settings. Every flag can also be set through its environment variable.
#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Simulated asynchronous order processing service", long_about = None)]
pub struct Config {
    /// Address the HTTP server listens on
    #[arg(long, env = "LISTEN_ADDR", default_value = "0.0.0.0:8000")]
    pub listen_addr: SocketAddr,

    /// Exclusive upper bound on duplicate callback rounds per order
    #[arg(
        long,
        env = "MAX_DUPLICATE_CALLBACKS",
        default_value_t = 2,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub max_duplicate_callbacks: u32,

    /// Exclusive upper bound, in seconds, on simulated processing time
    #[arg(
        long,
        env = "MAX_ORDER_PROCESS_DURATION",
        default_value_t = 600,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub max_order_process_duration: u64,

    /// Retries after a failed callback attempt before the round is abandoned
    #[arg(long, env = "CALLBACK_MAX_RETRIES", default_value_t = RetryPolicy::DEFAULT_MAX_RETRIES)]
    pub callback_max_retries: u32,

    /// Seconds to wait between callback attempts
    #[arg(long, env = "CALLBACK_BACKOFF_SECS", default_value_t = RetryPolicy::DEFAULT_BACKOFF.as_secs())]
    pub callback_backoff_secs: u64,

    /// Per-attempt timeout for callback requests, in seconds
    #[arg(
        long,
        env = "CALLBACK_TIMEOUT_SECS",
        default_value_t = HttpCallbackNotifier::DEFAULT_TIMEOUT.as_secs()
    )]
    pub callback_timeout_secs: u64,

    /// Seed for the simulation's random source. Random when unset.
    #[arg(long, env = "SIMULATION_SEED")]
    pub seed: Option<u64>,
}

impl Config {
    pub fn processor_config(&self) -> ProcessorConfig {
        ProcessorConfig {
            max_duplicate_callbacks: self.max_duplicate_callbacks,
            max_order_process_duration: self.max_order_process_duration,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.callback_max_retries,
            Duration::from_secs(self.callback_backoff_secs),
        )
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::try_parse_from(["order-process"]).unwrap();

        assert_eq!(config.listen_addr, "0.0.0.0:8000".parse().unwrap());
        assert_eq!(config.processor_config(), ProcessorConfig::default());
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.callback_timeout(), HttpCallbackNotifier::DEFAULT_TIMEOUT);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn test_flags_override_defaults() {
        let config = Config::try_parse_from([
            "order-process",
            "--max-duplicate-callbacks",
            "5",
            "--max-order-process-duration",
            "30",
            "--callback-backoff-secs",
            "1",
            "--seed",
            "99",
        ])
        .unwrap();

        assert_eq!(config.processor_config().max_duplicate_callbacks, 5);
        assert_eq!(config.processor_config().max_order_process_duration, 30);
        assert_eq!(config.retry_policy().backoff, Duration::from_secs(1));
        assert_eq!(config.seed, Some(99));
    }

    #[test]
    fn test_zero_bounds_rejected() {
        assert!(Config::try_parse_from(["order-process", "--max-duplicate-callbacks", "0"]).is_err());
        assert!(
            Config::try_parse_from(["order-process", "--max-order-process-duration", "0"]).is_err()
        );
    }

    #[test]
    fn test_non_numeric_rejected() {
        assert!(
            Config::try_parse_from(["order-process", "--max-order-process-duration", "ten"])
                .is_err()
        );
    }
}
