//! Command-line and environment configuration of the balancer binary.

use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use crate::provisioner::ReadinessPolicy;
use crate::ring::{DEFAULT_SLOTS, DEFAULT_VNODES, HashKind, ProbePolicy, RingConfig};
use crate::router::types::RouterConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ProvisionerKind {
    /// Spawn backends as local child processes.
    #[default]
    Process,
    /// Backends are run by an outside orchestrator and reached by hostname.
    External,
}

/// Consistent-hashing load balancer.
#[derive(Debug, Clone, Parser)]
#[command(name = "hashring_lb", version)]
pub struct BalancerArgs {
    #[arg(long, env = "HRLB_BIND", default_value = "0.0.0.0:5000")]
    pub bind: SocketAddr,

    /// Ring size.
    #[arg(long, env = "HRLB_SLOTS", default_value_t = DEFAULT_SLOTS)]
    pub slots: usize,

    /// Virtual nodes per server.
    #[arg(long, env = "HRLB_VNODES", default_value_t = DEFAULT_VNODES)]
    pub vnodes: usize,

    #[arg(long, env = "HRLB_HASH", value_enum, default_value_t = HashKind::Polynomial)]
    pub hash: HashKind,

    #[arg(long, env = "HRLB_PROBE", value_enum, default_value_t = ProbePolicy::Quadratic)]
    pub probe: ProbePolicy,

    /// Initial server names.
    #[arg(
        long = "server",
        env = "HRLB_SERVERS",
        value_delimiter = ',',
        default_values_t = ["server1".to_string(), "server2".to_string(), "server3".to_string()]
    )]
    pub servers: Vec<String>,

    #[arg(long, env = "HRLB_PROVISIONER", value_enum, default_value_t = ProvisionerKind::Process)]
    pub provisioner: ProvisionerKind,

    /// Backend executable for the process provisioner; defaults to `backend`
    /// next to this binary.
    #[arg(long, env = "HRLB_BACKEND_BIN")]
    pub backend_bin: Option<PathBuf>,

    /// Port the externally managed backends listen on.
    #[arg(long, env = "HRLB_BACKEND_PORT", default_value_t = 5000)]
    pub backend_port: u16,

    #[arg(long, env = "HRLB_HEALTH_TIMEOUT_MS", default_value_t = 2000)]
    pub health_timeout_ms: u64,

    #[arg(long, env = "HRLB_DISPATCH_TIMEOUT_MS", default_value_t = 3000)]
    pub dispatch_timeout_ms: u64,

    #[arg(long, env = "HRLB_TRANSIENT_DELAY_MS", default_value_t = 500)]
    pub transient_delay_ms: u64,

    #[arg(long, env = "HRLB_READY_TIMEOUT_MS", default_value_t = 10_000)]
    pub ready_timeout_ms: u64,

    #[arg(long, env = "HRLB_READY_INTERVAL_MS", default_value_t = 500)]
    pub ready_interval_ms: u64,

    /// Log at DEBUG instead of INFO.
    #[arg(long, short, env = "HRLB_VERBOSE")]
    pub verbose: bool,
}

#[derive(Debug, Clone)]
pub struct BalancerConfig {
    pub bind: SocketAddr,
    pub ring: RingConfig,
    pub readiness: ReadinessPolicy,
    pub router: RouterConfig,
    pub health_timeout: Duration,
    pub provisioner: ProvisionerKind,
    pub backend_bin: PathBuf,
    pub backend_port: u16,
    pub servers: Vec<String>,
    pub verbose: bool,
}

impl BalancerArgs {
    pub fn into_config(self) -> anyhow::Result<BalancerConfig> {
        let ring = RingConfig {
            slots: self.slots,
            vnodes: self.vnodes,
            hash: self.hash,
            probe: self.probe,
        };
        ring.validate()?;

        let backend_bin = match self.backend_bin {
            Some(path) => path,
            None => default_backend_bin()?,
        };

        Ok(BalancerConfig {
            bind: self.bind,
            ring,
            readiness: ReadinessPolicy {
                timeout: Duration::from_millis(self.ready_timeout_ms),
                interval: Duration::from_millis(self.ready_interval_ms),
            },
            router: RouterConfig {
                dispatch_timeout: Duration::from_millis(self.dispatch_timeout_ms),
                transient_delay: Duration::from_millis(self.transient_delay_ms),
            },
            health_timeout: Duration::from_millis(self.health_timeout_ms),
            provisioner: self.provisioner,
            backend_bin,
            backend_port: self.backend_port,
            servers: self.servers,
            verbose: self.verbose,
        })
    }
}

fn default_backend_bin() -> anyhow::Result<PathBuf> {
    let exe = std::env::current_exe()?;
    Ok(exe.with_file_name(format!("backend{}", std::env::consts::EXE_SUFFIX)))
}
