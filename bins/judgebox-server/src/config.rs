// Sandbox configuration, read from environment variables with defaults.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

/// Which isolation backend executes test cases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// OS process with a heap cap and a bounded wait.
    Host,
    /// One resource-capped, network-disabled container per request.
    Container,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "host" => Ok(Backend::Host),
            "container" => Ok(Backend::Container),
            other => Err(format!("unknown backend '{}', expected host|container", other)),
        }
    }
}

/// All tunables of the sandbox core. Defaults match the judge contract:
/// 5000 ms per case, 100 MiB container memory, 1 CPU, ~200 ms sampling.
#[derive(Debug, Clone)]
pub struct SandboxConfig {
    pub backend: Backend,
    /// Global staging root; each request gets a uuid-named subdirectory.
    pub staging_root: PathBuf,
    /// Wall-clock deadline per test case.
    pub case_timeout: Duration,
    /// Container image used by the container backend.
    pub container_image: String,
    /// Container memory cap in bytes.
    pub container_memory_bytes: i64,
    /// Container CPU cap in cores.
    pub container_cpus: f64,
    /// Pacing of the live memory statistics loop.
    pub sampler_poll_interval: Duration,
    /// JVM heap cap (megabytes) for the host backend.
    pub host_heap_limit_mb: u64,
    /// HTTP bind address.
    pub bind_addr: String,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Host,
            staging_root: PathBuf::from("tmp-code"),
            case_timeout: Duration::from_millis(5000),
            container_image: "openjdk:8-alpine".to_string(),
            container_memory_bytes: 100 * 1024 * 1024,
            container_cpus: 1.0,
            sampler_poll_interval: Duration::from_millis(200),
            host_heap_limit_mb: 256,
            bind_addr: "0.0.0.0:8080".to_string(),
        }
    }
}

impl SandboxConfig {
    /// Build a configuration from `SANDBOX_*` environment variables,
    /// falling back to defaults (with a warning) on missing or malformed
    /// values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            backend: env_parse("SANDBOX_BACKEND", defaults.backend),
            staging_root: std::env::var("SANDBOX_STAGING_ROOT")
                .map(PathBuf::from)
                .unwrap_or(defaults.staging_root),
            case_timeout: Duration::from_millis(env_parse(
                "SANDBOX_TIMEOUT_MS",
                defaults.case_timeout.as_millis() as u64,
            )),
            container_image: std::env::var("SANDBOX_IMAGE")
                .unwrap_or(defaults.container_image),
            container_memory_bytes: env_parse::<i64>(
                "SANDBOX_MEMORY_LIMIT_MB",
                defaults.container_memory_bytes / (1024 * 1024),
            ) * 1024
                * 1024,
            container_cpus: env_parse("SANDBOX_CPU_LIMIT", defaults.container_cpus),
            sampler_poll_interval: Duration::from_millis(env_parse(
                "SANDBOX_SAMPLER_POLL_MS",
                defaults.sampler_poll_interval.as_millis() as u64,
            )),
            host_heap_limit_mb: env_parse("SANDBOX_HOST_HEAP_MB", defaults.host_heap_limit_mb),
            bind_addr: std::env::var("SANDBOX_BIND").unwrap_or(defaults.bind_addr),
        }
    }

    /// Container CPU cap expressed in Docker's nano-cpu unit.
    pub fn container_nano_cpus(&self) -> i64 {
        (self.container_cpus * 1_000_000_000.0) as i64
    }
}

fn env_parse<T: FromStr>(key: &str, default: T) -> T {
    match std::env::var(key) {
        Ok(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                warn!(key, value = %raw, "Malformed configuration value, using default");
                default
            }
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = SandboxConfig::default();
        assert_eq!(config.case_timeout, Duration::from_millis(5000));
        assert_eq!(config.container_memory_bytes, 100 * 1024 * 1024);
        assert_eq!(config.container_nano_cpus(), 1_000_000_000);
        assert_eq!(config.sampler_poll_interval, Duration::from_millis(200));
        assert_eq!(config.backend, Backend::Host);
    }

    // All SANDBOX_* variables are touched in this single test; splitting
    // it up would race sibling tests over the process environment.
    #[test]
    fn env_overrides_apply_and_malformed_values_fall_back() {
        std::env::set_var("SANDBOX_TIMEOUT_MS", "not-a-number");
        std::env::set_var("SANDBOX_MEMORY_LIMIT_MB", "64");
        std::env::set_var("SANDBOX_BACKEND", "container");
        std::env::set_var("SANDBOX_IMAGE", "openjdk:11");
        std::env::set_var("SANDBOX_HOST_HEAP_MB", "512");

        let config = SandboxConfig::from_env();

        std::env::remove_var("SANDBOX_TIMEOUT_MS");
        std::env::remove_var("SANDBOX_MEMORY_LIMIT_MB");
        std::env::remove_var("SANDBOX_BACKEND");
        std::env::remove_var("SANDBOX_IMAGE");
        std::env::remove_var("SANDBOX_HOST_HEAP_MB");

        // Malformed value falls back to the default.
        assert_eq!(config.case_timeout, Duration::from_millis(5000));
        // Well-formed values override.
        assert_eq!(config.container_memory_bytes, 64 * 1024 * 1024);
        assert_eq!(config.backend, Backend::Container);
        assert_eq!(config.container_image, "openjdk:11");
        assert_eq!(config.host_heap_limit_mb, 512);
        // Untouched variables keep their defaults.
        assert_eq!(config.container_cpus, 1.0);
        assert_eq!(config.bind_addr, "0.0.0.0:8080");
    }

    #[test]
    fn backend_parses_case_insensitively() {
        assert_eq!("Container".parse::<Backend>().unwrap(), Backend::Container);
        assert_eq!("HOST".parse::<Backend>().unwrap(), Backend::Host);
        assert!("firecracker".parse::<Backend>().is_err());
    }
}
