//! Configuration for Polarway Registry

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use argon2::{Algorithm, Argon2, Params, Version};
use chrono::Duration;

use crate::auth::Role;
use crate::error::{RegistryError, Result};

/// Credential provisioned on first startup when no credential exists
#[derive(Debug, Clone)]
pub struct SeedCredential {
    pub username: String,
    pub password: String,
    pub role: Role,
}

impl Default for SeedCredential {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: "password123".to_string(),
            role: Role::Admin,
        }
    }
}

/// Argon2id cost parameters used for stored credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashCost {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for HashCost {
    fn default() -> Self {
        Self {
            memory_kib: Params::DEFAULT_M_COST,
            iterations: Params::DEFAULT_T_COST,
            parallelism: Params::DEFAULT_P_COST,
        }
    }
}

impl HashCost {
    /// Cheapest parameters argon2 accepts. Test suites only.
    pub fn minimal() -> Self {
        Self {
            memory_kib: Params::MIN_M_COST,
            iterations: Params::MIN_T_COST,
            parallelism: Params::MIN_P_COST,
        }
    }

    /// Build an Argon2id hasher with these parameters
    pub fn hasher(&self) -> Result<Argon2<'static>> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| RegistryError::Config(format!("argon2 parameters: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

/// Registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Directory holding one JSON document per collection
    pub data_dir: PathBuf,

    /// Fixed session lifetime (default: 24 hours, not sliding)
    pub session_ttl: Duration,

    /// Administrator credential seeded into an empty credential set
    pub seed_admin: SeedCredential,

    /// Password hashing cost
    pub hash_cost: HashCost,

    /// Proactive expired-session sweep; `None` keeps expiry purely lazy
    pub sweep_interval: Option<std::time::Duration>,

    /// HTTP listen address
    pub listen_addr: SocketAddr,

    /// Actor mailbox capacity
    pub mailbox_capacity: usize,
}

impl RegistryConfig {
    /// Create config with sensible defaults
    ///
    /// # Arguments
    /// * `data_dir` - Directory for the persisted collections.
    ///   Structure created:
    ///   ```text
    ///   data_dir/
    ///   ├── auth.json    (credentials + sessions)
    ///   └── users.json   (user records)
    ///   ```
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            session_ttl: Duration::hours(24),
            seed_admin: SeedCredential::default(),
            hash_cost: HashCost::default(),
            sweep_interval: None,
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            mailbox_capacity: 256,
        }
    }

    /// Build config from the process environment
    ///
    /// | Variable                        | Default        |
    /// |---------------------------------|----------------|
    /// | `REGISTRY_DATA_DIR`             | `./data`       |
    /// | `PORT`                          | `5000`         |
    /// | `REGISTRY_SESSION_TTL_SECS`     | `86400`        |
    /// | `REGISTRY_ADMIN_USERNAME`       | `admin`        |
    /// | `REGISTRY_ADMIN_PASSWORD`       | `password123`  |
    /// | `REGISTRY_SWEEP_INTERVAL_SECS`  | unset (lazy)   |
    pub fn from_env() -> Result<Self> {
        let data_dir = std::env::var("REGISTRY_DATA_DIR").unwrap_or_else(|_| "./data".to_string());
        let mut config = Self::new(data_dir);

        if let Some(port) = env_parse::<u16>("PORT")? {
            config.listen_addr.set_port(port);
        }
        if let Some(secs) = env_parse::<i64>("REGISTRY_SESSION_TTL_SECS")? {
            config.session_ttl = Duration::seconds(secs);
        }
        if let Ok(username) = std::env::var("REGISTRY_ADMIN_USERNAME") {
            config.seed_admin.username = username;
        }
        if let Ok(password) = std::env::var("REGISTRY_ADMIN_PASSWORD") {
            config.seed_admin.password = password;
        }
        if let Some(secs) = env_parse::<u64>("REGISTRY_SWEEP_INTERVAL_SECS")? {
            config.sweep_interval = Some(std::time::Duration::from_secs(secs));
        }

        config.validate()?;
        Ok(config)
    }

    /// Override session lifetime
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = ttl;
        self
    }

    /// Override the seeded administrator credential
    pub fn with_seed_admin(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.seed_admin.username = username.into();
        self.seed_admin.password = password.into();
        self
    }

    /// Override password hashing cost
    pub fn with_hash_cost(mut self, cost: HashCost) -> Self {
        self.hash_cost = cost;
        self
    }

    /// Enable the proactive expired-session sweep
    pub fn with_sweep_interval(mut self, interval: std::time::Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Override HTTP listen address
    pub fn with_listen_addr(mut self, addr: SocketAddr) -> Self {
        self.listen_addr = addr;
        self
    }

    /// Reject configurations the services cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.session_ttl < Duration::zero() {
            return Err(RegistryError::Config("session TTL must not be negative".into()));
        }
        if self.seed_admin.username.trim().is_empty() || self.seed_admin.password.is_empty() {
            return Err(RegistryError::Config("seed credential must have a username and password".into()));
        }
        if self.mailbox_capacity == 0 {
            return Err(RegistryError::Config("mailbox capacity must be positive".into()));
        }
        if self.sweep_interval.is_some_and(|interval| interval.is_zero()) {
            return Err(RegistryError::Config("sweep interval must be positive".into()));
        }
        self.hash_cost.hasher().map(|_| ())
    }
}

fn env_parse<T>(key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| RegistryError::Config(format!("{key}={raw:?}: {e}"))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = RegistryConfig::new("/tmp/test_registry");
        assert_eq!(cfg.session_ttl, Duration::hours(24));
        assert_eq!(cfg.listen_addr.port(), 5000);
        assert_eq!(cfg.seed_admin.username, "admin");
        assert!(cfg.sweep_interval.is_none());
        assert_eq!(cfg.data_dir, PathBuf::from("/tmp/test_registry"));
    }

    #[test]
    fn test_builder_pattern() {
        let cfg = RegistryConfig::new("/data")
            .with_session_ttl(Duration::minutes(5))
            .with_seed_admin("root", "hunter22")
            .with_hash_cost(HashCost::minimal())
            .with_sweep_interval(std::time::Duration::from_secs(60));

        assert_eq!(cfg.session_ttl, Duration::minutes(5));
        assert_eq!(cfg.seed_admin.username, "root");
        assert_eq!(cfg.hash_cost, HashCost::minimal());
        assert_eq!(cfg.sweep_interval, Some(std::time::Duration::from_secs(60)));
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_negative_ttl() {
        let cfg = RegistryConfig::new("/data").with_session_ttl(Duration::seconds(-1));
        assert!(matches!(cfg.validate(), Err(RegistryError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_blank_seed() {
        let cfg = RegistryConfig::new("/data").with_seed_admin(" ", "x");
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_sweep_interval() {
        let cfg = RegistryConfig::new("/data").with_sweep_interval(std::time::Duration::ZERO);
        assert!(matches!(cfg.validate(), Err(RegistryError::Config(_))));
    }
}
