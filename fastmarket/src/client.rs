use eyre::{Context, Result};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::config::{EndpointConfig, NetworkTable};
use crate::error::OrderError;

/// Environment variable holding the signing key
pub const PRIVATE_KEY_VAR: &str = "PRIVATE_KEY";

/// Resolved runtime configuration: which networks exist and where the signing
/// credential comes from
pub struct FastMarketClient {
    /// Endpoint table orders are routed with
    pub(crate) networks: NetworkTable,
    /// Variables loaded from the env file
    pub(crate) env_vars: HashMap<String, String>,
    /// Whether lookups fall back to the process environment
    pub(crate) inherit_process_env: bool,
}

impl FastMarketClient {
    /// Create a new builder for FastMarketClient
    pub fn builder() -> FastMarketClientBuilder {
        FastMarketClientBuilder::default()
    }

    pub fn networks(&self) -> &NetworkTable {
        &self.networks
    }

    /// Look up an origin endpoint by wormhole chain ID or name
    pub fn endpoint(&self, network: &str) -> Result<&EndpointConfig> {
        self.networks.resolve(network)
    }

    /// Get an environment variable value, env file first
    pub fn get_env(&self, key: &str) -> Option<String> {
        self.env_vars.get(key).cloned().or_else(|| {
            if self.inherit_process_env {
                std::env::var(key).ok()
            } else {
                None
            }
        })
    }

    /// The signing key. Fails before anything touches the network when it is
    /// absent or empty.
    pub fn private_key(&self) -> Result<String> {
        self.get_env(PRIVATE_KEY_VAR)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| OrderError::MissingCredential(PRIVATE_KEY_VAR.to_string()).into())
    }
}

/// Builder for FastMarketClient
pub struct FastMarketClientBuilder {
    env_file_path: Option<PathBuf>,
    config_file_path: Option<PathBuf>,
    networks: Option<NetworkTable>,
    inherit_process_env: bool,
}

impl Default for FastMarketClientBuilder {
    fn default() -> Self {
        Self {
            env_file_path: None,
            config_file_path: None,
            networks: None,
            inherit_process_env: true,
        }
    }
}

impl FastMarketClientBuilder {
    /// Set custom environment file path. Unlike the implicit `.env`, it must
    /// exist.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file_path = Some(path.into());
        self
    }

    /// Load the network table from a `.json` or `.toml` file
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file_path = Some(path.into());
        self
    }

    /// Use an explicit network table
    pub fn with_networks(mut self, networks: NetworkTable) -> Self {
        self.networks = Some(networks);
        self
    }

    /// Only read variables from the env file, never the process environment
    pub fn without_process_env(mut self) -> Self {
        self.inherit_process_env = false;
        self
    }

    /// Build the FastMarketClient
    pub fn build(self) -> Result<FastMarketClient> {
        let env_vars = match self.env_file_path {
            Some(path) => load_env_file(&path, true)?,
            None => load_env_file(Path::new(".env"), false)?,
        };

        let networks = match (self.networks, self.config_file_path) {
            (Some(networks), _) => networks,
            (None, Some(path)) => NetworkTable::from_file(path)?,
            (None, None) => NetworkTable::builtin(),
        };

        Ok(FastMarketClient {
            networks,
            env_vars,
            inherit_process_env: self.inherit_process_env,
        })
    }
}

/// Load environment variables from a .env file. A missing file is only
/// tolerated when it is not `required`.
fn load_env_file(path: &Path, required: bool) -> Result<HashMap<String, String>> {
    use std::fs;
    use std::io::{BufRead, BufReader, ErrorKind};

    let mut env_vars = HashMap::new();

    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => return Ok(env_vars),
        Err(e) => {
            return Err(e).wrap_err_with(|| format!("failed to open env file {}", path.display()))
        }
    };

    let reader = BufReader::new(file);
    for line in reader.lines() {
        let line = line?;
        let line = line.trim();

        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some((key, value)) = line.split_once('=') {
            let value = value.trim().trim_matches('"');
            env_vars.insert(key.trim().to_string(), value.to_string());
        }
    }

    Ok(env_vars)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_builder_defaults_to_builtin_networks() {
        let env_file = tempfile::NamedTempFile::new().unwrap();
        let client = FastMarketClient::builder()
            .with_env_file(env_file.path())
            .without_process_env()
            .build()
            .unwrap();
        assert_eq!(client.networks(), &NetworkTable::builtin());
        assert_eq!(client.endpoint("10003").unwrap().network, "arbitrum-sepolia");
    }

    #[test]
    fn test_missing_private_key() {
        let env_file = tempfile::NamedTempFile::new().unwrap();
        let client = FastMarketClient::builder()
            .with_env_file(env_file.path())
            .without_process_env()
            .build()
            .unwrap();
        let err = client.private_key().unwrap_err();
        assert_eq!(
            err.downcast_ref::<OrderError>(),
            Some(&OrderError::MissingCredential("PRIVATE_KEY".to_string()))
        );
    }

    #[test]
    fn test_private_key_from_env_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# signer").unwrap();
        writeln!(file, "PRIVATE_KEY=\"0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80\"").unwrap();
        writeln!(file, "EMPTY=").unwrap();

        let client = FastMarketClient::builder()
            .with_env_file(file.path())
            .without_process_env()
            .build()
            .unwrap();
        assert_eq!(
            client.private_key().unwrap(),
            "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        );
        assert_eq!(client.get_env("EMPTY").as_deref(), Some(""));
    }

    #[test]
    fn test_blank_private_key_is_missing() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "PRIVATE_KEY=   ").unwrap();

        let client = FastMarketClient::builder()
            .with_env_file(file.path())
            .without_process_env()
            .build()
            .unwrap();
        assert!(client.private_key().is_err());
    }

    #[test]
    fn test_explicit_env_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing.env");

        let err = FastMarketClient::builder()
            .with_env_file(&missing)
            .without_process_env()
            .build()
            .err()
            .unwrap();
        assert!(err.to_string().contains("failed to open env file"));
        assert!(err.downcast_ref::<OrderError>().is_none());
    }

    #[test]
    fn test_optional_env_file_may_be_absent() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join(".env");

        assert!(load_env_file(&missing, false).unwrap().is_empty());
        assert!(load_env_file(&missing, true).is_err());
    }

    #[test]
    fn test_optional_env_file_other_errors_propagate() {
        // Reading a directory fails with something other than NotFound
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_file(dir.path(), false).is_err());
    }
}
