use anyhow::Result;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure for gatepass
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GatepassConfig {
    /// Row-store settings
    pub store: StoreConfig,
    /// Allocation matcher tuning
    pub allocation: AllocationConfig,
    /// Department-to-role grants
    pub roles: RolesConfig,
    /// Observability settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    /// Path of the JSON tables file
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllocationConfig {
    /// Suggestions returned by the general search
    pub max_suggestions: usize,
    /// Pairs returned by the combination search
    pub pair_suggestions: usize,
    /// Matches returned by the wastage search
    pub wastage_suggestions: usize,
    /// Optimal utilization band, percent
    pub optimal_min: f64,
    pub optimal_max: f64,
    /// Largest combination the exhaustive search will enumerate. The search
    /// is O(n^k); keep this at 3 unless the fleet is tiny.
    pub max_combination_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RolesConfig {
    /// Departments whose members hold every stage role
    pub admin_departments: Vec<String>,
    /// Departments allowed to sign order approvals
    pub purchase_team_departments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    /// Log level
    pub log_level: String,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            max_suggestions: 8,
            pair_suggestions: 10,
            wastage_suggestions: 5,
            optimal_min: 85.0,
            optimal_max: 100.0,
            max_combination_size: 3,
        }
    }
}

impl Default for RolesConfig {
    fn default() -> Self {
        Self {
            admin_departments: vec!["Admin".to_string()],
            purchase_team_departments: vec![
                "Accounts Team".to_string(),
                "Stores IAF Unit-1/ Soliflex unit-1".to_string(),
                "Stores Unit-IV/ soliflex unit-II".to_string(),
                "Soliflex Unit-III".to_string(),
                "Fabric IAF unit- 1 / Soliflex unit-1".to_string(),
                "Fabric Unit-IV/ Soliflex unit-II".to_string(),
                "Fabric Solifelx unit-III".to_string(),
            ],
        }
    }
}

impl Default for GatepassConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig {
                path: ".gatepass/store.json".to_string(),
            },
            allocation: AllocationConfig::default(),
            roles: RolesConfig::default(),
            observability: ObservabilityConfig {
                log_level: "info".to_string(),
            },
        }
    }
}

impl GatepassConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration file (gatepass.toml)
    /// 3. Environment variables (prefixed with GATEPASS__)
    pub fn load() -> Result<Self> {
        let mut builder = Config::builder().add_source(Config::try_from(&Self::default())?);

        if Path::new("gatepass.toml").exists() {
            builder = builder.add_source(File::with_name("gatepass"));
        }

        builder = builder.add_source(
            Environment::with_prefix("GATEPASS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<GatepassConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = GatepassConfig::load_env_file();
        GatepassConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static GatepassConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}
