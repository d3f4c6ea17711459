//! Configuration loading and typed config structures for the Codeshop
//! simulation.
//!
//! The canonical configuration lives in `codeshop-config.yaml` at the
//! project root. Every field has a default, so a missing section (or an
//! empty file) yields a runnable company.

use std::path::Path;

use codeshop_types::EmployeeRole;
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

/// Why a configuration could not be loaded.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("config file unreadable: {source}")]
    Io {
        /// I/O error from the read.
        #[from]
        source: std::io::Error,
    },

    /// The text is not a valid company configuration.
    #[error("config is not valid YAML for this schema: {source}")]
    Yaml {
        /// Deserializer error.
        #[from]
        source: serde_yml::Error,
    },
}

/// Top-level company configuration.
///
/// Mirrors the structure of `codeshop-config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompanyConfig {
    /// Name, seed, cadences, and run bounds.
    #[serde(default)]
    pub simulation: SimulationSettings,

    /// Funds, salaries, and bounded collections.
    #[serde(default)]
    pub economy: EconomyConfig,

    /// AI work queue settings.
    #[serde(default)]
    pub queue: QueueConfig,

    /// Advisory loop thresholds.
    #[serde(default)]
    pub advisor: AdvisorConfig,

    /// Purchasable upgrade catalog.
    #[serde(default = "default_upgrades")]
    pub upgrades: Vec<UpgradeConfig>,

    /// Observer server and snapshot file settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// LLM request settings (credentials come from the environment).
    #[serde(default)]
    pub llm: LlmConfig,
}

impl Default for CompanyConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationSettings::default(),
            economy: EconomyConfig::default(),
            queue: QueueConfig::default(),
            advisor: AdvisorConfig::default(),
            upgrades: default_upgrades(),
            infrastructure: InfrastructureConfig::default(),
            llm: LlmConfig::default(),
        }
    }
}

impl CompanyConfig {
    /// Read `path` as YAML, then apply the infrastructure environment
    /// overrides:
    /// - `CODESHOP_OBSERVER_PORT` overrides `infrastructure.observer_port`
    /// - `CODESHOP_SNAPSHOT_PATH` overrides `infrastructure.snapshot_path`
    ///
    /// # Errors
    ///
    /// [`ConfigError::Io`] for an unreadable file, [`ConfigError::Yaml`]
    /// for content that does not deserialize.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config
            .infrastructure
            .apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Deserialize `yaml` without environment overrides. Blank input
    /// yields the defaults.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Yaml`] when `yaml` does not deserialize.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        if yaml.trim().is_empty() {
            Ok(Self::default())
        } else {
            Ok(serde_yml::from_str(yaml)?)
        }
    }
}

/// Simulation identity, cadence, and bounds.
///
/// A value of 0 for `max_ticks` or `max_real_time_seconds` means unlimited.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SimulationSettings {
    /// Company name, used in prompts and logs.
    #[serde(default = "default_company_name")]
    pub name: String,

    /// Random seed for advisor choices.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Real-time milliseconds per tick.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,

    /// Real-time milliseconds between AI queue processing attempts.
    #[serde(default = "default_queue_interval_ms")]
    pub queue_interval_ms: u64,

    /// Maximum number of ticks before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_ticks: u64,

    /// Maximum wall-clock seconds before the run ends (0 = unlimited).
    #[serde(default)]
    pub max_real_time_seconds: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            name: default_company_name(),
            seed: default_seed(),
            tick_interval_ms: default_tick_interval_ms(),
            queue_interval_ms: default_queue_interval_ms(),
            max_ticks: 0,
            max_real_time_seconds: 0,
        }
    }
}

/// Economy configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EconomyConfig {
    /// Funds seeded into the treasury at company creation.
    #[serde(default = "default_starting_funds")]
    pub starting_funds: Decimal,

    /// Hiring cost per role.
    #[serde(default)]
    pub salaries: SalaryConfig,

    /// Memory records kept per employee; older ones are evicted first.
    #[serde(default = "default_memory_capacity")]
    pub memory_capacity: usize,

    /// Notifications kept; older ones are evicted first.
    #[serde(default = "default_max_notifications")]
    pub max_notifications: usize,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            starting_funds: default_starting_funds(),
            salaries: SalaryConfig::default(),
            memory_capacity: default_memory_capacity(),
            max_notifications: default_max_notifications(),
        }
    }
}

/// Base salary (hiring cost) per role.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SalaryConfig {
    /// Engineer hiring cost.
    #[serde(default = "default_engineer_salary")]
    pub engineer: Decimal,
    /// Designer hiring cost.
    #[serde(default = "default_designer_salary")]
    pub designer: Decimal,
    /// Product manager hiring cost.
    #[serde(default = "default_pm_salary")]
    pub pm: Decimal,
    /// Marketer hiring cost.
    #[serde(default = "default_marketer_salary")]
    pub marketer: Decimal,
}

impl SalaryConfig {
    /// Hiring cost for `role`.
    pub const fn for_role(&self, role: EmployeeRole) -> Decimal {
        match role {
            EmployeeRole::Engineer => self.engineer,
            EmployeeRole::Designer => self.designer,
            EmployeeRole::Pm => self.pm,
            EmployeeRole::Marketer => self.marketer,
        }
    }
}

impl Default for SalaryConfig {
    fn default() -> Self {
        Self {
            engineer: default_engineer_salary(),
            designer: default_designer_salary(),
            pm: default_pm_salary(),
            marketer: default_marketer_salary(),
        }
    }
}

/// AI work queue configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct QueueConfig {
    /// Whether assignment submits tasks for artifact generation.
    #[serde(default = "default_true")]
    pub generation_enabled: bool,

    /// Retries before a failing item is dropped; the item gets this many
    /// attempts plus the first.
    #[serde(default = "default_max_retries")]
    pub max_retries: u8,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            generation_enabled: true,
            max_retries: default_max_retries(),
        }
    }
}

/// Advisory loop configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AdvisorConfig {
    /// Whether the runner evaluates the advisor on its cadence.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Simulation ticks between evaluations.
    #[serde(default = "default_evaluation_interval_ticks")]
    pub evaluation_interval_ticks: u64,

    /// No new proposals while this many are pending.
    #[serde(default = "default_max_pending_proposals")]
    pub max_pending_proposals: usize,

    /// No mission proposals while this many missions are active.
    #[serde(default = "default_max_active_missions")]
    pub max_active_missions: usize,

    /// Hire proposals stop once the team reaches this size.
    #[serde(default = "default_hire_team_size_limit")]
    pub hire_team_size_limit: usize,

    /// Funds must exceed this before a hire is proposed.
    #[serde(default = "default_hire_funds_threshold")]
    pub hire_funds_threshold: Decimal,

    /// Size of the thought ring buffer.
    #[serde(default = "default_max_thoughts")]
    pub max_thoughts: usize,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_interval_ticks: default_evaluation_interval_ticks(),
            max_pending_proposals: default_max_pending_proposals(),
            max_active_missions: default_max_active_missions(),
            hire_team_size_limit: default_hire_team_size_limit(),
            hire_funds_threshold: default_hire_funds_threshold(),
            max_thoughts: default_max_thoughts(),
        }
    }
}

/// One purchasable upgrade in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UpgradeConfig {
    /// Stable catalog id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// What the upgrade does.
    #[serde(default)]
    pub description: String,
    /// Purchase cost.
    pub cost: Decimal,
    /// Completed tasks required before the advisor suggests it.
    #[serde(default)]
    pub unlock_after_tasks: u32,
}

/// Observer server and snapshot file settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// Interface the observer binds to.
    #[serde(default = "default_observer_host")]
    pub observer_host: String,

    /// Observer HTTP port.
    #[serde(default = "default_observer_port")]
    pub observer_port: u16,

    /// Where the engine writes the JSON snapshot.
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: String,

    /// Ticks between periodic snapshots (0 = only on shutdown).
    #[serde(default = "default_snapshot_interval_ticks")]
    pub snapshot_interval_ticks: u64,
}

impl InfrastructureConfig {
    /// Override settings with environment variables when set.
    ///
    /// `lookup` resolves a variable name to its value; the engine passes
    /// `std::env::var`, tests pass a map. An unparsable port is ignored.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup("CODESHOP_OBSERVER_PORT") {
            match val.parse::<u16>() {
                Ok(port) => self.observer_port = port,
                Err(err) => warn!(value = %val, error = %err, "Ignoring invalid CODESHOP_OBSERVER_PORT"),
            }
        }
        if let Some(val) = lookup("CODESHOP_SNAPSHOT_PATH") {
            self.snapshot_path = val;
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            observer_host: default_observer_host(),
            observer_port: default_observer_port(),
            snapshot_path: default_snapshot_path(),
            snapshot_interval_ticks: default_snapshot_interval_ticks(),
        }
    }
}

/// LLM request settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LlmConfig {
    /// HTTP request timeout in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Maximum completion tokens per request.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Directory of prompt templates overriding the built-in ones.
    #[serde(default)]
    pub templates_dir: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: default_request_timeout_ms(),
            max_tokens: default_max_tokens(),
            templates_dir: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Field defaults
// ---------------------------------------------------------------------------

fn default_company_name() -> String {
    "Codeshop".to_owned()
}

const fn default_seed() -> u64 {
    42
}

const fn default_tick_interval_ms() -> u64 {
    1_000
}

const fn default_queue_interval_ms() -> u64 {
    500
}

fn default_starting_funds() -> Decimal {
    Decimal::new(10_000, 0)
}

fn default_engineer_salary() -> Decimal {
    Decimal::new(3_000, 0)
}

fn default_designer_salary() -> Decimal {
    Decimal::new(2_500, 0)
}

fn default_pm_salary() -> Decimal {
    Decimal::new(2_500, 0)
}

fn default_marketer_salary() -> Decimal {
    Decimal::new(2_000, 0)
}

const fn default_memory_capacity() -> usize {
    50
}

const fn default_max_notifications() -> usize {
    100
}

const fn default_max_retries() -> u8 {
    2
}

const fn default_evaluation_interval_ticks() -> u64 {
    10
}

const fn default_max_pending_proposals() -> usize {
    3
}

const fn default_max_active_missions() -> usize {
    2
}

const fn default_hire_team_size_limit() -> usize {
    3
}

fn default_hire_funds_threshold() -> Decimal {
    Decimal::new(5_000, 0)
}

const fn default_max_thoughts() -> usize {
    20
}

fn default_upgrades() -> Vec<UpgradeConfig> {
    vec![
        UpgradeConfig {
            id: "ci_pipeline".to_owned(),
            name: "CI Pipeline".to_owned(),
            description: "Automated builds and tests on every push".to_owned(),
            cost: Decimal::new(1_500, 0),
            unlock_after_tasks: 3,
        },
        UpgradeConfig {
            id: "design_system".to_owned(),
            name: "Design System".to_owned(),
            description: "Shared component library for consistent UI".to_owned(),
            cost: Decimal::new(2_000, 0),
            unlock_after_tasks: 5,
        },
        UpgradeConfig {
            id: "code_review_bot".to_owned(),
            name: "Code Review Bot".to_owned(),
            description: "Automatic review comments on pull requests".to_owned(),
            cost: Decimal::new(2_500, 0),
            unlock_after_tasks: 8,
        },
        UpgradeConfig {
            id: "analytics".to_owned(),
            name: "Product Analytics".to_owned(),
            description: "Usage dashboards for shipped features".to_owned(),
            cost: Decimal::new(3_000, 0),
            unlock_after_tasks: 12,
        },
    ]
}

fn default_observer_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_observer_port() -> u16 {
    8080
}

fn default_snapshot_path() -> String {
    "codeshop-snapshot.json".to_owned()
}

const fn default_snapshot_interval_ticks() -> u64 {
    50
}

const fn default_request_timeout_ms() -> u64 {
    60_000
}

const fn default_max_tokens() -> u32 {
    2_048
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = CompanyConfig::default();
        assert_eq!(config.simulation.seed, 42);
        assert_eq!(config.queue.max_retries, 2);
        assert_eq!(config.advisor.max_pending_proposals, 3);
        assert_eq!(config.advisor.max_active_missions, 2);
        assert_eq!(config.advisor.max_thoughts, 20);
        assert_eq!(config.economy.memory_capacity, 50);
        assert_eq!(config.upgrades.len(), 4);
    }

    #[test]
    fn parse_full_yaml() {
        let yaml = r#"
simulation:
  name: "Acme Labs"
  seed: 7
  tick_interval_ms: 250
  queue_interval_ms: 100
  max_ticks: 500

economy:
  starting_funds: "1200.50"
  salaries:
    engineer: 900
    designer: "800"
  memory_capacity: 10

queue:
  generation_enabled: false
  max_retries: 3

advisor:
  evaluation_interval_ticks: 5
  hire_funds_threshold: 100

upgrades:
  - id: monorepo
    name: Monorepo
    cost: 50
    unlock_after_tasks: 1

infrastructure:
  observer_port: 9090
  snapshot_path: "/tmp/acme.json"

llm:
  max_tokens: 512
  templates_dir: "./prompts"
"#;
        let config = CompanyConfig::parse(yaml);
        assert!(config.is_ok(), "parse failed: {config:?}");
        let config = config.ok().unwrap_or_default();

        assert_eq!(config.simulation.name, "Acme Labs");
        assert_eq!(config.simulation.max_ticks, 500);
        assert_eq!(config.economy.starting_funds, Decimal::new(120_050, 2));
        assert_eq!(config.economy.salaries.engineer, Decimal::new(900, 0));
        assert_eq!(config.economy.salaries.designer, Decimal::new(800, 0));
        // Unspecified salaries keep their defaults.
        assert_eq!(config.economy.salaries.pm, Decimal::new(2_500, 0));
        assert!(!config.queue.generation_enabled);
        assert_eq!(config.advisor.evaluation_interval_ticks, 5);
        assert_eq!(config.upgrades.len(), 1);
        assert_eq!(config.infrastructure.observer_port, 9090);
        assert_eq!(config.llm.templates_dir.as_deref(), Some("./prompts"));
    }

    #[test]
    fn parse_empty_yaml() {
        let config = CompanyConfig::parse("");
        assert_eq!(config.ok(), Some(CompanyConfig::default()));
    }

    #[test]
    fn salary_lookup_by_role() {
        let salaries = SalaryConfig::default();
        assert_eq!(salaries.for_role(EmployeeRole::Engineer), Decimal::new(3_000, 0));
        assert_eq!(salaries.for_role(EmployeeRole::Marketer), Decimal::new(2_000, 0));
    }

    #[test]
    fn env_overrides_apply() {
        let env: BTreeMap<&str, &str> = BTreeMap::from([
            ("CODESHOP_OBSERVER_PORT", "7777"),
            ("CODESHOP_SNAPSHOT_PATH", "/var/lib/codeshop.json"),
        ]);
        let mut infra = InfrastructureConfig::default();
        infra.apply_env_overrides(|key| env.get(key).map(|v| (*v).to_owned()));
        assert_eq!(infra.observer_port, 7777);
        assert_eq!(infra.snapshot_path, "/var/lib/codeshop.json");
    }

    #[test]
    fn invalid_port_override_is_ignored() {
        let mut infra = InfrastructureConfig::default();
        infra.apply_env_overrides(|key| {
            (key == "CODESHOP_OBSERVER_PORT").then(|| "not-a-port".to_owned())
        });
        assert_eq!(infra.observer_port, 8080);
    }

    #[test]
    fn bundled_config_file_loads() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("..")
            .join("..")
            .join("codeshop-config.yaml");
        if path.exists() {
            let config = CompanyConfig::from_file(&path);
            assert!(config.is_ok(), "bundled config rejected: {config:?}");
        }
    }
}
