use serde::Deserialize;

/// Engine configuration. Loaded from environment variables with the prefix
/// `SURVEY_INSIGHTS__` and falls back to per-field defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Upper bound on a single event-store query before it is surfaced
    /// as a timeout error.
    #[serde(default = "default_adapter_timeout_ms")]
    pub adapter_timeout_ms: u64,
    /// Canonical question order for the survey-step metrics. Matches the
    /// questionnaire form definition; steps missing from this list sort
    /// after all known steps in encounter order.
    #[serde(default = "default_step_order")]
    pub step_order: Vec<String>,
}

fn default_adapter_timeout_ms() -> u64 {
    10_000
}

fn default_step_order() -> Vec<String> {
    [
        "work_values",
        "corporate_culture",
        "leadership",
        "workplace_environment",
        "humanity",
        "interpersonal_skills",
        "cognitive_abilities",
        "self_growth",
        "job_performance",
        "mental_strength",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            adapter_timeout_ms: default_adapter_timeout_ms(),
            step_order: default_step_order(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables.
    pub fn load() -> crate::error::InsightsResult<Self> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("SURVEY_INSIGHTS")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder
            .build()
            .map_err(|e| crate::error::InsightsError::Config(e.to_string()))?;
        config
            .try_deserialize()
            .map_err(|e| crate::error::InsightsError::Config(e.to_string()))
    }
}
