use serde::{Deserialize, Serialize};
use std::time::Duration;

use madcritic_oracle::GenerationParams;

use crate::{ConfigError, Role};

/// How the critic is consulted between rounds
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CriticMode {
    /// No critic; debate prompts carry peer solutions only
    #[default]
    #[serde(alias = "off")]
    Disabled,
    /// One critic call per agent solution, each in isolation
    Local,
    /// One critic call per round covering every agent jointly
    Global,
}

impl CriticMode {
    pub fn is_enabled(&self) -> bool {
        !matches!(self, CriticMode::Disabled)
    }
}

impl std::fmt::Display for CriticMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CriticMode::Disabled => write!(f, "off"),
            CriticMode::Local => write!(f, "local"),
            CriticMode::Global => write!(f, "global"),
        }
    }
}

impl std::str::FromStr for CriticMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "off" | "none" | "disabled" => Ok(CriticMode::Disabled),
            "local" => Ok(CriticMode::Local),
            "global" => Ok(CriticMode::Global),
            _ => Err(format!("Unknown critic mode: {}", s)),
        }
    }
}

/// Everything that parameterizes one debate.
///
/// Passed into the orchestrator at construction; there is no process-wide
/// state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DebateConfig {
    pub agents: usize,
    pub rounds: usize,
    pub critic: CriticMode,
    /// Sampling for reasoning rounds
    pub actor: GenerationParams,
    /// Sampling for critic calls (temperature and top_p are pinned to greedy)
    pub critic_params: GenerationParams,
    /// Cycled over agent indices
    pub roles: Vec<Role>,
    /// Switch the next round to the restart prompt when every solved agent's
    /// combined score falls below this value
    pub restart_threshold: Option<f64>,
    /// Score the last round too, so transcripts carry final-round critiques
    pub score_final_round: bool,
    /// Upper bound on oracle calls in flight
    pub max_concurrent_calls: usize,
    #[serde(with = "humantime_serde")]
    pub question_timeout: Option<Duration>,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            agents: 3,
            rounds: 3,
            critic: CriticMode::Disabled,
            actor: GenerationParams::actor(),
            critic_params: GenerationParams::critic(),
            roles: vec![Role::Default],
            restart_threshold: None,
            score_final_round: true,
            max_concurrent_calls: 8,
            question_timeout: None,
        }
    }
}

impl DebateConfig {
    pub fn new(agents: usize, rounds: usize) -> Self {
        Self {
            agents,
            rounds,
            ..Default::default()
        }
    }

    pub fn with_critic(mut self, critic: CriticMode) -> Self {
        self.critic = critic;
        self
    }

    pub fn with_roles(mut self, roles: Vec<Role>) -> Self {
        self.roles = roles;
        self
    }

    pub fn with_restart_threshold(mut self, threshold: f64) -> Self {
        self.restart_threshold = Some(threshold);
        self
    }

    pub fn with_question_timeout(mut self, timeout: Duration) -> Self {
        self.question_timeout = Some(timeout);
        self
    }

    pub fn with_max_concurrent_calls(mut self, max: usize) -> Self {
        self.max_concurrent_calls = max;
        self
    }

    /// Base seed for actor sampling; each call derives its own seed from it
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.actor.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents == 0 {
            return Err(ConfigError::NoAgents);
        }
        if self.rounds == 0 {
            return Err(ConfigError::NoRounds);
        }
        if self.roles.is_empty() {
            return Err(ConfigError::EmptyRoles);
        }
        if self.max_concurrent_calls == 0 {
            return Err(ConfigError::NoConcurrency);
        }
        if let Some(threshold) = self.restart_threshold {
            if !threshold.is_finite() {
                return Err(ConfigError::InvalidThreshold(threshold));
            }
        }
        Ok(())
    }

    /// Role assigned to agent `index`
    pub fn role_for(&self, index: usize) -> Role {
        if self.roles.is_empty() {
            Role::Default
        } else {
            self.roles[index % self.roles.len()]
        }
    }

    /// Whether critic scoring runs after `round`
    pub fn scores_round(&self, round: usize) -> bool {
        self.critic.is_enabled() && (round < self.rounds || self.score_final_round)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = DebateConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.agents, 3);
        assert_eq!(config.critic, CriticMode::Disabled);
    }

    #[test]
    fn test_validate_rejects() {
        assert_eq!(
            DebateConfig::new(0, 3).validate(),
            Err(ConfigError::NoAgents)
        );
        assert_eq!(
            DebateConfig::new(3, 0).validate(),
            Err(ConfigError::NoRounds)
        );
        assert_eq!(
            DebateConfig::default().with_roles(vec![]).validate(),
            Err(ConfigError::EmptyRoles)
        );
        assert!(DebateConfig::default()
            .with_restart_threshold(f64::NAN)
            .validate()
            .is_err());
        assert_eq!(
            DebateConfig::default()
                .with_max_concurrent_calls(0)
                .validate(),
            Err(ConfigError::NoConcurrency)
        );
    }

    #[test]
    fn test_roles_cycle() {
        let config = DebateConfig::new(4, 2).with_roles(vec![Role::Logician, Role::Skeptic]);
        assert_eq!(config.role_for(0), Role::Logician);
        assert_eq!(config.role_for(1), Role::Skeptic);
        assert_eq!(config.role_for(2), Role::Logician);
    }

    #[test]
    fn test_scores_round() {
        let mut config = DebateConfig::new(3, 3).with_critic(CriticMode::Local);
        assert!(config.scores_round(3));
        config.score_final_round = false;
        assert!(config.scores_round(2));
        assert!(!config.scores_round(3));
        assert!(!DebateConfig::new(3, 3).scores_round(1));
    }

    #[test]
    fn test_from_toml() {
        let config: DebateConfig = toml::from_str(
            r#"
agents = 5
critic = "global"
roles = ["logician", "programmer", "skeptic"]
question_timeout = "2m"

[actor]
temperature = 0.9
"#,
        )
        .unwrap();
        assert_eq!(config.agents, 5);
        assert_eq!(config.rounds, 3);
        assert_eq!(config.critic, CriticMode::Global);
        assert_eq!(config.roles.len(), 3);
        assert_eq!(config.question_timeout, Some(Duration::from_secs(120)));
        assert_eq!(config.actor.max_tokens, 2048);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(toml::from_str::<DebateConfig>("agent_count = 3").is_err());
    }
}
