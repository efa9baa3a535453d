//! Keyword tables that route commits to initiatives and repositories to
//! components. Kept as data so a config file can replace them wholesale.

use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitiativeRule {
    pub name: String,
    /// Lower-case substrings tested against the lower-cased subject.
    #[serde(deserialize_with = "lowercase_keywords")]
    pub keywords: Vec<String>,
}

fn lowercase_keywords<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let keywords = Vec::<String>::deserialize(deserializer)?;
    Ok(keywords.into_iter().map(|k| k.to_lowercase()).collect())
}

impl InitiativeRule {
    pub fn new(name: &str, keywords: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_lowercase()).collect(),
        }
    }

    pub fn matches(&self, lower_subject: &str) -> bool {
        self.keywords.iter().any(|k| lower_subject.contains(k.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentRule {
    pub name: String,
    /// Substrings tested against the repository name.
    pub repositories: Vec<String>,
}

impl ComponentRule {
    pub fn new(name: &str, repositories: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            repositories: repositories.iter().map(|r| r.to_string()).collect(),
        }
    }

    pub fn matches(&self, repo: &str) -> bool {
        self.repositories.iter().any(|r| repo.contains(r.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    #[serde(default = "default_fallback_component")]
    pub fallback_component: String,
    /// Fix subjects containing any of these are flagged as critical issues.
    #[serde(default = "default_severity_markers")]
    pub severity_markers: Vec<String>,
    #[serde(default = "default_initiatives")]
    pub initiatives: Vec<InitiativeRule>,
    #[serde(default = "default_components")]
    pub components: Vec<ComponentRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            fallback_component: default_fallback_component(),
            severity_markers: default_severity_markers(),
            initiatives: default_initiatives(),
            components: default_components(),
        }
    }
}

impl RuleSet {
    /// Every initiative whose keywords hit the subject, in table order.
    pub fn initiatives_for<'a>(
        &'a self,
        subject: &str,
    ) -> impl Iterator<Item = &'a InitiativeRule> + 'a {
        let lower = subject.to_lowercase();
        self.initiatives.iter().filter(move |rule| rule.matches(&lower))
    }

    /// First matching component, else the fallback.
    pub fn component_for(&self, repo: &str) -> &str {
        self.components
            .iter()
            .find(|rule| rule.matches(repo))
            .map(|rule| rule.name.as_str())
            .unwrap_or(self.fallback_component.as_str())
    }

    pub fn is_severe(&self, subject: &str) -> bool {
        let lower = subject.to_lowercase();
        self.severity_markers
            .iter()
            .any(|m| lower.contains(m.to_lowercase().as_str()))
    }
}

fn default_initiatives() -> Vec<InitiativeRule> {
    vec![
        InitiativeRule::new(
            "Platform Observability",
            &["cockpit", "logging", "monitoring", "observability", "loki"],
        ),
        InitiativeRule::new("Infrastructure Monitoring", &["uptime", "kuma", "status"]),
        InitiativeRule::new(
            "Vector Search & AI",
            &["qdrant", "vector", "embedding", "mistral", "google"],
        ),
        InitiativeRule::new(
            "Security & Authentication",
            &["auth", "jwt", "token", "rbac", "security"],
        ),
        InitiativeRule::new(
            "Data Processing",
            &["pipeline", "workflow", "argo", "processor", "ti_xml"],
        ),
        InitiativeRule::new("Multi-tenant Data Sharing", &["public", "dataplane", "cross-org"]),
        InitiativeRule::new(
            "Database Infrastructure",
            &["postgres", "pgbouncer", "pool", "database"],
        ),
        InitiativeRule::new(
            "Network Infrastructure",
            &["istio", "envoy", "skupper", "service mesh"],
        ),
        InitiativeRule::new("API & Developer Experience", &["openapi", "client", "api"]),
        InitiativeRule::new(
            "Platform UI Enhancements",
            &["frontend", "ui", "dialog", "toggle", "interface"],
        ),
        InitiativeRule::new("Event Processing", &["webhook", "event"]),
        InitiativeRule::new(
            "Performance Optimization",
            &["performance", "memory", "cpu", "optimize", "hpa"],
        ),
    ]
}

fn default_components() -> Vec<ComponentRule> {
    vec![
        ComponentRule::new("Backend API", &["web-app"]),
        ComponentRule::new("Frontend", &["web-app"]),
        ComponentRule::new("Data Processing", &["data-pipelines", "data-cluster"]),
        ComponentRule::new(
            "Infrastructure",
            &["k8s-charts", "data-cluster-helm", "data-cluster-operator"],
        ),
        ComponentRule::new("Workers", &["workers"]),
        ComponentRule::new("Networking", &["skupper-gateway"]),
        ComponentRule::new(
            "MCP Services",
            &["MCPs/mcp-base", "MCPs/mcp-openaire", "MCPs/mcp-datacluster"],
        ),
    ]
}

fn default_fallback_component() -> String {
    "Infrastructure".to_string()
}

fn default_severity_markers() -> Vec<String> {
    ["critical", "crash", "502", "504", "timeout", "memory leak"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initiatives_are_not_exclusive() {
        let rules = RuleSet::default();
        let hits: Vec<_> = rules
            .initiatives_for("feat: auth against postgres")
            .map(|r| r.name.as_str())
            .collect();
        assert!(hits.contains(&"Security & Authentication"));
        assert!(hits.contains(&"Database Infrastructure"));
    }

    #[test]
    fn component_first_match_wins() {
        let rules = RuleSet::default();
        assert_eq!(rules.component_for("web-app"), "Backend API");
        // "data-cluster" is declared before the helm chart entry
        assert_eq!(rules.component_for("data-cluster-helm"), "Data Processing");
        assert_eq!(rules.component_for("MCPs/mcp-openaire"), "MCP Services");
    }

    #[test]
    fn unknown_repository_falls_back() {
        let rules = RuleSet::default();
        assert_eq!(rules.component_for("MCPs/mcp-boilerplate"), "Infrastructure");
        assert_eq!(rules.component_for("something-else"), "Infrastructure");
    }

    #[test]
    fn severity_is_case_insensitive() {
        let rules = RuleSet::default();
        assert!(rules.is_severe("fix: Gateway 504 on upload"));
        assert!(rules.is_severe("fix: CRASH when empty"));
        assert!(rules.is_severe("fix: plug Memory Leak"));
        assert!(!rules.is_severe("fix: typo"));
    }

    #[test]
    fn rule_set_round_trips_through_toml() {
        let rules = RuleSet::default();
        let text = toml::to_string(&rules).unwrap();
        let back: RuleSet = toml::from_str(&text).unwrap();
        assert_eq!(rules, back);
    }

    #[test]
    fn configured_keywords_match_regardless_of_case() {
        let text = "[[initiatives]]\nname = \"Streaming\"\nkeywords = [\"Kafka\"]\n";
        let rules: RuleSet = toml::from_str(text).unwrap();
        assert_eq!(rules.initiatives[0].keywords, vec!["kafka".to_string()]);
        let hits: Vec<_> = rules
            .initiatives_for("feat: Kafka consumer")
            .map(|r| r.name.as_str())
            .collect();
        assert_eq!(hits, vec!["Streaming"]);
    }
}
