//! Static keyword vocabularies used by the detector.
//!
//! Matching is case-insensitive substring containment; each keyword
//! counts at most once per task.

/// A set of description keywords and the points each match contributes.
#[derive(Debug, Clone, Copy)]
pub struct KeywordTier {
    pub name: &'static str,
    pub keywords: &'static [&'static str],
    pub points: i32,
}

/// Description keyword tiers, in evaluation order.
pub const DESCRIPTION_TIERS: &[KeywordTier] = &[
    KeywordTier {
        name: "high",
        keywords: &[
            "refactor",
            "architecture",
            "distributed",
            "microservice",
            "event-driven",
            "fault-tolerance",
            "scaling",
            "optimization",
            "migration",
            "integration",
            "deployment",
            "kubernetes",
        ],
        points: 20,
    },
    KeywordTier {
        name: "medium",
        keywords: &[
            "implement",
            "build",
            "create",
            "design",
            "authentication",
            "validation",
            "api",
            "endpoint",
            "database",
            "caching",
            "redis",
            "service",
        ],
        points: 13,
    },
    KeywordTier {
        name: "low",
        keywords: &[
            "fix", "update", "add", "remove", "comment", "typo", "format", "rename",
        ],
        points: -8,
    },
];

/// Word count above which a description earns the first length bonus.
pub const LONG_DESCRIPTION_WORDS: usize = 15;
pub const LONG_DESCRIPTION_BONUS: i32 = 12;

/// Word count above which a description earns the second, additional bonus.
pub const VERY_LONG_DESCRIPTION_WORDS: usize = 30;
pub const VERY_LONG_DESCRIPTION_BONUS: i32 = 18;

/// Path fragments that mark a deployment or infrastructure artifact.
pub const INFRA_FILE_MARKERS: &[&str] = &[".yaml", ".yml", "docker", "k8s"];

/// Points added to the file score per infrastructure artifact.
pub const INFRA_FILE_POINTS: u32 = 10;

/// Dependencies that are operationally complex to run or build against.
pub const COMPLEX_DEPENDENCIES: &[&str] = &[
    "kubernetes",
    "docker",
    "redis",
    "rabbitmq",
    "kafka",
    "elasticsearch",
    "prometheus",
    "grafana",
    "postgresql",
    "mongodb",
    "cassandra",
    "webpack",
    "babel",
    "typescript",
];

pub const DEPENDENCY_POINTS_EACH: u32 = 8;
pub const DEPENDENCY_COUNT_CAP: u32 = 50;
pub const COMPLEX_DEPENDENCY_POINTS: u32 = 15;

/// Description terms that signal deployment work.
pub const DEPLOYMENT_TERMS: &[&str] = &["microservice", "deploy", "kubernetes"];

/// File fragments that mark a deployment configuration.
pub const DEPLOYMENT_CONFIG_MARKERS: &[&str] = &[".yaml", ".yml", "k8s"];

pub const CROSS_CUTTING_SCORE: u32 = 20;
pub const PARALLELIZABLE_BONUS: u32 = 15;

/// Count keywords from `keywords` contained in the already lower-cased `text`.
pub fn count_matches(text: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|kw| text.contains(*kw)).count()
}

/// True if any of `markers` appears in `text` (case-insensitive).
pub fn contains_any(text: &str, markers: &[&str]) -> bool {
    let lowered = text.to_lowercase();
    markers.iter().any(|m| lowered.contains(m))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_ordered_high_to_low() {
        let points: Vec<i32> = DESCRIPTION_TIERS.iter().map(|t| t.points).collect();
        assert_eq!(points, vec![20, 13, -8]);
    }

    #[test]
    fn count_matches_counts_each_keyword_once() {
        assert_eq!(count_matches("fix fix fix the typo", &["fix", "typo"]), 2);
        assert_eq!(count_matches("nothing here", &["fix"]), 0);
    }

    #[test]
    fn contains_any_ignores_case() {
        assert!(contains_any("deploy/K8S/app.YAML", INFRA_FILE_MARKERS));
        assert!(!contains_any("src/lib.rs", INFRA_FILE_MARKERS));
    }
}
