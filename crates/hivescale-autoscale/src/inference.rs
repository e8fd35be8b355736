//! Agent role inference from a task description.

use hivescale_core::AgentType;

/// Keyword → role table. Order breaks ties between equally long matches.
pub const TYPE_KEYWORDS: &[(&[&str], AgentType)] = &[
    (&["research", "analyze"], AgentType::Researcher),
    (&["test", "validation"], AgentType::Tester),
    (&["review", "quality"], AgentType::Reviewer),
    (&["architect", "design"], AgentType::Architect),
    (&["optimize", "performance"], AgentType::Optimizer),
];

/// Pick the role whose longest keyword appears in `description`.
///
/// Every keyword contained in the lower-cased description is a candidate;
/// the longest one wins and ties go to the earlier table row. Descriptions
/// matching nothing get [`AgentType::Coder`].
pub fn infer_agent_type(description: &str) -> AgentType {
    let text = description.to_lowercase();
    let mut best: Option<(usize, AgentType)> = None;

    for (keywords, agent_type) in TYPE_KEYWORDS {
        for keyword in keywords.iter().filter(|k| text.contains(**k)) {
            if best.is_none_or(|(len, _)| keyword.len() > len) {
                best = Some((keyword.len(), *agent_type));
            }
        }
    }

    best.map_or(AgentType::Coder, |(_, agent_type)| agent_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_coder() {
        assert_eq!(infer_agent_type(""), AgentType::Coder);
        assert_eq!(infer_agent_type("Implement the login form"), AgentType::Coder);
    }

    #[test]
    fn single_keyword_matches() {
        assert_eq!(infer_agent_type("Research caching options"), AgentType::Researcher);
        assert_eq!(infer_agent_type("Add input VALIDATION"), AgentType::Tester);
        assert_eq!(infer_agent_type("Code quality pass"), AgentType::Reviewer);
        assert_eq!(infer_agent_type("Optimize the hot loop"), AgentType::Optimizer);
    }

    #[test]
    fn longest_keyword_wins() {
        // "performance" (11) beats "test" (4)
        assert_eq!(infer_agent_type("test performance"), AgentType::Optimizer);
        // "architect" (9) beats "review" (6)
        assert_eq!(infer_agent_type("review the architecture"), AgentType::Architect);
    }

    #[test]
    fn equal_length_ties_go_to_earlier_row() {
        // "review" and "design" are both 6 characters
        assert_eq!(infer_agent_type("design review"), AgentType::Reviewer);
    }
}
