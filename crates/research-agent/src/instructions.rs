//! System instructions for the research agent.

const PREAMBLE: &str = "\
You are an expert researcher. Your job is to conduct thorough research, \
and then write a polished report.

You have access to an internet search tool as your primary means of \
gathering information.
";

/// How a tool is introduced to the model in the instructions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolDescription {
    /// Name of the tool, as the model calls it.
    pub name: String,
    /// When and how to use the tool.
    pub usage: String,
}

impl ToolDescription {
    /// Creates a tool description.
    #[inline]
    pub fn new<N: Into<String>, U: Into<String>>(name: N, usage: U) -> Self {
        Self {
            name: name.into(),
            usage: usage.into(),
        }
    }
}

/// Renders the system instructions: the researcher preamble followed by one
/// section per tool, in the given order.
pub fn render_instructions(tools: &[ToolDescription]) -> String {
    let mut instructions = PREAMBLE.to_owned();
    for tool in tools {
        instructions.push_str("\n## `");
        instructions.push_str(&tool.name);
        instructions.push_str("`\n\n");
        instructions.push_str(tool.usage.trim());
        instructions.push('\n');
    }
    instructions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::INTERNET_SEARCH_USAGE;

    #[test]
    fn test_internet_search_only() {
        let instructions = render_instructions(&[ToolDescription::new(
            "internet_search",
            INTERNET_SEARCH_USAGE,
        )]);
        let expected = "You are an expert researcher. Your job is to conduct \
thorough research, and then write a polished report.

You have access to an internet search tool as your primary means of gathering \
information.

## `internet_search`

Use this to run an internet search for a given query. You can specify the max \
number of results to return, the topic, and whether raw content should be \
included.
";
        assert_eq!(instructions, expected);
    }

    #[test]
    fn test_sections_keep_order() {
        let instructions = render_instructions(&[
            ToolDescription::new("zeta", "Last letter.\n"),
            ToolDescription::new("alpha", "First letter."),
        ]);
        let zeta = instructions.find("## `zeta`").unwrap();
        let alpha = instructions.find("## `alpha`").unwrap();
        assert!(zeta < alpha);
        assert!(instructions.ends_with("## `alpha`\n\nFirst letter.\n"));
        assert_eq!(render_instructions(&[]), PREAMBLE);
    }
}
