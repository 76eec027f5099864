//! Case-insensitive substring filter.

use crate::record::Command;

/// Keep every command whose text contains `query`, ignoring case.
///
/// Order is preserved, so a context-ranked input stays ranked. An empty or
/// whitespace-only query returns the input unchanged.
pub fn search(commands: &[Command], query: &str) -> Vec<Command> {
    if query.trim().is_empty() {
        return commands.to_vec();
    }

    let needle = query.to_lowercase();
    commands
        .iter()
        .filter(|cmd| cmd.text.to_lowercase().contains(&needle))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CommandContext, CommandSource};

    fn commands(texts: &[&str]) -> Vec<Command> {
        texts
            .iter()
            .enumerate()
            .map(|(i, text)| Command {
                index: i + 1,
                text: text.to_string(),
                timestamp: 1,
                context: CommandContext::default(),
                source: CommandSource::Unknown,
                context_boost: 0,
            })
            .collect()
    }

    #[test]
    fn test_empty_query_is_identity() {
        let cmds = commands(&["ls", "git status", "cargo build"]);
        assert_eq!(search(&cmds, ""), cmds);
        assert_eq!(search(&cmds, "   \t"), cmds);
    }

    #[test]
    fn test_case_insensitive_substring() {
        let cmds = commands(&["git status", "GIT PUSH", "cargo build", "echo Digit"]);
        let found: Vec<usize> = search(&cmds, "Git").iter().map(|c| c.index).collect();
        assert_eq!(found, vec![1, 2, 4]);
    }

    #[test]
    fn test_preserves_input_order() {
        let mut cmds = commands(&["make a", "make b", "make c"]);
        cmds.reverse();
        let found: Vec<usize> = search(&cmds, "make").iter().map(|c| c.index).collect();
        assert_eq!(found, vec![3, 2, 1]);
    }

    #[test]
    fn test_every_substring_matches_its_command() {
        let cmds = commands(&["docker compose up -d --Build"]);
        let text = &cmds[0].text;
        for start in 0..text.len() {
            for end in (start + 1)..=text.len() {
                let q = text[start..end].to_uppercase();
                if q.trim().is_empty() {
                    continue;
                }
                assert_eq!(search(&cmds, &q).len(), 1, "query {:?}", q);
            }
        }
    }

    #[test]
    fn test_contiguous_only() {
        let cmds = commands(&["git commit -m 'initial commit'"]);
        assert!(search(&cmds, "gcm").is_empty());
        assert_eq!(search(&cmds, "commit -m").len(), 1);
    }

    #[test]
    fn test_multiline_text() {
        let cmds = commands(&["for f in *; do\n  echo $f\ndone"]);
        assert_eq!(search(&cmds, "echo $F").len(), 1);
    }
}
