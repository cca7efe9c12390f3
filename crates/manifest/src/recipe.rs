//! Parser for Chef-style package recipes.
//!
//! Handles the subset of the recipe DSL that declares packages:
//! ```text
//! # Boost
//! package "libboost1.48-all-dev" do
//!   action :install
//! end
//!
//! package "clang" do
//!   version "3.4"
//! end
//!
//! package "libkqueue0" do
//!   action :purge
//! end
//! ```
//! A missing `action` means `:install`. A comment line sets the group label
//! for the blocks that follow it.

use crate::error::{Error, Result};
use crate::types::{Entry, Format, Manifest};
use declarative::{DesiredState, ManifestRecord};

/// Parse recipe text into a manifest.
pub fn parse_string(content: &str) -> Result<Manifest> {
    let mut manifest = Manifest::new(Format::Recipe);
    let mut group: Option<String> = None;
    let mut open: Option<Block> = None;

    for (idx, raw) in content.lines().enumerate() {
        let line_num = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            continue;
        }

        if let Some(comment) = line.strip_prefix('#') {
            if open.is_none() {
                let label = comment.trim();
                group = (!label.is_empty()).then(|| label.to_string());
            }
            continue;
        }

        let (directive, rest) = split_directive(strip_comment(line));

        if directive == "end" {
            match open.take() {
                Some(block) => manifest.entries.push(block.finish(group.clone())?),
                None => return Err(parse_error(line_num, "`end` without a package block")),
            }
            continue;
        }

        match open.as_mut() {
            None => {
                if directive != "package" {
                    return Err(parse_error(
                        line_num,
                        format!("expected `package`, found `{directive}`"),
                    ));
                }
                let (name, rest) = extract_string(rest, line_num)?;
                let block = Block::new(name, line_num);
                match rest.trim() {
                    "do" => open = Some(block),
                    "" => manifest.entries.push(block.finish(group.clone())?),
                    other => {
                        return Err(parse_error(
                            line_num,
                            format!("unexpected `{other}` after package name"),
                        ));
                    }
                }
            }
            Some(block) => match directive {
                "action" => block.action = Some((parse_symbol(rest, line_num)?, line_num)),
                "version" => block.version = Some(extract_string(rest, line_num)?.0),
                "package" => {
                    return Err(parse_error(
                        line_num,
                        format!("package block for \"{}\" is not closed", block.name),
                    ));
                }
                other => {
                    log::debug!("line {line_num}: ignoring `{other}` in package block");
                }
            },
        }
    }

    if let Some(block) = open {
        return Err(parse_error(
            block.line,
            format!("package \"{}\" is missing `end`", block.name),
        ));
    }

    Ok(manifest)
}

/// A `package ... do` block being read
struct Block {
    name: String,
    line: usize,
    action: Option<(String, usize)>,
    version: Option<String>,
}

impl Block {
    fn new(name: String, line: usize) -> Self {
        Self {
            name,
            line,
            action: None,
            version: None,
        }
    }

    fn finish(self, group: Option<String>) -> Result<Entry> {
        let (action, action_line) = self
            .action
            .unwrap_or_else(|| ("install".to_string(), self.line));

        let state = match (action.as_str(), self.version) {
            ("install", Some(version)) => DesiredState::Pinned(version),
            ("install", None) => DesiredState::Installed,
            ("remove" | "purge", _) => DesiredState::Removed,
            (other, _) => {
                return Err(parse_error(
                    action_line,
                    format!(
                        "unsupported action :{other} for \"{}\" (expected :install, :remove or :purge)",
                        self.name
                    ),
                ));
            }
        };

        Ok(Entry {
            record: ManifestRecord::new(self.name, state.to_string()),
            group,
            line: Some(self.line),
        })
    }
}

fn parse_error(line: usize, message: impl Into<String>) -> Error {
    Error::RecipeParse {
        line,
        message: message.into(),
    }
}

/// Drop a trailing `# comment` that sits outside any quoted string.
fn strip_comment(line: &str) -> &str {
    let mut quote: Option<char> = None;
    let mut prev_space = false;

    for (i, c) in line.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') if prev_space => return line[..i].trim_end(),
            _ => {}
        }
        prev_space = c.is_whitespace();
    }

    line
}

/// Split the leading word from the rest of the line.
fn split_directive(line: &str) -> (&str, &str) {
    match line.split_once(char::is_whitespace) {
        Some((d, r)) => (d, r.trim()),
        None => (line, ""),
    }
}

/// Extract a quoted string from the start of `args`.
fn extract_string(args: &str, line_num: usize) -> Result<(String, &str)> {
    let args = args.trim();

    for quote in ['"', '\''] {
        if let Some(stripped) = args.strip_prefix(quote) {
            return match stripped.find(quote) {
                Some(end) => Ok((stripped[..end].to_string(), &stripped[end + 1..])),
                None => Err(parse_error(line_num, "unclosed quote")),
            };
        }
    }

    Err(parse_error(line_num, "expected a quoted string"))
}

/// Parse a Ruby symbol (`:install`) to its name.
fn parse_symbol(args: &str, line_num: usize) -> Result<String> {
    let symbol = args
        .trim()
        .strip_prefix(':')
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'))
        .ok_or_else(|| parse_error(line_num, format!("expected an action symbol, found `{args}`")))?;
    Ok(symbol.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEV_RECIPE: &str = r#"# Protocol Buffers
package "libprotobuf-dev" do
  action :install
end

package "protobuf-compiler" do
  action :install
end

# Boost
package "libboost1.48-all.dev" do
  action :install
end

package "libboost1.48-dbg" do
  action :install
end

package "libboost1.48-doc" do
  action :install
end

# libkqueue
package "libkqueue-dev" do
  action :install
end

package "libkqueue0" do
  action :install
end

# 0MQ
package "libzmq-dev" do
  action :install
end

package "libzmq-dbg" do
  action :install
end

package "libzmq1" do
  action :install
end

package "libssl-dev" do
  action :install
end

# Clang
package "clang" do
  action :install
end

# Make etc
package "build-essential" do
  action :install
end

package "make" do
  action :install
end

package "automake" do
  action :install
end

package "autoconf" do
  action :install
end
"#;

    fn states(manifest: &Manifest) -> Vec<(&str, &str)> {
        manifest
            .entries
            .iter()
            .map(|e| (e.record.name.as_str(), e.record.state.as_str()))
            .collect()
    }

    #[test]
    fn test_parse_dev_recipe() {
        let manifest = parse_string(DEV_RECIPE).unwrap();

        assert_eq!(manifest.len(), 16);
        assert_eq!(manifest.entries[0].name(), "libprotobuf-dev");
        assert_eq!(manifest.entries[15].name(), "autoconf");
        assert!(manifest.records().all(|r| r.state == "installed"));
        assert_eq!(manifest.to_specs().unwrap().len(), 16);
    }

    #[test]
    fn test_groups_follow_comments() {
        let manifest = parse_string(DEV_RECIPE).unwrap();

        assert_eq!(manifest.group_of("protobuf-compiler"), Some("Protocol Buffers"));
        assert_eq!(manifest.group_of("libboost1.48-doc"), Some("Boost"));
        // No comment between libzmq1 and libssl-dev
        assert_eq!(manifest.group_of("libssl-dev"), Some("0MQ"));
        assert_eq!(manifest.group_of("autoconf"), Some("Make etc"));
    }

    #[test]
    fn test_actions_and_versions() {
        let manifest = parse_string(
            r#"
package "clang" do
  action :install
  version "3.4"
end
package "libkqueue0" do
  action :remove
end
package 'libzmq-dbg' do
  action :purge
end
package "make" do
end
package "automake"
"#,
        )
        .unwrap();

        assert_eq!(
            states(&manifest),
            [
                ("clang", "pinned:3.4"),
                ("libkqueue0", "removed"),
                ("libzmq-dbg", "removed"),
                ("make", "installed"),
                ("automake", "installed"),
            ]
        );
        assert_eq!(manifest.entries[1].line, Some(6));
    }

    #[test]
    fn test_unsupported_action_names_line() {
        let err = parse_string("package \"clang\" do\n  action :upgrade\nend\n").unwrap_err();
        match err {
            Error::RecipeParse { line, message } => {
                assert_eq!(line, 2);
                assert!(message.contains(":upgrade"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_unclosed_block() {
        let err = parse_string("package \"make\" do\n  action :install\n").unwrap_err();
        assert!(matches!(err, Error::RecipeParse { line: 1, .. }));

        let err = parse_string("package \"a\" do\npackage \"b\" do\nend\n").unwrap_err();
        assert!(matches!(err, Error::RecipeParse { line: 2, .. }));
    }

    #[test]
    fn test_stray_end() {
        let err = parse_string("package \"make\"\nend\n").unwrap_err();
        assert!(matches!(err, Error::RecipeParse { line: 2, .. }));
    }

    #[test]
    fn test_unknown_top_level_directive() {
        let err = parse_string("execute \"apt-get update\"\n").unwrap_err();
        assert!(matches!(err, Error::RecipeParse { line: 1, .. }));
    }

    #[test]
    fn test_unclosed_quote() {
        let err = parse_string("package \"make do\nend\n").unwrap_err();
        assert!(err.to_string().contains("unclosed quote"));
    }

    #[test]
    fn test_other_attributes_ignored() {
        let manifest = parse_string(
            "package \"make\" do\n  options \"--no-install-recommends\"\n  action :install\nend\n",
        )
        .unwrap();
        assert_eq!(states(&manifest), [("make", "installed")]);
    }

    #[test]
    fn test_comment_inside_block_keeps_group() {
        let manifest =
            parse_string("# Build\npackage \"make\" do\n  # needed by autoconf\nend\n").unwrap();
        assert_eq!(manifest.group_of("make"), Some("Build"));
    }

    #[test]
    fn test_trailing_comments() {
        let manifest = parse_string(
            r#"
package "libzmq-dev" do # 0MQ headers
  action :install # needed by sawmill
  version "2.2#1" # hash inside quotes stays
end # libzmq-dev
package "make" # plain
"#,
        )
        .unwrap();

        assert_eq!(
            states(&manifest),
            [("libzmq-dev", "pinned:2.2#1"), ("make", "installed")]
        );
    }

    #[test]
    fn test_strip_comment() {
        assert_eq!(strip_comment("action :install # note"), "action :install");
        assert_eq!(strip_comment("version \"1 #2\""), "version \"1 #2\"");
        assert_eq!(strip_comment("package 'a#b' do"), "package 'a#b' do");
        assert_eq!(strip_comment("end"), "end");
    }

    #[test]
    fn test_empty_recipe() {
        assert!(parse_string("# nothing here\n\n").unwrap().is_empty());
    }
}
