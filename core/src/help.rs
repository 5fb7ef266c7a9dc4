//! Usage text for a resolved command chain.

use crate::command::Documentation;
use crate::flagset::FlagUsage;
use crate::table::Table;

/// What help needs to know about one level of the command chain.
#[derive(Debug, Clone, Default)]
pub struct LevelHelp {
    pub name: String,
    pub doc: Documentation,
    /// Registered flags, sorted by name, including the help flag.
    pub flags: Vec<FlagUsage>,
    /// The level's record derived at least one flag.
    pub has_options: bool,
}

impl LevelHelp {
    fn options_title(&self, index: usize, levels: usize) -> String {
        if index == 0 {
            "Global Options".to_string()
        } else if index + 1 == levels {
            "Options".to_string()
        } else {
            format!("{} Options", self.name)
        }
    }
}

/// Splits a back-quoted placeholder name out of a usage string:
/// "a `file` to read" yields `("file", "a file to read")`.
fn placeholder(flag: &FlagUsage) -> (String, String) {
    let usage = &flag.usage;
    if let Some(start) = usage.find('`') {
        if let Some(len) = usage[start + 1..].find('`') {
            let name = &usage[start + 1..start + 1 + len];
            let text = format!(
                "{}{}{}",
                &usage[..start],
                name,
                &usage[start + 1 + len + 1..]
            );
            return (name.to_string(), text);
        }
    }
    let name = if flag.is_bool { "" } else { "value" };
    (name.to_string(), usage.clone())
}

/// Renders one flag in the conventional two-line layout.
fn render_flag(flag: &FlagUsage) -> String {
    let mut line = format!("  -{}", flag.name);
    let (name, usage) = placeholder(flag);
    if !name.is_empty() {
        line.push(' ');
        line.push_str(&name);
    }
    if line.chars().count() <= 4 {
        line.push('\t');
    } else {
        line.push_str("\n    \t");
    }
    line.push_str(&usage.replace('\n', "\n    \t"));
    if let Some(default) = &flag.default {
        line.push_str(&format!(" (default {default})"));
    }
    line.push('\n');
    line
}

/// Renders help for the last level of `levels`. `children` lists the
/// subcommand names and short descriptions, sorted by name.
pub fn render_usage(levels: &[LevelHelp], children: &[(String, String)]) -> String {
    let mut out = String::new();

    if let Some(last) = levels.last() {
        let doc = &last.doc;
        if !doc.short.is_empty() {
            out.push_str(&doc.short);
            out.push('\n');
        }
        if !doc.long.is_empty() {
            out.push_str("\nDescription:\n");
            out.push_str(&doc.long);
            out.push('\n');
        }

        let mut line: Vec<&str> = Vec::new();
        for level in levels {
            line.push(&level.name);
            if level.has_options {
                line.push("[options]");
            }
        }
        if !children.is_empty() {
            line.push("<command>");
        }
        if !doc.usage_line.is_empty() {
            line.push(&doc.usage_line);
        }
        out.push_str("\nUsage:\n");
        out.push_str(&line.join(" "));
        out.push('\n');

        if !doc.examples.is_empty() {
            out.push_str("\nExamples:\n");
            for example in &doc.examples {
                out.push_str(example.trim());
                out.push('\n');
            }
        }
    }

    for (index, level) in levels.iter().enumerate().rev() {
        if !level.has_options {
            continue;
        }
        out.push('\n');
        out.push_str(&level.options_title(index, levels.len()));
        out.push_str(":\n");
        for flag in &level.flags {
            out.push_str(&render_flag(flag));
        }
    }

    if !children.is_empty() {
        out.push_str("\nAvailable Commands:\n");
        let rows: Vec<Vec<String>> = children
            .iter()
            .map(|(name, short)| vec![name.clone(), short.clone()])
            .collect();
        out.push_str(&Table::default().render(&rows));
    }

    out
}
