//! Fixed-column text tables for help output.

/// Renders rows with every column padded to its widest cell.
#[derive(Debug, Clone)]
pub struct Table {
    /// Written at the start of every row.
    pub prefix: String,
    /// Written between columns, after the padding.
    pub separator: String,
}

impl Default for Table {
    fn default() -> Self {
        Self {
            prefix: "  ".to_string(),
            separator: " ".to_string(),
        }
    }
}

impl Table {
    /// Renders `rows`, one line each. Trailing whitespace is trimmed.
    ///
    /// ```
    /// use flagtree_core::Table;
    ///
    /// let rows = vec![
    ///     vec!["build".to_string(), "compile".to_string()],
    ///     vec!["run".to_string(), "execute".to_string()],
    /// ];
    /// assert_eq!(Table::default().render(&rows), "  build compile\n  run   execute\n");
    /// ```
    pub fn render(&self, rows: &[Vec<String>]) -> String {
        let columns = rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns];
        for row in rows {
            for (i, cell) in row.iter().enumerate() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }

        let mut out = String::new();
        for row in rows {
            let mut line = self.prefix.clone();
            for (i, cell) in row.iter().enumerate() {
                if i > 0 {
                    let pad = widths[i - 1] - row[i - 1].chars().count();
                    line.push_str(&" ".repeat(pad));
                    line.push_str(&self.separator);
                }
                line.push_str(cell);
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_second_column() {
        let rows = vec![
            vec!["a".to_string(), String::new()],
            vec!["long".to_string(), "x".to_string()],
        ];
        assert_eq!(Table::default().render(&rows), "  a\n  long x\n");
    }

    #[test]
    fn test_custom_separator() {
        let table = Table {
            prefix: String::new(),
            separator: " | ".to_string(),
        };
        let rows = vec![vec!["k".to_string(), "v".to_string()]];
        assert_eq!(table.render(&rows), "k | v\n");
    }
}
