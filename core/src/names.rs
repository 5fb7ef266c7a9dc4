//! Flag name derivation and display quoting.
//!
//! Field identifiers are written in mixed case (`DryRun`); flags use the
//! lowercase hyphenated form (`dry-run`).
//!
//! # Examples
//!
//! ```
//! use flagtree_core::{flag_name, quote};
//!
//! assert_eq!(flag_name("DryRun"), "dry-run");
//! assert_eq!(quote(r#"say "hi""#), r#""say \"hi\"""#);
//! ```

/// Returns `true` if the identifier starts with an uppercase letter.
///
/// Only such identifiers are eligible for flag derivation.
pub fn is_exported(identifier: &str) -> bool {
    identifier.chars().next().is_some_and(char::is_uppercase)
}

/// Converts a mixed-case identifier into a lowercase hyphenated flag name.
///
/// A hyphen is inserted at each transition from a non-uppercase character to
/// an uppercase one. Runs of uppercase letters are kept together, and no
/// hyphen is ever placed before the first character.
///
/// ```
/// use flagtree_core::flag_name;
///
/// assert_eq!(flag_name("DryRun"), "dry-run");
/// assert_eq!(flag_name("IntFlag"), "int-flag");
/// assert_eq!(flag_name("URL"), "url");
/// assert_eq!(flag_name(&flag_name("DryRun")), "dry-run");
/// ```
pub fn flag_name(identifier: &str) -> String {
    let mut out = String::with_capacity(identifier.len() + 2);
    let mut last_upper = true;
    for c in identifier.chars() {
        let upper = c.is_uppercase();
        if upper && !last_upper {
            out.push('-');
        }
        last_upper = upper;
        if upper {
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

/// Wraps a string in double quotes, escaping backslashes and double quotes.
///
/// Used to render default values in help text; the result is meant for
/// display, not for feeding back into the flag parser.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        if c == '\\' || c == '"' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn unquote(s: &str) -> Option<String> {
        let inner = s.strip_prefix('"')?.strip_suffix('"')?;
        let mut out = String::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                out.push(chars.next()?);
            } else {
                out.push(c);
            }
        }
        Some(out)
    }

    #[test]
    fn test_flag_name() {
        assert_eq!(flag_name("DryRun"), "dry-run");
        assert_eq!(flag_name("S"), "s");
        assert_eq!(flag_name("Sub2"), "sub2");
        assert_eq!(flag_name("MaxHTTPConns"), "max-httpconns");
    }

    #[test]
    fn test_is_exported() {
        assert!(is_exported("Name"));
        assert!(!is_exported("name"));
        assert!(!is_exported(""));
        assert!(!is_exported("_Name"));
    }

    #[test]
    fn test_quote() {
        assert_eq!(quote(""), "\"\"");
        assert_eq!(quote("a"), "\"a\"");
        assert_eq!(quote("\""), "\"\\\"\"");
        assert_eq!(quote("a\\b"), "\"a\\\\b\"");
    }

    proptest! {
        #[test]
        fn flag_name_is_idempotent(id in "[A-Z][A-Za-z0-9]{0,16}") {
            let once = flag_name(&id);
            prop_assert_eq!(flag_name(&once), once);
        }

        #[test]
        fn quote_round_trips(s in any::<String>()) {
            prop_assert_eq!(unquote(&quote(&s)), Some(s));
        }
    }
}
