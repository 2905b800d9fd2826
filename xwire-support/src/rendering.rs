//! Text rendering utilities for human-friendly error messages.
//!
//! Provides helpers to format resolution chains, resolution plans,
//! type names and "did you mean?" suggestions.

use std::fmt::Write as _;

/// Renders a resolution chain as a readable string.
///
/// # Examples
/// ```
/// use xwire_support::rendering::render_chain;
///
/// let chain = vec!["users", "dbcnx", "db_string"];
/// assert_eq!(render_chain(&chain), "users → dbcnx → db_string");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    chain
        .iter()
        .map(|s| s.as_ref())
        .collect::<Vec<_>>()
        .join(" → ")
}

/// Renders plan steps with their environment annotations.
///
/// ```text
/// [main      ] db_string
///              ↓
/// [main      ] dbcnx  (needs: db_string)
///              ↓
/// [fake_users] users
/// ```
pub fn render_plan_vertical(entries: &[PlanEntry]) -> String {
    let mut result = String::new();
    let width = entries
        .iter()
        .map(|e| e.environment.len())
        .max()
        .unwrap_or(0);

    for (i, entry) in entries.iter().enumerate() {
        if i > 0 {
            result.push_str(&" ".repeat(width + 3));
            result.push_str("↓\n");
        }

        let _ = write!(
            result,
            "[{:<width$}] {}",
            entry.environment,
            entry.name,
            width = width,
        );

        if !entry.dependencies.is_empty() {
            let _ = write!(result, "  (needs: {})", entry.dependencies.join(", "));
        }

        result.push('\n');
    }

    result
}

/// A single step of a resolution plan for vertical rendering.
#[derive(Debug)]
pub struct PlanEntry {
    /// Logical name being constructed
    pub name: String,
    /// Environment of the provider chosen for it
    pub environment: String,
    /// Declared dependency names
    pub dependencies: Vec<String>,
}

/// Shortens a fully qualified type name for display.
///
/// ```
/// use xwire_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("alloc::string::String"), "String");
/// assert_eq!(
///     shorten_type_name("alloc::vec::Vec<alloc::string::String>"),
///     "Vec<String>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut result = String::with_capacity(full_name.len());
    let mut chars = full_name.chars().peekable();
    let mut current_segment = String::new();

    while let Some(ch) = chars.next() {
        match ch {
            ':' if chars.peek() == Some(&':') => {
                chars.next();
                current_segment.clear();
            }
            '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&' => {
                result.push_str(&current_segment);
                result.push(ch);
                current_segment.clear();
            }
            _ => current_segment.push(ch),
        }
    }

    result.push_str(&current_segment);
    result
}

/// Suggests registered logical names close to the requested one.
///
/// Substring matches rank first, then names sharing a prefix of at
/// least three characters, then names within a small edit distance.
pub fn suggest_similar(
    requested: &str,
    available: &[&str],
    max_suggestions: usize,
) -> Vec<String> {
    let requested_lower = requested.to_lowercase();

    let mut scored: Vec<(&str, usize)> = available
        .iter()
        .filter(|&&name| name != requested)
        .filter_map(|&name| {
            let name_lower = name.to_lowercase();

            if name_lower.contains(&requested_lower) || requested_lower.contains(&name_lower) {
                return Some((name, 100));
            }

            let common = name_lower
                .chars()
                .zip(requested_lower.chars())
                .take_while(|(a, b)| a == b)
                .count();
            if common >= 3 {
                return Some((name, 50 + common));
            }

            let distance = edit_distance(&requested_lower, &name_lower);
            if distance <= 2 {
                return Some((name, 40 - distance));
            }

            None
        })
        .collect();

    scored.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    scored
        .into_iter()
        .take(max_suggestions)
        .map(|(name, _)| name.to_string())
        .collect()
}

/// Levenshtein distance over chars.
fn edit_distance(a: &str, b: &str) -> usize {
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();

    for (i, ca) in a.chars().enumerate() {
        let mut current = vec![i + 1; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            current[j + 1] = (prev[j] + cost).min(prev[j + 1] + 1).min(current[j] + 1);
        }
        prev = current;
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_simple_chain() {
        let chain = vec!["a", "b", "a"];
        assert_eq!(render_chain(&chain), "a → b → a");
    }

    #[test]
    fn render_single_element_chain() {
        assert_eq!(render_chain(&["users"]), "users");
    }

    #[test]
    fn render_empty_chain() {
        let chain: Vec<&str> = vec![];
        assert_eq!(render_chain(&chain), "");
    }

    #[test]
    fn shorten_with_generics() {
        assert_eq!(
            shorten_type_name(
                "std::collections::hash::map::HashMap<alloc::string::String, i64>"
            ),
            "HashMap<String, i64>"
        );
    }

    #[test]
    fn shorten_no_path() {
        assert_eq!(shorten_type_name("u32"), "u32");
    }

    #[test]
    fn suggest_typo() {
        let available = vec!["users", "payments", "dbcnx", "db_string"];
        let suggestions = suggest_similar("usres", &available, 3);
        assert_eq!(suggestions.first().map(String::as_str), Some("users"));
    }

    #[test]
    fn suggest_prefix() {
        let available = vec!["db_string", "dbcnx", "payments"];
        let suggestions = suggest_similar("db_url", &available, 3);
        assert!(suggestions.contains(&"db_string".to_string()));
        assert!(!suggestions.contains(&"payments".to_string()));
    }

    #[test]
    fn suggest_no_match() {
        let suggestions = suggest_similar("xyzzy", &["payments"], 3);
        assert!(suggestions.is_empty());
    }

    #[test]
    fn edit_distance_basics() {
        assert_eq!(edit_distance("users", "users"), 0);
        assert_eq!(edit_distance("users", "usres"), 2);
        assert_eq!(edit_distance("", "abc"), 3);
    }

    #[test]
    fn vertical_plan_rendering() {
        let entries = vec![
            PlanEntry {
                name: "db_string".to_string(),
                environment: "main".to_string(),
                dependencies: vec![],
            },
            PlanEntry {
                name: "users".to_string(),
                environment: "fake_users".to_string(),
                dependencies: vec!["db_string".to_string()],
            },
        ];

        let rendered = render_plan_vertical(&entries);
        assert!(rendered.contains("[main      ] db_string"));
        assert!(rendered.contains("[fake_users] users  (needs: db_string)"));
        assert!(rendered.contains("↓"));
    }
}
