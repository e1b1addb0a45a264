//! Template variable extraction.
//!
//! Text nodes reference upstream values with `{{name}}` placeholders. Every
//! distinct name becomes a target port on the node, so the order returned
//! here is also the vertical order of those ports.

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Extract the distinct variable names referenced by `text`.
///
/// A name is everything between a `{{` and the next `}}`, trimmed of
/// surrounding whitespace. Names are returned in order of first appearance
/// with duplicates removed. Empty names (`{{}}`, `{{  }}`) are discarded and
/// an unmatched `{{` yields no partial match.
///
/// A name never contains `}`; when one shows up before the closing
/// delimiter the scan resumes after that `{{`.
///
/// # Example
///
/// ```
/// use plumb_libs::template::extract_variables;
///
/// let vars = extract_variables("{{a}} and {{b}} and {{a}}");
/// assert_eq!(vars, vec!["a", "b"]);
/// ```
pub fn extract_variables(text: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    let mut rest = text;

    while let Some(start) = rest.find(OPEN) {
        let after_open = &rest[start + OPEN.len()..];

        let Some(end) = after_open.find('}') else {
            break;
        };

        if end == 0 || !after_open[end..].starts_with(CLOSE) {
            // `{{}` or `{{x}y`: no name here, retry from the next character
            rest = &rest[start + 1..];
            continue;
        }

        let name = after_open[..end].trim();
        if !name.is_empty() && !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }

        rest = &after_open[end + CLOSE.len()..];
    }

    names
}
