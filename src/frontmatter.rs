//! YAML frontmatter handling for lintrun's markdown config files.

/// Split a markdown document into its YAML frontmatter and body.
///
/// Returns `(None, content)` when the document does not open with a `---`
/// fence or the closing fence is missing.
pub fn split_frontmatter(content: &str) -> (Option<String>, &str) {
    let content = content.trim_start();

    if !content.starts_with("---") {
        return (None, content);
    }

    let after_first = &content[3..];
    match after_first.find("\n---") {
        Some(end) => {
            let frontmatter = after_first[..end].to_string();
            let body = after_first[end + 4..].trim_start();
            (Some(frontmatter), body)
        }
        None => (None, content),
    }
}

/// Wrap a YAML document in frontmatter fences followed by a body.
pub fn with_frontmatter(yaml: &str, body: &str) -> String {
    let yaml = yaml.trim_end();
    if body.is_empty() {
        format!("---\n{}\n---\n", yaml)
    } else {
        format!("---\n{}\n---\n\n{}\n", yaml, body.trim_end())
    }
}
