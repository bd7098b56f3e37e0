use std::path::PathBuf;

/// Longest single path segment we emit, leaving room for the extension
/// within common filesystem name limits.
const MAX_SEGMENT_BYTES: usize = 240;

const UNTITLED: &str = "untitled";

/// Title with spaces turned into underscores; `/` keeps nesting articles in
/// sub-directories.
///
/// Empty, `.` and `..` segments are dropped so the result always stays below
/// the output root, and control characters are replaced. An empty result
/// becomes `untitled`.
pub fn article_slug(title: &str) -> String {
    let slug = title
        .replace(' ', "_")
        .split('/')
        .filter(|segment| !matches!(*segment, "" | "." | ".."))
        .map(sanitize_segment)
        .collect::<Vec<_>>()
        .join("/");
    if slug.is_empty() {
        UNTITLED.to_string()
    } else {
        slug
    }
}

/// Relative path of the article file for a slug: `a/b` becomes `a/b.md`.
pub fn article_relative_path(slug: &str) -> PathBuf {
    let mut path: PathBuf = slug.split('/').collect();
    let file_name = match path.file_name() {
        Some(name) => format!("{}.md", name.to_string_lossy()),
        None => format!("{UNTITLED}.md"),
    };
    path.set_file_name(file_name);
    path
}

fn sanitize_segment(segment: &str) -> String {
    let mut cleaned: String = segment
        .chars()
        .map(|c| if c.is_control() || c == '\\' { '_' } else { c })
        .collect();
    if cleaned.len() > MAX_SEGMENT_BYTES {
        let mut end = MAX_SEGMENT_BYTES;
        while !cleaned.is_char_boundary(end) {
            end -= 1;
        }
        cleaned.truncate(end);
    }
    cleaned
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_segments_are_cut_on_char_boundaries() {
        let title = "é".repeat(200);
        let slug = article_slug(&title);
        assert!(slug.len() <= MAX_SEGMENT_BYTES);
        assert!(slug.chars().all(|c| c == 'é'));
    }

    #[test]
    fn control_characters_are_replaced() {
        assert_eq!(article_slug("a\tb\\c"), "a_b_c");
    }
}
