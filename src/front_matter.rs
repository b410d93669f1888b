use gray_matter::{engine::YAML, Matter};
use tracing::warn;

use crate::models::FrontMatter;

const DELIMITER: &str = "---";

/// Splits a post source into its front matter and markdown body.
///
/// Never fails: a file without front matter, or with front matter that is not
/// valid YAML, yields default fields. An opening `---` with no closing line
/// makes the rest of the file front matter and the body empty. `origin` only
/// feeds the log line.
pub fn parse_post_source(raw: &str, origin: &str) -> (FrontMatter, String) {
    let closed;
    let source = if is_unclosed(raw) {
        closed = format!("{}\n{DELIMITER}\n", raw.trim_end());
        closed.as_str()
    } else {
        raw
    };

    let matter = Matter::<YAML>::new();
    match matter.parse::<FrontMatter>(source) {
        Ok(parsed) => (parsed.data.unwrap_or_default(), parsed.content),
        Err(e) => {
            warn!("Failed to parse front matter in {}: {}", origin, e);
            (FrontMatter::default(), strip_front_matter(source).to_string())
        }
    }
}

fn is_unclosed(raw: &str) -> bool {
    let first_line = raw.lines().next().unwrap_or_default();
    first_line.trim_end() == DELIMITER && strip_front_matter(raw) == raw
}

/// Body of `raw` with a leading `---` block removed, if a closing delimiter exists.
fn strip_front_matter(raw: &str) -> &str {
    let Some(rest) = raw.strip_prefix(DELIMITER) else {
        return raw;
    };
    let mut offset = 0;
    for line in rest.split_inclusive('\n') {
        offset += line.len();
        if offset > line.len() && line.trim_end() == DELIMITER {
            return rest[offset..].trim_start_matches(['\r', '\n']);
        }
    }
    raw
}
