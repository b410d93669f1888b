use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Front matter as authored. Every field is optional and type errors in one
/// field degrade to its default instead of rejecting the whole block.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(default)]
pub struct FrontMatter {
    #[serde(deserialize_with = "lenient_string")]
    pub title: Option<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub date: Option<String>,
    #[serde(deserialize_with = "lenient_tags")]
    pub tags: Vec<String>,
    #[serde(deserialize_with = "lenient_string")]
    pub summary: Option<String>,
}

fn scalar_to_string(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(scalar_to_string(Value::deserialize(deserializer)?))
}

/// Only a sequence counts as tags; a bare string or map yields no tags.
fn lenient_tags<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(items.into_iter().filter_map(scalar_to_string).collect()),
        _ => Ok(Vec::new()),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PostMeta {
    pub slug: String,
    pub title: String,
    pub date: String,
    pub tags: Vec<String>,
    pub summary: String,
}

impl PostMeta {
    pub fn from_front_matter(slug: &str, front_matter: FrontMatter) -> Self {
        Self {
            slug: slug.to_string(),
            title: front_matter.title.unwrap_or_else(|| slug.to_string()),
            date: front_matter.date.unwrap_or_default(),
            tags: front_matter.tags,
            summary: front_matter.summary.unwrap_or_default(),
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Post {
    #[serde(flatten)]
    pub meta: PostMeta,
    pub content: String,
    pub html: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_fall_back_to_slug_and_empty_values() {
        let meta = PostMeta::from_front_matter("first-steps", FrontMatter::default());

        assert_eq!(meta.title, "first-steps");
        assert_eq!(meta.date, "");
        assert!(meta.tags.is_empty());
        assert_eq!(meta.summary, "");
    }

    #[test]
    fn post_serializes_flat() {
        let post = Post {
            meta: PostMeta::from_front_matter("a", FrontMatter::default()),
            content: "hi".into(),
            html: "<p>hi</p>\n".into(),
        };
        let json = serde_json::to_value(&post).unwrap();

        assert_eq!(json["slug"], "a");
        assert_eq!(json["title"], "a");
        assert_eq!(json["html"], "<p>hi</p>\n");
    }
}
