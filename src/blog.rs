use std::{
    cmp::Reverse,
    collections::{btree_map::Entry, BTreeMap},
    path::Path,
    sync::Arc,
};

use futures::future::try_join_all;
use tracing::{debug, warn};

use crate::content_store::ContentStore;
use crate::error::BlogError;
use crate::front_matter::parse_post_source;
use crate::helpers::parse_post_date;
use crate::markdown::render_markdown_to_html;
use crate::models::{Post, PostMeta};

/// Post file extensions, most preferred first.
pub const POST_EXTENSIONS: &[&str] = &["md", "mdx"];

/// Loads posts from a [`ContentStore`]. Nothing is cached; every call reads
/// the store again.
#[derive(Clone)]
pub struct BlogRepository {
    store: Arc<dyn ContentStore>,
}

impl BlogRepository {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    /// Every post, newest first. Posts without a parseable date come last.
    pub async fn list_all_posts(&self) -> Result<Vec<PostMeta>, BlogError> {
        let entries = self
            .store
            .list_entries()
            .await
            .map_err(|source| BlogError::ListEntries {
                path: self.store.describe(""),
                source,
            })?;

        let files = select_post_files(entries);
        debug!("Loading {} posts", files.len());

        let mut posts = try_join_all(
            files
                .iter()
                .map(|(slug, file_name)| self.load_meta(slug, file_name)),
        )
        .await?;

        // Stable sort on top of slug order, so ties stay alphabetical.
        posts.sort_by_cached_key(|post| Reverse(parse_post_date(&post.date)));
        Ok(posts)
    }

    pub async fn list_latest_posts(&self, limit: usize) -> Result<Vec<PostMeta>, BlogError> {
        let mut posts = self.list_all_posts().await?;
        posts.truncate(limit);
        Ok(posts)
    }

    /// Looks up one post. Unknown or unsafe slugs give `Ok(None)`.
    pub async fn get_post_by_slug(&self, slug: &str) -> Result<Option<Post>, BlogError> {
        if !is_safe_slug(slug) {
            warn!("Rejected unsafe post slug {:?}", slug);
            return Ok(None);
        }

        let Some(file_name) = self.resolve(slug).await else {
            debug!("No post file for slug {}", slug);
            return Ok(None);
        };

        let raw = self.read(&file_name).await?;
        let (front_matter, content) = parse_post_source(&raw, &file_name);
        let html = render_markdown_to_html(&content);

        Ok(Some(Post {
            meta: PostMeta::from_front_matter(slug, front_matter),
            content,
            html,
        }))
    }

    async fn resolve(&self, slug: &str) -> Option<String> {
        for ext in POST_EXTENSIONS {
            let candidate = format!("{slug}.{ext}");
            if self.store.exists(&candidate).await {
                return Some(candidate);
            }
        }
        None
    }

    async fn load_meta(&self, slug: &str, file_name: &str) -> Result<PostMeta, BlogError> {
        let raw = self.read(file_name).await?;
        let (front_matter, _) = parse_post_source(&raw, file_name);
        Ok(PostMeta::from_front_matter(slug, front_matter))
    }

    async fn read(&self, file_name: &str) -> Result<String, BlogError> {
        self.store
            .read_entry(file_name)
            .await
            .map_err(|source| BlogError::ReadEntry {
                path: self.store.describe(file_name),
                source,
            })
    }
}

/// Maps each slug to the file that wins the extension preference, ordered by slug.
fn select_post_files(entries: Vec<String>) -> BTreeMap<String, String> {
    // slug -> (extension rank, file name)
    let mut chosen: BTreeMap<String, (usize, String)> = BTreeMap::new();

    for name in entries {
        let path = Path::new(&name);
        let (Some(stem), Some(ext)) = (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) else {
            continue;
        };
        // Files that lookup could never reach are not listed either.
        if !is_safe_slug(stem) {
            continue;
        }
        let Some(rank) = POST_EXTENSIONS.iter().position(|candidate| *candidate == ext) else {
            continue;
        };

        let stem = stem.to_string();
        match chosen.entry(stem) {
            Entry::Vacant(slot) => {
                slot.insert((rank, name));
            }
            Entry::Occupied(mut slot) => {
                if rank < slot.get().0 {
                    slot.insert((rank, name));
                }
            }
        }
    }

    chosen
        .into_iter()
        .map(|(slug, (_, name))| (slug, name))
        .collect()
}

/// A slug must be a single, non-hidden path segment.
pub fn is_safe_slug(slug: &str) -> bool {
    !slug.is_empty()
        && !slug.starts_with('.')
        && !slug.contains("..")
        && !slug.contains(['/', '\\', '\0'])
}
