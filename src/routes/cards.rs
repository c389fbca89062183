//! Plain structs handed to the templates. Builders project annotated
//! query results into display shape; nothing here touches the database.

use crate::queries::comments::CommentEntry;
use crate::queries::posts::PostEntry;
use crate::queries::tags::TagEntry;

const TEASER_CHARS: usize = 200;

pub struct TagBadge {
    pub title: String,
    pub posts_with_tag: i64,
}

/// Listing card for a post: teaser text instead of the full body.
pub struct PostCard {
    pub title: String,
    pub teaser_text: String,
    pub author: String,
    pub comments_amount: i64,
    pub likes_amount: i64,
    pub image_url: Option<String>,
    pub published_at: String,
    pub slug: String,
    pub tags: Vec<TagBadge>,
    pub first_tag_title: String,
}

/// Full detail-page view of a post, comments included.
pub struct PostView {
    pub title: String,
    pub text: String,
    pub author: String,
    pub comments_amount: i64,
    pub likes_amount: i64,
    pub image_url: Option<String>,
    pub published_at: String,
    pub slug: String,
    pub tags: Vec<TagBadge>,
    pub comments: Vec<CommentView>,
}

pub struct CommentView {
    pub text: String,
    pub published_at: String,
    pub author: String,
}

pub fn tag_badge(entry: &TagEntry) -> TagBadge {
    TagBadge {
        title: entry.tag.title.clone(),
        posts_with_tag: entry.posts_with_tag,
    }
}

pub fn post_card(entry: &PostEntry) -> PostCard {
    let tags: Vec<TagBadge> = entry.tags.iter().map(tag_badge).collect();
    PostCard {
        title: entry.post.title.clone(),
        teaser_text: teaser(&entry.post.text),
        author: entry.author.clone().unwrap_or_default(),
        comments_amount: entry.comments_count,
        likes_amount: entry.likes_count,
        image_url: entry.post.image_url.clone(),
        published_at: entry.post.published_at.clone(),
        slug: entry.post.slug.clone(),
        first_tag_title: tags.first().map(|t| t.title.clone()).unwrap_or_default(),
        tags,
    }
}

pub fn post_view(entry: &PostEntry, comments: &[CommentEntry]) -> PostView {
    PostView {
        title: entry.post.title.clone(),
        text: entry.post.text.clone(),
        author: entry.author.clone().unwrap_or_default(),
        comments_amount: entry.comments_count,
        likes_amount: entry.likes_count,
        image_url: entry.post.image_url.clone(),
        published_at: entry.post.published_at.clone(),
        slug: entry.post.slug.clone(),
        tags: entry.tags.iter().map(tag_badge).collect(),
        comments: comments
            .iter()
            .map(|c| CommentView {
                text: c.comment.text.clone(),
                published_at: c.comment.published_at.clone(),
                author: c.author.clone(),
            })
            .collect(),
    }
}

/// Truncated prefix of the body shown in listings. Counts characters,
/// not bytes, so multibyte text never splits mid-character.
fn teaser(text: &str) -> String {
    text.chars().take(TEASER_CHARS).collect()
}
