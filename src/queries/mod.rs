// Repository functions over the blog schema. Handlers borrow a pooled
// connection and compose these; derived counts (likes, comments, tag
// usage) are computed per call and never persisted.

pub mod comments;
pub mod posts;
pub mod tags;

/// Positional placeholder list (`?, ?, ...`) for IN clauses.
fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}
