//! Bullet-list rendering for merged summaries.

const BULLET: &str = "* ";

/// Re-split `summary` on periods and render each non-empty span as a bullet line.
pub fn to_bullets(summary: &str) -> String {
    summary
        .split('.')
        .map(str::trim)
        .filter(|span| !span.is_empty())
        .map(|span| format!("{BULLET}{span}"))
        .collect::<Vec<_>>()
        .join("\n")
}
