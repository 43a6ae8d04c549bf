pub const MAX_POST_TITLE_LENGTH: usize = 200;
pub const MAX_POST_CONTENT_LENGTH: usize = 50_000;
pub const MAX_COMMENT_CONTENT_LENGTH: usize = 10_000;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Number of nesting levels a reply chain may span. Top-level comments are depth 0,
/// so the deepest reply sits at `MAX_COMMENT_DEPTH - 1`.
///
/// Nested reads and their JSON rendering recurse once per level on a worker
/// thread's stack; keep this well inside what a 2 MiB debug-build stack can take.
pub const MAX_COMMENT_DEPTH: usize = 100;
