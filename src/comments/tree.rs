use std::collections::{HashMap, HashSet};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::constants::MAX_COMMENT_DEPTH;
use crate::models::{AuthorSummary, Comment, CommentNode};

/// Stored comments that cannot form a valid reply tree.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TreeError {
    #[error("comment {0} is part of a reply cycle")]
    Cycle(Uuid),

    #[error("reply chain through comment {0} is deeper than {1} levels")]
    TooDeep(Uuid, usize),

    #[error("comment {0} was stored more than once")]
    DuplicateId(Uuid),
}

/// Nested view of every comment on one post.
///
/// Built from a flat, creation-ordered list in a single pass: comments are grouped
/// by parent id, then each top-level comment's subtree is assembled from the groups.
/// A comment whose parent no longer exists is promoted to top level.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommentTree {
    roots: Vec<CommentNode>,
    len: usize,
}

impl CommentTree {
    pub fn build(
        comments: Vec<Comment>,
        authors: &HashMap<Uuid, AuthorSummary>,
    ) -> Result<Self, TreeError> {
        Self::build_with_limit(comments, authors, MAX_COMMENT_DEPTH)
    }

    /// Like `build`, with an explicit cap on nesting depth (top-level is depth 0).
    pub fn build_with_limit(
        comments: Vec<Comment>,
        authors: &HashMap<Uuid, AuthorSummary>,
        max_depth: usize,
    ) -> Result<Self, TreeError> {
        let len = comments.len();
        let mut known = HashSet::with_capacity(len);
        for comment in &comments {
            if !known.insert(comment.id) {
                return Err(TreeError::DuplicateId(comment.id));
            }
        }

        let parents: HashMap<Uuid, Option<Uuid>> =
            comments.iter().map(|c| (c.id, c.parent_id)).collect();

        let mut top_level = Vec::new();
        let mut children: HashMap<Uuid, Vec<Comment>> = HashMap::new();
        for comment in comments {
            match comment.parent_id {
                Some(parent_id) if known.contains(&parent_id) => {
                    children.entry(parent_id).or_default().push(comment);
                }
                Some(parent_id) => {
                    warn!(comment_id = %comment.id, parent_id = %parent_id, "Parent comment missing, showing reply at top level");
                    top_level.push(comment);
                }
                None => top_level.push(comment),
            }
        }

        let mut path = HashSet::new();
        let mut roots = Vec::with_capacity(top_level.len());
        for comment in top_level {
            roots.push(assemble(comment, 0, max_depth, &mut children, authors, &mut path)?);
        }

        // Anything left over hangs off a loop of parent pointers that never reaches the top.
        if let Some(stranded) = children.values().flatten().next() {
            return Err(TreeError::Cycle(find_cycle_member(stranded.id, &parents)));
        }

        Ok(Self { roots, len })
    }

    pub fn roots(&self) -> &[CommentNode] {
        &self.roots
    }

    pub fn into_roots(self) -> Vec<CommentNode> {
        self.roots
    }

    /// Total number of comments in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Depth-first walk yielding `(depth, node)`. Each call starts a fresh walk.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            stack: self.roots.iter().rev().map(|node| (0, node)).collect(),
        }
    }

    pub fn find(&self, comment_id: Uuid) -> Option<&CommentNode> {
        self.iter()
            .map(|(_, node)| node)
            .find(|node| node.comment.id == comment_id)
    }
}

impl<'a> IntoIterator for &'a CommentTree {
    type Item = (usize, &'a CommentNode);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Pre-order traversal over a `CommentTree`.
pub struct Iter<'a> {
    stack: Vec<(usize, &'a CommentNode)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (usize, &'a CommentNode);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack
            .extend(node.replies.iter().rev().map(|reply| (depth + 1, reply)));
        Some((depth, node))
    }
}

fn assemble(
    comment: Comment,
    depth: usize,
    max_depth: usize,
    children: &mut HashMap<Uuid, Vec<Comment>>,
    authors: &HashMap<Uuid, AuthorSummary>,
    path: &mut HashSet<Uuid>,
) -> Result<CommentNode, TreeError> {
    if depth >= max_depth {
        return Err(TreeError::TooDeep(comment.id, max_depth));
    }
    if !path.insert(comment.id) {
        return Err(TreeError::Cycle(comment.id));
    }

    let mut replies = Vec::new();
    for reply in children.remove(&comment.id).unwrap_or_default() {
        replies.push(assemble(reply, depth + 1, max_depth, children, authors, path)?);
    }
    path.remove(&comment.id);

    let author = authors
        .get(&comment.author_id)
        .cloned()
        .unwrap_or_else(|| AuthorSummary::deleted(comment.author_id));

    Ok(CommentNode {
        comment,
        author,
        replies,
    })
}

/// Follows parent pointers from `start` until one repeats and returns the repeated id.
fn find_cycle_member(start: Uuid, parents: &HashMap<Uuid, Option<Uuid>>) -> Uuid {
    let mut seen = HashSet::new();
    let mut current = start;
    while seen.insert(current) {
        match parents.get(&current).copied().flatten() {
            Some(parent) => current = parent,
            None => break,
        }
    }
    current
}

/// Depth of `comment_id` within `comments`, counted in parent hops to a top-level comment.
///
/// A missing parent ends the walk, matching how `CommentTree` promotes such replies.
pub fn depth_of(comment_id: Uuid, comments: &[Comment], max_depth: usize) -> Result<usize, TreeError> {
    let parents: HashMap<Uuid, Option<Uuid>> =
        comments.iter().map(|c| (c.id, c.parent_id)).collect();

    let mut visited = HashSet::new();
    let mut current = comment_id;
    let mut depth = 0;
    while let Some(Some(parent)) = parents.get(&current) {
        if !visited.insert(current) {
            return Err(TreeError::Cycle(current));
        }
        if !parents.contains_key(parent) {
            break;
        }
        depth += 1;
        if depth >= max_depth {
            return Err(TreeError::TooDeep(comment_id, max_depth));
        }
        current = *parent;
    }
    Ok(depth)
}

/// Ids of `root_id` and every reply below it, parents before children.
pub fn subtree_ids(root_id: Uuid, comments: &[Comment]) -> Vec<Uuid> {
    let mut children: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for comment in comments {
        if let Some(parent_id) = comment.parent_id {
            children.entry(parent_id).or_default().push(comment.id);
        }
    }

    let mut seen = HashSet::new();
    let mut ordered = Vec::new();
    let mut queue = std::collections::VecDeque::from([root_id]);
    while let Some(id) = queue.pop_front() {
        if !seen.insert(id) {
            continue;
        }
        ordered.push(id);
        if let Some(replies) = children.get(&id) {
            queue.extend(replies.iter().copied());
        }
    }
    ordered
}
