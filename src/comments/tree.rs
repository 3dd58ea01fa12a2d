// src/comments/tree.rs

use std::collections::HashMap;

use crate::comments::moderation::CommentState;
use crate::models::comment::{Comment, CommentNode};

/// Builds the rendered forest for one attachment from a flat list of
/// comments ordered by creation time (ties broken by id).
///
/// Roots get depth 0 and depth propagates outward from there. A node whose
/// parent is missing from the input (deleted, filtered out, or belonging to
/// another attachment) is promoted to an orphan root at depth 0 rather than
/// dropped, so surviving replies still render. Sibling order is insertion
/// order, which the caller's query guarantees is creation order.
pub fn build_forest(comments: &[Comment]) -> Vec<CommentNode> {
    let index: HashMap<i64, usize> = comments
        .iter()
        .enumerate()
        .map(|(i, c)| (c.id, i))
        .collect();

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); comments.len()];
    let mut roots: Vec<usize> = Vec::new();

    for (i, comment) in comments.iter().enumerate() {
        match comment.parent_id.and_then(|pid| index.get(&pid).copied()) {
            Some(parent) => children[parent].push(i),
            None => roots.push(i),
        }
    }

    roots
        .iter()
        .map(|&i| assemble(i, 0, comments, &children))
        .collect()
}

fn assemble(i: usize, depth: i32, comments: &[Comment], children: &[Vec<usize>]) -> CommentNode {
    let comment = &comments[i];
    CommentNode {
        id: comment.id,
        author_id: comment.author_id,
        content: comment.content.clone(),
        parent_id: comment.parent_id,
        depth,
        score: comment.score,
        state: comment.state.clone(),
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        children: children[i]
            .iter()
            .map(|&child| assemble(child, depth + 1, comments, children))
            .collect(),
    }
}

/// Drops removed comments that no longer shelter any surviving reply.
/// Removed nodes with live descendants stay in place as placeholders so
/// their subtrees keep their depth.
pub fn prune_removed(nodes: Vec<CommentNode>) -> Vec<CommentNode> {
    nodes
        .into_iter()
        .filter_map(|mut node| {
            node.children = prune_removed(node.children);
            if node.state == CommentState::Removed.as_str() && node.children.is_empty() {
                None
            } else {
                Some(node)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn comment(id: i64, parent_id: Option<i64>, state: &str) -> Comment {
        // created_at spaced by id so the fixture matches the query ordering
        let created = Utc::now() + Duration::seconds(id);
        Comment {
            id,
            author_id: 1,
            content: format!("comment {}", id),
            attachment_kind: parent_id.is_none().then(|| "post".to_string()),
            attachment_id: parent_id.is_none().then_some(10),
            root_id: parent_id.map(|_| 1),
            parent_id,
            state: state.to_string(),
            score: 0,
            created_at: created,
            updated_at: created,
        }
    }

    #[test]
    fn chain_gets_increasing_depths() {
        let comments = vec![
            comment(1, None, "visible"),
            comment(2, Some(1), "visible"),
            comment(3, Some(2), "visible"),
        ];
        let forest = build_forest(&comments);
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].depth, 0);
        assert_eq!(forest[0].children[0].depth, 1);
        assert_eq!(forest[0].children[0].children[0].depth, 2);
    }

    #[test]
    fn siblings_keep_creation_order() {
        let comments = vec![
            comment(1, None, "visible"),
            comment(2, Some(1), "visible"),
            comment(3, Some(1), "visible"),
            comment(4, Some(1), "visible"),
        ];
        let forest = build_forest(&comments);
        let ids: Vec<i64> = forest[0].children.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![2, 3, 4]);
    }

    #[test]
    fn node_with_missing_parent_becomes_orphan_root() {
        let comments = vec![
            comment(1, None, "visible"),
            // parent 99 is not part of the input set
            comment(2, Some(99), "visible"),
        ];
        let forest = build_forest(&comments);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].id, 2);
        assert_eq!(forest[1].depth, 0);
    }

    #[test]
    fn multiple_roots_form_a_forest() {
        let comments = vec![
            comment(1, None, "visible"),
            comment(2, None, "visible"),
            comment(3, Some(2), "visible"),
        ];
        let forest = build_forest(&comments);
        assert_eq!(forest.len(), 2);
        assert_eq!(forest[1].children.len(), 1);
    }

    #[test]
    fn removed_leaf_is_pruned() {
        let comments = vec![comment(1, None, "visible"), comment(2, Some(1), "removed")];
        let forest = prune_removed(build_forest(&comments));
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }

    #[test]
    fn removed_node_with_live_reply_stays_as_placeholder() {
        let comments = vec![
            comment(1, None, "removed"),
            comment(2, Some(1), "visible"),
        ];
        let forest = prune_removed(build_forest(&comments));
        assert_eq!(forest.len(), 1);
        assert_eq!(forest[0].state, "removed");
        assert_eq!(forest[0].children[0].id, 2);
        assert_eq!(forest[0].children[0].depth, 1);
    }

    #[test]
    fn removed_chain_without_survivors_disappears() {
        let comments = vec![
            comment(1, None, "visible"),
            comment(2, Some(1), "removed"),
            comment(3, Some(2), "removed"),
        ];
        let forest = prune_removed(build_forest(&comments));
        assert_eq!(forest.len(), 1);
        assert!(forest[0].children.is_empty());
    }
}
