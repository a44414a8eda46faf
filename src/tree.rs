//! Causal tree builder.
//!
//! Groups a flat batch of audit records into a forest using the related-to
//! header, then walks it depth-first in pre-order with siblings ordered by
//! `(time_sent, processed_at)`.
//!
//! ## Resilience
//!
//! - A record whose parent is not in the batch becomes a root (orphan).
//! - Records on or below a causality cycle are unreachable from any root.
//!   Starting from the first such record in input order, ancestors are
//!   followed until one repeats; that cycle member is cut from its parent
//!   and promoted to a root. This repeats until every record is reachable,
//!   so records hanging off a cycle keep their parent.
//! - Cut roots are walked after all other roots, in the order they are cut.
//!
//! Roots are walked in input order; only siblings are time-sorted.

use std::collections::HashMap;

use crate::headers;
use crate::options::CreatorOptions;
use crate::types::StoredMessage;

/// Effective causal parent id of a record: the related-to header, falling
/// back to the record's `related_to_message_id` field.
pub fn parent_id<'a>(message: &'a StoredMessage, options: &CreatorOptions) -> Option<&'a str> {
    headers::find(&message.headers, headers::RELATED_TO, &options.header_prefix)
        .or(message.related_to_message_id.as_deref())
}

/// Forest of causally related messages over a borrowed batch.
#[derive(Debug, Clone)]
pub struct MessageForest<'a> {
    messages: &'a [StoredMessage],
    parents: Vec<Option<usize>>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

/// One record visited by [`Walk`].
#[derive(Debug, Clone, Copy)]
pub struct WalkStep<'a> {
    /// The visited record.
    pub message: &'a StoredMessage,
    /// Resolved causal parent, `None` for roots (including orphans).
    pub parent: Option<&'a StoredMessage>,
    /// Distance from the root of its tree.
    pub depth: usize,
}

impl<'a> WalkStep<'a> {
    /// Whether this record starts a tree.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

impl<'a> MessageForest<'a> {
    /// Build the forest for a batch.
    pub fn build(messages: &'a [StoredMessage], options: &CreatorOptions) -> Self {
        let mut index: HashMap<&str, usize> = HashMap::with_capacity(messages.len());
        for (i, message) in messages.iter().enumerate() {
            index.entry(message.message_id.as_str()).or_insert(i);
        }

        let mut parents = vec![None; messages.len()];
        let mut children: Vec<Vec<usize>> = vec![Vec::new(); messages.len()];
        let mut roots = Vec::new();

        for (i, message) in messages.iter().enumerate() {
            match parent_id(message, options) {
                Some(pid) => match index.get(pid) {
                    Some(&p) => {
                        parents[i] = Some(p);
                        children[p].push(i);
                    }
                    None => {
                        tracing::warn!(
                            message_id = %message.message_id,
                            related_to = %pid,
                            "Parent message not in batch, treating as root"
                        );
                        roots.push(i);
                    }
                },
                None => roots.push(i),
            }
        }

        let mut reached = vec![false; messages.len()];
        for &root in &roots {
            mark_reachable(root, &children, &mut reached);
        }

        for i in 0..messages.len() {
            if reached[i] {
                continue;
            }
            let cut = cycle_member(i, &parents);
            if let Some(p) = parents[cut].take() {
                children[p].retain(|&c| c != cut);
                tracing::warn!(
                    message_id = %messages[cut].message_id,
                    related_to = %messages[p].message_id,
                    "Causality cycle detected, cutting record into a root"
                );
            }
            roots.push(cut);
            mark_reachable(cut, &children, &mut reached);
        }

        for siblings in &mut children {
            siblings.sort_by_key(|&c| (messages[c].time_sent, messages[c].processed_at));
        }

        tracing::debug!(
            records = messages.len(),
            roots = roots.len(),
            "Built message forest"
        );

        Self {
            messages,
            parents,
            children,
            roots,
        }
    }

    /// Number of records in the forest.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the forest is empty.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Root records in walk order.
    pub fn roots(&self) -> impl Iterator<Item = &'a StoredMessage> + '_ {
        self.roots.iter().map(move |&r| &self.messages[r])
    }

    /// Resolved parent of the record at `index` in the input batch.
    pub fn parent_of(&self, index: usize) -> Option<&'a StoredMessage> {
        self.parents
            .get(index)
            .copied()
            .flatten()
            .map(|p| &self.messages[p])
    }

    /// Children of the record at `index`, in sibling order.
    pub fn children_of(&self, index: usize) -> impl Iterator<Item = &'a StoredMessage> + '_ {
        self.children
            .get(index)
            .into_iter()
            .flatten()
            .map(move |&c| &self.messages[c])
    }

    /// Walk every record exactly once: roots in order, each tree pre-order.
    pub fn walk(&self) -> Walk<'_, 'a> {
        Walk {
            forest: self,
            roots: self.roots.iter(),
            stack: Vec::new(),
        }
    }
}

fn mark_reachable(start: usize, children: &[Vec<usize>], reached: &mut [bool]) {
    let mut stack = vec![start];
    while let Some(node) = stack.pop() {
        if reached[node] {
            continue;
        }
        reached[node] = true;
        stack.extend(children[node].iter().copied());
    }
}

/// First repeated ancestor when climbing from an unreached record.
///
/// An unreached record has no root above it, so the climb always closes a
/// cycle. A missing parent ends the climb at the current record.
fn cycle_member(start: usize, parents: &[Option<usize>]) -> usize {
    let mut seen = vec![false; parents.len()];
    let mut node = start;
    loop {
        if seen[node] {
            return node;
        }
        seen[node] = true;
        match parents[node] {
            Some(p) => node = p,
            None => return node,
        }
    }
}

/// Lazy pre-order traversal of a [`MessageForest`].
#[derive(Debug)]
pub struct Walk<'f, 'a> {
    forest: &'f MessageForest<'a>,
    roots: std::slice::Iter<'f, usize>,
    stack: Vec<(usize, usize)>,
}

impl<'f, 'a> Iterator for Walk<'f, 'a> {
    type Item = WalkStep<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.stack.is_empty() {
            let &root = self.roots.next()?;
            self.stack.push((root, 0));
        }

        let (node, depth) = self.stack.pop()?;
        // Reversed so the earliest sibling is popped first.
        self.stack.extend(
            self.forest.children[node]
                .iter()
                .rev()
                .map(|&c| (c, depth + 1)),
        );

        Some(WalkStep {
            message: &self.forest.messages[node],
            parent: self.forest.parent_of(node),
            depth,
        })
    }
}
