//! Document tree engine.
//!
//! # Responsibility
//! - Locate and transform blocks anywhere in a nested block sequence by id.
//!
//! # Invariants
//! - Every operation is pure: the input slice is never modified and a new
//!   tree is returned.
//! - Lookups are depth-first pre-order over the whole tree, never a
//!   single-level scan, because block ids are unique tree-wide.
//! - Operations targeting an id that no longer exists return the tree
//!   unchanged instead of failing.

use crate::model::block::{Block, BlockId, BlockMetadata, BlockPatch};

/// Index path from the top level down to one block.
type BlockPath = Vec<usize>;

/// Finds the first block with `id`, searching children recursively in
/// document order.
pub fn find_by_id(tree: &[Block], id: BlockId) -> Option<&Block> {
    for block in tree {
        if block.id == id {
            return Some(block);
        }
        if let Some(found) = find_by_id(&block.children, id) {
            return Some(found);
        }
    }
    None
}

/// Nesting depth of `id`, with top-level blocks at depth 0.
pub fn depth_of(tree: &[Block], id: BlockId) -> Option<usize> {
    locate(tree, id).map(|path| path.len() - 1)
}

/// All block ids in pre-order.
pub fn block_ids(tree: &[Block]) -> Vec<BlockId> {
    let mut ids = Vec::new();
    collect_ids(tree, &mut ids);
    ids
}

/// Returns a tree where the block matching `id` has `patch` merged into it.
pub fn update_by_id(tree: &[Block], id: BlockId, patch: &BlockPatch) -> Vec<Block> {
    let mut next = tree.to_vec();
    if let Some(path) = locate(&next, id) {
        block_at_mut(&mut next, &path).apply(patch);
    }
    next
}

/// Inserts `new_block` as the sibling right after `after_id`.
///
/// A `None` or unresolved `after_id` appends to the top level. A block whose
/// id already exists in the tree is not inserted.
pub fn insert_after(tree: &[Block], after_id: Option<BlockId>, new_block: Block) -> Vec<Block> {
    let mut next = tree.to_vec();
    if contains_any(&next, &new_block) {
        return next;
    }

    match after_id.and_then(|id| locate(&next, id)) {
        Some(path) => {
            let (parent_path, index) = split_path(&path);
            siblings_mut(&mut next, parent_path).insert(index + 1, new_block);
        }
        None => next.push(new_block),
    }
    next
}

/// Removes the block matching `id` together with its subtree.
pub fn delete_by_id(tree: &[Block], id: BlockId) -> Vec<Block> {
    let mut next = tree.to_vec();
    if let Some(path) = locate(&next, id) {
        let (parent_path, index) = split_path(&path);
        siblings_mut(&mut next, parent_path).remove(index);
    }
    next
}

/// Moves the block matching `id` one level deeper (`delta > 0`) or up to
/// `|delta|` levels shallower (`delta < 0`).
///
/// Indenting makes the block the last child of its preceding sibling and is
/// limited to one level per call; a first child cannot be indented.
/// Outdenting places the block right after its former parent and stops at
/// the top level. List-style blocks in the moved subtree get their `indent`
/// metadata rewritten to the new depth.
pub fn set_indent(tree: &[Block], id: BlockId, delta: i32) -> Vec<Block> {
    let mut next = tree.to_vec();
    let Some(mut path) = locate(&next, id) else {
        return next;
    };

    let mut moved = false;
    if delta > 0 {
        let (parent_path, index) = split_path(&path);
        if index > 0 {
            let parent_path = parent_path.to_vec();
            let siblings = siblings_mut(&mut next, &parent_path);
            let block = siblings.remove(index);
            let new_parent = &mut siblings[index - 1];
            new_parent.children.push(block);
            path = parent_path;
            path.push(index - 1);
            path.push(new_parent.children.len() - 1);
            moved = true;
        }
    } else {
        for _ in 0..delta.unsigned_abs() {
            if path.len() < 2 {
                break;
            }
            let (parent_path, index) = split_path(&path);
            let parent_path = parent_path.to_vec();
            let block = siblings_mut(&mut next, &parent_path).remove(index);

            let (grandparent_path, parent_index) = split_path(&parent_path);
            let grandparent_path = grandparent_path.to_vec();
            siblings_mut(&mut next, &grandparent_path).insert(parent_index + 1, block);
            path = grandparent_path;
            path.push(parent_index + 1);
            moved = true;
        }
    }

    if moved {
        let depth = path.len() - 1;
        reindent(block_at_mut(&mut next, &path), depth);
    }
    next
}

fn locate(tree: &[Block], id: BlockId) -> Option<BlockPath> {
    for (index, block) in tree.iter().enumerate() {
        if block.id == id {
            return Some(vec![index]);
        }
        if let Some(mut path) = locate(&block.children, id) {
            path.insert(0, index);
            return Some(path);
        }
    }
    None
}

fn collect_ids(tree: &[Block], ids: &mut Vec<BlockId>) {
    for block in tree {
        ids.push(block.id);
        collect_ids(&block.children, ids);
    }
}

fn contains_any(tree: &[Block], candidate: &Block) -> bool {
    block_ids(std::slice::from_ref(candidate))
        .into_iter()
        .any(|id| find_by_id(tree, id).is_some())
}

// Paths come from `locate` and are never empty.
fn split_path(path: &[usize]) -> (&[usize], usize) {
    match path.split_last() {
        Some((index, parent_path)) => (parent_path, *index),
        None => (path, 0),
    }
}

fn siblings_mut<'a>(tree: &'a mut Vec<Block>, parent_path: &[usize]) -> &'a mut Vec<Block> {
    let mut level = tree;
    for &index in parent_path {
        level = &mut level[index].children;
    }
    level
}

fn block_at_mut<'a>(tree: &'a mut Vec<Block>, path: &[usize]) -> &'a mut Block {
    let (parent_path, index) = split_path(path);
    &mut siblings_mut(tree, parent_path)[index]
}

fn reindent(block: &mut Block, depth: usize) {
    if block.kind.is_list_style() {
        block.apply(&BlockPatch::metadata(BlockMetadata {
            indent: Some(u32::try_from(depth).unwrap_or(u32::MAX)),
            ..BlockMetadata::default()
        }));
    }
    for child in &mut block.children {
        reindent(child, depth + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::{
        block_ids, delete_by_id, depth_of, find_by_id, insert_after, set_indent, update_by_id,
    };
    use crate::model::block::{Block, BlockPatch, BlockType};

    fn item(content: &str) -> Block {
        let mut block = Block::new(BlockType::ListItem);
        block.content = content.to_string();
        block
    }

    #[test]
    fn find_reaches_nested_descendants() {
        let deep = item("deep");
        let deep_id = deep.id;
        let tree = vec![
            Block::default_paragraph(),
            Block::new(BlockType::BulletList)
                .with_children(vec![item("a").with_children(vec![deep])]),
        ];

        let found = find_by_id(&tree, deep_id).expect("nested block should be found");
        assert_eq!(found.content, "deep");
        assert_eq!(depth_of(&tree, deep_id), Some(2));
    }

    #[test]
    fn update_keeps_shape_and_other_blocks() {
        let first = item("first");
        let second = item("second");
        let second_id = second.id;
        let tree = vec![first, second];

        let next = update_by_id(&tree, second_id, &BlockPatch::content("changed"));
        assert_eq!(block_ids(&next), block_ids(&tree));
        assert_eq!(next[0], tree[0]);
        assert_eq!(next[1].content, "changed");
        assert_eq!(tree[1].content, "second");
    }

    #[test]
    fn update_unknown_id_is_noop() {
        let tree = vec![item("only")];
        let next = update_by_id(&tree, uuid::Uuid::new_v4(), &BlockPatch::content("x"));
        assert_eq!(next, tree);
    }

    #[test]
    fn insert_after_nested_block_stays_at_its_depth() {
        let child = item("child");
        let child_id = child.id;
        let tree = vec![Block::new(BlockType::BulletList).with_children(vec![child, item("tail")])];

        let inserted = item("new");
        let inserted_id = inserted.id;
        let next = insert_after(&tree, Some(child_id), inserted);

        assert_eq!(next[0].children.len(), 3);
        assert_eq!(next[0].children[1].id, inserted_id);
        assert_eq!(depth_of(&next, inserted_id), Some(1));
    }

    #[test]
    fn insert_without_anchor_or_with_stale_anchor_appends_top_level() {
        let tree = vec![item("a")];
        let appended = item("b");
        let appended_id = appended.id;
        let next = insert_after(&tree, None, appended);
        assert_eq!(next.last().map(|b| b.id), Some(appended_id));

        let stale = item("c");
        let stale_id = stale.id;
        let next = insert_after(&next, Some(uuid::Uuid::new_v4()), stale);
        assert_eq!(next.len(), 3);
        assert_eq!(next[2].id, stale_id);
    }

    #[test]
    fn insert_rejects_duplicate_id() {
        let existing = item("a");
        let tree = vec![existing.clone()];
        let next = insert_after(&tree, None, existing);
        assert_eq!(next, tree);
    }

    #[test]
    fn delete_round_trips_insert() {
        let anchor = item("anchor");
        let anchor_id = anchor.id;
        let tree = vec![
            Block::new(BlockType::NumberedList).with_children(vec![anchor, item("z")]),
            Block::default_paragraph(),
        ];
        let new_block = item("temp");
        let new_id = new_block.id;

        let inserted = insert_after(&tree, Some(anchor_id), new_block.clone());
        assert_eq!(find_by_id(&inserted, new_id), Some(&new_block));
        assert_eq!(delete_by_id(&inserted, new_id), tree);
    }

    #[test]
    fn delete_removes_subtree_and_may_empty_tree() {
        let parent = Block::new(BlockType::BulletList).with_children(vec![item("a")]);
        let child_id = parent.children[0].id;
        let parent_id = parent.id;
        let tree = vec![parent];

        let next = delete_by_id(&tree, parent_id);
        assert!(next.is_empty());
        assert!(find_by_id(&next, child_id).is_none());
    }

    #[test]
    fn indent_moves_under_previous_sibling_and_sets_metadata() {
        let first = item("first");
        let second = item("second");
        let first_id = first.id;
        let second_id = second.id;
        let tree = vec![first, second];

        let next = set_indent(&tree, second_id, 3);
        assert_eq!(next.len(), 1);
        assert_eq!(next[0].id, first_id);
        assert_eq!(next[0].children[0].id, second_id);
        assert_eq!(next[0].children[0].indent(), 1);
    }

    #[test]
    fn indent_first_child_is_noop() {
        let first = item("first");
        let first_id = first.id;
        let tree = vec![first, item("second")];
        assert_eq!(set_indent(&tree, first_id, 1), tree);
    }

    #[test]
    fn outdent_places_block_after_parent_and_clamps_at_top() {
        let nested = item("nested");
        let nested_id = nested.id;
        let parent = item("parent").with_children(vec![nested.with_children(vec![item("leaf")])]);
        let parent_id = parent.id;
        let tree = vec![parent, item("after")];

        let next = set_indent(&tree, nested_id, -5);
        assert_eq!(next.len(), 3);
        assert_eq!(next[0].id, parent_id);
        assert!(next[0].children.is_empty());
        assert_eq!(next[1].id, nested_id);
        assert_eq!(next[1].indent(), 0);
        assert_eq!(next[1].children[0].indent(), 1);
    }

    #[test]
    fn outdent_top_level_block_is_noop() {
        let top = item("top");
        let top_id = top.id;
        let tree = vec![top];
        assert_eq!(set_indent(&tree, top_id, -1), tree);
    }

    #[test]
    fn indent_does_not_touch_paragraph_metadata() {
        let anchor = Block::default_paragraph();
        let moved = Block::default_paragraph();
        let moved_id = moved.id;
        let next = set_indent(&[anchor, moved], moved_id, 1);
        assert_eq!(next[0].children[0].metadata, None);
    }
}
