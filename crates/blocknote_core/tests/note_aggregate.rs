use blocknote_core::{BlockType, Note, NoteError};

#[test]
fn groceries_scenario() {
    let note = Note::create("u1", "Groceries").unwrap();
    assert_eq!(note.owner_id, "u1");
    assert_eq!(note.document.len(), 1);
    let first = &note.document[0];
    assert_eq!(first.kind, BlockType::Paragraph);
    assert!(first.content.is_empty());

    let note = note.insert_block_after(Some(first.id), BlockType::Todo);
    assert_eq!(note.document.len(), 2);
    let second = &note.document[1];
    assert_eq!(second.kind, BlockType::Todo);
    assert!(second.content.is_empty());
    assert!(!second.is_checked());

    let toggled = note.toggle_todo(second.id).unwrap();
    assert!(toggled.document[1].is_checked());
    assert!(toggled.updated_at > note.updated_at);
    assert_eq!(toggled.created_at, note.created_at);
}

#[test]
fn heading_conversion_only_applies_to_paragraphs() {
    let note = Note::create("u1", "Outline").unwrap();
    let paragraph_id = note.document[0].id;

    let note = note.edit_block(paragraph_id, "## Section");
    let heading = note.block(paragraph_id).unwrap();
    assert_eq!(heading.kind, BlockType::Heading);
    assert_eq!(heading.content, "Section");
    assert_eq!(heading.heading_level(), 2);

    // Already a heading: no re-classification and no demotion.
    let note = note.edit_block(paragraph_id, "### Deeper");
    let heading = note.block(paragraph_id).unwrap();
    assert_eq!(heading.kind, BlockType::Heading);
    assert_eq!(heading.content, "### Deeper");
    assert_eq!(heading.heading_level(), 2);

    let note = note.edit_block(paragraph_id, "plain");
    assert_eq!(note.block(paragraph_id).unwrap().kind, BlockType::Heading);
}

#[test]
fn deleting_sole_block_leaves_one_default_paragraph() {
    let note = Note::create("u1", "Scratch").unwrap();
    let note = note.edit_block(note.document[0].id, "something");
    let deleted = note.delete_block(note.document[0].id);

    assert_eq!(deleted.document.len(), 1);
    assert_eq!(deleted.document[0].kind, BlockType::Paragraph);
    assert!(deleted.document[0].content.is_empty());
    assert!(deleted.document[0].metadata.is_none());
    assert!(deleted.document[0].children.is_empty());
}

#[test]
fn toggle_on_paragraph_is_invalid_operation() {
    let note = Note::create("u1", "Tasks").unwrap();
    let err = note.toggle_todo(note.document[0].id).unwrap_err();
    assert!(matches!(err, NoteError::InvalidOperation { operation: "toggle", .. }));
}

#[test]
fn list_items_inserted_after_nested_item_share_its_indent() {
    let note = Note::create("u1", "Lists").unwrap();
    let (note, list) = note.insert_block_after_with_id(None, BlockType::BulletList);
    let (note, first) = note.insert_block_after_with_id(Some(list), BlockType::ListItem);
    let note = note.indent_block(first, 1).unwrap();
    let (note, sibling) = note.insert_block_after_with_id(Some(first), BlockType::ListItem);

    let list_block = note.block(list).unwrap();
    assert_eq!(list_block.children.len(), 2);
    assert_eq!(list_block.children[1].id, sibling);
    assert_eq!(note.block(sibling).unwrap().indent(), 1);
    assert!(note.validate().is_ok());
}
