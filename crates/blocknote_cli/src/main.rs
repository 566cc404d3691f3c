//! BlockNote CLI
//!
//! Command-line transport over the note service. Every command acts as the
//! user given by `--as` and prints the resulting note as wire JSON.

use anyhow::{Context, Result};
use blocknote_core::db::open_db;
use blocknote_core::{Block, BlockType, NoteService, SqliteNoteRepository};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;
use uuid::Uuid;

mod config;

use config::Settings;

#[derive(Parser)]
#[command(name = "blocknote")]
#[command(about = "Block-structured notes")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    settings: Settings,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a note with one empty paragraph
    Create {
        /// Note title
        title: String,
    },
    /// Show one note
    Show { note: Uuid },
    /// List your notes, most recently updated first
    #[command(alias = "ls")]
    List {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// List public notes of every user
    ListPublic {
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Change a note title
    Rename { note: Uuid, title: String },
    /// Commit new text into a block
    Edit {
        note: Uuid,
        block: Uuid,
        content: String,
    },
    /// Insert an empty block after another block (or at the end)
    Insert {
        note: Uuid,
        /// Block type (paragraph|heading|todo|bullet-list|numbered-list|list-item)
        #[arg(value_parser = parse_block_type)]
        kind: BlockType,
        /// Anchor block; appends to the top level when omitted
        #[arg(long)]
        after: Option<Uuid>,
    },
    /// Delete a block and its children
    DeleteBlock { note: Uuid, block: Uuid },
    /// Flip a todo block
    Toggle { note: Uuid, block: Uuid },
    /// Nest (+1) or un-nest (-N) a list block
    Indent {
        note: Uuid,
        block: Uuid,
        #[arg(allow_hyphen_values = true)]
        delta: i32,
    },
    /// Make a note readable by everyone
    Publish { note: Uuid },
    /// Make a note private again
    Unpublish { note: Uuid },
    /// Replace a note document with a JSON array of blocks
    Import { note: Uuid, file: PathBuf },
    /// Delete a note
    #[command(alias = "rm")]
    Delete { note: Uuid },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    cli.settings.init_logging()?;

    let db_path = cli.settings.db_path();
    let conn = open_db(db_path)
        .with_context(|| format!("failed to open database `{}`", db_path.display()))?;
    let repo = SqliteNoteRepository::try_new(&conn)?;
    let mut service = NoteService::new(repo);

    let output = run(&mut service, &cli.settings.actor, cli.command)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run(
    service: &mut NoteService<SqliteNoteRepository<'_>>,
    actor: &str,
    command: Commands,
) -> Result<serde_json::Value> {
    info!("event=cli_command module=cli status=start");
    let value = match command {
        Commands::Create { title } => serde_json::to_value(service.create_note(actor, &title)?)?,
        Commands::Show { note } => serde_json::to_value(service.get_note(actor, note)?)?,
        Commands::List { limit, offset } => {
            serde_json::to_value(service.list_own_notes(actor, limit, offset)?.items)?
        }
        Commands::ListPublic { limit, offset } => {
            serde_json::to_value(service.list_public_notes(limit, offset)?.items)?
        }
        Commands::Rename { note, title } => {
            serde_json::to_value(service.rename_note(actor, note, &title)?)?
        }
        Commands::Edit {
            note,
            block,
            content,
        } => serde_json::to_value(service.edit_block(actor, note, block, &content)?)?,
        Commands::Insert { note, kind, after } => {
            let (note, block_id) = service.insert_block_after(actor, note, after, kind)?;
            serde_json::json!({ "blockId": block_id, "note": note })
        }
        Commands::DeleteBlock { note, block } => {
            serde_json::to_value(service.delete_block(actor, note, block)?)?
        }
        Commands::Toggle { note, block } => {
            serde_json::to_value(service.toggle_todo(actor, note, block)?)?
        }
        Commands::Indent { note, block, delta } => {
            serde_json::to_value(service.indent_block(actor, note, block, delta)?)?
        }
        Commands::Publish { note } => {
            serde_json::to_value(service.set_visibility(actor, note, true)?)?
        }
        Commands::Unpublish { note } => {
            serde_json::to_value(service.set_visibility(actor, note, false)?)?
        }
        Commands::Import { note, file } => {
            let raw = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read `{}`", file.display()))?;
            let document: Vec<Block> = serde_json::from_str(&raw)
                .with_context(|| format!("`{}` is not a JSON block array", file.display()))?;
            serde_json::to_value(service.replace_document(actor, note, document)?)?
        }
        Commands::Delete { note } => {
            service.delete_note(actor, note)?;
            serde_json::json!({ "deleted": note })
        }
    };
    info!("event=cli_command module=cli status=ok");
    Ok(value)
}

fn parse_block_type(value: &str) -> Result<BlockType, String> {
    BlockType::parse(value).ok_or_else(|| {
        format!(
            "unknown block type `{value}`; expected \
             paragraph|heading|todo|bullet-list|numbered-list|list-item"
        )
    })
}
