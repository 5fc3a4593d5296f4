//! Command-line editing front end for gape canvases.
//!
//! # Responsibility
//! - Run one editing session per invocation: load, mutate, save.
//! - Print layouts and save outcomes as text or JSON.

use clap::{Parser, Subcommand};
use gape_core::{
    init_logging, validate_block_data, Block, BlockData, BlockId, BlockType, CanvasService,
    CoreConfig, DragController, DragOutcome, DropTarget, FieldValue, LayoutStore, SaveReport,
    MIN_PRESENTED_COLUMNS,
    SqliteBlockRepository, SqliteCanvasRepository, SqliteTemplateRepository, SyncEngine,
    TemplateService,
};
use log::info;
use rusqlite::Connection;
use serde_json::json;
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

type CliResult<T> = Result<T, Box<dyn Error>>;

/// Fields tried in order when summarizing a block on one line.
const SUMMARY_FIELDS: &[&str] = &["name", "project", "institution", "title", "company"];

#[derive(Parser)]
#[command(name = "gape", about = "Edit block canvases from the terminal", version)]
struct Cli {
    /// SQLite database path (overrides GAPE_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List insertable block templates
    Templates,
    /// Create a canvas
    NewCanvas {
        #[arg(short, long)]
        user: String,
        #[arg(short, long, default_value = "")]
        name: String,
    },
    /// List a user's canvases
    Canvases {
        #[arg(short, long)]
        user: String,
    },
    /// Delete a canvas and all of its blocks
    DeleteCanvas { canvas: String },
    /// Print a canvas layout
    Show { canvas: String },
    /// Insert a block from its template into the shortest column
    Add {
        canvas: String,
        /// Block type, e.g. ProjectBlock_L
        block_type: String,
    },
    /// Drop a block onto a column (`column-<n>`) or onto a sibling block
    Drag {
        canvas: String,
        block: String,
        target: String,
        /// Rendered index of the sibling when dropping onto a block
        #[arg(long)]
        index: Option<usize>,
    },
    /// Move a block to an explicit column and final position
    Move {
        canvas: String,
        block: String,
        #[arg(long)]
        column: usize,
        #[arg(long)]
        position: Option<usize>,
    },
    /// Delete a block
    Delete { canvas: String, block: String },
    /// Redistribute all blocks across a column count
    Columns { canvas: String, count: usize },
    /// Replace text fields of a block (`key=value`, validated)
    Set {
        canvas: String,
        block: String,
        fields: Vec<String>,
        /// Remove fields instead of setting any
        #[arg(long)]
        unset: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> CliResult<()> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_ref() {
        init_logging(&config.log_level, log_dir)?;
    }
    let db_path = cli.db.clone().unwrap_or_else(|| config.db_path.clone());
    let conn = gape_core::open_db(&db_path)?;
    let json = cli.json;

    match cli.command {
        Commands::Templates => {
            let catalog = TemplateService::new(SqliteTemplateRepository::try_new(&conn)?).load();
            if let Some(err) = catalog.error() {
                return Err(err.to_string().into());
            }
            if json {
                println!("{}", serde_json::to_string_pretty(catalog.templates())?);
            } else {
                for template in catalog.templates() {
                    println!("{:>2}  {}", template.order_index, template.block_type);
                }
            }
        }
        Commands::NewCanvas { user, name } => {
            let canvas = canvas_service(&conn)?.create_canvas(&user, &name)?;
            if json {
                println!("{}", json!({ "id": canvas.id, "name": canvas.name }));
            } else {
                println!("{}  {}", canvas.id, canvas.name);
            }
        }
        Commands::Canvases { user } => {
            let canvases = canvas_service(&conn)?.list_canvases(&user)?;
            if json {
                let rows: Vec<_> = canvases
                    .iter()
                    .map(|canvas| {
                        json!({
                            "id": canvas.id,
                            "name": canvas.name,
                            "created_at": canvas.created_at,
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for canvas in canvases {
                    println!("{}  {}", canvas.id, canvas.name);
                }
            }
        }
        Commands::DeleteCanvas { canvas } => {
            canvas_service(&conn)?.delete_canvas(&canvas)?;
            println!("deleted {canvas}");
        }
        Commands::Show { canvas } => {
            let view = canvas_service(&conn)?.shared_view(&canvas)?;
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&json!({
                        "id": view.canvas().id,
                        "name": view.canvas().name,
                        "columns": view.columns(),
                    }))?
                );
            } else {
                println!("{} ({} blocks)", view.canvas().name, view.block_count());
                print_columns(view.columns());
            }
        }
        Commands::Add { canvas, block_type } => {
            let block_type = BlockType::parse(&block_type)
                .ok_or_else(|| format!("unknown block type `{block_type}`"))?;
            let catalog = TemplateService::new(SqliteTemplateRepository::try_new(&conn)?).load();
            let template = catalog
                .find(block_type)
                .ok_or_else(|| format!("no active template for {block_type}"))?
                .clone();
            edit(&conn, &canvas, config.default_column_count, json, |store| {
                let id = store.add_block(&template).ok_or("layout not loaded")?;
                println!("added {id}");
                Ok(true)
            })?;
        }
        Commands::Drag {
            canvas,
            block,
            target,
            index,
        } => {
            edit(&conn, &canvas, config.default_column_count, json, |store| {
                let mut drag = DragController::new();
                drag.begin(BlockId::from(block.as_str()));
                match drag.drop(store, DropTarget::parse(&target, index)) {
                    DragOutcome::Moved { .. } => Ok(true),
                    DragOutcome::Unchanged => Ok(false),
                    DragOutcome::Discarded => Err(format!("drop target `{target}` not resolvable").into()),
                }
            })?;
        }
        Commands::Move {
            canvas,
            block,
            column,
            position,
        } => {
            edit(&conn, &canvas, config.default_column_count, json, |store| {
                Ok(store.move_block(&BlockId::from(block.as_str()), column, position))
            })?;
        }
        Commands::Delete { canvas, block } => {
            edit(&conn, &canvas, config.default_column_count, json, |store| {
                Ok(store.delete_block(&BlockId::from(block.as_str())))
            })?;
        }
        Commands::Columns { canvas, count } => redistribute(&conn, &canvas, count, json)?,
        Commands::Set {
            canvas,
            block,
            fields,
            unset,
        } => {
            if fields.is_empty() && unset.is_empty() {
                return Err("nothing to set; pass key=value pairs or --unset".into());
            }
            let assignments = parse_assignments(&fields)?;
            edit(&conn, &canvas, config.default_column_count, json, |store| {
                let block_id = BlockId::from(block.as_str());
                let current = store
                    .layout()
                    .block(&block_id)
                    .ok_or_else(|| format!("block not found: {block_id}"))?;
                let mut data = current.data.clone();
                for key in &unset {
                    data.remove(key);
                }
                for (key, value) in &assignments {
                    data.insert(key.clone(), FieldValue::from(value.as_str()));
                }
                validate_block_data(current.block_type(), &data)?;
                Ok(store.update_block_data(&block_id, data))
            })?;
        }
    }
    Ok(())
}

fn canvas_service(
    conn: &Connection,
) -> CliResult<CanvasService<SqliteCanvasRepository<'_>, SqliteBlockRepository<'_>>> {
    Ok(CanvasService::new(
        SqliteCanvasRepository::try_new(conn)?,
        SqliteBlockRepository::try_new(conn)?,
    ))
}

/// Spreads a canvas over `count` columns.
///
/// The session opens without extra empty columns so a stored layout narrower
/// than `count` is always redistributed.
fn redistribute(conn: &Connection, canvas_id: &str, count: usize, json: bool) -> CliResult<()> {
    edit(conn, canvas_id, MIN_PRESENTED_COLUMNS, json, |store| {
        Ok(store.set_column_count(count))
    })
}

/// Loads `canvas_id` padded to `min_columns`, applies `mutate`, and saves
/// when it reports a change.
fn edit(
    conn: &Connection,
    canvas_id: &str,
    min_columns: usize,
    json: bool,
    mutate: impl FnOnce(&mut LayoutStore) -> CliResult<bool>,
) -> CliResult<()> {
    let mut store = canvas_service(conn)?.open_session(canvas_id, min_columns)?;
    if !mutate(&mut store)? {
        println!("no change");
        return Ok(());
    }

    let engine = SyncEngine::new(SqliteBlockRepository::try_new(conn)?, canvas_id);
    let report = engine.save(&mut store)?;
    info!("event=cli_edit module=cli status=ok revision={}", store.revision());
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "inserted": report.inserted,
                "updated": report.updated,
                "deleted": report.deleted,
                "unchanged": report.unchanged,
                "foreign_deletes": report.foreign_deletes,
                "columns": store.layout().to_snapshot().columns,
            }))?
        );
    } else {
        println!("{}", save_message(&report));
        print_columns(&store.layout().to_snapshot().columns);
    }
    Ok(())
}

fn save_message(report: &SaveReport) -> String {
    let mut message = format!(
        "saved ({} inserted, {} updated, {} unchanged)",
        report.inserted, report.updated, report.unchanged
    );
    if report.deleted > 0 {
        message.push_str(&format!(", {} blocks cleaned up", report.deleted));
    }
    if !report.foreign_deletes.is_empty() {
        message.push_str(&format!(
            "\nwarning: removed {} blocks saved by another session",
            report.foreign_deletes.len()
        ));
    }
    message
}

fn print_columns(columns: &[Vec<Block>]) {
    for (index, column) in columns.iter().enumerate() {
        println!("column-{index}");
        for block in column {
            println!("  {}  {:<18}  {}", block.id(), block.block_type().as_str(), summary(&block.data));
        }
    }
}

fn summary(data: &BlockData) -> &str {
    SUMMARY_FIELDS
        .iter()
        .find_map(|field| data.get(*field).and_then(FieldValue::as_text))
        .unwrap_or("")
}

fn parse_assignments(fields: &[String]) -> CliResult<Vec<(String, String)>> {
    fields
        .iter()
        .map(|field| -> CliResult<(String, String)> {
            let (key, value) = field
                .split_once('=')
                .ok_or_else(|| format!("expected key=value, got `{field}`"))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(format!("empty field name in `{field}`").into());
            }
            Ok((key.to_string(), value.to_string()))
        })
        .collect()
}
