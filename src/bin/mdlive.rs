use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use mdlive::catalog::BlockCatalog;
use mdlive::config::{EditorConfig, config_file_path};
use mdlive::dragdrop::{DropController, DropSurface, InsertionMode, Rect, SnapPolicy};
use mdlive::format::{FormatCommand, FormatToggleEngine};
use mdlive::preview::{LayoutMetrics, PreviewLayout};
use mdlive::sourceedit::SourceSurface;
use mdlive::text::{Point, Selection, TextWindow};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "mdlive")]
#[command(about = "Format toggling and block insertion for markdown files", long_about = None)]
struct Args {
    /// Config file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Show the formats active at a position
    State {
        file: PathBuf,
        /// Selection start (UTF-16 offset)
        #[arg(long)]
        at: usize,
        /// Selection end, defaults to a caret
        #[arg(long)]
        to: Option<usize>,
    },
    /// Toggle a format (bold, italic, underline, strikethrough, align-*, uppercase, lowercase)
    Toggle {
        file: PathBuf,
        format: FormatCommand,
        #[arg(long)]
        at: usize,
        #[arg(long)]
        to: Option<usize>,
        /// Write the result back instead of printing it
        #[arg(long)]
        write: bool,
    },
    /// Insert a content block as if dropped at an offset
    Insert {
        file: PathBuf,
        /// Block label, e.g. "divider" or "section-title"
        block: String,
        #[arg(long)]
        at: usize,
        /// line or direct
        #[arg(long)]
        mode: Option<InsertionMode>,
        #[arg(long)]
        write: bool,
    },
    /// Resolve a pointer position to an insertion point
    Resolve {
        file: PathBuf,
        #[arg(long, allow_hyphen_values = true)]
        y: i32,
        #[arg(long, default_value = "10")]
        x: i32,
        /// line, structural or tertile
        #[arg(long)]
        policy: Option<SnapPolicy>,
        #[arg(long, default_value = "800")]
        width: i32,
        #[arg(long, default_value = "600")]
        height: i32,
    },
    /// List the content blocks
    Blocks,
}

fn load_config(path: Option<&Path>) -> EditorConfig {
    match path.map(Path::to_path_buf).or_else(config_file_path) {
        Some(path) => {
            debug!(path = %path.display(), "loading config");
            EditorConfig::load_or_default(&path)
        }
        None => EditorConfig::default(),
    }
}

fn read_document(file: &Path) -> Result<String> {
    fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))
}

fn selection(at: usize, to: Option<usize>) -> Selection {
    Selection::new(at, to.unwrap_or(at))
}

fn emit(file: &Path, text: &str, write: bool) -> Result<()> {
    if write {
        fs::write(file, text).with_context(|| format!("failed to write {}", file.display()))
    } else {
        print!("{}", text);
        Ok(())
    }
}

fn cmd_state(config: &EditorConfig, file: &Path, sel: Selection) -> Result<()> {
    let text = read_document(file)?;
    let engine = FormatToggleEngine::new(config.scan, config.placeholder.clone());
    let state = engine.detect_active_formats(text.as_str(), sel);
    println!("{}", state);
    Ok(())
}

fn cmd_toggle(
    config: &EditorConfig,
    file: &Path,
    command: FormatCommand,
    sel: Selection,
    write: bool,
) -> Result<()> {
    let text = read_document(file)?;
    let engine = FormatToggleEngine::new(config.scan, config.placeholder.clone());
    match engine.toggle_format(text.as_str(), sel, command) {
        Some(outcome) => {
            eprintln!(
                "{:?}: selection {}..{}",
                outcome.action,
                outcome.selection.from(),
                outcome.selection.to()
            );
            emit(file, &outcome.edit.apply_to(&text), write)
        }
        None => {
            eprintln!("{} changed nothing", command);
            emit(file, &text, write)
        }
    }
}

fn cmd_insert(
    config: &EditorConfig,
    file: &Path,
    block: &str,
    at: usize,
    mode: InsertionMode,
    write: bool,
) -> Result<()> {
    let text = read_document(file)?;
    let catalog = BlockCatalog::standard(&config.catalog.sample_text);
    let block = catalog
        .find(block)
        .ok_or_else(|| anyhow!("unknown block '{}', see `mdlive blocks`", block))?;

    let (edit, caret) = mdlive::dragdrop::plan_drop(text.as_str(), at, &block.insert_text, mode);
    eprintln!("inserted at {}, caret {}", edit.from, caret);
    emit(file, &edit.apply_to(&text), write)
}

fn cmd_resolve(
    file: &Path,
    point: Point,
    policy: SnapPolicy,
    (width, height): (i32, i32),
) -> Result<()> {
    if width <= 0 || height <= 0 {
        bail!("surface size must be positive, got {}x{}", width, height);
    }
    let text = read_document(file)?;
    let bounds = Rect::new(0, 0, width, height);

    let surface: Box<dyn DropSurface> = match policy {
        SnapPolicy::Line => Box::new(SourceSurface::new(0, 0, width, height).with_text(&text)),
        SnapPolicy::Structural | SnapPolicy::Tertile => Box::new(PreviewLayout::from_markdown(
            &text,
            bounds,
            LayoutMetrics::default(),
        )),
    };

    let mut controller = DropController::for_policy(policy, InsertionMode::default());
    match controller.drag_over(surface.as_ref(), point) {
        Some(indicator) => println!("offset {} y {}", indicator.offset, indicator.y),
        None => println!("unresolved"),
    }
    Ok(())
}

fn cmd_blocks(config: &EditorConfig) {
    let catalog = BlockCatalog::standard(&config.catalog.sample_text);
    for block in catalog.blocks() {
        println!("{:<14} {}", block.slug(), block.description);
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("MDLIVE_LOG").unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    match args.command {
        Commands::State { file, at, to } => cmd_state(&config, &file, selection(at, to)),
        Commands::Toggle {
            file,
            format,
            at,
            to,
            write,
        } => cmd_toggle(&config, &file, format, selection(at, to), write),
        Commands::Insert {
            file,
            block,
            at,
            mode,
            write,
        } => cmd_insert(
            &config,
            &file,
            &block,
            at,
            mode.unwrap_or(config.drop.mode),
            write,
        ),
        Commands::Resolve {
            file,
            y,
            x,
            policy,
            width,
            height,
        } => cmd_resolve(
            &file,
            Point::new(x, y),
            policy.unwrap_or(config.drop.snap),
            (width, height),
        ),
        Commands::Blocks => {
            cmd_blocks(&config);
            Ok(())
        }
    }
}
