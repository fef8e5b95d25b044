// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// pagewerk — command-line front end for the page-operation engines.
//
// Each subcommand reads its inputs from disk, runs one engine, and writes
// the result. Errors are shown through `humanize_error` so the terminal
// gets the same wording as any other front end.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use pagewerk_core::human_errors::humanize_error;
use pagewerk_core::{EngineConfig, JobControl, PagewerkError, Rect, Result, RgbColor};
use pagewerk_document::batch::{self, BatchItem};
use pagewerk_document::split::{SplitWarning, remove_pages, split_with};
use pagewerk_document::{
    Bookmark, Document, MergeOptions, OperationQueue, PageRangeSpec, PageSelector, PiiCategory,
    Placement, Position, ProtectOptions, RedactOptions, RedactionRule, SplitMode, SplitOptions,
    SplitOutcome, WatermarkPayload, merge, organize, protect, range, redact, rotate, watermark,
};
use pagewerk_security::{
    AuditLog, EncryptionLevel, PermissionSet, PrintPermission, hash_bytes, verify_hash,
};

#[derive(Parser)]
#[command(name = "pagewerk")]
#[command(version)]
#[command(about = "Merge, split, organize, watermark, protect, and redact PDF files", long_about = None)]
struct Cli {
    /// Engine configuration (JSON)
    #[arg(long, global = true, value_name = "FILE", env = "PAGEWERK_CONFIG")]
    config: Option<PathBuf>,

    /// Password for encrypted inputs
    #[arg(long, global = true, value_name = "PASSWORD", env = "PAGEWERK_PASSWORD")]
    password: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Concatenate documents; append `@RANGE` to an input to take only those pages
    Merge {
        #[arg(value_name = "FILE[@RANGE]", required = true, num_args = 1..)]
        inputs: Vec<String>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,

        /// One bookmark per input file
        #[arg(long)]
        bookmarks: bool,

        /// Blank page between inputs
        #[arg(long)]
        separators: bool,

        /// Keep the first input's metadata
        #[arg(long)]
        keep_metadata: bool,

        #[arg(long)]
        title: Option<String>,
    },

    /// Divide a document into several files
    Split {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: PathBuf,

        #[command(flatten)]
        mode: SplitModeArgs,

        /// Drop blank pages first
        #[arg(long)]
        remove_blank: bool,

        /// Name parts `{prefix}-{n}.pdf`
        #[arg(long)]
        prefix: Option<String>,
    },

    /// Copy the given pages, in the given order, into a new file
    Extract {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Page range (e.g. "1-3,7", "odd")
        #[arg(value_name = "PAGES")]
        pages: String,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Delete the given pages
    Remove {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(value_name = "PAGES")]
        pages: String,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Apply a queue of page operations ("move:3:1,delete:2,rotate:1:90")
    Organize {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long, value_name = "OPS", conflicts_with = "ops_file", required_unless_present = "ops_file")]
        ops: Option<String>,

        /// Queue as JSON
        #[arg(long, value_name = "FILE")]
        ops_file: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Rotate pages clockwise by 90, 180, 270 or -90 degrees
    Rotate {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(short, long, allow_negative_numbers = true)]
        degrees: i32,

        /// Page range; all pages when omitted
        #[arg(long, value_name = "PAGES")]
        pages: Option<String>,

        /// Output file (single input) or directory (several inputs)
        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Stamp text or an image on pages
    Watermark {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(long, conflicts_with = "image", required_unless_present = "image")]
        text: Option<String>,

        /// PNG or JPEG
        #[arg(long, value_name = "FILE")]
        image: Option<PathBuf>,

        #[arg(long, value_enum, default_value = "diagonal")]
        position: PositionArg,

        /// Counter-clockwise degrees
        #[arg(long, allow_negative_numbers = true)]
        angle: Option<f32>,

        #[arg(long, default_value = "0.3")]
        opacity: f32,

        #[arg(long)]
        font_size: Option<f32>,

        /// Hex colour, e.g. "#808080"
        #[arg(long)]
        color: Option<String>,

        #[arg(long, value_name = "PAGES")]
        pages: Option<String>,

        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Encrypt with a password and permission set
    Protect {
        #[arg(value_name = "FILE", required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(long)]
        user_password: Option<String>,

        /// Generated when omitted
        #[arg(long)]
        owner_password: Option<String>,

        #[arg(long, value_enum, default_value = "rc4-128")]
        level: LevelArg,

        #[command(flatten)]
        restrictions: RestrictionArgs,

        #[arg(short, long, value_name = "PATH")]
        output: PathBuf,
    },

    /// Remove text, patterns, personal data, or page areas
    Redact {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Literal text (case-insensitive)
        #[arg(long = "text", value_name = "TEXT")]
        texts: Vec<String>,

        /// Regular expression
        #[arg(long = "pattern", value_name = "REGEX")]
        patterns: Vec<String>,

        /// Built-in categories (ssn, credit_card, phone, email, ipv4, date) or "all"
        #[arg(long, value_delimiter = ',', value_name = "CATEGORIES")]
        pii: Vec<String>,

        /// PAGE:X,Y,W,H in points
        #[arg(long = "area", value_name = "AREA")]
        areas: Vec<String>,

        /// Pages searched by text rules
        #[arg(long, value_name = "PAGES")]
        pages: Option<String>,

        /// Paint boxes without removing the content underneath
        #[arg(long)]
        cover_only: bool,

        /// Clear the document information dictionary
        #[arg(long)]
        scrub_metadata: bool,

        #[arg(long)]
        fill: Option<String>,

        /// Audit database; skipped when omitted or disabled in the config
        #[arg(long, value_name = "FILE")]
        audit_db: Option<PathBuf>,

        #[arg(short, long, value_name = "FILE")]
        output: PathBuf,
    },

    /// Show pages, bookmarks, and metadata
    Info {
        #[arg(value_name = "FILE")]
        input: PathBuf,

        #[arg(long)]
        json: bool,

        /// Fail unless the file has this SHA-256 digest
        #[arg(long, value_name = "HEX")]
        verify: Option<String>,
    },

    /// List audit records for a redacted file, or the most recent ones
    Audit {
        #[arg(value_name = "FILE")]
        input: Option<PathBuf>,

        #[arg(long, value_name = "FILE")]
        db: PathBuf,

        #[arg(long, default_value = "20")]
        recent: u32,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
#[group(required = true, multiple = false)]
struct SplitModeArgs {
    /// Single range START-END
    #[arg(long, value_name = "START-END")]
    range: Option<String>,

    /// Chunks of N pages
    #[arg(long, value_name = "N")]
    every: Option<u32>,

    /// One file per range (repeatable)
    #[arg(long = "section", value_name = "PAGES")]
    sections: Vec<String>,

    /// Chunks under this many bytes
    #[arg(long, value_name = "BYTES")]
    max_size: Option<u64>,
}

#[derive(Args)]
struct RestrictionArgs {
    #[arg(long, conflicts_with = "low_res_print")]
    no_print: bool,
    #[arg(long)]
    low_res_print: bool,
    #[arg(long)]
    no_modify: bool,
    #[arg(long)]
    no_copy: bool,
    #[arg(long)]
    no_annotate: bool,
    #[arg(long)]
    no_forms: bool,
    #[arg(long)]
    no_assembly: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum PositionArg {
    Center,
    Diagonal,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

#[derive(Clone, Copy, ValueEnum)]
enum LevelArg {
    #[value(name = "rc4-40")]
    Rc4Bits40,
    #[value(name = "rc4-128")]
    Rc4Bits128,
    #[value(name = "aes-256")]
    AesBits256,
}

impl From<PositionArg> for Position {
    fn from(arg: PositionArg) -> Self {
        match arg {
            PositionArg::Center => Position::Center,
            PositionArg::Diagonal => Position::Diagonal,
            PositionArg::TopLeft => Position::TopLeft,
            PositionArg::TopRight => Position::TopRight,
            PositionArg::BottomLeft => Position::BottomLeft,
            PositionArg::BottomRight => Position::BottomRight,
        }
    }
}

impl From<LevelArg> for EncryptionLevel {
    fn from(arg: LevelArg) -> Self {
        match arg {
            LevelArg::Rc4Bits40 => EncryptionLevel::Bits40,
            LevelArg::Rc4Bits128 => EncryptionLevel::Bits128,
            LevelArg::AesBits256 => EncryptionLevel::Bits256,
        }
    }
}

impl RestrictionArgs {
    fn permissions(&self) -> PermissionSet {
        let printing = if self.no_print {
            PrintPermission::None
        } else if self.low_res_print {
            PrintPermission::LowResolution
        } else {
            PrintPermission::HighResolution
        };
        PermissionSet {
            printing,
            modifying: !self.no_modify,
            copying: !self.no_copy,
            annotating: !self.no_annotate,
            form_filling: !self.no_forms,
            document_assembly: !self.no_assembly,
            ..PermissionSet::allow_all()
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let human = humanize_error(&err);
            debug!(error = ?err, "command failed");
            eprintln!("Error: {}", human.message);
            eprintln!("  {}", human.suggestion);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::from_json_file(path)?,
        None => EngineConfig::default(),
    };
    let ctx = Context {
        config,
        password: cli.password,
    };

    match cli.command {
        Commands::Merge {
            inputs,
            output,
            bookmarks,
            separators,
            keep_metadata,
            title,
        } => {
            let options = MergeOptions {
                add_bookmarks: bookmarks,
                preserve_metadata: keep_metadata,
                insert_blank_pages: separators,
                output_title: title,
            };
            cmd_merge(&ctx, &inputs, &options, &output)
        }
        Commands::Split {
            input,
            output,
            mode,
            remove_blank,
            prefix,
        } => {
            let options = SplitOptions {
                mode: mode.into_mode()?,
                remove_blank_pages: remove_blank,
                custom_naming: prefix,
            };
            cmd_split(&ctx, &input, &options, &output)
        }
        Commands::Extract { input, pages, output } => cmd_extract(&ctx, &input, &pages, &output),
        Commands::Remove { input, pages, output } => cmd_remove(&ctx, &input, &pages, &output),
        Commands::Organize {
            input,
            ops,
            ops_file,
            output,
        } => {
            let queue = match (ops, ops_file) {
                (Some(script), _) => OperationQueue::parse(&script)?,
                (None, Some(path)) => serde_json::from_str(&fs::read_to_string(path)?)?,
                (None, None) => {
                    return Err(PagewerkError::InvalidOption("no operations given".into()));
                }
            };
            cmd_organize(&ctx, &input, &queue, &output)
        }
        Commands::Rotate {
            inputs,
            degrees,
            pages,
            output,
        } => cmd_rotate(&ctx, &inputs, degrees, pages.as_deref(), &output),
        Commands::Watermark {
            inputs,
            text,
            image,
            position,
            angle,
            opacity,
            font_size,
            color,
            pages,
            output,
        } => {
            let payload = match (text, image) {
                (Some(content), _) => WatermarkPayload::Text {
                    content,
                    font_size,
                    color: parse_color(color.as_deref())?.unwrap_or(RgbColor::GRAY),
                    opacity,
                },
                (None, Some(path)) => WatermarkPayload::Image {
                    bytes: fs::read(path)?,
                    opacity,
                },
                (None, None) => {
                    return Err(PagewerkError::InvalidOption("no watermark text or image given".into()));
                }
            };
            let placement = Placement {
                position: position.into(),
                rotation_degrees: angle,
            };
            cmd_watermark(&ctx, &inputs, &payload, &placement, pages.as_deref(), &output)
        }
        Commands::Protect {
            inputs,
            user_password,
            owner_password,
            level,
            restrictions,
            output,
        } => {
            let options = ProtectOptions {
                user_password,
                owner_password,
                permissions: restrictions.permissions(),
                level: level.into(),
            };
            cmd_protect(&ctx, &inputs, &options, &output)
        }
        Commands::Redact {
            input,
            texts,
            patterns,
            pii,
            areas,
            pages,
            cover_only,
            scrub_metadata,
            fill,
            audit_db,
            output,
        } => {
            let mut rules: Vec<RedactionRule> = texts.into_iter().map(RedactionRule::literal).collect();
            rules.extend(patterns.into_iter().map(RedactionRule::pattern));
            if let Some(rule) = pii_rule(&pii)? {
                rules.push(rule);
            }
            for area in &areas {
                rules.push(parse_area(area)?);
            }
            let options = RedactOptions {
                permanent_redaction: !cover_only,
                redact_metadata: scrub_metadata,
                audit_trail: audit_db.is_some(),
                fill_color: parse_color(fill.as_deref())?,
                pages: PageSelector::All,
            };
            cmd_redact(&ctx, &input, &rules, options, pages.as_deref(), audit_db.as_deref(), &output)
        }
        Commands::Info { input, json, verify } => cmd_info(&ctx, &input, json, verify.as_deref()),
        Commands::Audit {
            input,
            db,
            recent,
            json,
        } => cmd_audit(input.as_deref(), &db, recent, json),
    }
}

// ---------------------------------------------------------------------------
// Shared plumbing
// ---------------------------------------------------------------------------

struct Context {
    config: EngineConfig,
    password: Option<String>,
}

impl Context {
    fn load(&self, path: &Path) -> Result<Document> {
        let bytes = fs::read(path)?;
        let mut doc = Document::from_bytes_with(&bytes, self.password.as_deref(), &self.config)?;
        doc.set_name(path.to_string_lossy());
        debug!(file = %path.display(), pages = doc.page_count(), "loaded");
        Ok(doc)
    }

    fn write(&self, doc: &Document, path: &Path) -> Result<Vec<u8>> {
        let bytes = doc.to_bytes(&self.config)?;
        fs::write(path, &bytes)?;
        info!(file = %path.display(), pages = doc.page_count(), bytes = bytes.len(), "written");
        Ok(bytes)
    }

    /// Progress goes to the debug log.
    fn job(&self) -> JobControl {
        JobControl::new().with_progress(|p| debug!(completed = p.completed, total = p.total, "progress"))
    }

    fn selector(&self, pages: Option<&str>, doc: &Document) -> Result<PageSelector> {
        match pages {
            Some(pages) => PageSelector::from_range_str(pages, doc.page_count() as u32),
            None => Ok(PageSelector::All),
        }
    }

    fn batch_items(&self, inputs: &[PathBuf]) -> Result<Vec<BatchItem>> {
        inputs
            .iter()
            .map(|path| Ok(BatchItem::new(path.to_string_lossy(), fs::read(path)?)))
            .collect()
    }

    /// Write every successful batch output into `dir`. Fails if any item did.
    fn write_batch(&self, reports: Vec<batch::BatchReport>, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir)?;
        let mut first_error = None;
        for report in reports {
            match report.result {
                Ok(file) => {
                    let path = dir.join(&file.name);
                    fs::write(&path, &file.bytes)?;
                    info!(file = %path.display(), "written");
                }
                Err(err) => {
                    error!(file = %report.name, error = %err, "skipped");
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl SplitModeArgs {
    fn into_mode(self) -> Result<SplitMode> {
        if let Some(range) = self.range {
            let (start, end) = range
                .split_once('-')
                .and_then(|(s, e)| Some((s.trim().parse().ok()?, e.trim().parse().ok()?)))
                .ok_or_else(|| PagewerkError::InvalidOption(format!("expected START-END, got {range:?}")))?;
            return Ok(SplitMode::Range { start, end });
        }
        if let Some(n) = self.every {
            return Ok(SplitMode::Every { n });
        }
        if let Some(max_bytes) = self.max_size {
            return Ok(SplitMode::Size { max_bytes });
        }
        if !self.sections.is_empty() {
            return Ok(SplitMode::Bookmarks { ranges: self.sections });
        }
        Err(PagewerkError::InvalidOption("no split mode given".into()))
    }
}

/// `file.pdf@1-3` → (`file.pdf`, `Some("1-3")`), unless the whole string
/// names an existing file.
fn split_input_range(spec: &str) -> (&str, Option<&str>) {
    match spec.rsplit_once('@') {
        Some((path, pages)) if !Path::new(spec).exists() && !pages.is_empty() => (path, Some(pages)),
        _ => (spec, None),
    }
}

fn parse_color(hex: Option<&str>) -> Result<Option<RgbColor>> {
    hex.map(|hex| {
        RgbColor::from_hex(hex).ok_or_else(|| PagewerkError::InvalidOption(format!("invalid colour {hex:?}")))
    })
    .transpose()
}

fn pii_rule(labels: &[String]) -> Result<Option<RedactionRule>> {
    if labels.is_empty() {
        return Ok(None);
    }
    if labels.iter().any(|l| l.eq_ignore_ascii_case("all")) {
        return Ok(Some(RedactionRule::all_pii()));
    }
    let categories = labels
        .iter()
        .map(|label| {
            PiiCategory::from_label(label.trim())
                .ok_or_else(|| PagewerkError::InvalidOption(format!("unknown category {label:?}")))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Some(RedactionRule::Heuristic { categories }))
}

/// `PAGE:X,Y,W,H`, page 1-based.
fn parse_area(spec: &str) -> Result<RedactionRule> {
    let invalid = || PagewerkError::InvalidOption(format!("expected PAGE:X,Y,W,H, got {spec:?}"));
    let (page, rect) = spec.split_once(':').ok_or_else(invalid)?;
    let page: u32 = page.trim().parse().map_err(|_| invalid())?;
    let coords = rect
        .split(',')
        .map(|v| v.trim().parse::<f32>().map_err(|_| invalid()))
        .collect::<Result<Vec<_>>>()?;
    let [x, y, width, height] = coords[..] else {
        return Err(invalid());
    };
    if page == 0 {
        return Err(invalid());
    }
    Ok(RedactionRule::area(page - 1, Rect::new(x, y, width, height)))
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

fn cmd_merge(ctx: &Context, inputs: &[String], options: &MergeOptions, output: &Path) -> Result<()> {
    let mut sources = Vec::with_capacity(inputs.len());
    for spec in inputs {
        let (path, pages) = split_input_range(spec);
        let doc = ctx.load(Path::new(path))?;
        let range = pages
            .map(|pages| PageRangeSpec::parse(pages, doc.page_count() as u32))
            .transpose()?;
        sources.push((doc, range));
    }
    let merged = merge::merge_with(sources, options, &ctx.job())?;
    ctx.write(&merged, output)?;
    Ok(())
}

fn cmd_split(ctx: &Context, input: &Path, options: &SplitOptions, dir: &Path) -> Result<()> {
    let doc = ctx.load(input)?;
    let outcome = split_with(&doc, options, &ctx.config, &ctx.job())?;
    for warning in &outcome.warnings {
        match warning {
            SplitWarning::SizeBudgetTooSmall {
                page,
                estimated_bytes,
                max_bytes,
            } => warn!(page, estimated_bytes, max_bytes, "page exceeds the size budget on its own"),
        }
    }
    write_parts(ctx, outcome, dir)
}

fn write_parts(ctx: &Context, outcome: SplitOutcome, dir: &Path) -> Result<()> {
    let outputs = outcome.into_outputs(&ctx.config)?;
    fs::create_dir_all(dir)?;
    for file in &outputs {
        fs::write(dir.join(&file.name), &file.bytes)?;
        debug!(file = %file.name, bytes = file.bytes.len(), "part written");
    }
    info!(parts = outputs.len(), dir = %dir.display(), "split complete");
    Ok(())
}

fn cmd_extract(ctx: &Context, input: &Path, pages: &str, output: &Path) -> Result<()> {
    let doc = ctx.load(input)?;
    let pages = range::parse(pages, doc.page_count() as u32)?;
    let outcome = split_with(
        &doc,
        &SplitOptions::new(SplitMode::Extract { pages }),
        &ctx.config,
        &ctx.job(),
    )?;
    single_part(ctx, outcome, output)
}

fn cmd_remove(ctx: &Context, input: &Path, pages: &str, output: &Path) -> Result<()> {
    let doc = ctx.load(input)?;
    let pages = range::parse(pages, doc.page_count() as u32)?;
    single_part(ctx, remove_pages(&doc, &pages)?, output)
}

fn single_part(ctx: &Context, outcome: SplitOutcome, output: &Path) -> Result<()> {
    let part = outcome
        .parts
        .into_iter()
        .next()
        .ok_or(PagewerkError::EmptySelection)?;
    ctx.write(&part.document, output)?;
    Ok(())
}

fn cmd_organize(ctx: &Context, input: &Path, queue: &OperationQueue, output: &Path) -> Result<()> {
    let doc = ctx.load(input)?;
    info!(operations = queue.len(), "applying queue");
    let organized = organize::apply_with(&doc, queue, &ctx.job())?;
    ctx.write(&organized, output)?;
    Ok(())
}

fn cmd_rotate(ctx: &Context, inputs: &[PathBuf], degrees: i32, pages: Option<&str>, output: &Path) -> Result<()> {
    if let [input] = inputs {
        let doc = ctx.load(input)?;
        let rotated = rotate(&doc, degrees, &ctx.selector(pages, &doc)?)?;
        ctx.write(&rotated, output)?;
        return Ok(());
    }
    // Page ranges are resolved per document, so batches only take whole-document rotations.
    if pages.is_some() {
        return Err(PagewerkError::InvalidOption("--pages needs a single input".into()));
    }
    let reports = batch::rotate_all(&ctx.batch_items(inputs)?, degrees, &PageSelector::All, &ctx.config);
    ctx.write_batch(reports, output)
}

fn cmd_watermark(
    ctx: &Context,
    inputs: &[PathBuf],
    payload: &WatermarkPayload,
    placement: &Placement,
    pages: Option<&str>,
    output: &Path,
) -> Result<()> {
    if let [input] = inputs {
        let doc = ctx.load(input)?;
        let selector = ctx.selector(pages, &doc)?;
        let stamped = watermark::watermark_with(
            &doc,
            payload,
            placement,
            &selector,
            &ctx.config,
            &ctx.job(),
        )?;
        ctx.write(&stamped, output)?;
        return Ok(());
    }
    if pages.is_some() {
        return Err(PagewerkError::InvalidOption("--pages needs a single input".into()));
    }
    let reports = batch::watermark_all(
        &ctx.batch_items(inputs)?,
        payload,
        placement,
        &PageSelector::All,
        &ctx.config,
    );
    ctx.write_batch(reports, output)
}

fn cmd_protect(ctx: &Context, inputs: &[PathBuf], options: &ProtectOptions, output: &Path) -> Result<()> {
    if let [input] = inputs {
        let doc = ctx.load(input)?;
        let protected = protect(&doc, options)?;
        let saved = protected.save(&ctx.config)?;
        fs::write(output, &saved.bytes)?;
        if let Some(report) = &saved.encryption {
            info!(
                file = %output.display(),
                revision = report.dictionary.revision,
                aes = report.dictionary.uses_aes(),
                "encrypted"
            );
        }
        return Ok(());
    }
    let reports = batch::protect_all(&ctx.batch_items(inputs)?, options, &ctx.config);
    ctx.write_batch(reports, output)
}

fn cmd_redact(
    ctx: &Context,
    input: &Path,
    rules: &[RedactionRule],
    mut options: RedactOptions,
    pages: Option<&str>,
    audit_db: Option<&Path>,
    output: &Path,
) -> Result<()> {
    let doc = ctx.load(input)?;
    options.pages = ctx.selector(pages, &doc)?;
    let outcome = redact::redact_with(&doc, rules, &options, &ctx.config, &ctx.job())?;
    if outcome.redactions == 0 {
        warn!("nothing matched; output is unchanged apart from re-serialization");
    }
    let bytes = ctx.write(&outcome.document, output)?;

    match (audit_db, &outcome.audit) {
        (Some(path), Some(trail)) if ctx.config.audit_enabled => {
            let log = AuditLog::open(path)?;
            let batch_id = trail.persist(&log, &bytes)?;
            info!(batch_id = %batch_id, entries = trail.len(), db = %path.display(), "audit trail recorded");
        }
        (Some(_), _) if !ctx.config.audit_enabled => {
            warn!("audit database given but auditing is disabled in the config");
        }
        _ => {}
    }
    info!(redactions = outcome.redactions, "redaction complete");
    Ok(())
}

fn cmd_info(ctx: &Context, input: &Path, json: bool, expected_sha256: Option<&str>) -> Result<()> {
    if let Some(expected) = expected_sha256 {
        verify_hash(&fs::read(input)?, expected)?;
        info!(file = %input.display(), "digest verified");
    }
    let doc = ctx.load(input)?;
    let meta = doc.metadata();

    if json {
        let pages: Vec<serde_json::Value> = doc
            .pages()
            .iter()
            .map(|page| {
                let media = page.media_box();
                serde_json::json!({
                    "width": media.width,
                    "height": media.height,
                    "rotation": page.effective_rotation(),
                    "blank": page.is_blank_page(),
                })
            })
            .collect();
        let info = serde_json::json!({
            "file": input.display().to_string(),
            "pages": doc.page_count(),
            "metadata": {
                "title": meta.title,
                "author": meta.author,
                "subject": meta.subject,
                "keywords": meta.keywords,
                "creator": meta.creator,
                "producer": meta.producer,
            },
            "bookmarks": doc.bookmarks().iter().map(|b| b.count()).sum::<usize>(),
            "page_details": pages,
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("File:      {}", input.display());
    println!("Pages:     {}", doc.page_count());
    let fields = [
        ("Title", &meta.title),
        ("Author", &meta.author),
        ("Subject", &meta.subject),
        ("Keywords", &meta.keywords),
        ("Creator", &meta.creator),
        ("Producer", &meta.producer),
    ];
    for (label, value) in fields {
        if let Some(value) = value {
            println!("{:<10} {value}", format!("{label}:"));
        }
    }
    if !doc.bookmarks().is_empty() {
        println!("Bookmarks:");
        for bookmark in doc.bookmarks() {
            print_bookmark(&doc, bookmark, 1);
        }
    }
    for (i, page) in doc.pages().iter().enumerate() {
        let media = page.media_box();
        println!(
            "  page {:>4}: {:.0} x {:.0} pt, rotated {}°{}",
            i + 1,
            media.width,
            media.height,
            page.effective_rotation(),
            if page.is_blank_page() { ", blank" } else { "" }
        );
    }
    Ok(())
}

fn cmd_audit(input: Option<&Path>, db: &Path, recent: u32, json: bool) -> Result<()> {
    let log = AuditLog::open(db)?;
    let records = match input {
        Some(path) => log.entries_for_hash(&hash_bytes(&fs::read(path)?))?,
        None => log.recent_entries(recent)?,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }
    if records.is_empty() {
        println!("No audit records.");
        return Ok(());
    }
    for record in &records {
        println!(
            "{}  page {:>4}  {:<24} {}  {}",
            record.timestamp,
            record.page,
            record.rule,
            if record.permanent { "removed" } else { "covered" },
            &record.document_hash[..record.document_hash.len().min(12)],
        );
    }
    Ok(())
}

fn print_bookmark(doc: &Document, bookmark: &Bookmark, depth: usize) {
    let page = doc
        .pages()
        .iter()
        .position(|p| p.key() == bookmark.target)
        .map_or_else(|| "?".to_string(), |i| (i + 1).to_string());
    println!("{:indent$}{} (page {page})", "", bookmark.title, indent = depth * 2);
    for child in &bookmark.children {
        print_bookmark(doc, child, depth + 1);
    }
}
