use std::fs;
use std::io::{self, Write};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Error, Result, bail};
use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum, ValueHint};
use encoding_rs::UTF_8;
use is_terminal::IsTerminal;
use time::OffsetDateTime;

use fuzzedit::diff::{self, DiffDisplay};
use fuzzedit::encoding::{DecodedFile, EncodingOverride};
use fuzzedit::logging::{ChangeLog, DEFAULT_LOG_DIR};
use fuzzedit::ops::{EditOp, apply_ops, group_by_path, load_plan};

#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, Default)]
enum ColorChoice {
    #[default]
    Auto,
    Always,
    Never,
}

impl ColorChoice {
    fn should_color(self) -> bool {
        match self {
            ColorChoice::Always => true,
            ColorChoice::Never => false,
            ColorChoice::Auto => io::stdout().is_terminal(),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Apply(cmd) => handle_apply(cmd),
        Command::Show(cmd) => handle_show(cmd),
    }
}

fn handle_apply(cmd: ApplyCommand) -> Result<()> {
    let colorize = cmd.color.should_color();
    let display = DiffDisplay {
        context: cmd.context,
        colorize,
    };
    let plan = load_plan(&cmd.plan)?;
    let encoding = EncodingOverride::parse(cmd.encoding.as_deref())?;
    let root = cmd.root.clone().unwrap_or_else(|| PathBuf::from("."));

    println!("plan: {}", cmd.plan.display());
    println!(
        "mode: {}{}",
        if cmd.apply { "apply" } else { "dry-run" },
        if cmd.auto_apply { " (auto-approve)" } else { "" }
    );
    println!("root: {}", root.display());
    println!("encoding: {}", encoding.describe());
    println!("edits: {}", plan.edits.len());
    println!("---");

    let apply_mode = cmd.apply;
    let mut apply_all = cmd.auto_apply && apply_mode;
    let mut stats = CommandStats::default();
    // Dry runs leave no trace on disk, including the log directory.
    let change_log = if apply_mode {
        Some(ChangeLog::open(Path::new(DEFAULT_LOG_DIR))?)
    } else {
        None
    };

    'outer: for (path, ops) in group_by_path(&plan.edits) {
        let target = resolve_target(&root, path)?;
        let file_label = path.display().to_string();

        let decoded = if target.exists() {
            let bytes =
                fs::read(&target).with_context(|| format!("reading {}", target.display()))?;
            let decoded = encoding.decode(&bytes);
            if decoded.lossy {
                println!(
                    "warning: {} decoded with replacement characters ({})",
                    target.display(),
                    decoded.encoding.name()
                );
            }
            Some(decoded)
        } else {
            None
        };

        let old_text = decoded.as_ref().map(|d| d.text.as_str());
        let new_text = match apply_ops(&file_label, old_text, &ops) {
            Ok(text) => text,
            Err(err) => {
                if let Some(log) = &change_log {
                    log.record(Path::new(err.file()), "failed", &ops, &err.to_string())?;
                }
                let context = format!("applying {} edit(s) to {}", ops.len(), file_label);
                return Err(Error::new(err).context(context));
            }
        };

        let old_text = old_text.unwrap_or_default();
        if new_text == old_text {
            println!("no changes for {}", file_label);
            stats.no_op += 1;
            continue;
        }

        let summary = diff::summarize_lines(old_text, &new_text);
        println!("--- preview: {} ({summary}) ---", file_label);
        diff::print_diff(old_text, &new_text, &display);

        if !apply_mode {
            stats.dry_run += 1;
            println!("dry-run: rerun with --apply to write this change.");
            continue;
        }

        let decision = if apply_all {
            ApprovalDecision::Apply
        } else {
            prompt_approval(&target)?
        };

        match decision {
            ApprovalDecision::Apply | ApprovalDecision::ApplyAll => {
                if matches!(decision, ApprovalDecision::ApplyAll) {
                    apply_all = true;
                }
                write_target(&target, &new_text, decoded.as_ref(), cmd.no_backup)?;
                stats.applied += 1;
                if let Some(log) = &change_log {
                    log.record(path, "applied", &ops, &summary)?;
                }
            }
            ApprovalDecision::Skip => {
                println!("skipped {}", file_label);
                stats.skipped += 1;
                if let Some(log) = &change_log {
                    log.record(path, "skipped", &ops, &summary)?;
                }
            }
            ApprovalDecision::Quit => {
                println!("stopping after user request.");
                stats.skipped += 1;
                break 'outer;
            }
        }
    }

    stats.print("apply");
    Ok(())
}

fn handle_show(cmd: ShowCommand) -> Result<()> {
    let plan = load_plan(&cmd.plan)?;
    println!("plan: {} ({} edits)", cmd.plan.display(), plan.edits.len());
    for (idx, op) in plan.edits.iter().enumerate() {
        match op {
            EditOp::ExactReplace {
                path,
                old_content,
                new_content,
            }
            | EditOp::GlobalReplace {
                path,
                old_content,
                new_content,
            } => {
                println!(
                    "  {idx}: {} {} ({} -> {} chars)",
                    op.kind(),
                    path.display(),
                    old_content.chars().count(),
                    new_content.chars().count()
                );
            }
            EditOp::Create { path, content } => {
                println!(
                    "  {idx}: create {} ({} chars)",
                    path.display(),
                    content.chars().count()
                );
            }
        }
    }
    Ok(())
}

// Plan paths stay inside the root; absolute paths and parent traversal
// would let a plan write anywhere on disk.
fn resolve_target(root: &Path, relative: &Path) -> Result<PathBuf> {
    if relative.is_absolute() {
        bail!(
            "plan path {} is absolute; plans address files relative to --root",
            relative.display()
        );
    }
    if relative
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        bail!(
            "plan path {} escapes the root via '..'",
            relative.display()
        );
    }
    Ok(root.join(relative))
}

fn write_target(
    path: &Path,
    text: &str,
    decoded: Option<&DecodedFile>,
    no_backup: bool,
) -> Result<()> {
    // New files are written as UTF-8; existing files keep their encoding.
    let encoding = decoded.map(|d| d.encoding).unwrap_or(UTF_8);
    let (encoded, _, had_errors) = encoding.encode(text);
    if had_errors {
        println!(
            "warning: encoding fallback occurred when writing {}; output may be lossy",
            path.display()
        );
    }
    let backup = create_backup_if_needed(path, no_backup)?;
    write_via_temp(path, encoded.as_ref())
        .with_context(|| format!("writing {}", path.display()))?;
    if let Some(bak) = backup {
        println!("backup saved: {} -> {}", path.display(), bak.display());
    }
    println!("applied {}", path.display());
    Ok(())
}

fn create_backup_if_needed(path: &Path, no_backup: bool) -> Result<Option<PathBuf>> {
    if no_backup || !path.exists() {
        return Ok(None);
    }

    let mut attempt = 0usize;
    loop {
        let candidate = backup_candidate(path, attempt);
        if !candidate.exists() {
            fs::copy(path, &candidate)
                .with_context(|| format!("creating backup {}", candidate.display()))?;
            return Ok(Some(candidate));
        }
        attempt += 1;
    }
}

fn backup_candidate(path: &Path, index: usize) -> PathBuf {
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("fuzzedit_file");
    let suffix = if index == 0 {
        ".bak".to_string()
    } else {
        format!(".bak{index}")
    };
    path.with_file_name(format!("{name}{suffix}"))
}

fn write_via_temp(path: &Path, data: &[u8]) -> Result<()> {
    let parent = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = parent {
        fs::create_dir_all(dir).with_context(|| format!("creating directory {}", dir.display()))?;
    }
    let base_dir = parent.unwrap_or_else(|| Path::new("."));
    let unique = format!(
        ".fuzzedit-tmp-{}-{}",
        std::process::id(),
        OffsetDateTime::now_utc().unix_timestamp_nanos()
    );
    let temp_path = base_dir.join(unique);
    {
        let mut file = fs::File::create(&temp_path)
            .with_context(|| format!("creating temp file {}", temp_path.display()))?;
        file.write_all(data)
            .with_context(|| format!("writing temp file {}", temp_path.display()))?;
        file.sync_all()
            .with_context(|| format!("syncing temp file {}", temp_path.display()))?;
    }
    fs::rename(&temp_path, path).or_else(|err| {
        let _ = fs::remove_file(&temp_path);
        Err(err).with_context(|| format!("replacing {}", path.display()))
    })?;
    Ok(())
}

#[derive(Debug, Clone, Copy)]
enum ApprovalDecision {
    Apply,
    Skip,
    ApplyAll,
    Quit,
}

fn prompt_approval(path: &Path) -> Result<ApprovalDecision> {
    loop {
        print!(
            "Apply change to {}? [y]es/[n]o/[a]ll/[q]uit: ",
            path.display()
        );
        io::stdout().flush()?;
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" | "" => return Ok(ApprovalDecision::Apply),
            "n" | "no" => return Ok(ApprovalDecision::Skip),
            "a" | "all" => return Ok(ApprovalDecision::ApplyAll),
            "q" | "quit" => return Ok(ApprovalDecision::Quit),
            _ => {
                println!("Please enter y, n, a, or q.");
            }
        }
    }
}

#[derive(Default)]
struct CommandStats {
    applied: usize,
    skipped: usize,
    dry_run: usize,
    no_op: usize,
}

impl CommandStats {
    fn print(&self, label: &str) {
        let total = self.applied + self.skipped + self.dry_run + self.no_op;
        if total == 0 {
            return;
        }
        println!(
            "{label} summary: applied={}, skipped={}, dry-run={}, no-op={}",
            self.applied, self.skipped, self.dry_run, self.no_op
        );
    }
}

#[derive(Debug, Parser)]
#[command(name = "fuzzedit", version, about = "Fuzzy patch application for generated edits")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Apply(ApplyCommand),
    Show(ShowCommand),
}

#[derive(Debug, Args)]
struct ApplyCommand {
    #[arg(value_name = "PLAN", value_hint = ValueHint::FilePath)]
    plan: PathBuf,
    #[arg(long = "root", value_name = "DIR", value_hint = ValueHint::DirPath)]
    root: Option<PathBuf>,
    #[arg(long, value_name = "ENCODING")]
    encoding: Option<String>,
    #[arg(long, action = ArgAction::SetTrue)]
    apply: bool,
    #[arg(long = "yes", action = ArgAction::SetTrue)]
    auto_apply: bool,
    #[arg(long, action = ArgAction::SetTrue)]
    no_backup: bool,
    #[arg(long, default_value_t = 3)]
    context: usize,
    #[arg(long = "color", value_enum, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Debug, Args)]
struct ShowCommand {
    #[arg(value_name = "PLAN", value_hint = ValueHint::FilePath)]
    plan: PathBuf,
}
