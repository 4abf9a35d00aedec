use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use assetdup_lib::deep_copy::{DeepCopyEngine, DeepCopyOptions, DeepCopyProgress};
use assetdup_lib::input_validation::{validate_selection, validate_shallow_patterns};
use assetdup_lib::logging::LogManager;
use assetdup_lib::store::{AssetPath, FsStore, InMemoryStore};

#[derive(Parser)]
#[command(name = "assetdup-cli")]
#[command(about = "Duplicate assets and point references inside the copies at the copies", long_about = None)]
struct Cli {
    /// Store-relative paths of the folders and files to duplicate
    #[arg(required = true)]
    paths: Vec<String>,

    /// Project directory to operate on
    #[arg(short, long, conflicts_with = "snapshot")]
    root: Option<PathBuf>,

    /// Store snapshot (.yaml or .json) to operate on
    #[arg(short, long)]
    snapshot: Option<PathBuf>,

    /// Where to write the updated snapshot (default: in place)
    #[arg(short, long, requires = "snapshot")]
    output: Option<PathBuf>,

    /// Options file (YAML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the operation log when done
    #[arg(long)]
    show_log: bool,
}

enum Target {
    Root(PathBuf),
    Snapshot { input: PathBuf, output: PathBuf },
}

fn is_json(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

async fn load_options(path: &Path) -> anyhow::Result<DeepCopyOptions> {
    let text = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to read config {path:?}: {e}"))?;
    serde_yaml::from_str(&text).map_err(|e| anyhow::anyhow!("Invalid config {path:?}: {e}"))
}

fn print_log(log: &LogManager) {
    println!();
    println!("📜 Log:");
    for entry in log.get_logs(None) {
        match entry.asset_path {
            Some(path) => println!("   [{}] {:<5} {}: {}", entry.timestamp, entry.level, path, entry.message),
            None => println!("   [{}] {:<5} {}", entry.timestamp, entry.level, entry.message),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    validate_selection(&cli.paths)?;

    let options = match &cli.config {
        Some(path) => load_options(path).await?,
        None => DeepCopyOptions::default(),
    };
    validate_shallow_patterns(&options.shallow_patterns)?;

    let target = match (cli.root, cli.snapshot) {
        (Some(root), None) => {
            if !root.is_dir() {
                anyhow::bail!("Project directory does not exist: {root:?}");
            }
            Target::Root(root)
        }
        (None, Some(input)) => {
            let output = cli.output.unwrap_or_else(|| input.clone());
            Target::Snapshot { input, output }
        }
        _ => anyhow::bail!("Missing required argument: --root or --snapshot"),
    };

    let selection: Vec<AssetPath> = cli.paths.iter().map(|p| AssetPath::new(p.as_str())).collect();
    let log = Arc::new(LogManager::default());
    let engine = DeepCopyEngine::new(options)?.with_log_manager(log.clone());

    println!("🚀 Duplicating {} item(s)...", selection.len());
    for path in &selection {
        println!("   {path}");
    }
    println!();

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("#>-"),
    );

    let bar = pb.clone();
    let on_progress = move |progress: DeepCopyProgress| {
        bar.set_length(progress.total);
        bar.set_position(progress.processed);
        match progress.current_path {
            Some(path) => bar.set_message(format!("{:?} - {}", progress.phase, path)),
            None => bar.set_message(format!("{:?}", progress.phase)),
        }
    };

    let result = tokio::task::spawn_blocking(move || -> anyhow::Result<_> {
        match target {
            Target::Root(root) => {
                let mut store = FsStore::new(root);
                Ok(engine.run(&mut store, &selection, on_progress))
            }
            Target::Snapshot { input, output } => {
                let text = std::fs::read_to_string(&input)
                    .map_err(|e| anyhow::anyhow!("Failed to read snapshot {input:?}: {e}"))?;
                let mut store = if is_json(&input) {
                    InMemoryStore::from_json_str(&text)?
                } else {
                    InMemoryStore::from_yaml_str(&text)?
                };

                let result = engine.run(&mut store, &selection, on_progress);

                // Copies survive a failed remap, so the snapshot is saved either way.
                let text = if is_json(&output) {
                    store.to_json_string()?
                } else {
                    store.to_yaml_string()?
                };
                std::fs::write(&output, text)?;
                Ok(result)
            }
        }
    })
    .await??;

    match result {
        Ok(report) => {
            pb.finish_with_message("✅ Deep copy complete!");
            println!();
            println!("📊 Results:");
            println!("   Copies made: {}", report.pairs.len());
            println!("   Files walked: {}", report.walked_files);
            println!("   References rewritten: {}", report.rewritten_fields);
            println!();
            println!("📝 New selection:");
            for path in &report.new_selection {
                println!("   {path}");
            }
            if !report.warnings.is_empty() {
                println!();
                println!("   Warnings: {}", report.warnings.len());
                for warning in &report.warnings {
                    eprintln!("   ⚠️  [{}] {}", warning.code(), warning);
                }
            }
            if cli.show_log {
                print_log(&log);
            }
        }
        Err(e) => {
            pb.abandon_with_message("❌ Deep copy failed!");
            eprintln!("❌ [{}] {e}", e.code());
            if e.is_structural_divergence() {
                eprintln!("   Copies already made were kept and are not remapped.");
            }
            if cli.show_log {
                print_log(&log);
            }
            std::process::exit(1);
        }
    }

    Ok(())
}
