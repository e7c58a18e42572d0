use std::collections::BTreeMap;
use std::path::Path;
use std::path::PathBuf;
use std::process;

use clap::Parser;
use owo_colors::OwoColorize;
use similar::ChangeTag;
use similar::TextDiff;
use spawnsync_cli::Commands;
use spawnsync_cli::InputArgs;
use spawnsync_cli::RenderArgs;
use spawnsync_cli::SpawnSyncCli;
use spawnsync_cli::SyncArgs;
use spawnsync_core::BuildReport;
use spawnsync_core::DokuWikiStore;
use spawnsync_core::FileConfig;
use spawnsync_core::PageOutcome;
use spawnsync_core::SyncError;
use spawnsync_core::SyncReport;
use spawnsync_core::build_pages;
use spawnsync_core::load_catalog;
use spawnsync_core::load_spawn_dir;
use spawnsync_core::sync_pages;
use tracing_subscriber::EnvFilter;

/// Fallback input locations when neither the command line nor
/// `spawnsync.toml` names them. These match the datapack repository layout.
const DEFAULT_CATALOG: &str = "pokedex_data.json";
const DEFAULT_SPAWN_DIR: &str = "data/cobblemon/spawn_pool_world";
const DEFAULT_NAMESPACE: &str = "spawn-info";

static USE_COLOR: std::sync::atomic::AtomicBool = std::sync::atomic::AtomicBool::new(true);

fn color_enabled() -> bool {
	USE_COLOR.load(std::sync::atomic::Ordering::Relaxed)
}

/// Apply ANSI color codes only when color is enabled.
macro_rules! colored {
	($text:expr,red) => {
		if color_enabled() {
			format!("{}", $text.red())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,green) => {
		if color_enabled() {
			format!("{}", $text.green())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,yellow) => {
		if color_enabled() {
			format!("{}", $text.yellow())
		} else {
			format!("{}", $text)
		}
	};
	($text:expr,bold) => {
		if color_enabled() {
			format!("{}", $text.bold())
		} else {
			format!("{}", $text)
		}
	};
}

fn main() {
	let args = SpawnSyncCli::parse();

	// Respect NO_COLOR env var and --no-color flag.
	let use_color = !args.no_color && std::env::var_os("NO_COLOR").is_none();
	if !use_color {
		USE_COLOR.store(false, std::sync::atomic::Ordering::Relaxed);
	}

	let default_filter = if args.verbose { "debug" } else { "warn" };
	tracing_subscriber::fmt()
		.with_env_filter(
			EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
		)
		.with_writer(std::io::stderr)
		.with_ansi(use_color)
		.without_time()
		.init();

	// Install miette's fancy handler for rich error diagnostics.
	miette::set_hook(Box::new(move |_| {
		Box::new(
			miette::MietteHandlerOpts::new()
				.color(use_color)
				.unicode(use_color)
				.build(),
		)
	}))
	.ok();

	let result = match &args.command {
		Some(Commands::Sync(sync)) => run_sync(&args, sync),
		Some(Commands::Render(render)) => run_render(&args, render),
		None => {
			eprintln!("No subcommand specified. Run `spawnsync --help` for usage.");
			process::exit(1);
		}
	};

	if let Err(e) = result {
		// Try to render through miette for rich diagnostics with help text
		// and error codes.
		match e.downcast::<SyncError>() {
			Ok(sync_err) => {
				let report: miette::Report = (*sync_err).into();
				eprintln!("{report:?}");
			}
			Err(e) => {
				eprintln!("{} {e}", colored!("error:", red));
			}
		}
		process::exit(2);
	}
}

fn resolve_root(args: &SpawnSyncCli) -> PathBuf {
	args.path
		.clone()
		.unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
}

/// Input locations after merging the command line, `spawnsync.toml`, and the
/// built-in defaults, in that precedence order.
struct ResolvedInputs {
	catalog: PathBuf,
	spawn_dir: PathBuf,
	namespace: String,
	url: Option<String>,
}

fn resolve_inputs(
	root: &Path,
	args: &InputArgs,
) -> Result<ResolvedInputs, Box<dyn std::error::Error>> {
	let config = FileConfig::load(root)?.unwrap_or_default();

	let catalog = args
		.catalog
		.clone()
		.or(config.inputs.catalog)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_CATALOG));
	let spawn_dir = args
		.spawn_dir
		.clone()
		.or(config.inputs.spawn_dir)
		.unwrap_or_else(|| PathBuf::from(DEFAULT_SPAWN_DIR));
	let namespace = args
		.namespace
		.clone()
		.or(config.wiki.namespace)
		.unwrap_or_else(|| DEFAULT_NAMESPACE.to_string());

	Ok(ResolvedInputs {
		catalog: absolute(root, catalog),
		spawn_dir: absolute(root, spawn_dir),
		namespace,
		url: config.wiki.url,
	})
}

fn absolute(root: &Path, path: PathBuf) -> PathBuf {
	if path.is_absolute() { path } else { root.join(path) }
}

/// Load both inputs and render the full page set, reporting every recoverable
/// warning on stderr.
fn load_and_build(
	inputs: &ResolvedInputs,
	provenance: &str,
	verbose: bool,
) -> Result<BuildReport, Box<dyn std::error::Error>> {
	let catalog = load_catalog(&inputs.catalog)?;
	let set = load_spawn_dir(&inputs.spawn_dir)?;

	if verbose {
		println!(
			"Loaded {} record(s) from spawn files, {} catalog entr(ies)",
			set.records.len(),
			catalog.len()
		);
	}

	for warning in &set.warnings {
		eprintln!("{} {}", colored!("warning:", yellow), warning.message());
	}

	if set.records.is_empty() {
		return Err(SyncError::NoSpawnRecords {
			path: inputs.spawn_dir.display().to_string(),
		}
		.into());
	}

	let build = build_pages(&catalog, &set.records, &inputs.namespace, provenance);
	for warning in &build.warnings {
		eprintln!("{} {}", colored!("warning:", yellow), warning.message());
	}

	Ok(build)
}

fn run_sync(cli: &SpawnSyncCli, args: &SyncArgs) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(cli);
	let inputs = resolve_inputs(&root, &args.inputs)?;
	let build = load_and_build(&inputs, &args.inputs.provenance, cli.verbose)?;

	if build.pages.is_empty() {
		println!("No pages to synchronize.");
		return Ok(());
	}

	if args.dry_run {
		println!("Dry run: {} page(s) would be considered:", build.pages.len());
		for page in &build.pages {
			println!("  {} ({} bytes)", page.page_id, page.content.len());
		}
		return Ok(());
	}

	let url = args
		.url
		.clone()
		.or(inputs.url)
		.ok_or("no wiki URL configured; pass --url or set SPAWNSYNC_URL")?;
	let user = args
		.user
		.clone()
		.ok_or("no wiki user configured; pass --user or set SPAWNSYNC_USER")?;
	let password = args
		.password
		.clone()
		.ok_or("no wiki password configured; pass --password or set SPAWNSYNC_PASSWORD")?;

	let store = DokuWikiStore::connect(&url, &user, &password, args.insecure)
		.map_err(SyncError::from)?;
	let report = sync_pages(&store, &build.pages, &args.inputs.provenance)?;

	print_report(&report, &build, args.diff);

	if !report.is_ok() {
		process::exit(1);
	}

	Ok(())
}

fn print_report(report: &SyncReport, build: &BuildReport, show_diff: bool) {
	let contents: BTreeMap<&str, &str> = build
		.pages
		.iter()
		.map(|page| (page.page_id.as_str(), page.content.as_str()))
		.collect();

	for result in &report.results {
		match &result.outcome {
			PageOutcome::Unchanged => {
				println!("  {} {}", colored!("unchanged", bold), result.page_id);
			}
			PageOutcome::Written { previous } => {
				let verb = if previous.is_some() {
					"updated"
				} else {
					"created"
				};
				println!("  {} {}", colored!(verb, green), result.page_id);
				if show_diff {
					let current = previous.as_deref().unwrap_or("");
					let expected = contents.get(result.page_id.as_str()).copied().unwrap_or("");
					print_diff(current, expected);
				}
			}
			PageOutcome::Failed { reason } => {
				println!(
					"  {} {}: {reason}",
					colored!("failed", red),
					result.page_id
				);
			}
		}
	}

	println!(
		"\n{} written, {} unchanged, {} failed.",
		report.written(),
		report.unchanged(),
		report.failed()
	);
}

fn run_render(cli: &SpawnSyncCli, args: &RenderArgs) -> Result<(), Box<dyn std::error::Error>> {
	let root = resolve_root(cli);
	let inputs = resolve_inputs(&root, &args.inputs)?;
	let build = load_and_build(&inputs, &args.inputs.provenance, cli.verbose)?;

	let Some(page) = build.pages.iter().find(|page| page.entity_id == args.entity) else {
		return Err(SyncError::UnknownEntity(args.entity.clone()).into());
	};

	print!("{}", page.content);

	Ok(())
}

/// Print a unified diff between two strings, colorized.
fn print_diff(current: &str, expected: &str) {
	let diff = TextDiff::from_lines(current, expected);
	for change in diff.iter_all_changes() {
		match change.tag() {
			ChangeTag::Delete => {
				eprint!("  {}", colored!(format!("-{change}"), red));
			}
			ChangeTag::Insert => {
				eprint!("  {}", colored!(format!("+{change}"), green));
			}
			ChangeTag::Equal => {
				eprint!("   {change}");
			}
		}
	}
}
