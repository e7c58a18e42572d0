use std::path::PathBuf;

use clap::Args;
use clap::Parser;
use clap::Subcommand;

#[derive(Parser)]
#[command(
	author,
	version,
	about = "Keep wiki spawn documentation synchronized with datapack spawn files.",
	long_about = "spawnsync renders one canonical wiki page per catalogued entity from the \
	              datapack's spawn-definition files, compares each page against the live wiki, \
	              and rewrites only the pages whose content actually changed.\n\nQuick start:\n  \
	              spawnsync sync --dry-run   Preview which pages would be considered\n  spawnsync \
	              sync               Push changed pages to the wiki\n  spawnsync render --entity \
	              ID Print one entity's canonical page"
)]
pub struct SpawnSyncCli {
	#[command(subcommand)]
	pub command: Option<Commands>,

	/// Path to the project root directory.
	#[arg(long, short, global = true)]
	pub path: Option<PathBuf>,

	/// Enable verbose output.
	#[arg(long, short, global = true, default_value_t = false)]
	pub verbose: bool,

	/// Disable colored output.
	#[arg(long, global = true, default_value_t = false)]
	pub no_color: bool,
}

#[derive(Subcommand)]
pub enum Commands {
	/// Push changed spawn pages to the wiki.
	///
	/// Loads the catalog and every spawn-definition file, renders the canonical
	/// page for each catalogued entity, fetches the current remote content and
	/// writes back only the pages that differ. Unchanged pages are never
	/// touched, so repeated runs over the same inputs write nothing.
	///
	/// Exits non-zero when the catalog cannot be loaded, no usable spawn
	/// records exist, the wiki rejects the credentials, or any page write
	/// fails.
	Sync(SyncArgs),
	/// Print the canonical page for one entity to stdout.
	///
	/// Renders entirely from local inputs without contacting the wiki. Useful
	/// for previewing markup changes before a real sync run.
	Render(RenderArgs),
}

#[derive(Args)]
pub struct SyncArgs {
	#[command(flatten)]
	pub inputs: InputArgs,

	/// Base URL of the wiki, with or without the XML-RPC path suffix.
	#[arg(long, env = "SPAWNSYNC_URL")]
	pub url: Option<String>,

	/// Wiki user to authenticate as.
	#[arg(long, env = "SPAWNSYNC_USER")]
	pub user: Option<String>,

	/// Password for the wiki user.
	#[arg(long, env = "SPAWNSYNC_PASSWORD", hide_env_values = true)]
	pub password: Option<String>,

	/// Preview which pages would be considered without any remote call.
	#[arg(long, default_value_t = false)]
	pub dry_run: bool,

	/// Show a unified diff for each written page.
	#[arg(long, default_value_t = false)]
	pub diff: bool,

	/// Skip TLS certificate verification when talking to the wiki.
	#[arg(long, default_value_t = false)]
	pub insecure: bool,
}

#[derive(Args)]
pub struct RenderArgs {
	/// Entity id to render the page for.
	#[arg(long)]
	pub entity: String,

	#[command(flatten)]
	pub inputs: InputArgs,
}

/// Input selection shared by every subcommand. Anything left unset falls back
/// to `spawnsync.toml` and then to the built-in defaults.
#[derive(Args)]
pub struct InputArgs {
	/// Path to the catalog file mapping entity ids to display metadata.
	#[arg(long)]
	pub catalog: Option<PathBuf>,

	/// Directory containing spawn-definition files.
	#[arg(long)]
	pub spawn_dir: Option<PathBuf>,

	/// Namespace prefix under which all pages are created.
	#[arg(long)]
	pub namespace: Option<String>,

	/// Provenance marker embedded in every generated page, typically the
	/// triggering commit hash.
	#[arg(long, default_value = "local")]
	pub provenance: String,
}
