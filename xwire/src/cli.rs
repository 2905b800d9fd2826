//! Command-line entry for programs wired with xwire.
//!
//! ```text
//! my-app --dependencies 'fake_users, fake_payments'
//! XWIRE_DEPENDENCIES=fake_payments my-app --explain
//! ```

use clap::Parser;
use tracing::info;

use xwire_container::{
    ActiveEnvironments, Dependencies, Entrypoint, SelectionMode, Settings, WireError, global,
};

use crate::logging::init_tracing;

/// Flags understood by [`run`].
#[derive(Parser, Debug, Clone, Default)]
#[command(about = "Run an entry point with name-based dependency wiring")]
pub struct Args {
    /// Environments to activate, comma-separated, most specific last
    #[arg(long, env = "XWIRE_DEPENDENCIES", value_name = "ENVS")]
    pub dependencies: Option<ActiveEnvironments>,

    /// Fail instead of picking the latest of several active environments
    #[arg(long)]
    pub strict: bool,

    /// Print which provider every dependency resolves to before running
    #[arg(long)]
    pub explain: bool,

    /// Debug logging for the xwire crates
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Run settings described by the flags.
    pub fn settings(&self) -> Settings {
        Settings {
            environments: self.dependencies.clone().unwrap_or_default(),
            selection: if self.strict {
                SelectionMode::Strict
            } else {
                SelectionMode::LatestWins
            },
        }
    }
}

/// Parses the process arguments, sets up logging and runs `entrypoint`
/// against the global registry.
pub fn run<F, T, E>(entrypoint: &Entrypoint<F>) -> Result<T, E>
where
    F: Fn(&Dependencies) -> Result<T, E>,
    E: From<WireError>,
{
    let args = Args::parse();
    init_tracing(args.verbose);
    run_with(&args, entrypoint)
}

/// Runs `entrypoint` against the global registry with parsed `args`.
pub fn run_with<F, T, E>(args: &Args, entrypoint: &Entrypoint<F>) -> Result<T, E>
where
    F: Fn(&Dependencies) -> Result<T, E>,
    E: From<WireError>,
{
    let container = global::container(args.settings());
    info!(
        environments = %container.settings().environments,
        selection = %container.settings().selection,
        "Configured run"
    );

    if args.explain {
        let plan = container.plan(entrypoint.parameters())?;
        eprint!("{}", plan.render());
    }

    container.run(entrypoint)
}
