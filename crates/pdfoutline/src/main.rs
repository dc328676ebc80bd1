use crate::prelude::*;
use clap::Parser;

mod batch;
mod error;
mod explain;
mod extract;
mod fragments;
mod lexicon;
mod prelude;
mod settings;

#[derive(Debug, clap::Parser)]
#[command(
    author,
    version,
    about,
    long_about = "Extract a title and H1-H3 heading outline from PDF documents"
)]
pub struct App {
    #[command(subcommand)]
    pub command: SubCommands,

    #[clap(flatten)]
    global: Global,
}

#[derive(Debug, Clone, clap::Args)]
pub struct Global {
    /// TOML file overriding the default extraction settings
    #[clap(long, env = "PDFOUTLINE_CONFIG", global = true)]
    config: Option<std::path::PathBuf>,

    /// Whether to display additional information.
    #[clap(long, env = "PDFOUTLINE_VERBOSE", global = true, default_value = "false")]
    verbose: bool,
}

#[derive(Debug, clap::Parser)]
pub enum SubCommands {
    /// Extract the outline of a single PDF
    Extract(crate::extract::Options),

    /// Extract outlines for every PDF in a directory
    Batch(crate::batch::Options),

    /// Show every heading candidate with its score and decision
    Explain(crate::explain::Options),

    /// Dump the decoded text fragments of a PDF
    Fragments(crate::fragments::Options),

    /// Print the effective heading lexicon as TOML
    Lexicon(crate::lexicon::Options),

    /// Print the effective extraction settings as TOML
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let app = App::parse();

    let default_filter = if app.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    color_eyre::install()?;

    match app.command {
        SubCommands::Extract(options) => crate::extract::run(options, app.global).await,
        SubCommands::Batch(options) => crate::batch::run(options, app.global).await,
        SubCommands::Explain(options) => crate::explain::run(options, app.global).await,
        SubCommands::Fragments(options) => crate::fragments::run(options, app.global).await,
        SubCommands::Lexicon(options) => crate::lexicon::run(options, app.global).await,
        SubCommands::Config => crate::settings::run(app.global).await,
    }
    .map_err(|err: color_eyre::eyre::Report| eyre!(err))
}
