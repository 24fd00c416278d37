use clap::{Args, Parser, Subcommand};
use mj_core::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "mj-cli")]
#[command(about = "Typeset math through the embedded MathJax bundles")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Convert(ConvertArgs),
    Metadata(MetadataArgs),
}

#[derive(Debug, Args)]
pub(crate) struct ConvertArgs {
    #[arg(long = "function")]
    pub(crate) function: String,
    #[arg(long = "bundles-dir")]
    pub(crate) bundles_dir: String,
    #[arg(long = "lockfile")]
    pub(crate) lockfile: String,
    #[arg(long = "expect")]
    pub(crate) expect: Option<String>,
    #[arg(long = "preload")]
    pub(crate) preload: Vec<OutputFormat>,
    /// Typeset as inline math instead of display math.
    #[arg(long = "inline")]
    pub(crate) inline: bool,
    #[arg(required = true)]
    pub(crate) inputs: Vec<String>,
}

#[derive(Debug, Args)]
pub(crate) struct MetadataArgs {
    #[arg(long = "lockfile")]
    pub(crate) lockfile: String,
    /// Also check the pinned version against this one.
    #[arg(long = "expect")]
    pub(crate) expect: Option<String>,
}
