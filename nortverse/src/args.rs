use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use url::Url;

#[derive(Parser, Debug)]
pub struct Download {
    /// Url of the first issue to download
    #[clap(long, default_value = "https://nortverse.com/comic/overconfidence/")]
    pub start_url: String,
    /// Only download the first issue, don't follow the next links
    #[clap(long)]
    pub single: bool,
    /// Minimum pause between two issues, in seconds
    #[clap(long, default_value = "60")]
    pub sleep_min: u64,
    /// Maximum pause between two issues, in seconds
    #[clap(long, default_value = "70")]
    pub sleep_max: u64,
    /// Replace the archives that already exist instead of skipping them
    #[clap(long)]
    pub overwrite: bool,
    /// Directory the archives are written to
    #[clap(short, long, default_value = "download")]
    pub output: Utf8PathBuf,
    /// FlareSolverr endpoint every request goes through, e.g. `http://localhost:8191`
    #[clap(long, env = "FLARESOLVERR_URL")]
    pub flaresolverr: Option<Url>,
    /// Request timeout, in seconds
    #[clap(long, default_value = "60")]
    pub timeout: u64,
}

#[derive(Subcommand, Debug)]
pub enum Subcommands {
    /// Download every issue from the start url onward, one cbz per issue
    #[clap(alias = "d")]
    Download(Download),
}

#[derive(Parser, Debug)]
#[clap(about, author, version)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Subcommands,
}
