use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for gridstream")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all checks: fmt, clippy, tests, doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Run the streaming reconciliation benchmark
    Bench,
    /// Author a demo world, then walk across it
    Demo {
        /// Folder to write the demo world into
        #[arg(long, default_value = "target/demo-world")]
        root: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            cargo("fmt --check", &["fmt", "--all", "--", "--check"])?;
            run_clippy()?;
            cargo("test", &["test", "--workspace"])?;
            cargo("doc", &["doc", "--workspace", "--no-deps"])?;
        }
        Commands::Fmt => cargo("fmt --check", &["fmt", "--all", "--", "--check"])?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => cargo("test", &["test", "--workspace"])?,
        Commands::Doc => cargo("doc", &["doc", "--workspace", "--no-deps"])?,
        Commands::Bench => cargo("bench", &["bench", "-p", "gridstream-stream"])?,
        Commands::Demo { root } => run_demo(&root)?,
    }

    Ok(())
}

fn cargo(label: &str, args: &[&str]) -> Result<()> {
    println!("==> Running cargo {label}");
    let status = Command::new("cargo").args(args).status()?;
    if !status.success() {
        anyhow::bail!("cargo {label} failed");
    }
    Ok(())
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )
}

fn run_demo(root: &std::path::Path) -> Result<()> {
    let root = root.to_string_lossy().into_owned();
    let root = root.as_str();
    let cli = ["run", "-q", "-p", "gridstream-cli", "--"];
    let author = [
        "author", "--root", root, "--world", "Demo", "--size-x", "6", "--size-z", "6",
        "--size-y", "2", "--mode", "positive-xz", "--toggle", "0", "--write", "overwrite",
    ];
    let walk = [
        "walk", "--root", root, "--world", "Demo", "--from", "10,10,10", "--to",
        "1500,10,1500", "--ticks", "400", "--cooldown", "5",
    ];
    cargo("run (author)", &[&cli[..], &author[..]].concat())?;
    cargo("run (walk)", &[&cli[..], &walk[..]].concat())
}
