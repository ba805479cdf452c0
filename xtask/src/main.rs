use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::Command;

#[derive(Parser)]
#[command(name = "xtask", about = "Workspace automation for keystone")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run fmt, clippy, tests and doc
    Check,
    /// Run cargo fmt --check on all crates
    Fmt,
    /// Run clippy on all crates
    Clippy,
    /// Run all tests
    Test,
    /// Build rustdoc for the workspace
    Doc,
    /// Run the CLI demo, save its scene, then validate and inspect the file
    Smoke {
        /// Where to write the demo scene
        #[arg(long, default_value = "target/smoke.scene.json")]
        out: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Check => {
            run_fmt()?;
            run_clippy()?;
            run_tests()?;
            run_doc()?;
        }
        Commands::Fmt => run_fmt()?,
        Commands::Clippy => run_clippy()?,
        Commands::Test => run_tests()?,
        Commands::Doc => run_doc()?,
        Commands::Smoke { out } => run_smoke(&out)?,
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

fn run_fmt() -> Result<()> {
    cargo("fmt --check", &["fmt", "--all", "--", "--check"])
}

fn run_clippy() -> Result<()> {
    cargo(
        "clippy",
        &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
    )
}

fn run_tests() -> Result<()> {
    cargo("test", &["test", "--workspace"])
}

fn run_doc() -> Result<()> {
    cargo("doc", &["doc", "--workspace", "--no-deps"])
}

fn run_smoke(out: &std::path::Path) -> Result<()> {
    let out = out.to_string_lossy().into_owned();
    let out = out.as_str();
    let cli = ["run", "--quiet", "-p", "keystone-cli", "--"];

    let demo: Vec<&str> = cli.iter().copied().chain(["demo", "--save", out]).collect();
    cargo("run keystone-cli demo", &demo)?;

    let validate: Vec<&str> = cli.iter().copied().chain(["validate", out]).collect();
    cargo("run keystone-cli validate", &validate)?;

    let inspect: Vec<&str> = cli.iter().copied().chain(["inspect", out]).collect();
    cargo("run keystone-cli inspect", &inspect)
}
