use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use relmap_index::{AllAccessible, FsStorage, GitVcs, MapIndex, MapWatcher, Progress};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "relmap", version, about = "Query and update release map files")]
struct Cli {
    /// Watched map directory.
    #[arg(long, default_value = "maps")]
    dir: PathBuf,

    /// Repository root used for commits (defaults to the map directory's
    /// parent).
    #[arg(long)]
    repo: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the map entry for a project.
    Entry { project: String },

    /// Resolve tags for projects, in input order.
    Tags {
        projects: Vec<String>,
        #[arg(long)]
        json: bool,
    },

    /// List tracked map files.
    Files {
        /// Only files with at least one reachable project.
        #[arg(long)]
        valid: bool,
    },

    /// Rewrite a project's tag inside its owning map file.
    Update { project: String, tag: String },

    /// Commit the watched directory.
    Commit {
        #[arg(short, long)]
        message: String,
    },

    /// Watch the map directory and keep the index reconciled until
    /// interrupted.
    Watch,
}

#[derive(Serialize)]
struct TagRow {
    project: String,
    tag: String,
}

struct LogProgress;

impl Progress for LogProgress {
    fn subtask(&self, message: &str) {
        log::info!("{message}");
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let repo_root = cli.repo.clone().unwrap_or_else(|| match cli.dir.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    });
    let index = Arc::new(
        MapIndex::open(
            &cli.dir,
            Arc::new(FsStorage::new()),
            Arc::new(GitVcs::new(repo_root)),
            Arc::new(AllAccessible),
        )
        .with_context(|| format!("failed to index map directory {}", cli.dir.display()))?,
    );

    match cli.command {
        Command::Entry { project } => {
            let Some(entry) = index.map_entry(&project) else {
                bail!("no map entry for {project}");
            };
            println!("{}={}", entry.project_id(), entry.tag());
        }
        Command::Tags { projects, json } => {
            let ids: Vec<&str> = projects.iter().map(String::as_str).collect();
            let Some(tags) = index.tags_for(&ids) else {
                bail!("no projects given");
            };
            if json {
                let rows: Vec<TagRow> = projects
                    .iter()
                    .zip(&tags)
                    .map(|(project, tag)| TagRow {
                        project: project.clone(),
                        tag: tag.clone(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&rows)?);
            } else {
                for (project, tag) in projects.iter().zip(&tags) {
                    println!("{project}={tag}");
                }
            }
        }
        Command::Files { valid } => {
            let files = if valid {
                index.valid_map_files()
            } else {
                index.map_files()
            };
            match files {
                None => println!("no map project configured under {}", cli.dir.display()),
                Some(files) => {
                    for file in files {
                        println!("{} ({} entries)", file.path().display(), file.entries().len());
                    }
                }
            }
        }
        Command::Update { project, tag } => {
            index
                .request_tag_update(&project, &tag)
                .with_context(|| format!("failed to update {project}"))?;
            println!("{project} -> {tag}");
        }
        Command::Commit { message } => {
            index
                .commit(&message, &LogProgress)
                .context("commit failed")?;
            println!("committed {}", cli.dir.display());
        }
        Command::Watch => {
            let _watcher = MapWatcher::start(index.clone(), Duration::from_secs(2))
                .context("failed to start watcher")?;
            log::info!("watching {}", cli.dir.display());
            loop {
                std::thread::sleep(Duration::from_secs(60));
            }
        }
    }

    Ok(())
}
