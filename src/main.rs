//! Browse an object-storage bucket as a read-only directory tree.
use std::path::PathBuf;
use std::time::UNIX_EPOCH;

use bucket_fs::client::LocalDirClient;
use bucket_fs::fs::{Anchor, BucketFs, Entry, FsError, Handle};
use clap::{Parser, Subcommand};
use thiserror::Error;
use tokio::io::AsyncWriteExt as _;
use tracing::{debug, error};

mod app_config;
mod trc;

use crate::app_config::Config;
use crate::trc::Trc;

#[derive(Parser)]
#[command(version, about = "Read-only filesystem view over an object-storage bucket.")]
struct Args {
    #[arg(
        short,
        long,
        value_parser,
        help = "Optional path to a bucket-fs config TOML."
    )]
    config_path: Option<PathBuf>,

    /// Bucket to browse, overriding the configuration.
    #[arg(short, long)]
    bucket: Option<String>,

    /// Log span events and full records.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List a directory.
    Ls {
        #[arg(default_value = ".")]
        path: String,
    },

    /// Show metadata for a file or directory.
    Stat { path: String },

    /// Write a file's contents to stdout.
    Cat {
        path: String,

        /// Start reading at this byte offset.
        #[arg(long)]
        offset: Option<u64>,
    },

    /// Recursively list everything below a directory.
    Tree {
        #[arg(default_value = ".")]
        path: String,
    },
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Fs(#[from] FsError),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("offset {0} does not fit a seek")]
    OffsetTooLarge(u64),
}

fn format_entry(entry: &Entry) -> String {
    let kind = if entry.is_dir() { 'd' } else { '-' };
    let secs = entry
        .mod_time()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    format!("{kind} {:>12} {secs:>12} {}", entry.size(), entry.name())
}

async fn run(fs: BucketFs<LocalDirClient>, command: Command) -> Result<(), CliError> {
    let mut stdout = tokio::io::stdout();
    match command {
        Command::Ls { path } => {
            for entry in fs.read_dir(&path).await? {
                stdout
                    .write_all(format!("{}\n", format_entry(&entry)).as_bytes())
                    .await?;
            }
        }
        Command::Stat { path } => {
            let entry = fs.stat(&path).await?;
            let text = format!(
                "name: {}\nkind: {:?}\nsize: {}\nmode: {:?}\nmodified: {}\n",
                entry.name(),
                entry.kind(),
                entry.size(),
                entry.mode(),
                entry
                    .mod_time()
                    .duration_since(UNIX_EPOCH)
                    .map_or(0, |d| d.as_secs()),
            );
            stdout.write_all(text.as_bytes()).await?;
        }
        Command::Cat { path, offset } => {
            let mut file = match fs.open(&path).await? {
                Handle::File(file) => file,
                Handle::Dir(dir) => {
                    return Err(FsError {
                        op: bucket_fs::fs::Op::Read,
                        path: dir.path().to_owned(),
                        kind: bucket_fs::fs::ErrorKind::IsADirectory,
                    }
                    .into());
                }
            };
            if let Some(offset) = offset
                && let Some(seekable) = file.as_seekable()
            {
                let offset = i64::try_from(offset).map_err(|_| CliError::OffsetTooLarge(offset))?;
                seekable.seek(offset, Anchor::Start).await?;
            }
            let mut buf = vec![0u8; 64 * 1024];
            loop {
                let n = file.read(&mut buf).await?;
                if n == 0 {
                    break;
                }
                stdout.write_all(&buf[..n]).await?;
            }
        }
        Command::Tree { path } => {
            for (p, entry) in fs.walk(&path).await? {
                let suffix = if entry.is_dir() && p != "." { "/" } else { "" };
                stdout.write_all(format!("{p}{suffix}\n").as_bytes()).await?;
            }
        }
    }
    stdout.flush().await?;
    Ok(())
}

/// Main entry point for the application.
fn main() {
    let args = Args::parse();

    // Errors use eprintln since tracing isn't initialized yet.
    let mut config = Config::load(args.config_path.as_deref()).unwrap_or_else(|e| {
        eprintln!("Failed to load configuration: {e}");
        std::process::exit(1);
    });
    if let Some(bucket) = args.bucket {
        config.bucket = bucket;
    }
    if let Err(error_messages) = config.validate() {
        eprintln!("Configuration is invalid.");
        for msg in &error_messages {
            eprintln!(" - {msg}");
        }
        std::process::exit(1);
    }

    if let Err(e) = Trc::default().verbose(args.verbose).init() {
        eprintln!("Failed to initialize logging: {e}");
        std::process::exit(1);
    }
    debug!(config = ?config, "Loaded configuration.");

    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            error!("Failed to start the async runtime: {e}");
            std::process::exit(1);
        }
    };

    // Seeking needs a seekable handle even when the configuration does not ask for one.
    let seekable = config.seekable || matches!(args.command, Command::Cat { offset: Some(_), .. });
    let client = LocalDirClient::new(config.store.root.clone());
    let mut fs: BucketFs<LocalDirClient> = if seekable {
        BucketFs::new_seekable(client, config.bucket.clone())
    } else {
        BucketFs::new(client, config.bucket.clone())
    };
    if let Some(page_size) = config.listing.page_size {
        fs = fs.with_page_size(page_size);
    }

    if let Err(e) = runtime.block_on(run(fs, args.command)) {
        error!("{e}");
        std::process::exit(1);
    }
}
