use std::{path::PathBuf, time::Duration};

use anyhow::Error;
use clap::{Parser, Subcommand};
use claim::SessionConfig;
use kiosk::{ClaimArgs, run_claim, run_items, run_report};
use registry::{FoundItemForm, ItemFilter};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Base URL of the lost and found server.
    #[arg(long, env = "KIOSK_SERVER", default_value = "http://localhost:1111")]
    server: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List unclaimed items.
    Items {
        #[arg(long, default_value = "")]
        query: String,

        #[arg(long, default_value = "")]
        category: String,

        #[arg(long, default_value = "")]
        location: String,
    },

    /// Report a found item.
    Report {
        #[arg(long)]
        student: String,

        #[arg(long)]
        password: String,

        #[arg(long)]
        name: String,

        #[arg(long)]
        category: String,

        #[arg(long)]
        location: String,

        #[arg(long)]
        photo: Option<PathBuf>,
    },

    /// Claim an item with a Face ID capture.
    Claim {
        #[arg(long)]
        item: u64,

        #[arg(long)]
        student: String,

        /// Folder of stills played back as the camera feed.
        #[arg(long)]
        frames: PathBuf,

        #[arg(long, default_value_t = 100)]
        poll_ms: u64,

        #[arg(long, default_value_t = 500)]
        backoff_ms: u64,

        #[arg(long, default_value_t = 5000)]
        override_ms: u64,

        #[arg(long, default_value_t = 10)]
        fps: u32,
    },
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let args = Args::parse();

    match args.command {
        Command::Items {
            query,
            category,
            location,
        } => {
            let filter = ItemFilter {
                query,
                category,
                location,
            };
            run_items(&args.server, filter).await
        }
        Command::Report {
            student,
            password,
            name,
            category,
            location,
            photo,
        } => {
            let form = FoundItemForm {
                student_number: student,
                password,
                item_name: name,
                category,
                location,
            };
            run_report(&args.server, form, photo).await
        }
        Command::Claim {
            item,
            student,
            frames,
            poll_ms,
            backoff_ms,
            override_ms,
            fps,
        } => {
            let session = SessionConfig {
                poll_interval: Duration::from_millis(poll_ms),
                detector_backoff: Duration::from_millis(backoff_ms),
                manual_override_after: Duration::from_millis(override_ms),
            };
            let claim = ClaimArgs {
                item_id: item,
                student_number: student,
                frames,
                fps,
                session,
            };
            run_claim(&args.server, claim).await
        }
    }
}
