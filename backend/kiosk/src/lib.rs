//! # Kiosk
//!
//! Desk-side CLI for the lost and found backend.
//!
//! ## Commands
//!
//! - `items`: list unclaimed items, optionally filtered
//! - `report`: submit a found item with an optional photo
//! - `claim`: run a Face ID claim session for one item and print the receipt
//!
//! ## Claim Session
//!
//! 1. Fetch the student directory and the item from the server
//! 2. Open the camera, a folder of stills played back by [`camera::DirectoryCamera`]
//! 3. Spinner shows the readiness label until capture is allowed
//! 4. Capture, submit once, print the receipt
//!
//! No detector model ships with the kiosk, so capture opens through the
//! manual override. Ctrl+C at any point cancels the session and closes the camera.
use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Error, bail};
use claim::{
    ClaimOutcome, ClaimServices, ClaimSession, HttpClaimEndpoint, ItemReference, SessionConfig,
    UnavailableDetector,
};
use indicatif::{ProgressBar, ProgressStyle};
use registry::{
    FoundItemForm, ItemFilter, StudentDirectory,
    remote::{Photo, fetch_item, fetch_items, report_found_item},
};
use reqwest::Client;
use tokio::{fs, signal::ctrl_c};
use tracing::{info, warn};

pub mod camera;

use camera::DirectoryCamera;

pub struct ClaimArgs {
    pub item_id: u64,
    pub student_number: String,
    pub frames: PathBuf,
    pub fps: u32,
    pub session: SessionConfig,
}

pub async fn run_items(base_url: &str, filter: ItemFilter) -> Result<(), Error> {
    let client = Client::new();
    let items = fetch_items(&client, base_url, &filter).await?;

    if items.is_empty() {
        println!("No items found.");
        return Ok(());
    }

    for item in &items {
        println!(
            "#{:<4} {:<30} {:<15} {:<15} {}",
            item.id,
            item.name,
            item.category,
            item.location,
            item.date_submitted.format("%Y-%m-%d")
        );
    }
    println!("\nTotal Items: {}", items.len());

    Ok(())
}

pub async fn run_report(
    base_url: &str,
    form: FoundItemForm,
    photo: Option<PathBuf>,
) -> Result<(), Error> {
    let photo = match photo {
        Some(path) => {
            let data = fs::read(&path)
                .await
                .with_context(|| format!("reading photo {}", path.display()))?;
            let content_type = match path.extension().and_then(|ext| ext.to_str()) {
                Some(ext) if ext.eq_ignore_ascii_case("png") => "image/png",
                _ => "image/jpeg",
            };

            Some(Photo {
                data,
                content_type: content_type.to_string(),
            })
        }
        None => None,
    };

    let client = Client::new();
    let item = report_found_item(&client, base_url, &form, photo).await?;

    println!("Reported item #{}: {}", item.id, item.name);

    Ok(())
}

fn spinner() -> Result<ProgressBar, Error> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}")?);
    pb.enable_steady_tick(Duration::from_millis(100));

    Ok(pb)
}

pub async fn run_claim(base_url: &str, args: ClaimArgs) -> Result<(), Error> {
    let client = Client::new();

    let directory = StudentDirectory::fetch(&client, base_url).await?;
    let item = fetch_item(&client, base_url, args.item_id).await?;

    let services = ClaimServices {
        camera: Arc::new(DirectoryCamera::new(args.frames, args.fps)),
        detector: Arc::new(UnavailableDetector),
        directory: Arc::new(directory),
        endpoint: Arc::new(HttpClaimEndpoint::new(client, base_url)),
    };

    let session = ClaimSession::open(ItemReference::from(&item), &services, &args.session)?;
    let name = session.set_claimant(&args.student_number)?;
    println!("Claiming #{} {} for {name}", item.id, item.name);

    tokio::select! {
        result = claim(&session) => result,
        _ = ctrl_c() => {
            session.cancel();
            warn!("Claim cancelled by operator");
            bail!("claim cancelled");
        }
    }
}

async fn claim(session: &ClaimSession) -> Result<(), Error> {
    let pb = spinner()?;
    let mut readiness = session.subscribe_readiness();

    loop {
        let signal = *readiness.borrow_and_update();
        pb.set_message(signal.label());

        if signal.permits_capture() {
            break;
        }
        readiness.changed().await?;
    }

    let evidence = session.capture()?;
    pb.finish_with_message(format!("Face ID secured ({} bytes)", evidence.len()));
    info!(bytes = evidence.len(), "Evidence captured");

    match session.submit().await? {
        ClaimOutcome::Success(_) => {
            let receipt = session
                .receipt()
                .context("claim succeeded without a receipt")?;
            println!("\n{receipt}");
            Ok(())
        }
        ClaimOutcome::Failure(reason) => bail!("claim failed: {reason}"),
        ClaimOutcome::Pending => bail!("claim is still pending"),
    }
}
