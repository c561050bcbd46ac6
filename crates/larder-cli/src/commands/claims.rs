// Claim cache commands
//
// Operate on one actor's filesystem-backed claim cache. Output is JSON on
// stdout; logs go to stderr.

use crate::config::LarderConfig;
use anyhow::Result;
use clap::{Args, Subcommand};
use larder_core::{ActorId, ClaimId, ClaimStatus, DonationId, DonationStatus};
use larder_store::{ClaimStore, CreateOutcome, DonationSnapshot, FilesystemStorage};
use std::sync::Arc;
use tracing::info;

#[derive(Args)]
pub struct ClaimsArgs {
    /// Actor whose cache to use
    #[arg(long)]
    pub actor: String,

    #[command(subcommand)]
    pub command: ClaimsCommand,
}

#[derive(Subcommand)]
pub enum ClaimsCommand {
    /// List cached claims
    List,

    /// Claim a donation
    Create {
        /// Donation id
        #[arg(long)]
        donation: String,

        /// Donor id
        #[arg(long)]
        owner: String,

        /// Listing title
        #[arg(long, default_value = "")]
        title: String,

        /// Pickup location
        #[arg(long)]
        pickup: Option<String>,

        /// Pickup code payload
        #[arg(long)]
        qr: Option<String>,
    },

    /// Change a claim's status
    Status {
        /// Claim id
        claim_id: String,

        /// New status (pending, picked_up, cancelled)
        status: ClaimStatus,
    },

    /// Remove a claim
    Delete {
        /// Claim id
        claim_id: String,
    },

    /// Remove every cached claim
    Clear,

    /// Remove every claim on a donation that expired or was cancelled
    Invalidate {
        /// Donation id
        donation_id: String,
    },
}

pub async fn handle_claims_command(args: ClaimsArgs, config: &LarderConfig) -> Result<()> {
    let storage = FilesystemStorage::new(config.storage_dir())?;
    let store = ClaimStore::new(Arc::new(storage), ActorId::new(args.actor), &config.store)?;

    match args.command {
        ClaimsCommand::List => {
            let claims = store.list_claims().await;
            println!("{}", serde_json::to_string_pretty(&claims)?);
        }
        ClaimsCommand::Create {
            donation,
            owner,
            title,
            pickup,
            qr,
        } => {
            let snapshot = DonationSnapshot {
                id: DonationId::new(donation),
                owner_id: ActorId::new(owner),
                title,
                status: DonationStatus::Available,
                expiry_date: None,
                pickup_location: pickup,
            };
            match store.create_claim(snapshot, qr).await? {
                CreateOutcome::Created(entry) => {
                    println!("{}", serde_json::to_string_pretty(&entry)?);
                }
                CreateOutcome::AlreadyClaimed { existing } => {
                    anyhow::bail!("donation already claimed by {existing}");
                }
            }
        }
        ClaimsCommand::Status { claim_id, status } => {
            let claim_id = ClaimId::new(claim_id);
            if !store.update_claim_status(&claim_id, status).await? {
                anyhow::bail!("no cached claim {claim_id}");
            }
            info!(%claim_id, %status, "Status updated");
        }
        ClaimsCommand::Delete { claim_id } => {
            let claim_id = ClaimId::new(claim_id);
            if !store.delete_claim(&claim_id).await? {
                anyhow::bail!("no cached claim {claim_id}");
            }
        }
        ClaimsCommand::Clear => {
            store.clear_all().await?;
        }
        ClaimsCommand::Invalidate { donation_id } => {
            let removed = store
                .invalidate_donation(&DonationId::new(donation_id))
                .await?;
            println!("{removed}");
        }
    }
    Ok(())
}
