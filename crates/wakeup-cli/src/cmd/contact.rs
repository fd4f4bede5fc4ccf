use crate::output::print_json;
use clap::Subcommand;
use std::path::Path;
use wakeup_core::model::{ContactRelation, ContactStatus};
use wakeup_core::store::WakeupStore;

#[derive(Subcommand)]
pub enum ContactSubcommand {
    /// Record a contact request from one subscriber to another
    Add {
        requester: String,
        target: String,
        /// Record the request as already accepted
        #[arg(long)]
        accepted: bool,
    },
}

pub fn run(root: &Path, subcmd: ContactSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ContactSubcommand::Add {
            requester,
            target,
            accepted,
        } => {
            let db = super::open_db(root)?;
            let from = super::subscriber_by_name(&db, &requester)?;
            let to = super::subscriber_by_name(&db, &target)?;
            if from.id == to.id {
                anyhow::bail!("a subscriber cannot add themselves as a contact");
            }
            let status = if accepted {
                ContactStatus::Accepted
            } else {
                ContactStatus::Pending
            };
            let contact = ContactRelation::new(from.id, to.id, status);
            db.insert_contact(&contact)?;
            if json {
                print_json(&contact)
            } else {
                println!("Contact {requester} -> {target}: {status}");
                Ok(())
            }
        }
    }
}
