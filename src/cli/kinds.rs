//! Kinds command implementation.

use clap::Args;
use serde::Serialize;

use crate::observer::EventKind;

/// Arguments for the kinds command
#[derive(Args)]
pub struct KindsArgs {
    /// Print as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct KindInfo {
    name: &'static str,
    mask: u32,
    system_only: bool,
    permissions: &'static [&'static str],
    slot_selector: bool,
    min_slot_id: i32,
}

impl From<EventKind> for KindInfo {
    fn from(kind: EventKind) -> Self {
        Self {
            name: kind.as_str(),
            mask: kind.mask(),
            system_only: kind.is_system_only(),
            permissions: kind.required_permissions(),
            slot_selector: kind.accepts_slot_selector(),
            min_slot_id: kind.min_slot_id(),
        }
    }
}

/// Run the kinds command
pub async fn run(args: KindsArgs) -> anyhow::Result<()> {
    let kinds: Vec<KindInfo> = EventKind::ALL.into_iter().map(KindInfo::from).collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&kinds)?);
        return Ok(());
    }

    println!("{:<36} {:<8} {:<8} {:<6} {}", "Event", "Mask", "System", "Slot", "Permissions");
    println!("{}", "-".repeat(100));

    for kind in &kinds {
        let permissions = if kind.permissions.is_empty() {
            "-".to_string()
        } else {
            kind.permissions.join(", ")
        };
        let slot = if kind.slot_selector {
            format!(">={}", kind.min_slot_id)
        } else {
            "none".to_string()
        };
        println!(
            "{:<36} {:<8} {:<8} {:<6} {}",
            kind.name,
            format!("{:#06x}", kind.mask),
            if kind.system_only { "yes" } else { "no" },
            slot,
            permissions
        );
    }

    Ok(())
}
