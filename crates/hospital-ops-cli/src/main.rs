use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hospital_ops_core::console::StdConsole;
use hospital_ops_core::{HospitalCore, Role, StaffLookup, StoreConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod menu;

use menu::Menu;

#[derive(Parser)]
#[command(name = "hospital")]
#[command(about = "Hospital operations console")]
struct Cli {
    /// Directory holding the table files
    #[arg(long, env = "HOSPITAL_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Patient menu
    Patient {
        /// Patient ID
        id: String,
    },
    /// Doctor menu
    Doctor {
        /// Staff ID
        id: String,
    },
    /// Pharmacist menu
    Pharmacist {
        /// Staff ID
        id: String,
    },
    /// Administrator menu
    Admin {
        /// Staff ID
        id: String,
    },
    /// List operations that were interrupted part-way
    Journal {
        /// Clear the marker with this transaction ID after checking the tables by hand
        #[arg(long)]
        acknowledge: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so they don't interleave with the menus.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = StoreConfig::new(&cli.data_dir)?;
    let core = HospitalCore::open(config)
        .with_context(|| format!("opening data directory {}", cli.data_dir.display()))?;
    tracing::debug!(data_dir = %cli.data_dir.display(), "store opened");

    let (mut input, mut output) = (StdConsole, StdConsole);

    match cli.command {
        Commands::Patient { id } => {
            let patient = core
                .directory()
                .find_account(&id)?
                .filter(|account| matches!(account.role, Role::Patient(_)))
                .with_context(|| format!("no patient with ID {}", id))?;
            Menu::new(&core, &mut input, &mut output).patient(&patient)
        }
        Commands::Doctor { id } => {
            let account = staff_account(&core, &id)?;
            match account.role {
                Role::Doctor(_) => Menu::new(&core, &mut input, &mut output).doctor(&account),
                ref other => bail!("{} is registered as {}, not Doctor", id, other.label()),
            }
        }
        Commands::Pharmacist { id } => {
            let account = staff_account(&core, &id)?;
            match account.role {
                Role::Pharmacist(_) => {
                    Menu::new(&core, &mut input, &mut output).pharmacist(&account)
                }
                ref other => bail!("{} is registered as {}, not Pharmacist", id, other.label()),
            }
        }
        Commands::Admin { id } => {
            let account = staff_account(&core, &id)?;
            match account.role {
                Role::Administrator(_) => {
                    Menu::new(&core, &mut input, &mut output).administrator(&account)
                }
                ref other => bail!(
                    "{} is registered as {}, not Administrator",
                    id,
                    other.label()
                ),
            }
        }
        Commands::Journal { acknowledge } => journal(&core, acknowledge),
    }
}

fn staff_account(core: &HospitalCore, id: &str) -> anyhow::Result<hospital_ops_core::Account> {
    core.directory()
        .find_staff(id)?
        .with_context(|| format!("no staff member with ID {}", id))
}

fn journal(core: &HospitalCore, acknowledge: Option<String>) -> anyhow::Result<()> {
    if let Some(tx_id) = acknowledge {
        if !core.store().acknowledge_operation(&tx_id)? {
            bail!("no interrupted operation with ID {}", tx_id);
        }
        println!("Cleared {}", tx_id);
        return Ok(());
    }

    let entries = core.incomplete_operations()?;
    if entries.is_empty() {
        println!("No interrupted operations.");
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {}  {}  started {}",
            entry.tx_id, entry.operation, entry.subject, entry.started_at
        );
    }
    Ok(())
}
