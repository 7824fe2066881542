use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "labhub")]
#[command(about = "Lab hub integration: result decryption, orders, requisitions and compendium")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to ./labhub.toml when present)
    #[arg(short, long, global = true, env = "LABHUB_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List files in a directory with size, modification time and encryption hint
    List(ListArgs),
    /// Decrypt a stored result file to stdout or to a file
    Decrypt(DecryptArgs),
    /// Request an access token from the hub
    Token(TokenArgs),
    /// Transmit an HL7 order, then fetch its requisition if enabled
    Transmit(OrderArgs),
    /// Fetch the requisition documents for an order (with retry)
    Requisition(OrderArgs),
    /// Retrieve pending HL7 results
    Results,
    /// Compendium listing, download and import
    Compendium(CompendiumArgs),
    /// Results retrieval background service flag
    Service(ServiceArgs),
}

#[derive(clap::Args)]
pub struct ListArgs {
    /// Directory to inspect
    pub directory: PathBuf,
}

#[derive(clap::Args)]
pub struct DecryptArgs {
    /// Encrypted result file
    pub input: PathBuf,
    /// Output file (stdout when omitted)
    pub output: Option<PathBuf>,
}

#[derive(clap::Args)]
pub struct TokenArgs {
    /// Print the access token itself
    #[arg(long)]
    pub show: bool,
}

#[derive(clap::Args)]
pub struct OrderArgs {
    /// HL7 order file
    pub hl7: PathBuf,
    /// Host order id
    #[arg(long)]
    pub order_id: i64,
    /// Host patient id
    #[arg(long, default_value_t = 0)]
    pub patient_id: i64,
    /// Billing type code (T = third party, P = patient, C = client)
    #[arg(long, default_value = "C")]
    pub billing_type: String,
    /// ABN flag recorded on the order (e.g. required, not_required)
    #[arg(long, default_value = "not_required")]
    pub abn: String,
}

#[derive(clap::Args)]
pub struct CompendiumArgs {
    #[command(subcommand)]
    pub command: CompendiumCommands,
}

#[derive(Subcommand)]
pub enum CompendiumCommands {
    /// Show the compendium files the hub offers
    List,
    /// Download the full dataset and import it
    Sync,
    /// Import previously extracted compendium files
    Import(ImportArgs),
}

#[derive(clap::Args)]
pub struct ImportArgs {
    /// Directory holding ORDCODE_<receiver>.TXT and AOE_<receiver>.TXT
    pub directory: PathBuf,
}

#[derive(clap::Args)]
pub struct ServiceArgs {
    #[command(subcommand)]
    pub command: ServiceCommands,
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    Enable,
    Disable,
    Status,
}
