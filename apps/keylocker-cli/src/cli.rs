use clap::Parser;

/// A steganographic key vault: a single opaque file or device region that
/// stores the keys and byte ranges of hidden encrypted partitions such
/// that, without the right password, it is indistinguishable from random
/// noise.
#[derive(Debug, Parser)]
#[command(name = "keylocker", version, about, long_about = None)]
pub struct Cli {
    /// Initialize a new hidden region and KeyFile at the given start/length
    /// inside `keyfile_target`, then write one entry into it. Absent,
    /// `keylocker` attempts to recover an existing entry instead.
    #[arg(long, num_args = 2, value_names = ["START", "LENGTH"])]
    pub create: Option<Vec<String>>,

    /// Override the default Shamir parameters, as "N/T" (e.g. "7/4").
    #[arg(long, value_name = "N/T", conflicts_with = "plain")]
    pub shamir: Option<String>,

    /// Select plain mode with this many redundant copies, instead of Shamir.
    #[arg(long, value_name = "COPIES", conflicts_with = "shamir")]
    pub plain: Option<u8>,

    /// Use double-size (128-byte) slots.
    #[arg(long)]
    pub extended: bool,

    /// Path to the file or device holding the opaque KeyFile blob.
    pub keyfile_target: String,

    /// Path to the device or partition this entry's hidden volume lives on.
    pub device_target: String,

    /// Optional free-text label stored alongside the entry.
    pub entry_label: Option<String>,
}
