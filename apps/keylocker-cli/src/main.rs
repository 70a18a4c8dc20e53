mod cli;

use std::fs::OpenOptions;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use keylocker_core::entropy::EntropySource;
use keylocker_core::entry::Entry;
use keylocker_core::keyfile;
use keylocker_core::params::{Mode, Params};
use keylocker_core::region::{self, FileRegion, PartitionResolver, Region};
use keylocker_core::{Error as CoreError, PublicError};
use keylocker_primitives::cipher::KEY_LEN;
use keylocker_primitives::kdf::KdfCost;

use cli::Cli;

const EXIT_OK: i32 = 0;
const EXIT_BAD_PASSWORD: i32 = 1;
const EXIT_IO_ERROR: i32 = 2;
const EXIT_USAGE_ERROR: i32 = 3;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run() {
        Ok(()) => std::process::exit(EXIT_OK),
        Err(err) => {
            eprintln!("keylocker: {err:#}");
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(public) = err.downcast_ref::<PublicError>() {
        return match public {
            PublicError::Io(_) => EXIT_IO_ERROR,
            PublicError::Usage(_) => EXIT_USAGE_ERROR,
            PublicError::BadPassword(_) => EXIT_BAD_PASSWORD,
        };
    }
    EXIT_USAGE_ERROR
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let mode = parse_mode(&cli)?;
    let password = rpassword::prompt_password("KeyLocker password: ").context("reading password")?;

    let resolver = SystemResolver;
    let keyfile_path = Path::new(&cli.keyfile_target);

    if let Some(create_args) = &cli.create {
        let [start_spec, length_spec] = create_args
            .clone()
            .try_into()
            .map_err(|_| anyhow::anyhow!("--create requires exactly START and LENGTH"))?;
        create_and_put(&cli, &password, keyfile_path, &start_spec, &length_spec, mode, &resolver)
    } else {
        get(&cli, &password, keyfile_path, mode)
    }
}

/// Parse the mode-selection flags. Absent both, the default Shamir (7,4)
/// applies, per spec §9.
fn parse_mode(cli: &Cli) -> Result<Mode> {
    if let Some(spec) = &cli.shamir {
        let (n_str, t_str) = spec
            .split_once('/')
            .ok_or_else(|| anyhow::anyhow!("--shamir expects the form N/T, e.g. 7/4"))?;
        let n: u8 = n_str.parse().context("parsing Shamir N")?;
        let t: u8 = t_str.parse().context("parsing Shamir T")?;
        Mode::shamir(n, t).map_err(|e| anyhow::anyhow!(e))
    } else if let Some(copies) = cli.plain {
        Mode::plain(copies).map_err(|e| anyhow::anyhow!(e))
    } else {
        Ok(Mode::default())
    }
}

fn open_region(path: &Path, base: u64, len: u64) -> Result<FileRegion> {
    let sector_size = region::sector_size_of(path);
    FileRegion::open(path, base, len, sector_size)
        .map_err(core_to_anyhow)
        .with_context(|| format!("opening region at {}", path.display()))
}

fn core_to_anyhow(err: CoreError) -> anyhow::Error {
    anyhow::Error::new(err.into_public())
}

fn file_size(path: &Path) -> Result<u64> {
    Ok(OpenOptions::new().read(true).open(path)?.metadata()?.len())
}

fn create_and_put(
    cli: &Cli,
    password: &str,
    keyfile_path: &Path,
    start_spec: &str,
    length_spec: &str,
    mode: Mode,
    resolver: &dyn PartitionResolver,
) -> Result<()> {
    let total_size = file_size(keyfile_path)?;
    let (start, length) = region::resolve_offsets(start_spec, length_spec, total_size, resolver)
        .map_err(core_to_anyhow)
        .context("resolving --create start/length")?;

    let mut entropy = EntropySource::new();
    let mut region = open_region(keyfile_path, start, length, )?;

    let params = Params::for_region_len(region.size(), cli.extended, KdfCost::production())
        .map_err(|e| anyhow::anyhow!(e))
        .context("sizing KeyFile layout")?;

    log::info!("creating a new KeyFile of {} bytes ({} slots)", params.region_len, params.slot_count);
    keyfile::create(&mut region, &mut entropy).map_err(core_to_anyhow)?;

    let device_id = cli.device_target.clone();
    let device_size = file_size(Path::new(&cli.device_target)).unwrap_or(0);
    let mut cipher_key = vec![0u8; KEY_LEN];
    entropy.fill(&mut cipher_key);

    let entry = Entry {
        device_id: device_id.clone(),
        start: 0,
        length: device_size,
        cipher_key,
        text: cli.entry_label.clone(),
    };

    keyfile::put(&mut region, &params, password.as_bytes(), &device_id, &entry, mode, &mut entropy)
        .map_err(anyhow::Error::new)?;

    println!("created KeyFile and wrote one entry for {device_id}");
    Ok(())
}

fn get(cli: &Cli, password: &str, keyfile_path: &Path, mode: Mode) -> Result<()> {
    let total_size = file_size(keyfile_path)?;
    let mut region = open_region(keyfile_path, 0, total_size)?;
    let params = Params::for_region_len(region.size(), cli.extended, KdfCost::production())
        .map_err(|e| anyhow::anyhow!(e))
        .context("sizing KeyFile layout")?;

    let device_id = cli.device_target.clone();
    let entry = keyfile::get(&mut region, &params, password.as_bytes(), &device_id, mode)
        .map_err(anyhow::Error::new)?;

    println!("device: {}", entry.device_id);
    println!("start: {}", entry.start);
    println!("length: {}", entry.length);
    println!("key: {}", hex_encode(&entry.cipher_key));
    if let Some(text) = &entry.text {
        println!("label: {text}");
    }
    Ok(())
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Resolves `<device_partition>+<delta>` offset specs against the live
/// system partition table. Kept as a thin pass-through to the platform
/// resolver — partition-table parsing itself stays an external collaborator.
struct SystemResolver;

impl PartitionResolver for SystemResolver {
    #[cfg(target_os = "linux")]
    fn resolve_partition(&self, spec: &str) -> Result<(u64, u64), CoreError> {
        region::LinuxSysfsResolver.resolve_partition(spec)
    }

    #[cfg(not(target_os = "linux"))]
    fn resolve_partition(&self, _spec: &str) -> Result<(u64, u64), CoreError> {
        Err(CoreError::Usage(
            "partition-relative offsets are only supported on Linux".to_string(),
        ))
    }
}
