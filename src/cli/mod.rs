//! CLI utilities shared by the imxfuse binary
//!
//! No stability guaranties apply

use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use clap::Args;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Table};
use dialoguer::Confirm;
use log::info;
use miette::{Result, WrapErr};
use strum::IntoEnumIterator;

use crate::{
    cli::config::Config,
    device::FuseDevice,
    error::Error,
    fuses::{
        bootcfg::{BootConfig, BootConfigField},
        lock::{self, Lock, LockState},
        mac::MacAddress,
        srk::SrkHash,
        FuseWord,
    },
};

pub mod config;

/// Selects the fuse storage to operate on.
#[derive(Debug, Args)]
pub struct DeviceArgs {
    /// Path to the OCOTP nvmem device
    #[arg(short = 'd', long, env = "IMXFUSE_DEVICE")]
    pub device: Option<PathBuf>,

    /// Operate on an nvmem image captured from a device instead of the
    /// live fuses (skips the SoC compatibility check)
    #[arg(long, conflicts_with = "device")]
    pub image: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub device_args: DeviceArgs,

    /// Path to the SRK_1_2_3_4_fuse.bin file to compare against
    #[arg(short = 'f', long)]
    pub fuse_file: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ProgramArgs {
    #[command(flatten)]
    pub device_args: DeviceArgs,

    /// Path to the SRK_1_2_3_4_fuse.bin file to program
    #[arg(short = 'f', long)]
    pub fuse_file: Option<PathBuf>,

    /// Program the fuses without asking for confirmation
    #[arg(long)]
    pub no_confirm: bool,
}

#[derive(Debug, Args)]
pub struct WriteMacArgs {
    #[command(flatten)]
    pub device_args: DeviceArgs,

    /// MAC address to program, as six ':'-separated hex octets
    #[arg(value_parser = MacAddress::from_str)]
    pub mac: MacAddress,

    /// Program the fuses without asking for confirmation
    #[arg(long)]
    pub no_confirm: bool,
}

#[derive(Debug, Args)]
pub struct LockArgs {
    #[command(flatten)]
    pub device_args: DeviceArgs,

    /// Lock to change
    #[arg(value_enum)]
    pub lock: Lock,

    /// Protection state to apply
    #[arg(value_enum)]
    pub state: LockState,

    /// Apply the change even if it would relax protection that is
    /// already in effect
    #[arg(long)]
    pub force_relax: bool,

    /// Change the lock without asking for confirmation
    #[arg(long)]
    pub no_confirm: bool,
}

fn open_device(args: &DeviceArgs, config: &Config, readonly: bool) -> Result<FuseDevice> {
    let device = if let Some(image) = &args.image {
        FuseDevice::open_image(image, readonly)
    } else {
        let path = args.device.as_deref().or(config.device.as_deref());
        FuseDevice::open(path, readonly)
    };
    Ok(device?)
}

/// Loads a desired SRK hash from the 32-byte fuse file produced by the
/// code-signing tool.
fn load_srk_hash(path: &Path) -> Result<SrkHash, Error> {
    let data = fs::read(path)?;
    let bytes: [u8; 32] = data.as_slice().try_into().map_err(|_| {
        Error::InvalidFuseFile {
            path: path.to_path_buf(),
            len: data.len(),
        }
    })?;
    Ok(SrkHash::from_bytes(bytes))
}

fn confirm(prompt: &str, no_confirm: bool) -> Result<bool, Error> {
    if no_confirm {
        return Ok(true);
    }
    Ok(Confirm::new().with_prompt(prompt).default(false).interact()?)
}

/// Display the security-relevant fuse settings.
pub fn show(args: ShowArgs, config: &Config) -> Result<()> {
    let desired = match args.fuse_file.as_deref().or(config.fuse_file.as_deref()) {
        Some(path) => Some(
            load_srk_hash(path)
                .wrap_err_with(|| format!("Failed to load SRK hash from {}", path.display()))?,
        ),
        None => None,
    };
    let mut device = open_device(&args.device_args, config, true)?;

    let srk = SrkHash::read(&mut device)?;
    let bootcfg = BootConfig::read(&mut device)?;
    let mac = MacAddress::read(&mut device)?;
    let lock_word = lock::read_locks(&mut device)?;

    for (i, word) in srk.words().iter().enumerate() {
        println!("SRK_HASH[{i}]: {word:08x}");
    }
    println!();
    if !srk.is_programmed() {
        println!("No SRK hashes programmed.");
    } else if let Some(desired) = desired {
        if srk == desired {
            println!("SRK fuses match desired programming.");
        } else {
            println!("SRK fuses DO NOT MATCH desired programming.");
        }
    }
    println!();

    let flags = [
        (BootConfigField::JtagDisable, "JTAG disabled:"),
        (BootConfigField::SecureConfig, "Secure config closed:"),
        (BootConfigField::ReservedModesDisable, "NXP reserved modes disabled:"),
        (BootConfigField::BootFromFuses, "Boot from fuses enabled:"),
        (BootConfigField::WatchdogEnable, "Watchdog enabled:"),
        (BootConfigField::TzascEnable, "TZASC enabled:"),
    ];
    for (field, label) in flags {
        let value = bootcfg.flag(field)?;
        println!("{label:<32} {}", if value { "YES" } else { "NO" });
    }
    let (wdog_enabled, timeout_secs) = bootcfg.watchdog();
    if wdog_enabled {
        println!("{:<32} {timeout_secs}", "Watchdog timeout (seconds):");
    }
    println!("{:<32} {mac}", "MAC address:");
    println!();

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_header(vec!["Lock", "State"]);
    for lock in Lock::iter() {
        table.add_row(vec![
            lock.to_string(),
            lock::lock_state(lock_word, lock).to_string(),
        ]);
    }
    println!("{table}");

    Ok(())
}

/// Print every fuse word in the map, with its offset and raw value.
pub fn dump(args: DeviceArgs, config: &Config) -> Result<()> {
    let mut device = open_device(&args, config, true)?;
    for word in FuseWord::iter() {
        let value = device.read_word(word)?;
        println!("{:<12} {:#06x}: {value:08x}", word.to_string(), word.offset());
    }
    Ok(())
}

/// Program the SRK hash fuses from a fuse file.
pub fn program(args: ProgramArgs, config: &Config) -> Result<()> {
    let path = args
        .fuse_file
        .as_deref()
        .or(config.fuse_file.as_deref())
        .ok_or_else(|| Error::InvalidArgument("no fuse file given".to_string()))?;
    let desired = load_srk_hash(path)
        .wrap_err_with(|| format!("Failed to load SRK hash from {}", path.display()))?;

    let mut device = open_device(&args.device_args, config, false)?;
    let current = SrkHash::read(&mut device)?;
    if current == desired {
        info!("SRK fuses already match desired programming");
        return Ok(());
    }

    if !confirm(
        "Programming the SRK fuses is permanent. Continue?",
        args.no_confirm,
    )? {
        return Err(Error::Cancelled.into());
    }
    desired.program(&mut device)?;
    info!("SRK fuses programmed");

    Ok(())
}

/// Program the MAC address fuses.
pub fn write_mac(args: WriteMacArgs, config: &Config) -> Result<()> {
    let mut device = open_device(&args.device_args, config, false)?;
    let current = MacAddress::read(&mut device)?;
    if current == args.mac {
        info!("MAC address fuses already hold {current}");
        return Ok(());
    }

    if !confirm(
        &format!("Program MAC address {} permanently?", args.mac),
        args.no_confirm,
    )? {
        return Err(Error::Cancelled.into());
    }
    args.mac.program(&mut device)?;
    info!("MAC address programmed");

    Ok(())
}

/// Change the protection state of a fuse lock.
pub fn lock(args: LockArgs, config: &Config) -> Result<()> {
    let mut device = open_device(&args.device_args, config, false)?;
    let mut lock_word = lock::read_locks(&mut device)?;

    let current = lock::lock_state(lock_word, args.lock);
    if current == args.state {
        info!("{} lock is already {}", args.lock, args.state);
        return Ok(());
    }
    if current.relaxes(args.state) && !args.force_relax {
        return Err(Error::InvalidArgument(format!(
            "changing the {} lock from {current} to {} would relax protection; \
             pass --force-relax to try anyway",
            args.lock, args.state
        ))
        .into());
    }

    if !confirm(
        &format!("Set the {} lock to {} permanently?", args.lock, args.state),
        args.no_confirm,
    )? {
        return Err(Error::Cancelled.into());
    }
    lock::set_lock_state(args.lock, args.state, &mut lock_word)?;
    lock::update_locks(&mut device, lock_word)?;
    info!("{} lock set to {}", args.lock, args.state);

    Ok(())
}
