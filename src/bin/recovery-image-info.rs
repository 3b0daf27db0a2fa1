use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use recovery_image_info::config::{load_config, Config};
use recovery_image_info::{ImageSet, RecoveryImageInfo};
use tracing_subscriber::EnvFilter;

fn usage() -> &'static str {
    "Usage:\n  recovery-image-info show <ramdisk_dir> <images_dir> [--arch <arch>] [--json] [--config <path>]\n  recovery-image-info kernel-name <images_dir> <arch> [--config <path>]"
}

#[derive(Debug, Default)]
struct Options {
    positional: Vec<String>,
    arch: Option<String>,
    json: bool,
    config: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        bail!(usage());
    };
    let options = parse_options(rest)?;
    let config = load_config(options.config.as_deref())?;

    match (command.as_str(), options.positional.as_slice()) {
        ("show", [ramdisk, images]) => show(
            Path::new(ramdisk),
            Path::new(images),
            options.arch.as_deref().or(config.arch.as_deref()),
            options.json,
            &config,
        ),
        ("kernel-name", [images, arch]) => {
            if options.json || options.arch.is_some() {
                bail!(usage());
            }
            kernel_name(Path::new(images), &normalize_arch(arch)?, &config)
        }
        _ => bail!(usage()),
    }
}

fn parse_options(args: &[String]) -> Result<Options> {
    let mut options = Options::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--json" => options.json = true,
            "--arch" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--arch requires a value"))?;
                options.arch = Some(normalize_arch(value)?);
            }
            "--config" => {
                let value = iter
                    .next()
                    .ok_or_else(|| anyhow::anyhow!("--config requires a value"))?;
                options.config = Some(PathBuf::from(value));
            }
            other if other.starts_with("--") => {
                bail!("unknown option '{}'\n{}", other, usage())
            }
            _ => options.positional.push(arg.clone()),
        }
    }
    Ok(options)
}

fn normalize_arch(arch: &str) -> Result<String> {
    let arch = arch.trim().to_ascii_lowercase();
    if arch.is_empty() {
        bail!("architecture must not be empty");
    }
    Ok(arch)
}

fn read_info(ramdisk: &Path, images: &Path, config: &Config) -> Result<RecoveryImageInfo> {
    let set = ImageSet::with_image_name(images, config.image_name.as_str());
    RecoveryImageInfo::from_image_set(ramdisk, &set).with_context(|| {
        format!(
            "reading {} metadata from '{}'",
            config.image_name,
            images.display()
        )
    })
}

fn show(
    ramdisk: &Path,
    images: &Path,
    arch: Option<&str>,
    json: bool,
    config: &Config,
) -> Result<()> {
    let mut info = read_info(ramdisk, images, config)?;
    if let Some(arch) = arch {
        info.derive_kernel_name(arch);
    }

    if json {
        let rendered =
            serde_json::to_string_pretty(&info).context("serializing recovery metadata")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("ramdisk_path: {}", info.ramdisk_path().display());
    println!("images_path: {}", info.images_path().display());
    println!("has_kernel: {}", info.has_kernel());
    println!("has_dt_image: {}", info.has_dt_image());
    println!("has_dtb_image: {}", info.has_dtb_image());
    println!("has_dtbo_image: {}", info.has_dtbo_image());
    println!("base_address: {}", info.base_address());
    println!("board_name: {}", info.board_name());
    println!("cmdline: {}", info.cmdline());
    println!("header_version: {}", info.header_version());
    println!("recovery_size: {}", info.recovery_size());
    println!("pagesize: {}", info.pagesize());
    println!("ramdisk_compression: {}", info.ramdisk_compression());
    println!("ramdisk_offset: {}", info.ramdisk_offset());
    println!("tags_offset: {}", info.tags_offset());
    if let Some(kernel) = info.kernel_name() {
        println!("kernel_name: {kernel}");
    }
    Ok(())
}

fn kernel_name(images: &Path, arch: &str, config: &Config) -> Result<()> {
    let ramdisk = images
        .parent()
        .map(|parent| parent.join("ramdisk"))
        .unwrap_or_else(|| PathBuf::from("ramdisk"));
    let mut info = read_info(&ramdisk, images, config)?;
    let name = info.derive_kernel_name(arch);
    if !name.is_empty() {
        println!("{name}");
    }
    Ok(())
}
