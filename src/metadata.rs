//! Recovery image metadata.
//!
//! [`RecoveryImageInfo`] is populated from an unpacked image in a single pass
//! over [`PROBES`](crate::images::PROBES). Only the kernel name changes after
//! construction, through [`RecoveryImageInfo::derive_kernel_name`].
//!
//! # Example
//!
//! ```rust,ignore
//! use recovery_image_info::RecoveryImageInfo;
//!
//! let mut info = RecoveryImageInfo::read("work/ramdisk", "work/split_img")?;
//! println!("board: {}", info.board_name());
//! println!("kernel: {}", info.derive_kernel_name("arm64"));
//! ```

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{debug, info};

use crate::error::MetadataError;
use crate::images::{Flag, ImageSet, Text, Value, PROBES};
use crate::kernel::kernel_name_for;

#[derive(Debug, Clone, Default, Serialize)]
pub struct RecoveryImageInfo {
    ramdisk_path: PathBuf,
    images_path: PathBuf,
    has_kernel: bool,
    has_dt_image: bool,
    has_dtb_image: bool,
    has_dtbo_image: bool,
    base_address: String,
    board_name: String,
    cmdline: String,
    header_version: String,
    recovery_size: String,
    pagesize: String,
    ramdisk_compression: String,
    ramdisk_offset: String,
    tags_offset: String,
    kernel_name: Option<String>,
}

impl RecoveryImageInfo {
    /// Read metadata from `recovery.img-*` files under `images_path`.
    ///
    /// `ramdisk_path` is recorded for callers and never read.
    pub fn read(
        ramdisk_path: impl Into<PathBuf>,
        images_path: impl Into<PathBuf>,
    ) -> Result<Self, MetadataError> {
        Self::from_image_set(ramdisk_path, &ImageSet::new(images_path))
    }

    /// Read metadata from an image set with any image name.
    pub fn from_image_set(
        ramdisk_path: impl Into<PathBuf>,
        images: &ImageSet,
    ) -> Result<Self, MetadataError> {
        let mut info = Self {
            ramdisk_path: ramdisk_path.into(),
            images_path: images.dir().to_path_buf(),
            ..Self::default()
        };

        for (suffix, probe) in PROBES {
            match images.probe(suffix, *probe)? {
                Value::Flag(flag, present) => *info.flag_mut(flag) = present,
                Value::Text(text, value) => *info.text_mut(text) = value,
            }
        }

        info!(
            images = %info.images_path.display(),
            board = %info.board_name,
            header_version = %info.header_version,
            has_kernel = info.has_kernel,
            "read recovery image metadata"
        );
        Ok(info)
    }

    fn flag_mut(&mut self, flag: Flag) -> &mut bool {
        match flag {
            Flag::Kernel => &mut self.has_kernel,
            Flag::DtImage => &mut self.has_dt_image,
            Flag::DtbImage => &mut self.has_dtb_image,
            Flag::DtboImage => &mut self.has_dtbo_image,
        }
    }

    fn text_mut(&mut self, text: Text) -> &mut String {
        match text {
            Text::BaseAddress => &mut self.base_address,
            Text::BoardName => &mut self.board_name,
            Text::Cmdline => &mut self.cmdline,
            Text::HeaderVersion => &mut self.header_version,
            Text::RecoverySize => &mut self.recovery_size,
            Text::Pagesize => &mut self.pagesize,
            Text::RamdiskCompression => &mut self.ramdisk_compression,
            Text::RamdiskOffset => &mut self.ramdisk_offset,
            Text::TagsOffset => &mut self.tags_offset,
        }
    }

    /// Derive and store the kernel image filename for `arch`.
    ///
    /// Returns an empty string, and stores nothing, if the image has no
    /// kernel.
    pub fn derive_kernel_name(&mut self, arch: &str) -> &str {
        if !self.has_kernel {
            return "";
        }
        let name = kernel_name_for(arch, self.has_dt_image || self.has_dtb_image);
        debug!(arch, kernel = %name, "derived kernel name");
        self.kernel_name.insert(name).as_str()
    }

    /// Kernel name from the last [`derive_kernel_name`](Self::derive_kernel_name).
    pub fn kernel_name(&self) -> Option<&str> {
        self.kernel_name.as_deref()
    }

    pub fn ramdisk_path(&self) -> &Path {
        &self.ramdisk_path
    }

    pub fn images_path(&self) -> &Path {
        &self.images_path
    }

    pub fn has_kernel(&self) -> bool {
        self.has_kernel
    }

    pub fn has_dt_image(&self) -> bool {
        self.has_dt_image
    }

    pub fn has_dtb_image(&self) -> bool {
        self.has_dtb_image
    }

    pub fn has_dtbo_image(&self) -> bool {
        self.has_dtbo_image
    }

    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    pub fn board_name(&self) -> &str {
        &self.board_name
    }

    pub fn cmdline(&self) -> &str {
        &self.cmdline
    }

    /// Boot image header version, `"0"` for unpacks that predate the field.
    pub fn header_version(&self) -> &str {
        &self.header_version
    }

    /// Original image size.
    pub fn recovery_size(&self) -> &str {
        &self.recovery_size
    }

    pub fn pagesize(&self) -> &str {
        &self.pagesize
    }

    pub fn ramdisk_compression(&self) -> &str {
        &self.ramdisk_compression
    }

    pub fn ramdisk_offset(&self) -> &str {
        &self.ramdisk_offset
    }

    pub fn tags_offset(&self) -> &str {
        &self.tags_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const REQUIRED: &[&str] = &[
        "base",
        "board",
        "cmdline",
        "origsize",
        "pagesize",
        "ramdiskcomp",
        "ramdisk_offset",
        "tags_offset",
    ];

    fn write_image(dir: &Path, name: &str, suffix: &str, content: &str) {
        fs::write(dir.join(format!("{name}-{suffix}")), content).unwrap();
    }

    fn write_required(dir: &Path, name: &str) {
        write_image(dir, name, "base", "0x10000000\n");
        write_image(dir, name, "board", "SRPRI17C014KU\n");
        write_image(dir, name, "cmdline", "console=ttyMSM0,115200n8\n");
        write_image(dir, name, "origsize", "67108864\n");
        write_image(dir, name, "pagesize", "4096\n");
        write_image(dir, name, "ramdiskcomp", "gzip\n");
        write_image(dir, name, "ramdisk_offset", "0x01000000\n");
        write_image(dir, name, "tags_offset", "0x00000100\n");
    }

    fn images_with(payloads: &[&str]) -> tempfile::TempDir {
        let temp_dir = tempfile::tempdir().unwrap();
        write_required(temp_dir.path(), "recovery.img");
        for payload in payloads {
            write_image(temp_dir.path(), "recovery.img", payload, "\u{0}payload");
        }
        temp_dir
    }

    #[test]
    fn test_read_populates_fields() {
        let images = images_with(&["zImage", "dtbo"]);
        let info = RecoveryImageInfo::read("/work/ramdisk", images.path()).unwrap();

        assert!(info.has_kernel());
        assert!(!info.has_dt_image());
        assert!(!info.has_dtb_image());
        assert!(info.has_dtbo_image());
        assert_eq!(info.base_address(), "0x10000000");
        assert_eq!(info.board_name(), "SRPRI17C014KU");
        assert_eq!(info.cmdline(), "console=ttyMSM0,115200n8");
        assert_eq!(info.recovery_size(), "67108864");
        assert_eq!(info.pagesize(), "4096");
        assert_eq!(info.ramdisk_compression(), "gzip");
        assert_eq!(info.ramdisk_offset(), "0x01000000");
        assert_eq!(info.tags_offset(), "0x00000100");
        assert_eq!(info.ramdisk_path(), Path::new("/work/ramdisk"));
        assert_eq!(info.images_path(), images.path());
        assert_eq!(info.kernel_name(), None);
    }

    #[test]
    fn test_missing_required_file_is_file_access_error() {
        for suffix in REQUIRED {
            let images = images_with(&[]);
            let path = images.path().join(format!("recovery.img-{suffix}"));
            fs::remove_file(&path).unwrap();

            let err = RecoveryImageInfo::read("ramdisk", images.path()).unwrap_err();
            assert!(
                matches!(err, MetadataError::FileAccess { .. }),
                "{suffix}: {err:?}"
            );
            assert_eq!(err.path(), path.as_path());
        }
    }

    #[test]
    fn test_empty_required_file_is_empty_content_error() {
        for suffix in REQUIRED {
            let images = images_with(&[]);
            let path = images.path().join(format!("recovery.img-{suffix}"));
            fs::write(&path, "").unwrap();

            let err = RecoveryImageInfo::read("ramdisk", images.path()).unwrap_err();
            assert!(
                matches!(err, MetadataError::EmptyContent { .. }),
                "{suffix}: {err:?}"
            );
            assert_eq!(err.path(), path.as_path());
        }
    }

    #[test]
    fn test_header_version_defaults_to_zero() {
        let images = images_with(&[]);
        let info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.header_version(), "0");
    }

    #[test]
    fn test_header_version_read_when_present() {
        let images = images_with(&[]);
        write_image(images.path(), "recovery.img", "header_version", "2\n");
        let info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.header_version(), "2");
    }

    #[test]
    fn test_empty_header_version_is_error() {
        let images = images_with(&[]);
        write_image(images.path(), "recovery.img", "header_version", "");
        let err = RecoveryImageInfo::read("ramdisk", images.path()).unwrap_err();
        assert!(matches!(err, MetadataError::EmptyContent { .. }));
    }

    #[test]
    fn test_multiline_cmdline_keeps_first_line() {
        let images = images_with(&[]);
        write_image(
            images.path(),
            "recovery.img",
            "cmdline",
            "console=ttyS0\nextra=ignored\n",
        );
        let info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.cmdline(), "console=ttyS0");
    }

    #[test]
    fn test_no_kernel_derives_empty_name() {
        let images = images_with(&["dtb"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.derive_kernel_name("arm64"), "");
        assert_eq!(info.kernel_name(), None);
    }

    #[test]
    fn test_arm_without_device_tree_appends_dtb() {
        let images = images_with(&["zImage"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.derive_kernel_name("arm"), "zImage-dtb");
        assert_eq!(info.kernel_name(), Some("zImage-dtb"));
    }

    #[test]
    fn test_arm64_with_dtb_keeps_plain_name() {
        let images = images_with(&["zImage", "dtb"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.derive_kernel_name("arm64"), "Image.gz");
    }

    #[test]
    fn test_arm64_with_dt_keeps_plain_name() {
        let images = images_with(&["zImage", "dt"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.derive_kernel_name("arm64"), "Image.gz");
    }

    #[test]
    fn test_x86_and_unknown_arch() {
        let images = images_with(&["zImage"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        assert_eq!(info.derive_kernel_name("x86_64"), "bzImage");
        assert_eq!(info.derive_kernel_name("mips"), "zImage");
        assert_eq!(info.kernel_name(), Some("zImage"));
    }

    #[test]
    fn test_derive_kernel_name_is_idempotent() {
        let images = images_with(&["zImage"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        let first = info.derive_kernel_name("arm64").to_string();
        assert_eq!(info.derive_kernel_name("arm64"), first);
        assert_eq!(info.kernel_name(), Some(first.as_str()));
    }

    #[test]
    fn test_fields_fixed_after_construction() {
        let images = images_with(&[]);
        let info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        write_image(images.path(), "recovery.img", "zImage", "kernel");
        write_image(images.path(), "recovery.img", "board", "other\n");
        assert!(!info.has_kernel());
        assert_eq!(info.board_name(), "SRPRI17C014KU");
    }

    #[test]
    fn test_custom_image_name() {
        let temp_dir = tempfile::tempdir().unwrap();
        write_required(temp_dir.path(), "boot.img");
        write_image(temp_dir.path(), "boot.img", "zImage", "kernel");

        let set = ImageSet::with_image_name(temp_dir.path(), "boot.img");
        let info = RecoveryImageInfo::from_image_set("ramdisk", &set).unwrap();
        assert!(info.has_kernel());
        assert_eq!(info.pagesize(), "4096");

        // The default reader only looks for recovery.img files.
        assert!(RecoveryImageInfo::read("ramdisk", temp_dir.path()).is_err());
    }

    #[test]
    fn test_serializes_to_json() {
        let images = images_with(&["zImage"]);
        let mut info = RecoveryImageInfo::read("ramdisk", images.path()).unwrap();
        info.derive_kernel_name("arm");

        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["board_name"], "SRPRI17C014KU");
        assert_eq!(json["has_kernel"], true);
        assert_eq!(json["header_version"], "0");
        assert_eq!(json["kernel_name"], "zImage-dtb");
    }
}
