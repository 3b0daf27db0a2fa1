//! Metadata from unpacked Android recovery images.
//!
//! Image unpackers such as Android Image Kitchen split a recovery image into
//! a directory of `recovery.img-<suffix>` files: one per boot image header
//! field, plus the kernel and device tree payloads. This crate reads those
//! files back into typed metadata and picks the kernel filename a device tree
//! should reference.
//!
//! # Architecture
//!
//! ```text
//! split_img/recovery.img-*
//!     │
//!     ├── images    suffix → path helper, probe table, first-line reads
//!     ├── metadata  RecoveryImageInfo, built in one pass over the probe table
//!     └── kernel    arch → kernel image name, appended-dtb rule
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use recovery_image_info::RecoveryImageInfo;
//!
//! let mut info = RecoveryImageInfo::read("aik/ramdisk", "aik/split_img")?;
//! if info.has_kernel() {
//!     println!("kernel: {}", info.derive_kernel_name("arm64"));
//! }
//! ```

pub mod config;
pub mod error;
pub mod images;
pub mod kernel;
pub mod metadata;

pub use error::MetadataError;
pub use images::ImageSet;
pub use metadata::RecoveryImageInfo;
