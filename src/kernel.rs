//! Kernel image naming.
//!
//! Device trees for ARM kernels either ship as separate `dt`/`dtb` images or
//! are appended to the kernel, in which case the kernel is named with a
//! `-dtb` suffix.

/// Kernel image used when the architecture is not recognised.
pub const DEFAULT_KERNEL_IMAGE: &str = "zImage";

/// Suffix for kernels carrying an appended device tree.
pub const APPENDED_DTB_SUFFIX: &str = "-dtb";

/// Kernel image filename conventionally produced for `arch`.
///
/// Unknown architectures fall back to [`DEFAULT_KERNEL_IMAGE`].
pub fn kernel_image_for_arch(arch: &str) -> &'static str {
    match arch {
        "arm" => "zImage",
        "arm64" => "Image.gz",
        "x86" | "x86_64" => "bzImage",
        _ => DEFAULT_KERNEL_IMAGE,
    }
}

/// Whether kernels for `arch` carry an appended device tree when the image
/// has no separate one.
pub fn uses_appended_dtb(arch: &str) -> bool {
    matches!(arch, "arm" | "arm64")
}

/// Full kernel filename for `arch`.
///
/// `has_separate_dt` is true when the image ships a `dt` or `dtb` file.
pub fn kernel_name_for(arch: &str, has_separate_dt: bool) -> String {
    let mut name = kernel_image_for_arch(arch).to_string();
    if uses_appended_dtb(arch) && !has_separate_dt {
        name.push_str(APPENDED_DTB_SUFFIX);
    }
    name
}
