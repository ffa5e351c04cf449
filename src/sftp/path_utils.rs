//! Remote path helpers
//!
//! Remote SFTP paths always use `/` as separator (per the SFTP protocol),
//! regardless of either side's platform.

/// Join remote SFTP path components using `/`.
pub fn join_remote_path(base: &str, component: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, component)
    } else {
        format!("{}/{}", base, component)
    }
}

/// Split a file name into stem and extension.
///
/// The leading dot of a dotfile belongs to the stem: `.bashrc` has no
/// extension, `archive.tar.gz` splits at the last dot.
pub fn split_stem_ext(name: &str) -> (&str, Option<&str>) {
    match name.rfind('.').filter(|&i| i > 0) {
        Some(i) => (&name[..i], Some(&name[i + 1..])),
        None => (name, None),
    }
}
