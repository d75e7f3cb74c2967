//! Image directory naming rules
//!
//! The remote host stores installed images under `<base_dir>/<name>`, where
//! the name follows the `vendor-version` convention. Resolutions that break
//! the convention are rejected here, before any network call.

use crate::{Error, Result};

/// Validate an operator-chosen image name.
///
/// The name must be non-empty, contain a hyphen separating a non-empty
/// vendor part from a non-empty version part, and must be usable as a
/// single directory component on the remote host.
pub fn validate_image_name(name: &str) -> Result<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(Error::InvalidName("name must not be empty".to_string()));
    }

    if name.contains(['/', '\\']) || name.contains(char::is_whitespace) {
        return Err(Error::InvalidName(format!(
            "{name:?} must be a single directory name without spaces"
        )));
    }

    // vendor-version: at least one hyphen with content on both sides
    let Some((vendor, version)) = name.split_once('-') else {
        return Err(Error::InvalidName(format!(
            "{name:?} must contain a hyphen separating vendor and version (e.g. vios-15.6)"
        )));
    };

    if vendor.is_empty() || version.is_empty() {
        return Err(Error::InvalidName(format!(
            "{name:?} must have a vendor and a version around the hyphen"
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("vios-15.6"; "plain vendor version")]
    #[test_case("vendor-2.0"; "free form override")]
    #[test_case("csr1000vng-universalk9.16.09.07"; "long qemu folder")]
    #[test_case("iol-l2-15.2"; "multiple hyphens")]
    #[test_case("  vios-1.0  "; "surrounding whitespace is trimmed")]
    fn test_accepts(name: &str) {
        assert!(validate_image_name(name).is_ok());
    }

    #[test_case(""; "empty")]
    #[test_case("   "; "blank")]
    #[test_case("vios"; "no separator")]
    #[test_case("-15.6"; "missing vendor")]
    #[test_case("vios-"; "missing version")]
    #[test_case("vios 15.6"; "inner whitespace")]
    #[test_case("qemu/vios-15.6"; "path separator")]
    #[test_case("vios\\15-6"; "backslash")]
    fn test_rejects(name: &str) {
        assert!(matches!(
            validate_image_name(name),
            Err(Error::InvalidName(_))
        ));
    }
}
