//! Public URLs for files kept on the external storage disk.
//!
//! Uploads themselves are handled elsewhere; records only carry the path
//! relative to the public disk.

/// Prefix under which the public storage disk is served.
pub const STORAGE_PREFIX: &str = "/storage";

/// Substituted whenever a user has no avatar.
pub const AVATAR_PLACEHOLDER: &str =
  "/storage/images/placeholders/avatar-placeholder.png";

/// Map a stored relative path to its public URL.
pub fn public_url(path: &str) -> String {
  format!("{STORAGE_PREFIX}/{}", path.trim_start_matches('/'))
}

/// Avatar URL for an optional stored avatar path.
pub fn avatar_url(path: Option<&str>) -> String {
  match path {
    Some(p) if !p.is_empty() => public_url(p),
    _ => AVATAR_PLACEHOLDER.to_owned(),
  }
}
