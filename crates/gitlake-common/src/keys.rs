//! Pure key and path derivations shared by landing, curation, and blob upload.
//!
//! Every derived identifier in the pipeline comes from these functions so the
//! curated `storage_path` column and the key blob extraction uploads to can
//! never drift apart.

/// Bucket holding mirrored file blobs.
pub const BLOB_BUCKET: &str = "repositories";

/// Landing-table key for one file changed by one commit.
///
/// Path separators in the filename are flattened so the id stays unique per
/// commit+file without colliding with the `/` convention of other keys.
pub fn composite_file_id(commit_sha: &str, filename: &str) -> String {
    format!("{}_{}", commit_sha, filename.replace('/', "_"))
}

/// File format of a commit-file landing id: everything after the first `.`.
///
/// An id without a `.` (e.g. `abc123_Makefile`) comes back whole, matching
/// the curated projection `SUBSTR(id, STRPOS(id, '.') + 1)`, where a zero
/// `STRPOS` leaves the substring at the start of the id.
pub fn file_format(id: &str) -> &str {
    match id.find('.') {
        Some(pos) => &id[pos + 1..],
        None => id,
    }
}

/// Object key for a blob at a given revision.
///
/// Path separators inside `repo_id` and `file_path` are normalized to `_` so
/// they cannot collide with the key delimiters.
pub fn blob_object_key(repo_id: &str, commit_sha: &str, file_path: &str) -> String {
    format!(
        "{}/{}/{}",
        repo_id.replace('/', "_"),
        commit_sha,
        file_path.replace('/', "_")
    )
}

/// Curated `storage_path` value: the blob object key under its bucket.
pub fn storage_path(repo_id: &str, commit_sha: &str, file_path: &str) -> String {
    format!(
        "{}/{}",
        BLOB_BUCKET,
        blob_object_key(repo_id, commit_sha, file_path)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composite_id_flattens_path_separators() {
        let id = composite_file_id("abc123", "src/storage/mod.rs");
        assert_eq!(id, "abc123_src_storage_mod.rs");
    }

    #[test]
    fn file_format_takes_substring_after_first_dot() {
        assert_eq!(file_format("abc123_src_mod.rs"), "rs");
        assert_eq!(file_format("abc123_archive.tar.gz"), "tar.gz");
    }

    #[test]
    fn file_format_without_dot_yields_the_whole_id() {
        // STRPOS of 0 in the curated projection means SUBSTR from position 1.
        assert_eq!(file_format("abc123_Makefile"), "abc123_Makefile");
    }

    #[test]
    fn file_format_of_composite_id_matches_extension() {
        let id = composite_file_id("deadbeef", "docs/guide/intro.md");
        assert_eq!(file_format(&id), "md");
    }

    #[test]
    fn object_key_is_deterministic_and_normalized() {
        let key = blob_object_key("rust-lang/rust", "abc123", "src/lib.rs");
        assert_eq!(key, "rust-lang_rust/abc123/src_lib.rs");
        // Same inputs, same key.
        assert_eq!(key, blob_object_key("rust-lang/rust", "abc123", "src/lib.rs"));
    }

    #[test]
    fn storage_path_round_trips_with_object_key() {
        let path = storage_path("rust-lang/rust", "abc123", "src/lib.rs");
        let key = blob_object_key("rust-lang/rust", "abc123", "src/lib.rs");
        assert_eq!(path, format!("{}/{}", BLOB_BUCKET, key));
    }
}
