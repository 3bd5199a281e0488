// Path: crates/tx/src/metadata.rs
//! IPFS pointers for DAO metadata.

use alloy_primitives::Bytes;

const IPFS_SCHEME: &str = "ipfs://";
const IPFS_MARKER: &str = "/ipfs/";

/// Reduces any accepted spelling to the bare `<cid>[/path]`.
///
/// Accepts `ipfs://<cid>`, `ipfs://ipfs/<cid>`, gateway URLs containing
/// `/ipfs/<cid>`, bare `ipfs/<cid>` and the CID itself.
pub fn normalize_ipfs_path(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    let path = if let Some(rest) = trimmed.strip_prefix(IPFS_SCHEME) {
        return normalize_ipfs_path(rest);
    } else if let Some(idx) = trimmed.find(IPFS_MARKER) {
        trimmed.get(idx + IPFS_MARKER.len()..).unwrap_or_default()
    } else if let Some(rest) = trimmed.strip_prefix("ipfs/") {
        rest
    } else {
        trimmed
    };

    let path = path.trim_start_matches('/');
    (!path.is_empty()).then_some(path)
}

/// `ipfs://<cid>`, or `None` for blank input.
pub fn cid_to_uri(cid: &str) -> Option<String> {
    normalize_ipfs_path(cid).map(|path| format!("{IPFS_SCHEME}{path}"))
}

/// The `DAOSettings.metadata` bytes: the UTF-8 `ipfs://` URI of the pinned
/// metadata document. Unrecognised input is stored as given.
pub fn metadata_pointer(cid: &str) -> Bytes {
    match cid_to_uri(cid) {
        Some(uri) => Bytes::from(uri.into_bytes()),
        None => Bytes::copy_from_slice(cid.as_bytes()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CID: &str = "bafybeigdyrzt5sfp7udm7hu76uh7y26nf3efuylqabf3oclgtqy55fbzdi";

    #[test]
    fn every_spelling_normalises_to_the_same_uri() {
        let expected = format!("ipfs://{CID}");
        for input in [
            CID.to_string(),
            format!("ipfs://{CID}"),
            format!("ipfs://ipfs/{CID}"),
            format!("/ipfs/{CID}"),
            format!("ipfs/{CID}"),
            format!("https://gateway.example/ipfs/{CID}"),
            format!("  {CID}  "),
        ] {
            assert_eq!(cid_to_uri(&input).as_deref(), Some(expected.as_str()), "{input}");
        }
    }

    #[test]
    fn blank_input_has_no_uri() {
        assert_eq!(cid_to_uri(""), None);
        assert_eq!(cid_to_uri("   "), None);
        assert_eq!(cid_to_uri("ipfs://"), None);
    }

    #[test]
    fn metadata_pointer_is_utf8_uri() {
        assert_eq!(metadata_pointer(CID).as_ref(), format!("ipfs://{CID}").as_bytes());
    }
}
