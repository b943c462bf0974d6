//! Content digests and in-document de-duplication.

use crate::chunking::Chunk;
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Stable SHA-256 hex digest of chunk text.
pub fn compute_chunk_hash(text: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let digest = hasher.finalize();
    hex::encode(digest)
}

/// Remove duplicate chunks within a document, keeping the first occurrence.
pub(crate) fn dedupe_chunks(chunks: Vec<Chunk>) -> (Vec<(Chunk, String)>, usize) {
    let mut seen = HashSet::new();
    let mut prepared = Vec::new();
    let mut skipped = 0;

    for chunk in chunks {
        let hash = compute_chunk_hash(&chunk.content);
        if seen.insert(hash.clone()) {
            prepared.push((chunk, hash));
        } else {
            skipped += 1;
        }
    }

    (prepared, skipped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_hex_sha256() {
        let hash = compute_chunk_hash("abc");
        assert_eq!(
            hash,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
