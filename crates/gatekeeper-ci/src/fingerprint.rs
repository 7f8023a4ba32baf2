//! Registry identity.

use gatekeeper_core::CheckDescriptor;
use sha2::{Digest, Sha256};

/// Compute a deterministic digest of an ordered registry.
///
/// Covers each check's name, category, invocation, criticality and timeout,
/// so reordering or retuning a registry changes the digest.
pub fn registry_digest(descriptors: &[CheckDescriptor]) -> String {
    let mut hasher = Sha256::new();
    for descriptor in descriptors {
        hasher.update(descriptor.name.as_bytes());
        hasher.update(b"\0");
        hasher.update(descriptor.category.as_bytes());
        hasher.update(b"\0");
        let invocation = serde_json::to_vec(&descriptor.invocation).unwrap_or_default();
        hasher.update(&invocation);
        hasher.update(b"\0");
        hasher.update([u8::from(descriptor.critical)]);
        hasher.update(descriptor.timeout_secs.to_le_bytes());
    }
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> Vec<CheckDescriptor> {
        vec![
            CheckDescriptor::command("Lint Check", "Code Quality", "npm run lint", 300),
            CheckDescriptor::command("Build Check", "Build", "npm run build", 300),
        ]
    }

    #[test]
    fn test_digest_deterministic() {
        let d1 = registry_digest(&registry());
        let d2 = registry_digest(&registry());
        assert_eq!(d1, d2);
        assert_eq!(d1.len(), 64);
    }

    #[test]
    fn test_digest_order_sensitive() {
        let mut reversed = registry();
        reversed.reverse();
        assert_ne!(registry_digest(&registry()), registry_digest(&reversed));
    }

    #[test]
    fn test_digest_tracks_scan_config() {
        let core = vec![CheckDescriptor::secret_scan(
            "Security Scan",
            "Security",
            gatekeeper_core::ScanConfig::default(),
            300,
        )];
        let full = vec![CheckDescriptor::secret_scan(
            "Security Scan",
            "Security",
            gatekeeper_core::ScanConfig::extended(),
            300,
        )];
        assert_ne!(registry_digest(&core), registry_digest(&full));
    }

    #[test]
    fn test_digest_tracks_timeout() {
        let mut retuned = registry();
        retuned[0].timeout_secs = 5;
        assert_ne!(registry_digest(&registry()), registry_digest(&retuned));
    }
}
