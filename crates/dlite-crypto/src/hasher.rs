use dlite_types::Digest;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"dlite-instance-v1"`,
/// `"dlite-collection-v1"`) that is prepended to every hash computation. This
/// prevents cross-type hash collisions: an instance and a collection that
/// happen to feed identical bytes still produce different digests.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for plain data instances.
    pub const INSTANCE: Self = Self {
        domain: "dlite-instance-v1",
    };
    /// Hasher for collections.
    pub const COLLECTION: Self = Self {
        domain: "dlite-collection-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Digest {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        Digest::new(*hasher.finalize().as_bytes())
    }

    /// Start an incremental digest in this domain.
    pub fn stream(&self) -> DigestStream {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        DigestStream { hasher }
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

/// Incremental digest fed one field at a time.
///
/// Every field is length-prefixed so that field boundaries are part of the
/// digest: feeding `"ab", "c"` differs from feeding `"a", "bc"`.
pub struct DigestStream {
    hasher: blake3::Hasher,
}

impl DigestStream {
    /// Feed one string field.
    pub fn update_field(&mut self, field: &str) -> &mut Self {
        self.update_bytes(field.as_bytes())
    }

    /// Feed an optional field. Absent and empty fields are distinct.
    pub fn update_optional(&mut self, field: Option<&str>) -> &mut Self {
        match field {
            Some(field) => {
                self.hasher.update(&[1]);
                self.update_field(field)
            }
            None => {
                self.hasher.update(&[0]);
                self
            }
        }
    }

    /// Feed raw bytes as one field.
    pub fn update_bytes(&mut self, data: &[u8]) -> &mut Self {
        self.hasher.update(&(data.len() as u64).to_le_bytes());
        self.hasher.update(data);
        self
    }

    /// Finish the digest.
    pub fn finalize(&self) -> Digest {
        Digest::new(*self.hasher.finalize().as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(
            ContentHasher::INSTANCE.hash(data),
            ContentHasher::INSTANCE.hash(data)
        );
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        assert_ne!(
            ContentHasher::INSTANCE.hash(data),
            ContentHasher::COLLECTION.hash(data)
        );
        assert_ne!(
            ContentHasher::INSTANCE.hash(data),
            ContentHasher::new("my-custom-domain-v1").hash(data)
        );
    }

    // -----------------------------------------------------------------------
    // Streaming
    // -----------------------------------------------------------------------

    #[test]
    fn stream_is_deterministic() {
        let a = ContentHasher::COLLECTION
            .stream()
            .update_field("a")
            .update_field("b")
            .finalize();
        let b = ContentHasher::COLLECTION
            .stream()
            .update_field("a")
            .update_field("b")
            .finalize();
        assert_eq!(a, b);
    }

    #[test]
    fn stream_field_boundaries_matter() {
        let a = ContentHasher::COLLECTION
            .stream()
            .update_field("ab")
            .update_field("c")
            .finalize();
        let b = ContentHasher::COLLECTION
            .stream()
            .update_field("a")
            .update_field("bc")
            .finalize();
        assert_ne!(a, b);
    }

    #[test]
    fn stream_optional_absent_differs_from_empty() {
        let absent = ContentHasher::COLLECTION
            .stream()
            .update_optional(None)
            .finalize();
        let empty = ContentHasher::COLLECTION
            .stream()
            .update_optional(Some(""))
            .finalize();
        assert_ne!(absent, empty);
    }

    #[test]
    fn stream_is_domain_separated() {
        let a = ContentHasher::INSTANCE.stream().update_field("x").finalize();
        let b = ContentHasher::COLLECTION.stream().update_field("x").finalize();
        assert_ne!(a, b);
    }
}
