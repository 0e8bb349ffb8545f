use uuid::Uuid;

/// Generates a fresh opaque API key. A random UUID carries 122 bits of
/// entropy, enough for an unguessable bearer credential.
#[must_use]
pub fn generate_api_key() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_unique_and_opaque() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        assert_eq!(a.len(), 36);
    }
}
