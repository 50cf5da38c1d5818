use rand::Rng;

/// Characters used for request IDs. Excludes look-alikes (0/O/o, 1/I/l/i).
pub const REQUEST_ID_ALPHABET: &[u8] = b"23456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz";

/// Length of generated request IDs.
pub const REQUEST_ID_LENGTH: usize = 20;

/// Generate a random request ID of `length` characters from [`REQUEST_ID_ALPHABET`].
pub fn generate_request_id(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| {
            let idx = rng.gen_range(0..REQUEST_ID_ALPHABET.len());
            REQUEST_ID_ALPHABET[idx] as char
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_and_alphabet() {
        let id = generate_request_id(REQUEST_ID_LENGTH);
        assert_eq!(id.len(), 20);
        assert!(id.bytes().all(|b| REQUEST_ID_ALPHABET.contains(&b)));
    }

    #[test]
    fn test_alphabet_has_no_ambiguous_characters() {
        for c in ['0', 'O', 'o', '1', 'I', 'l', 'i'] {
            assert!(!REQUEST_ID_ALPHABET.contains(&(c as u8)), "contains {}", c);
        }
    }

    #[test]
    fn test_ids_differ() {
        let a = generate_request_id(REQUEST_ID_LENGTH);
        let b = generate_request_id(REQUEST_ID_LENGTH);
        assert_ne!(a, b);
    }
}
