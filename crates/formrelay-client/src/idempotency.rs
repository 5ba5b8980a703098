use rand::Rng;

const SUFFIX_LEN: usize = 6;
const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Mint an idempotency key: `<prefix>:<unix millis>:<base-36 suffix>`,
/// e.g. `form:create:1700000000000:9f3k2j`.
///
/// Call once per logical user action, not once per retry of that action.
/// Uniqueness is probabilistic (timestamp plus suffix entropy); the server
/// treats the key as a bounded-TTL dedup hint, not a correctness primitive.
pub fn generate_key(prefix: &str) -> String {
    format!(
        "{}:{}:{}",
        prefix,
        chrono::Utc::now().timestamp_millis(),
        random_suffix(SUFFIX_LEN)
    )
}

fn random_suffix(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_has_prefix_millis_and_suffix() {
        let key = generate_key("form:create");
        let parts: Vec<&str> = key.split(':').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "form");
        assert_eq!(parts[1], "create");
        assert!(parts[2].parse::<i64>().expect("millis segment") > 0);
        assert_eq!(parts[3].len(), SUFFIX_LEN);
        assert!(parts[3].bytes().all(|b| ALPHABET.contains(&b)));
    }

    #[test]
    fn consecutive_keys_never_collide() {
        let a = generate_key("jobs:retry");
        let b = generate_key("jobs:retry");
        assert_ne!(a, b);
    }
}
