/// cyrb53 string hash (53-bit result), as used to pick planet sprites.
///
/// Hashes UTF-16 code units so the value matches the browser-side
/// visualizer for the same planet name.
pub fn cyrb53(s: &str, seed: u32) -> u64 {
    let mut h1: u32 = 0xdeadbeef ^ seed;
    let mut h2: u32 = 0x41c6ce57 ^ seed;

    for ch in s.encode_utf16() {
        let ch = ch as u32;
        h1 = (h1 ^ ch).wrapping_mul(2654435761);
        h2 = (h2 ^ ch).wrapping_mul(1597334677);
    }

    h1 = (h1 ^ (h1 >> 16)).wrapping_mul(2246822507) ^ (h2 ^ (h2 >> 13)).wrapping_mul(3266489909);
    h2 = (h2 ^ (h2 >> 16)).wrapping_mul(2246822507) ^ (h1 ^ (h1 >> 13)).wrapping_mul(3266489909);

    4294967296 * (2097151 & h2) as u64 + h1 as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fits_in_53_bits() {
        for name in ["", "a", "Arrakis", "protos-7", "ünïcödé"] {
            assert!(cyrb53(name, 0) < 1 << 53);
        }
    }

    #[test]
    fn deterministic_and_discriminating() {
        assert_eq!(cyrb53("earth", 0), cyrb53("earth", 0));
        assert_ne!(cyrb53("earth", 0), cyrb53("mars", 0));
        assert_ne!(cyrb53("revenge", 0), cyrb53("revenue", 0));
    }

    #[test]
    fn seed_changes_hash() {
        assert_ne!(cyrb53("earth", 0), cyrb53("earth", 1));
    }
}
