//! CRC32 checksum over the (header ∥ payload) region.
//!
//! Hardware-accelerated via `crc32fast`; the checksum itself is a trailer,
//! not part of `payloadLen`.

/// Calculate the CRC32 of `header_and_payload`, big-endian on the wire.
pub fn calculate_crc32(header_and_payload: &[u8]) -> u32 {
    crc32fast::hash(header_and_payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let data = b"header-and-payload-bytes";
        assert_eq!(calculate_crc32(data), calculate_crc32(data));
    }

    #[test]
    fn sensitive_to_every_bit() {
        let mut data = vec![0u8, 1, 2, 3, 4, 5, 6, 7];
        let original = calculate_crc32(&data);
        for byte_idx in 0..data.len() {
            for bit in 0..8u8 {
                let mut flipped = data.clone();
                flipped[byte_idx] ^= 1 << bit;
                assert_ne!(
                    calculate_crc32(&flipped),
                    original,
                    "flipping byte {byte_idx} bit {bit} did not change the checksum"
                );
            }
        }
        let _ = &mut data; // silence unused-mut in case of future edits
    }
}
