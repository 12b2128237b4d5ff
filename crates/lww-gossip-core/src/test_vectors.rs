//! Wire test vectors for the gossip message encoding
//!
//! Other implementations of the push protocol must produce these bytes.

use crate::canonical::{canonical_bytes, decode_gossip_message};
use crate::types::*;

struct TestVector {
    name: &'static str,
    message: GossipMessage,
    canonical_bytes_hex: &'static str,
}

fn vectors() -> Vec<TestVector> {
    vec![
        TestVector {
            name: "small_positive",
            message: GossipMessage {
                value: 5,
                generation: 3,
                origin: "a".into(),
            },
            // zigzag(5)=0x0a, 3, len=1, 'a'
            canonical_bytes_hex: "0a030161",
        },
        TestVector {
            name: "negative_value",
            message: GossipMessage {
                value: -1,
                generation: 0,
                origin: "n1".into(),
            },
            // zigzag(-1)=0x01, 0, len=2, "n1"
            canonical_bytes_hex: "0100026e31",
        },
        TestVector {
            name: "multi_byte_generation",
            message: GossipMessage {
                value: 0,
                generation: 300,
                origin: "b".into(),
            },
            // 300 = 0b1_0010_1100 -> 0xac 0x02
            canonical_bytes_hex: "00ac020162",
        },
    ]
}

#[test]
fn test_gossip_message_vectors() {
    for vector in vectors() {
        let bytes = canonical_bytes(&vector.message).unwrap();
        assert_eq!(
            hex::encode(&bytes),
            vector.canonical_bytes_hex,
            "vector {}",
            vector.name
        );
        assert_eq!(decode_gossip_message(&bytes).unwrap(), vector.message);
    }
}

#[test]
fn test_snapshot_vector() {
    let snap = Snapshot {
        value: 9,
        generation: 4,
    };
    assert_eq!(hex::encode(canonical_bytes(&snap).unwrap()), "1204");
}
