use icon_table_core::error::IconTableError;
use icon_table_core::rle;
use rand::{Rng, SeedableRng};

fn random_stream(rng: &mut rand::rngs::StdRng, len: usize, alphabet: u8) -> Vec<u8> {
    (0..len).map(|_| rng.gen_range(0..alphabet)).collect()
}

#[test]
fn round_trip_random_streams() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(7);
    for _ in 0..200 {
        let len = rng.gen_range(0..2000);
        // small alphabets produce long runs, large ones produce none
        let alphabet = rng.gen_range(1..=255);
        let s = random_stream(&mut rng, len, alphabet);
        let encoded = rle::encode(&s).serialize();
        assert_eq!(rle::decode(&encoded, s.len()).expect("decode"), s);
    }
}

#[test]
fn run_cap_on_uniform_streams() {
    for n in [1usize, 2, 254, 255, 256, 509, 510, 511, 1000, 4096] {
        let s = vec![42u8; n];
        let stream = rle::encode(&s);
        let runs = stream.runs();
        assert_eq!(runs.len(), n.div_ceil(255), "n = {}", n);
        assert!(runs.iter().all(|r| r.count >= 1 && r.value == 42));
        let expected_last = if n % 255 == 0 { 255 } else { (n % 255) as u8 };
        assert_eq!(runs.last().map(|r| r.count), Some(expected_last), "n = {}", n);
        assert_eq!(stream.decoded_len(), n);
    }
}

#[test]
fn worst_case_doubles() {
    let s: Vec<u8> = (0..1024usize).map(|i| (i % 251) as u8).collect();
    assert_eq!(rle::encode(&s).serialized_len(), 2 * s.len());
}

#[test]
fn decoder_trusts_original_size() {
    let s = vec![1u8, 1, 1, 2];
    let encoded = rle::encode(&s).serialize();
    for wrong in [0usize, 3, 5, 100] {
        match rle::decode(&encoded, wrong) {
            Err(IconTableError::RunLengthMismatch { expected, .. }) => assert_eq!(expected, wrong),
            other => panic!("expected mismatch for {}, got {:?}", wrong, other),
        }
    }
}
