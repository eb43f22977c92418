use icon_table_core::channel::{expand_alpha, reduce_to_alpha};
use rand::{Rng, SeedableRng};

#[test]
fn alpha_expansion_forces_white_keeps_alpha() {
    let mut rng = rand::rngs::StdRng::seed_from_u64(1234);
    for _ in 0..50 {
        let pixels = rng.gen_range(0..300);
        let rgba: Vec<u8> = (0..pixels * 4).map(|_| rng.gen_range(0..=255u8)).collect();

        let alpha = reduce_to_alpha(&rgba).expect("whole pixels");
        assert_eq!(alpha.len(), pixels);

        let expanded = expand_alpha(&alpha);
        let mut expected = rgba.clone();
        for px in expected.chunks_exact_mut(4) {
            px[0] = 255;
            px[1] = 255;
            px[2] = 255;
        }
        assert_eq!(expanded, expected);
    }
}
