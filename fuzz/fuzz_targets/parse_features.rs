#![no_main]

use libfuzzer_sys::fuzz_target;
use linkbench_core::parse::parse_feature_matrix;

fuzz_target!(|data: &[u8]| {
    if let Ok(features) = parse_feature_matrix(data, 8) {
        assert_eq!(features.nrows(), 8);
    }
});
