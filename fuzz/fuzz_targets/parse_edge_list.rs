#![no_main]

use libfuzzer_sys::fuzz_target;
use linkbench_core::parse::parse_edge_list;

fuzz_target!(|data: &[u8]| {
    // Keep parsed graphs small.
    if data.len() > 4096 {
        return;
    }
    if let Ok(graph) = parse_edge_list(data, Some(256)) {
        for edge in graph.edges() {
            assert!(edge.u() < edge.v());
            assert!(graph.has_edge(edge.v(), edge.u()));
        }
    }
});
