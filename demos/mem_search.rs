//! Suffixient-Index MEM Search Demo
//!
//! Demonstrates building a suffixient set over a text, indexing its
//! reverse prefixes, and finding Maximal Exact Matches for a few patterns.
//!
//! ```bash
//! cargo run --example mem_search
//! ```

use suffixient::suffixient_index::{BuildConfig, SuffixientIndex};
use suffixient::suffixient_set::{build_suffixient_set, NaiveSaLcpBwtSource};

fn main() {
    println!("=== suffixient MEM-finding Demo ===\n");

    let text = b"the quick brown fox jumps over the lazy dog. \
                 the fox was quick and the dog was lazy. \
                 a quick brown dog outfoxed a lazy fox.";

    println!("Text ({} bytes):", text.len());
    println!("  \"{}\"", std::str::from_utf8(text).unwrap());

    let source = NaiveSaLcpBwtSource::build(text);
    let positions = build_suffixient_set(&source, 128);

    println!(
        "\nSuffixient set: {} witness positions (text has {} bytes)",
        positions.len(),
        text.len()
    );

    let index = SuffixientIndex::build_plain(text, &positions, &BuildConfig::default()).unwrap();

    println!("\n--- find_mems ---\n");

    let queries = ["fox", "quick brown dog", "a lazy cat"];

    for query in &queries {
        let mems = index.find_mems(query.as_bytes()).unwrap();
        println!("  \"{query}\" -> {mems:?}");
    }

    println!("\n--- FASTA-style batch query ---\n");

    let batch = ">query1\nfox\n>query2\nquick brown\n";
    let output = index.locate_fasta(batch).unwrap();
    print!("{output}");
}
