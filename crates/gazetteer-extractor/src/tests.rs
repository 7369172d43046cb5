//! Cross-module tests for the extraction pipeline

use crate::{extract_json_array, parse_names, parse_records, Deduplicator};
use proptest::prelude::*;
use serde_json::Value;

const NOISE: &[&str] = &["😀", "🌍", "🚀", "✨", "☀", "🇯🇵", "🤖"];

fn clean_array(names: &[String]) -> String {
    let items: Vec<String> = names
        .iter()
        .map(|n| format!("{{\"source_name\": \"{}\", \"bucket\": \"Tech\"}}", n))
        .collect();
    format!("[{}]", items.join(", "))
}

proptest! {
    #[test]
    fn noisy_wrapping_decodes_like_clean_input(
        names in prop::collection::vec("[A-Za-z][A-Za-z0-9 ]{0,15}", 0..8),
        prefix in "[A-Za-z .,:!]{0,40}",
        suffix in "[A-Za-z .,!]{0,40}",
        fenced in any::<bool>(),
        trailing_comma in any::<bool>(),
        noise in 0..NOISE.len(),
        tail_noise in 0..NOISE.len(),
    ) {
        let clean = clean_array(&names);

        let mut body = clean.clone();
        if trailing_comma && !names.is_empty() {
            body.insert_str(body.len() - 1, ",\n");
        }
        // Emoji go between elements, outside any string
        body = body.replacen("[", &format!("[{} ", NOISE[noise]), 1);
        body.insert_str(body.len() - 1, &format!("{} ", NOISE[tail_noise]));
        if fenced {
            body = format!("```json\n{}\n```", body);
        }
        let noisy = format!("{}\n{}\n{}", prefix, body, suffix);

        let expected: Value = serde_json::from_str(&clean).unwrap();
        let actual: Value = serde_json::from_str(&extract_json_array(&noisy).unwrap()).unwrap();
        prop_assert_eq!(actual, expected);
    }

    #[test]
    fn extraction_never_panics(raw in ".{0,200}") {
        let _ = extract_json_array(&raw);
        let _ = parse_records(&raw, "source_name");
        let _ = parse_names(&raw);
    }
}

#[test]
fn test_batches_through_parser_and_dedup() {
    let batch_one = "```json\n[{\"source_name\": \"NHK World\"}, {\"source_name\": \"Asahi Shimbun\"}]\n```";
    let batch_two = "Sure! [{\"source_name\": \"asahi shimbun\"}, {\"source_name\": \"Japan Times 📰\"},]";

    let mut dedup = Deduplicator::new("source_name");
    let first = dedup.filter(parse_records(batch_one, "source_name").unwrap());
    let second = dedup.filter(parse_records(batch_two, "source_name").unwrap());

    assert_eq!(first.len(), 2);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].display_name("source_name"), Some("Japan Times "));
}

#[test]
fn test_truncated_batch_is_rejected() {
    let truncated = "[{\"source_name\": \"NHK World\"}, {\"source_name\": \"Asa";
    assert!(parse_records(truncated, "source_name").is_err());
}
