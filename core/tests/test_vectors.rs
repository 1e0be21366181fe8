//! Verify the codec and reply classifier against JSON test vectors stored in
//! `test-vectors/`.
//!
//! Each vector file describes inputs and the expected structured result.
//! Comparing typed values (not raw strings) keeps the vectors readable.

use std::time::Duration;

use psg_core::reply::{self, Reply};
use psg_core::{decode, encode, ConfigValue, OutputType};

fn parse_output(value: &serde_json::Value) -> Option<OutputType> {
    value.as_str().map(|s| s.parse().unwrap())
}

// ---------------------------------------------------------------------------
// Config codec
// ---------------------------------------------------------------------------

#[test]
fn config_test_vectors() {
    let raw = include_str!("../../test-vectors/config.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let config = decode(case["text"].as_str().unwrap());

        let expected: Vec<(String, ConfigValue)> =
            serde_json::from_value(case["expected"].clone()).unwrap();
        let actual: Vec<(String, ConfigValue)> = config
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        assert_eq!(actual, expected, "{name}: decoded entries");

        assert_eq!(encode(&config), case["encoded"].as_str().unwrap(), "{name}: encoded");
    }
}

// ---------------------------------------------------------------------------
// Reply classification
// ---------------------------------------------------------------------------

#[test]
fn reply_test_vectors() {
    let raw = include_str!("../../test-vectors/replies.json");
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let output = parse_output(&case["output"]);
        let body = case["raw"].as_str().unwrap();
        let expected = &case["expected"];

        let reply = reply::classify(body, output, Duration::from_millis(1));
        match expected["kind"].as_str().unwrap() {
            "spectrum" => {
                let Reply::Spectrum { header, table, .. } = &reply else {
                    panic!("{name}: expected spectrum, got {reply:?}");
                };
                assert_eq!(header, expected["header"].as_str().unwrap(), "{name}: header");
                let rows: Vec<Vec<f64>> = serde_json::from_value(expected["rows"].clone()).unwrap();
                let actual: Vec<Vec<f64>> = table.iter_rows().map(<[f64]>::to_vec).collect();
                assert_eq!(actual, rows, "{name}: rows");
            }
            "config" => {
                assert_eq!(reply.config_text(), expected["text"].as_str(), "{name}: config");
            }
            "sections" => {
                let sections = reply
                    .sections()
                    .unwrap_or_else(|| panic!("{name}: expected sections, got {reply:?}"));
                let expected: Vec<(String, String)> =
                    serde_json::from_value(expected["sections"].clone()).unwrap();
                let actual: Vec<(String, String)> = sections
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect();
                assert_eq!(actual, expected, "{name}: sections");
            }
            "raw" => {
                assert_eq!(reply.raw(), expected["text"].as_str(), "{name}: raw");
            }
            other => panic!("{name}: unknown kind: {other}"),
        }
    }
}
