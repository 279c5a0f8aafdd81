//! End-to-end integration tests: CSV -> align -> JSON/CSV -> deserialize.

use std::fs;
use std::io::Write;
use std::path::PathBuf;

use chromalign_dtw::{AlignmentConfig, BandWidth};
use chromalign_io::{AnchorReader, ExperimentName, RecordingReader, ResultWriter};
use tempfile::TempDir;

fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut f = fs::File::create(&path).unwrap();
    f.write_all(content.as_bytes()).unwrap();
    path
}

fn trace_csv(values: &[f64]) -> String {
    let mut out = String::from("scan,time,intensity\n");
    for (i, v) in values.iter().enumerate() {
        out.push_str(&format!("{i},{},{v}\n", i as f64 * 0.5));
    }
    out
}

#[test]
fn align_round_trip() {
    let dir = TempDir::new().unwrap();

    // 1. Write two traces: the query has one extra leading frame.
    let ref_path = write_file(
        &dir,
        "run_ref.csv",
        &trace_csv(&[1.0, 2.0, 3.0, 2.0, 1.0]),
    );
    let qry_path = write_file(
        &dir,
        "run_qry.csv",
        &trace_csv(&[1.0, 1.0, 2.0, 3.0, 2.0, 1.0]),
    );

    // 2. Read them back
    let reference = RecordingReader::new(&ref_path).read().unwrap();
    let query = RecordingReader::new(&qry_path).read().unwrap();
    assert_eq!(reference.id().as_str(), "run_ref");
    assert_eq!(query.len(), 6);

    // 3. Align (full band, normalized)
    let result = AlignmentConfig::new()
        .with_band_width(BandWidth::Fraction(1.0))
        .with_normalize(true)
        .align(&reference, &query, &[])
        .unwrap();
    assert_eq!(result.raw_score(), 0.0);

    // 4. Write artifacts
    let out_dir = dir.path().join("results");
    let experiment = ExperimentName::new("roundtrip".into()).unwrap();
    let writer = ResultWriter::new(&out_dir, experiment).unwrap();
    writer.write_alignment(&result).unwrap();

    // 5. Deserialize back and verify
    let json: serde_json::Value = serde_json::from_str(
        &fs::read_to_string(out_dir.join("roundtrip_alignment.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(json["reference"], "run_ref");
    assert_eq!(json["query"], "run_qry");
    assert_eq!(json["raw_score"], 0.0);
    assert_eq!(json["path_length"].as_u64().unwrap(), 6);
    assert_eq!(
        json["n_expansion"].as_u64().unwrap() + json["n_compression"].as_u64().unwrap(),
        1
    );

    // 6. The path CSV covers every query frame exactly once here.
    let path_csv = fs::read_to_string(out_dir.join("roundtrip_path.csv")).unwrap();
    assert_eq!(path_csv.lines().count(), 7); // header + 6 steps
}

#[test]
fn anchored_align_round_trip() {
    let dir = TempDir::new().unwrap();
    let n = 40;
    let values: Vec<f64> = (0..n).map(|i| (i as f64 * 0.3).sin() * 10.0).collect();

    let ref_path = write_file(&dir, "a.csv", &trace_csv(&values));
    let qry_path = write_file(&dir, "b.csv", &trace_csv(&values));
    let anchor_path = write_file(&dir, "anchors.csv", "reference,query\n20,20\n");

    let reference = RecordingReader::new(&ref_path).read().unwrap();
    let query = RecordingReader::new(&qry_path).read().unwrap();
    let anchors = AnchorReader::new(&anchor_path).read().unwrap();
    assert_eq!(anchors.len(), 1);

    let result = AlignmentConfig::new()
        .with_band_width(BandWidth::Scans(4))
        .with_anchor_radius(4)
        .with_min_scan_distance(5)
        .align(&reference, &query, &anchors)
        .unwrap();

    // Identical traces align along the diagonal inside the corridor.
    assert_eq!(result.raw_score(), 0.0);
    assert!(result.stored_cells() < n * n);
    assert_eq!(result.path().len(), n);
}
