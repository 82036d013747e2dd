//! Excel/CSV出力の統合テスト

use eyewear_autofill::cli::ExportFormat;
use eyewear_autofill::export;
use eyewear_autofill::loader;
use eyewear_autofill_common::{normalize_and_derive, Record, RecordSet, RuleTable, TargetSchema};
use tempfile::tempdir;

fn create_test_records() -> RecordSet {
    vec![
        Record::from_pairs([
            ("Article number", "1001"),
            ("Product type", "Frames"),
            ("Frame material", "Plastic frame"),
            ("EAN", "0012345678905"),
        ]),
        Record::from_pairs([
            ("Article number", "1002"),
            ("Product type", "Sunglasses"),
            ("Frame material", "Metal"),
            ("EAN", "0012345678912"),
        ]),
        Record::from_pairs([
            ("Article number", "1003"),
            ("Product type", "Lens cloth"),
            ("Frame material", ""),
            ("EAN", ""),
        ]),
    ]
    .into_iter()
    .collect()
}

#[test]
fn test_xlsx_export_round_trip() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("processed_data.xlsx");

    let (records, report) =
        normalize_and_derive(&create_test_records(), &TargetSchema::eyewear(), &RuleTable::eyewear());
    let outputs = export::export_records(&records, &report, ExportFormat::Xlsx, &output_path)
        .expect("Excel出力に失敗");
    assert_eq!(outputs, vec![output_path.clone()]);

    // 1枚目のシート（Data）を読み戻す
    let loaded = loader::load_records(&output_path).expect("出力したExcelが読めない");
    assert_eq!(loaded.len(), 3);
    assert_eq!(loaded.columns(), TargetSchema::eyewear().fields().to_vec());

    let first = &loaded.records()[0];
    assert_eq!(first.get("Customs tariff number"), Some("90031100"));
    assert_eq!(first.get("Customs description"), Some("Eyeglasses"));
    assert_eq!(first.get("EAN"), Some("0012345678905"), "先頭の0が失われている");

    let third = &loaded.records()[2];
    assert_eq!(third.get("Customs tariff number"), Some(""));
}

#[test]
fn test_csv_export_writes_report() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("products_filled.csv");

    let (records, report) =
        normalize_and_derive(&create_test_records(), &TargetSchema::eyewear(), &RuleTable::eyewear());
    let outputs = export::export_records(&records, &report, ExportFormat::Csv, &output_path)
        .expect("CSV出力に失敗");

    let report_path = dir.path().join("products_filled_report.csv");
    assert_eq!(outputs, vec![output_path.clone(), report_path.clone()]);

    let data = loader::load_records(&output_path).unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data.records()[1].get("Customs description"), Some("Sunglasses, metal frame"));

    let report_rows = loader::load_records(&report_path).unwrap();
    assert_eq!(report_rows.len(), 2, "導出のあった行のみ");
    assert_eq!(report_rows.records()[0].get("Row"), Some("1"));
    assert_eq!(report_rows.records()[1].get("Row"), Some("2"));
    assert_eq!(
        report_rows.records()[1].get("Code rationale"),
        Some("protection group: Sunglasses")
    );
}

#[test]
fn test_export_creates_parent_directory() {
    let dir = tempdir().expect("Failed to create temp dir");
    let output_path = dir.path().join("nested").join("out").join("result.xlsx");

    let (records, report) =
        normalize_and_derive(&create_test_records(), &TargetSchema::eyewear(), &RuleTable::eyewear());
    export::export_records(&records, &report, ExportFormat::Xlsx, &output_path).unwrap();
    assert!(output_path.exists());
}
