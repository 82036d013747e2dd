//! Excel出力（rust_xlsxwriter）
//!
//! シート `Data` に処理済みレコード、シート `Report` に導出レポートを書き込む。
//! 値はすべて文字列セルとして書く（EANや関税番号の先頭0・桁を保つため）。

use crate::error::{AutofillError, Result};
use eyewear_autofill_common::{DerivationReport, RecordSet};
use rust_xlsxwriter::{Format, Workbook, Worksheet, XlsxError};
use std::path::Path;

pub const DATA_SHEET: &str = "Data";
pub const REPORT_SHEET: &str = "Report";

const MIN_WIDTH: usize = 8;
const MAX_WIDTH: usize = 60;

pub fn generate_excel(records: &RecordSet, report: &DerivationReport, output_path: &Path) -> Result<()> {
    build_workbook(records, report, output_path).map_err(|e| AutofillError::ExcelGeneration(e.to_string()))
}

fn build_workbook(
    records: &RecordSet,
    report: &DerivationReport,
    output_path: &Path,
) -> std::result::Result<(), XlsxError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let data = workbook.add_worksheet();
    data.set_name(DATA_SHEET)?;
    write_table(data, records, &header_format)?;

    let sheet = workbook.add_worksheet();
    sheet.set_name(REPORT_SHEET)?;
    write_table(sheet, &report.table, &header_format)?;

    workbook.save(output_path)?;
    Ok(())
}

fn write_table(
    sheet: &mut Worksheet,
    records: &RecordSet,
    header_format: &Format,
) -> std::result::Result<(), XlsxError> {
    let (columns, rows) = records.to_rows();

    for (col, name) in columns.iter().enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, name, header_format)?;

        let width = rows
            .iter()
            .map(|row| row[col as usize].chars().count())
            .chain(std::iter::once(name.chars().count()))
            .max()
            .unwrap_or(MIN_WIDTH)
            .clamp(MIN_WIDTH, MAX_WIDTH);
        sheet.set_column_width(col, width as f64 + 2.0)?;
    }

    for (index, row) in rows.iter().enumerate() {
        let row_num = index as u32 + 1;
        for (col, value) in row.iter().enumerate() {
            if !value.is_empty() {
                sheet.write_string(row_num, col as u16, value)?;
            }
        }
    }

    sheet.set_freeze_panes(1, 0)?;
    Ok(())
}
