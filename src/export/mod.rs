//! 結果エクスポート
//!
//! 結果集合をフラットな行レコードに変換し、Excel (xlsx) に書き出す。
//! 欠損フィールドは空欄にする（`NOT_FOUND` 等の文字列をそのまま
//! 出力しない）。

use crate::api::types::OcrResult;
use crate::error::{MeterOcrError, Result};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;
use std::path::Path;

/// エクスポート用の1行（全列とも表示用文字列）
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ExportRecord {
    pub image_url: String,
    pub serial_number: String,
    pub reading_1: String,
    pub confidence_1: String,
    pub reading_2: String,
    pub confidence_2: String,
    pub label: String,
    pub spoof_result: String,
    pub spoof_confidence: String,
    pub spoof_reason: String,
}

const HEADERS: &[&str] = &[
    "Image URL",
    "Serial Number Reading",
    "Meter Reading 1",
    "Confidence Score 1",
    "Meter Reading 2",
    "Confidence Score 2",
    "Parameter Detected",
    "Spoof Result",
    "Spoof Confidence Score",
    "Spoof Reason",
];

/// 信頼度（0.0〜1.0）を百分率表記にする。欠損は空欄。
pub fn format_confidence(confidence: Option<f64>) -> String {
    match confidence {
        Some(value) => format!("{:.2}%", value * 100.0),
        None => String::new(),
    }
}

fn text_or_empty(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}

/// 結果集合をフラットな行レコード列に変換する
pub fn to_flat_records(results: &[OcrResult]) -> Vec<ExportRecord> {
    results
        .iter()
        .map(|r| ExportRecord {
            image_url: r.image_url.clone(),
            serial_number: text_or_empty(&r.serial_number_result.reading),
            reading_1: text_or_empty(&r.ocr_reading_result_1.reading_1),
            confidence_1: format_confidence(r.ocr_reading_result_1.confidence_1),
            reading_2: text_or_empty(&r.ocr_reading_result_2.reading_2),
            confidence_2: format_confidence(r.ocr_reading_result_2.confidence_2),
            label: text_or_empty(&r.ocr_reading_result_2.label),
            spoof_result: text_or_empty(&r.spoof_result.result),
            // スプーフ信頼度はAPI側ですでに百分率
            spoof_confidence: r
                .spoof_result
                .confidence_score
                .map(|v| format!("{}", v))
                .unwrap_or_default(),
            spoof_reason: text_or_empty(&r.spoof_result.reason),
        })
        .collect()
}

/// 行レコードをExcelに書き出す
pub fn write_excel(records: &[ExportRecord], path: &Path) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet
        .set_name("Image Analysis Results")
        .map_err(|e| MeterOcrError::ExcelGeneration(e.to_string()))?;

    let bold = Format::new().set_bold();

    for (col, header) in HEADERS.iter().enumerate() {
        worksheet
            .write_with_format(0, col as u16, *header, &bold)
            .map_err(|e| MeterOcrError::ExcelGeneration(e.to_string()))?;
    }

    for (i, record) in records.iter().enumerate() {
        let row = (i + 1) as u32;
        let cells = [
            &record.image_url,
            &record.serial_number,
            &record.reading_1,
            &record.confidence_1,
            &record.reading_2,
            &record.confidence_2,
            &record.label,
            &record.spoof_result,
            &record.spoof_confidence,
            &record.spoof_reason,
        ];
        for (col, cell) in cells.iter().enumerate() {
            worksheet
                .write(row, col as u16, cell.as_str())
                .map_err(|e| MeterOcrError::ExcelGeneration(e.to_string()))?;
        }
    }

    worksheet.autofit();

    workbook
        .save(path)
        .map_err(|e| MeterOcrError::ExcelGeneration(e.to_string()))?;
    Ok(())
}

/// タイムスタンプ付きの既定出力ファイル名
pub fn default_excel_name() -> String {
    format!(
        "image_analysis_results_{}.xlsx",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    )
}
