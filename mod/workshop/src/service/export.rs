//! File export of the filtered operation set. CSV carries a UTF-8 BOM
//! so spreadsheet apps pick up the Arabic text; XLSX gets a styled
//! right-to-left sheet.

use rust_xlsxwriter::{Color, Format, FormatBorder, FormatPattern, Workbook};

use crate::model::{Operation, OperationFilter};
use crate::service::{WorkshopError, WorkshopService};

const HEADER_BG: u32 = 0x2563EB;
const MATCH_GREEN: u32 = 0x16A34A;
const MISMATCH_RED: u32 = 0xDC2626;

fn headers() -> Vec<&'static str> {
    vec![
        "معرف العملية",
        "التاريخ",
        "الفرع",
        "الماركة",
        "الموديل",
        "سنة الصنع",
        "حجم المحرك",
        "نوع الزيت",
        "اللزوجة",
        "الكمية (لتر)",
        "نوع العملية",
        "الحالة",
        "سبب عدم المطابقة",
    ]
}

fn operation_row(op: &Operation) -> Vec<String> {
    vec![
        op.id.clone(),
        op.created_at.clone(),
        op.branch_id.clone().unwrap_or_else(|| "-".into()),
        op.car_brand.clone(),
        op.car_model.clone(),
        op.car_year.to_string(),
        op.engine_size.clone(),
        op.oil_used.clone(),
        op.oil_viscosity.clone(),
        op.oil_quantity.to_string(),
        op.operation_type.as_str().to_string(),
        status_label(op),
        op.mismatch_reason.clone().unwrap_or_else(|| "-".into()),
    ]
}

fn status_label(op: &Operation) -> String {
    if op.is_matching {
        "مطابق".into()
    } else {
        "غير مطابق".into()
    }
}

impl WorkshopService {
    /// Export the filtered operation set as CSV bytes.
    pub fn export_csv(&self, filter: &OperationFilter) -> Result<Vec<u8>, WorkshopError> {
        let ops = self.fetch_filtered(filter)?;

        // BOM so Excel decodes the file as UTF-8.
        let mut buf: Vec<u8> = vec![0xEF, 0xBB, 0xBF];
        {
            let mut writer = csv::Writer::from_writer(&mut buf);
            writer
                .write_record(headers())
                .map_err(|e| WorkshopError::Internal(e.to_string()))?;
            for op in &ops {
                writer
                    .write_record(operation_row(op))
                    .map_err(|e| WorkshopError::Internal(e.to_string()))?;
            }
            writer
                .flush()
                .map_err(|e| WorkshopError::Internal(e.to_string()))?;
        }
        Ok(buf)
    }

    /// Export the filtered operation set as an XLSX workbook.
    pub fn export_xlsx(&self, filter: &OperationFilter) -> Result<Vec<u8>, WorkshopError> {
        let ops = self.fetch_filtered(filter)?;

        let mut workbook = Workbook::new();
        let worksheet = workbook
            .add_worksheet()
            .set_name("Operations Report")
            .map_err(|e| WorkshopError::Internal(e.to_string()))?;
        worksheet.set_right_to_left(true);

        let header_format = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(0xFFFFFF))
            .set_background_color(Color::RGB(HEADER_BG))
            .set_pattern(FormatPattern::Solid)
            .set_border(FormatBorder::Thin);

        let cols = headers();
        for (col, header) in cols.iter().enumerate() {
            worksheet
                .write_with_format(0, col as u16, *header, &header_format)
                .map_err(|e| WorkshopError::Internal(e.to_string()))?;
        }
        worksheet.set_freeze_panes(1, 0).ok();

        let matching_format = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(MATCH_GREEN));
        let mismatch_format = Format::new()
            .set_bold()
            .set_font_color(Color::RGB(MISMATCH_RED));

        let status_col = cols.len() as u16 - 2;
        let mut widths: Vec<usize> = cols.iter().map(|h| h.chars().count()).collect();

        for (i, op) in ops.iter().enumerate() {
            let row = (i + 1) as u32;
            let values = operation_row(op);
            for (col, value) in values.iter().enumerate() {
                if col as u16 == status_col {
                    let fmt = if op.is_matching {
                        &matching_format
                    } else {
                        &mismatch_format
                    };
                    worksheet
                        .write_with_format(row, col as u16, value.as_str(), fmt)
                        .map_err(|e| WorkshopError::Internal(e.to_string()))?;
                } else {
                    worksheet
                        .write(row, col as u16, value.as_str())
                        .map_err(|e| WorkshopError::Internal(e.to_string()))?;
                }
                widths[col] = widths[col].max(value.chars().count());
            }
        }

        for (col, width) in widths.iter().enumerate() {
            worksheet
                .set_column_width(col as u16, *width as f64 + 2.0)
                .map_err(|e| WorkshopError::Internal(e.to_string()))?;
        }

        workbook
            .save_to_buffer()
            .map_err(|e| WorkshopError::Internal(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{OperationType, SubmitOperation};
    use crate::service::ai::AdvisorConfig;
    use motorlog_sql::SqliteStore;
    use std::sync::Arc;

    fn test_service_with_op() -> Arc<WorkshopService> {
        let sql = Arc::new(SqliteStore::open_in_memory().unwrap());
        let svc = WorkshopService::new(sql, AdvisorConfig::default()).unwrap();
        svc.submit_operation(
            SubmitOperation {
                operation_type: OperationType::Service,
                car_brand: "Toyota".into(),
                car_model: "Camry".into(),
                car_year: Some(2020),
                engine_size: "2.5L".into(),
                oil_used: Some("Mobil 1".into()),
                oil_viscosity: Some("5W-30".into()),
                oil_quantity: Some(4.5),
                oil_filter: false,
                air_filter: false,
                cooling_filter: false,
                mismatch_reason: None,
            },
            None,
        )
        .unwrap();
        svc
    }

    #[test]
    fn test_csv_has_bom_and_rows() {
        let svc = test_service_with_op();
        let bytes = svc.export_csv(&OperationFilter::default()).unwrap();

        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert!(text.contains("معرف العملية"));
        assert!(text.contains("Camry"));
        assert!(text.contains("مطابق"));
        // Header plus one data row.
        assert_eq!(text.trim_end().lines().count(), 2);
    }

    #[test]
    fn test_xlsx_is_a_zip() {
        let svc = test_service_with_op();
        let bytes = svc.export_xlsx(&OperationFilter::default()).unwrap();
        // XLSX is a ZIP container; check the magic.
        assert_eq!(&bytes[..2], b"PK");
    }

    #[test]
    fn test_export_respects_filter() {
        let svc = test_service_with_op();
        let bytes = svc
            .export_csv(&OperationFilter {
                search: Some("Lada".into()),
                ..Default::default()
            })
            .unwrap();
        let text = String::from_utf8(bytes[3..].to_vec()).unwrap();
        assert_eq!(text.trim_end().lines().count(), 1, "only the header");
    }
}
