use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, Float32Array, Float64Array, Int32Array, Int64Array, LargeStringArray, StringArray,
};
use calamine::{Reader, Xlsx, open_workbook};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use thiserror::Error;

use super::model::{RATE_COLUMNS, REQUIRED_COLUMNS, SurveyDataset, SurveyRecord};

// ---------------------------------------------------------------------------
// DataLoadError
// ---------------------------------------------------------------------------

/// Failure to load the survey dataset.
///
/// At startup this is fatal (the dashboard cannot run without its reference
/// data); from the in-app Open dialog it is reported in the status line and
/// the previous dataset stays.
#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("unsupported file extension: .{0}")]
    UnsupportedExtension(String),
    #[error("missing required column '{0}'")]
    MissingColumn(&'static str),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Check that every required column is present, in declaration order.
fn require_columns(mut has: impl FnMut(&'static str) -> bool) -> Result<(), DataLoadError> {
    for name in REQUIRED_COLUMNS {
        if !has(name) {
            return Err(DataLoadError::MissingColumn(name));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a survey dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with the required columns (the bundled sample)
/// * `.json`    – records orientation: `[{ "Filters": ..., ... }, ...]`
/// * `.parquet` – flat columnar layout with the same column names
/// * `.xlsx`    – survey workbook; the first worksheet is read
pub fn load_file(path: &Path) -> Result<SurveyDataset, DataLoadError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        "xlsx" => load_excel(path),
        other => Err(DataLoadError::UnsupportedExtension(other.to_string())),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with the required column names (the fifth rate
/// column, `Heard Of, No Opinion`, contains a comma and is quoted).  Rows
/// deserialize straight into [`SurveyRecord`] via serde.
fn load_csv(path: &Path) -> Result<SurveyDataset, DataLoadError> {
    let mut reader = csv::Reader::from_path(path).context("opening CSV")?;
    let headers = reader.headers().context("reading CSV headers")?.clone();
    require_columns(|name| headers.iter().any(|h| h == name))?;

    let mut records = Vec::new();
    for (row_no, result) in reader.deserialize::<SurveyRecord>().enumerate() {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        records.push(record);
    }

    Ok(SurveyDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "Filters": "Educ: College graduate",
///     "Institutions": "Amazon",
///     "Very favorable": 0.45,
///     ...
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SurveyDataset, DataLoadError> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let records: Vec<SurveyRecord> =
        serde_json::from_str(&text).context("parsing JSON records")?;
    Ok(SurveyDataset::from_records(records))
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with one column per spreadsheet column.
///
/// Expected schema: `Filters` and `Institutions` as Utf8/LargeUtf8, the six
/// rate columns as Float64 (Float32/Int64/Int32 are accepted, covering the
/// common dataframe exporters).
fn load_parquet(path: &Path) -> Result<SurveyDataset, DataLoadError> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;

    // Resolve the required columns once against the file schema; record
    // batches share it.
    let schema = builder.schema().clone();
    let mut column_indices = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        let idx = schema
            .index_of(name)
            .map_err(|_| DataLoadError::MissingColumn(name))?;
        column_indices.push(idx);
    }

    let reader = builder.build().context("building parquet reader")?;
    let mut records = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        for row in 0..batch.num_rows() {
            let filters = string_value(batch.column(column_indices[0]), row)
                .with_context(|| format!("Row {row}: reading 'Filters'"))?;
            let institution = string_value(batch.column(column_indices[1]), row)
                .with_context(|| format!("Row {row}: reading 'Institutions'"))?;

            let mut rates = [0.0; 6];
            for (i, slot) in rates.iter_mut().enumerate() {
                *slot = f64_value(batch.column(column_indices[2 + i]), row)
                    .with_context(|| format!("Row {row}: reading '{}'", RATE_COLUMNS[i]))?;
            }

            records.push(SurveyRecord::from_parts(filters, institution, rates));
        }
    }

    Ok(SurveyDataset::from_records(records))
}

// -- Arrow helpers --

/// Extract a label cell from a string column; nulls read as empty labels.
fn string_value(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        return Ok(String::new());
    }
    if let Some(arr) = col.as_any().downcast_ref::<StringArray>() {
        Ok(arr.value(row).to_string())
    } else if let Some(arr) = col.as_any().downcast_ref::<LargeStringArray>() {
        Ok(arr.value(row).to_string())
    } else {
        bail!("expected a string column, got {:?}", col.data_type())
    }
}

/// Extract a rate cell.  Accepts float and integer columns; nulls are
/// malformed data, not zeros.
fn f64_value(col: &Arc<dyn Array>, row: usize) -> Result<f64> {
    if col.is_null(row) {
        bail!("null rate value");
    }
    if let Some(arr) = col.as_any().downcast_ref::<Float64Array>() {
        Ok(arr.value(row))
    } else if let Some(arr) = col.as_any().downcast_ref::<Float32Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int64Array>() {
        Ok(arr.value(row) as f64)
    } else if let Some(arr) = col.as_any().downcast_ref::<Int32Array>() {
        Ok(arr.value(row) as f64)
    } else {
        bail!("expected a numeric column, got {:?}", col.data_type())
    }
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

/// Load the survey workbook format (`SV.xlsx`): first worksheet, header row
/// with the required column names, one record per following row.
fn load_excel(path: &Path) -> Result<SurveyDataset, DataLoadError> {
    let mut workbook: Xlsx<_> = open_workbook(path).context("opening Excel workbook")?;
    let range = workbook
        .worksheet_range_at(0)
        .context("workbook has no worksheets")?
        .context("reading first worksheet")?;

    let mut rows = range.rows();
    let header = rows.next().context("worksheet is empty")?;
    let mut column_indices = Vec::with_capacity(REQUIRED_COLUMNS.len());
    for name in REQUIRED_COLUMNS {
        let idx = header
            .iter()
            .position(|cell| matches!(cell, calamine::DataType::String(s) if s.trim() == name))
            .ok_or(DataLoadError::MissingColumn(name))?;
        column_indices.push(idx);
    }

    let mut records = Vec::new();
    for (row_no, row) in rows.enumerate() {
        // Worksheet coordinates are 1-based and the header occupies row 1.
        let lineno = row_no + 2;
        let filters = excel_string(row, column_indices[0])
            .with_context(|| format!("Worksheet row {lineno}: reading 'Filters'"))?;
        let institution = excel_string(row, column_indices[1])
            .with_context(|| format!("Worksheet row {lineno}: reading 'Institutions'"))?;

        let mut rates = [0.0; 6];
        for (i, slot) in rates.iter_mut().enumerate() {
            *slot = excel_f64(row, column_indices[2 + i]).with_context(|| {
                format!("Worksheet row {lineno}: reading '{}'", RATE_COLUMNS[i])
            })?;
        }

        records.push(SurveyRecord::from_parts(filters, institution, rates));
    }

    Ok(SurveyDataset::from_records(records))
}

// -- Calamine helpers --

fn excel_string(row: &[calamine::DataType], idx: usize) -> Result<String> {
    match row.get(idx) {
        Some(calamine::DataType::String(s)) => Ok(s.clone()),
        Some(calamine::DataType::Empty) | None => Ok(String::new()),
        Some(other) => bail!("expected text, got {other:?}"),
    }
}

fn excel_f64(row: &[calamine::DataType], idx: usize) -> Result<f64> {
    match row.get(idx) {
        Some(calamine::DataType::Float(f)) => Ok(*f),
        Some(calamine::DataType::Int(i)) => Ok(*i as f64),
        Some(other) => bail!("expected a number, got {other:?}"),
        None => bail!("missing cell"),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use arrow::array::{Float64Array, StringArray};
    use arrow::datatypes::{DataType, Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;
    use rust_xlsxwriter::Workbook;

    const SAMPLE_CSV: &str = "\
Filters,Institutions,Very favorable,Somewhat favorable,Somewhat unfavorable,Very unfavorable,\"Heard Of, No Opinion\",Never Heard Of
All Adults,Amazon,0.42,0.31,0.09,0.05,0.08,0.05
Educ: College graduate,Amazon,0.45,0.3,0.08,0.05,0.07,0.05
Age: 18-29,Amazon,0.4,0.32,0.1,0.06,0.07,0.05
Income: Under $50k,Amazon,0.41,0.3,0.09,0.06,0.09,0.05
";

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "pollview-{name}-{}.{ext}",
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos())
                .unwrap_or_default()
        ))
    }

    fn write_temp(name: &str, ext: &str, contents: &str) -> PathBuf {
        let path = temp_path(name, ext);
        std::fs::write(&path, contents).expect("write fixture");
        path
    }

    #[test]
    fn csv_loads_records_baseline_and_options() {
        let path = write_temp("sample", "csv", SAMPLE_CSV);
        let ds = load_file(&path).expect("load csv");

        assert_eq!(ds.len(), 4);
        assert_eq!(ds.baseline, vec![1, 2, 3]);
        assert_eq!(ds.options.institutions, vec!["Amazon"]);
        assert_eq!(ds.options.education, vec!["College graduate"]);
        assert_eq!(ds.options.age, vec!["18-29"]);
        assert_eq!(ds.options.income, vec!["Under $50k"]);

        let first = &ds.records[0];
        assert_eq!(first.filters, "All Adults");
        assert_eq!(first.institution, "Amazon");
        assert_eq!(first.rates(), [0.42, 0.31, 0.09, 0.05, 0.08, 0.05]);
    }

    #[test]
    fn csv_missing_required_column_is_a_typed_error() {
        // No "Very favorable" column.
        let path = write_temp(
            "missing-col",
            "csv",
            "Filters,Institutions,Somewhat favorable,Somewhat unfavorable,Very unfavorable,\"Heard Of, No Opinion\",Never Heard Of\n\
             All Adults,Amazon,0.31,0.09,0.05,0.08,0.05\n",
        );
        let err = load_file(&path).expect_err("must reject");
        assert!(matches!(err, DataLoadError::MissingColumn("Very favorable")));
    }

    #[test]
    fn csv_with_a_malformed_rate_reports_the_row() {
        let path = write_temp(
            "bad-rate",
            "csv",
            "Filters,Institutions,Very favorable,Somewhat favorable,Somewhat unfavorable,Very unfavorable,\"Heard Of, No Opinion\",Never Heard Of\n\
             All Adults,Amazon,not-a-number,0.31,0.09,0.05,0.08,0.05\n",
        );
        let err = load_file(&path).expect_err("must reject");
        assert!(matches!(err, DataLoadError::Other(_)));
    }

    #[test]
    fn missing_file_is_an_error() {
        let path = temp_path("does-not-exist", "csv");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn unsupported_extension_is_rejected_before_reading() {
        let err = load_file(Path::new("survey.txt")).expect_err("must reject");
        match err {
            DataLoadError::UnsupportedExtension(ext) => assert_eq!(ext, "txt"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn json_records_orientation_loads() {
        let path = write_temp(
            "records",
            "json",
            r#"[
                {"Filters": "Educ: College graduate", "Institutions": "Amazon",
                 "Very favorable": 0.45, "Somewhat favorable": 0.3,
                 "Somewhat unfavorable": 0.08, "Very unfavorable": 0.05,
                 "Heard Of, No Opinion": 0.07, "Never Heard Of": 0.05},
                {"Filters": "All Adults", "Institutions": "Congress",
                 "Very favorable": 0.12, "Somewhat favorable": 0.2,
                 "Somewhat unfavorable": 0.25, "Very unfavorable": 0.33,
                 "Heard Of, No Opinion": 0.08, "Never Heard Of": 0.02}
            ]"#,
        );
        let ds = load_file(&path).expect("load json");
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.baseline, vec![0]);
        assert_eq!(ds.options.institutions, vec!["Amazon", "Congress"]);
        assert_eq!(ds.records[1].very_favorable, 0.12);
    }

    #[test]
    fn json_with_a_missing_column_is_an_error() {
        let path = write_temp(
            "bad-json",
            "json",
            r#"[{"Filters": "All Adults", "Institutions": "Amazon"}]"#,
        );
        assert!(matches!(
            load_file(&path),
            Err(DataLoadError::Other(_))
        ));
    }

    #[test]
    fn serialized_records_load_back_under_the_source_column_names() {
        let records = vec![
            SurveyRecord::from_parts(
                "All Adults".to_string(),
                "Amazon".to_string(),
                [0.42, 0.31, 0.09, 0.05, 0.08, 0.05],
            ),
            SurveyRecord::from_parts(
                "Income: Under $50k".to_string(),
                "Amazon".to_string(),
                [0.41, 0.3, 0.09, 0.06, 0.09, 0.05],
            ),
        ];

        // The serde renames must emit the exact headers the loader requires,
        // comma-bearing rate column included.
        let csv_path = temp_path("serialized", "csv");
        let mut writer = csv::Writer::from_path(&csv_path).expect("create csv");
        for record in &records {
            writer.serialize(record).expect("serialize row");
        }
        writer.flush().expect("flush csv");
        let ds = load_file(&csv_path).expect("load serialized csv");
        assert_eq!(ds.records, records);

        let json_path = temp_path("serialized", "json");
        let json = serde_json::to_string(&records).expect("serialize records");
        std::fs::write(&json_path, json).expect("write fixture");
        let ds = load_file(&json_path).expect("load serialized json");
        assert_eq!(ds.records, records);
    }

    fn write_sample_parquet(path: &Path, records: &[SurveyRecord]) {
        let mut fields = vec![
            Field::new("Filters", DataType::Utf8, false),
            Field::new("Institutions", DataType::Utf8, false),
        ];
        for name in RATE_COLUMNS {
            fields.push(Field::new(name, DataType::Float64, false));
        }
        let schema = Arc::new(Schema::new(fields));

        let filters: Vec<&str> = records.iter().map(|r| r.filters.as_str()).collect();
        let institutions: Vec<&str> = records.iter().map(|r| r.institution.as_str()).collect();
        let mut columns: Vec<Arc<dyn Array>> = vec![
            Arc::new(StringArray::from(filters)),
            Arc::new(StringArray::from(institutions)),
        ];
        for i in 0..RATE_COLUMNS.len() {
            let rates: Vec<f64> = records.iter().map(|r| r.rates()[i]).collect();
            columns.push(Arc::new(Float64Array::from(rates)));
        }

        let batch = RecordBatch::try_new(schema.clone(), columns).expect("build batch");
        let file = std::fs::File::create(path).expect("create parquet");
        let mut writer = ArrowWriter::try_new(file, schema, None).expect("create writer");
        writer.write(&batch).expect("write batch");
        writer.close().expect("close writer");
    }

    #[test]
    fn parquet_roundtrips_through_the_loader() {
        let records = vec![
            SurveyRecord::from_parts(
                "All Adults".to_string(),
                "The Military".to_string(),
                [0.48, 0.27, 0.08, 0.05, 0.07, 0.05],
            ),
            SurveyRecord::from_parts(
                "Age: 65+".to_string(),
                "The Military".to_string(),
                [0.56, 0.24, 0.06, 0.04, 0.06, 0.04],
            ),
        ];
        let path = temp_path("roundtrip", "parquet");
        write_sample_parquet(&path, &records);

        let ds = load_file(&path).expect("load parquet");
        assert_eq!(ds.records, records);
        assert_eq!(ds.baseline, vec![1]);
        assert_eq!(ds.options.age, vec!["65+"]);
    }

    #[test]
    fn parquet_missing_column_is_a_typed_error() {
        // Write a file with only the two label columns.
        let schema = Arc::new(Schema::new(vec![
            Field::new("Filters", DataType::Utf8, false),
            Field::new("Institutions", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(StringArray::from(vec!["All Adults"])) as Arc<dyn Array>,
                Arc::new(StringArray::from(vec!["Amazon"])) as Arc<dyn Array>,
            ],
        )
        .expect("build batch");
        let path = temp_path("narrow", "parquet");
        let file = std::fs::File::create(&path).expect("create parquet");
        let mut writer = ArrowWriter::try_new(file, schema, None).expect("create writer");
        writer.write(&batch).expect("write batch");
        writer.close().expect("close writer");

        let err = load_file(&path).expect_err("must reject");
        assert!(matches!(err, DataLoadError::MissingColumn("Very favorable")));
    }

    fn write_sample_xlsx(path: &Path, records: &[SurveyRecord]) {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).expect("write header");
        }
        for (row_no, record) in records.iter().enumerate() {
            let row = (row_no + 1) as u32;
            sheet
                .write_string(row, 0, record.filters.as_str())
                .expect("write label");
            // An empty institution stays unwritten; the cell reads back as
            // Empty, not as an empty string.
            if !record.institution.is_empty() {
                sheet
                    .write_string(row, 1, record.institution.as_str())
                    .expect("write institution");
            }
            for (i, rate) in record.rates().into_iter().enumerate() {
                sheet
                    .write_number(row, (2 + i) as u16, rate)
                    .expect("write rate");
            }
        }
        workbook.save(path).expect("save workbook");
    }

    #[test]
    fn xlsx_first_worksheet_loads_records_baseline_and_options() {
        let records = vec![
            SurveyRecord::from_parts(
                "All Adults".to_string(),
                "Amazon".to_string(),
                [0.42, 0.31, 0.09, 0.05, 0.08, 0.05],
            ),
            SurveyRecord::from_parts(
                "Educ: College graduate".to_string(),
                "Amazon".to_string(),
                [0.45, 0.3, 0.08, 0.05, 0.07, 0.05],
            ),
            SurveyRecord::from_parts(
                "Age: 18-29".to_string(),
                String::new(),
                [0.4, 0.32, 0.1, 0.06, 0.07, 0.05],
            ),
        ];
        let path = temp_path("workbook", "xlsx");
        write_sample_xlsx(&path, &records);

        let ds = load_file(&path).expect("load xlsx");
        assert_eq!(ds.records, records);
        assert_eq!(ds.baseline, vec![1, 2]);
        assert_eq!(ds.options.institutions, vec!["Amazon"]);
        assert_eq!(ds.options.education, vec!["College graduate"]);
        assert_eq!(ds.options.age, vec!["18-29"]);
    }

    #[test]
    fn xlsx_missing_column_is_a_typed_error() {
        // Only the two label columns in the header row.
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "Filters").expect("write header");
        sheet.write_string(0, 1, "Institutions").expect("write header");
        let path = temp_path("narrow-workbook", "xlsx");
        workbook.save(&path).expect("save workbook");

        let err = load_file(&path).expect_err("must reject");
        assert!(matches!(err, DataLoadError::MissingColumn("Very favorable")));
    }

    #[test]
    fn xlsx_with_a_text_rate_reports_the_worksheet_row() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, name) in REQUIRED_COLUMNS.iter().enumerate() {
            sheet.write_string(0, col as u16, *name).expect("write header");
        }
        sheet.write_string(1, 0, "All Adults").expect("write label");
        sheet.write_string(1, 1, "Amazon").expect("write institution");
        for i in 0..6 {
            sheet.write_number(1, (2 + i) as u16, 0.1).expect("write rate");
        }
        sheet.write_string(2, 0, "Age: 18-29").expect("write label");
        sheet.write_string(2, 1, "Amazon").expect("write institution");
        sheet.write_string(2, 2, "n/a").expect("write bad rate");
        let path = temp_path("bad-workbook", "xlsx");
        workbook.save(&path).expect("save workbook");

        let err = load_file(&path).expect_err("must reject");
        assert!(matches!(err, DataLoadError::Other(_)));
        // The header occupies worksheet row 1; the malformed record is row 3.
        assert!(
            err.to_string()
                .contains("Worksheet row 3: reading 'Very favorable'")
        );
    }

    #[test]
    fn bundled_sample_loads_and_filters() {
        use crate::data::filter::{FilterSelection, filter_view};

        let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data/SV.csv");
        let ds = load_file(&path).expect("load bundled sample");

        // Ten institutions, eleven demographic rows each plus one topline row.
        assert_eq!(ds.options.institutions.len(), 10);
        assert_eq!(ds.baseline.len(), 110);
        assert_eq!(ds.len(), 120);
        assert!(ds.options.education.iter().any(|v| v == "College graduate"));
        assert!(ds.options.age.iter().any(|v| v == "18-29"));

        // Rates are fractions throughout.
        for record in &ds.records {
            for rate in record.rates() {
                assert!((0.0..=1.0).contains(&rate), "rate out of range: {rate}");
            }
        }

        // A demographic filter narrows to one row per institution.
        let selection = FilterSelection {
            education: Some("College graduate".to_string()),
            ..Default::default()
        };
        let (rows, page_size) = filter_view(&ds, &selection, 25);
        assert_eq!(rows.len(), 10);
        assert_eq!(page_size, 25);
    }
}
