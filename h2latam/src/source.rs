//! Reading the raw facility table from disk.
//!
//! Spreadsheets are read with calamine and converted to a polars `DataFrame` column by column;
//! CSV and parquet sources go straight through polars readers. No column is renamed or validated
//! here, that happens when the `Dataset` is built.

use std::fs::File;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Range, Reader};
use log::{debug, info};
use polars::prelude::*;

use crate::error::{H2Error, Result};

/// The kinds of file a facility table can be read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceFormat {
    Spreadsheet,
    Csv,
    Parquet,
}

impl SourceFormat {
    /// Choose a reader from the file extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match extension.as_str() {
            "xlsx" | "xlsm" | "xlsb" | "xls" | "ods" => Ok(Self::Spreadsheet),
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            _ => Err(H2Error::UnsupportedFormat(
                path.as_ref().display().to_string(),
            )),
        }
    }
}

/// Read the facility table at `path`. `sheet` selects a worksheet for spreadsheet sources and is
/// ignored otherwise.
pub fn read_source<P: AsRef<Path>>(path: P, sheet: Option<&str>) -> Result<DataFrame> {
    let path = path.as_ref();
    let format = SourceFormat::from_path(path)?;
    info!("Reading facility table from {} ({format:?})", path.display());
    let df = match format {
        SourceFormat::Spreadsheet => read_spreadsheet(path, sheet)?,
        SourceFormat::Csv => read_csv(path)?,
        SourceFormat::Parquet => ParquetReader::new(File::open(path)?).finish()?,
    };
    debug!("Raw facility table shape: {:?}", df.shape());
    Ok(df)
}

fn read_csv(path: &Path) -> Result<DataFrame> {
    Ok(CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?)
}

fn read_spreadsheet(path: &Path, sheet: Option<&str>) -> Result<DataFrame> {
    let mut workbook = open_workbook_auto(path)?;
    let range = match sheet {
        Some(name) => workbook.worksheet_range(name)?,
        None => workbook
            .worksheet_range_at(0)
            .ok_or_else(|| H2Error::EmptySource(path.display().to_string()))??,
    };
    range_to_frame(&range, &path.display().to_string())
}

/// Convert a worksheet range into a `DataFrame`, taking the first row as the header.
///
/// A column whose non-empty cells are all numeric becomes `Float64`; any other column becomes
/// `String`, with dates rendered as ISO dates so their year survives.
pub fn range_to_frame(range: &Range<Data>, origin: &str) -> Result<DataFrame> {
    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| H2Error::EmptySource(origin.to_string()))?;
    let body: Vec<&[Data]> = rows.collect();

    let columns = header
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let name = match name {
                Data::Empty => format!("column_{idx}"),
                other => other.to_string().trim().to_string(),
            };
            let cells = body.iter().map(|row| row.get(idx).unwrap_or(&Data::Empty));
            cells_to_series(&name, cells)
        })
        .collect::<Vec<_>>();

    Ok(DataFrame::new(columns)?)
}

fn cells_to_series<'a>(name: &str, cells: impl Iterator<Item = &'a Data> + Clone) -> Series {
    let all_numeric = cells
        .clone()
        .all(|cell| matches!(cell, Data::Empty | Data::Int(_) | Data::Float(_)));
    if all_numeric {
        let values: Vec<Option<f64>> = cells
            .map(|cell| match cell {
                Data::Int(n) => Some(*n as f64),
                Data::Float(n) => Some(*n),
                _ => None,
            })
            .collect();
        Series::new(name, values)
    } else {
        let values: Vec<Option<String>> = cells.map(cell_to_string).collect();
        Series::new(name, values)
    }
}

fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty => None,
        Data::String(s) if s.trim().is_empty() => None,
        Data::DateTime(dt) => Some(
            dt.as_datetime()
                .map(|dt| dt.date().format("%Y-%m-%d").to_string())
                .unwrap_or_else(|| dt.as_f64().to_string()),
        ),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use calamine::{ExcelDateTime, ExcelDateTimeType};

    use super::*;
    use crate::dataset::Dataset;
    use crate::COL;

    #[test]
    fn format_is_chosen_from_extension() {
        assert_eq!(
            SourceFormat::from_path("db_operational.xlsx").unwrap(),
            SourceFormat::Spreadsheet
        );
        assert_eq!(
            SourceFormat::from_path("data/DB.CSV").unwrap(),
            SourceFormat::Csv
        );
        assert_eq!(
            SourceFormat::from_path("facilities.parquet").unwrap(),
            SourceFormat::Parquet
        );
        assert!(matches!(
            SourceFormat::from_path("facilities.txt"),
            Err(H2Error::UnsupportedFormat(_))
        ));
        assert!(SourceFormat::from_path("no_extension").is_err());
    }

    #[test]
    fn csv_source_reads_headers_verbatim() {
        let mut file = tempfile::Builder::new().suffix(".csv").tempfile().unwrap();
        writeln!(file, "Country,Capacity_Nm³ H₂/y,Date online").unwrap();
        writeln!(file, "Chile,500,2021").unwrap();
        writeln!(file, "Peru,250,2022").unwrap();

        let df = read_source(file.path(), None).unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert!(df.column(COL::source::CAPACITY).is_ok());
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = read_source("does/not/exist.csv", None);
        assert!(result.is_err(), "A missing source should fail to load");
    }

    #[test]
    fn worksheet_range_converts_to_typed_columns() {
        let mut range: Range<Data> = Range::new((0, 0), (2, 2));
        range.set_value((0, 0), Data::String("Country".into()));
        range.set_value((0, 1), Data::String("Capacity_Nm³ H₂/y".into()));
        range.set_value((0, 2), Data::String("Date online".into()));
        range.set_value((1, 0), Data::String("Colombia".into()));
        range.set_value((1, 1), Data::Int(1000));
        range.set_value((1, 2), Data::Float(2021.0));
        range.set_value((2, 0), Data::String("Chile".into()));
        range.set_value((2, 1), Data::Float(500.5));
        range.set_value((2, 2), Data::String("2023-04".into()));

        let df = range_to_frame(&range, "test").unwrap();
        assert_eq!(df.shape(), (2, 3));
        assert_eq!(
            df.column(COL::source::CAPACITY).unwrap().dtype(),
            &DataType::Float64
        );
        assert_eq!(
            df.column(COL::source::DATE_ONLINE).unwrap().dtype(),
            &DataType::String
        );
        let countries: Vec<Option<&str>> = df
            .column(COL::source::COUNTRY)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(countries, vec![Some("Colombia"), Some("Chile")]);
    }

    #[test]
    fn excel_dates_become_iso_dates_and_years() {
        let headers = [
            COL::source::COUNTRY,
            COL::source::TECHNOLOGY,
            COL::source::TECHNOLOGY_DETAIL,
            COL::source::CAPACITY,
            COL::source::PROJECT_NAME,
            COL::source::DATE_ONLINE,
        ];
        let mut range: Range<Data> = Range::new((0, 0), (1, 5));
        for (idx, header) in headers.iter().enumerate() {
            range.set_value((0, idx as u32), Data::String(header.to_string()));
        }
        range.set_value((1, 0), Data::String("Colombia".into()));
        range.set_value((1, 1), Data::String("PEM".into()));
        range.set_value((1, 2), Data::String("Grid".into()));
        range.set_value((1, 3), Data::Float(20_000.0));
        range.set_value((1, 4), Data::String("Cartagena Refinery Pilot".into()));
        // Serial 45078 is 2023-06-01
        range.set_value(
            (1, 5),
            Data::DateTime(ExcelDateTime::new(
                45078.0,
                ExcelDateTimeType::DateTime,
                false,
            )),
        );

        let df = range_to_frame(&range, "test").unwrap();
        let dates = df.column(COL::source::DATE_ONLINE).unwrap();
        assert_eq!(dates.dtype(), &DataType::String);
        assert_eq!(dates.str().unwrap().get(0), Some("2023-06-01"));

        let dataset = Dataset::from_frame(&df).unwrap();
        let facilities = dataset.facilities();
        assert_eq!(
            facilities.column(COL::ONLINE_YEAR).unwrap().i32().unwrap().get(0),
            Some(2023)
        );
        assert_eq!(
            facilities.column(COL::ONLINE_DATE).unwrap().str().unwrap().get(0),
            Some("2023-06-01")
        );
    }

    /// Write a one-sheet workbook named `sheet` with two facilities, years stored as numbers.
    fn write_workbook(sheet: &str) -> tempfile::NamedTempFile {
        fn inline(cell: &str, text: &str) -> String {
            format!(r#"<c r="{cell}" t="inlineStr"><is><t>{text}</t></is></c>"#)
        }
        fn number(cell: &str, value: f64) -> String {
            format!(r#"<c r="{cell}"><v>{value}</v></c>"#)
        }
        let header = [
            inline("A1", COL::source::COUNTRY),
            inline("B1", COL::source::TECHNOLOGY),
            inline("C1", COL::source::TECHNOLOGY_DETAIL),
            inline("D1", COL::source::CAPACITY),
            inline("E1", COL::source::PROJECT_NAME),
            inline("F1", COL::source::DATE_ONLINE),
        ]
        .concat();
        let first = [
            inline("A2", "Colombia"),
            inline("B2", "PEM"),
            inline("C2", "Dedicated renewable"),
            number("D2", 40_000.0),
            inline("E2", "La Guajira Verde"),
            number("F2", 2022.0),
        ]
        .concat();
        let second = [
            inline("A3", "Chile"),
            inline("B3", "ALK"),
            inline("C3", "Unknown"),
            number("D3", 50_000.0),
            inline("E3", "Antofagasta Mining Fleet"),
            number("F3", 2024.0),
        ]
        .concat();

        let parts = [
            (
                "[Content_Types].xml",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#.to_string(),
            ),
            (
                "_rels/.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/workbook.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="{sheet}" sheetId="1" r:id="rId1"/></sheets></workbook>"#
                ),
            ),
            (
                "xl/_rels/workbook.xml.rels",
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#.to_string(),
            ),
            (
                "xl/worksheets/sheet1.xml",
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1">{header}</row><row r="2">{first}</row><row r="3">{second}</row></sheetData></worksheet>"#
                ),
            ),
        ];

        let mut file = tempfile::Builder::new().suffix(".xlsx").tempfile().unwrap();
        {
            let mut zip = ::zip::ZipWriter::new(file.as_file_mut());
            for (name, contents) in parts {
                zip.start_file(name, ::zip::write::FileOptions::default())
                    .unwrap();
                zip.write_all(contents.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        file
    }

    #[test]
    fn workbook_sheets_are_read_by_name_or_position() {
        let workbook = write_workbook("Operational");
        let named = read_source(workbook.path(), Some("Operational")).unwrap();
        assert_eq!(named.shape(), (2, 6));
        assert_eq!(
            named.column(COL::source::CAPACITY).unwrap().dtype(),
            &DataType::Float64
        );
        let first = read_source(workbook.path(), None).unwrap();
        assert!(first.equals(&named));

        let dataset = Dataset::load(workbook.path(), None).unwrap();
        let dates: Vec<Option<&str>> = dataset
            .facilities()
            .column(COL::ONLINE_DATE)
            .unwrap()
            .str()
            .unwrap()
            .into_iter()
            .collect();
        assert_eq!(dates, vec![Some("2022"), Some("2024")]);
    }

    #[test]
    fn unknown_sheet_fails_the_load() {
        let workbook = write_workbook("Operational");
        assert!(matches!(
            read_source(workbook.path(), Some("Pipeline")),
            Err(H2Error::SpreadsheetError(_))
        ));
        assert!(Dataset::load(workbook.path(), Some("Pipeline")).is_err());
    }

    #[test]
    fn empty_range_has_no_header() {
        let range: Range<Data> = Range::empty();
        assert!(matches!(
            range_to_frame(&range, "empty"),
            Err(H2Error::EmptySource(_))
        ));
    }
}
