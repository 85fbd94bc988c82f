use crate::error::IngestError;

use calamine::{open_workbook_from_rs, Data, DataType, Reader, Xlsx};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

/// One non-blank row of the file. `line` is 1-based: the CSV line the record
/// starts on, or the worksheet row number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    pub line: usize,
    pub cells: Vec<String>,
}

impl RawRow {
    fn is_blank(&self) -> bool {
        self.cells.iter().all(|cell| cell.is_empty())
    }
}

/// Rows as read from the file. The first row is the header row.
pub type RawTable = Vec<RawRow>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Csv,
    Xlsx,
}

impl FileKind {
    /// Picks the decoder from the file extension (case-insensitive).
    pub fn from_file_name(file_name: &str) -> Result<Self, IngestError> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();

        match extension.as_str() {
            "csv" => Ok(FileKind::Csv),
            "xlsx" => Ok(FileKind::Xlsx),
            _ => Err(IngestError::UnsupportedFormat(file_name.to_string())),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileKind::Csv => "csv",
            FileKind::Xlsx => "xlsx",
        }
    }
}

/// Rejects files over `limit_mb` megabytes.
pub fn check_size(size: u64, limit_mb: u64) -> Result<(), IngestError> {
    if size > limit_mb.saturating_mul(1024 * 1024) {
        return Err(IngestError::FileTooLarge { size, limit_mb });
    }
    Ok(())
}

pub fn decode(kind: FileKind, bytes: &[u8]) -> Result<RawTable, IngestError> {
    match kind {
        FileKind::Csv => read_csv(bytes),
        FileKind::Xlsx => read_xlsx(bytes),
    }
}

/// Reads CSV rows. Cells that are not valid UTF-8 (Latin-1 exports) are
/// decoded lossily instead of failing the file.
pub fn read_csv(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(bytes);

    let mut rows = Vec::new();
    for record in rdr.byte_records() {
        let record = record?;
        let row = RawRow {
            line: record.position().map_or(0, |p| p.line() as usize),
            cells: record
                .iter()
                .map(|cell| String::from_utf8_lossy(cell).into_owned())
                .collect(),
        };
        if row.is_blank() {
            continue;
        }
        rows.push(row);
    }

    Ok(rows)
}

/// Reads the first worksheet of an xlsx workbook.
pub fn read_xlsx(bytes: &[u8]) -> Result<RawTable, IngestError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;

    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => {
            return Err(IngestError::FileRead {
                message: "workbook has no worksheets".to_string(),
            })
        }
    };
    let first_row = range.start().map_or(0, |(row, _)| row as usize);

    Ok(range
        .rows()
        .enumerate()
        .map(|(i, row)| RawRow {
            line: first_row + i + 1,
            cells: row.iter().map(cell_text).collect(),
        })
        .filter(|row| !row.is_blank())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        _ => cell.to_string().trim().to_string(),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    fn cells(table: &RawTable) -> Vec<Vec<&str>> {
        table
            .iter()
            .map(|row| row.cells.iter().map(String::as_str).collect())
            .collect()
    }

    fn lines(table: &RawTable) -> Vec<usize> {
        table.iter().map(|row| row.line).collect()
    }

    #[test]
    fn test_file_kind_from_extension() {
        assert_eq!(FileKind::from_file_name("base.csv").unwrap(), FileKind::Csv);
        assert_eq!(FileKind::from_file_name("BASE.XLSX").unwrap(), FileKind::Xlsx);
        assert!(matches!(
            FileKind::from_file_name("base.xls"),
            Err(IngestError::UnsupportedFormat(_))
        ));
        assert!(matches!(
            FileKind::from_file_name("no_extension"),
            Err(IngestError::UnsupportedFormat(_))
        ));
    }

    #[test]
    fn test_check_size_limit() {
        assert!(check_size(10 * 1024 * 1024, 10).is_ok());
        match check_size(10 * 1024 * 1024 + 1, 10) {
            Err(IngestError::FileTooLarge { size, limit_mb }) => {
                assert_eq!(size, 10 * 1024 * 1024 + 1);
                assert_eq!(limit_mb, 10);
            }
            _ => panic!("Expected FileTooLarge error"),
        }
    }

    #[test]
    fn test_check_size_huge_limit_does_not_wrap() {
        assert!(check_size(10, 1 << 44).is_ok());
        assert!(check_size(u64::MAX, u64::MAX).is_ok());
    }

    #[test]
    fn test_read_csv_trims_and_skips_blank_lines() {
        let csv = b"nome , cpf,valor\n\nAna, 123 ,100.50\n , , \nBruno,456,20\n";
        let rows = read_csv(csv).unwrap();

        assert_eq!(
            cells(&rows),
            vec![
                vec!["nome", "cpf", "valor"],
                vec!["Ana", "123", "100.50"],
                vec!["Bruno", "456", "20"],
            ]
        );
        assert_eq!(lines(&rows), vec![1, 3, 5]);
    }

    #[test]
    fn test_read_csv_keeps_ragged_rows() {
        let csv = b"nome,cpf,valor,email\nAna,123\n";
        let rows = read_csv(csv).unwrap();

        assert_eq!(rows[1].cells, vec!["Ana", "123"]);
    }

    #[test]
    fn test_read_csv_quoted_commas() {
        let csv = b"nome,endereco\n\"Silva, Ana\",\"Rua A, 10\"\n";
        let rows = read_csv(csv).unwrap();

        assert_eq!(rows[1].cells, vec!["Silva, Ana", "Rua A, 10"]);
    }

    #[test]
    fn test_read_csv_multiline_cell_keeps_start_line() {
        let csv = b"nome,endereco\n\"Ana\",\"Rua A\n10\"\nBia,Rua B\n";
        let rows = read_csv(csv).unwrap();

        assert_eq!(lines(&rows), vec![1, 2, 4]);
        assert_eq!(rows[1].cells[1], "Rua A\n10");
    }

    #[test]
    fn test_read_csv_latin1_is_decoded_lossily() {
        let csv = b"nome,cpf,valor\nJos\xE9,1,10\nAna,2,20\n";
        let rows = read_csv(csv).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1].cells, vec!["Jos\u{FFFD}", "1", "10"]);
        assert_eq!(rows[2].cells, vec!["Ana", "2", "20"]);
    }

    #[test]
    fn test_read_xlsx_first_sheet() {
        let rows = read_xlsx(&fixtures::debtor_workbook()).unwrap();

        assert_eq!(
            cells(&rows),
            vec![
                vec!["Nome", "CPF", "Valor", "Data"],
                vec!["Ana", "12345678900", "100.5", "2024-12-01"],
                vec!["Bruno", "222", "250", ""],
                vec!["Carla", "333", "-1", ""],
            ]
        );
        assert_eq!(lines(&rows), vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_cell_text_numbers() {
        assert_eq!(cell_text(&Data::Int(7)), "7");
        assert_eq!(cell_text(&Data::Float(250.0)), "250");
        assert_eq!(cell_text(&Data::Float(0.01)), "0.01");
        assert_eq!(cell_text(&Data::String("  Ana ".to_string())), "Ana");
        assert_eq!(cell_text(&Data::Empty), "");
    }

    #[test]
    fn test_read_xlsx_garbage_is_read_error() {
        let result = read_xlsx(b"definitely not a zip archive");
        assert!(matches!(result, Err(IngestError::FileRead { .. })));
    }
}
