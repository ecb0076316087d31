//! Article link loading from a spreadsheet.
//!
//! The briefing starts from a workbook with a header row and a `URL` column.
//! Each data row yields one link, in row order; the links are not validated
//! here, malformed ones simply fail later at fetch time.

use std::path::PathBuf;

use calamine::{Data, Range, Reader, open_workbook_auto};
use tracing::{debug, info, instrument};

use newsbrief_shared::{NewsbriefError, Result};

// ---------------------------------------------------------------------------
// LinkSource
// ---------------------------------------------------------------------------

/// Anything that can produce the ordered list of links for one run.
pub trait LinkSource {
    /// Load every link, in source order.
    fn load(&self) -> Result<Vec<String>>;
}

/// A fixed in-memory list of links.
#[derive(Debug, Clone, Default)]
pub struct StaticLinks(pub Vec<String>);

impl LinkSource for StaticLinks {
    fn load(&self) -> Result<Vec<String>> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// SpreadsheetLinks
// ---------------------------------------------------------------------------

/// Reads links from one column of the first worksheet of a workbook.
#[derive(Debug, Clone)]
pub struct SpreadsheetLinks {
    path: PathBuf,
    column: String,
}

impl SpreadsheetLinks {
    /// Read the column headed `column` from the workbook at `path`.
    pub fn new(path: impl Into<PathBuf>, column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            column: column.into(),
        }
    }
}

impl LinkSource for SpreadsheetLinks {
    #[instrument(skip_all, fields(path = %self.path.display(), column = %self.column))]
    fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Err(NewsbriefError::spreadsheet(&self.path, "file not found"));
        }

        let mut workbook = open_workbook_auto(&self.path)
            .map_err(|e| NewsbriefError::spreadsheet(&self.path, e.to_string()))?;

        let sheet_name = workbook.sheet_names().first().cloned().unwrap_or_default();
        let range = workbook
            .worksheet_range_at(0)
            .ok_or_else(|| NewsbriefError::spreadsheet(&self.path, "workbook has no worksheets"))?
            .map_err(|e| NewsbriefError::spreadsheet(&self.path, e.to_string()))?;

        debug!(sheet = %sheet_name, rows = range.height(), "worksheet opened");

        let links = column_values(&range, &self.column)
            .map_err(|message| NewsbriefError::spreadsheet(&self.path, message))?;

        info!(links = links.len(), "links loaded");
        Ok(links)
    }
}

// ---------------------------------------------------------------------------
// Column extraction
// ---------------------------------------------------------------------------

/// Return every data-row value of the column whose header is `column`.
///
/// The first row of `range` is the header row. Each later row contributes
/// exactly one string: empty cells become `""`, non-string cells use their
/// display form.
fn column_values(range: &Range<Data>, column: &str) -> std::result::Result<Vec<String>, String> {
    let mut rows = range.rows();

    let header = rows
        .next()
        .ok_or_else(|| format!("worksheet is empty, expected a '{column}' column"))?;

    let index = header
        .iter()
        .position(|cell| cell_text(cell).trim() == column)
        .ok_or_else(|| format!("column '{column}' not found in header row"))?;

    Ok(rows
        .map(|row| row.get(index).map(cell_text).unwrap_or_default())
        .collect())
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}
