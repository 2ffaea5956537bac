//! File classification and shallow metadata extraction.
//!
//! Every uploaded file is classified exactly once by [`classify`]. The file's extension selects
//! a reader; when the extension is not recognised the leading bytes are checked against known
//! image signatures before falling back to [`FileMetadata::Unknown`].
//!
//! | Extension          | `file_type` | Content read |
//! |--------------------|-------------|--------------|
//! | `csv`              | `csv`       | yes          |
//! | `xlsx`, `xls`      | `xlsx`      | yes          |
//! | `json`             | `json`      | yes          |
//! | `pdf`              | `pdf`       | no           |
//! | `doc`, `docx`      | `docx`      | no           |
//! | `ppt`, `pptx`      | `pptx`      | no           |
//! | anything else      | `image` if the signature matches, otherwise `unknown` |
//!
//! Document and image dimensions are zero placeholders: no document parsing or image decoding
//! happens here.
//!
//! Failures while reading a file never escape: they are reported as [`FileMetadata::Error`] so
//! that one bad upload does not fail the whole request.

mod json;
pub mod signature;
mod tabular;

use std::io::{Cursor, Read};

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error as ThisError;
use utoipa::ToSchema;

pub use signature::ImageFormat;

/// Reasons a single file could not be summarised.
#[derive(ThisError, Debug)]
pub enum ClassifyError {
    /// The delimited text has no header row
    #[error("No columns to parse from file")]
    NoColumns,

    /// A record carries more fields than the header declares
    #[error("Error tokenizing data. Expected {expected} fields in line {line}, saw {found}")]
    RaggedRecord { expected: usize, line: u64, found: usize },

    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// The workbook opened but contains no worksheet
    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error(transparent)]
    Spreadsheet(#[from] calamine::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Top-level JSON value is neither an array nor an object
    #[error("Top-level JSON {found} has no length")]
    UnsizedJson { found: &'static str },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Metadata extracted from one uploaded file, tagged by `file_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "file_type", rename_all = "lowercase")]
pub enum FileMetadata {
    Csv {
        filename: String,
        rows: usize,
        columns: usize,
        column_names: Vec<String>,
        /// First rows of the table, keyed by column name
        #[schema(value_type = Vec<Object>)]
        sample_data: Vec<Map<String, Value>>,
    },
    /// Spreadsheets; `.xls` uploads are reported as `xlsx` as well
    Xlsx {
        filename: String,
        rows: usize,
        columns: usize,
        column_names: Vec<String>,
        #[schema(value_type = Vec<Object>)]
        sample_data: Vec<Map<String, Value>>,
    },
    Json {
        filename: String,
        /// `list` for a top-level array, `dict` for a top-level object
        structure: String,
        size: usize,
        sample: String,
    },
    Pdf {
        filename: String,
        pages: u32,
        word_count: u32,
    },
    Docx {
        filename: String,
        word_count: u32,
        paragraph_count: u32,
    },
    Pptx {
        filename: String,
        slides: u32,
    },
    Image {
        filename: String,
        detected_format: ImageFormat,
        width: u32,
        height: u32,
    },
    Unknown {
        filename: String,
        size_bytes: usize,
    },
    Error {
        filename: String,
        error: String,
    },
}

impl FileMetadata {
    pub fn filename(&self) -> &str {
        match self {
            FileMetadata::Csv { filename, .. }
            | FileMetadata::Xlsx { filename, .. }
            | FileMetadata::Json { filename, .. }
            | FileMetadata::Pdf { filename, .. }
            | FileMetadata::Docx { filename, .. }
            | FileMetadata::Pptx { filename, .. }
            | FileMetadata::Image { filename, .. }
            | FileMetadata::Unknown { filename, .. }
            | FileMetadata::Error { filename, .. } => filename,
        }
    }

    /// The `file_type` tag this record serializes with.
    pub fn file_type(&self) -> &'static str {
        match self {
            FileMetadata::Csv { .. } => "csv",
            FileMetadata::Xlsx { .. } => "xlsx",
            FileMetadata::Json { .. } => "json",
            FileMetadata::Pdf { .. } => "pdf",
            FileMetadata::Docx { .. } => "docx",
            FileMetadata::Pptx { .. } => "pptx",
            FileMetadata::Image { .. } => "image",
            FileMetadata::Unknown { .. } => "unknown",
            FileMetadata::Error { .. } => "error",
        }
    }

    fn error(filename: &str, error: &ClassifyError) -> Self {
        FileMetadata::Error {
            filename: filename.to_string(),
            error: error.to_string(),
        }
    }
}

/// Readers selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileKind {
    Csv,
    Spreadsheet,
    Json,
    Pdf,
    Document,
    Presentation,
    Other,
}

impl FileKind {
    fn from_filename(filename: &str) -> Self {
        match extension(filename).as_deref() {
            Some("csv") => FileKind::Csv,
            Some("xlsx" | "xls") => FileKind::Spreadsheet,
            Some("json") => FileKind::Json,
            Some("pdf") => FileKind::Pdf,
            Some("doc" | "docx") => FileKind::Document,
            Some("ppt" | "pptx") => FileKind::Presentation,
            _ => FileKind::Other,
        }
    }
}

/// Lower-cased text after the last `.`, or `None` when the name has no `.`.
fn extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

/// Classify `content` uploaded under `filename`.
///
/// Never fails: read errors are folded into [`FileMetadata::Error`], which keeps the filename.
pub fn classify(filename: &str, content: &[u8]) -> FileMetadata {
    let kind = FileKind::from_filename(filename);

    match read_metadata(filename, kind, content) {
        Ok(metadata) => {
            tracing::debug!(
                filename = %filename,
                file_type = metadata.file_type(),
                size_bytes = content.len(),
                "Classified upload"
            );
            metadata
        }
        Err(e) => {
            tracing::warn!(filename = %filename, kind = ?kind, error = %e, "Failed to read upload");
            FileMetadata::error(filename, &e)
        }
    }
}

fn read_metadata(filename: &str, kind: FileKind, content: &[u8]) -> Result<FileMetadata, ClassifyError> {
    let filename = filename.to_string();

    let metadata = match kind {
        FileKind::Csv => {
            let table = tabular::read_csv(content)?;
            FileMetadata::Csv {
                filename,
                rows: table.row_count,
                columns: table.column_names.len(),
                column_names: table.column_names,
                sample_data: table.sample,
            }
        }
        FileKind::Spreadsheet => {
            let table = tabular::read_spreadsheet(content)?;
            FileMetadata::Xlsx {
                filename,
                rows: table.row_count,
                columns: table.column_names.len(),
                column_names: table.column_names,
                sample_data: table.sample,
            }
        }
        FileKind::Json => {
            let summary = json::summarize(content)?;
            FileMetadata::Json {
                filename,
                structure: summary.structure.to_string(),
                size: summary.size,
                sample: summary.sample,
            }
        }
        FileKind::Pdf => FileMetadata::Pdf {
            filename,
            pages: 0,
            word_count: 0,
        },
        FileKind::Document => FileMetadata::Docx {
            filename,
            word_count: 0,
            paragraph_count: 0,
        },
        FileKind::Presentation => FileMetadata::Pptx { filename, slides: 0 },
        FileKind::Other => match ImageFormat::sniff(content) {
            Some(detected_format) => FileMetadata::Image {
                filename,
                detected_format,
                width: 0,
                height: 0,
            },
            None => FileMetadata::Unknown {
                filename,
                size_bytes: content.len(),
            },
        },
    };

    Ok(metadata)
}

/// A file received in a request, held in memory behind a read cursor.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    filename: String,
    content: Cursor<Bytes>,
}

impl UploadedFile {
    pub fn new(filename: impl Into<String>, content: impl Into<Bytes>) -> Self {
        Self {
            filename: filename.into(),
            content: Cursor::new(content.into()),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    /// Size of the upload in bytes.
    pub(crate) fn len(&self) -> usize {
        self.content.get_ref().len()
    }

    /// Current read position within the content.
    pub fn position(&self) -> u64 {
        self.content.position()
    }

    /// Read the whole upload and classify it.
    ///
    /// The read position is put back where it was on every exit path, so later stages can read
    /// the content again.
    pub fn classify(&mut self) -> FileMetadata {
        let start = self.content.position();
        let mut content = scopeguard::guard(&mut self.content, move |content| content.set_position(start));

        content.set_position(0);
        let mut buf = Vec::with_capacity(content.get_ref().len());
        if let Err(e) = content.read_to_end(&mut buf) {
            return FileMetadata::error(&self.filename, &ClassifyError::from(e));
        }

        classify(&self.filename, &buf)
    }
}
