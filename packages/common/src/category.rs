use serde::{Deserialize, Serialize};

use crate::location::Location;

/// How many files a category holds per location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// Any number of files, deduplicated by name.
    Many,
    /// Exactly one file, stored under a normalized name.
    One,
}

/// The four kinds of upload a location can receive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum UploadCategory {
    /// Equipment photos.
    Photos,
    /// Manufacturer part spreadsheet.
    ManufacturerSheet,
    /// Job hazard analysis documents.
    HazardPdfs,
    /// Job hazard analysis workbook.
    HazardSheet,
}

impl UploadCategory {
    pub const ALL: [UploadCategory; 4] = [
        Self::Photos,
        Self::ManufacturerSheet,
        Self::HazardPdfs,
        Self::HazardSheet,
    ];

    pub fn cardinality(self) -> Cardinality {
        match self {
            Self::Photos | Self::HazardPdfs => Cardinality::Many,
            Self::ManufacturerSheet | Self::HazardSheet => Cardinality::One,
        }
    }

    /// Extensions accepted at upload time. `None` accepts any flat filename.
    pub fn accepted_extensions(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Photos | Self::HazardPdfs => None,
            Self::ManufacturerSheet => Some(&[".xlsx", ".xls"]),
            Self::HazardSheet => Some(&[".xlsx", ".xls", ".xlsb"]),
        }
    }

    /// Normalized stored name for single-file categories, e.g.
    /// `manufacturer_file_42.xlsx`. `extension` includes the leading dot.
    pub fn stored_name(self, location: &Location, extension: &str) -> Option<String> {
        let prefix = match self {
            Self::ManufacturerSheet => "manufacturer_file",
            Self::HazardSheet => "jha_excel",
            Self::Photos | Self::HazardPdfs => return None,
        };
        Some(format!("{prefix}_{location}{extension}"))
    }

    /// Human-readable label used in messages.
    pub fn label(self) -> &'static str {
        match self {
            Self::Photos => "photos",
            Self::ManufacturerSheet => "manufacturer file",
            Self::HazardPdfs => "JHA PDFs",
            Self::HazardSheet => "JHA Excel",
        }
    }
}
