//! On-disk convention for staged uploads and analyzer output.
//!
//! ```text
//! uploads/photos/{location}/...
//! uploads/manufacturer/{location}/manufacturer_file_{location}.xlsx
//! uploads/jha/{location}/pdfs/...
//! uploads/jha/{location}/excel/jha_excel_{location}.xlsb
//! output/...
//! output/.deliver/{request_id}-{result}
//! ```
//!
//! All paths are relative to the staging store root.

use std::path::PathBuf;

use crate::category::UploadCategory;
use crate::location::Location;

pub const UPLOADS_DIR: &str = "uploads";
pub const OUTPUT_DIR: &str = "output";
pub const DELIVERY_DIR: &str = ".deliver";

pub fn uploads_dir() -> PathBuf {
    PathBuf::from(UPLOADS_DIR)
}

pub fn output_dir() -> PathBuf {
    PathBuf::from(OUTPUT_DIR)
}

/// `uploads/jha/{location}`, the parent of both hazard-analysis categories.
pub fn hazard_location_dir(location: &Location) -> PathBuf {
    uploads_dir().join("jha").join(location.as_str())
}

/// Directory holding one category of uploads for a location.
pub fn category_dir(category: UploadCategory, location: &Location) -> PathBuf {
    match category {
        UploadCategory::Photos => uploads_dir().join("photos").join(location.as_str()),
        UploadCategory::ManufacturerSheet => {
            uploads_dir().join("manufacturer").join(location.as_str())
        }
        UploadCategory::HazardPdfs => hazard_location_dir(location).join("pdfs"),
        UploadCategory::HazardSheet => hazard_location_dir(location).join("excel"),
    }
}

/// Fixed path of an analyzer result file under `output/`.
pub fn output_file(name: &str) -> PathBuf {
    output_dir().join(name)
}

/// `output/.deliver`, where finished results wait to be streamed.
pub fn delivery_dir() -> PathBuf {
    output_dir().join(DELIVERY_DIR)
}

/// Per-request copy of a result, so one download never races the next run.
pub fn delivery_file(request_id: u64, name: &str) -> PathBuf {
    delivery_dir().join(format!("{request_id}-{name}"))
}
