use std::fmt;
use std::path::{Path, PathBuf};

use common::{Location, UploadCategory, layout};
use serde::{Deserialize, Serialize};

pub const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png"];
pub const SHEET_EXTENSIONS: &[&str] = &[".xlsx", ".xls"];
pub const HAZARD_EXTENSIONS: &[&str] = &[".pdf", ".docx", ".xlsx", ".xlsb"];

pub const EQUIPMENT_RESULT: &str = "equipment_inventory.csv";
pub const HAZARD_RESULT: &str = "jha_processed.xlsb";

/// Which extraction job to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineKind {
    Equipment,
    HazardAnalysis,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 2] = [Self::Equipment, Self::HazardAnalysis];

    /// Build the descriptor for one location.
    pub fn pipeline(self, location: &Location) -> Pipeline {
        match self {
            Self::Equipment => Pipeline {
                kind: self,
                inputs: vec![
                    InputRequirement {
                        label: "photos",
                        dir: layout::category_dir(UploadCategory::Photos, location),
                        extensions: IMAGE_EXTENSIONS,
                        recursive: false,
                    },
                    InputRequirement {
                        label: "manufacturer file",
                        dir: layout::category_dir(UploadCategory::ManufacturerSheet, location),
                        extensions: SHEET_EXTENSIONS,
                        recursive: false,
                    },
                ],
                pass_output_dir: true,
                result_file: layout::output_file(EQUIPMENT_RESULT),
                download_name: format!("equipment_report_{location}.csv"),
                sentinels: &[
                    Sentinel {
                        needle: "No image files found",
                        message: "No valid image files found",
                    },
                    Sentinel {
                        needle: "No manufacturer file found",
                        message: "Manufacturer file processing failed",
                    },
                ],
            },
            Self::HazardAnalysis => Pipeline {
                kind: self,
                inputs: vec![InputRequirement {
                    label: "JHA documents",
                    dir: layout::hazard_location_dir(location),
                    extensions: HAZARD_EXTENSIONS,
                    recursive: true,
                }],
                pass_output_dir: false,
                result_file: layout::output_file(HAZARD_RESULT),
                download_name: "jha_processed.xlsx".to_string(),
                sentinels: &[],
            },
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Equipment => "equipment",
            Self::HazardAnalysis => "hazard-analysis",
        })
    }
}

/// A directory that must hold at least one file with an accepted extension.
#[derive(Debug, Clone)]
pub struct InputRequirement {
    pub label: &'static str,
    /// Relative to the staging store root.
    pub dir: PathBuf,
    pub extensions: &'static [&'static str],
    /// Look in subdirectories too.
    pub recursive: bool,
}

/// Substring the analyzer prints on stdout when it found nothing to do.
#[derive(Debug, Clone, Copy)]
pub struct Sentinel {
    pub needle: &'static str,
    /// Reported to the caller instead of a success.
    pub message: &'static str,
}

/// Everything the job runner needs to know about one pipeline.
#[derive(Debug, Clone)]
pub struct Pipeline {
    pub kind: PipelineKind,
    pub inputs: Vec<InputRequirement>,
    /// Whether the analyzer takes `--output <dir>`.
    pub pass_output_dir: bool,
    /// Fixed result path, relative to the staging store root.
    pub result_file: PathBuf,
    /// Name the result is delivered under.
    pub download_name: String,
    pub sentinels: &'static [Sentinel],
}

impl Pipeline {
    /// Flags appended after the configured analyzer command.
    pub fn analyzer_args(
        &self,
        location: &Location,
        uploads_root: &Path,
        output_root: &Path,
    ) -> Vec<String> {
        let mut args = vec!["--location".to_string(), location.to_string()];
        if self.pass_output_dir {
            args.push("--output".into());
            args.push(output_root.to_string_lossy().into_owned());
        }
        args.push("--uploads_root".into());
        args.push(uploads_root.to_string_lossy().into_owned());
        args
    }

    /// First sentinel found in the analyzer's stdout.
    pub fn match_sentinel(&self, stdout: &str) -> Option<&'static Sentinel> {
        self.sentinels.iter().find(|s| stdout.contains(s.needle))
    }
}
