//! Conversion requests and output-path naming.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Suffix appended to the input's base name when naming the output file.
pub const CONVERTED_SUFFIX: &str = "_converted";

/// Where the converted file goes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Destination {
    /// `<dir>/<input stem>_converted.<ext>`
    Directory(PathBuf),
    /// Exactly this path, extension untouched.
    File(PathBuf),
}

impl Destination {
    /// Resolve the final output path for `input` converted to `extension`.
    pub fn output_path(&self, input: &Path, extension: &str) -> PathBuf {
        match self {
            Destination::Directory(dir) => dir.join(converted_file_name(input, extension)),
            Destination::File(path) => path.clone(),
        }
    }
}

/// `report.txt` + `html` → `report_converted.html`.
pub fn converted_file_name(input: &Path, extension: &str) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    format!("{stem}{CONVERTED_SUFFIX}.{extension}")
}

/// One user action: convert `input` to `target` and put it at `destination`.
///
/// `target` is an extension such as `".png"` or `"docx"`; it is parsed in
/// the domain of the input file when the request is executed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversionRequest {
    pub input: PathBuf,
    pub target: String,
    pub destination: Destination,
}

impl ConversionRequest {
    /// Convert into `output_dir` using the default `_converted` naming.
    pub fn new(
        input: impl Into<PathBuf>,
        target: impl Into<String>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
            destination: Destination::Directory(output_dir.into()),
        }
    }

    /// Convert to an explicit output path ("save as").
    pub fn to_file(
        input: impl Into<PathBuf>,
        target: impl Into<String>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            input: input.into(),
            target: target.into(),
            destination: Destination::File(output.into()),
        }
    }

    /// Convert next to the input file.
    pub fn beside_input(input: impl Into<PathBuf>, target: impl Into<String>) -> Self {
        let input = input.into();
        let dir = input
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Self::new(input, target, dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_destination_uses_converted_suffix() {
        let dest = Destination::Directory(PathBuf::from("/tmp/out"));
        assert_eq!(
            dest.output_path(Path::new("/home/me/report.txt"), "html"),
            PathBuf::from("/tmp/out/report_converted.html")
        );
    }

    #[test]
    fn only_last_extension_is_replaced() {
        assert_eq!(
            converted_file_name(Path::new("archive.tar.gz"), "txt"),
            "archive.tar_converted.txt"
        );
    }

    #[test]
    fn file_destination_is_used_verbatim() {
        let dest = Destination::File(PathBuf::from("/tmp/custom-name.docx"));
        assert_eq!(
            dest.output_path(Path::new("notes.txt"), "docx"),
            PathBuf::from("/tmp/custom-name.docx")
        );
    }

    #[test]
    fn beside_input_uses_parent_dir() {
        let req = ConversionRequest::beside_input("docs/a.rtf", "txt");
        assert_eq!(req.destination, Destination::Directory(PathBuf::from("docs")));

        let req = ConversionRequest::beside_input("a.rtf", "txt");
        assert_eq!(req.destination, Destination::Directory(PathBuf::from("")));
    }
}
