//! Resource output
//!
//! Two sinks: one JSON file per resource in a directory, or a stream of JSON
//! documents on any writer (NDJSON when compact).

use crate::domain::context::ResultExt;
use crate::domain::ids::ResourceId;
use crate::domain::resource::Resource;
use crate::domain::Result;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Serializes one resource
pub fn to_json(resource: &Resource, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(resource)?
    } else {
        serde_json::to_string(resource)?
    };
    Ok(json)
}

/// `NN_<ResourceType>.json`, with `index` 1-based
pub fn resource_file_name(index: usize, resource: &Resource) -> String {
    format!("{index:02}_{}.json", resource.kind())
}

/// Directory name for one message of a batch: `NNNN_<control id>`
///
/// The control id is sanitised for use in a path; without one the name is
/// just the position.
pub fn message_dir_name(position: usize, control_id: Option<&str>) -> String {
    match control_id.and_then(ResourceId::sanitized) {
        Some(id) => format!("{position:04}_{id}"),
        None => format!("{position:04}"),
    }
}

/// Writes every resource to its own file in `dir`, creating `dir` if needed
///
/// Returns the written paths in resource order.
pub fn write_resources_to_dir(
    resources: &[Resource],
    dir: &Path,
    pretty: bool,
) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Cannot create output directory: {}", dir.display()))?;

    let mut written = Vec::with_capacity(resources.len());
    for (i, resource) in resources.iter().enumerate() {
        let path = dir.join(resource_file_name(i + 1, resource));
        let mut json = to_json(resource, pretty)?;
        json.push('\n');
        std::fs::write(&path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        tracing::info!(path = %path.display(), "Wrote resource");
        written.push(path);
    }
    Ok(written)
}

/// Streams resources to `writer`
///
/// Compact output is NDJSON, one resource per line. Pretty output separates
/// documents with a blank line.
pub fn write_resources<W: Write>(writer: &mut W, resources: &[Resource], pretty: bool) -> Result<()> {
    for (i, resource) in resources.iter().enumerate() {
        if pretty && i > 0 {
            writeln!(writer)?;
        }
        writeln!(writer, "{}", to_json(resource, pretty)?)?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::transform::Converter;
    use tempfile::TempDir;

    fn resources() -> Vec<Resource> {
        Converter::standard()
            .unwrap()
            .convert(
                "MSH|^~\\&|EPIC|HOSP|LIS|LAB|202501011230||ADT^A01|MSG001|P|2.5\r\
                 PID|1||12345^^^HOSP^MR||Doe^John||19700101|M\r\
                 PV1|1|I",
            )
            .unwrap()
    }

    #[test]
    fn test_file_names() {
        let resources = resources();
        assert_eq!(resource_file_name(1, &resources[0]), "01_Patient.json");
        assert_eq!(resource_file_name(12, &resources[1]), "12_Encounter.json");
    }

    #[test]
    fn test_message_dir_name() {
        assert_eq!(message_dir_name(3, Some("MSG001")), "0003_MSG001");
        assert_eq!(message_dir_name(3, Some("A/B C")), "0003_A-B-C");
        assert_eq!(message_dir_name(42, None), "0042");
        assert_eq!(message_dir_name(42, Some("///")), "0042");
    }

    #[test]
    fn test_write_resources_to_dir() {
        let temp = TempDir::new().unwrap();
        let out = temp.path().join("nested").join("out");

        let written = write_resources_to_dir(&resources(), &out, false).unwrap();
        assert_eq!(written.len(), 2);
        assert!(out.join("01_Patient.json").exists());
        assert!(out.join("02_Encounter.json").exists());

        let patient: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&written[0]).unwrap()).unwrap();
        assert_eq!(patient["resourceType"], "Patient");
        assert_eq!(patient["id"], "12345");
    }

    #[test]
    fn test_ndjson_one_resource_per_line() {
        let mut buf = Vec::new();
        write_resources(&mut buf, &resources(), false).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value["resourceType"].is_string());
        }
    }

    #[test]
    fn test_pretty_output_separated_by_blank_line() {
        let mut buf = Vec::new();
        write_resources(&mut buf, &resources(), true).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("}\n\n{"));
        assert!(text.contains("\n  \"resourceType\""));
    }
}
