use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Json,
    Yaml,
}

impl DocumentFormat {
    fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Some(Self::Json),
            Some("yaml" | "yml") => Some(Self::Yaml),
            _ => None,
        }
    }
}

/// Read a JSON or YAML input file and deserialise into a typed struct.
pub fn read_input<T: DeserializeOwned>(path: &str) -> Result<T, Box<dyn std::error::Error>> {
    let canonical = resolve_path(path)?;
    let contents = fs::read_to_string(&canonical)
        .map_err(|e| format!("Failed to read '{}': {}", canonical.display(), e))?;
    let value = parse_document(&contents, DocumentFormat::from_path(&canonical))
        .map_err(|e| format!("Failed to parse '{}': {}", canonical.display(), e))?;
    let typed: T = serde_json::from_value(value)
        .map_err(|e| format!("Invalid input in '{}': {}", canonical.display(), e))?;
    Ok(typed)
}

/// Parse a document as JSON or YAML. Without a known format, JSON is tried
/// first since every JSON document is also YAML but errors read better.
pub fn parse_document(
    contents: &str,
    format: Option<DocumentFormat>,
) -> Result<Value, Box<dyn std::error::Error>> {
    let trimmed = contents.trim();
    match format {
        Some(DocumentFormat::Json) => Ok(serde_json::from_str(trimmed)?),
        Some(DocumentFormat::Yaml) => Ok(serde_yaml::from_str(trimmed)?),
        None => match serde_json::from_str(trimmed) {
            Ok(v) => Ok(v),
            Err(json_err) => serde_yaml::from_str(trimmed).map_err(
                |_| -> Box<dyn std::error::Error> {
                    format!("not valid JSON ({json_err}) or YAML").into()
                },
            ),
        },
    }
}

/// Resolve the path against the working directory and check it is a file.
fn resolve_path(path: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
    let p = Path::new(path);
    let canonical = if p.is_absolute() {
        p.to_path_buf()
    } else {
        std::env::current_dir()?.join(p)
    };

    if !canonical.exists() {
        return Err(format!("File not found: {}", canonical.display()).into());
    }

    if !canonical.is_file() {
        return Err(format!("Not a file: {}", canonical.display()).into());
    }

    Ok(canonical)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_and_json_parse_alike() {
        let json = parse_document(r#"{ "principal": "1000", "tenor_periods": 12 }"#, None).unwrap();
        let yaml = parse_document("principal: \"1000\"\ntenor_periods: 12\n", None).unwrap();
        assert_eq!(json, yaml);
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(DocumentFormat::from_path(Path::new("a.yml")), Some(DocumentFormat::Yaml));
        assert_eq!(DocumentFormat::from_path(Path::new("a.json")), Some(DocumentFormat::Json));
        assert_eq!(DocumentFormat::from_path(Path::new("a.txt")), None);
    }

    #[test]
    fn test_missing_file() {
        assert!(read_input::<Value>("definitely/not/here.json").is_err());
    }
}
