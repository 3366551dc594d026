//! Mod descriptors: `descriptor.mod` text files and `.metadata/metadata.json`.

use crate::error::DescriptorError;
use crate::game::ModDescriptorType;
use crate::scanner::{
    clean_whitespace, get_key, quoted_values, strip_comment, CommentStyle, BLOCK_SEPARATOR,
    CLOSE_OBJECT, VARIABLE_SEPARATOR,
};
use serde::{Deserialize, Serialize};

pub const DESCRIPTOR_FILE: &str = "descriptor.mod";
pub const METADATA_DIR: &str = ".metadata";
pub const METADATA_FILE: &str = "metadata.json";

/// Mod metadata shared by every descriptor format.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModDescriptor {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub supported_version: Option<String>,
    /// Install path, only present in outer `.mod` files.
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub remote_file_id: Option<String>,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Names of mods this one overrides.
    #[serde(default)]
    pub dependencies: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonRelationship {
    id: String,
    #[serde(default)]
    rel_type: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct JsonMetadata {
    name: String,
    #[serde(default)]
    id: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    supported_game_version: String,
    #[serde(default)]
    short_description: String,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    relationships: Vec<JsonRelationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    game_custom_data: Option<serde_json::Value>,
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('"', "\\\""))
}

impl ModDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Parse a `descriptor.mod` / `<name>.mod` file. Unknown keys are ignored.
    pub fn parse_descriptor_mod(text: &str) -> Self {
        let mut descriptor = ModDescriptor::default();
        let mut list: Option<(String, Vec<String>)> = None;

        for raw in text.lines() {
            let line = clean_whitespace(strip_comment(raw, CommentStyle::Hash));
            if line.is_empty() {
                continue;
            }
            if let Some((key, mut values)) = list.take() {
                let (inner, closed) = match line.split_once(CLOSE_OBJECT) {
                    Some((inner, _)) => (inner, true),
                    None => (line.as_str(), false),
                };
                values.extend(quoted_values(inner));
                if closed {
                    descriptor.set_list(&key, values);
                } else {
                    list = Some((key, values));
                }
                continue;
            }

            let key = get_key(&line, VARIABLE_SEPARATOR).to_ascii_lowercase();
            if let Some((_, rest)) = line.split_once(BLOCK_SEPARATOR) {
                let (inner, closed) = match rest.split_once(CLOSE_OBJECT) {
                    Some((inner, _)) => (inner, true),
                    None => (rest, false),
                };
                let values = quoted_values(inner);
                if closed {
                    descriptor.set_list(&key, values);
                } else {
                    list = Some((key, values));
                }
                continue;
            }
            let Some((_, value)) = line.split_once(VARIABLE_SEPARATOR) else {
                continue;
            };
            let value = quoted_values(value)
                .into_iter()
                .next()
                .unwrap_or_else(|| value.trim().to_string());
            match key.as_str() {
                "name" => descriptor.name = value,
                "version" => descriptor.version = Some(value),
                "supported_version" => descriptor.supported_version = Some(value),
                "path" | "archive" => descriptor.path = Some(value),
                "remote_file_id" => descriptor.remote_file_id = Some(value),
                "picture" => descriptor.picture = Some(value),
                _ => {}
            }
        }
        if let Some((key, values)) = list {
            descriptor.set_list(&key, values);
        }
        descriptor
    }

    fn set_list(&mut self, key: &str, values: Vec<String>) {
        match key {
            "tags" => self.tags = values,
            "dependencies" => self.dependencies = values,
            _ => {}
        }
    }

    /// Render in `descriptor.mod` syntax.
    pub fn to_descriptor_mod(&self) -> String {
        let mut out = Vec::new();
        let scalar = |out: &mut Vec<String>, key: &str, value: &Option<String>| {
            if let Some(value) = value {
                out.push(format!("{key}={}", quote(value)));
            }
        };
        out.push(format!("name={}", quote(&self.name)));
        scalar(&mut out, "version", &self.version);
        scalar(&mut out, "supported_version", &self.supported_version);
        scalar(&mut out, "path", &self.path);
        scalar(&mut out, "remote_file_id", &self.remote_file_id);
        scalar(&mut out, "picture", &self.picture);
        for (key, values) in [("tags", &self.tags), ("dependencies", &self.dependencies)] {
            if values.is_empty() {
                continue;
            }
            out.push(format!("{key}={{"));
            out.extend(values.iter().map(|v| format!("\t{}", quote(v))));
            out.push("}".to_string());
        }
        out.push(String::new());
        out.join("\n")
    }

    /// Parse `.metadata/metadata.json`.
    pub fn parse_json_metadata(text: &str) -> Result<Self, DescriptorError> {
        let metadata: JsonMetadata = serde_json::from_str(text)?;
        if metadata.name.trim().is_empty() {
            return Err(DescriptorError::MissingName);
        }
        let non_empty = |v: String| (!v.is_empty()).then_some(v);
        Ok(Self {
            name: metadata.name,
            version: non_empty(metadata.version),
            supported_version: non_empty(metadata.supported_game_version),
            path: None,
            remote_file_id: non_empty(metadata.id),
            picture: None,
            tags: metadata.tags,
            dependencies: metadata
                .relationships
                .into_iter()
                .filter(|r| r.rel_type.is_empty() || r.rel_type == "dependency")
                .map(|r| r.id)
                .collect(),
        })
    }

    /// Render `.metadata/metadata.json`; the v2 format adds `game_custom_data`.
    pub fn to_json_metadata(&self, descriptor_type: ModDescriptorType) -> Result<String, DescriptorError> {
        let metadata = JsonMetadata {
            name: self.name.clone(),
            id: self.remote_file_id.clone().unwrap_or_default(),
            version: self.version.clone().unwrap_or_default(),
            supported_game_version: self.supported_version.clone().unwrap_or_default(),
            short_description: String::new(),
            tags: self.tags.clone(),
            relationships: self
                .dependencies
                .iter()
                .map(|id| JsonRelationship {
                    id: id.clone(),
                    rel_type: "dependency".to_string(),
                })
                .collect(),
            game_custom_data: (descriptor_type == ModDescriptorType::JsonMetadataV2)
                .then(|| serde_json::json!({ "multiplayer_synchronized": true })),
        };
        Ok(serde_json::to_string_pretty(&metadata)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_descriptor_mod() {
        let text = "name=\"My Mod\"\nversion=\"1.0\"\ntags={\n\t\"Gameplay\"\n\t\"Balance\"\n}\n\
                    dependencies={ \"Base Mod\" \"Other\" }\nsupported_version=\"3.*\"\n# note\n";
        let descriptor = ModDescriptor::parse_descriptor_mod(text);
        assert_eq!(descriptor.name, "My Mod");
        assert_eq!(descriptor.version.as_deref(), Some("1.0"));
        assert_eq!(descriptor.tags, vec!["Gameplay", "Balance"]);
        assert_eq!(descriptor.dependencies, vec!["Base Mod", "Other"]);
        assert_eq!(descriptor.supported_version.as_deref(), Some("3.*"));
    }

    #[test]
    fn test_descriptor_mod_round_trip() {
        let mut descriptor = ModDescriptor::new("Patch");
        descriptor.path = Some("mod/patch".to_string());
        descriptor.tags = vec!["Fixes".to_string()];
        descriptor.dependencies = vec!["A".to_string(), "B".to_string()];
        let text = descriptor.to_descriptor_mod();
        assert_eq!(ModDescriptor::parse_descriptor_mod(&text), descriptor);
    }

    #[test]
    fn test_json_metadata() {
        let mut descriptor = ModDescriptor::new("Patch");
        descriptor.dependencies = vec!["A".to_string()];
        let v1 = descriptor.to_json_metadata(ModDescriptorType::JsonMetadata).unwrap();
        assert!(!v1.contains("game_custom_data"));
        let v2 = descriptor.to_json_metadata(ModDescriptorType::JsonMetadataV2).unwrap();
        assert!(v2.contains("game_custom_data"));
        assert_eq!(ModDescriptor::parse_json_metadata(&v2).unwrap(), descriptor);
    }

    #[test]
    fn test_json_metadata_requires_name() {
        let err = ModDescriptor::parse_json_metadata("{\"name\": \"\"}").unwrap_err();
        assert!(matches!(err, DescriptorError::MissingName));
    }
}
