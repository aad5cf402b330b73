// In-memory model of ~/.aws/config
use crate::error::{Result, SyncError};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Resolve the AWS config file path (`AWS_CONFIG_FILE` is handled by the CLI layer)
pub fn default_config_path() -> Result<PathBuf> {
    if let Some(home) = dirs::home_dir() {
        Ok(home.join(".aws").join("config"))
    } else {
        Err(SyncError::Config(
            "Could not determine home directory".to_string(),
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// `raw` holds the line as read; it is dropped once the value changes
    Entry {
        key: String,
        value: String,
        raw: Option<String>,
    },
    /// Comments, blank lines and nested sub-settings, kept verbatim
    Raw(String),
}

impl Line {
    fn is_indented_content(&self) -> bool {
        match self {
            Line::Raw(raw) => raw.starts_with(char::is_whitespace) && !raw.trim().is_empty(),
            Line::Entry { .. } => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    header: Option<String>,
    lines: Vec<Line>,
}

impl Section {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            header: None,
            lines: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lines.iter().find_map(|line| match line {
            Line::Entry { key: k, value, .. } if k == key => Some(value.as_str()),
            _ => None,
        })
    }

    /// Update the key in place, or append it after the last existing entry
    /// and any sub-settings indented beneath it
    pub fn set(&mut self, key: &str, value: &str) {
        for line in self.lines.iter_mut() {
            if let Line::Entry {
                key: k,
                value: v,
                raw,
            } = line
            {
                if k == key {
                    if v.as_str() != value {
                        *v = value.to_string();
                        *raw = None;
                    }
                    return;
                }
            }
        }

        let mut position = self
            .lines
            .iter()
            .rposition(|line| matches!(line, Line::Entry { .. }))
            .map(|idx| idx + 1)
            .unwrap_or(0);
        while self
            .lines
            .get(position)
            .is_some_and(Line::is_indented_content)
        {
            position += 1;
        }

        self.lines.insert(
            position,
            Line::Entry {
                key: key.to_string(),
                value: value.to_string(),
                raw: None,
            },
        );
    }

    // `s3 =` followed by indented sub-settings
    fn opens_nested_block(&self) -> bool {
        self.lines
            .iter()
            .rev()
            .find_map(|line| match line {
                Line::Entry { value, .. } => Some(value.is_empty()),
                Line::Raw(_) => None,
            })
            .unwrap_or(false)
    }

    fn ends_with_blank_line(&self) -> bool {
        matches!(self.lines.last(), Some(Line::Raw(raw)) if raw.trim().is_empty())
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.lines.iter().filter_map(|line| match line {
            Line::Entry { key, .. } => Some(key.as_str()),
            Line::Raw(_) => None,
        })
    }
}

// `[name]`, optionally followed by a comment
fn section_name(trimmed: &str) -> Option<&str> {
    let rest = trimmed.strip_prefix('[')?;
    let end = rest.find(']')?;
    let name = rest[..end].trim();
    (!name.is_empty()).then_some(name)
}

/// An INI-style document that round-trips comments and unrelated sections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigDocument {
    preamble: Vec<String>,
    sections: Vec<Section>,
}

impl ConfigDocument {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SyncError::file_io("read", path, e))?;
        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let mut doc = ConfigDocument::default();

        for line in content.lines() {
            let trimmed = line.trim();

            if let Some(name) = section_name(trimmed) {
                let mut section = Section::new(name);
                section.header = Some(line.to_string());
                doc.sections.push(section);
                continue;
            }

            let Some(section) = doc.sections.last_mut() else {
                doc.preamble.push(line.to_string());
                continue;
            };

            let is_comment = trimmed.starts_with('#') || trimmed.starts_with(';');
            let is_nested = line.starts_with(char::is_whitespace) && section.opens_nested_block();
            match trimmed.find(['=', ':']) {
                Some(pos) if !is_comment && !is_nested => {
                    section.lines.push(Line::Entry {
                        key: trimmed[..pos].trim().to_string(),
                        value: trimmed[pos + 1..].trim().to_string(),
                        raw: Some(line.to_string()),
                    });
                }
                _ => section.lines.push(Line::Raw(line.to_string())),
            }
        }

        doc
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        fs::write(path, self.to_string()).map_err(|e| SyncError::file_io("write", path, e))
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Existing section with this name, or a new one appended at the end
    pub fn section_mut_or_insert(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| s.name == name) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    /// Drop every section for which `keep` returns false
    pub fn retain_sections<F>(&mut self, keep: F)
    where
        F: FnMut(&Section) -> bool,
    {
        self.sections.retain(keep);
    }
}

impl fmt::Display for ConfigDocument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut result = String::new();

        for line in &self.preamble {
            result.push_str(line);
            result.push('\n');
        }

        let mut previous_blank = true;
        for section in &self.sections {
            // Sections are separated by exactly one blank line
            if !previous_blank {
                result.push('\n');
            }
            match &section.header {
                Some(header) => result.push_str(header),
                None => result.push_str(&format!("[{}]", section.name)),
            }
            result.push('\n');
            for line in &section.lines {
                match line {
                    Line::Entry { raw: Some(raw), .. } | Line::Raw(raw) => result.push_str(raw),
                    Line::Entry { key, value, .. } if value.is_empty() => {
                        result.push_str(&format!("{} =", key))
                    }
                    Line::Entry { key, value, .. } => {
                        result.push_str(&format!("{} = {}", key, value))
                    }
                }
                result.push('\n');
            }
            previous_blank = section.ends_with_blank_line();
        }

        f.write_str(&trim_trailing_blank_lines(&result))
    }
}

/// Blank lines left at the end of the file once its last section is removed
fn trim_trailing_blank_lines(content: &str) -> String {
    let mut lines: Vec<&str> = content.lines().collect();
    while lines.last().is_some_and(|line| line.trim().is_empty()) {
        lines.pop();
    }
    lines.iter().map(|line| format!("{}\n", line)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# managed by hand
[default]
region = us-east-1
output = json

[profile dev]
# dev account
sso_start_url = https://acme.awsapps.com/start
s3 =
  max_concurrent_requests = 10

[sso-session acme]
sso_region=eu-west-1
";

    #[test]
    fn test_parse_sections_and_keys() {
        let doc = ConfigDocument::parse(SAMPLE);
        let names: Vec<&str> = doc.sections().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["default", "profile dev", "sso-session acme"]);

        let default = doc.section("default").unwrap();
        assert_eq!(default.get("region"), Some("us-east-1"));
        assert_eq!(default.get("output"), Some("json"));

        let session = doc.section("sso-session acme").unwrap();
        assert_eq!(session.get("sso_region"), Some("eu-west-1"));
    }

    #[test]
    fn test_nested_settings_are_not_top_level_keys() {
        let doc = ConfigDocument::parse(SAMPLE);
        let dev = doc.section("profile dev").unwrap();
        assert_eq!(dev.get("s3"), Some(""));
        assert_eq!(dev.get("max_concurrent_requests"), None);
    }

    #[test]
    fn test_indented_keys_outside_nested_block_are_entries() {
        let doc = ConfigDocument::parse("[a]\n  region = us-west-2\n");
        assert_eq!(doc.section("a").unwrap().get("region"), Some("us-west-2"));
    }

    #[test]
    fn test_round_trip_preserves_content() {
        let doc = ConfigDocument::parse(SAMPLE);
        let rendered = doc.to_string();
        assert!(rendered.starts_with("# managed by hand\n[default]\n"));
        assert!(rendered.contains("# dev account\n"));
        assert!(rendered.contains("  max_concurrent_requests = 10\n"));
        assert_eq!(rendered, SAMPLE);
        assert_eq!(ConfigDocument::parse(&rendered), doc);
    }

    #[test]
    fn test_set_updates_in_place() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        doc.section_mut_or_insert("default").set("region", "ap-south-1");

        let keys: Vec<&str> = doc.section("default").unwrap().keys().collect();
        assert_eq!(keys, vec!["region", "output"]);
        assert_eq!(
            doc.section("default").unwrap().get("region"),
            Some("ap-south-1")
        );
    }

    #[test]
    fn test_set_appends_after_last_entry() {
        let mut doc = ConfigDocument::parse("[a]\nx = 1\n# trailing\n");
        doc.section_mut_or_insert("a").set("y", "2");
        assert_eq!(doc.to_string(), "[a]\nx = 1\ny = 2\n# trailing\n");
    }

    #[test]
    fn test_new_sections_are_appended_with_blank_line() {
        let mut doc = ConfigDocument::parse("[default]\nregion = us-east-1\n");
        let section = doc.section_mut_or_insert("mock-mockaccount");
        section.set("sso_start_url", "https://mock-sso.awsapps.com/start");

        assert_eq!(
            doc.to_string(),
            "[default]\nregion = us-east-1\n\n[mock-mockaccount]\nsso_start_url = https://mock-sso.awsapps.com/start\n"
        );
    }

    #[test]
    fn test_retain_sections_removes_block() {
        let mut doc = ConfigDocument::parse(SAMPLE);
        doc.retain_sections(|s| s.name() != "profile dev");

        assert!(!doc.has_section("profile dev"));
        let rendered = doc.to_string();
        assert!(!rendered.contains("dev account"));
        assert!(rendered.contains("[default]\nregion = us-east-1\noutput = json\n\n[sso-session acme]"));
    }

    #[test]
    fn test_empty_document_renders_empty() {
        let doc = ConfigDocument::parse("");
        assert!(doc.sections().is_empty());
        assert_eq!(doc.to_string(), "");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let err = ConfigDocument::load(&dir.path().join("config")).unwrap_err();
        assert!(matches!(err, SyncError::Io { action: "read", .. }));
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config");
        let doc = ConfigDocument::parse(SAMPLE);
        doc.save(&path).unwrap();

        let loaded = ConfigDocument::load(&path).unwrap();
        assert_eq!(loaded, doc);
    }

    #[test]
    fn test_set_keeps_nested_block_intact() {
        let mut doc = ConfigDocument::parse(
            "[mock-mockaccount]\noutput = json\ns3 =\n  max_concurrent_requests = 10\n",
        );
        doc.section_mut_or_insert("mock-mockaccount")
            .set("region", "us-east-1");

        let rendered = doc.to_string();
        assert_eq!(
            rendered,
            "[mock-mockaccount]\noutput = json\ns3 =\n  max_concurrent_requests = 10\nregion = us-east-1\n"
        );
        let reparsed = ConfigDocument::parse(&rendered);
        let section = reparsed.section("mock-mockaccount").unwrap();
        assert_eq!(section.get("max_concurrent_requests"), None);
        assert_eq!(section.get("region"), Some("us-east-1"));
    }

    #[test]
    fn test_header_with_trailing_comment() {
        let content =
            "[default]\nregion = eu-west-1\n\n[mock-mockaccount] # generated\nsso_account_id = 1\n";
        let mut doc = ConfigDocument::parse(content);

        assert!(doc.has_section("mock-mockaccount"));
        assert_eq!(doc.section("default").unwrap().get("sso_account_id"), None);
        assert_eq!(
            doc.section("mock-mockaccount").unwrap().get("sso_account_id"),
            Some("1")
        );

        doc.section_mut_or_insert("mock-mockaccount")
            .set("sso_account_id", "2");
        assert_eq!(doc.sections().len(), 2);
        assert!(doc.to_string().contains("[mock-mockaccount] # generated\n"));
    }

    #[test]
    fn test_colon_delimited_keys() {
        let mut doc = ConfigDocument::parse("[a]\nregion: us-west-2\n");
        assert_eq!(doc.section("a").unwrap().get("region"), Some("us-west-2"));

        doc.section_mut_or_insert("a").set("region", "eu-west-1");
        assert_eq!(doc.to_string(), "[a]\nregion = eu-west-1\n");
    }

    #[test]
    fn test_untouched_lines_are_written_verbatim() {
        let content = "\n\n[a]\nx=1\n\n\n\n[b]\ny  =  2\n";
        let mut doc = ConfigDocument::parse(content);
        assert_eq!(doc.to_string(), content);

        doc.section_mut_or_insert("b").set("y", "2");
        assert_eq!(doc.to_string(), content);
    }

    #[test]
    fn test_removing_last_section_drops_trailing_blank_lines() {
        let mut doc = ConfigDocument::parse("[a]\nx = 1\n\n[b]\ny = 2\n");
        doc.retain_sections(|s| s.name() != "b");
        assert_eq!(doc.to_string(), "[a]\nx = 1\n");
    }
}
