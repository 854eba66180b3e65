// Content block catalog: the predefined snippets offered for drag or insert

pub const DEFAULT_SAMPLE_TEXT: &str = "ALKI Corp MD Viewer";

/// A predefined snippet. Carries no position; only `insert_text` reaches the buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentBlock {
    pub label: String,
    pub description: String,
    pub preview_text: String,
    pub insert_text: String,
}

impl ContentBlock {
    fn new(label: &str, description: &str, preview_text: String, insert_text: String) -> Self {
        ContentBlock {
            label: label.to_string(),
            description: description.to_string(),
            preview_text,
            insert_text,
        }
    }

    /// Label in kebab case, e.g. `section-title`
    pub fn slug(&self) -> String {
        self.label.to_ascii_lowercase().replace(' ', "-")
    }
}

#[derive(Debug, Clone)]
pub struct BlockCatalog {
    blocks: Vec<ContentBlock>,
}

impl BlockCatalog {
    /// The standard block set with `sample` as the example text
    pub fn standard(sample: &str) -> Self {
        let blocks = vec![
            ContentBlock::new(
                "Big Title",
                "Main document title. Use once at the top.",
                format!("# {sample}"),
                format!("# {sample}\n\n"),
            ),
            ContentBlock::new(
                "Section Title",
                "Heading for a new section.",
                format!("## {sample}"),
                format!("## {sample}\n\n"),
            ),
            ContentBlock::new(
                "Text",
                "Standard body paragraph.",
                sample.to_string(),
                format!("{sample}\n\n"),
            ),
            ContentBlock::new(
                "Code Block",
                "Fenced code block for code snippets.",
                format!("```javascript\n{sample}\n```"),
                format!("```javascript\n{sample}\n```\n\n"),
            ),
            ContentBlock::new(
                "Bullet List",
                "Simple bulleted list.",
                format!("- {sample}\n- {sample}"),
                format!("- {sample}\n- {sample}\n\n"),
            ),
            ContentBlock::new(
                "Divider",
                "Horizontal divider line. Use to separate sections.",
                "---".to_string(),
                "---\n\n".to_string(),
            ),
        ];
        BlockCatalog { blocks }
    }

    pub fn blocks(&self) -> &[ContentBlock] {
        &self.blocks
    }

    /// Find a block by label, case-insensitively; kebab-case labels match too
    pub fn find(&self, name: &str) -> Option<&ContentBlock> {
        let name = name.trim();
        self.blocks
            .iter()
            .find(|block| block.label.eq_ignore_ascii_case(name) || block.slug().eq_ignore_ascii_case(name))
    }
}

impl Default for BlockCatalog {
    fn default() -> Self {
        Self::standard(DEFAULT_SAMPLE_TEXT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_blocks() {
        let catalog = BlockCatalog::standard("Demo");
        let labels: Vec<&str> = catalog.blocks().iter().map(|b| b.label.as_str()).collect();
        assert_eq!(
            labels,
            ["Big Title", "Section Title", "Text", "Code Block", "Bullet List", "Divider"]
        );
        assert_eq!(catalog.blocks()[0].insert_text, "# Demo\n\n");
        assert_eq!(catalog.blocks()[3].insert_text, "```javascript\nDemo\n```\n\n");
        assert_eq!(catalog.blocks()[4].preview_text, "- Demo\n- Demo");
    }

    #[test]
    fn test_find_block() {
        let catalog = BlockCatalog::default();
        assert_eq!(catalog.find("divider").unwrap().insert_text, "---\n\n");
        assert_eq!(catalog.find("SECTION TITLE").unwrap().label, "Section Title");
        assert_eq!(catalog.find("code-block").unwrap().label, "Code Block");
        assert!(catalog.find("table").is_none());
    }

    #[test]
    fn test_default_sample_text() {
        let catalog = BlockCatalog::default();
        assert_eq!(
            catalog.find("big-title").unwrap().insert_text,
            "# ALKI Corp MD Viewer\n\n"
        );
    }
}
