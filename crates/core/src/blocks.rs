use serde::{Deserialize, Serialize};

/// Content of the heading that opens every converted summary.
pub const SUMMARY_HEADING: &str = "Summary";

const MAX_ORDINAL: u32 = 20;
const BULLET: char = '•';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Heading,
    Paragraph,
    NumberedItem,
    BulletedItem,
}

/// One typed unit of page content.
///
/// `parent` is the index, within the same sequence, of the numbered item a
/// sub-item was written under. The document store only sees a flat list, so
/// it is informational for renderers that want to rebuild nesting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<usize>,
}

impl Block {
    pub fn new(kind: BlockKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
            parent: None,
        }
    }

    pub fn heading(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Heading, text)
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Self::new(BlockKind::Paragraph, text)
    }

    pub fn numbered(text: impl Into<String>) -> Self {
        Self::new(BlockKind::NumberedItem, text)
    }

    pub fn bulleted(text: impl Into<String>) -> Self {
        Self::new(BlockKind::BulletedItem, text)
    }

    pub fn with_parent(mut self, parent: usize) -> Self {
        self.parent = Some(parent);
        self
    }
}

/// Line classification before sub-item inference.
#[derive(Debug, PartialEq, Eq)]
enum Line<'a> {
    Numbered(&'a str),
    Lettered(&'a str),
    Bullet(&'a str),
    Plain(&'a str),
}

impl<'a> Line<'a> {
    /// First matching rule wins. The numbered check has to run before the
    /// bullet check so that `1. • x` stays a numbered item.
    fn classify(line: &'a str) -> Option<Self> {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return None;
        }

        let line = if let Some(rest) = strip_ordinal(trimmed) {
            Line::Numbered(rest.trim())
        } else if let Some(rest) = strip_letter(trimmed) {
            Line::Lettered(rest.trim())
        } else if let Some((_, rest)) = line.rsplit_once(BULLET) {
            Line::Bullet(rest.trim())
        } else {
            Line::Plain(trimmed)
        };
        Some(line)
    }

    fn kind(&self) -> BlockKind {
        match self {
            Line::Numbered(_) => BlockKind::NumberedItem,
            Line::Lettered(_) | Line::Bullet(_) => BlockKind::BulletedItem,
            Line::Plain(_) => BlockKind::Paragraph,
        }
    }

    fn text(&self) -> &'a str {
        match *self {
            Line::Numbered(t) | Line::Lettered(t) | Line::Bullet(t) | Line::Plain(t) => t,
        }
    }
}

/// `"<n>."` with `n` in 1..=20 and no leading zero.
fn strip_ordinal(line: &str) -> Option<&str> {
    let digits = line.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || line.starts_with('0') {
        return None;
    }
    let n: u32 = line[..digits].parse().ok()?;
    if n > MAX_ORDINAL {
        return None;
    }
    line[digits..].strip_prefix('.')
}

/// `"a."` through `"h."`.
fn strip_letter(line: &str) -> Option<&str> {
    let mut chars = line.chars();
    match (chars.next(), chars.next()) {
        (Some('a'..='h'), Some('.')) => Some(&line[2..]),
        _ => None,
    }
}

/// Accumulator threaded through the line fold.
struct Classifier {
    blocks: Vec<Block>,
    last_kind: Option<BlockKind>,
    /// Numbered item the current run of sub-items hangs off.
    open_parent: Option<usize>,
}

impl Classifier {
    fn push(mut self, line: Line<'_>) -> Self {
        let kind = line.kind();
        let text = line.text();

        // Marker-only lines such as a lone "•" carry no content.
        if text.is_empty() {
            return self;
        }

        let index = self.blocks.len();
        let parent = match (kind, self.last_kind) {
            (
                BlockKind::BulletedItem,
                Some(BlockKind::NumberedItem | BlockKind::BulletedItem),
            ) => self.open_parent,
            _ => None,
        };
        self.open_parent = match kind {
            BlockKind::NumberedItem => Some(index),
            _ => parent,
        };

        let mut block = Block::new(kind, text);
        block.parent = parent;
        self.blocks.push(block);
        self.last_kind = Some(kind);
        self
    }
}

/// Convert cleaned summary text into an ordered block sequence.
///
/// The first block is always a `Summary` heading. Blank lines are dropped.
/// Every other line becomes exactly one block, except lines that are only a
/// list marker, which are dropped as well.
pub fn classify(text: &str) -> Vec<Block> {
    let start = Classifier {
        blocks: vec![Block::heading(SUMMARY_HEADING)],
        last_kind: None,
        open_parent: None,
    };

    text.lines()
        .filter_map(Line::classify)
        .fold(start, Classifier::push)
        .blocks
}

/// Strip residual markdown and classify the result.
pub fn summary_to_blocks(summary: &str) -> Vec<Block> {
    classify(&crate::markdown::strip(summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn numbered_list_with_sub_bullet() {
        let blocks = classify("1. First point\n\n• Sub bullet\n\n2. Second point");
        assert_eq!(
            blocks,
            vec![
                Block::heading("Summary"),
                Block::numbered("First point"),
                Block::bulleted("Sub bullet").with_parent(1),
                Block::numbered("Second point"),
            ]
        );
    }

    #[test]
    fn letter_items_are_bullets_without_context() {
        let blocks = classify("a. Alpha\nb. Beta");
        assert_eq!(
            blocks,
            vec![
                Block::heading("Summary"),
                Block::bulleted("Alpha"),
                Block::bulleted("Beta"),
            ]
        );
    }

    #[test]
    fn letter_items_under_numbered_item_share_parent() {
        let blocks = classify("Intro\n3. Topic\n   a. one\n   b. two\nOutro\n• loose");
        assert_eq!(
            blocks,
            vec![
                Block::heading("Summary"),
                Block::paragraph("Intro"),
                Block::numbered("Topic"),
                Block::bulleted("one").with_parent(2),
                Block::bulleted("two").with_parent(2),
                Block::paragraph("Outro"),
                Block::bulleted("loose"),
            ]
        );
    }

    #[test]
    fn plain_prose_is_a_paragraph() {
        assert_eq!(
            classify("   Just a sentence.   "),
            vec![Block::heading("Summary"), Block::paragraph("Just a sentence.")]
        );
    }

    #[rstest]
    #[case("1. one", BlockKind::NumberedItem, "one")]
    #[case("9.nine", BlockKind::NumberedItem, "nine")]
    #[case("20. Last valid ordinal", BlockKind::NumberedItem, "Last valid ordinal")]
    #[case("21. Not a valid ordinal", BlockKind::Paragraph, "21. Not a valid ordinal")]
    #[case("100. too big", BlockKind::Paragraph, "100. too big")]
    #[case("0. zero", BlockKind::Paragraph, "0. zero")]
    #[case("01. padded", BlockKind::Paragraph, "01. padded")]
    #[case("7) paren", BlockKind::Paragraph, "7) paren")]
    #[case("1. • numbered wins", BlockKind::NumberedItem, "• numbered wins")]
    #[case("h. last letter", BlockKind::BulletedItem, "last letter")]
    #[case("i. not a letter item", BlockKind::Paragraph, "i. not a letter item")]
    #[case("A. uppercase", BlockKind::Paragraph, "A. uppercase")]
    #[case("  • indented bullet", BlockKind::BulletedItem, "indented bullet")]
    #[case("Note • a • b", BlockKind::BulletedItem, "b")]
    #[case("- dash", BlockKind::Paragraph, "- dash")]
    fn single_line_rules(#[case] line: &str, #[case] kind: BlockKind, #[case] text: &str) {
        let blocks = classify(line);
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[1].kind, kind);
        assert_eq!(blocks[1].text, text);
    }

    #[rstest]
    #[case("")]
    #[case("\n\n")]
    #[case("   \n\t\n  ")]
    fn blank_input_yields_only_heading(#[case] input: &str) {
        assert_eq!(classify(input), vec![Block::heading(SUMMARY_HEADING)]);
    }

    #[test]
    fn marker_only_lines_are_dropped() {
        assert_eq!(
            classify("•\n1.\na.\n• kept"),
            vec![Block::heading("Summary"), Block::bulleted("kept")]
        );
    }

    #[test]
    fn marker_only_line_does_not_break_sub_item_run() {
        let blocks = classify("1. Parent\n•\n• child");
        assert_eq!(blocks[2], Block::bulleted("child").with_parent(1));
    }

    #[test]
    fn paragraph_breaks_sub_item_run() {
        let blocks = classify("1. Parent\nbody\n• standalone");
        assert_eq!(blocks[3], Block::bulleted("standalone"));
    }

    #[test]
    fn summary_to_blocks_strips_markdown_first() {
        let blocks = summary_to_blocks("## Key Takeaways\n\n1. **Save** early\n• *compound* it");
        assert_eq!(
            blocks,
            vec![
                Block::heading("Summary"),
                Block::paragraph("Key Takeaways"),
                Block::numbered("Save early"),
                Block::bulleted("compound it").with_parent(2),
            ]
        );
    }

    #[test]
    fn kinds_serialize_in_snake_case() {
        let json = serde_json::to_value(Block::numbered("x")).unwrap();
        assert_eq!(json, serde_json::json!({"kind": "numbered_item", "text": "x"}));
    }

    proptest! {
        #[test]
        fn prop_first_block_is_summary_heading(s in "\\PC{0,80}") {
            let blocks = classify(&s);
            prop_assert_eq!(&blocks[0], &Block::heading(SUMMARY_HEADING));
        }

        #[test]
        fn prop_no_empty_blocks_and_parents_point_back(s in "[0-9a-h. •x\n]{0,80}") {
            let blocks = classify(&s);
            for (i, block) in blocks.iter().enumerate() {
                prop_assert!(!block.text.is_empty());
                if let Some(parent) = block.parent {
                    prop_assert!(parent < i);
                    prop_assert_eq!(blocks[parent].kind, BlockKind::NumberedItem);
                    prop_assert_eq!(block.kind, BlockKind::BulletedItem);
                }
            }
            prop_assert!(blocks.len() <= s.lines().count() + 1);
        }
    }
}
