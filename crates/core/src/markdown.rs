use std::sync::OnceLock;

use regex::Regex;

struct Patterns {
    heading: Regex,
    bold: Regex,
    italic: Regex,
    rule: Regex,
    quote: Regex,
    blank_run: Regex,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| Patterns {
        heading: Regex::new(r"(?m)^(?:#{1,6}[ \t]+)+").expect("Invalid heading regex"),
        bold: Regex::new(r"\*\*(.+?)\*\*").expect("Invalid bold regex"),
        italic: Regex::new(r"\*([^*\n]+?)\*").expect("Invalid italic regex"),
        rule: Regex::new(r"(?m)^[ \t]*-{3,}[ \t]*$").expect("Invalid rule regex"),
        quote: Regex::new(r"(?m)^>[ \t]?").expect("Invalid quote regex"),
        blank_run: Regex::new(r"\n(?:[ \t]*\n){2,}").expect("Invalid blank line regex"),
    })
}

/// Remove the markdown a language model leaves in its answers: heading
/// markers, bold/italic delimiters, horizontal rules and blockquote markers.
///
/// Best-effort, not a parser: unmatched tokens stay as literal characters.
/// The result is a fixpoint, so `strip(&strip(s)) == strip(s)`.
pub fn strip(text: &str) -> String {
    let mut current = text.to_string();
    loop {
        let next = strip_once(&current);
        // Every rewrite only removes characters, so this terminates.
        if next == current {
            return next;
        }
        current = next;
    }
}

fn strip_once(text: &str) -> String {
    let p = patterns();
    // Removing a marker can join a stray `\r` with the next newline, so line
    // endings are normalised on every pass.
    let text = text.replace("\r\n", "\n");
    let text = p.heading.replace_all(&text, "");
    let text = p.bold.replace_all(&text, "$1");
    let text = p.italic.replace_all(&text, "$1");
    let text = p.rule.replace_all(&text, "");
    let text = p.quote.replace_all(&text, "");
    let text = p.blank_run.replace_all(&text, "\n\n");
    text.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::rstest;

    #[test]
    fn strips_emphasis_rules_and_quotes() {
        assert_eq!(
            strip("**Bold** and *italic* text\n---\n> quoted"),
            "Bold and italic text\n\nquoted"
        );
    }

    #[rstest]
    #[case("# Title", "Title")]
    #[case("### Key points\nbody", "Key points\nbody")]
    #[case("###### six", "six")]
    #[case("#hashtag", "#hashtag")]
    #[case("intro\n## Section", "intro\nSection")]
    fn strips_heading_markers(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip(input), expected);
    }

    #[rstest]
    #[case("a **b** c", "a b c")]
    #[case("***both***", "both")]
    #[case("price * 2", "price * 2")]
    #[case("an *aside* here", "an aside here")]
    #[case("**unclosed", "**unclosed")]
    fn strips_emphasis(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(strip(input), expected);
    }

    #[test]
    fn removes_horizontal_rules_with_surrounding_whitespace() {
        assert_eq!(strip("one\n  -----  \ntwo"), "one\n\ntwo");
        assert_eq!(strip("a -- b"), "a -- b");
    }

    #[test]
    fn collapses_blank_runs() {
        assert_eq!(strip("a\n\n\n\nb"), "a\n\nb");
        assert_eq!(strip("a\n \n\t\n\nb"), "a\n\nb");
        assert_eq!(strip("a\n\nb"), "a\n\nb");
    }

    #[test]
    fn trims_and_normalises_crlf() {
        assert_eq!(strip("\r\n  plain  \r\n\r\n"), "plain");
        assert_eq!(strip("> hi\r\n> there"), "hi\nthere");
    }

    #[test]
    fn carriage_return_before_crlf_settles_in_one_call() {
        let once = strip("a\r\r\nb");
        assert_eq!(once, "a\nb");
        assert_eq!(strip(&once), once);
    }

    #[test]
    fn nested_markers_reach_a_fixpoint() {
        assert_eq!(strip("> > nested"), "nested");
        assert_eq!(strip("## # double"), "double");
        assert_eq!(strip("> # quoted heading"), "quoted heading");
    }

    #[test]
    fn empty_input() {
        assert_eq!(strip(""), "");
        assert_eq!(strip("\n\n---\n\n"), "");
    }

    proptest! {
        #[test]
        fn prop_strip_is_idempotent(s in "[-#*>• a-c1.\t\r\n]{0,64}") {
            let once = strip(&s);
            prop_assert_eq!(strip(&once), once);
        }

        #[test]
        fn prop_strip_never_grows(s in "\\PC{0,64}") {
            prop_assert!(strip(&s).len() <= s.len());
        }
    }
}
