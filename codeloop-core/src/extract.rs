//! Pull fenced code blocks out of free-form model text.
//!
//! Only the first matching block is used; later blocks are ignored.
//!
//! A tag must end at a word boundary, so ```` ```cpp ```` never opens a `c`
//! block while ```` ```c\n ```` and ```` ```c { ```` do.

use crate::language::Language;
use regex::{Regex, RegexBuilder};

/// Opening fence for `tag`, followed by the lazily captured body when `body` is set
fn fence(tag: &str, case_insensitive: bool, body: bool) -> Option<Regex> {
    let mut pattern = format!(r"```{}\b", regex::escape(tag));
    if body {
        pattern.push_str("(.*?)```");
    }
    match RegexBuilder::new(&pattern)
        .dot_matches_new_line(true)
        .case_insensitive(case_insensitive)
        .build()
    {
        Ok(re) => Some(re),
        Err(e) => {
            tracing::debug!(tag, error = %e, "fence pattern rejected");
            None
        }
    }
}

/// Interior of the first ```` ```tag ```` block, trimmed; empty when none.
pub fn extract(text: &str, tag: &str) -> String {
    extract_with(text, tag, false)
}

/// Like [`extract`], optionally matching the tag case-insensitively
pub fn extract_with(text: &str, tag: &str, case_insensitive: bool) -> String {
    let Some(re) = fence(tag, case_insensitive, true) else {
        return String::new();
    };

    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

/// First block tagged with any of the language's fence tags, in tag order
pub fn extract_code(text: &str, language: Language) -> String {
    language
        .fence_tags()
        .iter()
        .map(|tag| extract_with(text, tag, language.fence_case_insensitive()))
        .find(|code| !code.is_empty())
        .unwrap_or_default()
}

/// Whether `text` carries an opening fence for the language, by the same
/// tag rules [`extract_code`] uses
pub fn has_fence(text: &str, language: Language) -> bool {
    language.fence_tags().iter().any(|tag| {
        fence(tag, language.fence_case_insensitive(), false).is_some_and(|re| re.is_match(text))
    })
}

/// Extract when fenced, otherwise treat the whole text as code
pub fn code_or_raw(text: &str, language: Language) -> String {
    if has_fence(text, language) {
        extract_code(text, language)
    } else {
        text.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_c_block() {
        let text = "```c\nint main(){return 0;}\n```";
        assert_eq!(extract(text, "c"), "int main(){return 0;}");
    }

    #[test]
    fn test_no_matching_block() {
        assert_eq!(extract("", "c"), "");
        assert_eq!(extract("just prose, no code", "c"), "");
        assert_eq!(extract("```python\nprint(1)\n```", "c"), "");
        // unterminated fence
        assert_eq!(extract("```c\nint x;", "c"), "");
    }

    #[test]
    fn test_first_block_wins() {
        let text = "Here:\n```c\nint a;\n```\nand also\n```c\nint b;\n```";
        assert_eq!(extract(text, "c"), "int a;");
    }

    #[test]
    fn test_tag_is_a_whole_word() {
        let text = "```cpp\nint a;\n```\n```c\nint b;\n```";
        assert_eq!(extract(text, "c"), "int b;");
    }

    #[test]
    fn test_interior_is_preserved() {
        let body = "#include <stdio.h>\n\nint main(void) {\n    printf(\"%d\\n\", 1);\n}";
        let text = format!("Sure!\n```c\n{}\n```\nDone.", body);
        assert_eq!(extract(&text, "c"), body);
    }

    #[test]
    fn test_case_sensitivity() {
        let text = "```C\nint a;\n```";
        assert_eq!(extract(text, "c"), "");
        assert_eq!(extract_with(text, "c", true), "int a;");
    }

    #[test]
    fn test_python_markdown_fallback() {
        let text = "```Markdown\nprint('hi')\n```";
        assert_eq!(extract_code(text, Language::Python), "print('hi')");

        let both = "```markdown\nprint(1)\n```\n```python\nprint(2)\n```";
        assert_eq!(extract_code(both, Language::Python), "print(2)");
    }

    #[test]
    fn test_code_or_raw() {
        assert_eq!(code_or_raw("  int x;  ", Language::C), "int x;");
        assert_eq!(code_or_raw("```c\nint y;\n```", Language::C), "int y;");
        assert!(has_fence("```PYTHON\nx=1\n```", Language::Python));
        assert!(!has_fence("```C\nint x;\n```", Language::C));
    }

    #[test]
    fn test_longer_tag_is_passed_through_raw() {
        let text = "```cpp\nint main() { return 0; }\n```";
        assert!(!has_fence(text, Language::C));
        assert_eq!(code_or_raw(text, Language::C), text);
        assert!(has_fence("```c {\nint x;\n```", Language::C));
    }
}
