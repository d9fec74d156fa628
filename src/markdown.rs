use crate::config::DEFAULT_HIGHLIGHT_THEME;
use crate::highlight;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};
use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;

pub const PAGE_BREAK_HTML: &str = r#"<div class="page-break"></div>"#;

static PAGE_BREAK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<!--\s*page[-_\s]*break\s*-->").unwrap());
static SLUG_STRIP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s-]").unwrap());
static SLUG_COLLAPSE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[-\s]+").unwrap());

fn markdown_options() -> Options {
    Options::ENABLE_TABLES
        | Options::ENABLE_FOOTNOTES
        | Options::ENABLE_STRIKETHROUGH
        | Options::ENABLE_TASKLISTS
        | Options::ENABLE_HEADING_ATTRIBUTES
        | Options::ENABLE_SMART_PUNCTUATION
}

/// Convert Markdown to an HTML fragment using the default code highlighting theme.
pub fn markdown_to_html(content: &str) -> String {
    markdown_to_html_with_theme(content, DEFAULT_HIGHLIGHT_THEME)
}

pub fn markdown_to_html_with_theme(content: &str, highlight_theme: &str) -> String {
    if content.is_empty() {
        return String::new();
    }

    let events: Vec<Event> = Parser::new_ext(content, markdown_options()).collect();
    let events = assign_heading_ids(events);
    let events = highlight_code_blocks(events, highlight_theme);

    let mut out = String::with_capacity(content.len() * 3 / 2);
    html::push_html(&mut out, events.into_iter());
    out
}

/// Give every heading without an explicit `{#id}` a unique slug id so the
/// rendered document can carry a table of contents.
fn assign_heading_ids(mut events: Vec<Event<'_>>) -> Vec<Event<'_>> {
    let mut used: HashMap<String, usize> = HashMap::new();

    // Explicit ids are reserved first so generated ones never collide with them.
    for event in &events {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            used.insert(id.to_string(), 0);
        }
    }

    let mut i = 0;
    while i < events.len() {
        if let Event::Start(Tag::Heading { id: None, .. }) = &events[i] {
            let mut text = String::new();
            let mut end = i + 1;
            while end < events.len() {
                match &events[end] {
                    Event::End(TagEnd::Heading(_)) => break,
                    Event::Text(t) | Event::Code(t) => text.push_str(t),
                    _ => {}
                }
                end += 1;
            }

            let slug = unique_slug(slugify(&text), &mut used);
            if let Event::Start(Tag::Heading { id, .. }) = &mut events[i] {
                *id = Some(CowStr::from(slug));
            }
            i = end;
        }
        i += 1;
    }
    events
}

pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let stripped = SLUG_STRIP.replace_all(&lowered, "");
    let slug = SLUG_COLLAPSE.replace_all(stripped.trim(), "-");
    if slug.is_empty() {
        "section".to_string()
    } else {
        slug.into_owned()
    }
}

fn unique_slug(slug: String, used: &mut HashMap<String, usize>) -> String {
    if !used.contains_key(&slug) {
        used.insert(slug.clone(), 0);
        return slug;
    }
    loop {
        let count = used.entry(slug.clone()).or_insert(0);
        *count += 1;
        let candidate = format!("{}_{}", slug, count);
        if !used.contains_key(&candidate) {
            used.insert(candidate.clone(), 0);
            return candidate;
        }
    }
}

/// Replace fenced code blocks that name a language with pre-rendered HTML.
fn highlight_code_blocks<'a>(events: Vec<Event<'a>>, theme: &str) -> Vec<Event<'a>> {
    let mut out = Vec::with_capacity(events.len());
    let mut block: Option<(String, String)> = None;

    for event in events {
        if block.is_some() {
            match event {
                Event::Text(text) => {
                    if let Some((_, code)) = block.as_mut() {
                        code.push_str(&text);
                    }
                }
                Event::End(TagEnd::CodeBlock) => {
                    if let Some((lang, code)) = block.take() {
                        out.push(Event::Html(CowStr::from(render_code_block(
                            &code, &lang, theme,
                        ))));
                    }
                }
                _ => {}
            }
            continue;
        }

        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(info)))
                if !fence_language(&info).is_empty() =>
            {
                block = Some((fence_language(&info).to_string(), String::new()));
            }
            other => out.push(other),
        }
    }
    out
}

// "rust,ignore" and "python {.numberLines}" both name their language first.
fn fence_language(info: &str) -> &str {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .unwrap_or("")
}

fn render_code_block(code: &str, lang: &str, theme: &str) -> String {
    match highlight::highlight_code(code, lang, theme) {
        Some(highlighted) => highlighted,
        None => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            escape_html(lang),
            escape_html(code)
        ),
    }
}

/// Turn `<!-- pagebreak -->` style comments (any case, `-`, `_` or spaces
/// between the words) into page-break elements.
pub fn process_page_breaks(html_content: &str) -> String {
    PAGE_BREAK_COMMENT
        .replace_all(html_content, PAGE_BREAK_HTML)
        .into_owned()
}

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Wrap a body fragment and stylesheet into a standalone HTML document.
pub fn build_html_document(title: &str, body_html: &str, css_content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{}</title>
    <style>
        {}
    </style>
</head>
<body>
   {}
</body>
</html>
"#,
        escape_html(title),
        css_content,
        body_html
    )
}

/// Join per-file bodies for merge mode. Each section opens with a header
/// naming its source file; page breaks go between sections, never after the last.
pub fn merge_html_bodies(sections: &[(String, String)], auto_break: bool) -> String {
    let mut parts = Vec::with_capacity(sections.len() * 3);
    for (i, (file_name, body)) in sections.iter().enumerate() {
        parts.push(format!(
            "<h1 class=\"document-section-header\">{}</h1>\n",
            escape_html(file_name)
        ));
        parts.push(body.clone());
        if auto_break && i + 1 < sections.len() {
            parts.push(format!("{}\n", PAGE_BREAK_HTML));
        }
    }
    parts.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_markdown_to_html_basic() {
        let html = markdown_to_html("# Hello\n\nWorld");
        assert!(html.contains("<h1 id=\"hello\">Hello</h1>"));
        assert!(html.contains("<p>World</p>"));
    }

    #[test]
    fn test_markdown_to_html_smart_punctuation() {
        let html = markdown_to_html("\"quoted\" -- it's... done --- end");
        assert!(html.contains("\u{201c}quoted\u{201d}"));
        assert!(html.contains("\u{2013}"));
        assert!(html.contains("it\u{2019}s"));
        assert!(html.contains("\u{2026}"));
        assert!(html.contains("\u{2014}"));
    }

    #[test]
    fn test_smart_punctuation_skips_code() {
        let html = markdown_to_html("`a -- \"b\"`\n\n```\nx -- \"y\"\n```\n");
        assert!(html.contains("<code>a -- &quot;b&quot;</code>"));
        assert!(html.contains("x -- &quot;y&quot;"));
    }

    #[test]
    fn test_markdown_to_html_inline_styles() {
        let html = markdown_to_html("This is **bold** and *italic* and ~~gone~~.");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>italic</em>"));
        assert!(html.contains("<del>gone</del>"));
    }

    #[test]
    fn test_markdown_to_html_lists() {
        let html = markdown_to_html("- Item 1\n- Item 2\n\n1. First\n2. Second");
        assert!(html.contains("<ul>"));
        assert!(html.contains("<li>Item 1</li>"));
        assert!(html.contains("<ol>"));
    }

    #[test]
    fn test_markdown_to_html_tables() {
        let html = markdown_to_html("| A | B |\n|---|---|\n| 1 | 2 |");
        assert!(html.contains("<table>"));
        assert!(html.contains("<th>A</th>"));
        assert!(html.contains("<td>2</td>"));
    }

    #[test]
    fn test_markdown_to_html_links() {
        let html = markdown_to_html("[Example](https://example.com)");
        assert!(html.contains("<a href=\"https://example.com\">Example</a>"));
    }

    #[test]
    fn test_markdown_to_html_empty_string() {
        assert_eq!(markdown_to_html(""), "");
    }

    #[test]
    fn test_code_block_with_language_is_highlighted() {
        let html = markdown_to_html("```python\ndef hello():\n    pass\n```\n");
        assert!(html.contains("codehilite"));
        assert!(html.contains("hello"));
        assert!(!html.contains("```"));
    }

    #[test]
    fn test_code_block_unknown_language_is_escaped() {
        let html = markdown_to_html("```nosuchlang\n<b>&</b>\n```\n");
        assert!(html.contains("<pre><code class=\"language-nosuchlang\">"));
        assert!(html.contains("&lt;b&gt;&amp;&lt;/b&gt;"));
    }

    #[test]
    fn test_code_block_without_language_untouched() {
        let html = markdown_to_html("```\nplain\n```\n");
        assert!(html.contains("<pre><code>plain"));
    }

    #[test]
    fn test_fence_language() {
        assert_eq!(fence_language("rust,ignore"), "rust");
        assert_eq!(fence_language("python {.numberLines}"), "python");
        assert_eq!(fence_language(""), "");
    }

    #[test]
    fn test_heading_ids_are_unique() {
        let html = markdown_to_html("## Setup\n\n## Setup\n\n## Setup");
        assert!(html.contains("id=\"setup\""));
        assert!(html.contains("id=\"setup_1\""));
        assert!(html.contains("id=\"setup_2\""));
    }

    #[test]
    fn test_explicit_heading_id_kept() {
        let html = markdown_to_html("# Intro {#start}\n\n# Start");
        assert!(html.contains("id=\"start\""));
        assert!(html.contains("id=\"start_1\""));
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World!"), "hello-world");
        assert_eq!(slugify("  Code `example`  "), "code-example");
        assert_eq!(slugify("a -- b"), "a-b");
        assert_eq!(slugify("!!!"), "section");
    }

    #[test]
    fn test_page_break_comment_passes_through_markdown() {
        let html = markdown_to_html("Page 1\n\n<!-- pagebreak -->\n\nPage 2");
        assert!(html.contains("<!-- pagebreak -->"));
        let processed = process_page_breaks(&html);
        assert!(processed.contains(PAGE_BREAK_HTML));
    }

    #[test]
    fn test_process_page_breaks_spellings() {
        for comment in [
            "<!-- pagebreak -->",
            "<!-- page-break -->",
            "<!-- PAGEBREAK -->",
            "<!-- PAGE-BREAK -->",
            "<!-- PageBreak -->",
            "<!--  page break  -->",
            "<!--page_break-->",
        ] {
            let html = format!("<p>Page 1</p>{}<p>Page 2</p>", comment);
            let result = process_page_breaks(&html);
            assert_eq!(
                result,
                format!("<p>Page 1</p>{}<p>Page 2</p>", PAGE_BREAK_HTML),
                "failed for {}",
                comment
            );
        }
    }

    #[test]
    fn test_process_page_breaks_multiple() {
        let html = "<p>1</p>\n<!-- pagebreak -->\n<p>2</p>\n<!-- pagebreak -->\n<p>3</p>";
        assert_eq!(process_page_breaks(html).matches(PAGE_BREAK_HTML).count(), 2);
    }

    #[test]
    fn test_process_page_breaks_leaves_other_comments() {
        let html = "<p>No breaks here</p><!-- note -->";
        assert_eq!(process_page_breaks(html), html);
    }

    #[test]
    fn test_build_html_document_structure() {
        let css = "body { font-size: 14pt; }";
        let body = "<h1>Heading</h1><p>Paragraph</p>";
        let doc = build_html_document("My Title", body, css);
        assert!(doc.starts_with("<!DOCTYPE html>"));
        assert!(doc.contains("<html>"));
        assert!(doc.contains("<meta charset=\"utf-8\">"));
        assert!(doc.contains("<title>My Title</title>"));
        assert!(doc.contains("<style>"));
        assert!(doc.contains(css));
        assert!(doc.contains(body));
        assert!(doc.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_build_html_document_escapes_title() {
        let doc = build_html_document("a<b>", "", "");
        assert!(doc.contains("<title>a&lt;b&gt;</title>"));
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x" & 'y')</script>"#),
            "&lt;script&gt;alert(&quot;x&quot; &amp; &#x27;y&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn test_merge_html_bodies_with_breaks() {
        let sections = vec![
            ("one.md".to_string(), "<p>1</p>".to_string()),
            ("two.md".to_string(), "<p>2</p>".to_string()),
            ("three.md".to_string(), "<p>3</p>".to_string()),
        ];
        let merged = merge_html_bodies(&sections, true);
        assert_eq!(merged.matches("document-section-header").count(), 3);
        assert_eq!(merged.matches(PAGE_BREAK_HTML).count(), 2);
        assert!(!merged.trim_end().ends_with(PAGE_BREAK_HTML));
        let one = merged.find("one.md").unwrap();
        let three = merged.find("three.md").unwrap();
        assert!(one < three);
    }

    #[test]
    fn test_merge_html_bodies_without_breaks() {
        let sections = vec![
            ("one.md".to_string(), "<p>1</p>".to_string()),
            ("two.md".to_string(), "<p>2</p>".to_string()),
        ];
        let merged = merge_html_bodies(&sections, false);
        assert!(!merged.contains(PAGE_BREAK_HTML));
    }

    #[test]
    fn test_merge_html_bodies_escapes_file_names() {
        let sections = vec![("<img src=x>.md".to_string(), String::new())];
        let merged = merge_html_bodies(&sections, true);
        assert!(merged.contains("&lt;img src=x&gt;.md"));
        assert!(!merged.contains("<img"));
    }
}
