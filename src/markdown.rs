use pulldown_cmark::{html, CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd};
use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::SyntaxSet,
};
use tracing::warn;

/// URL schemes allowed in link and image targets. Relative targets are always kept.
const SAFE_URL_SCHEMES: &[&str] = &["http", "https", "mailto"];

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_MATH);
    options
}

/// Renders a post body to HTML. Raw HTML in the source is escaped and link
/// targets with other schemes than [`SAFE_URL_SCHEMES`] are emptied.
pub fn render_markdown_to_html(markdown: &str) -> String {
    render(markdown, None)
}

/// Same as [`render_markdown_to_html`], with fenced code blocks highlighted.
pub fn render_article_html(markdown: &str, highlighter: &Highlighter) -> String {
    render(markdown, Some(highlighter))
}

fn render(markdown: &str, highlighter: Option<&Highlighter>) -> String {
    let normalized_markdown = normalize_latex_delimiters(markdown);
    let events = Parser::new_ext(&normalized_markdown, markdown_options()).map(transform_event);

    let mut html_out = String::new();
    match highlighter {
        Some(highlighter) => {
            html::push_html(&mut html_out, highlight_code_blocks(events, highlighter).into_iter())
        }
        None => html::push_html(&mut html_out, events),
    }
    html_out
}

fn transform_event(event: Event<'_>) -> Event<'_> {
    match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: sanitize_url(dest_url),
            title,
            id,
        }),
        Event::InlineMath(math) => Event::Html(render_math_html(&math, false).into()),
        Event::DisplayMath(math) => Event::Html(render_math_html(&math, true).into()),
        other => other,
    }
}

/// A colon before any `/`, `?` or `#` starts a scheme; anything else is relative.
fn sanitize_url(url: CowStr<'_>) -> CowStr<'_> {
    let allowed = match url.find(':') {
        None => true,
        Some(colon) => {
            let scheme = &url[..colon];
            scheme.contains(['/', '?', '#'])
                || SAFE_URL_SCHEMES
                    .iter()
                    .any(|safe| scheme.eq_ignore_ascii_case(safe))
        }
    };
    if allowed {
        url
    } else {
        CowStr::Borrowed("")
    }
}

fn highlight_code_blocks<'a>(
    events: impl Iterator<Item = Event<'a>>,
    highlighter: &Highlighter,
) -> Vec<Event<'a>> {
    let mut out = Vec::new();
    // (language, accumulated source) of the code block being read
    let mut block: Option<(Option<String>, String)> = None;

    for event in events {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split(|c: char| c == ',' || c.is_whitespace())
                        .next()
                        .filter(|token| !token.is_empty())
                        .map(str::to_string),
                    CodeBlockKind::Indented => None,
                };
                block = Some((lang, String::new()));
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some((lang, code)) = block.take() {
                    out.push(Event::Html(highlighter.highlight(&code, lang.as_deref()).into()));
                }
            }
            Event::Text(text) if block.is_some() => {
                if let Some((_, code)) = block.as_mut() {
                    code.push_str(&text);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Rewrites `\( \)` and `\[ \]` to the `$` / `$$` delimiters the parser
/// understands. Backtick spans and fences are copied untouched.
fn normalize_latex_delimiters(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut i = 0;

    while i < input.len() {
        let tail = &input[i..];

        if tail.starts_with('`') {
            let run = tail.len() - tail.trim_start_matches('`').len();
            let fence = &tail[..run];
            let end = tail[run..].find(fence).map_or(run, |at| run + at + run);
            out.push_str(&tail[..end]);
            i += end;
            continue;
        }

        if let Some((open, close, display_mode)) = delimiter_at(tail) {
            let content_start = open.len();
            if let Some(close_at) = tail[content_start..].find(close) {
                let content = &tail[content_start..content_start + close_at];
                let marker = if display_mode || content.contains('\n') { "$$" } else { "$" };
                out.push_str(marker);
                out.push_str(content);
                out.push_str(marker);
                i += content_start + close_at + close.len();
                continue;
            }
        }

        match tail.chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    out
}

fn delimiter_at(tail: &str) -> Option<(&'static str, &'static str, bool)> {
    if tail.starts_with("\\(") {
        Some(("\\(", "\\)", false))
    } else if tail.starts_with("\\[") {
        Some(("\\[", "\\]", true))
    } else {
        None
    }
}

fn render_math_html(source: &str, display_mode: bool) -> String {
    let mut opts = katex::Opts::builder();
    opts.display_mode(display_mode);

    let rendered = match opts.build() {
        Ok(opts) => katex::render_with_opts(source, opts),
        Err(_) => return fallback_math_html(source, display_mode),
    };

    rendered.unwrap_or_else(|_| fallback_math_html(source, display_mode))
}

fn fallback_math_html(source: &str, display_mode: bool) -> String {
    let class_name = if display_mode { "math math-display" } else { "math math-inline" };
    format!(
        "<span class=\"{class_name}\">{}</span>",
        htmlescape::encode_minimal(source)
    )
}

/// Syntax highlighter for fenced code blocks, loaded once at startup.
pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Option<Theme>,
}

impl Highlighter {
    pub fn new(theme_name: &str) -> Self {
        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set.themes.remove(theme_name);
        if theme.is_none() {
            warn!("Unknown highlight theme {}; code blocks will be unstyled", theme_name);
        }
        Self {
            syntax_set: SyntaxSet::load_defaults_newlines(),
            theme,
        }
    }

    fn highlight(&self, code: &str, lang: Option<&str>) -> String {
        let Some(theme) = &self.theme else {
            return plain_code_block(code, lang);
        };
        let syntax = lang
            .and_then(|token| self.syntax_set.find_syntax_by_token(token))
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        match highlighted_html_for_string(code, &self.syntax_set, syntax, theme) {
            Ok(html) => html,
            Err(e) => {
                warn!("Failed to highlight code block: {}", e);
                plain_code_block(code, lang)
            }
        }
    }
}

fn plain_code_block(code: &str, lang: Option<&str>) -> String {
    match lang {
        Some(lang) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>\n",
            htmlescape::encode_attribute(lang),
            htmlescape::encode_minimal(code)
        ),
        None => format!("<pre><code>{}</code></pre>\n", htmlescape::encode_minimal(code)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn visible_text(html: &str) -> String {
        let fragment = scraper::Html::parse_fragment(html);
        let text: String = fragment.root_element().text().collect();
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    #[test]
    fn renders_basic_block_constructs() {
        let input = "# Title\n\n> quoted\n\n1. one\n2. two\n\n```\nlet x = 1;\n```\n";
        let output = render_markdown_to_html(input);

        assert!(output.contains("<h1>Title</h1>"));
        assert!(output.contains("<blockquote>"));
        assert!(output.contains("<ol>"));
        assert!(output.contains("<pre><code>let x = 1;"));
    }

    #[test]
    fn renders_tables_and_strikethrough() {
        let output = render_markdown_to_html("| a | b |\n|---|---|\n| 1 | 2 |\n\n~~gone~~\n");

        assert!(output.contains("<table>"));
        assert!(output.contains("<td>2</td>"));
        assert!(output.contains("<del>gone</del>"));
    }

    #[test]
    fn visible_text_matches_stripped_markdown() {
        let input = "## Getting started\n\nHello *brave* new **world**.\n\n- first item\n- second item\n";
        let output = render_markdown_to_html(input);

        assert_eq!(
            visible_text(&output),
            "Getting started Hello brave new world. first item second item"
        );
    }

    #[test]
    fn escapes_raw_html() {
        let output = render_markdown_to_html("<script>alert(1)</script>\n\nInline <b onclick=\"x\">tag</b>\n");

        assert!(!output.contains("<script>"));
        assert!(output.contains("&lt;script&gt;"));
        assert!(!output.contains("<b onclick"));
    }

    #[test]
    fn empties_unsafe_link_targets() {
        let output = render_markdown_to_html("[click](javascript:alert(1)) ![i](JavaScript:alert(2))\n");

        assert!(!output.to_lowercase().contains("javascript"));
        assert!(output.contains("<a href=\"\">click</a>"));
        assert!(output.contains("<img src=\"\" alt=\"i\" />"));
    }

    #[test]
    fn keeps_safe_and_relative_link_targets() {
        let output = render_markdown_to_html(
            "[a](https://example.com) [b](/blog/x:y) [c](#top) [d](mailto:me@example.com) [e](notes?at=1:2)\n",
        );

        assert!(output.contains("href=\"https://example.com\""));
        assert!(output.contains("href=\"/blog/x:y\""));
        assert!(output.contains("href=\"#top\""));
        assert!(output.contains("href=\"mailto:me@example.com\""));
        assert!(output.contains("href=\"notes?at=1:2\""));
    }

    #[test]
    fn renders_math_with_latex_paren_and_bracket_delimiters() {
        let output = render_markdown_to_html("\\(x^2\\) and \\[y^2\\]");
        assert!(output.contains("katex"));
    }

    #[test]
    fn normalizes_multiline_paren_math_to_display() {
        let normalized = normalize_latex_delimiters("Start \\( \\frac{a}{b}\n\\approx 1 \\) end");
        assert_eq!(normalized, "Start $$ \\frac{a}{b}\n\\approx 1 $$ end");
    }

    #[test]
    fn leaves_code_spans_and_fences_alone() {
        let input = "Use `\\(group\\)` here.\n\n```\nre = \\(a\\)\n```\n";
        assert_eq!(normalize_latex_delimiters(input), input);
        assert_eq!(normalize_latex_delimiters("a ` b \\(x\\)"), "a ` b $x$");
    }

    #[test]
    fn fallback_math_is_escaped() {
        let html = fallback_math_html("<x>", true);
        assert_eq!(html, "<span class=\"math math-display\">&lt;x&gt;</span>");
    }

    #[test]
    fn highlights_fenced_code() {
        let highlighter = Highlighter::new("base16-ocean.dark");
        let output = render_article_html("```rust\nfn main() {}\n```\n", &highlighter);

        assert!(output.contains("<pre style="));
        assert!(output.contains("main"));
        assert!(!output.contains("<code"));
    }

    #[test]
    fn unknown_theme_falls_back_to_plain_blocks() {
        let highlighter = Highlighter::new("no-such-theme");
        let output = render_article_html("```js,ignore\na < b\n```\n", &highlighter);

        assert_eq!(output, "<pre><code class=\"language-js\">a &lt; b\n</code></pre>\n");
    }
}
