//! Markdown-to-HTML conversion for post bodies.
//!
//! This is a pipeline of independent text-rewrite passes over the source,
//! not a grammar: fenced code blocks, pipe tables, headings, emphasis,
//! links, then line breaks, with the whole result wrapped in a paragraph.
//! Body text outside fenced code is deliberately not HTML-escaped; the
//! dialect trusts its single local author.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```([^\n]*)\n(.*?)```").expect("code fence pattern"));

static TABLE: LazyLock<Regex> = LazyLock::new(|| {
    // Two or more consecutive lines, each carrying at least two pipes.
    Regex::new(r"(?m)(?:^[^\n]*\|[^\n]*\|[^\n]*\n){2,}").expect("table pattern")
});

static H3: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^### (.+)$").expect("h3 pattern"));
static H2: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^## (.+)$").expect("h2 pattern"));
static H1: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?m)^# (.+)$").expect("h1 pattern"));

static BOLD_STARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern"));
static BOLD_UNDERSCORES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"__(.+?)__").expect("bold pattern"));
static ITALIC_STAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*(.+?)\*").expect("italic pattern"));
static ITALIC_UNDERSCORE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"_(.+?)_").expect("italic pattern"));

static LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[(.+?)\]\((.+?)\)").expect("link pattern"));

// Private-use sentinel bracketing code block placeholders so no later
// pass can touch fenced content.
const SHIELD: char = '\u{e000}';

/// Convert a post body to an HTML fragment. Total: never fails, and an
/// empty body yields an empty paragraph.
pub fn render(text: &str) -> String {
    if text.is_empty() {
        return "<p></p>".to_string();
    }

    let mut code_blocks: Vec<String> = Vec::new();
    let html = CODE_FENCE.replace_all(text, |caps: &Captures| {
        let lang = caps.get(1).map_or("", |m| m.as_str()).trim();
        let code = escape_code(caps.get(2).map_or("", |m| m.as_str()).trim());
        code_blocks.push(format!(
            "<pre><code class=\"language-{lang}\">{code}</code></pre>"
        ));
        format!("{SHIELD}{}{SHIELD}", code_blocks.len() - 1)
    });

    let html = TABLE.replace_all(&html, |caps: &Captures| convert_table(&caps[0]));

    let html = H3.replace_all(&html, "<h3>$1</h3>");
    let html = H2.replace_all(&html, "<h2>$1</h2>");
    let html = H1.replace_all(&html, "<h1>$1</h1>");

    let html = BOLD_STARS.replace_all(&html, "<strong>$1</strong>");
    let html = BOLD_UNDERSCORES.replace_all(&html, "<strong>$1</strong>");
    let html = ITALIC_STAR.replace_all(&html, "<em>$1</em>");
    let html = ITALIC_UNDERSCORE.replace_all(&html, "<em>$1</em>");

    let html = LINK.replace_all(&html, "<a href=\"$2\" target=\"_blank\" rel=\"noopener\">$1</a>");

    let html = html.replace("\n\n", "</p><p>").replace('\n', "<br>");
    let mut html = format!("<p>{html}</p>");

    for (index, block) in code_blocks.iter().enumerate() {
        html = html.replace(&format!("{SHIELD}{index}{SHIELD}"), block);
    }
    html
}

/// Candidate table run -> `<table>` markup, or the run verbatim when the
/// second line is not a separator row (no hyphen in any cell).
fn convert_table(candidate: &str) -> String {
    let rows: Vec<&str> = candidate.trim().lines().collect();
    if rows.len() < 2 {
        return candidate.to_string();
    }
    let has_separator = rows[1].split('|').any(|cell| cell.contains('-'));
    if !has_separator {
        return candidate.to_string();
    }

    let mut html = String::from("<table class=\"markdown-table\"><thead><tr>");
    for cell in split_cells(rows[0]) {
        html.push_str("<th>");
        html.push_str(cell);
        html.push_str("</th>");
    }
    html.push_str("</tr></thead><tbody>");

    for row in &rows[2..] {
        let cells: Vec<&str> = split_cells(row).collect();
        if cells.is_empty() {
            continue;
        }
        html.push_str("<tr>");
        for cell in cells {
            html.push_str("<td>");
            html.push_str(cell);
            html.push_str("</td>");
        }
        html.push_str("</tr>");
    }
    html.push_str("</tbody></table>");
    html
}

fn split_cells(row: &str) -> impl Iterator<Item = &str> {
    row.split('|').map(str::trim).filter(|cell| !cell.is_empty())
}

fn escape_code(code: &str) -> String {
    code.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
