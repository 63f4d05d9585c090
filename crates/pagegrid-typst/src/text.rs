//! Text escaping and paragraph rendering

use std::sync::OnceLock;

use pagegrid_ast::TextBlock;
use regex::Regex;

use crate::list::render_list;
use crate::table::render_table;

fn described_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\[([^\]]+)\]\]").unwrap())
}

fn bare_link_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap())
}

fn strong_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\*([^*\n]+)\*").unwrap())
}

fn emph_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"/([^/\n]+)/").unwrap())
}

fn hard_break_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\\\s*$").unwrap())
}

fn emphasis(text: &str) -> String {
    let text = strong_re().replace_all(text, "#strong[$1]");
    emph_re().replace_all(&text, "#emph[$1]").into_owned()
}

fn placeholder(idx: usize) -> String {
    format!("__LINK_{}__", idx)
}

/// Escape text for Typst markup and convert inline markup
///
/// Backslashes and quotes are escaped, `[[url][desc]]` and `[[url]]`
/// become `#link(..)` calls, `*x*` becomes `#strong[x]` and `/x/` becomes
/// `#emph[x]`. Links are shielded from emphasis so slashes in URLs survive.
pub fn escape_text(s: &str) -> String {
    let escaped = s.replace('\\', "\\\\").replace('"', "\\\"");

    let mut links = Vec::new();
    let with_described = described_link_re().replace_all(&escaped, |caps: &regex::Captures| {
        links.push(format!("#link(\"{}\")[{}]", &caps[1], emphasis(&caps[2])));
        placeholder(links.len() - 1)
    });
    let with_bare = bare_link_re().replace_all(&with_described, |caps: &regex::Captures| {
        links.push(format!("#link(\"{}\")", &caps[1]));
        placeholder(links.len() - 1)
    });

    let mut out = emphasis(&with_bare);
    for (idx, link) in links.iter().enumerate() {
        out = out.replace(&placeholder(idx), link);
    }
    out
}

/// `#text(args)[content]`, or `#text[content]` without args
pub fn typst_text(content: &str, text_args: &str) -> String {
    if text_args.is_empty() {
        format!("#text[{}]", content)
    } else {
        format!("#text({})[{}]", text_args, content)
    }
}

/// `#par(args)[content]`, or `#par()[content]` without args
pub fn typst_par(content: &str, par_args: &str) -> String {
    format!("#par({})[{}]", par_args, content)
}

/// Split text into paragraphs on blank lines and `---` / `:::` lines
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paras = Vec::new();
    let mut buf: Vec<&str> = Vec::new();

    let mut flush = |buf: &mut Vec<&str>| {
        let joined = buf.join("\n");
        let trimmed = joined.trim();
        if !trimmed.is_empty() {
            paras.push(trimmed.to_string());
        }
        buf.clear();
    };

    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() || stripped == "---" || stripped == ":::" {
            flush(&mut buf);
        } else {
            buf.push(line);
        }
    }
    flush(&mut buf);
    paras
}

/// Render one paragraph, honoring trailing-backslash hard breaks
fn render_with_hard_breaks(par: &str, text_args: &str) -> String {
    let lines: Vec<&str> = par.split('\n').collect();
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        if hard_break_re().is_match(line) {
            let clean = hard_break_re().replace(line, "");
            if !clean.is_empty() {
                out.push_str(&typst_text(&escape_text(&clean), text_args));
            }
            out.push_str("#linebreak()");
        } else {
            out.push_str(&typst_text(&escape_text(line), text_args));
            if idx + 1 < lines.len() {
                out.push(' ');
            }
        }
    }
    out
}

fn render_paragraphs(text: &str, text_args: &str, par_args: &str) -> Option<String> {
    let paras = split_paragraphs(text);
    match paras.as_slice() {
        [] => None,
        [only] if par_args.is_empty() => Some(render_with_hard_breaks(only, text_args)),
        _ => Some(
            paras
                .iter()
                .map(|p| typst_par(&render_with_hard_breaks(p, text_args), par_args))
                .collect::<Vec<_>>()
                .join("\n"),
        ),
    }
}

/// A piece of plain content
#[derive(Debug, Clone, PartialEq)]
enum Fragment {
    Text(String),
    /// A `#set`/`#show`/`#let`/`#import` line passed through verbatim
    Typst(String),
    Code { content: String, lang: String },
}

fn is_typst_directive(line: &str) -> bool {
    let stripped = line.trim();
    ["#set ", "#show ", "#let ", "#import "]
        .iter()
        .any(|prefix| stripped.starts_with(prefix))
}

/// Split plain content into text, raw Typst lines, and fenced code
fn split_fragments(content: &str) -> Vec<Fragment> {
    let lines: Vec<&str> = content.split('\n').collect();
    let mut fragments = Vec::new();
    let mut text: Vec<&str> = Vec::new();

    let flush = |text: &mut Vec<&str>, fragments: &mut Vec<Fragment>| {
        if !text.is_empty() {
            fragments.push(Fragment::Text(text.join("\n")));
            text.clear();
        }
    };

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        if is_typst_directive(line) {
            flush(&mut text, &mut fragments);
            fragments.push(Fragment::Typst(line.trim().to_string()));
            i += 1;
        } else if let Some(lang) = line.trim().strip_prefix("```") {
            flush(&mut text, &mut fragments);
            let lang = lang.trim().to_string();
            let mut code = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim().starts_with("```") {
                code.push(lines[i]);
                i += 1;
            }
            // Skip the closing fence
            i += 1;
            fragments.push(Fragment::Code {
                content: code.join("\n"),
                lang,
            });
        } else {
            text.push(line);
            i += 1;
        }
    }
    flush(&mut text, &mut fragments);
    fragments
}

fn render_code(content: &str, lang: &str) -> String {
    let escaped = content
        .replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n");
    if lang.is_empty() || lang == "text" {
        format!("#raw(\"{}\", block: true)", escaped)
    } else {
        format!("#raw(\"{}\", lang: \"{}\", block: true)", escaped, lang)
    }
}

fn render_plain(content: &str, text_args: &str, par_args: &str) -> Vec<String> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    let mut parts = Vec::new();
    for fragment in split_fragments(content) {
        match fragment {
            Fragment::Typst(line) => parts.push(line),
            Fragment::Code { content, lang } => parts.push(render_code(&content, &lang)),
            Fragment::Text(text) => parts.extend(render_paragraphs(&text, text_args, par_args)),
        }
    }
    parts
}

/// Render the text blocks of a header, subheader, or body element
pub fn render_blocks(blocks: &[TextBlock], text_args: &str, par_args: &str) -> String {
    let mut parts = Vec::new();
    for block in blocks {
        match block {
            TextBlock::Plain { content } => parts.extend(render_plain(content, text_args, par_args)),
            TextBlock::List(list) => {
                let rendered = render_list(list, text_args, par_args);
                if !rendered.is_empty() {
                    parts.push(rendered);
                }
            }
            TextBlock::Table(table) => {
                let rendered = render_table(table, text_args);
                if !rendered.is_empty() {
                    parts.push(rendered);
                }
            }
        }
    }
    parts.join("\n")
}
