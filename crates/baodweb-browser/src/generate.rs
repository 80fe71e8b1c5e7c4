//! Built-in pages: the fallback start page, error pages, the config page,
//! listings, and per-tag sample pages.

use std::fmt::Write as _;

use crate::block::{SUPPORTED_TAGS, is_supported_tag};
use crate::config::Config;

/// Escape text for use inside HTML content or a quoted attribute.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn document(title: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html>\n<head><title>{}</title></head>\n<body>\n{body}\n</body>\n</html>\n",
        escape(title)
    )
}

/// Start page used when no `start-page*.html` file exists.
pub fn home_page() -> String {
    document(
        "BaodWeb",
        "<h2>Welcome</h2>\
         <p>Type a command at the prompt and press Enter.</p>\
         <ul>\
         <li><code>go &lt;url&gt;</code> opens a page</li>\
         <li><code>click &lt;id&gt;</code> follows the link tagged <b>[id]</b></li>\
         <li><code>back</code> returns to the previous page</li>\
         <li><code>list-tests</code> shows the bundled test pages</li>\
         <li><code>config</code> shows the settings</li>\
         <li><code>help</code> lists every command</li>\
         </ul>\
         <nav><a href=\"about:tests\">Test pages</a><a href=\"about:languages\">Languages</a>\
         <a href=\"about:config\">Settings</a></nav>",
    )
}

/// Page shown when a navigation fails before any page was displayed.
pub fn error_page(url: &str, message: &str) -> String {
    document(
        "Error",
        &format!(
            "<h2>Could not load page</h2><p><code>{}</code></p><p>{}</p>\
             <p><a href=\"about:home\">Home</a></p>",
            escape(url),
            escape(message)
        ),
    )
}

/// Current settings, with the commands that change them.
pub fn config_page(config: &Config) -> String {
    let mut body = String::new();
    body.push_str("<h2>General</h2><table><tr><th>Key</th><th>Value</th></tr>");
    let _ = write!(
        body,
        "<tr><td>enable-color</td><td>{}</td></tr><tr><td>language</td><td>{}</td></tr></table>",
        config.color_enabled,
        escape(&config.language)
    );
    body.push_str("<h2>Tags</h2><table><tr><th>Tag</th><th>Rendered</th></tr>");
    for tag in SUPPORTED_TAGS {
        let _ = write!(
            body,
            "<tr><td>{tag}</td><td>{}</td></tr>",
            config.tag_enabled(tag)
        );
    }
    body.push_str(
        "</table><p>Change a setting with <code>config &lt;key&gt; &lt;value&gt;</code>, \
         for example <code>config tag.img false</code>.</p>",
    );
    document("Configuration", &body)
}

/// Listing of the pages under `test-pages/`.
pub fn tests_page(names: &[String], language: &str) -> String {
    let mut body = String::from("<h2>Test pages</h2>");
    if names.is_empty() {
        body.push_str("<p>No test pages found.</p>");
    } else {
        body.push_str("<ul>");
        for name in names {
            let name = escape(name);
            let _ = write!(body, "<li><a href=\"test:{name}\">{name}</a></li>");
        }
        body.push_str("</ul>");
    }
    let _ = write!(
        body,
        "<p>Language <b>{}</b>: <code>test &lt;page&gt;</code> tries \
         <code>&lt;page&gt;-{}.html</code> before <code>&lt;page&gt;.html</code>.</p>",
        escape(language),
        escape(&language.to_ascii_lowercase())
    );
    document("Test pages", &body)
}

/// Listing of the start-page languages.
pub fn languages_page(languages: &[String], current: &str) -> String {
    let mut body = String::from("<h2>Languages</h2>");
    if languages.is_empty() {
        body.push_str("<p>No language-specific start pages found.</p>");
    } else {
        body.push_str("<ul>");
        for lang in languages {
            let _ = write!(body, "<li>{}</li>", escape(lang));
        }
        body.push_str("</ul>");
    }
    let _ = write!(
        body,
        "<p>Current language: <b>{}</b>. Change it with <code>config language &lt;code&gt;</code>.</p>",
        escape(current)
    );
    document("Languages", &body)
}

/// A sample page exercising `tag`, or `None` for tags outside the
/// supported set.
pub fn tag_page(tag: &str) -> Option<String> {
    if !is_supported_tag(tag) {
        return None;
    }
    let sample = match tag {
        "p" => "<p>A generated paragraph. Lorem ipsum dolor sit amet, consectetur \
                adipiscing elit, sed do eiusmod tempor incididunt ut labore.</p>"
            .to_string(),
        "a" => "<p><a href=\"https://www.example.com\">A generated link</a> and \
                <a href=\"https://www.rust-lang.org\">another one</a>.</p>"
            .to_string(),
        "ul" | "ol" | "li" => format!(
            "<{list}><li>Item one</li><li>Item two</li><li>Item three</li></{list}>",
            list = if tag == "li" { "ul" } else { tag }
        ),
        "table" | "thead" | "tbody" | "tfoot" | "tr" | "th" | "td" => {
            let mut t = String::from("<table><thead><tr>");
            for c in 1..=3 {
                let _ = write!(t, "<th>Header {c}</th>");
            }
            t.push_str("</tr></thead><tbody>");
            for r in 1..=3 {
                t.push_str("<tr>");
                for c in 1..=3 {
                    let _ = write!(t, "<td>Row {r}, Col {c}</td>");
                }
                t.push_str("</tr>");
            }
            t.push_str("</tbody></table>");
            t
        },
        "img" => "<img src=\"https://www.rust-lang.org/logos/rust-logo-256x256.png\" \
                  alt=\"Placeholder image\" width=\"160\" height=\"160\">"
            .to_string(),
        "button" => "<p><button>Generated button</button></p>".to_string(),
        "nav" => "<nav><a href=\"about:home\">Home</a><a href=\"about:tests\">Tests</a>\
                  <a href=\"about:config\">Settings</a></nav>"
            .to_string(),
        "header" | "footer" => format!("<{tag}><p>Generated {tag} content.</p></{tag}>"),
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
            format!("<{tag}>A generated {tag} heading</{tag}>")
        },
        "strong" | "b" | "em" | "i" | "u" | "del" | "s" | "ins" | "mark" | "code" => {
            format!("<p>This sentence has <{tag}>{tag} text</{tag}> inside it.</p>")
        },
        "sub" => "<p>Water is H<sub>2</sub>O.</p>".to_string(),
        "sup" => "<p>Einstein wrote E = mc<sup>2</sup>.</p>".to_string(),
        "pre" => "<pre>fn main() {\n    println!(\"hello\");\n}</pre>".to_string(),
        "br" => "<p>First line<br>second line<br>third line</p>".to_string(),
        "hr" => "<p>Above the rule.</p><hr><p>Below the rule.</p>".to_string(),
        "blockquote" => "<blockquote><p>A generated quotation.</p></blockquote>".to_string(),
        "section" | "article" | "main" | "aside" | "div" => {
            format!("<{tag}><h3>Inside {tag}</h3><p>Content within the {tag}.</p></{tag}>")
        },
        _ => format!("<p><{tag}>Content for the {tag} tag.</{tag}></p>"),
    };
    let title = format!("Test {tag}");
    let body = format!(
        "<h2>{title} page</h2><p>A generated page featuring the <code>&lt;{tag}&gt;</code> tag.</p>{sample}"
    );
    Some(document(&title, &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::build;
    use crate::dom::parse_html;

    fn title_of(html: &str) -> Option<String> {
        let root = parse_html(html.as_bytes()).unwrap();
        build(&root, None, &Config::default()).title
    }

    #[test]
    fn escapes_markup() {
        assert_eq!(escape("<a href=\"x\">&'"), "&lt;a href=&quot;x&quot;&gt;&amp;&#39;");
    }

    #[test]
    fn every_supported_tag_has_a_page() {
        for tag in SUPPORTED_TAGS {
            let page = tag_page(tag).unwrap();
            assert_eq!(title_of(&page), Some(format!("Test {tag}")));
        }
    }

    #[test]
    fn unsupported_tag_has_no_page() {
        assert!(tag_page("marquee").is_none());
    }

    #[test]
    fn config_page_lists_every_tag() {
        let mut config = Config::default();
        config.set("tag.img", "false").unwrap();
        let page = config_page(&config);
        for tag in SUPPORTED_TAGS {
            assert!(page.contains(&format!("<td>{tag}</td>")));
        }
        assert!(page.contains("<td>img</td><td>false</td>"));
    }

    #[test]
    fn tests_page_links_each_test() {
        let page = tests_page(&["layout".into(), "tables".into()], "FR");
        let root = parse_html(page.as_bytes()).unwrap();
        let tree = build(&root, None, &Config::default());
        let hrefs: Vec<&str> = tree.links.iter().map(|(_, h)| h).collect();
        assert_eq!(hrefs, vec!["test:layout", "test:tables"]);
        assert!(page.contains("-fr.html"));
    }

    #[test]
    fn error_page_escapes_message() {
        let page = error_page("http://x.test/", "<boom>");
        assert!(page.contains("&lt;boom&gt;"));
        assert_eq!(title_of(&page).as_deref(), Some("Error"));
    }
}
