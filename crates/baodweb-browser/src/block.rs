//! Block tree builder: parse tree -> semantic blocks + link registry.
//!
//! The builder walks the [`Node`] tree once, in document order, and
//! produces a closed [`Block`] variant for every piece of renderable
//! content. While walking it assigns link ids (1, 2, ... in pre-order),
//! collects image sources for the loader, and extracts the page title.
//!
//! The title is taken from the first `<title>`, or failing that the first
//! `<h1>`. When the `<h1>` supplies the title, that heading is not emitted
//! as a block: the title bar is the only place it appears.

use url::Url;

use baodweb_types::{Color, NamedColor, Style};

use crate::config::Config;
use crate::dom::{DOCUMENT_TAG, Node};
use crate::layout::text::collapse_whitespace;
use crate::width::scrub_controls;

// -----------------------------------------------------------------------
// Tag tables
// -----------------------------------------------------------------------

/// Tags that can be switched on and off with `tag.<name>`.
pub const SUPPORTED_TAGS: &[&str] = &[
    "html", "body", "head", "title", "section", "article", "main", "aside", "div", "span", "p",
    "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol", "li", "a", "button", "img", "nav", "header",
    "footer", "table", "thead", "tbody", "tfoot", "tr", "th", "td", "strong", "b", "em", "i", "u",
    "del", "s", "ins", "mark", "sub", "sup", "code", "pre", "br", "hr", "blockquote",
];

/// Tags that only group other content. When disabled, their children are
/// still rendered.
pub const PURE_CONTAINERS: &[&str] = &[
    "html",
    "body",
    "section",
    "article",
    "main",
    "aside",
    "div",
    "span",
    "header",
    "footer",
    "nav",
    "thead",
    "tbody",
    "tfoot",
    "blockquote",
];

/// Never rendered.
const IGNORED_TAGS: &[&str] = &["head", "title", "script", "style", "noscript", "template"];

/// Tags a `<nav>` keeps as items.
const INLINE_TAGS: &[&str] = &[
    "a", "button", "span", "strong", "b", "em", "i", "u", "del", "s", "ins", "mark", "code", "sub",
    "sup", "small", "abbr", "label", "q", "cite", "kbd",
];

/// Tags a `<nav>` looks through for inline descendants.
const NAV_FLATTENED: &[&str] = &[
    "ul", "ol", "li", "div", "p", "section", "article", "main", "aside", "header", "footer", "nav",
    "menu",
];

pub fn is_supported_tag(tag: &str) -> bool {
    SUPPORTED_TAGS.contains(&tag)
}

// -----------------------------------------------------------------------
// Block
// -----------------------------------------------------------------------

/// Semantic role of a generic container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Section,
    Article,
    Main,
    Aside,
    Division,
    Quote,
}

/// One semantic rendering unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading { level: u8, children: Vec<Block> },
    Paragraph(Vec<Block>),
    List { ordered: bool, items: Vec<Block> },
    ListItem(Vec<Block>),
    /// Rows of a table; every child is a [`Block::TableRow`].
    Table(Vec<Block>),
    /// Cells of a row; every child is a [`Block::TableCell`].
    TableRow(Vec<Block>),
    TableCell { header: bool, children: Vec<Block> },
    Link { id: u32, href: String, children: Vec<Block> },
    Image {
        src: String,
        alt: String,
        width_hint: Option<u32>,
        height_hint: Option<u32>,
    },
    Button(Vec<Block>),
    NavBar(Vec<Block>),
    Header(Vec<Block>),
    Footer(Vec<Block>),
    Container { role: Role, children: Vec<Block> },
    InlineRun { text: String, style: Style },
    Preformatted(String),
    LineBreak,
    Rule,
}

impl Block {
    /// Whether the block flows inside a line rather than occupying its own.
    pub fn is_inline(&self) -> bool {
        matches!(
            self,
            Block::InlineRun { .. } | Block::Link { .. } | Block::Button(_) | Block::LineBreak
        )
    }

    /// Child blocks, empty for leaves.
    pub fn children(&self) -> &[Block] {
        match self {
            Block::Heading { children, .. }
            | Block::TableCell { children, .. }
            | Block::Link { children, .. }
            | Block::Container { children, .. } => children,
            Block::List { items, .. } => items,
            Block::Paragraph(c)
            | Block::ListItem(c)
            | Block::Table(c)
            | Block::TableRow(c)
            | Block::Button(c)
            | Block::NavBar(c)
            | Block::Header(c)
            | Block::Footer(c) => c,
            Block::Image { .. }
            | Block::InlineRun { .. }
            | Block::Preformatted(_)
            | Block::LineBreak
            | Block::Rule => &[],
        }
    }

    /// Visible text of this block and its descendants, whitespace collapsed.
    pub fn plain_text(&self) -> String {
        let mut raw = String::new();
        self.collect_text(&mut raw);
        collapse_whitespace(&raw)
    }

    fn collect_text(&self, out: &mut String) {
        match self {
            Block::InlineRun { text, .. } | Block::Preformatted(text) => out.push_str(text),
            Block::LineBreak => out.push(' '),
            _ => {
                for child in self.children() {
                    child.collect_text(out);
                }
            },
        }
    }
}

// -----------------------------------------------------------------------
// Link registry
// -----------------------------------------------------------------------

/// Per-page mapping from link id to absolute URL. Ids start at 1 and are
/// assigned in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkRegistry {
    hrefs: Vec<String>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the next id to `href`.
    pub fn register(&mut self, href: &str) -> u32 {
        self.hrefs.push(href.to_string());
        self.hrefs.len() as u32
    }

    pub fn get(&self, id: u32) -> Option<&str> {
        let idx = (id as usize).checked_sub(1)?;
        self.hrefs.get(idx).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.hrefs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hrefs.is_empty()
    }

    /// `(id, href)` pairs in id order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &str)> {
        self.hrefs
            .iter()
            .enumerate()
            .map(|(i, h)| (i as u32 + 1, h.as_str()))
    }
}

// -----------------------------------------------------------------------
// Builder
// -----------------------------------------------------------------------

/// Output of one build pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockTree {
    pub title: Option<String>,
    pub blocks: Vec<Block>,
    pub links: LinkRegistry,
    /// Resolved image sources, document order, no duplicates.
    pub images: Vec<String>,
}

/// Build the block tree for a parsed document.
///
/// `base` is the URL relative `href`/`src` values resolve against.
pub fn build(root: &Node, base: Option<&Url>, config: &Config) -> BlockTree {
    let (title, title_node) = find_title(root);
    let mut builder = Builder {
        config,
        base,
        title_node,
        links: LinkRegistry::new(),
        images: Vec::new(),
    };
    let mut blocks = Vec::new();
    builder.build_node(root, Inline::default(), &mut blocks);
    BlockTree {
        title,
        blocks,
        links: builder.links,
        images: builder.images,
    }
}

fn find_title(root: &Node) -> (Option<String>, Option<&Node>) {
    if let Some(t) = root.find("title") {
        let text = collapse_whitespace(&scrub_controls(&t.text_content()));
        if !text.is_empty() {
            return (Some(text), None);
        }
    }
    if let Some(h1) = root.find("h1") {
        let text = collapse_whitespace(&scrub_controls(&h1.text_content()));
        if !text.is_empty() {
            return (Some(text), Some(h1));
        }
    }
    (None, None)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Script {
    #[default]
    Normal,
    Sub,
    Sup,
}

/// Inherited inline context.
#[derive(Debug, Clone, Copy, Default)]
struct Inline {
    style: Style,
    script: Script,
}

impl Inline {
    fn with(self, style: Style) -> Self {
        Self {
            style: style.over(self.style),
            ..self
        }
    }

    fn script(self, script: Script) -> Self {
        Self { script, ..self }
    }
}

struct Builder<'a> {
    config: &'a Config,
    base: Option<&'a Url>,
    title_node: Option<&'a Node>,
    links: LinkRegistry,
    images: Vec<String>,
}

impl<'a> Builder<'a> {
    fn collect(&mut self, nodes: &'a [Node], cx: Inline) -> Vec<Block> {
        let mut out = Vec::new();
        self.build_nodes(nodes, cx, &mut out);
        out
    }

    fn build_nodes(&mut self, nodes: &'a [Node], cx: Inline, out: &mut Vec<Block>) {
        for node in nodes {
            self.build_node(node, cx, out);
        }
    }

    fn build_node(&mut self, node: &'a Node, cx: Inline, out: &mut Vec<Block>) {
        if let Some(text) = &node.text {
            push_text(text, cx, out);
            return;
        }
        let tag = node.tag.as_str();
        if tag == DOCUMENT_TAG {
            self.build_nodes(&node.children, cx, out);
            return;
        }
        if IGNORED_TAGS.contains(&tag) {
            return;
        }
        if !self.config.tag_enabled(tag) {
            if PURE_CONTAINERS.contains(&tag) {
                self.build_nodes(&node.children, cx, out);
            }
            return;
        }

        let children = &node.children;
        match tag {
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => {
                if self.title_node.is_some_and(|t| std::ptr::eq(t, node)) {
                    return;
                }
                let level = tag[1..].parse().unwrap_or(1);
                let children = self.collect(children, cx);
                out.push(Block::Heading { level, children });
            },
            "p" => {
                let children = self.collect(children, cx);
                out.push(Block::Paragraph(children));
            },
            "ul" | "ol" => {
                let items = self.list_items(children, cx);
                out.push(Block::List {
                    ordered: tag == "ol",
                    items,
                });
            },
            "li" => {
                let item = Block::ListItem(self.collect(children, cx));
                out.push(Block::List {
                    ordered: false,
                    items: vec![item],
                });
            },
            "table" => {
                let mut rows = Vec::new();
                self.table_rows(children, cx, &mut rows);
                out.push(Block::Table(rows));
            },
            "a" => self.link(node, cx, out),
            "button" => {
                let children = self.collect(children, cx);
                out.push(Block::Button(children));
            },
            "img" => self.image(node, out),
            "nav" => {
                let mut items = Vec::new();
                self.nav_items(children, cx, &mut items);
                out.push(Block::NavBar(items));
            },
            "header" => {
                let children = self.collect(children, cx);
                out.push(Block::Header(children));
            },
            "footer" => {
                let children = self.collect(children, cx);
                out.push(Block::Footer(children));
            },
            "section" => self.container(Role::Section, children, cx, out),
            "article" => self.container(Role::Article, children, cx, out),
            "main" => self.container(Role::Main, children, cx, out),
            "aside" => self.container(Role::Aside, children, cx, out),
            "div" => self.container(Role::Division, children, cx, out),
            "blockquote" => {
                self.container(Role::Quote, children, cx.with(Style::default().italic()), out)
            },
            "strong" | "b" => self.build_nodes(children, cx.with(Style::default().bold()), out),
            "em" | "i" => self.build_nodes(children, cx.with(Style::default().italic()), out),
            "u" | "ins" => self.build_nodes(children, cx.with(Style::default().underline()), out),
            "del" | "s" => self.build_nodes(children, cx.with(Style::default().strike()), out),
            "mark" => self.build_nodes(children, cx.with(Style::default().mark()), out),
            "code" => {
                let code = Style::default().fg(Color::Named(NamedColor::Magenta));
                self.build_nodes(children, cx.with(code), out)
            },
            "sub" => self.build_nodes(children, cx.script(Script::Sub), out),
            "sup" => self.build_nodes(children, cx.script(Script::Sup), out),
            "br" => out.push(Block::LineBreak),
            "hr" => out.push(Block::Rule),
            "pre" => {
                let text = scrub_controls(&node.text_content()).into_owned();
                out.push(Block::Preformatted(text));
            },
            // html, body, span, stray table parts and unknown tags are
            // transparent.
            _ => self.build_nodes(children, cx, out),
        }
    }

    fn container(&mut self, role: Role, nodes: &'a [Node], cx: Inline, out: &mut Vec<Block>) {
        let children = self.collect(nodes, cx);
        out.push(Block::Container { role, children });
    }

    fn list_items(&mut self, nodes: &'a [Node], cx: Inline) -> Vec<Block> {
        let mut items = Vec::new();
        for node in nodes {
            if node.is_text() {
                if node.text.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                    let mut loose = Vec::new();
                    self.build_node(node, cx, &mut loose);
                    items.push(Block::ListItem(loose));
                }
                continue;
            }
            if node.tag == "li" {
                if self.config.tag_enabled("li") {
                    let children = self.collect(&node.children, cx);
                    items.push(Block::ListItem(children));
                }
                continue;
            }
            let mut loose = Vec::new();
            self.build_node(node, cx, &mut loose);
            if !loose.is_empty() {
                items.push(Block::ListItem(loose));
            }
        }
        items
    }

    fn table_rows(&mut self, nodes: &'a [Node], cx: Inline, rows: &mut Vec<Block>) {
        for node in nodes {
            match node.tag.as_str() {
                "tr" => {
                    if self.config.tag_enabled("tr") {
                        let row = self.table_row(node, cx);
                        rows.push(row);
                    }
                },
                // Row groups are pure containers: descend even when disabled.
                "thead" | "tbody" | "tfoot" => self.table_rows(&node.children, cx, rows),
                _ => {},
            }
        }
    }

    fn table_row(&mut self, row: &'a Node, cx: Inline) -> Block {
        let mut cells = Vec::new();
        for cell in &row.children {
            let header = match cell.tag.as_str() {
                "th" => true,
                "td" => false,
                _ => continue,
            };
            let children = if self.config.tag_enabled(&cell.tag) {
                self.collect(&cell.children, cx)
            } else {
                Vec::new()
            };
            cells.push(Block::TableCell { header, children });
        }
        Block::TableRow(cells)
    }

    fn link(&mut self, node: &'a Node, cx: Inline, out: &mut Vec<Block>) {
        let Some(href) = node.attr("href") else {
            self.build_nodes(&node.children, cx, out);
            return;
        };
        let href = self.resolve(href);
        let id = self.links.register(&href);
        let children = self.collect(&node.children, cx);
        out.push(Block::Link { id, href, children });
    }

    fn image(&mut self, node: &Node, out: &mut Vec<Block>) {
        let alt = collapse_whitespace(&scrub_controls(node.attr("alt").unwrap_or_default()));
        let Some(src) = node.attr("src").filter(|s| !s.trim().is_empty()) else {
            if !alt.is_empty() {
                out.push(Block::InlineRun {
                    text: format!("[{alt}]"),
                    style: Style::default().italic(),
                });
            }
            return;
        };
        let src = self.resolve(src);
        if !self.images.contains(&src) {
            self.images.push(src.clone());
        }
        out.push(Block::Image {
            src,
            alt,
            width_hint: parse_dimension(node.attr("width")),
            height_hint: parse_dimension(node.attr("height")),
        });
    }

    /// Keep inline-capable content, looking through structural wrappers
    /// and dropping everything else.
    fn nav_items(&mut self, nodes: &'a [Node], cx: Inline, out: &mut Vec<Block>) {
        for node in nodes {
            if let Some(text) = &node.text {
                if !text.trim().is_empty() {
                    push_text(text, cx, out);
                }
                continue;
            }
            let tag = node.tag.as_str();
            if INLINE_TAGS.contains(&tag) {
                self.build_node(node, cx, out);
            } else if NAV_FLATTENED.contains(&tag)
                && (self.config.tag_enabled(tag) || PURE_CONTAINERS.contains(&tag))
            {
                self.nav_items(&node.children, cx, out);
            }
        }
    }

    fn resolve(&self, reference: &str) -> String {
        let reference = reference.trim();
        if Url::parse(reference).is_ok() {
            return reference.to_string();
        }
        match self.base {
            Some(base) => base
                .join(reference)
                .map(String::from)
                .unwrap_or_else(|_| reference.to_string()),
            None => reference.to_string(),
        }
    }
}

fn push_text(text: &str, cx: Inline, out: &mut Vec<Block>) {
    if text.is_empty() {
        return;
    }
    let text = scrub_controls(text);
    let text = match cx.script {
        Script::Normal => text.into_owned(),
        Script::Sub => text.chars().map(|c| subscript(c).unwrap_or(c)).collect(),
        Script::Sup => text.chars().map(|c| superscript(c).unwrap_or(c)).collect(),
    };
    out.push(Block::InlineRun {
        text,
        style: cx.style,
    });
}

fn parse_dimension(value: Option<&str>) -> Option<u32> {
    let v = value?.trim();
    let v = v.strip_suffix("px").unwrap_or(v);
    v.parse().ok().filter(|&n| n > 0)
}

fn subscript(c: char) -> Option<char> {
    Some(match c {
        '0'..='9' => char::from_u32(0x2080 + (c as u32 - '0' as u32))?,
        '+' => '₊',
        '-' => '₋',
        '=' => '₌',
        '(' => '₍',
        ')' => '₎',
        'a' => 'ₐ',
        'e' => 'ₑ',
        'h' => 'ₕ',
        'k' => 'ₖ',
        'l' => 'ₗ',
        'm' => 'ₘ',
        'n' => 'ₙ',
        'o' => 'ₒ',
        'p' => 'ₚ',
        's' => 'ₛ',
        't' => 'ₜ',
        'x' => 'ₓ',
        _ => return None,
    })
}

fn superscript(c: char) -> Option<char> {
    Some(match c {
        '0' => '⁰',
        '1' => '¹',
        '2' => '²',
        '3' => '³',
        '4'..='9' => char::from_u32(0x2074 + (c as u32 - '4' as u32))?,
        '+' => '⁺',
        '-' => '⁻',
        '=' => '⁼',
        '(' => '⁽',
        ')' => '⁾',
        'i' => 'ⁱ',
        'n' => 'ⁿ',
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::parse_html;

    fn build_html(html: &str) -> BlockTree {
        let root = parse_html(html.as_bytes()).unwrap();
        let base = Url::parse("http://x.test/a/b").unwrap();
        build(&root, Some(&base), &Config::default())
    }

    fn build_with(html: &str, config: &Config) -> BlockTree {
        let root = parse_html(html.as_bytes()).unwrap();
        build(&root, None, config)
    }

    fn find<'t>(blocks: &'t [Block], pred: &dyn Fn(&Block) -> bool) -> Option<&'t Block> {
        for b in blocks {
            if pred(b) {
                return Some(b);
            }
            if let Some(found) = find(b.children(), pred) {
                return Some(found);
            }
        }
        None
    }

    fn count(blocks: &[Block], pred: &dyn Fn(&Block) -> bool) -> usize {
        blocks
            .iter()
            .map(|b| usize::from(pred(b)) + count(b.children(), pred))
            .sum()
    }

    fn text_of(tree: &BlockTree) -> String {
        let mut s = String::new();
        for b in &tree.blocks {
            s.push_str(&b.plain_text());
            s.push(' ');
        }
        collapse_whitespace(&s)
    }

    // ---------------------------------------------------------------
    // Title
    // ---------------------------------------------------------------

    #[test]
    fn title_from_title_element() {
        let tree = build_html("<title>Doc</title><h1>Heading</h1>");
        assert_eq!(tree.title.as_deref(), Some("Doc"));
        // The h1 is a different node, so it is still rendered.
        assert_eq!(count(&tree.blocks, &|b| matches!(b, Block::Heading { .. })), 1);
    }

    #[test]
    fn title_from_h1_is_not_duplicated() {
        let tree = build_html("<h1>Only Heading</h1><p>body</p><h1>Second</h1>");
        assert_eq!(tree.title.as_deref(), Some("Only Heading"));
        let headings = count(&tree.blocks, &|b| matches!(b, Block::Heading { .. }));
        assert_eq!(headings, 1);
        assert!(!text_of(&tree).contains("Only Heading"));
        assert!(text_of(&tree).contains("Second"));
    }

    #[test]
    fn no_title_at_all() {
        let tree = build_html("<p>nothing</p>");
        assert_eq!(tree.title, None);
    }

    #[test]
    fn empty_title_falls_back_to_h1() {
        let tree = build_html("<title>  </title><h1>Fallback</h1>");
        assert_eq!(tree.title.as_deref(), Some("Fallback"));
    }

    // ---------------------------------------------------------------
    // Links
    // ---------------------------------------------------------------

    #[test]
    fn link_ids_follow_document_order() {
        let tree = build_html(
            r#"<p><a href="one">1</a></p><ul><li><a href="two">2</a></li></ul>
               <table><tr><td><a href="three">3</a></td></tr></table>"#,
        );
        let pairs: Vec<(u32, &str)> = tree.links.iter().collect();
        assert_eq!(
            pairs,
            vec![
                (1, "http://x.test/a/one"),
                (2, "http://x.test/a/two"),
                (3, "http://x.test/a/three"),
            ]
        );
    }

    #[test]
    fn relative_resolution_merges_path() {
        let tree = build_html(r#"<a href="c">c</a><a href="/root">r</a><a href="../up">u</a>"#);
        assert_eq!(tree.links.get(1), Some("http://x.test/a/c"));
        assert_eq!(tree.links.get(2), Some("http://x.test/root"));
        assert_eq!(tree.links.get(3), Some("http://x.test/up"));
    }

    #[test]
    fn absolute_href_passes_through() {
        let tree = build_html(r#"<a href="https://other.test">o</a>"#);
        assert_eq!(tree.links.get(1), Some("https://other.test"));
    }

    #[test]
    fn anchor_without_href_is_plain_text() {
        let tree = build_html(r#"<p><a name="x">plain</a></p>"#);
        assert!(tree.links.is_empty());
        assert!(text_of(&tree).contains("plain"));
    }

    #[test]
    fn registry_lookup_out_of_range() {
        let mut reg = LinkRegistry::new();
        reg.register("http://a.test/");
        assert_eq!(reg.get(0), None);
        assert_eq!(reg.get(1), Some("http://a.test/"));
        assert_eq!(reg.get(2), None);
    }

    // ---------------------------------------------------------------
    // Tag switches
    // ---------------------------------------------------------------

    #[test]
    fn disabled_tag_drops_its_text() {
        let mut config = Config::default();
        config.set("tag.p", "false").unwrap();
        let tree = build_with("<p>gone</p><h2>kept</h2>", &config);
        let text = text_of(&tree);
        assert!(!text.contains("gone"));
        assert!(text.contains("kept"));
    }

    #[test]
    fn disabled_container_keeps_children() {
        let mut config = Config::default();
        config.set("tag.div", "false").unwrap();
        let tree = build_with("<div><p>inside</p></div>", &config);
        assert!(find(&tree.blocks, &|b| matches!(b, Block::Container { .. })).is_none());
        assert!(find(&tree.blocks, &|b| matches!(b, Block::Paragraph(_))).is_some());
    }

    #[test]
    fn disabled_link_gets_no_id() {
        let mut config = Config::default();
        config.set("tag.a", "false").unwrap();
        let tree = build_with(r#"<a href="x">x</a>"#, &config);
        assert!(tree.links.is_empty());
    }

    #[test]
    fn scripts_and_styles_are_ignored() {
        let tree = build_html("<script>var x = 1;</script><style>p{}</style><p>seen</p>");
        assert_eq!(text_of(&tree), "seen");
    }

    // ---------------------------------------------------------------
    // Structure
    // ---------------------------------------------------------------

    #[test]
    fn nav_keeps_only_inline_items() {
        let tree = build_html(
            r#"<nav><ul><li><a href="/a">A</a></li><li><a href="/b">B</a></li></ul>
               <table><tr><td>cell</td></tr></table></nav>"#,
        );
        let Some(Block::NavBar(items)) = find(&tree.blocks, &|b| matches!(b, Block::NavBar(_)))
        else {
            panic!("no nav bar");
        };
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|i| matches!(i, Block::Link { .. })));
    }

    #[test]
    fn list_items_and_order() {
        let tree = build_html("<ol><li>one</li><li>two</li></ol>");
        let Some(Block::List { ordered, items }) =
            find(&tree.blocks, &|b| matches!(b, Block::List { .. }))
        else {
            panic!("no list");
        };
        assert!(*ordered);
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn table_header_cells_are_marked() {
        let tree = build_html(
            "<table><thead><tr><th>H</th></tr></thead><tbody><tr><td>v</td></tr></tbody></table>",
        );
        let Some(Block::Table(rows)) = find(&tree.blocks, &|b| matches!(b, Block::Table(_))) else {
            panic!("no table");
        };
        assert_eq!(rows.len(), 2);
        assert!(matches!(
            rows[0].children()[0],
            Block::TableCell { header: true, .. }
        ));
        assert!(matches!(
            rows[1].children()[0],
            Block::TableCell { header: false, .. }
        ));
    }

    #[test]
    fn inline_styles_are_inherited() {
        let tree = build_html("<p><b>bold <i>both</i></b></p>");
        let Some(Block::InlineRun { style, .. }) = find(&tree.blocks, &|b| {
            matches!(b, Block::InlineRun { text, .. } if text == "both")
        }) else {
            panic!("missing run");
        };
        assert!(style.bold && style.italic);
    }

    #[test]
    fn sub_and_sup_map_to_unicode() {
        let tree = build_html("<p>H<sub>2</sub>O x<sup>2</sup></p>");
        assert_eq!(text_of(&tree), "H₂O x²");
    }

    #[test]
    fn images_are_collected_once() {
        let tree = build_html(
            r#"<img src="p.png" alt="pic" width="64" height="32px"><img src="p.png">"#,
        );
        assert_eq!(tree.images, vec!["http://x.test/a/p.png".to_string()]);
        let Some(Block::Image {
            width_hint,
            height_hint,
            alt,
            ..
        }) = find(&tree.blocks, &|b| matches!(b, Block::Image { .. }))
        else {
            panic!("no image");
        };
        assert_eq!(*width_hint, Some(64));
        assert_eq!(*height_hint, Some(32));
        assert_eq!(alt, "pic");
    }

    #[test]
    fn preformatted_keeps_text() {
        let tree = build_html("<pre>a  b\n c</pre>");
        assert!(find(&tree.blocks, &|b| {
            matches!(b, Block::Preformatted(t) if t == "a  b\n c")
        })
        .is_some());
    }

    #[test]
    fn control_characters_are_replaced() {
        let tree = build_html(
            "<title>t&#27;]0;x&#7;</title><p>safe&#27;[2J\u{9b}text</p>\
             <pre>a&#27;[1m\tb</pre><img src=\"p.png\" alt=\"x&#27;y\">",
        );
        assert_eq!(tree.title.as_deref(), Some("t\u{FFFD}]0;x\u{FFFD}"));
        let text = text_of(&tree);
        assert!(text.contains("safe\u{FFFD}[2J\u{FFFD}text"), "{text:?}");
        assert!(find(&tree.blocks, &|b| {
            matches!(b, Block::Preformatted(t) if t == "a\u{FFFD}[1m\tb")
        })
        .is_some());
        assert!(find(&tree.blocks, &|b| {
            matches!(b, Block::Image { alt, .. } if alt == "x\u{FFFD}y")
        })
        .is_some());
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        fn arb_tree() -> impl Strategy<Value = Node> {
            let leaf = prop_oneof![
                "[a-z ]{0,8}".prop_map(|t| Node::text(&t)),
                "[a-z]{1,5}".prop_map(|h| Node::element(
                    "a",
                    vec![("href".to_string(), format!("/{h}"))],
                    vec![Node::text(&h)]
                )),
            ];
            leaf.prop_recursive(4, 32, 4, |inner| {
                (
                    proptest::sample::select(vec!["div", "p", "ul", "li", "span", "section", "td"]),
                    proptest::collection::vec(inner, 0..4),
                )
                    .prop_map(|(tag, children)| Node::element(tag, Vec::new(), children))
            })
        }

        fn hrefs_in_order(node: &Node, out: &mut Vec<String>) {
            if node.tag == "a" {
                if let Some(h) = node.attr("href") {
                    out.push(h.to_string());
                }
            }
            for c in &node.children {
                hrefs_in_order(c, out);
            }
        }

        proptest! {
            #[test]
            fn ids_are_dense_and_in_document_order(tree in arb_tree()) {
                let root = Node::element(DOCUMENT_TAG, Vec::new(), vec![tree]);
                let built = build(&root, None, &Config::default());
                let mut expected = Vec::new();
                hrefs_in_order(&root, &mut expected);
                let got: Vec<(u32, String)> =
                    built.links.iter().map(|(i, h)| (i, h.to_string())).collect();
                prop_assert_eq!(got.len(), expected.len());
                for (idx, (id, href)) in got.iter().enumerate() {
                    prop_assert_eq!(*id as usize, idx + 1);
                    prop_assert_eq!(href, &expected[idx]);
                }
            }
        }
    }
}
