// src/feed/parser.rs
use crate::feed::models::{Feed, FeedEntry};
use crate::utils::error::FeedError;
use roxmltree::{Document, Node, ParsingOptions};

const RSS1_NS: &str = "http://purl.org/rss/1.0/";
const ATOM_NS: &str = "http://www.w3.org/2005/Atom";
const DC_NS: &str = "http://purl.org/dc/elements/1.1/";
const CONTENT_NS: &str = "http://purl.org/rss/1.0/modules/content/";

// RSS 0.9x/2.0 elements carry no namespace; RSS 1.0 declares its own
const RSS_NAMESPACES: &[Option<&str>] = &[None, Some(RSS1_NS)];
const ATOM_NAMESPACES: &[Option<&str>] = &[None, Some(ATOM_NS)];

/// An element name qualified by the namespaces it may appear in.
#[derive(Clone, Copy)]
struct Tag {
    name: &'static str,
    namespaces: &'static [Option<&'static str>],
}

const fn rss(name: &'static str) -> Tag {
    Tag {
        name,
        namespaces: RSS_NAMESPACES,
    }
}

const fn atom(name: &'static str) -> Tag {
    Tag {
        name,
        namespaces: ATOM_NAMESPACES,
    }
}

const DC_DATE: Tag = Tag {
    name: "date",
    namespaces: &[Some(DC_NS)],
};

const CONTENT_ENCODED: Tag = Tag {
    name: "encoded",
    namespaces: &[Some(CONTENT_NS)],
};

impl Tag {
    fn matches(self, node: &Node) -> bool {
        let tag = node.tag_name();
        node.is_element()
            && tag.name() == self.name
            && self.namespaces.iter().any(|ns| *ns == tag.namespace())
    }
}

/// Parses RSS 2.0, RSS 1.0 (RDF) or Atom bytes into a [`Feed`].
///
/// The body must be UTF-8 and well-formed XML; anything else is reported as
/// an error and no entries are returned. Entries without a link are dropped,
/// since the link is what identifies a report.
pub fn parse_feed(bytes: &[u8]) -> Result<Feed, FeedError> {
    let text = String::from_utf8(bytes.to_vec())?;
    let text = text.trim_start_matches('\u{feff}');
    // Older RSS 0.91 feeds ship a DOCTYPE; it is read but never expanded
    let options = ParsingOptions {
        allow_dtd: true,
        ..ParsingOptions::default()
    };
    let doc = Document::parse_with_options(text, options)?;
    let root = doc.root_element();

    let (title, items, dialect) = match root.tag_name().name() {
        "rss" => {
            let channel = child(root, rss("channel"));
            let title = channel.and_then(|c| child_text(c, &[rss("title")]));
            let items: Vec<Node> = channel
                .map(|c| children(c, rss("item")).collect())
                .unwrap_or_default();
            (title, items, Dialect::Rss)
        }
        // RSS 1.0 keeps items next to the channel, not inside it
        "RDF" => {
            let title = child(root, rss("channel")).and_then(|c| child_text(c, &[rss("title")]));
            (title, children(root, rss("item")).collect(), Dialect::Rss)
        }
        "feed" => (
            child_text(root, &[atom("title")]),
            children(root, atom("entry")).collect(),
            Dialect::Atom,
        ),
        other => return Err(FeedError::UnknownFormat(other.to_string())),
    };

    let mut entries = Vec::with_capacity(items.len());
    for item in items {
        let entry = match dialect {
            Dialect::Rss => rss_entry(item),
            Dialect::Atom => atom_entry(item),
        };
        match entry {
            Some(entry) => entries.push(entry),
            None => tracing::warn!("Skipping feed item without a link (line {})", line_of(&doc, item)),
        }
    }

    tracing::debug!("Parsed feed {:?} with {} entries", title, entries.len());
    Ok(Feed { title, entries })
}

#[derive(Clone, Copy)]
enum Dialect {
    Rss,
    Atom,
}

fn rss_entry(item: Node) -> Option<FeedEntry> {
    let link = child_text(item, &[rss("link")]).filter(|l| !l.is_empty())?;
    Some(FeedEntry {
        title: child_text(item, &[rss("title")]).unwrap_or_default(),
        link,
        published: child_text(item, &[rss("pubDate"), DC_DATE]),
        description: child_raw_text(item, &[rss("description"), CONTENT_ENCODED]),
    })
}

fn atom_entry(entry: Node) -> Option<FeedEntry> {
    let link = entry
        .children()
        .filter(|n| atom("link").matches(n))
        .find(|n| matches!(n.attribute("rel"), None | Some("alternate")))
        .and_then(|n| n.attribute("href"))
        .map(|href| href.trim().to_string())
        .filter(|l| !l.is_empty())?;
    Some(FeedEntry {
        title: child_text(entry, &[atom("title")]).unwrap_or_default(),
        link,
        published: child_text(entry, &[atom("published"), atom("updated")]),
        description: child_raw_text(entry, &[atom("summary"), atom("content")]),
    })
}

fn child<'a, 'input>(node: Node<'a, 'input>, tag: Tag) -> Option<Node<'a, 'input>> {
    node.children().find(|n| tag.matches(n))
}

fn children<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: Tag,
) -> impl Iterator<Item = Node<'a, 'input>> + 'a {
    node.children().filter(move |n| tag.matches(n))
}

/// Trimmed text of the first child matching any of `tags`, in preference order.
fn child_text(node: Node, tags: &[Tag]) -> Option<String> {
    child_raw_text(node, tags).map(|t| t.trim().to_string())
}

fn child_raw_text(node: Node, tags: &[Tag]) -> Option<String> {
    tags.iter()
        .find_map(|tag| child(node, *tag))
        .map(|n| {
            n.descendants()
                .filter(|d| d.is_text())
                .filter_map(|d| d.text())
                .collect::<String>()
        })
}

fn line_of(doc: &Document, node: Node) -> u32 {
    doc.text_pos_at(node.range().start).row
}
