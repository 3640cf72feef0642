// .nfo sidecar parser
// Reads the XML descriptors written by media managers (Kodi style) next to a video.
// Parsing never fails: any problem yields empty metadata plus a diagnostic.

use std::path::Path;
use encoding_rs::{Encoding, UTF_8};
use roxmltree::{Document, Node, ParsingOptions};

use super::{encode_multi, NfoMetadata};

/// Poster candidates, highest priority first
const POSTER_TAGS: [&str; 3] = ["thumb", "poster", "fanart"];

/// Result of reading one sidecar.
#[derive(Debug, Clone, Default)]
pub struct NfoOutcome {
    pub metadata: NfoMetadata,
    /// Set when the file could not be read or parsed; metadata is then empty.
    pub diagnostic: Option<String>,
}

/// Parse an .nfo file into metadata.
pub fn parse_nfo(nfo_path: &Path) -> NfoOutcome {
    match read_nfo(nfo_path) {
        Ok(metadata) => NfoOutcome { metadata, diagnostic: None },
        Err(msg) => {
            log::warn!("Error parsing {}: {}", nfo_path.display(), msg);
            NfoOutcome {
                metadata: NfoMetadata::default(),
                diagnostic: Some(msg),
            }
        }
    }
}

fn read_nfo(nfo_path: &Path) -> std::result::Result<NfoMetadata, String> {
    let bytes = std::fs::read(nfo_path).map_err(|e| e.to_string())?;
    let text = decode_nfo_bytes(bytes)?;
    parse_nfo_str(&text)
}

/// Decode raw sidecar bytes. UTF-8 unless the XML prolog declares another encoding.
fn decode_nfo_bytes(bytes: Vec<u8>) -> std::result::Result<String, String> {
    if let Some(label) = declared_encoding(&bytes) {
        let encoding = Encoding::for_label(label.as_bytes())
            .ok_or_else(|| format!("unknown encoding '{}'", label))?;
        if encoding != UTF_8 {
            return encoding
                .decode_without_bom_handling_and_without_replacement(&bytes)
                .map(|text| text.into_owned())
                .ok_or_else(|| format!("bytes are not valid {}", encoding.name()));
        }
    }
    String::from_utf8(bytes).map_err(|e| format!("invalid UTF-8: {}", e))
}

/// The `encoding` pseudo-attribute of a leading `<?xml ...?>` declaration, if any.
fn declared_encoding(bytes: &[u8]) -> Option<String> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    // The prolog is ASCII in every ASCII-compatible encoding
    let prolog = std::str::from_utf8(&bytes[..end]).ok()?;

    let rest = &prolog[prolog.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    let close = value.find(quote)?;
    Some(value[..close].trim().to_string())
}

/// Parse descriptor text. Exposed separately so callers holding the XML in memory
/// do not need a file.
pub fn parse_nfo_str(text: &str) -> std::result::Result<NfoMetadata, String> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(text, options).map_err(|e| e.to_string())?;
    let root = doc.root_element();

    let genres = all_texts(root, "genre");
    let directors = all_texts(root, "director");
    let actors = actor_names(root);

    let duration = find_text(root, "runtime")
        .filter(|s| !s.is_empty())
        .or_else(|| find_text(root, "duration"))
        .unwrap_or_default();

    Ok(NfoMetadata {
        genres: encode_multi(&genres),
        year: find_text(root, "year").unwrap_or_default(),
        directors: encode_multi(&directors),
        plot: find_text(root, "plot").unwrap_or_default(),
        actors: encode_multi(&actors),
        duration,
        rating: find_text(root, "rating").unwrap_or_default(),
        poster: poster(root),
    })
}

/// Direct child elements with the given tag name, in document order.
fn children_named<'a, 'input>(
    node: Node<'a, 'input>,
    name: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.children()
        .filter(move |n| n.is_element() && n.tag_name().name() == name)
}

/// Text directly inside a node (before its first child element), trimmed.
fn own_text(node: Node) -> String {
    node.text().map(str::trim).unwrap_or("").to_string()
}

/// Trimmed text of the first child named `name`; `None` when there is no such child.
fn find_text(node: Node, name: &'static str) -> Option<String> {
    children_named(node, name).next().map(own_text)
}

fn all_texts(node: Node, name: &'static str) -> Vec<String> {
    children_named(node, name)
        .map(own_text)
        .filter(|s| !s.is_empty())
        .collect()
}

fn actor_names(root: Node) -> Vec<String> {
    let mut names = Vec::new();

    for actor in children_named(root, "actor") {
        let name = find_text(actor, "name")
            .filter(|s| !s.is_empty())
            .or_else(|| find_text(actor, "actor").filter(|s| !s.is_empty()))
            .unwrap_or_else(|| own_text(actor));
        if !name.is_empty() {
            names.push(name);
        }
    }

    for container in children_named(root, "actors") {
        for child in container.children().filter(|n| n.is_element()) {
            let name = own_text(child);
            if !name.is_empty() {
                names.push(name);
            }
        }
    }

    names
}

fn poster(root: Node) -> String {
    for tag in POSTER_TAGS {
        if let Some(v) = find_text(root, tag).filter(|s| !s.is_empty()) {
            return v;
        }
    }

    // <fanart><thumb>...</thumb></fanart>
    children_named(root, "fanart")
        .next()
        .and_then(|fanart| {
            find_text(fanart, "thumb")
                .filter(|s| !s.is_empty())
                .or_else(|| find_text(fanart, "poster"))
        })
        .filter(|s| !s.is_empty())
        .unwrap_or_default()
}
