//! Lattes curriculum XML extraction
//!
//! Reads the researcher name from `DADOS-GERAIS/@NOME-COMPLETO` and the
//! publication titles found under `PRODUCAO-BIBLIOGRAFICA`. Publication
//! categories are described by [`PUBLICATION_CATEGORIES`] and scanned by a
//! single traversal, in table order.
//!
//! Lattes exports are usually declared `ISO-8859-1`; UTF-8 (with or without
//! BOM) and ISO-8859-1 / US-ASCII are accepted.

use std::borrow::Cow;

use roxmltree::{Document, Node, ParsingOptions};
use thiserror::Error;
use tracing::debug;

use crate::models::CurriculumRecord;

const GENERAL_DATA_TAG: &str = "DADOS-GERAIS";
const FULL_NAME_ATTR: &str = "NOME-COMPLETO";
const BIBLIOGRAPHIC_PRODUCTION_TAG: &str = "PRODUCAO-BIBLIOGRAFICA";

/// One kind of bibliographic production and where its title lives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationCategory {
    /// Element wrapping one production item
    pub container: &'static str,
    /// Element inside the container carrying the basic data
    pub details: &'static str,
    /// Attribute of `details` holding the title
    pub title_attr: &'static str,
}

/// Scanned in this order: articles, books, book chapters, conference works
pub const PUBLICATION_CATEGORIES: [PublicationCategory; 4] = [
    PublicationCategory {
        container: "ARTIGO-PUBLICADO",
        details: "DADOS-BASICOS-DO-ARTIGO",
        title_attr: "TITULO-DO-ARTIGO",
    },
    PublicationCategory {
        container: "LIVRO-PUBLICADO-OU-ORGANIZADO",
        details: "DADOS-BASICOS-DO-LIVRO",
        title_attr: "TITULO-DO-LIVRO",
    },
    PublicationCategory {
        container: "CAPITULO-DE-LIVRO-PUBLICADO",
        details: "DADOS-BASICOS-DO-CAPITULO",
        title_attr: "TITULO-DO-CAPITULO-DO-LIVRO",
    },
    PublicationCategory {
        container: "TRABALHO-EM-EVENTOS",
        details: "DADOS-BASICOS-DO-TRABALHO",
        title_attr: "TITULO-DO-TRABALHO",
    },
];

/// Errors raised while reading a curriculum document
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// Document is not well-formed XML
    #[error("malformed XML: {0}")]
    Parse(String),

    /// Document bytes do not match a supported encoding
    #[error("unsupported encoding: {0}")]
    Encoding(String),
}

/// Extract researcher name and publication titles from one curriculum document
///
/// A document without a general-data node yields `full_name = None` and no
/// titles; the caller decides whether to skip it.
pub fn extract_curriculum(bytes: &[u8]) -> Result<CurriculumRecord, ExtractError> {
    let text = decode_document(bytes)?;

    let mut options = ParsingOptions::default();
    options.allow_dtd = true;
    let doc = Document::parse_with_options(&text, options)
        .map_err(|e| ExtractError::Parse(e.to_string()))?;
    let root = doc.root_element();

    let Some(general_data) = find_first(root, GENERAL_DATA_TAG) else {
        debug!("No {} node in document", GENERAL_DATA_TAG);
        return Ok(CurriculumRecord::default());
    };

    let full_name = non_blank(general_data.attribute(FULL_NAME_ATTR));

    let titles = match find_first(root, BIBLIOGRAPHIC_PRODUCTION_TAG) {
        Some(production) => collect_titles(production),
        None => Vec::new(),
    };

    debug!(
        full_name = full_name.as_deref().unwrap_or("<none>"),
        titles = titles.len(),
        "Extracted curriculum"
    );

    Ok(CurriculumRecord { full_name, titles })
}

/// Titles of every category under `production`, category by category
fn collect_titles(production: Node<'_, '_>) -> Vec<String> {
    let mut titles = Vec::new();
    for category in &PUBLICATION_CATEGORIES {
        for item in descendants_named(production, category.container) {
            let title = find_first(item, category.details)
                .and_then(|details| non_blank(details.attribute(category.title_attr)));
            if let Some(title) = title {
                titles.push(title);
            }
        }
    }
    titles
}

fn descendants_named<'a, 'input: 'a>(
    node: Node<'a, 'input>,
    tag: &'static str,
) -> impl Iterator<Item = Node<'a, 'input>> {
    node.descendants()
        .skip(1)
        .filter(move |n| n.is_element() && n.tag_name().name() == tag)
}

fn find_first<'a, 'input: 'a>(node: Node<'a, 'input>, tag: &'static str) -> Option<Node<'a, 'input>> {
    descendants_named(node, tag).next()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Decode raw bytes according to the XML declaration
fn decode_document(bytes: &[u8]) -> Result<Cow<'_, str>, ExtractError> {
    if bytes.starts_with(&[0xFE, 0xFF]) || bytes.starts_with(&[0xFF, 0xFE]) {
        return Err(ExtractError::Encoding("UTF-16".to_string()));
    }
    let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);

    let declared = declared_encoding(bytes).map(|e| e.to_ascii_lowercase());
    match declared.as_deref() {
        None | Some("utf-8") | Some("utf8") => std::str::from_utf8(bytes)
            .map(Cow::Borrowed)
            .map_err(|e| ExtractError::Encoding(format!("invalid UTF-8: {}", e))),
        Some("iso-8859-1") | Some("iso8859-1") | Some("iso_8859-1") | Some("latin1")
        | Some("latin-1") | Some("us-ascii") | Some("ascii") => {
            // ISO-8859-1 code points map one-to-one onto U+0000..U+00FF
            Ok(Cow::Owned(bytes.iter().map(|&b| b as char).collect()))
        }
        Some(other) => Err(ExtractError::Encoding(other.to_string())),
    }
}

/// Value of `encoding="..."` in a leading `<?xml ... ?>` declaration
fn declared_encoding(bytes: &[u8]) -> Option<&str> {
    if !bytes.starts_with(b"<?xml") {
        return None;
    }
    let end = bytes.windows(2).position(|w| w == b"?>")?;
    let prolog = std::str::from_utf8(&bytes[..end]).ok()?;

    let rest = &prolog[prolog.find("encoding")? + "encoding".len()..];
    let rest = rest.trim_start().strip_prefix('=')?.trim_start();
    let quote = rest.chars().next().filter(|c| *c == '"' || *c == '\'')?;
    let value = &rest[1..];
    value.find(quote).map(|close| &value[..close])
}
