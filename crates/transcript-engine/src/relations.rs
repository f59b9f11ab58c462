//! Consecutive-speaker relations in dialogue transcripts
//!
//! A transcript marks each turn with an element such as
//! `<u class="nom">M. Dupont</u>`. Reading those labels in document order,
//! every adjacent pair of different speakers is one relation "A spoke right
//! before B". Counts are pooled across the whole corpus.

use crate::error::Result;
use crate::extractors::text::{decode_lossy, resolve_entity, unescape_text};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::{Deserialize, Serialize};
use shared_types::{RelationCounts, RelationTuple, SourceDocument};
use tracing::{debug, info, instrument, warn};

/// Where a turn's speaker label comes from
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpeakerSource {
    /// Text content of the element, each text node trimmed
    #[default]
    Text,
    /// Value of the named attribute (TEI-style `who="#dupont"`)
    Attribute(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationOptions {
    /// Local name of the turn element
    pub element: String,
    /// Required class token; `None` accepts every turn element
    pub class: Option<String>,
    pub speaker: SpeakerSource,
    pub parallel: bool,
}

impl Default for RelationOptions {
    fn default() -> Self {
        Self {
            element: "u".to_string(),
            class: Some("nom".to_string()),
            speaker: SpeakerSource::Text,
            parallel: false,
        }
    }
}

fn is_turn(e: &BytesStart<'_>, options: &RelationOptions) -> Result<bool> {
    if e.local_name().as_ref() != options.element.as_bytes() {
        return Ok(false);
    }
    let Some(required) = &options.class else {
        return Ok(true);
    };
    match e.try_get_attribute("class")? {
        Some(attr) => {
            let classes = attr.unescape_value_with(resolve_entity)?;
            Ok(classes.split_whitespace().any(|c| c == required))
        }
        None => Ok(false),
    }
}

fn attribute_label(e: &BytesStart<'_>, name: &str) -> Result<Option<String>> {
    match e.try_get_attribute(name)? {
        Some(attr) => Ok(Some(
            attr.unescape_value_with(resolve_entity)?.trim().to_string(),
        )),
        None => Ok(None),
    }
}

/// Speaker labels of every turn, in document order
pub fn speakers_in_document(bytes: &[u8], options: &RelationOptions) -> Result<Vec<String>> {
    let content = decode_lossy(bytes);
    let mut reader = Reader::from_str(&content);
    reader.config_mut().check_end_names = false;

    let element = options.element.as_bytes();
    let mut speakers = Vec::new();
    // Open turn: same-name elements nested inside it, and its label so far.
    // Void HTML elements (`<br>`) never get an end tag, so turns are closed
    // by element name rather than by depth.
    let mut open_turn: Option<(usize, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                if let Some((nested, _)) = open_turn.as_mut() {
                    if e.local_name().as_ref() == element {
                        *nested += 1;
                    }
                } else if is_turn(&e, options)? {
                    match &options.speaker {
                        SpeakerSource::Text => open_turn = Some((0, String::new())),
                        SpeakerSource::Attribute(name) => {
                            speakers.extend(attribute_label(&e, name)?);
                        }
                    }
                }
            }
            Event::Empty(e) => {
                if open_turn.is_none() && is_turn(&e, options)? {
                    match &options.speaker {
                        SpeakerSource::Text => speakers.push(String::new()),
                        SpeakerSource::Attribute(name) => {
                            speakers.extend(attribute_label(&e, name)?);
                        }
                    }
                }
            }
            Event::Text(e) => {
                if let Some((_, label)) = open_turn.as_mut() {
                    label.push_str(unescape_text(&e).trim());
                }
            }
            Event::CData(e) => {
                if let Some((_, label)) = open_turn.as_mut() {
                    label.push_str(String::from_utf8_lossy(&e).trim());
                }
            }
            Event::End(e) if e.local_name().as_ref() == element => match open_turn.take() {
                Some((0, label)) => speakers.push(label),
                Some((nested, label)) => open_turn = Some((nested - 1, label)),
                None => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    // Unclosed final turn
    speakers.extend(open_turn.map(|(_, label)| label));
    Ok(speakers)
}

/// Adjacent pairs of differing speakers: `[A, A, B, C]` gives `(A,B), (B,C)`
pub fn relations_in_sequence(speakers: &[String]) -> Vec<RelationTuple> {
    speakers
        .windows(2)
        .filter_map(|pair| RelationTuple::new(pair[0].as_str(), pair[1].as_str()))
        .collect()
}

/// Relations of one document; a parse failure yields none
pub fn relations_in_document(
    document: &SourceDocument,
    options: &RelationOptions,
) -> Vec<RelationTuple> {
    match speakers_in_document(&document.bytes, options) {
        Ok(speakers) => {
            let relations = relations_in_sequence(&speakers);
            debug!(
                document = %document.name,
                turns = speakers.len(),
                relations = relations.len(),
                "Relations extracted"
            );
            relations
        }
        Err(e) => {
            warn!(
                document = %document.name,
                error = %e,
                "Could not parse document, skipping relations"
            );
            Vec::new()
        }
    }
}

/// Pool relations across the corpus
#[instrument(skip_all, fields(documents = documents.len()))]
pub fn count_relations(documents: &[SourceDocument], options: &RelationOptions) -> RelationCounts {
    let per_document = collect_relations(documents, options);

    let mut counts = RelationCounts::new();
    for relations in per_document {
        counts.extend(relations);
    }

    info!(
        distinct = counts.len(),
        total = counts.total(),
        "Relation count complete"
    );
    counts
}

fn collect_relations(
    documents: &[SourceDocument],
    options: &RelationOptions,
) -> Vec<Vec<RelationTuple>> {
    if options.parallel {
        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            return documents
                .par_iter()
                .map(|document| relations_in_document(document, options))
                .collect();
        }
        #[cfg(not(feature = "parallel"))]
        debug!("Parallel count requested without the `parallel` feature, running sequentially");
    }

    documents
        .iter()
        .map(|document| relations_in_document(document, options))
        .collect()
}
