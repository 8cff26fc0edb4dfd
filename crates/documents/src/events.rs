//! Document events and their payload schemas.
//!
//! Every payload is an object `{ type, aggregate_id, ... }`.

use strata_codec::{DecodeResult, FieldWriter, Fields, Schema, schema};
use strata_core::Id;
use strata_events::{CreationEvent, Event, Registration, TransformationEvent};

use crate::document::{Document, DocumentId, DocumentStatus};

/// Every document event, for building a [`strata_events::SchemaRegistry`].
pub fn registrations() -> Vec<Registration> {
    vec![
        Registration::creation(DocumentCreated::TYPE, DocumentCreated::schema()),
        Registration::transformation(DocumentContentUpdated::TYPE, DocumentContentUpdated::schema()),
        Registration::transformation(DocumentEmbedded::TYPE, DocumentEmbedded::schema()),
        Registration::transformation(
            DocumentEmbeddingFailed::TYPE,
            DocumentEmbeddingFailed::schema(),
        ),
    ]
}

fn read_header(r: &Fields<'_>, tag: &'static str) -> DecodeResult<DocumentId> {
    r.field("type", &schema::literal(tag))?;
    r.field("aggregate_id", &Id::schema())
}

fn write_header(w: &mut FieldWriter, tag: &'static str, id: &DocumentId) {
    w.field("type", &schema::literal(tag), &tag)
        .field("aggregate_id", &Id::schema(), id);
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentCreated {
    pub aggregate_id: DocumentId,
    pub content: String,
}

impl DocumentCreated {
    pub const TYPE: &'static str = "DocumentCreated";

    pub fn schema() -> Schema<Self> {
        schema::record(
            |r| {
                Ok(Self {
                    aggregate_id: read_header(r, Self::TYPE)?,
                    content: r.field("content", &schema::string())?,
                })
            },
            |w, e: &Self| {
                write_header(w, Self::TYPE, &e.aggregate_id);
                w.field("content", &schema::string(), &e.content);
            },
        )
    }
}

impl Event for DocumentCreated {
    type Aggregate = Document;

    fn event_type(&self) -> &'static str {
        Self::TYPE
    }

    fn aggregate_id(&self) -> &DocumentId {
        &self.aggregate_id
    }
}

impl CreationEvent for DocumentCreated {
    fn create_aggregate(&self) -> Document {
        Document::new(self.aggregate_id.clone(), self.content.clone())
    }
}

/// New content invalidates any previous embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentContentUpdated {
    pub aggregate_id: DocumentId,
    pub content: String,
}

impl DocumentContentUpdated {
    pub const TYPE: &'static str = "DocumentContentUpdated";

    pub fn schema() -> Schema<Self> {
        schema::record(
            |r| {
                Ok(Self {
                    aggregate_id: read_header(r, Self::TYPE)?,
                    content: r.field("content", &schema::string())?,
                })
            },
            |w, e: &Self| {
                write_header(w, Self::TYPE, &e.aggregate_id);
                w.field("content", &schema::string(), &e.content);
            },
        )
    }
}

impl Event for DocumentContentUpdated {
    type Aggregate = Document;

    fn event_type(&self) -> &'static str {
        Self::TYPE
    }

    fn aggregate_id(&self) -> &DocumentId {
        &self.aggregate_id
    }
}

impl TransformationEvent for DocumentContentUpdated {
    fn transform_aggregate(&self, document: Document) -> Document {
        Document {
            content: self.content.clone(),
            status: DocumentStatus::Pending,
            embedding: None,
            error: None,
            ..document.next()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEmbedded {
    pub aggregate_id: DocumentId,
    pub embedding: Vec<f64>,
    pub metadata: Option<String>,
}

impl DocumentEmbedded {
    pub const TYPE: &'static str = "DocumentEmbedded";

    pub fn schema() -> Schema<Self> {
        schema::record(
            |r| {
                Ok(Self {
                    aggregate_id: read_header(r, Self::TYPE)?,
                    embedding: r.field("embedding", &schema::array(schema::number()))?,
                    metadata: r.field("metadata", &schema::maybe(schema::string()))?,
                })
            },
            |w, e: &Self| {
                write_header(w, Self::TYPE, &e.aggregate_id);
                w.field("embedding", &schema::array(schema::number()), &e.embedding)
                    .field("metadata", &schema::maybe(schema::string()), &e.metadata);
            },
        )
    }
}

impl Event for DocumentEmbedded {
    type Aggregate = Document;

    fn event_type(&self) -> &'static str {
        Self::TYPE
    }

    fn aggregate_id(&self) -> &DocumentId {
        &self.aggregate_id
    }
}

impl TransformationEvent for DocumentEmbedded {
    fn transform_aggregate(&self, document: Document) -> Document {
        Document {
            status: DocumentStatus::Embedded,
            embedding: Some(self.embedding.clone()),
            metadata: self.metadata.clone(),
            error: None,
            ..document.next()
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEmbeddingFailed {
    pub aggregate_id: DocumentId,
    pub error: String,
}

impl DocumentEmbeddingFailed {
    pub const TYPE: &'static str = "DocumentEmbeddingFailed";

    pub fn schema() -> Schema<Self> {
        schema::record(
            |r| {
                Ok(Self {
                    aggregate_id: read_header(r, Self::TYPE)?,
                    error: r.field("error", &schema::string())?,
                })
            },
            |w, e: &Self| {
                write_header(w, Self::TYPE, &e.aggregate_id);
                w.field("error", &schema::string(), &e.error);
            },
        )
    }
}

impl Event for DocumentEmbeddingFailed {
    type Aggregate = Document;

    fn event_type(&self) -> &'static str {
        Self::TYPE
    }

    fn aggregate_id(&self) -> &DocumentId {
        &self.aggregate_id
    }
}

impl TransformationEvent for DocumentEmbeddingFailed {
    fn transform_aggregate(&self, document: Document) -> Document {
        Document {
            status: DocumentStatus::Failed,
            embedding: None,
            error: Some(self.error.clone()),
            ..document.next()
        }
    }
}
