use strata_codec::{Schema, schema};
use strata_core::{Aggregate, Id};

pub type DocumentId = Id<Document>;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DocumentStatus {
    Pending,
    Embedded,
    Failed,
}

impl DocumentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Embedded => "Embedded",
            DocumentStatus::Failed => "Failed",
        }
    }

    /// One literal per status, combined as an ordered union.
    pub fn schema() -> Schema<DocumentStatus> {
        let alternatives: Vec<Schema<DocumentStatus>> =
            [DocumentStatus::Pending, DocumentStatus::Embedded, DocumentStatus::Failed]
                .into_iter()
                .map(Self::literal)
                .collect();
        schema::one_of(|status: &DocumentStatus| Self::literal(*status), alternatives)
    }

    fn literal(status: DocumentStatus) -> Schema<DocumentStatus> {
        schema::literal(status.as_str()).dimap(move |_| status, |s: &DocumentStatus| s.as_str())
    }
}

impl core::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub(crate) id: DocumentId,
    pub(crate) version: u64,
    pub content: String,
    pub status: DocumentStatus,
    pub embedding: Option<Vec<f64>>,
    pub metadata: Option<String>,
    pub error: Option<String>,
}

impl Document {
    /// A freshly created, not yet embedded document at version 1.
    pub fn new(id: DocumentId, content: impl Into<String>) -> Self {
        Self {
            id,
            version: 1,
            content: content.into(),
            status: DocumentStatus::Pending,
            embedding: None,
            metadata: None,
            error: None,
        }
    }

    /// The same document one version later.
    pub(crate) fn next(self) -> Self {
        Self {
            version: self.version + 1,
            ..self
        }
    }

    pub fn data(&self) -> DocumentData {
        DocumentData {
            id: self.id.clone(),
            content: self.content.clone(),
            status: self.status,
            embedding: self.embedding.clone(),
            metadata: self.metadata.clone(),
            error: self.error.clone(),
        }
    }
}

impl Aggregate for Document {
    const KIND: &'static str = "Document";

    fn id(&self) -> &DocumentId {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Version-less view of a document, as served to clients.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentData {
    pub id: DocumentId,
    pub content: String,
    pub status: DocumentStatus,
    pub embedding: Option<Vec<f64>>,
    pub metadata: Option<String>,
    pub error: Option<String>,
}

impl DocumentData {
    pub fn schema() -> Schema<DocumentData> {
        let id = DocumentId::schema();
        let status = DocumentStatus::schema();
        let embedding = schema::nullable(schema::array(schema::number()));
        let text = schema::nullable(schema::string());

        let (r_id, r_status, r_embedding, r_text) =
            (id.clone(), status.clone(), embedding.clone(), text.clone());
        schema::record(
            move |r| {
                Ok(DocumentData {
                    id: r.field("id", &r_id)?,
                    content: r.field("content", &schema::string())?,
                    status: r.field("status", &r_status)?,
                    embedding: r.field("embedding", &r_embedding)?,
                    metadata: r.field("metadata", &r_text)?,
                    error: r.field("error", &r_text)?,
                })
            },
            move |w, data: &DocumentData| {
                w.field("id", &id, &data.id)
                    .field("content", &schema::string(), &data.content)
                    .field("status", &status, &data.status)
                    .field("embedding", &embedding, &data.embedding)
                    .field("metadata", &text, &data.metadata)
                    .field("error", &text, &data.error);
            },
        )
    }
}
