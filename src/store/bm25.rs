//! Tantivy BM25 full-text index
//!
//! Backs the lexical half of [`MemoryStore`](super::MemoryStore). Only the
//! document id is stored; content is indexed for matching and kept by the
//! owning store.

use parking_lot::Mutex;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, IndexRecordOption, STORED, STRING, Schema, TextFieldIndexing, TextOptions, Value};
use tantivy::{Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};

use crate::error::{HsError, Result};

/// Writer heap for a single indexing thread; tantivy's minimum.
const WRITER_HEAP_BYTES: usize = 15_000_000;

/// BM25 search index over one text field, held in RAM.
pub struct Bm25Index {
    index: Index,
    reader: IndexReader,
    writer: Mutex<IndexWriter>,
    id: Field,
    content: Field,
}

impl Bm25Index {
    pub fn open_in_memory() -> Result<Self> {
        let schema = build_schema();
        let id = field(&schema, "id")?;
        let content = field(&schema, "content")?;

        let index = Index::create_in_ram(schema);
        // Manual reload: visibility is controlled by `commit`.
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;
        let writer = index.writer_with_num_threads(1, WRITER_HEAP_BYTES)?;

        Ok(Self {
            index,
            reader,
            writer: Mutex::new(writer),
            id,
            content,
        })
    }

    /// Stage a document, replacing any earlier one with the same id.
    pub fn upsert(&self, id: &str, text: &str) -> Result<()> {
        let mut doc = TantivyDocument::new();
        doc.add_text(self.id, id);
        doc.add_text(self.content, text);

        let writer = self.writer.lock();
        writer.delete_term(Term::from_field_text(self.id, id));
        writer.add_document(doc)?;
        Ok(())
    }

    /// Commit staged changes and make them visible to searches.
    pub fn commit(&self) -> Result<()> {
        let mut writer = self.writer.lock();
        writer.commit()?;
        drop(writer);

        self.reader.reload()?;
        Ok(())
    }

    /// Match `query` against the content field, best first.
    ///
    /// Query text is parsed leniently: syntax the parser cannot handle is
    /// dropped instead of failing the request, the way a `match` query treats
    /// free text.
    pub fn search(&self, query: &str, limit: usize) -> Result<Vec<(String, f32)>> {
        if limit == 0 || query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let parser = QueryParser::for_index(&self.index, vec![self.content]);
        let (parsed, errors) = parser.parse_query_lenient(query);
        if !errors.is_empty() {
            tracing::debug!(?errors, "ignored unparseable query fragments");
        }

        let top_docs = searcher.search(&parsed, &TopDocs::with_limit(limit))?;

        let mut results = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address)?;
            let id = doc
                .get_first(self.id)
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            results.push((id, score));
        }
        Ok(results)
    }

    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

fn build_schema() -> Schema {
    let mut builder = Schema::builder();

    let text_options = TextOptions::default().set_indexing_options(
        TextFieldIndexing::default()
            .set_tokenizer("default")
            .set_index_option(IndexRecordOption::WithFreqsAndPositions),
    );

    builder.add_text_field("id", STRING | STORED);
    builder.add_text_field("content", text_options);
    builder.build()
}

fn field(schema: &Schema, name: &str) -> Result<Field> {
    schema.get_field(name).map_err(|_| {
        HsError::SearchIndex(tantivy::TantivyError::SchemaError(format!(
            "missing {name} field"
        )))
    })
}
