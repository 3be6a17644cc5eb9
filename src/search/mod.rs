//! Tantivy-based search index module.
//!
//! Provides full-text search over active listings with field boosting and an
//! exact-match category facet filter.

use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::{BooleanQuery, BoostQuery, Occur, Query, QueryParser, TermQuery};
use tantivy::schema::{Field, IndexRecordOption, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term};
use tokio::sync::RwLock;

use crate::errors::AppError;
use crate::models::Listing;

/// Field boost values matching frontend weights.
const BOOST_NAME: f32 = 10.0;
const BOOST_CATEGORY: f32 = 7.0;
const BOOST_DESCRIPTION: f32 = 5.0;

/// Search result with listing id and relevance score.
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub listing_id: String,
    pub score: f32,
}

/// Search index schema fields.
struct SearchFields {
    listing_id: Field,
    name: Field,
    category: Field,
    category_facet: Field,
    description: Field,
}

/// Tantivy search index for listings.
pub struct SearchIndex {
    index: Index,
    reader: IndexReader,
    writer: Arc<RwLock<IndexWriter>>,
    fields: SearchFields,
}

impl SearchIndex {
    /// Create or open a search index at the specified path.
    pub fn open(index_path: &Path) -> Result<Self, AppError> {
        std::fs::create_dir_all(index_path)
            .map_err(|e| AppError::Search(format!("Failed to create index directory: {}", e)))?;

        // Define schema. `category_facet` is the raw (untokenized) copy used
        // for exact filtering; `category` is tokenized for free-text matches.
        let mut schema_builder = Schema::builder();
        let listing_id = schema_builder.add_text_field("listing_id", STRING | STORED);
        let name = schema_builder.add_text_field("name", TEXT | STORED);
        let category = schema_builder.add_text_field("category", TEXT);
        let category_facet = schema_builder.add_text_field("category_facet", STRING);
        let description = schema_builder.add_text_field("description", TEXT);
        let schema = schema_builder.build();

        let fields = SearchFields {
            listing_id,
            name,
            category,
            category_facet,
            description,
        };

        // Try to open existing index or create new one
        let index = Index::open_in_dir(index_path)
            .or_else(|_| Index::create_in_dir(index_path, schema.clone()))
            .map_err(|e| AppError::Search(format!("Failed to open/create index: {}", e)))?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()
            .map_err(|e| AppError::Search(format!("Failed to create reader: {}", e)))?;

        let writer = index
            .writer(50_000_000) // 50MB buffer
            .map_err(|e| AppError::Search(format!("Failed to create writer: {}", e)))?;

        Ok(Self {
            index,
            reader,
            writer: Arc::new(RwLock::new(writer)),
            fields,
        })
    }

    /// Rebuild the entire index. Only active listings are indexed; pending,
    /// suspended, and trashed entries are invisible to search.
    pub async fn rebuild(&self, listings: &[Listing]) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        // Clear existing index
        writer.delete_all_documents()?;

        for listing in listings.iter().filter(|l| l.is_active()) {
            let doc = self.create_document(listing);
            writer.add_document(doc)?;
        }

        writer.commit()?;

        // Reload reader to see new documents
        self.reader.reload()?;

        tracing::info!("Search index rebuilt");
        Ok(())
    }

    /// Index a single listing, replacing any prior document. A listing that
    /// is no longer active is simply removed.
    pub async fn index_listing(&self, listing: &Listing) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = Term::from_field_text(self.fields.listing_id, &listing.id);
        writer.delete_term(term);

        if listing.is_active() {
            let doc = self.create_document(listing);
            writer.add_document(doc)?;
        }
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Remove a listing from the index.
    pub async fn remove_listing(&self, listing_id: &str) -> Result<(), AppError> {
        let mut writer = self.writer.write().await;

        let term = Term::from_field_text(self.fields.listing_id, listing_id);
        writer.delete_term(term);
        writer.commit()?;

        self.reader.reload()?;

        Ok(())
    }

    /// Search for listings matching the free-text query and/or category.
    ///
    /// Results come back in tantivy relevance order; the sync engine discards
    /// that order in favor of its master order, so no ordering contract is
    /// promised here beyond "most relevant first".
    pub fn search(
        &self,
        query_str: &str,
        category: Option<&str>,
        limit: usize,
    ) -> Result<Vec<SearchResult>, AppError> {
        let query_str = query_str.trim();
        let category = category.map(str::trim).filter(|c| !c.is_empty());

        if query_str.is_empty() && category.is_none() {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let mut subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();

        if !query_str.is_empty() {
            // Field-specific boosted queries combined with OR semantics
            let field_queries = [
                (self.fields.name, BOOST_NAME),
                (self.fields.category, BOOST_CATEGORY),
                (self.fields.description, BOOST_DESCRIPTION),
            ];

            let mut text_subqueries: Vec<(Occur, Box<dyn Query>)> = Vec::new();
            for (field, boost) in field_queries {
                let field_parser = QueryParser::for_index(&self.index, vec![field]);
                if let Ok(field_query) = field_parser.parse_query(query_str) {
                    let boosted = BoostQuery::new(field_query, boost);
                    text_subqueries.push((Occur::Should, Box::new(boosted)));
                }
            }

            if text_subqueries.is_empty() {
                return Err(AppError::Search(format!(
                    "Invalid search query: {}",
                    query_str
                )));
            }
            subqueries.push((Occur::Must, Box::new(BooleanQuery::new(text_subqueries))));
        }

        if let Some(cat) = category {
            let term = Term::from_field_text(self.fields.category_facet, cat);
            let term_query = TermQuery::new(term, IndexRecordOption::Basic);
            subqueries.push((Occur::Must, Box::new(term_query)));
        }

        let combined_query = BooleanQuery::new(subqueries);

        let top_docs = searcher
            .search(&combined_query, &TopDocs::with_limit(limit))
            .map_err(|e| AppError::Search(format!("Search failed: {}", e)))?;

        let results: Vec<SearchResult> = top_docs
            .into_iter()
            .filter_map(|(score, doc_address)| {
                let doc: TantivyDocument = searcher.doc(doc_address).ok()?;
                let listing_id = doc
                    .get_first(self.fields.listing_id)?
                    .as_str()?
                    .to_string();
                Some(SearchResult { listing_id, score })
            })
            .collect();

        Ok(results)
    }

    /// Create a Tantivy document from a listing.
    fn create_document(&self, listing: &Listing) -> TantivyDocument {
        doc!(
            self.fields.listing_id => listing.id.clone(),
            self.fields.name => listing.name.clone(),
            self.fields.category => listing.category.clone(),
            self.fields.category_facet => listing.category.clone(),
            self.fields.description => listing.description.clone().unwrap_or_default()
        )
    }
}
