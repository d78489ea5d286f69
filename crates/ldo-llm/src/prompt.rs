//! Prompt templates for extraction and summarization calls

/// User message for one segment extraction call
pub fn extraction_prompt(schema_json: &str, segment_context: &str) -> String {
    format!("\"table_structure\":{}\nchunk:{}", schema_json, segment_context)
}

/// User message for the document summarization call
pub fn summary_prompt(schema_json: &str, document_context: &str) -> String {
    format!("Table description{}\n Text: {}", schema_json, document_context)
}

/// System message for segment extraction
pub const EXTRACTION_SYSTEM_PROMPT: &str = r#"You extract table rows from one chunk of a larger document.
Other workers process the remaining chunks in parallel and every answer is merged into a single array.

You receive:
- "table_structure": a JSON description of the target table (column names, types, sizes, nullability, autoIncrement)
- "chunk": a fragment of the document, optionally preceded by its metadata

Rules:
- Only extract data that is explicitly present in the chunk. Never complete partial words or numbers and never use outside knowledge.
- Never fill auto-increment columns or primary keys. Never fill created_at, updated_at or deleted_at.
- Only emit complete rows: every non-nullable column must be present.
- Booleans are true or false. Text columns are strings within their declared size. Numbers are JSON numbers. Dates are "YYYY-MM-DD" strings.
- Field names must be exactly the column names; keep the column order of the table.
- The schema may be written in another language than the text. Match fields by meaning.

Output format (JSON array only, no additional text):
[{"column_a": 1, "column_b": "value"}]

If the chunk has nothing that fits the table, return an empty array: []
Return ONLY valid JSON, no markdown code blocks, no explanations."#;

/// System message for document summarization
pub const SUMMARY_SYSTEM_PROMPT: &str = concat!(
    r#"You summarize a document before it is parsed into a database table, and decide whether it belongs to that table.

You receive a description of the target table and the full text of the document.

Rules:
- Answer with one or two plain paragraphs in English, without markdown and without copying the table description.
- Describe how the document is organized (tables, lists, sections) and name the fields that match the table.
- End with one sentence stating the core content of the document.
- The table description may be written in another language than the text. Match fields by meaning.

If the text is empty, or contains nothing related to the table description, answer with the single word "#,
    "INVALID_PARSING",
    r#" and nothing else. Never reject a document that does contain related data."#
);
