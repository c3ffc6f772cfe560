mod common;

use assert_matches::assert_matches;
use common::{docx_bytes, rig, staged_file_count, KeywordEmbedder};
use rag_mcp::{DocumentFormat, DocumentService, ErrorKind, RagError, SearchQuery, VectorRepository};

#[tokio::test]
async fn test_plain_text_round_trip() {
    let rig = rig();
    let text = "apple pie\nwith banana, ünïcode and trailing space ";

    let receipt = rig.service.ingest_document("notes.txt", text.as_bytes().to_vec()).await.unwrap();

    assert_eq!(receipt.id, "notes.txt");
    assert_eq!(receipt.format, DocumentFormat::Txt);
    assert_eq!(receipt.characters, text.chars().count());
    let stored = rig.store.get("notes.txt").await.expect("record stored");
    assert_eq!(stored.text, text);
    assert_eq!(stored.vector, KeywordEmbedder::vector_for(text));
    assert_eq!(staged_file_count(rig.staging.path()), 0);
}

#[tokio::test]
async fn test_reingesting_a_name_keeps_one_record() {
    let rig = rig();
    rig.service.ingest_document("doc.txt", b"apple".to_vec()).await.unwrap();
    rig.service.ingest_document("doc.txt", b"cherry cherry".to_vec()).await.unwrap();

    assert_eq!(rig.store.count().await.unwrap(), 1);
    let stored = rig.store.get("doc.txt").await.unwrap();
    assert_eq!(stored.text, "cherry cherry");

    let results = rig
        .service
        .query_documents(SearchQuery { text: "cherry".to_string(), top_k: Some(5) })
        .await
        .unwrap();
    assert_eq!(results.len(), 1);
    assert!(results[0].distance.abs() < 1e-6);
}

#[tokio::test]
async fn test_unsupported_extension_leaves_no_trace() {
    let rig = rig();
    rig.service.ingest_document("kept.txt", b"apple".to_vec()).await.unwrap();

    let result = rig.service.ingest_document("report.xyz", b"apple banana".to_vec()).await;

    let err = result.unwrap_err();
    assert_matches!(&err, RagError::UnsupportedFormat { extension } if extension == "xyz");
    assert_eq!(err.kind(), ErrorKind::UnsupportedFormat);
    assert!(err.is_caller_error());
    assert_eq!(rig.store.count().await.unwrap(), 1);
    assert_eq!(staged_file_count(rig.staging.path()), 0);
}

#[tokio::test]
async fn test_corrupt_pdf_is_an_extraction_error() {
    let rig = rig();

    let result = rig.service.ingest_document("broken.pdf", b"definitely not a pdf".to_vec()).await;

    assert_matches!(result, Err(RagError::Extraction { ref name, .. }) if name == "broken.pdf");
    assert_eq!(rig.store.count().await.unwrap(), 0);
    assert_eq!(staged_file_count(rig.staging.path()), 0);
}

#[tokio::test]
async fn test_docx_paragraphs_are_extracted() {
    let rig = rig();
    let bytes = docx_bytes(&["Apple harvest", "Banana split"]);

    let receipt = rig.service.ingest_document("Fruit.DOCX", bytes).await.unwrap();

    assert_eq!(receipt.format, DocumentFormat::Docx);
    let stored = rig.store.get("Fruit.DOCX").await.unwrap();
    assert_eq!(stored.text, "Apple harvest\nBanana split");
}

#[tokio::test]
async fn test_empty_document_is_stored() {
    let rig = rig();

    let receipt = rig.service.ingest_document("empty.txt", Vec::new()).await.unwrap();

    assert_eq!(receipt.characters, 0);
    let stored = rig.store.get("empty.txt").await.unwrap();
    assert_eq!(stored.text, "");
    assert_eq!(stored.vector.len(), rig.store.dimension());
}

#[tokio::test]
async fn test_failed_ingestion_does_not_affect_concurrent_one() {
    let rig = rig();

    let (bad, good) = tokio::join!(
        rig.service.ingest_document("a.pdf", b"garbage".to_vec()),
        rig.service.ingest_document("b.txt", b"banana bread".to_vec()),
    );

    assert_matches!(bad, Err(RagError::Extraction { .. }));
    assert_eq!(good.unwrap().id, "b.txt");
    assert_eq!(rig.store.count().await.unwrap(), 1);
    assert!(rig.store.get("a.pdf").await.is_none());
    assert_eq!(rig.store.get("b.txt").await.unwrap().text, "banana bread");
    assert_eq!(staged_file_count(rig.staging.path()), 0);
}
