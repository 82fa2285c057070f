use super::*;
use crate::pages::Rendered;
use crate::test_helpers::logged_in_client;

#[tokio::test]
async fn list_reads_paged_rows_for_its_kind() {
    let (_backend, api) = logged_in_client().await;
    let mut page = KycListPage::new(KycKind::MetavetGroomer);
    page.load(&api).await;
    assert_eq!(page.list.items.len(), 2);

    page.list.query.status = Some("APPROVED".to_owned());
    let view = page.list.page().unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].display_name(), "Gus Trim");
    assert_eq!(view.total, 2);

    let mut empty = KycListPage::new(KycKind::WalkerClient);
    empty.load(&api).await;
    assert!(matches!(empty.list.render().unwrap(), Rendered::Ready(view) if view.rows.is_empty()));
}

#[tokio::test]
async fn detail_keeps_untyped_sections() {
    let (_backend, api) = logged_in_client().await;
    let mut page = KycDetailPage::new(KycKind::GroomerClient, Some("21"));
    page.load(&api).await;
    let fields = page.extra_fields();
    assert_eq!(fields.len(), 1);
    assert_eq!(fields[0].0, "pet");
    assert_eq!(fields[0].1["name"], "Rex");
}

#[tokio::test]
async fn reject_with_reason_reaches_backend() {
    let (backend, api) = logged_in_client().await;
    let mut page = KycDetailPage::new(KycKind::MetavetGroomer, Some("11"));
    page.load(&api).await;

    let status = page.decide(&api, Decision::Reject, Some("  blurry certificate ".to_owned())).await.unwrap();
    assert_eq!(status, ReviewStatus::Rejected);
    let record = page.detail.record.as_ref().unwrap();
    assert_eq!(record.rejection_reason.as_deref(), Some("blurry certificate"));

    let state = backend.lock();
    let (target, body) = state.status_updates.last().unwrap();
    assert_eq!(target, "kyc/metavet/groomer/11");
    assert_eq!(body["reason"], "blurry certificate");
}

#[tokio::test]
async fn unknown_submission_renders_error() {
    let (_backend, api) = logged_in_client().await;
    let mut page = KycDetailPage::new(KycKind::MetavetWalker, Some("99"));
    page.load(&api).await;
    assert_eq!(page.detail.render(), Rendered::Error("KYC submission not found".to_owned()));
    assert_eq!(page.decide(&api, Decision::Approve, None).await.unwrap_err(), ViewError::NotLoaded);
}

#[tokio::test]
async fn downloads_document_bytes() {
    let (_backend, api) = logged_in_client().await;
    let mut page = KycDetailPage::new(KycKind::MetavetGroomer, Some("11"));
    assert_eq!(page.download_document(&api, "certificate").await.unwrap_err(), ViewError::NotLoaded);

    page.load(&api).await;
    let document = page.download_document(&api, "certificate").await.unwrap();
    assert_eq!(document.content_type.as_deref(), Some("application/pdf"));
    assert!(document.bytes.starts_with(b"%PDF"));

    let err = page.download_document(&api, "insurance").await.unwrap_err();
    assert_eq!(err, ViewError::Failed("Document not found".to_owned()));
    assert!(!page.downloads.is_busy());
}
