use super::*;
use crate::pages::Rendered;
use crate::test_helpers::logged_in_client;

#[tokio::test]
async fn list_filters_by_account_status_and_role_fallback() {
    let (_backend, api) = logged_in_client().await;
    let mut page = UserListPage::default();
    page.load(&api).await;
    assert_eq!(page.list.items.len(), 3);

    page.list.query.status = Some("disabled".to_owned());
    let view = page.list.page().unwrap();
    assert_eq!(view.rows.len(), 1);
    assert_eq!(view.rows[0].role(), Some("BEHAVIOURIST"));

    page.list.query.status = None;
    page.list.query.search = "walker".to_owned();
    assert_eq!(page.list.page().unwrap().matched, 1);

    page.list.query.search.clear();
    page.list.query.sort = Some("role".to_owned());
    let roles: Vec<_> = page.list.page().unwrap().rows.iter().map(|user| user.role()).collect();
    assert_eq!(roles, [Some("ADMIN"), Some("BEHAVIOURIST"), Some("WALKER")]);
}

#[tokio::test]
async fn disable_then_enable_round_trips_through_backend() {
    let (backend, api) = logged_in_client().await;
    let mut page = UserProfilePage::new(Some("2"));
    assert_eq!(page.set_enabled(&api, false).await.unwrap_err(), ViewError::NotLoaded);

    page.load(&api).await;
    assert!(matches!(page.detail.render(), Rendered::Ready(user) if user.enabled));

    assert!(!page.set_enabled(&api, false).await.unwrap());
    assert!(!page.detail.record.as_ref().unwrap().enabled);
    assert!(page.set_enabled(&api, true).await.unwrap());

    let state = backend.lock();
    let targets: Vec<_> =
        state.status_updates.iter().map(|(target, body)| (target.as_str(), body["enabled"].clone())).collect();
    assert_eq!(targets, [("user/2", Value::Bool(false)), ("user/2", Value::Bool(true))]);
}

#[tokio::test]
async fn failed_toggle_keeps_account_state() {
    let (backend, api) = logged_in_client().await;
    backend.lock().fail_status_updates = true;
    let mut page = UserProfilePage::new(Some("2"));
    page.load(&api).await;

    let err = page.set_enabled(&api, false).await.unwrap_err();
    assert_eq!(err, ViewError::Failed("Account service unavailable".to_owned()));
    assert!(page.detail.record.as_ref().unwrap().enabled);
    assert!(!page.detail.gate.is_busy());
}

#[test]
fn status_label_follows_enabled_flag() {
    let user: User = serde_json::from_value(serde_json::json!({ "id": "u-1" })).unwrap();
    assert_eq!(account_status(&user), DISABLED);
    assert_eq!(user.status_label().as_deref(), Some(DISABLED));
}

#[test]
fn changes_normalise_role_and_clear_blank_phone() {
    let changes = UserChanges {
        phone: Some(" ".to_owned()),
        role: Some("walker".to_owned()),
        ..UserChanges::default()
    };
    assert!(changes.validate().is_empty());
    assert_eq!(Value::Object(changes.body()), serde_json::json!({ "phone": null, "role": "WALKER" }));
}

#[test]
fn changes_validation_flags_each_bad_field() {
    let errors = UserChanges {
        email: Some("walt@".to_owned()),
        role: Some("ROOT".to_owned()),
        last_name: Some("  ".to_owned()),
        ..UserChanges::default()
    }
    .validate();
    assert_eq!(errors.get("email"), Some("Enter a valid email address."));
    assert_eq!(errors.get("role"), Some("Choose a valid role."));
    assert_eq!(errors.get("lastName"), Some("This field is required."));
    assert_eq!(UserChanges::default().validate().get("changes"), Some("Nothing to update."));
}

#[tokio::test]
async fn update_saves_account_and_merges_echo() {
    let (backend, api) = logged_in_client().await;
    let mut page = UserProfilePage::new(Some("2"));
    page.load(&api).await;

    let changes = UserChanges { first_name: Some("Walter".to_owned()), ..UserChanges::default() };
    page.update(&api, &changes).await.unwrap();
    let user = page.detail.record.as_ref().unwrap();
    assert_eq!(user.display_name(), "Walter Walker");
    assert_eq!(user.id, "2");
    assert!(user.enabled);

    let state = backend.lock();
    assert_eq!(state.edits, vec![("user/2".to_owned(), serde_json::json!({ "firstName": "Walter" }))]);
}

#[tokio::test]
async fn conflicting_update_keeps_account_and_reports_message() {
    let (_backend, api) = logged_in_client().await;
    let mut page = UserProfilePage::new(Some("2"));
    page.load(&api).await;

    let changes = UserChanges { email: Some("bea@pets.test".to_owned()), ..UserChanges::default() };
    let err = page.update(&api, &changes).await.unwrap_err();
    assert_eq!(err, ViewError::Failed("Email already in use".to_owned()));
    assert_eq!(page.detail.record.as_ref().unwrap().email.as_deref(), Some("walt@walk.test"));
    assert_eq!(page.detail.gate.error.as_deref(), Some("Email already in use"));
}
