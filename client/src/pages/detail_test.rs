use super::*;
use serde_json::json;

fn pending_doctor() -> Doctor {
    serde_json::from_value(json!({ "doctorId": 1, "status": "PENDING" })).unwrap()
}

fn loaded() -> DetailState<Doctor> {
    let mut state = DetailState::from_route(Some("1"));
    let id = state.begin_load().unwrap();
    assert_eq!(id, "1");
    state.finish_load(Ok(pending_doctor()));
    state
}

#[test]
fn missing_route_param_renders_loading_and_skips_fetch() {
    for param in [None, Some(""), Some("   ")] {
        let mut state = DetailState::<Doctor>::from_route(param);
        assert_eq!(state.begin_load(), None);
        assert!(state.render().is_loading());
        assert!(!state.loading);
    }
}

#[test]
fn render_tracks_load_lifecycle() {
    let mut state = DetailState::<Doctor>::from_route(Some("1"));
    assert!(state.render().is_loading());
    state.begin_load();
    assert!(state.render().is_loading());
    state.finish_load(Err(ApiError::Status { status: 404, body: json!({ "message": "Doctor not found" }) }));
    assert_eq!(state.render(), Rendered::Error("Doctor not found".to_owned()));

    let state = loaded();
    assert!(matches!(state.render(), Rendered::Ready(doctor) if doctor.doctor_id == "1"));
}

#[test]
fn review_requires_loaded_record() {
    let mut state = DetailState::<Doctor>::from_route(Some("1"));
    assert_eq!(state.begin_review(Decision::Approve, None).unwrap_err(), ViewError::NotLoaded);
    assert!(!state.can_review());
}

#[test]
fn review_disables_controls_while_in_flight() {
    let mut state = loaded();
    assert!(state.can_review());
    let pending = state.begin_review(Decision::Approve, None).unwrap();
    assert!(!state.can_review());
    assert_eq!(state.begin_review(Decision::Reject, None).unwrap_err(), ViewError::Busy { running: "approve" });

    let status = state.finish_review(pending, Ok(json!({ "status": "APPROVED" }))).unwrap();
    assert_eq!(status, ReviewStatus::Approved);
    assert_eq!(state.record.as_ref().unwrap().status, ReviewStatus::Approved);
    assert!(state.can_review());
}

#[test]
fn reject_carries_trimmed_reason_and_merges_it() {
    let mut state = loaded();
    let pending = state.begin_review(Decision::Reject, Some("  licence expired ".to_owned())).unwrap();
    assert_eq!(pending.update, StatusUpdate { status: ReviewStatus::Rejected, reason: Some("licence expired".to_owned()) });
    assert_eq!(pending.record_id, "1");
    state.finish_review(pending, Ok(Value::Null)).unwrap();
    let doctor = state.record.as_ref().unwrap();
    assert_eq!(doctor.status, ReviewStatus::Rejected);
    assert_eq!(doctor.rejection_reason.as_deref(), Some("licence expired"));
}

#[test]
fn approve_drops_reason() {
    let mut state = loaded();
    let pending = state.begin_review(Decision::Approve, Some("n/a".to_owned())).unwrap();
    assert_eq!(pending.update.reason, None);
    let _ = state.finish_review(pending, Ok(Value::Null));
}

#[test]
fn failed_review_leaves_record_unchanged() {
    let mut state = loaded();
    let pending = state.begin_review(Decision::Approve, None).unwrap();
    let err = state
        .finish_review(pending, Err(ApiError::Status { status: 500, body: json!({ "message": "Status service unavailable" }) }))
        .unwrap_err();
    assert_eq!(err, ViewError::Failed("Status service unavailable".to_owned()));
    assert_eq!(state.record.as_ref().unwrap().status, ReviewStatus::Pending);
    assert_eq!(state.gate.error.as_deref(), Some("Status service unavailable"));
    assert!(state.can_review());
}

#[test]
fn edit_requires_loaded_record() {
    let mut state = DetailState::<Doctor>::from_route(Some("1"));
    assert_eq!(state.begin_edit(Map::new()).unwrap_err(), ViewError::NotLoaded);
}

#[test]
fn edit_and_review_share_the_gate() {
    let mut state = loaded();
    let pending = state.begin_edit(Map::new()).unwrap();
    assert_eq!(state.begin_review(Decision::Approve, None).unwrap_err(), ViewError::Busy { running: "edit" });
    state.finish_edit(pending, Ok(Value::Null)).unwrap();
    assert!(state.can_review());
}

#[test]
fn edit_merges_changes_then_backend_echo() {
    let mut state = loaded();
    let mut changes = Map::new();
    changes.insert("clinicName".to_owned(), json!("East Paws"));
    changes.insert("consultationFee".to_owned(), json!(55.0));
    let pending = state.begin_edit(changes).unwrap();
    assert_eq!(pending.record_id, "1");

    let echoed = json!({ "doctorId": 1, "consultationFee": "57.5", "updatedBy": "admin" });
    state.finish_edit(pending, Ok(echoed)).unwrap();
    let doctor = state.record.as_ref().unwrap();
    assert_eq!(doctor.clinic_name.as_deref(), Some("East Paws"));
    assert_eq!(doctor.consultation_fee, Some(57.5));
    assert_eq!(doctor.status, ReviewStatus::Pending);
    assert_eq!(doctor.extra["updatedBy"], json!("admin"));
}

#[test]
fn failed_edit_leaves_record_unchanged() {
    let mut state = loaded();
    let mut changes = Map::new();
    changes.insert("clinicName".to_owned(), json!("East Paws"));
    let pending = state.begin_edit(changes).unwrap();
    let error = ApiError::Status { status: 409, body: json!({ "message": "Licence already registered" }) };
    assert_eq!(
        state.finish_edit(pending, Err(error)).unwrap_err(),
        ViewError::Failed("Licence already registered".to_owned())
    );
    assert_eq!(state.record.as_ref().unwrap().clinic_name, None);
    assert_eq!(state.gate.error.as_deref(), Some("Licence already registered"));
}
