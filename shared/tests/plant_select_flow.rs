use crux_core::testing::AppTester;
use crux_http::protocol::{HttpResponse, HttpResult};
use shared::capabilities::{FetchError, FontOutput};
use shared::model::{EnvironmentKey, Plant, RemoteEnvironment, SessionId};
use shared::{AppConfig, Effect, Event, Model, Phase, ViewState};

type Tester = AppTester<shared::App, Effect>;

fn plants(ids: std::ops::Range<u32>, env: &str) -> Vec<Plant> {
    ids.map(|id| {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": format!("Planta {id}"),
            "photo": format!("https://cdn.example.com/{id}.svg"),
            "environments": [env],
            "frequency": { "times": 2, "repeat_every": "week" }
        }))
        .unwrap()
    })
    .collect()
}

fn remote_environments() -> Vec<RemoteEnvironment> {
    serde_json::from_str(
        r#"[{"key": "living_room", "title": "Sala"},
            {"key": "kitchen", "title": "Cozinha"}]"#,
    )
    .unwrap()
}

fn http_urls(effects: &[Effect]) -> Vec<String> {
    effects
        .iter()
        .filter_map(|e| match e {
            Effect::Http(req) => Some(req.operation.url.clone()),
            _ => None,
        })
        .collect()
}

/// Walks onboarding and mounts the catalog. Returns the mount effects.
fn open_catalog(app: &Tester, model: &mut Model) -> Vec<Effect> {
    app.update(
        Event::AppStarted {
            config: AppConfig::default(),
        },
        model,
    );
    app.update(Event::FontsResolved(Box::new(Ok(FontOutput::Loaded))), model);
    app.update(Event::StartRequested, model);
    app.update(Event::UserNameChanged { name: "Ana".into() }, model);
    app.update(Event::UserNameSubmitted, model);
    app.update(Event::ConfirmationAcknowledged, model).effects
}

fn session(model: &Model) -> SessionId {
    model.screen.catalog().expect("catalog mounted").session()
}

fn deliver_page(app: &Tester, model: &mut Model, page: u32, batch: Vec<Plant>) {
    let session = session(model);
    app.update(
        Event::PlantsPageFetched {
            session,
            page,
            result: Box::new(Ok(Some(batch))),
        },
        model,
    );
}

/// Answers the outstanding page-1 request the way a shell would and feeds the
/// resulting events back into the app.
fn resolve_first_page(app: &Tester, model: &mut Model, effects: &mut [Effect], answer: HttpResult) {
    let request = effects
        .iter_mut()
        .find_map(|e| match e {
            Effect::Http(req) if req.operation.url.contains("_page=1") => Some(req),
            _ => None,
        })
        .expect("page 1 request");
    let update = app.resolve(request, answer).expect("request resolves");
    for event in update.events {
        app.update(event, model);
    }
}

#[test]
fn mount_requests_environments_and_first_page() {
    let app = Tester::default();
    let mut model = Model::default();

    let effects = open_catalog(&app, &mut model);
    let urls = http_urls(&effects);
    assert_eq!(
        urls,
        vec![
            "http://localhost:3333/plants_environments?_sort=title&order=asc".to_string(),
            "http://localhost:3333/plants?_sort=name&order=asc&_page=1&_limit=8".to_string(),
        ]
    );
    assert!(matches!(app.view(&model).state, ViewState::Loading { .. }));
}

#[test]
fn first_page_and_environments_fill_the_screen() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let session = session(&model);

    app.update(
        Event::EnvironmentsFetched {
            session,
            result: Box::new(Ok(remote_environments())),
        },
        &mut model,
    );
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    let ViewState::PlantSelect {
        header,
        environments,
        plants,
        is_loading_more,
        has_more,
        ..
    } = app.view(&model).state
    else {
        panic!("expected plant selection");
    };
    assert_eq!(header.user_name, "Ana");
    assert_eq!(header.greeting, "Olá,");
    assert_eq!(environments.len(), 3);
    assert_eq!(environments[0].key, EnvironmentKey::all());
    assert!(environments[0].active);
    assert_eq!(plants.len(), 8);
    assert!(!is_loading_more);
    assert!(has_more);
}

#[test]
fn environment_filter_narrows_plants() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);

    let mut batch = plants(1..5, "living_room");
    batch.extend(plants(5..9, "kitchen"));
    deliver_page(&app, &mut model, 1, batch);

    app.update(
        Event::EnvironmentSelected {
            key: EnvironmentKey::new("kitchen"),
        },
        &mut model,
    );
    let ViewState::PlantSelect { plants, .. } = app.view(&model).state else {
        panic!("expected plant selection");
    };
    assert_eq!(plants.len(), 4);
    assert!(plants.iter().all(|p| p.id.parse::<u32>().unwrap() >= 5));

    app.update(
        Event::EnvironmentSelected {
            key: EnvironmentKey::all(),
        },
        &mut model,
    );
    let ViewState::PlantSelect { plants, .. } = app.view(&model).state else {
        panic!("expected plant selection");
    };
    assert_eq!(plants.len(), 8);
}

#[test]
fn end_reached_loads_next_page_once() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    let update = app.update(Event::EndReached { distance_from_end: 12.0 }, &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:3333/plants?_sort=name&order=asc&_page=2&_limit=8".to_string()]
    );

    // Single flight: a second trigger while page 2 is out does nothing.
    let update = app.update(Event::EndReached { distance_from_end: 12.0 }, &mut model);
    assert!(http_urls(&update.effects).is_empty());

    let ViewState::PlantSelect { is_loading_more, .. } = app.view(&model).state else {
        panic!("expected plant selection");
    };
    assert!(is_loading_more);

    deliver_page(&app, &mut model, 2, plants(9..12, "living_room"));
    let catalog = model.screen.catalog().unwrap();
    assert_eq!(catalog.all_plants().len(), 11);
    assert_eq!(catalog.phase(), Phase::Idle);
}

#[test]
fn small_or_nan_distance_is_ignored() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    for distance in [0.0, 0.5, -3.0, f64::NAN] {
        let update = app.update(Event::EndReached { distance_from_end: distance }, &mut model);
        assert!(http_urls(&update.effects).is_empty(), "distance {distance}");
    }
}

#[test]
fn empty_page_exhausts_the_catalog() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    app.update(Event::EndReached { distance_from_end: 4.0 }, &mut model);
    deliver_page(&app, &mut model, 2, Vec::new());

    let ViewState::PlantSelect { has_more, plants, .. } = app.view(&model).state else {
        panic!("expected plant selection");
    };
    assert!(!has_more);
    assert_eq!(plants.len(), 8);

    let update = app.update(Event::EndReached { distance_from_end: 4.0 }, &mut model);
    assert!(http_urls(&update.effects).is_empty());
}

#[test]
fn responses_for_a_closed_session_are_dropped() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let old = session(&model);

    app.update(Event::BackRequested, &mut model);
    let update = app.update(
        Event::PlantsPageFetched {
            session: old,
            page: 1,
            result: Box::new(Ok(Some(plants(1..9, "living_room")))),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
    assert!(model.screen.catalog().is_none());

    // Remounting starts a fresh session that ignores the old one.
    app.update(Event::ConfirmationAcknowledged, &mut model);
    let fresh = session(&model);
    assert_ne!(fresh, old);
    app.update(
        Event::PlantsPageFetched {
            session: old,
            page: 1,
            result: Box::new(Ok(Some(plants(1..9, "living_room")))),
        },
        &mut model,
    );
    let catalog = model.screen.catalog().unwrap();
    assert!(catalog.all_plants().is_empty());
    assert_eq!(catalog.phase(), Phase::LoadingInitial);
}

#[test]
fn failed_first_page_can_be_retried() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let session = session(&model);

    app.update(
        Event::PlantsPageFetched {
            session,
            page: 1,
            result: Box::new(Err(FetchError::Network("connection refused".into()))),
        },
        &mut model,
    );
    let view = app.view(&model);
    assert!(matches!(view.state, ViewState::Error { .. }));
    assert!(view.error.expect("error detail").is_retryable);

    let update = app.update(Event::RetryRequested, &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:3333/plants?_sort=name&order=asc&_page=1&_limit=8".to_string()]
    );
    assert!(matches!(app.view(&model).state, ViewState::Loading { .. }));

    deliver_page(&app, &mut model, 1, plants(1..4, "kitchen"));
    assert!(matches!(app.view(&model).state, ViewState::PlantSelect { .. }));
}

#[test]
fn failed_load_more_keeps_content_and_retries_same_page() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let session = session(&model);
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    app.update(Event::EndReached { distance_from_end: 2.0 }, &mut model);
    app.update(
        Event::PlantsPageFetched {
            session,
            page: 2,
            result: Box::new(Err(FetchError::Status { code: 503 })),
        },
        &mut model,
    );
    let view = app.view(&model);
    let ViewState::PlantSelect { plants, .. } = view.state else {
        panic!("expected plant selection");
    };
    assert_eq!(plants.len(), 8);
    let banner = view.error.expect("banner error");
    assert_eq!(banner.error_code, "SERVER_ERROR");

    let update = app.update(Event::EndReached { distance_from_end: 2.0 }, &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:3333/plants?_sort=name&order=asc&_page=2&_limit=8".to_string()]
    );
}

#[test]
fn environments_failure_is_a_dismissable_banner() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let session = session(&model);

    app.update(
        Event::EnvironmentsFetched {
            session,
            result: Box::new(Err(FetchError::Network("timeout".into()))),
        },
        &mut model,
    );
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    let view = app.view(&model);
    let ViewState::PlantSelect { environments, .. } = view.state else {
        panic!("expected plant selection");
    };
    assert_eq!(environments.len(), 1);
    assert!(view.error.is_some());

    app.update(Event::DismissError, &mut model);
    assert!(app.view(&model).error.is_none());
}

#[test]
fn stale_page_number_is_ignored() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    deliver_page(&app, &mut model, 1, plants(1..9, "living_room"));

    // Page 1 again, with nothing in flight.
    let session = session(&model);
    let update = app.update(
        Event::PlantsPageFetched {
            session,
            page: 1,
            result: Box::new(Ok(Some(plants(1..9, "living_room")))),
        },
        &mut model,
    );
    assert!(update.effects.is_empty());
    assert_eq!(model.screen.catalog().unwrap().all_plants().len(), 8);
}

#[test]
fn malformed_first_page_still_offers_retry() {
    let app = Tester::default();
    let mut model = Model::default();
    open_catalog(&app, &mut model);
    let session = session(&model);

    app.update(
        Event::PlantsPageFetched {
            session,
            page: 1,
            result: Box::new(Err(FetchError::Decode("expected a sequence".into()))),
        },
        &mut model,
    );
    let view = app.view(&model);
    let ViewState::Error { retry_label, .. } = view.state else {
        panic!("expected error screen");
    };
    assert_eq!(retry_label, "Tentar novamente");
    assert!(!view.error.expect("error detail").is_retryable);

    let update = app.update(Event::RetryRequested, &mut model);
    assert_eq!(
        http_urls(&update.effects),
        vec!["http://localhost:3333/plants?_sort=name&order=asc&_page=1&_limit=8".to_string()]
    );
}

#[test]
fn server_error_status_reaches_the_view() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut effects = open_catalog(&app, &mut model);

    resolve_first_page(
        &app,
        &mut model,
        &mut effects,
        HttpResult::Ok(HttpResponse::status(503).build()),
    );

    let catalog = model.screen.catalog().unwrap();
    assert_eq!(catalog.blocking_error(), Some(&FetchError::Status { code: 503 }));

    let view = app.view(&model);
    let ViewState::Error { message, .. } = view.state else {
        panic!("expected error screen");
    };
    assert_eq!(message, "O servidor está com problemas. Tente novamente em instantes.");
    let detail = view.error.expect("error detail");
    assert_eq!(detail.error_code, "SERVER_ERROR");
    assert!(detail.is_retryable);
}

#[test]
fn missing_catalog_is_not_reported_as_offline() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut effects = open_catalog(&app, &mut model);

    resolve_first_page(
        &app,
        &mut model,
        &mut effects,
        HttpResult::Ok(HttpResponse::status(404).build()),
    );

    let detail = app.view(&model).error.expect("error detail");
    assert_eq!(detail.error_code, "NOT_FOUND");
    assert!(!detail.is_retryable);
}

#[test]
fn shell_timeout_is_classified_as_timeout() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut effects = open_catalog(&app, &mut model);

    resolve_first_page(
        &app,
        &mut model,
        &mut effects,
        HttpResult::Err(crux_http::Error::Timeout),
    );

    assert_eq!(
        model.screen.catalog().unwrap().blocking_error(),
        Some(&FetchError::Timeout)
    );
    assert_eq!(app.view(&model).error.expect("error detail").error_code, "TIMEOUT");
}

#[test]
fn successful_response_is_decoded_into_plants() {
    let app = Tester::default();
    let mut model = Model::default();
    let mut effects = open_catalog(&app, &mut model);

    resolve_first_page(
        &app,
        &mut model,
        &mut effects,
        HttpResult::Ok(HttpResponse::ok().json(plants(1..4, "kitchen")).build()),
    );

    let ViewState::PlantSelect { plants, .. } = app.view(&model).state else {
        panic!("expected plant selection");
    };
    assert_eq!(plants.len(), 3);
    assert_eq!(plants[0].name, "Planta 1");
}
