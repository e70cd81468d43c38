//! Drives the dashboard the way the terminal loop does: key presses in, request
//! completions pumped between them, against a fake `/books` service.

use std::time::{Duration, Instant};

use book_dashboard::store::QueryStatus;
use book_dashboard::{App, BooksApi, Dispatcher};
use chrono::Datelike;
use crossterm::event::KeyCode;
use serde_json::{json, Value};
use tokio::runtime::Runtime;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn record(id: i64, title: &str, author: &str) -> Value {
    json!({
        "id": id, "title": title, "author": author,
        "genre": "Fiction", "year": 1990, "status": "Available"
    })
}

fn shelf(count: i64) -> Value {
    Value::Array(
        (1..=count)
            .map(|n| record(n, &format!("Book {n}"), "Anon"))
            .collect(),
    )
}

fn start() -> (Runtime, MockServer) {
    let runtime = Runtime::new().unwrap();
    let server = runtime.block_on(MockServer::start());
    (runtime, server)
}

fn mount(runtime: &Runtime, server: &MockServer, mock: Mock) {
    runtime.block_on(mock.mount(server));
}

fn app_for(runtime: &Runtime, server: &MockServer) -> App {
    let api = BooksApi::new(&format!("{}/books", server.uri())).unwrap();
    let dispatcher = Dispatcher::new(api, runtime.handle().clone());
    let mut app = App::new(dispatcher, chrono::Local::now().year());
    app.start();
    app
}

fn wait_until(app: &mut App, done: impl Fn(&App) -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if done(&*app) {
            return true;
        }
        app.pump_timeout(Duration::from_millis(50));
    }
    done(&*app)
}

/// Let any stray completions land before asserting on their absence.
fn settle(app: &mut App) {
    let deadline = Instant::now() + Duration::from_millis(300);
    while Instant::now() < deadline {
        app.pump_timeout(Duration::from_millis(50));
    }
}

fn press(app: &mut App, code: KeyCode) {
    assert!(!app.handle_key(code), "key unexpectedly quit the app");
}

fn type_text(app: &mut App, text: &str) {
    for ch in text.chars() {
        press(app, KeyCode::Char(ch));
    }
}

fn has_notification(app: &App, text: &str) -> bool {
    app.notifications().iter().any(|n| n == text)
}

fn list_once(body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .up_to_n_times(1)
}

fn list_always(body: Value) -> Mock {
    Mock::given(method("GET"))
        .and(path("/books"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
}

#[test]
fn twenty_five_books_paginate_into_three_pages() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_always(shelf(25)));

    let mut app = app_for(&runtime, &server);
    assert_eq!(app.status(), &QueryStatus::Loading);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    assert_eq!(app.total_pages(), 3);
    assert_eq!(app.visible_books().len(), 10);

    press(&mut app, KeyCode::End);
    assert_eq!(app.page(), 3);
    let titles: Vec<_> = app.visible_books().iter().map(|b| b.title.clone()).collect();
    assert_eq!(titles, vec!["Book 21", "Book 22", "Book 23", "Book 24", "Book 25"]);

    press(&mut app, KeyCode::Right);
    assert_eq!(app.page(), 3);
    press(&mut app, KeyCode::Left);
    assert_eq!(app.page(), 2);
}

#[test]
fn search_narrows_the_list_and_clamps_the_page() {
    let (runtime, server) = start();
    let mut books = shelf(12);
    books
        .as_array_mut()
        .unwrap()
        .push(record(13, "Dune", "Frank Herbert"));
    mount(&runtime, &server, list_always(books));

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::End);
    assert_eq!(app.page(), 2);

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "dune");
    press(&mut app, KeyCode::Enter);

    assert_eq!(app.filters().search, "dune");
    assert_eq!(app.page(), 1);
    let visible = app.visible_books();
    assert_eq!(visible.len(), 1);
    assert_eq!(visible[0].title, "Dune");

    press(&mut app, KeyCode::Char('/'));
    type_text(&mut app, "zzz");
    press(&mut app, KeyCode::Esc);
    assert_eq!(app.filters().search, "dune");
}

#[test]
fn created_book_appears_after_refetch() {
    let (runtime, server) = start();
    mount(
        &runtime,
        &server,
        list_once(json!([record(1, "Gone Girl", "Gillian Flynn")])),
    );
    mount(
        &runtime,
        &server,
        list_always(json!([
            record(1, "Gone Girl", "Gillian Flynn"),
            record(2, "Dune", "Frank Herbert")
        ])),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/books"))
            .respond_with(
                ResponseTemplate::new(201).set_body_json(record(2, "Dune", "Frank Herbert")),
            )
            .expect(1),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.books().len() == 1));

    press(&mut app, KeyCode::Char('a'));
    assert!(app.is_form_open());
    type_text(&mut app, "Dune");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Frank Herbert");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Fiction");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "1965");
    press(&mut app, KeyCode::Enter);

    assert!(!app.is_form_open(), "form closes as soon as it is submitted");
    assert!(wait_until(&mut app, |app| app.books().len() == 2
        && has_notification(app, "Book added!")));
    assert!(app.books().iter().any(|b| b.title == "Dune"));

    runtime.block_on(server.verify());
}

#[test]
fn invalid_form_is_never_submitted() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_always(shelf(1)));
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Dune");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Frank Herbert");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Fiction");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "999");
    press(&mut app, KeyCode::Enter);
    assert!(app.is_form_open());

    press(&mut app, KeyCode::Esc);
    assert!(!app.is_form_open());
    settle(&mut app);
    assert_eq!(app.pending_mutations(), 0);

    runtime.block_on(server.verify());
}

#[test]
fn rejected_create_reopens_the_form() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_always(shelf(1)));
    mount(
        &runtime,
        &server,
        Mock::given(method("POST"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(500)),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('a'));
    type_text(&mut app, "Dune");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Frank Herbert");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "Fiction");
    press(&mut app, KeyCode::Tab);
    type_text(&mut app, "1965");
    press(&mut app, KeyCode::Enter);
    assert!(!app.is_form_open());

    assert!(wait_until(&mut app, |app| has_notification(app, "Failed to add book")));
    assert!(app.is_form_open());
    assert_eq!(app.books().len(), 1);
}

#[test]
fn edit_sends_update_for_the_selected_record() {
    let (runtime, server) = start();
    mount(
        &runtime,
        &server,
        list_once(json!([record(1, "Dune", "Frank Herbert")])),
    );
    mount(
        &runtime,
        &server,
        list_always(json!([record(1, "Dune Messiah", "Frank Herbert")])),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("PUT"))
            .and(path("/books/1"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(record(1, "Dune Messiah", "Frank Herbert")),
            )
            .expect(1),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('e'));
    assert!(app.is_form_open());
    type_text(&mut app, " Messiah");
    press(&mut app, KeyCode::Enter);

    assert!(wait_until(&mut app, |app| has_notification(app, "Book updated!")
        && app.books()[0].title == "Dune Messiah"));

    runtime.block_on(server.verify());
}

#[test]
fn rejected_update_reopens_the_edit_form() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_always(json!([record(1, "Dune", "Frank Herbert")])));
    mount(
        &runtime,
        &server,
        Mock::given(method("PUT"))
            .and(path("/books/1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(2),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('e'));
    type_text(&mut app, " Messiah");
    press(&mut app, KeyCode::Enter);
    assert!(!app.is_form_open());

    assert!(wait_until(&mut app, |app| has_notification(app, "Failed to update book")));
    assert!(app.is_form_open());
    assert_eq!(app.books()[0].title, "Dune");

    // The reopened form still targets record 1, so a retry hits the same URL.
    press(&mut app, KeyCode::Enter);
    assert!(!app.is_form_open());
    assert!(wait_until(&mut app, |app| app.pending_mutations() == 0 && app.is_form_open()));

    runtime.block_on(server.verify());
}

#[test]
fn failed_refresh_keeps_the_last_books() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_once(shelf(2)));
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(500)),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));
    assert!(app.notifications().is_empty());

    press(&mut app, KeyCode::Char('r'));
    assert!(wait_until(&mut app, |app| has_notification(app, "Failed to refresh books")));

    assert_eq!(app.status(), &QueryStatus::Ready);
    assert_eq!(app.books().len(), 2);
    assert_eq!(app.visible_books().len(), 2);
}

#[test]
fn declined_delete_issues_no_request() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_always(shelf(2)));
    mount(
        &runtime,
        &server,
        Mock::given(method("DELETE"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('d'));
    assert!(app.is_confirming_delete());
    press(&mut app, KeyCode::Char('n'));
    assert!(!app.is_confirming_delete());

    settle(&mut app);
    assert_eq!(app.books().len(), 2);
    runtime.block_on(server.verify());
}

#[test]
fn confirmed_delete_removes_the_record() {
    let (runtime, server) = start();
    mount(&runtime, &server, list_once(shelf(2)));
    mount(
        &runtime,
        &server,
        list_always(json!([record(2, "Book 2", "Anon")])),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("DELETE"))
            .and(path("/books/1"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.books().len() == 2));

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Char('y'));

    assert!(wait_until(&mut app, |app| app.books().len() == 1
        && has_notification(app, "Book deleted!")));
    assert!(app.books().iter().all(|b| b.title != "Book 1"));

    runtime.block_on(server.verify());
}

#[test]
fn failed_delete_leaves_the_collection_alone() {
    let (runtime, server) = start();
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(200).set_body_json(shelf(2)))
            .expect(1),
    );
    mount(
        &runtime,
        &server,
        Mock::given(method("DELETE"))
            .and(path("/books/1"))
            .respond_with(ResponseTemplate::new(500))
            .expect(1),
    );

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));

    press(&mut app, KeyCode::Char('d'));
    press(&mut app, KeyCode::Enter);

    assert!(wait_until(&mut app, |app| has_notification(app, "Failed to delete book")));
    settle(&mut app);
    assert_eq!(app.books().len(), 2);

    runtime.block_on(server.verify());
}

#[test]
fn failed_first_load_can_be_retried() {
    let (runtime, server) = start();
    mount(
        &runtime,
        &server,
        Mock::given(method("GET"))
            .and(path("/books"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1),
    );
    mount(&runtime, &server, list_always(shelf(3)));

    let mut app = app_for(&runtime, &server);
    assert!(wait_until(&mut app, |app| matches!(
        app.status(),
        QueryStatus::Failed(_)
    )));

    press(&mut app, KeyCode::Char('r'));
    assert!(wait_until(&mut app, |app| app.status() == &QueryStatus::Ready));
    assert_eq!(app.books().len(), 3);
}
