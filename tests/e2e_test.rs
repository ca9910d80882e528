//! End-to-end flow tests for PodTUI
//!
//! Drives the controller through the full journey (search, show, episode,
//! play) with a fake audio device, feeding background results back the way
//! the event loop does.

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use mockito::{Matcher, Server};
use tokio::sync::mpsc;

use podtui::api::{DirectoryClient, FeedReader};
use podtui::app::{App, AppEvent, InputMode, Request, View, ViewKind};
use podtui::dispatch::Dispatcher;
use podtui::models::{Episode, Show, TransportState};
use podtui::playback::{
    AudioOutput, AudioStream, FetchError, FetchWorker, PlaybackEngine, PlaybackError,
};

// =============================================================================
// Fake Audio Device
// =============================================================================

/// Counts streams currently holding the device
#[derive(Clone, Default)]
struct Device {
    open_now: Rc<Cell<usize>>,
    opened: Rc<Cell<usize>>,
}

struct FakeOutput(Device);
struct FakeStream(Device);

impl AudioOutput for FakeOutput {
    fn open(&mut self, path: &Path) -> Result<Box<dyn AudioStream>, PlaybackError> {
        assert!(path.exists(), "engine must open a downloaded file");
        self.0.open_now.set(self.0.open_now.get() + 1);
        self.0.opened.set(self.0.opened.get() + 1);
        Ok(Box::new(FakeStream(self.0.clone())))
    }
}

impl AudioStream for FakeStream {
    fn play(&mut self) {}
    fn pause(&mut self) {}
    fn is_drained(&self) -> bool {
        false
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.0.open_now.set(self.0.open_now.get() - 1);
    }
}

fn app_with_device() -> (App, Device) {
    let device = Device::default();
    let app = App::new(PlaybackEngine::new(Box::new(FakeOutput(device.clone()))));
    (app, device)
}

// =============================================================================
// Helpers
// =============================================================================

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::empty())
}

fn type_text(app: &mut App, text: &str) {
    for c in text.chars() {
        app.handle_key(key(KeyCode::Char(c)));
    }
}

fn temp_audio(dir: &tempfile::TempDir) -> tempfile::TempPath {
    tempfile::Builder::new()
        .suffix(".mp3")
        .tempfile_in(dir.path())
        .unwrap()
        .into_temp_path()
}

fn show() -> Show {
    Show::new("Tech Talk", "https://example.com/tech.xml", "Weekly tech")
}

fn episodes() -> Vec<Episode> {
    vec![
        Episode::new("Pilot", Some("https://cdn.example.com/pilot.mp3".into())),
        Episode::new("Notice", None),
    ]
}

/// Search, open the first show, deliver its episodes
fn open_show(app: &mut App) -> u64 {
    app.handle_key(key(KeyCode::Char('/')));
    type_text(app, "tech");
    app.handle_key(key(KeyCode::Enter));

    let generation = match &app.take_requests()[..] {
        [Request::Search { generation, query }] => {
            assert_eq!(query, "tech");
            *generation
        }
        other => panic!("expected one search request, got {:?}", other),
    };
    app.handle_event(AppEvent::SearchFinished {
        generation,
        result: Ok(vec![show()]),
    });

    app.handle_key(key(KeyCode::Enter));
    let view_id = match &app.take_requests()[..] {
        [Request::LoadEpisodes { view_id, feed_url }] => {
            assert_eq!(feed_url, "https://example.com/tech.xml");
            *view_id
        }
        other => panic!("expected one episode load, got {:?}", other),
    };
    app.handle_event(AppEvent::EpisodesLoaded {
        view_id,
        result: Ok(episodes()),
    });
    view_id
}

fn session_state(app: &App) -> TransportState {
    app.session().expect("detail view open").state()
}

// =============================================================================
// Journey Tests
// =============================================================================

#[test]
fn test_search_to_playback_journey() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, device) = app_with_device();

    open_show(&mut app);
    assert_eq!(app.views().active(), ViewKind::Episodes);

    app.handle_key(key(KeyCode::Enter));
    assert_eq!(app.views().active(), ViewKind::Detail);
    assert_eq!(app.views().depth(), 3);
    assert_eq!(session_state(&app), TransportState::Idle);

    // Play asks for exactly one download
    app.handle_key(key(KeyCode::Char('p')));
    let order = match app.take_requests().as_slice() {
        [Request::Fetch(order)] => order.clone(),
        other => panic!("expected one fetch, got {:?}", other),
    };
    assert_eq!(order.url, "https://cdn.example.com/pilot.mp3");
    assert_eq!(session_state(&app), TransportState::Downloading);

    app.handle_event(AppEvent::FetchFinished {
        session_id: order.session_id,
        result: Ok(temp_audio(&dir)),
    });

    let session = app.session().unwrap();
    assert_eq!(
        session.history(),
        &[
            TransportState::Idle,
            TransportState::Downloading,
            TransportState::Ready,
            TransportState::Playing
        ]
    );
    assert_eq!(device.open_now.get(), 1);
    assert!(app.engine().is_playing());

    // Space pauses, space resumes
    app.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(session_state(&app), TransportState::Paused);
    app.handle_key(key(KeyCode::Char(' ')));
    assert_eq!(session_state(&app), TransportState::Playing);

    // Stop releases the device but keeps the file for replay
    app.handle_key(key(KeyCode::Char('s')));
    assert_eq!(session_state(&app), TransportState::Stopped);
    assert_eq!(device.open_now.get(), 0);

    app.handle_key(key(KeyCode::Char('p')));
    assert!(app.take_requests().is_empty());
    assert_eq!(session_state(&app), TransportState::Playing);
    assert_eq!(device.opened.get(), 2);
}

#[test]
fn test_double_play_fetches_once() {
    let (mut app, _) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));

    app.handle_key(key(KeyCode::Char('p')));
    app.handle_key(key(KeyCode::Char('p')));
    app.handle_key(key(KeyCode::Char(' ')));

    let fetches = app
        .take_requests()
        .into_iter()
        .filter(|r| matches!(r, Request::Fetch(_)))
        .count();
    assert_eq!(fetches, 1);
    assert_eq!(session_state(&app), TransportState::Downloading);
}

#[test]
fn test_episode_without_audio_never_fetches() {
    let (mut app, device) = app_with_device();
    open_show(&mut app);

    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));

    assert!(app.take_requests().is_empty());
    assert_eq!(session_state(&app), TransportState::Failed);
    assert!(app.error.is_some());
    assert_eq!(device.opened.get(), 0);
}

#[test]
fn test_fetch_failure_is_shown_and_retryable() {
    let (mut app, _) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));
    let session_id = app.session().unwrap().id();
    app.take_requests();

    app.handle_event(AppEvent::FetchFinished {
        session_id,
        result: Err(FetchError::Status {
            url: "https://cdn.example.com/pilot.mp3".into(),
            status: 503,
        }),
    });

    assert_eq!(session_state(&app), TransportState::Failed);
    assert!(app.error.as_deref().unwrap_or_default().contains("503"));
    assert!(app.session().unwrap().last_error().is_some());

    // Still interactive: next key clears the popup and retries
    app.handle_key(key(KeyCode::Char('p')));
    assert!(app.error.is_none());
    assert!(matches!(app.take_requests().as_slice(), [Request::Fetch(_)]));
}

#[test]
fn test_back_during_download_cancels_and_discards_late_result() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, device) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));
    let session_id = app.session().unwrap().id();
    app.take_requests();

    app.handle_key(key(KeyCode::Char('b')));
    assert_eq!(app.views().active(), ViewKind::Episodes);
    assert_eq!(
        app.take_requests(),
        vec![Request::CancelFetch { session_id }]
    );

    // A result that raced the cancel is dropped and its file removed
    let late = temp_audio(&dir);
    let location = late.to_path_buf();
    app.handle_event(AppEvent::FetchFinished {
        session_id,
        result: Ok(late),
    });
    assert!(!location.exists());
    assert_eq!(device.opened.get(), 0);
}

#[test]
fn test_leaving_player_stops_audio_and_reopen_starts_fresh() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, device) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));
    let first_session = app.session().unwrap().id();
    app.take_requests();
    app.handle_event(AppEvent::FetchFinished {
        session_id: first_session,
        result: Ok(temp_audio(&dir)),
    });
    let file = app.session().unwrap().local_path().unwrap().to_path_buf();
    assert_eq!(device.open_now.get(), 1);

    app.handle_key(key(KeyCode::Esc));
    assert_eq!(device.open_now.get(), 0);
    assert!(!file.exists());
    assert!(app.take_requests().is_empty());

    // Selecting the same episode again creates a new session
    app.handle_key(key(KeyCode::Enter));
    let second = app.session().unwrap();
    assert_ne!(second.id(), first_session);
    assert_eq!(second.state(), TransportState::Idle);
}

#[test]
fn test_back_chain_returns_to_root_with_results() {
    let (mut app, _) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));

    app.handle_key(key(KeyCode::Esc));
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.views().active(), ViewKind::Shows);
    assert_eq!(app.views().root().search.results.len(), 1);

    // Root stays put
    app.handle_key(key(KeyCode::Esc));
    assert_eq!(app.views().depth(), 1);
    assert!(app.running);
}

#[test]
fn test_stale_search_does_not_overwrite_newer() {
    let (mut app, _) = app_with_device();

    app.handle_key(key(KeyCode::Char('/')));
    type_text(&mut app, "old");
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('/')));
    for _ in 0..3 {
        app.handle_key(key(KeyCode::Backspace));
    }
    type_text(&mut app, "new");
    app.handle_key(key(KeyCode::Enter));

    let requests = app.take_requests();
    let generations: Vec<u64> = requests
        .iter()
        .filter_map(|r| match r {
            Request::Search { generation, .. } => Some(*generation),
            _ => None,
        })
        .collect();
    assert_eq!(generations.len(), 2);

    app.handle_event(AppEvent::SearchFinished {
        generation: generations[1],
        result: Ok(vec![Show::new("New Show", "https://example.com/new.xml", "")]),
    });
    app.handle_event(AppEvent::SearchFinished {
        generation: generations[0],
        result: Ok(vec![Show::new("Old Show", "https://example.com/old.xml", "")]),
    });

    let results = &app.views().root().search.results;
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "New Show");
}

#[test]
fn test_quit_from_player_releases_everything() {
    let dir = tempfile::tempdir().unwrap();
    let (mut app, device) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));
    let session_id = app.session().unwrap().id();
    app.take_requests();
    app.handle_event(AppEvent::FetchFinished {
        session_id,
        result: Ok(temp_audio(&dir)),
    });

    app.handle_key(key(KeyCode::Char('q')));
    assert!(!app.running);
    assert_eq!(device.open_now.get(), 0);
    assert_eq!(app.views().depth(), 1);
    assert_eq!(app.input_mode, InputMode::Normal);
}

#[test]
fn test_detail_view_routing_ignores_list_keys() {
    let (mut app, _) = app_with_device();
    open_show(&mut app);
    app.handle_key(key(KeyCode::Enter));

    // Enter on the focused Play button starts the download
    app.handle_key(key(KeyCode::Down));
    app.handle_key(key(KeyCode::Enter));
    assert!(matches!(app.take_requests().as_slice(), [Request::Fetch(_)]));

    match app.views().top() {
        Some(View::Detail(detail)) => assert_eq!(detail.session.episode().title, "Pilot"),
        _ => panic!("detail expected"),
    }
}

// =============================================================================
// Dispatcher Round Trip
// =============================================================================

#[tokio::test]
async fn test_dispatcher_round_trip_with_mock_servers() {
    let mut server = Server::new_async().await;
    let feed_url = format!("{}/tech.xml", server.url());
    let audio_url = format!("{}/pilot.mp3", server.url());

    let directory_body = format!(
        r#"{{"resultCount":1,"results":[{{"collectionName":"Tech Talk","feedUrl":"{}"}}]}}"#,
        feed_url
    );
    let feed_body = format!(
        r#"<rss version="2.0"><channel><title>Tech Talk</title><link>https://example.com</link><description>d</description>
           <item><title>Pilot</title><enclosure url="{}" length="4" type="audio/mpeg"/></item>
           </channel></rss>"#,
        audio_url
    );

    let _search = server
        .mock("GET", "/search")
        .match_query(Matcher::UrlEncoded("term".into(), "tech".into()))
        .with_status(200)
        .with_body(directory_body)
        .create_async()
        .await;
    let _feed = server
        .mock("GET", "/tech.xml")
        .with_status(200)
        .with_body(feed_body)
        .create_async()
        .await;
    let _audio = server
        .mock("GET", "/pilot.mp3")
        .with_status(200)
        .with_body("ID3!")
        .create_async()
        .await;

    let dir = tempfile::tempdir().unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel();
    let mut dispatcher = Dispatcher::new(
        DirectoryClient::with_base_url(server.url()),
        FeedReader::new(),
        FetchWorker::new(reqwest::Client::new(), dir.path()),
        tx,
    );
    let (mut app, device) = app_with_device();

    // Run requests until the controller settles, like the event loop does
    async fn pump(
        app: &mut App,
        dispatcher: &mut Dispatcher,
        rx: &mut mpsc::UnboundedReceiver<AppEvent>,
    ) {
        let requests = app.take_requests();
        let expected = requests.len();
        for request in requests {
            dispatcher.dispatch(request);
        }
        for _ in 0..expected {
            let event = rx.recv().await.expect("dispatcher result");
            app.handle_event(event);
        }
    }

    app.handle_key(key(KeyCode::Char('/')));
    type_text(&mut app, "tech");
    app.handle_key(key(KeyCode::Enter));
    pump(&mut app, &mut dispatcher, &mut rx).await;
    assert_eq!(app.views().root().search.results.len(), 1);

    app.handle_key(key(KeyCode::Enter));
    pump(&mut app, &mut dispatcher, &mut rx).await;
    match app.views().top() {
        Some(View::Episodes(view)) => assert_eq!(view.show.episodes.len(), 1),
        _ => panic!("episode view expected"),
    }

    app.handle_key(key(KeyCode::Enter));
    app.handle_key(key(KeyCode::Char('p')));
    pump(&mut app, &mut dispatcher, &mut rx).await;

    assert_eq!(session_state(&app), TransportState::Playing);
    assert_eq!(device.open_now.get(), 1);
    let file = app.session().unwrap().local_path().unwrap().to_path_buf();
    assert!(file.starts_with(dir.path()));

    app.quit();
    assert!(!file.exists());
    assert_eq!(device.open_now.get(), 0);
}
