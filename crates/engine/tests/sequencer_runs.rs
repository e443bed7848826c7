use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use replykit_engine::loading::{LoadingSequencer, RunOutcome, StatusSurface};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Event {
    Show,
    Hide,
    Write(String),
}

#[derive(Default)]
struct Recorder(Mutex<Vec<Event>>);

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.0.lock().expect("events").clone()
    }
}

impl StatusSurface for Recorder {
    fn show(&self) {
        self.0.lock().expect("events").push(Event::Show);
    }

    fn hide(&self) {
        self.0.lock().expect("events").push(Event::Hide);
    }

    fn write(&self, text: &str) {
        self.0.lock().expect("events").push(Event::Write(text.to_string()));
    }
}

fn sequencer(recorder: &Arc<Recorder>) -> LoadingSequencer {
    let surface: Arc<dyn StatusSurface> = recorder.clone();
    LoadingSequencer::with_rng(Some(surface), StdRng::seed_from_u64(2024))
}

fn counting_callback(counter: &Arc<AtomicUsize>) -> impl FnOnce() -> anyhow::Result<()> + Send + 'static {
    let counter = counter.clone();
    move || {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[tokio::test(start_paused = true)]
async fn restarting_cancels_the_previous_run() {
    let recorder = Arc::new(Recorder::default());
    let mut sequencer = sequencer(&recorder);
    let first_calls = Arc::new(AtomicUsize::new(0));
    let second_calls = Arc::new(AtomicUsize::new(0));

    let first = sequencer.show_loading(1, counting_callback(&first_calls));
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert!(sequencer.is_loading());

    let second = sequencer.show_loading(2, counting_callback(&second_calls));
    assert_eq!(first.await.expect("join first"), RunOutcome::Cancelled);
    assert_eq!(second.await.expect("join second"), RunOutcome::Submitted);

    assert_eq!(first_calls.load(Ordering::SeqCst), 0);
    assert_eq!(second_calls.load(Ordering::SeqCst), 1);

    let events = recorder.events();
    let first_old_write = events
        .iter()
        .position(|event| matches!(event, Event::Write(text) if text.contains("/8]")))
        .expect("first run wrote progress");
    let reset_at = first_old_write
        + events[first_old_write..]
            .iter()
            .position(|event| *event == Event::Hide)
            .expect("restart hides the display");
    for event in &events[reset_at..] {
        if let Event::Write(text) = event {
            assert!(!text.contains("/8]"), "old run wrote after reset: {text}");
        }
    }
    assert!(events.iter().any(|event| matches!(event, Event::Write(text) if text.contains("Finalizing... [10/10]"))));
}

#[tokio::test(start_paused = true)]
async fn reset_stops_every_write_of_the_run() {
    let recorder = Arc::new(Recorder::default());
    let mut sequencer = sequencer(&recorder);
    let calls = Arc::new(AtomicUsize::new(0));

    let run = sequencer.show_loading(3, counting_callback(&calls));
    tokio::time::sleep(Duration::from_millis(2500)).await;
    sequencer.reset();
    let written = recorder.events().len();

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(run.await.expect("join"), RunOutcome::Cancelled);
    assert_eq!(recorder.events().len(), written);
    assert_eq!(recorder.events().last(), Some(&Event::Hide));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    assert!(!sequencer.is_loading());
}

#[tokio::test(start_paused = true)]
async fn elapsed_renderer_rewrites_the_whole_status() {
    let recorder = Arc::new(Recorder::default());
    let mut sequencer = sequencer(&recorder);
    let calls = Arc::new(AtomicUsize::new(0));

    let _run = sequencer.show_loading(1, counting_callback(&calls));
    tokio::time::sleep(Duration::from_millis(1050)).await;

    let events = recorder.events();
    // Starting clears and hides the display before showing it again.
    assert_eq!(
        events[..4],
        [Event::Write(String::new()), Event::Hide, Event::Show, Event::Write(String::new())]
    );
    let elapsed_writes: Vec<&String> = events
        .iter()
        .filter_map(|event| match event {
            Event::Write(text) if text.contains("Making API request... [3/8]") => Some(text),
            _ => None,
        })
        .collect();
    assert!(elapsed_writes.len() >= 5, "expected repeated elapsed writes, got {}", elapsed_writes.len());
    for text in elapsed_writes {
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Loading [") && lines[0].ends_with("s]..."));
        assert_eq!(lines[2], "[#######-------------] 38%");
    }
    sequencer.reset();
}

#[tokio::test(start_paused = true)]
async fn the_last_step_is_never_waited_out() {
    let recorder = Arc::new(Recorder::default());
    let mut sequencer = sequencer(&recorder);
    let calls = Arc::new(AtomicUsize::new(0));

    let started = tokio::time::Instant::now();
    let run = sequencer.show_loading(1, counting_callback(&calls));
    assert_eq!(run.await.expect("join"), RunOutcome::Submitted);

    // Upper bound of every timed step for a single output.
    let longest = Duration::from_millis(250 + 250 + 2500 + 500 + 500 + 250 + 250);
    assert!(started.elapsed() <= longest);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    sequencer.reset();
}
