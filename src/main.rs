//! Terminal presenter for lesson documents.
//!
//! Loads a lesson, builds its slide deck, and drives a presentation session
//! from line commands on stdin while ticking narration playback every frame.

use anyhow::{Context, Result, anyhow, bail};
use classroom_core::audio::{AudioBackend, HeadlessBackend};
use classroom_core::clock::SystemClock;
use classroom_core::config::{AppConfig, load_config};
use classroom_core::lesson::load_lesson;
use classroom_core::services::{
    HttpNarrationService, HttpTranslationService, NarrationService, OfflineNarration,
    TranslationService, UnconfiguredTranslation,
};
use classroom_core::session::{
    PresentationCommand, PresentationEvent, PresentationSession, SessionServices,
};
use classroom_core::slides::Slide;
use std::env;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, prelude::*, reload};

type ReloadHandle = reload::Handle<EnvFilter, tracing_subscriber::Registry>;

const USAGE: &str = "Usage: lesson-stage <lesson.json> [--offline]";

struct Args {
    lesson_path: PathBuf,
    offline: bool,
}

enum Input {
    Command(PresentationCommand),
    Wait(f64),
    Status,
    Help,
    Quit,
}

fn main() {
    let reload_handle = init_tracing();
    if let Err(err) = run(&reload_handle) {
        error!("{err:?}");
        std::process::exit(1);
    }
}

fn run(reload_handle: &ReloadHandle) -> Result<()> {
    let args = parse_args()?;
    let config = load_config(Path::new("conf/config.toml"));
    set_log_level(reload_handle, config.log_level.as_filter_str());
    info!(
        path = %args.lesson_path.display(),
        level = %config.log_level,
        offline = args.offline,
        "Starting lesson presenter"
    );

    let lesson = load_lesson(&args.lesson_path)?;
    let services = build_services(&config, args.offline)?;
    let mut session = PresentationSession::new(lesson, &config, services);

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = Arc::clone(&interrupted);
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))
        .context("Installing Ctrl-C handler")?;

    print_slide(&session);
    let lines = spawn_stdin_reader();
    let frame = Duration::from_millis(config.frame_interval_ms);

    while !interrupted.load(Ordering::SeqCst) {
        match lines.recv_timeout(frame) {
            Ok(line) => match parse_input(&line) {
                Ok(Some(Input::Quit)) => break,
                Ok(Some(input)) => handle_input(&mut session, input, frame, &interrupted),
                Ok(None) => {}
                Err(err) => println!("{err}"),
            },
            Err(RecvTimeoutError::Timeout) => {
                session.tick();
            }
            Err(RecvTimeoutError::Disconnected) => {
                info!("Input closed");
                break;
            }
        }
    }

    if interrupted.load(Ordering::SeqCst) {
        warn!("Interrupted; closing presentation");
    }
    session.close();
    Ok(())
}

fn build_services(config: &AppConfig, offline: bool) -> Result<SessionServices> {
    let (narration, translation): (Box<dyn NarrationService>, Box<dyn TranslationService>) =
        if offline {
            info!("Using offline narration; word lookups are disabled");
            (
                Box::new(OfflineNarration::default()),
                Box::new(UnconfiguredTranslation),
            )
        } else {
            (
                Box::new(HttpNarrationService::from_config(config)?),
                Box::new(HttpTranslationService::from_config(config)?),
            )
        };
    Ok(SessionServices {
        narration,
        translation,
        backend: open_backend(),
        clock: Box::new(SystemClock::new()),
    })
}

#[cfg(feature = "speaker")]
fn open_backend() -> Box<dyn AudioBackend> {
    match classroom_core::audio::SpeakerBackend::open_default() {
        Ok(backend) => Box::new(backend),
        Err(err) => {
            warn!("Audio output unavailable, presenting silently: {err}");
            Box::new(HeadlessBackend::new())
        }
    }
}

#[cfg(not(feature = "speaker"))]
fn open_backend() -> Box<dyn AudioBackend> {
    info!("Built without the speaker feature; narration plays silently");
    Box::new(HeadlessBackend::new())
}

fn handle_input(
    session: &mut PresentationSession,
    input: Input,
    frame: Duration,
    interrupted: &AtomicBool,
) {
    match input {
        Input::Command(PresentationCommand::Answer { question, option }) => {
            match session.answer(question, option) {
                Some(outcome) if outcome.already_answered => {
                    println!("Already answered with option {}", outcome.selected + 1)
                }
                Some(outcome) => {
                    let verdict = if outcome.correct { "Correct" } else { "Incorrect" };
                    println!("{verdict}. {}", outcome.explanation);
                }
                None => println!("No such question or option on this slide"),
            }
        }
        Input::Command(command) => {
            let moves = matches!(
                command,
                PresentationCommand::Next | PresentationCommand::Prev
            );
            let event = session.apply_command(command);
            if moves {
                print_slide(session);
            } else {
                print_event(&event);
            }
        }
        Input::Wait(secs) => {
            let deadline = Instant::now() + Duration::from_secs_f64(secs);
            while Instant::now() < deadline && !interrupted.load(Ordering::SeqCst) {
                thread::sleep(frame);
                session.tick();
            }
            print_event(&session.apply_command(PresentationCommand::Tick));
        }
        Input::Status => match serde_json::to_string_pretty(&session.snapshot()) {
            Ok(json) => println!("{json}"),
            Err(err) => warn!("Failed to render snapshot: {err}"),
        },
        Input::Help => println!(
            "Commands: next, prev, hints, font+, font-, narrate, play, pause, seek <s>, \
             rate <r>, wait <s>, word <w> [x y], close-word, answer <q> <o>, status, quit"
        ),
        Input::Quit => {}
    }
}

fn parse_input(line: &str) -> Result<Option<Input>> {
    let mut parts = line.split_whitespace();
    let Some(verb) = parts.next() else {
        return Ok(None);
    };
    let rest: Vec<&str> = parts.collect();
    let number = |idx: usize| -> Result<f64> {
        let raw = rest
            .get(idx)
            .ok_or_else(|| anyhow!("`{verb}` needs a number"))?;
        raw.parse::<f64>()
            .with_context(|| format!("`{raw}` is not a number"))
    };
    let index = |idx: usize| -> Result<usize> {
        let value = number(idx)?;
        if value < 1.0 || value.fract() != 0.0 {
            bail!("`{verb}` takes positions starting at 1");
        }
        Ok(value as usize - 1)
    };

    let input = match verb {
        "next" | "n" => Input::Command(PresentationCommand::Next),
        "prev" | "p" => Input::Command(PresentationCommand::Prev),
        "hints" => Input::Command(PresentationCommand::ToggleHints),
        "font+" => Input::Command(PresentationCommand::IncreaseFont),
        "font-" => Input::Command(PresentationCommand::DecreaseFont),
        "narrate" => Input::Command(PresentationCommand::PrepareNarration),
        "play" => Input::Command(PresentationCommand::Play),
        "pause" => Input::Command(PresentationCommand::Pause),
        "seek" => Input::Command(PresentationCommand::Seek(number(0)?)),
        "rate" => Input::Command(PresentationCommand::SetRate(number(0)?)),
        "wait" => Input::Wait(number(0)?.clamp(0.0, 600.0)),
        "word" => {
            let token = rest
                .first()
                .ok_or_else(|| anyhow!("`word` needs a word"))?
                .to_string();
            Input::Command(PresentationCommand::LookupWord {
                token,
                x: number(1).unwrap_or(0.0),
                y: number(2).unwrap_or(0.0),
            })
        }
        "close-word" => Input::Command(PresentationCommand::DismissTranslation),
        "answer" => Input::Command(PresentationCommand::Answer {
            question: index(0)?,
            option: index(1)?,
        }),
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => bail!("Unknown command `{other}`; type `help`"),
    };
    Ok(Some(input))
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn print_slide(session: &PresentationSession) {
    let Some(slide) = session.current_slide() else {
        println!("(empty deck)");
        return;
    };
    println!(
        "\n[{}/{}] {}",
        session.current_index() + 1,
        session.slide_count(),
        slide.heading()
    );
    match slide {
        Slide::Title { subtitle, .. } => println!("{subtitle}"),
        Slide::Content { text, .. } | Slide::ConversationPoint { text, .. } => {
            println!("{text}")
        }
        Slide::ReadingCompact {
            text, vocabulary, ..
        } => {
            println!("{text}");
            if !vocabulary.is_empty() {
                println!("\nVocabulary:\n{vocabulary}");
                println!("Key words: {}", slide.vocabulary_headwords().join(", "));
            }
        }
        Slide::Quiz { questions, .. } => {
            for (q_idx, question) in questions.iter().enumerate() {
                println!("{}. {}", q_idx + 1, question.question);
                for (o_idx, option) in question.options.iter().enumerate() {
                    println!("   {}) {option}", o_idx + 1);
                }
            }
        }
    }
    if !slide.support_questions().is_empty() {
        println!("(type `hints` to show {} support questions)", slide.support_questions().len());
    }
}

fn print_event(event: &PresentationEvent) {
    let snapshot = &event.snapshot;
    if let Some(notice) = &snapshot.notice {
        println!("! {notice}");
    }
    match event.action.as_str() {
        "toggle_hints" => {
            if snapshot.show_hints {
                for question in snapshot
                    .slide
                    .as_ref()
                    .map(Slide::support_questions)
                    .unwrap_or_default()
                {
                    println!("  - {question}");
                }
            } else {
                println!("Hints hidden");
            }
        }
        "increase_font" | "decrease_font" => println!("Font size {}", snapshot.font_size),
        "lookup_word" | "dismiss_translation" => match &snapshot.translation {
            Some(popover) => println!("{} → {}", popover.key.word, popover.display_text()),
            None => println!("No translation shown"),
        },
        _ => {
            let narration = &snapshot.narration;
            println!(
                "{} {} / {} ({:.0}%) at {:.2}x",
                narration.status,
                narration.position_label,
                narration.duration_label,
                narration.progress() * 100.0,
                narration.rate
            );
        }
    }
}

fn parse_args() -> Result<Args> {
    let mut lesson_path = None;
    let mut offline = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--offline" => offline = true,
            _ if lesson_path.is_none() => lesson_path = Some(PathBuf::from(arg)),
            _ => bail!("{USAGE}"),
        }
    }
    let lesson_path = lesson_path.ok_or_else(|| anyhow!(USAGE))?;
    if !lesson_path.exists() {
        return Err(anyhow!("File not found: {}", lesson_path.display()));
    }
    Ok(Args {
        lesson_path,
        offline,
    })
}

fn init_tracing() -> ReloadHandle {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));
    let (filter_layer, handle) = reload::Layer::new(env_filter);
    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(io::stderr)
                .with_target(true)
                .with_filter(filter_layer),
        )
        .init();
    info!("Logging initialized; override level with config.log_level or RUST_LOG");
    handle
}

fn set_log_level(handle: &ReloadHandle, level: &str) {
    let parsed = EnvFilter::builder()
        .parse(level)
        .unwrap_or_else(|_| EnvFilter::new("debug"));
    if let Err(err) = handle.modify(|filter| *filter = parsed.clone()) {
        warn!(%level, "Failed to update log level from config: {err}");
    } else {
        info!(%level, "Applied log level from config");
    }
}
