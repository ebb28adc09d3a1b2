//! CLI command implementations

use crate::output::{print_record, OutputFormat};
use anyhow::{bail, Context};
use playhead_core::{
    buffered_percent, compute_buffered_sections, format_basic_time, parse_duration_to_millis,
    parse_query_string, seconds_to_timecode, start_time_from_query, timecode_to_seconds,
    validate_timecode, CommandSubscription, KeyEvent, OptionsPatch, PlayerConfig, PlayerSession,
    Shortcut, SimulatedMedia, TimeRange,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info};

/// Load the player configuration, falling back to defaults
pub fn load_config(path: Option<&Path>) -> anyhow::Result<PlayerConfig> {
    match path {
        Some(path) => {
            let config = PlayerConfig::from_file(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            debug!(path = %path.display(), "Loaded config");
            Ok(config)
        }
        None => Ok(PlayerConfig::default()),
    }
}

#[derive(Serialize)]
struct TimecodeReport {
    seconds: f64,
    frame_rate: f64,
    timecode: String,
}

/// Convert seconds to a timecode
pub fn timecode(seconds: f64, frame_rate: f64, format: &str) -> anyhow::Result<()> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        bail!("frame rate must be a positive number: {frame_rate}");
    }
    let Some(timecode) = seconds_to_timecode(seconds, frame_rate) else {
        bail!("cannot express {seconds} as a timecode");
    };
    print_record(
        &TimecodeReport {
            seconds,
            frame_rate,
            timecode,
        },
        format,
    )
}

/// Convert a timecode to seconds
pub fn seconds(code: &str, frame_rate: f64, format: &str) -> anyhow::Result<()> {
    if !(frame_rate.is_finite() && frame_rate > 0.0) {
        bail!("frame rate must be a positive number: {frame_rate}");
    }
    let Some(timecode) = validate_timecode(code) else {
        bail!("not a valid timecode: {code}");
    };
    let seconds = timecode_to_seconds(&timecode, frame_rate);
    print_record(
        &TimecodeReport {
            seconds,
            frame_rate,
            timecode,
        },
        format,
    )
}

#[derive(Serialize)]
struct StartTimeReport {
    input: String,
    milliseconds: f64,
    formatted: String,
}

/// Parse a start time
pub fn start_time(value: &str, frame_rate: f64, query: bool, format: &str) -> anyhow::Result<()> {
    let milliseconds = if query {
        start_time_from_query(&parse_query_string(value), frame_rate)
    } else {
        parse_duration_to_millis(value, frame_rate)
    };
    print_record(
        &StartTimeReport {
            input: value.to_string(),
            milliseconds,
            formatted: format_basic_time(milliseconds),
        },
        format,
    )
}

fn parse_range(raw: &str) -> anyhow::Result<TimeRange> {
    let (start, end) = raw
        .split_once(':')
        .with_context(|| format!("expected start:end, got {raw}"))?;
    let start: f64 = start
        .trim()
        .parse()
        .with_context(|| format!("invalid range start in {raw}"))?;
    let end: f64 = end
        .trim()
        .parse()
        .with_context(|| format!("invalid range end in {raw}"))?;
    if end < start {
        bail!("range ends before it starts: {raw}");
    }
    Ok(TimeRange::new(start, end))
}

/// Compute buffered sections
pub fn buffered(duration: f64, raw_ranges: &[String], format: &str) -> anyhow::Result<()> {
    let ranges = raw_ranges
        .iter()
        .map(|raw| parse_range(raw))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let sections = compute_buffered_sections(&ranges, duration);
    let percent = buffered_percent(&ranges, duration);

    match OutputFormat::from(format) {
        OutputFormat::Json => print_record(
            &serde_json::json!({ "buffered": percent, "sections": sections }),
            format,
        )?,
        OutputFormat::Text => {
            println!("Buffered: {percent:.2}%");
            for section in &sections {
                println!(
                    "  {:<12} {:>7.2}% - {:>7.2}%",
                    section.key, section.start, section.end
                );
            }
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct ShortcutEntry {
    key: &'static str,
    key_code: u32,
    shortcut: Shortcut,
}

/// List the keyboard shortcut table
pub fn shortcuts(format: &str) -> anyhow::Result<()> {
    let entries: Vec<ShortcutEntry> = Shortcut::ALL
        .iter()
        .map(|(key_code, shortcut)| ShortcutEntry {
            key: shortcut.key_label(),
            key_code: *key_code,
            shortcut: *shortcut,
        })
        .collect();

    match OutputFormat::from(format) {
        OutputFormat::Json => print_record(&entries, format)?,
        OutputFormat::Text => {
            println!("Keyboard shortcuts:");
            for entry in &entries {
                println!("  {:<6} ({:>3})  {:?}", entry.key, entry.key_code, entry.shortcut);
            }
        }
    }
    Ok(())
}

// =============================================================================
// Session replay
// =============================================================================

/// Media loaded before the first step
#[derive(Debug, Deserialize)]
struct ScriptMedia {
    src: String,
    duration: f64,
    #[serde(default)]
    width: u32,
    #[serde(default)]
    height: u32,
}

/// One scripted interaction
#[derive(Debug, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
enum Step {
    TogglePlay,
    ToggleMute,
    SetVolume { volume: f64 },
    SetPlaybackRate { rate: f64 },
    Seek { seconds: f64 },
    SeekByPercent { percent: f64 },
    Step { millis: f64 },
    StepForward,
    StepBack,
    IncreaseRate,
    DecreaseRate,
    ResetRate,
    ScrubStart,
    ScrubStop {
        #[serde(default)]
        resume: bool,
    },
    Key {
        key_code: u32,
        #[serde(default)]
        ctrl: bool,
        #[serde(default)]
        shift: bool,
    },
    /// Let the media clock run
    Advance { seconds: f64 },
    Buffer { ranges: Vec<TimeRange> },
    Options { keyboard_shortcuts: bool },
    Reset,
}

#[derive(Debug, Deserialize)]
struct Script {
    media: ScriptMedia,
    #[serde(default)]
    steps: Vec<Step>,
}

/// State after one replay step
#[derive(Serialize)]
struct ReplayFrame {
    step: usize,
    op: String,
    timecode: Option<String>,
    current_time: f64,
    progress: f64,
    buffered: f64,
    is_playing: bool,
    is_muted: bool,
    is_scrubbing: bool,
    volume: f64,
    playback_rate: f64,
}

struct Replay {
    session: PlayerSession,
    listener: CommandSubscription,
    media: SimulatedMedia,
}

impl Replay {
    fn new(config: PlayerConfig, media: &ScriptMedia) -> anyhow::Result<Self> {
        let session = PlayerSession::new(config)?;
        let listener = session.subscribe_commands();
        let mut simulated = SimulatedMedia::new();
        simulated.load(media.src.clone(), media.duration, media.width, media.height);

        let mut replay = Self {
            session,
            listener,
            media: simulated,
        };
        replay.sync()?;
        Ok(replay)
    }

    /// Hand emitted commands to the media, report its state, apply the queue
    fn sync(&mut self) -> anyhow::Result<()> {
        for command in self.listener.drain() {
            self.media.apply(&command);
        }
        self.session
            .commands()
            .update_state(self.media.signal().clone())?;
        self.session.process_pending();
        Ok(())
    }

    fn run(&mut self, step: &Step) -> anyhow::Result<()> {
        let commands = self.session.commands();
        match step {
            Step::TogglePlay => commands.toggle_play(),
            Step::ToggleMute => commands.toggle_mute(),
            Step::SetVolume { volume } => commands.set_volume(*volume)?,
            Step::SetPlaybackRate { rate } => commands.set_playback_rate(*rate)?,
            Step::Seek { seconds } => commands.seek(*seconds)?,
            Step::SeekByPercent { percent } => commands.seek_by_percent(*percent)?,
            Step::Step { millis } => commands.step(*millis)?,
            Step::StepForward => commands.step_forward()?,
            Step::StepBack => commands.step_back()?,
            Step::IncreaseRate => commands.increase_playback_rate()?,
            Step::DecreaseRate => commands.decrease_playback_rate()?,
            Step::ResetRate => commands.reset_playback_rate()?,
            Step::ScrubStart => commands.scrub_start()?,
            Step::ScrubStop { resume } => commands.scrub_stop(*resume)?,
            Step::Key {
                key_code,
                ctrl,
                shift,
            } => {
                let event = KeyEvent {
                    ctrl: *ctrl,
                    shift: *shift,
                    ..KeyEvent::new(*key_code)
                };
                if !commands.handle_key_down(&event)? {
                    debug!(key_code, "Key not handled");
                }
            }
            Step::Advance { seconds } => self.media.advance(*seconds),
            Step::Buffer { ranges } => self.media.set_buffered(ranges.clone()),
            Step::Options { keyboard_shortcuts } => commands.update_options(OptionsPatch {
                keyboard_shortcuts: Some(*keyboard_shortcuts),
            })?,
            Step::Reset => commands.reset()?,
        }
        self.sync()
    }

    fn frame(&self, step: usize, op: String) -> ReplayFrame {
        let playback = self.session.playback();
        let timing = self.session.timing();
        ReplayFrame {
            step,
            op,
            timecode: seconds_to_timecode(timing.current_time, playback.frame_rate),
            current_time: timing.current_time,
            progress: timing.progress,
            buffered: timing.buffered,
            is_playing: playback.is_playing,
            is_muted: playback.is_muted,
            is_scrubbing: playback.is_scrubbing,
            volume: playback.volume,
            playback_rate: playback.playback_rate,
        }
    }
}

fn op_name(step: &Step) -> String {
    format!("{step:?}")
        .split([' ', '{'])
        .next()
        .unwrap_or_default()
        .to_string()
}

/// Replay a scripted session
pub fn replay(path: &Path, config: PlayerConfig, format: &str) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    let script: Script = serde_json::from_str(&raw)
        .with_context(|| format!("invalid replay script {}", path.display()))?;
    info!(steps = script.steps.len(), src = %script.media.src, "Replaying script");

    let mut replay = Replay::new(config, &script.media)?;
    let mut frames = vec![replay.frame(0, "load".to_string())];
    for (index, step) in script.steps.iter().enumerate() {
        replay
            .run(step)
            .with_context(|| format!("step {} ({}) failed", index + 1, op_name(step)))?;
        frames.push(replay.frame(index + 1, op_name(step)));
    }
    replay.session.dispose();

    match OutputFormat::from(format) {
        OutputFormat::Json => print_record(&frames, format)?,
        OutputFormat::Text => {
            for frame in &frames {
                println!(
                    "{:>3} {:<16} {:<14} {:>6.2}% {:>6.2}% {:<7} rate {:<5} vol {:.2}{}{}",
                    frame.step,
                    frame.op,
                    frame.timecode.as_deref().unwrap_or("-"),
                    frame.progress,
                    frame.buffered,
                    if frame.is_playing { "playing" } else { "paused" },
                    frame.playback_rate,
                    frame.volume,
                    if frame.is_muted { " muted" } else { "" },
                    if frame.is_scrubbing { " scrubbing" } else { "" },
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_range() {
        let range = parse_range("1.5:4").unwrap();
        assert_eq!(range.start, 1.5);
        assert_eq!(range.end, 4.0);
        assert!(parse_range("4").is_err());
        assert!(parse_range("4:1").is_err());
    }

    #[test]
    fn test_script_steps() {
        let script: Script = serde_json::from_str(
            r#"{
                "media": {"src": "clip.mp4", "duration": 60},
                "steps": [
                    {"op": "options", "keyboard_shortcuts": true},
                    {"op": "key", "key_code": 32},
                    {"op": "advance", "seconds": 2},
                    {"op": "set_volume", "volume": 0.5},
                    {"op": "scrub_stop"}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(script.steps.len(), 5);
        assert_eq!(op_name(&script.steps[1]), "Key");
        assert_eq!(op_name(&script.steps[4]), "ScrubStop");
    }

    #[test]
    fn test_replay_drives_session() {
        let media = ScriptMedia {
            src: "clip.mp4".into(),
            duration: 60.0,
            width: 1280,
            height: 720,
        };
        let mut replay = Replay::new(PlayerConfig::default(), &media).unwrap();
        for step in [
            Step::Options {
                keyboard_shortcuts: true,
            },
            Step::Key {
                key_code: 32,
                ctrl: false,
                shift: false,
            },
            Step::Advance { seconds: 3.0 },
            Step::ToggleMute,
            Step::SetVolume { volume: 0.25 },
        ] {
            replay.run(&step).unwrap();
        }

        let frame = replay.frame(5, "set_volume".into());
        assert!(frame.is_playing);
        assert!(!frame.is_muted);
        assert_eq!(frame.volume, 0.25);
        assert_eq!(frame.current_time, 3.0);
        assert_eq!(frame.timecode.as_deref(), Some("0:00:03:00"));
    }
}
