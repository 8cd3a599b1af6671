//! Gesture scripts
//!
//! A script is a JSON document describing the player state to start from
//! and a list of steps to replay against a sheet. Every step is followed by
//! a frame sample; waits sample at the configured frame interval.
//!
//! ```json
//! {
//!   "player": { "current_song": { "id": "1", "title": "Intro" }, "is_playing": true },
//!   "steps": [
//!     { "action": "sheet_drag", "deltas": [-40, -40, -40], "interval_ms": 8 },
//!     { "action": "wait", "ms": 400 },
//!     { "action": "back", "progress": [0.2, 0.4], "commit": true },
//!     { "action": "settle" }
//!   ]
//! }
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use morph_sheet::{PlayerSnapshot, SheetFrame, Song, StylePreferences, UnifiedPlayerSheet};

fn default_interval_ms() -> u64 {
    16
}

fn default_true() -> bool {
    true
}

/// A scripted session
#[derive(Debug, Default, Deserialize)]
pub struct Script {
    #[serde(default)]
    pub player: Option<PlayerSnapshot>,
    #[serde(default)]
    pub style: Option<StylePreferences>,
    #[serde(default)]
    pub steps: Vec<Step>,
}

/// One scripted input
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    Expand,
    Collapse,
    Toggle,
    Tap,
    /// Let time pass, sampling every frame
    Wait { ms: u64 },
    /// Wait until every animation has settled
    Settle,
    /// Vertical drag on the sheet, one delta per interval
    SheetDrag {
        deltas: Vec<f32>,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
        #[serde(default = "default_true")]
        release: bool,
    },
    /// Horizontal swipe on the mini player
    MiniSwipe {
        deltas: Vec<f32>,
        #[serde(default = "default_interval_ms")]
        interval_ms: u64,
    },
    QueueHeight { px: f32 },
    OpenQueue,
    CloseQueue,
    /// Drag the queue sheet and release with `velocity` (px/s)
    QueueDrag { deltas: Vec<f32>, velocity: f32 },
    CastHeight { px: f32 },
    OpenCast,
    DismissCast,
    /// Predictive back progress updates, then commit or cancel
    Back {
        progress: Vec<f32>,
        #[serde(default = "default_true")]
        commit: bool,
    },
    HandleBack,
    SavePlaylist { name: String },
    DismissOverlay,
    Player { snapshot: PlayerSnapshot },
    Keyboard { visible: bool },
    CollapsedY { y: f32 },
    NavigateToAlbum { song: Song },
}

impl Script {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse script {}", path.display()))
    }
}

/// One emitted output line
#[derive(Debug, Serialize)]
pub struct Sample<'a> {
    pub t_ms: u64,
    pub step: usize,
    pub action: &'a str,
    pub frame: SheetFrame,
}

/// Replays steps against a sheet, emitting samples through `emit`
pub struct Replay<'a, E> {
    sheet: &'a UnifiedPlayerSheet,
    frame_interval: Duration,
    started: Instant,
    emit: E,
}

impl<'a, E> Replay<'a, E>
where
    E: FnMut(&Sample<'_>) -> Result<()>,
{
    pub fn new(sheet: &'a UnifiedPlayerSheet, frame_ms: u64, emit: E) -> Self {
        Self {
            sheet,
            frame_interval: Duration::from_millis(frame_ms.max(1)),
            started: Instant::now(),
            emit,
        }
    }

    fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    fn sample(&mut self, step: usize, action: &str) -> Result<()> {
        let sample = Sample {
            t_ms: self.elapsed_ms(),
            step,
            action,
            frame: self.sheet.frame(),
        };
        (self.emit)(&sample)
    }

    async fn wait(&mut self, step: usize, action: &str, total: Duration) -> Result<()> {
        let deadline = Instant::now() + total;
        while Instant::now() < deadline {
            let next = (Instant::now() + self.frame_interval).min(deadline);
            tokio::time::sleep_until(next).await;
            self.sample(step, action)?;
        }
        Ok(())
    }

    pub async fn run(&mut self, script: &Script) -> Result<()> {
        if let Some(style) = &script.style {
            self.sheet.update_style(style.clone());
        }
        if let Some(player) = &script.player {
            self.sheet.update_player(player.clone());
        }
        self.sample(0, "start")?;

        for (index, step) in script.steps.iter().enumerate() {
            let index = index + 1;
            let action = step.name();
            debug!(index, action, "step");
            self.apply(index, action, step).await?;
            self.sample(index, action)?;
        }

        info!(steps = script.steps.len(), elapsed_ms = self.elapsed_ms(), "script finished");
        Ok(())
    }

    async fn apply(&mut self, index: usize, action: &str, step: &Step) -> Result<()> {
        let sheet = self.sheet;
        match step {
            Step::Expand => sheet.expand(),
            Step::Collapse => sheet.collapse(),
            Step::Toggle => sheet.toggle(),
            Step::Tap => sheet.on_player_tap(),
            Step::Wait { ms } => {
                self.wait(index, action, Duration::from_millis(*ms)).await?;
            }
            Step::Settle => sheet.wait_idle().await,
            Step::SheetDrag {
                deltas,
                interval_ms,
                release,
            } => {
                let start = self.elapsed_ms();
                if !sheet.on_sheet_drag_start(start) {
                    info!("sheet drag rejected");
                    return Ok(());
                }
                for (i, delta) in deltas.iter().enumerate() {
                    self.wait(index, action, Duration::from_millis(*interval_ms)).await?;
                    sheet.on_sheet_drag(*delta, start + (i as u64 + 1) * interval_ms);
                }
                if *release {
                    sheet.on_sheet_drag_end();
                }
            }
            Step::MiniSwipe {
                deltas,
                interval_ms,
            } => {
                let start = self.elapsed_ms();
                if !sheet.on_mini_swipe_start(start) {
                    info!("mini player swipe rejected");
                    return Ok(());
                }
                for (i, delta) in deltas.iter().enumerate() {
                    self.wait(index, action, Duration::from_millis(*interval_ms)).await?;
                    sheet.on_mini_swipe(*delta, start + (i as u64 + 1) * interval_ms);
                }
                sheet.on_mini_swipe_end();
            }
            Step::QueueHeight { px } => sheet.set_queue_sheet_height(*px),
            Step::OpenQueue => sheet.open_queue(),
            Step::CloseQueue => sheet.close_queue(),
            Step::QueueDrag { deltas, velocity } => {
                sheet.on_queue_drag_start();
                for delta in deltas {
                    sheet.on_queue_drag(*delta);
                }
                sheet.on_queue_drag_end(deltas.iter().sum(), *velocity);
            }
            Step::CastHeight { px } => sheet.set_cast_sheet_height(*px),
            Step::OpenCast => sheet.open_cast(),
            Step::DismissCast => sheet.dismiss_cast(),
            Step::Back { progress, commit } => {
                for p in progress {
                    sheet.update_predictive_back(*p);
                    self.wait(index, action, self.frame_interval).await?;
                }
                if *commit {
                    sheet.commit_back();
                } else {
                    sheet.cancel_back();
                }
            }
            Step::HandleBack => {
                let consumed = sheet.handle_back();
                debug!(consumed, "back press");
            }
            Step::SavePlaylist { name } => {
                let songs = sheet.player().queue;
                sheet.save_queue_as_playlist(songs, name.clone());
            }
            Step::DismissOverlay => {
                sheet.dismiss_save_queue_overlay();
            }
            Step::Player { snapshot } => sheet.update_player(snapshot.clone()),
            Step::Keyboard { visible } => sheet.set_keyboard_visible(*visible),
            Step::CollapsedY { y } => sheet.set_collapsed_target_y(*y),
            Step::NavigateToAlbum { song } => sheet.navigate_to_album(song),
        }
        Ok(())
    }
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Step::Expand => "expand",
            Step::Collapse => "collapse",
            Step::Toggle => "toggle",
            Step::Tap => "tap",
            Step::Wait { .. } => "wait",
            Step::Settle => "settle",
            Step::SheetDrag { .. } => "sheet_drag",
            Step::MiniSwipe { .. } => "mini_swipe",
            Step::QueueHeight { .. } => "queue_height",
            Step::OpenQueue => "open_queue",
            Step::CloseQueue => "close_queue",
            Step::QueueDrag { .. } => "queue_drag",
            Step::CastHeight { .. } => "cast_height",
            Step::OpenCast => "open_cast",
            Step::DismissCast => "dismiss_cast",
            Step::Back { .. } => "back",
            Step::HandleBack => "handle_back",
            Step::SavePlaylist { .. } => "save_playlist",
            Step::DismissOverlay => "dismiss_overlay",
            Step::Player { .. } => "player",
            Step::Keyboard { .. } => "keyboard",
            Step::CollapsedY { .. } => "collapsed_y",
            Step::NavigateToAlbum { .. } => "navigate_to_album",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_script() {
        let script: Script = serde_json::from_str(
            r#"{
                "player": { "current_song": { "id": "1", "title": "Intro" } },
                "steps": [
                    { "action": "expand" },
                    { "action": "wait", "ms": 300 },
                    { "action": "sheet_drag", "deltas": [10, 20] },
                    { "action": "back", "progress": [0.5], "commit": false }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(script.steps.len(), 4);
        assert!(matches!(
            script.steps[2],
            Step::SheetDrag {
                interval_ms: 16,
                release: true,
                ..
            }
        ));
        assert!(matches!(script.steps[3], Step::Back { commit: false, .. }));
        assert_eq!(script.player.unwrap().current_song.unwrap().album_id, -1);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let err = serde_json::from_str::<Script>(r#"{ "steps": [{ "action": "explode" }] }"#);
        assert!(err.is_err());
    }
}
