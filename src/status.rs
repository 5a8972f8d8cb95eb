//! Pipeline status reporting for accessible and standard output modes.
//!
//! Generation runs six stages. A [`StatusReporter`] receives each stage as
//! it starts. The accessible reporter writes one labelled line per stage to
//! stderr; the standard reporter keeps one persistent `indicatif` line per
//! stage and marks it done or failed.

use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::io::{self, Write};
use std::sync::{Mutex, PoisonError};

fn stage_label(current: u32, total: u32, description: &str) -> String {
    format!("Stage {current}/{total}: {description}")
}

/// Report pipeline progress to the user.
pub trait StatusReporter {
    /// Emit a status update for the given pipeline stage.
    fn report_stage(&self, current: u32, total: u32, description: &str);

    /// Emit a completion message after a successful run.
    fn report_complete(&self, summary: &str);
}

/// Accessible reporter: writes static, labelled lines to stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct AccessibleReporter;

impl StatusReporter for AccessibleReporter {
    fn report_stage(&self, current: u32, total: u32, description: &str) {
        // Status output failures never abort generation.
        drop(writeln!(io::stderr(), "{}", stage_label(current, total, description)));
    }

    fn report_complete(&self, summary: &str) {
        drop(writeln!(io::stderr(), "{summary}"));
    }
}

/// Silent reporter: emits nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct SilentReporter;

impl StatusReporter for SilentReporter {
    fn report_stage(&self, _current: u32, _total: u32, _description: &str) {}
    fn report_complete(&self, _summary: &str) {}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StageState {
    Pending,
    Running,
    Done,
    Failed,
}

impl StageState {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Running => "running",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }
}

#[derive(Debug)]
struct IndicatifState {
    // Keeps the draw target alive for the bars.
    _progress: MultiProgress,
    bars: Vec<ProgressBar>,
    running_index: Option<usize>,
    completed: bool,
    is_hidden: bool,
}

/// Standard reporter backed by `indicatif::MultiProgress`.
#[derive(Debug)]
pub struct IndicatifReporter {
    state: Mutex<IndicatifState>,
}

impl IndicatifReporter {
    /// Construct a reporter with one persistent line per stage.
    #[must_use]
    pub fn new() -> Self {
        let progress = MultiProgress::with_draw_target(ProgressDrawTarget::stderr_with_hz(12));
        progress.set_move_cursor(false);
        let style = ProgressStyle::with_template("{msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());

        let bars = PipelineStage::ALL
            .iter()
            .map(|stage| {
                let bar = progress.add(ProgressBar::new(1));
                bar.set_style(style.clone());
                bar.set_message(summary_line(
                    StageState::Pending,
                    stage.index(),
                    stage.description(),
                ));
                bar
            })
            .collect();

        Self {
            state: Mutex::new(IndicatifState {
                is_hidden: progress.is_hidden(),
                _progress: progress,
                bars,
                running_index: None,
                completed: false,
            }),
        }
    }

    fn set_stage_state(state: &IndicatifState, index: usize, stage_state: StageState) {
        let Some(stage) = PipelineStage::ALL.get(index) else {
            return;
        };
        let message = summary_line(stage_state, stage.index(), stage.description());
        if state.is_hidden {
            drop(writeln!(io::stderr(), "{message}"));
            return;
        }
        if let Some(bar) = state.bars.get(index) {
            if stage_state == StageState::Running {
                bar.set_message(message);
            } else {
                bar.finish_with_message(message);
            }
        }
    }
}

fn summary_line(state: StageState, current: u32, description: &str) -> String {
    format!(
        "[{}] {}",
        state.as_str(),
        stage_label(current, PIPELINE_STAGE_COUNT, description)
    )
}

impl Default for IndicatifReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for IndicatifReporter {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.completed {
            return;
        }
        if let Some(index) = state.running_index.take() {
            Self::set_stage_state(&state, index, StageState::Failed);
        }
    }
}

impl StatusReporter for IndicatifReporter {
    fn report_stage(&self, current: u32, _total: u32, _description: &str) {
        let Ok(index) = usize::try_from(current.saturating_sub(1)) else {
            return;
        };
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if index >= state.bars.len() {
            return;
        }
        if let Some(previous) = state.running_index
            && previous != index
        {
            Self::set_stage_state(&state, previous, StageState::Done);
        }
        Self::set_stage_state(&state, index, StageState::Running);
        state.running_index = Some(index);
    }

    fn report_complete(&self, summary: &str) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = state.running_index.take() {
            Self::set_stage_state(&state, index, StageState::Done);
        }
        state.completed = true;
        drop(writeln!(io::stderr(), "{summary}"));
    }
}

/// The stages of project generation, in reporting order.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    /// Stage 1: gather the files shown in the navigator.
    CollectSources = 1,
    /// Stage 2: apply the target filter.
    SelectTargets = 2,
    /// Stage 3: create the project targets.
    MaterializeTargets = 3,
    /// Stage 4: attach test files and host dependencies.
    WireTestModules = 4,
    /// Stage 5: assign object identifiers.
    AssignIdentifiers = 5,
    /// Stage 6: render and write the project files.
    WriteFiles = 6,
}

impl PipelineStage {
    /// All stages in reporting order.
    pub const ALL: [Self; 6] = [
        Self::CollectSources,
        Self::SelectTargets,
        Self::MaterializeTargets,
        Self::WireTestModules,
        Self::AssignIdentifiers,
        Self::WriteFiles,
    ];

    /// 1-based index of this stage.
    #[must_use]
    pub const fn index(self) -> u32 {
        self as u32
    }

    /// Convert a 1-based index into a stage.
    #[must_use]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            1 => Some(Self::CollectSources),
            2 => Some(Self::SelectTargets),
            3 => Some(Self::MaterializeTargets),
            4 => Some(Self::WireTestModules),
            5 => Some(Self::AssignIdentifiers),
            6 => Some(Self::WriteFiles),
            _ => None,
        }
    }

    /// Human-readable description.
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::CollectSources => "Collecting source files",
            Self::SelectTargets => "Selecting targets",
            Self::MaterializeTargets => "Creating project targets",
            Self::WireTestModules => "Wiring test modules",
            Self::AssignIdentifiers => "Assigning object identifiers",
            Self::WriteFiles => "Writing project files",
        }
    }
}

/// The total number of pipeline stages.
pub const PIPELINE_STAGE_COUNT: u32 = 6;

const _: () = assert!(
    PipelineStage::ALL.len() == PIPELINE_STAGE_COUNT as usize,
    "PipelineStage::ALL length must equal PIPELINE_STAGE_COUNT"
);

/// Report `stage` via `reporter`.
pub fn report_pipeline_stage(reporter: &dyn StatusReporter, stage: PipelineStage) {
    reporter.report_stage(stage.index(), PIPELINE_STAGE_COUNT, stage.description());
}
