//! Main TUI application state and logic
//!
//! The viewer walks a finished [`Analysis`]: one position per captured loop
//! iteration followed by a summary position showing the final structures and
//! the full output.

use super::panes::{
    render_loop_pane, render_output_pane, render_source_pane, render_status_bar,
    render_structures_pane, LoopRenderData, StructureRow, StructuresRenderData,
};
use crate::snapshot::result::Analysis;
use crate::snapshot::StateSnapshot;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::{Duration, Instant};

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Source,
    Structures,
    Loop,
    Output,
}

impl FocusedPane {
    /// Move focus to the next pane (clockwise: source -> output -> structures -> loop)
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Output,
            FocusedPane::Output => FocusedPane::Structures,
            FocusedPane::Structures => FocusedPane::Loop,
            FocusedPane::Loop => FocusedPane::Source,
        }
    }

    /// Move focus to the previous pane (counter-clockwise)
    pub fn prev(self) -> Self {
        match self {
            FocusedPane::Source => FocusedPane::Loop,
            FocusedPane::Output => FocusedPane::Source,
            FocusedPane::Structures => FocusedPane::Output,
            FocusedPane::Loop => FocusedPane::Structures,
        }
    }
}

/// The main application state
pub struct App {
    pub analysis: Analysis,

    /// The source code that was analyzed
    pub source_code: String,

    /// 1-based line of the traced loop's header, 0 if none was found
    pub loop_line: usize,

    /// Keys of the captured iterations, ascending
    steps: Vec<usize>,

    /// Index into `steps`; `steps.len()` is the summary position
    position: usize,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub source_scroll: usize,
    pub structures_scroll: usize,
    pub loop_scroll: usize,
    pub output_scroll: usize,

    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,

    /// Last time space was pressed (for debouncing)
    pub last_space_press: Instant,
}

impl App {
    /// Create a viewer positioned on the first iteration, or on the summary
    /// when the snippet has no traced iterations
    pub fn new(analysis: Analysis, source_code: String) -> Self {
        let steps: Vec<usize> = analysis.iteration_state.keys().copied().collect();
        let loop_line = if analysis.has_loop {
            find_loop_line(&source_code)
        } else {
            0
        };
        let now = Instant::now();
        App {
            analysis,
            source_code,
            loop_line,
            steps,
            position: 0,
            focused_pane: FocusedPane::Source,
            source_scroll: 0,
            structures_scroll: 0,
            loop_scroll: 0,
            output_scroll: 0,
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: now,
            last_space_press: now.checked_sub(Duration::from_secs(1)).unwrap_or(now),
        }
    }

    /// Iteration currently shown, `None` on the summary
    pub fn current_iteration(&self) -> Option<usize> {
        self.steps.get(self.position).copied()
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                if self.step_forward() {
                    self.status_message = "Playing...".to_string();
                } else {
                    self.is_playing = false;
                    self.status_message = "Playback complete".to_string();
                }
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout to allow auto-play to work
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(frame.area());

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(main_chunks[0]);

        // Left column: Source (top) | Output (bottom)
        let left_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(70), Constraint::Percentage(30)])
            .split(columns[0]);

        // Right column: Structures (top) | Loop (bottom)
        let right_rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
            .split(columns[1]);

        let iteration = self.current_iteration();
        let analysis = &self.analysis;

        render_source_pane(
            frame,
            left_rows[0],
            &self.source_code,
            if iteration.is_some() { self.loop_line } else { 0 },
            self.focused_pane == FocusedPane::Source,
            &mut self.source_scroll,
        );

        let (output_title, output_lines): (String, &[String]) = match iteration {
            Some(index) => (
                format!("Output · iteration {}", index + 1),
                analysis
                    .iteration_outputs
                    .get(&index)
                    .map(Vec::as_slice)
                    .unwrap_or(&[]),
            ),
            None => ("Output".to_string(), &analysis.output),
        };
        render_output_pane(
            frame,
            left_rows[1],
            &output_title,
            output_lines,
            self.focused_pane == FocusedPane::Output,
            &mut self.output_scroll,
        );

        let structures = match iteration.and_then(|index| analysis.iteration_state.get(&index)) {
            Some(state) => {
                let previous = self
                    .position
                    .checked_sub(1)
                    .and_then(|p| self.steps.get(p))
                    .and_then(|index| analysis.iteration_state.get(index));
                StructuresRenderData {
                    title: format!("State · iteration {}", self.position + 1),
                    rows: state_rows(state, previous),
                    iterator: analysis.iterator.as_deref(),
                }
            }
            None => StructuresRenderData {
                title: "Structures".to_string(),
                rows: analysis
                    .structures
                    .iter()
                    .map(|entry| StructureRow {
                        name: &entry.name,
                        kind: Some(entry.kind),
                        data: &entry.data,
                        changed: false,
                    })
                    .collect(),
                iterator: analysis.iterator.as_deref(),
            },
        };
        render_structures_pane(
            frame,
            right_rows[0],
            structures,
            self.focused_pane == FocusedPane::Structures,
            &mut self.structures_scroll,
        );

        render_loop_pane(
            frame,
            right_rows[1],
            LoopRenderData {
                has_loop: analysis.has_loop,
                iterator: analysis.iterator.as_deref(),
                target: analysis.target.as_deref(),
                dependencies: &analysis.loop_dependencies,
                index_operations: &analysis.index_operations,
            },
            self.focused_pane == FocusedPane::Loop,
            &mut self.loop_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.current_iteration().map(|_| self.position),
            self.steps.len(),
            self.is_playing,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            // Number keys step forward N times directly
            KeyCode::Char(c @ '1'..='9') => {
                self.is_playing = false;
                let n = c as usize - '0' as usize;
                let stepped = (0..n).take_while(|_| self.step_forward()).count();
                self.status_message = format!("Stepped forward {stepped} step(s)");
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::BackTab => {
                self.focused_pane = self.focused_pane.prev();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.status_message = if self.step_backward() {
                    "Stepped backward".to_string()
                } else {
                    "Cannot step backward: at the first iteration".to_string()
                };
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.status_message = if self.step_forward() {
                    "Stepped forward".to_string()
                } else {
                    "Cannot step forward: at the summary".to_string()
                };
            }
            KeyCode::Up => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_sub(1);
            }
            KeyCode::Down => {
                let scroll = self.focused_scroll();
                *scroll = scroll.saturating_add(1);
            }
            KeyCode::Char(' ') => {
                // Toggle auto-play mode (with 200ms debounce to prevent key repeat spam)
                if self.last_space_press.elapsed() >= Duration::from_millis(200) {
                    self.last_space_press = Instant::now();
                    self.is_playing = !self.is_playing;
                    if self.is_playing {
                        let now = Instant::now();
                        self.last_play_time = now.checked_sub(Duration::from_secs(1)).unwrap_or(now);
                        self.status_message = "Playing...".to_string();
                    } else {
                        self.status_message = "Paused".to_string();
                    }
                }
            }
            KeyCode::Enter => {
                self.is_playing = false;
                self.jump_to(self.steps.len());
                self.status_message = "Jumped to summary".to_string();
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                self.jump_to(0);
                self.status_message = "Jumped to first iteration".to_string();
            }
            _ => {}
        }
    }

    fn focused_scroll(&mut self) -> &mut usize {
        match self.focused_pane {
            FocusedPane::Source => &mut self.source_scroll,
            FocusedPane::Structures => &mut self.structures_scroll,
            FocusedPane::Loop => &mut self.loop_scroll,
            FocusedPane::Output => &mut self.output_scroll,
        }
    }

    fn jump_to(&mut self, position: usize) {
        self.position = position.min(self.steps.len());
        self.structures_scroll = 0;
        self.output_scroll = 0;
    }

    /// Advance one position; false when already on the summary
    fn step_forward(&mut self) -> bool {
        if self.position >= self.steps.len() {
            return false;
        }
        self.jump_to(self.position + 1);
        true
    }

    /// Go back one position; false when already on the first
    fn step_backward(&mut self) -> bool {
        if self.position == 0 {
            return false;
        }
        self.jump_to(self.position - 1);
        true
    }
}

fn state_rows<'a>(
    state: &'a StateSnapshot,
    previous: Option<&'a StateSnapshot>,
) -> Vec<StructureRow<'a>> {
    state
        .iter()
        .map(|(name, data)| StructureRow {
            name,
            kind: None,
            data,
            changed: previous.is_some_and(|prev| prev.get(name) != Some(data)),
        })
        .collect()
}

/// Header line of the last unindented `for` statement
fn find_loop_line(source: &str) -> usize {
    source
        .lines()
        .enumerate()
        .filter(|(_, line)| line.starts_with("for ") || line.starts_with("for("))
        .map(|(idx, _)| idx + 1)
        .last()
        .unwrap_or(0)
}
