//! Terminal rendering of the conversation
//!
//! Everything here is a pure function of its input except [`LiveView`],
//! which writes stream updates to any [`Write`] as they arrive.

use crate::language::Language;
use crate::session::{Message, Role};
use crate::stream::{ProgressTracker, StepStatus, StreamObserver, StreamOutcome};
use crate::suggestions::SuggestionState;
use colored::Colorize;
use prettytable::{format, Cell, Row, Table};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag, TagEnd};
use std::io::Write;

const RULE_WIDTH: usize = 40;
const BAR_WIDTH: usize = 20;

/// Render Markdown for the terminal
///
/// Supports headings, emphasis, strikethrough, ordered and unordered
/// lists, block quotes, inline and fenced code, rules, links and GFM
/// tables. With `color` off the output is plain text that keeps the
/// structure readable.
///
/// # Examples
///
/// ```
/// use procurai::view::render_markdown;
///
/// let text = render_markdown("# Budget\n\n- IT\n- HR", false);
/// assert_eq!(text, "# Budget\n\n• IT\n• HR");
/// ```
pub fn render_markdown(text: &str, color: bool) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = MarkdownRenderer::new(color);
    for event in Parser::new_ext(text, options) {
        renderer.event(event);
    }
    renderer.finish()
}

#[derive(Default)]
struct TableState {
    rows: Vec<Vec<String>>,
    header_rows: usize,
    cell: Option<String>,
}

struct MarkdownRenderer {
    color: bool,
    out: String,
    at_line_start: bool,
    quote_depth: usize,
    lists: Vec<Option<u64>>,
    heading: Option<HeadingLevel>,
    strong: usize,
    emphasis: usize,
    strike: usize,
    links: Vec<String>,
    in_code_block: bool,
    table: Option<TableState>,
}

impl MarkdownRenderer {
    fn new(color: bool) -> Self {
        Self {
            color,
            out: String::new(),
            at_line_start: true,
            quote_depth: 0,
            lists: Vec::new(),
            heading: None,
            strong: 0,
            emphasis: 0,
            strike: 0,
            links: Vec::new(),
            in_code_block: false,
            table: None,
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.code_block_text(&text);
                } else {
                    let styled = self.style(&text);
                    self.inline(&styled);
                }
            }
            Event::Code(code) => {
                let rendered = if self.table.is_some() {
                    code.to_string()
                } else if self.color {
                    code.yellow().to_string()
                } else {
                    format!("`{}`", code)
                };
                self.inline(&rendered);
            }
            Event::Html(html) | Event::InlineHtml(html) => self.inline(&html),
            Event::SoftBreak | Event::HardBreak => {
                if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
                    cell.push(' ');
                } else {
                    self.newline();
                }
            }
            Event::Rule => {
                self.end_block();
                let rule = "─".repeat(RULE_WIDTH);
                let rule = if self.color {
                    rule.dimmed().to_string()
                } else {
                    rule
                };
                self.inline(&rule);
                self.end_block();
            }
            Event::TaskListMarker(checked) => {
                self.inline(if checked { "[x] " } else { "[ ] " });
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        match tag {
            Tag::Paragraph => {}
            Tag::Heading { level, .. } => {
                self.end_block();
                self.heading = Some(level);
                if !self.color {
                    let marks = "#".repeat(heading_depth(level));
                    self.inline(&format!("{} ", marks));
                }
            }
            Tag::BlockQuote { .. } => {
                self.end_block();
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.end_block();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        let label = format!("[{}]", lang);
                        let label = if self.color {
                            label.dimmed().to_string()
                        } else {
                            label
                        };
                        self.inline(&label);
                        self.newline();
                    }
                }
            }
            Tag::List(first) => {
                if self.lists.is_empty() {
                    self.end_block();
                } else if !self.at_line_start {
                    self.newline();
                }
                self.lists.push(first);
            }
            Tag::Item => {
                if !self.at_line_start {
                    self.newline();
                }
                let depth = self.lists.len();
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                let indent = format!(
                    "{}{}",
                    self.quote_prefix(),
                    "  ".repeat(depth.saturating_sub(1))
                );
                self.out.push_str(&indent);
                self.out.push_str(&marker);
                self.at_line_start = false;
            }
            Tag::Emphasis => self.emphasis += 1,
            Tag::Strong => self.strong += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            Tag::Table(_) => {
                self.end_block();
                self.table = Some(TableState::default());
            }
            Tag::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableRow => {
                if let Some(table) = self.table.as_mut() {
                    table.rows.push(Vec::new());
                }
            }
            Tag::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    table.cell = Some(String::new());
                }
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.end_block(),
            TagEnd::Heading { .. } => {
                self.heading = None;
                self.end_block();
            }
            TagEnd::BlockQuote { .. } => {
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.end_block();
            }
            TagEnd::CodeBlock => {
                self.in_code_block = false;
                self.end_block();
            }
            TagEnd::List { .. } => {
                self.lists.pop();
                if self.lists.is_empty() {
                    self.end_block();
                }
            }
            TagEnd::Item => {}
            TagEnd::Emphasis => self.emphasis = self.emphasis.saturating_sub(1),
            TagEnd::Strong => self.strong = self.strong.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    if !url.is_empty() && self.table.is_none() {
                        let suffix = format!(" ({})", url);
                        let suffix = if self.color {
                            suffix.blue().underline().to_string()
                        } else {
                            suffix
                        };
                        self.inline(&suffix);
                    }
                }
            }
            TagEnd::TableHead => {
                if let Some(table) = self.table.as_mut() {
                    table.header_rows = table.rows.len();
                }
            }
            TagEnd::TableCell => {
                if let Some(table) = self.table.as_mut() {
                    let cell = table.cell.take().unwrap_or_default();
                    if let Some(row) = table.rows.last_mut() {
                        row.push(cell.trim().to_string());
                    }
                }
            }
            TagEnd::Table => {
                if let Some(table) = self.table.take() {
                    self.emit_table(table);
                }
                self.end_block();
            }
            _ => {}
        }
    }

    fn style(&self, text: &str) -> String {
        if !self.color || self.table.is_some() {
            return text.to_string();
        }
        let mut styled = text.normal();
        if self.heading.is_some() {
            styled = styled.cyan().bold();
        }
        if self.strong > 0 {
            styled = styled.bold();
        }
        if self.emphasis > 0 {
            styled = styled.italic();
        }
        if self.strike > 0 {
            styled = styled.strikethrough();
        }
        styled.to_string()
    }

    fn quote_prefix(&self) -> String {
        "│ ".repeat(self.quote_depth)
    }

    fn line_prefix(&self) -> String {
        format!("{}{}", self.quote_prefix(), "  ".repeat(self.lists.len()))
    }

    fn inline(&mut self, text: &str) {
        if let Some(cell) = self.table.as_mut().and_then(|t| t.cell.as_mut()) {
            cell.push_str(text);
            return;
        }
        for (i, part) in text.split('\n').enumerate() {
            if i > 0 {
                self.newline();
            }
            if part.is_empty() {
                continue;
            }
            if self.at_line_start {
                let prefix = self.line_prefix();
                self.out.push_str(&prefix);
                self.at_line_start = false;
            }
            self.out.push_str(part);
        }
    }

    fn code_block_text(&mut self, text: &str) {
        for line in text.lines() {
            let line = if self.color {
                line.dimmed().to_string()
            } else {
                line.to_string()
            };
            let prefix = self.line_prefix();
            self.out.push_str(&prefix);
            self.out.push_str("    ");
            self.out.push_str(&line);
            self.out.push('\n');
            self.at_line_start = true;
        }
    }

    fn newline(&mut self) {
        self.out.push('\n');
        self.at_line_start = true;
    }

    fn end_block(&mut self) {
        if self.out.is_empty() {
            return;
        }
        if !self.at_line_start {
            self.newline();
        }
        if self.lists.is_empty() && !self.out.ends_with("\n\n") {
            self.out.push('\n');
        }
    }

    fn emit_table(&mut self, state: TableState) {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BOX_CHARS);

        for (i, cells) in state.rows.iter().enumerate() {
            let is_header = i < state.header_rows;
            let row = cells
                .iter()
                .map(|text| {
                    let cell = Cell::new(text);
                    if is_header && self.color {
                        cell.style_spec("b")
                    } else {
                        cell
                    }
                })
                .collect();
            if is_header {
                table.set_titles(Row::new(row));
            } else {
                table.add_row(Row::new(row));
            }
        }

        let rendered = table.to_string();
        for line in rendered.lines() {
            let prefix = self.line_prefix();
            self.out.push_str(&prefix);
            self.out.push_str(line);
            self.out.push('\n');
        }
        self.at_line_start = true;
    }

    fn finish(self) -> String {
        self.out.trim_end().to_string()
    }
}

fn heading_depth(level: HeadingLevel) -> usize {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Render one stored message: user text verbatim, assistant text as
/// Markdown
pub fn render_message(message: &Message, color: bool) -> String {
    match message.role {
        Role::User => {
            let label = if color {
                "You".blue().bold().to_string()
            } else {
                "You".to_string()
            };
            format!("{}: {}", label, message.content)
        }
        Role::Assistant => {
            let label = if color {
                "Assistant".green().bold().to_string()
            } else {
                "Assistant".to_string()
            };
            format!("{}:\n{}", label, render_markdown(&message.content, color))
        }
    }
}

fn status_glyph(status: StepStatus, color: bool) -> String {
    let glyph = match status {
        StepStatus::Completed => "✓",
        StepStatus::Active => "●",
        StepStatus::Pending => "○",
    };
    if !color {
        return glyph.to_string();
    }
    match status {
        StepStatus::Completed => glyph.green().to_string(),
        StepStatus::Active => glyph.yellow().to_string(),
        StepStatus::Pending => glyph.dimmed().to_string(),
    }
}

/// Render the four phases, a completion bar and the processing line
pub fn render_progress(tracker: &ProgressTracker, color: bool) -> String {
    let mut lines: Vec<String> = tracker
        .phases()
        .iter()
        .map(|phase| format!("  {} {}", status_glyph(phase.status, color), phase.label))
        .collect();

    let completed = tracker.completed_count();
    let total = tracker.phases().len();
    let filled = completed * BAR_WIDTH / total.max(1);
    let bar = format!(
        "{}{}",
        "█".repeat(filled),
        "░".repeat(BAR_WIDTH - filled)
    );
    lines.push(format!("  [{}] {}/{}", bar, completed, total));

    let processing = if color {
        "Processing...".dimmed().to_string()
    } else {
        "Processing...".to_string()
    };
    lines.push(format!("  {}", processing));
    lines.join("\n")
}

/// Welcome text shown for a session without messages
pub fn render_empty_state(language: Language) -> String {
    let (title, subtitle, try_label, prompts) = match language {
        Language::En => (
            "Welcome to Procurement AI",
            "Ask me anything about your procurement data",
            "Try:",
            [
                "What is the total budget?",
                "Show high risk projects",
                "List approved requests",
            ],
        ),
        Language::Ar => (
            "مرحباً بك في Procurement AI",
            "اسألني أي شيء عن بيانات المشتريات",
            "جرّب:",
            [
                "ما هي الميزانية الإجمالية؟",
                "اعرض المشاريع عالية المخاطر",
                "اعرض الطلبات المعتمدة",
            ],
        ),
    };

    let mut out = format!("{}\n{}\n\n{}\n", title, subtitle, try_label);
    for prompt in prompts {
        out.push_str(&format!("  \"{}\"\n", prompt));
    }
    out
}

/// Render the suggestion list under its localized header
pub fn render_suggestions(state: &SuggestionState, language: Language, color: bool) -> String {
    let header = if color {
        language.suggestions_label().bold().to_string()
    } else {
        language.suggestions_label().to_string()
    };

    if state.loading && state.suggestions.is_empty() {
        return format!("{}\n  ...", header);
    }

    let mut lines = vec![header];
    for (i, suggestion) in state.suggestions.iter().enumerate() {
        let marker = if state.selected == Some(i) { "›" } else { " " };
        let line = format!("{} {}. {}", marker, i + 1, suggestion);
        if color && state.selected == Some(i) {
            lines.push(line.cyan().to_string());
        } else {
            lines.push(line);
        }
    }
    lines.join("\n")
}

/// Stream observer that prints progress transitions and new answer text
/// as they arrive
///
/// Fragments are written raw (dimmed when color is on) because Markdown
/// cannot be rendered until the structure is complete. [`LiveView::finish`]
/// then prints the rendered answer.
pub struct LiveView<W: Write> {
    out: W,
    color: bool,
    last: ProgressTracker,
    streamed: String,
}

impl<W: Write> LiveView<W> {
    /// Write to `out`, styling with ANSI colors when `color` is set
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            last: ProgressTracker::new(),
            streamed: String::new(),
        }
    }

    /// Text printed so far
    pub fn streamed(&self) -> &str {
        &self.streamed
    }

    /// Close the live region and print the rendered answer
    ///
    /// The rendered response is skipped only when it is exactly the text
    /// already on screen, which is the case for plain prose.
    pub fn finish(&mut self, outcome: &StreamOutcome) {
        let rendered = render_markdown(&outcome.response, self.color);
        let already_shown = outcome.response.is_empty()
            || (outcome.response == self.streamed
                && rendered == self.streamed.trim_end()
                && !self.color);
        if !self.streamed.is_empty() {
            self.write("\n");
            if !already_shown {
                self.write("\n");
            }
        }
        if !already_shown {
            self.write(&format!("{}\n", rendered));
        }
        self.flush();
    }

    /// Give back the writer
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write(&mut self, text: &str) {
        if let Err(e) = self.out.write_all(text.as_bytes()) {
            tracing::debug!("Failed to write live output: {}", e);
        }
    }

    fn flush(&mut self) {
        if let Err(e) = self.out.flush() {
            tracing::debug!("Failed to flush live output: {}", e);
        }
    }
}

impl<W: Write> StreamObserver for LiveView<W> {
    fn on_progress(&mut self, progress: &ProgressTracker) {
        let mut lines = String::new();
        for (phase, before) in progress.phases().iter().zip(self.last.phases()) {
            if phase.status != before.status {
                lines.push_str(&format!(
                    "  {} {}\n",
                    status_glyph(phase.status, self.color),
                    phase.label
                ));
            }
        }
        self.last = progress.clone();

        if !lines.is_empty() {
            if !self.streamed.is_empty() && !self.streamed.ends_with('\n') {
                self.write("\n");
            }
            self.write(&lines);
            self.flush();
        }
    }

    fn on_content(&mut self, buffer: &str, _fragment: &str) {
        let Some(suffix) = buffer.get(self.streamed.len()..) else {
            return;
        };
        if suffix.is_empty() {
            return;
        }
        let suffix = suffix.to_string();
        if self.color {
            self.write(&suffix.dimmed().to_string());
        } else {
            self.write(&suffix);
        }
        self.streamed.push_str(&suffix);
        self.flush();
    }
}
