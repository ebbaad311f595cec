//! Loop pane rendering: the traced loop's variable and iterable, the
//! per-iteration dependencies, and the subscript reads and writes.

use super::structures::format_data;
use crate::snapshot::{IndexOpKind, IndexOperation, LoopDependency};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// Data needed to render the loop pane
pub struct LoopRenderData<'a> {
    pub has_loop: bool,
    pub iterator: Option<&'a str>,
    pub target: Option<&'a str>,
    pub dependencies: &'a [LoopDependency],
    pub index_operations: &'a [IndexOperation],
}

/// Render the loop pane
pub fn render_loop_pane(
    frame: &mut Frame,
    area: Rect,
    data: LoopRenderData,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Loop ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let heading = Style::default()
        .fg(DEFAULT_THEME.secondary)
        .add_modifier(Modifier::BOLD);
    let muted = Style::default().fg(DEFAULT_THEME.comment);

    let mut all_items = Vec::new();

    if data.has_loop {
        all_items.push(ListItem::new(Line::from(vec![
            Span::styled("for ", Style::default().fg(DEFAULT_THEME.keyword)),
            Span::styled(
                data.iterator.unwrap_or("?"),
                Style::default().fg(DEFAULT_THEME.iterator),
            ),
            Span::styled(" in ", Style::default().fg(DEFAULT_THEME.keyword)),
            Span::styled(
                data.target.unwrap_or("(expression)"),
                Style::default().fg(DEFAULT_THEME.fg),
            ),
        ])));
    } else {
        all_items.push(ListItem::new("(no loop)").style(muted));
    }

    if !data.dependencies.is_empty() {
        all_items.push(ListItem::new(""));
        all_items.push(ListItem::new(Span::styled("Dependencies", heading)));
        for dependency in data.dependencies {
            all_items.push(ListItem::new(Line::from(vec![
                Span::styled(
                    format!("  {}", dependency.name),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
                Span::styled(" ← ", muted),
                Span::styled(
                    dependency.formula.clone(),
                    Style::default().fg(DEFAULT_THEME.function),
                ),
            ])));
        }
    }

    if !data.index_operations.is_empty() {
        all_items.push(ListItem::new(""));
        all_items.push(ListItem::new(Span::styled("Index operations", heading)));
        for operation in data.index_operations {
            all_items.push(ListItem::new(operation_line(operation)));
        }
    }

    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if all_items.len() > visible_height {
        *scroll_offset = (*scroll_offset).min(all_items.len() - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

fn operation_line(operation: &IndexOperation) -> Line<'static> {
    let indices: Vec<String> = operation.indices.iter().map(i64::to_string).collect();
    let (label, color) = match operation.kind {
        IndexOpKind::Access => ("read ", DEFAULT_THEME.primary),
        IndexOpKind::Assign => ("write", DEFAULT_THEME.secondary),
    };

    let mut spans = vec![
        Span::styled(format!("  {label} "), Style::default().fg(color)),
        Span::styled(
            operation.var_name.clone(),
            Style::default().fg(DEFAULT_THEME.fg),
        ),
        Span::styled(
            format!("[{}]", indices.join(", ")),
            Style::default().fg(DEFAULT_THEME.number),
        ),
    ];
    if let Some(value) = &operation.new_value {
        spans.push(Span::styled(
            " = ",
            Style::default().fg(DEFAULT_THEME.comment),
        ));
        spans.push(Span::styled(
            format_data(value),
            Style::default().fg(DEFAULT_THEME.string),
        ));
    }
    Line::from(spans)
}
