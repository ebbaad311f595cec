//! Structures pane rendering
//!
//! Shows either the final display entries of the run, with their kinds, or
//! the variable state captured after one iteration of the traced loop.
//!
//! # Layout
//!
//! ```text
//! ▸ nums      array   [3, 1, 2]
//! ▸ counts    dict    {a: 1, b: 2}
//! ```
//!
//! In iteration view the loop variable is drawn in its own color and names
//! whose value changed since the previous iteration are bold.

use crate::snapshot::EntryKind;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

/// One row of the structures pane
pub struct StructureRow<'a> {
    pub name: &'a str,
    /// `None` in iteration view, where only values are captured
    pub kind: Option<EntryKind>,
    pub data: &'a serde_json::Value,
    pub changed: bool,
}

/// Data needed to render the structures pane
pub struct StructuresRenderData<'a> {
    pub title: String,
    pub rows: Vec<StructureRow<'a>>,
    pub iterator: Option<&'a str>,
}

/// Render the structures pane
pub fn render_structures_pane(
    frame: &mut Frame,
    area: Rect,
    data: StructuresRenderData,
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
        .title(format!(" {} ", data.title))
        .borders(Borders::ALL)
        .border_style(border_style);

    if data.rows.is_empty() {
        let items =
            vec![ListItem::new("(empty)").style(Style::default().fg(DEFAULT_THEME.comment))];
        frame.render_widget(List::new(items).block(block), area);
        return;
    }

    let name_width = data.rows.iter().map(|row| row.name.len()).max().unwrap_or(0);

    let all_items: Vec<ListItem> = data
        .rows
        .iter()
        .map(|row| {
            let mut name_style = if Some(row.name) == data.iterator {
                Style::default().fg(DEFAULT_THEME.iterator)
            } else {
                Style::default().fg(DEFAULT_THEME.fg)
            };
            let mut value_style = Style::default().fg(value_color(row.data));
            if row.changed {
                name_style = name_style.add_modifier(Modifier::BOLD);
                value_style = value_style.add_modifier(Modifier::BOLD);
            }

            let mut spans = vec![
                Span::styled("▸ ", Style::default().fg(DEFAULT_THEME.secondary)),
                Span::styled(format!("{:<name_width$} ", row.name), name_style),
            ];
            if let Some(kind) = row.kind {
                spans.push(Span::styled(
                    format!("{:<11}", kind_label(kind)),
                    Style::default().fg(DEFAULT_THEME.type_name),
                ));
            }
            spans.push(Span::styled(format_data(row.data), value_style));
            ListItem::new(Line::from(spans))
        })
        .collect();

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

fn kind_label(kind: EntryKind) -> &'static str {
    match kind {
        EntryKind::Variable => "variable",
        EntryKind::Array => "array",
        EntryKind::Set => "set",
        EntryKind::Dictionary => "dictionary",
    }
}

fn value_color(data: &serde_json::Value) -> ratatui::style::Color {
    match data {
        serde_json::Value::Number(_) | serde_json::Value::Bool(_) => DEFAULT_THEME.number,
        serde_json::Value::String(_) => DEFAULT_THEME.string,
        serde_json::Value::Null => DEFAULT_THEME.comment,
        _ => DEFAULT_THEME.fg,
    }
}

/// Compact one-line rendering of entry data.
///
/// Dictionary entries arrive as `[{key, value}]` pairs of text and are shown
/// as `{key: value, ...}`; anything else is shown as compact JSON.
pub fn format_data(data: &serde_json::Value) -> String {
    if let Some(pairs) = as_dict_pairs(data) {
        let body: Vec<String> = pairs
            .iter()
            .map(|(key, value)| format!("{key}: {value}"))
            .collect();
        return format!("{{{}}}", body.join(", "));
    }
    match data {
        serde_json::Value::Array(items) => {
            let body: Vec<String> = items.iter().map(format_data).collect();
            format!("[{}]", body.join(", "))
        }
        other => other.to_string(),
    }
}

fn as_dict_pairs(data: &serde_json::Value) -> Option<Vec<(&str, &str)>> {
    let items = data.as_array()?;
    if items.is_empty() {
        return None;
    }
    items
        .iter()
        .map(|item| {
            let object = item.as_object()?;
            if object.len() != 2 {
                return None;
            }
            Some((object.get("key")?.as_str()?, object.get("value")?.as_str()?))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_format_scalars_and_lists() {
        assert_eq!(format_data(&json!(6)), "6");
        assert_eq!(format_data(&json!("hi")), "\"hi\"");
        assert_eq!(format_data(&json!([1, [2, 3]])), "[1, [2, 3]]");
        assert_eq!(format_data(&json!([])), "[]");
    }

    #[test]
    fn test_format_dictionary_pairs() {
        let data = json!([{"key": "a", "value": "1"}, {"key": "b", "value": "[2]"}]);
        assert_eq!(format_data(&data), "{a: 1, b: [2]}");
    }
}
