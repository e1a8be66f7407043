/*
 * This file is part of Radeon Monitor.
 *
 * Copyright (C) 2025 Radeon Monitor contributors
 *
 * Radeon Monitor is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Radeon Monitor is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Radeon Monitor. If not, see <https://www.gnu.org/licenses/>.
 */

use ratatui::layout::{Alignment, Constraint, Direction, Layout};
use ratatui::prelude::*;
use ratatui::widgets::{Block, BorderType, Borders, List, ListItem, Paragraph, Wrap};

use crate::app::App;

const HELP: &str = "q quit | s stats | v stats view | c curve | f fixed | a auto | p profile | +/- hysteresis | h hide | w refresh hidden | r reset stats";

pub fn ui(f: &mut Frame, app: &App) {
    let size = f.area();

    if app.window.hidden {
        let msg = Paragraph::new("Hidden. Fan control keeps running.\nPress 'h' to restore.")
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
        f.render_widget(msg, size);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(4)])
        .split(size);

    let header = Paragraph::new(app.status_line())
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" Radeon Monitor "));
    f.render_widget(header, rows[0]);

    let body = if app.flags.stats_view_active {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(rows[1])
    } else {
        Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(100)])
            .split(rows[1])
    };

    let mut items: Vec<ListItem> = Vec::new();
    if app.loading {
        items.push(ListItem::new("Reading device..."));
    }
    for sample in app.snapshot.samples() {
        let value = app
            .snapshot
            .current_min_max_string(sample.id)
            .unwrap_or_else(|| sample.display.clone());
        items.push(ListItem::new(format!("{: <26} {}", sample.id.name(), value)));
    }
    let metrics = List::new(items)
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" GPU data "));
    f.render_widget(metrics, body[0]);

    if app.flags.stats_view_active {
        let mut rows_stats: Vec<ListItem> = app
            .stats
            .iter()
            .map(|s| ListItem::new(format!("{: <24} {:>6.2}%", s.key, s.percent)))
            .collect();
        if rows_stats.is_empty() {
            let hint = if app.flags.stats_tracking { "(no samples yet)" } else { "(press 's' to start tracking)" };
            rows_stats.push(ListItem::new(hint));
        }
        let stats = List::new(rows_stats)
            .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded).title(" Core/Mem clock stats "));
        f.render_widget(stats, body[1]);
    }

    let mut footer = app.notices.iter().cloned().collect::<Vec<_>>().join(" | ");
    if footer.is_empty() {
        footer = HELP.to_string();
    }
    let footer = Paragraph::new(footer)
        .style(Style::default().fg(if app.notices.is_empty() { Color::Gray } else { Color::Yellow }))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).border_type(BorderType::Rounded));
    f.render_widget(footer, rows[2]);
}
