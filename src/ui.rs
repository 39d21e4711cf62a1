use std::iter::once;

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Cell, Clear, List, ListState, Paragraph, Row, Table, Tabs},
};

use crate::model::{Model, PickerData, UIData};

pub const TABS_HEIGHT: usize = 1;
pub const STATUSLINE_HEIGHT: usize = 1;
pub const TABLE_HEADER_HEIGHT: usize = 1;
pub const COLUMN_WIDTH_MARGIN: usize = 1;
pub const BLANK_MARKER: &str = "∅";

const POPUP_WIDTH: u16 = 48;
const POPUP_HEIGHT: u16 = 30;

#[derive(Debug, Default)]
pub struct StagingUI;

impl StagingUI {
    pub fn new() -> Self {
        Self
    }

    pub fn draw(&self, model: &Model, frame: &mut Frame) {
        let uidata = model.get_uidata();
        let [tabs_area, table_area, status_area] = Layout::vertical([
            Constraint::Length(TABS_HEIGHT as u16),
            Constraint::Min(0),
            Constraint::Length(STATUSLINE_HEIGHT as u16),
        ])
        .areas(frame.area());

        self.draw_tabs(uidata, frame, tabs_area);
        self.draw_table(uidata, frame, table_area);
        self.draw_statusline(uidata, frame, status_area);

        match &uidata.popup {
            Some(crate::model::Popup::Help(text)) => self.draw_help(text, frame),
            Some(crate::model::Popup::Picker(picker)) => self.draw_picker(picker, frame),
            None => {}
        }
    }

    fn draw_tabs(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let tabs = Tabs::new(uidata.tabs.clone())
            .select(uidata.active_tab)
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED | Modifier::BOLD))
            .divider("|");
        frame.render_widget(tabs, area);
    }

    fn draw_table(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        let index = &uidata.index;
        let header_style = Style::new().add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
        let header = Row::new(
            once(Cell::from(index.name.clone()))
                .chain(uidata.table.iter().map(|c| Cell::from(c.name.clone()))),
        )
        .style(header_style);

        let widths: Vec<Constraint> = once(index.width)
            .chain(uidata.table.iter().map(|c| c.width))
            .map(|w| Constraint::Length(w as u16))
            .collect();

        let rows = (0..index.data.len()).map(|ridx| {
            let selected = uidata.selected_row == Some(ridx);
            let index_cell = Cell::from(index.data[ridx].clone()).style(Style::new().fg(Color::DarkGray));
            let cells = uidata.table.iter().enumerate().map(move |(cidx, column)| {
                let value = column.data[ridx].clone();
                let mut style = Style::new();
                if value == BLANK_MARKER {
                    style = style.fg(Color::DarkGray);
                }
                if selected && cidx == uidata.selected_column {
                    style = style.add_modifier(Modifier::REVERSED);
                }
                Cell::from(value).style(style)
            });
            let row = Row::new(once(index_cell).chain(cells));
            if selected {
                row.style(Style::new().add_modifier(Modifier::BOLD))
            } else {
                row
            }
        });

        let table = Table::new(rows, widths).header(header).column_spacing(1);
        frame.render_widget(table, area);

        if uidata.nrows == 0 && area.height > 1 {
            let empty = Paragraph::new("(no rows)").style(Style::new().fg(Color::DarkGray));
            let below_header = Rect::new(area.x, area.y + 1, area.width, 1);
            frame.render_widget(empty, below_header);
        }
    }

    fn draw_statusline(&self, uidata: &UIData, frame: &mut Frame, area: Rect) {
        if let Some(editor) = &uidata.editor {
            let prefix = format!("Edit {}: ", editor.label);
            let x = area.x + (prefix.chars().count() + editor.input.cursor) as u16;
            let line = Line::from(vec![
                Span::styled(prefix, Style::new().fg(Color::Yellow)),
                Span::raw(editor.input.input.clone()),
            ]);
            frame.render_widget(Paragraph::new(line), area);
            frame.set_cursor_position((x.min(area.right().saturating_sub(1)), area.y));
            return;
        }

        let position = if uidata.nrows == 0 {
            "0/0".to_string()
        } else {
            format!("{}/{}", uidata.abs_selected_row + 1, uidata.nrows)
        };
        let info = format!("{} | {} ", uidata.filter, position);
        let [message_area, info_area] = Layout::horizontal([
            Constraint::Min(0),
            Constraint::Length(info.chars().count() as u16),
        ])
        .areas(area);

        frame.render_widget(Paragraph::new(uidata.status_message.as_str()), message_area);
        frame.render_widget(
            Paragraph::new(info).style(Style::new().fg(Color::Cyan)),
            info_area,
        );
    }

    fn draw_help(&self, text: &str, frame: &mut Frame) {
        let area = centered(frame.area(), POPUP_WIDTH, POPUP_HEIGHT);
        let help = Paragraph::new(text).block(Block::bordered().title(" Help "));
        frame.render_widget(Clear, area);
        frame.render_widget(help, area);
    }

    fn draw_picker(&self, picker: &PickerData, frame: &mut Frame) {
        let height = (picker.items.len() as u16).saturating_add(2).min(POPUP_HEIGHT);
        let area = centered(frame.area(), POPUP_WIDTH, height);
        let list = List::new(picker.items.iter().map(String::as_str))
            .block(Block::bordered().title(picker.title.as_str()))
            .highlight_style(Style::new().add_modifier(Modifier::REVERSED))
            .highlight_symbol("> ");
        let mut state = ListState::default().with_selected(Some(picker.selected));
        frame.render_widget(Clear, area);
        frame.render_stateful_widget(list, area, &mut state);
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    )
}
