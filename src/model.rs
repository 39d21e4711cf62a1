use arboard::Clipboard;
use ratatui::crossterm::event::KeyEvent;
use tracing::{debug, info, trace, warn};

use crate::domain::{HELP_TEXT, Message, PickMode, StagingConfig};
use crate::export;
use crate::filter::FilterSelection;
use crate::inputter::{InputResult, Inputter};
use crate::session::Session;
use crate::table::Table;
use crate::ui::{BLANK_MARKER, COLUMN_WIDTH_MARGIN, STATUSLINE_HEIGHT, TABLE_HEADER_HEIGHT, TABS_HEIGHT};

#[derive(Debug, PartialEq)]
pub enum Status {
    Ready,
    Quitting,
}

/// The tables a user can look at. Only `Filtered` is editable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Filtered,
    Cleaned,
    Raw,
    Removed,
}

impl View {
    pub const ALL: [View; 4] = [View::Filtered, View::Cleaned, View::Raw, View::Removed];

    fn idx(self) -> usize {
        self as usize
    }

    fn next(self) -> View {
        View::ALL[(self.idx() + 1) % View::ALL.len()]
    }

    fn previous(self) -> View {
        View::ALL[(self.idx() + View::ALL.len() - 1) % View::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy)]
enum Modus {
    Table,
    Picker,
    Popup,
    Editing,
}

/// Selection inside one view. `row` and `column` are absolute table indices,
/// the offsets describe the first visible row and column.
#[derive(Debug, Default, Clone, Copy)]
struct TableCursor {
    row: usize,
    column: usize,
    offset_row: usize,
    offset_column: usize,
}

#[derive(Debug, Clone, Default)]
pub struct ColumnView {
    pub name: String,
    pub width: usize,
    pub data: Vec<String>,
}

struct Picker {
    mode: PickMode,
    column: Option<String>,
    items: Vec<String>,
    selected: usize,
}

#[derive(Debug, Clone)]
pub struct PickerData {
    pub title: String,
    pub items: Vec<String>,
    pub selected: usize,
}

#[derive(Debug, Clone)]
pub enum Popup {
    Help(String),
    Picker(PickerData),
}

#[derive(Debug, Clone)]
pub struct EditorData {
    pub label: String,
    pub input: InputResult,
}

/// Everything the UI needs for one frame.
#[derive(Debug, Clone, Default)]
pub struct UIData {
    pub tabs: Vec<String>,
    pub active_tab: usize,
    pub table: Vec<ColumnView>,
    pub index: ColumnView,
    pub nrows: usize,
    pub selected_row: Option<usize>,
    pub selected_column: usize,
    pub abs_selected_row: usize,
    pub filter: String,
    pub popup: Option<Popup>,
    pub editor: Option<EditorData>,
    pub status_message: String,
}

#[derive(Default, Clone, Debug)]
pub struct UILayout {
    pub width: usize,
    pub height: usize,
    pub table_height: usize,
}

impl UILayout {
    pub fn from_values(ui_width: usize, ui_height: usize) -> Self {
        let table_height =
            ui_height.saturating_sub(TABS_HEIGHT + STATUSLINE_HEIGHT + TABLE_HEADER_HEIGHT);
        let layout = UILayout {
            width: ui_width,
            height: ui_height,
            table_height,
        };
        trace!("Build UILayout: {:?}", layout);
        layout
    }
}

pub struct Model {
    config: StagingConfig,
    pub status: Status,
    modus: Modus,
    session: Session,
    source: String,
    removed_table: Table,
    view: View,
    cursors: [TableCursor; 4],
    picker: Option<Picker>,
    editing: Option<(usize, String)>,
    input: Inputter,
    last_input: InputResult,
    clipboard: Option<Clipboard>,
    uilayout: UILayout,
    uidata: UIData,
    status_message: String,
}

impl Model {
    pub fn init(
        config: &StagingConfig,
        session: Session,
        source: impl Into<String>,
        ui_width: usize,
        ui_height: usize,
    ) -> Self {
        let clipboard = match Clipboard::new() {
            Ok(c) => Some(c),
            Err(e) => {
                warn!("Clipboard not available: {e}");
                None
            }
        };
        let source = source.into();
        let status_message = format!("{}: {}", source, session.summary());
        let mut model = Self {
            config: config.clone(),
            status: Status::Ready,
            modus: Modus::Table,
            removed_table: session.removed().to_table(),
            session,
            source,
            view: View::Filtered,
            cursors: [TableCursor::default(); 4],
            picker: None,
            editing: None,
            input: Inputter::default(),
            last_input: InputResult::default(),
            clipboard,
            uilayout: UILayout::from_values(ui_width, ui_height),
            uidata: UIData::default(),
            status_message,
        };
        model.update_table_data();
        model
    }

    pub fn get_uidata(&self) -> &UIData {
        &self.uidata
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> View {
        self.view
    }

    /// While a cell is edited all keys go to the line editor.
    pub fn raw_keyevents(&self) -> bool {
        matches!(self.modus, Modus::Editing)
    }

    pub fn quit(&mut self) {
        self.status = Status::Quitting;
    }

    pub fn update(&mut self, message: Message) {
        match self.modus {
            Modus::Table => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_rows(-1),
                Message::MoveDown => self.move_rows(1),
                Message::MovePageUp => self.move_rows(-(self.page_size() as isize)),
                Message::MovePageDown => self.move_rows(self.page_size() as isize),
                Message::MoveLeft => self.move_column(-1),
                Message::MoveRight => self.move_column(1),
                Message::MoveBeginning => self.move_rows(isize::MIN / 2),
                Message::MoveEnd => self.move_rows(isize::MAX / 2),
                Message::NextView => self.switch_view(self.view.next()),
                Message::PreviousView => self.switch_view(self.view.previous()),
                Message::PickFilterColumn => self.open_column_picker(),
                Message::PickFilterValue => self.open_value_picker_for_selection(),
                Message::ClearFilter => self.apply_selection(FilterSelection::NoFilter),
                Message::EditCell | Message::Enter => self.start_edit(),
                Message::AddRow => self.add_row(),
                Message::DeleteRow => self.delete_row(),
                Message::Export => self.export(),
                Message::CopyCell => self.copy_cell(),
                Message::CopyRow => self.copy_row(),
                Message::Help => self.show_help(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                Message::Exit | Message::RawKey(_) => {}
            },
            Modus::Picker => match message {
                Message::Quit => self.quit(),
                Message::MoveUp => self.move_picker(-1),
                Message::MoveDown => self.move_picker(1),
                Message::MovePageUp => self.move_picker(-10),
                Message::MovePageDown => self.move_picker(10),
                Message::MoveBeginning => self.move_picker(isize::MIN / 2),
                Message::MoveEnd => self.move_picker(isize::MAX / 2),
                Message::Enter => self.pick(),
                Message::Exit => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => {}
            },
            Modus::Popup => match message {
                Message::Quit => self.quit(),
                Message::Exit | Message::Enter | Message::Help => self.close_popup(),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => {}
            },
            Modus::Editing => match message {
                Message::RawKey(key) => self.raw_input(key),
                Message::Resize(width, height) => self.ui_resize(width, height),
                _ => {}
            },
        }
    }

    // -------------------- Data window ---------------------- //

    fn table_for<'a>(view: View, session: &'a Session, removed: &'a Table) -> &'a Table {
        match view {
            View::Filtered => session.edited(),
            View::Cleaned => session.cleaned(),
            View::Raw => session.raw(),
            View::Removed => removed,
        }
    }

    fn current_table(&self) -> &Table {
        Self::table_for(self.view, &self.session, &self.removed_table)
    }

    fn current_cursor(&self) -> TableCursor {
        self.cursors[self.view.idx()]
    }

    fn page_size(&self) -> usize {
        self.uilayout.table_height.max(1)
    }

    /// Recompute the visible slice of the current view and refresh the UI data.
    fn update_table_data(&mut self) {
        let table = Self::table_for(self.view, &self.session, &self.removed_table);
        let cursor = &mut self.cursors[self.view.idx()];
        let nrows = table.nrows();
        let ncols = table.ncolumns();

        cursor.row = cursor.row.min(nrows.saturating_sub(1));
        cursor.column = cursor.column.min(ncols.saturating_sub(1));

        // Rows
        let height = self.uilayout.table_height.max(1);
        if cursor.row < cursor.offset_row {
            cursor.offset_row = cursor.row;
        } else if cursor.row >= cursor.offset_row + height {
            cursor.offset_row = cursor.row + 1 - height;
        }
        cursor.offset_row = cursor.offset_row.min(nrows.saturating_sub(1));
        let rbegin = cursor.offset_row;
        let rend = std::cmp::min(rbegin + height, nrows);

        // Index column holds the original row numbers
        let index_data: Vec<String> = table.rows()[rbegin..rend]
            .iter()
            .map(|r| r.ordinal.to_string())
            .collect();
        let index_width = table
            .rows()
            .iter()
            .map(|r| r.ordinal)
            .max()
            .map_or(1, |m| m.to_string().len());
        let table_width = self.uilayout.width.saturating_sub(index_width + 1);

        // Columns
        let widths: Vec<usize> = (0..ncols)
            .map(|c| Self::calculate_column_width(table, c, rbegin, rend, self.config.max_column_width))
            .collect();
        if cursor.column < cursor.offset_column {
            cursor.offset_column = cursor.column;
        }
        while cursor.offset_column < cursor.column
            && widths[cursor.offset_column..=cursor.column]
                .iter()
                .map(|w| w + 1)
                .sum::<usize>()
                > table_width
        {
            cursor.offset_column += 1;
        }

        let mut columns = Vec::new();
        let mut visible_width = 0;
        for (cidx, &width) in widths.iter().enumerate().skip(cursor.offset_column) {
            let width = if visible_width + width + 1 > table_width {
                // Last, partially visible column
                if visible_width + 2 > table_width {
                    break;
                }
                table_width - visible_width - 1
            } else {
                width
            };
            visible_width += width + 1;
            let data = table.rows()[rbegin..rend]
                .iter()
                .map(|r| Self::display_cell(r.cells[cidx].as_deref(), width))
                .collect();
            columns.push(ColumnView {
                name: Self::get_visible_name(&table.columns()[cidx], width),
                width,
                data,
            });
            if visible_width >= table_width {
                break;
            }
        }

        trace!(
            "Table {:?}: row {}, col {}, offsets {}/{}, rows {}..{}, {} visible columns",
            self.view,
            cursor.row,
            cursor.column,
            cursor.offset_row,
            cursor.offset_column,
            rbegin,
            rend,
            columns.len()
        );

        let selected_row = (nrows > 0).then(|| cursor.row - rbegin);
        let selected_column = cursor.column - cursor.offset_column;
        let abs_selected_row = cursor.row;

        self.uidata.table = columns;
        self.uidata.index = ColumnView {
            name: "#".to_string(),
            width: index_width,
            data: index_data,
        };
        self.uidata.nrows = nrows;
        self.uidata.selected_row = selected_row;
        self.uidata.selected_column = selected_column;
        self.uidata.abs_selected_row = abs_selected_row;
        self.update_uidata();
    }

    fn update_uidata(&mut self) {
        self.uidata.tabs = View::ALL
            .iter()
            .map(|&v| {
                let rows = Self::table_for(v, &self.session, &self.removed_table).nrows();
                match v {
                    View::Filtered => format!("Filtered ({rows} rows)"),
                    View::Cleaned => format!("Cleaned ({rows} rows)"),
                    View::Raw => format!("Raw ({rows} rows)"),
                    View::Removed => format!("Removed ({rows} rows)"),
                }
            })
            .collect();
        self.uidata.active_tab = self.view.idx();
        self.uidata.filter = format!("{} | {}", self.source, self.session.selection());
        self.uidata.status_message = self.status_message.clone();

        self.uidata.popup = match self.modus {
            Modus::Popup => Some(Popup::Help(HELP_TEXT.to_string())),
            Modus::Picker => self.picker.as_ref().map(|p| {
                let title = match (&p.mode, &p.column) {
                    (PickMode::FilterValue, Some(column)) => format!(" Value of {column} "),
                    _ => " Filter column ".to_string(),
                };
                Popup::Picker(PickerData {
                    title,
                    items: p.items.clone(),
                    selected: p.selected,
                })
            }),
            _ => None,
        };

        self.uidata.editor = match (&self.modus, &self.editing) {
            (Modus::Editing, Some((row, column))) => Some(EditorData {
                label: format!("{column} [{}]", row + 1),
                input: self.last_input.clone(),
            }),
            _ => None,
        };
    }

    fn calculate_column_width(
        table: &Table,
        column: usize,
        rbegin: usize,
        rend: usize,
        max_column_width: usize,
    ) -> usize {
        let content = table.rows()[rbegin..rend]
            .iter()
            .map(|r| r.cells[column].as_deref().map_or(1, |s| s.chars().count()))
            .max()
            .unwrap_or(0);
        let width = std::cmp::max(table.columns()[column].chars().count(), content) + COLUMN_WIDTH_MARGIN;
        std::cmp::min(width, max_column_width)
    }

    fn display_cell(value: Option<&str>, width: usize) -> String {
        match value {
            Some(s) => s
                .replace("\r\n", " ↵ ")
                .replace('\n', " ↵ ")
                .chars()
                .take(width)
                .collect(),
            None => BLANK_MARKER.to_string(),
        }
    }

    fn get_visible_name(name: &str, width: usize) -> String {
        if width < 3 {
            return String::new();
        }
        if name.chars().count() > width {
            let mut reduced: String = name.chars().take(width - 3).collect();
            reduced.push_str("...");
            reduced
        } else {
            name.to_string()
        }
    }

    fn set_status_message(&mut self, message: impl Into<String>) {
        self.status_message = message.into();
        debug!("Status: {}", self.status_message);
        self.uidata.status_message = self.status_message.clone();
    }

    fn ui_resize(&mut self, width: usize, height: usize) {
        trace!(
            "UI was resized! w:{}->{}, h:{}->{}",
            self.uilayout.width, width, self.uilayout.height, height
        );
        self.uilayout = UILayout::from_values(width, height);
        self.update_table_data();
    }

    // -------------------- Navigation ---------------------- //

    fn move_rows(&mut self, step: isize) {
        let nrows = self.current_table().nrows();
        let cursor = &mut self.cursors[self.view.idx()];
        cursor.row = cursor
            .row
            .saturating_add_signed(step)
            .min(nrows.saturating_sub(1));
        self.update_table_data();
    }

    fn move_column(&mut self, step: isize) {
        let ncols = self.current_table().ncolumns();
        let cursor = &mut self.cursors[self.view.idx()];
        cursor.column = cursor
            .column
            .saturating_add_signed(step)
            .min(ncols.saturating_sub(1));
        self.update_table_data();
    }

    fn switch_view(&mut self, view: View) {
        trace!("Switch view {:?} -> {:?}", self.view, view);
        self.view = view;
        self.update_table_data();
    }

    fn move_picker(&mut self, step: isize) {
        if let Some(picker) = self.picker.as_mut() {
            picker.selected = picker
                .selected
                .saturating_add_signed(step)
                .min(picker.items.len().saturating_sub(1));
        }
        self.update_uidata();
    }

    // -------------------- Filter selection ---------------------- //

    fn open_column_picker(&mut self) {
        let mut items = vec!["(no filter)".to_string()];
        items.extend(self.session.cleaned().columns().iter().cloned());
        let selected = self
            .session
            .selection()
            .column()
            .and_then(|c| items.iter().position(|i| i == c))
            .unwrap_or(0);
        self.picker = Some(Picker {
            mode: PickMode::FilterColumn,
            column: None,
            items,
            selected,
        });
        self.modus = Modus::Picker;
        self.update_uidata();
    }

    fn open_value_picker_for_selection(&mut self) {
        match self.session.selection().column() {
            Some(column) => {
                let column = column.to_string();
                self.open_value_picker(column);
            }
            None => self.set_status_message("Select a filter column first (f)"),
        }
    }

    fn open_value_picker(&mut self, column: String) {
        let values = match self.session.distinct_values(&column) {
            Ok(values) => values,
            Err(e) => {
                warn!("Cannot list values: {e}");
                self.apply_selection(FilterSelection::NoFilter);
                return;
            }
        };
        if values.is_empty() {
            self.close_popup();
            self.set_status_message(format!("Column {column} has no values"));
            return;
        }
        let selected = match self.session.selection() {
            FilterSelection::Column { column: c, value } if *c == column => {
                values.iter().position(|v| v == value).unwrap_or(0)
            }
            _ => 0,
        };
        self.picker = Some(Picker {
            mode: PickMode::FilterValue,
            column: Some(column),
            items: values,
            selected,
        });
        self.modus = Modus::Picker;
        self.update_uidata();
    }

    fn pick(&mut self) {
        let Some(picker) = self.picker.take() else {
            self.close_popup();
            return;
        };
        match (picker.mode, picker.column) {
            (PickMode::FilterColumn, _) if picker.selected == 0 => {
                self.modus = Modus::Table;
                self.apply_selection(FilterSelection::NoFilter);
            }
            (PickMode::FilterColumn, _) => {
                let column = picker.items[picker.selected].clone();
                self.open_value_picker(column);
            }
            (PickMode::FilterValue, Some(column)) => {
                let value = picker.items[picker.selected].clone();
                self.modus = Modus::Table;
                self.apply_selection(FilterSelection::new(column, value));
            }
            (PickMode::FilterValue, None) => self.close_popup(),
        }
    }

    fn apply_selection(&mut self, selection: FilterSelection) {
        if !self.session.select(selection) {
            self.set_status_message("Filter column no longer exists, showing all rows");
        } else {
            let rows = self.session.filtered().nrows();
            self.set_status_message(format!(
                "Filtered Results ({rows} rows): {}",
                self.session.selection()
            ));
        }
        self.cursors[View::Filtered.idx()] = TableCursor::default();
        self.view = View::Filtered;
        self.update_table_data();
    }

    fn close_popup(&mut self) {
        self.picker = None;
        self.modus = Modus::Table;
        self.update_uidata();
    }

    fn show_help(&mut self) {
        self.modus = Modus::Popup;
        self.update_uidata();
    }

    // -------------------- Editing ---------------------- //

    fn editable(&mut self) -> bool {
        if self.view != View::Filtered {
            self.set_status_message("Only the Filtered view can be edited");
            return false;
        }
        true
    }

    fn start_edit(&mut self) {
        if !self.editable() {
            return;
        }
        let cursor = self.current_cursor();
        let table = self.session.edited();
        if table.is_empty() || table.ncolumns() == 0 {
            self.set_status_message("Nothing to edit, add a row first (a)");
            return;
        }
        let column = table.columns()[cursor.column].clone();
        let value = table.cell(cursor.row, cursor.column).unwrap_or("").to_string();
        trace!("Edit row {} column {}", cursor.row, column);

        self.last_input = self.input.start(&value);
        self.editing = Some((cursor.row, column));
        self.modus = Modus::Editing;
        self.update_uidata();
    }

    fn raw_input(&mut self, key: KeyEvent) {
        self.last_input = self.input.read(key);
        if self.last_input.finished {
            self.finish_edit();
        } else {
            self.update_uidata();
        }
    }

    fn finish_edit(&mut self) {
        self.modus = Modus::Table;
        if let Some((row, column)) = self.editing.take() {
            if self.last_input.canceled {
                self.set_status_message("Edit canceled");
            } else {
                let value = self.last_input.input.clone();
                match self.session.edited_mut().set_cell(row, &column, value) {
                    Ok(()) => self.set_status_message(format!("Updated {column} in row {}", row + 1)),
                    Err(e) => self.set_status_message(format!("Edit failed: {e}")),
                }
            }
        }
        self.update_table_data();
    }

    fn add_row(&mut self) {
        if !self.editable() {
            return;
        }
        let idx = self.session.edited_mut().push_blank_row();
        self.cursors[View::Filtered.idx()].row = idx;
        self.set_status_message("Added an empty row");
        self.update_table_data();
    }

    fn delete_row(&mut self) {
        if !self.editable() {
            return;
        }
        let row = self.current_cursor().row;
        match self.session.edited_mut().remove_row(row) {
            Ok(removed) => self.set_status_message(format!("Deleted row {}", removed.ordinal)),
            Err(e) => self.set_status_message(format!("Delete failed: {e}")),
        }
        self.update_table_data();
    }

    fn export(&mut self) {
        let path = self.config.export_path.clone();
        match self.session.export(&path) {
            Ok(()) => {
                info!("Exported edited table to {}", path.display());
                self.set_status_message(format!(
                    "Exported {} rows to {}",
                    self.session.edited().nrows(),
                    path.display()
                ));
            }
            Err(e) => self.set_status_message(format!("Export failed: {e}")),
        }
    }

    // -------------------- Clipboard ---------------------- //

    fn copy_to_clipboard(&mut self, content: String) {
        let result = match self.clipboard.as_mut() {
            Some(clipboard) => clipboard.set_text(content).map_err(|e| e.to_string()),
            None => Err("no clipboard".to_string()),
        };
        match result {
            Ok(()) => self.set_status_message("Copied to clipboard"),
            Err(e) => self.set_status_message(format!("Error copying to clipboard: {e}")),
        }
    }

    fn copy_cell(&mut self) {
        let cursor = self.current_cursor();
        if let Some(cell) = self.current_table().cell(cursor.row, cursor.column) {
            let cell = cell.to_string();
            trace!("Cell content: {}", cell);
            self.copy_to_clipboard(cell);
        }
    }

    fn copy_row(&mut self) {
        let cursor = self.current_cursor();
        if let Some(line) = export::row_to_line(self.current_table(), cursor.row) {
            self.copy_to_clipboard(line);
        }
    }
}
