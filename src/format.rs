//! Report styling and rendering.
//!
//! A report table is laid onto a [`SheetModel`], a positional grid of values
//! and cell styles. [`ReportFormatter::apply`] runs the styling steps in a
//! fixed order (outer border, centered band, color scale on Total Opens, ESP
//! highlight, row heights, filter, descending resort), then [`render`] turns
//! the model into xlsx bytes with rust_xlsxwriter.
//!
//! Styles are stored as flags and replaced rather than stacked, so running
//! the formatter twice over the same sheet gives the same result.

use crate::error::Result;
use crate::provider::{Provider, ESP_COLUMN, TOTAL_OPENS_COLUMN};
use crate::table::{Cell, ReportTable};
use rust_xlsxwriter::{
    ConditionalFormat3ColorScale, ConditionalFormatType, Format, FormatAlign, FormatBorder,
    FormatPattern, Workbook,
};
use std::cmp::Ordering;
use std::collections::BTreeMap;

/// Tunables for the report layout. Column positions are 0-based.
#[derive(Debug, Clone, PartialEq)]
pub struct FormatOptions {
    /// First and last column of the centered band (inclusive).
    pub centered_columns: (u16, u16),
    /// (value, color) stops for the Total Opens color scale: low, mid, high.
    pub color_scale: [(f64, &'static str); 3],
    pub esp_column_width: f64,
    pub row_height: f64,
    /// Total Opens position used when no header carries that name.
    pub total_opens_fallback: u16,
    /// ESP position used when no header carries that name.
    pub esp_fallback: u16,
    pub border_color: &'static str,
}

impl Default for FormatOptions {
    fn default() -> Self {
        Self {
            // Columns E through O
            centered_columns: (4, 14),
            color_scale: [(0.0, "#F8696B"), (5.0, "#FFEB84"), (10.0, "#63BE7B")],
            esp_column_width: 30.0,
            row_height: 14.0,
            total_opens_fallback: 14,
            esp_fallback: 15,
            border_color: "#000000",
        }
    }
}

/// Style flags for one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStyle {
    pub border_top: bool,
    pub border_bottom: bool,
    pub border_left: bool,
    pub border_right: bool,
    pub centered: bool,
    /// Solid fill color, `#RRGGBB`.
    pub fill: Option<&'static str>,
    /// Bold black font.
    pub bold: bool,
}

impl CellStyle {
    fn is_plain(&self) -> bool {
        *self == CellStyle::default()
    }
}

/// A three-stop color scale over a single column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    pub column: u16,
    pub first_row: u32,
    pub last_row: u32,
    pub stops: [(f64, &'static str); 3],
}

/// In-memory worksheet: values, per-cell styles and sheet-level settings.
/// Row 0 is the header row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetModel {
    cells: Vec<Vec<Cell>>,
    styles: BTreeMap<(u32, u16), CellStyle>,
    pub color_scale: Option<ColorScale>,
    pub column_widths: BTreeMap<u16, f64>,
    pub row_heights: BTreeMap<u32, f64>,
    /// (first_row, first_col, last_row, last_col)
    pub autofilter: Option<(u32, u16, u32, u16)>,
}

impl SheetModel {
    pub fn from_table(table: &ReportTable) -> Self {
        let mut cells = Vec::with_capacity(table.len() + 1);
        cells.push(table.columns.iter().map(|c| Cell::text(c.clone())).collect());
        cells.extend(table.rows.iter().cloned());
        Self {
            cells,
            ..Default::default()
        }
    }

    /// Number of used rows, header included.
    pub fn max_row(&self) -> u32 {
        self.cells.len() as u32
    }

    /// Number of used columns.
    pub fn max_col(&self) -> u16 {
        self.cells.iter().map(|r| r.len()).max().unwrap_or(0) as u16
    }

    fn is_blank(&self) -> bool {
        self.max_row() == 0 || self.max_col() == 0
    }

    pub fn value(&self, row: u32, col: u16) -> &Cell {
        static EMPTY: Cell = Cell::Empty;
        self.cells
            .get(row as usize)
            .and_then(|r| r.get(col as usize))
            .unwrap_or(&EMPTY)
    }

    pub fn style(&self, row: u32, col: u16) -> Option<&CellStyle> {
        self.styles.get(&(row, col))
    }

    fn style_mut(&mut self, row: u32, col: u16) -> &mut CellStyle {
        self.styles.entry((row, col)).or_default()
    }

    pub fn headers(&self) -> &[Cell] {
        self.cells.first().map(|r| r.as_slice()).unwrap_or(&[])
    }

    /// Data rows (everything below the header).
    pub fn data_rows(&self) -> &[Vec<Cell>] {
        self.cells.get(1..).unwrap_or(&[])
    }

    /// Position of the header named `name`, else `fallback`.
    pub fn locate_column(&self, name: &str, fallback: u16) -> u16 {
        self.headers()
            .iter()
            .position(|h| h.as_str() == Some(name))
            .map(|i| i as u16)
            .unwrap_or(fallback)
    }
}

/// Applies the report styling steps to a [`SheetModel`].
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    pub options: FormatOptions,
}

impl ReportFormatter {
    pub fn new(options: FormatOptions) -> Self {
        Self { options }
    }

    /// Run every step in order.
    pub fn apply(&self, sheet: &mut SheetModel) {
        if sheet.is_blank() {
            return;
        }
        self.outer_border(sheet);
        self.center_band(sheet);
        self.total_opens_color_scale(sheet);
        self.highlight_esp(sheet);
        self.uniform_row_heights(sheet);
        self.enable_filter(sheet);
        self.sort_by_total_opens(sheet);
    }

    /// Heavy border on the four outer edges of the used range only.
    pub fn outer_border(&self, sheet: &mut SheetModel) {
        if sheet.is_blank() {
            return;
        }
        let last_row = sheet.max_row() - 1;
        let last_col = sheet.max_col() - 1;
        for col in 0..=last_col {
            sheet.style_mut(0, col).border_top = true;
            sheet.style_mut(last_row, col).border_bottom = true;
        }
        for row in 0..=last_row {
            sheet.style_mut(row, 0).border_left = true;
            sheet.style_mut(row, last_col).border_right = true;
        }
    }

    /// Center the fixed column band on every row, header included.
    pub fn center_band(&self, sheet: &mut SheetModel) {
        let (first, last) = self.options.centered_columns;
        let last = last.min(sheet.max_col().saturating_sub(1));
        for row in 0..sheet.max_row() {
            for col in first..=last {
                sheet.style_mut(row, col).centered = true;
            }
        }
    }

    /// Red/yellow/green scale on the Total Opens data cells.
    pub fn total_opens_color_scale(&self, sheet: &mut SheetModel) {
        if sheet.max_row() < 2 {
            sheet.color_scale = None;
            return;
        }
        let column = sheet.locate_column(TOTAL_OPENS_COLUMN, self.options.total_opens_fallback);
        sheet.color_scale = Some(ColorScale {
            column,
            first_row: 1,
            last_row: sheet.max_row() - 1,
            stops: self.options.color_scale,
        });
    }

    /// Widen the ESP column and fill known provider labels. Unknown labels
    /// are left unstyled.
    pub fn highlight_esp(&self, sheet: &mut SheetModel) {
        let column = sheet.locate_column(ESP_COLUMN, self.options.esp_fallback);
        let (band_first, band_last) = self.options.centered_columns;
        let in_band = (band_first..=band_last).contains(&column);
        sheet
            .column_widths
            .insert(column, self.options.esp_column_width);

        for row in 1..sheet.max_row() {
            let provider = sheet
                .value(row, column)
                .as_str()
                .and_then(Provider::from_esp_label);
            match provider {
                Some(provider) => {
                    let style = sheet.style_mut(row, column);
                    style.fill = Some(provider.fill_color());
                    style.bold = true;
                    style.centered = true;
                }
                None => {
                    if let Some(style) = sheet.styles.get_mut(&(row, column)) {
                        style.fill = None;
                        style.bold = false;
                        style.centered = in_band;
                    }
                }
            }
        }
    }

    pub fn uniform_row_heights(&self, sheet: &mut SheetModel) {
        for row in 0..sheet.max_row() {
            sheet.row_heights.insert(row, self.options.row_height);
        }
    }

    /// Filter buttons over the whole used range.
    pub fn enable_filter(&self, sheet: &mut SheetModel) {
        if sheet.is_blank() {
            sheet.autofilter = None;
            return;
        }
        sheet.autofilter = Some((0, 0, sheet.max_row() - 1, sheet.max_col() - 1));
    }

    /// Reorder data rows by Total Opens, highest first. Blank counts as zero
    /// and equal totals keep their relative order.
    ///
    /// Values are rewritten in place; positional styling (borders, band,
    /// row heights) stays where it is while the ESP highlight is refreshed
    /// to follow the rewritten labels.
    pub fn sort_by_total_opens(&self, sheet: &mut SheetModel) {
        if sheet.cells.len() < 2 {
            return;
        }
        let column = sheet.locate_column(TOTAL_OPENS_COLUMN, self.options.total_opens_fallback) as usize;

        let mut rows: Vec<Vec<Cell>> = sheet.cells.drain(1..).collect();
        rows.sort_by(|a, b| {
            let ka = a.get(column).map(Cell::as_sort_key).unwrap_or(0.0);
            let kb = b.get(column).map(Cell::as_sort_key).unwrap_or(0.0);
            kb.partial_cmp(&ka).unwrap_or(Ordering::Equal)
        });
        sheet.cells.extend(rows);

        self.highlight_esp(sheet);
    }
}

/// Format `table` with default options and render it to xlsx bytes.
pub fn format_report(table: &ReportTable) -> Result<Vec<u8>> {
    let mut sheet = SheetModel::from_table(table);
    ReportFormatter::default().apply(&mut sheet);
    render(&sheet, &FormatOptions::default())
}

fn xlsx_format(style: &CellStyle, options: &FormatOptions) -> Format {
    let mut format = Format::new();
    if style.border_top {
        format = format
            .set_border_top(FormatBorder::Thick)
            .set_border_top_color(options.border_color);
    }
    if style.border_bottom {
        format = format
            .set_border_bottom(FormatBorder::Thick)
            .set_border_bottom_color(options.border_color);
    }
    if style.border_left {
        format = format
            .set_border_left(FormatBorder::Thick)
            .set_border_left_color(options.border_color);
    }
    if style.border_right {
        format = format
            .set_border_right(FormatBorder::Thick)
            .set_border_right_color(options.border_color);
    }
    if style.centered {
        format = format
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);
    }
    if let Some(fill) = style.fill {
        format = format
            .set_pattern(FormatPattern::Solid)
            .set_background_color(fill);
    }
    if style.bold {
        format = format.set_bold().set_font_color("#000000");
    }
    format
}

/// Write a styled sheet model to a single-sheet xlsx workbook in memory.
pub fn render(sheet: &SheetModel, options: &FormatOptions) -> Result<Vec<u8>> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();

    for row in 0..sheet.max_row() {
        for col in 0..sheet.max_col() {
            let value = sheet.value(row, col);
            let format = sheet
                .style(row, col)
                .filter(|s| !s.is_plain())
                .map(|s| xlsx_format(s, options));

            match (value, &format) {
                (Cell::Number(n), Some(f)) => {
                    worksheet.write_number_with_format(row, col, *n, f)?;
                }
                (Cell::Number(n), None) => {
                    worksheet.write_number(row, col, *n)?;
                }
                (Cell::Text(s), Some(f)) if !s.is_empty() => {
                    worksheet.write_string_with_format(row, col, s, f)?;
                }
                (Cell::Text(s), None) if !s.is_empty() => {
                    worksheet.write_string(row, col, s)?;
                }
                (_, Some(f)) => {
                    worksheet.write_blank(row, col, f)?;
                }
                (_, None) => {}
            }
        }
    }

    for (&col, &width) in &sheet.column_widths {
        worksheet.set_column_width(col, width)?;
    }
    for (&row, &height) in &sheet.row_heights {
        worksheet.set_row_height(row, height)?;
    }

    if let Some(scale) = &sheet.color_scale {
        let [(low, low_color), (mid, mid_color), (high, high_color)] = scale.stops;
        let rule = ConditionalFormat3ColorScale::new()
            .set_minimum(ConditionalFormatType::Number, low)
            .set_midpoint(ConditionalFormatType::Number, mid)
            .set_maximum(ConditionalFormatType::Number, high)
            .set_minimum_color(low_color)
            .set_midpoint_color(mid_color)
            .set_maximum_color(high_color);
        worksheet.add_conditional_format(
            scale.first_row,
            scale.column,
            scale.last_row,
            scale.column,
            &rule,
        )?;
    }

    if let Some((first_row, first_col, last_row, last_col)) = sheet.autofilter {
        worksheet.autofilter(first_row, first_col, last_row, last_col)?;
    }

    Ok(workbook.save_to_buffer()?)
}
