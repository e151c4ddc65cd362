//! Fixed style table shared by every backend.

use crate::model::{HeadingLevel, ParagraphRole, TableKind};
use crate::status::ColorTag;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Role {
    Title,
    Subtitle,
    Heading,
    Body,
    Closing,
    TableHeader,
    TableBody,
    StatusPositive,
    StatusCaution,
    StatusAlert,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alignment {
    Left,
    Center,
    Justify,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Style {
    pub font_size: f32,
    pub leading: f32,
    pub bold: bool,
    pub color: [u8; 3],
    pub space_before: f32,
    pub space_after: f32,
    pub alignment: Alignment,
}

pub const DARK_BLUE: [u8; 3] = [0, 0, 139];
pub const GREY: [u8; 3] = [128, 128, 128];
pub const BLACK: [u8; 3] = [0, 0, 0];
pub const WHITE: [u8; 3] = [255, 255, 255];
pub const WHITE_SMOKE: [u8; 3] = [245, 245, 245];
pub const BEIGE: [u8; 3] = [245, 245, 220];
pub const LIGHT_GREY: [u8; 3] = [211, 211, 211];

/// Legend colors: green, orange and red families.
pub const POSITIVE: [u8; 3] = [0, 128, 0];
pub const CAUTION: [u8; 3] = [255, 140, 0];
pub const ALERT: [u8; 3] = [204, 0, 0];

/// Average glyph advance as a fraction of the font size, used for
/// line-count estimates where real metrics are not available.
pub const AVG_CHAR_WIDTH: f32 = 0.5;

pub fn style(role: Role) -> Style {
    let base = Style {
        font_size: 11.0,
        leading: 14.0,
        bold: false,
        color: BLACK,
        space_before: 0.0,
        space_after: 0.0,
        alignment: Alignment::Left,
    };
    match role {
        Role::Title => Style {
            font_size: 18.0,
            leading: 22.0,
            bold: true,
            color: DARK_BLUE,
            space_after: 30.0,
            alignment: Alignment::Center,
            ..base
        },
        Role::Subtitle => Style {
            font_size: 14.0,
            leading: 17.0,
            bold: true,
            color: GREY,
            space_after: 20.0,
            alignment: Alignment::Center,
            ..base
        },
        Role::Heading => Style {
            font_size: 14.0,
            leading: 17.0,
            bold: true,
            color: DARK_BLUE,
            space_before: 20.0,
            space_after: 12.0,
            ..base
        },
        Role::Body => Style {
            space_after: 12.0,
            alignment: Alignment::Justify,
            ..base
        },
        Role::Closing => Style {
            space_after: 12.0,
            ..base
        },
        Role::TableHeader => Style {
            font_size: 10.0,
            leading: 12.0,
            bold: true,
            color: WHITE_SMOKE,
            alignment: Alignment::Center,
            ..base
        },
        Role::TableBody => Style {
            font_size: 9.0,
            leading: 11.0,
            alignment: Alignment::Center,
            ..base
        },
        Role::StatusPositive => Style {
            color: POSITIVE,
            bold: true,
            ..style(Role::TableBody)
        },
        Role::StatusCaution => Style {
            color: CAUTION,
            bold: true,
            ..style(Role::TableBody)
        },
        Role::StatusAlert => Style {
            color: ALERT,
            bold: true,
            ..style(Role::TableBody)
        },
    }
}

pub fn heading_role(level: HeadingLevel) -> Role {
    match level {
        HeadingLevel::Title => Role::Title,
        HeadingLevel::Subtitle => Role::Subtitle,
        HeadingLevel::Section => Role::Heading,
    }
}

pub fn paragraph_role(role: ParagraphRole) -> Role {
    match role {
        ParagraphRole::Body => Role::Body,
        ParagraphRole::Closing => Role::Closing,
    }
}

pub fn tag_role(tag: ColorTag) -> Role {
    match tag {
        ColorTag::Positive => Role::StatusPositive,
        ColorTag::Caution => Role::StatusCaution,
        ColorTag::Alert => Role::StatusAlert,
    }
}

pub fn tag_color(tag: ColorTag) -> [u8; 3] {
    style(tag_role(tag)).color
}

/// Fixed-height row model for tables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableStyle {
    pub header_height: f32,
    pub row_height: f32,
    pub header_font_size: f32,
    pub body_font_size: f32,
    pub header_fill: [u8; 3],
    pub body_fill: [u8; 3],
    pub stripe_fill: [u8; 3],
    pub grid_width: f32,
    pub grid_color: [u8; 3],
    pub cell_padding: f32,
}

pub fn table_style(kind: TableKind) -> TableStyle {
    match kind {
        TableKind::Summary => TableStyle {
            header_height: 25.0,
            row_height: 18.0,
            header_font_size: 10.0,
            body_font_size: 9.0,
            header_fill: DARK_BLUE,
            body_fill: BEIGE,
            stripe_fill: BEIGE,
            grid_width: 1.0,
            grid_color: BLACK,
            cell_padding: 6.0,
        },
        TableKind::Detail => TableStyle {
            header_height: 20.0,
            row_height: 16.0,
            header_font_size: 9.0,
            body_font_size: 8.0,
            header_fill: DARK_BLUE,
            body_fill: LIGHT_GREY,
            stripe_fill: WHITE,
            grid_width: 0.5,
            grid_color: BLACK,
            cell_padding: 4.0,
        },
    }
}

impl TableStyle {
    pub fn height(&self, rows: usize) -> f32 {
        self.header_height + rows as f32 * self.row_height
    }

    /// Fill for body row `index` (0-based).
    pub fn row_fill(&self, index: usize, striped: bool) -> [u8; 3] {
        if striped && index % 2 == 0 {
            self.stripe_fill
        } else {
            self.body_fill
        }
    }
}

pub fn css_color(rgb: [u8; 3]) -> String {
    format!("#{:02x}{:02x}{:02x}", rgb[0], rgb[1], rgb[2])
}
