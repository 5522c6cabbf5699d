//! Form configuration models.
//!
//! This module defines the values a front end collects before a run: input
//! and output files, page layout, track descriptors, timing parameters and
//! the boolean toggles of the cuesheet tool.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Default number of strips printed on one page.
pub const DEFAULT_STRIPS_PER_PAGE: f64 = 8.0;

/// Default blend duration in seconds.
pub const DEFAULT_BLEND_DURATION: f64 = 1.0;

/// Paper sizes understood by the cuesheet tool. The tool knows no others.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaperSize {
    #[default]
    Letter,
    Legal,
    Tabloid,
}

impl PaperSize {
    /// Every supported paper size, in menu order.
    pub const ALL: [PaperSize; 3] = [Self::Letter, Self::Legal, Self::Tabloid];

    /// The upper-case name used on the command line and in settings files.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Letter => "LETTER",
            Self::Legal => "LEGAL",
            Self::Tabloid => "TABLOID",
        }
    }
}

impl fmt::Display for PaperSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaperSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|size| size.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown paper size '{s}' (expected LETTER, LEGAL or TABLOID)"))
    }
}

/// Output mode requested from the external tool.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    #[default]
    Pdf,
    Text,
}

/// Region shading strategies, indexed by `Configuration::shade_option_index`.
///
/// `Regions` shades every region, `Asterisks` only regions whose names start
/// with `*`, and `Nothing` turns shading off.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ShadeOption {
    Regions,
    Asterisks,
    Nothing,
}

impl ShadeOption {
    /// The shading table in index order.
    pub const ALL: [ShadeOption; 3] = [Self::Regions, Self::Asterisks, Self::Nothing];

    /// Look up a shading strategy by its menu index.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Regions => "regions",
            Self::Asterisks => "asterisks",
            Self::Nothing => "nothing",
        }
    }
}

/// One track descriptor.
///
/// Tracks are kept in the order the front end lists them and may repeat.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Track {
    /// Identifier the tool uses to address the track (usually its position).
    pub id: String,

    /// Display label for the track.
    #[serde(default)]
    pub label: String,
}

impl Track {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

impl FromStr for Track {
    type Err = String;

    /// Parses `ID=LABEL` (or a bare `ID`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (id, label) = s.split_once('=').unwrap_or((s, ""));
        let id = id.trim();
        if id.is_empty() {
            return Err(format!("track '{s}' has an empty id"));
        }
        Ok(Self::new(id, label.trim()))
    }
}

/// The boolean switches of the form.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Toggle {
    InterpretTags,
    PrintFrames,
    OpenWhenFinished,
    PrintChannelNumbers,
    DecamelizeRegionNames,
    PrintMutedRegions,
}

impl Toggle {
    /// All toggles in their fixed command-line order.
    pub const ALL: [Toggle; 6] = [
        Self::InterpretTags,
        Self::PrintFrames,
        Self::OpenWhenFinished,
        Self::PrintChannelNumbers,
        Self::DecamelizeRegionNames,
        Self::PrintMutedRegions,
    ];
}

/// Everything the form collects before a run.
///
/// Created once with defaults, mutated by the front end through the setters
/// while no run is active, and read (never mutated) when arguments are built.
///
/// # Example
///
/// ```toml
/// # [defaults] table of .qsrunner/config.toml
/// paper_size = "TABLOID"
/// strips_per_page = 16.0
/// open_when_finished = true
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct Configuration {
    pub input_path: Option<PathBuf>,
    pub output_path: Option<PathBuf>,
    pub title: Option<String>,
    pub paper_size: PaperSize,
    pub tool_kind: ToolKind,
    pub tracks: Vec<Track>,
    pub shade_option_index: usize,
    pub first_channel_number: Option<String>,
    pub strips_per_page: f64,
    pub blend_duration: f64,

    pub interpret_tags: bool,
    pub print_frames: bool,
    pub open_when_finished: bool,
    pub print_channel_numbers: bool,
    pub decamelize_region_names: bool,
    pub print_muted_regions: bool,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            input_path: None,
            output_path: None,
            title: None,
            paper_size: PaperSize::default(),
            tool_kind: ToolKind::default(),
            tracks: Vec::new(),
            shade_option_index: 0,
            first_channel_number: None,
            strips_per_page: DEFAULT_STRIPS_PER_PAGE,
            blend_duration: DEFAULT_BLEND_DURATION,
            interpret_tags: false,
            print_frames: false,
            open_when_finished: false,
            print_channel_numbers: false,
            decamelize_region_names: false,
            print_muted_regions: false,
        }
    }
}

fn non_empty_path(path: &Option<PathBuf>) -> Option<&Path> {
    path.as_deref().filter(|p| !p.as_os_str().is_empty())
}

fn non_empty_str(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

impl Configuration {
    /// The input file, if one was selected and is non-empty.
    pub fn input(&self) -> Option<&Path> {
        non_empty_path(&self.input_path)
    }

    /// The output file, if one was selected and is non-empty.
    pub fn output(&self) -> Option<&Path> {
        non_empty_path(&self.output_path)
    }

    pub fn title_text(&self) -> Option<&str> {
        non_empty_str(&self.title)
    }

    pub fn channel_label(&self) -> Option<&str> {
        non_empty_str(&self.first_channel_number)
    }

    pub fn set_input_path(&mut self, path: impl Into<PathBuf>) {
        self.input_path = Some(path.into());
    }

    pub fn set_output_path(&mut self, path: impl Into<PathBuf>) {
        self.output_path = Some(path.into());
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = Some(title.into());
    }

    pub fn set_paper_size(&mut self, size: PaperSize) {
        self.paper_size = size;
    }

    pub fn set_tool_kind(&mut self, kind: ToolKind) {
        self.tool_kind = kind;
    }

    pub fn push_track(&mut self, track: Track) {
        self.tracks.push(track);
    }

    pub fn clear_tracks(&mut self) {
        self.tracks.clear();
    }

    pub fn set_shade_option_index(&mut self, index: usize) {
        self.shade_option_index = index;
    }

    pub fn set_first_channel_number(&mut self, label: impl Into<String>) {
        self.first_channel_number = Some(label.into());
    }

    pub fn set_strips_per_page(&mut self, strips: f64) {
        self.strips_per_page = strips;
    }

    pub fn set_blend_duration(&mut self, seconds: f64) {
        self.blend_duration = seconds;
    }

    /// Read a toggle by name.
    pub fn toggle(&self, toggle: Toggle) -> bool {
        match toggle {
            Toggle::InterpretTags => self.interpret_tags,
            Toggle::PrintFrames => self.print_frames,
            Toggle::OpenWhenFinished => self.open_when_finished,
            Toggle::PrintChannelNumbers => self.print_channel_numbers,
            Toggle::DecamelizeRegionNames => self.decamelize_region_names,
            Toggle::PrintMutedRegions => self.print_muted_regions,
        }
    }

    /// Flip a toggle by name.
    pub fn set_toggle(&mut self, toggle: Toggle, on: bool) {
        let slot = match toggle {
            Toggle::InterpretTags => &mut self.interpret_tags,
            Toggle::PrintFrames => &mut self.print_frames,
            Toggle::OpenWhenFinished => &mut self.open_when_finished,
            Toggle::PrintChannelNumbers => &mut self.print_channel_numbers,
            Toggle::DecamelizeRegionNames => &mut self.decamelize_region_names,
            Toggle::PrintMutedRegions => &mut self.print_muted_regions,
        };
        *slot = on;
    }
}
