//! Mapping from a form configuration to the external tool's argument list.
//!
//! agent-orange takes `--name=value` options followed by the input file as
//! its only positional argument. The mapping is a fixed table applied in
//! this order:
//!
//! | source                 | emitted                                  | when          |
//! |------------------------|------------------------------------------|---------------|
//! | `tool_kind`            | `--pdf` / `--text`                       | always        |
//! | `output_path`          | `--outfile=<path>`                       | non-empty     |
//! | `title`                | `--title=<text>`                         | non-empty     |
//! | `paper_size`           | `--paper=<LETTER/LEGAL/TABLOID>`         | always        |
//! | `shade_option_index`   | `--shade-asterisks` / `--shade-nothing`  | index 1 or 2  |
//! | `first_channel_number` | `--renumber-from=<label>`                | non-empty     |
//! | `strips_per_page`      | `--strips=<n>`                           | always        |
//! | `blend_duration`       | `--blend=<seconds>`                      | always        |
//! | toggles                | see [`TOGGLE_FLAGS`]                     | toggle is on  |
//! | each track             | `--track` `<id>=<label>`                 | per track     |
//! | `input_path`           | `<path>`                                 | always, last  |
//!
//! Where the form and the tool disagree the form wins:
//!
//! - The tool only writes PDF. The mode flag is still always sent, so a
//!   text-capable build can tell the modes apart.
//! - The tool selects tracks by exclusion (`--exclude=POS`); the form lists
//!   the tracks to print with a label each, so they go out as `--track`.
//! - `--ignore-tags`, `-0` and `-m` have the opposite polarity of the
//!   interpret-tags, channel-number and muted-region toggles. Those toggles
//!   get their own positive flags rather than inverting the defaults.
//! - Opening the output is done by the runner; `--open-when-finished` only
//!   records the choice on the command line.
//!
//! Arguments are `OsString`s so paths reach the tool byte for byte.

use crate::invocation::error::{InvocationError, InvocationResult};
use qs_protocol::config_models::{Configuration, ShadeOption, Toggle, ToolKind};
use std::ffi::{OsStr, OsString};

/// Toggle flags in the order they appear on the command line.
pub const TOGGLE_FLAGS: [(Toggle, &str); 6] = [
    (Toggle::InterpretTags, "--interpret-tags"),
    (Toggle::PrintFrames, "--frames"),
    (Toggle::OpenWhenFinished, "--open-when-finished"),
    (Toggle::PrintChannelNumbers, "--channel-numbers"),
    (Toggle::DecamelizeRegionNames, "-D"),
    (Toggle::PrintMutedRegions, "--muted-regions"),
];

/// The flag selecting the tool's output mode.
pub fn mode_flag(kind: ToolKind) -> &'static str {
    match kind {
        ToolKind::Pdf => "--pdf",
        ToolKind::Text => "--text",
    }
}

/// The tool shades every region unless told otherwise.
fn shade_flag(shade: ShadeOption) -> Option<&'static str> {
    match shade {
        ShadeOption::Regions => None,
        ShadeOption::Asterisks => Some("--shade-asterisks"),
        ShadeOption::Nothing => Some("--shade-nothing"),
    }
}

/// `--name=value` as a single argument.
fn option(name: &str, value: impl AsRef<OsStr>) -> OsString {
    let value = value.as_ref();
    let mut arg = OsString::with_capacity(name.len() + 1 + value.len());
    arg.push(name);
    arg.push("=");
    arg.push(value);
    arg
}

/// Validate the parts of a configuration that do not depend on the input
/// file: shading index, numeric ranges and track ids.
///
/// Used both when building arguments and when loading saved defaults.
pub fn check_parameters(config: &Configuration) -> InvocationResult<ShadeOption> {
    let shade = ShadeOption::from_index(config.shade_option_index).ok_or_else(|| {
        InvocationError::InvalidConfiguration(format!(
            "shade option index {} is out of range (0..{})",
            config.shade_option_index,
            ShadeOption::ALL.len()
        ))
    })?;

    if !(config.strips_per_page.is_finite() && config.strips_per_page > 0.0) {
        return Err(InvocationError::InvalidConfiguration(format!(
            "strips per page must be a positive number, got {}",
            config.strips_per_page
        )));
    }

    if !(config.blend_duration.is_finite() && config.blend_duration > 0.0) {
        return Err(InvocationError::InvalidConfiguration(format!(
            "blend duration must be a positive number, got {}",
            config.blend_duration
        )));
    }

    if let Some(position) = config.tracks.iter().position(|t| t.id.trim().is_empty()) {
        return Err(InvocationError::InvalidConfiguration(format!(
            "track {position} has an empty id"
        )));
    }

    Ok(shade)
}

/// Derive the full argument list for one invocation.
///
/// Pure and deterministic: identical configurations give identical lists,
/// and neither the configuration nor any run state is touched, so this is
/// safe to call for previews.
///
/// # Errors
///
/// `InvocationError::InvalidConfiguration` when the input path is empty or
/// a parameter is out of range.
pub fn build_arguments(config: &Configuration) -> InvocationResult<Vec<OsString>> {
    let input = config.input().ok_or_else(|| {
        InvocationError::InvalidConfiguration("an input file must be selected".to_string())
    })?;
    let shade = check_parameters(config)?;

    let mut args = vec![OsString::from(mode_flag(config.tool_kind))];

    if let Some(output) = config.output() {
        args.push(option("--outfile", output));
    }

    if let Some(title) = config.title_text() {
        args.push(option("--title", title));
    }

    args.push(option("--paper", config.paper_size.name()));

    if let Some(flag) = shade_flag(shade) {
        args.push(flag.into());
    }

    if let Some(label) = config.channel_label() {
        args.push(option("--renumber-from", label.trim()));
    }

    args.push(option("--strips", config.strips_per_page.to_string()));
    args.push(option("--blend", config.blend_duration.to_string()));

    args.extend(
        TOGGLE_FLAGS
            .iter()
            .filter(|(toggle, _)| config.toggle(*toggle))
            .map(|(_, flag)| OsString::from(*flag)),
    );

    for track in &config.tracks {
        args.push("--track".into());
        args.push(format!("{}={}", track.id.trim(), track.label).into());
    }

    args.push(input.as_os_str().to_os_string());
    Ok(args)
}
