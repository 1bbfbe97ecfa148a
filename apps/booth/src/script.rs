//! Line-oriented command scripts for driving the booth without a window.

use anyhow::{anyhow, bail, Context, Result};
use camera_core::EditKey;
use shared::domain::{PhotoId, Position};

/// A photo named in a script: a literal id, or `last` for the newest photo.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PhotoRef {
    Id(PhotoId),
    Last,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScriptCommand {
    Capture,
    Wait,
    List,
    Drag {
        photo: PhotoRef,
        from: Position,
        to: Position,
    },
    Hover(Option<PhotoRef>),
    Edit(PhotoRef),
    Draft(String),
    Key(EditKey),
    Regenerate(PhotoRef),
    Download(PhotoRef),
    Delete(PhotoRef),
}

/// Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<ScriptCommand>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let (verb, rest) = line
        .split_once(char::is_whitespace)
        .map(|(verb, rest)| (verb, rest.trim()))
        .unwrap_or((line, ""));
    let args: Vec<&str> = rest.split_whitespace().collect();

    let command = match verb.to_ascii_lowercase().as_str() {
        "capture" => ScriptCommand::Capture,
        "wait" => ScriptCommand::Wait,
        "list" => ScriptCommand::List,
        "drag" => {
            let [photo, x, y, x2, y2] = args.as_slice() else {
                bail!("usage: drag <id> <x> <y> <x2> <y2>");
            };
            ScriptCommand::Drag {
                photo: parse_photo(photo)?,
                from: Position::new(parse_coord(x)?, parse_coord(y)?),
                to: Position::new(parse_coord(x2)?, parse_coord(y2)?),
            }
        }
        "hover" => match args.as_slice() {
            [] | ["none"] => ScriptCommand::Hover(None),
            [photo] => ScriptCommand::Hover(Some(parse_photo(photo)?)),
            _ => bail!("usage: hover [<id>|none]"),
        },
        "edit" => ScriptCommand::Edit(single_photo(&args, "edit")?),
        // The draft keeps its inner spacing verbatim.
        "draft" => ScriptCommand::Draft(rest.to_string()),
        "enter" => ScriptCommand::Key(EditKey::Enter { shift: false }),
        "shift-enter" => ScriptCommand::Key(EditKey::Enter { shift: true }),
        "escape" | "esc" => ScriptCommand::Key(EditKey::Escape),
        "regen" | "regenerate" => ScriptCommand::Regenerate(single_photo(&args, "regen")?),
        "download" => ScriptCommand::Download(single_photo(&args, "download")?),
        "delete" => ScriptCommand::Delete(single_photo(&args, "delete")?),
        other => bail!("unknown command '{other}'"),
    };
    Ok(Some(command))
}

fn single_photo(args: &[&str], verb: &str) -> Result<PhotoRef> {
    match args {
        [photo] => parse_photo(photo),
        _ => Err(anyhow!("usage: {verb} <id>")),
    }
}

fn parse_photo(raw: &str) -> Result<PhotoRef> {
    if raw.eq_ignore_ascii_case("last") {
        return Ok(PhotoRef::Last);
    }
    raw.parse::<PhotoId>()
        .map(PhotoRef::Id)
        .with_context(|| format!("invalid photo id '{raw}'"))
}

fn parse_coord(raw: &str) -> Result<f32> {
    let value: f32 = raw
        .parse()
        .with_context(|| format!("invalid coordinate '{raw}'"))?;
    if !value.is_finite() {
        bail!("invalid coordinate '{raw}'");
    }
    Ok(value)
}

#[cfg(test)]
#[path = "tests/script_tests.rs"]
mod tests;
