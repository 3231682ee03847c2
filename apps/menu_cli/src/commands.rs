//! Line commands typed at the interactive prompt.

use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use shared::domain::{DishId, ImageId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    AddPhoto(PathBuf),
    RemovePhoto(ImageId),
    ListPhotos,
    Submit,
    Increase { dish_id: DishId, by: i64 },
    Decrease { dish_id: DishId, by: i64 },
    Show,
    Checkout,
    Back,
    Reset,
    Help,
    Quit,
}

pub const HELP: &str = "\
capture:  add <photo path> | remove <photo #> | photos | submit
menu:     + <dish #> [count] | - <dish #> [count] | menu | checkout | back | reset
summary:  back | reset
any time: help | quit";

pub fn parse_command(line: &str) -> Result<Command> {
    let line = line.trim();
    let (verb, rest) = match line.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb, rest.trim()),
        None => (line, ""),
    };

    let command = match verb.to_ascii_lowercase().as_str() {
        "add" if !rest.is_empty() => Command::AddPhoto(PathBuf::from(rest)),
        "add" => bail!("usage: add <photo path>"),
        "remove" | "rm" => Command::RemovePhoto(ImageId(parse_number(rest, "photo #")?)),
        "photos" | "images" => Command::ListPhotos,
        "submit" | "scan" => Command::Submit,
        "+" | "inc" => {
            let (dish_id, by) = parse_dish_delta(rest)?;
            Command::Increase { dish_id, by }
        }
        "-" | "dec" => {
            let (dish_id, by) = parse_dish_delta(rest)?;
            Command::Decrease { dish_id, by }
        }
        "menu" | "show" | "" => Command::Show,
        "checkout" | "order" => Command::Checkout,
        "back" | "edit" => Command::Back,
        "reset" | "new" => Command::Reset,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => bail!("unknown command '{other}'; type `help`"),
    };
    Ok(command)
}

fn parse_dish_delta(rest: &str) -> Result<(DishId, i64)> {
    let mut parts = rest.split_whitespace();
    let dish = parts
        .next()
        .ok_or_else(|| anyhow!("usage: + <dish #> [count]"))?;
    let dish_id = DishId(parse_number(dish, "dish #")?);
    let by = match parts.next() {
        Some(count) => parse_number(count, "count")?,
        None => 1,
    };
    if by <= 0 {
        bail!("count must be positive");
    }
    Ok((dish_id, by))
}

fn parse_number(raw: &str, what: &str) -> Result<i64> {
    raw.trim()
        .trim_start_matches('#')
        .parse::<i64>()
        .with_context(|| format!("expected a {what}, got '{raw}'"))
}

/// `y`/`yes` (any case) confirms; anything else declines.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
