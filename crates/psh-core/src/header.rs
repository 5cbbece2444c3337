use chrono::{DateTime, TimeZone};
use std::fmt::Write;

use crate::request::TransferRequest;
use crate::target::Target;

const SEPARATOR: &str = "----------";
const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn identity<Tz: TimeZone>(out: &mut String, target: &Target, at: &DateTime<Tz>)
where
    Tz::Offset: std::fmt::Display,
{
    let _ = writeln!(out, "{}", SEPARATOR);
    let _ = writeln!(out, "Time: {}", at.format(TIME_FORMAT));
    let _ = writeln!(out, "ID: {}", target.id);
    let _ = writeln!(out, "Name: {}", target.display_name());
    let _ = writeln!(out, "IP: {}", target.ip);
}

/// Header printed above a command's output.
pub fn command_header<Tz: TimeZone>(target: &Target, command: &str, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    identity(&mut out, target, at);
    let _ = writeln!(out, "Command: {}", command);
    let _ = writeln!(out, "{}", SEPARATOR);
    out
}

/// Header printed after a file has been copied.
pub fn transfer_header<Tz: TimeZone>(
    target: &Target,
    request: &TransferRequest,
    at: &DateTime<Tz>,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let mut out = String::new();
    identity(&mut out, target, at);
    let _ = writeln!(out, "Source: {}", request.source.display());
    let _ = writeln!(out, "Destination: {}", request.dest);
    let _ = writeln!(out, "Permission: {}", request.permission);
    let _ = writeln!(out, "{}", SEPARATOR);
    out
}
