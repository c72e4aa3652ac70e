//! System and session commands: date, whoami, hostname, clear, help, exit

use super::{Ctx, COMMANDS};
use crate::error::Result;

const DATE_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

pub fn date(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    let now = ctx.env.now();
    ctx.out.line(now.format(DATE_FORMAT).to_string());
    Ok(())
}

pub fn whoami(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    let user = ctx.env.current_user();
    ctx.out.line(user);
    Ok(())
}

pub fn hostname(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    let host = ctx.env.host_name();
    ctx.out.line(host);
    Ok(())
}

pub fn clear(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    ctx.control.clear();
    Ok(())
}

pub fn exit(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    ctx.control.on_exit();
    Ok(())
}

pub fn help(ctx: &mut Ctx<'_>, _args: &[String]) -> Result<()> {
    let width = COMMANDS.iter().map(|c| c.usage.len()).max().unwrap_or(0) + 2;
    ctx.out.line("Available commands:");
    for command in COMMANDS {
        ctx.out
            .line(format!("  {:<width$}{}", command.usage, command.summary));
    }
    Ok(())
}
