//! Line-oriented terminal front end for the order form.

pub mod render;

use log::debug;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::{
    core::OrderResult,
    form::{Banner, FormField, SubmitRejection},
    orchestration::{FormCommand, FormHandle},
};

pub use render::{render, render_banner};

pub const HELP: &str = "\
commands:
  name <text>      set the full name
  size <S|M|L|->   pick a size (- clears it)
  topping <id>     toggle a topping
  blur <field>     leave a field (full_name, size, toppings)
  submit           place the order
  show             redraw the form
  json             dump the form as JSON
  help             this text
  quit             leave";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Form(FormCommand),
    Show,
    Json,
    Help,
    Quit,
}

impl Command {
    /// `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim_start();
        if line.trim().is_empty() {
            return Ok(None);
        }
        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line.trim_end(), ""),
        };

        let command = match word {
            "name" => Command::Form(FormCommand::SetFullName(rest.to_string())),
            "size" => {
                let value = if rest == "-" { "" } else { rest };
                Command::Form(FormCommand::SetSize(value.to_string()))
            }
            "topping" | "t" => {
                if rest.is_empty() {
                    return Err("topping needs an id".to_string());
                }
                Command::Form(FormCommand::ToggleTopping(rest.to_string()))
            }
            "blur" => Command::Form(FormCommand::Blur(rest.parse::<FormField>()?)),
            "submit" => Command::Form(FormCommand::Submit),
            "show" => Command::Show,
            "json" => Command::Json,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(format!("unknown command '{other}', try 'help'")),
        };
        Ok(Some(command))
    }
}

/// Reads commands from `input` until EOF or `quit`, echoing the form to
/// `output` after each one. Banners that appear or clear in the background are
/// reported as they happen.
pub async fn run<R, W>(mut handle: FormHandle, input: R, mut output: W) -> OrderResult<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = input.lines();
    let mut last_banner = handle.view().banner;

    write(&mut output, &render(&handle.view())).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                let command = match Command::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        write(&mut output, &format!("{e}\n")).await?;
                        continue;
                    }
                };
                debug!("console command: {command:?}");

                let text = match command {
                    Command::Quit => break,
                    Command::Help => format!("{HELP}\n"),
                    Command::Show => render(&handle.view()),
                    Command::Json => {
                        let json = serde_json::to_string_pretty(&handle.view())
                            .map_err(|e| crate::core::OrderError::Internal(e.to_string()))?;
                        format!("{json}\n")
                    }
                    Command::Form(FormCommand::Submit) => match handle.submit().await? {
                        Ok(_) => render(&handle.view()),
                        Err(SubmitRejection::InFlight) => {
                            "an order is already on its way\n".to_string()
                        }
                        Err(SubmitRejection::Blocked(_)) => {
                            format!("please fix the errors first\n{}", render(&handle.view()))
                        }
                        Err(SubmitRejection::Invalid(e)) => format!("{e}\n"),
                    },
                    Command::Form(command) => match handle.apply(command).await {
                        Ok(()) => render(&handle.view()),
                        Err(e) => format!("{e}\n"),
                    },
                };
                last_banner = handle.view().banner;
                write(&mut output, &text).await?;
            }

            view = handle.changed() => {
                let view = view?;
                if view.banner != last_banner {
                    write(&mut output, &banner_change(&view.banner)).await?;
                    last_banner = view.banner;
                }
            }
        }
    }

    output.flush().await?;
    Ok(())
}

fn banner_change(banner: &Option<Banner>) -> String {
    match banner {
        Some(banner) => format!("{}\n", render_banner(banner)),
        None => "(message cleared)\n".to_string(),
    }
}

async fn write<W>(output: &mut W, text: &str) -> OrderResult<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.flush().await?;
    Ok(())
}
