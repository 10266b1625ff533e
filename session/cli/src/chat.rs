//! Interactive chat loop
//!
//! Reads stdin line by line and feeds turns to a [`ChatSession`]. Replies go to
//! stdout; notices and connection status go to stderr.
//!
//! Stdin is only read while the session can take a send. Lines typed (or
//! piped) while connecting or while a reply is pending stay buffered and go
//! out in order once the session is ready.

use std::process::ExitCode;

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use insight_core::{
    ChatSession, ClientConfig, CloseCause, RefusalReason, SendOutcome, SessionUpdate,
};

/// Exit status for Ctrl-C
const INTERRUPTED: u8 = 130;

/// One line of user input
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Quit,
    Turn(&'a str),
}

impl<'a> Input<'a> {
    fn parse(line: &'a str) -> Self {
        if line.trim() == "/quit" {
            Self::Quit
        } else {
            Self::Turn(line)
        }
    }
}

/// Run one chat session until the user leaves or the connection ends
pub async fn run(config: &ClientConfig) -> Result<ExitCode> {
    println!("{}", config.chat.greeting);
    eprintln!("[connecting to {}]", config.chat.url);

    let mut session = ChatSession::connect(&config.chat);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let status = loop {
        tokio::select! {
            update = session.next_update() => match update {
                Some(SessionUpdate::Connected) => {
                    eprintln!("[connected; type /quit to leave]");
                }
                Some(SessionUpdate::Reply(message)) => {
                    println!("{}: {}", message.role(), message.content());
                }
                Some(SessionUpdate::Closed(CloseCause::TornDown)) | None => {
                    break ExitCode::SUCCESS;
                }
                Some(SessionUpdate::Closed(cause)) => {
                    eprintln!("[not connected: {cause}]");
                    break ExitCode::FAILURE;
                }
            },

            line = lines.next_line(), if stdin_open && session.controller().can_send() => match line? {
                Some(line) => match Input::parse(&line) {
                    Input::Quit => break ExitCode::SUCCESS,
                    Input::Turn(text) => submit(&mut session, text),
                },
                None => {
                    debug!("stdin closed");
                    stdin_open = false;
                    session.teardown();
                }
            },

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break ExitCode::from(INTERRUPTED);
            }
        }
    };

    session.teardown();
    info!(
        turns = session.log().user_count(),
        replies = session.log().assistant_count(),
        "Chat ended"
    );
    Ok(status)
}

fn submit(session: &mut ChatSession, text: &str) {
    match session.send(text) {
        SendOutcome::Sent(id) => debug!(exchange = %id, "Turn submitted"),
        SendOutcome::Refused(RefusalReason::EmptyInput) => {}
        SendOutcome::Refused(RefusalReason::AwaitingReply) => {
            eprintln!("[still waiting for the last reply; message not sent]");
        }
        SendOutcome::Refused(RefusalReason::NotConnected) => {
            eprintln!("[not connected; message not sent]");
        }
    }
}
