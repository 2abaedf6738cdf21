use std::io::{self, BufRead, BufReader};
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};

use crate::video::domain::key_input::{KeyAction, KeyInput};

/// Reads control commands line by line on a background thread.
///
/// Lines that do not map to an action are ignored. Once the reader hits
/// end of input, `poll` keeps waiting out its timeout and returns `None`.
pub struct StdinKeyInput {
    rx: Receiver<KeyAction>,
}

impl StdinKeyInput {
    pub fn spawn() -> Self {
        Self::from_reader(BufReader::new(io::stdin()))
    }

    pub fn from_reader<R: BufRead + Send + 'static>(reader: R) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        thread::spawn(move || {
            for line in reader.lines() {
                let Ok(line) = line else { break };
                match KeyAction::parse(&line) {
                    Some(action) => {
                        if tx.send(action).is_err() {
                            break;
                        }
                    }
                    None => log::debug!("Ignoring input line {line:?}"),
                }
            }
        });
        Self { rx }
    }
}

impl KeyInput for StdinKeyInput {
    fn poll(&mut self, timeout: Duration) -> Option<KeyAction> {
        match self.rx.recv_timeout(timeout) {
            Ok(action) => Some(action),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                thread::sleep(timeout);
                None
            }
        }
    }
}
