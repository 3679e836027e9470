use std::io::BufRead;
use std::thread;

use homing_kinematics::Goal;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{info, warn};

pub const PROMPT: &str = "Insert X and Y coordinates that the robot should reach (type 0 0 for exit)";

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GoalRequest {
    Goal(Goal),
    Stop,
}

#[derive(Debug, Error)]
pub enum GoalInputError {
    #[error("expected two numbers `x y`, got {0:?}")]
    Malformed(String),
    #[error("failed to read goal input")]
    Io(#[from] std::io::Error),
}

/// Supplies goals to the driver, one run at a time.
pub trait GoalSource {
    async fn next_goal(&mut self) -> anyhow::Result<GoalRequest>;
}

/// Parses `x y` (or `x, y`) into a goal. Non-finite numbers are rejected.
pub fn parse_goal(line: &str) -> Result<Goal, GoalInputError> {
    let malformed = || GoalInputError::Malformed(line.trim().to_string());
    let mut fields = line
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|s| !s.is_empty())
        .map(str::parse::<f64>);

    match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(x)), Some(Ok(y)), None) if x.is_finite() && y.is_finite() => Ok(Goal::new(x, y)),
        _ => Err(malformed()),
    }
}

/// Goals typed on the console.
///
/// Lines are read on a dedicated thread so that a pending blocking read never
/// holds up shutdown; the driver just awaits the channel.
pub struct ConsoleGoals {
    lines: mpsc::Receiver<std::io::Result<String>>,
}

impl ConsoleGoals {
    pub fn stdin() -> anyhow::Result<Self> {
        let (tx, rx) = mpsc::channel(8);
        thread::Builder::new()
            .name("stdin".into())
            .spawn(move || forward_lines(std::io::stdin().lock(), &tx))?;
        Ok(Self::from_lines(rx))
    }

    pub fn from_lines(lines: mpsc::Receiver<std::io::Result<String>>) -> Self {
        ConsoleGoals { lines }
    }
}

/// Sends `reader` line by line until EOF, a read error, or the receiver going away.
///
/// Bytes that are not UTF-8 are replaced rather than failing the read, so such a
/// line reaches the parser and gets rejected like any other garbage.
fn forward_lines(mut reader: impl BufRead, tx: &mpsc::Sender<std::io::Result<String>>) {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        let line = match reader.read_until(b'\n', &mut buf) {
            Ok(0) => break,
            Ok(_) => Ok(String::from_utf8_lossy(&buf).trim_end_matches(['\n', '\r']).to_string()),
            Err(e) => Err(e),
        };
        let failed = line.is_err();
        if tx.blocking_send(line).is_err() || failed {
            break;
        }
    }
}

impl GoalSource for ConsoleGoals {
    /// Prompts until a well-formed goal arrives. End of input means stop.
    async fn next_goal(&mut self) -> anyhow::Result<GoalRequest> {
        loop {
            println!("{PROMPT}");
            let line = match self.lines.recv().await {
                Some(line) => line.map_err(GoalInputError::from)?,
                None => {
                    info!("Goal input closed.");
                    return Ok(GoalRequest::Stop);
                }
            };
            match parse_goal(&line) {
                Ok(goal) => return Ok(GoalRequest::Goal(goal)),
                Err(e) => {
                    warn!(error = %e, "rejected goal input");
                    println!("Invalid input: {e}");
                }
            }
        }
    }
}

/// A fixed list of goals, then `Stop`.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct ScriptedGoals {
    queue: std::collections::VecDeque<GoalRequest>,
}

#[cfg(test)]
impl ScriptedGoals {
    pub fn new(requests: impl IntoIterator<Item = GoalRequest>) -> Self {
        ScriptedGoals {
            queue: requests.into_iter().collect(),
        }
    }
}

#[cfg(test)]
impl GoalSource for ScriptedGoals {
    async fn next_goal(&mut self) -> anyhow::Result<GoalRequest> {
        Ok(self.queue.pop_front().unwrap_or(GoalRequest::Stop))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_space_and_comma_separated() {
        assert_eq!(parse_goal("5 0").unwrap(), Goal::new(5.0, 0.0));
        assert_eq!(parse_goal("  -1.5\t2e1 ").unwrap(), Goal::new(-1.5, 20.0));
        assert_eq!(parse_goal("3,4").unwrap(), Goal::new(3.0, 4.0));
        assert_eq!(parse_goal("3, 4").unwrap(), Goal::new(3.0, 4.0));
    }

    #[test]
    fn rejects_malformed() {
        for bad in ["", "5", "a b", "1 2 3", "nan 1", "1 inf", "1;2"] {
            assert!(
                matches!(parse_goal(bad), Err(GoalInputError::Malformed(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[tokio::test]
    async fn console_reprompts_after_bad_input_and_stops_at_eof() {
        let (tx, rx) = mpsc::channel(8);
        for line in ["hello", "", "2 3"] {
            tx.send(Ok(line.to_string())).await.unwrap();
        }
        drop(tx);

        let mut goals = ConsoleGoals::from_lines(rx);
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Goal(Goal::new(2.0, 3.0)));
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Stop);
    }

    #[tokio::test]
    async fn non_utf8_line_is_rejected_and_reprompted() {
        let (tx, rx) = mpsc::channel(8);
        let input = std::io::Cursor::new(b"\xff\xfe\n2 3\r\n".to_vec());
        thread::spawn(move || forward_lines(input, &tx)).join().unwrap();

        let mut goals = ConsoleGoals::from_lines(rx);
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Goal(Goal::new(2.0, 3.0)));
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Stop);
    }

    #[test]
    fn forwarding_stops_after_a_read_error() {
        struct Broken;
        impl std::io::Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> std::io::Result<usize> {
                Err(std::io::Error::other("broken pipe"))
            }
        }

        let (tx, mut rx) = mpsc::channel(8);
        forward_lines(std::io::BufReader::new(Broken), &tx);
        drop(tx);
        assert!(rx.try_recv().unwrap().is_err());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn console_surfaces_read_errors() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(Err(std::io::Error::other("broken pipe"))).await.unwrap();
        let mut goals = ConsoleGoals::from_lines(rx);
        let err = goals.next_goal().await.unwrap_err();
        assert!(matches!(err.downcast_ref::<GoalInputError>(), Some(GoalInputError::Io(_))));
    }

    #[tokio::test]
    async fn scripted_goals_run_out_into_stop() {
        let mut goals = ScriptedGoals::new([GoalRequest::Goal(Goal::new(1.0, 1.0))]);
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Goal(Goal::new(1.0, 1.0)));
        assert_eq!(goals.next_goal().await.unwrap(), GoalRequest::Stop);
    }
}
