use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Length of `text` up to and including its last newline, or all of it when
/// there is no newline yet.
///
/// A trailing partial line is left for the follower so it arrives whole.
pub fn complete_len(text: &str) -> usize {
    text.rfind('\n').map_or(text.len(), |i| i + 1)
}

/// Tails a match log that is still being written, yielding complete lines.
///
/// Bytes are buffered until a newline arrives, so a write that stops in the
/// middle of a multi-byte character is picked up on the next poll.
pub struct LogFollower {
    path: PathBuf,
    offset: u64,
    pending: Vec<u8>,
    last_poll: Option<Instant>,
}

impl LogFollower {
    /// Starts after the first `offset` bytes, which the caller already read.
    pub fn new(path: &Path, offset: u64) -> Self {
        Self {
            path: path.to_owned(),
            offset,
            pending: Vec::new(),
            last_poll: None,
        }
    }

    /// Returns lines appended since the last poll; checks the file at most
    /// every `POLL_INTERVAL`.
    pub fn poll(&mut self, now: Instant) -> std::io::Result<Vec<String>> {
        if self.last_poll.is_some_and(|t| now.saturating_duration_since(t) < POLL_INTERVAL) {
            return Ok(Vec::new());
        }
        self.last_poll = Some(now);
        self.read_new()
    }

    fn read_new(&mut self) -> std::io::Result<Vec<String>> {
        let mut file = File::open(&self.path)?;
        let len = file.metadata()?.len();
        if len < self.offset {
            log::warn!("{} shrank, following from the start", self.path.display());
            self.offset = 0;
            self.pending.clear();
        }
        if len == self.offset {
            return Ok(Vec::new());
        }

        file.seek(SeekFrom::Start(self.offset))?;
        let read = file.take(len - self.offset).read_to_end(&mut self.pending)?;
        self.offset += read as u64;

        let Some(last_newline) = self.pending.iter().rposition(|&b| b == b'\n') else {
            return Ok(Vec::new());
        };
        let rest = self.pending.split_off(last_newline + 1);
        let complete = std::mem::replace(&mut self.pending, rest);

        Ok(complete
            .split(|&b| b == b'\n')
            .filter_map(|line| match String::from_utf8(line.to_vec()) {
                Ok(line) => Some(line),
                Err(err) => {
                    log::warn!("skipping line that is not UTF-8: {err}");
                    None
                }
            })
            .map(|line| line.trim().to_owned())
            .filter(|line| !line.is_empty())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    fn temp_file(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("pw-follow-{}-{name}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("temp dir");
        dir.join("match.log")
    }

    fn append(path: &Path, text: &str) {
        let mut f = std::fs::OpenOptions::new().create(true).append(true).open(path).expect("open");
        f.write_all(text.as_bytes()).expect("write");
    }

    #[test]
    fn yields_only_complete_lines() {
        let path = temp_file("partial");
        append(&path, "first\n");
        let mut follower = LogFollower::new(&path, 6);

        append(&path, "second\nthi");
        assert_eq!(follower.read_new().expect("read"), vec!["second".to_owned()]);

        append(&path, "rd\n");
        assert_eq!(follower.read_new().expect("read"), vec!["third".to_owned()]);
        assert!(follower.read_new().expect("read").is_empty());

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn character_split_across_writes_is_kept() {
        let path = temp_file("utf8");
        append(&path, "");
        let mut follower = LogFollower::new(&path, 0);

        let line = "{\"name\":\"caf\u{e9}\"}\n";
        let split = line.find('\u{e9}').expect("has e-acute") + 1;
        let mut f = std::fs::OpenOptions::new().append(true).open(&path).expect("open");
        f.write_all(&line.as_bytes()[..split]).expect("write");
        assert!(follower.read_new().expect("read").is_empty());

        f.write_all(&line.as_bytes()[split..]).expect("write");
        assert_eq!(follower.read_new().expect("read"), vec!["{\"name\":\"caf\u{e9}\"}".to_owned()]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn invalid_line_is_skipped_not_fatal() {
        let path = temp_file("invalid");
        append(&path, "");
        let mut follower = LogFollower::new(&path, 0);

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).expect("open");
        f.write_all(b"\xff\xfe\nok\n").expect("write");
        assert_eq!(follower.read_new().expect("read"), vec!["ok".to_owned()]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn partial_initial_line_arrives_whole() {
        let path = temp_file("initial");
        let text = "one\ntw";
        append(&path, text);

        let start = complete_len(text);
        assert_eq!(&text[..start], "one\n");
        let mut follower = LogFollower::new(&path, start as u64);

        append(&path, "o\n");
        assert_eq!(follower.read_new().expect("read"), vec!["two".to_owned()]);

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn text_without_newline_is_complete() {
        assert_eq!(complete_len("{}"), 2);
        assert_eq!(complete_len(""), 0);
        assert_eq!(complete_len("a\nb\n"), 4);
    }

    #[test]
    fn polls_are_rate_limited() {
        let path = temp_file("rate");
        append(&path, "");
        let mut follower = LogFollower::new(&path, 0);
        let now = Instant::now();

        assert!(follower.poll(now).expect("poll").is_empty());
        append(&path, "line\n");
        assert!(follower.poll(now + Duration::from_millis(10)).expect("poll").is_empty());
        assert_eq!(follower.poll(now + POLL_INTERVAL).expect("poll"), vec!["line".to_owned()]);

        let _ = std::fs::remove_file(&path);
    }
}
