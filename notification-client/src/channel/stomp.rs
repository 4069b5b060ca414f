/// Minimal STOMP 1.2 framing
///
/// Only the client-side subset the push channel needs: CONNECT/SUBSCRIBE/
/// UNSUBSCRIBE/DISCONNECT going out, CONNECTED/MESSAGE/ERROR coming in.
/// Frames travel as websocket text messages.
use crate::error::{AppError, Result};

pub const CONNECT: &str = "CONNECT";
pub const CONNECTED: &str = "CONNECTED";
pub const SUBSCRIBE: &str = "SUBSCRIBE";
pub const UNSUBSCRIBE: &str = "UNSUBSCRIBE";
pub const DISCONNECT: &str = "DISCONNECT";
pub const MESSAGE: &str = "MESSAGE";
pub const ERROR: &str = "ERROR";

#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub command: String,
    pub headers: Vec<(String, String)>,
    pub body: String,
}

impl Frame {
    pub fn new(command: &str) -> Self {
        Self {
            command: command.to_string(),
            headers: Vec::new(),
            body: String::new(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// First header with the given name, if any
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// CONNECT frame advertising STOMP 1.2 and symmetric heartbeats
    pub fn connect(host: &str, heartbeat_ms: u64) -> Self {
        Frame::new(CONNECT)
            .with_header("accept-version", "1.2")
            .with_header("host", host)
            .with_header("heart-beat", &format!("{heartbeat_ms},{heartbeat_ms}"))
    }

    pub fn subscribe(id: &str, destination: &str) -> Self {
        Frame::new(SUBSCRIBE)
            .with_header("id", id)
            .with_header("destination", destination)
            .with_header("ack", "auto")
    }

    pub fn unsubscribe(id: &str) -> Self {
        Frame::new(UNSUBSCRIBE).with_header("id", id)
    }

    pub fn disconnect() -> Self {
        Frame::new(DISCONNECT)
    }

    /// Wire encoding: command line, header lines, blank line, body, NUL
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.command);
        out.push('\n');
        for (name, value) in &self.headers {
            out.push_str(&escape(name));
            out.push(':');
            out.push_str(&escape(value));
            out.push('\n');
        }
        out.push('\n');
        out.push_str(&self.body);
        out.push('\0');
        out
    }

    pub fn parse(raw: &str) -> Result<Frame> {
        let raw = raw.strip_suffix('\0').unwrap_or(raw);
        let (head, body) = split_head_body(raw)
            .ok_or_else(|| AppError::Frame("missing header/body separator".into()))?;

        let mut lines = head.lines().map(|l| l.strip_suffix('\r').unwrap_or(l));
        let command = lines
            .next()
            .filter(|c| !c.is_empty())
            .ok_or_else(|| AppError::Frame("empty command line".into()))?
            .to_string();

        let mut headers = Vec::new();
        for line in lines {
            let (name, value) = line
                .split_once(':')
                .ok_or_else(|| AppError::Frame(format!("malformed header line: {line}")))?;
            headers.push((unescape(name)?, unescape(value)?));
        }

        Ok(Frame {
            command,
            headers,
            body: body.to_string(),
        })
    }
}

/// Splits a frame at its first blank line. STOMP 1.2 allows LF or CRLF as
/// the end-of-line, so the separator may be any mix of the two.
fn split_head_body(raw: &str) -> Option<(&str, &str)> {
    let bytes = raw.as_bytes();
    for i in 0..bytes.len() {
        if bytes[i] != b'\n' {
            continue;
        }
        match bytes.get(i + 1) {
            Some(b'\n') => return Some((&raw[..i], &raw[i + 2..])),
            Some(b'\r') if bytes.get(i + 2) == Some(&b'\n') => {
                return Some((&raw[..i], &raw[i + 3..]))
            }
            _ => {}
        }
    }
    None
}

/// STOMP 1.2 header value escaping
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str(r"\\"),
            '\r' => out.push_str(r"\r"),
            '\n' => out.push_str(r"\n"),
            ':' => out.push_str(r"\c"),
            other => out.push(other),
        }
    }
    out
}

fn unescape(value: &str) -> Result<String> {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('r') => out.push('\r'),
            Some('n') => out.push('\n'),
            Some('c') => out.push(':'),
            other => {
                return Err(AppError::Frame(format!(
                    "invalid escape sequence in header: \\{}",
                    other.map(String::from).unwrap_or_default()
                )))
            }
        }
    }
    Ok(out)
}
