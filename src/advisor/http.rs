//! Chat-completions advisor over plain HTTP
//!
//! Talks to a local OpenAI-compatible server (LM Studio, llama.cpp, ...).
//! Requests go out as HTTP/1.0 with `Connection: close`, so the reply body
//! simply runs to end of stream. The whole exchange shares one deadline and
//! the reply is capped in size.

use std::io::{self, ErrorKind, Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use super::{AdvisorError, ProposedShot, ShotAdvisor, ShotRequest};

/// Largest reply accepted from the server, headers included
pub const MAX_RESPONSE_BYTES: usize = 1 << 20;

/// Where and how to reach the language model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorSettings {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub model: String,
    pub temperature: f32,
    /// Deadline for the whole request, from connect to the last byte read
    pub timeout_ms: u64,
}

impl Default for AdvisorSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1234,
            path: "/v1/chat/completions".to_string(),
            model: "llama-3.2-3b-instruct".to_string(),
            temperature: 0.0,
            timeout_ms: 60_000,
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    max_tokens: i32,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: String,
}

/// Advisor backed by a chat-completions endpoint
#[derive(Debug, Clone)]
pub struct HttpAdvisor {
    settings: AdvisorSettings,
}

impl HttpAdvisor {
    pub fn new(settings: AdvisorSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AdvisorSettings {
        &self.settings
    }

    fn timeout(&self) -> Duration {
        Duration::from_millis(self.settings.timeout_ms.max(1))
    }

    /// JSON body for a single-message chat completion
    pub fn request_body(&self, prompt: &str) -> Result<String, AdvisorError> {
        let request = ChatRequest {
            model: &self.settings.model,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: self.settings.temperature,
            max_tokens: -1,
            stream: false,
        };
        Ok(serde_json::to_string(&request)?)
    }

    /// POST `body` and return the raw HTTP response bytes.
    ///
    /// Each read only gets the time left before the deadline, so a server
    /// that trickles bytes cannot stretch the call.
    fn post(&self, body: &str) -> Result<Vec<u8>, AdvisorError> {
        let deadline = Instant::now() + self.timeout();
        let AdvisorSettings {
            host, port, path, ..
        } = &self.settings;

        let addr = (host.as_str(), *port)
            .to_socket_addrs()?
            .next()
            .ok_or_else(|| AdvisorError::Malformed(format!("{host}:{port} did not resolve")))?;

        let mut stream = TcpStream::connect_timeout(&addr, self.timeout())?;
        stream.set_write_timeout(Some(time_left(deadline)?))?;

        write!(
            stream,
            "POST {path} HTTP/1.0\r\nHost: {host}:{port}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            body.len()
        )?;
        stream.write_all(body.as_bytes())?;
        stream.flush()?;

        let mut raw = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            stream.set_read_timeout(Some(time_left(deadline)?))?;
            let n = match stream.read(&mut buf) {
                Ok(0) => return Ok(raw),
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(deadline_exceeded());
                }
                Err(err) => return Err(err.into()),
            };
            if raw.len() + n > MAX_RESPONSE_BYTES {
                return Err(AdvisorError::Malformed(format!(
                    "response exceeds {MAX_RESPONSE_BYTES} bytes"
                )));
            }
            raw.extend_from_slice(&buf[..n]);
        }
    }
}

fn time_left(deadline: Instant) -> Result<Duration, AdvisorError> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(deadline_exceeded())
    } else {
        Ok(left)
    }
}

fn deadline_exceeded() -> AdvisorError {
    io::Error::new(ErrorKind::TimedOut, "advisor request deadline exceeded").into()
}

impl ShotAdvisor for HttpAdvisor {
    fn propose_shot(&mut self, request: &ShotRequest) -> Result<ProposedShot, AdvisorError> {
        let body = self.request_body(&request.prompt())?;
        let raw = self.post(&body)?;
        let payload = response_body(&raw)?;
        log::debug!("Advisor raw response: {payload}");

        let content = reply_content(&payload)?;
        log::info!("Advisor replied: {}", content.trim());
        find_proposal(&content)
    }
}

/// Check the status line and return the (de-chunked) body.
///
/// Chunk sizes count bytes, so framing is undone on the raw bytes and the
/// body is decoded as text only once it is whole.
pub fn response_body(raw: &[u8]) -> Result<String, AdvisorError> {
    let split = find(raw, b"\r\n\r\n")
        .ok_or_else(|| AdvisorError::Malformed("response has no header terminator".into()))?;
    let head = String::from_utf8_lossy(&raw[..split]);
    let body = &raw[split + 4..];

    let mut lines = head.lines();
    let status_line = lines.next().unwrap_or_default();
    if !status_line.starts_with("HTTP/1.") {
        return Err(AdvisorError::Malformed(format!(
            "unexpected status line {status_line:?}"
        )));
    }
    let status: u16 = status_line
        .split_whitespace()
        .nth(1)
        .and_then(|code| code.parse().ok())
        .ok_or_else(|| AdvisorError::Malformed(format!("no status code in {status_line:?}")))?;
    if !(200..300).contains(&status) {
        return Err(AdvisorError::Status(status));
    }

    let chunked = lines.any(|line| {
        line.split_once(':').is_some_and(|(name, value)| {
            name.trim().eq_ignore_ascii_case("transfer-encoding")
                && value.trim().eq_ignore_ascii_case("chunked")
        })
    });

    let body = if chunked { dechunk(body)? } else { body.to_vec() };
    Ok(String::from_utf8_lossy(&body).into_owned())
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

fn dechunk(mut body: &[u8]) -> Result<Vec<u8>, AdvisorError> {
    let mut out = Vec::new();
    loop {
        let eol = find(body, b"\r\n")
            .ok_or_else(|| AdvisorError::Malformed("truncated chunk header".into()))?;
        let size_line = String::from_utf8_lossy(&body[..eol]);
        let rest = &body[eol + 2..];
        let size_hex = size_line.split(';').next().unwrap_or_default().trim();
        let size = usize::from_str_radix(size_hex, 16)
            .map_err(|_| AdvisorError::Malformed(format!("bad chunk size {size_hex:?}")))?;
        if size == 0 {
            return Ok(out);
        }
        let chunk = rest
            .get(..size)
            .ok_or_else(|| AdvisorError::Malformed("truncated chunk".into()))?;
        out.extend_from_slice(chunk);
        let rest = &rest[size..];
        body = rest.strip_prefix(b"\r\n").unwrap_or(rest);
    }
}

/// Pull `choices[0].message.content` out of a chat-completions payload
pub fn reply_content(payload: &str) -> Result<String, AdvisorError> {
    let response: ChatResponse = serde_json::from_str(payload)?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| AdvisorError::Malformed("response has no choices".into()))
}

/// Find the first JSON object in free text that carries both shot fields.
///
/// Models like to wrap their answer in prose or code fences, so every `{`
/// is tried as the start of a proposal until one parses.
pub fn find_proposal(content: &str) -> Result<ProposedShot, AdvisorError> {
    content
        .match_indices('{')
        .find_map(|(start, _)| {
            serde_json::Deserializer::from_str(&content[start..])
                .into_iter::<ProposedShot>()
                .next()
                .and_then(Result::ok)
        })
        .ok_or(AdvisorError::NoProposal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    use crate::advisor::{BallBrief, ShotRequest};
    use glam::Vec2;

    fn request() -> ShotRequest {
        ShotRequest {
            table_width: 800.0,
            table_height: 400.0,
            pockets: vec![Vec2::ZERO],
            shots_taken: 1,
            max_shots: 10,
            max_power: 15.0,
            cue_pos: Vec2::new(200.0, 200.0),
            cue_vel: Vec2::ZERO,
            balls: vec![BallBrief {
                id: 2,
                label: "black".into(),
                pos: Vec2::new(600.0, 200.0),
                distance_from_cue: 400.0,
                angle_from_cue: 0.0,
                pockets: Vec::new(),
            }],
            fallback_angle: 0.0,
            closest: Some("black".into()),
        }
    }

    /// Serve one canned HTTP response and hand back the request body
    fn serve_once(response: Vec<u8>) -> (u16, thread::JoinHandle<String>) {
        serve(move |mut stream| stream.write_all(&response).unwrap())
    }

    /// Accept one request, read it fully, then let `respond` answer it
    fn serve<F>(respond: F) -> (u16, thread::JoinHandle<String>)
    where
        F: FnOnce(TcpStream) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some(value) = line.strip_prefix("Content-Length:") {
                    content_length = value.trim().parse().unwrap();
                }
            }
            let mut body = vec![0u8; content_length];
            reader.read_exact(&mut body).unwrap();
            respond(reader.into_inner());
            String::from_utf8(body).unwrap()
        });
        (port, handle)
    }

    fn settings(port: u16) -> AdvisorSettings {
        AdvisorSettings {
            port,
            timeout_ms: 5_000,
            ..AdvisorSettings::default()
        }
    }

    #[test]
    fn test_find_proposal_in_prose() {
        let text = "Sure! Here is my shot:\n```json\n{\"angle_degrees\": 12.5, \"power\": 9}\n```";
        assert_eq!(find_proposal(text).unwrap(), ProposedShot::new(12.5, 9.0));
    }

    #[test]
    fn test_find_proposal_skips_unrelated_objects() {
        let text = "{\"note\": \"thinking\"} then {\"power\": 4.0, \"angle_degrees\": -30}";
        assert_eq!(find_proposal(text).unwrap(), ProposedShot::new(-30.0, 4.0));
    }

    #[test]
    fn test_find_proposal_none() {
        assert!(matches!(
            find_proposal("I would hit it softly to the left."),
            Err(AdvisorError::NoProposal)
        ));
        assert!(matches!(
            find_proposal("{\"angle_degrees\": \"ninety\", \"power\": 3}"),
            Err(AdvisorError::NoProposal)
        ));
    }

    #[test]
    fn test_response_body_status() {
        let raw = "HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\n\r\n";
        assert!(matches!(
            response_body(raw.as_bytes()),
            Err(AdvisorError::Status(503))
        ));

        assert!(matches!(
            response_body(b"garbage"),
            Err(AdvisorError::Malformed(_))
        ));
    }

    #[test]
    fn test_response_body_chunked() {
        let raw = "HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nhello\r\n6\r\n world\r\n0\r\n\r\n";
        assert_eq!(response_body(raw.as_bytes()).unwrap(), "hello world");
    }

    #[test]
    fn test_response_body_chunk_splits_multibyte_char() {
        // "aim 45°" with the chunk boundary between the two bytes of the degree sign
        let mut raw = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n7\r\naim 45\xC2\r\n".to_vec();
        raw.extend_from_slice(b"1\r\n\xB0\r\n0\r\n\r\n");
        assert_eq!(response_body(&raw).unwrap(), "aim 45\u{b0}");
    }

    #[test]
    fn test_reply_content() {
        let payload = r#"{"choices":[{"message":{"role":"assistant","content":"{\"angle_degrees\": 1, \"power\": 2}"}}]}"#;
        assert_eq!(
            reply_content(payload).unwrap(),
            "{\"angle_degrees\": 1, \"power\": 2}"
        );
        assert!(matches!(
            reply_content(r#"{"choices":[]}"#),
            Err(AdvisorError::Malformed(_))
        ));
        assert!(matches!(reply_content("not json"), Err(AdvisorError::Json(_))));
    }

    #[test]
    fn test_request_body_shape() {
        let advisor = HttpAdvisor::new(AdvisorSettings::default());
        let body = advisor.request_body("hi").unwrap();
        let value: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(value["model"], "llama-3.2-3b-instruct");
        assert_eq!(value["messages"][0]["role"], "user");
        assert_eq!(value["messages"][0]["content"], "hi");
        assert_eq!(value["max_tokens"], -1);
        assert_eq!(value["stream"], false);
    }

    #[test]
    fn test_round_trip_against_local_server() {
        let payload = r#"{"choices":[{"message":{"content":"{\"angle_degrees\": 33.5, \"power\": 7.25}"}}]}"#;
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{}",
            payload.len(),
            payload
        );
        let (port, server) = serve_once(response.into_bytes());

        let mut advisor = HttpAdvisor::new(settings(port));
        let proposal = advisor.propose_shot(&request()).unwrap();

        assert_eq!(proposal, ProposedShot::new(33.5, 7.25));
        let sent: serde_json::Value = serde_json::from_str(&server.join().unwrap()).unwrap();
        let prompt = sent["messages"][0]["content"].as_str().unwrap();
        assert!(prompt.contains("Shots taken: 1/10"));
    }

    #[test]
    fn test_unreachable_server_is_transport_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let mut advisor = HttpAdvisor::new(settings(port));
        let err = advisor.propose_shot(&request()).unwrap_err();

        assert!(matches!(err, AdvisorError::Transport(_)));
    }

    #[test]
    fn test_slow_server_hits_deadline() {
        let (port, _server) = serve(|mut stream| {
            // One byte every 200 ms for four seconds, well past the deadline
            for byte in b"HTTP/1.1 200 OK\r\nX-Pad: ....".iter().cycle().take(20) {
                thread::sleep(Duration::from_millis(200));
                if stream.write_all(&[*byte]).is_err() {
                    break;
                }
            }
        });
        let mut advisor = HttpAdvisor::new(AdvisorSettings {
            timeout_ms: 500,
            ..settings(port)
        });

        let started = Instant::now();
        let err = advisor.propose_shot(&request()).unwrap_err();

        assert!(started.elapsed() < Duration::from_millis(1500));
        assert!(matches!(err, AdvisorError::Transport(ref e) if e.kind() == ErrorKind::TimedOut));
    }

    #[test]
    fn test_oversized_response_rejected() {
        let (port, _server) = serve(|mut stream| {
            let _ = stream.write_all(b"HTTP/1.1 200 OK\r\n\r\n");
            let _ = stream.write_all(&vec![b' '; MAX_RESPONSE_BYTES + 1]);
        });

        let mut advisor = HttpAdvisor::new(settings(port));
        let err = advisor.propose_shot(&request()).unwrap_err();

        assert!(matches!(err, AdvisorError::Malformed(_)));
    }
}
