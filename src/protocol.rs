use serde_json::{Value, json};
use std::io::{self, BufRead, Write};

/// Responses are written in the framing their request arrived in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Framing {
    Headers,
    Lines,
}

/// One read from the input stream.
#[derive(Debug)]
pub enum Incoming {
    Message(Value, Framing),
    /// Fully consumed but unusable; answer with a parse error in this framing.
    Malformed(String, Framing),
}

/// Returns `Ok(None)` on clean EOF.
pub fn read_mcp_message<R: BufRead>(reader: &mut R) -> io::Result<Option<Incoming>> {
    let first = loop {
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            break trimmed.to_owned();
        }
    };

    if is_header_line(&first) {
        return read_header_framed(reader, &first).map(Some);
    }
    Ok(Some(parse_body(first.as_bytes(), Framing::Lines)))
}

fn is_header_line(line: &str) -> bool {
    let Some((name, _)) = line.split_once(':') else {
        return false;
    };
    let name = name.trim();
    name.eq_ignore_ascii_case("Content-Length") || name.eq_ignore_ascii_case("Content-Type")
}

fn read_header_framed<R: BufRead>(reader: &mut R, first: &str) -> io::Result<Incoming> {
    let mut length = content_length(first);

    loop {
        // A JSON line here means the client is not sending headers at all.
        if next_line_is_json(reader)? {
            return Ok(Incoming::Malformed(
                format!("Unexpected header line in MCP stream: {first}"),
                Framing::Lines,
            ));
        }
        let mut line = String::new();
        if reader.read_line(&mut line)? == 0 {
            return Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "EOF while reading MCP headers",
            ));
        }
        let line = line.trim_end_matches(['\r', '\n']);
        if line.is_empty() {
            break;
        }
        if let Some(parsed) = content_length(line) {
            length = Some(parsed);
        }
    }

    let len = match length {
        Some(Ok(len)) => len,
        Some(Err(message)) => return Ok(Incoming::Malformed(message, Framing::Headers)),
        None => {
            return Ok(Incoming::Malformed(
                "Missing Content-Length header in MCP message".to_owned(),
                Framing::Headers,
            ));
        }
    };

    let mut body = vec![0_u8; len];
    reader.read_exact(&mut body)?;
    Ok(parse_body(&body, Framing::Headers))
}

fn next_line_is_json<R: BufRead>(reader: &mut R) -> io::Result<bool> {
    let buffered = reader.fill_buf()?;
    Ok(matches!(buffered.first(), Some(b'{' | b'[')))
}

fn content_length(line: &str) -> Option<Result<usize, String>> {
    let (name, value) = line.split_once(':')?;
    if !name.trim().eq_ignore_ascii_case("Content-Length") {
        return None;
    }
    Some(
        value
            .trim()
            .parse::<usize>()
            .map_err(|e| format!("Invalid Content-Length header: {e}")),
    )
}

fn parse_body(body: &[u8], framing: Framing) -> Incoming {
    match serde_json::from_slice(body) {
        Ok(value) => Incoming::Message(value, framing),
        Err(e) => Incoming::Malformed(format!("Invalid JSON body in MCP message: {e}"), framing),
    }
}

pub fn write_mcp_message<W: Write>(
    writer: &mut W,
    value: &Value,
    framing: Framing,
) -> io::Result<()> {
    let body = serde_json::to_vec(value).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("Failed to serialize JSON response: {e}"),
        )
    })?;
    match framing {
        Framing::Headers => {
            write!(writer, "Content-Length: {}\r\n\r\n", body.len())?;
            writer.write_all(&body)?;
        }
        Framing::Lines => {
            writer.write_all(&body)?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()
}

pub fn success_response(id: Value, result: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

pub fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message
        }
    })
}

pub fn error_response_with_data(id: Value, code: i64, message: &str, data: Value) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": {
            "code": code,
            "message": message,
            "data": data
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn framed(body: &str) -> String {
        format!("Content-Length: {}\r\n\r\n{}", body.len(), body)
    }

    fn next(reader: &mut Cursor<Vec<u8>>) -> Incoming {
        read_mcp_message(reader).expect("read").expect("message")
    }

    fn next_message(reader: &mut Cursor<Vec<u8>>) -> (Value, Framing) {
        match next(reader) {
            Incoming::Message(value, framing) => (value, framing),
            other => panic!("unexpected: {other:?}"),
        }
    }

    fn next_malformed(reader: &mut Cursor<Vec<u8>>) -> (String, Framing) {
        match next(reader) {
            Incoming::Malformed(message, framing) => (message, framing),
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn reads_header_framed_message() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let mut reader = Cursor::new(framed(body).into_bytes());
        let (value, framing) = next_message(&mut reader);
        assert_eq!(framing, Framing::Headers);
        assert_eq!(value["method"], json!("ping"));
        assert!(read_mcp_message(&mut reader).expect("read").is_none());
    }

    #[test]
    fn extra_headers_are_ignored() {
        let body = r#"{"id":2}"#;
        let input = format!(
            "Content-Type: application/vscode-jsonrpc; charset=utf-8\r\ncontent-length: {}\r\n\r\n{}",
            body.len(),
            body
        );
        let mut reader = Cursor::new(input.into_bytes());
        let (value, _) = next_message(&mut reader);
        assert_eq!(value["id"], json!(2));
    }

    #[test]
    fn reads_line_delimited_messages_and_skips_blank_lines() {
        let input = "{\"id\":1}\n\n{\"id\":2}\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (first, framing) = next_message(&mut reader);
        assert_eq!(framing, Framing::Lines);
        assert_eq!(first["id"], json!(1));
        let (second, _) = next_message(&mut reader);
        assert_eq!(second["id"], json!(2));
        assert!(read_mcp_message(&mut reader).expect("read").is_none());
    }

    #[test]
    fn invalid_json_line_is_malformed_and_stream_continues() {
        let input = "{not json\n{\"id\":3}\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (message, framing) = next_malformed(&mut reader);
        assert!(message.starts_with("Invalid JSON body"));
        assert_eq!(framing, Framing::Lines);
        let (next, _) = next_message(&mut reader);
        assert_eq!(next["id"], json!(3));
    }

    #[test]
    fn colon_line_before_json_lines_does_not_swallow_them() {
        let input = "garbage:line\n{\"id\":1,\"method\":\"ping\"}\n{\"id\":2,\"method\":\"ping\"}\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (_, framing) = next_malformed(&mut reader);
        assert_eq!(framing, Framing::Lines);
        for id in [1, 2] {
            let (value, framing) = next_message(&mut reader);
            assert_eq!(value["id"], json!(id));
            assert_eq!(framing, Framing::Lines);
        }
        assert!(read_mcp_message(&mut reader).expect("read").is_none());
    }

    #[test]
    fn header_without_blank_line_before_json_is_malformed() {
        let input = "Content-Type: application/json\n{\"id\":4}\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (_, framing) = next_malformed(&mut reader);
        assert_eq!(framing, Framing::Lines);
        let (value, _) = next_message(&mut reader);
        assert_eq!(value["id"], json!(4));
    }

    #[test]
    fn invalid_header_framed_body_keeps_header_framing() {
        let mut reader = Cursor::new(framed("{bad json}").into_bytes());
        let (_, framing) = next_malformed(&mut reader);
        assert_eq!(framing, Framing::Headers);
        assert!(read_mcp_message(&mut reader).expect("read").is_none());
    }

    #[test]
    fn missing_content_length_is_rejected() {
        let input = "Content-Type: application/json\r\n\r\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (message, framing) = next_malformed(&mut reader);
        assert_eq!(message, "Missing Content-Length header in MCP message");
        assert_eq!(framing, Framing::Headers);
    }

    #[test]
    fn unparsable_content_length_is_rejected() {
        let input = "Content-Length: lots\r\n\r\n";
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let (message, _) = next_malformed(&mut reader);
        assert!(message.starts_with("Invalid Content-Length header"));
    }

    #[test]
    fn truncated_headers_are_unexpected_eof() {
        let mut reader = Cursor::new(b"Content-Length: 10\r\n".to_vec());
        let err = read_mcp_message(&mut reader).expect_err("should fail");
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn writes_in_requested_framing() {
        let value = json!({"ok": true});

        let mut headers = Vec::new();
        write_mcp_message(&mut headers, &value, Framing::Headers).expect("write");
        assert_eq!(
            String::from_utf8(headers).expect("utf8"),
            "Content-Length: 11\r\n\r\n{\"ok\":true}"
        );

        let mut lines = Vec::new();
        write_mcp_message(&mut lines, &value, Framing::Lines).expect("write");
        assert_eq!(String::from_utf8(lines).expect("utf8"), "{\"ok\":true}\n");
    }

    #[test]
    fn error_response_carries_data() {
        let response = error_response_with_data(json!(7), -32602, "bad", json!({"x": 1}));
        assert_eq!(response["error"]["data"]["x"], json!(1));
        assert_eq!(response["id"], json!(7));
    }
}
