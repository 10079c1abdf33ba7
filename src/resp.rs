//! Wire protocol codec.
//!
//! Frames are tagged with a leading byte (`+` simple string, `-` error,
//! `:` integer, `$` bulk string, `*` array) and terminated with CRLF.
//! Decoding is restartable: a frame cut short by the read buffer reports
//! [`Incomplete`](RespValue::decode) without consuming anything, so the
//! caller keeps the bytes and retries once more data arrives.

use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum RespError {
    #[error("invalid UTF-8 sequence")]
    InvalidUtf8,
    #[error("unknown frame type tag")]
    UnknownTypeTag,
    #[error("invalid declared length")]
    InvalidLength,
    #[error("missing CRLF terminator")]
    MissingTerminator,
    #[error("failed to parse integer")]
    FailedToParseInteger,
}

impl RespError {
    pub fn as_string(&self) -> String {
        RespValue::Error(format!("ERR Protocol error: {}", self)).encode()
    }
}

#[derive(Debug, PartialEq, Clone)]
pub enum RespValue {
    SimpleString(String),
    Error(String),
    BulkError(String),
    Integer(i64),
    BulkString(String),
    Array(Vec<RespValue>),
    NullBulkString,
    NullArray,
}

impl RespValue {
    /// Decodes one frame from the front of `bytes`.
    ///
    /// Returns `Ok(Some((frame, consumed)))` for a complete frame,
    /// `Ok(None)` when the buffer holds a valid prefix that needs more
    /// bytes (nothing is consumed), and `Err` for malformed input. A
    /// malformed frame fails only that decode attempt; the connection
    /// owning the buffer decides whether to keep going.
    pub fn decode(bytes: &[u8]) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((value, end)) = Self::decode_at(bytes, 0)? else {
            return Ok(None);
        };

        Ok(Some((value, end)))
    }

    fn decode_at(bytes: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, RespError> {
        let Some((line, after_line)) = read_line(bytes, pos)? else {
            return Ok(None);
        };

        // The tag must be one of the known ASCII bytes; checking it as a
        // byte keeps a multi-byte first character from slicing mid-char.
        match line.as_bytes().first() {
            Some(b'+') => Ok(Some((
                RespValue::SimpleString(line[1..].to_string()),
                after_line,
            ))),
            Some(b'-') => Ok(Some((RespValue::Error(line[1..].to_string()), after_line))),
            Some(b':') => {
                let value = line[1..]
                    .parse::<i64>()
                    .map_err(|_| RespError::FailedToParseInteger)?;
                Ok(Some((RespValue::Integer(value), after_line)))
            }
            Some(b'$') => Self::decode_bulk_string(bytes, &line[1..], after_line),
            Some(b'*') => Self::decode_array(bytes, &line[1..], after_line),
            _ => Err(RespError::UnknownTypeTag),
        }
    }

    fn decode_bulk_string(
        bytes: &[u8],
        declared_length: &str,
        content_start: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let length = declared_length
            .parse::<i64>()
            .map_err(|_| RespError::InvalidLength)?;

        if length == -1 {
            return Ok(Some((RespValue::NullBulkString, content_start)));
        }

        if length < 0 {
            return Err(RespError::InvalidLength);
        }

        let length = length as usize;
        let content_end = content_start + length;

        // Content plus its mandatory CRLF must be buffered in full.
        if bytes.len() < content_end + 2 {
            return Ok(None);
        }

        if &bytes[content_end..content_end + 2] != b"\r\n" {
            return Err(RespError::MissingTerminator);
        }

        let content = str::from_utf8(&bytes[content_start..content_end])
            .map_err(|_| RespError::InvalidUtf8)?;

        Ok(Some((
            RespValue::BulkString(content.to_string()),
            content_end + 2,
        )))
    }

    fn decode_array(
        bytes: &[u8],
        declared_count: &str,
        elements_start: usize,
    ) -> Result<Option<(RespValue, usize)>, RespError> {
        let count = declared_count
            .parse::<i64>()
            .map_err(|_| RespError::InvalidLength)?;

        if count == -1 {
            return Ok(Some((RespValue::NullArray, elements_start)));
        }

        if count < 0 {
            return Err(RespError::InvalidLength);
        }

        let mut elements = Vec::with_capacity(count as usize);
        let mut pos = elements_start;

        for _ in 0..count {
            let Some((element, next_pos)) = Self::decode_at(bytes, pos)? else {
                return Ok(None);
            };

            elements.push(element);
            pos = next_pos;
        }

        Ok(Some((RespValue::Array(elements), pos)))
    }

    /// Encodes this value into its wire representation.
    pub fn encode(&self) -> String {
        match self {
            RespValue::SimpleString(s) => format!("+{}\r\n", s),
            RespValue::Error(msg) => format!("-{}\r\n", msg),
            RespValue::BulkError(msg) => format!("!{}\r\n{}\r\n", msg.len(), msg),
            RespValue::Integer(value) => format!(":{}\r\n", value),
            RespValue::BulkString(s) => format!("${}\r\n{}\r\n", s.len(), s),
            RespValue::Array(elements) => {
                let mut encoded = format!("*{}\r\n", elements.len());

                for element in elements {
                    encoded.push_str(&element.encode());
                }

                encoded
            }
            RespValue::NullBulkString => "$-1\r\n".to_string(),
            RespValue::NullArray => "*-1\r\n".to_string(),
        }
    }

    /// Encodes a list of plain strings as an array of bulk strings.
    pub fn encode_array_from_strings<I: IntoIterator<Item = String>>(strings: I) -> String {
        RespValue::Array(
            strings
                .into_iter()
                .map(RespValue::BulkString)
                .collect::<Vec<RespValue>>(),
        )
        .encode()
    }

    /// Encodes a flat key-value configuration block as a single bulk
    /// string of `key:value` lines, the payload INFO replies with.
    pub fn encode_config_block<'a, I>(entries: I) -> String
    where
        I: IntoIterator<Item = (&'a str, String)>,
    {
        let payload = entries
            .into_iter()
            .map(|(key, value)| format!("{}:{}", key, value))
            .collect::<Vec<String>>()
            .join("\r\n");

        RespValue::BulkString(payload).encode()
    }
}

fn read_line(bytes: &[u8], pos: usize) -> Result<Option<(&str, usize)>, RespError> {
    let Some(offset) = bytes[pos.min(bytes.len())..]
        .windows(2)
        .position(|window| window == b"\r\n")
    else {
        return Ok(None);
    };

    let line =
        str::from_utf8(&bytes[pos..pos + offset]).map_err(|_| RespError::InvalidUtf8)?;

    Ok(Some((line, pos + offset + 2)))
}

#[cfg(test)]
mod tests {
    use super::{RespError, RespValue};

    #[test]
    fn test_decode_complete_frames() {
        let test_cases = vec![
            (
                "+PONG\r\n".as_bytes(),
                RespValue::SimpleString("PONG".to_string()),
                7,
            ),
            (":42\r\n".as_bytes(), RespValue::Integer(42), 5),
            (":-3\r\n".as_bytes(), RespValue::Integer(-3), 5),
            (
                "$5\r\napple\r\n".as_bytes(),
                RespValue::BulkString("apple".to_string()),
                11,
            ),
            ("$0\r\n\r\n".as_bytes(), RespValue::BulkString(String::new()), 6),
            ("$-1\r\n".as_bytes(), RespValue::NullBulkString, 5),
            ("*-1\r\n".as_bytes(), RespValue::NullArray, 5),
            ("*0\r\n".as_bytes(), RespValue::Array(Vec::new()), 4),
            (
                "-ERR oops\r\n".as_bytes(),
                RespValue::Error("ERR oops".to_string()),
                11,
            ),
            (
                "*2\r\n$4\r\nECHO\r\n$3\r\nhey\r\n".as_bytes(),
                RespValue::Array(vec![
                    RespValue::BulkString("ECHO".to_string()),
                    RespValue::BulkString("hey".to_string()),
                ]),
                23,
            ),
        ];

        for (input, expected_value, expected_consumed) in test_cases {
            assert_eq!(
                RespValue::decode(input),
                Ok(Some((expected_value, expected_consumed))),
                "decoding {}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_decode_incomplete_input() {
        let test_cases: Vec<&[u8]> = vec![
            b"",
            b"*2\r\n",
            b"*2\r\n$4\r\nECHO\r\n",
            b"$5\r\napp",
            b"$5\r\napple",
            b"+PON",
        ];

        for input in test_cases {
            assert_eq!(
                RespValue::decode(input),
                Ok(None),
                "decoding {}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_decode_malformed_input() {
        let test_cases: Vec<(&[u8], RespError)> = vec![
            (b"$abc\r\n", RespError::InvalidLength),
            (b"*x\r\n", RespError::InvalidLength),
            (b"$-2\r\n", RespError::InvalidLength),
            (b"$3\r\napple\r\n", RespError::MissingTerminator),
            (b":4a2\r\n", RespError::FailedToParseInteger),
            (b"hello\r\n", RespError::UnknownTypeTag),
            (b"\r\n", RespError::UnknownTypeTag),
        ];

        for (input, expected_error) in test_cases {
            assert_eq!(
                RespValue::decode(input),
                Err(expected_error),
                "decoding {}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn test_decode_leaves_trailing_bytes_unconsumed() {
        let input = b"+OK\r\n$4\r\nnext\r\n";
        let (value, consumed) = RespValue::decode(input).unwrap().unwrap();

        assert_eq!(value, RespValue::SimpleString("OK".to_string()));
        assert_eq!(consumed, 5);
        assert_eq!(&input[consumed..], b"$4\r\nnext\r\n");
    }

    #[test]
    fn test_encode_decode_round_trip() {
        let values = vec![
            RespValue::SimpleString("OK".to_string()),
            RespValue::Integer(1024),
            RespValue::BulkString("strawberry".to_string()),
            RespValue::NullBulkString,
            RespValue::NullArray,
            RespValue::Array(vec![
                RespValue::BulkString("RPUSH".to_string()),
                RespValue::BulkString("fruits".to_string()),
                RespValue::BulkString("pear".to_string()),
            ]),
            RespValue::Array(Vec::new()),
        ];

        for value in values {
            let encoded = value.encode();
            let decoded = RespValue::decode(encoded.as_bytes());

            assert_eq!(
                decoded,
                Ok(Some((value, encoded.len()))),
                "round-tripping {}",
                encoded.escape_debug()
            );
        }
    }

    #[test]
    fn test_null_sentinels_are_distinct() {
        assert_eq!(RespValue::NullArray.encode(), "*-1\r\n");
        assert_eq!(RespValue::NullBulkString.encode(), "$-1\r\n");
        assert_eq!(RespValue::Array(Vec::new()).encode(), "*0\r\n");
    }

    #[test]
    fn test_encode_array_from_strings() {
        assert_eq!(
            RespValue::encode_array_from_strings(vec![
                "fruits".to_string(),
                "apple".to_string()
            ]),
            "*2\r\n$6\r\nfruits\r\n$5\r\napple\r\n"
        );
    }

    #[test]
    fn test_encode_config_block() {
        assert_eq!(
            RespValue::encode_config_block(vec![
                ("role", "master".to_string()),
                ("tcp_port", "6379".to_string()),
            ]),
            "$26\r\nrole:master\r\ntcp_port:6379\r\n"
        );
    }
}
