/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

use serde::{Deserialize, Serialize};

/// Channel commands, carried on the wire as small integers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandType {
    TakeRemote,
    PurgeMessages,
    Skip,
}

impl CommandType {
    pub fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(CommandType::TakeRemote),
            1 => Some(CommandType::PurgeMessages),
            2 => Some(CommandType::Skip),
            _ => None,
        }
    }

    pub fn code(self) -> i64 {
        match self {
            CommandType::TakeRemote => 0,
            CommandType::PurgeMessages => 1,
            CommandType::Skip => 2,
        }
    }
}

/// Payload of `run_command` (inbound) and `command` (outbound).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandPayload {
    #[serde(rename = "type")]
    pub code: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_round_trip() {
        for command in [
            CommandType::TakeRemote,
            CommandType::PurgeMessages,
            CommandType::Skip,
        ] {
            assert_eq!(CommandType::from_code(command.code()), Some(command));
        }
        assert_eq!(CommandType::from_code(3), None);
        assert_eq!(CommandType::from_code(-1), None);
    }

    #[test]
    fn payload_uses_type_field() {
        let payload: CommandPayload = serde_json::from_str(r#"{"type":2}"#).unwrap();
        assert_eq!(CommandType::from_code(payload.code), Some(CommandType::Skip));
        assert_eq!(serde_json::to_string(&payload).unwrap(), r#"{"type":2}"#);
    }
}
